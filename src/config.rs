//! Process-level configuration: credentials and logging.
//!
//! Nothing here is global state. `Credentials` is loaded once in `app` and
//! passed down to the adapters that need it.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const FRED_API_KEY_VAR: &str = "FRED_API_KEY";
const DEFAULT_LOG_FILTER: &str = "macro_align=info";

/// API credentials for remote sources.
#[derive(Clone)]
pub struct Credentials {
    pub fred_api_key: String,
}

impl Credentials {
    /// Read credentials from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let fred_api_key = std::env::var(FRED_API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self { fred_api_key })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("fred_api_key", &"<redacted>")
            .finish()
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
