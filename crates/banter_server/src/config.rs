const DEFAULT_PORT: u16 = 5001;
const DEFAULT_RATE_LIMIT: u32 = 30;
const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Process-wide configuration, read once at startup and passed by handle
/// into each request's scope.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub gemini_api_key: String,
    pub tokeninfo_url: String,
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub provider_timeout_secs: u64,
}

impl Config {
    /// Missing required variables are fatal at startup.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            port: optional("BANTER_PORT", DEFAULT_PORT),
            database_path: std::env::var("BANTER_DATABASE_PATH")
                .expect("BANTER_DATABASE_PATH must be set"),
            gemini_api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set"),
            tokeninfo_url: std::env::var("BANTER_TOKENINFO_URL")
                .expect("BANTER_TOKENINFO_URL must be set"),
            rate_limit: optional("BANTER_RATE_LIMIT", DEFAULT_RATE_LIMIT),
            rate_window_secs: optional("BANTER_RATE_WINDOW_SECS", DEFAULT_RATE_WINDOW_SECS),
            provider_timeout_secs: optional(
                "BANTER_PROVIDER_TIMEOUT_SECS",
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            ),
        }
    }
}

fn optional<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
