use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:9000/books.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid remote URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid remote URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid bind address '{0}'")]
    InvalidBind(String),
}

/// Runtime settings.
///
/// Resolution order per setting: CLI flag → environment variable → default.
/// - `SHELF_REMOTE_URL`: remote catalog URL
/// - `SHELF_FALLBACK_PATH`: fallback catalog file; unset means the copy
///   compiled into the binary
/// - `SHELF_BIND`: listen address for `serve`
#[derive(Debug, Clone)]
pub struct Config {
    pub remote_url: url::Url,
    pub fallback_path: Option<PathBuf>,
    pub bind: SocketAddr,
}

/// Values supplied on the command line; `None` defers to the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub remote_url: Option<String>,
    pub fallback_path: Option<PathBuf>,
    pub bind: Option<String>,
}

impl Config {
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    fn resolve(
        overrides: Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let remote_url = overrides
            .remote_url
            .or_else(|| var("SHELF_REMOTE_URL"))
            .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string());
        let fallback_path = overrides
            .fallback_path
            .or_else(|| var("SHELF_FALLBACK_PATH").map(PathBuf::from));
        let bind = overrides
            .bind
            .or_else(|| var("SHELF_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(Self {
            remote_url: parse_remote_url(&remote_url)?,
            fallback_path,
            bind: bind.parse().map_err(|_| ConfigError::InvalidBind(bind))?,
        })
    }
}

fn parse_remote_url(raw: &str) -> Result<url::Url, ConfigError> {
    let parsed = url::Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ConfigError::InvalidScheme),
    }
}
