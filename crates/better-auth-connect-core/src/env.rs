// Environment detection and logger configuration.

use std::sync::OnceLock;

static ENV_MODE: OnceLock<EnvMode> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Production,
    Development,
    Test,
}

impl EnvMode {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => EnvMode::Production,
            "test" | "testing" => EnvMode::Test,
            _ => EnvMode::Development,
        }
    }
}

/// Detect the environment mode once per process.
/// Checks `BETTER_AUTH_CONNECT_ENV`, `RUST_ENV` and `NODE_ENV` in order.
pub fn detect_env_mode() -> EnvMode {
    *ENV_MODE.get_or_init(|| {
        let value = std::env::var("BETTER_AUTH_CONNECT_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .or_else(|_| std::env::var("NODE_ENV"))
            .unwrap_or_default();
        EnvMode::parse(&value)
    })
}

pub fn is_production() -> bool {
    detect_env_mode() == EnvMode::Production
}

pub fn is_test() -> bool {
    detect_env_mode() == EnvMode::Test
}

/// `BETTER_AUTH_CONNECT_URL`, falling back to `BETTER_AUTH_URL`.
pub fn get_url_from_env() -> Option<String> {
    std::env::var("BETTER_AUTH_CONNECT_URL")
        .or_else(|_| std::env::var("BETTER_AUTH_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
}

fn default_filter(mode: EnvMode) -> &'static str {
    match mode {
        EnvMode::Production => "better_auth_connect=info",
        _ => "better_auth_connect=debug",
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set. Calling this twice is harmless.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(detect_env_mode())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!(EnvMode::parse("production"), EnvMode::Production);
        assert_eq!(EnvMode::parse("PROD"), EnvMode::Production);
        assert_eq!(EnvMode::parse("testing"), EnvMode::Test);
        assert_eq!(EnvMode::parse(""), EnvMode::Development);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(EnvMode::Production), "better_auth_connect=info");
        assert_eq!(default_filter(EnvMode::Test), "better_auth_connect=debug");
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger();
        init_logger();
    }
}
