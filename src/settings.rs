use std::env;
use std::str::FromStr;

/// Process configuration, read from the environment once at startup.
///
/// Unset variables fall back to defaults that run locally against the
/// managed artifact; unparsable numeric values are logged and
/// defaulted rather than aborting startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Explicit ONNX export path; when set (with `tokenizer_path`) the
    /// artifact cache is bypassed.
    pub model_path: Option<String>,
    pub tokenizer_path: Option<String>,
    pub max_length: usize,
    pub batch_size_limit: usize,
    pub log_level: String,
    /// Comma-separated origin allowlist; "*" allows any origin.
    pub allowed_origins: Vec<String>,
    pub upload_dir: String,
    /// Endpoint scored spreadsheet records are forwarded to, if any.
    pub forward_url: Option<String>,
    /// Records per forwarded POST.
    pub forward_chunk: usize,
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T
where
    T: std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("{}={:?} is not valid, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: num_cpus::get(),
            model_path: None,
            tokenizer_path: None,
            max_length: 128,
            batch_size_limit: 64,
            log_level: "info".to_string(),
            allowed_origins: vec!["*".to_string()],
            upload_dir: "./uploads".to_string(),
            forward_url: None,
            forward_chunk: 10,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT", defaults.port),
            workers: env_parsed("WORKERS", defaults.workers),
            model_path: env::var("MODEL_PATH").ok(),
            tokenizer_path: env::var("TOKENIZER_PATH").ok(),
            max_length: env_parsed("MAX_LENGTH", defaults.max_length),
            batch_size_limit: env_parsed("BATCH_SIZE_LIMIT", defaults.batch_size_limit),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            forward_url: env::var("FORWARD_URL").ok(),
            forward_chunk: env_parsed("FORWARD_CHUNK", defaults.forward_chunk),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.port, 8000);
        assert_eq!(s.max_length, 128);
        assert_eq!(s.batch_size_limit, 64);
        assert!(s.allows_any_origin());
        assert!(s.forward_url.is_none());
    }

    #[test]
    fn test_bind_address() {
        let s = Settings {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Settings::default()
        };
        assert_eq!(s.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("PORT", "7001");
        env::set_var("BATCH_SIZE_LIMIT", "8");
        env::set_var("ALLOWED_ORIGINS", "http://localhost:3000, http://ui.local");
        let s = Settings::from_env();
        assert_eq!(s.port, 7001);
        assert_eq!(s.batch_size_limit, 8);
        assert_eq!(
            s.allowed_origins,
            vec!["http://localhost:3000", "http://ui.local"]
        );
        assert!(!s.allows_any_origin());
        env::remove_var("PORT");
        env::remove_var("BATCH_SIZE_LIMIT");
        env::remove_var("ALLOWED_ORIGINS");
    }

    #[test]
    fn test_invalid_numeric_falls_back() {
        env::set_var("MAX_LENGTH", "not-a-number");
        let s = Settings::from_env();
        assert_eq!(s.max_length, 128);
        env::remove_var("MAX_LENGTH");
    }
}
