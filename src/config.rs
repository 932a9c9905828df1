use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    model_weights_path: Option<PathBuf>,
    model_class_indices_path: Option<PathBuf>,
    vision_base_url: Option<String>,
    vision_timeout: Duration,
    knowledge_base_path: Option<PathBuf>,
    classify_timeout: Duration,
    max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から設定値を読み込み、検証する。
    ///
    /// モデル関連の変数は任意で、未設定なら対応する分類器を持たずに起動する。
    ///
    /// # Errors
    /// アドレスや数値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("WASTE_SORTER_HTTP_BIND", "0.0.0.0:8000")?;

        // Model artifacts (all optional)
        let model_weights_path = optional_path("WASTE_MODEL_WEIGHTS");
        let model_class_indices_path = optional_path("WASTE_MODEL_CLASS_INDICES");
        let vision_base_url = optional_string("WASTE_VISION_BASE_URL");
        let vision_timeout = parse_duration_ms("WASTE_VISION_TIMEOUT_MS", 5000)?;

        let knowledge_base_path = optional_path("WASTE_KNOWLEDGE_BASE_PATH");

        // Boundary limits
        let classify_timeout = parse_duration_ms("WASTE_CLASSIFY_TIMEOUT_MS", 30_000)?;
        let max_upload_bytes = parse_usize("WASTE_MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "WASTE_MAX_UPLOAD_BYTES",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }

        Ok(Self {
            http_bind,
            model_weights_path,
            model_class_indices_path,
            vision_base_url,
            vision_timeout,
            knowledge_base_path,
            classify_timeout,
            max_upload_bytes,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn model_weights_path(&self) -> Option<&PathBuf> {
        self.model_weights_path.as_ref()
    }

    #[must_use]
    pub fn model_class_indices_path(&self) -> Option<&PathBuf> {
        self.model_class_indices_path.as_ref()
    }

    #[must_use]
    pub fn vision_base_url(&self) -> Option<&str> {
        self.vision_base_url.as_deref()
    }

    #[must_use]
    pub fn vision_timeout(&self) -> Duration {
        self.vision_timeout
    }

    #[must_use]
    pub fn knowledge_base_path(&self) -> Option<&PathBuf> {
        self.knowledge_base_path.as_ref()
    }

    #[must_use]
    pub fn classify_timeout(&self) -> Duration {
        self.classify_timeout
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

fn optional_string(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn optional_path(name: &'static str) -> Option<PathBuf> {
    optional_string(name).map(PathBuf::from)
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let millis = parse_u64(name, default_ms)?;
    if millis == 0 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("duration must be greater than zero"),
        });
    }
    Ok(Duration::from_millis(millis))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "WASTE_SORTER_HTTP_BIND",
        "WASTE_MODEL_WEIGHTS",
        "WASTE_MODEL_CLASS_INDICES",
        "WASTE_VISION_BASE_URL",
        "WASTE_VISION_TIMEOUT_MS",
        "WASTE_KNOWLEDGE_BASE_PATH",
        "WASTE_CLASSIFY_TIMEOUT_MS",
        "WASTE_MAX_UPLOAD_BYTES",
    ];

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests serialize environment mutation through ENV_MUTEX.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn reset_env() {
        for name in VARS {
            // SAFETY: tests serialize environment mutation through ENV_MUTEX.
            unsafe {
                env::remove_var(name);
            }
        }
    }

    #[test]
    fn from_env_uses_defaults_when_unset() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.http_bind(), "0.0.0.0:8000".parse().unwrap());
        assert!(config.model_weights_path().is_none());
        assert!(config.model_class_indices_path().is_none());
        assert!(config.vision_base_url().is_none());
        assert_eq!(config.vision_timeout(), Duration::from_millis(5000));
        assert!(config.knowledge_base_path().is_none());
        assert_eq!(config.classify_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn from_env_overrides_values() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("WASTE_SORTER_HTTP_BIND", "127.0.0.1:9100");
        set_env("WASTE_MODEL_WEIGHTS", "/models/waste.json");
        set_env("WASTE_MODEL_CLASS_INDICES", "/models/class_indices.json");
        set_env("WASTE_VISION_BASE_URL", "http://vision:8080/");
        set_env("WASTE_VISION_TIMEOUT_MS", "1500");
        set_env("WASTE_CLASSIFY_TIMEOUT_MS", "2000");
        set_env("WASTE_MAX_UPLOAD_BYTES", "4096");

        let config = Config::from_env().expect("config should load");
        reset_env();

        assert_eq!(config.http_bind(), "127.0.0.1:9100".parse().unwrap());
        assert_eq!(
            config.model_weights_path(),
            Some(&PathBuf::from("/models/waste.json"))
        );
        assert_eq!(
            config.model_class_indices_path(),
            Some(&PathBuf::from("/models/class_indices.json"))
        );
        assert_eq!(config.vision_base_url(), Some("http://vision:8080/"));
        assert_eq!(config.vision_timeout(), Duration::from_millis(1500));
        assert_eq!(config.classify_timeout(), Duration::from_millis(2000));
        assert_eq!(config.max_upload_bytes(), 4096);
    }

    #[test]
    fn blank_optional_values_are_ignored() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("WASTE_VISION_BASE_URL", "   ");

        let config = Config::from_env().expect("config should load");
        reset_env();

        assert!(config.vision_base_url().is_none());
    }

    #[test]
    fn from_env_rejects_invalid_bind() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("WASTE_SORTER_HTTP_BIND", "not-an-address");

        let error = Config::from_env().expect_err("invalid bind should fail");
        reset_env();

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "WASTE_SORTER_HTTP_BIND",
                ..
            }
        ));
    }

    #[test]
    fn from_env_rejects_zero_timeout() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("WASTE_CLASSIFY_TIMEOUT_MS", "0");

        let error = Config::from_env().expect_err("zero timeout should fail");
        reset_env();

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "WASTE_CLASSIFY_TIMEOUT_MS",
                ..
            }
        ));
    }
}
