use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from fcrypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FcryptConfig {
    pub log: LogConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Read/transform/write chunk size in bytes (default: 100 KiB)
    pub chunk_size: usize,
    /// Algorithm used when none is given on the command line
    pub default_algorithm: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100 * 1024,
            default_algorithm: "AES".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: FcryptConfig = toml::from_str("").unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.engine.chunk_size, 100 * 1024);
        assert_eq!(config.engine.default_algorithm, "AES");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: FcryptConfig = toml::from_str(
            r#"
            [engine]
            chunk_size = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.chunk_size, 4096);
        assert_eq!(config.engine.default_algorithm, "AES");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = FcryptConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: FcryptConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.engine.chunk_size, config.engine.chunk_size);
        assert_eq!(back.log.level, config.log.level);
    }
}
