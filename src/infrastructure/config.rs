use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

const CONFIG_FILE: &str = "config/peak_window";
const ENV_PREFIX: &str = "PEAK_WINDOW";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    /// Upper bound on windows enumerated for a single source
    #[serde(default = "default_max_windows")]
    pub max_windows: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_windows: default_max_windows(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_windows() -> u64 {
    5_000_000
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

/// Load settings from `config/peak_window.*` (optional), overridden by
/// `PEAK_WINDOW__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_when_no_sources() {
        let config = build(config::Config::builder()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.analysis.max_windows, 5_000_000);
        assert_eq!(config.analysis.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [server]
            bind_addr = "127.0.0.1:9000"

            [analysis]
            max_windows = 1000
        "#;
        let builder = config::Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml));
        let config = build(builder).unwrap();

        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.analysis.max_windows, 1000);
        assert_eq!(config.analysis.max_upload_bytes, 16 * 1024 * 1024);
    }
}
