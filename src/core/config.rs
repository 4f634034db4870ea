use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,

    #[serde(default = "default_output")]
    pub output_folder: String,

    /// Skip interactive confirmations.
    #[serde(default)]
    pub unattended: bool,
}

/// Static credentials for the analysis service, constant for the process
/// lifetime: one bearer key plus two routing headers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    pub app_id: String,
    pub usage_key: String,
}

fn default_output() -> String {
    "output".to_string()
}
fn default_base_url() -> String {
    "https://experimentals.impromptu-labs.com/api_tools".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Url::parse(&config.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", config.api.base_url))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write("config.yml", content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api:\n  api_key: k\n  app_id: a\n  usage_key: u\n"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.output_folder, "output");
        assert!(!config.unattended);
        assert!(config.api.base_url.starts_with("https://"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api:\n  base_url: not a url\n  api_key: k\n  app_id: a\n  usage_key: u\n"
        )
        .unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load_from(Path::new("does-not-exist.yml")).is_err());
    }
}
