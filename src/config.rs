use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Config;

pub const DEFAULT_CONFIG: &str = "config.toml";

pub fn load_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Like [`load_config`], but a missing `config.toml` in the working
/// directory falls back to defaults. Any other path must exist.
pub fn load_or_default(path: &Path, api_url: Option<&str>) -> Result<Config> {
    let mut config = if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        info!("No {} found, using defaults", DEFAULT_CONFIG);
        Config::default()
    } else {
        load_config(path)?
    };
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = load_or_default(Path::new("/nonexistent/roster.toml"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_api_url_override() {
        let dir = std::env::temp_dir().join(format!("roster-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roster.toml");
        std::fs::write(&path, "[api]\nbase_url = \"http://from-file\"\n[ui]\nnotice_lifetime_ms = 100\n")
            .unwrap();

        let cfg = load_or_default(&path, Some("http://from-flag")).unwrap();
        assert_eq!(cfg.api.base_url, "http://from-flag");
        assert_eq!(cfg.ui.notice_lifetime_ms, 100);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("roster-config-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roster.toml");
        std::fs::write(&path, "[ui]\nnotice_lifetime_ms = \"soon\"\n").unwrap();

        let err = load_or_default(&path, None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
