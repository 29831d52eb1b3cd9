//! Effective configuration: file, then environment, then validation

use anyhow::{Context, Result};
use fokal_core::{ConfigValidation, FokalConfig};
use std::path::Path;

/// Load `path` if it exists, apply `FOKAL_*` overrides and validate
///
/// A missing file is not an error; defaults apply.
pub fn load_config(path: &Path) -> Result<FokalConfig> {
    let config = if path.exists() {
        FokalConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?
    } else {
        FokalConfig::default()
    };
    finish(config, std::env::vars())
}

fn finish<I>(mut config: FokalConfig, vars: I) -> Result<FokalConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    config
        .merge_with_vars(vars)
        .context("applying environment overrides")?;
    config.validate().context("validating config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokal_core::LinkOrder;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.store_deadline_ms > 0);
        assert_eq!(
            finish(FokalConfig::default(), Vec::new()).unwrap(),
            FokalConfig::default()
        );
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store_deadline_ms = 500\nlink_order = \"remove_then_add\"").unwrap();
        let loaded = FokalConfig::load_from_file(file.path()).unwrap();

        let config = finish(
            loaded,
            vec![("FOKAL_STORE_DEADLINE_MS".to_string(), "750".to_string())],
        )
        .unwrap();
        assert_eq!(config.store_deadline_ms, 750);
        assert_eq!(config.link_order, LinkOrder::RemoveThenAdd);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = finish(
            FokalConfig::default(),
            vec![("FOKAL_MAX_BATCH_ENTRIES".to_string(), "0".to_string())],
        );
        assert!(err.is_err());
    }
}
