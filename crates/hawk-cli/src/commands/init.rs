use std::path::Path;

use anyhow::bail;
use hawk_core::HawkConfig;

pub const CONFIG_FILE: &str = "hawk.toml";

pub fn init(path: &Path, app_key: &str, server: &str, force: bool) -> anyhow::Result<()> {
    if app_key.trim().is_empty() {
        bail!("--app-key cannot be empty");
    }

    let output = path.join(CONFIG_FILE);
    if output.exists() && !force {
        bail!("{} already exists (use --force to replace it)", output.display());
    }

    let config = HawkConfig::scaffold(app_key, server);
    std::fs::write(&output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), "SHSample", "api.example.com:443", false).unwrap();

        let config = HawkConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.app.app_key, "SHSample");
        assert_eq!(config.server.unwrap().address, "api.example.com:443");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), "SHSample", "a:1", false).unwrap();
        assert!(init(dir.path(), "Other", "a:1", false).is_err());

        init(dir.path(), "Other", "a:1", true).unwrap();
        let config = HawkConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.app.app_key, "Other");
    }
}
