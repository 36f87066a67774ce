pub mod error;
pub mod store;

use std::path::Path;

use tracing::info;

pub use error::ConfigError;
pub use store::ConfigStore;

/// Build the store from the inline string and the config file, in that order.
///
/// Empty or absent sources are skipped. The merged result must hold at least
/// one repository entry.
pub fn load(inline: Option<&str>, file: Option<&Path>) -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::new();

    if let Some(inline) = inline.filter(|s| !s.is_empty()) {
        let repos = store::parse_source(inline.as_bytes()).map_err(|source| ConfigError::Parse {
            origin: "config string".to_string(),
            source,
        })?;
        info!("Loaded {} repository entries from config string", repos.len());
        store.merge(repos);
    }

    if let Some(path) = file.filter(|p| !p.as_os_str().is_empty()) {
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let repos = store::parse_source(&data).map_err(|source| ConfigError::Parse {
            origin: format!("config file {}", path.display()),
            source,
        })?;
        info!("Loaded {} repository entries from {}", repos.len(), path.display());
        store.merge(repos);
    }

    if store.is_empty() {
        return Err(ConfigError::Empty);
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_nothing_is_empty() {
        assert!(matches!(load(None, None), Err(ConfigError::Empty)));
        assert!(matches!(load(Some(""), None), Err(ConfigError::Empty)));
        assert!(matches!(load(Some("{}"), None), Err(ConfigError::Empty)));
    }

    #[test]
    fn test_load_inline_only() {
        let store = load(Some(r#"{"main": "deploy.sh"}"#), None).unwrap();
        assert_eq!(store.script_for("*", "main"), Some("deploy.sh"));
    }

    #[test]
    fn test_load_file_overrides_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"acme/app": {{"main": "from-file.sh"}}}}"#).unwrap();

        let store = load(
            Some(r#"{"acme/app": {"main": "inline.sh", "dev": "dev.sh"}}"#),
            Some(file.path()),
        )
        .unwrap();

        assert_eq!(store.script_for("acme/app", "main"), Some("from-file.sh"));
        assert_eq!(store.script_for("acme/app", "dev"), Some("dev.sh"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        let err = load(Some(r#"{"main": "a.sh"}"#), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_unparseable_string() {
        let err = load(Some("{not json"), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("error parsing config string"));
    }
}
