//! YAML config file layer.
//!
//! Every key is optional; `Option` fields distinguish "absent" from "set",
//! so an untouched key falls through to the next precedence layer.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{BackendMode, ColorMode, ConfigError};

/// Raw config file contents. Field names match the YAML keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub api_prefix: Option<String>,
    pub verify_tls: Option<bool>,
    pub token_file: Option<PathBuf>,
    pub rewrite_localhost: Option<bool>,
    pub docker_host_gateway_name: Option<String>,
    pub keychain: Option<BackendMode>,
    pub color: Option<ColorMode>,
}

/// Load the config file if it exists.
///
/// A missing file is not an error and yields the empty layer; any other read
/// failure or malformed YAML aborts resolution with the offending path.
pub fn load(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).expect("create config");
        f.write_all(contents.as_bytes()).expect("write config");
        path
    }

    #[test]
    fn test_missing_file_is_empty_layer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fc = load(&dir.path().join("nope.yaml")).expect("load");
        assert!(fc.api_base.is_none());
        assert!(fc.verify_tls.is_none());
    }

    #[test]
    fn test_partial_file_leaves_other_keys_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "api_base: https://lab.example.com\nverify_tls: true\n");
        let fc = load(&path).expect("load");
        assert_eq!(fc.api_base.as_deref(), Some("https://lab.example.com"));
        assert_eq!(fc.verify_tls, Some(true));
        assert!(fc.api_prefix.is_none());
        assert!(fc.keychain.is_none());
    }

    #[test]
    fn test_mode_keys_parse_lowercase() {
        let dir = tempfile::tempdir().expect("tempdir");
        // "off" is quoted so the YAML 1.1 boolean resolution never kicks in
        let path = write_config(&dir, "keychain: \"off\"\ncolor: never\n");
        let fc = load(&path).expect("load");
        assert_eq!(fc.keychain, Some(BackendMode::Off));
        assert_eq!(fc.color, Some(ColorMode::Never));
    }

    #[test]
    fn test_malformed_yaml_names_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "api_base: [unclosed\n");
        let err = load(&path).expect_err("should fail");
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_bad_mode_value_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "keychain: sometimes\n");
        assert!(matches!(
            load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
