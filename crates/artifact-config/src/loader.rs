//! Configuration loader utilities

use crate::{ConfigBuilder, ConfigError, ConfigResult, EngineOptions, DEFAULT_ENV_PREFIX};
use std::path::{Path, PathBuf};

/// Options loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load options from the first config file found in the working
    /// directory, then apply `ARTIFACT_ENGINE__*` environment overrides
    pub fn load_default() -> ConfigResult<EngineOptions> {
        Self::load_with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load options from a specific file plus environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<EngineOptions> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_source_file(path)
            .add_env_prefix(DEFAULT_ENV_PREFIX)
            .build()
    }

    /// Load options with a custom environment prefix
    pub fn load_with_env_prefix<S: Into<String>>(prefix: S) -> ConfigResult<EngineOptions> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = Self::config_exists() {
            builder = builder.add_source_file(path);
        }

        builder.add_env_prefix(prefix).build()
    }

    /// Save options to a file, format chosen by extension (YAML by default)
    pub fn save_to_file<P: AsRef<Path>>(options: &EngineOptions, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(options)?,
            Some("json") => serde_json::to_string_pretty(options)?,
            _ => serde_yaml::to_string(options)?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Generate a config file holding the default options
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&EngineOptions::default(), path)
    }

    /// Default configuration file names, in order of preference
    fn get_default_config_paths() -> Vec<PathBuf> {
        [
            "artifact-engine.yaml",
            "artifact-engine.yml",
            "artifact-engine.toml",
            "artifact-engine.json",
            ".artifact-engine.yaml",
            ".artifact-engine.toml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    }

    /// Check if a configuration file exists in default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    /// Validate a configuration file without keeping the result
    pub fn validate_file<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::load_from_file(path).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("options.yaml")]
    #[case("options.toml")]
    #[case("options.json")]
    fn test_save_and_load(#[case] file_name: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(file_name);

        let original = EngineOptions::default()
            .with_parallelism(3)
            .with_item_pattern("**/*.txt\n!tmp/**")
            .verbose(true);
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_generate_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("default.yaml");

        ConfigLoader::generate_default_config(&config_path).unwrap();
        assert!(config_path.exists());
        assert!(ConfigLoader::validate_file(&config_path).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load_from_file("/nonexistent/options.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
