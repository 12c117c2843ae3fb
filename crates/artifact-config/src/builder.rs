//! Configuration builder for layered option loading

use crate::{ConfigResult, EngineOptions};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Builder that layers option sources: defaults, then files, then environment
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
    env_separator: String,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
            env_separator: "__".to_string(),
        }
    }

    /// Add a configuration file source; missing files are ignored
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add a configuration file source with explicit format
    pub fn add_source_file_with_format<P: AsRef<Path>>(
        mut self,
        path: P,
        format: FileFormat,
    ) -> Self {
        let path = path.as_ref().to_path_buf();
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Set environment variable separator (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Build and validate the options
    pub fn build(mut self) -> ConfigResult<EngineOptions> {
        // Defaults form the base layer
        self.inner = self
            .inner
            .add_source(config::Config::try_from(&EngineOptions::default())?);

        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix)
                            .separator(&self.env_separator)
                            .try_parsing(true),
                    );
                }
            }
        }

        let options: EngineOptions = self.inner.build()?.try_deserialize()?;
        options.validate()?;

        Ok(options)
    }

    /// Try to build the options, returning defaults on error
    pub fn build_or_default(self) -> EngineOptions {
        self.build().unwrap_or_default()
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_config(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let options = ConfigBuilder::new().build().unwrap();
        assert_eq!(options, EngineOptions::default());
    }

    #[test]
    fn test_builder_yaml_file() {
        let mut temp_file = temp_config(".yaml");
        writeln!(
            temp_file,
            r#"
parallelism: 2
item_pattern: "**/*.zip"
verbose: true
"#
        )
        .unwrap();

        let options = ConfigBuilder::new()
            .add_source_file(temp_file.path())
            .build()
            .unwrap();

        assert_eq!(options.parallelism, 2);
        assert_eq!(options.item_pattern, "**/*.zip");
        assert!(options.verbose);
        assert_eq!(options.retry_count, 4);
    }

    #[test]
    fn test_builder_env_overrides_file() {
        let mut temp_file = temp_config(".toml");
        writeln!(temp_file, "parallelism = 2\nretry_count = 1").unwrap();

        std::env::set_var("ARTIFACT_BUILDER_TEST__PARALLELISM", "6");

        let options = ConfigBuilder::new()
            .add_source_file(temp_file.path())
            .add_env_prefix("ARTIFACT_BUILDER_TEST")
            .build()
            .unwrap();

        std::env::remove_var("ARTIFACT_BUILDER_TEST__PARALLELISM");

        assert_eq!(options.parallelism, 6);
        assert_eq!(options.retry_count, 1);
    }

    #[test]
    fn test_builder_validation() {
        let mut temp_file = temp_config(".yaml");
        writeln!(temp_file, "parallelism: 0").unwrap();

        let result = ConfigBuilder::new()
            .add_source_file(temp_file.path())
            .build();

        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let options = ConfigBuilder::new()
            .add_source_file("/nonexistent/artifact-engine.yaml")
            .build()
            .unwrap();
        assert_eq!(options.parallelism, 8);
    }
}
