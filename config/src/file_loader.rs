//! # Configuration Files
//!
//! Reads an [`ExportConfig`] from a TOML or YAML document. The format is
//! picked from the file extension; missing sections keep their defaults.

use crate::config::ExportConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// Failure to read or parse a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Invalid {format} in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: ConfigFormat,
        message: String
    },

    #[error("Config file {} has no extension", .0.display())]
    NoExtension(PathBuf),

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String)
}

/// Document formats accepted for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml
}

impl ConfigFormat {
    /// `.toml`, `.yaml` and `.yml`, case-insensitive.
    pub fn from_path(path: &Path) -> Result<Self, ConfigFileError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigFileError::NoExtension(path.to_path_buf()))?;

        match extension.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ConfigFileError::UnsupportedFormat(other.to_string()))
        }
    }

    fn parse(self, contents: &str) -> Result<ExportConfig, String> {
        match self {
            Self::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string())
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => write!(f, "TOML"),
            Self::Yaml => write!(f, "YAML")
        }
    }
}

/// Load configuration from a file, detecting its format.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Produces the file layer of the configuration. Fields the file omits keep
/// their defaults, so the result can be used directly as the base of
/// [`crate::merge_configs`].
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_file;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_file(Path::new("export.toml"))?;
///     println!("Region: {}", config.platform.region);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// - [`ConfigFileError::NoExtension`] / [`ConfigFileError::UnsupportedFormat`]
///   before the file is opened
/// - [`ConfigFileError::Read`] when the file cannot be read
/// - [`ConfigFileError::Parse`] on a syntax or type error
pub fn load_from_file(path: &Path) -> Result<ExportConfig, ConfigFileError> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source
    })?;

    let config = format
        .parse(&contents)
        .map_err(|message| ConfigFileError::Parse {
            path: path.to_path_buf(),
            format,
            message
        })?;
    tracing::debug!(path = %path.display(), %format, "Loaded configuration file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_toml_sections_and_defaults() {
        let file = write_temp(
            ".toml",
            r#"
[platform]
client_id = "abc"
client_secret = "def"
region = "mec1"

[api]
page_size = 50
queue_membership = "expand"

[output]
format = "excel"

[logging]
level = "trace"
"#
        );

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.platform.region, "mec1");
        assert_eq!(config.api.page_size, 50);
        assert_eq!(config.api.retry.max_retries, 3);
        assert_eq!(config.api.queue_membership, crate::QueueMembership::Expand);
        assert_eq!(config.output.format, OutputFormat::Excel);
        assert_eq!(config.output.directory, "exports");
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_yml_extension_uses_yaml() {
        let file = write_temp(
            ".YML",
            "platform:\n  client_id: abc\n  client_secret: def\n\
             api:\n  retry:\n    max_retries: 7\n"
        );

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.platform.region, "us-east-1");
        assert_eq!(config.api.retry.max_retries, 7);
    }

    #[test]
    fn test_parse_error_names_file_and_format() {
        let file = write_temp(".toml", "[platform\nclient_id =");

        let err = load_from_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::Parse { format: ConfigFormat::Toml, .. }
        ));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_in_yaml_is_parse_error() {
        let file = write_temp(".yaml", "api:\n  page_size: many\n");

        let result = load_from_file(file.path());
        assert!(matches!(
            result,
            Err(ConfigFileError::Parse { format: ConfigFormat::Yaml, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_from_file(Path::new("/nonexistent/export.toml"));
        assert!(matches!(result, Err(ConfigFileError::Read { .. })));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/export.Toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("export.json")),
            Err(ConfigFileError::UnsupportedFormat(ext)) if ext == "json"
        ));
        assert!(matches!(
            ConfigFormat::from_path(Path::new("export")),
            Err(ConfigFileError::NoExtension(_))
        ));
    }
}
