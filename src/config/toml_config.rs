use crate::domain::model::{OutputFormat, OutputTarget};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_delimiter, validate_file_extensions, validate_non_empty_string, validate_path,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub pipeline: PipelineInfo,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
}

impl Default for PipelineInfo {
    fn default() -> Self {
        Self {
            name: "sales-etl".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: String,
    pub delimiter: Option<String>,
    pub delete_on_success: Option<bool>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "sales_data.csv".to_string(),
            delimiter: None,
            delete_on_success: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_dir: String,
    pub cleaned: OutputTarget,
    pub summary: Option<OutputTarget>,
    /// Set to false to skip the category summary.
    pub summary_enabled: Option<bool>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            cleaned: OutputTarget {
                filename: "cleaned_sales_data.csv".to_string(),
                format: OutputFormat::Csv,
            },
            summary: Some(OutputTarget {
                filename: "category_summary.json".to_string(),
                format: OutputFormat::Json,
            }),
            summary_enabled: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Exit non-zero when the run aborts or an output fails to write.
    pub strict_exit_code: Option<bool>,
    pub monitor: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub level: Option<String>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"))
}

impl EtlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SALES_DIR})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn strict_exit_code(&self) -> bool {
        self.run.strict_exit_code.unwrap_or(false)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.run.monitor.unwrap_or(false)
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging.format.unwrap_or_default()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("source.path", &self.source.path)?;
        validate_path("load.output_dir", &self.load.output_dir)?;

        if let Some(delimiter) = &self.source.delimiter {
            validate_delimiter("source.delimiter", delimiter)?;
        }

        validate_non_empty_string("load.cleaned.filename", &self.load.cleaned.filename)?;
        validate_file_extensions(
            "load.cleaned.filename",
            &[self.load.cleaned.filename.clone()],
            self.load.cleaned.format.extensions(),
        )?;

        if let Some(summary) = self.summary_output() {
            validate_non_empty_string("load.summary.filename", &summary.filename)?;
            validate_file_extensions(
                "load.summary.filename",
                &[summary.filename.clone()],
                summary.format.extensions(),
            )?;
            if summary.filename == self.load.cleaned.filename {
                return Err(EtlError::InvalidConfigValueError {
                    field: "load.summary.filename".to_string(),
                    value: summary.filename.clone(),
                    reason: "Summary output would overwrite the cleaned output".to_string(),
                });
            }
        }

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for EtlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn delimiter(&self) -> u8 {
        self.source
            .delimiter
            .as_deref()
            .and_then(|d| d.bytes().next())
            .unwrap_or(b',')
    }

    fn output_dir(&self) -> &str {
        &self.load.output_dir
    }

    fn cleaned_output(&self) -> &OutputTarget {
        &self.load.cleaned
    }

    fn summary_output(&self) -> Option<&OutputTarget> {
        if self.load.summary_enabled.unwrap_or(true) {
            self.load.summary.as_ref()
        } else {
            None
        }
    }

    fn delete_input_on_success(&self) -> bool {
        self.source.delete_on_success.unwrap_or(false)
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_layout() {
        let config = EtlConfig::default();

        assert_eq!(config.input_path(), "sales_data.csv");
        assert_eq!(config.cleaned_output().filename, "cleaned_sales_data.csv");
        assert_eq!(config.summary_output().unwrap().format, OutputFormat::Json);
        assert_eq!(config.delimiter(), b',');
        assert!(!config.delete_input_on_success());
        assert!(!config.strict_exit_code());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[pipeline]
name = "weekly-sales"
description = "Weekly sales cleanup"

[source]
path = "data/sales.tsv"
delimiter = "\t"
delete_on_success = true

[load]
output_dir = "./out"

[load.cleaned]
filename = "clean.tsv"
format = "csv"

[load.summary]
filename = "by_category.json"
format = "json"

[run]
strict_exit_code = true
monitor = false

[logging]
format = "json"
level = "debug"
"#;

        let config = EtlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "weekly-sales");
        assert_eq!(config.delimiter(), b'\t');
        assert!(config.delete_input_on_success());
        assert!(config.strict_exit_code());
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.summary_output().unwrap().filename, "by_category.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections_are_optional() {
        let config = EtlConfig::from_toml_str("[source]\npath = \"x.csv\"\n").unwrap();
        assert_eq!(config.input_path(), "x.csv");
        assert_eq!(config.output_dir(), ".");
        assert!(config.summary_output().is_some());

        let config =
            EtlConfig::from_toml_str("[load]\noutput_dir = \"out\"\nsummary_enabled = false\n")
                .unwrap();
        assert_eq!(config.cleaned_output().filename, "cleaned_sales_data.csv");
        assert!(config.summary_output().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SALES_ETL_TEST_DIR", "/data/incoming");

        let toml_content = r#"
[source]
path = "${SALES_ETL_TEST_DIR}/sales.csv"

[load]
output_dir = "${SALES_ETL_TEST_UNSET_VAR}"

[load.cleaned]
filename = "clean.csv"
format = "csv"
"#;

        let config = EtlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.path, "/data/incoming/sales.csv");
        assert_eq!(config.load.output_dir, "${SALES_ETL_TEST_UNSET_VAR}");

        std::env::remove_var("SALES_ETL_TEST_DIR");
    }

    #[test]
    fn test_same_output_filenames_rejected() {
        let mut config = EtlConfig::default();
        config.load.summary = Some(OutputTarget {
            filename: "cleaned_sales_data.json".to_string(),
            format: OutputFormat::Json,
        });
        config.load.cleaned = OutputTarget {
            filename: "cleaned_sales_data.json".to_string(),
            format: OutputFormat::Json,
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_must_match_format() {
        let mut config = EtlConfig::default();
        config.load.cleaned.filename = "cleaned.json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_delimiter_and_level() {
        let mut config = EtlConfig::default();
        config.source.delimiter = Some(";;".to_string());
        assert!(config.validate().is_err());

        let mut config = EtlConfig::default();
        config.logging.level = Some("loud".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let toml_content = r#"
[load]
output_dir = "out"

[load.cleaned]
filename = "clean.parquet"
format = "parquet"
"#;
        assert!(EtlConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nname = \"file-test\"\n")
            .unwrap();

        let config = EtlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
    }
}
