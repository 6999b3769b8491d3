use crate::config::toml_config::EtlConfig;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "sales-etl")]
#[command(about = "Clean sales records and summarize revenue by category")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SALES_ETL_CONFIG")]
    pub config: Option<String>,

    /// Input CSV file
    #[arg(short, long, env = "SALES_ETL_INPUT")]
    pub input: Option<String>,

    /// Directory the outputs are written to
    #[arg(short, long, env = "SALES_ETL_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Field delimiter of the input file
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Skip the per-category revenue summary
    #[arg(long)]
    pub no_summary: bool,

    /// Delete the input file after a fully successful run
    #[arg(long)]
    pub delete_input: bool,

    /// Exit non-zero when the run aborts or an output cannot be written
    #[arg(long)]
    pub strict_exit_code: bool,

    /// Log output format: compact or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log CPU and memory usage after each stage
    #[arg(long)]
    pub monitor: bool,

    /// Show the resolved configuration without processing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Loads the TOML file when one is given, then applies command line
    /// overrides on top.
    pub fn resolve(&self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::from_file(path)?,
            None => EtlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut EtlConfig) {
        if let Some(input) = &self.input {
            config.source.path = input.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.load.output_dir = output_dir.clone();
        }
        if let Some(delimiter) = &self.delimiter {
            config.source.delimiter = Some(delimiter.clone());
        }
        if self.no_summary {
            config.load.summary_enabled = Some(false);
        }
        if self.delete_input {
            config.source.delete_on_success = Some(true);
        }
        if self.strict_exit_code {
            config.run.strict_exit_code = Some(true);
        }
        if self.monitor {
            config.run.monitor = Some(true);
        }
        if let Some(format) = self.log_format {
            config.logging.format = Some(format);
        }
    }
}
