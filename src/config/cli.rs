use crate::app::pipelines::RunOptions;
use crate::config::toml_config::FileConfig;
use crate::config::{
    AdresmatchConfig, GebouwenConfig, GebouwenOverrides, HttpOverrides, HttpSettings,
};
use crate::core::jobs::OutputTarget;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "adres-enrich", version)]
#[command(about = "Enrich address CSV files with Flemish Adressenregister and Gebouwenregister data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match each row against the Adressenregister and append adresmatch_* columns
    Adresmatch(AdresmatchArgs),
    /// Look up the building and its footprint for each matched address
    Gebouwen(GebouwenArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Adresmatch(args) => &args.common,
            Command::Gebouwen(args) => &args.common,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Input CSV file, or a directory of CSV files
    pub input: PathBuf,

    /// Output CSV path (single input file only)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory for output files, keeping the input file names
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// HTTP timeout in seconds [default: 20]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Maximum requests per second, 0 disables limiting
    #[arg(long, value_name = "RPS")]
    pub rate_limit: Option<f64>,

    /// Extra pause after every request, in seconds [default: 0]
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Recompute rows that already have a status
    #[arg(long)]
    pub force: bool,

    /// Stop after evaluating this many rows per file
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Log progress every N rows, 0 disables [default: 100]
    #[arg(long, value_name = "N")]
    pub progress_interval: Option<usize>,

    /// Retries after a failed request [default: 3]
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Wait between retries in seconds [default: 1]
    #[arg(long, value_name = "SECS")]
    pub retry_wait: Option<f64>,

    /// Authorization token; a bare token is sent as `Bearer <token>`
    #[arg(long = "auth-token", visible_alias = "auth", value_name = "TOKEN")]
    pub auth_token: Option<String>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log CPU and memory usage with the progress lines
    #[arg(long)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CommonArgs {
    pub fn http_overrides(&self) -> HttpOverrides {
        HttpOverrides {
            timeout_seconds: self.timeout,
            rate_limit: self.rate_limit,
            delay_seconds: self.delay,
            retries: self.retries,
            retry_wait_seconds: self.retry_wait,
            auth: self.auth_token.clone(),
            progress_interval: self.progress_interval,
        }
    }

    pub fn file_config(&self) -> Result<FileConfig> {
        match &self.config {
            Some(path) => FileConfig::from_file(path),
            None => Ok(FileConfig::default()),
        }
    }

    pub fn output_target(&self) -> OutputTarget {
        OutputTarget {
            output: self.output.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn run_options(&self, http: &HttpSettings) -> RunOptions {
        RunOptions {
            force: self.force,
            max_rows: self.max_rows,
            progress_interval: http.progress_interval,
            monitor: self.monitor,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AdresmatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Adresmatch endpoint
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

impl AdresmatchArgs {
    pub fn resolve(&self, file: &FileConfig) -> AdresmatchConfig {
        AdresmatchConfig::resolve(&self.common.http_overrides(), self.api_url.clone(), file)
    }
}

#[derive(Debug, Clone, Args)]
pub struct GebouwenArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Gebouwen endpoint
    #[arg(long, value_name = "URL")]
    pub gebouwen_url: Option<String>,

    /// Gebouweenheden endpoint
    #[arg(long, value_name = "URL")]
    pub gebouweenheden_url: Option<String>,

    /// Column holding the address object id [default: adresmatch_adres_id]
    #[arg(long, value_name = "COL")]
    pub adres_id_field: Option<String>,

    /// Building units requested per address [default: 5]
    #[arg(long, value_name = "N")]
    pub building_limit: Option<usize>,

    /// Fall back to a historic unit when no active one exists
    #[arg(long)]
    pub include_historic: bool,
}

impl GebouwenArgs {
    pub fn resolve(&self, file: &FileConfig) -> GebouwenConfig {
        let overrides = GebouwenOverrides {
            gebouwen_url: self.gebouwen_url.clone(),
            gebouweenheden_url: self.gebouweenheden_url.clone(),
            adres_id_field: self.adres_id_field.clone(),
            building_limit: self.building_limit,
            include_historic: self.include_historic,
        };
        GebouwenConfig::resolve(&self.common.http_overrides(), overrides, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_adresmatch_flags() {
        let cli = Cli::try_parse_from([
            "adres-enrich",
            "adresmatch",
            "data/in.csv",
            "--rate-limit",
            "10",
            "--auth-token",
            "abc",
            "--max-rows",
            "50",
            "--force",
        ])
        .unwrap();
        let Command::Adresmatch(args) = &cli.command else {
            panic!("expected adresmatch");
        };
        assert_eq!(args.common.input, PathBuf::from("data/in.csv"));
        assert!(args.common.force);

        let config = args.resolve(&FileConfig::default());
        assert_eq!(config.http.rate_limit, 10.0);
        assert_eq!(config.http.authorization.as_deref(), Some("Bearer abc"));
        let options = args.common.run_options(&config.http);
        assert_eq!(options.max_rows, Some(50));
        assert_eq!(options.progress_interval, 100);
    }

    #[test]
    fn test_gebouwen_accepts_auth_alias() {
        let cli = Cli::try_parse_from([
            "adres-enrich",
            "gebouwen",
            "dir",
            "--auth",
            "Bearer xyz",
            "--include-historic",
            "--building-limit",
            "2",
            "--output-dir",
            "out",
        ])
        .unwrap();
        let Command::Gebouwen(args) = &cli.command else {
            panic!("expected gebouwen");
        };
        let config = args.resolve(&FileConfig::default());
        assert_eq!(config.http.authorization.as_deref(), Some("Bearer xyz"));
        assert!(config.api.include_historic);
        assert_eq!(config.api.building_limit, 2);
        assert_eq!(config.http.rate_limit, 5.0);
        assert_eq!(
            cli.command.common().output_target().output_dir,
            Some(PathBuf::from("out"))
        );
    }

    #[test]
    fn test_missing_input_is_usage_error() {
        assert!(Cli::try_parse_from(["adres-enrich", "adresmatch"]).is_err());
    }
}
