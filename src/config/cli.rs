use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "news-etl")]
#[command(about = "Fetch top headlines to S3, pull the latest object, load the cleaned table into PostgreSQL")]
#[command(
    after_help = "Download failures stop the run by default. Set `on_error = \"log\"` under [download] in the config file to log them and continue instead."
)]
pub struct CliArgs {
    /// Optional TOML configuration file (environment variables still take precedence)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit console logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Show the execution plan without running any task
    #[arg(long)]
    pub dry_run: bool,

    /// Execution ID for this run
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Run only these tasks (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these tasks (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Override the retry count per task
    #[arg(long)]
    pub retries: Option<u32>,

    /// Override the fixed delay between retries, in seconds
    #[arg(long)]
    pub retry_delay_secs: Option<u64>,

    /// Directory for per-component log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_mentions_download_error_policy() {
        use clap::CommandFactory;
        let help = CliArgs::command().render_long_help().to_string();
        assert!(help.contains("on_error = \"log\""));
    }

    #[test]
    fn test_parse_task_filters() {
        let args = CliArgs::parse_from([
            "news-etl",
            "--only",
            "download_latest_from_s3,load_data_to_postgres",
            "--retries",
            "0",
        ]);
        assert_eq!(
            args.only,
            vec!["download_latest_from_s3", "load_data_to_postgres"]
        );
        assert!(args.skip.is_empty());
        assert_eq!(args.retries, Some(0));
        assert!(!args.dry_run);
    }
}
