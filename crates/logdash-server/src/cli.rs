//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_BIND_ADDR;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "logdash=info,logdash_server=info,tower_http=info";

/// logdash - log ingestion and error statistics.
#[derive(Parser, Debug, Clone)]
#[command(name = "logdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP stats API.
    Serve(ServeArgs),

    /// Ingest files or a remote host and report the outcome.
    Ingest(IngestArgs),

    /// Print the sample records as a JSON array.
    Seed(SeedArgs),
}

/// Arguments for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, env = "LOGDASH_BIND", default_value_t = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// Allowed CORS origin (repeatable; all origins when omitted).
    #[arg(long = "cors-origin", env = "LOGDASH_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Seconds between expiry sweeps.
    #[arg(long, env = "LOGDASH_COMPACTION_INTERVAL_SECS", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub compaction_interval_secs: u64,

    /// Directory of `*.json` record arrays ingested at startup.
    #[arg(long, env = "LOGDASH_INGEST_DIR")]
    pub ingest_dir: Option<PathBuf>,

    /// Load sample records at startup.
    #[arg(long)]
    pub seed: bool,
}

/// Arguments for `ingest`.
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["file", "dir", "ssh_host"])
))]
pub struct IngestArgs {
    /// JSON file holding an array of records.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Directory of `*.json` record arrays.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Remote host to collect raw log lines from over SSH.
    #[arg(long, requires = "remote_path")]
    pub ssh_host: Option<String>,

    /// SSH user.
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// SSH port.
    #[arg(long, default_value_t = logdash::collector::DEFAULT_SSH_PORT)]
    pub ssh_port: u16,

    /// SSH identity file.
    #[arg(long)]
    pub ssh_key: Option<PathBuf>,

    /// Seconds before the remote fetch is abandoned.
    #[arg(long, default_value_t = logdash::collector::DEFAULT_FETCH_TIMEOUT.as_secs())]
    pub ssh_timeout_secs: u64,

    /// Remote directory to search.
    #[arg(long)]
    pub remote_path: Option<String>,

    /// File name pattern on the remote host.
    #[arg(long, default_value = logdash::collector::DEFAULT_PATTERN)]
    pub pattern: String,

    /// Trailing lines read from each remote file.
    #[arg(long, default_value_t = logdash::collector::DEFAULT_MAX_LINES)]
    pub max_lines: usize,

    /// Keep each raw remote fetch under `<DIR>/<YYYY-MM-DD>/`.
    #[arg(long, value_name = "DIR", requires = "ssh_host")]
    pub save_raw: Option<PathBuf>,

    /// Log the matching remote files before fetching.
    #[arg(long, requires = "ssh_host")]
    pub list_remote: bool,

    /// Write the accepted records here as a JSON array.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `seed`.
#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["logdash", "serve"]);

        assert_eq!(cli.log_format, LogFormat::Text);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind, DEFAULT_BIND_ADDR);
        assert!(args.cors_origins.is_empty());
        assert_eq!(args.compaction_interval_secs, 60);
        assert!(args.ingest_dir.is_none());
        assert!(!args.seed);
    }

    #[test]
    fn test_serve_with_options() {
        let cli = Cli::parse_from([
            "logdash",
            "serve",
            "--bind",
            "127.0.0.1:8080",
            "--cors-origin",
            "http://localhost:5173",
            "--cors-origin",
            "https://logs.example.com",
            "--compaction-interval-secs",
            "5",
            "--ingest-dir",
            "/var/lib/logdash",
            "--seed",
            "--log-format",
            "json",
        ]);

        assert_eq!(cli.log_format, LogFormat::Json);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind.port(), 8080);
        assert_eq!(args.cors_origins.len(), 2);
        assert_eq!(args.compaction_interval_secs, 5);
        assert_eq!(args.ingest_dir, Some(PathBuf::from("/var/lib/logdash")));
        assert!(args.seed);
    }

    #[test]
    fn test_serve_rejects_zero_interval() {
        let result = Cli::try_parse_from(["logdash", "serve", "--compaction-interval-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ingest_requires_input() {
        assert!(Cli::try_parse_from(["logdash", "ingest"]).is_err());
    }

    #[test]
    fn test_ingest_ssh_requires_remote_path() {
        assert!(Cli::try_parse_from(["logdash", "ingest", "--ssh-host", "web-1"]).is_err());
    }

    #[test]
    fn test_ingest_ssh_defaults() {
        let cli = Cli::parse_from([
            "logdash",
            "ingest",
            "--ssh-host",
            "web-1",
            "--remote-path",
            "/var/log/app",
        ]);

        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.ssh_host.as_deref(), Some("web-1"));
        assert_eq!(args.ssh_port, 22);
        assert_eq!(args.ssh_timeout_secs, 15);
        assert_eq!(args.pattern, "*.log");
        assert_eq!(args.max_lines, 1000);
        assert!(args.output.is_none());
        assert!(args.save_raw.is_none());
        assert!(!args.list_remote);
    }

    #[test]
    fn test_ingest_save_raw_and_list() {
        let cli = Cli::parse_from([
            "logdash",
            "ingest",
            "--ssh-host",
            "web-1",
            "--remote-path",
            "/var/log/app",
            "--save-raw",
            "raw",
            "--list-remote",
        ]);

        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.save_raw, Some(PathBuf::from("raw")));
        assert!(args.list_remote);
    }

    #[test]
    fn test_save_raw_requires_ssh_host() {
        let result = Cli::try_parse_from(["logdash", "ingest", "--file", "a.json", "--save-raw", "raw"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ingest_file_and_dir() {
        let cli = Cli::parse_from([
            "logdash", "ingest", "--file", "a.json", "--dir", "logs", "-o", "out.json",
        ]);

        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.file, Some(PathBuf::from("a.json")));
        assert_eq!(args.dir, Some(PathBuf::from("logs")));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_seed_to_stdout() {
        let cli = Cli::parse_from(["logdash", "seed"]);
        assert!(matches!(cli.command, Commands::Seed(SeedArgs { out: None })));
    }
}
