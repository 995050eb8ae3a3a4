//! Remote log collection.
//!
//! This module provides:
//! - [`LineParser`] — Turns raw collector lines into candidate records
//! - [`RemoteCollector`] — Transport seam: produces text, may fail, may time out
//! - [`SshCollector`] — Fetches log tails from a host over the system `ssh` client

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::{LogError, Result, ValidationError};
use crate::types::{CandidateRecord, LogLevel, TimestampInput};
use crate::validate::parse_instant;

/// Default file name pattern for remote fetches.
pub const DEFAULT_PATTERN: &str = "*.log";

/// Default number of trailing lines per remote file.
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default time allowed for a whole remote fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Exit status of `find` when some entries could not be read.
const PARTIAL_READ_STATUS: i32 = 1;

/// Level prefixes recognised in plain text lines, longest first.
const LEVEL_PREFIXES: [(&str, LogLevel); 7] = [
    ("WARNING", LogLevel::Warn),
    ("ERROR", LogLevel::Error),
    ("DEBUG", LogLevel::Debug),
    ("INFO", LogLevel::Info),
    ("WARN", LogLevel::Warn),
    ("ERR", LogLevel::Error),
    ("DBG", LogLevel::Debug),
];

const SEPARATORS: [char; 5] = [':', ' ', '|', '\t', '-'];

// ============================================================================
// Line parsing
// ============================================================================

/// Parser for raw log lines.
///
/// JSON object lines are decoded as records. Other lines may start with an
/// RFC 3339 timestamp and a level prefix (`ERROR:`, `[WARN]`, `info |`); the
/// remainder is the message.
#[derive(Debug, Clone)]
pub struct LineParser {
    /// Source recorded on plain lines
    source: String,
    /// Level for lines without a recognised prefix
    default_level: LogLevel,
}

impl LineParser {
    /// Creates a parser that labels plain lines with `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            default_level: LogLevel::Info,
        }
    }

    /// Sets the level used when no prefix is found.
    #[must_use]
    pub const fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Returns the source label.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parses a line, stamping plain lines without a timestamp with the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON object line has wrongly-typed fields.
    pub fn parse(&self, line: &str) -> std::result::Result<CandidateRecord, ValidationError> {
        self.parse_at(line, Utc::now())
    }

    /// Same as [`Self::parse`] with an explicit fallback time.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON object line has wrongly-typed fields.
    pub fn parse_at(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<CandidateRecord, ValidationError> {
        let trimmed = line.trim();

        if trimmed.starts_with('{') {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
                return CandidateRecord::from_value(value);
            }
        }

        Ok(self.parse_plain(trimmed, now))
    }

    fn parse_plain(&self, line: &str, now: DateTime<Utc>) -> CandidateRecord {
        let (timestamp, rest) = split_timestamp(line);
        let (level, message) = split_level(rest).unwrap_or((self.default_level, rest));

        CandidateRecord::new()
            .with_timestamp(TimestampInput::Instant(timestamp.unwrap_or(now)))
            .with_level(level.as_str())
            .with_message(message)
            .with_source(self.source.clone())
    }
}

/// Splits a leading RFC 3339 token (optionally bracketed) off a line.
fn split_timestamp(line: &str) -> (Option<DateTime<Utc>>, &str) {
    let (head, tail) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));

    match parse_instant(head.trim_matches(['[', ']'])) {
        Some(ts) => (Some(ts), tail.trim_start()),
        None => (None, line),
    }
}

/// Splits a level prefix off a line.
fn split_level(line: &str) -> Option<(LogLevel, &str)> {
    LEVEL_PREFIXES.iter().find_map(|&(prefix, level)| {
        let bracketed = line
            .strip_prefix('[')
            .and_then(|s| strip_prefix_ignore_case(s, prefix))
            .and_then(|s| s.strip_prefix(']'));
        if let Some(rest) = bracketed {
            return Some((level, rest.trim_start_matches(SEPARATORS).trim_end()));
        }

        let rest = strip_prefix_ignore_case(line, prefix)?;
        if rest.is_empty() || rest.starts_with(SEPARATORS) {
            Some((level, rest.trim_start_matches(SEPARATORS).trim_end()))
        } else {
            None
        }
    })
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

// ============================================================================
// Remote collectors
// ============================================================================

/// What to fetch from a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Directory searched for log files
    pub path: String,
    /// File name glob
    pub pattern: String,
    /// Trailing lines taken from each file
    pub max_lines: usize,
}

impl FetchRequest {
    /// Creates a request with the default pattern and line count.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            max_lines: DEFAULT_MAX_LINES,
        }
    }

    /// Sets the file name pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Sets the trailing line count.
    #[must_use]
    pub const fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }
}

/// A transport that produces raw log text.
pub trait RemoteCollector: Send + Sync {
    /// Fetches the text described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Collector`] on transport failure and
    /// [`LogError::CollectorTimeout`] if the fetch does not finish in time.
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<String>> + Send;

    /// Lists the files under `path` whose names match `pattern`.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteCollector::fetch`].
    fn list_files(
        &self,
        path: &str,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Label recorded as the source of plain lines from this collector.
    fn source(&self) -> &str;
}

/// Connection settings for [`SshCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    /// Remote host name or address
    pub host: String,
    /// Remote user, if not the local default
    pub user: Option<String>,
    /// Remote port
    pub port: u16,
    /// Identity file passed with `-i`
    pub identity_file: Option<PathBuf>,
    /// Limit on the whole fetch
    pub timeout: Duration,
}

impl SshConfig {
    /// Creates a config for `host` with defaults for everything else.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: DEFAULT_SSH_PORT,
            identity_file: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Sets the remote user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the remote port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the identity file.
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `user@host` or `host`.
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

/// Collector that tails remote files through the system `ssh` client.
#[derive(Debug, Clone)]
pub struct SshCollector {
    config: SshConfig,
    program: String,
}

impl SshCollector {
    /// Creates a collector for the given connection.
    #[must_use]
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            program: "ssh".to_string(),
        }
    }

    /// Overrides the client binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn config(&self) -> &SshConfig {
        &self.config
    }

    /// The shell command run on the remote host.
    #[must_use]
    pub fn remote_command(request: &FetchRequest) -> String {
        format!(
            "find {} -name {} -type f -exec tail -n {} {{}} +",
            shell_quote(&request.path),
            shell_quote(&request.pattern),
            request.max_lines
        )
    }

    /// The shell command that lists matching files on the remote host.
    #[must_use]
    pub fn list_command(path: &str, pattern: &str) -> String {
        format!(
            "find {} -name {} -type f",
            shell_quote(path),
            shell_quote(pattern)
        )
    }

    /// Full argument list passed to the client binary.
    #[must_use]
    pub fn command_args(&self, request: &FetchRequest) -> Vec<String> {
        self.client_args(Self::remote_command(request))
    }

    fn client_args(&self, remote_command: String) -> Vec<String> {
        let connect_secs = self.config.timeout.as_secs().max(1);
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={connect_secs}"),
            "-p".to_string(),
            self.config.port.to_string(),
        ];
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args.push(self.config.destination());
        args.push(remote_command);
        args
    }

    /// Runs `remote_command` on the host and returns its stdout.
    ///
    /// Exit status 1 with output is a partial read (`find` could not enter
    /// some directory) and keeps the output; stderr is logged.
    async fn run(&self, remote_command: String) -> Result<String> {
        let mut command = Command::new(&self.program);
        command
            .args(self.client_args(remote_command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| {
                error!(host = %self.config.host, timeout = ?self.config.timeout, "remote fetch timed out");
                LogError::CollectorTimeout(self.config.timeout)
            })?
            .map_err(|e| {
                error!(host = %self.config.host, error = %e, "failed to start ssh client");
                LogError::Collector(format!("failed to run {}: {e}", self.program))
            })?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        match output.status.code() {
            _ if output.status.success() => {}
            Some(PARTIAL_READ_STATUS) if !text.trim().is_empty() => {
                warn!(host = %self.config.host, status = %output.status, %stderr, "remote command partially failed");
            }
            _ => {
                error!(host = %self.config.host, status = %output.status, %stderr, "remote command failed");
                return Err(LogError::Collector(format!(
                    "{} exited with {}: {stderr}",
                    self.program, output.status
                )));
            }
        }

        Ok(text)
    }
}

impl RemoteCollector for SshCollector {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        info!(
            host = %self.config.host,
            path = %request.path,
            pattern = %request.pattern,
            max_lines = request.max_lines,
            "fetching remote logs"
        );

        let text = self.run(Self::remote_command(request)).await?;
        info!(host = %self.config.host, bytes = text.len(), "remote fetch complete");
        Ok(text)
    }

    async fn list_files(&self, path: &str, pattern: &str) -> Result<Vec<String>> {
        let text = self.run(Self::list_command(path, pattern)).await?;
        let files: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        info!(host = %self.config.host, path, count = files.len(), "remote files listed");
        Ok(files)
    }

    fn source(&self) -> &str {
        &self.config.host
    }
}

/// Quotes a string for a POSIX shell.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
