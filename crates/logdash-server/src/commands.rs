//! Execution of the `ingest` and `seed` subcommands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use logdash::{
    BatchReport, FetchRequest, IngestPipeline, LineParser, LogRecord, RecordFilter,
    RemoteCollector, Result, SharedStore, SshCollector, SshConfig, shared_store,
};
use tracing::{info, warn};

use crate::cli::{IngestArgs, ServeArgs};
use crate::config::ServerConfig;
use crate::seed::seed_records;

/// Resolve `serve` arguments into a server configuration.
#[must_use]
pub fn serve_config(args: &ServeArgs) -> ServerConfig {
    let mut config = ServerConfig::new(args.bind)
        .with_compaction_interval(Duration::from_secs(args.compaction_interval_secs))
        .with_seed(args.seed);
    for origin in &args.cors_origins {
        config = config.with_cors_origin(origin);
    }
    if let Some(dir) = &args.ingest_dir {
        config = config.with_ingest_dir(dir);
    }
    config
}

/// Build the SSH collector and request described by `ingest` arguments.
///
/// Returns `None` when no remote host was given.
#[must_use]
pub fn remote_source(args: &IngestArgs) -> Option<(SshCollector, FetchRequest)> {
    let host = args.ssh_host.as_ref()?;
    let path = args.remote_path.as_ref()?;

    let mut config = SshConfig::new(host)
        .with_port(args.ssh_port)
        .with_timeout(Duration::from_secs(args.ssh_timeout_secs));
    if let Some(user) = &args.ssh_user {
        config = config.with_user(user);
    }
    if let Some(key) = &args.ssh_key {
        config = config.with_identity_file(key);
    }

    let request = FetchRequest::new(path)
        .with_pattern(&args.pattern)
        .with_max_lines(args.max_lines);

    Some((SshCollector::new(config), request))
}

/// Run every input named by `ingest` into a fresh store.
///
/// Returns the combined report and the store holding what was accepted.
///
/// # Errors
///
/// Returns an error if an explicitly named file cannot be read or is not a
/// JSON array, the directory cannot be listed, or the remote fetch fails.
pub async fn ingest(args: &IngestArgs) -> Result<(BatchReport, SharedStore)> {
    let store = shared_store();
    let pipeline = IngestPipeline::new(SharedStore::clone(&store));
    let mut total = BatchReport::default();

    if let Some(file) = &args.file {
        total.merge(pipeline.ingest_file(file).await?);
    }

    if let Some(dir) = &args.dir {
        for file in pipeline.ingest_dir(dir).await? {
            match file.result {
                Ok(report) => total.merge(report),
                Err(e) => warn!(path = %file.path.display(), error = %e, "skipped file"),
            }
        }
    }

    if let Some((collector, request)) = remote_source(args) {
        if args.list_remote {
            list_remote(&collector, &request).await?;
        }
        let report = collect(&pipeline, &collector, &request, args.save_raw.as_deref()).await?;
        total.merge(report);
    }

    if let Some(output) = &args.output {
        let written = write_records(&store, output)?;
        info!(path = %output.display(), records = written, "accepted records written");
    }

    Ok((total, store))
}

/// Log every remote file the request would read.
///
/// # Errors
///
/// Returns an error if the listing command fails.
pub async fn list_remote<C: RemoteCollector>(
    collector: &C,
    request: &FetchRequest,
) -> Result<Vec<String>> {
    let files = collector.list_files(&request.path, &request.pattern).await?;
    for file in &files {
        info!(host = collector.source(), file = %file, "remote file");
    }
    Ok(files)
}

/// Fetch from `collector` and ingest the lines, keeping a raw copy under
/// `save_raw` when given.
///
/// # Errors
///
/// Returns an error if the fetch fails, the raw copy cannot be written or the
/// store is closed.
pub async fn collect<C: RemoteCollector>(
    pipeline: &IngestPipeline<SharedStore>,
    collector: &C,
    request: &FetchRequest,
    save_raw: Option<&Path>,
) -> Result<BatchReport> {
    let Some(dir) = save_raw else {
        return pipeline.ingest_remote(collector, request).await;
    };

    let text = collector.fetch(request).await?;
    let path = save_raw_text(dir, collector.source(), &text, Utc::now())?;
    info!(path = %path.display(), bytes = text.len(), "raw logs saved");
    pipeline.ingest_lines(&text, &LineParser::new(collector.source()))
}

/// Write fetched text to `<dir>/<YYYY-MM-DD>/<host>-<YYYYMMDDTHHMMSSZ>.log`.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_raw_text(dir: &Path, host: &str, text: &str, at: DateTime<Utc>) -> Result<PathBuf> {
    let day = dir.join(at.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day)?;
    let path = day.join(format!("{host}-{}.log", at.format("%Y%m%dT%H%M%SZ")));
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Write every visible record in `store` to `path` as a JSON array.
///
/// # Errors
///
/// Returns an error if the store is closed or the file cannot be written.
pub fn write_records(store: &SharedStore, path: &Path) -> Result<usize> {
    let records: Vec<LogRecord> = store
        .query(&RecordFilter::new())?
        .iter()
        .map(|stored| stored.record.clone())
        .collect();
    let json = serde_json::to_vec_pretty(&records)?;
    std::fs::write(path, json)?;
    Ok(records.len())
}

/// Write the sample records as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn seed<W: Write>(writer: &mut W) -> Result<usize> {
    let records = seed_records(Utc::now());
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    Ok(records.len())
}
