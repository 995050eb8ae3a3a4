//! Sample records for demos and local development.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

/// Number of randomly generated records added after the fixed samples.
pub const RANDOM_RECORDS: usize = 100;

const LEVELS: [&str; 4] = ["error", "warn", "info", "debug"];
const SOURCES: [&str; 5] = ["api-server", "auth-service", "file-service", "monitoring", "database"];
const ERROR_CODES: [&str; 5] = ["DB_CONN_001", "AUTH_001", "FILE_001", "NET_001", "MEM_001"];
const REQUEST_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed samples followed by [`RANDOM_RECORDS`] random ones, as JSON candidates.
#[must_use]
pub fn seed_records(now: DateTime<Utc>) -> Vec<Value> {
    let mut rng = rand::thread_rng();
    let mut records = sample_records(now);
    records.extend(random_records(&mut rng, RANDOM_RECORDS, now));
    records
}

/// A short, fixed incident timeline ending at `now`.
#[must_use]
pub fn sample_records(now: DateTime<Utc>) -> Vec<Value> {
    let at = |minutes: i64| (now - Duration::minutes(minutes)).to_rfc3339();

    vec![
        json!({
            "timestamp": at(30),
            "level": "error",
            "message": "Database connection failed",
            "source": "api-server",
            "errorCode": "DB_CONN_001",
            "context": {"retryCount": 3, "timeout": 5000}
        }),
        json!({
            "timestamp": at(25),
            "level": "error",
            "message": "Database connection failed",
            "source": "api-server",
            "errorCode": "DB_CONN_001",
            "context": {"retryCount": 3, "timeout": 5000}
        }),
        json!({
            "timestamp": at(20),
            "level": "warn",
            "message": "High memory usage detected",
            "source": "monitoring",
            "context": {"memoryUsage": 85, "threshold": 80}
        }),
        json!({
            "timestamp": at(15),
            "level": "info",
            "message": "User login successful",
            "source": "auth-service",
            "context": {"userId": "user123"}
        }),
        json!({
            "timestamp": at(10),
            "level": "error",
            "message": "Invalid authentication token",
            "source": "auth-service",
            "errorCode": "AUTH_001",
            "context": {"tokenType": "JWT"}
        }),
        json!({
            "timestamp": at(5),
            "level": "error",
            "message": "Invalid authentication token",
            "source": "auth-service",
            "errorCode": "AUTH_001",
            "context": {"tokenType": "JWT"}
        }),
        json!({
            "timestamp": at(2),
            "level": "debug",
            "message": "Processing request",
            "source": "api-server",
            "context": {"endpoint": "/api/users", "method": "GET"}
        }),
        json!({
            "timestamp": at(1),
            "level": "info",
            "message": "File upload completed",
            "source": "file-service",
            "context": {"fileSize": 1_024_000, "fileName": "document.pdf"}
        }),
        json!({
            "timestamp": at(0),
            "level": "warn",
            "message": "Slow query detected",
            "source": "database",
            "context": {"queryTime": 2500, "threshold": 1000}
        }),
    ]
}

/// `count` records spread over the 24 hours before `now`.
///
/// Only error records carry an error code.
pub fn random_records<R: Rng + ?Sized>(rng: &mut R, count: usize, now: DateTime<Utc>) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let timestamp = now - Duration::seconds(rng.gen_range(0..24 * 60 * 60));
            let level = LEVELS.choose(rng).copied().unwrap_or("info");
            let source = SOURCES.choose(rng).copied().unwrap_or("api-server");
            let error_code = if level == "error" {
                ERROR_CODES.choose(rng).copied()
            } else {
                None
            };

            let mut record = json!({
                "timestamp": timestamp.to_rfc3339(),
                "level": level,
                "message": format!("Sample log message {}", i + 1),
                "source": source,
                "context": {
                    "requestId": request_id(rng),
                    "timestamp": timestamp.timestamp_millis()
                }
            });
            if let (Some(code), Some(fields)) = (error_code, record.as_object_mut()) {
                fields.insert("errorCode".to_string(), Value::from(code));
            }
            record
        })
        .collect()
}

fn request_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..9)
        .map(|_| char::from(REQUEST_ID_CHARS[rng.gen_range(0..REQUEST_ID_CHARS.len())]))
        .collect();
    format!("req_{suffix}")
}
