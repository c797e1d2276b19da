pub mod errors;
pub mod log;
pub mod types;

/// Wall clock in milliseconds since the unix epoch.
pub fn timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
