/// Milliseconds since the Unix epoch, the timestamp unit carried by snapshots.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Whether a payload stamped at `timestamp_ms` is older than `threshold_ms`
/// relative to `now_ms`. Timestamps from the future are never stale.
pub fn is_stale(now_ms: u64, timestamp_ms: u64, threshold_ms: u64) -> bool {
    now_ms.saturating_sub(timestamp_ms) > threshold_ms
}
