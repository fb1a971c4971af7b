/// Time source, injectable so scoring and retention are testable at fixed
/// instants.
pub trait ClockPort: Send + Sync {
    /// Current time as epoch milliseconds (UTC).
    fn now_ms(&self) -> i64;
}
