//! Wall-clock timestamps.
//!
//! `web_time` provides a `SystemTime` that also works in the browser, where
//! `std::time::SystemTime::now` panics. `chrono` only formats the result.

use chrono::{DateTime, Utc};
use web_time::{SystemTime, UNIX_EPOCH};

/// Current time in UTC with millisecond precision.
pub fn now_utc() -> DateTime<Utc> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        let now = now_utc();
        assert!(now.timestamp() > 1_577_836_800);
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
