//! Timestamp resolution

use chrono::{DateTime, Utc};
use contracts::HostTimestamp;
use tracing::warn;

/// Resolve a host timestamp to a UTC instant
///
/// Priority: structured host time, then whole epoch seconds, then the
/// current wall clock. Seconds outside chrono's range fall back to the
/// wall clock.
pub fn resolve_timestamp(timestamp: &HostTimestamp) -> DateTime<Utc> {
    match *timestamp {
        HostTimestamp::EventTime(time) => time,
        HostTimestamp::Seconds(secs) => i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                warn!(seconds = secs, "epoch seconds out of range, using wall clock");
                Utc::now()
            }),
        HostTimestamp::Unknown => Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_event_time_is_exact() {
        let time = DateTime::from_timestamp(1_600_000_000, 123_456_789).unwrap();
        assert_eq!(resolve_timestamp(&HostTimestamp::EventTime(time)), time);
    }

    #[test]
    fn test_epoch_seconds() {
        let resolved = resolve_timestamp(&HostTimestamp::Seconds(1_000_000_000));
        assert_eq!(resolved.to_rfc3339(), "2001-09-09T01:46:40+00:00");
    }

    #[test]
    fn test_unknown_uses_wall_clock() {
        let before = Utc::now();
        let resolved = resolve_timestamp(&HostTimestamp::Unknown);
        let after = Utc::now();
        assert!(resolved >= before && resolved <= after);
        assert!(after - resolved < TimeDelta::seconds(1));
    }

    #[test]
    fn test_out_of_range_seconds_use_wall_clock() {
        let resolved = resolve_timestamp(&HostTimestamp::Seconds(u64::MAX));
        assert!(Utc::now() - resolved < TimeDelta::seconds(1));
    }
}
