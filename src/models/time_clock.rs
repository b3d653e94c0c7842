use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeClockEntry {
    pub id: String,
    pub staff_id: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
}

impl TimeClockEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Time worked inside `[from, to)`. Open entries count up to `to`.
    pub fn worked_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
        let start = self.clock_in.max(from);
        let end = self.clock_out.unwrap_or(to).min(to);
        if end > start {
            end - start
        } else {
            Duration::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn worked_time_is_clipped_to_window() {
        let entry = TimeClockEntry {
            id: "t1".into(),
            staff_id: "s1".into(),
            clock_in: at(6),
            clock_out: Some(at(14)),
        };
        assert_eq!(entry.worked_within(at(8), at(12)), Duration::hours(4));
        assert_eq!(entry.worked_within(at(15), at(18)), Duration::zero());
    }

    #[test]
    fn open_entry_counts_until_window_end() {
        let entry = TimeClockEntry {
            id: "t1".into(),
            staff_id: "s1".into(),
            clock_in: at(9),
            clock_out: None,
        };
        assert!(entry.is_open());
        assert_eq!(entry.worked_within(at(0), at(11)), Duration::hours(2));
    }
}
