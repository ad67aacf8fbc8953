use chrono::NaiveTime;
use sw_schemas::{seconds_of_day, LocalizedObservation, StoreStatus};

/// Attributed seconds for one store-day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayTotals {
    pub uptime_seconds: i64,
    pub downtime_seconds: i64,
    /// Attribution of the final interval only (not a trailing 60 minutes).
    pub uptime_last_hour_seconds: i64,
    pub downtime_last_hour_seconds: i64,
}

impl DayTotals {
    pub fn total_seconds(&self) -> i64 {
        self.uptime_seconds + self.downtime_seconds
    }

    fn attribute(&mut self, status: StoreStatus, secs: i64) {
        if status.is_active() {
            self.uptime_seconds += secs;
            self.uptime_last_hour_seconds = secs;
            self.downtime_last_hour_seconds = 0;
        } else {
            self.downtime_seconds += secs;
            self.downtime_last_hour_seconds = secs;
            self.uptime_last_hour_seconds = 0;
        }
    }
}

/// Last-known-state extrapolation over one day's in-window polls.
///
/// Every gap is credited to the status of the poll that *ends* it. The first
/// poll ends the gap that opens at `window_start`. Gaps are wall-clock
/// differences of the local time of day, in whole seconds.
///
/// Polls are expected in ascending time-of-day order. A step backwards adds
/// no time, so the total never exceeds `last poll - window_start`.
///
/// Returns `None` when there are no polls.
pub fn extrapolate_day<'a, I>(window_start: NaiveTime, observations: I) -> Option<DayTotals>
where
    I: IntoIterator<Item = &'a LocalizedObservation>,
{
    let mut totals = DayTotals::default();
    let mut prev: Option<i64> = None;

    for o in observations {
        let cur = o.seconds_of_day();
        let from = prev.unwrap_or_else(|| seconds_of_day(window_start));
        totals.attribute(o.status(), (cur - from).max(0));
        prev = Some(cur);
    }

    prev.map(|_| totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;
    use sw_schemas::PollingObservation;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at_secs(secs: u32, status: StoreStatus) -> LocalizedObservation {
        let date = NaiveDate::from_ymd_opt(2023, 1, 23).unwrap();
        let ts = date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap());
        LocalizedObservation {
            observation: PollingObservation {
                store_id: "1".to_string(),
                timestamp_utc: Utc.from_utc_datetime(&ts),
                status,
            },
            local_timestamp: ts,
            local_date: date,
            weekday: 0,
        }
    }

    fn at(h: u32, m: u32, status: StoreStatus) -> LocalizedObservation {
        at_secs(h * 3600 + m * 60, status)
    }

    #[test]
    fn empty_day_yields_nothing() {
        let none: Vec<LocalizedObservation> = Vec::new();
        assert_eq!(extrapolate_day(t(0, 0), &none), None);
    }

    #[test]
    fn inactive_then_active_in_24x7_day() {
        let day = vec![
            at(8, 0, StoreStatus::Inactive),
            at(10, 0, StoreStatus::Active),
        ];
        let d = extrapolate_day(t(0, 0), &day).unwrap();
        assert_eq!(d.downtime_seconds, 8 * 3600);
        assert_eq!(d.uptime_seconds, 2 * 3600);
        assert_eq!(d.uptime_last_hour_seconds, 2 * 3600);
        assert_eq!(d.downtime_last_hour_seconds, 0);
    }

    #[test]
    fn single_poll_inside_business_window() {
        let day = vec![at(12, 0, StoreStatus::Active)];
        let d = extrapolate_day(t(9, 0), &day).unwrap();
        assert_eq!(d.uptime_seconds, 3 * 3600);
        assert_eq!(d.downtime_seconds, 0);
        assert_eq!(d.uptime_last_hour_seconds, 3 * 3600);
    }

    #[test]
    fn gap_goes_to_the_later_poll() {
        let day = vec![
            at(9, 0, StoreStatus::Active),
            at(9, 30, StoreStatus::Inactive),
            at(10, 15, StoreStatus::Active),
        ];
        let d = extrapolate_day(t(9, 0), &day).unwrap();
        assert_eq!(d.downtime_seconds, 30 * 60);
        assert_eq!(d.uptime_seconds, 45 * 60);
        assert_eq!(d.uptime_last_hour_seconds, 45 * 60);
        assert_eq!(d.downtime_last_hour_seconds, 0);
    }

    #[test]
    fn last_hour_reflects_final_status_only() {
        let day = vec![
            at(1, 0, StoreStatus::Active),
            at(5, 0, StoreStatus::Inactive),
        ];
        let d = extrapolate_day(t(0, 0), &day).unwrap();
        assert_eq!(d.uptime_last_hour_seconds, 0);
        assert_eq!(d.downtime_last_hour_seconds, 4 * 3600);
    }

    #[test]
    fn backwards_step_adds_no_time() {
        let day = vec![
            at(1, 30, StoreStatus::Active),
            at(1, 10, StoreStatus::Inactive),
        ];
        let d = extrapolate_day(t(0, 0), &day).unwrap();
        assert_eq!(d.uptime_seconds, 90 * 60);
        assert_eq!(d.downtime_seconds, 0);
        assert_eq!(d.total_seconds(), 90 * 60);
    }

    proptest! {
        #[test]
        fn prop_total_spans_window_start_to_last_poll(
            mut secs in proptest::collection::vec(0u32..86_400, 1..40),
            flags in proptest::collection::vec(any::<bool>(), 40),
        ) {
            secs.sort_unstable();
            let day: Vec<LocalizedObservation> = secs
                .iter()
                .zip(flags.iter())
                .map(|(s, up)| at_secs(*s, if *up { StoreStatus::Active } else { StoreStatus::Inactive }))
                .collect();
            let d = extrapolate_day(NaiveTime::MIN, &day).unwrap();
            let last = i64::from(*secs.last().unwrap());
            prop_assert_eq!(d.total_seconds(), last);
            prop_assert!(d.total_seconds() <= crate::DAY_SECONDS);
            prop_assert!(d.uptime_last_hour_seconds == 0 || d.downtime_last_hour_seconds == 0);
        }
    }
}
