use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use sw_schemas::{LocalizedObservation, PollingObservation};

/// Project UTC polls into `tz` wall-clock time.
///
/// Output is ordered by UTC timestamp regardless of input order; ties keep
/// their input order. DST offsets come from the tz database.
pub fn project(observations: &[PollingObservation], tz: Tz) -> Vec<LocalizedObservation> {
    let mut ordered: Vec<&PollingObservation> = observations.iter().collect();
    ordered.sort_by_key(|o| o.timestamp_utc);

    ordered
        .into_iter()
        .map(|o| {
            let local_timestamp = o.timestamp_utc.with_timezone(&tz).naive_local();
            LocalizedObservation {
                observation: o.clone(),
                local_timestamp,
                local_date: local_timestamp.date(),
                weekday: local_timestamp.weekday().num_days_from_monday() as u8,
            }
        })
        .collect()
}

/// Group projected polls by local calendar date, preserving order within a day.
pub fn partition_by_local_date(
    observations: Vec<LocalizedObservation>,
) -> BTreeMap<NaiveDate, Vec<LocalizedObservation>> {
    let mut days: BTreeMap<NaiveDate, Vec<LocalizedObservation>> = BTreeMap::new();
    for o in observations {
        days.entry(o.local_date).or_default().push(o);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveTime, Utc};
    use sw_schemas::StoreStatus;

    fn obs(ts: &str, status: StoreStatus) -> PollingObservation {
        PollingObservation {
            store_id: "7".to_string(),
            timestamp_utc: ts.parse::<DateTime<Utc>>().unwrap(),
            status,
        }
    }

    #[test]
    fn chicago_offset_and_weekday() {
        // 2023-01-25 is a Wednesday; 03:00Z is 21:00 CST on Tuesday the 24th.
        let out = project(
            &[obs("2023-01-25T03:00:00Z", StoreStatus::Active)],
            chrono_tz::America::Chicago,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].local_date, NaiveDate::from_ymd_opt(2023, 1, 24).unwrap());
        assert_eq!(out[0].time_of_day(), NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(out[0].weekday, 1);
    }

    #[test]
    fn dst_spring_forward_uses_daylight_offset() {
        // 2023-03-12: US DST starts at 02:00 local. 15:00Z is 10:00 CDT (UTC-5).
        let out = project(
            &[obs("2023-03-12T15:00:00Z", StoreStatus::Active)],
            chrono_tz::America::Chicago,
        );
        assert_eq!(out[0].time_of_day(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(out[0].weekday, 6);
    }

    #[test]
    fn output_is_sorted_by_utc_timestamp() {
        let out = project(
            &[
                obs("2023-01-25T12:00:00Z", StoreStatus::Inactive),
                obs("2023-01-25T10:00:00Z", StoreStatus::Active),
            ],
            chrono_tz::UTC,
        );
        assert_eq!(out[0].status(), StoreStatus::Active);
        assert_eq!(out[1].status(), StoreStatus::Inactive);
    }

    #[test]
    fn partition_groups_by_local_date() {
        let out = project(
            &[
                obs("2023-01-24T10:00:00Z", StoreStatus::Active),
                obs("2023-01-25T10:00:00Z", StoreStatus::Active),
                obs("2023-01-25T11:00:00Z", StoreStatus::Inactive),
            ],
            chrono_tz::UTC,
        );
        let days = partition_by_local_date(out);
        let sizes: Vec<usize> = days.values().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 2]);
    }
}
