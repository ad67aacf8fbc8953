//! End-to-end scenarios for the per-store pipeline.
//!
//! Reference dates (local):
//!   2023-01-23 Mon .. 2023-01-29 Sun
//!   2023-01-16 Mon (one week before)
//!
//! Stores in these scenarios run on UTC unless stated, so local == UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use proptest::prelude::*;
use sw_schemas::{seconds_of_day, BusinessHoursRule, PollingObservation, StoreStatus};
use sw_uptime::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STORE: &str = "1481966498820158979";

fn poll(ts: &str, status: StoreStatus) -> PollingObservation {
    PollingObservation {
        store_id: STORE.to_string(),
        timestamp_utc: ts.parse::<DateTime<Utc>>().unwrap(),
        status,
    }
}

fn hours(weekday: u8, start: (u32, u32), end: (u32, u32)) -> BusinessHoursRule {
    BusinessHoursRule {
        store_id: STORE.to_string(),
        weekday,
        start_time_local: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time_local: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
    }
}

use StoreStatus::{Active, Inactive};

// ---------------------------------------------------------------------------
// Always-open path
// ---------------------------------------------------------------------------

#[test]
fn always_open_day_measures_from_midnight() {
    let polls = vec![
        poll("2023-01-23T08:00:00Z", Inactive),
        poll("2023-01-23T10:00:00Z", Active),
    ];
    let row = compute_store_row(STORE, chrono_tz::UTC, &[], &polls).unwrap();

    assert_eq!(row.store_id, STORE);
    assert_eq!(row.downtime_last_day_hours, 8.0);
    assert_eq!(row.uptime_last_day_hours, 2.0);
    assert_eq!(row.uptime_last_hour_minutes, 120.0);
    assert_eq!(row.downtime_last_hour_minutes, 0.0);
}

// ---------------------------------------------------------------------------
// Business-hours path
// ---------------------------------------------------------------------------

#[test]
fn business_window_single_poll() {
    let polls = vec![poll("2023-01-23T12:00:00Z", Active)];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    let row = compute_store_row(STORE, chrono_tz::UTC, &rules, &polls).unwrap();

    assert_eq!(row.uptime_last_day_hours, 3.0);
    assert_eq!(row.uptime_last_hour_minutes, 180.0);
    assert_eq!(row.downtime_last_day_hours, 0.0);
}

#[test]
fn polls_outside_window_are_ignored() {
    let polls = vec![
        poll("2023-01-23T07:00:00Z", Inactive),
        poll("2023-01-23T10:00:00Z", Active),
        poll("2023-01-23T20:00:00Z", Inactive),
    ];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    let days = extrapolate_store(STORE, chrono_tz::UTC, &rules, &polls);

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].uptime_seconds, 3600);
    assert_eq!(days[0].downtime_seconds, 0);
}

#[test]
fn day_filtered_to_empty_is_skipped() {
    let polls = vec![
        poll("2023-01-23T07:00:00Z", Active),
        poll("2023-01-24T10:00:00Z", Active),
    ];
    let rules = vec![hours(0, (9, 0), (17, 0)), hours(1, (9, 0), (17, 0))];
    let days = extrapolate_store(STORE, chrono_tz::UTC, &rules, &polls);

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].weekday, 1);
}

#[test]
fn weekday_without_rule_is_open_all_day() {
    // Rules exist for Monday only; Tuesday falls back to 24x7.
    let polls = vec![poll("2023-01-24T06:00:00Z", Inactive)];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    let days = extrapolate_store(STORE, chrono_tz::UTC, &rules, &polls);

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].downtime_seconds, 6 * 3600);
}

#[test]
fn day_total_never_exceeds_window() {
    let polls = vec![
        poll("2023-01-23T09:00:00Z", Active),
        poll("2023-01-23T11:00:00Z", Inactive),
        poll("2023-01-23T17:00:00Z", Active),
    ];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    let days = extrapolate_store(STORE, chrono_tz::UTC, &rules, &polls);
    let window = BusinessWindow::for_weekday(&rules, 0);

    let total = days[0].uptime_seconds + days[0].downtime_seconds;
    assert_eq!(total, window.duration_seconds());
}

// ---------------------------------------------------------------------------
// Timezones
// ---------------------------------------------------------------------------

#[test]
fn business_hours_apply_in_store_local_time() {
    // 15:00Z is 09:00 CST; 18:00Z is 12:00 CST.
    let polls = vec![
        poll("2023-01-23T15:00:00Z", Inactive),
        poll("2023-01-23T18:00:00Z", Active),
    ];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    let row = compute_store_row(STORE, chrono_tz::America::Chicago, &rules, &polls).unwrap();

    assert_eq!(row.downtime_last_day_hours, 0.0);
    assert_eq!(row.uptime_last_day_hours, 3.0);
}

#[test]
fn utc_midnight_crossing_lands_on_previous_local_day() {
    // 02:00Z on Tuesday is 20:00 CST on Monday.
    let polls = vec![poll("2023-01-24T02:00:00Z", Active)];
    let days = extrapolate_store(STORE, chrono_tz::America::Chicago, &[], &polls);

    assert_eq!(days[0].weekday, 0);
    assert_eq!(days[0].uptime_seconds, 20 * 3600);
}

#[test]
fn dst_fall_back_day_does_not_count_repeated_hour_twice() {
    // 2023-11-05: Chicago falls back at 02:00 CDT to 01:00 CST.
    // 06:59Z = 01:59 CDT, 07:00Z = 01:00 CST, 2023-11-06T05:59Z = 23:59 CST.
    let polls = vec![
        poll("2023-11-05T06:59:00Z", Active),
        poll("2023-11-05T07:00:00Z", Inactive),
        poll("2023-11-06T05:59:00Z", Active),
    ];
    let days = extrapolate_store(STORE, chrono_tz::America::Chicago, &[], &polls);

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2023, 11, 5).unwrap());
    assert_eq!(days[0].downtime_seconds, 3600);
    assert_eq!(days[0].uptime_seconds, 59 * 60 + 22 * 3600);
    assert_eq!(days[0].uptime_seconds + days[0].downtime_seconds, 23 * 3600 + 59 * 60);
    assert!(days[0].uptime_seconds + days[0].downtime_seconds <= DAY_SECONDS);
}

proptest! {
    // Local 2023-11-05 in Chicago spans 05:00Z that day to 06:00Z the next:
    // 25 hours of UTC, one repeated hour of local time.
    #[test]
    fn fall_back_day_total_is_bounded_for_any_poll_order(
        offsets in proptest::collection::vec(0i64..90_000, 1..40),
        flags in proptest::collection::vec(any::<bool>(), 40),
    ) {
        let start = "2023-11-05T05:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let polls: Vec<PollingObservation> = offsets
            .iter()
            .zip(flags.iter())
            .map(|(secs, up)| PollingObservation {
                store_id: STORE.to_string(),
                timestamp_utc: start + Duration::seconds(*secs),
                status: if *up { Active } else { Inactive },
            })
            .collect();

        let tz = chrono_tz::America::Chicago;
        let latest = project(&polls, tz)
            .iter()
            .map(|o| seconds_of_day(o.time_of_day()))
            .max()
            .unwrap();
        let days = extrapolate_store(STORE, tz, &[], &polls);

        prop_assert_eq!(days.len(), 1);
        let total = days[0].uptime_seconds + days[0].downtime_seconds;
        prop_assert_eq!(total, latest);
        prop_assert!(total <= DAY_SECONDS);
    }
}

// ---------------------------------------------------------------------------
// Horizons
// ---------------------------------------------------------------------------

#[test]
fn weekly_horizon_ignores_days_older_than_six_days() {
    let mut polls = vec![poll("2023-01-16T10:00:00Z", Active)];
    for day in 23..=29 {
        polls.push(poll(&format!("2023-01-{day}T01:00:00Z"), Active));
    }
    let row = compute_store_row(STORE, chrono_tz::UTC, &[], &polls).unwrap();

    assert_eq!(row.uptime_last_week_hours, 7.0);
    assert_eq!(row.uptime_last_day_hours, 1.0);
}

// ---------------------------------------------------------------------------
// Omission + determinism
// ---------------------------------------------------------------------------

#[test]
fn store_without_polls_has_no_row() {
    assert!(compute_store_row(STORE, chrono_tz::UTC, &[], &[]).is_none());
}

#[test]
fn store_with_every_day_filtered_out_has_no_row() {
    let polls = vec![poll("2023-01-23T03:00:00Z", Active)];
    let rules = vec![hours(0, (9, 0), (17, 0))];
    assert!(compute_store_row(STORE, chrono_tz::UTC, &rules, &polls).is_none());
}

#[test]
fn rerun_is_bit_identical() {
    let polls = vec![
        poll("2023-01-25T10:14:42Z", Active),
        poll("2023-01-24T09:07:26Z", Inactive),
        poll("2023-01-25T11:01:19Z", Inactive),
        poll("2023-01-24T13:51:09Z", Active),
    ];
    let rules = vec![hours(1, (8, 30), (18, 0)), hours(2, (8, 30), (18, 0))];

    let a = compute_store_row(STORE, chrono_tz::Asia::Kolkata, &rules, &polls).unwrap();
    let b = compute_store_row(STORE, chrono_tz::Asia::Kolkata, &rules, &polls).unwrap();
    assert_eq!(a.uptime_last_week_hours.to_bits(), b.uptime_last_week_hours.to_bits());
    assert_eq!(a.downtime_last_week_hours.to_bits(), b.downtime_last_week_hours.to_bits());
    assert_eq!(a, b);
}
