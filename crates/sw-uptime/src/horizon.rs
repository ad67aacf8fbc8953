use chrono::{Days, NaiveDate};
use sw_schemas::{DayExtrapolationResult, StoreReportRow};

/// Calendar days in the weekly horizon, counting the anchor day.
pub const WEEK_DAYS: u64 = 7;

const SECS_PER_MINUTE: f64 = 60.0;
const SECS_PER_HOUR: f64 = 3600.0;

/// Roll per-day results for one store into the three report horizons.
///
/// The anchor is the latest day present, not the current wall clock:
/// - last hour: final-interval seconds of the latest day, in minutes
/// - last day: totals of the latest day, in hours
/// - last week: totals of days in `[latest - 6, latest]`, in hours
///
/// Returns `None` when `days` is empty.
pub fn aggregate(store_id: &str, days: &[DayExtrapolationResult]) -> Option<StoreReportRow> {
    let mut ordered: Vec<&DayExtrapolationResult> = days.iter().collect();
    ordered.sort_by_key(|d| d.date);

    let latest = *ordered.last()?;
    let week_start = latest
        .date
        .checked_sub_days(Days::new(WEEK_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    let (week_up, week_down) = ordered
        .iter()
        .filter(|d| d.date >= week_start)
        .fold((0_i64, 0_i64), |(up, down), d| {
            (up + d.uptime_seconds, down + d.downtime_seconds)
        });

    Some(StoreReportRow {
        store_id: store_id.to_string(),
        uptime_last_hour_minutes: latest.uptime_last_hour_seconds as f64 / SECS_PER_MINUTE,
        uptime_last_day_hours: latest.uptime_seconds as f64 / SECS_PER_HOUR,
        uptime_last_week_hours: week_up as f64 / SECS_PER_HOUR,
        downtime_last_hour_minutes: latest.downtime_last_hour_seconds as f64 / SECS_PER_MINUTE,
        downtime_last_day_hours: latest.downtime_seconds as f64 / SECS_PER_HOUR,
        downtime_last_week_hours: week_down as f64 / SECS_PER_HOUR,
    })
}
