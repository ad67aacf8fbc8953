use chrono_tz::Tz;
use sw_schemas::{BusinessHoursRule, DayExtrapolationResult, PollingObservation, StoreReportRow};
use tracing::debug;

use crate::calendar::BusinessWindow;
use crate::extrapolate::extrapolate_day;
use crate::horizon::aggregate;
use crate::localize::{partition_by_local_date, project};

/// Per-day results for one store, ascending by local date.
///
/// Days whose polls all fall outside the business window are skipped. Each
/// day's polls are extrapolated in local time-of-day order.
pub fn extrapolate_store(
    store_id: &str,
    tz: Tz,
    business_hours: &[BusinessHoursRule],
    observations: &[PollingObservation],
) -> Vec<DayExtrapolationResult> {
    let days = partition_by_local_date(project(observations, tz));
    let mut out = Vec::with_capacity(days.len());

    for (date, polls) in days {
        let Some(weekday) = polls.first().map(|o| o.weekday) else {
            continue;
        };
        let window = BusinessWindow::for_weekday(business_hours, weekday);
        // A DST fall-back day repeats an hour of local time, so UTC order is
        // not time-of-day order. Stable sort keeps UTC order among ties.
        let mut kept = window.filter(&polls);
        kept.sort_by_key(|o| o.time_of_day());

        let Some(totals) = extrapolate_day(window.start(), kept) else {
            debug!(store_id = %store_id, %date, ?window, "no polls inside business window; day skipped");
            continue;
        };

        out.push(DayExtrapolationResult {
            store_id: store_id.to_string(),
            weekday,
            date,
            uptime_seconds: totals.uptime_seconds,
            downtime_seconds: totals.downtime_seconds,
            uptime_last_hour_seconds: totals.uptime_last_hour_seconds,
            downtime_last_hour_seconds: totals.downtime_last_hour_seconds,
        });
    }

    out
}

/// Full per-store pipeline. `None` when the store has no usable polls.
pub fn compute_store_row(
    store_id: &str,
    tz: Tz,
    business_hours: &[BusinessHoursRule],
    observations: &[PollingObservation],
) -> Option<StoreReportRow> {
    aggregate(
        store_id,
        &extrapolate_store(store_id, tz, business_hours, observations),
    )
}
