//! sw-uptime
//!
//! Uptime/downtime estimation from sparse store polls.
//!
//! Pipeline per store:
//! - resolve the store timezone (default when absent or unknown)
//! - project UTC polls into local wall-clock time, partition by local date
//! - restrict each day to its business window (24x7 when unconfigured)
//! - extrapolate last-known state across gaps (attribute-on-arrival)
//! - roll days up into last-hour / last-day / last-week horizons
//!
//! Pure deterministic logic. No IO, no wall clock. Callers supply every row.

mod calendar;
mod extrapolate;
mod horizon;
mod localize;
mod pipeline;
mod timezone;

pub use calendar::{BusinessWindow, DAY_SECONDS};
pub use extrapolate::{extrapolate_day, DayTotals};
pub use horizon::{aggregate, WEEK_DAYS};
pub use localize::{partition_by_local_date, project};
pub use pipeline::{compute_store_row, extrapolate_store};
pub use timezone::{parse_timezone, TimezoneResolver, FALLBACK_TIMEZONE};
