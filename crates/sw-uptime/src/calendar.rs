//! Business-hours windows.
//!
//! [`BusinessWindow`] describes which local times of day a store counts as
//! open. Extrapolation only sees polls inside the window, and the leading
//! interval of every day is measured from the window start.
//!
//! # Variants
//!
//! - [`BusinessWindow::AlwaysOpen`]: no rule for the weekday. The window is
//!   the whole local day `[00:00:00, 24:00:00)`.
//! - [`BusinessWindow::Hours`]: the first rule configured for the weekday.
//!   Both bounds are inclusive.

use chrono::NaiveTime;
use sw_schemas::{seconds_of_day, BusinessHoursRule, LocalizedObservation};

pub const DAY_SECONDS: i64 = 86_400;

// ---------------------------------------------------------------------------
// BusinessWindow
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusinessWindow {
    AlwaysOpen,
    Hours { start: NaiveTime, end: NaiveTime },
}

impl BusinessWindow {
    /// Window for `weekday` (0 = Monday). The first matching rule wins.
    pub fn for_weekday(rules: &[BusinessHoursRule], weekday: u8) -> Self {
        rules
            .iter()
            .find(|r| r.weekday == weekday)
            .map(|r| BusinessWindow::Hours {
                start: r.start_time_local,
                end: r.end_time_local,
            })
            .unwrap_or(BusinessWindow::AlwaysOpen)
    }

    /// Boundary the first poll of the day is measured from.
    pub fn start(&self) -> NaiveTime {
        match self {
            BusinessWindow::AlwaysOpen => NaiveTime::MIN,
            BusinessWindow::Hours { start, .. } => *start,
        }
    }

    /// Length of the window in seconds. An inverted window has length 0.
    pub fn duration_seconds(&self) -> i64 {
        match self {
            BusinessWindow::AlwaysOpen => DAY_SECONDS,
            BusinessWindow::Hours { start, end } => {
                (seconds_of_day(*end) - seconds_of_day(*start)).max(0)
            }
        }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        match self {
            BusinessWindow::AlwaysOpen => true,
            BusinessWindow::Hours { start, end } => *start <= t && t <= *end,
        }
    }

    /// Polls of one day that fall inside the window, in their original order.
    pub fn filter<'a>(&self, day: &'a [LocalizedObservation]) -> Vec<&'a LocalizedObservation> {
        day.iter().filter(|o| self.contains(o.time_of_day())).collect()
    }
}
