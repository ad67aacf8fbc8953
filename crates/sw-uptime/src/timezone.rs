use chrono_tz::Tz;
use tracing::warn;

/// Timezone used when no configuration overrides it.
pub const FALLBACK_TIMEZONE: &str = "America/Chicago";

/// Parse an IANA timezone name. Surrounding whitespace is ignored.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Maps a store's timezone record to a usable [`Tz`].
///
/// Never fails: a missing record or an unknown name both resolve to the
/// configured default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimezoneResolver {
    default_tz: Tz,
}

impl TimezoneResolver {
    pub fn new(default_tz: Tz) -> Self {
        Self { default_tz }
    }

    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }

    pub fn resolve(&self, store_id: &str, record: Option<&str>) -> Tz {
        let Some(name) = record else {
            return self.default_tz;
        };
        match parse_timezone(name) {
            Some(tz) => tz,
            None => {
                warn!(
                    store_id = %store_id,
                    timezone = %name,
                    fallback = %self.default_tz.name(),
                    "unknown timezone; using default"
                );
                self.default_tz
            }
        }
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new(chrono_tz::America::Chicago)
    }
}
