//! Civil-date resolution, cached for one hour or until the date rolls over.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::time::{Duration as StdDuration, Instant};

const CACHE_TTL: StdDuration = StdDuration::from_secs(3600);

struct Cached {
    today: NaiveDate,
    computed_at: Instant,
}

/// Resolves "today" for a civil timezone, re-computing at most once an hour
/// (and always when the cached date has rolled over).
pub struct DateResolver {
    timezone: Tz,
    cache: Mutex<Option<Cached>>,
}

impl DateResolver {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            cache: Mutex::new(None),
        }
    }

    fn compute_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    /// Testable variant that takes the current instant explicitly.
    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        let fresh = self.compute_today(now);
        let mut cache = self.cache.lock();
        match cache.as_ref() {
            Some(c) if c.today == fresh && c.computed_at.elapsed() < CACHE_TTL => c.today,
            _ => {
                *cache = Some(Cached {
                    today: fresh,
                    computed_at: Instant::now(),
                });
                fresh
            }
        }
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today() + Duration::days(1)
    }

    pub fn day_after_tomorrow(&self) -> NaiveDate {
        self.today() + Duration::days(2)
    }

    /// Next occurrence of `weekday` strictly after today; if today is that
    /// weekday, resolves a full week ahead.
    pub fn next_weekday(&self, weekday: Weekday) -> NaiveDate {
        let today = self.today();
        let mut delta = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64
            + 7)
            % 7;
        if delta == 0 {
            delta = 7;
        }
        today + Duration::days(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bogota() -> DateResolver {
        DateResolver::new(Tz::America__Bogota)
    }

    #[test]
    fn today_follows_civil_timezone_not_utc() {
        let resolver = bogota();
        // 02:00 UTC on the 2nd is still the 1st in Bogota (UTC-5).
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 2, 0, 0).unwrap();
        assert_eq!(resolver.today_at(now), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn next_weekday_skips_a_full_week_when_today_matches() {
        let resolver = bogota();
        // 2026-03-02 is a Monday.
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let today = resolver.today_at(now);
        assert_eq!(today.weekday(), Weekday::Mon);
        let next_monday = resolver.next_weekday(Weekday::Mon);
        assert_eq!(next_monday, today + Duration::days(7));
    }

    #[test]
    fn next_weekday_resolves_within_the_week_otherwise() {
        let resolver = bogota();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let today = resolver.today_at(now);
        let next_friday = resolver.next_weekday(Weekday::Fri);
        assert_eq!(next_friday, today + Duration::days(4));
    }
}
