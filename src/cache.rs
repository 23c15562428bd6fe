//! Time-windowed response cache.
//!
//! One freshness anchor governs every entry: once the window measured from
//! the anchor has passed, the whole cache is dropped and re-anchored at the
//! current time. There is no per-key expiry.
//!
//! The volatile period ([`Period::Random`]) is never stored and always misses.
//!
//! The cache itself is not synchronized; the server wraps it in a single
//! mutex so each check-and-mutate sequence runs atomically.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;
use tracing::debug;

use crate::models::Period;

/// Hours in the default freshness window.
pub const DEFAULT_TTL_HOURS: i64 = 4;

/// Longest accepted freshness window, in hours (one year).
pub const MAX_TTL_HOURS: i64 = 24 * 365;

/// When a cache epoch ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Expire once `now - anchor >= window`.
    FixedWindow(Duration),
    /// Expire when the calendar day of `now` differs from the anchor's.
    CalendarDay,
}

impl CachePolicy {
    /// Whether a cache epoch anchored at `anchor` has ended by `now`.
    ///
    /// # Returns
    ///
    /// `true` once `now - anchor` reaches the window for
    /// [`CachePolicy::FixedWindow`], or once the calendar day has changed
    /// for [`CachePolicy::CalendarDay`].
    pub fn is_expired(&self, anchor: NaiveDateTime, now: NaiveDateTime) -> bool {
        match self {
            CachePolicy::FixedWindow(window) => now - anchor >= *window,
            CachePolicy::CalendarDay => now.date() != anchor.date(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::FixedWindow(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

/// Command-line spelling of [`CachePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CachePolicyKind {
    /// Fixed window from the first access (see `--cache-ttl-hours`)
    Ttl,
    /// Reset whenever the local calendar day changes
    Daily,
}

impl CachePolicyKind {
    /// Build the runtime policy.
    ///
    /// # Arguments
    ///
    /// * `ttl_hours` - Window length for [`CachePolicyKind::Ttl`]; clamped to
    ///   `1..=MAX_TTL_HOURS` so the window is never empty and never overflows.
    pub fn into_policy(self, ttl_hours: i64) -> CachePolicy {
        match self {
            CachePolicyKind::Ttl => {
                CachePolicy::FixedWindow(Duration::hours(ttl_hours.clamp(1, MAX_TTL_HOURS)))
            }
            CachePolicyKind::Daily => CachePolicy::CalendarDay,
        }
    }
}

/// Responses keyed by [`Period`], sharing one freshness anchor.
///
/// # Examples
///
/// ```ignore
/// let mut cache = NewsCache::new(CachePolicy::CalendarDay);
/// cache.set(Period::OneWeek, response, now);
/// assert!(cache.has(Period::OneWeek, now));
/// ```
#[derive(Debug)]
pub struct NewsCache<V> {
    entries: HashMap<Period, V>,
    anchor: Option<NaiveDateTime>,
    policy: CachePolicy,
}

impl<V: Clone> NewsCache<V> {
    /// An empty cache with no anchor; the first access sets it.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            anchor: None,
            policy,
        }
    }

    /// The expiry policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Cached value for `period`.
    ///
    /// Resets the whole cache first if the current window has ended.
    ///
    /// # Returns
    ///
    /// `None` on a miss, after a reset, and always for the volatile period.
    pub fn get(&mut self, period: Period, now: NaiveDateTime) -> Option<V> {
        if period.is_volatile() {
            return None;
        }
        self.refresh(now);
        self.entries.get(&period).cloned()
    }

    /// Store `value` under `period`. No-op for the volatile period.
    pub fn set(&mut self, period: Period, value: V, now: NaiveDateTime) {
        if period.is_volatile() {
            return;
        }
        self.refresh(now);
        self.entries.insert(period, value);
    }

    /// Whether `period` has a fresh entry. Same expiry rules as [`NewsCache::get`].
    pub fn has(&mut self, period: Period, now: NaiveDateTime) -> bool {
        if period.is_volatile() {
            return false;
        }
        self.refresh(now);
        self.entries.contains_key(&period)
    }

    /// Drop every entry and forget the anchor; the next access re-anchors.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.anchor = None;
    }

    fn refresh(&mut self, now: NaiveDateTime) {
        match self.anchor {
            None => self.anchor = Some(now),
            Some(anchor) if self.policy.is_expired(anchor, now) => {
                debug!(%anchor, %now, dropped = self.entries.len(), "Cache window elapsed; resetting");
                self.entries.clear();
                self.anchor = Some(now);
            }
            Some(_) => {}
        }
    }
}

impl<V: Clone> Default for NewsCache<V> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn ttl_cache() -> NewsCache<&'static str> {
        NewsCache::new(CachePolicy::FixedWindow(Duration::hours(4)))
    }

    #[test]
    fn test_new_cache_is_empty() {
        let mut cache = ttl_cache();
        for period in Period::ALL {
            assert_eq!(cache.get(period, at(28, 9, 0)), None);
        }
    }

    #[test]
    fn test_set_then_get() {
        let mut cache = ttl_cache();
        let now = at(28, 9, 0);

        cache.set(Period::OneWeek, "week", now);
        cache.set(Period::TwoWeeks, "two", now);
        cache.set(Period::OneMonth, "month", now);

        assert_eq!(cache.get(Period::OneWeek, now), Some("week"));
        assert_eq!(cache.get(Period::TwoWeeks, now), Some("two"));
        assert_eq!(cache.get(Period::OneMonth, now), Some("month"));
        assert!(cache.has(Period::OneWeek, now));
    }

    #[test]
    fn test_set_overwrites() {
        let mut cache = ttl_cache();
        cache.set(Period::OneWeek, "old", at(28, 9, 0));
        cache.set(Period::OneWeek, "new", at(28, 9, 5));
        assert_eq!(cache.get(Period::OneWeek, at(28, 9, 10)), Some("new"));
    }

    #[test]
    fn test_random_is_never_cached() {
        let mut cache = ttl_cache();
        let now = at(28, 9, 0);

        cache.set(Period::Random, "random", now);
        assert_eq!(cache.get(Period::Random, now), None);
        assert!(!cache.has(Period::Random, now));
    }

    #[test]
    fn test_fixed_window_keeps_entries_until_elapsed() {
        let mut cache = ttl_cache();
        cache.set(Period::OneWeek, "week", at(28, 9, 0));

        assert_eq!(cache.get(Period::OneWeek, at(28, 12, 59)), Some("week"));
    }

    #[test]
    fn test_fixed_window_expires_whole_cache() {
        let mut cache = ttl_cache();
        cache.set(Period::OneWeek, "week", at(28, 9, 0));
        cache.set(Period::OneMonth, "month", at(28, 11, 0));

        assert_eq!(cache.get(Period::OneWeek, at(28, 13, 0)), None);
        assert!(!cache.has(Period::OneMonth, at(28, 13, 0)));
    }

    #[test]
    fn test_window_is_measured_from_first_access() {
        let mut cache = ttl_cache();
        assert_eq!(cache.get(Period::OneWeek, at(28, 9, 0)), None);

        cache.set(Period::OneWeek, "week", at(28, 12, 0));
        assert_eq!(cache.get(Period::OneWeek, at(28, 13, 0)), None);
    }

    #[test]
    fn test_reset_reanchors_at_expiry_time() {
        let mut cache = ttl_cache();
        cache.set(Period::OneWeek, "old", at(28, 9, 0));

        cache.set(Period::OneWeek, "new", at(28, 14, 0));
        assert_eq!(cache.get(Period::OneWeek, at(28, 17, 59)), Some("new"));
        assert_eq!(cache.get(Period::OneWeek, at(28, 18, 0)), None);
    }

    #[test]
    fn test_calendar_day_policy() {
        let mut cache = NewsCache::new(CachePolicy::CalendarDay);
        cache.set(Period::OneWeek, "week", at(28, 0, 5));
        cache.set(Period::TwoWeeks, "two", at(28, 10, 0));

        assert_eq!(cache.get(Period::OneWeek, at(28, 23, 59)), Some("week"));
        assert_eq!(cache.get(Period::OneWeek, at(29, 0, 1)), None);
        assert_eq!(cache.get(Period::TwoWeeks, at(29, 0, 2)), None);
    }

    #[test]
    fn test_clear_forgets_entries_and_anchor() {
        let mut cache = ttl_cache();
        cache.set(Period::OneWeek, "week", at(28, 9, 0));
        cache.clear();

        assert_eq!(cache.get(Period::OneWeek, at(28, 9, 0)), None);

        // Re-anchored at 14:00 by the set after the clear, not at 09:00.
        cache.clear();
        cache.set(Period::OneWeek, "week", at(28, 14, 0));
        assert_eq!(cache.get(Period::OneWeek, at(28, 15, 0)), Some("week"));
    }

    #[test]
    fn test_policy_from_cli_kind() {
        assert_eq!(
            CachePolicyKind::Ttl.into_policy(4),
            CachePolicy::FixedWindow(Duration::hours(4))
        );
        assert_eq!(CachePolicyKind::Daily.into_policy(4), CachePolicy::CalendarDay);
        assert_eq!(CachePolicy::default(), CachePolicy::FixedWindow(Duration::hours(4)));
    }

    #[test]
    fn test_ttl_hours_are_clamped() {
        assert_eq!(
            CachePolicyKind::Ttl.into_policy(i64::MAX),
            CachePolicy::FixedWindow(Duration::hours(MAX_TTL_HOURS))
        );
        assert_eq!(
            CachePolicyKind::Ttl.into_policy(0),
            CachePolicy::FixedWindow(Duration::hours(1))
        );

        let mut cache = NewsCache::new(CachePolicyKind::Ttl.into_policy(-5));
        cache.set(Period::OneWeek, "week", at(28, 9, 0));
        assert_eq!(cache.get(Period::OneWeek, at(28, 9, 0)), Some("week"));
    }
}
