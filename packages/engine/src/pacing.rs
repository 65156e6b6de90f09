//! Request pacing.
//!
//! Page fetches are deliberately sequential and jittered to approximate a
//! human browsing cadence — this is an anti-throttling measure, not a
//! performance knob. The ranges below are part of the documented contract;
//! tests inject [`Pacing::none`] instead of shrinking them.

use std::time::Duration;

use rand::Rng as _;

/// Minimum delay before each page fetch, in seconds.
pub const PAGE_DELAY_MIN_SECS: f64 = 1.5;

/// Maximum delay before each page fetch, in seconds.
pub const PAGE_DELAY_MAX_SECS: f64 = 3.7;

/// A longer cooldown is taken after every this-many pages.
pub const COOLDOWN_EVERY_PAGES: u32 = 10;

/// Minimum cooldown duration, in seconds.
pub const COOLDOWN_MIN_SECS: f64 = 5.0;

/// Maximum cooldown duration, in seconds.
pub const COOLDOWN_MAX_SECS: f64 = 13.0;

/// Pacing configuration for one run.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Inclusive `(min, max)` inter-page delay range, in seconds.
    pub page_delay_secs: (f64, f64),
    /// Take a cooldown after every this-many pages; `0` disables cooldowns.
    pub cooldown_every: u32,
    /// Inclusive `(min, max)` cooldown range, in seconds.
    pub cooldown_secs: (f64, f64),
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay_secs: (PAGE_DELAY_MIN_SECS, PAGE_DELAY_MAX_SECS),
            cooldown_every: COOLDOWN_EVERY_PAGES,
            cooldown_secs: (COOLDOWN_MIN_SECS, COOLDOWN_MAX_SECS),
        }
    }
}

impl Pacing {
    /// Zero-delay pacing for tests.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            page_delay_secs: (0.0, 0.0),
            cooldown_every: COOLDOWN_EVERY_PAGES,
            cooldown_secs: (0.0, 0.0),
        }
    }

    /// Draws a randomized inter-page delay.
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        draw(self.page_delay_secs)
    }

    /// Draws a randomized cooldown duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        draw(self.cooldown_secs)
    }

    /// Whether a cooldown is due after fetching `page`.
    #[must_use]
    pub const fn is_cooldown_page(&self, page: u32) -> bool {
        self.cooldown_every != 0 && page % self.cooldown_every == 0
    }
}

/// Draws a duration uniformly from an inclusive `(min, max)` range of
/// seconds.
fn draw((min, max): (f64, f64)) -> Duration {
    let secs = if max > min {
        rand::rng().random_range(min..=max)
    } else {
        min
    };
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_delay_stays_within_the_documented_range() {
        let pacing = Pacing::default();
        for _ in 0..100 {
            let delay = pacing.page_delay().as_secs_f64();
            assert!((PAGE_DELAY_MIN_SECS..=PAGE_DELAY_MAX_SECS).contains(&delay));
        }
    }

    #[test]
    fn cooldown_stays_within_the_documented_range() {
        let pacing = Pacing::default();
        for _ in 0..100 {
            let cooldown = pacing.cooldown().as_secs_f64();
            assert!((COOLDOWN_MIN_SECS..=COOLDOWN_MAX_SECS).contains(&cooldown));
        }
    }

    #[test]
    fn cooldown_lands_on_every_tenth_page() {
        let pacing = Pacing::default();
        assert!(pacing.is_cooldown_page(10));
        assert!(pacing.is_cooldown_page(20));
        assert!(!pacing.is_cooldown_page(1));
        assert!(!pacing.is_cooldown_page(11));
    }

    #[test]
    fn none_draws_zero_delays() {
        let pacing = Pacing::none();
        assert_eq!(pacing.page_delay(), Duration::ZERO);
        assert_eq!(pacing.cooldown(), Duration::ZERO);
    }
}
