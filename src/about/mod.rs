//! Rotating skill text on the about page
//!
//! The rotation is driven by a [`SkillTicker`] that lives exactly as long as
//! its owner. The server creates one per about-page connection and drops it
//! when the connection closes, so no timer outlives the page.

use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Cycles through a list of words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    items: Vec<String>,
    index: usize,
}

impl Rotation {
    pub fn new(items: Vec<String>) -> Self {
        Self { items, index: 0 }
    }

    /// Current word, `None` when there is nothing to rotate
    pub fn current(&self) -> Option<&str> {
        if self.items.is_empty() {
            None
        } else {
            Some(&self.items[self.index % self.items.len()])
        }
    }

    /// Move to the next word, wrapping around
    pub fn advance(&mut self) -> Option<&str> {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
        self.current()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Longest rotation period; longer configured values are clamped to it
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Advances a [`Rotation`] on a fixed period
///
/// The interval belongs to the ticker: dropping the ticker stops it.
pub struct SkillTicker {
    rotation: Rotation,
    interval: Interval,
}

impl SkillTicker {
    /// Start ticking; the first advance happens one period from now
    pub fn start(skills: Vec<String>, period: Duration) -> Self {
        let period = period.clamp(Duration::from_millis(1), MAX_PERIOD);
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            rotation: Rotation::new(skills),
            interval,
        }
    }

    /// Current word
    pub fn current(&self) -> Option<&str> {
        self.rotation.current()
    }

    /// Wait for the next period and return the new word
    pub async fn tick(&mut self) -> Option<&str> {
        self.interval.tick().await;
        self.rotation.advance()
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills() -> Vec<String> {
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    }

    #[test]
    fn test_rotation_wraps() {
        let mut rotation = Rotation::new(skills());
        assert_eq!(rotation.current(), Some("one"));
        assert_eq!(rotation.advance(), Some("two"));
        assert_eq!(rotation.advance(), Some("three"));
        assert_eq!(rotation.advance(), Some("one"));
        assert_eq!(rotation.len(), 3);
    }

    #[test]
    fn test_empty_rotation() {
        let mut rotation = Rotation::new(Vec::new());
        assert!(rotation.is_empty());
        assert_eq!(rotation.current(), None);
        assert_eq!(rotation.advance(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_each_period() {
        let start = Instant::now();
        let mut ticker = SkillTicker::start(skills(), Duration::from_secs(3));
        assert_eq!(ticker.current(), Some("one"));

        assert_eq!(ticker.tick().await, Some("two"));
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));

        assert_eq!(ticker.tick().await, Some("three"));
        assert_eq!(ticker.tick().await, Some("one"));
        assert!(start.elapsed() >= Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_does_not_fire_early() {
        let mut ticker = SkillTicker::start(skills(), Duration::from_secs(3));
        let early = time::timeout(Duration::from_secs(2), ticker.tick()).await;
        assert!(early.is_err());
        assert_eq!(ticker.current(), Some("one"));
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let ticker = SkillTicker::start(skills(), Duration::ZERO);
            assert_eq!(ticker.period(), Duration::from_millis(1));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_period_is_clamped() {
        let mut ticker = SkillTicker::start(skills(), Duration::from_secs(u64::MAX));
        assert_eq!(ticker.period(), MAX_PERIOD);

        let early = time::timeout(Duration::from_secs(60), ticker.tick()).await;
        assert!(early.is_err());
        assert_eq!(ticker.current(), Some("one"));
    }
}
