use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::task::JoinHandle;
use tracing::debug;

/// IDs the user touched recently (created or edited through this
/// process). Touched records pin to the top of their list until the
/// next sweep.
///
/// Expiry is deliberately coarse: a periodic sweep clears the whole set
/// at once, so a record stays pinned for up to twice the interval
/// rather than exactly its own age. The UI effect is what matters and
/// the bookkeeping stays O(1).
#[derive(Debug, Default)]
pub struct RecencyTracker {
    touched: DashSet<String>,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tracker with its sweeper task running. Must be called
    /// from within a Tokio runtime.
    pub fn start(every: Duration) -> Arc<Self> {
        let tracker = Arc::new(Self::new());
        tracker.spawn_sweeper(every);
        tracker
    }

    pub fn mark(&self, id: &str) {
        self.touched.insert(id.to_string());
    }

    pub fn unmark(&self, id: &str) {
        self.touched.remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.touched.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    pub fn len(&self) -> usize {
        self.touched.len()
    }

    /// Clears every pin immediately.
    pub fn sweep_now(&self) {
        let cleared = self.touched.len();
        if cleared > 0 {
            debug!(cleared, "recency sweep");
        }
        self.touched.clear();
    }

    /// Spawns the periodic sweep. The task holds only a weak handle and
    /// exits once the tracker is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately; the first sweep should not.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(tracker) => tracker.sweep_now(),
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_sweep() {
        let tracker = RecencyTracker::new();
        tracker.mark("a");
        tracker.mark("b");
        assert!(tracker.contains("a"));
        assert_eq!(tracker.len(), 2);
        tracker.unmark("a");
        assert!(!tracker.contains("a"));
        tracker.sweep_now();
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_clears_on_interval() {
        let tracker = RecencyTracker::start(Duration::from_secs(30));
        tracker.mark("p1");
        assert!(tracker.contains("p1"));

        // Just before the interval elapses the pin is still live.
        tokio::time::advance(Duration::from_secs(29)).await;
        tokio::task::yield_now().await;
        assert!(tracker.contains("p1"));

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_tracker_dropped() {
        let tracker = RecencyTracker::start(Duration::from_secs(5));
        let handle = tracker.spawn_sweeper(Duration::from_secs(5));
        drop(tracker);
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        assert!(handle.await.is_ok());
    }
}
