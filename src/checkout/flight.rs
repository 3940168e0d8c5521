//! Single-flight guard for the post-gateway finalize step.
//!
//! The return page can fire its handler several times before navigation
//! settles (remounts, back/forward, double events). Order creation after a
//! confirmed payment must happen exactly once per checkout attempt, so the
//! orchestrator funnels every invocation through this coordinator: one
//! caller enters and runs the remote call, everyone after that replays the
//! recorded order id.

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Process-wide finalize coordinator.
///
/// The mutex serializes concurrent callers, the slot remembers a completed
/// order id. Together they give the two guarantees the finalize path needs:
/// no two executions overlap, and a finished execution is never repeated.
#[derive(Debug, Default)]
pub struct SingleFlight {
    slot: Mutex<Option<String>>,
}

/// What a caller gets back from [`SingleFlight::begin`].
pub enum FlightTicket<'a> {
    /// This caller owns the flight; it must [`resolve`](FlightGuard::resolve)
    /// with the order id or drop the guard to let the next caller retry.
    Entered(FlightGuard<'a>),
    /// A previous flight already completed with this order id.
    Replay(String),
}

/// Exclusive ownership of the in-flight finalize.
pub struct FlightGuard<'a> {
    slot: MutexGuard<'a, Option<String>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the flight, or short-circuits with the completed order id.
    ///
    /// Blocks (asynchronously) while another caller is mid-flight, so a
    /// concurrent second invocation observes the first one's outcome instead
    /// of racing it.
    pub async fn begin(&self) -> FlightTicket<'_> {
        let slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(order_id) => {
                debug!(%order_id, "finalize already completed, replaying result");
                FlightTicket::Replay(order_id.clone())
            }
            None => FlightTicket::Entered(FlightGuard { slot }),
        }
    }

    /// Forgets any completed order id. Called when a fresh checkout attempt
    /// is staged, so an old result cannot leak into the next purchase.
    pub async fn reset(&self) {
        *self.slot.lock().await = None;
    }

    /// Order id of the completed flight, if any.
    pub async fn completed(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }
}

impl FlightGuard<'_> {
    /// Records the created order id, making every later `begin` replay it.
    pub fn resolve(mut self, order_id: String) {
        *self.slot = Some(order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_caller_enters_then_later_callers_replay() {
        let flight = SingleFlight::new();

        match flight.begin().await {
            FlightTicket::Entered(guard) => guard.resolve("1024".to_string()),
            FlightTicket::Replay(_) => panic!("nothing completed yet"),
        }

        match flight.begin().await {
            FlightTicket::Replay(id) => assert_eq!(id, "1024"),
            FlightTicket::Entered(_) => panic!("should replay the recorded id"),
        };
    }

    #[tokio::test]
    async fn test_abandoned_flight_lets_the_next_caller_retry() {
        let flight = SingleFlight::new();

        match flight.begin().await {
            FlightTicket::Entered(guard) => drop(guard),
            FlightTicket::Replay(_) => panic!("nothing completed yet"),
        }

        assert!(matches!(flight.begin().await, FlightTicket::Entered(_)));
    }

    #[tokio::test]
    async fn test_reset_clears_a_completed_flight() {
        let flight = SingleFlight::new();
        if let FlightTicket::Entered(guard) = flight.begin().await {
            guard.resolve("7".to_string());
        }
        assert_eq!(flight.completed().await.as_deref(), Some("7"));

        flight.reset().await;
        assert!(flight.completed().await.is_none());
        assert!(matches!(flight.begin().await, FlightTicket::Entered(_)));
    }

    #[tokio::test]
    async fn test_concurrent_caller_waits_for_the_owner() {
        let flight = Arc::new(SingleFlight::new());

        let guard = match flight.begin().await {
            FlightTicket::Entered(guard) => guard,
            FlightTicket::Replay(_) => panic!("nothing completed yet"),
        };

        let racing = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                match flight.begin().await {
                    FlightTicket::Replay(id) => id,
                    FlightTicket::Entered(_) => panic!("owner resolved before us"),
                }
            })
        };

        // Give the racing task a chance to park on the lock before resolving.
        tokio::task::yield_now().await;
        guard.resolve("55".to_string());

        assert_eq!(racing.await.unwrap(), "55");
    }
}
