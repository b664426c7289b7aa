use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{ChatClient, ExchangeError};
use crate::history::Message;

/// Outcome of one exchange, delivered back to the event loop. The
/// epoch identifies which submission the outcome belongs to; stale
/// events (from a turn that was stopped in the meantime) are discarded
/// by the session.
#[derive(Debug)]
pub struct ExchangeEvent {
    pub epoch: u64,
    pub outcome: Result<String, ExchangeError>,
}

struct ActiveExchange {
    epoch: u64,
    task: JoinHandle<()>,
}

/// Owns the single in-flight completion request.
///
/// `start` spawns the network call on the runtime and reports its
/// terminal outcome over the event channel; `cancel` aborts the task,
/// so a cancelled exchange never reports at all. At most one exchange
/// is active at a time; the session enforces that before calling in.
pub struct ExchangeController {
    client: ChatClient,
    events: mpsc::UnboundedSender<ExchangeEvent>,
    active: Option<ActiveExchange>,
}

impl ExchangeController {
    pub fn new(client: ChatClient, events: mpsc::UnboundedSender<ExchangeEvent>) -> Self {
        Self {
            client,
            events,
            active: None,
        }
    }

    /// Issues the request for `payload` (the full conversation, user
    /// message included) under the given epoch.
    pub fn start(&mut self, epoch: u64, payload: Vec<Message>) {
        debug_assert!(self.active.is_none(), "exchange already in flight");
        debug!(epoch, messages = payload.len(), "starting exchange");

        let client = self.client.clone();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let outcome = client.complete(&payload).await;
            // The receiver is gone only during shutdown.
            let _ = events.send(ExchangeEvent { epoch, outcome });
        });

        self.active = Some(ActiveExchange { epoch, task });
    }

    /// Aborts the in-flight request, if any. Returns whether one was
    /// active. A response that was already on the wire dies with the
    /// task and never reaches the event channel.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(exchange) => {
                debug!(epoch = exchange.epoch, "cancelling exchange");
                exchange.task.abort();
                true
            }
            None => false,
        }
    }

    /// Forgets the active exchange once its outcome has been consumed.
    pub fn settle(&mut self, epoch: u64) {
        if self.active.as_ref().is_some_and(|a| a.epoch == epoch) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_client() -> ChatClient {
        // Port 9 (discard) is closed in the test environment; the
        // request fails fast with a connection error.
        ChatClient::new("http://127.0.0.1:9/chat", "test-key", 100)
    }

    #[tokio::test]
    async fn failed_request_reports_a_transport_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = ExchangeController::new(unreachable_client(), tx);

        controller.start(1, vec![Message::user("hello")]);

        let event = rx.recv().await.expect("outcome should be delivered");
        assert_eq!(event.epoch, 1);
        assert!(matches!(event.outcome, Err(ExchangeError::Transport(_))));

        // Settled exchanges leave nothing to cancel.
        controller.settle(event.epoch);
        assert!(!controller.cancel());
    }

    #[tokio::test]
    async fn cancelled_exchange_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = ExchangeController::new(unreachable_client(), tx);

        controller.start(1, vec![Message::user("hello")]);
        assert!(controller.cancel());

        let late = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(late.is_err(), "aborted task must not deliver an outcome");
    }

    #[tokio::test]
    async fn cancel_without_an_exchange_is_a_no_op() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = ExchangeController::new(unreachable_client(), tx);
        assert!(!controller.cancel());
    }
}
