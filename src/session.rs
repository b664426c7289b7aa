use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::ChatClient;
use crate::exchange::{ExchangeController, ExchangeEvent};
use crate::history::{History, Message};
use crate::reveal::RevealJob;
use crate::surface::{BubbleId, Surface};

/// Shown in the assistant bubble while the request is in flight.
pub const THINKING_PLACEHOLDER: &str = "Just a sec...";

/// Shown when the user stops a request before the reply arrived.
/// Deliberately distinct from transport-error copy.
pub const STOPPED_NOTICE: &str = "Response generation stopped.";

/// Where the current turn stands. Busy means anything but `Ready`.
#[derive(Debug)]
enum Phase {
    Ready,
    /// Request in flight; the bubble still shows the placeholder.
    Sending { bubble: BubbleId },
    /// Reply arrived and is being revealed word-by-word.
    Streaming { bubble: BubbleId, job: RevealJob },
}

/// What became of a `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Accepted,
    /// Empty or whitespace-only input; nothing changed.
    EmptyInput,
    /// A turn is already in flight; nothing changed.
    Busy,
}

/// Orchestrates one conversation: history, the single in-flight
/// exchange, and the reveal of each reply.
///
/// Turn lifecycle: `submit` appends the user message, starts the
/// exchange, and marks the session busy. The event loop feeds exchange
/// outcomes into `on_exchange_event` and drives the reveal with
/// `on_tick`; the assistant message joins the history only once its
/// reveal runs to completion. `stop` cancels whichever stage is active
/// and clears busy synchronously.
///
/// Every async callback is tagged with the epoch of the submission
/// that produced it. `stop` and each new `submit` bump the epoch, so a
/// completion from a cancelled turn can never revive it.
pub struct Session<S: Surface> {
    history: History,
    exchange: ExchangeController,
    surface: S,
    phase: Phase,
    epoch: u64,
}

impl<S: Surface> Session<S> {
    /// Builds a session; the returned receiver yields exchange
    /// outcomes and must be drained by the event loop.
    pub fn new(client: ChatClient, surface: S) -> (Self, mpsc::UnboundedReceiver<ExchangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            history: History::new(),
            exchange: ExchangeController::new(client, tx),
            surface,
            phase: Phase::Ready,
            epoch: 0,
        };
        (session, rx)
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Ready)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Starts a new turn. Rejects empty input and re-entry while a
    /// turn is in flight; rejection changes nothing.
    pub fn submit(&mut self, input: &str) -> Submit {
        let text = input.trim();
        if text.is_empty() {
            return Submit::EmptyInput;
        }
        if self.is_busy() {
            return Submit::Busy;
        }

        // Context policy: the user message is recorded before the
        // request goes out, so a stopped or failed turn keeps it as
        // context for the next one.
        self.history.append(Message::user(text));
        self.surface.append_user(text);
        let bubble = self.surface.append_assistant(THINKING_PLACEHOLDER);
        self.surface.set_busy(true);

        self.epoch += 1;
        self.exchange.start(self.epoch, self.history.snapshot().to_vec());
        self.phase = Phase::Sending { bubble };
        Submit::Accepted
    }

    /// Applies one exchange outcome. Outcomes from superseded epochs
    /// are discarded untouched.
    pub fn on_exchange_event(&mut self, event: ExchangeEvent) {
        if event.epoch != self.epoch {
            debug!(
                event_epoch = event.epoch,
                current_epoch = self.epoch,
                "discarding stale exchange outcome"
            );
            return;
        }
        let Phase::Sending { bubble } = &self.phase else {
            warn!("exchange outcome arrived outside the sending phase");
            return;
        };
        let bubble = *bubble;

        self.exchange.settle(event.epoch);
        match event.outcome {
            Ok(text) => {
                debug!(chars = text.len(), "reply received, starting reveal");
                self.phase = Phase::Streaming {
                    bubble,
                    job: RevealJob::new(&text),
                };
            }
            Err(err) => {
                debug!(%err, "exchange failed");
                self.surface.mark_error(bubble, &err.to_string());
                self.surface.set_busy(false);
                self.phase = Phase::Ready;
            }
        }
    }

    /// Advances the reveal by one word. No-op outside `Streaming`.
    pub fn on_tick(&mut self) {
        let Phase::Streaming { bubble, job } = &mut self.phase else {
            return;
        };
        match job.advance() {
            Some(partial) => {
                self.surface.update_assistant(*bubble, &partial);
            }
            None => {
                self.history.append(Message::assistant(job.text()));
                self.surface.set_busy(false);
                self.phase = Phase::Ready;
            }
        }
    }

    /// Cancels whichever stage is active: an in-flight request is
    /// aborted and its bubble rewritten with the stopped notice; a
    /// running reveal halts with its partial text left as-is. Busy
    /// clears before this returns. Idempotent when nothing is active.
    pub fn stop(&mut self) {
        // Anything still in flight for the old epoch is now stale.
        self.epoch += 1;
        match std::mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Ready => {}
            Phase::Sending { bubble } => {
                self.exchange.cancel();
                self.surface.mark_error(bubble, STOPPED_NOTICE);
                self.surface.set_busy(false);
            }
            Phase::Streaming { job, .. } => {
                // Partial text stays as-is; no completion fires.
                debug!(fully_revealed = job.is_done(), "reveal stopped");
                self.surface.set_busy(false);
            }
        }
    }

    /// Clears the conversation. A turn in flight is stopped first.
    pub fn reset(&mut self) {
        if self.is_busy() {
            self.stop();
        }
        self.history.clear();
        self.surface.clear();
    }
}
