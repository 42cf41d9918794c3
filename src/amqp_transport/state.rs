//! Two-state publisher core.
//!
//! Until a channel is attached every envelope is appended to the pending
//! queue. Attaching swaps the state to `Ready` and hands the queued envelopes
//! back to the caller in one step, so an envelope is either in the captured
//! batch or sees `Ready` and goes to the outbox. Nothing can be appended to a
//! queue that has already been captured.
//!
//! The outbox is a FIFO read by a single publisher task which drains the
//! captured batch before it reads anything else. Sends happen under the
//! state lock, so the outbox order is the order in which `admit` ran.

use std::fmt;
use std::mem;

use tokio::sync::mpsc::{UnboundedSender, error::SendError};

use crate::handler::Ack;
use crate::log_record::LogEnvelope;

/// An envelope waiting for the publisher task, with the caller's ack.
pub(crate) type Outgoing = (LogEnvelope, Ack);

pub(crate) enum PublisherState {
    Unready { queue: Vec<LogEnvelope> },
    Ready { outbox: UnboundedSender<Outgoing> },
}

/// What the caller must still do with the acknowledgement.
pub(crate) enum Admission {
    /// The envelope was appended to the pending queue; acknowledge success.
    Queued(Ack),
    /// The publisher task owns the envelope and its ack.
    Forwarded,
    /// The publisher task has stopped; the envelope was dropped.
    Closed(Ack),
}

impl Default for PublisherState {
    fn default() -> Self {
        Self::Unready { queue: Vec::new() }
    }
}

impl PublisherState {
    pub(crate) fn admit(&mut self, envelope: LogEnvelope, ack: Ack) -> Admission {
        match self {
            Self::Unready { queue } => {
                queue.push(envelope);
                Admission::Queued(ack)
            }
            Self::Ready { outbox } => match outbox.send((envelope, ack)) {
                Ok(()) => Admission::Forwarded,
                Err(SendError((_, ack))) => Admission::Closed(ack),
            },
        }
    }

    /// Switch to `Ready` and return the envelopes queued so far.
    ///
    /// Returns `None` when the state is already `Ready`; the first outbox is
    /// kept and nothing is handed back, so a batch is never drained twice.
    pub(crate) fn mark_ready(
        &mut self,
        outbox: UnboundedSender<Outgoing>,
    ) -> Option<Vec<LogEnvelope>> {
        match self {
            Self::Ready { .. } => None,
            Self::Unready { queue } => {
                let drained = mem::take(queue);
                *self = Self::Ready { outbox };
                Some(drained)
            }
        }
    }

    pub(crate) fn pending(&self) -> &[LogEnvelope] {
        match self {
            Self::Unready { queue } => queue,
            Self::Ready { .. } => &[],
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl fmt::Debug for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unready { queue } => f.debug_struct("Unready").field("queued", &queue.len()).finish(),
            Self::Ready { .. } => f.write_str("Ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ignore_ack;
    use crate::level::Level;
    use rstest::rstest;
    use tokio::sync::mpsc;

    fn envelope(message: &str) -> LogEnvelope {
        LogEnvelope::at("host", 0, "sink", Level::Info, message, None)
    }

    #[rstest]
    fn unready_state_queues_in_order() {
        let mut state = PublisherState::default();
        assert!(matches!(state.admit(envelope("a"), ignore_ack()), Admission::Queued(_)));
        assert!(matches!(state.admit(envelope("b"), ignore_ack()), Admission::Queued(_)));
        let messages: Vec<_> = state.pending().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["a", "b"]);
        assert!(!state.is_ready());
    }

    #[rstest]
    fn mark_ready_hands_back_queue_once() {
        let mut state = PublisherState::default();
        state.admit(envelope("a"), ignore_ack());
        state.admit(envelope("b"), ignore_ack());

        let (tx, _rx) = mpsc::unbounded_channel();
        let drained = state.mark_ready(tx.clone()).expect("first attach drains");
        assert_eq!(drained.len(), 2);
        assert!(state.pending().is_empty());
        assert!(state.is_ready());

        assert!(state.mark_ready(tx).is_none());
    }

    #[rstest]
    fn ready_state_forwards_to_outbox_in_order() {
        let mut state = PublisherState::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.mark_ready(tx);
        for message in ["one", "two", "three"] {
            assert!(matches!(state.admit(envelope(message), ignore_ack()), Admission::Forwarded));
        }
        assert!(state.pending().is_empty());

        let mut received = Vec::new();
        while let Ok((env, _ack)) = rx.try_recv() {
            received.push(env.message);
        }
        assert_eq!(received, ["one", "two", "three"]);
    }

    #[rstest]
    fn stopped_publisher_returns_the_ack() {
        let mut state = PublisherState::default();
        let (tx, rx) = mpsc::unbounded_channel();
        state.mark_ready(tx);
        drop(rx);
        assert!(matches!(state.admit(envelope("late"), ignore_ack()), Admission::Closed(_)));
    }
}
