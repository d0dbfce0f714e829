//! Transition table of the test coordinator
//!
//! Pure functions over the current state; the engine applies the returned
//! effect. A `None` from [`on_ping_event`] means the event does not belong to
//! the current state and is dropped.

use crate::ping::PingEventKind;
use crate::types::{TestMode, TestState};

/// Bookkeeping the engine performs alongside a ping-driven transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingEffect {
    /// State change only
    Advance,
    /// The outstanding exchange was confirmed; record its latency
    RecordLatency,
    /// The outstanding exchange timed out
    CountLost,
    /// The transport took the frame; one packet less to go
    Scheduled { await_confirmation: bool },
    /// The transport failed the frame; it will be retried
    TxFailure,
    /// Slave received a test frame
    CountReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingTransition {
    pub next: TestState,
    pub effect: PingEffect,
}

impl PingTransition {
    fn to(next: TestState, effect: PingEffect) -> Option<Self> {
        Some(Self { next, effect })
    }

    /// Effects that settle the outstanding exchange and must match its sequence number
    pub fn settles_exchange(&self) -> bool {
        matches!(self.effect, PingEffect::RecordLatency | PingEffect::CountLost)
    }
}

/// React to a ping event in `state`
pub fn on_ping_event(state: TestState, kind: PingEventKind, mode: TestMode) -> Option<PingTransition> {
    use PingEventKind as K;
    use TestState as S;

    match (kind, state) {
        (K::FrameSent, S::FrameSending) => PingTransition::to(S::FrameSent, PingEffect::Advance),

        (K::AckReceived, S::FrameSentWaitingForAck) | (K::EchoReceived, S::FrameSentWaitingForEcho) => {
            PingTransition::to(S::FrameSent, PingEffect::RecordLatency)
        }

        (K::FrameTimeout, S::FrameSentWaitingForAck | S::FrameSentWaitingForEcho) => {
            PingTransition::to(S::FrameSent, PingEffect::CountLost)
        }

        // Unidirectional frames stay in FrameSending until FrameSent arrives
        (K::FrameScheduled, S::FrameSending) => {
            let next = if mode.is_confirmed() { S::FrameSent } else { S::FrameSending };
            PingTransition::to(next, PingEffect::Scheduled { await_confirmation: false })
        }
        (K::FrameScheduled, S::FrameSentWaitingForAck | S::FrameSentWaitingForEcho) => {
            PingTransition::to(state, PingEffect::Scheduled { await_confirmation: true })
        }

        (K::Error, S::FrameSending | S::FrameSentWaitingForAck | S::FrameSentWaitingForEcho) => {
            PingTransition::to(S::WaitingForTxBuffer, PingEffect::TxFailure)
        }

        (K::RequestReceived, S::WaitingForStopCmd) => {
            PingTransition::to(S::WaitingForStopCmd, PingEffect::CountReceived)
        }

        _ => None,
    }
}

/// State entered when a ping is handed to the transport
pub fn on_ping_sent(mode: TestMode) -> TestState {
    match mode {
        TestMode::Unidirectional => TestState::FrameSending,
        TestMode::Ack => TestState::FrameSentWaitingForAck,
        TestMode::Echo => TestState::FrameSentWaitingForEcho,
    }
}

/// Work requested by a periodic tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Waiting on the transport or the peer
    Wait,
    /// Try to hand the next ping to the transport
    SendPing,
    /// All packets went out; tear the test down
    Stop,
    /// Transmission failed for good
    Abort,
}

/// Advance the state machine on a periodic tick
pub fn on_tick(state: TestState, packets_left: u32) -> (TestState, TickAction) {
    use TestState as S;

    match state {
        S::Idle
        | S::FrameSending
        | S::FrameSentWaitingForAck
        | S::FrameSentWaitingForEcho
        | S::WaitingForStopCmd => (state, TickAction::Wait),
        S::WaitingForTxBuffer if packets_left > 0 => (state, TickAction::SendPing),
        S::WaitingForTxBuffer => (S::Finished, TickAction::Wait),
        S::FrameSent if packets_left > 0 => (S::WaitingForTxBuffer, TickAction::SendPing),
        S::FrameSent => (S::Finished, TickAction::Wait),
        S::Finished => (state, TickAction::Stop),
        S::Error => (state, TickAction::Abort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PingEventKind as K;
    use TestState as S;

    const ALL_STATES: [TestState; 9] = [
        S::Idle,
        S::WaitingForTxBuffer,
        S::FrameSending,
        S::FrameSent,
        S::FrameSentWaitingForAck,
        S::FrameSentWaitingForEcho,
        S::WaitingForStopCmd,
        S::Finished,
        S::Error,
    ];

    #[test]
    fn test_ack_only_accepted_while_waiting_for_ack() {
        for state in ALL_STATES {
            let transition = on_ping_event(state, K::AckReceived, TestMode::Ack);
            if state == S::FrameSentWaitingForAck {
                assert_eq!(transition.map(|t| t.next), Some(S::FrameSent));
            } else {
                assert_eq!(transition, None, "ack accepted in {}", state);
            }
        }
    }

    #[test]
    fn test_idle_ignores_every_ping_event() {
        let kinds = [
            K::FrameSent,
            K::AckReceived,
            K::EchoReceived,
            K::FrameTimeout,
            K::FrameScheduled,
            K::Error,
            K::RequestReceived,
        ];
        for kind in kinds {
            assert_eq!(on_ping_event(S::Idle, kind, TestMode::Echo), None);
        }
    }

    #[test]
    fn test_timeout_counts_loss() {
        let t = on_ping_event(S::FrameSentWaitingForEcho, K::FrameTimeout, TestMode::Echo).unwrap();
        assert_eq!(t.next, S::FrameSent);
        assert_eq!(t.effect, PingEffect::CountLost);
        assert!(t.settles_exchange());
    }

    #[test]
    fn test_unidirectional_waits_for_frame_sent() {
        let scheduled = on_ping_event(S::FrameSending, K::FrameScheduled, TestMode::Unidirectional).unwrap();
        assert_eq!(scheduled.next, S::FrameSending);
        let sent = on_ping_event(S::FrameSending, K::FrameSent, TestMode::Unidirectional).unwrap();
        assert_eq!(sent.next, S::FrameSent);
    }

    #[test]
    fn test_error_returns_to_tx_buffer_wait() {
        let t = on_ping_event(S::FrameSentWaitingForAck, K::Error, TestMode::Ack).unwrap();
        assert_eq!(t.next, S::WaitingForTxBuffer);
        assert_eq!(on_ping_event(S::FrameSent, K::Error, TestMode::Ack), None);
    }

    #[test]
    fn test_tick_table() {
        assert_eq!(on_tick(S::FrameSent, 3), (S::WaitingForTxBuffer, TickAction::SendPing));
        assert_eq!(on_tick(S::FrameSent, 0), (S::Finished, TickAction::Wait));
        assert_eq!(on_tick(S::Finished, 0), (S::Finished, TickAction::Stop));
        assert_eq!(on_tick(S::Error, 7), (S::Error, TickAction::Abort));
        assert_eq!(on_tick(S::WaitingForStopCmd, 0).1, TickAction::Wait);
        assert_eq!(on_tick(S::WaitingForTxBuffer, 2), (S::WaitingForTxBuffer, TickAction::SendPing));
        assert_eq!(on_tick(S::WaitingForTxBuffer, 0), (S::Finished, TickAction::Wait));
    }

    #[test]
    fn test_predictive_send_state() {
        assert_eq!(on_ping_sent(TestMode::Unidirectional), S::FrameSending);
        assert_eq!(on_ping_sent(TestMode::Ack), S::FrameSentWaitingForAck);
        assert_eq!(on_ping_sent(TestMode::Echo), S::FrameSentWaitingForEcho);
    }
}
