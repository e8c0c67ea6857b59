//! Worker commands and bypass reply tickets.
//!
//! Every bypass request carries its own single-use reply channel. The caller
//! keeps the receiving half as a [`BypassTicket`]; when the worker exits
//! without replying, the sending half is dropped with the queued command and
//! the ticket reports [`TicketState::ProducerTerminated`].

use crate::error::Result;
use shadow_store::IndexRange;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

/// Messages accepted by the sync worker.
pub enum Command {
    /// Re-evaluate the rate controller (e.g. after a share change).
    Wake,
    /// Exit after the copy in progress.
    Stop,
    /// Copy `range` immediately, regardless of the bandwidth share.
    Bypass {
        range: IndexRange,
        reply: SyncSender<Result<usize>>,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Wake => f.write_str("Wake"),
            Command::Stop => f.write_str("Stop"),
            Command::Bypass { range, .. } => f.debug_struct("Bypass").field("range", range).finish(),
        }
    }
}

/// Observed state of a bypass request.
#[derive(Debug)]
pub enum TicketState {
    /// No reply yet and the worker is still alive.
    Pending,
    /// The worker replied with the number of newly synced items.
    Completed(Result<usize>),
    /// The worker exited without replying.
    ProducerTerminated,
}

/// Caller half of a bypass reply channel.
#[derive(Debug)]
pub struct BypassTicket {
    reply: Receiver<Result<usize>>,
}

impl BypassTicket {
    /// Waits up to `timeout` for the worker's reply.
    pub fn poll(&self, timeout: Duration) -> TicketState {
        match self.reply.recv_timeout(timeout) {
            Ok(result) => TicketState::Completed(result),
            Err(RecvTimeoutError::Timeout) => TicketState::Pending,
            Err(RecvTimeoutError::Disconnected) => TicketState::ProducerTerminated,
        }
    }
}

/// Creates a bypass command for `range` together with its ticket.
pub fn bypass_request(range: IndexRange) -> (Command, BypassTicket) {
    let (reply, rx) = mpsc::sync_channel(1);
    (Command::Bypass { range, reply }, BypassTicket { reply: rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_pending_then_completed() {
        let (command, ticket) = bypass_request(IndexRange::contiguous(0, 4));
        assert!(matches!(
            ticket.poll(Duration::from_millis(1)),
            TicketState::Pending
        ));

        let Command::Bypass { reply, .. } = command else {
            panic!("expected bypass command");
        };
        reply.send(Ok(4)).unwrap();
        assert!(matches!(
            ticket.poll(Duration::from_millis(1)),
            TicketState::Completed(Ok(4))
        ));
    }

    #[test]
    fn test_ticket_detects_dropped_producer() {
        let (command, ticket) = bypass_request(IndexRange::single(3));
        drop(command);
        assert!(matches!(
            ticket.poll(Duration::from_secs(1)),
            TicketState::ProducerTerminated
        ));
    }

    #[test]
    fn test_command_debug() {
        let (command, _ticket) = bypass_request(IndexRange::contiguous(1, 2));
        assert!(format!("{:?}", command).starts_with("Bypass"));
        assert_eq!(format!("{:?}", Command::Stop), "Stop");
    }
}
