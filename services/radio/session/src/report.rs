//! Node-report correlation.
//!
//! A node report is requested with a random nonce. The device then streams
//! node database entries and finishes with a completion envelope echoing the
//! nonce. At most one report is outstanding at a time; a completion with any
//! other nonce is reported as invalid and leaves the outstanding request
//! untouched.

use crate::record::NodeRecord;
use rand::Rng;
use std::fmt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Correlation nonce for a node report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce(u32);

impl Nonce {
    /// Sentinel used by reboot recovery; never drawn for a consumer request
    pub const MINIMAL: Nonce = Nonce(69_420);

    /// Largest nonce drawn
    pub const MAX: u32 = 0x7FFF_FFFF;

    /// Wrap a raw nonce
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Draw a nonce in `1..=MAX`, never the reboot sentinel
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let value = rng.gen_range(1..=Self::MAX);
            if value != Self::MINIMAL.0 {
                return Self(value);
            }
        }
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Correlation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No report outstanding
    Idle,
    /// Waiting for the completion echoing this nonce
    AwaitingCompletion(Nonce),
}

/// Coarse progress of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportProgress {
    /// More records may follow
    InProgress,
    /// Completed successfully
    Done,
    /// A completion arrived with the wrong nonce
    Invalid,
    /// No completion arrived in time
    TimedOut,
    /// Abandoned by the caller
    Cancelled,
}

/// Event delivered to a node-report consumer
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    /// One node database entry
    Node(NodeRecord),
    /// Report finished; no further events
    Done,
    /// Completion with a nonce that does not match; the report continues
    Invalid {
        /// Nonce carried by the stray completion
        received: Nonce,
    },
    /// Report abandoned after the deadline; no further events
    TimedOut,
    /// Report abandoned by the caller; no further events
    Cancelled,
}

impl ReportEvent {
    /// Progress this event signals
    pub fn progress(&self) -> ReportProgress {
        match self {
            ReportEvent::Node(_) => ReportProgress::InProgress,
            ReportEvent::Done => ReportProgress::Done,
            ReportEvent::Invalid { .. } => ReportProgress::Invalid,
            ReportEvent::TimedOut => ReportProgress::TimedOut,
            ReportEvent::Cancelled => ReportProgress::Cancelled,
        }
    }

    /// No further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReportEvent::Done | ReportEvent::TimedOut | ReportEvent::Cancelled
        )
    }
}

/// Consumer of node-report events
pub trait NodeReportHandler: Send {
    /// Handle one event
    fn on_report(&mut self, event: ReportEvent);
}

impl<F> NodeReportHandler for F
where
    F: FnMut(ReportEvent) + Send,
{
    fn on_report(&mut self, event: ReportEvent) {
        self(event)
    }
}

/// Outcome of a completion envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Matched the outstanding nonce; session is idle again
    Done(Nonce),
    /// Did not match; the outstanding request is unchanged
    Invalid {
        /// Nonce still outstanding
        expected: Nonce,
        /// Nonce received
        received: Nonce,
    },
    /// No report was outstanding
    Unsolicited(Nonce),
}

/// At-most-one outstanding node report
#[derive(Default)]
pub struct NodeReportSession {
    pending: Option<Pending>,
}

struct Pending {
    nonce: Nonce,
    handler: Box<dyn NodeReportHandler>,
    deadline: Option<Instant>,
    records: usize,
}

impl NodeReportSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        match &self.pending {
            Some(pending) => SessionState::AwaitingCompletion(pending.nonce),
            None => SessionState::Idle,
        }
    }

    /// Nonce of the outstanding report
    pub fn outstanding(&self) -> Option<Nonce> {
        self.pending.as_ref().map(|pending| pending.nonce)
    }

    /// Start waiting for `nonce`.
    ///
    /// Fails with the outstanding nonce if a report is already in flight.
    pub fn arm(
        &mut self,
        nonce: Nonce,
        handler: Box<dyn NodeReportHandler>,
        deadline: Option<Instant>,
    ) -> Result<(), Nonce> {
        if let Some(existing) = self.outstanding() {
            return Err(existing);
        }
        self.pending = Some(Pending {
            nonce,
            handler,
            deadline,
            records: 0,
        });
        Ok(())
    }

    /// Forward a node entry; false when no report is outstanding
    pub fn on_update(&mut self, record: NodeRecord) -> bool {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.records += 1;
                pending.handler.on_report(ReportEvent::Node(record));
                true
            }
            None => {
                debug!("Dropping node {:#010x}: no report outstanding", record.node_num);
                false
            }
        }
    }

    /// Handle a completion envelope
    pub fn on_complete(&mut self, received: Nonce) -> Completion {
        let expected = match self.outstanding() {
            Some(expected) => expected,
            None => {
                debug!("Completion {} with no report outstanding", received);
                return Completion::Unsolicited(received);
            }
        };

        if received != expected {
            warn!(received = %received, expected = %expected, "Completion does not match outstanding report");
            if let Some(pending) = self.pending.as_mut() {
                pending.handler.on_report(ReportEvent::Invalid { received });
            }
            return Completion::Invalid { expected, received };
        }

        if let Some(mut pending) = self.pending.take() {
            info!(nonce = %expected, nodes = pending.records, "Node report complete");
            pending.handler.on_report(ReportEvent::Done);
        }
        Completion::Done(expected)
    }

    /// Abandon the report if its deadline has passed
    pub fn expire(&mut self, now: Instant) -> bool {
        let overdue = matches!(
            &self.pending,
            Some(Pending { deadline: Some(deadline), .. }) if now >= *deadline
        );
        if !overdue {
            return false;
        }
        if let Some(mut pending) = self.pending.take() {
            warn!("Node report {} timed out", pending.nonce);
            pending.handler.on_report(ReportEvent::TimedOut);
        }
        true
    }

    /// Abandon the outstanding report
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(mut pending) => {
                info!("Node report {} cancelled", pending.nonce);
                pending.handler.on_report(ReportEvent::Cancelled);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for NodeReportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeReportSession")
            .field("state", &self.state())
            .finish()
    }
}
