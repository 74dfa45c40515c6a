//! Oracle registration state machine.
//!
//! State transitions:
//! - `Uninitialized` → `Pending`: `RegisterAck` received
//! - `Pending` → `Approved`: first height advance of the current generation, or `mined_block`
//! - any → `Pending`: a new `RegisterAck` supersedes the old oracle and its generation
//!
//! All oracle state lives here and is changed only by [`OracleLifecycle`]'s
//! handlers. Confirmation goes through a single guarded entry point that
//! checks both the generation token and the pending status, so racing
//! triggers confirm a registration at most once.

use tokio::sync::watch;

use aeoracle_core::event::{Oracle, OracleEvent, OracleStatus};
use aeoracle_core::inbound::InboundEvent;

use crate::poller::{HeightPoller, PollGeneration, PollSignal};

/// Coarse registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Pending,
    Approved,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// Owns the live oracle, the current generation and the height poller.
pub struct OracleLifecycle {
    oracle: Option<Oracle>,
    generation: PollGeneration,
    poller: HeightPoller,
    snapshot: watch::Sender<Option<Oracle>>,
}

impl OracleLifecycle {
    /// `snapshot` receives a copy of the oracle after every transition.
    pub fn new(poller: HeightPoller, snapshot: watch::Sender<Option<Oracle>>) -> Self {
        Self {
            oracle: None,
            generation: PollGeneration::default(),
            poller,
            snapshot,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.oracle.as_ref().map(|o| o.status) {
            None => LifecycleState::Uninitialized,
            Some(OracleStatus::Pending) => LifecycleState::Pending,
            Some(OracleStatus::Approved) => LifecycleState::Approved,
        }
    }

    pub fn oracle(&self) -> Option<&Oracle> {
        self.oracle.as_ref()
    }

    /// Generation of the most recent registration.
    pub fn generation(&self) -> PollGeneration {
        self.generation
    }

    pub fn poller(&self) -> &HeightPoller {
        &self.poller
    }

    /// Apply a decoded channel message. Returns the events to emit, in order.
    pub fn handle_inbound(&mut self, event: InboundEvent) -> Vec<OracleEvent> {
        match event {
            InboundEvent::RegisterAck { oracle_id } => {
                self.begin_registration(oracle_id);
                Vec::new()
            }
            InboundEvent::MinedBlock => self.confirm(self.generation).into_iter().collect(),
            InboundEvent::QueryNotice { query_id } => vec![OracleEvent::Query(query_id)],
            InboundEvent::SubscribedNotice { subscribed_to } => {
                vec![OracleEvent::Subscribed(subscribed_to)]
            }
            InboundEvent::NewQuery { payload } => vec![OracleEvent::NewQuery(payload)],
            InboundEvent::NewResponse { response } => vec![OracleEvent::Response(response)],
            InboundEvent::RawMessage { .. } => Vec::new(),
        }
    }

    /// Apply a height fetch result. Returns the events to emit, in order.
    pub fn handle_signal(&mut self, signal: PollSignal) -> Vec<OracleEvent> {
        match signal {
            PollSignal::Baseline { generation, height } => {
                if generation != self.generation || self.state() != LifecycleState::Pending {
                    tracing::debug!(%generation, current = %self.generation, "discarding stale baseline");
                    return Vec::new();
                }
                self.poller.start(height, generation);
                Vec::new()
            }
            PollSignal::Height { generation, height } => {
                if generation != self.generation {
                    tracing::debug!(%generation, current = %self.generation, height, "discarding stale height");
                    return Vec::new();
                }
                let Some(advanced) = self.poller.accept(generation, height) else {
                    return Vec::new();
                };
                let mut events = vec![OracleEvent::NewBlock(advanced.height)];
                events.extend(self.confirm(generation));
                events
            }
        }
    }

    /// Stop all height tracking. Called when the channel closes.
    pub fn shutdown(&mut self) {
        self.poller.stop();
    }

    fn begin_registration(&mut self, oracle_id: String) {
        self.poller.stop();
        self.generation = self.generation.next();
        if let Some(previous) = &self.oracle {
            tracing::debug!(
                previous = %previous.id,
                status = %previous.status,
                "superseding earlier registration"
            );
        }
        tracing::info!(oracle_id = %oracle_id, generation = %self.generation, "oracle registration pending");
        self.oracle = Some(Oracle::pending(oracle_id));
        self.publish();
        self.poller.fetch_baseline(self.generation);
    }

    /// The only path from `Pending` to `Approved`.
    fn confirm(&mut self, generation: PollGeneration) -> Option<OracleEvent> {
        if generation != self.generation {
            return None;
        }
        let id = {
            let oracle = self.oracle.as_mut().filter(|o| o.is_pending())?;
            oracle.status = OracleStatus::Approved;
            oracle.id.clone()
        };
        self.poller.stop();
        self.publish();
        tracing::info!(oracle_id = %id, %generation, "oracle registration confirmed");
        Some(OracleEvent::RegisteredOracle(id))
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.oracle.clone());
    }
}
