//! Fixed-interval chain height polling, tagged by generation.
//!
//! Every tick spawns an independent height fetch, so completions can arrive
//! out of issuance order. Results travel back to the owner as
//! [`PollSignal`]s carrying the [`PollGeneration`] that issued them; the owner
//! hands them to [`HeightPoller::accept`], which discards anything from a
//! retired generation and anything not strictly above the last accepted
//! height.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use aeoracle_core::transport::HeightSource;

/// Shortest interval the poller will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Token minted each time polling (re)starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PollGeneration(u64);

impl PollGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PollGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A height fetch result, reported back to the poller's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSignal {
    /// Height observed when a registration started. `None` if the fetch failed.
    Baseline {
        generation: PollGeneration,
        height: Option<u64>,
    },
    /// Height returned by one polling tick.
    Height {
        generation: PollGeneration,
        height: u64,
    },
}

/// Height strictly above the last one accepted for the generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightAdvanced {
    pub generation: PollGeneration,
    pub height: u64,
}

struct ActivePoll {
    generation: PollGeneration,
    last_height: Option<u64>,
    ticker: JoinHandle<()>,
}

/// Owns the recurring height fetch for at most one generation at a time.
pub struct HeightPoller {
    source: Arc<dyn HeightSource>,
    interval: Duration,
    signals: mpsc::UnboundedSender<PollSignal>,
    active: Option<ActivePoll>,
}

impl HeightPoller {
    pub fn new(
        source: Arc<dyn HeightSource>,
        interval: Duration,
        signals: mpsc::UnboundedSender<PollSignal>,
    ) -> Self {
        if interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested = ?interval,
                using = ?MIN_POLL_INTERVAL,
                "poll interval too short, clamping"
            );
        }
        Self {
            source,
            interval: interval.max(MIN_POLL_INTERVAL),
            signals,
            active: None,
        }
    }

    /// Fetch the current height once and report it as a
    /// [`PollSignal::Baseline`] for `generation`.
    pub fn fetch_baseline(&self, generation: PollGeneration) {
        let source = self.source.clone();
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let height = match source.block_height().await {
                Ok(height) => Some(height),
                Err(e) => {
                    tracing::warn!(%generation, error = %e, url = %source.url(), "baseline height fetch failed");
                    None
                }
            };
            let _ = signals.send(PollSignal::Baseline { generation, height });
        });
    }

    /// Start polling for `generation`, retiring whatever generation was active.
    ///
    /// Without a `baseline`, the first height accepted becomes the baseline.
    pub fn start(&mut self, baseline: Option<u64>, generation: PollGeneration) {
        self.stop();
        let ticker = tokio::spawn(tick_loop(
            self.source.clone(),
            self.interval,
            generation,
            self.signals.clone(),
        ));
        tracing::debug!(%generation, ?baseline, interval = ?self.interval, "height poller started");
        self.active = Some(ActivePoll {
            generation,
            last_height: baseline,
            ticker,
        });
    }

    /// Cancel the schedule and retire the active generation. Idempotent.
    ///
    /// Fetches already in flight finish, but their results no longer match.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.ticker.abort();
            tracing::debug!(generation = %active.generation, "height poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The active generation, if any.
    pub fn generation(&self) -> Option<PollGeneration> {
        self.active.as_ref().map(|a| a.generation)
    }

    /// Last height accepted for the active generation.
    pub fn last_height(&self) -> Option<u64> {
        self.active.as_ref().and_then(|a| a.last_height)
    }

    /// Apply one polled height.
    pub fn accept(&mut self, generation: PollGeneration, height: u64) -> Option<HeightAdvanced> {
        let Some(active) = self.active.as_mut().filter(|a| a.generation == generation) else {
            tracing::debug!(%generation, height, "discarding height from retired generation");
            return None;
        };
        match active.last_height {
            None => {
                active.last_height = Some(height);
                None
            }
            Some(last) if height <= last => None,
            Some(_) => {
                active.last_height = Some(height);
                Some(HeightAdvanced { generation, height })
            }
        }
    }
}

impl Drop for HeightPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_loop(
    source: Arc<dyn HeightSource>,
    period: Duration,
    generation: PollGeneration,
    signals: mpsc::UnboundedSender<PollSignal>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !signals.is_closed() {
        ticker.tick().await;
        let source = source.clone();
        let signals = signals.clone();
        tokio::spawn(async move {
            match source.block_height().await {
                Ok(height) => {
                    let _ = signals.send(PollSignal::Height { generation, height });
                }
                Err(e) => {
                    tracing::warn!(%generation, error = %e, url = %source.url(), "height poll failed");
                }
            }
        });
    }
}
