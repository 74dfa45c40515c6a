//! Scripted height source for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use aeoracle_core::error::TransportError;
use aeoracle_core::transport::HeightSource;

/// One scripted fetch. Fetches past the end of the script fail.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Height { height: u64, delay: Duration },
    Fail,
}

impl Step {
    pub(crate) fn height(height: u64) -> Self {
        Self::Height {
            height,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn delayed(height: u64, delay: Duration) -> Self {
        Self::Height { height, delay }
    }
}

pub(crate) struct ScriptedHeights {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedHeights {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of fetches started so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeightSource for ScriptedHeights {
    async fn block_height(&self) -> Result<u64, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Height { height, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(height)
            }
            Some(Step::Fail) => Err(TransportError::Http("connection refused".into())),
            None => Err(TransportError::Http("script exhausted".into())),
        }
    }

    fn url(&self) -> &str {
        "scripted://heights"
    }
}
