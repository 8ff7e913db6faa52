// Stream supervisor: connection lifecycle and reconnect loop.
//
// One cycle: open the stream, read chunks through a fresh LineDecoder,
// classify each line, hand payloads to the dispatcher without waiting for
// delivery. When the stream ends or fails, pause for the fixed delay and
// start a new cycle. Nothing but the configuration survives a cycle.
//
//   Idle -> Connecting -> Streaming -> (Ended | Errored)
//        -> ReconnectPending -> Connecting -> ...

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, error, info};

use super::classifier::{classify, Frame};
use super::decoder::LineDecoder;
use crate::discord::dispatch::Dispatcher;

/// Body of an open stream: raw byte chunks at arbitrary boundaries.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Something that can open the filtered stream.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Open a new connection. A non-success response is an error.
    async fn open(&self) -> Result<ChunkStream>;
}

/// The delay primitive between cycles, injectable for tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping via the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Where the supervisor is in its connect / stream / reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Streaming,
    ReconnectPending,
}

/// How a single connection cycle finished.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The remote end closed the stream.
    Ended,
    /// Opening or reading the stream failed.
    Errored(anyhow::Error),
}

impl CycleOutcome {
    pub fn is_errored(&self) -> bool {
        matches!(self, CycleOutcome::Errored(_))
    }
}

/// Running counters across all cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub cycles: u64,
    pub payloads: u64,
    pub keep_alives: u64,
    pub ignored: u64,
}

pub struct Supervisor {
    source: Arc<dyn StreamSource>,
    dispatcher: Dispatcher,
    sleeper: Box<dyn Sleeper>,
    reconnect_delay: Duration,
    state: ConnectionState,
    stats: StreamStats,
}

impl Supervisor {
    pub fn new(
        source: Arc<dyn StreamSource>,
        dispatcher: Dispatcher,
        sleeper: Box<dyn Sleeper>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            source,
            dispatcher,
            sleeper,
            reconnect_delay,
            state: ConnectionState::Idle,
            stats: StreamStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Stream and reconnect forever. Never returns.
    pub async fn run_forever(&mut self) {
        loop {
            self.run_cycle_and_wait().await;
        }
    }

    /// Run `cycles` connection cycles, each followed by the reconnect
    /// pause, and return how each one finished.
    pub async fn run_cycles(&mut self, cycles: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            outcomes.push(self.run_cycle_and_wait().await);
        }
        outcomes
    }

    async fn run_cycle_and_wait(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle().await;

        match &outcome {
            CycleOutcome::Ended => {
                info!(
                    delay_secs = self.reconnect_delay.as_secs(),
                    "Stream ended, reconnecting in {}s...",
                    self.reconnect_delay.as_secs()
                );
            }
            CycleOutcome::Errored(e) => {
                error!(error = %e, "Stream error");
                info!(
                    delay_secs = self.reconnect_delay.as_secs(),
                    "Reconnecting in {}s...",
                    self.reconnect_delay.as_secs()
                );
            }
        }

        self.set_state(ConnectionState::ReconnectPending);
        self.sleeper.sleep(self.reconnect_delay).await;
        outcome
    }

    /// One Connecting -> Streaming -> Ended/Errored pass.
    ///
    /// The decoder is created here, so a partial line from a dropped
    /// connection can never leak into the next one.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;
        self.set_state(ConnectionState::Connecting);
        info!(cycle = self.stats.cycles, "Starting filtered stream...");

        let mut chunks = match self.source.open().await {
            Ok(chunks) => chunks,
            Err(e) => return CycleOutcome::Errored(e),
        };

        self.set_state(ConnectionState::Streaming);
        let mut decoder = LineDecoder::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return CycleOutcome::Errored(e),
            };
            for line in decoder.push(&chunk) {
                self.route(&line);
            }
        }

        let dropped = decoder.finish();
        if dropped > 0 {
            debug!(bytes = dropped, "Discarding unterminated trailing fragment");
        }
        CycleOutcome::Ended
    }

    fn route(&mut self, line: &str) {
        match classify(line) {
            Frame::KeepAlive => {
                self.stats.keep_alives += 1;
            }
            Frame::Payload(frame) => {
                self.stats.payloads += 1;
                // Detached: the read loop never waits on delivery
                self.dispatcher.dispatch(*frame);
            }
            Frame::Unrecognized => {
                self.stats.ignored += 1;
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        debug!(from = ?self.state, to = ?state, "Stream state change");
        self.state = state;
    }
}
