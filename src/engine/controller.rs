//! Pipeline controller
//!
//! Owns the live pipeline and rewires it while listeners stay connected.
//!
//! # Effect splicing
//!
//! ```text
//!  before:  source ──► feeder ──► pacing(A) ──► fan-out
//!
//!  1. pacing(B) spawned, wired to fan-out, gated on A retiring
//!  2. feeder detached: A drains what it already holds, source handed back
//!  3. source ──► mixer(effect) ──► feeder' ──► pacing(B)
//!
//!  after:   mixer(source, effect) ──► feeder' ──► pacing(B) ──► fan-out
//! ```
//!
//! All operations are serialized through one async mutex; concurrent
//! splices are applied one after the other in arrival order.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::EffectCatalog;
use crate::error::{Error, Result};
use crate::media::{probe_or_fallback, BitRate};
use crate::pipeline::{self, source, AudioSource, Feeder, FeederExit, MergeError, PacingStage};
use crate::registry::{ClientId, ClientRegistry, ClientStream, FanOut};
use crate::stats::{BroadcastCounters, BroadcastStats};
use crate::tool::{AudioTool, SoxTool};

use super::config::EngineConfig;
use super::state::{BroadcastState, RewirePhase};

/// The pipeline currently writing to the fan-out
struct LivePipeline {
    /// Current pacing stage
    pacing: PacingStage,
    /// Feeder of the current source; `None` once the source has been
    /// fully read
    feeder: Option<Feeder>,
    /// Bit rate the pacing rate was derived from
    bit_rate: BitRate,
    /// Effects layered into the current source
    effects: usize,
}

#[derive(Default)]
struct PipelineState {
    live: Option<LivePipeline>,
    /// Stages replaced or ended but possibly still writing, oldest first.
    /// Each stage is gated on the one before it, so the last entry retires
    /// last.
    retiring: Vec<PacingStage>,
}

impl PipelineState {
    fn reap_retired(&mut self) {
        self.retiring.retain(|stage| !stage.is_finished());
    }

    fn is_streaming(&self) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| !live.pacing.is_finished())
    }
}

/// Live audio broadcast engine
///
/// Paces one source to real-time speed and fans it out to every registered
/// listener.
pub struct BroadcastEngine<T: AudioTool = SoxTool> {
    config: EngineConfig,
    tool: Arc<T>,
    registry: Arc<ClientRegistry>,
    fanout: FanOut,
    catalog: EffectCatalog,
    counters: Arc<BroadcastCounters>,
    state: Mutex<PipelineState>,
}

impl BroadcastEngine<SoxTool> {
    /// Create an engine using the configured external tool
    pub fn new(config: EngineConfig) -> Self {
        let tool = SoxTool::new(config.tool_program.clone());
        Self::with_tool(config, tool)
    }
}

impl<T: AudioTool> BroadcastEngine<T> {
    /// Create an engine with a custom audio tool
    pub fn with_tool(config: EngineConfig, tool: T) -> Self {
        let registry = Arc::new(ClientRegistry::with_buffer(config.client_buffer_chunks));
        Self::with_registry(config, tool, registry)
    }

    /// Create an engine over an existing listener registry
    pub fn with_registry(config: EngineConfig, tool: T, registry: Arc<ClientRegistry>) -> Self {
        let counters = Arc::new(BroadcastCounters::new());
        let fanout = FanOut::new(Arc::clone(&registry), Arc::clone(&counters));
        let catalog = EffectCatalog::new(config.effects_dir.clone());

        Self {
            config,
            tool: Arc::new(tool),
            registry,
            fanout,
            catalog,
            counters,
            state: Mutex::new(PipelineState::default()),
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the listener registry
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Get the audio tool
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Get the effect catalog
    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    /// Register a listener
    pub async fn register(&self) -> (ClientId, ClientStream) {
        self.registry.register().await
    }

    /// Unregister a listener; no-op if already gone
    pub async fn unregister(&self, id: ClientId) {
        self.registry.unregister(id).await;
    }

    /// Current broadcast state
    pub async fn state(&self) -> BroadcastState {
        if self.state.lock().await.is_streaming() {
            BroadcastState::Streaming
        } else {
            BroadcastState::Idle
        }
    }

    /// Bit rate of the current pipeline, if one exists
    pub async fn bit_rate(&self) -> Option<BitRate> {
        self.state.lock().await.live.as_ref().map(|live| live.bit_rate)
    }

    /// Effects layered into the current pipeline
    pub async fn effect_depth(&self) -> usize {
        self.state
            .lock()
            .await
            .live
            .as_ref()
            .map_or(0, |live| live.effects)
    }

    /// Statistics snapshot
    pub fn stats(&self) -> BroadcastStats {
        self.counters.snapshot()
    }

    /// Start broadcasting the configured source
    ///
    /// Resolves once the pipeline is wired, not when streaming finishes.
    /// When already streaming, the source is re-armed from the beginning;
    /// the previous pipeline and any stage still draining are ended, and
    /// the new one writes only after all of them have retired.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.reap_retired();

        let path = self.config.source_path.as_path();
        tracing::info!(source = %path.display(), "Starting broadcast");

        let bit_rate =
            probe_or_fallback(self.tool.as_ref(), path, self.config.fallback_bit_rate).await;
        let byte_rate = self.config.byte_rate(bit_rate.bits_per_sec());
        let source = source::open(path).await?;

        // Re-arm: every old stage stops now, the new one waits for them.
        // Retirement is chained, so the live stage retires last.
        for stage in state.retiring.iter_mut() {
            stage.end();
        }
        if let Some(mut previous) = state.live.take() {
            previous.pacing.end();
            state.retiring.push(previous.pacing);
        }
        let predecessor = state.retiring.last().map(PacingStage::retirement);

        let (pacing, input) = PacingStage::spawn(
            byte_rate,
            self.fanout.clone(),
            self.config.pacing_queue_chunks,
            predecessor,
        );
        let feeder = Feeder::spawn(source, input, self.config.read_chunk_size);

        state.live = Some(LivePipeline {
            pacing,
            feeder: Some(feeder),
            bit_rate,
            effects: 0,
        });
        self.counters.record_pipeline_started();

        tracing::info!(
            source = %path.display(),
            bit_rate = %bit_rate,
            byte_rate = byte_rate,
            "Broadcast pipeline wired"
        );

        Ok(())
    }

    /// Stop broadcasting
    ///
    /// Ends the current pacing stage (and any stage still draining) without
    /// touching listeners; a later `start` reaches them again once the
    /// ended stages have let go of the fan-out.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;

        for stage in state.retiring.iter_mut() {
            stage.end();
        }
        state.reap_retired();

        match state.live.take() {
            Some(mut live) => {
                live.pacing.end();
                state.retiring.push(live.pacing);
                tracing::info!(
                    source = %self.config.source_path.display(),
                    effects = live.effects,
                    "Ending broadcast"
                );
            }
            None => tracing::debug!("Stop requested while idle"),
        }
    }

    /// Splice an effect into the live mix
    ///
    /// Unknown effects are rejected before the pipeline is touched.
    /// Resolves once the mixed source is installed.
    pub async fn inject_effect(&self, name: &str) -> Result<()> {
        let effect = self.catalog.resolve(name).await?;
        self.splice(&effect).await
    }

    /// Splice an already resolved effect file into the live mix
    pub async fn splice(&self, effect: &Path) -> Result<()> {
        let mut state = self.state.lock().await;
        state.reap_retired();

        if !state.is_streaming() {
            return Err(Error::NotStreaming);
        }
        let Some(mut live) = state.live.take() else {
            return Err(Error::NotStreaming);
        };

        // 1. Next stage at the same rate, wired but gated on the current one
        let (mut next, next_input) = PacingStage::spawn(
            live.pacing.byte_rate(),
            self.fanout.clone(),
            self.config.pacing_queue_chunks,
            Some(live.pacing.retirement()),
        );
        tracing::debug!(effect = %effect.display(), phase = %RewirePhase::PendingDetach, "Rewiring");

        // 2. Stop pulling from the source; 3. continue once it is released
        let exit = match live.feeder.take() {
            Some(feeder) => feeder.detach().await,
            None => FeederExit::Exhausted,
        };

        let detached = match exit {
            FeederExit::Detached(source) => source,
            other => {
                next.end();
                drop(next_input);
                state.live = Some(live);
                tracing::warn!(effect = %effect.display(), exit = ?other, "Effect skipped, source already released");
                return Err(match other {
                    FeederExit::Failed(e) => Error::Io(e),
                    FeederExit::Abandoned => Error::NotStreaming,
                    _ => Error::SourceExhausted,
                });
            }
        };

        tracing::debug!(effect = %effect.display(), phase = %RewirePhase::Merging, "Rewiring");
        let (merged, mixed) = self.merge_or_fallback(effect, detached);
        let effects = live.effects + usize::from(mixed);
        let feeder = Feeder::spawn(merged, next_input, self.config.read_chunk_size);

        state.retiring.push(live.pacing);
        state.live = Some(LivePipeline {
            pacing: next,
            feeder: Some(feeder),
            bit_rate: live.bit_rate,
            effects,
        });
        if mixed {
            self.counters.record_effect_injected();
        }

        tracing::info!(
            effect = %effect.display(),
            phase = %RewirePhase::Installed,
            effects = effects,
            "Added effect to broadcast"
        );

        Ok(())
    }

    /// Mixed source, or the untouched source when the mixer cannot launch
    fn merge_or_fallback(&self, effect: &Path, source: AudioSource) -> (AudioSource, bool) {
        match pipeline::merge(self.tool.as_ref(), &self.config, effect, source) {
            Ok(merged) => (merged, true),
            Err(MergeError { error, primary }) => {
                tracing::warn!(
                    effect = %effect.display(),
                    error = %error,
                    "Mixer unavailable, continuing without effect"
                );
                (primary, false)
            }
        }
    }
}
