use super::aggregator::Aggregator;
use crate::analysts::AnalystPanel;
use crate::error::{EngineError, PersistenceError};
use crate::indicators::{Indicator, IndicatorProvider, StandardIndicators};
use crate::learning::Learner;
use crate::models::{CandleSeries, DecisionReason, TradeDecision, TradeOutcome, WeightTable};
use crate::persistence::{JsonFileBackend, MemoryBackend, RedisBackend, WeightBackend, WeightStore};
use crate::settings::{Settings, StorageBackend};
use std::path::Path;

/// Analysis and settlement entry points.
///
/// One `analyze` call is one cycle: gate on history length, compute the
/// indicator snapshot once, run the panel, aggregate with the current weights.
/// `settle` feeds a resolved trade back through the learner into the store.
pub struct ConsensusEngine {
    provider: Box<dyn IndicatorProvider>,
    panel: AnalystPanel,
    aggregator: Aggregator,
    store: WeightStore,
}

impl ConsensusEngine {
    pub fn new<P>(
        provider: P,
        panel: AnalystPanel,
        aggregator: Aggregator,
        store: WeightStore,
    ) -> Self
    where
        P: IndicatorProvider + 'static,
    {
        Self {
            provider: Box::new(provider),
            panel,
            aggregator,
            store,
        }
    }

    /// Read settings (file and environment) and build the standard engine
    pub fn load(config_path: Option<&Path>) -> Result<Self, EngineError> {
        let settings = Settings::load(config_path)?;
        Self::from_settings(&settings)
    }

    /// Standard provider and panel, weights stored where `settings.storage` says
    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let storage = &settings.storage;
        match storage.backend {
            StorageBackend::File => Ok(Self::with_backend(
                settings,
                JsonFileBackend::new(&storage.path),
            )),
            StorageBackend::Redis => {
                let backend = RedisBackend::new(&storage.redis_url, storage.redis_key.as_str())?;
                Ok(Self::with_backend(settings, backend))
            }
            StorageBackend::Memory => Ok(Self::with_backend(settings, MemoryBackend::new())),
        }
    }

    /// Standard provider and panel over an explicit weight backend
    pub fn with_backend<B>(settings: &Settings, backend: B) -> Self
    where
        B: WeightBackend + 'static,
    {
        let panel = AnalystPanel::standard(settings.panel.clone());
        let store = WeightStore::open(
            backend,
            Learner::new(settings.learner.clone()),
            panel.names(),
        );

        Self::new(
            StandardIndicators::new(settings.indicators.clone()),
            panel,
            Aggregator::new(settings.aggregator.clone()),
            store,
        )
    }

    pub fn min_history(&self) -> usize {
        self.provider.min_history()
    }

    pub fn panel(&self) -> &AnalystPanel {
        &self.panel
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn store(&self) -> &WeightStore {
        &self.store
    }

    /// Current weight table
    pub fn weights(&self) -> Result<WeightTable, PersistenceError> {
        self.store.load()
    }

    /// Run one analysis cycle.
    ///
    /// Never fails: short history and indicator errors come back as WAIT with
    /// the cause in `reason`.
    pub fn analyze(&self, candles: &CandleSeries) -> TradeDecision {
        let need = self.provider.min_history();
        let fallback_duration = self.aggregator.config().default_duration;

        if candles.len() < need {
            tracing::info!(
                "⏸️  WAIT: {} candles available, {} required",
                candles.len(),
                need
            );
            return TradeDecision::wait(
                DecisionReason::InsufficientData {
                    have: candles.len(),
                    need,
                },
                fallback_duration,
            );
        }

        let indicators = match self.provider.compute(candles) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("⚠️  Indicator computation failed: {}", e);
                return TradeDecision::wait(
                    DecisionReason::IndicatorFailure {
                        message: e.to_string(),
                    },
                    fallback_duration,
                );
            }
        };

        let votes = self.panel.evaluate(candles, &indicators);

        let weights = self.store.load().unwrap_or_else(|e| {
            tracing::warn!("⚠️  Weight table unavailable, scoring with neutral weights: {}", e);
            WeightTable::new()
        });

        let decision = self
            .aggregator
            .decide(&votes, &weights, indicators.last(Indicator::Adx).ok());

        tracing::info!(
            "🎯 {} score={:.2} duration={} ({})",
            decision.signal,
            decision.score,
            decision.duration,
            decision.reason
        );
        for insight in &decision.insights {
            tracing::debug!("   {}", insight);
        }

        decision
    }

    /// Apply a resolved trade to the weights and persist them
    pub fn settle(&self, outcome: &TradeOutcome) -> Result<WeightTable, PersistenceError> {
        self.store.record_outcome(outcome)
    }
}

impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("min_history", &self.provider.min_history())
            .field("panel", &self.panel)
            .field("aggregator", &self.aggregator)
            .field("store", &self.store)
            .finish()
    }
}
