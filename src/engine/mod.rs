pub mod ingest;
pub mod invoke;

use crate::model::{
    InvocationOutcome, ProtocolSequence, RunConfig, SimulationRequest, SimulationResult,
};
use crate::protocol;

/// Everything one engine invocation produced.
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub sequence: ProtocolSequence,
    pub outcome: InvocationOutcome,
    pub result: SimulationResult,
}

pub struct SimEngine {
    cfg: RunConfig,
}

impl SimEngine {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    /// Encode, invoke, ingest. Blocking; never fails. Ingestion is attempted
    /// whenever the engine was launched, even if it exited non-zero, since it
    /// may have written part of the artifact first.
    pub fn run(&self, request: &SimulationRequest) -> EngineRun {
        let _span = tracing::info_span!(
            "simulation_run",
            circuit = request.circuit_type.label(),
            source = request.source_type.label(),
            method = request.method.label(),
        )
        .entered();

        let sequence = protocol::encode(request);
        let mut outcome = invoke::invoke(&self.cfg, &sequence);

        let result = if outcome.launched() {
            let ingested = ingest::ingest(&self.cfg.artifact);
            outcome.warnings.extend(ingested.warnings);
            ingested.result
        } else {
            SimulationResult::empty()
        };

        if outcome.success() && result.is_empty() {
            tracing::warn!(
                artifact = %self.cfg.artifact.display(),
                "engine exited cleanly without rows"
            );
        }

        tracing::info!(
            tokens = sequence.tokens.len(),
            rows = result.len(),
            warnings = outcome.warnings.len(),
            exit_code = ?outcome.exit_code(),
            "simulation finished"
        );

        EngineRun {
            sequence,
            outcome,
            result,
        }
    }
}
