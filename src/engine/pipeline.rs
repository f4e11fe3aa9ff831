//! Per-file pipeline run: probe -> plan -> (external encode) -> gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use super::bitrate::{BitrateAnalysis, plan_bitrate};
use super::encoder::{HostCapabilities, select_encoder};
use super::error::{EngineError, Result};
use super::gate::{GateDecision, MediaHandle, PerceptualScorer, evaluate, evaluate_with};
use super::intent::{PlanMode, QualityIntent};
use super::plan::{EncodePlan, PlanOutcome, SkipReason, build_plan, is_target_codec};
use super::probe::{MediaProbe, RawProbe, analyze};
use super::quality::{REDUCTION_SPEED_PRESET, resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Probed,
    Skipped,
    PlanReady,
    AwaitingEncode,
    Accepted,
    Reverted,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probed => "probed",
            Self::Skipped => "skipped",
            Self::PlanReady => "plan_ready",
            Self::AwaitingEncode => "awaiting_encode",
            Self::Accepted => "accepted",
            Self::Reverted => "reverted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped | Self::Accepted | Self::Reverted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file's trip through the engine. Owns every entity it creates; nothing
/// is shared between runs.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    intent: QualityIntent,
    probe: Option<MediaProbe>,
    state: RunState,
    outcome: Option<PlanOutcome>,
    analysis: Option<BitrateAnalysis>,
    decision: Option<GateDecision>,
}

impl PipelineRun {
    /// Start a run from an analyzed probe. The probe and intent are validated here.
    pub fn new(probe: MediaProbe, intent: QualityIntent) -> Result<Self> {
        Self::start(Some(probe), intent)
    }

    /// Start a run from raw probe data. A file without video starts a run that
    /// will plan to [`SkipReason::NoVideoStream`]; other probe errors are returned.
    pub fn from_raw(raw: &RawProbe, intent: QualityIntent) -> Result<Self> {
        match analyze(raw) {
            Ok(probe) => Self::start(Some(probe), intent),
            Err(EngineError::NoVideoStream) => Self::start(None, intent),
            Err(e) => Err(e),
        }
    }

    fn start(probe: Option<MediaProbe>, intent: QualityIntent) -> Result<Self> {
        let intent = intent.validate()?;
        if let Some(probe) = &probe {
            probe.validate()?;
        }
        Ok(Self {
            id: Uuid::new_v4(),
            intent,
            probe,
            state: RunState::Probed,
            outcome: None,
            analysis: None,
            decision: None,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn intent(&self) -> &QualityIntent {
        &self.intent
    }

    pub fn probe(&self) -> Option<&MediaProbe> {
        self.probe.as_ref()
    }

    pub fn outcome(&self) -> Option<&PlanOutcome> {
        self.outcome.as_ref()
    }

    /// Present only for size-reduction plans
    pub fn analysis(&self) -> Option<&BitrateAnalysis> {
        self.analysis.as_ref()
    }

    pub fn decision(&self) -> Option<&GateDecision> {
        self.decision.as_ref()
    }

    /// Decide how to encode, or that the file should be skipped.
    ///
    /// Skip checks run before the host is asked about hardware.
    pub fn plan<C: HostCapabilities + ?Sized>(
        &mut self,
        caps: &C,
        container: &str,
    ) -> Result<&PlanOutcome> {
        self.expect_state(RunState::Probed, RunState::PlanReady)?;

        let outcome = match &self.probe {
            None => PlanOutcome::skip(SkipReason::NoVideoStream),
            Some(probe) if !probe.has_video => PlanOutcome::skip(SkipReason::NoVideoStream),
            Some(probe) if is_target_codec(&probe.codec) => {
                PlanOutcome::skip(SkipReason::AlreadyTargetCodec)
            }
            Some(probe) => {
                let encoder = select_encoder(&self.intent, caps);
                let tier = resolve(self.intent.tier);

                let (quality, preset) = match self.intent.mode {
                    PlanMode::Quality => (tier.base_quality, tier.speed_preset),
                    PlanMode::Reduction => {
                        let analysis = plan_bitrate(probe, &self.intent)?;
                        self.analysis = Some(analysis);
                        (analysis.final_quality_param, REDUCTION_SPEED_PRESET)
                    }
                };

                build_plan(probe, encoder, quality, preset, &self.intent, container)
            }
        };

        self.state = match &outcome {
            PlanOutcome::Ready(_) => RunState::PlanReady,
            PlanOutcome::Skip { reason } => {
                info!(run = %self.id, %reason, "skipping file");
                RunState::Skipped
            }
        };
        debug!(run = %self.id, state = %self.state, "planned");

        Ok(self.outcome.insert(outcome))
    }

    /// Hand the plan to an executor. The run then waits for [`PipelineRun::gate`].
    pub fn begin_encode(&mut self) -> Result<&EncodePlan> {
        self.expect_state(RunState::PlanReady, RunState::AwaitingEncode)?;
        self.state = RunState::AwaitingEncode;

        match &self.outcome {
            Some(PlanOutcome::Ready(plan)) => Ok(plan),
            _ => Err(EngineError::InvalidTransition {
                from: RunState::PlanReady.as_str(),
                to: RunState::AwaitingEncode.as_str(),
            }),
        }
    }

    /// Gate the executor's result with an already-known (or absent) score.
    pub fn gate(&mut self, transcoded: &MediaProbe, score: Option<f64>) -> Result<&GateDecision> {
        let original = self.gate_original()?;
        let decision = evaluate(original, transcoded, &self.intent, score)?;
        Ok(self.finish(decision))
    }

    /// Gate the executor's result, asking `scorer` only if the size check passes.
    pub fn gate_with<S: PerceptualScorer + ?Sized>(
        &mut self,
        original_path: &Path,
        transcoded_path: &Path,
        transcoded: &MediaProbe,
        scorer: &S,
    ) -> Result<&GateDecision> {
        let original = self.gate_original()?;
        let decision = evaluate_with(
            MediaHandle {
                path: original_path,
                probe: original,
            },
            MediaHandle {
                path: transcoded_path,
                probe: transcoded,
            },
            &self.intent,
            scorer,
        )?;
        Ok(self.finish(decision))
    }

    fn gate_original(&self) -> Result<&MediaProbe> {
        self.expect_state(RunState::AwaitingEncode, RunState::Accepted)?;
        self.probe
            .as_ref()
            .ok_or_else(|| EngineError::InvalidProbe("run has no original probe".to_string()))
    }

    fn finish(&mut self, decision: GateDecision) -> &GateDecision {
        self.state = if decision.accepted {
            RunState::Accepted
        } else {
            RunState::Reverted
        };
        info!(run = %self.id, state = %self.state, reason = %decision.reason, "gated");
        self.decision.insert(decision)
    }

    fn expect_state(&self, expected: RunState, to: RunState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition {
                from: self.state.as_str(),
                to: to.as_str(),
            })
        }
    }
}
