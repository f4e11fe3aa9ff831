// Transcode decision engine - pure, independent of the host and the CLI

pub mod bitrate;
pub mod encoder;
pub mod error;
pub mod gate;
pub mod intent;
pub mod pipeline;
pub mod plan;
pub mod probe;
pub mod quality;

pub use bitrate::{BitrateAnalysis, plan_bitrate};
pub use encoder::{
    EncoderChoice, EncoderFamily, HostCapabilities, StaticCapabilities, select_encoder,
};
pub use error::EngineError;
pub use gate::{
    GateAnnotation, GateDecision, GateReason, KnownScore, MediaHandle, PerceptualScorer,
    Unscored, evaluate,
};
pub use intent::{PlanMode, QualityIntent};
pub use pipeline::{PipelineRun, RunState};
pub use plan::{EncodePlan, HdrPassthrough, PlanOutcome, SkipReason, build_plan};
pub use probe::{MediaProbe, RawProbe, analyze};
pub use quality::{QualityTier, QualityTierParams, SpeedPreset, resolve};
