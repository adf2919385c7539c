pub mod assembler;
pub mod classify;
pub mod engine;
pub mod grammar;
pub mod lexicon;
pub mod phones;
pub mod replay;
pub mod timeline;

use serde::Serialize;
use thiserror::Error;

use crate::config::ScoringConfig;
use crate::types::{FeatureVector, Utterance};

pub use assembler::{FeatureAssembler, PhoneProbe};
pub use engine::{
    AlignmentResult, ConstrainedDecoder, ForcedAligner, Hypothesis, PhoneAlignment, WordAlignment,
    WordId, WordRef,
};
pub use phones::PhoneSymbol;
pub use timeline::{PhoneSegment, PhoneTimeline};

/// Convenient alias for results returned by scoring modules.
pub type Result<T> = std::result::Result<T, ScoringError>;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Reported alongside a successful pass; never aborts scoring.
    #[error("unresolved word \"{word}\"")]
    UnresolvedWord { word: String },
    #[error("alignment failed: {message}")]
    AlignmentFailure { message: String },
    #[error(
        "probe window at sample {offset} needs {requested} samples but only {available} remain"
    )]
    BoundsViolation {
        offset: usize,
        requested: usize,
        available: usize,
    },
    #[error("constrained decode failed for {probe}: {message}")]
    Decoder { probe: String, message: String },
    #[error("invalid scoring configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScoringError {
    pub fn alignment(message: impl Into<String>) -> Self {
        Self::AlignmentFailure {
            message: message.into(),
        }
    }

    pub fn decoder(probe: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decoder {
            probe: probe.into(),
            message: err.to_string(),
        }
    }
}

/// Everything one scoring pass produced for an utterance.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringReport {
    pub features: FeatureVector,
    pub probes: Vec<PhoneProbe>,
    pub unresolved_words: Vec<String>,
    /// Longest aligned phone in frames; diagnostics only.
    pub max_duration_frames: u32,
}

/// Aligns the utterance against its sentence and probes every phone boundary.
pub fn score_utterance<A, D>(
    utterance: &Utterance,
    aligner: &mut A,
    decoder: &mut D,
    config: &ScoringConfig,
) -> Result<ScoringReport>
where
    A: ForcedAligner + ?Sized,
    D: ConstrainedDecoder + ?Sized,
{
    config
        .validate()
        .map_err(|err| ScoringError::InvalidConfig {
            message: format!("{err:#}"),
        })?;
    let resolved = timeline::resolve_sentence(&utterance.sentence, &*aligner);
    let alignment = aligner.align(&resolved.words, &utterance.samples)?;
    let timeline = PhoneTimeline::from_alignment(&alignment, config.clock())?;
    let (features, probes) =
        FeatureAssembler::new(config).assemble(&timeline, &utterance.samples, decoder)?;
    Ok(ScoringReport {
        features,
        probes,
        unresolved_words: resolved.unresolved,
        max_duration_frames: timeline.max_duration(),
    })
}
