use serde::Serialize;
use tracing::{debug, info};

use crate::audio::ProbeWindow;
use crate::config::{ScoringConfig, WindowPolicy};
use crate::types::{FeatureVector, FrameClock};

use super::classify::{
    classify_insertion_deletion, classify_substitution, InsertionDeletionOutcome,
    SubstitutionOutcome,
};
use super::engine::{ConstrainedDecoder, Hypothesis};
use super::grammar::Grammar;
use super::phones::PhoneSymbol;
use super::timeline::{PhoneSegment, PhoneTimeline};
use super::{Result, ScoringError};

/// Diagnostics for one scored phone position.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneProbe {
    pub index: usize,
    pub left: PhoneSymbol,
    pub phone: PhoneSymbol,
    /// Absent for the final phone, which has no right context.
    pub right: Option<PhoneSymbol>,
    pub duration_s: Option<f32>,
    pub confidence: Option<f32>,
    pub substitution: Option<SubstitutionOutcome>,
    pub insertion_deletion: InsertionDeletionOutcome,
}

/// Drives window extraction, grammar synthesis, decoding and classification
/// over every phone position of a timeline.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    clock: FrameClock,
    padding: usize,
    policy: WindowPolicy,
    substitution_ceiling: u32,
    insertion_deletion_ceiling: u32,
}

impl FeatureAssembler {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            clock: config.clock(),
            padding: config.pad_samples,
            policy: config.window_policy,
            substitution_ceiling: config.substitution_ceiling,
            insertion_deletion_ceiling: config.insertion_deletion_ceiling,
        }
    }

    /// Produces the full feature vector or fails; never a partial vector.
    pub fn assemble<D>(
        &self,
        timeline: &PhoneTimeline,
        samples: &[i16],
        decoder: &mut D,
    ) -> Result<(FeatureVector, Vec<PhoneProbe>)>
    where
        D: ConstrainedDecoder + ?Sized,
    {
        let segments = timeline.segments();
        let count = segments.len();
        if count < 2 {
            return Err(ScoringError::alignment(format!(
                "cannot score a timeline of {count} phones"
            )));
        }

        let mut features = FeatureVector::with_capacity(FeatureVector::expected_len(count));
        let mut probes = Vec::with_capacity(count - 1);
        for index in 1..count {
            let left = &segments[index - 1];
            let current = &segments[index];
            let mut probe = PhoneProbe {
                index,
                left: left.phone,
                phone: current.phone,
                right: None,
                duration_s: None,
                confidence: None,
                substitution: None,
                insertion_deletion: InsertionDeletionOutcome {
                    examined: 0,
                    found: false,
                    penalty: 0,
                    ceiling: self.insertion_deletion_ceiling,
                },
            };

            if index != count - 1 {
                let right = &segments[index + 1];
                let duration = self.clock.frames_to_seconds(current.duration_frames) as f32;
                let confidence = acoustic_confidence(current.score)?;
                features.push(duration);
                features.push(confidence);

                let substitution = self.substitution_probe(samples, left, current, right, decoder)?;
                features.push(substitution.score());

                probe.right = Some(right.phone);
                probe.duration_s = Some(duration);
                probe.confidence = Some(confidence);
                probe.substitution = Some(substitution);
            }

            let insertion_deletion = self.insertion_deletion_probe(samples, left, current, decoder)?;
            features.push(insertion_deletion.score());
            probe.insertion_deletion = insertion_deletion;
            probes.push(probe);
        }

        debug_assert_eq!(features.len(), FeatureVector::expected_len(count));
        info!(
            phones = count,
            features = features.len(),
            "assembled intelligibility features"
        );
        Ok((features, probes))
    }

    fn substitution_probe<D>(
        &self,
        samples: &[i16],
        left: &PhoneSegment,
        current: &PhoneSegment,
        right: &PhoneSegment,
        decoder: &mut D,
    ) -> Result<SubstitutionOutcome>
    where
        D: ConstrainedDecoder + ?Sized,
    {
        let window = ProbeWindow::triphone(
            samples,
            left,
            current,
            right,
            self.clock,
            self.padding,
            self.policy,
        )?;
        let grammar = Grammar::substitution(left.phone, current.phone, right.phone);
        let hypotheses = decode(decoder, &window, &grammar)?;
        drop(window);

        let outcome = classify_substitution(
            &hypotheses,
            &grammar.target_token(),
            self.substitution_ceiling,
        );
        debug!(
            probe = %grammar.probe_key(),
            examined = outcome.examined,
            found = outcome.found,
            score = outcome.score(),
            "substitution"
        );
        Ok(outcome)
    }

    fn insertion_deletion_probe<D>(
        &self,
        samples: &[i16],
        left: &PhoneSegment,
        current: &PhoneSegment,
        decoder: &mut D,
    ) -> Result<InsertionDeletionOutcome>
    where
        D: ConstrainedDecoder + ?Sized,
    {
        let window = ProbeWindow::diphone(
            samples,
            left,
            current,
            self.clock,
            self.padding,
            self.policy,
        )?;
        let grammar = Grammar::insertion_deletion(left.phone, current.phone);
        let hypotheses = decode(decoder, &window, &grammar)?;
        drop(window);

        let outcome = classify_insertion_deletion(&hypotheses, self.insertion_deletion_ceiling);
        debug!(
            probe = %grammar.probe_key(),
            examined = outcome.examined,
            penalty = outcome.penalty,
            score = outcome.score(),
            "insertion/deletion"
        );
        Ok(outcome)
    }
}

fn decode<D>(decoder: &mut D, window: &ProbeWindow, grammar: &Grammar) -> Result<Vec<Hypothesis>>
where
    D: ConstrainedDecoder + ?Sized,
{
    debug!(
        probe = %grammar.probe_key(),
        samples = window.len(),
        truncated = window.is_truncated(),
        jsgf = %grammar.to_jsgf(),
        "decoding probe window"
    );
    decoder.decode(window.samples(), grammar)
}

/// `1 / ln(2 - score)`; monotonic in the (negative, log-domain) acoustic score.
///
/// Scores of 1 or more leave the log domain and would yield a non-finite
/// feature, so they fail the pass as a bad alignment.
pub fn acoustic_confidence(score: i32) -> Result<f32> {
    if score >= 1 {
        return Err(ScoringError::alignment(format!(
            "phone score {score} is not a log-domain acoustic score"
        )));
    }
    Ok((1.0 / (2.0 - score as f64).ln()) as f32)
}
