//! Core types for the intelligibility feature pipeline

use serde::{Deserialize, Serialize};

/// Raw utterance handed to the scorer (mono, 16-bit PCM)
#[derive(Debug, Clone)]
pub struct Utterance {
    /// PCM samples at `FrameClock::samples_per_second`
    pub samples: Vec<i16>,
    /// Reference sentence, words separated by single spaces
    pub sentence: String,
}

impl Utterance {
    pub fn new(samples: Vec<i16>, sentence: impl Into<String>) -> Self {
        Self {
            samples,
            sentence: sentence.into(),
        }
    }
}

/// Relationship between the aligner's frame clock and the PCM sample clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    pub frames_per_second: u32,
    pub samples_per_second: u32,
}

impl FrameClock {
    pub const DEFAULT_FRAMES_PER_SECOND: u32 = 65;
    pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 16_000;

    pub fn new(frames_per_second: u32, samples_per_second: u32) -> Self {
        Self {
            frames_per_second,
            samples_per_second,
        }
    }

    /// Whole samples per alignment frame (integer division, 246 at defaults).
    pub fn samples_per_frame(&self) -> usize {
        (self.samples_per_second / self.frames_per_second.max(1)) as usize
    }

    pub fn frames_to_samples(&self, frames: u32) -> usize {
        frames as usize * self.samples_per_frame()
    }

    pub fn frames_to_seconds(&self, frames: u32) -> f64 {
        frames as f64 / self.frames_per_second as f64
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_FRAMES_PER_SECOND,
            Self::DEFAULT_SAMPLES_PER_SECOND,
        )
    }
}

/// Positional feature vector consumed by the downstream intelligibility model.
///
/// Interior phones contribute `[duration, confidence, substitution, insdel]`,
/// the final phone contributes `[insdel]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Expected vector length for a timeline of `phone_count` segments.
    pub fn expected_len(phone_count: usize) -> usize {
        if phone_count < 2 {
            0
        } else {
            4 * (phone_count - 2) + 1
        }
    }

    pub fn push(&mut self, value: f32) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_uses_whole_samples_per_frame() {
        let clock = FrameClock::default();
        assert_eq!(clock.samples_per_frame(), 246);
        assert_eq!(clock.frames_to_samples(10), 2460);
    }

    #[test]
    fn expected_len_follows_layout() {
        assert_eq!(FeatureVector::expected_len(2), 1);
        assert_eq!(FeatureVector::expected_len(5), 13);
        assert_eq!(FeatureVector::expected_len(1), 0);
    }
}
