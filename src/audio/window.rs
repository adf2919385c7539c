use tracing::warn;

use crate::config::WindowPolicy;
use crate::scoring::{PhoneSegment, Result, ScoringError};
use crate::types::FrameClock;

/// Zero-padded copy of the audio under a diphone or triphone span.
///
/// Layout is `[pad silence][real samples][pad silence]`; the real region is
/// always `requested_len()` long, with any part past the end of the source
/// left silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeWindow {
    samples: Vec<i16>,
    padding: usize,
    requested: usize,
    copied: usize,
}

impl ProbeWindow {
    pub fn diphone(
        source: &[i16],
        left: &PhoneSegment,
        current: &PhoneSegment,
        clock: FrameClock,
        padding: usize,
        policy: WindowPolicy,
    ) -> Result<Self> {
        Self::from_span(source, &[*left, *current], clock, padding, policy)
    }

    pub fn triphone(
        source: &[i16],
        left: &PhoneSegment,
        current: &PhoneSegment,
        right: &PhoneSegment,
        clock: FrameClock,
        padding: usize,
        policy: WindowPolicy,
    ) -> Result<Self> {
        Self::from_span(source, &[*left, *current, *right], clock, padding, policy)
    }

    /// Copies the samples under `span`, starting at the first segment's start.
    pub fn from_span(
        source: &[i16],
        span: &[PhoneSegment],
        clock: FrameClock,
        padding: usize,
        policy: WindowPolicy,
    ) -> Result<Self> {
        let Some(first) = span.first() else {
            return Ok(Self::silent(padding));
        };
        let frames: u32 = span.iter().map(|segment| segment.duration_frames).sum();
        let requested = clock.frames_to_samples(frames);
        let offset = clock.frames_to_samples(first.start_frame);
        let available = source.len().saturating_sub(offset);

        let copied = if requested > available {
            match policy {
                WindowPolicy::Reject => {
                    return Err(ScoringError::BoundsViolation {
                        offset,
                        requested,
                        available,
                    })
                }
                WindowPolicy::Truncate => {
                    warn!(
                        offset,
                        requested, available, "probe window truncated at end of utterance"
                    );
                    available
                }
            }
        } else {
            requested
        };

        let mut samples = vec![0i16; requested + 2 * padding];
        if copied > 0 {
            samples[padding..padding + copied].copy_from_slice(&source[offset..offset + copied]);
        }
        Ok(Self {
            samples,
            padding,
            requested,
            copied,
        })
    }

    fn silent(padding: usize) -> Self {
        Self {
            samples: vec![0; 2 * padding],
            padding,
            requested: 0,
            copied: 0,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Span length in samples, whether or not the source covered all of it.
    pub fn requested_len(&self) -> usize {
        self.requested
    }

    /// Samples actually copied from the source.
    pub fn copied_len(&self) -> usize {
        self.copied
    }

    pub fn is_truncated(&self) -> bool {
        self.copied < self.requested
    }
}
