use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::types::FrameClock;

/// What to do when a probe window reaches past the end of the utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Copy the samples that exist and leave the rest of the window silent.
    #[default]
    Truncate,
    /// Fail the scoring pass with a bounds violation.
    Reject,
}

/// Tunables for one scoring pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub frames_per_second: u32,
    pub samples_per_second: u32,
    /// Silence placed on each side of a probe window, in samples.
    pub pad_samples: usize,
    pub substitution_ceiling: u32,
    pub insertion_deletion_ceiling: u32,
    pub window_policy: WindowPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            frames_per_second: FrameClock::DEFAULT_FRAMES_PER_SECOND,
            samples_per_second: FrameClock::DEFAULT_SAMPLES_PER_SECOND,
            pad_samples: 8_000,
            substitution_ceiling: 42,
            insertion_deletion_ceiling: 160,
            window_policy: WindowPolicy::Truncate,
        }
    }
}

impl ScoringConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scoring config at {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("invalid scoring config {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).context("failed to parse scoring config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frames_per_second > 0,
            "frames_per_second must be positive"
        );
        ensure!(
            self.samples_per_second >= self.frames_per_second,
            "samples_per_second ({}) must be at least frames_per_second ({})",
            self.samples_per_second,
            self.frames_per_second
        );
        ensure!(
            self.substitution_ceiling > 0,
            "substitution_ceiling must be positive"
        );
        ensure!(
            self.insertion_deletion_ceiling > 0,
            "insertion_deletion_ceiling must be positive"
        );
        Ok(())
    }

    pub fn clock(&self) -> FrameClock {
        FrameClock::new(self.frames_per_second, self.samples_per_second)
    }
}
