pub mod audio;
pub mod cli;
pub mod config;
pub mod scoring;
pub mod types;

pub use config::{ScoringConfig, WindowPolicy};
pub use scoring::{score_utterance, ScoringError, ScoringReport};
pub use types::{FeatureVector, FrameClock, Utterance};
