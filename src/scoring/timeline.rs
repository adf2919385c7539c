use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::FrameClock;

use super::engine::{AlignmentResult, ForcedAligner, WordId, WordRef};
use super::lexicon::{SENTENCE_END, SENTENCE_START};
use super::phones::PhoneSymbol;
use super::{Result, ScoringError};

/// One aligned phone, in alignment frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhoneSegment {
    pub start_frame: u32,
    pub duration_frames: u32,
    pub phone: PhoneSymbol,
    /// Log-domain acoustic score, normally negative.
    pub score: i32,
}

impl PhoneSegment {
    pub fn new(start_frame: u32, duration_frames: u32, phone: PhoneSymbol, score: i32) -> Self {
        Self {
            start_frame,
            duration_frames,
            phone,
            score,
        }
    }
}

/// Sentence words ready for alignment plus the ones the dictionary missed.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSentence {
    pub words: Vec<WordRef>,
    pub unresolved: Vec<String>,
}

/// Wraps the sentence in boundary words and looks every word up.
///
/// Unknown words are passed on with `WordId::UNRESOLVED` so alignment still runs.
pub fn resolve_sentence<A>(sentence: &str, aligner: &A) -> ResolvedSentence
where
    A: ForcedAligner + ?Sized,
{
    let mut resolved = ResolvedSentence::default();
    let words = std::iter::once(SENTENCE_START)
        .chain(sentence.split(' ').filter(|word| !word.is_empty()))
        .chain(std::iter::once(SENTENCE_END));
    for word in words {
        let id = match aligner.word_id(word) {
            Some(id) => id,
            None => {
                let error = ScoringError::UnresolvedWord {
                    word: word.to_string(),
                };
                warn!(%error, "continuing alignment with placeholder id");
                resolved.unresolved.push(word.to_string());
                WordId::UNRESOLVED
            }
        };
        resolved.words.push(WordRef {
            text: word.to_string(),
            id,
        });
    }
    resolved
}

/// Flat, ordered phone sequence of one utterance.
#[derive(Debug, Clone, Default)]
pub struct PhoneTimeline {
    segments: Vec<PhoneSegment>,
    max_duration: u32,
}

impl PhoneTimeline {
    /// Flattens a word/phone alignment, keeping only phones that start inside
    /// their word.
    pub fn from_alignment(alignment: &AlignmentResult, clock: FrameClock) -> Result<Self> {
        let mut timeline = Self::default();
        for word in &alignment.words {
            debug!(
                word = %word.word,
                start_s = clock.frames_to_seconds(word.start_frame),
                duration_s = clock.frames_to_seconds(word.duration_frames),
                score = word.score,
                "aligned word"
            );
            let word_end = word.end_frame();
            for phone in &word.phones {
                if phone.start_frame >= word_end {
                    break;
                }
                let symbol: PhoneSymbol = phone.phone.parse()?;
                debug!(
                    phone = %symbol,
                    start_s = clock.frames_to_seconds(phone.start_frame),
                    duration_s = clock.frames_to_seconds(phone.duration_frames),
                    score = phone.score,
                    "aligned phone"
                );
                timeline.push(PhoneSegment::new(
                    phone.start_frame,
                    phone.duration_frames,
                    symbol,
                    phone.score,
                ));
            }
        }

        if timeline.len() < 2 {
            return Err(ScoringError::alignment(format!(
                "timeline has {} phones, at least two are required",
                timeline.len()
            )));
        }
        info!(
            words = alignment.words.len(),
            phones = timeline.len(),
            max_duration = timeline.max_duration,
            "built phone timeline"
        );
        Ok(timeline)
    }

    pub fn from_segments(segments: Vec<PhoneSegment>) -> Self {
        let mut timeline = Self::default();
        for segment in segments {
            timeline.push(segment);
        }
        timeline
    }

    fn push(&mut self, segment: PhoneSegment) {
        self.max_duration = self.max_duration.max(segment.duration_frames);
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PhoneSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn max_duration(&self) -> u32 {
        self.max_duration
    }
}
