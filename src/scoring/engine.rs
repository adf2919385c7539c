//! Seams to the acoustic engine: forced alignment and grammar-constrained decoding.

use serde::{Deserialize, Serialize};

use super::grammar::Grammar;
use super::Result;

/// Dictionary identifier of a sentence word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordId(pub i32);

impl WordId {
    /// Placeholder handed to the aligner for words missing from the dictionary.
    pub const UNRESOLVED: WordId = WordId(-1);

    pub fn is_resolved(self) -> bool {
        self.0 >= 0
    }
}

/// Sentence word paired with the id the aligner's dictionary assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRef {
    pub text: String,
    pub id: WordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneAlignment {
    pub start_frame: u32,
    pub duration_frames: u32,
    /// Acoustic model label, e.g. `AE` or `SIL`.
    pub phone: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAlignment {
    pub word: String,
    pub start_frame: u32,
    pub duration_frames: u32,
    #[serde(default)]
    pub score: i32,
    pub phones: Vec<PhoneAlignment>,
}

impl WordAlignment {
    /// First frame past the word.
    pub fn end_frame(&self) -> u32 {
        self.start_frame.saturating_add(self.duration_frames)
    }
}

/// Hierarchical word/phone segmentation of one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub words: Vec<WordAlignment>,
}

/// One n-best entry. Engines sometimes emit entries without text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: i32,
}

impl Hypothesis {
    pub fn new(text: impl Into<String>, score: i32) -> Self {
        Self {
            text: Some(text.into()),
            score,
        }
    }

    pub fn empty(score: i32) -> Self {
        Self { text: None, score }
    }
}

/// Forced aligner over a word sequence.
pub trait ForcedAligner {
    /// Dictionary lookup; `None` when the word is out of vocabulary.
    fn word_id(&self, word: &str) -> Option<WordId>;

    /// Aligns `audio` against `words`. Words carrying `WordId::UNRESOLVED`
    /// must be tolerated.
    fn align(&mut self, words: &[WordRef], audio: &[i16]) -> Result<AlignmentResult>;
}

/// Decoder that re-decodes a buffer under a pronunciation grammar.
///
/// A call owns the decoder session for its whole duration: the grammar is
/// installed, audio pushed, the utterance closed and the n-best list drained
/// before returning. Results are best-first and may be empty.
pub trait ConstrainedDecoder {
    fn decode(&mut self, audio: &[i16], grammar: &Grammar) -> Result<Vec<Hypothesis>>;
}

impl<T: ForcedAligner + ?Sized> ForcedAligner for &mut T {
    fn word_id(&self, word: &str) -> Option<WordId> {
        (**self).word_id(word)
    }

    fn align(&mut self, words: &[WordRef], audio: &[i16]) -> Result<AlignmentResult> {
        (**self).align(words, audio)
    }
}

impl<T: ConstrainedDecoder + ?Sized> ConstrainedDecoder for &mut T {
    fn decode(&mut self, audio: &[i16], grammar: &Grammar) -> Result<Vec<Hypothesis>> {
        (**self).decode(audio, grammar)
    }
}
