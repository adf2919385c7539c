//! Engine stand-ins that replay recorded aligner and decoder output.
//!
//! Used by the offline runner to re-score captured sessions and by tests to
//! script n-best lists per probe.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use super::engine::{
    AlignmentResult, ConstrainedDecoder, ForcedAligner, Hypothesis, WordId, WordRef,
};
use super::grammar::Grammar;
use super::lexicon::Lexicon;
use super::{Result, ScoringError};

/// Captured engine output for one utterance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedSession {
    pub alignment: AlignmentResult,
    /// N-best lists keyed by probe key (`sub:k-ae-t`, `insdel:k-ae`), one list
    /// per occurrence of the probe in the utterance.
    #[serde(default)]
    pub probes: HashMap<String, Vec<Vec<Hypothesis>>>,
}

impl RecordedSession {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open session {:?}", path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse session {:?}", path))
    }

    pub fn into_engines(self, lexicon: Option<Lexicon>) -> (ScriptedAligner, ScriptedDecoder) {
        let aligner = match lexicon {
            Some(lexicon) => ScriptedAligner::new(lexicon, self.alignment),
            None => ScriptedAligner::from_alignment(self.alignment),
        };
        (aligner, ScriptedDecoder::from_recorded(self.probes))
    }
}

/// Aligner returning a fixed alignment.
#[derive(Debug, Clone)]
pub struct ScriptedAligner {
    lexicon: Option<Lexicon>,
    alignment: AlignmentResult,
    requests: Vec<Vec<WordRef>>,
}

impl ScriptedAligner {
    pub fn new(lexicon: Lexicon, alignment: AlignmentResult) -> Self {
        Self {
            lexicon: Some(lexicon),
            alignment,
            requests: Vec::new(),
        }
    }

    /// Without a lexicon, a word is known when the alignment contains it.
    pub fn from_alignment(alignment: AlignmentResult) -> Self {
        Self {
            lexicon: None,
            alignment,
            requests: Vec::new(),
        }
    }

    /// Word sequences passed to `align`, in call order.
    pub fn requests(&self) -> &[Vec<WordRef>] {
        &self.requests
    }
}

impl ForcedAligner for ScriptedAligner {
    fn word_id(&self, word: &str) -> Option<WordId> {
        match &self.lexicon {
            Some(lexicon) => lexicon.word_id(word),
            None => self
                .alignment
                .words
                .iter()
                .position(|aligned| aligned.word.eq_ignore_ascii_case(word))
                .map(|idx| WordId(idx as i32)),
        }
    }

    fn align(&mut self, words: &[WordRef], audio: &[i16]) -> Result<AlignmentResult> {
        if audio.is_empty() {
            return Err(ScoringError::alignment("cannot align an empty buffer"));
        }
        self.requests.push(words.to_vec());
        Ok(self.alignment.clone())
    }
}

/// Record of one decode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeCall {
    pub probe_key: String,
    pub jsgf: String,
    pub window_len: usize,
}

/// Decoder answering each probe from a per-key queue of n-best lists.
///
/// A probe with no queued list decodes to an empty n-best list.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecoder {
    responses: HashMap<String, VecDeque<Vec<Hypothesis>>>,
    calls: Vec<DecodeCall>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_recorded(recorded: HashMap<String, Vec<Vec<Hypothesis>>>) -> Self {
        let responses = recorded
            .into_iter()
            .map(|(key, lists)| (key, lists.into_iter().collect()))
            .collect();
        Self {
            responses,
            calls: Vec::new(),
        }
    }

    /// Queues an n-best list for the next decode of `probe_key`.
    pub fn respond(&mut self, probe_key: impl Into<String>, nbest: Vec<Hypothesis>) -> &mut Self {
        self.responses
            .entry(probe_key.into())
            .or_default()
            .push_back(nbest);
        self
    }

    pub fn calls(&self) -> &[DecodeCall] {
        &self.calls
    }
}

impl ConstrainedDecoder for ScriptedDecoder {
    fn decode(&mut self, audio: &[i16], grammar: &Grammar) -> Result<Vec<Hypothesis>> {
        let probe_key = grammar.probe_key();
        let nbest = self
            .responses
            .get_mut(&probe_key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();
        debug!(probe = %probe_key, hypotheses = nbest.len(), "replayed n-best list");
        self.calls.push(DecodeCall {
            probe_key,
            jsgf: grammar.to_jsgf(),
            window_len: audio.len(),
        });
        Ok(nbest)
    }
}
