use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::engine::Hypothesis;
use super::grammar::{token, SlotMark};
use super::phones::PhoneSymbol;

/// Texts already examined within one probe.
#[derive(Debug, Default)]
pub struct HypothesisSet {
    seen: HashSet<String>,
}

impl HypothesisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `text`; false when it was already present.
    pub fn admit(&mut self, text: &str) -> bool {
        if self.seen.contains(text) {
            return false;
        }
        self.seen.insert(text.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Lower-cased tokens of a hypothesis that reached the closing silence.
struct WholeMatch {
    tokens: Vec<String>,
}

impl WholeMatch {
    fn parse(text: &str) -> Option<Self> {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|token| token.to_ascii_lowercase())
            .collect();
        let closing = token(PhoneSymbol::Sil, SlotMark::End);
        match tokens.last() {
            Some(last) if *last == closing => Some(Self { tokens }),
            _ => None,
        }
    }

    fn contains(&self, target: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(target))
    }

    fn has_mark(&self, mark: SlotMark) -> bool {
        self.tokens
            .iter()
            .any(|token| SlotMark::of_token(token) == Some(mark))
    }
}

/// Walks an n-best list in rank order, yielding each distinct whole match once.
fn distinct_whole_matches<'a, I>(hypotheses: I) -> impl Iterator<Item = (&'a str, WholeMatch)>
where
    I: IntoIterator<Item = &'a Hypothesis>,
{
    let mut seen = HypothesisSet::new();
    hypotheses.into_iter().filter_map(move |hypothesis| {
        let text = hypothesis.text.as_deref()?;
        let whole = WholeMatch::parse(text)?;
        if !seen.admit(text) {
            return None;
        }
        debug!(text, score = hypothesis.score, "probe hypothesis");
        Some((text, whole))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubstitutionOutcome {
    pub examined: u32,
    pub found: bool,
    pub ceiling: u32,
}

impl SubstitutionOutcome {
    /// `(ceiling - examined) / ceiling`; negative once more than `ceiling`
    /// distinct hypotheses were examined.
    pub fn score(&self) -> f32 {
        ((self.ceiling as f64 - self.examined as f64) / self.ceiling as f64) as f32
    }
}

/// Counts distinct whole matches up to and including the first one that
/// contains `target` (e.g. `k3`).
pub fn classify_substitution<'a, I>(
    hypotheses: I,
    target: &str,
    ceiling: u32,
) -> SubstitutionOutcome
where
    I: IntoIterator<Item = &'a Hypothesis>,
{
    let mut outcome = SubstitutionOutcome {
        examined: 0,
        found: false,
        ceiling,
    };
    for (_, whole) in distinct_whole_matches(hypotheses) {
        outcome.examined += 1;
        if whole.contains(target) {
            outcome.found = true;
            break;
        }
    }
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertionDeletionOutcome {
    pub examined: u32,
    pub found: bool,
    pub penalty: u32,
    pub ceiling: u32,
}

impl InsertionDeletionOutcome {
    /// `(ceiling - penalty) / ceiling`, within `[0, 1]`.
    pub fn score(&self) -> f32 {
        let penalty = self.penalty.min(self.ceiling);
        ((self.ceiling - penalty) as f64 / self.ceiling as f64) as f32
    }
}

/// Penalises hypotheses that drop the left context or insert a phone, stopping
/// at the first one that keeps the context and inserts nothing.
pub fn classify_insertion_deletion<'a, I>(hypotheses: I, ceiling: u32) -> InsertionDeletionOutcome
where
    I: IntoIterator<Item = &'a Hypothesis>,
{
    let mut outcome = InsertionDeletionOutcome {
        examined: 0,
        found: false,
        penalty: 0,
        ceiling,
    };
    for (text, whole) in distinct_whole_matches(hypotheses) {
        outcome.examined += 1;
        let kept_left = whole.has_mark(SlotMark::Left);
        let inserted = whole.has_mark(SlotMark::Alt);
        if kept_left && !inserted {
            outcome.found = true;
            break;
        }
        if !kept_left {
            debug!(text, "left context deleted");
            outcome.penalty += 1;
        }
        if inserted {
            debug!(text, "phone inserted");
            outcome.penalty += 1;
        }
    }

    if outcome.examined == 0 {
        outcome.penalty = ceiling;
    } else if !outcome.found {
        outcome.penalty = (outcome.penalty + ceiling / 2).min(ceiling);
    }
    outcome
}
