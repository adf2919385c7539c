use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::engine::WordId;
use super::phones::PhoneSymbol;

/// Sentence-start boundary word every alignment begins with.
pub const SENTENCE_START: &str = "<s>";
/// Sentence-end boundary word every alignment ends with.
pub const SENTENCE_END: &str = "</s>";

/// Word ids read from CMU-style lexicon text.
///
/// Ids are assigned in first-seen order after the two boundary words, which
/// always resolve to ids 0 and 1. Pronunciation variants share their base
/// word's id.
#[derive(Debug, Clone)]
pub struct Lexicon {
    ids: HashMap<String, WordId>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let mut ids = HashMap::new();
        ids.insert(SENTENCE_START.to_string(), WordId(0));
        ids.insert(SENTENCE_END.to_string(), WordId(1));
        Self { ids }
    }
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon {:?}", path))?;
        Self::from_lexicon(&data).with_context(|| format!("Failed to parse lexicon {:?}", path))
    }

    /// Parses `WORD[(n)] PH1 PH2 ...` lines; `;`-prefixed lines are comments.
    /// Phones are checked against the inventory with stress digits (`OW2`)
    /// dropped.
    pub fn from_lexicon(data: &str) -> Result<Self> {
        let mut lexicon = Self::default();
        for (idx, line) in data.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            let mut parts = trimmed.split_whitespace();
            let Some(raw_word) = parts.next() else {
                bail!("lexicon line {idx} missing word column");
            };
            let mut phones = 0;
            for raw in parts {
                raw.trim_end_matches(|c: char| c.is_ascii_digit())
                    .parse::<PhoneSymbol>()
                    .with_context(|| format!("lexicon line {idx} ({raw_word})"))?;
                phones += 1;
            }
            if phones == 0 {
                bail!("lexicon line {idx} missing phone sequence for {raw_word}");
            }
            lexicon.insert(fold_key(trim_variant(raw_word)));
        }
        Ok(lexicon)
    }

    fn insert(&mut self, key: String) {
        let next = WordId(self.ids.len() as i32);
        self.ids.entry(key).or_insert(next);
    }

    /// Number of distinct words, boundary words included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.ids.get(&fold_key(word)).copied()
    }
}

// Case only; the reference text is otherwise taken verbatim.
fn fold_key(word: &str) -> String {
    word.to_ascii_lowercase()
}

fn trim_variant(raw_word: &str) -> &str {
    raw_word
        .split_once('(')
        .map(|(base, _)| base)
        .unwrap_or(raw_word)
}
