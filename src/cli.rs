use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::ScoringConfig;
use crate::scoring::PhoneSymbol;

#[derive(Parser, Debug)]
#[command(
    name = "intelligibility",
    version,
    about = "Phone-level intelligibility features from recorded alignment sessions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score an utterance against a recorded aligner/decoder session.
    Score(ScoreArgs),
    /// Print the two probe grammars for a phone context.
    Grammar(GrammarArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// 16-bit PCM WAV file holding the utterance.
    #[arg(long)]
    pub audio: PathBuf,
    /// Reference sentence, words separated by single spaces.
    #[arg(long)]
    pub sentence: String,
    /// Recorded session JSON (alignment plus n-best lists per probe).
    #[arg(long)]
    pub session: PathBuf,
    /// Optional scoring configuration JSON.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Optional CMU-style lexicon used to resolve sentence words.
    #[arg(long)]
    pub lexicon: Option<PathBuf>,
    /// Write the result here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Include per-phone diagnostics alongside the feature vector.
    #[arg(long)]
    pub report: bool,
}

impl ScoreArgs {
    pub fn scoring_config(&self) -> Result<ScoringConfig> {
        match &self.config {
            Some(path) => ScoringConfig::load(path),
            None => Ok(ScoringConfig::default()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GrammarArgs {
    /// Left context phone label.
    #[arg(long)]
    pub left: String,
    /// Phone under test.
    #[arg(long)]
    pub current: String,
    /// Right context phone; without it only the insertion/deletion grammar is printed.
    #[arg(long)]
    pub right: Option<String>,
}

impl GrammarArgs {
    pub fn phones(&self) -> Result<(PhoneSymbol, PhoneSymbol, Option<PhoneSymbol>)> {
        let left = parse_phone(&self.left)?;
        let current = parse_phone(&self.current)?;
        let right = self.right.as_deref().map(parse_phone).transpose()?;
        Ok((left, current, right))
    }
}

fn parse_phone(raw: &str) -> Result<PhoneSymbol> {
    raw.parse::<PhoneSymbol>()
        .with_context(|| format!("invalid phone label '{raw}'"))
}
