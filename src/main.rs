use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use intelligibility::audio::wav::read_pcm16;
use intelligibility::cli::{Cli, Command, GrammarArgs, ScoreArgs};
use intelligibility::scoring::grammar::Grammar;
use intelligibility::scoring::lexicon::Lexicon;
use intelligibility::scoring::replay::RecordedSession;
use intelligibility::{score_utterance, FeatureVector, Utterance};

#[derive(Serialize)]
struct FeaturesOutput<'a> {
    features: &'a FeatureVector,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Score(args) => handle_score(&args),
        Command::Grammar(args) => handle_grammar(&args),
    }
}

fn handle_score(args: &ScoreArgs) -> Result<()> {
    let config = args
        .scoring_config()
        .context("Failed to load scoring configuration")?;
    let samples = read_pcm16(&args.audio, config.samples_per_second)?;
    info!(
        audio = %args.audio.display(),
        samples = samples.len(),
        "loaded utterance audio"
    );

    let session = RecordedSession::load(&args.session)
        .with_context(|| format!("Failed to load session {:?}", args.session))?;
    let lexicon = args
        .lexicon
        .as_deref()
        .map(Lexicon::load)
        .transpose()
        .context("Failed to load lexicon")?;
    let (mut aligner, mut decoder) = session.into_engines(lexicon);

    let utterance = Utterance::new(samples, args.sentence.clone());
    let report = score_utterance(&utterance, &mut aligner, &mut decoder, &config)
        .context("Scoring pass failed")?;
    if !report.unresolved_words.is_empty() {
        info!(words = ?report.unresolved_words, "sentence contained unresolved words");
    }

    let json = if args.report {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string_pretty(&FeaturesOutput {
            features: &report.features,
        })
    }
    .context("Failed to serialize features")?;

    match &args.output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write output {:?}", path))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn handle_grammar(args: &GrammarArgs) -> Result<()> {
    let (left, current, right) = args.phones()?;
    let mut stdout = std::io::stdout().lock();
    if let Some(right) = right {
        write!(stdout, "{}", Grammar::substitution(left, current, right).to_jsgf())?;
    }
    write!(
        stdout,
        "{}",
        Grammar::insertion_deletion(left, current).to_jsgf()
    )?;
    Ok(())
}
