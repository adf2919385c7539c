use std::path::PathBuf;

use anyhow::Result;
use approx::assert_relative_eq;
use intelligibility::scoring::assembler::FeatureAssembler;
use intelligibility::scoring::grammar::Grammar;
use intelligibility::scoring::lexicon::Lexicon;
use intelligibility::scoring::replay::{RecordedSession, ScriptedAligner, ScriptedDecoder};
use intelligibility::scoring::{
    self, ConstrainedDecoder, Hypothesis, PhoneSegment, PhoneSymbol, PhoneTimeline,
};
use intelligibility::{
    score_utterance, FeatureVector, ScoringConfig, ScoringError, Utterance, WindowPolicy,
};

const SAMPLES: usize = 12_000;

#[test]
fn recorded_cat_session_produces_expected_vector() -> Result<()> {
    let (mut aligner, mut decoder) = load_session("cat")?.into_engines(None);
    let utterance = Utterance::new(ramp(SAMPLES), "cat");
    let report = score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )?;

    let features = report.features.as_slice();
    assert_eq!(features.len(), 13);
    let expected = [
        8.0 / 65.0,
        1.0 / 302f32.ln(),
        40.0 / 42.0,
        1.0,
        6.0 / 65.0,
        1.0 / 252f32.ln(),
        41.0 / 42.0,
        159.0 / 160.0,
        9.0 / 65.0,
        1.0 / 352f32.ln(),
        1.0,
        79.0 / 160.0,
        0.0,
    ];
    for (actual, expected) in features.iter().zip(expected.iter()) {
        assert_relative_eq!(*actual, *expected, epsilon = 1e-5);
    }
    assert_relative_eq!(features[0], 0.123, epsilon = 1e-3);

    assert_eq!(report.max_duration_frames, 12);
    assert!(report.unresolved_words.is_empty());
    assert_eq!(report.probes.len(), 4);
    let first = &report.probes[0];
    assert_eq!(first.phone, PhoneSymbol::K);
    let substitution = first.substitution.expect("interior phone is probed");
    assert_eq!(substitution.examined, 2);
    assert!(substitution.found);
    Ok(())
}

#[test]
fn probes_run_in_position_order_with_padded_windows() -> Result<()> {
    let (mut aligner, mut decoder) = load_session("cat")?.into_engines(None);
    let utterance = Utterance::new(ramp(SAMPLES), "cat");
    score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )?;

    let keys: Vec<&str> = decoder
        .calls()
        .iter()
        .map(|call| call.probe_key.as_str())
        .collect();
    assert_eq!(
        keys,
        vec![
            "sub:sil-k-ae",
            "insdel:sil-k",
            "sub:k-ae-t",
            "insdel:k-ae",
            "sub:ae-t-sil",
            "insdel:ae-t",
            "insdel:t-sil",
        ]
    );
    assert_eq!(decoder.calls()[0].window_len, 24 * 246 + 16_000);
    assert_eq!(decoder.calls()[1].window_len, 18 * 246 + 16_000);
    assert!(decoder.calls()[0].jsgf.contains("grammar subalts;"));
    assert!(decoder.calls()[1].jsgf.contains("grammar insdels;"));
    Ok(())
}

#[test]
fn final_phone_contributes_only_insertion_deletion() -> Result<()> {
    let timeline = timeline_of(&[
        PhoneSymbol::Sil,
        PhoneSymbol::K,
        PhoneSymbol::Ae,
        PhoneSymbol::T,
        PhoneSymbol::Sil,
    ]);
    let mut decoder = ScriptedDecoder::new();
    decoder.respond(
        "insdel:t-sil",
        vec![Hypothesis::new("sil1 t2 sil5", -10)],
    );
    let (features, probes) = FeatureAssembler::new(&ScoringConfig::default()).assemble(
        &timeline,
        &ramp(SAMPLES),
        &mut decoder,
    )?;

    let last = probes.last().expect("final position is probed");
    assert_eq!(last.index, 4);
    assert!(last.right.is_none());
    assert!(last.duration_s.is_none());
    assert!(last.confidence.is_none());
    assert!(last.substitution.is_none());
    assert_eq!(*features.as_slice().last().unwrap(), 1.0);
    assert_eq!(
        decoder
            .calls()
            .iter()
            .filter(|call| call.probe_key.starts_with("sub:"))
            .count(),
        3
    );
    Ok(())
}

#[test]
fn vector_length_is_fixed_by_phone_count() -> Result<()> {
    let assembler = FeatureAssembler::new(&ScoringConfig::default());
    for count in 2..=9 {
        let phones: Vec<PhoneSymbol> = (0..count)
            .map(|idx| {
                if idx % 2 == 0 {
                    PhoneSymbol::Sil
                } else {
                    PhoneSymbol::Ah
                }
            })
            .collect();
        let mut decoder = ScriptedDecoder::new();
        let (features, probes) =
            assembler.assemble(&timeline_of(&phones), &ramp(SAMPLES), &mut decoder)?;
        assert_eq!(features.len(), 4 * (count - 2) + 1);
        assert_eq!(features.len(), FeatureVector::expected_len(count));
        assert_eq!(probes.len(), count - 1);
        assert_eq!(decoder.calls().len(), (count - 2) + (count - 1));
    }
    Ok(())
}

#[test]
fn empty_insertion_deletion_lists_score_zero() -> Result<()> {
    let timeline = timeline_of(&[PhoneSymbol::Sil, PhoneSymbol::Ah]);
    let mut decoder = ScriptedDecoder::new();
    let (features, _) = FeatureAssembler::new(&ScoringConfig::default()).assemble(
        &timeline,
        &ramp(SAMPLES),
        &mut decoder,
    )?;
    assert_eq!(features.as_slice(), &[0.0]);
    Ok(())
}

#[test]
fn insertion_deletion_scores_stay_in_unit_range() -> Result<()> {
    let timeline = timeline_of(&[PhoneSymbol::Sil, PhoneSymbol::S, PhoneSymbol::Sil]);
    let noisy: Vec<Hypothesis> = (0..200)
        .map(|idx| Hypothesis::new(format!("sil1 b3 x{idx} s4 sil5"), -idx))
        .collect();
    let mut decoder = ScriptedDecoder::new();
    decoder
        .respond("insdel:sil-s", noisy.clone())
        .respond("insdel:s-sil", noisy);
    let (_, probes) = FeatureAssembler::new(&ScoringConfig::default()).assemble(
        &timeline,
        &ramp(SAMPLES),
        &mut decoder,
    )?;
    for probe in probes {
        let score = probe.insertion_deletion.score();
        assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        assert_eq!(probe.insertion_deletion.penalty, 160);
    }
    Ok(())
}

#[test]
fn substitution_score_may_go_negative() -> Result<()> {
    let timeline = timeline_of(&[PhoneSymbol::Sil, PhoneSymbol::K, PhoneSymbol::Sil]);
    let misses: Vec<Hypothesis> = (0..45)
        .map(|idx| Hypothesis::new(format!("sil1 z{idx} sil5"), -idx))
        .collect();
    let mut decoder = ScriptedDecoder::new();
    decoder.respond("sub:sil-k-sil", misses);
    let (features, _) = FeatureAssembler::new(&ScoringConfig::default()).assemble(
        &timeline,
        &ramp(SAMPLES),
        &mut decoder,
    )?;
    assert_relative_eq!(features.as_slice()[2], -3.0 / 42.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn bare_hypotheses_without_context_tokens_match_target() -> Result<()> {
    let timeline = timeline_of(&[
        PhoneSymbol::Sil,
        PhoneSymbol::K,
        PhoneSymbol::Ae,
        PhoneSymbol::T,
        PhoneSymbol::Sil,
    ]);
    let mut decoder = ScriptedDecoder::new();
    decoder.respond(
        "sub:sil-k-ae",
        vec![
            Hypothesis::new("b3 sil5", -1),
            Hypothesis::new("k3 sil5", -2),
        ],
    );
    let (features, probes) = FeatureAssembler::new(&ScoringConfig::default()).assemble(
        &timeline,
        &ramp(SAMPLES),
        &mut decoder,
    )?;
    assert_relative_eq!(features.as_slice()[2], 40.0 / 42.0, epsilon = 1e-6);
    assert_eq!(probes[0].substitution.map(|s| s.examined), Some(2));
    Ok(())
}

#[test]
fn decoder_failure_aborts_without_partial_vector() {
    struct FailingDecoder {
        remaining: usize,
    }

    impl ConstrainedDecoder for FailingDecoder {
        fn decode(
            &mut self,
            _audio: &[i16],
            grammar: &Grammar,
        ) -> scoring::Result<Vec<Hypothesis>> {
            if self.remaining == 0 {
                return Err(ScoringError::decoder(grammar.probe_key(), "engine crashed"));
            }
            self.remaining -= 1;
            Ok(Vec::new())
        }
    }

    let (mut aligner, _) = load_session("cat").unwrap().into_engines(None);
    let mut decoder = FailingDecoder { remaining: 3 };
    let utterance = Utterance::new(ramp(SAMPLES), "cat");
    let error = score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )
    .unwrap_err();
    assert!(
        matches!(&error, ScoringError::Decoder { probe, .. } if probe == "insdel:k-ae"),
        "unexpected error: {error}"
    );
}

#[test]
fn positive_phone_score_fails_before_decoding() {
    let mut segments: Vec<PhoneSegment> = [PhoneSymbol::Sil, PhoneSymbol::K, PhoneSymbol::Sil]
        .iter()
        .enumerate()
        .map(|(idx, phone)| PhoneSegment::new(idx as u32 * 5, 5, *phone, -100))
        .collect();
    segments[1].score = 1;
    let mut decoder = ScriptedDecoder::new();
    let error = FeatureAssembler::new(&ScoringConfig::default())
        .assemble(
            &PhoneTimeline::from_segments(segments),
            &ramp(SAMPLES),
            &mut decoder,
        )
        .unwrap_err();
    assert!(matches!(error, ScoringError::AlignmentFailure { .. }));
    assert!(decoder.calls().is_empty());
}

#[test]
fn reject_policy_fails_on_short_audio() {
    let (mut aligner, mut decoder) = load_session("cat").unwrap().into_engines(None);
    let utterance = Utterance::new(ramp(5_000), "cat");
    let config = ScoringConfig {
        window_policy: WindowPolicy::Reject,
        ..ScoringConfig::default()
    };
    let error = score_utterance(&utterance, &mut aligner, &mut decoder, &config).unwrap_err();
    assert!(matches!(error, ScoringError::BoundsViolation { .. }));
}

#[test]
fn truncate_policy_scores_short_audio() -> Result<()> {
    let (mut aligner, mut decoder) = load_session("cat")?.into_engines(None);
    let utterance = Utterance::new(ramp(5_000), "cat");
    let report = score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )?;
    assert_eq!(report.features.len(), 13);
    Ok(())
}

#[test]
fn unresolved_words_are_reported_not_fatal() -> Result<()> {
    let session = load_session("cat")?;
    let lexicon = Lexicon::from_lexicon("CAT K AE T")?;
    let (mut aligner, mut decoder) = session.into_engines(Some(lexicon));
    let utterance = Utterance::new(ramp(SAMPLES), "the cat");
    let report = score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )?;
    assert_eq!(report.unresolved_words, vec!["the".to_string()]);
    assert_eq!(report.features.len(), 13);
    let words: Vec<&str> = aligner.requests()[0]
        .iter()
        .map(|word| word.text.as_str())
        .collect();
    assert_eq!(words, vec!["<s>", "the", "cat", "</s>"]);
    Ok(())
}

#[test]
fn empty_audio_is_an_alignment_failure() {
    let (mut aligner, mut decoder) = load_session("cat").unwrap().into_engines(None);
    let utterance = Utterance::new(Vec::new(), "cat");
    let error = score_utterance(
        &utterance,
        &mut aligner,
        &mut decoder,
        &ScoringConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(error, ScoringError::AlignmentFailure { .. }));
    assert!(decoder.calls().is_empty());
}

#[test]
fn invalid_config_is_rejected_before_alignment() {
    let mut aligner = ScriptedAligner::from_alignment(Default::default());
    let mut decoder = ScriptedDecoder::new();
    let config = ScoringConfig {
        insertion_deletion_ceiling: 0,
        ..ScoringConfig::default()
    };
    let error = score_utterance(
        &Utterance::new(ramp(10), "cat"),
        &mut aligner,
        &mut decoder,
        &config,
    )
    .unwrap_err();
    assert!(matches!(error, ScoringError::InvalidConfig { .. }));
    assert!(aligner.requests().is_empty());
}

fn timeline_of(phones: &[PhoneSymbol]) -> PhoneTimeline {
    let segments = phones
        .iter()
        .enumerate()
        .map(|(idx, phone)| PhoneSegment::new(idx as u32 * 5, 5, *phone, -100))
        .collect();
    PhoneTimeline::from_segments(segments)
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i * 7) % 20_000) as i16 - 10_000).collect()
}

fn load_session(name: &str) -> Result<RecordedSession> {
    RecordedSession::load(&fixture_path(name))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/sessions")
        .join(format!("{name}.json"))
}
