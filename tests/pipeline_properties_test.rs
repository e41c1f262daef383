// Properties of the cleaned event stream that hold for any input

use sheetgen_wasm::cleanup::RangePolicy;
use sheetgen_wasm::models::{NoteEvent, PitchContent, QuarterLength, RawNoteEvent};
use sheetgen_wasm::{Pipeline, PipelineConfig, QualityFlag};

fn q(n: i64, d: i64) -> QuarterLength {
    QuarterLength::new(n, d)
}

/// Small deterministic generator so the property runs are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Noisy inference-like input: jittered onsets, blips and simultaneous notes
fn noisy_events(seed: u64, count: usize) -> Vec<RawNoteEvent> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|_| {
            let onset = rng.below(1600) as f64 / 100.0;
            let duration = (5 + rng.below(195)) as f64 / 100.0;
            let pitch = 55 + rng.below(36) as i16;
            if rng.below(8) == 0 {
                RawNoteEvent::chord(onset, duration, &[pitch, pitch + 4])
            } else {
                RawNoteEvent::single(onset, duration, pitch)
            }
        })
        .collect()
}

fn as_raw(events: &[NoteEvent]) -> Vec<RawNoteEvent> {
    events
        .iter()
        .map(|e| RawNoteEvent::new(e.onset, e.duration, e.pitch.clone()))
        .collect()
}

fn assert_monophonic(events: &[NoteEvent]) {
    for pair in events.windows(2) {
        assert!(pair[0].onset < pair[1].onset, "onsets not strictly increasing: {:?}", pair);
        assert!(pair[0].end() <= pair[1].onset, "overlap: {:?}", pair);
    }
}

#[test]
fn test_example_scenario() {
    let raw = vec![
        RawNoteEvent::single(0.0, 1.0, 60),
        RawNoteEvent::single(0.0, 1.0, 64),
        RawNoteEvent::single(1.0, 0.1, 62),
        RawNoteEvent::single(1.3, 1.0, 67),
    ];
    let cleanup = Pipeline::default().clean(raw).unwrap();

    let got: Vec<_> = cleanup
        .events
        .iter()
        .map(|e| (e.onset, e.duration, e.representative_pitch()))
        .collect();
    assert_eq!(got, vec![(q(0, 1), q(1, 1), 64), (q(5, 4), q(1, 1), 67)]);
    assert_eq!(cleanup.report.transposition, 0);
    assert_eq!(cleanup.report.gaps_closed, 0);
}

#[test]
fn test_durations_are_grid_multiples() {
    let grid = q(1, 4);
    for seed in 1..=20 {
        let cleanup = Pipeline::default().clean(noisy_events(seed, 40)).unwrap();
        for event in &cleanup.events {
            assert!(event.duration > q(0, 1), "seed {}: {:?}", seed, event);
            assert!((event.duration / grid).is_integer(), "seed {}: {:?}", seed, event);
            assert!((event.onset / grid).is_integer(), "seed {}: {:?}", seed, event);
        }
    }
}

#[test]
fn test_output_is_monophonic() {
    for seed in 1..=20 {
        let transcription = Pipeline::default().run(noisy_events(seed, 40)).unwrap();
        assert_monophonic(&transcription.events);
        assert!(transcription
            .events
            .iter()
            .all(|e| matches!(e.pitch, PitchContent::Single(_))));
    }
}

#[test]
fn test_second_pass_is_a_fixed_point() {
    let pipeline = Pipeline::default();
    for seed in 1..=10 {
        let first = pipeline.clean(noisy_events(seed, 30)).unwrap();
        let second = pipeline.clean(as_raw(&first.events)).unwrap();

        let strip = |events: &[NoteEvent]| -> Vec<_> {
            events.iter().map(|e| (e.onset, e.duration, e.pitch.clone())).collect()
        };
        assert_eq!(strip(&first.events), strip(&second.events), "seed {}", seed);
        assert_eq!(second.report.transposition, 0);
        assert_eq!(second.report.artifacts_removed, 0);
        assert_eq!(second.report.polyphony_discarded, 0);
        assert_eq!(second.report.gaps_closed, 0);
    }
}

#[test]
fn test_first_of_equal_simultaneous_events_wins() {
    // Same pitch three times; only the durations tell them apart
    let raw = vec![
        RawNoteEvent::single(0.0, 1.0, 69),
        RawNoteEvent::single(0.0, 2.0, 69),
        RawNoteEvent::single(0.0, 3.0, 69),
        RawNoteEvent::single(4.0, 1.0, 71),
    ];
    let cleanup = Pipeline::default().clean(raw).unwrap();
    assert_eq!(cleanup.events.len(), 2);
    assert_eq!(cleanup.events[0].duration, q(1, 1));
    assert_eq!(cleanup.report.polyphony_discarded, 2);
}

#[test]
fn test_pitches_land_in_range() {
    let config = PipelineConfig::default();
    // Below the violin, narrow enough for a single shift
    let raw: Vec<_> = (0..8)
        .map(|i| RawNoteEvent::single(f64::from(i), 1.0, 36 + (i as i16) * 2))
        .collect();
    let cleanup = Pipeline::default().clean(raw).unwrap();

    // Lowest input pitch lands on the bottom of the range
    assert_eq!(cleanup.report.transposition, 55 - 36);
    assert!(cleanup.report.range_flag.is_none());
    for event in &cleanup.events {
        let pitch = event.representative_pitch();
        assert!(config.range.contains(pitch), "{} outside range", pitch);
    }
}

#[test]
fn test_span_wider_than_range_is_flagged() {
    let raw = vec![
        RawNoteEvent::single(0.0, 1.0, 30),
        RawNoteEvent::single(1.0, 1.0, 60),
        RawNoteEvent::single(2.0, 1.0, 100),
    ];
    let config = PipelineConfig::default();
    let cleanup = Pipeline::default().clean(raw.clone()).unwrap();
    let out_of_range = cleanup
        .events
        .iter()
        .any(|e| !config.range.contains(e.representative_pitch()));
    assert!(out_of_range);
    assert!(cleanup.report.range_flag.is_some());
    assert!(cleanup
        .report
        .flags
        .iter()
        .any(|f| matches!(f, QualityFlag::RangeExceeded { .. })));

    // Folding keeps every pitch inside and still reports the span
    let folding = PipelineConfig { range_policy: RangePolicy::FoldOctaves, ..PipelineConfig::default() };
    let cleanup = Pipeline::new(folding).unwrap().clean(raw).unwrap();
    assert!(cleanup
        .events
        .iter()
        .all(|e| config.range.contains(e.representative_pitch())));
    assert!(cleanup.report.range_flag.is_some());
}

#[test]
fn test_grid_divisors_keep_triplets_and_sixteenths_apart() {
    let config = PipelineConfig { grid_divisors: Some(vec![4, 3]), ..PipelineConfig::default() };
    let pipeline = Pipeline::new(config).unwrap();
    let raw = vec![
        // Jittered triplet eighths on beat one
        RawNoteEvent::single(0.01, 0.31, 67),
        RawNoteEvent::single(0.35, 0.3, 69),
        RawNoteEvent::single(0.66, 0.33, 71),
        // Straight sixteenths on beat two
        RawNoteEvent::single(1.0, 0.25, 72),
        RawNoteEvent::single(1.26, 0.25, 71),
        RawNoteEvent::single(1.49, 0.26, 69),
        RawNoteEvent::single(1.75, 0.25, 67),
        RawNoteEvent::single(2.0, 2.0, 66),
    ];
    let transcription = pipeline.run(raw).unwrap();

    let onsets: Vec<_> = transcription.events.iter().map(|e| e.onset).collect();
    assert_eq!(
        onsets,
        vec![q(0, 1), q(1, 3), q(2, 3), q(1, 1), q(5, 4), q(3, 2), q(7, 4), q(2, 1)]
    );
    assert!(transcription.events[..3].iter().all(|e| e.duration == q(1, 3)));
    assert!(transcription.events[3..7].iter().all(|e| e.duration == q(1, 4)));

    // The default single grid pulls the same triplets onto sixteenths
    let plain = Pipeline::default().clean(vec![RawNoteEvent::single(0.35, 0.3, 69)]).unwrap();
    assert_eq!(plain.events[0].onset, q(1, 4));
}

#[test]
fn test_grid_divisors_always_assemble() {
    let config = PipelineConfig { grid_divisors: Some(vec![4, 3]), ..PipelineConfig::default() };
    let pipeline = Pipeline::new(config).unwrap();
    let grid = q(1, 12);
    for seed in 1..=20 {
        let transcription = pipeline.run(noisy_events(seed, 40)).unwrap();
        assert_monophonic(&transcription.events);
        for event in &transcription.events {
            assert!((event.onset / grid).is_integer(), "seed {}: {:?}", seed, event);
            assert!((event.duration / grid).is_integer(), "seed {}: {:?}", seed, event);
        }
        let part = &transcription.score.parts[0];
        assert!(part.measures.iter().all(|m| m.validate(part.time.measure_length())), "seed {}", seed);
    }
}
