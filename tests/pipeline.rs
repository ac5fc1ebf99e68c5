//! End-to-end lipsync pipeline tests

use std::f32::consts::TAU;
use std::time::Duration;

use fushigi3d_lipsync::analysis::{band_energies, BandEnergy, FrequencyBands, SpectrumFrame};
use fushigi3d_lipsync::config::{BlendshapeNames, LipsyncConfig};
use fushigi3d_lipsync::playback::{ClipBuffer, ClipSource, CueSchedule, Cue, PlaybackController};
use fushigi3d_lipsync::viseme::VisemeEstimator;
use fushigi3d_lipsync::{
    BlendShapeBinding, Lipsync, LipsyncSession, MorphTargets, VisemeWeights,
};

const FRAME: Duration = Duration::from_millis(16);
const RATE: u32 = 48000;

fn tone(freq: f32, secs: f32) -> Vec<f32> {
    let len = (RATE as f32 * secs) as usize;
    (0..len)
        .map(|i| (TAU * freq * i as f32 / RATE as f32).sin() * 0.5)
        .collect()
}

fn mesh() -> MorphTargets {
    MorphTargets::new(vec![
        "Fcl_ALL_Neutral".into(),
        "Fcl_MTH_U".into(),
        "Fcl_MTH_Close".into(),
        "Fcl_MTH_A".into(),
    ])
}

fn names() -> BlendshapeNames {
    BlendshapeNames {
        kiss: "Fcl_MTH_U".into(),
        lips_closed: "Fcl_MTH_Close".into(),
        mouth_open: "Fcl_MTH_A".into(),
    }
}

fn slots(clips: Vec<Vec<f32>>) -> PlaybackController {
    PlaybackController::new(
        clips
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                Some(Box::new(ClipBuffer::new(format!("clip{}", i), s, RATE)) as Box<dyn ClipSource>)
            })
            .collect(),
    )
}

#[test]
fn test_all_ones_scenario() {
    let spectrum = [1.0f32; 8];
    let frame = SpectrumFrame::new(&spectrum, 16000);
    let bands = FrequencyBands::from_pitch(1.0).unwrap();

    let energy = band_energies(&frame, &bands);
    assert_eq!(energy, BandEnergy([0.0, 1.0, 1.0, 1.0]));

    let target = VisemeEstimator::default().estimate(&energy);
    assert!((target.kiss - 100.0 / 3.0).abs() < 1e-3, "{:?}", target);
    assert!((target.lips_closed - 100.0).abs() < 1e-3, "{:?}", target);
    assert!(target.mouth_open.abs() < 1e-3, "{:?}", target);

    let mut session =
        LipsyncSession::new(&LipsyncConfig::default(), BlendShapeBinding::default()).unwrap();
    session.tick(&frame);
    assert_eq!(session.target(), target);
}

#[test]
fn test_silence_scenario() {
    let spectrum = [0.0f32; 8];
    let frame = SpectrumFrame::new(&spectrum, 16000);
    let bands = FrequencyBands::default();

    let energy = band_energies(&frame, &bands);
    assert_eq!(energy, BandEnergy([0.0; 4]));
    assert_eq!(
        VisemeEstimator::default().estimate(&energy),
        VisemeWeights::default()
    );
}

#[test]
fn test_named_binding_writes_mesh() {
    let mut mesh = mesh();
    {
        let mut lipsync = Lipsync::new(
            &LipsyncConfig::default(),
            &names(),
            slots(vec![tone(600.0, 1.0)]),
            &mut mesh,
        )
        .unwrap();
        lipsync.play(0).unwrap();
        for _ in 0..15 {
            lipsync.tick(FRAME);
        }
    }

    assert_eq!(mesh.weight("Fcl_ALL_Neutral"), Some(0.0));
    let open = mesh.weight("Fcl_MTH_A").unwrap();
    assert!(open > 50.0, "mouth open = {}", open);
}

#[test]
fn test_unresolved_names_fall_back_to_defaults() {
    let mut mesh = mesh();
    let mut lipsync = Lipsync::new(
        &LipsyncConfig::default(),
        &BlendshapeNames::default(),
        slots(vec![tone(600.0, 1.0)]),
        &mut mesh,
    )
    .unwrap();
    lipsync.play(0).unwrap();
    for _ in 0..15 {
        lipsync.tick(FRAME);
    }
    let current = lipsync.session().current();
    drop(lipsync);

    // Mouth-open falls back to index 2
    assert_eq!(mesh.weights()[2], current.mouth_open);
    assert_eq!(mesh.weight("Fcl_MTH_A"), Some(0.0));
}

#[test]
fn test_gating_and_freeze() {
    let mut lipsync = Lipsync::new(
        &LipsyncConfig::default(),
        &names(),
        slots(vec![tone(600.0, 2.0), tone(4500.0, 2.0)]),
        mesh(),
    )
    .unwrap();

    // Nothing selected yet
    for _ in 0..3 {
        assert!(lipsync.tick(FRAME).is_none());
    }
    assert_eq!(lipsync.session().current(), VisemeWeights::default());

    lipsync.play(0).unwrap();
    for _ in 0..15 {
        assert!(lipsync.tick(FRAME).is_some());
    }
    let open = lipsync.session().current();
    assert!(open.mouth_open > 50.0, "{:?}", open);

    // Switching slots moves toward the new clip's pose
    lipsync.play(1).unwrap();
    assert_eq!(lipsync.controller().selected(), 1);
    for _ in 0..15 {
        lipsync.tick(FRAME);
    }
    let closed = lipsync.session().current();
    assert!(closed.lips_closed > 90.0, "{:?}", closed);
    assert!(closed.mouth_open < open.mouth_open);

    // A failed play leaves slot 1 running but skips one frame
    assert!(lipsync.play(7).is_err());
    assert!(lipsync.is_playing());
    assert_eq!(lipsync.controller().selected(), 1);
    assert!(lipsync.tick(FRAME).is_none());
    assert_eq!(lipsync.session().current(), closed);
    assert!(lipsync.tick(FRAME).is_some());
    let closed = lipsync.session().current();

    lipsync.stop_audio();
    for _ in 0..10 {
        assert!(lipsync.tick(FRAME).is_none());
    }
    assert_eq!(lipsync.session().current(), closed);
    assert_eq!(lipsync.sink().weight("Fcl_MTH_Close"), Some(closed.lips_closed));
}

#[test]
fn test_cues_drive_playback() {
    let mut lipsync = Lipsync::new(
        &LipsyncConfig::default(),
        &names(),
        slots(vec![tone(600.0, 0.2), tone(4500.0, 0.2)]),
        mesh(),
    )
    .unwrap();
    let mut cues = CueSchedule::new(vec![
        Cue {
            at: Duration::from_millis(500),
            slot: 1,
        },
        Cue {
            at: Duration::from_millis(100),
            slot: 0,
        },
    ]);

    let mut started = Vec::new();
    let mut ticks = 0;
    while !(cues.is_finished() && !lipsync.is_playing()) {
        for slot in cues.advance(FRAME) {
            lipsync.play(slot).unwrap();
            started.push(slot);
        }
        lipsync.tick(FRAME);
        ticks += 1;
        assert!(ticks < 1000, "frame clock never settled");
    }

    assert_eq!(started, vec![0, 1]);
    assert!(lipsync.session().current().lips_closed > 50.0);
}
