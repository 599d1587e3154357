use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use scenegraph::Scene;
use tracing::{debug, error, info, warn};

mod engine;
mod game;

use engine::{
    assets::{AssetError, AssetLoader},
    view::View,
};
use game::{
    audio::LogAudio,
    effect::{CastPhase, EffectBundle, EffectSequencer, REARM_AT},
    gesture::{CastGate, GestureClassifier},
    script::PoseScript,
    tracking::{BodyAnchors, SessionEvent, TrackingConfig},
};

#[derive(clap::Parser)]
struct Opts {
    /// Path to the data directory containing the effect bundle.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Pose script to play. The built-in right-hand cast is used when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Fixed update rate in ticks per second.
    #[arg(long, default_value_t = 64.0)]
    tick_rate: f32,

    /// Run the script as fast as possible instead of pacing it to real time.
    #[arg(long)]
    fast: bool,
}

fn main() {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    if let Err(err) = run(opts) {
        error!("Could not run the energy cast demo! - {err}");
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> Result<(), AssetError> {
    let assets = AssetLoader::new(&opts.data_dir);

    let mut scene = Scene::new();
    let bundle = EffectBundle::load(&assets, &mut scene)?;

    let script = match &opts.script {
        Some(path) => PoseScript::from_text(&std::fs::read_to_string(path)?),
        None => PoseScript::default_cast(),
    };

    let config = TrackingConfig::default();
    info!("Body tracking configured: {:?}", config.semantics);

    let anchors = BodyAnchors::new(&mut scene);
    let gate = Arc::new(CastGate::new());
    let classifier = GestureClassifier;
    let mut sequencer = EffectSequencer::new(bundle, Arc::clone(&gate));
    let mut view = View::new();
    let mut audio = LogAudio;

    let delta_time = 1.0 / opts.tick_rate;
    // Hard stop even if the script's last pose triggers a full sequence.
    let end_time = script.duration() + REARM_AT + 1.0;

    let mut time = 0.0_f32;
    let mut last_phase = sequencer.phase();

    while time < end_time {
        let previous = time;
        time += delta_time;

        view.update(delta_time);
        scene.update(delta_time);
        sequencer.update(delta_time, &mut scene, &mut view);

        for event in script.events_between(previous, time) {
            match event {
                SessionEvent::Failed { reason } => error!("Tracking session failed: {reason}"),
                SessionEvent::Interrupted => warn!("Tracking session interrupted."),
                SessionEvent::InterruptionEnded => info!("Tracking session resumed."),
            }
        }

        let frame = script.sample(time);
        anchors.update(&mut scene, &frame);

        if let Some(mode) =
            classifier.classify(frame.right_position(), frame.left_position(), &gate)
        {
            sequencer.begin(mode, &mut scene, &anchors, &mut audio);
        }

        let phase = sequencer.phase();
        if phase != last_phase {
            debug!(
                "Cast phase: {phase:?} (view opacity {:.2}, backdrop {:.2})",
                view.opacity(),
                view.backdrop_opacity()
            );
            last_phase = phase;
        }

        if time >= script.duration() && phase == CastPhase::Idle && !gate.is_busy() {
            break;
        }

        if !opts.fast {
            std::thread::sleep(Duration::from_secs_f32(delta_time));
        }
    }

    info!("Script finished.");

    Ok(())
}
