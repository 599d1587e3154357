use std::sync::Arc;

use glam::Vec3;
use scenegraph::{Color, Easing, Entity, EntityId, PointLight, Scene, Transform, UnlitMaterial};
use tracing::{debug, info, warn};

use crate::{
    engine::view::View,
    game::{
        audio::AudioPlayer,
        effect::EffectBundle,
        gesture::{CastGate, GestureMode},
        tracking::BodyAnchors,
    },
};

/// Duration of the beam/projectile animations.
pub const CAST_SECONDS: f32 = 3.0;
pub const FADE_OUT_SECONDS: f32 = 1.0;
pub const FADE_IN_DELAY_SECONDS: f32 = 1.0;
pub const FADE_IN_SECONDS: f32 = 2.0;
pub const COOLDOWN_SECONDS: f32 = 2.0;

/// Stage boundaries, measured from the trigger.
pub const FADE_OUT_AT: f32 = CAST_SECONDS;
pub const TEARDOWN_AT: f32 = FADE_OUT_AT + FADE_OUT_SECONDS;
pub const FADE_IN_AT: f32 = TEARDOWN_AT + FADE_IN_DELAY_SECONDS;
pub const COOLDOWN_AT: f32 = FADE_IN_AT + FADE_IN_SECONDS;
pub const REARM_AT: f32 = COOLDOWN_AT + COOLDOWN_SECONDS;

const BACKDROP_FADE_OUT_SECONDS: f32 = 1.0;
const BACKDROP_FADE_IN_SECONDS: f32 = 2.0;

const LIGHT_INTENSITY: f32 = 300_000.0;
const LIGHT_ATTENUATION_RADIUS: f32 = 10.0;
const LIGHT_OFFSET_Z: f32 = 0.3;

/// Spawn offset from the hand anchor, along the mirrored axis.
const HAND_OFFSET: f32 = -0.2;
const BEAM_SCALE_Y: f32 = 300.0;
const BEAM_TRAVEL: f32 = -1.5;
const PROJECTILE_TRAVEL: f32 = -3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CastPhase {
    #[default]
    Idle,
    Casting,
    FadingOut,
    TornDown,
    FadingIn,
    Cooldown,
}

/// Entities owned by the running sequence.
#[derive(Clone, Copy)]
struct ActiveCast {
    origin_sphere: EntityId,
    destination_sphere: EntityId,
    cylinder: EntityId,
    light: EntityId,
}

/// Runs the scripted energy-blast timeline: spawn and animate on trigger, fade the view
/// out, tear the spawned entities down, fade back in and finally release the gate. One
/// run at a time; the timeline cannot be interrupted once started.
pub struct EffectSequencer {
    bundle: EffectBundle,
    gate: Arc<CastGate>,
    phase: CastPhase,
    elapsed: f32,
    active: Option<ActiveCast>,
}

impl EffectSequencer {
    pub fn new(bundle: EffectBundle, gate: Arc<CastGate>) -> Self {
        Self {
            bundle,
            gate,
            phase: CastPhase::Idle,
            elapsed: 0.0,
            active: None,
        }
    }

    pub fn phase(&self) -> CastPhase {
        self.phase
    }

    /// Build and launch the effect for a classified gesture. The caller must hold the
    /// gate (the classifier acquires it when it reports a mode).
    pub fn begin(
        &mut self,
        mode: GestureMode,
        scene: &mut Scene,
        anchors: &BodyAnchors,
        audio: &mut dyn AudioPlayer,
    ) {
        if self.active.is_some() {
            warn!("Cast requested while a sequence is running.");
            return;
        }

        let (Some(sphere_template), Some(beam_template)) =
            (self.bundle.origin_sphere(), self.bundle.cylinder_mesh(scene))
        else {
            warn!("Effect templates are missing, abandoning the cast.");
            self.gate.release();
            return;
        };

        let origin_sphere = scene.clone_recursive(sphere_template);
        let destination_sphere = scene.clone_recursive(sphere_template);
        let cylinder = scene.clone_recursive(beam_template);

        let (Some(origin_sphere), Some(destination_sphere), Some(cylinder)) =
            (origin_sphere, destination_sphere, cylinder)
        else {
            warn!("Effect templates are missing, abandoning the cast.");
            self.gate.release();
            return;
        };

        let (color, direction) = match mode {
            GestureMode::DoubleHand => (Color::PURPLE, 1.0),
            GestureMode::LeftHand => (Color::RED, -1.0),
            GestureMode::RightHand => (Color::CYAN, 1.0),
        };

        if mode == GestureMode::DoubleHand {
            for sphere in [origin_sphere, destination_sphere] {
                if let Some(entity) = scene.get_mut(sphere) {
                    entity.transform.scale = Vec3::new(1.2, 1.0, 1.0);
                }
            }
        }

        let anchor = match mode {
            GestureMode::LeftHand => anchors.left_hand,
            _ => anchors.right_hand,
        };

        let light = scene.spawn(Entity::new("handLight").with_light(PointLight {
            color,
            intensity: LIGHT_INTENSITY,
            attenuation_radius: LIGHT_ATTENUATION_RADIUS,
        }));

        scene.add_child(anchor, origin_sphere);
        scene.add_child(anchor, destination_sphere);
        scene.add_child(anchor, cylinder);
        scene.add_child(anchor, light);

        let material = UnlitMaterial::new(color);
        for sphere in [origin_sphere, destination_sphere] {
            if let Some(entity) = scene.get_mut(sphere) {
                entity.material = Some(material);
            }
        }

        let spawn_position = Vec3::new(HAND_OFFSET * direction, 0.0, 0.0);
        for id in [origin_sphere, destination_sphere, cylinder] {
            if let Some(entity) = scene.get_mut(id) {
                entity.transform.translation = spawn_position;
            }
        }

        // All three lights aim at the beam axis from offsets expressed in the hand
        // light's frame.
        scene.look_at(
            light,
            Vec3::ZERO,
            Vec3::new(1.0 * direction, 0.0, LIGHT_OFFSET_Z),
            light,
        );

        for (name, parent, offset_x) in [
            ("originLight", origin_sphere, -1.0 * direction),
            ("destinationLight", destination_sphere, 1.0 * direction),
        ] {
            let glow = scene.spawn(Entity::new(name).with_light(PointLight {
                color,
                intensity: LIGHT_INTENSITY,
                attenuation_radius: LIGHT_ATTENUATION_RADIUS,
            }));
            scene.add_child(parent, glow);
            scene.look_at(glow, Vec3::ZERO, Vec3::new(offset_x, 0.0, LIGHT_OFFSET_Z), light);
        }

        // Beam stretch and projectile travel run together for the full cast window.
        scene.move_to(
            cylinder,
            Transform::from_scale(Vec3::new(1.0, BEAM_SCALE_Y, 1.0))
                .with_translation(Vec3::new(0.0, BEAM_TRAVEL * direction, 0.0)),
            cylinder,
            CAST_SECONDS,
            Easing::EaseInOut,
        );
        scene.move_to(
            destination_sphere,
            Transform::from_translation(Vec3::new(0.0, PROJECTILE_TRAVEL * direction, 0.0)),
            cylinder,
            CAST_SECONDS,
            Easing::EaseInOut,
        );

        if let Some(resource) = self.bundle.sound().map(String::from) {
            if let Err(err) = audio.play_spatial(&resource, origin_sphere) {
                warn!("Audio cue failed, continuing silently: {err}");
            }
        }

        info!("Energy blast cast: {mode}");

        self.phase = CastPhase::Casting;
        self.elapsed = 0.0;
        self.active = Some(ActiveCast {
            origin_sphere,
            destination_sphere,
            cylinder,
            light,
        });
    }

    /// Advance the timeline. Stage boundaries fire in order even when a single tick
    /// crosses more than one of them.
    pub fn update(&mut self, delta_time: f32, scene: &mut Scene, view: &mut View) {
        let Some(active) = self.active else {
            return;
        };

        let before = self.elapsed;
        self.elapsed += delta_time;
        let now = self.elapsed;

        let crossed = |boundary: f32| before < boundary && now >= boundary;

        if crossed(FADE_OUT_AT) {
            self.phase = CastPhase::FadingOut;
            debug!("Fading the view out.");
            view.fade_to(0.0, FADE_OUT_SECONDS, 0.0, Easing::EaseInOut);
        }

        if crossed(TEARDOWN_AT) {
            self.phase = CastPhase::TornDown;
            teardown(scene, &active);
            view.fade_to(1.0, FADE_IN_SECONDS, FADE_IN_DELAY_SECONDS, Easing::EaseOut);
        }

        if crossed(FADE_IN_AT) {
            self.phase = CastPhase::FadingIn;
            view.fade_backdrop_to(0.0, BACKDROP_FADE_OUT_SECONDS, 0.0, Easing::EaseInOut);
        }

        if crossed(COOLDOWN_AT) {
            self.phase = CastPhase::Cooldown;
            view.fade_backdrop_to(
                View::BACKDROP_OPACITY,
                BACKDROP_FADE_IN_SECONDS,
                0.0,
                Easing::EaseOut,
            );
        }

        if crossed(REARM_AT) {
            self.phase = CastPhase::Idle;
            self.active = None;
            self.elapsed = 0.0;
            self.gate.release();
            info!("Sequence complete, classifier re-armed.");
        }
    }
}

/// Disable, detach and release everything the run spawned. Lights parented under the
/// spheres leave with them.
fn teardown(scene: &mut Scene, cast: &ActiveCast) {
    for id in [
        cast.origin_sphere,
        cast.destination_sphere,
        cast.cylinder,
        cast.light,
    ] {
        scene.set_enabled(id, false);
        scene.remove_from_parent(id);
        scene.despawn_recursive(id);
    }

    debug!("Effect entities released.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        audio::AudioError,
        gesture::GestureClassifier,
        tracking::{BodyAnchors, BodyFrame},
    };

    const DT: f32 = 1.0 / 64.0;

    const BUNDLE_TEXT: &str = "\
        BUNDLE energy\n\
        SPHERE originSphere 0.15\n\
        CYLINDER cylinder 0.05 0.4\n\
        SOUND energy_blast\n";

    #[derive(Default)]
    struct RecordingAudio {
        cues: Vec<String>,
        fail: bool,
    }

    impl AudioPlayer for RecordingAudio {
        fn play_spatial(&mut self, resource: &str, _at: EntityId) -> Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::Unavailable(resource.into()));
            }
            self.cues.push(resource.into());
            Ok(())
        }
    }

    struct Rig {
        scene: Scene,
        view: View,
        anchors: BodyAnchors,
        sequencer: EffectSequencer,
        gate: Arc<CastGate>,
        audio: RecordingAudio,
    }

    impl Rig {
        fn new() -> Self {
            let mut scene = Scene::new();
            let bundle = EffectBundle::from_text(&mut scene, BUNDLE_TEXT).unwrap();
            let anchors = BodyAnchors::new(&mut scene);
            let gate = Arc::new(CastGate::new());
            let sequencer = EffectSequencer::new(bundle, Arc::clone(&gate));

            Self {
                scene,
                view: View::new(),
                anchors,
                sequencer,
                gate,
                audio: RecordingAudio::default(),
            }
        }

        fn trigger(&mut self, mode: GestureMode) {
            assert!(self.gate.try_acquire());
            self.sequencer
                .begin(mode, &mut self.scene, &self.anchors, &mut self.audio);
        }

        /// One fixed tick in driver order: fades, then scene animations, then the
        /// sequencer timeline.
        fn step(&mut self) {
            self.view.update(DT);
            self.scene.update(DT);
            self.sequencer.update(DT, &mut self.scene, &mut self.view);
        }

        fn step_seconds(&mut self, seconds: f32) {
            let ticks = (seconds / DT).round() as u32;
            for _ in 0..ticks {
                self.step();
            }
        }

        fn anchor_children(&self, anchor: EntityId) -> usize {
            self.scene.children_of(anchor).len()
        }
    }

    #[inline]
    fn approx_f(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[inline]
    fn approx_v3(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn cast_attaches_entities_to_the_right_hand() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::RightHand);

        // Two spheres, the beam and the hand light.
        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 4);
        assert_eq!(rig.anchor_children(rig.anchors.left_hand), 0);

        let cast = rig.sequencer.active.unwrap();

        let origin = rig.scene.get(cast.origin_sphere).unwrap();
        assert_eq!(origin.material.unwrap().color, Color::CYAN);
        assert!(approx_v3(origin.transform.translation, Vec3::new(-0.2, 0.0, 0.0)));

        let light = rig.scene.get(cast.light).unwrap().light.unwrap();
        assert_eq!(light.intensity, 300_000.0);
        assert_eq!(light.attenuation_radius, 10.0);
        assert_eq!(light.color, Color::CYAN);

        // Each sphere carries its own glow light.
        assert_eq!(rig.scene.children_of(cast.origin_sphere).len(), 1);
        assert_eq!(rig.scene.children_of(cast.destination_sphere).len(), 1);

        assert!(rig.scene.is_animating(cast.cylinder));
        assert!(rig.scene.is_animating(cast.destination_sphere));

        assert_eq!(rig.audio.cues, vec!["energy_blast".to_string()]);
        assert_eq!(rig.sequencer.phase(), CastPhase::Casting);
    }

    #[test]
    fn left_hand_cast_mirrors_direction() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::LeftHand);

        assert_eq!(rig.anchor_children(rig.anchors.left_hand), 4);
        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 0);

        let cast = rig.sequencer.active.unwrap();
        let origin = rig.scene.get(cast.origin_sphere).unwrap();
        assert_eq!(origin.material.unwrap().color, Color::RED);
        assert!(approx_v3(origin.transform.translation, Vec3::new(0.2, 0.0, 0.0)));
    }

    #[test]
    fn double_hand_cast_widens_the_spheres() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::DoubleHand);

        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 4);

        let cast = rig.sequencer.active.unwrap();
        for sphere in [cast.origin_sphere, cast.destination_sphere] {
            let entity = rig.scene.get(sphere).unwrap();
            assert_eq!(entity.material.unwrap().color, Color::PURPLE);
            assert!(approx_v3(entity.transform.scale, Vec3::new(1.2, 1.0, 1.0)));
        }
    }

    #[test]
    fn beam_and_projectile_reach_their_targets_after_three_seconds() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::RightHand);
        let cast = rig.sequencer.active.unwrap();

        // Travel targets are expressed in the beam's frame at launch time; the beam
        // template lies on its side, so its local Y maps onto the world X axis.
        let beam_frame = rig.scene.world_transform(cast.cylinder);
        let start = rig
            .scene
            .world_transform(cast.destination_sphere)
            .transform_point3(Vec3::ZERO);
        let target = beam_frame.transform_point3(Vec3::new(0.0, -3.0, 0.0));

        rig.step_seconds(1.5);

        // Ease-in/ease-out is exactly halfway at half time.
        let halfway = rig
            .scene
            .world_transform(cast.destination_sphere)
            .transform_point3(Vec3::ZERO);
        assert!(approx_v3(halfway, (start + target) * 0.5));

        rig.step_seconds(1.5);

        let finished = rig
            .scene
            .world_transform(cast.destination_sphere)
            .transform_point3(Vec3::ZERO);
        assert!(approx_v3(finished, target));
        assert!(!rig.scene.is_animating(cast.destination_sphere));

        let beam = rig.scene.get(cast.cylinder).unwrap();
        assert!(approx_v3(beam.transform.scale, Vec3::new(1.0, 300.0, 1.0)));
        assert!(approx_v3(
            rig.scene.world_transform(cast.cylinder).transform_point3(Vec3::ZERO),
            beam_frame.transform_point3(Vec3::new(0.0, -1.5, 0.0)),
        ));
        assert!(!rig.scene.is_animating(cast.cylinder));
    }

    #[test]
    fn timeline_matches_the_chained_timer_contract() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::RightHand);
        let cast = rig.sequencer.active.unwrap();

        // t = 3: teardown stage begins with the fade-out; view still fully visible.
        rig.step_seconds(3.0);
        assert_eq!(rig.sequencer.phase(), CastPhase::FadingOut);
        assert!(approx_f(rig.view.opacity(), 1.0));

        // t = 3.5: halfway through the eased fade-out.
        rig.step_seconds(0.5);
        assert!(approx_f(rig.view.opacity(), 0.5));

        // t = 4: view is dark and the spawned entities are gone.
        rig.step_seconds(0.5);
        assert_eq!(rig.sequencer.phase(), CastPhase::TornDown);
        assert!(approx_f(rig.view.opacity(), 0.0));
        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 0);
        assert!(rig.scene.get(cast.origin_sphere).is_none());
        assert!(rig.scene.get(cast.cylinder).is_none());
        assert!(rig.scene.get(cast.light).is_none());

        // t = 4.5: fade-back is still in its delay window.
        rig.step_seconds(0.5);
        assert!(approx_f(rig.view.opacity(), 0.0));

        // t = 5: fade-back begins; backdrop starts dropping.
        rig.step_seconds(0.5);
        assert_eq!(rig.sequencer.phase(), CastPhase::FadingIn);

        // t = 6: backdrop fully faded.
        rig.step_seconds(1.0);
        assert!(approx_f(rig.view.backdrop_opacity(), 0.0));

        // t = 7: view restored, cooldown runs.
        rig.step_seconds(1.0);
        assert_eq!(rig.sequencer.phase(), CastPhase::Cooldown);
        assert!(approx_f(rig.view.opacity(), 1.0));
        assert!(rig.gate.is_busy());

        // t = 9: gate released, backdrop restored.
        rig.step_seconds(2.0);
        assert_eq!(rig.sequencer.phase(), CastPhase::Idle);
        assert!(!rig.gate.is_busy());
        assert!(approx_f(rig.view.backdrop_opacity(), View::BACKDROP_OPACITY));
    }

    #[test]
    fn triggers_are_ignored_until_the_gate_clears() {
        let mut rig = Rig::new();
        let classifier = GestureClassifier;
        let thrust = BodyFrame::from_hand_positions(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO);

        let mode = classifier
            .classify(thrust.right_position(), thrust.left_position(), &rig.gate)
            .unwrap();
        rig.sequencer
            .begin(mode, &mut rig.scene, &rig.anchors, &mut rig.audio);

        // Holding the pose up to (but not through) t = 9 never starts a second run.
        for _ in 0..(9.0 / DT) as u32 - 1 {
            rig.step();
            if let Some(mode) =
                classifier.classify(thrust.right_position(), thrust.left_position(), &rig.gate)
            {
                rig.sequencer
                    .begin(mode, &mut rig.scene, &rig.anchors, &mut rig.audio);
            }
        }

        assert_eq!(rig.audio.cues.len(), 1);

        // The gate clears at t = 9, so the held pose re-triggers on that tick.
        rig.step();
        if let Some(mode) =
            classifier.classify(thrust.right_position(), thrust.left_position(), &rig.gate)
        {
            rig.sequencer
                .begin(mode, &mut rig.scene, &rig.anchors, &mut rig.audio);
        }
        assert_eq!(rig.audio.cues.len(), 2);
        assert_eq!(rig.sequencer.phase(), CastPhase::Casting);
    }

    #[test]
    fn begin_while_running_is_rejected() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::RightHand);

        rig.sequencer
            .begin(GestureMode::LeftHand, &mut rig.scene, &rig.anchors, &mut rig.audio);

        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 4);
        assert_eq!(rig.anchor_children(rig.anchors.left_hand), 0);
    }

    #[test]
    fn audio_failure_does_not_abort_the_sequence() {
        let mut rig = Rig::new();
        rig.audio.fail = true;

        rig.trigger(GestureMode::RightHand);
        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 4);

        rig.step_seconds(9.0);

        assert_eq!(rig.sequencer.phase(), CastPhase::Idle);
        assert!(!rig.gate.is_busy());
        assert_eq!(rig.anchor_children(rig.anchors.right_hand), 0);
    }

    #[test]
    fn a_new_cast_can_start_after_completion() {
        let mut rig = Rig::new();
        rig.trigger(GestureMode::RightHand);
        rig.step_seconds(9.0);
        assert_eq!(rig.sequencer.phase(), CastPhase::Idle);

        rig.trigger(GestureMode::LeftHand);

        assert_eq!(rig.anchor_children(rig.anchors.left_hand), 4);
        assert_eq!(rig.sequencer.phase(), CastPhase::Casting);
    }
}
