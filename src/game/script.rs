use std::str::FromStr;

use glam::Vec3;
use tracing::warn;

use crate::game::{
    config::ConfigLines,
    gesture::GestureMode,
    tracking::{BodyFrame, SessionEvent},
};

/// Canonical hand positions for a scripted cast of the given mode.
fn cast_pose(mode: GestureMode) -> BodyFrame {
    match mode {
        GestureMode::RightHand => {
            BodyFrame::from_hand_positions(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO)
        }
        GestureMode::LeftHand => {
            BodyFrame::from_hand_positions(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5))
        }
        GestureMode::DoubleHand => BodyFrame::from_hand_positions(
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.52, 0.0, 0.01),
        ),
    }
}

/// Hands resting near the body, inside the trigger box.
fn rest_pose() -> BodyFrame {
    BodyFrame::from_hand_positions(Vec3::new(0.1, -0.3, 0.1), Vec3::new(-0.1, -0.3, 0.1))
}

/// A timed stream of pose samples and session events for the demo shell.
///
/// Script files use the config-line format:
///
/// ```text
/// ; seconds, then right hand xyz, then left hand xyz
/// POSE 0.0  0.1 -0.3 0.1  -0.1 -0.3 0.1
/// CAST RIGHT_HAND 1.0
/// SESSION_INTERRUPTED 12.0
/// ```
pub struct PoseScript {
    poses: Vec<(f32, BodyFrame)>,
    events: Vec<(f32, SessionEvent)>,
}

impl PoseScript {
    /// Built-in script: rest, then a right-hand thrust at one second.
    pub fn default_cast() -> Self {
        Self {
            poses: vec![
                (0.0, rest_pose()),
                (1.0, cast_pose(GestureMode::RightHand)),
                (1.5, rest_pose()),
            ],
            events: Vec::new(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut poses = Vec::new();
        let mut events = Vec::new();

        for line in ConfigLines::parse(text).iter() {
            match line.key.as_str() {
                "POSE" => {
                    let Some(time) = line.maybe_number(0) else {
                        warn!("POSE line is missing its time.");
                        continue;
                    };
                    let right = Vec3::new(line.number(1), line.number(2), line.number(3));
                    let left = Vec3::new(line.number(4), line.number(5), line.number(6));
                    poses.push((time, BodyFrame::from_hand_positions(right, left)));
                }

                "CAST" => {
                    let label = line.text(0);
                    let Ok(mode) = GestureMode::from_str(&label) else {
                        warn!("Invalid CAST mode label: {label}");
                        continue;
                    };
                    let Some(time) = line.maybe_number(1) else {
                        warn!("CAST line is missing its time.");
                        continue;
                    };
                    poses.push((time, cast_pose(mode)));
                }

                "SESSION_INTERRUPTED" => {
                    events.push((line.number(0), SessionEvent::Interrupted));
                }

                "SESSION_RESUMED" => {
                    events.push((line.number(0), SessionEvent::InterruptionEnded));
                }

                "SESSION_FAILED" => {
                    events.push((
                        line.number(0),
                        SessionEvent::Failed {
                            reason: line.text(1),
                        },
                    ));
                }

                key => {
                    warn!("Invalid key for pose script: {key}");
                }
            }
        }

        poses.sort_by(|a, b| a.0.total_cmp(&b.0));
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self { poses, events }
    }

    /// Latest pose at or before `time`; the rest pose before the first key.
    pub fn sample(&self, time: f32) -> BodyFrame {
        self.poses
            .iter()
            .rev()
            .find(|(key_time, _)| *key_time <= time)
            .map(|(_, frame)| *frame)
            .unwrap_or_else(rest_pose)
    }

    /// Session events that fire in the window `(since, until]`.
    pub fn events_between(&self, since: f32, until: f32) -> impl Iterator<Item = &SessionEvent> {
        self.events
            .iter()
            .filter(move |(time, _)| *time > since && *time <= until)
            .map(|(_, event)| event)
    }

    /// Time of the last scripted pose or event.
    pub fn duration(&self) -> f32 {
        let last_pose = self.poses.last().map(|(time, _)| *time).unwrap_or(0.0);
        let last_event = self.events.last().map(|(time, _)| *time).unwrap_or(0.0);
        last_pose.max(last_event)
    }
}
