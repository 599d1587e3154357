use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use strum::{Display, EnumString};

/// Hands farther than this from the body root on x or z arm the trigger (meters).
pub const TRIGGER_RANGE: f32 = 0.4;

/// Summed per-axis hand separation below this means both hands cast together (meters).
pub const DOUBLE_HAND_DISTANCE: f32 = 0.3;

/// Which hand(s) initiated the cast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum GestureMode {
    #[default]
    #[strum(serialize = "RIGHT_HAND")]
    RightHand,
    #[strum(serialize = "LEFT_HAND")]
    LeftHand,
    #[strum(serialize = "DOUBLE_HAND")]
    DoubleHand,
}

/// Admission control for the effect sequence. Acquired by the classifier on trigger and
/// released by the sequencer when the cooldown expires; while held, new triggers are
/// ignored rather than queued.
#[derive(Debug, Default)]
pub struct CastGate(AtomicBool);

impl CastGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-set. Returns true if the gate was clear and is now held.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Per-frame trigger/mode decision over the latest hand positions. Stateless apart from
/// the shared gate; re-evaluated on every pose update while the gate is clear.
pub struct GestureClassifier;

impl GestureClassifier {
    /// Returns the triggering mode and acquires `gate`, or `None` when the pose stays
    /// inside the trigger box or a sequence is already running.
    pub fn classify(&self, right: Vec3, left: Vec3, gate: &CastGate) -> Option<GestureMode> {
        let outside = |v: f32| v < -TRIGGER_RANGE || v > TRIGGER_RANGE;

        if !(outside(right.x) || outside(left.x) || outside(right.z) || outside(left.z)) {
            return None;
        }

        if !gate.try_acquire() {
            return None;
        }

        let total_distance =
            (right.x - left.x).abs() + (right.y - left.y).abs() + (right.z - left.z).abs();

        let mode = if total_distance < DOUBLE_HAND_DISTANCE {
            GestureMode::DoubleHand
        } else {
            let right_max = right.x.abs().max(right.z.abs());
            let left_max = left.x.abs().max(left.z.abs());

            if left_max > right_max {
                GestureMode::LeftHand
            } else {
                // Ties fall through to the right hand.
                GestureMode::RightHand
            }
        };

        Some(mode)
    }
}
