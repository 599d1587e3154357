use glam::Vec3;
use scenegraph::{Entity, EntityId, Scene, Transform};

bitflags::bitflags! {
    /// Per-frame semantics requested from the tracking session.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FrameSemantics: u32 {
        const PERSON_SEGMENTATION = 1 << 0;
        const BODY_DETECTION = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TrackingConfig {
    pub semantics: FrameSemantics,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            semantics: FrameSemantics::PERSON_SEGMENTATION | FrameSemantics::BODY_DETECTION,
        }
    }
}

/// One tracked pose sample. Hand transforms are local to the body root.
#[derive(Clone, Copy, Debug)]
pub struct BodyFrame {
    pub root: Transform,
    pub right_hand: Transform,
    pub left_hand: Transform,
}

impl BodyFrame {
    pub fn from_hand_positions(right: Vec3, left: Vec3) -> Self {
        Self {
            root: Transform::IDENTITY,
            right_hand: Transform::from_translation(right),
            left_hand: Transform::from_translation(left),
        }
    }

    /// Right-hand position relative to the body root.
    pub fn right_position(&self) -> Vec3 {
        self.right_hand.translation
    }

    pub fn left_position(&self) -> Vec3 {
        self.left_hand.translation
    }
}

/// Session-level conditions reported to the application shell. The sequencer has no
/// recovery logic for these.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Failed { reason: String },
    Interrupted,
    InterruptionEnded,
}

/// Long-lived anchor entities that follow the tracked body. Effect runs attach to and
/// detach from these, but never delete them.
pub struct BodyAnchors {
    pub body: EntityId,
    pub right_hand: EntityId,
    pub left_hand: EntityId,
}

impl BodyAnchors {
    pub fn new(scene: &mut Scene) -> Self {
        Self {
            body: scene.spawn(Entity::new("bodyAnchor")),
            right_hand: scene.spawn(Entity::new("rightHandAnchor")),
            left_hand: scene.spawn(Entity::new("leftHandAnchor")),
        }
    }

    /// Apply the latest pose sample: the body anchor takes the root transform and each
    /// hand anchor takes `root * hand_local`.
    pub fn update(&self, scene: &mut Scene, frame: &BodyFrame) {
        let root = frame.root.to_mat4();

        if let Some(body) = scene.get_mut(self.body) {
            body.transform = frame.root;
        }
        if let Some(right) = scene.get_mut(self.right_hand) {
            right.transform = Transform::from_mat4(root * frame.right_hand.to_mat4());
        }
        if let Some(left) = scene.get_mut(self.left_hand) {
            left.transform = Transform::from_mat4(root * frame.left_hand.to_mat4());
        }
    }
}
