use generational_arena::Arena;
use glam::Mat4;
use tracing::warn;

use crate::{Easing, Entity, Interpolate, Transform};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub generational_arena::Index);

struct Node {
    entity: Entity,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

struct TransformAnimation {
    target: EntityId,
    from: Transform,
    to: Transform,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

/// Entity hierarchy plus the transform animations currently running against it.
#[derive(Default)]
pub struct Scene {
    nodes: Arena<Node>,
    animations: Vec<TransformAnimation>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        EntityId(self.nodes.insert(Node {
            entity,
            parent: None,
            children: Vec::new(),
        }))
    }

    /// Remove the entity and all of its descendants, along with their animations.
    pub fn despawn_recursive(&mut self, id: EntityId) {
        self.remove_from_parent(id);

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(current.0) {
                pending.extend(node.children);
            }
        }

        self.animations
            .retain(|animation| self.nodes.contains(animation.target.0));
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.nodes.get(id.0).map(|node| &node.entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.nodes.get_mut(id.0).map(|node| &mut node.entity)
    }

    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attach `child` under `parent`, detaching it from its previous parent first. The
    /// child keeps its local transform, now interpreted in the new parent's frame.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) {
        if !self.nodes.contains(parent.0) || !self.nodes.contains(child.0) {
            warn!("Attach with a stale entity id.");
            return;
        }

        self.remove_from_parent(child);

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn remove_from_parent(&mut self, child: EntityId) {
        let Some(parent) = self.nodes.get(child.0).and_then(|node| node.parent) else {
            return;
        };

        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = None;
    }

    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.entity.enabled = enabled;
        }
    }

    pub fn world_transform(&self, id: EntityId) -> Mat4 {
        let Some(node) = self.nodes.get(id.0) else {
            warn!("World transform for a stale entity id.");
            return Mat4::IDENTITY;
        };

        let local = node.entity.transform.to_mat4();
        match node.parent {
            Some(parent) => self.world_transform(parent) * local,
            None => local,
        }
    }

    /// Depth-first search for an entity by name, starting at (and including) `root`.
    pub fn find_by_name(&self, root: EntityId, name: &str) -> Option<EntityId> {
        let node = self.nodes.get(root.0)?;
        if node.entity.name == name {
            return Some(root);
        }

        node.children
            .iter()
            .find_map(|child| self.find_by_name(*child, name))
    }

    /// Deep-copy the entity and its descendants. The copy is detached from any parent.
    pub fn clone_recursive(&mut self, id: EntityId) -> Option<EntityId> {
        let entity = self.get(id)?.clone();
        let copy = self.spawn(entity);

        let children: Vec<EntityId> = self.children_of(id).to_vec();
        for child in children {
            if let Some(child_copy) = self.clone_recursive(child) {
                self.add_child(copy, child_copy);
            }
        }

        Some(copy)
    }

    /// Place the entity at `from` oriented toward `at`, both expressed in
    /// `relative_to`'s frame at call time.
    pub fn look_at(&mut self, id: EntityId, at: glam::Vec3, from: glam::Vec3, relative_to: EntityId) {
        let pose = Transform::looking_at(from, at).to_mat4();
        let world = self.world_transform(relative_to) * pose;

        let local = match self.parent_of(id) {
            Some(parent) => self.world_transform(parent).inverse() * world,
            None => world,
        };

        if let Some(entity) = self.get_mut(id) {
            entity.transform = Transform::from_mat4(local);
        }
    }

    /// Animate the entity's transform to `target`, where `target` is expressed in
    /// `relative_to`'s frame at call time. Passing the entity itself makes the move
    /// relative to its current pose. A new move replaces any running animation on the
    /// same entity.
    pub fn move_to(
        &mut self,
        id: EntityId,
        target: Transform,
        relative_to: EntityId,
        duration: f32,
        easing: Easing,
    ) {
        if !self.nodes.contains(id.0) {
            warn!("Move on a stale entity id.");
            return;
        }

        let world_target = self.world_transform(relative_to) * target.to_mat4();
        let local_target = match self.parent_of(id) {
            Some(parent) => self.world_transform(parent).inverse() * world_target,
            None => world_target,
        };
        let to = Transform::from_mat4(local_target);

        if duration <= 0.0 {
            self.nodes[id.0].entity.transform = to;
            return;
        }

        let from = self.nodes[id.0].entity.transform;

        self.animations.retain(|animation| animation.target != id);
        self.animations.push(TransformAnimation {
            target: id,
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
        });
    }

    pub fn is_animating(&self, id: EntityId) -> bool {
        self.animations.iter().any(|animation| animation.target == id)
    }

    /// Advance all running animations. Finished animations snap to their target
    /// transform and are retired.
    pub fn update(&mut self, delta_time: f32) {
        let mut finished = Vec::new();

        for (index, animation) in self.animations.iter_mut().enumerate() {
            animation.elapsed += delta_time;

            let Some(node) = self.nodes.get_mut(animation.target.0) else {
                finished.push(index);
                continue;
            };

            if animation.elapsed >= animation.duration {
                node.entity.transform = animation.to;
                finished.push(index);
                continue;
            }

            let progress = animation.easing.apply(animation.elapsed / animation.duration);
            node.entity.transform = Transform::interpolate(animation.from, animation.to, progress);
        }

        for index in finished.into_iter().rev() {
            self.animations.swap_remove(index);
        }
    }
}
