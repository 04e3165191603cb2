//! Transform propagation.
//!
//! Walks the hierarchy once and rebuilds global transforms. Each category
//! accumulates only through ancestors of the same category: a `Node2D` under
//! a `Node3D` starts from the 2D identity, a `Control` offsets from the
//! nearest `Control` ancestor. Plain nodes pass every accumulator through.
//!
//! Only borrows the node map, so it can run while other scene data is
//! borrowed elsewhere.

use glam::{Affine2, Affine3A, Vec2};
use slotmap::SlotMap;

use crate::scene::node::{Node, NodeKind};
use crate::scene::NodeId;

/// Parent state carried down the walk.
#[derive(Debug, Clone, Copy)]
struct Inherited {
    world_3d: Affine3A,
    changed_3d: bool,
    world_2d: Affine2,
    control_origin: Vec2,
}

impl Inherited {
    const ROOT: Self = Self {
        world_3d: Affine3A::IDENTITY,
        changed_3d: false,
        world_2d: Affine2::IDENTITY,
        control_origin: Vec2::ZERO,
    };
}

/// Updates every global transform below `root` using an explicit stack.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeId, Node>, root: NodeId) {
    let mut stack: Vec<(NodeId, Inherited)> = Vec::with_capacity(64);
    stack.push((root, Inherited::ROOT));

    while let Some((id, parent)) = stack.pop() {
        let Some(node) = nodes.get_mut(id) else {
            continue;
        };

        let mut current = parent;
        match &mut node.kind {
            NodeKind::Node => {}
            NodeKind::Node3D(transform) => {
                let local_changed = transform.update_local_matrix();
                let needs_update = local_changed || parent.changed_3d;
                if needs_update {
                    transform.set_world_matrix(parent.world_3d * *transform.local_matrix());
                }
                current.world_3d = *transform.world_matrix();
                current.changed_3d = needs_update;
            }
            NodeKind::Node2D(transform) => {
                transform.world = parent.world_2d * transform.local_affine();
                current.world_2d = transform.world;
            }
            NodeKind::Control { rect, .. } => {
                rect.global_position = parent.control_origin + rect.position;
                current.control_origin = rect.global_position;
            }
        }

        // Reverse push keeps children in declaration order.
        for &child in node.children.iter().rev() {
            stack.push((child, current));
        }
    }
}

/// Recomputes a single subtree, seeding it from the ancestors' state.
pub fn update_subtree(nodes: &mut SlotMap<NodeId, Node>, root: NodeId) {
    let mut seed = Inherited::ROOT;
    seed.changed_3d = true;

    let mut found_3d = false;
    let mut found_2d = false;
    let mut found_control = false;
    let mut cursor = nodes.get(root).and_then(|n| n.parent);
    while let Some(id) = cursor {
        let Some(node) = nodes.get(id) else { break };
        match &node.kind {
            NodeKind::Node3D(t) if !found_3d => {
                seed.world_3d = *t.world_matrix();
                found_3d = true;
            }
            NodeKind::Node2D(t) if !found_2d => {
                seed.world_2d = t.world;
                found_2d = true;
            }
            NodeKind::Control { rect, .. } if !found_control => {
                seed.control_origin = rect.global_position;
                found_control = true;
            }
            _ => {}
        }
        cursor = node.parent;
    }

    let mut stack = vec![(root, seed)];
    while let Some((id, parent)) = stack.pop() {
        let Some(node) = nodes.get_mut(id) else {
            continue;
        };
        let mut current = parent;
        match &mut node.kind {
            NodeKind::Node => {}
            NodeKind::Node3D(transform) => {
                transform.update_local_matrix();
                transform.set_world_matrix(parent.world_3d * *transform.local_matrix());
                current.world_3d = *transform.world_matrix();
            }
            NodeKind::Node2D(transform) => {
                transform.world = parent.world_2d * transform.local_affine();
                current.world_2d = transform.world;
            }
            NodeKind::Control { rect, .. } => {
                rect.global_position = parent.control_origin + rect.position;
                current.control_origin = rect.global_position;
            }
        }
        for &child in node.children.iter().rev() {
            stack.push((child, current));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::transform::{Transform, Transform2D};
    use glam::Vec3;

    #[test]
    fn propagates_per_category() {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let root = nodes.insert(Node::new("root", NodeKind::Node));

        let parent = nodes.insert(Node::new(
            "parent",
            NodeKind::Node3D(Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        ));
        let child = nodes.insert(Node::new(
            "child",
            NodeKind::Node3D(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
        ));
        let sprite = nodes.insert(Node::new(
            "sprite",
            NodeKind::Node2D(Transform2D::from_position(Vec2::new(5.0, 5.0))),
        ));

        nodes[root].children.push(parent);
        nodes[parent].parent = Some(root);
        nodes[parent].children.extend([child, sprite]);
        nodes[child].parent = Some(parent);
        nodes[sprite].parent = Some(parent);

        update_hierarchy(&mut nodes, root);

        let child_pos = nodes[child].global_position();
        assert!((child_pos - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        // 3D ancestors do not move 2D descendants.
        assert_eq!(nodes[sprite].global_position_2d(), Vec2::new(5.0, 5.0));
    }
}
