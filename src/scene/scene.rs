use std::ops::{Index, IndexMut};

use slotmap::SlotMap;
use uuid::Uuid;

use crate::scene::component::{Component, OwnerRequest, UpdateContext};
use crate::scene::events::{InputEvent, UiEvent, UiEventQueue, UiEventSender};
use crate::scene::node::{Node, NodeKind};
use crate::scene::transform_system;
use crate::scene::NodeId;

/// Scene graph.
///
/// An arena of [`Node`]s under a single plain root. The scene is pure data:
/// the renderer and lighting system read it each frame, and only
/// [`update`](Self::update) and [`dispatch_input`](Self::dispatch_input)
/// call into components.
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    ui_events: UiEventQueue,
    started: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl Scene {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("Root", NodeKind::Node));
        Self {
            name: name.into(),
            nodes,
            root,
            ui_events: UiEventQueue::new(),
            started: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Creates a node under the root.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let root = self.root;
        self.add_child(root, name, kind)
    }

    /// Creates a node as the last child of `parent` (the root if `parent` is
    /// stale).
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            self.root
        };
        let mut node = Node::new(name, kind);
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        transform_system::update_subtree(&mut self.nodes, id);
        id
    }

    /// Moves `node` to the end of `new_parent`'s children.
    ///
    /// Returns `false` (and changes nothing) for the root, stale handles, or
    /// when `new_parent` lies inside `node`'s subtree.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> bool {
        if node == self.root
            || !self.nodes.contains_key(node)
            || !self.nodes.contains_key(new_parent)
            || self.is_ancestor(node, new_parent)
        {
            return false;
        }

        if let Some(old_parent) = self.nodes[node].parent
            && let Some(parent) = self.nodes.get_mut(old_parent)
        {
            parent.children.retain(|&c| c != node);
        }
        self.nodes[new_parent].children.push(node);
        self.nodes[node].parent = Some(new_parent);
        transform_system::update_subtree(&mut self.nodes, node);
        true
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Removes a node and its whole subtree, calling `on_destroy` on every
    /// component. The root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) {
        if id == self.root || !self.nodes.contains_key(id) {
            return;
        }

        if let Some(parent) = self.nodes[id].parent
            && let Some(parent) = self.nodes.get_mut(parent)
        {
            parent.children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(mut node) = self.nodes.remove(current) {
                for component in &mut node.components {
                    component.on_destroy();
                }
                stack.extend(node.children.iter().copied());
            }
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Every node in pre-order, root first.
    #[must_use]
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_filtered(|_| true)
    }

    /// Pre-order walk that skips the whole subtree of any node failing
    /// `keep`.
    pub fn pre_order_filtered(&self, mut keep: impl FnMut(&Node) -> bool) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !keep(node) {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Active nodes whose ancestors are all active.
    #[must_use]
    pub fn active_nodes(&self) -> Vec<NodeId> {
        self.pre_order_filtered(|n| n.active)
    }

    /// Active, visible nodes whose ancestors are all active and visible.
    #[must_use]
    pub fn renderable_nodes(&self) -> Vec<NodeId> {
        self.pre_order_filtered(Node::is_renderable)
    }

    #[must_use]
    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<NodeId> {
        self.nodes
            .iter()
            .find_map(|(id, node)| (node.uuid() == uuid).then_some(id))
    }

    /// First node with the given name in pre-order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.pre_order()
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Every `(node, component)` pair of concrete type `T` in pre-order.
    pub fn components_of<T: Component + 'static>(&self) -> Vec<(NodeId, &T)> {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.nodes[id].get_component::<T>().map(|c| (id, c)))
            .collect()
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches a component and runs its `on_awake` hook. When the scene has
    /// already started, `on_ready` runs immediately as well.
    pub fn add_component(&mut self, id: NodeId, mut component: Box<dyn Component>) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        component.on_awake();
        if self.started {
            component.on_ready();
        }
        node.components.push(component);
        true
    }

    /// Runs `on_ready` on every component in pre-order. Idempotent.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        for id in self.pre_order() {
            if let Some(node) = self.nodes.get_mut(id) {
                for component in &mut node.components {
                    component.on_ready();
                }
            }
        }
        self.update_transforms();
    }

    /// Recomputes every global transform.
    pub fn update_transforms(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, self.root);
    }

    /// Runs one simulation step over all active nodes.
    pub fn update(&mut self, delta_time: f32) {
        self.start();
        self.update_transforms();
        for id in self.active_nodes() {
            self.with_components(id, delta_time, |component, ctx| {
                component.on_update(ctx);
            });
        }
        self.update_transforms();
    }

    /// Forwards an input event to every active component.
    pub fn dispatch_input(&mut self, event: &InputEvent) {
        for id in self.active_nodes() {
            self.with_components(id, 0.0, |component, ctx| {
                component.on_input(ctx, event);
            });
        }
    }

    /// Detaches a node's components, runs `f` on the active ones with an
    /// [`UpdateContext`], reattaches them and applies owner requests.
    fn with_components(
        &mut self,
        id: NodeId,
        delta_time: f32,
        mut f: impl FnMut(&mut dyn Component, &mut UpdateContext<'_>),
    ) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let mut components = std::mem::take(&mut node.components);

        let requests = {
            let mut ctx = UpdateContext::new(self, id, delta_time);
            for component in &mut components {
                if component.is_active() {
                    f(component.as_mut(), &mut ctx);
                }
            }
            ctx.requests
        };

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        // Components added to the node by the hooks go after the originals.
        components.append(&mut node.components);
        node.components = components;

        for request in requests {
            match (request, &mut node.kind) {
                (OwnerRequest::Position3D(p), NodeKind::Node3D(t)) => t.position = p,
                (OwnerRequest::Position2D(p), NodeKind::Node2D(t)) => t.position = p,
                _ => log::debug!("ignoring owner request {request:?} for '{}'", node.name),
            }
        }
        transform_system::update_subtree(&mut self.nodes, id);
    }

    // ========================================================================
    // UI events
    // ========================================================================

    #[must_use]
    pub fn ui_event_sender(&self) -> UiEventSender {
        self.ui_events.sender()
    }

    /// Removes all UI events emitted since the last drain.
    pub fn drain_ui_events(&self) -> Vec<UiEvent> {
        self.ui_events.drain()
    }
}

impl Index<NodeId> for Scene {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Scene {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}
