//! Host node tree and lifecycle event contract
//!
//! Bindings never subclass a node type. The tree delivers lifecycle events
//! through the [`TreeObserver`] trait together with a [`NodeContext`]
//! snapshot, so the binding layer stays decoupled from any particular node
//! base. [`NodeTree`] is a minimal concrete host: named nodes with a parent
//! link, a local visibility flag, and a local transform, dispatching events
//! synchronously and in order.

use std::sync::{Arc, RwLock};

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::foundation::math::{Mat4, Transform};

new_key_type! {
    /// Stable identifier for a node in a [`NodeTree`]
    pub struct NodeId;
}

/// Lifecycle events delivered to node observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// The node became part of the active tree
    EnteredTree,
    /// The node left the active tree
    ExitedTree,
    /// The node's effective visibility may have changed
    VisibilityChanged,
    /// The node was moved under a different parent
    ParentChanged,
    /// The node's global transform changed
    TransformChanged,
}

/// Snapshot of the host node's state at dispatch time
///
/// Computed by the tree before each event so observers never have to
/// re-enter the tree during delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeContext {
    /// Whether the node is currently part of the active tree
    pub inside_tree: bool,
    /// Conjunction of the node's own visibility flag and every ancestor's
    pub effective_visibility: bool,
    /// World-space transform (product of local transforms, root down)
    pub global_transform: Mat4,
}

/// Observer for node lifecycle events
pub trait TreeObserver {
    /// Handle a lifecycle event for the observed node
    fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext);
}

/// Shared, mutable reference to a tree observer
pub type SharedObserver = Arc<RwLock<dyn TreeObserver + Send + Sync>>;

#[derive(Debug)]
struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visible: bool,
    transform: Transform,
    inside_tree: bool,
}

/// Minimal scene-node hierarchy with synchronous event delivery
///
/// Nodes start detached; attaching as a root (or under an attached parent)
/// brings the whole subtree into the tree. At most one observer per node.
pub struct NodeTree {
    nodes: SlotMap<NodeId, NodeData>,
    observers: SecondaryMap<NodeId, SharedObserver>,
    roots: Vec<NodeId>,
}

impl NodeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            observers: SecondaryMap::new(),
            roots: Vec::new(),
        }
    }

    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            visible: true,
            transform: Transform::identity(),
            inside_tree: false,
        })
    }

    /// Attach an observer to a node, replacing any previous one
    pub fn set_observer(&mut self, node: NodeId, observer: SharedObserver) {
        self.observers.insert(node, observer);
    }

    /// Remove a node's observer
    pub fn clear_observer(&mut self, node: NodeId) {
        self.observers.remove(node);
    }

    /// Node name, if the node exists
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    /// Whether the node is part of the active tree
    pub fn is_inside_tree(&self, node: NodeId) -> bool {
        self.nodes.get(node).map_or(false, |n| n.inside_tree)
    }

    /// The node's own visibility flag
    pub fn visible(&self, node: NodeId) -> bool {
        self.nodes.get(node).map_or(false, |n| n.visible)
    }

    /// The node's parent, if any
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Conjunction of the node's visibility flag and every ancestor's
    pub fn effective_visibility(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(data) if data.visible => current = data.parent,
                _ => return false,
            }
        }
        true
    }

    /// World-space transform of the node
    pub fn global_transform(&self, node: NodeId) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(data) => {
                    chain.push(data.transform.to_matrix());
                    current = data.parent;
                }
                None => break,
            }
        }
        chain
            .iter()
            .rev()
            .fold(Mat4::identity(), |acc, local| acc * local)
    }

    /// Snapshot of the node's state as observers see it
    pub fn context(&self, node: NodeId) -> NodeContext {
        NodeContext {
            inside_tree: self.is_inside_tree(node),
            effective_visibility: self.effective_visibility(node),
            global_transform: self.global_transform(node),
        }
    }

    /// Attach a detached node as a root of the active tree
    ///
    /// The whole subtree enters the tree; `EnteredTree` is delivered parent
    /// first, then children.
    pub fn attach_root(&mut self, node: NodeId) {
        if !self.nodes.contains_key(node)
            || self.is_inside_tree(node)
            || self.parent(node).is_some()
        {
            return;
        }
        self.roots.push(node);
        self.enter_subtree(node);
    }

    /// Attach a detached node under a parent
    ///
    /// If the parent is inside the tree the child subtree enters it.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(parent)
            || self.is_inside_tree(child)
            || self.parent(child).is_some()
            || parent == child
        {
            return;
        }
        if let Some(data) = self.nodes.get_mut(child) {
            data.parent = Some(parent);
        } else {
            return;
        }
        if let Some(data) = self.nodes.get_mut(parent) {
            data.children.push(child);
        }
        if self.is_inside_tree(parent) {
            self.enter_subtree(child);
        }
    }

    /// Detach a node (and its subtree) from the tree
    ///
    /// `ExitedTree` is delivered children first, then the detached node.
    /// The subtree stays intact and can be re-attached later.
    pub fn detach(&mut self, node: NodeId) {
        if !self.nodes.contains_key(node) {
            return;
        }
        let was_inside = self.is_inside_tree(node);
        if let Some(parent) = self.parent(node) {
            if let Some(data) = self.nodes.get_mut(parent) {
                data.children.retain(|c| *c != node);
            }
            if let Some(data) = self.nodes.get_mut(node) {
                data.parent = None;
            }
        } else {
            self.roots.retain(|r| *r != node);
        }
        if was_inside {
            self.exit_subtree(node);
        }
    }

    /// Move a node under a new parent without leaving the tree
    ///
    /// `ParentChanged` is delivered to every node in the moved subtree:
    /// the ancestor chain changed for all of them, so each observer must
    /// re-evaluate visibility.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) {
        if node == new_parent
            || !self.nodes.contains_key(node)
            || !self.nodes.contains_key(new_parent)
            || self.is_ancestor(node, new_parent)
        {
            return;
        }
        match self.parent(node) {
            Some(old_parent) => {
                if let Some(data) = self.nodes.get_mut(old_parent) {
                    data.children.retain(|c| *c != node);
                }
            }
            None => self.roots.retain(|r| *r != node),
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.parent = Some(new_parent);
        }
        let parent_inside = self.is_inside_tree(new_parent);
        if let Some(data) = self.nodes.get_mut(new_parent) {
            data.children.push(node);
        }
        let node_inside = self.is_inside_tree(node);
        if parent_inside && !node_inside {
            self.enter_subtree(node);
        } else if !parent_inside && node_inside {
            self.exit_subtree(node);
        } else {
            self.dispatch_subtree(node, TreeEvent::ParentChanged);
        }
    }

    /// Set a node's visibility flag
    ///
    /// `VisibilityChanged` is delivered to the node and every descendant,
    /// since their effective visibility depends on this flag.
    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        match self.nodes.get_mut(node) {
            Some(data) if data.visible != visible => data.visible = visible,
            _ => return,
        }
        self.dispatch_subtree(node, TreeEvent::VisibilityChanged);
    }

    /// Set a node's local transform
    ///
    /// `TransformChanged` is delivered to the whole subtree.
    pub fn set_transform(&mut self, node: NodeId, transform: Transform) {
        match self.nodes.get_mut(node) {
            Some(data) => data.transform = transform,
            None => return,
        }
        self.dispatch_subtree(node, TreeEvent::TransformChanged);
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn enter_subtree(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.inside_tree = true;
        }
        self.dispatch(node, TreeEvent::EnteredTree);
        for child in self.children_of(node) {
            self.enter_subtree(child);
        }
    }

    fn exit_subtree(&mut self, node: NodeId) {
        for child in self.children_of(node) {
            self.exit_subtree(child);
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.inside_tree = false;
        }
        self.dispatch(node, TreeEvent::ExitedTree);
    }

    fn dispatch_subtree(&mut self, node: NodeId, event: TreeEvent) {
        self.dispatch(node, event);
        for child in self.children_of(node) {
            self.dispatch_subtree(child, event);
        }
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.get(node).map_or_else(Vec::new, |n| n.children.clone())
    }

    fn dispatch(&mut self, node: NodeId, event: TreeEvent) {
        let Some(observer) = self.observers.get(node).cloned() else {
            return;
        };
        let ctx = self.context(node);
        observer.write().unwrap().on_tree_event(event, &ctx);
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    struct EventLog {
        events: Vec<(TreeEvent, NodeContext)>,
    }

    impl TreeObserver for EventLog {
        fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext) {
            self.events.push((event, *ctx));
        }
    }

    fn logged_node(tree: &mut NodeTree, name: &str) -> (NodeId, Arc<RwLock<EventLog>>) {
        let node = tree.create_node(name);
        let log = Arc::new(RwLock::new(EventLog { events: Vec::new() }));
        tree.set_observer(node, log.clone());
        (node, log)
    }

    #[test]
    fn test_enter_and_exit_events() {
        let mut tree = NodeTree::new();
        let (root, _) = logged_node(&mut tree, "root");
        let (child, log) = logged_node(&mut tree, "child");

        tree.attach_child(root, child);
        assert!(log.read().unwrap().events.is_empty(), "detached parent, no events yet");

        tree.attach_root(root);
        assert!(tree.is_inside_tree(child));

        tree.detach(root);
        assert!(!tree.is_inside_tree(child));

        let events: Vec<TreeEvent> =
            log.read().unwrap().events.iter().map(|(e, _)| *e).collect();
        assert_eq!(events, vec![TreeEvent::EnteredTree, TreeEvent::ExitedTree]);
    }

    #[test]
    fn test_effective_visibility_includes_ancestors() {
        let mut tree = NodeTree::new();
        let root = tree.create_node("root");
        let mid = tree.create_node("mid");
        let leaf = tree.create_node("leaf");
        tree.attach_root(root);
        tree.attach_child(root, mid);
        tree.attach_child(mid, leaf);

        assert!(tree.effective_visibility(leaf));

        // Leaf stays individually visible, but an ancestor hides it
        tree.set_visible(mid, false);
        assert!(tree.visible(leaf));
        assert!(!tree.effective_visibility(leaf));

        tree.set_visible(mid, true);
        assert!(tree.effective_visibility(leaf));
    }

    #[test]
    fn test_visibility_change_notifies_descendants() {
        let mut tree = NodeTree::new();
        let root = tree.create_node("root");
        let (leaf, log) = logged_node(&mut tree, "leaf");
        tree.attach_root(root);
        tree.attach_child(root, leaf);

        tree.set_visible(root, false);
        let (event, ctx) = log.read().unwrap().events.last().copied().unwrap();
        assert_eq!(event, TreeEvent::VisibilityChanged);
        assert!(!ctx.effective_visibility);
    }

    #[test]
    fn test_redundant_visibility_write_does_not_dispatch() {
        let mut tree = NodeTree::new();
        let (root, log) = logged_node(&mut tree, "root");
        tree.attach_root(root);
        let before = log.read().unwrap().events.len();

        tree.set_visible(root, true);
        assert_eq!(log.read().unwrap().events.len(), before);
    }

    #[test]
    fn test_global_transform_composes_down_the_chain() {
        let mut tree = NodeTree::new();
        let root = tree.create_node("root");
        let child = tree.create_node("child");
        tree.attach_root(root);
        tree.attach_child(root, child);

        tree.set_transform(root, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        tree.set_transform(child, Transform::from_position(Vec3::new(0.0, 2.0, 0.0)));

        let global = tree.global_transform(child);
        let origin = global.transform_point(&crate::foundation::math::Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_reparent_keeps_subtree_in_tree() {
        let mut tree = NodeTree::new();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        let (moved, log) = logged_node(&mut tree, "moved");
        tree.attach_root(a);
        tree.attach_root(b);
        tree.attach_child(a, moved);

        tree.reparent(moved, b);
        assert_eq!(tree.parent(moved), Some(b));
        assert!(tree.is_inside_tree(moved));

        let events: Vec<TreeEvent> =
            log.read().unwrap().events.iter().map(|(e, _)| *e).collect();
        assert_eq!(events, vec![TreeEvent::EnteredTree, TreeEvent::ParentChanged]);
    }

    #[test]
    fn test_reparent_under_hidden_parent_reports_invisible() {
        let mut tree = NodeTree::new();
        let shown = tree.create_node("shown");
        let hidden = tree.create_node("hidden");
        let (moved, log) = logged_node(&mut tree, "moved");
        tree.attach_root(shown);
        tree.attach_root(hidden);
        tree.set_visible(hidden, false);
        tree.attach_child(shown, moved);

        tree.reparent(moved, hidden);
        let (event, ctx) = log.read().unwrap().events.last().copied().unwrap();
        assert_eq!(event, TreeEvent::ParentChanged);
        assert!(!ctx.effective_visibility);
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = NodeTree::new();
        let root = tree.create_node("root");
        let child = tree.create_node("child");
        tree.attach_root(root);
        tree.attach_child(root, child);

        tree.reparent(root, child);
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(child), Some(root));
    }
}
