//! Renderer contract - the boundary to the template / virtual-tree engine.
//!
//! The widget core never builds nodes itself. Each component names a
//! [`Template`]; every widget instance gets its own [`Renderer`] from it and
//! asks that renderer to produce or patch its node.
//!
//! The renderer keeps two pieces of state the core is allowed to touch:
//! - `node` - the opaque handle of the mounted node
//! - `tree` - the last virtual tree it rendered
//!
//! Both are transplanted from an old widget to its replacement during an
//! identity swap, and `tree` is what teardown walks to find nested widgets.
//!
//! - [`tree`] - A closure-backed template for hosts without a template engine
//! - [`teardown`] - Destroy nested widgets found in a rendered tree

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::widget::Widget;

pub mod teardown;
pub mod tree;

pub use teardown::{collect_widgets, destroy_nested};
pub use tree::{TreeRenderer, TreeTemplate};

// =============================================================================
// Node Handle
// =============================================================================

/// Opaque handle to a node produced by a renderer.
#[derive(Clone)]
pub struct NodeHandle(Rc<dyn Any>);

impl NodeHandle {
    pub fn new<T: Any>(node: T) -> Self {
        Self(Rc::new(node))
    }

    /// Borrow the node as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &NodeHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// Virtual Tree
// =============================================================================

/// A rendered virtual tree, as last known to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
    /// Text leaf.
    Text(String),
    /// Grouping node with children.
    Element { tag: String, children: Vec<VNode> },
    /// Placeholder for a nested widget.
    Widget(Widget),
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<VNode>) -> Self {
        VNode::Element { tag: tag.into(), children }
    }

    pub fn widget(widget: &Widget) -> Self {
        VNode::Widget(widget.clone())
    }

    /// True if this node or any descendant is a widget placeholder.
    pub fn has_widgets(&self) -> bool {
        match self {
            VNode::Text(_) => false,
            VNode::Widget(_) => true,
            VNode::Element { children, .. } => children.iter().any(VNode::has_widgets),
        }
    }
}

// =============================================================================
// Contract
// =============================================================================

/// Render template bound to a component type.
pub trait Template {
    /// Create the renderer for one widget instance.
    fn instantiate(&self) -> Box<dyn Renderer>;
}

/// Per-widget renderer instance.
pub trait Renderer {
    /// Initial render. Produces the node and records the tree.
    fn render(&mut self, widget: &Widget) -> Result<NodeHandle>;

    /// Re-render and patch the current node from the recorded tree.
    fn update(&mut self, widget: &Widget) -> Result<NodeHandle>;

    fn node(&self) -> Option<NodeHandle>;

    fn set_node(&mut self, node: Option<NodeHandle>);

    fn tree(&self) -> Option<VNode>;

    fn set_tree(&mut self, tree: Option<VNode>);
}
