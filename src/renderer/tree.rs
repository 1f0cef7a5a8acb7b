//! Tree template - a renderer driven by a plain view function.
//!
//! For hosts that have no template engine of their own: the view function
//! maps a widget to a [`VNode`] tree, and the renderer records that tree and
//! keeps one mounted node handle across updates.
//!
//! ```ignore
//! let template = TreeTemplate::new(|widget| {
//!     let title = widget.get("title").unwrap_or_default();
//!     Ok(VNode::element("h1", vec![VNode::text(format!("{title:?}"))]))
//! });
//! ```

use std::rc::Rc;

use super::{NodeHandle, Renderer, Template, VNode};
use crate::error::Result;
use crate::widget::Widget;

type View = Rc<dyn Fn(&Widget) -> Result<VNode>>;

/// Mounted node produced by [`TreeRenderer`].
#[derive(Debug)]
pub struct MountedTree {
    /// Tag of the root element, or `#text` / `#widget`.
    pub root: String,
}

/// Template wrapping a view function.
#[derive(Clone)]
pub struct TreeTemplate {
    view: View,
}

impl TreeTemplate {
    pub fn new<F>(view: F) -> Self
    where
        F: Fn(&Widget) -> Result<VNode> + 'static,
    {
        Self { view: Rc::new(view) }
    }
}

impl Template for TreeTemplate {
    fn instantiate(&self) -> Box<dyn Renderer> {
        Box::new(TreeRenderer {
            view: self.view.clone(),
            node: None,
            tree: None,
            renders: 0,
            patches: 0,
        })
    }
}

/// Renderer created by [`TreeTemplate`].
pub struct TreeRenderer {
    view: View,
    node: Option<NodeHandle>,
    tree: Option<VNode>,
    renders: usize,
    patches: usize,
}

impl TreeRenderer {
    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn patches(&self) -> usize {
        self.patches
    }

    fn mount(tree: &VNode) -> NodeHandle {
        let root = match tree {
            VNode::Element { tag, .. } => tag.clone(),
            VNode::Text(_) => "#text".to_string(),
            VNode::Widget(_) => "#widget".to_string(),
        };
        NodeHandle::new(MountedTree { root })
    }
}

impl Renderer for TreeRenderer {
    fn render(&mut self, widget: &Widget) -> Result<NodeHandle> {
        let tree = (self.view)(widget)?;
        let node = Self::mount(&tree);
        self.renders += 1;
        self.tree = Some(tree);
        self.node = Some(node.clone());
        Ok(node)
    }

    fn update(&mut self, widget: &Widget) -> Result<NodeHandle> {
        let tree = (self.view)(widget)?;
        let node = match &self.node {
            Some(node) => node.clone(),
            None => Self::mount(&tree),
        };
        self.patches += 1;
        self.tree = Some(tree);
        self.node = Some(node.clone());
        Ok(node)
    }

    fn node(&self) -> Option<NodeHandle> {
        self.node.clone()
    }

    fn set_node(&mut self, node: Option<NodeHandle>) {
        self.node = node;
    }

    fn tree(&self) -> Option<VNode> {
        self.tree.clone()
    }

    fn set_tree(&mut self, tree: Option<VNode>) {
        self.tree = tree;
    }
}
