//! Tree teardown - destroy the widgets nested in a rendered tree.
//!
//! Depth-first over the tree as last rendered: grouping nodes are descended
//! into, widget placeholders are destroyed (each of which tears down its own
//! tree first). The caller runs its own destroy hook only after this returns,
//! so every descendant is gone before the ancestor finalizes.
//!
//! A failing nested destroy does not stop the walk: the remaining widgets are
//! still destroyed and the first error is returned.

use super::VNode;
use crate::error::Result;
use crate::widget::Widget;

/// Destroy every widget placeholder in `tree`, depth-first.
pub fn destroy_nested(tree: &VNode) -> Result<()> {
    match tree {
        VNode::Text(_) => Ok(()),
        VNode::Widget(widget) => widget.destroy(None),
        VNode::Element { children, .. } => children
            .iter()
            .filter(|child| child.has_widgets())
            .map(destroy_nested)
            .fold(Ok(()), |first, next| first.and(next)),
    }
}

/// Widget placeholders directly reachable in `tree` (not inside other widgets).
pub fn collect_widgets(tree: &VNode) -> Vec<Widget> {
    fn walk(node: &VNode, out: &mut Vec<Widget>) {
        match node {
            VNode::Text(_) => {}
            VNode::Widget(widget) => out.push(widget.clone()),
            VNode::Element { children, .. } => {
                for child in children {
                    walk(child, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(tree, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::engine::ContextRegistry;
    use crate::error::WidgetError;
    use crate::testing::{reset_all, TestComponent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_destroys_placeholders_depth_first() {
        reset_all();
        let log = Rc::new(RefCell::new(Vec::new()));
        let context = ContextRegistry::new();
        let first = Widget::new(TestComponent::new().logging_to(&log, "first"), attrs! {}, &context).unwrap();
        let second = Widget::new(TestComponent::new().logging_to(&log, "second"), attrs! {}, &context).unwrap();

        let tree = VNode::element(
            "root",
            vec![
                VNode::widget(&first),
                VNode::text("between"),
                VNode::element("group", vec![VNode::widget(&second)]),
            ],
        );

        assert_eq!(collect_widgets(&tree).len(), 2);
        destroy_nested(&tree).unwrap();

        assert_eq!(*log.borrow(), vec!["first:destroy", "second:destroy"]);
        assert!(first.is_destroyed());
        assert!(second.is_destroyed());
    }

    #[test]
    fn test_failing_placeholder_does_not_stop_the_walk() {
        reset_all();
        let log = Rc::new(RefCell::new(Vec::new()));
        let context = ContextRegistry::new();
        let broken = Widget::new(
            TestComponent::new().on_destroy(|_| Err(WidgetError::handler("broken"))),
            attrs! {},
            &context,
        )
        .unwrap();
        let healthy = Widget::new(TestComponent::new().logging_to(&log, "healthy"), attrs! {}, &context).unwrap();

        let tree = VNode::element("root", vec![VNode::widget(&broken), VNode::widget(&healthy)]);

        assert_eq!(destroy_nested(&tree), Err(WidgetError::handler("broken")));
        assert_eq!(*log.borrow(), vec!["healthy:destroy"]);
        assert!(broken.is_destroyed());
        assert!(healthy.is_destroyed());
    }

    #[test]
    fn test_text_only_tree_is_untouched() {
        let tree = VNode::element("p", vec![VNode::text("hello")]);
        assert!(!tree.has_widgets());
        destroy_nested(&tree).unwrap();
        assert!(collect_widgets(&tree).is_empty());
    }
}
