//! Hierarchical tree of layer visibility toggles.

use serde::Deserialize;

/// A node of the layer tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeNode {
    /// Node id, unique within the tree. Permalinks reference nodes by this id.
    pub id: String,
    /// Human readable label of the node.
    #[serde(default)]
    pub title: String,
    /// Id of the map layer this node toggles, if any. Group nodes have none.
    #[serde(default)]
    pub layer_id: Option<String>,
    /// Whether the node's checkbox is checked.
    #[serde(default)]
    pub checked: bool,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Creates a leaf node.
    pub fn leaf(id: impl Into<String>, title: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            layer_id: None,
            checked,
            children: Vec::new(),
        }
    }

    /// Creates a group node with the given children.
    pub fn group(
        id: impl Into<String>,
        title: impl Into<String>,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            layer_id: None,
            checked: false,
            children,
        }
    }

    /// Attaches a map layer id to the node.
    pub fn with_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    fn visit_mut(&mut self, f: &mut impl FnMut(&mut TreeNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    fn visit(&self, f: &mut impl FnMut(&TreeNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// The layer tree: a hierarchy of visibility toggles over the map's layers.
///
/// The checked-node set is what the permalink records as `layerNodes`, so node ids
/// must be stable across sessions for permalinks to keep working.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayerTree {
    /// Root nodes of the tree.
    #[serde(default)]
    pub roots: Vec<TreeNode>,
}

impl LayerTree {
    /// Creates a tree with the given root nodes.
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    /// Ids of all checked nodes, in document order.
    pub fn checked_ids(&self) -> Vec<String> {
        let mut checked = Vec::new();
        for root in &self.roots {
            root.visit(&mut |node| {
                if node.checked {
                    checked.push(node.id.clone());
                }
            });
        }

        checked
    }

    /// Checks or unchecks the node with the given id. Returns `false` when no such node
    /// exists.
    pub fn set_node_checked(&mut self, id: &str, checked: bool) -> bool {
        let mut found = false;
        for root in &mut self.roots {
            root.visit_mut(&mut |node| {
                if node.id == id {
                    node.checked = checked;
                    found = true;
                }
            });
        }

        found
    }

    /// Unchecks every node, then checks the listed ones. Ids that do not match any node
    /// are skipped. This is how a permalink's `layerNodes` parameter is restored.
    pub fn apply_checked_set(&mut self, ids: &[String]) {
        for root in &mut self.roots {
            root.visit_mut(&mut |node| node.checked = false);
        }

        for id in ids {
            self.set_node_checked(id, true);
        }
    }

    /// Visibility every node with an attached layer prescribes for it, in document
    /// order: `(layer id, checked)` pairs.
    pub fn layer_states(&self) -> Vec<(String, bool)> {
        let mut states = Vec::new();
        for root in &self.roots {
            root.visit(&mut |node| {
                if let Some(layer_id) = &node.layer_id {
                    states.push((layer_id.clone(), node.checked));
                }
            });
        }

        states
    }

    /// Layer ids attached to the checked nodes, in document order.
    pub fn checked_layer_ids(&self) -> Vec<String> {
        let mut layers = Vec::new();
        for root in &self.roots {
            root.visit(&mut |node| {
                if node.checked {
                    if let Some(layer_id) = &node.layer_id {
                        layers.push(layer_id.clone());
                    }
                }
            });
        }

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> LayerTree {
        LayerTree::new(vec![
            TreeNode::group(
                "bases",
                "Base maps",
                vec![
                    TreeNode::leaf("plan", "Plan", true).with_layer("base_plan"),
                    TreeNode::leaf("ortho", "Orthophoto", false).with_layer("base_ortho"),
                ],
            ),
            TreeNode::leaf("pois", "Points of interest", true).with_layer("overlay_pois"),
        ])
    }

    #[test]
    fn checked_ids_in_document_order() {
        assert_eq!(tree().checked_ids(), vec!["plan", "pois"]);
    }

    #[test]
    fn apply_checked_set_replaces_state() {
        let mut tree = tree();
        tree.apply_checked_set(&["ortho".into(), "unknown".into()]);

        assert_eq!(tree.checked_ids(), vec!["ortho"]);
        assert_eq!(tree.checked_layer_ids(), vec!["base_ortho"]);
    }

    #[test]
    fn set_node_checked_reports_missing_nodes() {
        let mut tree = tree();
        assert!(tree.set_node_checked("ortho", true));
        assert!(!tree.set_node_checked("nope", true));
    }
}
