//! The hierarchy of transform nodes reconstructed from the child references of a resource node.
//!
//! Tree nodes are stored in a single list and refer to each other by position.
//! Names and bone indices are not required to be unique,
//! so lookups return every match and the `unique_*` lookups report ambiguity as an error.
use std::collections::HashMap;
use std::fmt;

use sgres_lib::{Node, NodeType, SgString};
use thiserror::Error;
use tracing::debug;

use crate::Transform;

/// Errors while building a [TransformTree].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("node {index} is not a resource node")]
    NotAResourceNode { index: usize },

    #[error("node {parent} references node {index} but the file only has {node_count} nodes")]
    InvalidNodeIndex {
        parent: usize,
        index: i32,
        node_count: usize,
    },

    #[error("node {index} of type {node_type:?} cannot be part of the transform tree")]
    IneligibleNode { index: usize, node_type: NodeType },

    #[error("node {index} is its own ancestor")]
    Cycle { index: usize },

    #[error("name {name:?} is shared by {count} nodes")]
    AmbiguousName { name: String, count: usize },

    #[error("bone index {bone_index} is shared by {count} nodes")]
    AmbiguousBoneIndex { bone_index: i32, count: usize },
}

/// A transform node, shape, light or viewer reference in a [TransformTree].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformTreeNode {
    /// The position of the source node in the resource file.
    pub node_index: usize,
    pub node_type: NodeType,
    pub name: SgString,
    pub bone_index: Option<i32>,
    /// The transform relative to the parent.
    pub transform: Transform,
    /// The transform relative to the root of the tree.
    pub abs_transform: Transform,
    /// The position of the parent in [TransformTree::nodes].
    pub parent: Option<usize>,
    /// The positions of the children in [TransformTree::nodes].
    pub children: Vec<usize>,
}

/// A forest of [TransformTreeNode].
#[derive(Debug, Clone, Default)]
pub struct TransformTree {
    nodes: Vec<TransformTreeNode>,
    roots: Vec<usize>,
    by_bone_index: HashMap<i32, Vec<usize>>,
    by_name: HashMap<SgString, Vec<usize>>,
}

/// Builds the tree from the children of the resource node at the start of `nodes`.
/// This is equivalent to [TransformTree::from_resource] with a resource index of `0`.
pub fn build_transform_tree(nodes: &[Node]) -> Result<TransformTree, TreeError> {
    TransformTree::from_resource(nodes, 0)
}

impl TransformTree {
    /// Builds the tree from the children of the resource node at `resource_index`.
    ///
    /// Every referenced node must be one of the node types with a transform.
    /// A node referenced more than once appears once for each reference.
    pub fn from_resource(nodes: &[Node], resource_index: usize) -> Result<Self, TreeError> {
        let children = match nodes.get(resource_index) {
            Some(Node::Resource(n)) => &n.composition.children.elements,
            _ => {
                return Err(TreeError::NotAResourceNode {
                    index: resource_index,
                })
            }
        };

        let mut tree = TransformTree::default();
        let mut path = vec![resource_index];
        for child in children {
            let root = tree.add_subtree(nodes, resource_index, child.index, None, &mut path)?;
            tree.roots.push(root);
        }

        debug!(
            "Built transform tree with {} nodes and {} roots",
            tree.nodes.len(),
            tree.roots.len()
        );
        Ok(tree)
    }

    fn add_subtree(
        &mut self,
        nodes: &[Node],
        parent_node: usize,
        index: i32,
        parent: Option<usize>,
        path: &mut Vec<usize>,
    ) -> Result<usize, TreeError> {
        let node_index = usize::try_from(index)
            .ok()
            .filter(|i| *i < nodes.len())
            .ok_or(TreeError::InvalidNodeIndex {
                parent: parent_node,
                index,
                node_count: nodes.len(),
            })?;
        if path.contains(&node_index) {
            return Err(TreeError::Cycle { index: node_index });
        }

        let node = &nodes[node_index];
        let transform_node = node.transform().ok_or(TreeError::IneligibleNode {
            index: node_index,
            node_type: node.node_type(),
        })?;

        let transform = Transform::from_node(transform_node);
        let abs_transform = match parent {
            Some(p) => self.nodes[p].abs_transform * transform,
            None => transform,
        };

        let id = self.nodes.len();
        self.nodes.push(TransformTreeNode {
            node_index,
            node_type: node.node_type(),
            name: transform_node.name().clone(),
            bone_index: transform_node.bone_index.0,
            transform,
            abs_transform,
            parent,
            children: Vec::new(),
        });
        if let Some(bone_index) = transform_node.bone_index.0 {
            self.by_bone_index.entry(bone_index).or_default().push(id);
        }
        self.by_name
            .entry(transform_node.name().clone())
            .or_default()
            .push(id);

        path.push(node_index);
        for child in transform_node.children() {
            let child_id = self.add_subtree(nodes, node_index, child.index, Some(id), path)?;
            self.nodes[id].children.push(child_id);
        }
        path.pop();

        Ok(id)
    }

    /// All tree nodes in the order they were added, which is pre-order.
    pub fn nodes(&self) -> &[TransformTreeNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&TransformTreeNode> {
        self.nodes.get(id)
    }

    /// The nodes referenced directly by the resource node.
    pub fn roots(&self) -> impl Iterator<Item = &TransformTreeNode> {
        self.roots.iter().map(|i| &self.nodes[*i])
    }

    pub fn children<'a>(
        &'a self,
        node: &'a TransformTreeNode,
    ) -> impl Iterator<Item = &'a TransformTreeNode> + 'a {
        node.children.iter().map(|i| &self.nodes[*i])
    }

    pub fn parent(&self, node: &TransformTreeNode) -> Option<&TransformTreeNode> {
        node.parent.map(|i| &self.nodes[i])
    }

    /// Iterates over every node with each parent before its children.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number of ancestors of `node`.
    pub fn depth(&self, node: &TransformTreeNode) -> usize {
        std::iter::successors(self.parent(node), |n| self.parent(n)).count()
    }

    /// Every node with the given bone index.
    pub fn find_by_bone_index(&self, bone_index: i32) -> impl Iterator<Item = &TransformTreeNode> {
        self.lookup(self.by_bone_index.get(&bone_index))
    }

    /// Every node with the given name.
    pub fn find_by_name(&self, name: &str) -> impl Iterator<Item = &TransformTreeNode> {
        self.lookup(self.by_name.get(&SgString::from(name)))
    }

    /// The node with the given bone index or `None` if there is no such node.
    pub fn unique_by_bone_index(
        &self,
        bone_index: i32,
    ) -> Result<Option<&TransformTreeNode>, TreeError> {
        match self.by_bone_index.get(&bone_index).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([i]) => Ok(Some(&self.nodes[*i])),
            Some(ids) => Err(TreeError::AmbiguousBoneIndex {
                bone_index,
                count: ids.len(),
            }),
        }
    }

    /// The node with the given name or `None` if there is no such node.
    pub fn unique_by_name(&self, name: &str) -> Result<Option<&TransformTreeNode>, TreeError> {
        match self.by_name.get(&SgString::from(name)).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([i]) => Ok(Some(&self.nodes[*i])),
            Some(ids) => Err(TreeError::AmbiguousName {
                name: name.to_string(),
                count: ids.len(),
            }),
        }
    }

    fn lookup<'a>(
        &'a self,
        ids: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a TransformTreeNode> + 'a {
        ids.into_iter().flatten().map(|i| &self.nodes[*i])
    }
}

/// A pre-order iterator over the nodes of a [TransformTree].
pub struct PreOrder<'a> {
    tree: &'a TransformTree,
    stack: Vec<usize>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TransformTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a TransformTree {
    type Item = &'a TransformTreeNode;
    type IntoIter = PreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn type_label(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::ShapeRef => "ShapeRef",
        NodeType::LightRef => "LightRef",
        NodeType::ViewerRef => "ViewerRef",
        NodeType::ViewerRefRecursive => "ViewerRefRecursive",
        _ => "Transform",
    }
}

impl fmt::Display for TransformTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.node_type != NodeType::Transform {
            write!(f, "<{}> ", type_label(self.node_type))?;
        }
        if self.name.is_empty() {
            write!(f, "(unnamed)")?;
        } else {
            write!(f, "\"{}\"", self.name)?;
        }
        match self.bone_index {
            Some(i) => write!(f, " (#{i}): {}", self.transform),
            None => write!(f, ": {}", self.transform),
        }
    }
}

impl fmt::Display for TransformTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformTree")?;
        for node in self.iter() {
            let indent = "  ".repeat(self.depth(node) + 1);
            write!(f, "\n{indent}{node}")?;
        }
        Ok(())
    }
}
