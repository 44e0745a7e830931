//! The shared sub-structures that make up most node types.
//!
//! The sub-structures nest by containment.
//! A [RenderableNode] contains a [BoundedNode], which contains a [TransformNode],
//! which contains a [CompositionTreeNode], which contains an [ObjectGraphNode].
use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{BoneIndex, NodeReference};
use crate::signatures::{
    BoundedNodeSignature, CompositionTreeNodeSignature, ObjectGraphNodeSignature,
    RenderableNodeSignature, SgResourceSignature, TransformNodeSignature,
};
use crate::{SgArray, SgString, Vector3, Vector4};

/// The resource name of a node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct SgResource {
    pub signature: SgResourceSignature,
    pub name: SgString,
}

impl SgResource {
    pub fn new(name: SgString) -> Self {
        Self {
            signature: SgResourceSignature,
            name,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct ObjectGraphNode {
    pub signature: ObjectGraphNodeSignature,
    /// References to extension nodes such as [DataListExtension](super::DataListExtension).
    pub extensions: SgArray<NodeReference>,
    pub name: SgString,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct CompositionTreeNode {
    pub signature: CompositionTreeNodeSignature,
    pub object_graph: ObjectGraphNode,
    pub children: SgArray<NodeReference>,
}

/// A named transform relative to the parent node with an optional bone index.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct TransformNode {
    pub signature: TransformNodeSignature,
    pub composition: CompositionTreeNode,
    pub translation: Vector3,
    /// A quaternion in `(x, y, z, w)` order.
    pub rotation: Vector4,
    pub bone_index: BoneIndex,
}

impl TransformNode {
    /// Creates a transform with no extensions or children.
    pub fn new(name: SgString, translation: Vector3, rotation: Vector4, bone_index: Option<i32>) -> Self {
        Self {
            signature: TransformNodeSignature,
            composition: CompositionTreeNode {
                signature: CompositionTreeNodeSignature,
                object_graph: ObjectGraphNode {
                    signature: ObjectGraphNodeSignature,
                    extensions: SgArray::new(),
                    name,
                },
                children: SgArray::new(),
            },
            translation,
            rotation,
            bone_index: BoneIndex(bone_index),
        }
    }

    pub fn name(&self) -> &SgString {
        &self.composition.object_graph.name
    }

    pub fn children(&self) -> &[NodeReference] {
        &self.composition.children.elements
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct BoundedNode {
    pub signature: BoundedNodeSignature,
    pub transform: TransformNode,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct RenderableNode {
    pub signature: RenderableNodeSignature,
    pub bounded: BoundedNode,
    pub unk1: u16,
    pub render_groups: SgArray<SgString>,
    pub unk2: [u8; 5],
}

impl RenderableNode {
    /// Creates a renderable node with no render groups.
    pub fn new(transform: TransformNode) -> Self {
        Self {
            signature: RenderableNodeSignature,
            bounded: BoundedNode {
                signature: BoundedNodeSignature,
                transform,
            },
            unk1: 0,
            render_groups: SgArray::new(),
            unk2: [0; 5],
        }
    }

    pub fn transform(&self) -> &TransformNode {
        &self.bounded.transform
    }
}
