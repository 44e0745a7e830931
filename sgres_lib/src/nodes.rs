//! The node variants stored in a resource file.
//!
//! Each node type is listed by its 4-byte type id in the resource file header.
//! The bodies are stored sequentially after the header in the same order.
//! Nodes only refer to each other by their position in [ResourceFile::nodes](crate::ResourceFile::nodes)
//! using the `index` of a [NodeReference].
use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod container;
mod extension;
mod graph;
mod light;
mod material;
mod resource;
mod shape;
mod viewer;

pub use container::{GeometryDataContainer, GeometryNode};
pub use extension::{BoneDataExtension, DataListEntry, DataListExtension, DataListValue};
pub use graph::{
    BoundedNode, CompositionTreeNode, ObjectGraphNode, RenderableNode, SgResource, TransformNode,
};
pub use light::LightRefNode;
pub use material::{MaterialDefinition, MaterialProperty};
pub use resource::ResourceNode;
pub use shape::ShapeRefNode;
pub use viewer::{ViewerRefNode, ViewerRefNodeBase, ViewerRefNodeRecursive};

/// A reference to a child node, extension node or linked resource.
/// `index` is a position in the node list or the linked resource list.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeReference {
    pub enabled: u8,
    pub dependent: u8,
    pub index: i32,
}

impl NodeReference {
    pub fn new(index: i32) -> Self {
        Self {
            enabled: 1,
            dependent: 0,
            index,
        }
    }
}

/// An optional bone index stored as an `i32` where `0x7FFFFFFF` marks a transform without a bone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoneIndex(pub Option<i32>);

impl BoneIndex {
    const NONE: i32 = 0x7fffffff;
}

impl BinRead for BoneIndex {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let value = i32::read_options(reader, endian, ())?;
        Ok(Self((value != Self::NONE).then_some(value)))
    }
}

impl SgWrite for BoneIndex {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.unwrap_or(Self::NONE).sg_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        4
    }
}

/// The type of a [Node] and its 4-byte type id in the resource file header.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Resource,
    Transform,
    ShapeRef,
    DataListExtension,
    BoneDataExtension,
    LightRef,
    ViewerRef,
    ViewerRefRecursive,
    GeometryNode,
    GeometryDataContainer,
    MaterialDefinition,
}

impl NodeType {
    /// All node types in registry order.
    pub const ALL: [NodeType; 11] = [
        NodeType::Resource,
        NodeType::Transform,
        NodeType::ShapeRef,
        NodeType::DataListExtension,
        NodeType::BoneDataExtension,
        NodeType::LightRef,
        NodeType::ViewerRef,
        NodeType::ViewerRefRecursive,
        NodeType::GeometryNode,
        NodeType::GeometryDataContainer,
        NodeType::MaterialDefinition,
    ];

    /// The type id written to the resource file header.
    pub fn type_id(self) -> [u8; 4] {
        match self {
            NodeType::Resource => [0x33, 0xc9, 0x19, 0xe5],
            NodeType::Transform => [0x62, 0x64, 0x24, 0x65],
            NodeType::ShapeRef => [0x17, 0x55, 0x24, 0x65],
            NodeType::DataListExtension => [0x56, 0x6d, 0x83, 0x6a],
            NodeType::BoneDataExtension => [0xc5, 0x5b, 0x07, 0xe9],
            NodeType::LightRef => [0x18, 0x20, 0x3d, 0x25],
            NodeType::ViewerRef => [0xbb, 0x6d, 0xa7, 0xdc],
            NodeType::ViewerRefRecursive => [0x8e, 0x2b, 0x15, 0x0c],
            NodeType::GeometryNode => [0x8c, 0x83, 0xa3, 0x7b],
            NodeType::GeometryDataContainer => [0x87, 0x86, 0x4f, 0xac],
            NodeType::MaterialDefinition => [0x78, 0x69, 0x59, 0x49],
        }
    }

    /// Finds the node type for a type id from the resource file header.
    /**
    ```rust
    # use sgres_lib::NodeType;
    assert_eq!(Some(NodeType::Resource), NodeType::from_type_id([0x33, 0xc9, 0x19, 0xe5]));
    assert_eq!(None, NodeType::from_type_id([0, 0, 0, 0]));
    ```
    */
    pub fn from_type_id(type_id: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.type_id() == type_id)
    }

    /// The class name stored in the node's signature.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Resource => "cResourceNode",
            NodeType::Transform => "cTransformNode",
            NodeType::ShapeRef => "cShapeRefNode",
            NodeType::DataListExtension => "cDataListExtension",
            NodeType::BoneDataExtension => "cBoneDataExtension",
            NodeType::LightRef => "cLightRefNode",
            NodeType::ViewerRef => "cViewerRefNode",
            NodeType::ViewerRefRecursive => "cViewerRefNodeRecursive",
            NodeType::GeometryNode => "cGeometryNode",
            NodeType::GeometryDataContainer => "cGeometryDataContainer",
            NodeType::MaterialDefinition => "cMaterialDefinition",
        }
    }

    /// Returns `true` if nodes of this type carry a [TransformNode] and can be part of a transform tree.
    pub fn has_transform(self) -> bool {
        matches!(
            self,
            NodeType::Transform
                | NodeType::ShapeRef
                | NodeType::LightRef
                | NodeType::ViewerRef
                | NodeType::ViewerRefRecursive
        )
    }
}

/// A node in a resource file.
///
/// The node type is not stored with the body, so reading requires the [NodeType] from the file header.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, SgWrite)]
pub enum Node {
    Resource(ResourceNode),
    Transform(TransformNode),
    ShapeRef(ShapeRefNode),
    DataListExtension(DataListExtension),
    BoneDataExtension(BoneDataExtension),
    LightRef(LightRefNode),
    ViewerRef(ViewerRefNode),
    ViewerRefRecursive(ViewerRefNodeRecursive),
    GeometryNode(GeometryNode),
    GeometryDataContainer(GeometryDataContainer),
    MaterialDefinition(MaterialDefinition),
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Resource(_) => NodeType::Resource,
            Node::Transform(_) => NodeType::Transform,
            Node::ShapeRef(_) => NodeType::ShapeRef,
            Node::DataListExtension(_) => NodeType::DataListExtension,
            Node::BoneDataExtension(_) => NodeType::BoneDataExtension,
            Node::LightRef(_) => NodeType::LightRef,
            Node::ViewerRef(_) => NodeType::ViewerRef,
            Node::ViewerRefRecursive(_) => NodeType::ViewerRefRecursive,
            Node::GeometryNode(_) => NodeType::GeometryNode,
            Node::GeometryDataContainer(_) => NodeType::GeometryDataContainer,
            Node::MaterialDefinition(_) => NodeType::MaterialDefinition,
        }
    }

    /// The version of the node's layout.
    /// Most node types only have a single version that is part of their signature.
    pub fn version(&self) -> i32 {
        match self {
            Node::Resource(_) => 0x07,
            Node::Transform(_) => 0x07,
            Node::ShapeRef(n) => n.version,
            Node::DataListExtension(_) => 0x01,
            Node::BoneDataExtension(n) => n.version,
            Node::LightRef(_) => 0x0a,
            Node::ViewerRef(n) => n.version,
            Node::ViewerRefRecursive(_) => 0x01,
            Node::GeometryNode(_) => 0x0c,
            Node::GeometryDataContainer(_) => 0x04,
            Node::MaterialDefinition(_) => 0x0b,
        }
    }

    /// The transform for nodes that are part of the transform tree.
    pub fn transform(&self) -> Option<&TransformNode> {
        match self {
            Node::Transform(n) => Some(n),
            Node::ShapeRef(n) => Some(n.renderable.transform()),
            Node::LightRef(n) => Some(n.renderable.transform()),
            Node::ViewerRef(n) => Some(n.base.renderable.transform()),
            Node::ViewerRefRecursive(n) => Some(n.base.renderable.transform()),
            _ => None,
        }
    }

    /// The child references for nodes that contain a [CompositionTreeNode].
    pub fn child_nodes(&self) -> Option<&[NodeReference]> {
        match self {
            Node::Resource(n) => Some(&n.composition.children.elements),
            _ => self
                .transform()
                .map(|t| t.composition.children.elements.as_slice()),
        }
    }

    /// The name of the [SgResource] for node types that have one.
    pub fn resource_name(&self) -> Option<&crate::SgString> {
        match self {
            Node::Resource(n) => Some(&n.resource.name),
            Node::GeometryNode(n) => Some(&n.resource.name),
            Node::GeometryDataContainer(n) => Some(&n.resource.name),
            Node::MaterialDefinition(n) => Some(&n.resource.name),
            _ => None,
        }
    }
}

impl BinRead for Node {
    type Args<'a> = NodeType;

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        node_type: Self::Args<'_>,
    ) -> BinResult<Self> {
        match node_type {
            NodeType::Resource => ResourceNode::read_options(reader, endian, ()).map(Node::Resource),
            NodeType::Transform => {
                TransformNode::read_options(reader, endian, ()).map(Node::Transform)
            }
            NodeType::ShapeRef => ShapeRefNode::read_options(reader, endian, ()).map(Node::ShapeRef),
            NodeType::DataListExtension => {
                DataListExtension::read_options(reader, endian, ()).map(Node::DataListExtension)
            }
            NodeType::BoneDataExtension => {
                BoneDataExtension::read_options(reader, endian, ()).map(Node::BoneDataExtension)
            }
            NodeType::LightRef => LightRefNode::read_options(reader, endian, ()).map(Node::LightRef),
            NodeType::ViewerRef => {
                ViewerRefNode::read_options(reader, endian, ()).map(Node::ViewerRef)
            }
            NodeType::ViewerRefRecursive => {
                ViewerRefNodeRecursive::read_options(reader, endian, ()).map(Node::ViewerRefRecursive)
            }
            NodeType::GeometryNode => {
                GeometryNode::read_options(reader, endian, ()).map(Node::GeometryNode)
            }
            NodeType::GeometryDataContainer => {
                GeometryDataContainer::read_options(reader, endian, ())
                    .map(Node::GeometryDataContainer)
            }
            NodeType::MaterialDefinition => {
                MaterialDefinition::read_options(reader, endian, ()).map(Node::MaterialDefinition)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_bytes;
    use binrw::io::Cursor;
    use binrw::BinReaderExt;

    #[test]
    fn type_ids_are_unique() {
        for a in NodeType::ALL {
            assert_eq!(Some(a), NodeType::from_type_id(a.type_id()));
        }
    }

    #[test]
    fn type_id_matches_signature() {
        // Signatures that include the type id store it right after the name.
        let bytes = crate::signatures::ResourceNodeSignature::BYTES;
        assert_eq!(&NodeType::Resource.type_id(), &bytes[14..18]);

        let bytes = crate::signatures::MaterialDefinitionSignature::BYTES;
        assert_eq!(&NodeType::MaterialDefinition.type_id(), &bytes[20..24]);
    }

    #[test]
    fn read_bone_index() {
        let mut reader = Cursor::new(hex_bytes("ffffff7f 05000000"));
        assert_eq!(BoneIndex(None), reader.read_le::<BoneIndex>().unwrap());
        assert_eq!(BoneIndex(Some(5)), reader.read_le::<BoneIndex>().unwrap());
    }

    #[test]
    fn write_bone_index() {
        assert_eq!(hex_bytes("ffffff7f"), BoneIndex(None).to_bytes().unwrap());
        assert_eq!(hex_bytes("03000000"), BoneIndex(Some(3)).to_bytes().unwrap());
    }

    #[test]
    fn read_node_reference() {
        let mut reader = Cursor::new(hex_bytes("01 00 02000000"));
        assert_eq!(
            NodeReference {
                enabled: 1,
                dependent: 0,
                index: 2
            },
            reader.read_le::<NodeReference>().unwrap()
        );
    }
}
