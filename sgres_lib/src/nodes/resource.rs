use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{CompositionTreeNode, NodeReference, ObjectGraphNode, SgResource};
use crate::signatures::{
    CompositionTreeNodeSignature, ObjectGraphNodeSignature, ResourceNodeSignature,
};
use crate::{SgArray, SgString};

/// The root node of a scene graph.
/// The children of the composition tree are the top level nodes of the transform tree.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub signature: ResourceNodeSignature,
    pub resource: SgResource,
    pub composition: CompositionTreeNode,
    pub unk1: [u8; 5],
}

impl ResourceNode {
    /// Creates a resource node with the given top level `children`.
    pub fn new(name: SgString, children: Vec<NodeReference>) -> Self {
        Self {
            signature: ResourceNodeSignature,
            resource: SgResource::new(name),
            composition: CompositionTreeNode {
                signature: CompositionTreeNodeSignature,
                object_graph: ObjectGraphNode {
                    signature: ObjectGraphNodeSignature,
                    extensions: SgArray::new(),
                    name: SgString::default(),
                },
                children: children.into(),
            },
            unk1: [0; 5],
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
    fn read_write_resource_node() {
        let bytes = hex_bytes(
            "0d 635265736f757263654e6f6465 33c919e5 07000000 01
             0b 6353475265736f75726365 00000000 02000000 04 73686f65
             14 63436f6d706f736974696f6e547265654e6f6465 00000000 0b000000
             10 634f626a65637447726170684e6f6465 00000000 04000000 00000000 00
             01000000 01 00 01000000
             0000000000",
        );
        let mut reader = Cursor::new(&bytes);
        let value = reader.read_le::<ResourceNode>().unwrap();

        assert_eq!(Some("shoe"), value.resource.name.to_str());
        assert_eq!(
            vec![NodeReference::new(1)],
            value.composition.children.elements
        );
        assert_eq!(bytes.len() as u64, reader.position());

        crate::assert_hex_eq!(&bytes, &value.to_bytes().unwrap());
        assert_eq!(
            value,
            ResourceNode::new("shoe".into(), vec![NodeReference::new(1)])
        );
    }
}
