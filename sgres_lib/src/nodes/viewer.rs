use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::RenderableNode;
use crate::signatures::{
    ViewerRefNodeBaseSignature, ViewerRefNodeRecursiveSignature, ViewerRefNodeSignature,
};
use crate::SgString;

/// The renderable data shared by [ViewerRefNode] and [ViewerRefNodeRecursive].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct ViewerRefNodeBase {
    pub signature: ViewerRefNodeBaseSignature,
    pub renderable: RenderableNode,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct ViewerRefNode {
    pub signature: ViewerRefNodeSignature,
    pub version: i32,
    pub base: ViewerRefNodeBase,
    /// `0x9C` bytes for version `0x0E` and later and `0x9B` bytes otherwise.
    #[br(count = ViewerRefNode::data_len(version))]
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data: Vec<u8>,
}

impl ViewerRefNode {
    pub fn data_len(version: i32) -> usize {
        if version >= 0x0e {
            0x9c
        } else {
            0x9b
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct ViewerRefNodeRecursive {
    pub signature: ViewerRefNodeRecursiveSignature,
    pub base: ViewerRefNodeBase,
    pub unk1: u8,
    pub name: SgString,
    /// Always `0x40` bytes.
    #[br(count = 0x40)]
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data: Vec<u8>,
}
