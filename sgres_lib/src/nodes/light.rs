use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{NodeReference, RenderableNode};
use crate::signatures::LightRefNodeSignature;

/// A renderable reference to a light stored in a linked resource.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct LightRefNode {
    pub signature: LightRefNodeSignature,
    pub renderable: RenderableNode,
    /// The light in the linked resource list.
    pub light: NodeReference,
    pub unk1: [u8; 2],
}
