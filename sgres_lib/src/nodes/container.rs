use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ObjectGraphNode, SgResource};
use crate::signatures::{GeometryDataContainerSignature, GeometryNodeSignature};
use crate::{GeometryData, SgString};

/// A reference from an object to its geometry resource.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct GeometryNode {
    pub signature: GeometryNodeSignature,
    pub object_graph: ObjectGraphNode,
    pub resource: SgResource,
    pub unk1: [u8; 7],
}

/// The mesh data for a geometry resource.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct GeometryDataContainer {
    pub signature: GeometryDataContainerSignature,
    pub resource: SgResource,
    pub geometry: GeometryData,
}

impl GeometryDataContainer {
    pub fn new(name: SgString, geometry: GeometryData) -> Self {
        Self {
            signature: GeometryDataContainerSignature,
            resource: SgResource::new(name),
            geometry,
        }
    }
}
