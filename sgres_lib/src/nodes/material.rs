use binrw::BinRead;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::SgResource;
use crate::signatures::MaterialDefinitionSignature;
use crate::{SgArray, SgString};

/// A named material with string properties such as texture names and shader parameters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct MaterialDefinition {
    pub signature: MaterialDefinitionSignature,
    pub resource: SgResource,
    pub name: SgString,
    pub material_type: SgString,
    pub properties: SgArray<MaterialProperty>,
    /// Names of the texture resources used by the material.
    pub references: SgArray<SgString>,
}

impl MaterialDefinition {
    /// Finds the value of the first property named `name`.
    pub fn property(&self, name: &str) -> Option<&SgString> {
        self.properties
            .iter()
            .find(|p| p.name.as_bytes() == name.as_bytes())
            .map(|p| &p.value)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct MaterialProperty {
    pub name: SgString,
    pub value: SgString,
}
