#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The attribute stored in a geometry section identified by its four byte magic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `V`
    Vertices,
    /// `N`
    Normals,
    /// `T` with up to 2 layers.
    TexCoords,
    /// `B`
    BoneIndices,
    /// `W`
    BoneWeights,
    /// `X`
    Tangents,
    /// `dV` with one section per key slot.
    DiffVerts,
    /// `dN` with one section per key slot.
    DiffNorms,
    /// `K`
    DiffKeys,
    /// `M`
    DeformMask,
    /// An auxiliary section that is read and discarded.
    Aux7C4DEE82,
    /// An auxiliary section that is read and discarded.
    Aux5C4AFC5C,
    /// An auxiliary section that is read and discarded.
    Aux1C4AFC56,
}

impl SectionKind {
    pub const ALL: [SectionKind; 13] = [
        SectionKind::Vertices,
        SectionKind::Normals,
        SectionKind::TexCoords,
        SectionKind::BoneIndices,
        SectionKind::BoneWeights,
        SectionKind::Tangents,
        SectionKind::DiffVerts,
        SectionKind::DiffNorms,
        SectionKind::DiffKeys,
        SectionKind::DeformMask,
        SectionKind::Aux7C4DEE82,
        SectionKind::Aux5C4AFC5C,
        SectionKind::Aux1C4AFC56,
    ];

    /// The magic bytes in file order.
    pub fn magic(self) -> [u8; 4] {
        let value: u32 = match self {
            SectionKind::Vertices => 0x5B830781,
            SectionKind::Normals => 0x3B83078B,
            SectionKind::TexCoords => 0xBB8307AB,
            SectionKind::BoneIndices => 0xFBD70111,
            SectionKind::BoneWeights => 0x3BD70105,
            SectionKind::Tangents => 0x89D92BA0,
            SectionKind::DiffVerts => 0x5CF2CFE1,
            SectionKind::DiffNorms => 0xCB6F3A6A,
            SectionKind::DiffKeys => 0xDCF2CFDC,
            SectionKind::DeformMask => 0xDB830795,
            SectionKind::Aux7C4DEE82 => 0x7C4DEE82,
            SectionKind::Aux5C4AFC5C => 0x5C4AFC5C,
            SectionKind::Aux1C4AFC56 => 0x1C4AFC56,
        };
        value.to_le_bytes()
    }

    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.magic() == magic)
    }

    /// The short name used when printing geometry.
    pub fn letter(self) -> char {
        match self {
            SectionKind::Vertices => 'V',
            SectionKind::Normals => 'N',
            SectionKind::TexCoords => 'T',
            SectionKind::BoneIndices => 'B',
            SectionKind::BoneWeights => 'W',
            SectionKind::Tangents => 'X',
            SectionKind::DiffVerts => 'v',
            SectionKind::DiffNorms => 'n',
            SectionKind::DiffKeys => 'K',
            SectionKind::DeformMask => 'M',
            SectionKind::Aux7C4DEE82 | SectionKind::Aux5C4AFC5C | SectionKind::Aux1C4AFC56 => '?',
        }
    }

    /// Sections that are never assigned to a data group.
    pub fn is_auxiliary(self) -> bool {
        matches!(
            self,
            SectionKind::Aux7C4DEE82 | SectionKind::Aux5C4AFC5C | SectionKind::Aux1C4AFC56
        )
    }

    /// Kinds with one slot for each sub index from 0 to 3.
    pub fn is_multi_slot(self) -> bool {
        matches!(
            self,
            SectionKind::TexCoords | SectionKind::DiffVerts | SectionKind::DiffNorms
        )
    }

    /// Kinds stored as 4 bytes per element instead of floats.
    pub fn is_byte_data(self) -> bool {
        matches!(
            self,
            SectionKind::BoneIndices | SectionKind::DiffKeys | SectionKind::DeformMask
        )
    }

    /// Returns `true` if a float section of this kind may have `components` per element.
    pub fn accepts_components(self, components: i64) -> bool {
        match self {
            SectionKind::Vertices
            | SectionKind::Normals
            | SectionKind::DiffVerts
            | SectionKind::DiffNorms => components == 3,
            SectionKind::TexCoords => components == 2,
            SectionKind::Tangents => (2..=4).contains(&components),
            SectionKind::BoneWeights
            | SectionKind::Aux7C4DEE82
            | SectionKind::Aux5C4AFC5C
            | SectionKind::Aux1C4AFC56 => (1..=4).contains(&components),
            SectionKind::BoneIndices | SectionKind::DiffKeys | SectionKind::DeformMask => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(Some(kind), SectionKind::from_magic(kind.magic()));
        }
        assert_eq!(None, SectionKind::from_magic([0; 4]));
    }

    #[test]
    fn vertices_magic_file_order() {
        assert_eq!([0x81, 0x07, 0x83, 0x5B], SectionKind::Vertices.magic());
    }
}
