use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{NodeReference, RenderableNode};
use crate::signatures::ShapeRefNodeSignature;
use crate::{read_elements, SgArray, SgString};

/// A renderable reference to shapes stored in linked resources.
///
/// Versions `0x14` and `0x15` are known.
/// Version `0x15` and later also store a name for each morph entry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(SgWrite, Debug, Clone, PartialEq)]
pub struct ShapeRefNode {
    pub signature: ShapeRefNodeSignature,
    pub version: i32,
    pub renderable: RenderableNode,
    /// References to the shapes in the linked resource list.
    pub shapes: SgArray<NodeReference>,
    pub unk1: [u8; 4],
    pub morph_data: SgArray<[u8; 4]>,
    /// One name for each element of `morph_data` for version `0x15` and later.
    pub morph_names: Option<Vec<SgString>>,
    pub unk2: [u8; 8],
}

impl ShapeRefNode {
    pub(crate) fn has_morph_names(version: i32) -> bool {
        version >= 0x15
    }
}

impl BinRead for ShapeRefNode {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let signature = ShapeRefNodeSignature::read_options(reader, endian, ())?;
        let version = i32::read_options(reader, endian, ())?;
        if !matches!(version, 0x14 | 0x15) {
            tracing::warn!(version, "unknown cShapeRefNode version");
        }
        let renderable = RenderableNode::read_options(reader, endian, ())?;
        let shapes = SgArray::read_options(reader, endian, ())?;
        let unk1 = <[u8; 4]>::read_options(reader, endian, ())?;
        let morph_data = SgArray::<[u8; 4]>::read_options(reader, endian, ())?;
        let morph_names = if Self::has_morph_names(version) {
            Some(read_elements(reader, endian, morph_data.len())?)
        } else {
            None
        };
        let unk2 = <[u8; 8]>::read_options(reader, endian, ())?;

        Ok(Self {
            signature,
            version,
            renderable,
            shapes,
            unk1,
            morph_data,
            morph_names,
            unk2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_bytes;
    use binrw::io::Cursor;
    use binrw::BinReaderExt;
    use pretty_assertions::assert_eq;

    fn renderable_hex() -> String {
        "0f 6352656e64657261626c654e6f6465 00000000 05000000
         0c 63426f756e6465644e6f6465 00000000 05000000
         0e 635472616e73666f726d4e6f6465 62642465 07000000
         14 63436f6d706f736974696f6e547265654e6f6465 00000000 0b000000
         10 634f626a65637447726170684e6f6465 00000000 04000000 00000000 05 7368617065
         00000000
         00000000 00000000 00000000
         00000000 00000000 00000000 0000803f
         ffffff7f
         0100 01000000 08 5072616374696365
         0000000000"
            .to_string()
    }

    fn shape_ref_hex(version: &str, names: &str) -> String {
        format!(
            "0d 6353686170655265664e6f6465 17552465 {version}
             {}
             01000000 01 01 00000000
             01000000
             02000000 00000000 01000000
             {names}
             00000000 ffffffff",
            renderable_hex()
        )
    }

    #[test]
    fn read_write_shape_ref_v14() {
        let bytes = hex_bytes(&shape_ref_hex("14000000", ""));
        let mut reader = Cursor::new(&bytes);
        let value = reader.read_le::<ShapeRefNode>().unwrap();

        assert_eq!(0x14, value.version);
        assert_eq!(Some("shape"), value.renderable.transform().name().to_str());
        assert_eq!(
            vec![SgString::from("Practice")],
            value.renderable.render_groups.elements
        );
        assert_eq!(1, value.shapes.len());
        assert_eq!(vec![[0u8; 4], [1, 0, 0, 0]], value.morph_data.elements);
        assert_eq!(None, value.morph_names);
        assert_eq!(bytes.len() as u64, reader.position());

        crate::assert_hex_eq!(&bytes, &value.to_bytes().unwrap());
    }

    #[test]
    fn read_write_shape_ref_v15_morph_names() {
        let bytes = hex_bytes(&shape_ref_hex("15000000", "04 62617365 03 666174"));
        let mut reader = Cursor::new(&bytes);
        let value = reader.read_le::<ShapeRefNode>().unwrap();

        assert_eq!(0x15, value.version);
        assert_eq!(
            Some(vec![SgString::from("base"), SgString::from("fat")]),
            value.morph_names
        );
        assert_eq!(bytes.len() as u64, reader.position());

        crate::assert_hex_eq!(&bytes, &value.to_bytes().unwrap());
    }
}
