//! Fixed byte sequences that start every node and sub-structure.
//!
//! A signature is a length prefixed type name followed by a type id and often a version.
//! The signature types have no fields and read or write exactly [BYTES](ResourceNodeSignature::BYTES).
use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{format_error, FormatError};

/// Reads `expected.len()` bytes and fails with [FormatError::HeaderMismatch] if they differ.
pub(crate) fn read_signature<R: Read + Seek>(reader: &mut R, expected: &[u8]) -> BinResult<()> {
    let offset = reader.stream_position()?;
    let mut found = Vec::with_capacity(expected.len());
    reader
        .by_ref()
        .take(expected.len() as u64)
        .read_to_end(&mut found)?;

    if found.len() < expected.len() {
        Err(format_error(offset, FormatError::TruncatedStream { offset }))
    } else if found != expected {
        Err(format_error(
            offset,
            FormatError::HeaderMismatch {
                offset,
                expected: expected.to_vec(),
                found,
            },
        ))
    } else {
        Ok(())
    }
}

macro_rules! signature {
    ($(#[$attr:meta])* $name:ident, $bytes:literal) => {
        $(#[$attr])*
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl $name {
            pub const BYTES: &'static [u8] = $bytes;
        }

        impl BinRead for $name {
            type Args<'a> = ();

            fn read_options<R: Read + Seek>(
                reader: &mut R,
                _endian: Endian,
                _args: Self::Args<'_>,
            ) -> BinResult<Self> {
                read_signature(reader, Self::BYTES).map(|_| Self)
            }
        }

        impl SgWrite for $name {
            fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
                writer.write_all(Self::BYTES)
            }

            fn size_in_bytes(&self) -> u64 {
                Self::BYTES.len() as u64
            }
        }
    };
}

signature!(
    /// The file magic `01 00 FF FF`.
    FileSignature,
    b"\x01\x00\xff\xff"
);

signature!(SgResourceSignature, b"\x0bcSGResource\x00\x00\x00\x00\x02\x00\x00\x00");

signature!(
    CompositionTreeNodeSignature,
    b"\x14cCompositionTreeNode\x00\x00\x00\x00\x0b\x00\x00\x00"
);

signature!(
    ObjectGraphNodeSignature,
    b"\x10cObjectGraphNode\x00\x00\x00\x00\x04\x00\x00\x00"
);

signature!(
    RenderableNodeSignature,
    b"\x0fcRenderableNode\x00\x00\x00\x00\x05\x00\x00\x00"
);

signature!(
    BoundedNodeSignature,
    b"\x0ccBoundedNode\x00\x00\x00\x00\x05\x00\x00\x00"
);

signature!(
    /// Unlike the other sub-structures, the transform signature includes the node type id.
    TransformNodeSignature,
    b"\x0ecTransformNode\x62\x64\x24\x65\x07\x00\x00\x00"
);

signature!(
    ExtensionSignature,
    b"\x0acExtension\x00\x00\x00\x00\x03\x00\x00\x00"
);

signature!(
    /// The resource node signature ends with an extra `01` byte after the version.
    ResourceNodeSignature,
    b"\x0dcResourceNode\x33\xc9\x19\xe5\x07\x00\x00\x00\x01"
);

signature!(
    /// The version follows separately.
    ShapeRefNodeSignature,
    b"\x0dcShapeRefNode\x17\x55\x24\x65"
);

signature!(
    DataListExtensionSignature,
    b"\x12cDataListExtension\x56\x6d\x83\x6a\x01\x00\x00\x00"
);

signature!(
    /// The version follows separately.
    BoneDataExtensionSignature,
    b"\x12cBoneDataExtension\xc5\x5b\x07\xe9"
);

signature!(
    LightRefNodeSignature,
    b"\x0dcLightRefNode\x18\x20\x3d\x25\x0a\x00\x00\x00"
);

signature!(
    ViewerRefNodeBaseSignature,
    b"\x12cViewerRefNodeBase\x00\x00\x00\x00\x05\x00\x00\x00"
);

signature!(
    /// The version follows separately.
    ViewerRefNodeSignature,
    b"\x0ecViewerRefNode\xbb\x6d\xa7\xdc"
);

signature!(
    ViewerRefNodeRecursiveSignature,
    b"\x17cViewerRefNodeRecursive\x8e\x2b\x15\x0c\x01\x00\x00\x00"
);

signature!(
    GeometryNodeSignature,
    b"\x0dcGeometryNode\x8c\x83\xa3\x7b\x0c\x00\x00\x00"
);

signature!(
    MaterialDefinitionSignature,
    b"\x13cMaterialDefinition\x78\x69\x59\x49\x0b\x00\x00\x00"
);

signature!(
    /// Only version 4 is supported, so the version is part of the signature.
    GeometryDataContainerSignature,
    b"\x16cGeometryDataContainer\x87\x86\x4f\xac\x04\x00\x00\x00"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_bytes;
    use binrw::io::Cursor;
    use binrw::BinReaderExt;
    use hexlit::hex;

    #[test]
    fn signature_lengths() {
        assert_eq!(20, SgResourceSignature::BYTES.len());
        assert_eq!(29, CompositionTreeNodeSignature::BYTES.len());
        assert_eq!(25, ObjectGraphNodeSignature::BYTES.len());
        assert_eq!(24, RenderableNodeSignature::BYTES.len());
        assert_eq!(21, BoundedNodeSignature::BYTES.len());
        assert_eq!(23, TransformNodeSignature::BYTES.len());
        assert_eq!(19, ExtensionSignature::BYTES.len());
        assert_eq!(23, ResourceNodeSignature::BYTES.len());
        assert_eq!(18, ShapeRefNodeSignature::BYTES.len());
        assert_eq!(27, DataListExtensionSignature::BYTES.len());
        assert_eq!(23, BoneDataExtensionSignature::BYTES.len());
        assert_eq!(22, LightRefNodeSignature::BYTES.len());
        assert_eq!(27, ViewerRefNodeBaseSignature::BYTES.len());
        assert_eq!(19, ViewerRefNodeSignature::BYTES.len());
        assert_eq!(32, ViewerRefNodeRecursiveSignature::BYTES.len());
        assert_eq!(22, GeometryNodeSignature::BYTES.len());
        assert_eq!(28, MaterialDefinitionSignature::BYTES.len());
        assert_eq!(31, GeometryDataContainerSignature::BYTES.len());
    }

    #[test]
    fn read_resource_node_signature() {
        let mut reader = Cursor::new(hex_bytes(
            "0d 635265736f757263654e6f6465 33c919e5 07000000 01",
        ));
        reader.read_le::<ResourceNodeSignature>().unwrap();
        assert_eq!(23, reader.position());
    }

    #[test]
    fn read_signature_mismatch() {
        let mut reader = Cursor::new(hex!("aabb 01 00 fe ff"));
        reader.set_position(2);
        let error = reader.read_le::<FileSignature>().unwrap_err();
        assert_eq!(
            Some(&FormatError::HeaderMismatch {
                offset: 2,
                expected: vec![0x01, 0x00, 0xff, 0xff],
                found: vec![0x01, 0x00, 0xfe, 0xff]
            }),
            error.custom_err::<FormatError>()
        );
    }

    #[test]
    fn read_signature_truncated() {
        let mut reader = Cursor::new(hex!("01 00"));
        let error = reader.read_le::<FileSignature>().unwrap_err();
        assert_eq!(
            Some(&FormatError::TruncatedStream { offset: 0 }),
            error.custom_err::<FormatError>()
        );
    }

    #[test]
    fn write_signature() {
        assert_eq!(
            hex!("0a 63457874656e73696f6e 00000000 03000000").to_vec(),
            ExtensionSignature.to_bytes().unwrap()
        );
    }
}
