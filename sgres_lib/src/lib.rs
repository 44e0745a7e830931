//! # sgres_lib
//!
//! sgres_lib is a library for reading and writing the scene graph resource (cRES) files used by
//! The Sims 2 to store geometry, skeletons, lights, viewer references and materials.
//!
//! The structs and types in [nodes] fully represent the binary data contained in the file.
//! This ensures the binary output of reading and writing a file without any modifications is identical to the original.
//! Every fixed signature such as `0D cResourceNode 33C919E5 07000000 01` is its own type,
//! so reading fails with [FormatError::HeaderMismatch] as soon as the stream does not match.
//!
//! The geometry data stored in a [nodes::GeometryDataContainer] is a second, independent binary
//! format. It is decoded into the column based [GeometryData] instead of the raw section list.
//!
//! ## Derive Macros
//! Most reading and writing code is generated from the struct definitions.
//! [binrw](https://crates.io/crates/binrw) generates the parsing code and [sgres_write] generates the exporting code.
//!
//! ## Example
/*!
```rust no_run
# fn main() -> Result<(), sgres_lib::Error> {
let file = sgres_lib::ResourceFile::from_file("object.5gd")?;
for (i, node) in file.nodes.iter().enumerate() {
    println!("{i}: {:?}", node.node_type());
}
file.write_to_file("object_out.5gd")?;
# Ok(())
# }
```
 */
pub mod arrays;
pub mod geometry;
pub mod nodes;
pub mod resource;
pub mod signatures;
pub mod strings;
pub mod vectors;

mod dump;

pub use arrays::SgArray;
pub use geometry::{
    BoundingMesh, DataGroup, GeometryData, IndexGroup, InverseTransform, MorphName, SectionKind,
    Tuple4, VectorData,
};
pub use nodes::{Node, NodeType};
pub use resource::{LinkedResource, ResourceFile};
pub use strings::SgString;
pub use vectors::{Vector3, Vector4};

pub use sgres_write::SgWrite;

use binrw::io::{Read, Seek, SeekFrom};
use binrw::{BinRead, BinResult, Endian};
use std::path::Path;

/// Reads the resource file from `path`.
/// This is equivalent to [ResourceFile::from_file].
pub fn load<P: AsRef<Path>>(path: P) -> Result<ResourceFile, Error> {
    ResourceFile::from_file(path)
}

/// Writes `file` to `path`.
/// This is equivalent to [ResourceFile::write_to_file].
pub fn save<P: AsRef<Path>>(path: P, file: &ResourceFile) -> Result<(), Error> {
    file.write_to_file(path)
}

/// A structural violation of the resource or geometry format.
///
/// Reading never recovers from these errors since the stream position is no longer meaningful.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error(
        "expected signature {} at offset {offset:#x} but found {}",
        hex_string(expected),
        hex_string(found)
    )]
    HeaderMismatch {
        offset: u64,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("unknown node type {} at offset {offset:#x}", hex_string(type_id))]
    UnknownNodeType { offset: u64, type_id: [u8; 4] },

    #[error("index group {index_group} has unsupported primitive type {primitive_type}")]
    UnsupportedPrimitiveType {
        index_group: usize,
        primitive_type: i32,
    },

    #[error("data group {data_group} has bone indices but no bone weights")]
    InvalidRiggingData { data_group: usize },

    #[error(
        "data group {data_group} has invalid morph state: diff verts {dverts:04b}, diff norms {dnorms:04b}, keys present: {has_keys}"
    )]
    InvalidMorphState {
        data_group: usize,
        dverts: u8,
        dnorms: u8,
        has_keys: bool,
    },

    #[error("section {section} ({kind:?}) is assigned to an already populated field of data group {data_group}")]
    DuplicateSectionAssignment {
        data_group: usize,
        section: usize,
        kind: SectionKind,
    },

    #[error("stream ended before offset {offset:#x} could be read")]
    TruncatedStream { offset: u64 },

    #[error("section {section} has unknown kind {}", hex_string(magic))]
    UnknownSectionKind { section: usize, magic: [u8; 4] },

    #[error("section {section} ({kind:?}) has invalid sub index {sub_index}")]
    InvalidSubIndex {
        section: usize,
        kind: SectionKind,
        sub_index: i32,
    },

    #[error("section {section} ({kind:?}) has invalid data type {type_of_data}")]
    InvalidComponentCount {
        section: usize,
        kind: SectionKind,
        type_of_data: i32,
    },

    #[error("section {section} with {count} elements has invalid byte length {byte_len}")]
    InvalidSectionSize {
        section: usize,
        count: i32,
        byte_len: i32,
    },

    #[error("section {section} ({kind:?}) has {count} unexpected indices")]
    UnexpectedSectionIndices {
        section: usize,
        kind: SectionKind,
        count: i32,
    },

    #[error("data group {data_group} references section {section} but there are only {section_count} sections")]
    InvalidSectionIndex {
        data_group: usize,
        section: u16,
        section_count: usize,
    },

    #[error("data group {data_group} has section counts {first} and {second}")]
    SectionCountMismatch {
        data_group: usize,
        first: i32,
        second: i32,
    },

    #[error("data group {data_group} index mapping references element {index} of {len}")]
    InvalidIndexMapping {
        data_group: usize,
        index: u16,
        len: usize,
    },

    #[error("data group {data_group} has index mappings but also bones or morph keys")]
    IndexMappingWithSkinning { data_group: usize },

    #[error("index count {count} at offset {offset:#x} is not a multiple of 3")]
    InvalidIndexCount { offset: u64, count: i32 },

    #[error("index group {index_group} references data group {data_group} but there are only {group_count} data groups")]
    InvalidDataGroupIndex {
        index_group: usize,
        data_group: i32,
        group_count: usize,
    },

    #[error("unknown data list value type {value_type:#04x} at offset {offset:#x}")]
    UnknownDataListType { offset: u64, value_type: u8 },

    #[error("string of {len} bytes exceeds the maximum length of 255 bytes")]
    StringTooLong { len: usize },

    #[error("invalid count {count} at offset {offset:#x}")]
    InvalidCount { offset: u64, count: i32 },

    #[error("{count} elements do not fit in the count field")]
    CountOverflow { count: usize },
}

/// Errors while reading or writing resource files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(std::io::Error),

    #[error(transparent)]
    BinRead(binrw::Error),
}

impl Error {
    /// Recovers the [FormatError] or end of stream condition from a failed read.
    pub(crate) fn from_binrw(error: binrw::Error, offset: u64) -> Self {
        let root = error.root_cause();
        if let Some(format) = root.custom_err::<FormatError>() {
            return Self::Format(format.clone());
        }
        if root.is_eof() {
            return Self::Format(FormatError::TruncatedStream { offset });
        }
        match error {
            binrw::Error::Io(e) => Self::Io(e),
            e => Self::BinRead(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        // Write errors carry the FormatError through the io::Error.
        match e.get_ref().and_then(|inner| inner.downcast_ref::<FormatError>()) {
            Some(format) => Self::Format(format.clone()),
            None => Self::Io(e),
        }
    }
}

pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn format_error(offset: u64, error: FormatError) -> binrw::Error {
    binrw::Error::Custom {
        pos: offset,
        err: Box::new(error),
    }
}

/// Wraps `error` so it can be returned from [SgWrite::sg_write].
pub(crate) fn write_error(error: FormatError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, error)
}

/// Converts a length to the `i32` used for counts on disk.
pub(crate) fn count_i32(len: usize) -> std::io::Result<i32> {
    i32::try_from(len).map_err(|_| write_error(FormatError::CountOverflow { count: len }))
}

/// Converts an index to the `u16` used for indices on disk.
pub(crate) fn index_u16(index: usize) -> std::io::Result<u16> {
    u16::try_from(index).map_err(|_| write_error(FormatError::CountOverflow { count: index }))
}

/// Fails with [FormatError::TruncatedStream] if fewer than `len` bytes remain.
pub(crate) fn ensure_remaining<R: Read + Seek>(reader: &mut R, len: u64) -> BinResult<()> {
    let offset = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(offset))?;
    if end.saturating_sub(offset) < len {
        Err(format_error(offset, FormatError::TruncatedStream { offset }))
    } else {
        Ok(())
    }
}

/// Reads an `i32` count and checks that at least `element_size` bytes per element remain.
pub(crate) fn read_count<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    element_size: u64,
) -> BinResult<usize> {
    let offset = reader.stream_position()?;
    let count = i32::read_options(reader, endian, ())?;
    let count = usize::try_from(count)
        .map_err(|_| format_error(offset, FormatError::InvalidCount { offset, count }))?;
    ensure_remaining(reader, count as u64 * element_size)?;
    Ok(count)
}

/// Reads `count` elements after the count has already been checked against the stream length.
pub(crate) fn read_elements<R, T>(reader: &mut R, endian: Endian, count: usize) -> BinResult<Vec<T>>
where
    R: Read + Seek,
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(T::read_options(reader, endian, ())?);
    }
    Ok(elements)
}

#[cfg(test)]
pub(crate) fn group_hex(a: &str, words_per_line: usize) -> String {
    use std::fmt::Write;

    let chars: Vec<_> = a.chars().collect();
    let mut s = String::new();
    for (i, chunk) in chars.chunks(words_per_line * 8).enumerate() {
        let line: Vec<String> = chunk.chunks(8).map(|c| c.iter().collect()).collect();
        writeln!(&mut s, "{:04}: {}", i * words_per_line * 4, line.join(" ")).unwrap();
    }
    s
}

#[cfg(test)]
macro_rules! assert_hex_eq {
    ($a:expr, $b:expr) => {
        assert!(
            $a == $b,
            "\n{} !=\n{}",
            crate::group_hex(&hex::encode($a), 8),
            crate::group_hex(&hex::encode($b), 8)
        )
    };
}

#[cfg(test)]
pub(crate) use assert_hex_eq;

#[cfg(test)]
pub(crate) fn hex_bytes(hex: &str) -> Vec<u8> {
    // Remove any whitespace used to make the tests more readable.
    let no_whitespace: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(no_whitespace).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn read_count_negative() {
        let mut reader = Cursor::new(hex_bytes("ffffffff"));
        let error = read_count(&mut reader, Endian::Little, 1).unwrap_err();
        assert_eq!(
            Some(&FormatError::InvalidCount {
                offset: 0,
                count: -1
            }),
            error.custom_err::<FormatError>()
        );
    }

    #[test]
    fn read_count_exceeds_stream() {
        let mut reader = Cursor::new(hex_bytes("03000000 0000"));
        let error = read_count(&mut reader, Endian::Little, 2).unwrap_err();
        assert_eq!(
            Some(&FormatError::TruncatedStream { offset: 4 }),
            error.custom_err::<FormatError>()
        );
    }

    #[test]
    fn read_count_fits_stream() {
        let mut reader = Cursor::new(hex_bytes("03000000 000000000000"));
        assert_eq!(3, read_count(&mut reader, Endian::Little, 2).unwrap());
        assert_eq!(4, reader.position());
    }

    #[test]
    fn error_from_custom_binrw_error() {
        let error = format_error(12, FormatError::StringTooLong { len: 300 });
        assert!(matches!(
            Error::from_binrw(error, 0),
            Error::Format(FormatError::StringTooLong { len: 300 })
        ));
    }

    #[test]
    fn error_from_eof() {
        let mut reader = Cursor::new(hex_bytes("0100"));
        let error = u32::read_le(&mut reader).unwrap_err();
        assert!(matches!(
            Error::from_binrw(error, 2),
            Error::Format(FormatError::TruncatedStream { offset: 2 })
        ));
    }

    #[test]
    fn error_from_write_error() {
        let error = write_error(FormatError::CountOverflow { count: 70000 });
        assert!(matches!(
            Error::from(error),
            Error::Format(FormatError::CountOverflow { count: 70000 })
        ));
    }

    #[test]
    fn header_mismatch_message() {
        let error = FormatError::HeaderMismatch {
            offset: 16,
            expected: vec![1, 0, 0xff, 0xff],
            found: vec![1, 2, 3, 4],
        };
        assert_eq!(
            "expected signature 01 00 FF FF at offset 0x10 but found 01 02 03 04",
            error.to_string()
        );
    }
}
