use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::signatures::{BoneDataExtensionSignature, DataListExtensionSignature, ExtensionSignature};
use crate::{
    count_i32, format_error, read_count, FormatError, SgString, Vector3, Vector4,
};

/// A tree of named, typed values such as object footprints.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct DataListExtension {
    pub signature: DataListExtensionSignature,
    pub extension: ExtensionSignature,
    pub entry: DataListEntry,
}

/// A named value stored as a type byte, the name, and then the value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DataListEntry {
    pub name: SgString,
    pub value: DataListValue,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum DataListValue {
    /// `0x02`
    Int(i32),
    /// `0x03`
    Float(f32),
    /// `0x05`
    Vector3(Vector3),
    /// `0x06`
    String(SgString),
    /// `0x07` stored as an `i32` count and the nested entries.
    List(Vec<DataListEntry>),
    /// `0x08`
    Vector4(Vector4),
    /// `0x09` stored as an `i32` byte count and the bytes.
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
}

impl DataListValue {
    /// The type byte written before the entry name.
    pub fn value_type(&self) -> u8 {
        match self {
            DataListValue::Int(_) => 0x02,
            DataListValue::Float(_) => 0x03,
            DataListValue::Vector3(_) => 0x05,
            DataListValue::String(_) => 0x06,
            DataListValue::List(_) => 0x07,
            DataListValue::Vector4(_) => 0x08,
            DataListValue::Bytes(_) => 0x09,
        }
    }
}

impl DataListEntry {
    pub fn new(name: SgString, value: DataListValue) -> Self {
        Self { name, value }
    }

    /// Finds the first entry named `name` if this entry is a list.
    pub fn get(&self, name: &str) -> Option<&DataListEntry> {
        match &self.value {
            DataListValue::List(entries) => {
                entries.iter().find(|e| e.name.as_bytes() == name.as_bytes())
            }
            _ => None,
        }
    }
}

impl BinRead for DataListEntry {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let offset = reader.stream_position()?;
        let value_type = u8::read_options(reader, endian, ())?;
        let name = SgString::read_options(reader, endian, ())?;
        let value = match value_type {
            0x02 => DataListValue::Int(i32::read_options(reader, endian, ())?),
            0x03 => DataListValue::Float(f32::read_options(reader, endian, ())?),
            0x05 => DataListValue::Vector3(Vector3::read_options(reader, endian, ())?),
            0x06 => DataListValue::String(SgString::read_options(reader, endian, ())?),
            0x07 => {
                // Each nested entry has at least a type byte and a name length.
                let count = read_count(reader, endian, 2)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    entries.push(DataListEntry::read_options(reader, endian, ())?);
                }
                DataListValue::List(entries)
            }
            0x08 => DataListValue::Vector4(Vector4::read_options(reader, endian, ())?),
            0x09 => {
                let len = read_count(reader, endian, 1)?;
                let mut bytes = vec![0u8; len];
                reader.read_exact(&mut bytes)?;
                DataListValue::Bytes(bytes)
            }
            _ => {
                return Err(format_error(
                    offset,
                    FormatError::UnknownDataListType { offset, value_type },
                ))
            }
        };

        Ok(Self { name, value })
    }
}

impl SgWrite for DataListEntry {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.value.value_type().sg_write(writer)?;
        self.name.sg_write(writer)?;
        match &self.value {
            DataListValue::Int(v) => v.sg_write(writer),
            DataListValue::Float(v) => v.sg_write(writer),
            DataListValue::Vector3(v) => v.sg_write(writer),
            DataListValue::String(v) => v.sg_write(writer),
            DataListValue::List(entries) => {
                count_i32(entries.len())?.sg_write(writer)?;
                entries.sg_write(writer)
            }
            DataListValue::Vector4(v) => v.sg_write(writer),
            DataListValue::Bytes(bytes) => {
                count_i32(bytes.len())?.sg_write(writer)?;
                writer.write_all(bytes)
            }
        }
    }

    fn size_in_bytes(&self) -> u64 {
        let value_size = match &self.value {
            DataListValue::Int(_) | DataListValue::Float(_) => 4,
            DataListValue::Vector3(_) => 12,
            DataListValue::String(v) => v.size_in_bytes(),
            DataListValue::List(entries) => 4 + entries.size_in_bytes(),
            DataListValue::Vector4(_) => 16,
            DataListValue::Bytes(bytes) => 4 + bytes.len() as u64,
        };
        1 + self.name.size_in_bytes() + value_size
    }
}

/// Bone specific data attached to a transform node.
/// Versions `0x04` and `0x05` are known.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, PartialEq)]
pub struct BoneDataExtension {
    pub signature: BoneDataExtensionSignature,
    pub version: i32,
    pub extension: ExtensionSignature,
    pub unk1: [u8; 12],
    pub unk2: f32,
    /// A quaternion in `(x, y, z, w)` order.
    pub rotation: Vector4,
}
