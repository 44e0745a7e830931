use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::de::{Error, SeqAccess, Visitor};

#[cfg(feature = "serde")]
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize, Serializer};

use crate::{write_error, FormatError};

/// A string stored as a `u8` byte length followed by that many bytes with no null terminator.
///
/// The bytes are not required to be valid UTF-8.
/**
```rust
use sgres_lib::SgString;

let s = SgString::from("bone_r_hand");
assert_eq!(Some("bone_r_hand"), s.to_str());
assert_eq!(11, s.len());
```
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SgString(Vec<u8>);

impl SgString {
    /// The maximum number of bytes that can be stored in the length byte.
    pub const MAX_LEN: usize = u8::MAX as usize;

    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Converts the underlying bytes to a string slice if they are valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Converts the underlying bytes to a string, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SgString {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for SgString {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<Vec<u8>> for SgString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for SgString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

impl BinRead for SgString {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let len = u8::read_options(reader, endian, ())?;
        let mut bytes = vec![0u8; len as usize];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl SgWrite for SgString {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let len = u8::try_from(self.0.len())
            .map_err(|_| write_error(FormatError::StringTooLong { len: self.0.len() }))?;
        writer.write_all(&[len])?;
        writer.write_all(&self.0)
    }

    fn size_in_bytes(&self) -> u64 {
        1 + self.0.len() as u64
    }
}

// Valid UTF-8 is stored as a string to keep the JSON readable.
#[cfg(feature = "serde")]
impl Serialize for SgString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.to_str() {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_bytes(&self.0),
        }
    }
}

#[cfg(feature = "serde")]
struct SgStringVisitor;

#[cfg(feature = "serde")]
impl<'de> Visitor<'de> for SgStringVisitor {
    type Value = SgString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string or a sequence of bytes")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(SgString::from(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(SgString(v.to_vec()))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::new();
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(SgString(bytes))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SgString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(SgStringVisitor)
    }
}
