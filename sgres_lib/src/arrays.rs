use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, Endian};
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{count_i32, read_count, read_elements};

/// A contiguous collection of elements stored as an `i32` element count followed by the elements.
/**
The element count is computed from `elements` when writing.

```rust
use sgres_lib::SgArray;
use sgres_lib::SgString;
use sgres_write::SgWrite;
# use binrw::BinRead;

#[derive(BinRead, SgWrite)]
struct MaterialReferences {
    names: SgArray<SgString>,
}
# fn main() {}
```
 */
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgArray<T> {
    pub elements: Vec<T>,
}

impl<T> Default for SgArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SgArray<T> {
    /// Creates an empty array.
    /**
    ```rust
    # use sgres_lib::SgArray;
    let array: SgArray<u32> = SgArray::new();
    assert!(array.elements.is_empty());
    ```
    */
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Creates a new array from `elements`.
    pub fn from_vec(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }
}

impl<T> From<Vec<T>> for SgArray<T> {
    fn from(v: Vec<T>) -> Self {
        Self::from_vec(v)
    }
}

impl<T> FromIterator<T> for SgArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a SgArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> BinRead for SgArray<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        // Every element takes up at least one byte.
        let count = read_count(reader, endian, 1)?;
        let elements = read_elements(reader, endian, count)?;
        Ok(Self { elements })
    }
}

impl<T: SgWrite> SgWrite for SgArray<T> {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        count_i32(self.elements.len())?.sg_write(writer)?;
        self.elements.sg_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        4 + self.elements.size_in_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormatError, SgString};
    use binrw::io::Cursor;
    use binrw::BinReaderExt;
    use hexlit::hex;

    #[test]
    fn read_array() {
        let mut reader = Cursor::new(hex!("02000000 0100 0200"));
        let value = reader.read_le::<SgArray<u16>>().unwrap();
        assert_eq!(vec![1u16, 2u16], value.elements);
        assert_eq!(8, reader.position());
    }

    #[test]
    fn read_empty_array() {
        let mut reader = Cursor::new(hex!("00000000"));
        let value = reader.read_le::<SgArray<SgString>>().unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn read_array_negative_count() {
        let mut reader = Cursor::new(hex!("feffffff"));
        let error = reader.read_le::<SgArray<u8>>().unwrap_err();
        assert_eq!(
            Some(&FormatError::InvalidCount {
                offset: 0,
                count: -2
            }),
            error.root_cause().custom_err::<FormatError>()
        );
    }

    #[test]
    fn read_array_count_past_end() {
        // The count is checked before allocating.
        let mut reader = Cursor::new(hex!("ffffff7f 01"));
        let error = reader.read_le::<SgArray<u8>>().unwrap_err();
        assert_eq!(
            Some(&FormatError::TruncatedStream { offset: 4 }),
            error.root_cause().custom_err::<FormatError>()
        );
    }

    #[test]
    fn write_array() {
        let value = SgArray::from_vec(vec![SgString::from("a"), SgString::from("bc")]);
        assert_eq!(hex!("02000000 0161 026263").to_vec(), value.to_bytes().unwrap());
        assert_eq!(9, value.size_in_bytes());
    }
}
