//! The [SgWrite] trait for writing the sequential little-endian layout used by scene graph resource files.
//!
//! Every value is written in place with no offsets or alignment.
//! Most types should use the derive macro instead of implementing the trait manually.
/*!
```rust
use sgres_write::SgWrite;

#[derive(SgWrite)]
struct Header {
    version: i32,
    flags: [u8; 2],
}

let mut bytes = Vec::new();
let header = Header { version: 4, flags: [1, 2] };
header.sg_write(&mut bytes).unwrap();
assert_eq!(vec![4, 0, 0, 0, 1, 2], bytes);
assert_eq!(6, header.size_in_bytes());
```
 */
use std::io::Write;

pub use sgres_write_derive::SgWrite;

/// A trait for writing types that are part of scene graph resource files.
pub trait SgWrite {
    /// Writes the byte representation of `self` to `writer`.
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    /// The number of bytes written by [sg_write](SgWrite::sg_write).
    /// This is used to preallocate output buffers.
    fn size_in_bytes(&self) -> u64;

    /// Writes `self` to a new buffer with its capacity set to [size_in_bytes](SgWrite::size_in_bytes).
    fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.size_in_bytes() as usize);
        self.sg_write(&mut bytes)?;
        Ok(bytes)
    }
}

impl<T: SgWrite> SgWrite for [T] {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for element in self {
            element.sg_write(writer)?;
        }
        Ok(())
    }

    fn size_in_bytes(&self) -> u64 {
        // Elements can have different sizes, so each element is checked.
        self.iter().map(SgWrite::size_in_bytes).sum()
    }
}

impl<T: SgWrite> SgWrite for Vec<T> {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_slice().sg_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        self.as_slice().size_in_bytes()
    }
}

impl<T: SgWrite, const N: usize> SgWrite for [T; N] {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_slice().sg_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        self.as_slice().size_in_bytes()
    }
}

impl<T: SgWrite> SgWrite for Option<T> {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        // None values are skipped entirely.
        match self {
            Some(value) => value.sg_write(writer),
            None => Ok(()),
        }
    }

    fn size_in_bytes(&self) -> u64 {
        match self {
            Some(value) => value.size_in_bytes(),
            None => 0,
        }
    }
}

macro_rules! sg_write_impl {
    ($($id:ident),*) => {
        $(
            impl SgWrite for $id {
                fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
                    writer.write_all(&self.to_le_bytes())
                }

                fn size_in_bytes(&self) -> u64 {
                    std::mem::size_of::<Self>() as u64
                }
            }
        )*
    }
}

sg_write_impl!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
