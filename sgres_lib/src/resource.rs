//! The outer container of a scene graph resource file.
use std::fs;
use std::path::Path;

use binrw::io::{Cursor, Read, Seek, Write};
use binrw::{BinRead, BinReaderExt, BinResult, Endian};
use sgres_write::SgWrite;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::nodes::GeometryDataContainer;
use crate::signatures::FileSignature;
use crate::{
    count_i32, format_error, read_count, read_elements, Error, FormatError, GeometryData, Node,
    NodeType, SgArray, SgString,
};

/// The group, instance, resource and type ids of another resource.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(BinRead, SgWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkedResource {
    pub group_id: u32,
    pub instance_id: u32,
    pub resource_id: u32,
    pub type_id: u32,
}

/// A scene graph resource file with its nodes in file order.
///
/// Nodes refer to each other by their position in [nodes](ResourceFile::nodes).
/// The type id list in the file header is derived from the node variants when writing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceFile {
    pub linked_resources: SgArray<LinkedResource>,
    pub nodes: Vec<Node>,
}

impl ResourceFile {
    /// Tries to read a resource file from `path`.
    /// The entire file is buffered for performance.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut reader = Cursor::new(fs::read(path).map_err(Error::Io)?);
        Self::read(&mut reader)
    }

    /// Tries to read a resource file from `reader`.
    /// For best performance when opening from a file, use `from_file` instead.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, Error> {
        match reader.read_le::<ResourceFile>() {
            Ok(file) => Ok(file),
            Err(e) => {
                let offset = reader.stream_position().unwrap_or_default();
                Err(Error::from_binrw(e, offset))
            }
        }
    }

    /// Reads the file at `path` with events sent to `dispatch` instead of the default subscriber.
    pub fn from_file_with_dispatch<P: AsRef<Path>>(
        path: P,
        dispatch: &tracing::Dispatch,
    ) -> Result<Self, Error> {
        tracing::dispatcher::with_default(dispatch, || Self::from_file(path))
    }

    /// Writes the file to `writer`.
    /// For best performance when writing to a file, use `write_to_file` instead.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        self.sg_write(writer)?;
        Ok(())
    }

    /// Writes the file to `path`.
    /// The entire file is buffered for performance.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(Error::Io)
    }

    /// Writes the file to `path` with events sent to `dispatch` instead of the default subscriber.
    pub fn write_to_file_with_dispatch<P: AsRef<Path>>(
        &self,
        path: P,
        dispatch: &tracing::Dispatch,
    ) -> Result<(), Error> {
        tracing::dispatcher::with_default(dispatch, || self.write_to_file(path))
    }

    /// A file with no linked resources and a single [GeometryDataContainer].
    /**
    ```rust
    # use sgres_lib::{GeometryData, ResourceFile, SgWrite};
    let file = ResourceFile::from_geometry("body".into(), GeometryData::default());
    let bytes = file.to_bytes().unwrap();
    assert_eq!(&[0x01, 0x00, 0xff, 0xff, 0, 0, 0, 0, 1, 0, 0, 0, 0x87, 0x86, 0x4f, 0xac], &bytes[..16]);
    ```
    */
    pub fn from_geometry(name: SgString, geometry: GeometryData) -> Self {
        Self {
            linked_resources: SgArray::new(),
            nodes: vec![Node::GeometryDataContainer(GeometryDataContainer::new(
                name, geometry,
            ))],
        }
    }

    /// The resource name of the first node if it has one.
    pub fn resource_name(&self) -> Option<&SgString> {
        self.nodes.first().and_then(Node::resource_name)
    }

    /// The node types in file order as written to the file header.
    pub fn node_types(&self) -> Vec<NodeType> {
        self.nodes.iter().map(Node::node_type).collect()
    }
}

impl BinRead for ResourceFile {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        FileSignature::read_options(reader, endian, ())?;

        let linked_resources = SgArray::<LinkedResource>::read_options(reader, endian, ())?;
        debug!(count = linked_resources.len(), "Read linked resources");

        let node_count = read_count(reader, endian, 4)?;
        let ids_offset = reader.stream_position()?;
        let type_ids: Vec<[u8; 4]> = read_elements(reader, endian, node_count)?;
        let node_types = type_ids
            .iter()
            .enumerate()
            .map(|(i, type_id)| {
                let offset = ids_offset + i as u64 * 4;
                NodeType::from_type_id(*type_id).ok_or_else(|| {
                    format_error(
                        offset,
                        FormatError::UnknownNodeType {
                            offset,
                            type_id: *type_id,
                        },
                    )
                })
            })
            .collect::<BinResult<Vec<_>>>()?;
        debug!(node_count, "Read node types");

        let mut nodes = Vec::with_capacity(node_count);
        for (index, node_type) in node_types.into_iter().enumerate() {
            let offset = reader.stream_position()?;
            debug!(index, ?node_type, "Read node at {offset:#x}");
            nodes.push(Node::read_options(reader, endian, node_type)?);
        }

        Ok(Self {
            linked_resources,
            nodes,
        })
    }
}

impl SgWrite for ResourceFile {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        FileSignature.sg_write(writer)?;
        self.linked_resources.sg_write(writer)?;
        count_i32(self.nodes.len())?.sg_write(writer)?;
        for node in &self.nodes {
            node.node_type().type_id().sg_write(writer)?;
        }
        for (index, node) in self.nodes.iter().enumerate() {
            debug!(index, node_type = ?node.node_type(), "Write node");
            node.sg_write(writer)?;
        }
        Ok(())
    }

    fn size_in_bytes(&self) -> u64 {
        FileSignature.size_in_bytes()
            + self.linked_resources.size_in_bytes()
            + 4
            + self.nodes.len() as u64 * 4
            + self.nodes.size_in_bytes()
    }
}
