use std::io::Write;

use sgres_write::SgWrite;
use tracing::{debug, trace};

use super::{BoundingMesh, DataGroup, GeometryData, IndexGroup, SectionKind};
use crate::{count_i32, index_u16, write_error};

/// Flattened section data rebuilt from a data group.
struct Section {
    kind: SectionKind,
    sub_index: i32,
    count: usize,
    data: SectionValues,
}

enum SectionValues {
    Floats { components: usize, values: Vec<f32> },
    Bytes(Vec<[u8; 4]>),
}

impl Section {
    fn floats<const N: usize>(kind: SectionKind, sub_index: i32, values: &[[f32; N]]) -> Self {
        Self {
            kind,
            sub_index,
            count: values.len(),
            data: SectionValues::Floats {
                components: N,
                values: values.iter().flatten().copied().collect(),
            },
        }
    }

    fn bytes(kind: SectionKind, values: Vec<[u8; 4]>) -> Self {
        Self {
            kind,
            sub_index: 0,
            count: values.len(),
            data: SectionValues::Bytes(values),
        }
    }
}

impl SgWrite for Section {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        count_i32(self.count)?.sg_write(writer)?;
        self.kind.magic().sg_write(writer)?;
        self.sub_index.sg_write(writer)?;
        match &self.data {
            SectionValues::Floats { components, values } => {
                (*components as i32 - 1).sg_write(writer)?;
                3i32.sg_write(writer)?;
                count_i32(values.len() * 4)?.sg_write(writer)?;
                values.sg_write(writer)?;
            }
            SectionValues::Bytes(values) => {
                4i32.sg_write(writer)?;
                3i32.sg_write(writer)?;
                count_i32(values.len() * 4)?.sg_write(writer)?;
                values.sg_write(writer)?;
            }
        }
        // Sections assigned to data groups have no index list.
        0i32.sg_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        let data_size = match &self.data {
            SectionValues::Floats { values, .. } => values.len() as u64 * 4,
            SectionValues::Bytes(values) => values.len() as u64 * 4,
        };
        28 + data_size
    }
}

/// Builds the sections for `group` in the order vertices, normals, texture coordinates,
/// bones and weights, tangents, keys, diff verts, diff norms and the deform mask.
fn group_sections(group: &DataGroup) -> Vec<Section> {
    let mut sections = vec![Section::floats(SectionKind::Vertices, 0, &group.vertices)];

    if !group.normals.is_empty() {
        sections.push(Section::floats(SectionKind::Normals, 0, &group.normals));
    }

    if !group.tex_coords.is_empty() {
        sections.push(Section::floats(SectionKind::TexCoords, 0, &group.tex_coords));
        if !group.tex_coords2.is_empty() {
            sections.push(Section::floats(SectionKind::TexCoords, 1, &group.tex_coords2));
        }
    }

    if !group.bones.is_empty() {
        let bones = group.bones.iter().map(|b| b.padded(0xFF)).collect();
        sections.push(Section::bytes(SectionKind::BoneIndices, bones));

        // The weight for the last of 4 bones is implicit.
        let components = group
            .weights
            .iter()
            .map(|w| w.len())
            .max()
            .unwrap_or_default()
            .clamp(1, 3);
        let values = group
            .weights
            .iter()
            .flat_map(|w| w.padded(0.0).into_iter().take(components))
            .collect();
        sections.push(Section {
            kind: SectionKind::BoneWeights,
            sub_index: 0,
            count: group.weights.len(),
            data: SectionValues::Floats { components, values },
        });
    }

    if !group.tangents.is_empty() {
        sections.push(Section {
            kind: SectionKind::Tangents,
            sub_index: 0,
            count: group.tangents.len(),
            data: SectionValues::Floats {
                components: group.tangents.component_count(),
                values: group.tangents.flatten(),
            },
        });
    }

    if !group.keys.is_empty() {
        let keys = group.keys.iter().map(|k| k.padded(0)).collect();
        sections.push(Section::bytes(SectionKind::DiffKeys, keys));

        for (slot, dverts) in group.dverts.iter().take_while(|d| !d.is_empty()).enumerate() {
            sections.push(Section::floats(SectionKind::DiffVerts, slot as i32, dverts));
        }
        for (slot, dnorms) in group.dnorms.iter().take_while(|d| !d.is_empty()).enumerate() {
            sections.push(Section::floats(SectionKind::DiffNorms, slot as i32, dnorms));
        }
    }

    if !group.mask.is_empty() {
        sections.push(Section::bytes(SectionKind::DeformMask, group.mask.clone()));
    }

    sections
}

fn write_data_group<W: Write>(
    writer: &mut W,
    group: &DataGroup,
    section_indices: &[u16],
) -> std::io::Result<()> {
    let section_count = count_i32(section_indices.len())?;
    section_count.sg_write(writer)?;
    section_indices.sg_write(writer)?;
    count_i32(group.count)?.sg_write(writer)?;
    section_count.sg_write(writer)?;
    // Index mappings are never written.
    [0i32; 3].sg_write(writer)
}

fn write_index_group<W: Write>(writer: &mut W, group: &IndexGroup) -> std::io::Result<()> {
    2i32.sg_write(writer)?;
    count_i32(group.data_group_index)?.sg_write(writer)?;
    group.name.sg_write(writer)?;
    count_i32(group.indices.len() * 3)?.sg_write(writer)?;
    group.indices.sg_write(writer)?;
    group.flags.sg_write(writer)?;
    count_i32(group.bones.len())?.sg_write(writer)?;
    group.bones.sg_write(writer)
}

/// Meshes without vertices are written as absent.
fn write_bounding_mesh<W: Write>(writer: &mut W, mesh: Option<&BoundingMesh>) -> std::io::Result<()> {
    match mesh.filter(|m| !m.vertices.is_empty()) {
        Some(mesh) => {
            count_i32(mesh.vertices.len())?.sg_write(writer)?;
            count_i32(mesh.indices.len() * 3)?.sg_write(writer)?;
            mesh.vertices.sg_write(writer)?;
            mesh.indices.sg_write(writer)
        }
        None => 0i32.sg_write(writer),
    }
}

impl SgWrite for GeometryData {
    fn sg_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.validate().map_err(write_error)?;

        let mut sections = Vec::new();
        let mut group_section_indices = Vec::with_capacity(self.data_groups.len());
        for group in &self.data_groups {
            let new_sections = group_sections(group);
            let indices = (sections.len()..sections.len() + new_sections.len())
                .map(index_u16)
                .collect::<std::io::Result<Vec<_>>>()?;
            group_section_indices.push(indices);
            sections.extend(new_sections);
        }

        debug!(
            sections = sections.len(),
            data_groups = self.data_groups.len(),
            index_groups = self.index_groups.len(),
            "Write geometry"
        );

        count_i32(sections.len())?.sg_write(writer)?;
        for (i, section) in sections.iter().enumerate() {
            trace!(
                section = i,
                kind = ?section.kind,
                count = section.count,
                sub_index = section.sub_index,
                "Write section"
            );
            section.sg_write(writer)?;
        }

        count_i32(self.data_groups.len())?.sg_write(writer)?;
        for (group, indices) in self.data_groups.iter().zip(&group_section_indices) {
            write_data_group(writer, group, indices)?;
        }

        count_i32(self.index_groups.len())?.sg_write(writer)?;
        for group in &self.index_groups {
            write_index_group(writer, group)?;
        }

        count_i32(self.inverse_transforms.len())?.sg_write(writer)?;
        for transform in &self.inverse_transforms {
            transform.rotation.sg_write(writer)?;
            transform.translation.sg_write(writer)?;
        }

        count_i32(self.morph_names.len())?.sg_write(writer)?;
        for name in &self.morph_names {
            name.group.sg_write(writer)?;
            name.name.sg_write(writer)?;
        }

        write_bounding_mesh(writer, self.static_bmesh.as_ref())?;

        count_i32(self.dynamic_bmesh.len())?.sg_write(writer)?;
        for part in &self.dynamic_bmesh {
            write_bounding_mesh(writer, part.as_ref())?;
        }

        Ok(())
    }

    fn size_in_bytes(&self) -> u64 {
        let mut counter = ByteCounter(0);
        match self.sg_write(&mut counter) {
            Ok(()) => counter.0,
            Err(_) => 0,
        }
    }
}

/// A writer that only counts bytes.
struct ByteCounter(u64);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{InverseTransform, MorphName, Tuple4, VectorData};
    use crate::{hex_bytes, Error, FormatError};
    use binrw::io::Cursor;
    use binrw::BinReaderExt;
    use pretty_assertions::assert_eq;

    fn read_geometry(bytes: &[u8]) -> GeometryData {
        let mut reader = Cursor::new(bytes);
        reader.read_le::<GeometryData>().unwrap()
    }

    #[test]
    fn write_empty_geometry() {
        let bytes = GeometryData::default().to_bytes().unwrap();
        assert_eq!(hex_bytes("00000000 00000000 00000000 00000000 00000000 00000000 00000000"), bytes);
    }

    #[test]
    fn write_single_triangle() {
        let geometry = GeometryData::from_mesh(
            "tri".into(),
            vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            Vec::new(),
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            vec![[0, 1, 2]],
        );

        let bytes = geometry.to_bytes().unwrap();
        crate::assert_hex_eq!(
            &hex_bytes(
                "02000000
                 03000000 8107835b 00000000 02000000 03000000 24000000
                 0000803f 00000000 00000000 00000000 0000803f 00000000 00000000 00000000 0000803f
                 00000000
                 03000000 ab0783bb 00000000 01000000 03000000 18000000
                 00000000 00000000 0000803f 00000000 00000000 0000803f
                 00000000
                 01000000
                 02000000 0000 0100 03000000 02000000 000000000000000000000000
                 01000000
                 02000000 00000000 03 747269 03000000 000001000200 ffffffff 00000000
                 00000000 00000000 00000000 00000000"
            ),
            &bytes
        );
        assert_eq!(bytes.len() as u64, geometry.size_in_bytes());
        assert_eq!(geometry, read_geometry(&bytes));
    }

    #[test]
    fn bones_padded_with_ff() {
        let group = DataGroup {
            count: 2,
            vertices: vec![[0.0; 3]; 2],
            bones: vec![
                Tuple4::from_slice(&[3, 7]).unwrap(),
                Tuple4::from_slice(&[1, 2, 3, 4]).unwrap(),
            ],
            weights: vec![
                Tuple4::from_slice(&[0.5, 0.5]).unwrap(),
                Tuple4::from_slice(&[0.25, 0.25, 0.25, 0.25]).unwrap(),
            ],
            ..Default::default()
        };

        let sections = group_sections(&group);
        assert_eq!(3, sections.len());
        match &sections[1].data {
            SectionValues::Bytes(bones) => assert_eq!(&vec![[3, 7, 0xFF, 0xFF], [1, 2, 3, 4]], bones),
            SectionValues::Floats { .. } => panic!("expected bone indices"),
        }
        match &sections[2].data {
            SectionValues::Floats { components, values } => {
                assert_eq!(3, *components);
                assert_eq!(&vec![0.5, 0.5, 0.0, 0.25, 0.25, 0.25], values);
            }
            SectionValues::Bytes(_) => panic!("expected weights"),
        }
    }

    #[test]
    fn rigged_round_trip() {
        let geometry = GeometryData {
            data_groups: vec![DataGroup {
                count: 2,
                vertices: vec![[0.0; 3], [1.0; 3]],
                normals: vec![[0.0, 0.0, 1.0]; 2],
                tex_coords: vec![[0.0; 2], [1.0; 2]],
                tex_coords2: vec![[0.5; 2]; 2],
                bones: vec![
                    Tuple4::from_slice(&[0]).unwrap(),
                    Tuple4::from_slice(&[0, 1]).unwrap(),
                ],
                weights: vec![
                    Tuple4::from_slice(&[1.0, 0.0]).unwrap(),
                    Tuple4::from_slice(&[0.5, 0.5]).unwrap(),
                ],
                tangents: VectorData::Vector3(vec![[1.0, 0.0, 0.0]; 2]),
                ..Default::default()
            }],
            index_groups: vec![IndexGroup {
                bones: vec![4, 9],
                ..IndexGroup::new("body".into(), 0, vec![[0, 1, 1]])
            }],
            inverse_transforms: vec![
                InverseTransform {
                    rotation: [0.0, 0.0, 0.0, 1.0],
                    translation: [0.0; 3],
                };
                10
            ],
            morph_names: Vec::new(),
            static_bmesh: Some(BoundingMesh {
                vertices: vec![[0.0; 3], [1.0; 3], [2.0; 3]],
                indices: vec![[0, 1, 2]],
            }),
            dynamic_bmesh: vec![
                None,
                None,
                None,
                None,
                Some(BoundingMesh {
                    vertices: vec![[0.0; 3]; 3],
                    indices: vec![[0, 1, 2]],
                }),
            ],
        };

        let bytes = geometry.to_bytes().unwrap();
        assert_eq!(geometry, read_geometry(&bytes));
        assert_eq!(bytes, read_geometry(&bytes).to_bytes().unwrap());
    }

    #[test]
    fn morph_round_trip() {
        let keys = vec![Tuple4::from([0, 1, 0, 0]); 2];
        let geometry = GeometryData {
            data_groups: vec![DataGroup {
                count: 2,
                vertices: vec![[0.0; 3], [1.0; 3]],
                keys,
                dverts: [
                    vec![[0.1; 3]; 2],
                    vec![[0.2; 3]; 2],
                    Vec::new(),
                    Vec::new(),
                ],
                dnorms: [
                    vec![[0.0; 3]; 2],
                    vec![[0.0; 3]; 2],
                    Vec::new(),
                    Vec::new(),
                ],
                mask: vec![[1, 0, 0, 0]; 2],
                ..Default::default()
            }],
            morph_names: vec![
                MorphName {
                    group: "body".into(),
                    name: "fat".into(),
                },
                MorphName {
                    group: "body".into(),
                    name: "fit".into(),
                },
            ],
            ..Default::default()
        };

        let bytes = geometry.to_bytes().unwrap();
        assert_eq!(geometry, read_geometry(&bytes));
    }

    #[test]
    fn write_invalid_morph_state() {
        let geometry = GeometryData {
            data_groups: vec![DataGroup {
                count: 1,
                vertices: vec![[0.0; 3]],
                keys: vec![Tuple4::from([0, 0, 0, 0])],
                dverts: [vec![[0.0; 3]], Vec::new(), vec![[0.0; 3]], Vec::new()],
                ..Default::default()
            }],
            ..Default::default()
        };

        let error = Error::from(geometry.to_bytes().unwrap_err());
        assert!(matches!(
            error,
            Error::Format(FormatError::InvalidMorphState {
                data_group: 0,
                dverts: 0b0101,
                ..
            })
        ));
    }

    #[test]
    fn write_bones_without_weights() {
        let geometry = GeometryData {
            data_groups: vec![DataGroup {
                count: 1,
                vertices: vec![[0.0; 3]],
                bones: vec![Tuple4::from_slice(&[0]).unwrap()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut writer = Cursor::new(Vec::new());
        assert!(matches!(
            geometry.write(&mut writer),
            Err(Error::Format(FormatError::InvalidRiggingData { data_group: 0 }))
        ));
    }

    #[test]
    fn empty_bounding_meshes_are_absent() {
        let geometry = GeometryData {
            static_bmesh: Some(BoundingMesh::default()),
            dynamic_bmesh: vec![Some(BoundingMesh::default())],
            ..Default::default()
        };
        let bytes = geometry.to_bytes().unwrap();
        let geometry = read_geometry(&bytes);
        assert_eq!(None, geometry.static_bmesh);
        assert_eq!(vec![None], geometry.dynamic_bmesh);
    }
}
