use binrw::io::{Read, Seek, SeekFrom};
use binrw::{BinRead, BinResult, Endian};
use tracing::{debug, trace};

use super::{
    gather, BoundingMesh, DataGroup, GeometryData, IndexGroup, InverseTransform, MorphName,
    SectionKind, Tuple4, VectorData,
};
use crate::{ensure_remaining, format_error, read_count, read_elements, FormatError, SgString};

/// Section data before assignment to a data group.
#[derive(Debug, Clone, PartialEq)]
enum SectionData {
    /// Placeholder and auxiliary sections.
    Empty,
    Vectors2(Vec<[f32; 2]>),
    Vectors3(Vec<[f32; 3]>),
    Weights(Vec<Tuple4<f32>>),
    Tangents(VectorData),
    Bytes(Vec<[u8; 4]>),
}

#[derive(Debug, Clone, PartialEq)]
struct Section {
    kind: SectionKind,
    sub_index: i32,
    data: SectionData,
}

impl BinRead for GeometryData {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        // Each section header is at least 28 bytes.
        let section_count = read_count(reader, endian, 28)?;
        debug!(section_count, "Read geometry sections");
        let mut sections = Vec::with_capacity(section_count);
        for i in 0..section_count {
            sections.push(read_section(reader, endian, i)?);
        }

        let group_count = read_count(reader, endian, 24)?;
        debug!(group_count, "Read data groups");
        let mut data_groups = Vec::with_capacity(group_count);
        for i in 0..group_count {
            data_groups.push(read_data_group(reader, endian, i, &sections)?);
        }

        let index_group_count = read_count(reader, endian, 21)?;
        debug!(index_group_count, "Read index groups");
        let mut index_groups = Vec::with_capacity(index_group_count);
        for i in 0..index_group_count {
            index_groups.push(read_index_group(reader, endian, i, data_groups.len())?);
        }

        let transform_count = read_count(reader, endian, 28)?;
        let mut inverse_transforms = Vec::with_capacity(transform_count);
        for _ in 0..transform_count {
            let rotation = <[f32; 4]>::read_options(reader, endian, ())?;
            let translation = <[f32; 3]>::read_options(reader, endian, ())?;
            inverse_transforms.push(InverseTransform {
                rotation,
                translation,
            });
        }

        let morph_count = read_count(reader, endian, 2)?;
        let mut morph_names = Vec::with_capacity(morph_count);
        for _ in 0..morph_count {
            let group = SgString::read_options(reader, endian, ())?;
            let name = SgString::read_options(reader, endian, ())?;
            morph_names.push(MorphName { group, name });
        }

        let static_bmesh = read_bounding_mesh(reader, endian)?;

        let part_count = read_count(reader, endian, 4)?;
        let mut dynamic_bmesh = Vec::with_capacity(part_count);
        for _ in 0..part_count {
            dynamic_bmesh.push(read_bounding_mesh(reader, endian)?);
        }

        debug!(
            transforms = inverse_transforms.len(),
            morphs = morph_names.len(),
            static_bmesh = static_bmesh.is_some(),
            dynamic_parts = dynamic_bmesh.len(),
            "Read trailing geometry blocks"
        );

        Ok(Self {
            data_groups,
            index_groups,
            inverse_transforms,
            morph_names,
            static_bmesh,
            dynamic_bmesh,
        })
    }
}

fn read_section<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    section: usize,
) -> BinResult<Section> {
    let offset = reader.stream_position()?;
    let count = i32::read_options(reader, endian, ())?;
    let magic = <[u8; 4]>::read_options(reader, endian, ())?;
    let sub_index = i32::read_options(reader, endian, ())?;
    let type_of_data = i32::read_options(reader, endian, ())?;
    let _unknown = i32::read_options(reader, endian, ())?;
    let byte_len = i32::read_options(reader, endian, ())?;

    let kind = SectionKind::from_magic(magic)
        .ok_or_else(|| format_error(offset, FormatError::UnknownSectionKind { section, magic }))?;

    trace!(
        section,
        ?kind,
        count,
        sub_index,
        type_of_data,
        byte_len,
        "Read section header at {offset:#x}"
    );

    let invalid_size = || {
        format_error(
            offset,
            FormatError::InvalidSectionSize {
                section,
                count,
                byte_len,
            },
        )
    };

    if count < 0 || byte_len < 0 {
        return Err(invalid_size());
    }

    let data = if count == 0 {
        // Placeholders decode as empty even if they declare data.
        skip(reader, byte_len as u64)?;
        SectionData::Empty
    } else if kind.is_byte_data() {
        if count as i64 * 4 != byte_len as i64 {
            return Err(invalid_size());
        }
        ensure_remaining(reader, byte_len as u64)?;
        SectionData::Bytes(read_elements(reader, endian, count as usize)?)
    } else {
        let components = type_of_data as i64 + 1;
        if !kind.accepts_components(components) {
            return Err(format_error(
                offset,
                FormatError::InvalidComponentCount {
                    section,
                    kind,
                    type_of_data,
                },
            ));
        }
        if kind.is_auxiliary() {
            skip(reader, byte_len as u64)?;
            SectionData::Empty
        } else {
            if count as i64 * components * 4 != byte_len as i64 {
                return Err(invalid_size());
            }
            ensure_remaining(reader, byte_len as u64)?;
            read_float_data(reader, endian, kind, count as usize, components as usize)?
        }
    };

    // Only the auxiliary sections have an index list.
    let index_offset = reader.stream_position()?;
    if kind.is_auxiliary() {
        let index_count = read_count(reader, endian, 2)?;
        skip(reader, index_count as u64 * 2)?;
    } else {
        let index_count = i32::read_options(reader, endian, ())?;
        if index_count != 0 {
            return Err(format_error(
                index_offset,
                FormatError::UnexpectedSectionIndices {
                    section,
                    kind,
                    count: index_count,
                },
            ));
        }
    }

    Ok(Section {
        kind,
        sub_index,
        data,
    })
}

fn read_float_data<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    kind: SectionKind,
    count: usize,
    components: usize,
) -> BinResult<SectionData> {
    Ok(match (kind, components) {
        (SectionKind::TexCoords, _) => SectionData::Vectors2(read_elements(reader, endian, count)?),
        (SectionKind::BoneWeights, _) => {
            let mut weights = Vec::with_capacity(count);
            for _ in 0..count {
                let mut values = [0.0f32; 4];
                for value in values.iter_mut().take(components) {
                    *value = f32::read_options(reader, endian, ())?;
                }
                // The component count is checked to be at most 4.
                weights.push(Tuple4::from_slice(&values[..components]).unwrap_or_default());
            }
            SectionData::Weights(weights)
        }
        (SectionKind::Tangents, 2) => {
            SectionData::Tangents(VectorData::Vector2(read_elements(reader, endian, count)?))
        }
        (SectionKind::Tangents, 3) => {
            SectionData::Tangents(VectorData::Vector3(read_elements(reader, endian, count)?))
        }
        (SectionKind::Tangents, _) => {
            SectionData::Tangents(VectorData::Vector4(read_elements(reader, endian, count)?))
        }
        _ => SectionData::Vectors3(read_elements(reader, endian, count)?),
    })
}

fn skip<R: Read + Seek>(reader: &mut R, len: u64) -> BinResult<()> {
    ensure_remaining(reader, len)?;
    reader.seek(SeekFrom::Current(len as i64))?;
    Ok(())
}

fn read_data_group<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    data_group: usize,
    sections: &[Section],
) -> BinResult<DataGroup> {
    let offset = reader.stream_position()?;
    let first = i32::read_options(reader, endian, ())?;
    let section_count = usize::try_from(first).map_err(|_| {
        format_error(
            offset,
            FormatError::InvalidCount {
                offset,
                count: first,
            },
        )
    })?;
    ensure_remaining(reader, section_count as u64 * 2)?;
    let section_indices: Vec<u16> = read_elements(reader, endian, section_count)?;

    let count_offset = reader.stream_position()?;
    let count = i32::read_options(reader, endian, ())?;
    let count = usize::try_from(count).map_err(|_| {
        format_error(
            count_offset,
            FormatError::InvalidCount {
                offset: count_offset,
                count,
            },
        )
    })?;

    let mut group = DataGroup {
        count,
        ..Default::default()
    };
    for section_index in section_indices {
        let section = sections.get(section_index as usize).ok_or_else(|| {
            format_error(
                offset,
                FormatError::InvalidSectionIndex {
                    data_group,
                    section: section_index,
                    section_count: sections.len(),
                },
            )
        })?;
        assign_section(&mut group, data_group, section_index as usize, section)
            .map_err(|e| format_error(offset, e))?;
    }

    let second_offset = reader.stream_position()?;
    let second = i32::read_options(reader, endian, ())?;
    if second != first {
        return Err(format_error(
            second_offset,
            FormatError::SectionCountMismatch {
                data_group,
                first,
                second,
            },
        ));
    }

    group
        .validate(data_group)
        .map_err(|e| format_error(second_offset, e))?;

    let mapping_offset = reader.stream_position()?;
    let mut mappings = Vec::with_capacity(3);
    for _ in 0..3 {
        let len = read_count(reader, endian, 2)?;
        let mapping: Vec<u16> = read_elements(reader, endian, len)?;
        mappings.push(mapping);
    }
    apply_index_mappings(&mut group, data_group, &mappings)
        .map_err(|e| format_error(mapping_offset, e))?;

    trace!(
        data_group,
        count = group.count,
        vertices = group.vertices.len(),
        bones = group.bones.len(),
        morph_slots = group.morph_slot_count(),
        "Read data group"
    );

    Ok(group)
}

fn assign_section(
    group: &mut DataGroup,
    data_group: usize,
    section_index: usize,
    section: &Section,
) -> Result<(), FormatError> {
    if section.data == SectionData::Empty {
        return Ok(());
    }

    let kind = section.kind;
    let sub_index = section.sub_index;
    let valid_sub_index = if kind.is_multi_slot() {
        (0..4).contains(&sub_index)
    } else {
        sub_index == 0
    };
    if !valid_sub_index {
        return Err(FormatError::InvalidSubIndex {
            section: section_index,
            kind,
            sub_index,
        });
    }
    let slot = sub_index as usize;

    let duplicate = FormatError::DuplicateSectionAssignment {
        data_group,
        section: section_index,
        kind,
    };

    match (&section.data, kind) {
        (SectionData::Vectors3(v), SectionKind::Vertices) => fill(&mut group.vertices, v, duplicate),
        (SectionData::Vectors3(v), SectionKind::Normals) => fill(&mut group.normals, v, duplicate),
        (SectionData::Vectors3(v), SectionKind::DiffVerts) => {
            fill(&mut group.dverts[slot], v, duplicate)
        }
        (SectionData::Vectors3(v), SectionKind::DiffNorms) => {
            fill(&mut group.dnorms[slot], v, duplicate)
        }
        (SectionData::Vectors2(v), _) => {
            // Texture coordinates fill the first free layer.
            if group.tex_coords.is_empty() {
                fill(&mut group.tex_coords, v, duplicate)
            } else {
                fill(&mut group.tex_coords2, v, duplicate)
            }
        }
        (SectionData::Weights(v), _) => fill(&mut group.weights, v, duplicate),
        (SectionData::Tangents(v), _) => {
            if group.tangents.is_empty() {
                group.tangents = v.clone();
                Ok(())
            } else {
                Err(duplicate)
            }
        }
        (SectionData::Bytes(v), SectionKind::BoneIndices) => {
            let bones: Vec<_> = v.iter().map(|b| bone_indices(*b)).collect();
            fill(&mut group.bones, &bones, duplicate)
        }
        (SectionData::Bytes(v), SectionKind::DiffKeys) => {
            let keys: Vec<_> = v.iter().map(|k| Tuple4::from(*k)).collect();
            fill(&mut group.keys, &keys, duplicate)
        }
        (SectionData::Bytes(v), _) => fill(&mut group.mask, v, duplicate),
        _ => Ok(()),
    }
}

fn fill<T: Clone>(field: &mut Vec<T>, values: &[T], duplicate: FormatError) -> Result<(), FormatError> {
    if field.is_empty() {
        field.extend_from_slice(values);
        Ok(())
    } else {
        Err(duplicate)
    }
}

/// Bone indices end at the first `0xFF`.
fn bone_indices(bytes: [u8; 4]) -> Tuple4<u8> {
    let len = bytes.iter().position(|b| *b == 0xFF).unwrap_or(4);
    Tuple4::from_slice(&bytes[..len]).unwrap_or_default()
}

fn apply_index_mappings(
    group: &mut DataGroup,
    data_group: usize,
    mappings: &[Vec<u16>],
) -> Result<(), FormatError> {
    if mappings.iter().all(|m| m.is_empty()) {
        return Ok(());
    }
    if !group.bones.is_empty() || !group.keys.is_empty() {
        return Err(FormatError::IndexMappingWithSkinning { data_group });
    }

    debug!(
        data_group,
        vertices = mappings[0].len(),
        normals = mappings[1].len(),
        tex_coords = mappings[2].len(),
        "Apply index mappings"
    );

    remap(&mut group.vertices, &mappings[0], data_group)?;
    remap(&mut group.normals, &mappings[1], data_group)?;
    remap(&mut group.tex_coords, &mappings[2], data_group)?;
    Ok(())
}

fn remap<T: Copy>(values: &mut Vec<T>, mapping: &[u16], data_group: usize) -> Result<(), FormatError> {
    if mapping.is_empty() {
        return Ok(());
    }
    let indices: Vec<usize> = mapping.iter().map(|i| *i as usize).collect();
    let gathered = gather(values, &indices).ok_or_else(|| {
        // Report the first index that is out of range.
        let index = mapping
            .iter()
            .copied()
            .find(|i| *i as usize >= values.len())
            .unwrap_or_default();
        FormatError::InvalidIndexMapping {
            data_group,
            index,
            len: values.len(),
        }
    })?;
    *values = gathered;
    Ok(())
}

fn read_index_group<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    index_group: usize,
    group_count: usize,
) -> BinResult<IndexGroup> {
    let offset = reader.stream_position()?;
    let primitive_type = i32::read_options(reader, endian, ())?;
    if primitive_type != 2 {
        return Err(format_error(
            offset,
            FormatError::UnsupportedPrimitiveType {
                index_group,
                primitive_type,
            },
        ));
    }

    let data_group = i32::read_options(reader, endian, ())?;
    let data_group_index = usize::try_from(data_group)
        .ok()
        .filter(|i| *i < group_count)
        .ok_or_else(|| {
            format_error(
                offset + 4,
                FormatError::InvalidDataGroupIndex {
                    index_group,
                    data_group,
                    group_count,
                },
            )
        })?;

    let name = SgString::read_options(reader, endian, ())?;

    let count_offset = reader.stream_position()?;
    let index_count = read_count(reader, endian, 2)?;
    if index_count % 3 != 0 {
        return Err(format_error(
            count_offset,
            FormatError::InvalidIndexCount {
                offset: count_offset,
                count: index_count as i32,
            },
        ));
    }
    let indices = read_elements(reader, endian, index_count / 3)?;

    let flags = u32::read_options(reader, endian, ())?;

    let bone_count = read_count(reader, endian, 2)?;
    let bones = read_elements(reader, endian, bone_count)?;

    trace!(
        index_group,
        data_group_index,
        triangles = index_count / 3,
        bones = bone_count,
        "Read index group {}",
        name
    );

    Ok(IndexGroup {
        name,
        data_group_index,
        indices,
        flags,
        bones,
        tex_coords: Vec::new(),
        tex_coords2: Vec::new(),
    })
}

fn read_bounding_mesh<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
) -> BinResult<Option<BoundingMesh>> {
    let vertex_count = read_count(reader, endian, 12)?;
    if vertex_count == 0 {
        return Ok(None);
    }

    let count_offset = reader.stream_position()?;
    let index_count = read_count(reader, endian, 0)?;
    if index_count % 3 != 0 {
        return Err(format_error(
            count_offset,
            FormatError::InvalidIndexCount {
                offset: count_offset,
                count: index_count as i32,
            },
        ));
    }
    ensure_remaining(reader, vertex_count as u64 * 12 + index_count as u64 * 2)?;

    let vertices = read_elements(reader, endian, vertex_count)?;
    let indices = read_elements(reader, endian, index_count / 3)?;
    Ok(Some(BoundingMesh { vertices, indices }))
}
