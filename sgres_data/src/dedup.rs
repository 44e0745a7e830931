//! Collapsing duplicate vertices of data groups with texture coordinates.
//!
//! Texture coordinates are not part of the comparison,
//! so vertices on UV seams are merged and their texture coordinates move to the index groups.
//! Each index group then stores three texture coordinates per triangle instead.
use ahash::AHashMap;
use sgres_lib::{DataGroup, FormatError, GeometryData, Tuple4, VectorData};
use thiserror::Error;
use tracing::debug;

/// Errors while removing duplicate vertices.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DedupError {
    /// The data group does not have valid rigging or morph data.
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("data group {data_group} has {found} {attribute} but a vertex count of {expected}")]
    AttributeCountMismatch {
        data_group: usize,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(
        "index group {index_group} references vertex {index} but data group {data_group} only has {count} vertices"
    )]
    VertexIndexOutOfRange {
        index_group: usize,
        data_group: usize,
        index: u16,
        count: usize,
    },
}

/// Every attribute used to compare vertices.
/// Floats are compared by their bits with negative zero treated as zero.
#[derive(PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 3],
    normal: [u32; 3],
    bones: Tuple4<u8>,
    weights: Vec<u32>,
    keys: Tuple4<u8>,
    deltas: Vec<[u32; 3]>,
}

/// Merges the duplicate vertices of each data group that has texture coordinates.
///
/// Vertices are kept in the order of their first occurrence.
/// The deform mask and tangents of processed groups are discarded.
/// Groups without texture coordinates are left unchanged,
/// so applying this function to its own output does not change anything.
/**
```rust
use sgres_data::remove_doubles;
use sgres_lib::GeometryData;

let geometry = GeometryData::from_mesh(
    "plane".into(),
    vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    Vec::new(),
    vec![[0.0, 0.0]; 6],
    vec![[0, 1, 2], [3, 5, 4]],
);
let geometry = remove_doubles(geometry)?;
assert_eq!(4, geometry.data_groups[0].count);
assert_eq!(vec![[0, 1, 2], [1, 3, 2]], geometry.index_groups[0].indices);
# Ok::<(), sgres_data::DedupError>(())
```
 */
pub fn remove_doubles(mut geometry: GeometryData) -> Result<GeometryData, DedupError> {
    for data_group in 0..geometry.data_groups.len() {
        if !geometry.data_groups[data_group].tex_coords.is_empty() {
            remove_group_doubles(&mut geometry, data_group)?;
        }
    }
    Ok(geometry)
}

fn remove_group_doubles(geometry: &mut GeometryData, data_group: usize) -> Result<(), DedupError> {
    let group = &mut geometry.data_groups[data_group];
    check_counts(group, data_group)?;
    group.validate(data_group)?;

    for (index_group, g) in geometry.index_groups.iter().enumerate() {
        if g.data_group_index != data_group {
            continue;
        }
        if let Some(index) = g.indices.iter().flatten().find(|i| **i as usize >= group.count) {
            return Err(DedupError::VertexIndexOutOfRange {
                index_group,
                data_group,
                index: *index,
                count: group.count,
            });
        }
    }

    let (new_indices, first_indices) = unique_vertices(group);
    debug!(
        "Data group {}: vertex count {} -> {}",
        data_group,
        group.count,
        first_indices.len()
    );

    for g in geometry
        .index_groups
        .iter_mut()
        .filter(|g| g.data_group_index == data_group)
    {
        g.tex_coords = triangle_values(&group.tex_coords, &g.indices);
        if !group.tex_coords2.is_empty() {
            g.tex_coords2 = triangle_values(&group.tex_coords2, &g.indices);
        }
        // A vertex is never moved to a higher index.
        g.indices = g
            .indices
            .iter()
            .map(|t| t.map(|i| new_indices[i as usize] as u16))
            .collect();
    }

    group.vertices = select(&group.vertices, &first_indices);
    group.normals = select(&group.normals, &first_indices);
    group.bones = select(&group.bones, &first_indices);
    group.weights = select(&group.weights, &first_indices);
    group.keys = select(&group.keys, &first_indices);
    for slot in group.dverts.iter_mut().chain(group.dnorms.iter_mut()) {
        *slot = select(slot, &first_indices);
    }
    group.count = first_indices.len();
    group.tex_coords = Vec::new();
    group.tex_coords2 = Vec::new();
    group.tangents = VectorData::default();
    group.mask = Vec::new();

    Ok(())
}

fn check_counts(group: &DataGroup, data_group: usize) -> Result<(), DedupError> {
    let mismatch = |attribute, found| DedupError::AttributeCountMismatch {
        data_group,
        attribute,
        expected: group.count,
        found,
    };

    if group.vertices.len() != group.count {
        return Err(mismatch("vertices", group.vertices.len()));
    }
    if group.tex_coords.len() != group.count {
        return Err(mismatch("tex_coords", group.tex_coords.len()));
    }

    let optional = [
        ("normals", group.normals.len()),
        ("tex_coords2", group.tex_coords2.len()),
        ("bones", group.bones.len()),
        ("weights", group.weights.len()),
        ("keys", group.keys.len()),
    ];
    let deltas = group
        .dverts
        .iter()
        .map(|d| ("dverts", d.len()))
        .chain(group.dnorms.iter().map(|d| ("dnorms", d.len())));
    match optional
        .into_iter()
        .chain(deltas)
        .find(|(_, len)| *len != 0 && *len != group.count)
    {
        Some((attribute, found)) => Err(mismatch(attribute, found)),
        None => Ok(()),
    }
}

/// Returns the new index for each vertex and the old index for each unique vertex.
fn unique_vertices(group: &DataGroup) -> (Vec<usize>, Vec<usize>) {
    let mut unique = AHashMap::with_capacity(group.count);
    let mut first_indices = Vec::new();
    let mut new_indices = Vec::with_capacity(group.count);
    for i in 0..group.count {
        let new_index = *unique.entry(vertex_key(group, i)).or_insert_with(|| {
            first_indices.push(i);
            first_indices.len() - 1
        });
        new_indices.push(new_index);
    }
    (new_indices, first_indices)
}

fn vertex_key(group: &DataGroup, i: usize) -> VertexKey {
    VertexKey {
        position: group.vertices[i].map(float_bits),
        normal: group.normals.get(i).copied().unwrap_or_default().map(float_bits),
        bones: group.bones.get(i).copied().unwrap_or_default(),
        weights: group
            .weights
            .get(i)
            .map(|w| w.as_slice().iter().copied().map(float_bits).collect())
            .unwrap_or_default(),
        keys: group.keys.get(i).copied().unwrap_or_default(),
        deltas: group
            .dverts
            .iter()
            .chain(group.dnorms.iter())
            .filter_map(|slot| slot.get(i))
            .map(|d| d.map(float_bits))
            .collect(),
    }
}

fn float_bits(value: f32) -> u32 {
    (value + 0.0).to_bits()
}

fn select<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    if values.is_empty() {
        Vec::new()
    } else {
        indices.iter().map(|i| values[*i]).collect()
    }
}

fn triangle_values<T: Copy>(values: &[T], triangles: &[[u16; 3]]) -> Vec<[T; 3]> {
    triangles
        .iter()
        .map(|t| t.map(|i| values[i as usize]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sgres_lib::IndexGroup;

    fn plane() -> GeometryData {
        // Two triangles that share an edge but not their vertices.
        GeometryData::from_mesh(
            "plane".into(),
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            vec![[0.0, 0.0, 1.0]; 6],
            vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [0.0, 1.0],
                [0.5, 0.0],
                [0.0, 0.5],
                [1.0, 1.0],
            ],
            vec![[0, 1, 2], [3, 5, 4]],
        )
    }

    #[test]
    fn merge_shared_edge() {
        let geometry = remove_doubles(plane()).unwrap();
        let group = &geometry.data_groups[0];
        assert_eq!(4, group.count);
        assert_eq!(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0]
            ],
            group.vertices
        );
        assert_eq!(vec![[0.0, 0.0, 1.0]; 4], group.normals);
        assert!(group.tex_coords.is_empty());

        let index_group = &geometry.index_groups[0];
        assert_eq!(vec![[0, 1, 2], [1, 3, 2]], index_group.indices);
        // Texture coordinates keep their original values per triangle.
        assert_eq!(
            vec![
                [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
                [[0.5, 0.0], [1.0, 1.0], [0.0, 0.5]]
            ],
            index_group.tex_coords
        );
        assert!(index_group.tex_coords2.is_empty());
    }

    #[test]
    fn idempotent() {
        let once = remove_doubles(plane()).unwrap();
        let twice = remove_doubles(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn triangle_counts_preserved() {
        let before = plane();
        let after = remove_doubles(before.clone()).unwrap();
        for (a, b) in before.index_groups.iter().zip(&after.index_groups) {
            assert_eq!(a.indices.len(), b.indices.len());
        }
        assert!(after.data_groups[0].count <= before.data_groups[0].count);
    }

    #[test]
    fn different_normals_are_kept() {
        let mut geometry = plane();
        geometry.data_groups[0].normals[3] = [0.0, 1.0, 0.0];
        let geometry = remove_doubles(geometry).unwrap();
        assert_eq!(5, geometry.data_groups[0].count);
        assert_eq!(vec![[0, 1, 2], [3, 4, 2]], geometry.index_groups[0].indices);
    }

    #[test]
    fn negative_zero_matches_zero() {
        let mut geometry = plane();
        geometry.data_groups[0].vertices[4] = [-0.0, 1.0, 0.0];
        let geometry = remove_doubles(geometry).unwrap();
        assert_eq!(4, geometry.data_groups[0].count);
    }

    #[test]
    fn rigging_distinguishes_vertices() {
        let mut geometry = plane();
        let group = &mut geometry.data_groups[0];
        group.bones = vec![Tuple4::from_slice(&[0]).unwrap(); 6];
        group.bones[3] = Tuple4::from_slice(&[1]).unwrap();
        group.weights = vec![Tuple4::from_slice(&[1.0]).unwrap(); 6];
        let geometry = remove_doubles(geometry).unwrap();

        let group = &geometry.data_groups[0];
        assert_eq!(5, group.count);
        assert_eq!(5, group.bones.len());
        assert_eq!(5, group.weights.len());
        assert_eq!(&[1], group.bones[3].as_slice());
    }

    #[test]
    fn morph_deltas_distinguish_vertices() {
        let mut geometry = plane();
        let group = &mut geometry.data_groups[0];
        group.keys = vec![Tuple4::from([0, 0, 0, 0]); 6];
        group.dverts[0] = vec![[0.0; 3]; 6];
        group.dverts[0][4] = [0.0, 0.1, 0.0];
        group.dnorms[0] = vec![[0.0; 3]; 6];
        let geometry = remove_doubles(geometry).unwrap();

        let group = &geometry.data_groups[0];
        assert_eq!(5, group.count);
        assert_eq!(5, group.dverts[0].len());
        assert_eq!(5, group.dnorms[0].len());
        assert!(group.dverts[1].is_empty());
        assert_eq!(vec![[0, 1, 2], [1, 4, 3]], geometry.index_groups[0].indices);
    }

    #[test]
    fn mask_and_tangents_discarded() {
        let mut geometry = plane();
        geometry.data_groups[0].mask = vec![[1, 2, 3, 4]; 6];
        geometry.data_groups[0].tangents = VectorData::Vector3(vec![[1.0, 0.0, 0.0]; 6]);
        let geometry = remove_doubles(geometry).unwrap();
        assert!(geometry.data_groups[0].mask.is_empty());
        assert!(geometry.data_groups[0].tangents.is_empty());
    }

    #[test]
    fn second_tex_coord_layer_moves() {
        let mut geometry = plane();
        geometry.data_groups[0].tex_coords2 = (0..6).map(|i| [i as f32, 0.0]).collect();
        let geometry = remove_doubles(geometry).unwrap();
        assert!(geometry.data_groups[0].tex_coords2.is_empty());
        assert_eq!(
            vec![
                [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
                [[3.0, 0.0], [5.0, 0.0], [4.0, 0.0]]
            ],
            geometry.index_groups[0].tex_coords2
        );
    }

    #[test]
    fn groups_without_tex_coords_unchanged() {
        let mut geometry = plane();
        geometry.data_groups[0].tex_coords.clear();
        assert_eq!(geometry.clone(), remove_doubles(geometry).unwrap());
    }

    #[test]
    fn other_data_groups_unchanged() {
        let mut geometry = plane();
        geometry.data_groups.push(geometry.data_groups[0].clone());
        geometry
            .index_groups
            .push(IndexGroup::new("other".into(), 1, vec![[3, 4, 5]]));
        geometry.data_groups[1].tex_coords.clear();

        let after = remove_doubles(geometry.clone()).unwrap();
        assert_eq!(geometry.data_groups[1], after.data_groups[1]);
        assert_eq!(geometry.index_groups[1], after.index_groups[1]);
    }

    #[test]
    fn invalid_morph_state() {
        let mut geometry = plane();
        let group = &mut geometry.data_groups[0];
        group.keys = vec![Tuple4::from([0, 0, 0, 0]); 6];
        group.dverts[0] = vec![[0.0; 3]; 6];
        group.dverts[2] = vec![[0.0; 3]; 6];
        assert_eq!(
            Err(DedupError::Format(FormatError::InvalidMorphState {
                data_group: 0,
                dverts: 0b0101,
                dnorms: 0,
                has_keys: true
            })),
            remove_doubles(geometry)
        );
    }

    #[test]
    fn bones_without_weights() {
        let mut geometry = plane();
        geometry.data_groups[0].bones = vec![Tuple4::from_slice(&[0]).unwrap(); 6];
        assert_eq!(
            Err(DedupError::Format(FormatError::InvalidRiggingData {
                data_group: 0
            })),
            remove_doubles(geometry)
        );
    }

    #[test]
    fn attribute_count_mismatch() {
        let mut geometry = plane();
        geometry.data_groups[0].normals.pop();
        assert_eq!(
            Err(DedupError::AttributeCountMismatch {
                data_group: 0,
                attribute: "normals",
                expected: 6,
                found: 5
            }),
            remove_doubles(geometry)
        );
    }

    #[test]
    fn vertex_index_out_of_range() {
        let mut geometry = plane();
        geometry.index_groups[0].indices[1] = [3, 4, 6];
        assert_eq!(
            Err(DedupError::VertexIndexOutOfRange {
                index_group: 0,
                data_group: 0,
                index: 6,
                count: 6
            }),
            remove_doubles(geometry)
        );
    }
}
