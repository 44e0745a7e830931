//! The geometry stored in a [GeometryDataContainer](crate::nodes::GeometryDataContainer).
//!
//! The binary format stores vertex attributes as typed sections that are assigned to data groups by index.
//! [GeometryData] stores the attributes directly on each [DataGroup] instead.
//! The section list is rebuilt from the data groups when writing,
//! so the section order and placeholder sections of the original file are not preserved.
use binrw::io::{Read, Seek, Write};
use binrw::BinReaderExt;
use sgres_write::SgWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, FormatError, SgString};

mod decode;
mod encode;
mod section;

pub use section::SectionKind;

/// The decoded contents of a geometry data container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryData {
    pub data_groups: Vec<DataGroup>,
    pub index_groups: Vec<IndexGroup>,
    /// One transform for each global bone index or empty for static geometry.
    pub inverse_transforms: Vec<InverseTransform>,
    /// One name for each morph index or empty if there are no morphs.
    pub morph_names: Vec<MorphName>,
    pub static_bmesh: Option<BoundingMesh>,
    /// One optional part for each global bone index with vertices in that bone's local space.
    pub dynamic_bmesh: Vec<Option<BoundingMesh>>,
}

impl GeometryData {
    /// Reads the geometry sub format from `reader`.
    /// This does not include the node signature or resource name.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, Error> {
        match reader.read_le::<GeometryData>() {
            Ok(geometry) => Ok(geometry),
            Err(e) => {
                let offset = reader.stream_position().unwrap_or_default();
                Err(Error::from_binrw(e, offset))
            }
        }
    }

    /// Writes the geometry sub format to `writer`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        self.sg_write(writer)?;
        Ok(())
    }

    /// Creates a single data group and index group for an unrigged triangle mesh.
    pub fn from_mesh(
        name: SgString,
        vertices: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        tex_coords: Vec<[f32; 2]>,
        indices: Vec<[u16; 3]>,
    ) -> Self {
        let group = DataGroup {
            count: vertices.len(),
            vertices,
            normals,
            tex_coords,
            ..Default::default()
        };
        Self {
            data_groups: vec![group],
            index_groups: vec![IndexGroup::new(name, 0, indices)],
            ..Default::default()
        }
    }

    /// Checks the rigging and morph invariants of every data group.
    pub fn validate(&self) -> Result<(), FormatError> {
        self.data_groups
            .iter()
            .enumerate()
            .try_for_each(|(i, g)| g.validate(i))
    }
}

/// Parallel per vertex attributes shared by one or more [IndexGroup].
///
/// Attributes are absent if their list is empty.
/// Present attributes have exactly [count](DataGroup::count) elements.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataGroup {
    pub count: usize,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// The second texture coordinate layer is only written if [tex_coords](DataGroup::tex_coords) is present.
    pub tex_coords2: Vec<[f32; 2]>,
    /// Local bone indices for each vertex.
    pub bones: Vec<Tuple4<u8>>,
    /// The weights for each bone in [bones](DataGroup::bones).
    /// At most 3 weights are written, so the last weight of a vertex with 4 bones is implicit.
    pub weights: Vec<Tuple4<f32>>,
    pub tangents: VectorData,
    /// Deform mask bytes derived from the other attributes.
    pub mask: Vec<[u8; 4]>,
    /// Morph indices for each vertex.
    /// The deltas for the morph at position `k` of a vertex's keys are stored in slot `k`.
    pub keys: Vec<Tuple4<u8>>,
    /// Position deltas for each key slot.
    /// Populated slots must form a prefix such as slots 0 and 1 but not slots 0 and 2.
    pub dverts: [Vec<[f32; 3]>; 4],
    /// Normal deltas for each key slot.
    /// The populated slots must be empty or match [dverts](DataGroup::dverts).
    pub dnorms: [Vec<[f32; 3]>; 4],
}

impl DataGroup {
    /// A bit mask with bit `k` set if [dverts](DataGroup::dverts) slot `k` is populated.
    pub fn dverts_occupancy(&self) -> u8 {
        occupancy(&self.dverts)
    }

    /// A bit mask with bit `k` set if [dnorms](DataGroup::dnorms) slot `k` is populated.
    pub fn dnorms_occupancy(&self) -> u8 {
        occupancy(&self.dnorms)
    }

    /// The number of leading populated [dverts](DataGroup::dverts) slots.
    pub fn morph_slot_count(&self) -> usize {
        self.dverts.iter().take_while(|d| !d.is_empty()).count()
    }

    /// Checks that bones have weights and that the morph slots are populated as a prefix.
    ///
    /// `data_group` is the index of this group used for error reporting.
    pub fn validate(&self, data_group: usize) -> Result<(), FormatError> {
        if !self.bones.is_empty() && self.weights.is_empty() {
            return Err(FormatError::InvalidRiggingData { data_group });
        }
        self.validate_morphs(data_group)
    }

    /// Checks only the morph slot invariants.
    pub fn validate_morphs(&self, data_group: usize) -> Result<(), FormatError> {
        let dverts = self.dverts_occupancy();
        let dnorms = self.dnorms_occupancy();
        let has_keys = !self.keys.is_empty();

        let prefix = matches!(dverts, 0b0000 | 0b0001 | 0b0011 | 0b0111 | 0b1111);
        let normals_match = dnorms == 0 || dnorms == dverts;
        let keys_match = dverts == 0 || has_keys;
        if prefix && normals_match && keys_match {
            Ok(())
        } else {
            Err(FormatError::InvalidMorphState {
                data_group,
                dverts,
                dnorms,
                has_keys,
            })
        }
    }
}

fn occupancy(slots: &[Vec<[f32; 3]>; 4]) -> u8 {
    slots
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

/// A named triangle list using the vertices of a single [DataGroup].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup {
    pub name: SgString,
    pub data_group_index: usize,
    pub indices: Vec<[u16; 3]>,
    pub flags: u32,
    /// The global bone index for each local bone index used by the data group.
    pub bones: Vec<u16>,
    /// Per triangle texture coordinates moved out of the data group by vertex deduplication.
    /// These are not written to the file.
    pub tex_coords: Vec<[[f32; 2]; 3]>,
    /// Per triangle second layer texture coordinates moved out of the data group by vertex deduplication.
    /// These are not written to the file.
    pub tex_coords2: Vec<[[f32; 2]; 3]>,
}

impl IndexGroup {
    /// Creates an index group with all flags set and no bones.
    pub fn new(name: SgString, data_group_index: usize, indices: Vec<[u16; 3]>) -> Self {
        Self {
            name,
            data_group_index,
            indices,
            flags: u32::MAX,
            bones: Vec::new(),
            tex_coords: Vec::new(),
            tex_coords2: Vec::new(),
        }
    }
}

/// A rigid transform from object space into a bone's local space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseTransform {
    /// A quaternion in `(x, y, z, w)` order.
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
}

/// The two part name of a morph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphName {
    pub group: SgString,
    pub name: SgString,
}

impl MorphName {
    /// The name parts joined by `::`.
    /**
    ```rust
    # use sgres_lib::MorphName;
    let name = MorphName { group: "body".into(), name: "fat".into() };
    assert_eq!("body::fat", name.full_name());
    ```
    */
    pub fn full_name(&self) -> String {
        format!(
            "{}::{}",
            self.group.to_string_lossy(),
            self.name.to_string_lossy()
        )
    }
}

/// A simplified triangle mesh for collision and selection.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundingMesh {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<[u16; 3]>,
}

/// Up to 4 values with an explicit length.
///
/// Unused values are always [Default::default] so equality only depends on the used values.
/**
```rust
# use sgres_lib::Tuple4;
let bones = Tuple4::from_slice(&[3u8, 7]).unwrap();
assert_eq!(&[3, 7], bones.as_slice());
assert_eq!([3, 7, 0xff, 0xff], bones.padded(0xff));
assert!(Tuple4::from_slice(&[0u8; 5]).is_none());
```
 */
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "Vec<T>",
        into = "Vec<T>",
        bound(
            serialize = "T: Serialize + Copy + Default",
            deserialize = "T: Deserialize<'de> + Copy + Default"
        )
    )
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tuple4<T> {
    values: [T; 4],
    len: u8,
}

impl<T: Copy + Default> Tuple4<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if `values` has more than 4 elements.
    pub fn from_slice(values: &[T]) -> Option<Self> {
        if values.len() > 4 {
            return None;
        }
        let mut tuple = Self::default();
        tuple.values[..values.len()].copy_from_slice(values);
        tuple.len = values.len() as u8;
        Some(tuple)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The used values followed by `fill` for the unused values.
    pub fn padded(&self, fill: T) -> [T; 4] {
        let mut values = [fill; 4];
        values[..self.len()].copy_from_slice(self.as_slice());
        values
    }
}

impl Tuple4<f32> {
    /// The weights for `bone_count` bones with the implicit last weight restored.
    ///
    /// Missing weights are zero except for the last weight, which is `1 - sum` of the stored weights.
    /**
    ```rust
    # use sgres_lib::Tuple4;
    let weights = Tuple4::from_slice(&[0.5f32, 0.25, 0.125]).unwrap();
    assert_eq!(&[0.5, 0.25, 0.125, 0.125], weights.full_weights(4).as_slice());
    assert_eq!(&[0.5, 0.25], weights.full_weights(2).as_slice());
    ```
    */
    pub fn full_weights(&self, bone_count: usize) -> Self {
        let bone_count = bone_count.min(4);
        let stored = self.len().min(bone_count);

        let mut weights = Self::default();
        weights.values[..stored].copy_from_slice(&self.values[..stored]);
        weights.len = bone_count as u8;
        if stored < bone_count {
            let sum: f32 = weights.values[..stored].iter().sum();
            weights.values[bone_count - 1] = 1.0 - sum;
        }
        weights
    }
}

impl<T> From<[T; 4]> for Tuple4<T> {
    fn from(values: [T; 4]) -> Self {
        Self { values, len: 4 }
    }
}

impl<T: Copy + Default> TryFrom<Vec<T>> for Tuple4<T> {
    type Error = String;

    fn try_from(values: Vec<T>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
            .ok_or_else(|| format!("expected at most 4 values but found {}", values.len()))
    }
}

impl<T: Copy + Default> From<Tuple4<T>> for Vec<T> {
    fn from(tuple: Tuple4<T>) -> Self {
        tuple.as_slice().to_vec()
    }
}

/// Float vectors with 2, 3 or 4 components.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Vector2(Vec<[f32; 2]>),
    Vector3(Vec<[f32; 3]>),
    Vector4(Vec<[f32; 4]>),
}

impl Default for VectorData {
    fn default() -> Self {
        VectorData::Vector3(Vec::new())
    }
}

impl VectorData {
    /// The number of vectors.
    /**
    ```rust
    # use sgres_lib::VectorData;
    let data = VectorData::Vector2(vec![[0f32, 1f32], [0f32, 1f32], [0f32, 1f32]]);
    assert_eq!(3, data.len());
    assert_eq!(2, data.component_count());
    ```
    */
    pub fn len(&self) -> usize {
        match self {
            VectorData::Vector2(v) => v.len(),
            VectorData::Vector3(v) => v.len(),
            VectorData::Vector4(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn component_count(&self) -> usize {
        match self {
            VectorData::Vector2(_) => 2,
            VectorData::Vector3(_) => 3,
            VectorData::Vector4(_) => 4,
        }
    }

    /// Selects the elements at `indices` in order.
    /// Returns `None` if any index is out of range.
    pub fn gather(&self, indices: &[usize]) -> Option<Self> {
        Some(match self {
            VectorData::Vector2(v) => VectorData::Vector2(gather(v, indices)?),
            VectorData::Vector3(v) => VectorData::Vector3(gather(v, indices)?),
            VectorData::Vector4(v) => VectorData::Vector4(gather(v, indices)?),
        })
    }

    pub(crate) fn flatten(&self) -> Vec<f32> {
        match self {
            VectorData::Vector2(v) => v.iter().flatten().copied().collect(),
            VectorData::Vector3(v) => v.iter().flatten().copied().collect(),
            VectorData::Vector4(v) => v.iter().flatten().copied().collect(),
        }
    }
}

/// Selects the elements at `indices` in order.
/// Returns `None` if any index is out of range.
pub fn gather<T: Copy>(values: &[T], indices: &[usize]) -> Option<Vec<T>> {
    indices.iter().map(|i| values.get(*i).copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn morph_group(dverts: [usize; 4], dnorms: [usize; 4], keys: usize) -> DataGroup {
        DataGroup {
            count: 1,
            vertices: vec![[0.0; 3]],
            keys: vec![Tuple4::from_slice(&[0, 1]).unwrap(); keys],
            dverts: dverts.map(|n| vec![[0.0; 3]; n]),
            dnorms: dnorms.map(|n| vec![[0.0; 3]; n]),
            ..Default::default()
        }
    }

    #[test]
    fn validate_morph_prefixes() {
        for dverts in [[0, 0, 0, 0], [1, 0, 0, 0], [1, 1, 0, 0], [1, 1, 1, 0], [1, 1, 1, 1]] {
            assert_eq!(Ok(()), morph_group(dverts, [0; 4], 1).validate(0));
            assert_eq!(Ok(()), morph_group(dverts, dverts, 1).validate(0));
        }
    }

    #[test]
    fn validate_morph_non_prefix() {
        assert_eq!(
            Err(FormatError::InvalidMorphState {
                data_group: 2,
                dverts: 0b0101,
                dnorms: 0,
                has_keys: true
            }),
            morph_group([1, 0, 1, 0], [0; 4], 1).validate(2)
        );
    }

    #[test]
    fn validate_morph_normals_mismatch() {
        assert_eq!(
            Err(FormatError::InvalidMorphState {
                data_group: 0,
                dverts: 0b0011,
                dnorms: 0b0001,
                has_keys: true
            }),
            morph_group([1, 1, 0, 0], [1, 0, 0, 0], 1).validate(0)
        );
    }

    #[test]
    fn validate_morph_no_keys() {
        assert!(matches!(
            morph_group([1, 0, 0, 0], [0; 4], 0).validate(0),
            Err(FormatError::InvalidMorphState {
                has_keys: false,
                ..
            })
        ));
    }

    #[test]
    fn validate_bones_without_weights() {
        let group = DataGroup {
            count: 1,
            vertices: vec![[0.0; 3]],
            bones: vec![Tuple4::from_slice(&[0]).unwrap()],
            ..Default::default()
        };
        assert_eq!(
            Err(FormatError::InvalidRiggingData { data_group: 1 }),
            group.validate(1)
        );
    }

    #[test]
    fn tuple4_equality_ignores_unused() {
        let a = Tuple4::from_slice(&[1u8, 2]).unwrap();
        let b = Tuple4::from_slice(&[1u8, 2, 3]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Tuple4::from_slice(&[1u8, 2]).unwrap());
        assert!(Tuple4::<u8>::new().is_empty());
    }

    #[test]
    fn full_weights_single_missing() {
        let weights = Tuple4::from_slice(&[0.75f32]).unwrap();
        assert_eq!(&[0.75, 0.25], weights.full_weights(2).as_slice());
    }

    #[test]
    fn full_weights_padded() {
        // Weights padded with zeros to the group's arity are truncated to the bone count.
        let weights = Tuple4::from_slice(&[1.0f32, 0.0, 0.0]).unwrap();
        assert_eq!(&[1.0], weights.full_weights(1).as_slice());
    }

    #[test]
    fn gather_out_of_range() {
        assert_eq!(Some(vec![3, 1]), gather(&[1, 2, 3], &[2, 0]));
        assert_eq!(None, gather(&[1, 2, 3], &[3]));
    }

    #[test]
    fn vector_data_gather() {
        let data = VectorData::Vector4(vec![[1.0; 4], [2.0; 4]]);
        assert_eq!(
            Some(VectorData::Vector4(vec![[2.0; 4], [2.0; 4], [1.0; 4]])),
            data.gather(&[1, 1, 0])
        );
    }
}
