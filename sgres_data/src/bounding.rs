//! Conversions for the bounding meshes stored after the index groups.
use glam::Vec3;
use sgres_lib::{BoundingMesh, GeometryData, InverseTransform};
use thiserror::Error;

use crate::Transform;

/// Errors while converting bounding meshes between spaces.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoundingError {
    #[error(
        "dynamic bounding mesh part {part} has no inverse transform, the geometry only has {transform_count} transforms"
    )]
    MissingInverseTransform { part: usize, transform_count: usize },
}

/// Transforms the vertices of each dynamic bounding mesh part from the local space of its bone into object space.
/// Part `i` uses the inverse of the inverse bind transform for global bone index `i`.
pub fn dynamic_parts_in_object_space(
    geometry: &GeometryData,
) -> Result<Vec<Option<BoundingMesh>>, BoundingError> {
    map_parts(geometry, |t| t.inverse())
}

/// Transforms each part from object space into the local space of its bone.
/// This is the inverse of [dynamic_parts_in_object_space].
pub fn dynamic_parts_in_bone_space(
    geometry: &GeometryData,
) -> Result<Vec<Option<BoundingMesh>>, BoundingError> {
    map_parts(geometry, |t| t)
}

fn map_parts(
    geometry: &GeometryData,
    space: impl Fn(Transform) -> Transform,
) -> Result<Vec<Option<BoundingMesh>>, BoundingError> {
    geometry
        .dynamic_bmesh
        .iter()
        .enumerate()
        .map(|(part, mesh)| match mesh {
            Some(mesh) => {
                let transform = inverse_transform(&geometry.inverse_transforms, part)?;
                Ok(Some(transform_mesh(mesh, &space(transform))))
            }
            None => Ok(None),
        })
        .collect()
}

fn inverse_transform(
    transforms: &[InverseTransform],
    part: usize,
) -> Result<Transform, BoundingError> {
    transforms
        .get(part)
        .map(Transform::from_inverse_transform)
        .ok_or(BoundingError::MissingInverseTransform {
            part,
            transform_count: transforms.len(),
        })
}

fn transform_mesh(mesh: &BoundingMesh, transform: &Transform) -> BoundingMesh {
    BoundingMesh {
        vertices: mesh
            .vertices
            .iter()
            .map(|v| transform.transform_point(Vec3::from(*v)).to_array())
            .collect(),
        indices: mesh.indices.clone(),
    }
}
