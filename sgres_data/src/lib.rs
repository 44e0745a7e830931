//! # sgres_data
//!
//! sgres_data provides operations on the data decoded by [sgres_lib].
//!
//! - [remove_doubles] collapses duplicate vertices before editing or exporting geometry
//! - [build_transform_tree] reconstructs the hierarchy of transform nodes from a flat node list
//! - [Transform] handles the rigid transforms stored in nodes and inverse bind transforms
//! - [bounding] converts bounding meshes between bone and object space
/*!
```no_run
use sgres_data::{build_transform_tree, remove_doubles};
use sgres_lib::{Node, ResourceFile};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let skeleton = ResourceFile::from_file("skeleton.cres")?;
let tree = build_transform_tree(&skeleton.nodes)?;
for node in tree.iter() {
    println!("{} {:?}", node.name, node.abs_transform.translation);
}

let mut file = ResourceFile::from_file("body.5gd")?;
if let Some(Node::GeometryDataContainer(container)) = file.nodes.first_mut() {
    container.geometry = remove_doubles(std::mem::take(&mut container.geometry))?;
}
# Ok(())
# }
```
 */
pub mod bounding;
pub mod dedup;
pub mod transform;
pub mod tree;

pub use bounding::BoundingError;
pub use dedup::{remove_doubles, DedupError};
pub use transform::Transform;
pub use tree::{build_transform_tree, TransformTree, TransformTreeNode, TreeError};
