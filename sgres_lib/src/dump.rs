//! Human readable dumps of nodes and geometry in the layout of the verbose read log.
use std::fmt::{self, Display, Formatter};

use crate::hex_string;
use crate::nodes::{
    BoneDataExtension, BoundedNode, CompositionTreeNode, DataListEntry, DataListExtension,
    DataListValue, GeometryDataContainer, GeometryNode, LightRefNode, MaterialDefinition,
    ObjectGraphNode, RenderableNode, ResourceNode, SgResource, ShapeRefNode, TransformNode,
    ViewerRefNode, ViewerRefNodeBase, ViewerRefNodeRecursive,
};
use crate::{GeometryData, Node, ResourceFile};

impl Display for SgResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "--SGResource: \"{}\"", self.name)
    }
}

impl Display for ObjectGraphNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "--Extensions ({}):", self.extensions.len())?;
        for e in self.extensions.iter() {
            writeln!(f, "  ({}, {}, {})", e.enabled, e.dependent, e.index)?;
        }
        write!(f, "--String: \"{}\"", self.name)
    }
}

impl Display for CompositionTreeNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object_graph)?;
        write!(f, "\n--Child nodes ({}):", self.children.len())?;
        for c in self.children.iter() {
            write!(f, "\n  ({}, {}, {})", c.enabled, c.dependent, c.index)?;
        }
        Ok(())
    }
}

impl Display for TransformNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cTransformNode")?;
        writeln!(f, "{}", self.composition)?;
        let t = &self.translation;
        let r = &self.rotation;
        writeln!(
            f,
            "--Transform: ({:.6}, {:.6}, {:.6}) ({:.6}, {:.6}, {:.6}, {:.6})",
            t.x, t.y, t.z, r.x, r.y, r.z, r.w
        )?;
        match self.bone_index.0 {
            Some(index) => write!(f, "--Bone index: {index}"),
            None => write!(f, "--Bone index: None"),
        }
    }
}

impl Display for BoundedNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "_B{{\n{}\n}}B_", self.transform)
    }
}

impl Display for RenderableNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "_R{{\n{}", self.bounded)?;
        let [a, b] = self.unk1.to_le_bytes();
        writeln!(f, "--Numbers: ({a}, {b})")?;
        let groups: Vec<_> = self
            .render_groups
            .iter()
            .map(|g| format!("\"{g}\""))
            .collect();
        writeln!(f, "--Strings: [{}]", groups.join(", "))?;
        write!(f, "--Unknown: {}\n}}R_", hex_string(&self.unk2))
    }
}

impl Display for ResourceNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cResourceNode")?;
        writeln!(f, "{}", self.resource)?;
        writeln!(f, "{}", self.composition)?;
        write!(f, "--Unknown: {}", hex_string(&self.unk1))
    }
}

impl Display for ShapeRefNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cShapeRefNode (version: 0x{:02X})", self.version)?;
        writeln!(f, "{}", self.renderable)?;
        writeln!(f, "--Shapes ({}):", self.shapes.len())?;
        for s in self.shapes.iter() {
            writeln!(f, "  {:02X} {:02X} ( {} )", s.enabled, s.dependent, s.index)?;
        }
        writeln!(f, "--Unknown 1: {}", hex_string(&self.unk1))?;
        writeln!(f, "--Morph data ({}):", self.morph_data.len())?;
        for d in self.morph_data.iter() {
            writeln!(f, "  {}", hex_string(d))?;
        }
        if let Some(names) = &self.morph_names {
            let names: Vec<_> = names.iter().map(|n| format!("\"{n}\"")).collect();
            writeln!(f, "--Strings: [{}]", names.join(", "))?;
        }
        write!(f, "--Unknown 2: {}", hex_string(&self.unk2))
    }
}

impl Display for DataListEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_entry(f, self, "")
    }
}

fn write_entry(f: &mut Formatter<'_>, entry: &DataListEntry, indent: &str) -> fmt::Result {
    let name = &entry.name;
    match &entry.value {
        DataListValue::Int(v) => write!(f, "{indent}--Property \"{name}\": {v}"),
        DataListValue::Float(v) => write!(f, "{indent}--Property \"{name}\": {v:.6}"),
        DataListValue::Vector3(v) => write!(
            f,
            "{indent}--Property \"{name}\": ({:.6}, {:.6}, {:.6})",
            v.x, v.y, v.z
        ),
        DataListValue::String(v) => write!(f, "{indent}--Property \"{name}\": \"{v}\""),
        DataListValue::List(entries) => {
            write!(f, "{indent}--Property list \"{name}\" ({}):", entries.len())?;
            let child_indent = format!("{indent}  ");
            for e in entries {
                writeln!(f)?;
                write_entry(f, e, &child_indent)?;
            }
            Ok(())
        }
        DataListValue::Vector4(v) => write!(
            f,
            "{indent}--Property \"{name}\": ({:.6}, {:.6}, {:.6}, {:.6})",
            v.x, v.y, v.z, v.w
        ),
        DataListValue::Bytes(v) => write!(
            f,
            "{indent}--Property \"{name}\" ({} bytes): {}",
            v.len(),
            hex_string(v)
        ),
    }
}

impl Display for DataListExtension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "cDataListExtension")?;
        if let (Some("footprint"), DataListValue::List(patterns)) =
            (self.entry.name.to_str(), &self.entry.value)
        {
            let rendered: Option<Vec<_>> = patterns
                .iter()
                .map(|p| match &p.value {
                    DataListValue::List(cells) => footprint_pattern(cells)
                        .map(|s| format!("--Footprint pattern \"{}\":\n{s}", p.name)),
                    _ => None,
                })
                .collect();
            if let Some(rendered) = rendered {
                return write!(f, " (footprint)\n{}", rendered.join("\n"));
            }
        }
        write!(f, "\n{}", self.entry)
    }
}

/// Renders the 16x16 occupancy grid of each tile in a footprint pattern
/// or `None` if the pattern is missing its bounds or tiles.
fn footprint_pattern(cells: &[DataListEntry]) -> Option<String> {
    let value = |name: &str| cells.iter().find(|c| c.name.to_str() == Some(name)).map(|c| &c.value);
    let int = |name: &str| match value(name) {
        Some(DataListValue::Int(v)) => Some(*v),
        _ => None,
    };
    let (min_x, max_x) = (int("minx")?, int("maxx")?);
    let (min_y, max_y) = (int("miny")?, int("maxy")?);

    let mut s = String::new();
    for y in (min_y..=max_y).rev() {
        let mut rows = vec![String::new(); 16];
        for x in min_x..=max_x {
            let key = format!("({x},{y})");
            let bytes = match value(&key) {
                Some(DataListValue::Bytes(b)) if b.len() >= 32 => b,
                _ => return None,
            };
            for (i, pair) in bytes[..32].chunks_exact(2).enumerate() {
                let bits = u16::from_le_bytes([pair[0], pair[1]]);
                let row = &mut rows[15 - i];
                for bit in 0..16 {
                    row.push(if bits & (1 << bit) != 0 { 'X' } else { '.' });
                }
                row.push(' ');
            }
            s.push_str(&format!("{key:<16} "));
        }
        s.push('\n');
        s.push_str(&rows.join("\n"));
        if y != min_y {
            s.push('\n');
        }
    }
    Some(s)
}

impl Display for BoneDataExtension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cBoneDataExtension (version: 0x{:02X})", self.version)?;
        writeln!(f, "--Unknown: {}", hex_string(&self.unk1))?;
        writeln!(f, "--Float: {:.6}", self.unk2)?;
        let q = &self.rotation;
        write!(f, "--Quaternion: ({:.6} {:.6} {:.6} {:.6})", q.x, q.y, q.z, q.w)
    }
}

impl Display for LightRefNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cLightRefNode")?;
        writeln!(f, "{}", self.renderable)?;
        let l = &self.light;
        writeln!(
            f,
            "--Linked resource index: {:02X} {:02X} ( {} )",
            l.enabled, l.dependent, l.index
        )?;
        write!(f, "--Unknown: {}", hex_string(&self.unk1))
    }
}

impl Display for ViewerRefNodeBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "_VB{{\n{}\n}}VB_", self.renderable)
    }
}

fn write_data_lines(f: &mut Formatter<'_>, data: &[u8]) -> fmt::Result {
    write!(f, "--Data:")?;
    for line in data.chunks(16) {
        write!(f, "\n{}", hex_string(line))?;
    }
    Ok(())
}

impl Display for ViewerRefNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cViewerRefNode (version: 0x{:02X})", self.version)?;
        writeln!(f, "{}", self.base)?;
        write_data_lines(f, &self.data)
    }
}

impl Display for ViewerRefNodeRecursive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cViewerRefNodeRecursive")?;
        writeln!(f, "{}", self.base)?;
        writeln!(f, "--Unknown: {:02X}", self.unk1)?;
        writeln!(f, "--String: \"{}\"", self.name)?;
        write_data_lines(f, &self.data)
    }
}

impl Display for GeometryNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cGeometryNode")?;
        writeln!(f, "{}", self.object_graph)?;
        writeln!(f, "{}", self.resource)?;
        write!(f, "--Unknown: {}", hex_string(&self.unk1))
    }
}

impl Display for MaterialDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cMaterialDefinition")?;
        writeln!(f, "{}", self.resource)?;
        writeln!(f, "--Name: \"{}\"", self.name)?;
        writeln!(f, "--Type: \"{}\"", self.material_type)?;
        writeln!(f, "--Properties ({}):", self.properties.len())?;
        for p in self.properties.iter() {
            writeln!(f, "  \"{}\": \"{}\"", p.name, p.value)?;
        }
        write!(f, "--References ({}):", self.references.len())?;
        for r in self.references.iter() {
            write!(f, "\n  \"{r}\"")?;
        }
        Ok(())
    }
}

impl Display for GeometryDataContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "cGeometryDataContainer")?;
        writeln!(f, "{}", self.resource)?;
        write!(f, "{}", self.geometry)
    }
}

impl Display for GeometryData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "--Data groups ({}):", self.data_groups.len())?;
        for (i, g) in self.data_groups.iter().enumerate() {
            let present = [
                !g.vertices.is_empty(),
                !g.normals.is_empty(),
                !g.tex_coords.is_empty(),
                !g.tex_coords2.is_empty(),
                !g.bones.is_empty(),
                !g.weights.is_empty(),
                !g.tangents.is_empty(),
                !g.mask.is_empty(),
                !g.keys.is_empty(),
            ];
            let format: String = "VNT2BWXMK"
                .chars()
                .zip(present)
                .filter_map(|(c, p)| p.then_some(c))
                .collect();
            write!(f, "  {i} - Elements:{:>5}, vertex: <{format}", g.count)?;
            let dverts = g.dverts.iter().filter(|d| !d.is_empty()).count();
            if dverts > 0 {
                write!(f, " dV({dverts})")?;
            }
            let dnorms = g.dnorms.iter().filter(|d| !d.is_empty()).count();
            if dnorms > 0 {
                write!(f, " dN({dnorms})")?;
            }
            writeln!(f, ">")?;
        }

        writeln!(f, "--Index groups ({}):", self.index_groups.len())?;
        for (i, g) in self.index_groups.iter().enumerate() {
            writeln!(
                f,
                "  {i} - Name: \"{}\", triangles: {}, data group: {}",
                g.name,
                g.indices.len(),
                g.data_group_index
            )?;
        }

        write_count(f, "Inverse transforms", self.inverse_transforms.len())?;
        writeln!(f)?;
        write_count(f, "Morphs", self.morph_names.len())?;
        writeln!(f)?;

        let mut bmesh = Vec::new();
        if self.static_bmesh.is_some() {
            bmesh.push("static".to_string());
        }
        if !self.dynamic_bmesh.is_empty() {
            bmesh.push(format!("dynamic ({})", self.dynamic_bmesh.len()));
        }
        if bmesh.is_empty() {
            write!(f, "--Bounding geometry: None")
        } else {
            write!(f, "--Bounding geometry: {}", bmesh.join(", "))
        }
    }
}

fn write_count(f: &mut Formatter<'_>, name: &str, count: usize) -> fmt::Result {
    if count == 0 {
        write!(f, "--{name}: None")
    } else {
        write!(f, "--{name}: {count}")
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Resource(n) => n.fmt(f),
            Node::Transform(n) => n.fmt(f),
            Node::ShapeRef(n) => n.fmt(f),
            Node::DataListExtension(n) => n.fmt(f),
            Node::BoneDataExtension(n) => n.fmt(f),
            Node::LightRef(n) => n.fmt(f),
            Node::ViewerRef(n) => n.fmt(f),
            Node::ViewerRefRecursive(n) => n.fmt(f),
            Node::GeometryNode(n) => n.fmt(f),
            Node::GeometryDataContainer(n) => n.fmt(f),
            Node::MaterialDefinition(n) => n.fmt(f),
        }
    }
}

impl Display for ResourceFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.resource_name() {
            Some(name) => writeln!(f, "Resource name: \"{name}\"")?,
            None => writeln!(f, "Resource name: None")?,
        }
        writeln!(f, "Linked resources ({}):", self.linked_resources.len())?;
        for r in self.linked_resources.iter() {
            writeln!(
                f,
                "{:08X} - {:08X} - {:08X} - {:08X}",
                r.group_id, r.instance_id, r.resource_id, r.type_id
            )?;
        }
        write!(f, "Number of nodes: {}", self.nodes.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "\n  {i}: {}", node.node_type().name())?;
        }
        Ok(())
    }
}
