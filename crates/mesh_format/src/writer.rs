//! Serializes a [`Mesh`] back into the text format read by [`MeshParser`](crate::parser::MeshParser).
//!
//! Submesh names and shadow flags have no place in the grammar: a re-parsed submesh is named after
//! its material id and casts and receives shadows.

use std::fmt::Write;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;
use crate::parser::Metadata;

pub fn to_text(mesh: &Mesh, metadata: &Metadata) -> Result<String> {
    check_token("mesh name", &mesh.name)?;
    check_token("material library", &mesh.material_library)?;

    let mut out = String::new();
    writeln!(out, "mesh {}", mesh.name)?;
    writeln!(out, "version {}", mesh.version)?;

    if !metadata.is_empty() {
        writeln!(out, "metadata {}", metadata.len())?;
        for (key, value) in metadata {
            check_token("metadata key", key)?;
            if !is_single_spaced(value) {
                return Err(MeshError::Unrepresentable(format!(
                    "metadata value {:?} of key `{}`",
                    value, key
                )));
            }
            writeln!(out, "m {} {}", key, value)?;
        }
    }

    let n = mesh.vertex_count();
    if mesh.normals.len() != n || mesh.uvs.len() != n || mesh.mask.len() != n || mesh.flags.len() != n {
        return Err(MeshError::Unrepresentable(
            "vertex attribute arrays differ in length".into(),
        ));
    }

    writeln!(out, "vertices {}", n)?;
    for i in 0..n {
        let (p, nrm, uv) = (mesh.positions[i], mesh.normals[i], mesh.uvs[i]);
        writeln!(
            out,
            "v {} {} {} {} {} {} {} {} {} {}",
            p.x, p.y, p.z, nrm.x, nrm.y, nrm.z, uv.x, uv.y, mesh.mask[i], mesh.flags[i]
        )?;
    }

    if mesh.indices.len() % 3 != 0 {
        return Err(MeshError::Unrepresentable(
            "index count is not divisible by 3".into(),
        ));
    }

    writeln!(out, "triangles {}", mesh.triangle_count())?;
    for [i0, i1, i2] in mesh.triangles() {
        writeln!(out, "t {} {} {}", i0, i1, i2)?;
    }

    writeln!(out, "material_library {}", mesh.material_library)?;

    if !mesh.submeshes.is_empty() {
        writeln!(out, "material_assignment {}", mesh.submeshes.len())?;
        for sm in &mesh.submeshes {
            check_token("material id", &sm.material_id)?;
            writeln!(out, "m {} tris {} {}", sm.material_id, sm.tri_start, sm.tri_end)?;
        }
    }

    Ok(out)
}

// a metadata value is re-joined with single spaces by the parser
fn is_single_spaced(value: &str) -> bool {
    value
        .split(' ')
        .all(|token| !token.is_empty() && !token.contains('#') && !token.contains(char::is_whitespace))
}

// a value written as a single token must survive tokenizing and comment stripping
fn check_token(what: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains('#') || value.contains(char::is_whitespace) {
        return Err(MeshError::Unrepresentable(format!("{} {:?}", what, value)));
    }
    Ok(())
}
