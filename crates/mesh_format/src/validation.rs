use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Checks the cross-referential invariants of a parsed mesh and stops at the first violation.
///
/// Submesh ranges may overlap each other and need not cover every triangle.
pub fn validate(mesh: &Mesh) -> Result<()> {
    let n = mesh.vertex_count();

    check_len("Normals", mesh.normals.len(), n)?;
    check_len("UV", mesh.uvs.len(), n)?;
    check_len("Mask", mesh.mask.len(), n)?;
    check_len("Flags", mesh.flags.len(), n)?;

    if mesh.indices.len() % 3 != 0 {
        return Err(MeshError::ValidationFailed(
            "Index count is not divisible by 3".into(),
        ));
    }

    if let Some((i, idx)) = mesh
        .indices
        .iter()
        .enumerate()
        .find(|&(_, &idx)| idx as usize >= n)
    {
        return Err(MeshError::ValidationFailed(format!(
            "Index out of range at indices[{}] = {}, vertexCount={}",
            i, idx, n
        )));
    }

    let tri_count = mesh.triangle_count() as i64;
    for sm in &mesh.submeshes {
        if sm.tri_start < 0 || sm.tri_end < sm.tri_start {
            return Err(MeshError::ValidationFailed(format!(
                "Submesh {} has invalid tri range",
                sm.name
            )));
        }
        if sm.tri_end >= tri_count {
            return Err(MeshError::ValidationFailed(format!(
                "Submesh {} triEnd out of bounds (triEnd={}, triCount={})",
                sm.name, sm.tri_end, tri_count
            )));
        }
    }

    Ok(())
}

fn check_len(what: &str, len: usize, vertex_count: usize) -> Result<()> {
    if len != vertex_count {
        return Err(MeshError::ValidationFailed(format!(
            "{} count != vertex count ({} != {})",
            what, len, vertex_count
        )));
    }
    Ok(())
}
