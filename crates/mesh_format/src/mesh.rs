use crate::error::Result;
use gfx_maths::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The only format version this crate understands.
pub const FORMAT_VERSION: i64 = 1;

/// Bit 0 of a submesh shadow bitmask.
pub const SHADOW_CAST: u32 = 1;
/// Bit 1 of a submesh shadow bitmask.
pub const SHADOW_RECEIVE: u32 = 2;

/// One parsed mesh asset.
///
/// The per-vertex arrays are parallel and all hold `vertex_count()` entries once the mesh
/// passed [`validate`](crate::validation::validate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub version: i64,

    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// application defined bitmask per vertex
    pub mask: Vec<i32>,
    /// application defined bitmask per vertex
    pub flags: Vec<i32>,

    /// Triangle corners; triangle `t` occupies `indices[3t..3t + 3]`.
    pub indices: Vec<u32>,
    pub submeshes: Vec<Submesh>,

    /// Name of the external material library the submesh material ids resolve against.
    pub material_library: String,
}

/// A named, inclusive range of triangles sharing one material and one shadow behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submesh {
    pub name: String,
    pub material_id: String,
    /// first triangle (in triangle units, inclusive)
    pub tri_start: i64,
    /// last triangle (in triangle units, inclusive)
    pub tri_end: i64,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

/// Key used by consumers to batch submeshes with the same shadow behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShadowKey {
    pub casts: bool,
    pub receives: bool,
}

impl Submesh {
    pub fn new(
        name: impl Into<String>,
        material_id: impl Into<String>,
        tri_start: i64,
        tri_end: i64,
        shadow_flags: u32,
    ) -> Self {
        Self {
            name: name.into(),
            material_id: material_id.into(),
            tri_start,
            tri_end,
            casts_shadow: shadow_flags & SHADOW_CAST != 0,
            receives_shadow: shadow_flags & SHADOW_RECEIVE != 0,
        }
    }

    /// Rebuilds the shadow bitmask this submesh was created from.
    pub fn shadow_flags(&self) -> u32 {
        let mut flags = 0;
        if self.casts_shadow {
            flags |= SHADOW_CAST;
        }
        if self.receives_shadow {
            flags |= SHADOW_RECEIVE;
        }
        flags
    }

    pub fn shadow_key(&self) -> ShadowKey {
        ShadowKey {
            casts: self.casts_shadow,
            receives: self.receives_shadow,
        }
    }

    /// Number of triangles covered, 0 for an inverted range. Saturates at `usize::MAX`.
    pub fn triangle_count(&self) -> usize {
        if self.tri_end < self.tri_start {
            return 0;
        }
        self.tri_end
            .checked_sub(self.tri_start)
            .and_then(|span| span.checked_add(1))
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(usize::MAX)
    }
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the triangles in declaration order.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Flips the winding order of every triangle by swapping its second and third corner.
    ///
    /// Vertex and material data are left untouched. Applying it twice restores the original order.
    pub fn reverse_winding(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    /// The index slice covered by `submesh`, or `None` if its range does not fit this mesh.
    pub fn submesh_indices(&self, submesh: &Submesh) -> Option<&[u32]> {
        if submesh.tri_start < 0 || submesh.tri_end < submesh.tri_start {
            return None;
        }
        let start = usize::try_from(submesh.tri_start).ok()?.checked_mul(3)?;
        let end = usize::try_from(submesh.tri_end)
            .ok()?
            .checked_mul(3)?
            .checked_add(3)?;
        self.indices.get(start..end)
    }

    /// Groups the submeshes by shadow behavior, keeping declaration order within a group.
    pub fn shadow_groups(&self) -> BTreeMap<ShadowKey, Vec<&Submesh>> {
        let mut groups: BTreeMap<ShadowKey, Vec<&Submesh>> = BTreeMap::new();
        for submesh in &self.submeshes {
            groups.entry(submesh.shadow_key()).or_default().push(submesh);
        }
        groups
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize::<Mesh>(bytes)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Mesh::from_bytes(&data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self)?)
    }
}
