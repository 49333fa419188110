use anyhow::{Context, Result};
use mesh_format::ParserOptions;
use serde::Deserialize;
use std::path::Path;

/// Import settings of a mesh, read from a `.toml` file next to it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MeshMeta {
    /// flip the winding order of every triangle after parsing
    pub(crate) reverse_winding: bool,
    /// reject lines following the last recognized block
    pub(crate) strict: bool,
}

impl MeshMeta {
    pub(crate) fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let meta: Self = toml::from_slice(&data)
            .with_context(|| format!("Invalid meta file: {}", path.display()))?;
        Ok(meta)
    }

    pub(crate) fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            reject_trailing: self.strict,
        }
    }
}
