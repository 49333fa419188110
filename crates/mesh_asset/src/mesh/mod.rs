mod meta;

use anyhow::{Context, Result};
use log::{debug, info};
use mesh_format::{Mesh, MeshParser};
use std::path::Path;

use crate::utils;

use self::meta::MeshMeta;

/// File extension of mesh description files.
pub(crate) const EXTENSION: &str = "mesh";
/// File extension of the binary output.
pub(crate) const OUTPUT_EXTENSION: &str = "vem";

fn parse(path: &Path, meta: MeshMeta) -> Result<Mesh> {
    let mut mesh = MeshParser::with_options(meta.parser_options())
        .parse_file(path)
        .with_context(|| format!("Could not parse mesh: {}", path.display()))?;

    if meta.reverse_winding {
        debug!("Reversing winding order of `{}`", mesh.name);
        mesh.reverse_winding();
    }

    Ok(mesh)
}

fn serialize(mesh: &Mesh) -> Result<Vec<u8>> {
    mesh.to_bytes().context("Could not serialize mesh")
}

fn save(path: &Path, output_dir: &Path, data: &[u8]) -> Result<()> {
    let file_name = utils::file_name(path)?;
    let target = utils::combine_path(output_dir, file_name, OUTPUT_EXTENSION);
    utils::write_file(&target, data)
}

/// Parse meta from file called `file.toml` or alternatively from folder scoped meta file named `mesh.toml` or else use default meta
fn parse_meta(path: &Path) -> Result<MeshMeta> {
    let dir = path
        .parent()
        .with_context(|| format!("Path terminates in root or prefix: {}", path.display()))?;

    let file_meta = utils::combine_path(dir, utils::file_name(path)?, "toml");
    if file_meta.is_file() {
        return MeshMeta::parse(&file_meta);
    }

    let folder_meta = utils::combine_path(dir, EXTENSION, "toml");
    if folder_meta.is_file() {
        return MeshMeta::parse(&folder_meta);
    }

    Ok(MeshMeta::default())
}

/// Parses and validates a mesh file without writing anything.
pub(crate) fn check(path: &Path) -> Result<Mesh> {
    info!("Checking mesh file: `{}`", path.display());
    parse(path, parse_meta(path)?)
}

pub(crate) fn process(path: &Path, output_dir: &Path) -> Result<()> {
    info!("Processing mesh file: `{}`", path.display());
    let mesh = parse(path, parse_meta(path)?)?;
    save(path, output_dir, &serialize(&mesh)?)
}
