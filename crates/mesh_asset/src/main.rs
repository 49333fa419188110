pub(crate) mod mesh;
pub(crate) mod utils;

use anyhow::Result;
use log::{debug, error, info, warn};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use structopt::StructOpt;
use walkdir::WalkDir;

// Cli arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "mesh_asset")]
struct CliArgs {
    /// Specify the input file or folder
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// Output directory, to place the converted files in
    #[structopt(short = "o", long = "output", default_value = "out", parse(from_os_str))]
    output: PathBuf,
    /// Only parse and validate, write nothing
    #[structopt(short = "c", long = "check")]
    check: bool,
    /// Output debug info
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

/// Happens during setup
#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Input path does not exist: {0}")]
    InputNonExistant(String),
    #[error("Output folder structure could not be created: {0}")]
    ErrorCreatingOutputStructure(#[from] io::Error),
    #[error("{0} of {1} mesh files failed")]
    Failed(usize, usize),
}

fn main() -> Result<()> {
    let args = CliArgs::from_args();

    if !args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    } else {
        env_logger::Builder::new()
            .filter(None, log::LevelFilter::Debug)
            .init();
    }

    prepare(args)
}

fn prepare(args: CliArgs) -> Result<()> {
    let input_path = args.input.as_path();
    if !input_path.exists() {
        return Err(CliError::InputNonExistant(input_path.display().to_string()).into());
    }

    let (mut total, mut failed) = (0, 0);

    for entry in WalkDir::new(input_path) {
        let path = match &entry {
            Err(err) => {
                warn!("Error parsing path: {}", err);
                continue;
            }
            Ok(entry) => entry.path(),
        };

        if path.is_dir() {
            continue;
        }

        // check extension
        match path.extension().and_then(|x| x.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case(mesh::EXTENSION) => {}
            Some("toml") => {
                debug!("Ignored toml file: {}", path.display());
                continue;
            }
            Some(_) => {
                warn!("Could not handle path: {}", path.display());
                continue;
            }
            None => {
                warn!(
                    "Ignored file \"{}\", because no file extension was found.",
                    path.display()
                );
                continue;
            }
        }

        total += 1;
        // a broken mesh is reported and the walk continues
        if let Err(err) = handle(path, input_path, &args) {
            error!("{:#}", err);
            failed += 1;
        }
    }

    info!("Handled {} mesh file(s), {} failed", total, failed);
    if failed > 0 {
        return Err(CliError::Failed(failed, total).into());
    }
    Ok(())
}

fn handle(path: &Path, input_path: &Path, args: &CliArgs) -> Result<()> {
    if args.check {
        let mesh = mesh::check(path)?;
        println!(
            "{}: ok ({} vertices, {} triangles, {} submeshes)",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.submeshes.len()
        );
        return Ok(());
    }

    let output_folder = output_folder(path, input_path, &args.output);
    if !output_folder.exists() {
        fs::create_dir_all(&output_folder).map_err(CliError::ErrorCreatingOutputStructure)?;
    }
    mesh::process(path, &output_folder)
}

// mirrors the folder structure of the input below the output directory
fn output_folder(path: &Path, input_path: &Path, output_path: &Path) -> PathBuf {
    let relative = path.strip_prefix(input_path).unwrap_or(path);
    match relative.parent() {
        Some(parent) => output_path.join(parent),
        None => output_path.to_path_buf(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_output_folder() {
        let out = Path::new("out");
        assert_eq!(
            output_folder(Path::new("assets/city/tower.mesh"), Path::new("assets"), out),
            PathBuf::from("out/city")
        );
        // a single input file lands directly in the output directory
        assert_eq!(
            output_folder(Path::new("assets/tower.mesh"), Path::new("assets/tower.mesh"), out),
            PathBuf::from("out")
        );
    }

    #[test]
    fn test_args() {
        let args = CliArgs::from_iter(["mesh_asset", "assets", "-c", "-o", "build"]);
        assert_eq!(args.input, PathBuf::from("assets"));
        assert_eq!(args.output, PathBuf::from("build"));
        assert!(args.check);
        assert!(!args.verbose);
    }
}
