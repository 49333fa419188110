//! Reading, validating and writing the line-oriented mesh description format.
//!
//! Parsing always validates before returning, so every [`Mesh`] obtained from
//! [`parse`] or [`MeshParser`] satisfies the invariants checked by [`validation::validate`].

pub mod error;
pub mod mesh;
pub mod parser;
pub mod validation;
pub mod writer;

pub use error::{MeshError, Result};
pub use mesh::{Mesh, ShadowKey, Submesh, FORMAT_VERSION};
pub use parser::{MeshDocument, MeshParser, Metadata, ParserOptions};
pub use validation::validate;

/// Parses and validates `text` with the default [`ParserOptions`].
pub fn parse(text: &str) -> Result<Mesh> {
    MeshParser::new().parse_str(text)
}
