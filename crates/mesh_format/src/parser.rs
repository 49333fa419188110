//! Parser for the line-oriented mesh description format.
//!
//! ```text
//! mesh <name>
//! version <int>
//! [metadata <count>
//!   m <key> <value...>                    x count]
//! vertices <count>
//!   v px py pz nx ny nz u v mask flags    x count
//! triangles <count>
//!   t i0 i1 i2                            x count
//! material_library <name>
//! [material_assignment <count>
//!   m <materialId> tris <start> <end>     x count]
//! ```
//!
//! `#` starts a comment anywhere on a line, blank lines are ignored. Blocks are strictly ordered.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use gfx_maths::*;
use log::{debug, info, warn};

use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, Submesh, FORMAT_VERSION, SHADOW_CAST, SHADOW_RECEIVE};
use crate::validation;

/// Key/value pairs of the optional `metadata` block. A repeated key keeps the last value.
pub type Metadata = BTreeMap<String, String>;

/// Every submesh read from a `material_assignment` block casts and receives shadows.
const ASSIGNMENT_SHADOW_FLAGS: u32 = SHADOW_CAST | SHADOW_RECEIVE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Fail on lines following the last recognized block instead of ignoring them.
    pub reject_trailing: bool,
}

/// A parsed and validated mesh together with the metadata block of its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshDocument {
    pub mesh: Mesh,
    pub metadata: Metadata,
}

/// Stateless parser; one instance can be shared between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshParser {
    options: ParserOptions,
}

/// A retained source line, split into tokens.
#[derive(Debug, PartialEq)]
struct Line<'a> {
    /// 1-based line number in the original text
    number: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    fn keyword(&self) -> Option<&'a str> {
        self.tokens.first().copied()
    }
}

struct Lines<'a> {
    lines: Vec<Line<'a>>,
    cursor: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: preprocess(text),
            cursor: 0,
        }
    }

    fn next(&mut self) -> Result<&Line<'a>> {
        let line = self
            .lines
            .get(self.cursor)
            .ok_or(MeshError::UnexpectedEndOfInput)?;
        self.cursor += 1;
        Ok(line)
    }

    /// Looks at the next line without consuming it.
    fn peek(&self) -> Option<&Line<'a>> {
        self.lines.get(self.cursor)
    }

    fn remaining(&self) -> usize {
        self.lines.len() - self.cursor
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

// splits on every line break, `\r\n` counts as one
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        if c == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
        }
        start = chars.peek().map_or(text.len(), |&(j, _)| j);
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

// drops blank lines and comments, keeps the original line numbers
fn preprocess(text: &str) -> Vec<Line<'_>> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let content = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
            if content.is_empty() {
                None
            } else {
                Some(Line {
                    number: i + 1,
                    tokens: tokenize(content),
                })
            }
        })
        .collect()
}

// splits on runs of spaces and tabs
fn tokenize(content: &str) -> Vec<&str> {
    content
        .split(|c: char| c == ' ' || c == '\t')
        .filter(|token| !token.is_empty())
        .collect()
}

impl MeshParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    pub fn parse_str(&self, text: &str) -> Result<Mesh> {
        Ok(self.parse_document(text)?.mesh)
    }

    pub fn parse_bytes(&self, data: &[u8]) -> Result<Mesh> {
        let text = std::str::from_utf8(data)
            .map_err(|_| MeshError::InvalidHeader("File is not valid UTF-8.".into()))?;
        self.parse_str(text)
    }

    pub fn parse_file(&self, path: &Path) -> Result<Mesh> {
        let data = std::fs::read(path)?;
        self.parse_bytes(&data)
    }

    /// Parses and validates `text`, also returning the metadata block.
    pub fn parse_document(&self, text: &str) -> Result<MeshDocument> {
        info!("Parsing mesh resource");
        match self.parse_and_validate(text) {
            Ok(document) => {
                let mesh = &document.mesh;
                info!(
                    "Mesh `{}` parsed successfully: {} vertices, {} triangles, {} submeshes",
                    mesh.name,
                    mesh.vertex_count(),
                    mesh.triangle_count(),
                    mesh.submeshes.len()
                );
                Ok(document)
            }
            Err(err) => {
                warn!("Parsing failed: {}", err);
                Err(err)
            }
        }
    }

    fn parse_and_validate(&self, text: &str) -> Result<MeshDocument> {
        let mut lines = Lines::new(text);

        let name = header(lines.next()?, "mesh", "mesh <name>")?.to_owned();
        let version = parse_version(lines.next()?)?;
        let metadata = parse_metadata(&mut lines)?;

        let line = lines.next()?;
        let vertex_count = parse_count(line, header(line, "vertices", "vertices <count>")?, "vertex")?;

        let capacity = vertex_count.min(lines.remaining());
        let mut positions = Vec::with_capacity(capacity);
        let mut normals = Vec::with_capacity(capacity);
        let mut uvs = Vec::with_capacity(capacity);
        let mut mask = Vec::with_capacity(capacity);
        let mut flags = Vec::with_capacity(capacity);

        for _ in 0..vertex_count {
            let vertex = parse_vertex(lines.next()?)?;
            positions.push(vertex.position);
            normals.push(vertex.normal);
            uvs.push(vertex.uv);
            mask.push(vertex.mask);
            flags.push(vertex.flags);
        }

        let line = lines.next()?;
        let triangle_count =
            parse_count(line, header(line, "triangles", "triangles <count>")?, "triangle")?;

        // bounds are checked by the validator
        let mut indices = Vec::with_capacity(triangle_count.min(lines.remaining()) * 3);
        for _ in 0..triangle_count {
            indices.extend_from_slice(&parse_triangle(lines.next()?)?);
        }

        let material_library = parse_material_library(lines.next()?)?;
        let submeshes = parse_material_assignment(&mut lines)?;

        if let Some(line) = lines.peek() {
            if self.options.reject_trailing {
                return Err(MeshError::token(
                    line.number,
                    format!("Unexpected trailing content `{}`", line.tokens.join(" ")),
                ));
            }
            debug!(
                "Ignoring {} trailing line(s) starting at line {}",
                lines.remaining(),
                line.number
            );
        }

        let mesh = Mesh {
            name,
            version,
            positions,
            normals,
            uvs,
            mask,
            flags,
            indices,
            submeshes,
            material_library,
        };

        validation::validate(&mesh)?;

        Ok(MeshDocument { mesh, metadata })
    }
}

impl FromStr for Mesh {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        MeshParser::new().parse_str(s)
    }
}

// a mandatory `<keyword> <value>` line, returns the value
fn header<'a>(line: &Line<'a>, keyword: &str, shape: &str) -> Result<&'a str> {
    match line.tokens.as_slice() {
        [k, value] if *k == keyword => Ok(*value),
        _ => Err(MeshError::InvalidHeader(format!(
            "Expected `{}` at line {}",
            shape, line.number
        ))),
    }
}

fn parse_version(line: &Line) -> Result<i64> {
    let version = header(line, "version", "version <int>")?
        .parse::<i64>()
        .map_err(|_| {
            MeshError::InvalidHeader(format!("Expected `version <int>` at line {}", line.number))
        })?;

    if version != FORMAT_VERSION {
        return Err(MeshError::InvalidHeader(format!(
            "Unsupported version {} at line {}, expected {}",
            version, line.number, FORMAT_VERSION
        )));
    }
    Ok(version)
}

fn parse_count(line: &Line, token: &str, what: &str) -> Result<usize> {
    let count = token
        .parse::<i64>()
        .map_err(|_| MeshError::count(line.number, format!("Invalid {} count `{}`", what, token)))?;

    usize::try_from(count)
        .map_err(|_| MeshError::count(line.number, format!("Negative {} count {}", what, count)))
}

// the count of an optional block header, whose keyword was already matched
fn block_count(line: &Line, what: &str) -> Result<usize> {
    match line.tokens.as_slice() {
        [_, token] => parse_count(line, token, what),
        _ => Err(MeshError::count(line.number, format!("Invalid {} count", what))),
    }
}

fn parse_metadata(lines: &mut Lines) -> Result<Metadata> {
    let mut metadata = Metadata::new();

    if lines.peek().and_then(Line::keyword) != Some("metadata") {
        return Ok(metadata);
    }
    let count = block_count(lines.next()?, "metadata")?;

    for _ in 0..count {
        let line = lines.next()?;
        match line.tokens.as_slice() {
            ["m", key, value @ ..] if !value.is_empty() => {
                let value = value.join(" ");
                debug!("Metadata: {} = {:?}", key, value);
                metadata.insert((*key).to_owned(), value);
            }
            _ => return Err(MeshError::token(line.number, "Expected `m <key> <value>`")),
        }
    }

    Ok(metadata)
}

struct VertexLine {
    position: Vec3,
    normal: Vec3,
    uv: Vec2,
    mask: i32,
    flags: i32,
}

fn parse_vertex(line: &Line) -> Result<VertexLine> {
    let t = &line.tokens;
    if t.len() != 11 || t[0] != "v" {
        return Err(MeshError::token(
            line.number,
            format!(
                "Expected vertex line with 11 tokens: `v px py pz nx ny nz u v mask flags`, found {} tokens",
                t.len()
            ),
        ));
    }

    let mut floats = [0.0f32; 8];
    for (value, token) in floats.iter_mut().zip(&t[1..9]) {
        *value = parse_number(line, token, "Vertex has invalid float field")?;
    }

    Ok(VertexLine {
        position: Vec3::new(floats[0], floats[1], floats[2]),
        normal: Vec3::new(floats[3], floats[4], floats[5]),
        uv: Vec2::new(floats[6], floats[7]),
        mask: parse_number(line, t[9], "Vertex has invalid mask")?,
        flags: parse_number(line, t[10], "Vertex has invalid flags")?,
    })
}

fn parse_triangle(line: &Line) -> Result<[u32; 3]> {
    match line.tokens.as_slice() {
        ["t", i0, i1, i2] => {
            let message = "Triangle has invalid integer index";
            Ok([
                parse_number(line, i0, message)?,
                parse_number(line, i1, message)?,
                parse_number(line, i2, message)?,
            ])
        }
        _ => Err(MeshError::token(
            line.number,
            "Expected triangle line: `t i0 i1 i2`",
        )),
    }
}

fn parse_number<T: FromStr>(line: &Line, token: &str, message: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| MeshError::token(line.number, format!("{} `{}`", message, token)))
}

fn parse_material_library(line: &Line) -> Result<String> {
    if line.keyword() != Some("material_library") {
        return Err(MeshError::InvalidHeader(format!(
            "Missing `material_library <name>` block at line {}",
            line.number
        )));
    }
    Ok(header(line, "material_library", "material_library <name>")?.to_owned())
}

fn parse_material_assignment(lines: &mut Lines) -> Result<Vec<Submesh>> {
    if lines.peek().and_then(Line::keyword) != Some("material_assignment") {
        return Ok(Vec::new());
    }
    let count = block_count(lines.next()?, "submeshes")?;

    let mut submeshes = Vec::with_capacity(count.min(lines.remaining()));
    for _ in 0..count {
        submeshes.push(parse_submesh(lines.next()?)?);
    }
    Ok(submeshes)
}

fn parse_submesh(line: &Line) -> Result<Submesh> {
    let invalid = || {
        MeshError::token(
            line.number,
            "Expected submesh line: `m <id> tris <start> <end>`",
        )
    };

    match line.tokens.as_slice() {
        ["m", material_id, "tris", start, end] => {
            let start = start.parse::<i64>().map_err(|_| invalid())?;
            let end = end.parse::<i64>().map_err(|_| invalid())?;
            Ok(Submesh::new(
                *material_id,
                *material_id,
                start,
                end,
                ASSIGNMENT_SHADOW_FLAGS,
            ))
        }
        _ => Err(invalid()),
    }
}
