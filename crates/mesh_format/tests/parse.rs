use std::fs;
use std::path::Path;

use mesh_format::*;

const BOX: &str = "mesh Box
version 1
vertices 4
v 0 0 0 0 1 0 0 0 0 0
v 1 0 0 0 1 0 1 0 0 0
v 1 0 1 0 1 0 1 1 0 0
v 0 0 1 0 1 0 0 1 0 0
triangles 2
t 0 1 2
t 0 2 3
material_library lib";

fn mesh_path(name: &str) -> String {
    format!("{}/tests/meshes/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn error_line(text: &str) -> Option<usize> {
    parse(text).err().and_then(|err| err.line())
}

#[test]
fn test_box() -> Result<()> {
    let mesh = parse(BOX)?;
    assert_eq!(mesh.name, "Box");
    assert_eq!(mesh.version, 1);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(mesh.material_library, "lib");
    assert!(mesh.submeshes.is_empty());
    Ok(())
}

#[test]
fn test_index_out_of_range() {
    let text = BOX.replace("t 0 2 3", "t 0 1 5");
    match parse(&text) {
        Err(MeshError::ValidationFailed(msg)) => {
            assert!(msg.contains("= 5"), "{}", msg);
            assert!(msg.contains("vertexCount=4"), "{}", msg);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_truncated_vertices() {
    let text = "mesh Box\nversion 1\nvertices 2\nv 0 0 0 0 1 0 0 0 0 0\n";
    assert!(matches!(parse(text), Err(MeshError::UnexpectedEndOfInput)));
}

#[test]
fn test_missing_blocks() {
    assert!(matches!(parse(""), Err(MeshError::UnexpectedEndOfInput)));
    assert!(matches!(parse("# only a comment\n\n"), Err(MeshError::UnexpectedEndOfInput)));
    assert!(matches!(
        parse("mesh Box\nversion 1"),
        Err(MeshError::UnexpectedEndOfInput)
    ));

    let without_library = BOX.replace("material_library lib", "");
    assert!(matches!(
        parse(&without_library),
        Err(MeshError::UnexpectedEndOfInput)
    ));

    let wrong_library = BOX.replace("material_library lib", "materials lib");
    assert!(matches!(
        parse(&wrong_library),
        Err(MeshError::InvalidHeader(_))
    ));
}

#[test]
fn test_material_assignment() -> Result<()> {
    let mesh = parse(&format!("{}\nmaterial_assignment 1\nm wall tris 0 0", BOX))?;
    assert_eq!(mesh.submeshes.len(), 1);

    let sm = &mesh.submeshes[0];
    assert_eq!(sm.material_id, "wall");
    assert_eq!(sm.name, "wall");
    assert!(sm.casts_shadow);
    assert!(sm.receives_shadow);
    assert_eq!(sm.tri_start, 0);
    assert_eq!(sm.tri_end, 0);
    Ok(())
}

#[test]
fn test_overlapping_submeshes() -> Result<()> {
    let text = format!(
        "{}\nmaterial_assignment 3\nm a tris 0 1\nm b tris 1 1\nm a tris 0 1",
        BOX
    );
    assert_eq!(parse(&text)?.submeshes.len(), 3);
    Ok(())
}

#[test]
fn test_submesh_out_of_range() {
    let text = format!("{}\nmaterial_assignment 1\nm wall tris 1 2", BOX);
    match parse(&text) {
        Err(MeshError::ValidationFailed(msg)) => {
            assert!(msg.contains("wall"));
            assert!(msg.contains("triEnd=2"));
            assert!(msg.contains("triCount=2"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_short_vertex_line() {
    let text = BOX.replace("v 1 0 1 0 1 0 1 1 0 0", "v 1 0 1 0 1 0 1 1 0");
    match parse(&text) {
        Err(MeshError::InvalidToken { line, message }) => {
            assert_eq!(line, 6);
            assert!(message.contains("11"), "{}", message);
        }
        other => panic!("expected token error, got {:?}", other),
    }
}

#[test]
fn test_error_lines() {
    // blank and comment lines still count
    let text = BOX.replace("t 0 2 3", "\n# comment\nt 0 2 x");
    assert_eq!(error_line(&text), Some(12));

    assert_eq!(error_line(&BOX.replace("vertices 4", "vertices -4")), Some(3));
    assert_eq!(error_line(&BOX.replace("triangles 2", "triangles two")), Some(8));
    assert_eq!(
        error_line(&BOX.replace("t 0 1 2", "t 0 1 2 3")),
        Some(9)
    );
    assert_eq!(
        error_line(&BOX.replace("v 0 0 1 0 1 0 0 1 0 0", "v 0 0 1 0 1 0 0 1 0 0.5")),
        Some(7)
    );
    assert_eq!(
        error_line(&format!("{}\nmaterial_assignment 1\nm wall 0 0 0", BOX)),
        Some(13)
    );
    assert_eq!(
        error_line(&format!("{}\nmaterial_assignment x", BOX)),
        Some(12)
    );
}

#[test]
fn test_invalid_headers() {
    for text in [
        BOX.replace("mesh Box", "mesh"),
        BOX.replace("mesh Box", "mesh Box Two"),
        BOX.replace("mesh Box", "object Box"),
        BOX.replace("version 1", "version one"),
        BOX.replace("version 1", "version 2"),
        BOX.replace("vertices 4", "verts 4"),
        BOX.replace("triangles 2", "triangles"),
        BOX.replace("material_library lib", "material_library"),
    ] {
        assert!(
            matches!(parse(&text), Err(MeshError::InvalidHeader(_))),
            "{}",
            text
        );
    }
}

#[test]
fn test_blocks_are_ordered() {
    // metadata may only follow the version line
    let text = BOX.replace("triangles 2", "metadata 0\ntriangles 2");
    assert!(matches!(parse(&text), Err(MeshError::InvalidHeader(_))));
}

#[test]
fn test_trailing_content() -> Result<()> {
    let text = format!("{}\nthis is ignored\nt 0 0 0", BOX);
    assert_eq!(parse(&text)?.triangle_count(), 2);

    let strict = MeshParser::with_options(ParserOptions {
        reject_trailing: true,
    });
    strict.parse_str(BOX)?;
    assert!(matches!(
        strict.parse_str(&text),
        Err(MeshError::InvalidToken { line: 12, .. })
    ));
    Ok(())
}

#[test]
fn test_invalid_utf8() {
    let mut bytes = BOX.as_bytes().to_vec();
    bytes.push(0xff);
    assert!(matches!(
        MeshParser::new().parse_bytes(&bytes),
        Err(MeshError::InvalidHeader(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        MeshParser::new().parse_file(Path::new(&mesh_path("missing.mesh"))),
        Err(MeshError::Io(_))
    ));
}

#[test]
fn test_box_file() -> Result<()> {
    let text = fs::read_to_string(mesh_path("box.mesh"))?;
    let document = MeshParser::new().parse_document(&text)?;

    assert_eq!(
        document.metadata.get("author").map(String::as_str),
        Some("Jane Doe")
    );
    assert_eq!(
        document.metadata.get("tool").map(String::as_str),
        Some("exporter 2.1")
    );

    let mesh = document.mesh;
    assert_eq!(mesh.material_library, "city");
    assert_eq!(
        mesh.submeshes
            .iter()
            .map(|sm| sm.material_id.as_str())
            .collect::<Vec<_>>(),
        vec!["brick_wall", "floor_tiles"]
    );
    assert_eq!(mesh.submesh_indices(&mesh.submeshes[1]), Some(&[0, 2, 3][..]));
    assert_eq!(mesh.shadow_groups().len(), 1);
    Ok(())
}

#[test]
fn test_crlf_file() -> Result<()> {
    let mesh = MeshParser::new().parse_file(Path::new(&mesh_path("crlf.mesh")))?;
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.mask, vec![1, 1, 1]);
    assert_eq!(mesh.flags, vec![2, 2, 2]);
    Ok(())
}

#[test]
fn test_cr_line_breaks() -> Result<()> {
    let mesh = parse(&BOX.replace('\n', "\r"))?;
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);

    let text = BOX.replace('\n', "\r").replace("t 0 2 3", "t 0 2 x");
    assert_eq!(error_line(&text), Some(10));
    Ok(())
}

#[test]
fn test_deterministic() -> Result<()> {
    let text = fs::read(mesh_path("box.mesh"))?;
    let parser = MeshParser::new();
    assert_eq!(parser.parse_bytes(&text)?, parser.parse_bytes(&text)?);
    Ok(())
}

#[test]
fn test_reverse_winding() -> Result<()> {
    let mut mesh: Mesh = "mesh t\nversion 1\nvertices 3\n\
        v 0 0 0 0 0 1 0 0 0 0\nv 1 0 0 0 0 1 1 0 0 0\nv 0 1 0 0 0 1 0 1 0 0\n\
        triangles 1\nt 0 1 2\nmaterial_library lib"
        .parse()?;

    mesh.reverse_winding();
    assert_eq!(mesh.indices, vec![0, 2, 1]);
    mesh.reverse_winding();
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn test_text_round_trip() -> Result<()> {
    let text = fs::read_to_string(mesh_path("box.mesh"))?;
    let document = MeshParser::new().parse_document(&text)?;

    let written = writer::to_text(&document.mesh, &document.metadata)?;
    let reparsed = MeshParser::new().parse_document(&written)?;

    assert_eq!(reparsed, document);
    assert_eq!(writer::to_text(&reparsed.mesh, &reparsed.metadata)?, written);
    Ok(())
}

#[test]
fn test_binary_round_trip() -> Result<()> {
    let mesh = MeshParser::new().parse_file(Path::new(&mesh_path("box.mesh")))?;
    let decoded = Mesh::from_bytes(&mesh.to_bytes()?)?;
    assert_eq!(decoded, mesh);
    validate(&decoded)
}

fn round_trip(mesh: &Mesh) -> Result<Mesh> {
    let text = writer::to_text(mesh, &Metadata::new())?;
    parse(&text)
}

#[test]
fn test_text_round_trip_extremes() -> Result<()> {
    let floats = [
        1.5e-7,
        -2.5e12,
        f32::MAX,
        f32::MIN,
        f32::MIN_POSITIVE,
        f32::EPSILON,
        -0.0,
        0.1,
        -1.0 / 3.0,
    ];
    let n = floats.len();
    let mesh = Mesh {
        name: "extremes".into(),
        version: FORMAT_VERSION,
        positions: floats.iter().map(|&f| gfx_maths::Vec3::new(f, -f, 1.0)).collect(),
        normals: floats.iter().map(|&f| gfx_maths::Vec3::new(0.0, f, -0.0)).collect(),
        uvs: floats.iter().map(|&f| gfx_maths::Vec2::new(f, f / 7.0)).collect(),
        mask: (0..n).map(|i| if i % 2 == 0 { i32::MIN } else { i32::MAX }).collect(),
        flags: (0..n).map(|i| if i % 2 == 0 { i32::MAX } else { -1 }).collect(),
        indices: vec![0, 1, 2, (n - 1) as u32, 0, 3],
        submeshes: vec![
            Submesh::new("a", "a", 0, 1, 3),
            Submesh::new("b", "b", 1, 1, 3),
        ],
        material_library: "lib".into(),
    };
    validate(&mesh)?;

    let reparsed = round_trip(&mesh)?;
    assert_eq!(reparsed, mesh);

    // equality does not tell -0 from 0
    let bits = |m: &Mesh| {
        m.positions
            .iter()
            .chain(&m.normals)
            .flat_map(|v| [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()])
            .chain(m.uvs.iter().flat_map(|uv| [uv.x.to_bits(), uv.y.to_bits()]))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&reparsed), bits(&mesh));
    Ok(())
}

#[test]
fn test_text_round_trip_empty() -> Result<()> {
    let mesh = Mesh {
        name: "empty".into(),
        version: FORMAT_VERSION,
        material_library: "lib".into(),
        ..Mesh::default()
    };
    let reparsed = round_trip(&mesh)?;
    assert_eq!(reparsed, mesh);
    assert_eq!(reparsed.vertex_count(), 0);
    assert_eq!(reparsed.triangle_count(), 0);
    Ok(())
}
