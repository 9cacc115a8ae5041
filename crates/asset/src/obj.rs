//! Line-oriented loader for the `v x y z` / `f a b c` mesh text subset.
//!
//! Malformed lines never abort a load: a bad vertex is zero-filled, a bad face
//! is dropped, and both are reported through `log`. A file that cannot be read
//! yields an empty [`Mesh`].

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result};

use crate::mesh::Mesh;

/// Load a mesh from a file path. Read failures are logged and produce an
/// empty mesh.
pub fn load_mesh_from_path(path: impl AsRef<Path>) -> Mesh {
    let path = path.as_ref();
    match try_load_mesh_from_path(path) {
        Ok(mesh) => mesh,
        Err(err) => {
            let not_found = err
                .root_cause()
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
            if not_found {
                log::error!("Mesh file not found: {}", path.display());
            } else {
                log::error!("{err:#}");
            }
            Mesh::default()
        }
    }
}

/// Like [`load_mesh_from_path`] but hands read failures back to the caller.
pub fn try_load_mesh_from_path(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mesh file: {}", path.display()))?;
    log::info!("Loading mesh from {}", path.display());
    Ok(parse_mesh(&contents))
}

/// Load a mesh from any [`Read`] implementation. Read failures are logged and
/// produce an empty mesh.
pub fn load_mesh_from_reader<R: Read>(mut reader: R) -> Mesh {
    let mut contents = String::new();
    match reader.read_to_string(&mut contents) {
        Ok(_) => parse_mesh(&contents),
        Err(err) => {
            log::error!("Failed to read mesh data: {err}");
            Mesh::default()
        }
    }
}

/// Parse mesh text already in memory.
pub fn load_mesh_from_str(contents: &str) -> Mesh {
    parse_mesh(contents)
}

fn parse_mesh(contents: &str) -> Mesh {
    let mut mesh = Mesh::new();

    for (line_no, raw) in contents.split('\n').enumerate() {
        // Only a CR left over from CRLF endings is stripped; all other
        // whitespace is significant.
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(rest) = line.strip_prefix("v ") {
            let Some(fields) = split_fields(rest) else {
                log::warn!("Malformed vertex on line {}: '{}'", line_no + 1, line);
                continue;
            };
            let position = match fields.map(str::parse::<f32>) {
                [Ok(x), Ok(y), Ok(z)] => [x, y, z],
                _ => {
                    log::warn!(
                        "Unparsable vertex on line {}: '{}', using origin",
                        line_no + 1,
                        line
                    );
                    [0.0; 3]
                }
            };
            mesh.push_vertex(position);
        } else if let Some(rest) = line.strip_prefix("f ") {
            let face = split_fields(rest).and_then(|fields| match fields.map(str::parse::<u32>) {
                [Ok(a), Ok(b), Ok(c)] if a > 0 && b > 0 && c > 0 => Some([a - 1, b - 1, c - 1]),
                _ => None,
            });
            match face {
                Some(face) => mesh.faces.push(face),
                None => log::warn!("Malformed face on line {}: '{}'", line_no + 1, line),
            }
        }
        // Anything else (comments, vn, vt, o, g, usemtl, ...) is skipped.
    }

    let vertex_count = mesh.positions.len();
    let before = mesh.faces.len();
    mesh.faces
        .retain(|face| face.iter().all(|&i| (i as usize) < vertex_count));
    let dropped = before - mesh.faces.len();
    if dropped > 0 {
        log::warn!(
            "Dropped {} face(s) referencing vertices beyond {}",
            dropped,
            vertex_count
        );
    }

    log::info!(
        "Mesh parsed: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    );
    mesh
}

/// Split on single spaces, requiring exactly three fields.
fn split_fields(rest: &str) -> Option<[&str; 3]> {
    let mut parts = rest.split(' ');
    let fields = [parts.next()?, parts.next()?, parts.next()?];
    parts.next().is_none().then_some(fields)
}
