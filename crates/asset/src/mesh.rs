//! CPU-side mesh representation produced by the loader.

/// Triangle mesh stored as parallel per-vertex arrays.
///
/// `colors` and `tex_coords` always have one entry per position. Every index
/// in `faces` is zero-based and below `vertex_count()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex with fill color/uv derived from `z`.
    pub(crate) fn push_vertex(&mut self, position: [f32; 3]) {
        let fill = position[2].sin();
        self.positions.push(position);
        self.colors.push([fill; 3]);
        self.tex_coords.push([fill; 2]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` when the mesh has neither vertices nor faces.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.faces.is_empty()
    }

    /// Flattened face indices, each shifted by `offset`. Used to pack several
    /// meshes into one shared index buffer.
    ///
    /// Returns `None` if any shifted index would not fit in a `u32`.
    pub fn indices(&self, offset: u32) -> Option<Vec<u32>> {
        let mut out = Vec::with_capacity(self.faces.len() * 3);
        for face in &self.faces {
            for &i in face {
                let Some(shifted) = i.checked_add(offset) else {
                    log::error!("Index {} + offset {} overflows u32", i, offset);
                    return None;
                };
                out.push(shifted);
            }
        }
        Some(out)
    }
}
