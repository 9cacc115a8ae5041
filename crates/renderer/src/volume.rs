//! Renderable volumes: geometry accessors plus model-matrix state.

use std::path::Path;

use asset::{Mesh, obj};
use corelib::{Mat4, Vec3, transform::Transform};

/// What the render side needs from anything drawable.
pub trait Volume {
    fn vertices(&self) -> &[[f32; 3]];
    /// Flattened triangle indices, each shifted by `offset`. `None` when a
    /// shifted index would overflow `u32`.
    fn indices(&self, offset: u32) -> Option<Vec<u32>>;
    fn colors(&self) -> &[[f32; 3]];
    fn tex_coords(&self) -> &[[f32; 2]];
    fn transform(&self) -> &Transform;
    fn transform_mut(&mut self) -> &mut Transform;

    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Recomputed from the current transform on every call.
    fn model_matrix(&self) -> Mat4 {
        self.transform().matrix()
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform_mut().position = position;
    }

    fn set_rotation(&mut self, rotation: Vec3) {
        self.transform_mut().rotation = rotation;
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.transform_mut().scale = scale;
    }
}

/// Volume backed by a loaded [`Mesh`].
#[derive(Clone, Debug, Default)]
pub struct MeshVolume {
    mesh: Mesh,
    transform: Transform,
}

impl MeshVolume {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            transform: Transform::identity(),
        }
    }

    /// Load from a mesh file. An unreadable file gives an empty volume.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(obj::load_mesh_from_path(path))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Volume for MeshVolume {
    fn vertices(&self) -> &[[f32; 3]] {
        &self.mesh.positions
    }

    fn indices(&self, offset: u32) -> Option<Vec<u32>> {
        self.mesh.indices(offset)
    }

    fn colors(&self) -> &[[f32; 3]] {
        &self.mesh.colors
    }

    fn tex_coords(&self) -> &[[f32; 2]] {
        &self.mesh.tex_coords
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

/// Several volumes concatenated for one shared vertex/index buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedGeometry {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// `(first_index, index_count)` per input volume.
    pub ranges: Vec<(usize, usize)>,
}

impl PackedGeometry {
    /// Returns `None` if the combined vertex count no longer fits in `u32`
    /// index space.
    pub fn pack(volumes: &[&dyn Volume]) -> Option<Self> {
        let mut packed = Self::default();
        for volume in volumes {
            let Ok(base) = u32::try_from(packed.positions.len()) else {
                log::error!(
                    "Too many packed vertices for u32 indices (>{})",
                    u32::MAX
                );
                return None;
            };
            let indices = volume.indices(base)?;
            packed.ranges.push((packed.indices.len(), indices.len()));
            packed.indices.extend(indices);
            packed.positions.extend_from_slice(volume.vertices());
            packed.colors.extend_from_slice(volume.colors());
            packed.tex_coords.extend_from_slice(volume.tex_coords());
        }
        log::debug!(
            "Packed {} volume(s): {} vertices, {} indices",
            volumes.len(),
            packed.positions.len(),
            packed.indices.len()
        );
        Some(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::obj::load_mesh_from_str;
    use corelib::vec3;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn accessors_expose_mesh_data() {
        let volume = MeshVolume::new(load_mesh_from_str(TRIANGLE));
        assert_eq!(volume.vertex_count(), 3);
        assert_eq!(volume.indices(0), Some(vec![0, 1, 2]));
        assert_eq!(volume.indices(5), Some(vec![5, 6, 7]));
        assert_eq!(volume.indices(u32::MAX), None);
        assert_eq!(volume.colors().len(), 3);
        assert_eq!(volume.tex_coords().len(), 3);
    }

    #[test]
    fn model_matrix_tracks_state() {
        let mut volume = MeshVolume::new(load_mesh_from_str(TRIANGLE));
        assert_eq!(volume.model_matrix(), Mat4::IDENTITY);

        volume.set_position(vec3(1.0, 2.0, 3.0));
        volume.set_scale(Vec3::splat(2.0));
        let p = volume.model_matrix().transform_point3(Vec3::ONE);
        assert!((p - vec3(3.0, 4.0, 5.0)).length() < 1e-5);

        volume.set_rotation(vec3(0.0, 0.0, std::f32::consts::PI));
        let p = volume.model_matrix().transform_point3(Vec3::X);
        assert!((p - vec3(-1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn missing_file_gives_empty_volume() {
        let volume = MeshVolume::from_path("/nonexistent/mesh.obj");
        assert_eq!(volume.vertex_count(), 0);
        assert_eq!(volume.indices(0), Some(Vec::new()));
    }

    #[test]
    fn packing_offsets_later_volumes() {
        let a = MeshVolume::new(load_mesh_from_str(TRIANGLE));
        let b = MeshVolume::new(load_mesh_from_str(
            "v 0 0 1\nv 1 0 1\nv 0 1 1\nv 1 1 1\nf 1 2 3\nf 2 4 3\n",
        ));
        let packed = PackedGeometry::pack(&[&a, &b]).unwrap();

        assert_eq!(packed.positions.len(), 7);
        assert_eq!(packed.colors.len(), 7);
        assert_eq!(packed.indices, vec![0, 1, 2, 3, 4, 5, 4, 6, 5]);
        assert_eq!(packed.ranges, vec![(0, 3), (3, 6)]);
    }

    #[test]
    fn packing_stops_when_indices_overflow() {
        let a = MeshVolume::new(load_mesh_from_str(TRIANGLE));
        let huge = MeshVolume::new(Mesh {
            faces: vec![[0, 1, u32::MAX - 1]],
            ..Mesh::default()
        });
        assert_eq!(PackedGeometry::pack(&[&a, &huge]), None);
        assert!(PackedGeometry::pack(&[&huge]).is_some());
    }
}
