//! Flat ocean grid mesh, displaced on the GPU by the spatial fields.

use bytemuck::{Pod, Zeroable};

use crate::error::OceanResult;
use crate::params::SimulationConfig;

/// Vertex data for ocean mesh (position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Immutable `(GRID+1)²` vertex grid on the XZ plane
///
/// One grid cell spans one texel of the simulated patch, and UVs run from 0
/// to `GRID / N` so the displacement textures (sampled with repeat) tile when
/// the grid is larger than the simulation.
pub struct OceanGrid {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl OceanGrid {
    pub fn new(config: &SimulationConfig) -> OceanResult<Self> {
        config.validate()?;
        let grid_size = config.grid_size;
        let spacing = config.texel_size_m();
        let half_size = grid_size as f32 * spacing / 2.0;
        let uv_scale = grid_size as f32 / config.resolution as f32;

        let mut vertices = Vec::with_capacity(((grid_size + 1) * (grid_size + 1)) as usize);
        let mut indices = Vec::with_capacity((grid_size * grid_size * 6) as usize);

        for z in 0..=grid_size {
            for x in 0..=grid_size {
                let u = x as f32 / grid_size as f32;
                let v = z as f32 / grid_size as f32;
                vertices.push(Vertex {
                    position: [x as f32 * spacing - half_size, 0.0, z as f32 * spacing - half_size],
                    uv: [u * uv_scale, v * uv_scale],
                });
            }
        }

        // Counter-clockwise winding seen from above
        for z in 0..grid_size {
            for x in 0..grid_size {
                let top_left = z * (grid_size + 1) + x;
                let top_right = top_left + 1;
                let bottom_left = (z + 1) * (grid_size + 1) + x;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        log::debug!(
            "Ocean grid: {} vertices, {} triangles",
            vertices.len(),
            indices.len() / 3
        );

        Ok(Self { vertices, indices })
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_index_counts() {
        let config = SimulationConfig {
            resolution: 16,
            grid_size: 8,
            ..Default::default()
        };
        let grid = OceanGrid::new(&config).unwrap();
        assert_eq!(grid.vertices.len(), 9 * 9);
        assert_eq!(grid.index_count(), 8 * 8 * 6);
        assert!(grid.indices.iter().all(|&i| (i as usize) < grid.vertices.len()));
    }

    #[test]
    fn test_uv_scale_is_grid_over_resolution() {
        let config = SimulationConfig {
            resolution: 16,
            grid_size: 32,
            ..Default::default()
        };
        let grid = OceanGrid::new(&config).unwrap();
        let last = grid.vertices.last().unwrap();
        assert!((last.uv[0] - 2.0).abs() < 1e-6);
        assert!((last.uv[1] - 2.0).abs() < 1e-6);
        assert_eq!(grid.vertices[0].uv, [0.0, 0.0]);
    }

    #[test]
    fn test_grid_is_flat_and_centred() {
        let config = SimulationConfig {
            resolution: 8,
            grid_size: 8,
            patch_length_m: 80.0,
            ..Default::default()
        };
        let grid = OceanGrid::new(&config).unwrap();
        assert!(grid.vertices.iter().all(|v| v.position[1] == 0.0));
        assert_eq!(grid.vertices[0].position, [-40.0, 0.0, -40.0]);
        assert_eq!(grid.vertices.last().unwrap().position, [40.0, 0.0, 40.0]);
    }

    #[test]
    fn test_triangles_face_up() {
        let config = SimulationConfig {
            resolution: 4,
            grid_size: 1,
            ..Default::default()
        };
        let grid = OceanGrid::new(&config).unwrap();
        let p = |i: u32| glam::Vec3::from_array(grid.vertices[i as usize].position);
        for tri in grid.indices.chunks(3) {
            let normal = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(normal.y > 0.0);
        }
    }
}
