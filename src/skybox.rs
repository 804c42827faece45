//! Skybox cube geometry and the six cubemap faces.

use bytemuck::{Pod, Zeroable};

use crate::error::{OceanError, OceanResult};
use crate::resources::{PngImage, ResourceLoader};

/// Face file names in cubemap layer order (+X, -X, +Y, -Y, +Z, -Z)
pub const FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Half-extent of the skybox cube; the shader pins it to the far plane anyway
const HALF_EXTENT: f32 = 1.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 3],
}

impl SkyVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Unit cube seen from the inside
pub struct SkyboxMesh {
    pub vertices: Vec<SkyVertex>,
    pub indices: Vec<u16>,
}

impl SkyboxMesh {
    pub fn new() -> Self {
        let s = HALF_EXTENT;
        let vertices = [
            [-s, -s, -s],
            [s, -s, -s],
            [s, s, -s],
            [-s, s, -s],
            [-s, -s, s],
            [s, -s, s],
            [s, s, s],
            [-s, s, s],
        ]
        .into_iter()
        .map(|position| SkyVertex { position })
        .collect();

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -Z
            4, 5, 6, 4, 6, 7, // +Z
            0, 4, 7, 0, 7, 3, // -X
            1, 2, 6, 1, 6, 5, // +X
            3, 7, 6, 3, 6, 2, // +Y
            0, 1, 5, 0, 5, 4, // -Y
        ];

        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl Default for SkyboxMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Six square RGBA8 faces of equal size, in layer order
#[derive(Debug, Clone)]
pub struct CubemapFaces {
    size: u32,
    faces: Vec<Vec<u8>>,
}

impl CubemapFaces {
    /// Build from decoded images, checking they form a valid cubemap
    pub fn from_images(images: Vec<PngImage>) -> OceanResult<Self> {
        if images.len() != FACE_NAMES.len() {
            return Err(OceanError::InvalidCubemap(format!(
                "expected {} faces, got {}",
                FACE_NAMES.len(),
                images.len()
            )));
        }
        let size = images[0].width;
        for (name, image) in FACE_NAMES.iter().zip(&images) {
            if image.width != image.height {
                return Err(OceanError::InvalidCubemap(format!(
                    "face \"{name}\" is {}x{}, not square",
                    image.width, image.height
                )));
            }
            if image.width != size {
                return Err(OceanError::InvalidCubemap(format!(
                    "face \"{name}\" is {}px, expected {size}px",
                    image.width
                )));
            }
        }
        Ok(Self {
            size,
            faces: images.into_iter().map(|image| image.pixels).collect(),
        })
    }

    /// Load `<dir>/<face>.png` for every face
    pub fn from_loader(loader: &dyn ResourceLoader, dir: &str) -> OceanResult<Self> {
        let images = FACE_NAMES
            .iter()
            .map(|face| loader.png_resource(&format!("{dir}/{face}.png")))
            .collect::<OceanResult<Vec<_>>>()?;
        log::info!("Loaded skybox \"{dir}\" ({}px faces)", images[0].width);
        Self::from_images(images)
    }

    /// Horizon-to-zenith gradient usable without any image resources
    pub fn procedural_gradient(size: u32) -> Self {
        let size = size.max(1);
        let faces = (0..FACE_NAMES.len())
            .map(|face| {
                let mut pixels = Vec::with_capacity((size * size * 4) as usize);
                for y in 0..size {
                    for x in 0..size {
                        let elevation = face_elevation(face, x, y, size);
                        pixels.extend_from_slice(&sky_color(elevation));
                    }
                }
                pixels
            })
            .collect();
        Self { size, faces }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self, layer: usize) -> &[u8] {
        &self.faces[layer]
    }
}

/// Sine of the elevation of the direction through texel (x, y) of `face`
fn face_elevation(face: usize, x: u32, y: u32, size: u32) -> f32 {
    let u = 2.0 * (x as f32 + 0.5) / size as f32 - 1.0;
    let v = 2.0 * (y as f32 + 0.5) / size as f32 - 1.0;
    let direction = match face {
        0 => glam::Vec3::new(1.0, -v, -u),
        1 => glam::Vec3::new(-1.0, -v, u),
        2 => glam::Vec3::new(u, 1.0, v),
        3 => glam::Vec3::new(u, -1.0, -v),
        4 => glam::Vec3::new(u, -v, 1.0),
        _ => glam::Vec3::new(-u, -v, -1.0),
    };
    direction.normalize().y
}

fn sky_color(elevation: f32) -> [u8; 4] {
    let horizon = glam::Vec3::new(0.78, 0.85, 0.92);
    let zenith = glam::Vec3::new(0.18, 0.38, 0.72);
    let below = glam::Vec3::new(0.05, 0.12, 0.2);
    let color = if elevation >= 0.0 {
        horizon.lerp(zenith, elevation.sqrt())
    } else {
        horizon.lerp(below, (-elevation).sqrt())
    };
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_u8(color.x), to_u8(color.y), to_u8(color.z), 255]
}
