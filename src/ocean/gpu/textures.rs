//! GPU field textures: allocation, upload and debug readback.

use crate::error::{OceanError, OceanResult};
use crate::ocean::schedule::{FftTarget, Fields};
use crate::params::SimulationConfig;

/// Texel format of every simulation field
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const BYTES_PER_TEXEL: u32 = 16;

/// One RGBA32F texture with its default view
pub struct FieldTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl FieldTexture {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FIELD_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Replace the whole texture content
    pub fn upload(&self, queue: &wgpu::Queue, texels: &[[f32; 4]]) {
        debug_assert_eq!(texels.len(), (self.width * self.height) as usize);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * BYTES_PER_TEXEL),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Copy the texture back to the host (blocks until the GPU is idle)
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> OceanResult<Vec<[f32; 4]>> {
        let unpadded_bytes_per_row = self.width * BYTES_PER_TEXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Field Readback Buffer"),
            size: (padded_bytes_per_row * self.height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Field Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| OceanError::BufferMap(wgpu::BufferAsyncError))??;

        let data = slice.get_mapped_range();
        let mut texels = Vec::with_capacity((self.width * self.height) as usize);
        // Strip row padding
        for y in 0..self.height {
            let start = (y * padded_bytes_per_row) as usize;
            let row = &data[start..start + unpadded_bytes_per_row as usize];
            texels.extend(bytemuck::pod_collect_to_vec::<u8, [f32; 4]>(row));
        }
        drop(data);
        buffer.unmap();
        Ok(texels)
    }
}

/// Every field owned by one simulation instance
///
/// Allocated once; only contents change afterwards.
pub struct FieldSet {
    pub gaussian: FieldTexture,
    pub butterfly: FieldTexture,
    pub noise: FieldTexture,
    pub h0: FieldTexture,
    pub h0_minus: FieldTexture,
    pub spectra: [FieldTexture; 5],
    pub pingpong: FieldTexture,
    pub outputs: [FieldTexture; 5],
    pub normal_map: FieldTexture,
}

impl FieldSet {
    pub fn new(device: &wgpu::Device, config: &SimulationConfig) -> Self {
        let n = config.resolution;
        let field = |label: &str| FieldTexture::new(device, label, n, n);
        Self {
            gaussian: field("Gaussian Field"),
            butterfly: FieldTexture::new(device, "Butterfly Table", config.butterfly_stages(), n),
            noise: field("Background Noise"),
            h0: field("H0(k)"),
            h0_minus: field("H0(-k)"),
            spectra: [
                field("Spectrum Height"),
                field("Spectrum Dx"),
                field("Spectrum Dz"),
                field("Spectrum Slope X"),
                field("Spectrum Slope Z"),
            ],
            pingpong: field("FFT Ping-Pong"),
            outputs: [
                field("Height"),
                field("Displacement X"),
                field("Displacement Z"),
                field("Slope X"),
                field("Slope Z"),
            ],
            normal_map: field("Normal Map"),
        }
    }

    pub fn spectrum(&self, target: FftTarget) -> &FieldTexture {
        &self.spectra[target_index(target)]
    }

    pub fn output(&self, target: FftTarget) -> &FieldTexture {
        &self.outputs[target_index(target)]
    }

    /// Texture for a single field flag
    pub fn get(&self, field: Fields) -> Option<&FieldTexture> {
        let fixed = [
            (Fields::GAUSSIAN, &self.gaussian),
            (Fields::BUTTERFLY, &self.butterfly),
            (Fields::H0, &self.h0),
            (Fields::H0_MINUS, &self.h0_minus),
            (Fields::PINGPONG, &self.pingpong),
            (Fields::NORMAL_MAP, &self.normal_map),
        ];
        if let Some((_, texture)) = fixed.into_iter().find(|(flag, _)| *flag == field) {
            return Some(texture);
        }
        FftTarget::ALL.into_iter().find_map(|target| {
            if target.spectrum() == field {
                Some(self.spectrum(target))
            } else if target.output() == field {
                Some(self.output(target))
            } else {
                None
            }
        })
    }

    /// Sizes of every field, for checking they never change
    pub fn extents(&self) -> Vec<(u32, u32)> {
        let mut all = vec![&self.gaussian, &self.butterfly, &self.noise, &self.h0, &self.h0_minus];
        all.extend(self.spectra.iter());
        all.push(&self.pingpong);
        all.extend(self.outputs.iter());
        all.push(&self.normal_map);
        all.iter().map(|t| (t.width, t.height)).collect()
    }
}

fn target_index(target: FftTarget) -> usize {
    match target {
        FftTarget::Height => 0,
        FftTarget::DisplacementX => 1,
        FftTarget::DisplacementZ => 2,
        FftTarget::SlopeX => 3,
        FftTarget::SlopeZ => 4,
    }
}
