//! Resource loading: shader text and PNG images addressed by relative name.

use std::path::PathBuf;

use image::GenericImageView;

use crate::error::{OceanError, OceanResult};

/// Default resource root shipped with the crate
pub const DEFAULT_RESOURCE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources");

/// Decoded image, always expanded to RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct PngImage {
    /// Row-major RGBA8 pixels (4 bytes per pixel)
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Source of named resources
///
/// A missing resource is an error, never an empty value.
pub trait ResourceLoader {
    /// Load a UTF-8 text resource (shader source)
    fn string_resource(&self, name: &str) -> OceanResult<String>;

    /// Load and decode a PNG resource
    fn png_resource(&self, name: &str) -> OceanResult<PngImage>;
}

/// Loads resources from a directory on disk
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    root: PathBuf,
}

impl Default for FsResourceLoader {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_DIR)
    }
}

impl FsResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> OceanResult<PathBuf> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(OceanError::ResourceNotFound {
                name: name.to_string(),
                path,
            });
        }
        Ok(path)
    }
}

impl ResourceLoader for FsResourceLoader {
    fn string_resource(&self, name: &str) -> OceanResult<String> {
        let path = self.resolve(name)?;
        log::debug!("Loading text resource {}", path.display());
        std::fs::read_to_string(&path).map_err(|source| OceanError::ResourceRead { path, source })
    }

    fn png_resource(&self, name: &str) -> OceanResult<PngImage> {
        let path = self.resolve(name)?;
        log::debug!("Loading image resource {}", path.display());
        let bytes =
            std::fs::read(&path).map_err(|source| OceanError::ResourceRead {
                path: path.clone(),
                source,
            })?;
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .map_err(|source| OceanError::ImageDecode { path, source })?;
        let (width, height) = decoded.dimensions();
        Ok(PngImage {
            pixels: decoded.to_rgba8().into_raw(),
            width,
            height,
        })
    }
}
