//! Material resource for render-tuning overrides
//!
//! Materials are shared resources: many instances may hold the same
//! material as their override, so they travel as `Arc<Material>` and carry
//! the backend handle that instance overrides forward.

use crate::render::MaterialHandle;

/// Shared material resource
///
/// The property set here is deliberately small; the backend owns the full
/// shading definition behind the handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    handle: MaterialHandle,

    /// Base color (RGB)
    pub base_color: [f32; 3],

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,
}

impl Material {
    /// Create a material bound to a backend handle, with default properties
    pub fn new(handle: MaterialHandle) -> Self {
        Self {
            handle,
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
        }
    }

    /// Backend handle forwarded by material overrides
    pub fn handle(&self) -> MaterialHandle {
        self.handle
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b];
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }
}
