//! Backend abstraction trait for the rendering server
//!
//! The scene layer never talks to a concrete renderer. It holds opaque
//! handles and pushes state through the [`RenderServer`] trait; the server
//! is write-only from the scene's perspective, so every cached value lives
//! on the scene side.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::foundation::math::Aabb;
use crate::render::RenderResult;

/// Handle to a visual instance owned by the render server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Handle to an externally-owned visual resource (mesh, light descriptor, ...)
///
/// Only ever a back reference; the holder never destroys the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Handle to a material resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Shadow casting mode for a visual instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowCasting {
    /// Never casts shadows
    Off,
    /// Casts shadows from front faces
    #[default]
    On,
    /// Casts shadows from both sides of each face
    DoubleSided,
    /// Invisible in the main pass, only casts shadows
    ShadowsOnly,
}

/// Per-instance boolean render flags
///
/// Distinct from the render layer mask; these tune how an instance
/// participates in lighting and frame scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceFlag {
    /// Sample baked lightmaps instead of realtime lights
    UseBakedLight,
    /// Participate in dynamic global illumination
    UseDynamicGi,
    /// Render next frame even if newly visible mid-frame
    DrawNextFrameIfVisible,
}

impl InstanceFlag {
    /// Number of flags; sizes the per-instance flag array
    pub const COUNT: usize = 3;

    /// All flags, in index order
    pub const ALL: [Self; Self::COUNT] = [
        Self::UseBakedLight,
        Self::UseDynamicGi,
        Self::DrawNextFrameIfVisible,
    ];

    /// Array index of this flag
    pub fn index(self) -> usize {
        match self {
            Self::UseBakedLight => 0,
            Self::UseDynamicGi => 1,
            Self::DrawNextFrameIfVisible => 2,
        }
    }

    /// Flag for an integer index, for reflection-style callers
    ///
    /// Returns `None` for indices outside `0..COUNT`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Handle-based rendering backend
///
/// One visual instance per handle. Instance state writes are whole-value:
/// the mask and the LOD range are always pushed in full, never as partial
/// updates. All calls are synchronous and non-blocking.
pub trait RenderServer {
    /// Allocate a new visual instance
    ///
    /// Fails only if the backend is exhausted or unavailable.
    fn create_instance(&mut self) -> RenderResult<InstanceHandle>;

    /// Release a visual instance
    ///
    /// The handle must not be used again after this call.
    fn destroy(&mut self, instance: InstanceHandle);

    /// Associate a base resource with the instance; `None` clears it
    fn set_base(&mut self, instance: InstanceHandle, base: Option<ResourceHandle>);

    /// Show or hide the instance
    fn set_visible(&mut self, instance: InstanceHandle, visible: bool);

    /// Replace the full 32-bit render layer mask
    fn set_layer_mask(&mut self, instance: InstanceHandle, mask: u32);

    /// Override the instance's material; `None` clears the override
    fn set_material_override(&mut self, instance: InstanceHandle, material: Option<MaterialHandle>);

    /// Override the computed bounding box; `None` restores the computed one
    fn set_custom_aabb(&mut self, instance: InstanceHandle, aabb: Option<Aabb>);

    /// Set the shadow casting mode
    fn set_cast_shadows(&mut self, instance: InstanceHandle, mode: ShadowCasting);

    /// Set the extra margin added to the bounds before culling
    fn set_extra_cull_margin(&mut self, instance: InstanceHandle, margin: f32);

    /// Set the full LOD distance window with hysteresis bands
    fn set_lod_range(
        &mut self,
        instance: InstanceHandle,
        min: f32,
        max: f32,
        min_hysteresis: f32,
        max_hysteresis: f32,
    );

    /// Set a boolean render flag
    fn set_flag(&mut self, instance: InstanceHandle, flag: InstanceFlag, value: bool);
}

/// Shared, mutable reference to a render server
///
/// Bindings keep one of these so the handle can be released on every drop
/// path. Delivery is single-threaded; the lock only guards the seam.
pub type SharedServer = Arc<RwLock<dyn RenderServer + Send + Sync>>;
