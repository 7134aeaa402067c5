//! Base binding between a scene node and a render-server instance
//!
//! A [`VisualInstance`] owns exactly one backend instance handle for its
//! whole lifetime: the handle is allocated in `new` and released on drop,
//! on every path. Everything else here is bookkeeping that keeps the
//! backend copy of visibility, base resource, and layer mask in step with
//! the scene side.

use bitflags::bitflags;

use crate::render::{InstanceHandle, RenderResult, ResourceHandle, SharedServer};
use crate::foundation::math::{Aabb, Mat4, Triangle};
use crate::scene::{NodeContext, SceneError, TreeEvent, TreeObserver};

/// Render layer mask with only layer 0 active
pub const DEFAULT_LAYER_MASK: u32 = 1;

bitflags! {
    /// Usage categories for geometry extraction
    ///
    /// Filters which triangles [`VisualGeometry::faces`] reports. Consumed
    /// by physics and occlusion-bake tooling, never by per-frame rendering.
    ///
    /// Serializes as a string of flag names ("SOLID | DYNAMIC") in
    /// human-readable formats.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct FaceUsage: u32 {
        /// Solid, collidable geometry
        const SOLID = 1;
        /// Geometry enclosing a volume
        const ENCLOSING = 2;
        /// Geometry of dynamic objects
        const DYNAMIC = 4;
    }
}

/// Geometry obligations every concrete visual node kind must supply
pub trait VisualGeometry {
    /// Local-space bounding box
    fn local_aabb(&self) -> Aabb;

    /// Triangles matching the requested usage categories
    ///
    /// The sequence is finite and computed per call; callers must not
    /// assume it can be re-iterated cheaply.
    fn faces(&self, usage: FaceUsage) -> Vec<Triangle>;

    /// Local bounding box taken into world space
    ///
    /// Conservative corner-transform helper; kinds with tighter knowledge
    /// of their shape may override it.
    fn transformed_aabb(&self, global_transform: &Mat4) -> Aabb {
        self.local_aabb().transformed(global_transform)
    }
}

/// Binding between one scene node and one render-server instance
///
/// The backend is write-only from here: every value the binding exposes is
/// the locally cached one, pushed to the server on change.
pub struct VisualInstance {
    server: SharedServer,
    instance: InstanceHandle,
    base: Option<ResourceHandle>,
    layer_mask: u32,
}

impl VisualInstance {
    /// Allocate a backend instance and bind to it
    ///
    /// Propagates the backend's failure if the instance table is
    /// exhausted; there is no partially-initialized state on that path.
    pub fn new(server: SharedServer) -> RenderResult<Self> {
        let instance = server.write().unwrap().create_instance()?;
        Ok(Self {
            server,
            instance,
            base: None,
            layer_mask: DEFAULT_LAYER_MASK,
        })
    }

    /// The backend instance handle this binding owns
    pub fn instance(&self) -> InstanceHandle {
        self.instance
    }

    pub(crate) fn server(&self) -> &SharedServer {
        &self.server
    }

    /// Associate a base resource (mesh, light descriptor, ...)
    ///
    /// The reference is weak: the resource stays owned elsewhere and is
    /// never destroyed through this binding. `None` clears the base.
    pub fn set_base(&mut self, base: Option<ResourceHandle>) {
        self.base = base;
        self.server.write().unwrap().set_base(self.instance, base);
    }

    /// Currently associated base resource
    pub fn base(&self) -> Option<ResourceHandle> {
        self.base
    }

    /// Replace the full 32-bit render layer mask
    pub fn set_layer_mask(&mut self, mask: u32) {
        self.layer_mask = mask;
        self.server.write().unwrap().set_layer_mask(self.instance, mask);
    }

    /// Current render layer mask
    pub fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    /// Set or clear a single layer bit (0..=31)
    ///
    /// The backend only accepts whole-mask writes, so this read-modify-
    /// writes the cached mask and forwards the full result. Out-of-range
    /// indices are rejected.
    pub fn set_layer_mask_bit(&mut self, layer: u32, enabled: bool) -> Result<(), SceneError> {
        if layer > 31 {
            log::warn!("set_layer_mask_bit: layer {layer} out of range");
            return Err(SceneError::LayerOutOfRange(layer));
        }
        let mask = if enabled {
            self.layer_mask | (1 << layer)
        } else {
            self.layer_mask & !(1 << layer)
        };
        self.set_layer_mask(mask);
        Ok(())
    }

    /// Whether a single layer bit (0..=31) is set
    pub fn layer_mask_bit(&self, layer: u32) -> Result<bool, SceneError> {
        if layer > 31 {
            return Err(SceneError::LayerOutOfRange(layer));
        }
        Ok(self.layer_mask & (1 << layer) != 0)
    }

    /// Push the node's effective visibility to the backend
    ///
    /// The instance is shown only while the node is inside the tree and
    /// the node plus every ancestor is individually visible.
    pub fn update_visibility(&mut self, ctx: &NodeContext) {
        let visible = ctx.inside_tree && ctx.effective_visibility;
        log::debug!("instance {:?} visibility -> {visible}", self.instance);
        self.server.write().unwrap().set_visible(self.instance, visible);
    }
}

impl TreeObserver for VisualInstance {
    fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext) {
        match event {
            TreeEvent::EnteredTree
            | TreeEvent::VisibilityChanged
            | TreeEvent::ParentChanged => self.update_visibility(ctx),
            // Exiting hides the instance; the handle itself persists and
            // re-entering re-runs the visibility sync.
            TreeEvent::ExitedTree => {
                self.server.write().unwrap().set_visible(self.instance, false);
            }
            // Spatial bookkeeping belongs to subtypes with real bounds.
            TreeEvent::TransformChanged => {}
        }
    }
}

impl Drop for VisualInstance {
    /// Release the backend handle, exactly once, on every drop path
    fn drop(&mut self) {
        if let Ok(mut server) = self.server.write() {
            server.destroy(self.instance);
        }
    }
}

impl std::fmt::Debug for VisualInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualInstance")
            .field("instance", &self.instance)
            .field("base", &self.base)
            .field("layer_mask", &format_args!("{:#010b}", self.layer_mask))
            .finish()
    }
}
