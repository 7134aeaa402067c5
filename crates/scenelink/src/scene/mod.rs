//! Scene-side binding layer
//!
//! Pairs scene nodes with render-server instances and keeps the two in
//! sync across the node lifecycle:
//!
//! ```text
//! NodeTree (host hierarchy)
//!      ↓ lifecycle events
//! VisualInstance / GeometryInstance (binding layer)
//!      ↓ handle writes
//! RenderServer (opaque backend)
//! ```
//!
//! [`VisualInstance`] owns the instance handle, visibility sync, the base
//! resource, and the render layer mask. [`GeometryInstance`] layers the
//! render-tuning knobs (flags, shadows, material override, LOD window,
//! cull margin, custom AABB) on top. Concrete node kinds supply geometry
//! through [`VisualGeometry`].

mod geometry_instance;
mod mesh_instance;
mod tree;
mod visual_instance;

pub use geometry_instance::{GeometryInstance, GeometryParams};
pub use mesh_instance::{LightInstance, MeshError, MeshInstance, TriangleMesh};
pub use tree::{NodeContext, NodeId, NodeTree, SharedObserver, TreeEvent, TreeObserver};
pub use visual_instance::{FaceUsage, VisualGeometry, VisualInstance};

use thiserror::Error;

/// Caller errors raised by the binding layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Render layer index outside 0..=31
    #[error("Render layer index {0} out of range (0..=31)")]
    LayerOutOfRange(u32),

    /// Render flag index outside the flag set
    #[error("Render flag index {0} out of range")]
    FlagOutOfRange(usize),
}


#[cfg(test)]
pub(crate) mod recording {
    //! Call-logging render server used by binding tests

    use std::sync::{Arc, RwLock};

    use crate::foundation::math::Aabb;
    use crate::render::{
        InstanceFlag, InstanceHandle, MaterialHandle, RenderError, RenderResult, RenderServer,
        ResourceHandle, ShadowCasting,
    };

    /// One backend call, as observed at the server seam
    #[derive(Debug, Clone, PartialEq)]
    pub enum ServerCall {
        CreateInstance(InstanceHandle),
        Destroy(InstanceHandle),
        SetBase(InstanceHandle, Option<ResourceHandle>),
        SetVisible(InstanceHandle, bool),
        SetLayerMask(InstanceHandle, u32),
        SetMaterialOverride(InstanceHandle, Option<MaterialHandle>),
        SetCustomAabb(InstanceHandle, Option<Aabb>),
        SetCastShadows(InstanceHandle, ShadowCasting),
        SetExtraCullMargin(InstanceHandle, f32),
        SetLodRange(InstanceHandle, f32, f32, f32, f32),
        SetFlag(InstanceHandle, InstanceFlag, bool),
    }

    /// Render server that records every call in order
    pub struct RecordingServer {
        pub calls: Vec<ServerCall>,
        next_handle: u64,
        pub fail_creation: bool,
    }

    impl RecordingServer {
        pub fn new() -> Self {
            Self {
                calls: Vec::new(),
                next_handle: 1,
                fail_creation: false,
            }
        }

        /// Shared pair: typed access for assertions, erased for bindings
        pub fn shared() -> (Arc<RwLock<Self>>, crate::render::SharedServer) {
            let server = Arc::new(RwLock::new(Self::new()));
            let erased: crate::render::SharedServer = server.clone();
            (server, erased)
        }

        /// Calls matching a predicate
        pub fn count_calls(&self, pred: impl Fn(&ServerCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }
    }

    impl RenderServer for RecordingServer {
        fn create_instance(&mut self) -> RenderResult<InstanceHandle> {
            if self.fail_creation {
                return Err(RenderError::InstanceExhausted("test".into()));
            }
            let handle = InstanceHandle(self.next_handle);
            self.next_handle += 1;
            self.calls.push(ServerCall::CreateInstance(handle));
            Ok(handle)
        }

        fn destroy(&mut self, instance: InstanceHandle) {
            self.calls.push(ServerCall::Destroy(instance));
        }

        fn set_base(&mut self, instance: InstanceHandle, base: Option<ResourceHandle>) {
            self.calls.push(ServerCall::SetBase(instance, base));
        }

        fn set_visible(&mut self, instance: InstanceHandle, visible: bool) {
            self.calls.push(ServerCall::SetVisible(instance, visible));
        }

        fn set_layer_mask(&mut self, instance: InstanceHandle, mask: u32) {
            self.calls.push(ServerCall::SetLayerMask(instance, mask));
        }

        fn set_material_override(
            &mut self,
            instance: InstanceHandle,
            material: Option<MaterialHandle>,
        ) {
            self.calls.push(ServerCall::SetMaterialOverride(instance, material));
        }

        fn set_custom_aabb(&mut self, instance: InstanceHandle, aabb: Option<Aabb>) {
            self.calls.push(ServerCall::SetCustomAabb(instance, aabb));
        }

        fn set_cast_shadows(&mut self, instance: InstanceHandle, mode: ShadowCasting) {
            self.calls.push(ServerCall::SetCastShadows(instance, mode));
        }

        fn set_extra_cull_margin(&mut self, instance: InstanceHandle, margin: f32) {
            self.calls.push(ServerCall::SetExtraCullMargin(instance, margin));
        }

        fn set_lod_range(
            &mut self,
            instance: InstanceHandle,
            min: f32,
            max: f32,
            min_hysteresis: f32,
            max_hysteresis: f32,
        ) {
            self.calls.push(ServerCall::SetLodRange(
                instance,
                min,
                max,
                min_hysteresis,
                max_hysteresis,
            ));
        }

        fn set_flag(&mut self, instance: InstanceHandle, flag: InstanceFlag, value: bool) {
            self.calls.push(ServerCall::SetFlag(instance, flag, value));
        }
    }
}
