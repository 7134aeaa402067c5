//! # Scenelink
//!
//! A binding layer between a scene-node hierarchy and a handle-based
//! rendering backend. Nodes own opaque instance handles; scenelink keeps
//! each instance's visibility, layer membership, bounds, and render-tuning
//! parameters synchronized with the backend across the node lifecycle
//! (enter/exit tree, reparenting, destruction).
//!
//! ## Architecture
//!
//! ```text
//! NodeTree (host hierarchy, lifecycle events)
//!      ↓
//! VisualInstance / GeometryInstance (binding layer, cached state)
//!      ↓
//! RenderServer (opaque, write-only, handle-based backend)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use scenelink::prelude::*;
//! use std::sync::{Arc, RwLock};
//!
//! # fn main() -> Result<(), scenelink::render::RenderError> {
//! let server: SharedServer = Arc::new(RwLock::new(HandleTableServer::new()));
//!
//! let mut geometry = GeometryInstance::new(server)?;
//! geometry.set_layer_mask_bit(2, true).expect("layer in range");
//! geometry.set_cast_shadows(ShadowCasting::DoubleSided);
//! geometry.set_lod_max_distance(250.0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for binding-layer users
pub mod prelude {
    pub use crate::config::InstanceDefaults;
    pub use crate::foundation::math::{Aabb, Mat4, Point3, Transform, Triangle, Vec3};
    pub use crate::render::{
        HandleTableServer, InstanceFlag, InstanceHandle, Material, MaterialHandle, RenderServer,
        ResourceHandle, ShadowCasting, SharedServer,
    };
    pub use crate::scene::{
        FaceUsage, GeometryInstance, GeometryParams, LightInstance, MeshInstance, NodeContext,
        NodeId, NodeTree, SceneError, TreeEvent, TreeObserver, TriangleMesh, VisualGeometry,
        VisualInstance,
    };
}
