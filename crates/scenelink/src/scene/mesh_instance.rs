//! Concrete visual node kinds
//!
//! [`MeshInstance`] and [`LightInstance`] show the two shapes a binding
//! takes in practice: geometry-carrying nodes that report real faces, and
//! marker-style nodes whose bounds exist only for culling.

use std::sync::Arc;

use thiserror::Error;

use crate::foundation::math::{Aabb, Point3, Triangle, Vec3};
use crate::render::{RenderResult, ResourceHandle, SharedServer};
use crate::scene::{
    FaceUsage, GeometryInstance, NodeContext, TreeEvent, TreeObserver, VisualGeometry,
    VisualInstance,
};

/// Errors building a triangle mesh
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Index count is not a multiple of three
    #[error("Index count {0} is not a multiple of 3")]
    NonTriangleIndexCount(usize),

    /// An index points past the vertex array
    #[error("Index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// The offending index value
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },
}

/// Indexed triangle geometry shared between mesh instances
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    positions: Vec<Point3>,
    indices: Vec<u32>,
    aabb: Aabb,
}

impl TriangleMesh {
    /// Build a mesh from vertex positions and triangle indices
    ///
    /// Validates index integrity up front so face extraction never has to.
    pub fn new(positions: Vec<Point3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NonTriangleIndexCount(indices.len()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfBounds {
                index: bad,
                vertex_count: positions.len(),
            });
        }
        let aabb = Aabb::from_points(&positions)
            .unwrap_or_else(|| Aabb::new(Vec3::zeros(), Vec3::zeros()));
        Ok(Self {
            positions,
            indices,
            aabb,
        })
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding box of the vertex positions
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// All triangles, in index order
    pub fn triangles(&self) -> Vec<Triangle> {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                Triangle::new(
                    self.positions[tri[0] as usize],
                    self.positions[tri[1] as usize],
                    self.positions[tri[2] as usize],
                )
            })
            .collect()
    }
}

/// Visual node kind rendering a shared triangle mesh
#[derive(Debug)]
pub struct MeshInstance {
    geometry: GeometryInstance,
    mesh: Arc<TriangleMesh>,
}

impl MeshInstance {
    /// Bind a mesh to a new backend instance
    ///
    /// `mesh_resource` is the backend's descriptor for the same mesh; it
    /// becomes the instance's base so the server knows what to draw.
    pub fn new(
        server: SharedServer,
        mesh: Arc<TriangleMesh>,
        mesh_resource: ResourceHandle,
    ) -> RenderResult<Self> {
        let mut geometry = GeometryInstance::new(server)?;
        geometry.set_base(Some(mesh_resource));
        Ok(Self { geometry, mesh })
    }

    /// The render-tuning layer
    pub fn geometry(&self) -> &GeometryInstance {
        &self.geometry
    }

    /// Mutable access to the render-tuning layer
    pub fn geometry_mut(&mut self) -> &mut GeometryInstance {
        &mut self.geometry
    }

    /// The shared mesh geometry
    pub fn mesh(&self) -> &Arc<TriangleMesh> {
        &self.mesh
    }
}

impl VisualGeometry for MeshInstance {
    fn local_aabb(&self) -> Aabb {
        self.mesh.aabb()
    }

    fn faces(&self, usage: FaceUsage) -> Vec<Triangle> {
        // Mesh geometry is solid; other usage categories get nothing.
        if usage.contains(FaceUsage::SOLID) {
            self.mesh.triangles()
        } else {
            Vec::new()
        }
    }
}

impl TreeObserver for MeshInstance {
    fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext) {
        self.geometry.on_tree_event(event, ctx);
    }
}

/// Visual node kind for a point light's influence volume
///
/// Lights have culling bounds but contribute no extractable geometry.
#[derive(Debug)]
pub struct LightInstance {
    visual: VisualInstance,
    radius: f32,
}

impl LightInstance {
    /// Bind a light with the given influence radius to a new instance
    pub fn new(
        server: SharedServer,
        light_resource: ResourceHandle,
        radius: f32,
    ) -> RenderResult<Self> {
        let mut visual = VisualInstance::new(server)?;
        visual.set_base(Some(light_resource));
        Ok(Self {
            visual,
            radius: radius.max(0.0),
        })
    }

    /// The underlying visual binding
    pub fn visual(&self) -> &VisualInstance {
        &self.visual
    }

    /// Mutable access to the underlying visual binding
    pub fn visual_mut(&mut self) -> &mut VisualInstance {
        &mut self.visual
    }

    /// Influence radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Change the influence radius (clamped to non-negative)
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }
}

impl VisualGeometry for LightInstance {
    fn local_aabb(&self) -> Aabb {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        Aabb::from_center_extents(Vec3::zeros(), r)
    }

    fn faces(&self, _usage: FaceUsage) -> Vec<Triangle> {
        Vec::new()
    }
}

impl TreeObserver for LightInstance {
    fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext) {
        self.visual.on_tree_event(event, ctx);
    }
}
