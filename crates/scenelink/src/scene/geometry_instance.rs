//! Render-tuning layer on top of a visual binding
//!
//! [`GeometryInstance`] adds the per-instance quality and performance
//! knobs: boolean render flags, shadow casting mode, material override,
//! LOD distance window with hysteresis bands, extra cull margin, and a
//! custom bounding-box override. Every setter validates or clamps locally,
//! stores the value, and makes exactly one forwarding call to the backend;
//! getters return the stored value, the backend is never read back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::InstanceDefaults;
use crate::foundation::math::Aabb;
use crate::render::{
    InstanceFlag, InstanceHandle, Material, RenderResult, ResourceHandle, ShadowCasting,
    SharedServer,
};
use crate::scene::{NodeContext, SceneError, TreeEvent, TreeObserver, VisualInstance};

/// Visual binding with render-tuning parameters
pub struct GeometryInstance {
    visual: VisualInstance,
    flags: [bool; InstanceFlag::COUNT],
    cast_shadows: ShadowCasting,
    material_override: Option<Arc<Material>>,
    lod_min_distance: f32,
    lod_max_distance: f32,
    lod_min_hysteresis: f32,
    lod_max_hysteresis: f32,
    extra_cull_margin: f32,
}

impl GeometryInstance {
    /// Allocate a backend instance and bind with default tuning
    pub fn new(server: SharedServer) -> RenderResult<Self> {
        Ok(Self {
            visual: VisualInstance::new(server)?,
            flags: [false; InstanceFlag::COUNT],
            cast_shadows: ShadowCasting::default(),
            material_override: None,
            lod_min_distance: 0.0,
            lod_max_distance: 0.0,
            lod_min_hysteresis: 0.0,
            lod_max_hysteresis: 0.0,
            extra_cull_margin: 0.0,
        })
    }

    /// Allocate and apply configured defaults
    pub fn with_defaults(server: SharedServer, defaults: &InstanceDefaults) -> RenderResult<Self> {
        let mut instance = Self::new(server)?;
        instance.set_layer_mask(defaults.layer_mask);
        instance.set_cast_shadows(defaults.cast_shadows);
        instance.set_lod_min_distance(defaults.lod_min_distance);
        instance.set_lod_max_distance(defaults.lod_max_distance);
        instance.set_extra_cull_margin(defaults.extra_cull_margin);
        Ok(instance)
    }

    /// The underlying visual binding
    pub fn visual(&self) -> &VisualInstance {
        &self.visual
    }

    /// Mutable access to the underlying visual binding
    pub fn visual_mut(&mut self) -> &mut VisualInstance {
        &mut self.visual
    }

    /// The backend instance handle this binding owns
    pub fn instance(&self) -> InstanceHandle {
        self.visual.instance()
    }

    /// Associate a base resource; see [`VisualInstance::set_base`]
    pub fn set_base(&mut self, base: Option<ResourceHandle>) {
        self.visual.set_base(base);
    }

    /// Currently associated base resource
    pub fn base(&self) -> Option<ResourceHandle> {
        self.visual.base()
    }

    /// Replace the full render layer mask
    pub fn set_layer_mask(&mut self, mask: u32) {
        self.visual.set_layer_mask(mask);
    }

    /// Current render layer mask
    pub fn layer_mask(&self) -> u32 {
        self.visual.layer_mask()
    }

    /// Set or clear a single layer bit (0..=31)
    pub fn set_layer_mask_bit(&mut self, layer: u32, enabled: bool) -> Result<(), SceneError> {
        self.visual.set_layer_mask_bit(layer, enabled)
    }

    /// Whether a single layer bit (0..=31) is set
    pub fn layer_mask_bit(&self, layer: u32) -> Result<bool, SceneError> {
        self.visual.layer_mask_bit(layer)
    }

    /// Set a boolean render flag
    pub fn set_flag(&mut self, flag: InstanceFlag, value: bool) {
        self.flags[flag.index()] = value;
        self.server().write().unwrap().set_flag(self.instance(), flag, value);
    }

    /// Current value of a render flag
    pub fn flag(&self, flag: InstanceFlag) -> bool {
        self.flags[flag.index()]
    }

    /// Set a render flag by integer index, for reflection-style callers
    ///
    /// Out-of-range indices are a caller error and rejected explicitly.
    pub fn set_flag_by_index(&mut self, index: usize, value: bool) -> Result<(), SceneError> {
        let flag = InstanceFlag::from_index(index).ok_or_else(|| {
            log::warn!("set_flag_by_index: flag index {index} out of range");
            SceneError::FlagOutOfRange(index)
        })?;
        self.set_flag(flag, value);
        Ok(())
    }

    /// Read a render flag by integer index
    pub fn flag_by_index(&self, index: usize) -> Result<bool, SceneError> {
        InstanceFlag::from_index(index)
            .map(|flag| self.flag(flag))
            .ok_or(SceneError::FlagOutOfRange(index))
    }

    /// Set the shadow casting mode
    pub fn set_cast_shadows(&mut self, mode: ShadowCasting) {
        self.cast_shadows = mode;
        self.server().write().unwrap().set_cast_shadows(self.instance(), mode);
    }

    /// Current shadow casting mode
    pub fn cast_shadows(&self) -> ShadowCasting {
        self.cast_shadows
    }

    /// Override the instance's material
    ///
    /// The material is shared: this binding holds one reference among
    /// potentially many, and replacing the override releases the previous
    /// share. `None` clears the override.
    pub fn set_material_override(&mut self, material: Option<Arc<Material>>) {
        let handle = material.as_ref().map(|m| m.handle());
        self.material_override = material;
        self.server()
            .write()
            .unwrap()
            .set_material_override(self.instance(), handle);
    }

    /// Current material override
    pub fn material_override(&self) -> Option<&Arc<Material>> {
        self.material_override.as_ref()
    }

    /// Camera distance below which the instance stops rendering at full detail
    ///
    /// `0.0` disables the near bound. Negative input clamps to zero. An
    /// inverted window (`min > max`) is accepted as given; the backend's
    /// distance culling is expected to degrade gracefully, and keeping the
    /// window consistent is the caller's responsibility.
    pub fn set_lod_min_distance(&mut self, distance: f32) {
        self.lod_min_distance = distance.max(0.0);
        self.forward_lod_range();
    }

    /// Current LOD minimum distance
    pub fn lod_min_distance(&self) -> f32 {
        self.lod_min_distance
    }

    /// Camera distance above which the instance stops rendering; `0.0` disables
    pub fn set_lod_max_distance(&mut self, distance: f32) {
        self.lod_max_distance = distance.max(0.0);
        self.forward_lod_range();
    }

    /// Current LOD maximum distance
    pub fn lod_max_distance(&self) -> f32 {
        self.lod_max_distance
    }

    /// Dead-zone margin around the minimum distance threshold
    pub fn set_lod_min_hysteresis(&mut self, hysteresis: f32) {
        self.lod_min_hysteresis = hysteresis.max(0.0);
        self.forward_lod_range();
    }

    /// Current minimum-threshold hysteresis
    pub fn lod_min_hysteresis(&self) -> f32 {
        self.lod_min_hysteresis
    }

    /// Dead-zone margin around the maximum distance threshold
    pub fn set_lod_max_hysteresis(&mut self, hysteresis: f32) {
        self.lod_max_hysteresis = hysteresis.max(0.0);
        self.forward_lod_range();
    }

    /// Current maximum-threshold hysteresis
    pub fn lod_max_hysteresis(&self) -> f32 {
        self.lod_max_hysteresis
    }

    /// Extra margin added to the bounds before culling decisions
    ///
    /// Negative input clamps to zero; the backend never sees a negative
    /// margin.
    pub fn set_extra_cull_margin(&mut self, margin: f32) {
        self.extra_cull_margin = margin.max(0.0);
        self.server()
            .write()
            .unwrap()
            .set_extra_cull_margin(self.instance(), self.extra_cull_margin);
    }

    /// Current extra cull margin
    pub fn extra_cull_margin(&self) -> f32 {
        self.extra_cull_margin
    }

    /// Override the computed bounding box in the backend
    ///
    /// One-shot forward with no getter: the backend owns the override and
    /// nothing here needs to read it back. `None` restores the computed
    /// bounds.
    pub fn set_custom_aabb(&mut self, aabb: Option<Aabb>) {
        self.server().write().unwrap().set_custom_aabb(self.instance(), aabb);
    }

    /// Push the node's effective visibility; see [`VisualInstance::update_visibility`]
    pub fn update_visibility(&mut self, ctx: &NodeContext) {
        self.visual.update_visibility(ctx);
    }

    /// Snapshot of every tuning parameter for serialization by name
    pub fn params(&self) -> GeometryParams {
        GeometryParams {
            use_baked_light: self.flag(InstanceFlag::UseBakedLight),
            use_dynamic_gi: self.flag(InstanceFlag::UseDynamicGi),
            draw_next_frame_if_visible: self.flag(InstanceFlag::DrawNextFrameIfVisible),
            cast_shadows: self.cast_shadows,
            lod_min_distance: self.lod_min_distance,
            lod_max_distance: self.lod_max_distance,
            lod_min_hysteresis: self.lod_min_hysteresis,
            lod_max_hysteresis: self.lod_max_hysteresis,
            extra_cull_margin: self.extra_cull_margin,
        }
    }

    /// Apply a parameter snapshot through the regular setters
    pub fn apply_params(&mut self, params: &GeometryParams) {
        self.set_flag(InstanceFlag::UseBakedLight, params.use_baked_light);
        self.set_flag(InstanceFlag::UseDynamicGi, params.use_dynamic_gi);
        self.set_flag(
            InstanceFlag::DrawNextFrameIfVisible,
            params.draw_next_frame_if_visible,
        );
        self.set_cast_shadows(params.cast_shadows);
        self.set_lod_min_distance(params.lod_min_distance);
        self.set_lod_max_distance(params.lod_max_distance);
        self.set_lod_min_hysteresis(params.lod_min_hysteresis);
        self.set_lod_max_hysteresis(params.lod_max_hysteresis);
        self.set_extra_cull_margin(params.extra_cull_margin);
    }

    /// Whole-range LOD write; the backend takes no partial updates
    fn forward_lod_range(&mut self) {
        self.server().write().unwrap().set_lod_range(
            self.instance(),
            self.lod_min_distance,
            self.lod_max_distance,
            self.lod_min_hysteresis,
            self.lod_max_hysteresis,
        );
    }

    fn server(&self) -> &SharedServer {
        self.visual.server()
    }
}

impl TreeObserver for GeometryInstance {
    fn on_tree_event(&mut self, event: TreeEvent, ctx: &NodeContext) {
        self.visual.on_tree_event(event, ctx);
    }
}

impl std::fmt::Debug for GeometryInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryInstance")
            .field("visual", &self.visual)
            .field("cast_shadows", &self.cast_shadows)
            .field("has_material_override", &self.material_override.is_some())
            .finish()
    }
}

/// Serializable snapshot of a geometry instance's tuning parameters
///
/// Field names are the stable serialization surface the host reflection
/// layer rounds these values through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryParams {
    /// Sample baked lightmaps instead of realtime lights
    pub use_baked_light: bool,
    /// Participate in dynamic global illumination
    pub use_dynamic_gi: bool,
    /// Render next frame even if newly visible mid-frame
    pub draw_next_frame_if_visible: bool,
    /// Shadow casting mode
    pub cast_shadows: ShadowCasting,
    /// LOD window minimum distance
    pub lod_min_distance: f32,
    /// LOD window maximum distance
    pub lod_max_distance: f32,
    /// Hysteresis band at the minimum threshold
    pub lod_min_hysteresis: f32,
    /// Hysteresis band at the maximum threshold
    pub lod_max_hysteresis: f32,
    /// Extra margin added before culling
    pub extra_cull_margin: f32,
}
