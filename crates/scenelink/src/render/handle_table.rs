//! Slotmap-backed reference render server
//!
//! An in-process instance table that speaks the full [`RenderServer`]
//! contract. Handy for tests, headless tools, and as the model backend a
//! GPU server is expected to mirror. Handles are slotmap keys packed into
//! the opaque `u64`, so stale handles are detected rather than aliased.

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::foundation::math::Aabb;
use crate::render::{
    InstanceFlag, InstanceHandle, MaterialHandle, RenderError, RenderResult, RenderServer,
    ResourceHandle, ShadowCasting,
};

new_key_type! {
    struct InstanceKey;
}

/// Backend-side state of one visual instance
#[derive(Debug, Clone)]
struct InstanceState {
    base: Option<ResourceHandle>,
    visible: bool,
    layer_mask: u32,
    material_override: Option<MaterialHandle>,
    custom_aabb: Option<Aabb>,
    cast_shadows: ShadowCasting,
    extra_cull_margin: f32,
    lod_range: (f32, f32, f32, f32),
    flags: [bool; InstanceFlag::COUNT],
}

impl Default for InstanceState {
    fn default() -> Self {
        Self {
            base: None,
            visible: true,
            layer_mask: 1,
            material_override: None,
            custom_aabb: None,
            cast_shadows: ShadowCasting::default(),
            extra_cull_margin: 0.0,
            lod_range: (0.0, 0.0, 0.0, 0.0),
            flags: [false; InstanceFlag::COUNT],
        }
    }
}

/// In-process render server storing instances in a slot map
pub struct HandleTableServer {
    instances: SlotMap<InstanceKey, InstanceState>,
    capacity: Option<usize>,
}

impl HandleTableServer {
    /// Create a server with no instance limit
    pub fn new() -> Self {
        Self {
            instances: SlotMap::with_key(),
            capacity: None,
        }
    }

    /// Create a server that refuses to allocate past `capacity` instances
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            instances: SlotMap::with_key(),
            capacity: Some(capacity),
        }
    }

    /// Number of live instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether the handle refers to a live instance
    pub fn is_live(&self, instance: InstanceHandle) -> bool {
        self.instances.contains_key(Self::key(instance))
    }

    /// Read back an instance's visibility
    pub fn visible(&self, instance: InstanceHandle) -> Option<bool> {
        self.get(instance).map(|s| s.visible)
    }

    /// Read back an instance's layer mask
    pub fn layer_mask(&self, instance: InstanceHandle) -> Option<u32> {
        self.get(instance).map(|s| s.layer_mask)
    }

    /// Read back an instance's base resource
    pub fn base(&self, instance: InstanceHandle) -> Option<Option<ResourceHandle>> {
        self.get(instance).map(|s| s.base)
    }

    /// Read back an instance's material override
    pub fn material_override(&self, instance: InstanceHandle) -> Option<Option<MaterialHandle>> {
        self.get(instance).map(|s| s.material_override)
    }

    /// Read back an instance's custom AABB override
    pub fn custom_aabb(&self, instance: InstanceHandle) -> Option<Option<Aabb>> {
        self.get(instance).map(|s| s.custom_aabb)
    }

    /// Read back an instance's shadow casting mode
    pub fn cast_shadows(&self, instance: InstanceHandle) -> Option<ShadowCasting> {
        self.get(instance).map(|s| s.cast_shadows)
    }

    /// Read back an instance's extra cull margin
    pub fn extra_cull_margin(&self, instance: InstanceHandle) -> Option<f32> {
        self.get(instance).map(|s| s.extra_cull_margin)
    }

    /// Read back an instance's LOD window as (min, max, min_hyst, max_hyst)
    pub fn lod_range(&self, instance: InstanceHandle) -> Option<(f32, f32, f32, f32)> {
        self.get(instance).map(|s| s.lod_range)
    }

    /// Read back one of an instance's render flags
    pub fn flag(&self, instance: InstanceHandle, flag: InstanceFlag) -> Option<bool> {
        self.get(instance).map(|s| s.flags[flag.index()])
    }

    fn key(instance: InstanceHandle) -> InstanceKey {
        KeyData::from_ffi(instance.0).into()
    }

    fn get(&self, instance: InstanceHandle) -> Option<&InstanceState> {
        self.instances.get(Self::key(instance))
    }

    /// Look up mutable state, warning on stale handles
    ///
    /// A binding can never reach this path for its own handle (release is
    /// tied to drop); only foreign callers holding copied handles can.
    fn get_mut(&mut self, instance: InstanceHandle, op: &str) -> Option<&mut InstanceState> {
        let state = self.instances.get_mut(Self::key(instance));
        if state.is_none() {
            log::warn!("{op} on stale instance handle {:?}", instance);
        }
        state
    }
}

impl Default for HandleTableServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderServer for HandleTableServer {
    fn create_instance(&mut self) -> RenderResult<InstanceHandle> {
        if let Some(cap) = self.capacity {
            if self.instances.len() >= cap {
                return Err(RenderError::InstanceExhausted(format!(
                    "instance table is at capacity ({cap})"
                )));
            }
        }
        let key = self.instances.insert(InstanceState::default());
        let handle = InstanceHandle(key.data().as_ffi());
        log::debug!("created instance {:?}", handle);
        Ok(handle)
    }

    fn destroy(&mut self, instance: InstanceHandle) {
        if self.instances.remove(Self::key(instance)).is_some() {
            log::debug!("destroyed instance {:?}", instance);
        } else {
            log::warn!("destroy on stale instance handle {:?}", instance);
        }
    }

    fn set_base(&mut self, instance: InstanceHandle, base: Option<ResourceHandle>) {
        if let Some(state) = self.get_mut(instance, "set_base") {
            state.base = base;
        }
    }

    fn set_visible(&mut self, instance: InstanceHandle, visible: bool) {
        if let Some(state) = self.get_mut(instance, "set_visible") {
            state.visible = visible;
        }
    }

    fn set_layer_mask(&mut self, instance: InstanceHandle, mask: u32) {
        if let Some(state) = self.get_mut(instance, "set_layer_mask") {
            state.layer_mask = mask;
        }
    }

    fn set_material_override(
        &mut self,
        instance: InstanceHandle,
        material: Option<MaterialHandle>,
    ) {
        if let Some(state) = self.get_mut(instance, "set_material_override") {
            state.material_override = material;
        }
    }

    fn set_custom_aabb(&mut self, instance: InstanceHandle, aabb: Option<Aabb>) {
        if let Some(state) = self.get_mut(instance, "set_custom_aabb") {
            state.custom_aabb = aabb;
        }
    }

    fn set_cast_shadows(&mut self, instance: InstanceHandle, mode: ShadowCasting) {
        if let Some(state) = self.get_mut(instance, "set_cast_shadows") {
            state.cast_shadows = mode;
        }
    }

    fn set_extra_cull_margin(&mut self, instance: InstanceHandle, margin: f32) {
        if let Some(state) = self.get_mut(instance, "set_extra_cull_margin") {
            state.extra_cull_margin = margin;
        }
    }

    fn set_lod_range(
        &mut self,
        instance: InstanceHandle,
        min: f32,
        max: f32,
        min_hysteresis: f32,
        max_hysteresis: f32,
    ) {
        if let Some(state) = self.get_mut(instance, "set_lod_range") {
            state.lod_range = (min, max, min_hysteresis, max_hysteresis);
        }
    }

    fn set_flag(&mut self, instance: InstanceHandle, flag: InstanceFlag, value: bool) {
        if let Some(state) = self.get_mut(instance, "set_flag") {
            state.flags[flag.index()] = value;
        }
    }
}
