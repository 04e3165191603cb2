//! Lighting
//!
//! Per-frame light collection, shadow-map rendering and uniform binding
//! for the lit 3D shaders.
//!
//! # Frame flow
//!
//! 1. [`LightingSystem::update_from_scene`] rebuilds the light list from
//!    the enabled light components of active nodes (at most
//!    [`MAX_LIGHTS`]), hands out shadow slices in collection order (at
//!    most [`MAX_SHADOW_MAPS`]) and then sorts it directional → point →
//!    spot.
//! 2. Callers such as the skybox may append a sun through
//!    [`LightingSystem::add_virtual_directional_light`].
//! 3. [`LightingSystem::render_shadow_maps`] renders one depth slice per
//!    shadow-casting light and keeps the light-space matrices parallel to
//!    the light list.
//! 4. [`LightingSystem::bind_uniforms`] pushes everything to a shader.
//!
//! Lights beyond the budgets are dropped silently: extra lights are not
//! collected, extra shadow casters keep `shadow_map_index == -1`.

pub mod components;
pub mod light_data;
pub mod shading;
pub mod shadow;

pub use components::{
    DirectionalLight, LightShadow, LightSource, OmniLight, ShadowMode, SpotLight, as_light_source,
};
pub use light_data::{LightData, LightType};

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::device::{ClearFlags, CullMode, GraphicsDevice, ShaderId, TextureId, UniformValue};
use crate::errors::Result;
use crate::mesh::GpuMesh;
use crate::resources::ResourceCache;
use crate::scene::Scene;
use crate::settings::ShadowQuality;

/// Lights collected per frame.
pub const MAX_LIGHTS: usize = 32;
/// Slices in the shadow-map array.
pub const MAX_SHADOW_MAPS: u32 = 8;
/// Texture unit the shadow-map array is bound to.
pub const SHADOW_MAP_UNIT: u32 = 10;

const DEFAULT_AMBIENT: Vec3 = Vec3::splat(0.1);

/// `uLights[i]` struct members, in upload order.
const LIGHT_FIELDS: [&str; 16] = [
    "position",
    "direction",
    "color",
    "intensity",
    "range",
    "type",
    "attenuation_constant",
    "attenuation_linear",
    "attenuation_quadratic",
    "inner_cone_angle",
    "outer_cone_angle",
    "casts_shadows",
    "shadow_map_index",
    "shadow_bias",
    "shadow_opacity",
    "shadow_color",
];

fn light_uniforms(light: &LightData) -> [UniformValue; 16] {
    [
        UniformValue::Vec3(light.position()),
        UniformValue::Vec3(light.direction()),
        UniformValue::Vec3(light.color()),
        UniformValue::Float(light.intensity),
        UniformValue::Float(light.range),
        UniformValue::Int(light.light_type),
        UniformValue::Float(light.attenuation_constant),
        UniformValue::Float(light.attenuation_linear),
        UniformValue::Float(light.attenuation_quadratic),
        UniformValue::Float(light.inner_cone_cos),
        UniformValue::Float(light.outer_cone_cos),
        UniformValue::Int(light.casts_shadows),
        UniformValue::Int(light.shadow_map_index),
        UniformValue::Float(light.shadow_bias),
        UniformValue::Float(light.shadow_opacity),
        UniformValue::Vec3(light.shadow_color()),
    ]
}

// ============================================================================
// Fog
// ============================================================================

/// Height-modulated exponential fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogParams {
    pub enabled: bool,
    pub color: Vec3,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    /// How fast fog thins out below the camera.
    pub height_falloff: f32,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Vec3::new(0.7, 0.8, 0.9),
            density: 0.02,
            start: 10.0,
            end: 100.0,
            height_falloff: 0.1,
        }
    }
}

impl FogParams {
    /// Non-negative density, start and falloff; `end ≥ start + 0.1`.
    #[must_use]
    pub fn clamped(self) -> Self {
        let start = self.start.max(0.0);
        Self {
            density: self.density.max(0.0),
            start,
            end: self.end.max(start + 0.1),
            height_falloff: self.height_falloff.max(0.0),
            ..self
        }
    }
}

/// Directional light injected by a non-component source (the skybox sun).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualDirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub casts_shadows: bool,
    pub shadow_bias: f32,
    pub shadow_opacity: f32,
    pub shadow_color: Vec3,
}

/// Counters of the last shadow pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowStats {
    pub slices_rendered: u32,
    pub caster_draws: u32,
}

// ============================================================================
// LightingSystem
// ============================================================================

#[derive(Debug)]
pub struct LightingSystem {
    lights: Vec<LightData>,
    light_space_matrices: Vec<Mat4>,
    next_shadow_slot: u32,

    ambient: Vec3,
    fog: FogParams,

    shadows_enabled: bool,
    quality: ShadowQuality,
    allocated_quality: Option<ShadowQuality>,
    shadow_array: Option<TextureId>,
    depth_shader: Option<ShaderId>,

    uniform_names: Vec<[String; 16]>,
    stats: ShadowStats,
}

impl Default for LightingSystem {
    fn default() -> Self {
        Self::new(ShadowQuality::default(), true)
    }
}

impl LightingSystem {
    #[must_use]
    pub fn new(quality: ShadowQuality, shadows_enabled: bool) -> Self {
        let uniform_names = (0..MAX_LIGHTS)
            .map(|i| LIGHT_FIELDS.map(|field| format!("uLights[{i}].{field}")))
            .collect();
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
            light_space_matrices: Vec::with_capacity(MAX_LIGHTS),
            next_shadow_slot: 0,
            ambient: DEFAULT_AMBIENT,
            fog: FogParams::default(),
            shadows_enabled,
            quality,
            allocated_quality: None,
            shadow_array: None,
            depth_shader: None,
            uniform_names,
            stats: ShadowStats::default(),
        }
    }

    /// Compiles the depth shader and allocates the shadow-map array.
    pub fn initialize(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.depth_shader.is_none() {
            self.depth_shader = Some(
                device.create_shader(shadow::DEPTH_VERTEX_SHADER, shadow::DEPTH_FRAGMENT_SHADER)?,
            );
        }
        self.ensure_shadow_array(device)?;
        log::info!(
            "Lighting initialized: {}px shadow maps x {MAX_SHADOW_MAPS}",
            self.quality.map_size()
        );
        Ok(())
    }

    /// Releases the shadow array and depth shader.
    pub fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(array) = self.shadow_array.take() {
            device.destroy_texture(array);
        }
        if let Some(shader) = self.depth_shader.take() {
            device.destroy_shader(shader);
        }
        self.allocated_quality = None;
        self.lights.clear();
        self.light_space_matrices.clear();
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.depth_shader.is_some()
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Rebuilds the light list from `scene`.
    pub fn update_from_scene(&mut self, scene: &Scene) {
        self.lights.clear();
        self.next_shadow_slot = 0;

        'walk: for id in scene.active_nodes() {
            let node = &scene[id];
            for light in node.components().filter_map(as_light_source) {
                if !light.is_enabled() {
                    continue;
                }
                if self.lights.len() >= MAX_LIGHTS {
                    break 'walk;
                }
                let mut data = light.light_data(node);
                assign_shadow_slot(&mut self.next_shadow_slot, &mut data);
                self.lights.push(data);
            }
        }

        // Slots follow collection order; the sort only groups by type and
        // is stable, so lights of one type keep that order.
        self.lights.sort_by_key(LightData::light_type);

        self.reset_matrices();
    }

    /// Appends a directional light after the collected ones. Returns its
    /// index, or `None` when the light budget is spent.
    pub fn add_virtual_directional_light(&mut self, light: VirtualDirectionalLight) -> Option<usize> {
        if self.lights.len() >= MAX_LIGHTS {
            return None;
        }

        let mut data = LightData {
            direction: light.direction.normalize_or(Vec3::NEG_Y).to_array(),
            color: light.color.to_array(),
            intensity: light.intensity,
            range: 0.0,
            light_type: LightType::Directional as i32,
            casts_shadows: i32::from(light.casts_shadows),
            shadow_bias: light.shadow_bias,
            shadow_opacity: light.shadow_opacity,
            shadow_color: light.shadow_color.to_array(),
            ..LightData::default()
        };
        assign_shadow_slot(&mut self.next_shadow_slot, &mut data);
        self.lights.push(data);
        self.reset_matrices();
        Some(self.lights.len() - 1)
    }

    fn reset_matrices(&mut self) {
        self.light_space_matrices.clear();
        self.light_space_matrices.resize(self.lights.len(), Mat4::IDENTITY);
    }

    #[must_use]
    pub fn lights(&self) -> &[LightData] {
        &self.lights
    }

    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Shadow slices handed out this frame.
    #[must_use]
    pub fn shadow_slots_used(&self) -> u32 {
        self.next_shadow_slot
    }

    /// The light list as a std140 byte slice.
    #[must_use]
    pub fn light_buffer_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lights)
    }

    /// Matrices indexed like [`lights`](Self::lights); identity for lights
    /// without a slice.
    #[must_use]
    pub fn light_space_matrices(&self) -> &[Mat4] {
        &self.light_space_matrices
    }

    // ========================================================================
    // Environment
    // ========================================================================

    #[must_use]
    pub fn ambient_light(&self) -> Vec3 {
        self.ambient
    }

    pub fn set_ambient_light(&mut self, ambient: Vec3) {
        self.ambient = ambient;
    }

    /// Stores `fog` after clamping it.
    pub fn set_fog(&mut self, fog: FogParams) {
        self.fog = fog.clamped();
    }

    #[must_use]
    pub fn fog(&self) -> &FogParams {
        &self.fog
    }

    // ========================================================================
    // Shadow configuration
    // ========================================================================

    #[must_use]
    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }

    pub fn set_shadows_enabled(&mut self, enabled: bool) {
        self.shadows_enabled = enabled;
    }

    /// Takes effect at the next [`render_shadow_maps`](Self::render_shadow_maps).
    pub fn set_shadow_quality(&mut self, quality: ShadowQuality) {
        if self.quality != quality {
            log::debug!("Shadow quality {:?} -> {quality:?}", self.quality);
            self.quality = quality;
        }
    }

    /// Requested tier.
    #[must_use]
    pub fn shadow_quality(&self) -> ShadowQuality {
        self.quality
    }

    /// Slice size of the currently allocated array, if any.
    #[must_use]
    pub fn shadow_map_size(&self) -> Option<u32> {
        self.allocated_quality.map(ShadowQuality::map_size)
    }

    #[must_use]
    pub fn shadow_array(&self) -> Option<TextureId> {
        self.shadow_array
    }

    #[must_use]
    pub fn stats(&self) -> ShadowStats {
        self.stats
    }

    fn ensure_shadow_array(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.shadow_array.is_some() && self.allocated_quality == Some(self.quality) {
            return Ok(());
        }
        if let Some(old) = self.shadow_array.take() {
            device.destroy_texture(old);
        }
        self.allocated_quality = None;

        let array = device.create_depth_array(self.quality.map_size(), MAX_SHADOW_MAPS)?;
        self.shadow_array = Some(array);
        self.allocated_quality = Some(self.quality);
        Ok(())
    }

    // ========================================================================
    // Shadow pass
    // ========================================================================

    /// Renders one depth slice per shadow-casting light.
    ///
    /// Device state is captured first and restored afterwards.
    pub fn render_shadow_maps(
        &mut self,
        scene: &Scene,
        device: &mut dyn GraphicsDevice,
        resources: &mut ResourceCache,
    ) {
        self.stats = ShadowStats::default();
        self.reset_matrices();

        if !self.shadows_enabled || self.lights.iter().all(|l| l.shadow_slot().is_none()) {
            return;
        }
        if let Err(err) = self.ensure_shadow_array(device) {
            log::error!("Shadow map allocation failed: {err}");
            return;
        }
        let (Some(array), Some(shader), Some(size)) =
            (self.shadow_array, self.depth_shader, self.shadow_map_size())
        else {
            return;
        };

        let casters = collect_shadow_casters(scene, device, resources);

        let saved = device.state();
        device.set_viewport(0, 0, size as i32, size as i32);
        device.set_depth_test(true);
        device.set_depth_write(true);
        device.set_color_write(false);
        device.set_blending(false);
        device.set_cull_mode(CullMode::Front);
        device.use_shader(Some(shader));

        for (i, light) in self.lights.iter().enumerate() {
            let Some(slot) = light.shadow_slot() else {
                continue;
            };
            let matrix = shadow::light_space_matrix(light);
            self.light_space_matrices[i] = matrix;

            device.bind_depth_target(Some((array, slot)));
            device.clear(Vec4::ONE, ClearFlags::DEPTH);
            device.set_uniform(shader, "lightSpaceMatrix", UniformValue::Mat4(matrix));
            self.stats.slices_rendered += 1;

            for (model, mesh) in &casters {
                device.set_uniform(shader, "model", UniformValue::Mat4(*model));
                device.bind_vertex_array(Some(mesh.vao));
                if mesh.index_count > 0 {
                    device.draw_indexed(crate::device::Primitive::Triangles, mesh.index_count, 0);
                } else {
                    device.draw(crate::device::Primitive::Triangles, mesh.vertex_count, 0);
                }
                self.stats.caster_draws += 1;
            }
        }

        device.bind_vertex_array(None);
        device.restore_state(&saved);
    }

    // ========================================================================
    // Uniforms
    // ========================================================================

    /// Pushes ambient, fog, camera, the light array, light-space matrices
    /// and the shadow-map array (unit [`SHADOW_MAP_UNIT`]) to `shader`.
    pub fn bind_uniforms(&self, device: &mut dyn GraphicsDevice, shader: ShaderId, camera_pos: Vec3) {
        device.set_uniform(shader, "uAmbientLight", UniformValue::Vec3(self.ambient));
        device.set_uniform(shader, "uLightCount", UniformValue::Int(self.lights.len() as i32));
        device.set_uniform(shader, "uCameraPos", UniformValue::Vec3(camera_pos));

        let fog = &self.fog;
        device.set_uniform(shader, "uFogEnabled", UniformValue::Int(i32::from(fog.enabled)));
        device.set_uniform(shader, "uFogColor", UniformValue::Vec3(fog.color));
        device.set_uniform(shader, "uFogDensity", UniformValue::Float(fog.density));
        device.set_uniform(shader, "uFogStart", UniformValue::Float(fog.start));
        device.set_uniform(shader, "uFogEnd", UniformValue::Float(fog.end));
        device.set_uniform(shader, "uFogHeightFalloff", UniformValue::Float(fog.height_falloff));

        let budget = self.allocated_quality.unwrap_or(self.quality).pcf_budget();
        device.set_uniform(shader, "uPcfSampleBudget", UniformValue::Int(budget as i32));

        for (light, names) in self.lights.iter().zip(&self.uniform_names) {
            for (name, value) in names.iter().zip(light_uniforms(light)) {
                device.set_uniform(shader, name, value);
            }
        }
        for (i, matrix) in self.light_space_matrices.iter().enumerate() {
            device.set_uniform(
                shader,
                &format!("uLightSpaceMatrices[{i}]"),
                UniformValue::Mat4(*matrix),
            );
        }

        if let Some(array) = self.shadow_array {
            device.bind_texture_array(SHADOW_MAP_UNIT, array);
            device.set_uniform(shader, "u_shadow_maps", UniformValue::Sampler(SHADOW_MAP_UNIT));
        }
    }
}

/// Gives `light` the next free slice, or clears its shadow flag when the
/// budget is spent.
fn assign_shadow_slot(next: &mut u32, light: &mut LightData) {
    if !light.casts_shadows() {
        light.clear_shadow_slot();
        return;
    }
    if *next < MAX_SHADOW_MAPS {
        light.shadow_map_index = *next as i32;
        *next += 1;
    } else {
        light.clear_shadow_slot();
    }
}

/// World transform and uploaded mesh of every active shadow-casting
/// component on active 3D nodes.
fn collect_shadow_casters(
    scene: &Scene,
    device: &mut dyn GraphicsDevice,
    resources: &mut ResourceCache,
) -> Vec<(Mat4, GpuMesh)> {
    let mut casters = Vec::new();
    for id in scene.active_nodes() {
        let node = &scene[id];
        if !node.is_3d() {
            continue;
        }
        for component in node.components().filter(|c| c.is_active()) {
            if let Some(mesh) = component.shadow_geometry()
                && let Some(gpu) = resources.mesh(device, mesh)
            {
                casters.push((node.global_transform(), gpu));
            }
        }
    }
    casters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caster() -> LightData {
        LightData {
            casts_shadows: 1,
            ..LightData::default()
        }
    }

    #[test]
    fn slots_run_out_after_eight() {
        let mut next = 0;
        let slots: Vec<i32> = (0..10)
            .map(|_| {
                let mut light = caster();
                assign_shadow_slot(&mut next, &mut light);
                light.shadow_map_index
            })
            .collect();
        assert_eq!(slots, [0, 1, 2, 3, 4, 5, 6, 7, -1, -1]);
        assert_eq!(next, MAX_SHADOW_MAPS);
    }

    #[test]
    fn fog_is_clamped() {
        let fog = FogParams {
            density: -1.0,
            start: 20.0,
            end: 5.0,
            height_falloff: -0.5,
            ..FogParams::default()
        }
        .clamped();
        assert_eq!(fog.density, 0.0);
        assert!((fog.end - 20.1).abs() < 1e-5);
        assert_eq!(fog.height_falloff, 0.0);
    }

    #[test]
    fn virtual_light_is_normalized_and_slotted() {
        let mut lighting = LightingSystem::default();
        let index = lighting.add_virtual_directional_light(VirtualDirectionalLight {
            direction: Vec3::new(0.0, -2.0, 0.0),
            color: Vec3::ONE,
            intensity: 1.0,
            casts_shadows: true,
            shadow_bias: 0.001,
            shadow_opacity: 0.7,
            shadow_color: Vec3::ZERO,
        });
        assert_eq!(index, Some(0));
        let sun = lighting.lights()[0];
        assert_eq!(sun.direction, [0.0, -1.0, 0.0]);
        assert_eq!(sun.shadow_slot(), Some(0));
        assert_eq!(lighting.light_space_matrices().len(), 1);
    }

    #[test]
    fn light_buffer_is_packed() {
        let mut lighting = LightingSystem::default();
        for _ in 0..3 {
            lighting.add_virtual_directional_light(VirtualDirectionalLight {
                direction: Vec3::NEG_Y,
                color: Vec3::ONE,
                intensity: 1.0,
                casts_shadows: false,
                shadow_bias: 0.0,
                shadow_opacity: 0.0,
                shadow_color: Vec3::ZERO,
            });
        }
        assert_eq!(lighting.light_buffer_bytes().len(), 3 * 112);
    }
}
