//! Light components.
//!
//! Each light reads its world position and orientation from the owning
//! `Node3D`; the local −Z axis is the light direction.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::light_data::{LightData, LightType};
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};
use crate::scene::node::Node;

/// Whether a light renders into a shadow-map slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowMode {
    Disabled,
    #[default]
    Enabled,
}

/// Shadow parameters shared by every light kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadow {
    pub mode: ShadowMode,
    /// Depth bias before slope scaling.
    pub bias: f32,
    /// How strongly shadowed fragments are pulled toward `color`.
    pub opacity: f32,
    pub color: Vec4,
}

impl LightShadow {
    fn new(color: Vec4) -> Self {
        Self {
            mode: ShadowMode::Enabled,
            bias: 0.001,
            opacity: 0.8,
            color,
        }
    }

    fn apply(&self, data: &mut LightData) {
        data.casts_shadows = i32::from(self.mode == ShadowMode::Enabled);
        data.shadow_bias = self.bias;
        data.shadow_opacity = self.opacity;
        data.shadow_color = self.color.truncate().to_array();
    }
}

/// Conversion of a light component into its packed record.
///
/// Shadow slots are assigned later by the lighting system; records come
/// back with `shadow_map_index == -1`.
pub trait LightSource {
    fn is_enabled(&self) -> bool;
    fn light_type(&self) -> LightType;
    fn light_data(&self, owner: &Node) -> LightData;
}

/// The light behind `component`, if it is one of the built-in kinds.
#[must_use]
pub fn as_light_source(component: &dyn Component) -> Option<&dyn LightSource> {
    let any = component.as_any();
    if let Some(light) = any.downcast_ref::<OmniLight>() {
        return Some(light);
    }
    if let Some(light) = any.downcast_ref::<DirectionalLight>() {
        return Some(light);
    }
    if let Some(light) = any.downcast_ref::<SpotLight>() {
        return Some(light);
    }
    None
}

fn owner_position(owner: &Node) -> Vec3 {
    owner
        .transform()
        .map_or(Vec3::ZERO, |t| t.global_position())
}

fn owner_forward(owner: &Node, fallback: Vec3) -> Vec3 {
    owner.transform().map_or(fallback, |t| {
        (t.global_rotation() * Vec3::NEG_Z).normalize_or(fallback)
    })
}

const SHADOW_MODES: &[&str] = &["Disabled", "Enabled"];

// ============================================================================
// OmniLight
// ============================================================================

static OMNI_SCHEMA: &[ExportField] = &[
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Light color"),
    ExportField::new("intensity", ExportType::Float, ExportValue::Float(1.0), "Brightness multiplier"),
    ExportField::new("range", ExportType::Float, ExportValue::Float(10.0), "Distance at which the light fades out"),
    ExportField::new("enabled", ExportType::Bool, ExportValue::Bool(true), "Whether the light contributes"),
    ExportField::new("attenuation_constant", ExportType::Float, ExportValue::Float(1.0), "Constant attenuation term"),
    ExportField::new("attenuation_linear", ExportType::Float, ExportValue::Float(0.09), "Linear attenuation term"),
    ExportField::new("attenuation_quadratic", ExportType::Float, ExportValue::Float(0.032), "Quadratic attenuation term"),
    ExportField::new("shadow_mode", ExportType::Enum(SHADOW_MODES), ExportValue::Enum(1), "Shadow casting"),
    ExportField::new("shadow_opacity", ExportType::Float, ExportValue::Float(0.8), "Shadow strength"),
    ExportField::new("shadow_bias", ExportType::Float, ExportValue::Float(0.001), "Depth bias"),
    ExportField::new("shadow_color", ExportType::Color, ExportValue::Vec4([0.3, 0.2, 0.2, 1.0]), "Shadow tint"),
];

/// Point light radiating in every direction.
#[derive(Debug, Clone)]
pub struct OmniLight {
    pub color: Vec4,
    intensity: f32,
    range: f32,
    pub enabled: bool,
    attenuation: Vec3,
    pub shadow: LightShadow,
}

impl Default for OmniLight {
    fn default() -> Self {
        Self::new()
    }
}

impl OmniLight {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec4::ONE,
            intensity: 1.0,
            range: 10.0,
            enabled: true,
            attenuation: Vec3::new(1.0, 0.09, 0.032),
            shadow: LightShadow::new(Vec4::new(0.3, 0.2, 0.2, 1.0)),
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.1);
    }

    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// `(constant, linear, quadratic)`, each clamped to `>= 0`.
    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation = Vec3::new(constant, linear, quadratic).max(Vec3::ZERO);
    }

    #[must_use]
    pub fn attenuation(&self) -> Vec3 {
        self.attenuation
    }
}

impl LightSource for OmniLight {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn light_type(&self) -> LightType {
        LightType::Point
    }

    fn light_data(&self, owner: &Node) -> LightData {
        let mut data = LightData {
            position: owner_position(owner).to_array(),
            direction: [0.0; 3],
            color: self.color.truncate().to_array(),
            intensity: self.intensity,
            range: self.range,
            light_type: LightType::Point as i32,
            attenuation_constant: self.attenuation.x,
            attenuation_linear: self.attenuation.y,
            attenuation_quadratic: self.attenuation.z,
            ..LightData::default()
        };
        self.shadow.apply(&mut data);
        data
    }
}

impl Component for OmniLight {
    fn type_name(&self) -> &'static str {
        "OmniLight"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn export_schema(&self) -> &'static [ExportField] {
        OMNI_SCHEMA
    }
}

// ============================================================================
// DirectionalLight
// ============================================================================

static DIRECTIONAL_SCHEMA: &[ExportField] = &[
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Light color"),
    ExportField::new("intensity", ExportType::Float, ExportValue::Float(1.0), "Brightness multiplier"),
    ExportField::new("enabled", ExportType::Bool, ExportValue::Bool(true), "Whether the light contributes"),
    ExportField::new("shadow_mode", ExportType::Enum(SHADOW_MODES), ExportValue::Enum(1), "Shadow casting"),
    ExportField::new("shadow_opacity", ExportType::Float, ExportValue::Float(0.8), "Shadow strength"),
    ExportField::new("shadow_bias", ExportType::Float, ExportValue::Float(0.001), "Depth bias"),
    ExportField::new("shadow_color", ExportType::Color, ExportValue::Vec4([0.2, 0.2, 0.3, 1.0]), "Shadow tint"),
];

/// Infinitely distant light shining along the owner's −Z axis.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub color: Vec4,
    intensity: f32,
    pub enabled: bool,
    pub shadow: LightShadow,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionalLight {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec4::ONE,
            intensity: 1.0,
            enabled: true,
            shadow: LightShadow::new(Vec4::new(0.2, 0.2, 0.3, 1.0)),
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// World direction the light travels in; straight down without a 3D
    /// owner.
    #[must_use]
    pub fn direction(owner: &Node) -> Vec3 {
        owner_forward(owner, Vec3::NEG_Y)
    }
}

impl LightSource for DirectionalLight {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn light_type(&self) -> LightType {
        LightType::Directional
    }

    fn light_data(&self, owner: &Node) -> LightData {
        let mut data = LightData {
            position: owner_position(owner).to_array(),
            direction: Self::direction(owner).to_array(),
            color: self.color.truncate().to_array(),
            intensity: self.intensity,
            range: 0.0,
            light_type: LightType::Directional as i32,
            ..LightData::default()
        };
        self.shadow.apply(&mut data);
        data
    }
}

impl Component for DirectionalLight {
    fn type_name(&self) -> &'static str {
        "DirectionalLight"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn export_schema(&self) -> &'static [ExportField] {
        DIRECTIONAL_SCHEMA
    }
}

// ============================================================================
// SpotLight
// ============================================================================

static SPOT_SCHEMA: &[ExportField] = &[
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Light color"),
    ExportField::new("intensity", ExportType::Float, ExportValue::Float(1.0), "Brightness multiplier"),
    ExportField::new("range", ExportType::Float, ExportValue::Float(10.0), "Distance at which the light fades out"),
    ExportField::new("inner_cone_angle", ExportType::Float, ExportValue::Float(30.0), "Full inner cone angle in degrees"),
    ExportField::new("outer_cone_angle", ExportType::Float, ExportValue::Float(45.0), "Full outer cone angle in degrees"),
    ExportField::new("enabled", ExportType::Bool, ExportValue::Bool(true), "Whether the light contributes"),
    ExportField::new("attenuation_constant", ExportType::Float, ExportValue::Float(1.0), "Constant attenuation term"),
    ExportField::new("attenuation_linear", ExportType::Float, ExportValue::Float(0.09), "Linear attenuation term"),
    ExportField::new("attenuation_quadratic", ExportType::Float, ExportValue::Float(0.032), "Quadratic attenuation term"),
    ExportField::new("shadow_mode", ExportType::Enum(SHADOW_MODES), ExportValue::Enum(1), "Shadow casting"),
    ExportField::new("shadow_opacity", ExportType::Float, ExportValue::Float(0.8), "Shadow strength"),
    ExportField::new("shadow_bias", ExportType::Float, ExportValue::Float(0.001), "Depth bias"),
    ExportField::new("shadow_color", ExportType::Color, ExportValue::Vec4([0.2, 0.3, 0.2, 1.0]), "Shadow tint"),
];

/// Cone light shining along the owner's −Z axis.
#[derive(Debug, Clone)]
pub struct SpotLight {
    pub color: Vec4,
    intensity: f32,
    range: f32,
    inner_cone_angle: f32,
    outer_cone_angle: f32,
    pub enabled: bool,
    attenuation: Vec3,
    pub shadow: LightShadow,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotLight {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec4::ONE,
            intensity: 1.0,
            range: 10.0,
            inner_cone_angle: 30.0,
            outer_cone_angle: 45.0,
            enabled: true,
            attenuation: Vec3::new(1.0, 0.09, 0.032),
            shadow: LightShadow::new(Vec4::new(0.2, 0.3, 0.2, 1.0)),
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.1);
    }

    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Full cone angles in degrees. The inner cone never exceeds the outer
    /// one.
    pub fn set_cone_angles(&mut self, inner: f32, outer: f32) {
        self.outer_cone_angle = outer.clamp(1.0, 179.0);
        self.inner_cone_angle = inner.clamp(0.0, self.outer_cone_angle);
    }

    #[must_use]
    pub fn inner_cone_angle(&self) -> f32 {
        self.inner_cone_angle
    }

    #[must_use]
    pub fn outer_cone_angle(&self) -> f32 {
        self.outer_cone_angle
    }

    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation = Vec3::new(constant, linear, quadratic).max(Vec3::ZERO);
    }

    #[must_use]
    pub fn attenuation(&self) -> Vec3 {
        self.attenuation
    }

    #[must_use]
    pub fn direction(owner: &Node) -> Vec3 {
        owner_forward(owner, Vec3::NEG_Z)
    }
}

impl LightSource for SpotLight {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn light_type(&self) -> LightType {
        LightType::Spot
    }

    fn light_data(&self, owner: &Node) -> LightData {
        let mut data = LightData {
            position: owner_position(owner).to_array(),
            direction: Self::direction(owner).to_array(),
            color: self.color.truncate().to_array(),
            intensity: self.intensity,
            range: self.range,
            light_type: LightType::Spot as i32,
            attenuation_constant: self.attenuation.x,
            attenuation_linear: self.attenuation.y,
            attenuation_quadratic: self.attenuation.z,
            inner_cone_cos: (self.inner_cone_angle * 0.5).to_radians().cos(),
            outer_cone_cos: (self.outer_cone_angle * 0.5).to_radians().cos(),
            ..LightData::default()
        };
        self.shadow.apply(&mut data);
        data
    }
}

impl Component for SpotLight {
    fn type_name(&self) -> &'static str {
        "SpotLight"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SPOT_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::NodeKind;

    #[test]
    fn spot_cones_are_half_angle_cosines() {
        let mut spot = SpotLight::new();
        spot.set_cone_angles(60.0, 90.0);
        let data = spot.light_data(&Node::new("spot", NodeKind::node3d()));
        assert!((data.inner_cone_cos - 30f32.to_radians().cos()).abs() < 1e-6);
        assert!((data.outer_cone_cos - 45f32.to_radians().cos()).abs() < 1e-6);
        assert_eq!(data.light_type(), LightType::Spot);
    }

    #[test]
    fn unrotated_lights_point_down_negative_z() {
        let node = Node::new("sun", NodeKind::node3d());
        assert!((DirectionalLight::direction(&node) - Vec3::NEG_Z).length() < 1e-6);

        let plain = Node::new("plain", NodeKind::Node);
        assert_eq!(DirectionalLight::direction(&plain), Vec3::NEG_Y);
    }

    #[test]
    fn disabled_shadow_mode_clears_flag() {
        let mut omni = OmniLight::new();
        omni.shadow.mode = ShadowMode::Disabled;
        let data = omni.light_data(&Node::new("omni", NodeKind::node3d()));
        assert!(!data.casts_shadows());
        assert_eq!(data.shadow_map_index, -1);
    }
}
