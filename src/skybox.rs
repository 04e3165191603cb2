//! Skybox
//!
//! [`Skybox3D`] draws the background before any 3D content and feeds the
//! lighting system: an ambient term derived from the sky, the fog
//! parameters and, for solid and procedural skies, a sun that casts
//! shadows.
//!
//! The cube is drawn with the view translation stripped and with depth test
//! and depth write disabled; the renderer restores both afterwards.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::device::{GraphicsDevice, ShaderId, TextureId, UniformValue};
use crate::lighting::{FogParams, LightingSystem, VirtualDirectionalLight};
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};

const AMBIENT_MIN: f32 = 0.02;
const AMBIENT_MAX: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SkyboxMode {
    #[default]
    SolidColor,
    /// Equirectangular image.
    PanoramicImage,
    Cubemap,
    /// Gradient between shadow and sun colour with a sun disk.
    ProceduralSky,
}

impl SkyboxMode {
    /// Value of the `skyboxMode` uniform.
    #[must_use]
    pub const fn shader_index(self) -> i32 {
        match self {
            SkyboxMode::SolidColor => 0,
            SkyboxMode::PanoramicImage => 1,
            SkyboxMode::Cubemap => 2,
            SkyboxMode::ProceduralSky => 3,
        }
    }

    #[must_use]
    pub const fn uses_texture(self) -> bool {
        matches!(self, SkyboxMode::PanoramicImage | SkyboxMode::Cubemap)
    }
}

const MODES: &[&str] = &["Solid Color", "Panoramic Image", "Cubemap", "Procedural Sky"];

static SCHEMA: &[ExportField] = &[
    ExportField::new("skybox_mode", ExportType::Enum(MODES), ExportValue::Enum(0), "Skybox rendering mode"),
    ExportField::new("background_color", ExportType::Color, ExportValue::Vec4([0.5, 0.7, 1.0, 1.0]), "Background color (RGBA)"),
    ExportField::new("texture_path", ExportType::FilePath, ExportValue::String(""), "Panoramic or cubemap image"),
    ExportField::new("texture_rotation", ExportType::Float, ExportValue::Float(0.0), "Texture rotation in degrees"),
    ExportField::new("exposure", ExportType::Float, ExportValue::Float(1.0), "Texture brightness"),
    ExportField::new("sun_enabled", ExportType::Bool, ExportValue::Bool(true), "Add a shadow-casting sun"),
    ExportField::new("sun_color", ExportType::Color, ExportValue::Vec4([1.0, 0.95, 0.8, 1.0]), "Sun color"),
    ExportField::new("sun_intensity", ExportType::Float, ExportValue::Float(1.0), "Sun brightness"),
    ExportField::new("sun_rotation", ExportType::Vec2, ExportValue::Vec2([-30.0, 45.0]), "Sun pitch and yaw in degrees"),
    ExportField::new("shadow_color", ExportType::Color, ExportValue::Vec4([0.3, 0.4, 0.6, 1.0]), "Sky shadow tint"),
    ExportField::new("fog_enabled", ExportType::Bool, ExportValue::Bool(false), "Enable distance fog"),
    ExportField::new("fog_color", ExportType::Color, ExportValue::Vec4([0.7, 0.8, 0.9, 1.0]), "Fog color (RGB)"),
    ExportField::new("fog_density", ExportType::Float, ExportValue::Float(0.02), "Fog density factor"),
    ExportField::new("fog_start", ExportType::Float, ExportValue::Float(10.0), "Distance where fog starts"),
    ExportField::new("fog_end", ExportType::Float, ExportValue::Float(100.0), "Distance where fog reaches maximum"),
    ExportField::new("fog_height_falloff", ExportType::Float, ExportValue::Float(0.1), "Height-based fog falloff"),
];

#[derive(Debug, Clone)]
pub struct Skybox3D {
    pub mode: SkyboxMode,
    pub background_color: Vec4,
    pub texture_path: String,
    /// Degrees.
    pub texture_rotation: f32,
    exposure: f32,

    pub sun_enabled: bool,
    pub sun_color: Vec3,
    sun_intensity: f32,
    /// Pitch and yaw in degrees.
    pub sun_rotation: Vec2,
    pub shadow_color: Vec3,

    fog: FogParams,
    pub enabled: bool,
}

impl Default for Skybox3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Skybox3D {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: SkyboxMode::SolidColor,
            background_color: Vec4::new(0.5, 0.7, 1.0, 1.0),
            texture_path: String::new(),
            texture_rotation: 0.0,
            exposure: 1.0,
            sun_enabled: true,
            sun_color: Vec3::new(1.0, 0.95, 0.8),
            sun_intensity: 1.0,
            sun_rotation: Vec2::new(-30.0, 45.0),
            shadow_color: Vec3::new(0.3, 0.4, 0.6),
            fog: FogParams::default(),
            enabled: true,
        }
    }

    #[must_use]
    pub fn solid(color: Vec4) -> Self {
        Self {
            background_color: color,
            ..Self::new()
        }
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(0.0);
    }

    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn set_sun_intensity(&mut self, intensity: f32) {
        self.sun_intensity = intensity.max(0.0);
    }

    #[must_use]
    pub fn sun_intensity(&self) -> f32 {
        self.sun_intensity
    }

    pub fn set_fog(&mut self, fog: FogParams) {
        self.fog = fog.clamped();
    }

    #[must_use]
    pub fn fog(&self) -> &FogParams {
        &self.fog
    }

    /// Unit vector from pitch/yaw: `(cos p sin y, sin p, cos p cos y)`.
    #[must_use]
    pub fn sun_direction(&self) -> Vec3 {
        let pitch = self.sun_rotation.x.to_radians();
        let yaw = self.sun_rotation.y.to_radians();
        Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos()).normalize_or(Vec3::NEG_Y)
    }

    // ========================================================================
    // Lighting
    // ========================================================================

    /// Ambient light implied by the sky, each channel in `[0.02, 0.8]`.
    #[must_use]
    pub fn ambient_contribution(&self) -> Vec3 {
        let ambient = match self.mode {
            SkyboxMode::SolidColor => {
                let base = self.background_color.truncate() * 0.25;
                Vec3::new(base.x * 1.05, base.y, base.z * 0.95)
            }
            SkyboxMode::ProceduralSky => {
                let mut ambient = self.shadow_color * 0.4;
                if self.sun_enabled {
                    let height = self.sun_direction().y.clamp(0.0, 1.0);
                    ambient += self.sun_color * (height * self.sun_intensity * 0.15);
                    let sky_tint = Vec3::new(0.4, 0.6, 1.0).lerp(self.sun_color, height * 0.3);
                    ambient = ambient.lerp(sky_tint * 0.2, 0.3);
                }
                ambient
            }
            SkyboxMode::PanoramicImage | SkyboxMode::Cubemap => {
                let exposure = self.exposure.clamp(0.5, 2.0);
                let phase = (self.texture_rotation.to_radians() * 0.1).sin() * 0.05 + 1.0;
                Vec3::new(0.18, 0.20, 0.25) * exposure * 0.8 * phase
            }
        };
        ambient.clamp(Vec3::splat(AMBIENT_MIN), Vec3::splat(AMBIENT_MAX))
    }

    /// The sun as a shadow-casting directional light, for solid and
    /// procedural skies with the sun enabled.
    ///
    /// Dimmed toward the horizon by `mix(0.3, 1, height)` and warmed when
    /// its height is below 0.3.
    #[must_use]
    pub fn virtual_sun(&self) -> Option<VirtualDirectionalLight> {
        let has_sun = matches!(self.mode, SkyboxMode::SolidColor | SkyboxMode::ProceduralSky);
        if !self.sun_enabled || !has_sun {
            return None;
        }

        let direction = self.sun_direction();
        let height = direction.y.clamp(0.0, 1.0);
        let intensity = self.sun_intensity * (0.3 + 0.7 * height);
        let color = if height < 0.3 {
            self.sun_color * Vec3::new(1.2, 0.9, 0.7)
        } else {
            self.sun_color
        };

        Some(VirtualDirectionalLight {
            direction,
            color,
            intensity,
            casts_shadows: true,
            shadow_bias: 0.001,
            shadow_opacity: 0.7,
            shadow_color: self.shadow_color,
        })
    }

    /// Sets ambient and fog, and appends the sun when there is one.
    pub fn apply_lighting(&self, lighting: &mut LightingSystem) {
        lighting.set_ambient_light(self.ambient_contribution());
        lighting.set_fog(self.fog);
        if let Some(sun) = self.virtual_sun()
            && lighting.add_virtual_directional_light(sun).is_none()
        {
            log::debug!("Skybox sun dropped: light budget spent");
        }
    }

    /// Uniform snapshot for one skybox draw.
    #[must_use]
    pub fn draw_params(&self, texture: Option<TextureId>) -> SkyboxDraw {
        SkyboxDraw {
            mode: self.mode,
            background_color: self.background_color,
            texture: texture.filter(|_| self.mode.uses_texture()),
            texture_rotation: self.texture_rotation,
            exposure: self.exposure,
            sun_enabled: self.sun_enabled,
            sun_direction: self.sun_direction(),
            sun_color: self.sun_color,
            sun_intensity: self.sun_intensity,
            shadow_color: self.shadow_color,
            fog: self.fog,
        }
    }
}

impl Component for Skybox3D {
    fn type_name(&self) -> &'static str {
        "Skybox3D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SCHEMA
    }
}

// ============================================================================
// Draw
// ============================================================================

/// Everything the skybox shader needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyboxDraw {
    pub mode: SkyboxMode,
    pub background_color: Vec4,
    pub texture: Option<TextureId>,
    pub texture_rotation: f32,
    pub exposure: f32,
    pub sun_enabled: bool,
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub shadow_color: Vec3,
    pub fog: FogParams,
}

impl SkyboxDraw {
    /// Pushes the draw's uniforms. `view` has its translation removed here.
    pub fn apply_uniforms(
        &self,
        device: &mut dyn GraphicsDevice,
        shader: ShaderId,
        view: Mat4,
        projection: Mat4,
    ) {
        let set = |device: &mut dyn GraphicsDevice, name: &str, value| {
            device.set_uniform(shader, name, value);
        };

        set(device, "view", UniformValue::Mat4(strip_translation(view)));
        set(device, "projection", UniformValue::Mat4(projection));
        set(device, "skyboxMode", UniformValue::Int(self.mode.shader_index()));
        set(device, "backgroundColor", UniformValue::Vec4(self.background_color));
        set(device, "textureRotation", UniformValue::Float(self.texture_rotation));
        set(device, "exposure", UniformValue::Float(self.exposure));
        set(device, "sunEnabled", UniformValue::Int(i32::from(self.sun_enabled)));
        set(device, "sunDirection", UniformValue::Vec3(self.sun_direction));
        set(device, "sunColor", UniformValue::Vec3(self.sun_color));
        set(device, "sunIntensity", UniformValue::Float(self.sun_intensity));
        set(device, "shadowColor", UniformValue::Vec3(self.shadow_color));
        set(device, "fogEnabled", UniformValue::Int(i32::from(self.fog.enabled)));
        set(device, "fogColor", UniformValue::Vec3(self.fog.color));
        set(device, "fogDensity", UniformValue::Float(self.fog.density));
        set(device, "fogStart", UniformValue::Float(self.fog.start));
        set(device, "fogEnd", UniformValue::Float(self.fog.end));
        set(device, "fogHeightFalloff", UniformValue::Float(self.fog.height_falloff));

        device.bind_texture(0, self.texture);
        set(device, "skyTexture", UniformValue::Sampler(0));
    }
}

/// Keeps only the rotation part of a view matrix.
#[must_use]
pub fn strip_translation(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

/// 36 positions (12 triangles) of the unit cube around the origin.
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 108] = [
    -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
];

pub(crate) const SKYBOX_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;

out vec3 TexCoords;

uniform mat4 projection;
uniform mat4 view;

void main() {
    TexCoords = aPos;
    vec4 pos = projection * view * vec4(aPos, 1.0);
    gl_Position = pos.xyww;
}
";

pub(crate) const SKYBOX_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;

in vec3 TexCoords;

uniform int skyboxMode;
uniform vec4 backgroundColor;
uniform sampler2D skyTexture;
uniform float textureRotation;
uniform float exposure;

uniform bool sunEnabled;
uniform vec3 sunDirection;
uniform vec3 sunColor;
uniform float sunIntensity;
uniform vec3 shadowColor;

uniform bool fogEnabled;
uniform vec3 fogColor;
uniform float fogDensity;
uniform float fogStart;
uniform float fogEnd;
uniform float fogHeightFalloff;

vec2 sampleSphericalMap(vec3 v) {
    vec2 uv = vec2(atan(v.z, v.x), asin(v.y));
    uv *= vec2(0.1591, 0.3183);
    uv += 0.5;
    return uv;
}

vec3 proceduralSky(vec3 direction) {
    float sunDot = dot(direction, normalize(sunDirection));
    float sunFactor = pow(max(sunDot, 0.0), 32.0);
    vec3 sky = mix(shadowColor, sunColor, max(direction.y, 0.0));
    if (sunEnabled) {
        sky += sunColor * sunFactor * sunIntensity;
    }
    return sky;
}

float skyFogFactor(vec3 direction) {
    // The sky sits at a fixed far distance.
    float distance = 1000.0;
    float heightFactor = exp(-max(0.0, -direction.y) * fogHeightFalloff);
    float fog = 0.0;
    if (distance > fogStart) {
        fog = 1.0 - exp(-fogDensity * distance * 0.01);
    }
    return fog * heightFactor;
}

void main() {
    vec3 direction = normalize(TexCoords);
    vec4 sky = backgroundColor;

    if (skyboxMode == 1 || skyboxMode == 2) {
        vec2 uv = sampleSphericalMap(direction);
        uv.x += radians(textureRotation) / (2.0 * 3.14159);
        sky = texture(skyTexture, uv) * exposure;
    } else if (skyboxMode == 3) {
        sky = vec4(proceduralSky(direction), 1.0);
    }

    if (fogEnabled) {
        sky.rgb = mix(sky.rgb, fogColor, skyFogFactor(direction));
    }

    FragColor = sky;
}
";

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn default_sun_points_down_and_away() {
        let sky = Skybox3D::new();
        let dir = sky.sun_direction();
        assert!((dir.length() - 1.0).abs() < EPSILON);
        assert!((dir.y - (-0.5)).abs() < EPSILON);
    }

    #[test]
    fn solid_ambient_shifts_channels() {
        let sky = Skybox3D::solid(Vec4::new(0.5, 0.7, 1.0, 1.0));
        let ambient = sky.ambient_contribution();
        assert!((ambient.x - 0.5 * 0.25 * 1.05).abs() < EPSILON);
        assert!((ambient.y - 0.7 * 0.25).abs() < EPSILON);
        assert!((ambient.z - 0.25 * 0.95).abs() < EPSILON);
    }

    #[test]
    fn ambient_is_clamped() {
        let dark = Skybox3D::solid(Vec4::ZERO);
        assert_eq!(dark.ambient_contribution(), Vec3::splat(AMBIENT_MIN));

        let bright = Skybox3D::solid(Vec4::splat(10.0));
        assert_eq!(bright.ambient_contribution(), Vec3::splat(AMBIENT_MAX));
    }

    #[test]
    fn low_sun_is_dim_and_warm() {
        let sky = Skybox3D::new();
        let sun = sky.virtual_sun().expect("solid sky has a sun");
        assert!((sun.intensity - 0.3).abs() < EPSILON);
        assert!((sun.color.x - 1.2).abs() < EPSILON);
        assert!(sun.casts_shadows);
    }

    #[test]
    fn panoramic_sky_has_no_sun() {
        let sky = Skybox3D {
            mode: SkyboxMode::PanoramicImage,
            ..Skybox3D::new()
        };
        assert!(sky.virtual_sun().is_none());
    }

    #[test]
    fn view_translation_is_removed() {
        let view = Mat4::look_at_rh(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y);
        let stripped = strip_translation(view);
        assert_eq!(stripped.w_axis, Vec4::W);
        assert_eq!(stripped.x_axis.truncate(), view.x_axis.truncate());
    }
}
