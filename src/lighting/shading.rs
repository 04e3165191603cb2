//! CPU reference of the lit fragment shader.
//!
//! Each function mirrors one step of the GLSL in `renderer::shaders` so the
//! shading contract can be checked without a GPU: range falloff,
//! attenuation, the spot cone, slope-scaled shadow bias, adaptive PCF,
//! shadow tinting, height fog and the final composition.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::light_data::{LightData, LightType};
use super::FogParams;

/// Blinn-Phong exponent.
pub const SPECULAR_EXPONENT: f32 = 64.0;
/// Specular contribution relative to diffuse.
pub const SPECULAR_STRENGTH: f32 = 0.3;
/// Upper bound of the lit colour per channel.
pub const MAX_BRIGHTNESS: f32 = 1.5;
/// Fragments below this alpha are discarded.
pub const ALPHA_DISCARD: f32 = 0.01;

/// Poisson-disk offsets used by the PCF filter, first `n` taken.
pub const POISSON_DISK: [[f32; 2]; 25] = [
    [-0.942_016_24, -0.399_062_16],
    [0.945_586_1, -0.768_907_25],
    [-0.094_184_1, -0.929_388_7],
    [0.344_959_38, 0.293_877_6],
    [-0.915_885_8, 0.457_714_32],
    [-0.815_442_3, -0.879_124_64],
    [-0.382_775_43, 0.276_768_45],
    [0.974_844, 0.756_483_8],
    [0.443_233_25, -0.975_115_54],
    [0.537_429_8, -0.473_734_2],
    [-0.264_969_1, -0.418_930_23],
    [0.791_975_14, 0.190_901_88],
    [-0.241_888_4, 0.997_065_07],
    [-0.814_099_55, 0.914_375_9],
    [0.199_841_26, 0.786_413_67],
    [0.143_831_61, -0.141_007_9],
    [-0.655_634_64, 0.618_604_25],
    [0.727_813_3, -0.311_480_52],
    [-0.425_439_5, -0.816_479_56],
    [0.139_658_22, 0.567_893_2],
    [0.821_341_57, 0.345_678_9],
    [-0.234_567_89, 0.876_543_2],
    [0.567_890_1, -0.123_456_78],
    [-0.789_012_34, -0.234_567_89],
    [0.012_345_67, 0.987_654_3],
];

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ============================================================================
// Per-light terms
// ============================================================================

/// `1 − smoothstep(0.8r, r, d)`, and zero past the range.
#[must_use]
pub fn range_falloff(distance: f32, range: f32) -> f32 {
    if distance > range {
        return 0.0;
    }
    1.0 - smoothstep(range * 0.8, range, distance)
}

/// `1 / (c + l·d + q·d²)`.
#[must_use]
pub fn attenuation(light: &LightData, distance: f32) -> f32 {
    let denom = light.attenuation_constant
        + light.attenuation_linear * distance
        + light.attenuation_quadratic * distance * distance;
    if denom <= f32::EPSILON { 0.0 } else { 1.0 / denom }
}

/// Cone intensity for `cos_theta` (cosine between the spot axis and the
/// direction to the fragment). Zero outside the outer cone.
#[must_use]
pub fn spot_factor(light: &LightData, cos_theta: f32) -> f32 {
    if cos_theta < light.outer_cone_cos {
        return 0.0;
    }
    let epsilon = light.inner_cone_cos - light.outer_cone_cos;
    if epsilon <= f32::EPSILON {
        return 1.0;
    }
    let t = ((cos_theta - light.outer_cone_cos) / epsilon).clamp(0.0, 1.0);
    smoothstep(0.0, 1.0, t)
}

/// Per-type multiplier applied to the configured shadow bias.
#[must_use]
pub fn bias_multiplier(light_type: LightType) -> f32 {
    match light_type {
        LightType::Directional => 1.5,
        LightType::Point => 2.0,
        LightType::Spot => 1.8,
    }
}

/// Slope-scaled depth bias, clamped to `[0.1, 8] × base`.
#[must_use]
pub fn slope_bias(light: &LightData, cos_theta: f32) -> f32 {
    let base = light.shadow_bias * bias_multiplier(light.light_type());
    let cos_theta = cos_theta.clamp(0.0, 1.0);
    let slope = base * (1.0 - cos_theta * cos_theta).sqrt() / cos_theta.max(0.1);
    (base + slope).clamp(base * 0.1, base * 8.0)
}

/// PCF taps: full quality for directional lights and close fragments.
#[must_use]
pub fn pcf_sample_count(light: &LightData, distance: f32) -> usize {
    if light.light_type() == LightType::Directional || distance < light.range * 0.3 {
        25
    } else if distance < light.range * 0.6 {
        16
    } else {
        9
    }
}

/// Filter radius in texels, wider for opaque shadows.
#[must_use]
pub fn pcf_filter_radius(light: &LightData) -> f32 {
    1.5 + (3.0 - 1.5) * light.shadow_opacity
}

/// Shadow factor in `[0, opacity]` for a fragment.
///
/// `light_space` is the light's matrix, `texel` the reciprocal map size,
/// `budget` the quality tier's PCF cap and `sample_depth` reads the stored
/// depth at a `[0, 1]` map coordinate. Fragments outside the light frustum
/// are unshadowed.
#[must_use]
pub fn shadow_factor(
    light: &LightData,
    light_space: Mat4,
    frag_pos: Vec3,
    normal: Vec3,
    texel: f32,
    budget: usize,
    sample_depth: impl Fn(Vec2) -> f32,
) -> f32 {
    if light.shadow_slot().is_none() {
        return 0.0;
    }

    let clip = light_space * frag_pos.extend(1.0);
    if clip.w.abs() <= f32::EPSILON {
        return 0.0;
    }
    let coords = clip.truncate() / clip.w * 0.5 + Vec3::splat(0.5);
    if coords.z > 1.0 || coords.x < 0.0 || coords.x > 1.0 || coords.y < 0.0 || coords.y > 1.0 {
        return 0.0;
    }

    let to_light = match light.light_type() {
        LightType::Point => (light.position() - frag_pos).normalize_or_zero(),
        LightType::Directional | LightType::Spot => (-light.direction()).normalize_or_zero(),
    };
    let bias = slope_bias(light, normal.dot(to_light));

    let distance = light.position().distance(frag_pos);
    let samples = pcf_sample_count(light, distance).min(budget).max(1);
    let radius = pcf_filter_radius(light);

    let occluded = POISSON_DISK[..samples]
        .iter()
        .filter(|offset| {
            let uv = coords.truncate() + Vec2::from_array(**offset) * texel * radius;
            coords.z - bias > sample_depth(uv)
        })
        .count();

    occluded as f32 / samples as f32 * light.shadow_opacity
}

/// Blends a light's contribution toward its dimmed shadow colour.
///
/// `scale` is the attenuation (and cone intensity) applied to the tint.
#[must_use]
pub fn apply_shadow(contribution: Vec3, light: &LightData, shadow: f32, scale: f32) -> Vec3 {
    let tint = light.shadow_color() * 0.2 * scale;
    contribution.lerp(tint, shadow * light.shadow_opacity)
}

/// Diffuse plus specular from one light, before shadowing. Returns the
/// colour and the scale used for the shadow tint.
#[must_use]
pub fn light_contribution(
    light: &LightData,
    normal: Vec3,
    frag_pos: Vec3,
    view_dir: Vec3,
) -> (Vec3, f32) {
    let (to_light, scale) = match light.light_type() {
        LightType::Directional => ((-light.direction()).normalize_or_zero(), 1.0),
        LightType::Point | LightType::Spot => {
            let delta = light.position() - frag_pos;
            let distance = delta.length();
            if distance > light.range {
                return (Vec3::ZERO, 0.0);
            }
            let to_light = delta.normalize_or_zero();
            let mut scale = attenuation(light, distance) * range_falloff(distance, light.range);
            if light.light_type() == LightType::Spot {
                let cos_theta = to_light.dot((-light.direction()).normalize_or_zero());
                if cos_theta < light.outer_cone_cos {
                    return (Vec3::ZERO, 0.0);
                }
                scale *= spot_factor(light, cos_theta);
            }
            (to_light, scale)
        }
    };

    let radiance = light.color() * light.intensity * scale;
    let diffuse = radiance * normal.dot(to_light).max(0.0);
    let halfway = (to_light + view_dir).normalize_or_zero();
    let specular =
        radiance * normal.dot(halfway).max(0.0).powf(SPECULAR_EXPONENT) * SPECULAR_STRENGTH;
    (diffuse + specular, scale)
}

// ============================================================================
// Fog
// ============================================================================

/// Height-modulated exponential fog amount in `[0, 1]`.
#[must_use]
pub fn fog_factor(fog: &FogParams, frag_pos: Vec3, camera_pos: Vec3) -> f32 {
    if !fog.enabled {
        return 0.0;
    }
    let distance = camera_pos.distance(frag_pos);
    let height = frag_pos.y - camera_pos.y;
    let height_factor = (-(-height).max(0.0) * fog.height_falloff).exp();

    let amount = if distance > fog.start {
        (1.0 - (-fog.density * distance * 0.01).exp()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    amount * height_factor
}

// ============================================================================
// Composition
// ============================================================================

/// Inputs of one fragment.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_color: Vec4,
    pub color: Vec4,
    pub use_lighting: bool,
}

/// Final colour of a fragment, `None` when discarded.
///
/// `shadows[i]` is the shadow factor of `lights[i]` (missing entries count
/// as unshadowed).
#[must_use]
pub fn shade_fragment(
    fragment: &Fragment,
    lights: &[LightData],
    shadows: &[f32],
    ambient: Vec3,
    fog: &FogParams,
    camera_pos: Vec3,
) -> Option<Vec4> {
    let base = fragment.tex_color.truncate() * fragment.color.truncate();

    let mut result = if fragment.use_lighting {
        let normal = fragment.normal.normalize_or_zero();
        let view_dir = (camera_pos - fragment.position).normalize_or_zero();
        let mut lit = ambient;
        for (i, light) in lights.iter().take(super::MAX_LIGHTS).enumerate() {
            let (contribution, scale) =
                light_contribution(light, normal, fragment.position, view_dir);
            let shadow = shadows.get(i).copied().unwrap_or(0.0);
            lit += apply_shadow(contribution, light, shadow, scale);
        }
        (lit * base).min(Vec3::splat(MAX_BRIGHTNESS))
    } else {
        base
    };

    if fog.enabled {
        let amount = fog_factor(fog, fragment.position, camera_pos);
        result = result.lerp(fog.color, amount);
    }

    let alpha = fragment.tex_color.w * fragment.color.w;
    (alpha >= ALPHA_DISCARD).then(|| result.extend(alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn point(range: f32) -> LightData {
        LightData {
            light_type: LightType::Point as i32,
            range,
            ..LightData::default()
        }
    }

    #[test]
    fn falloff_is_full_inside_and_zero_past_range() {
        assert!((range_falloff(5.0, 10.0) - 1.0).abs() < EPSILON);
        assert!((range_falloff(9.0, 10.0) - 0.5).abs() < EPSILON);
        assert_eq!(range_falloff(10.5, 10.0), 0.0);
    }

    #[test]
    fn spot_cone_edges() {
        let light = LightData {
            light_type: LightType::Spot as i32,
            inner_cone_cos: 0.9,
            outer_cone_cos: 0.8,
            ..LightData::default()
        };
        assert_eq!(spot_factor(&light, 0.7), 0.0);
        assert!((spot_factor(&light, 0.95) - 1.0).abs() < EPSILON);
        assert!((spot_factor(&light, 0.85) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn bias_is_clamped_at_grazing_angles() {
        let mut light = point(10.0);
        light.shadow_bias = 0.001;
        let base = 0.002;
        assert!((slope_bias(&light, 1.0) - base).abs() < EPSILON);
        assert!((slope_bias(&light, 0.0) - base * 8.0).abs() < EPSILON);
    }

    #[test]
    fn pcf_count_drops_with_distance() {
        let light = point(10.0);
        assert_eq!(pcf_sample_count(&light, 1.0), 25);
        assert_eq!(pcf_sample_count(&light, 5.0), 16);
        assert_eq!(pcf_sample_count(&light, 8.0), 9);
        assert_eq!(pcf_sample_count(&LightData::default(), 100.0), 25);
    }

    #[test]
    fn fog_below_camera_thins_out() {
        let fog = FogParams {
            enabled: true,
            ..FogParams::default()
        };
        let camera = Vec3::new(0.0, 10.0, 0.0);
        let level = fog_factor(&fog, Vec3::new(0.0, 10.0, -50.0), camera);
        let below = fog_factor(&fog, Vec3::new(0.0, 0.0, -50.0), camera);
        assert!(level > 0.0);
        assert!(below < level);
        assert_eq!(fog_factor(&fog, Vec3::new(0.0, 10.0, -5.0), camera), 0.0);
    }

    #[test]
    fn transparent_fragments_are_discarded() {
        let fragment = Fragment {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            tex_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            color: Vec4::ONE,
            use_lighting: false,
        };
        let fog = FogParams::default();
        assert!(shade_fragment(&fragment, &[], &[], Vec3::ZERO, &fog, Vec3::Z).is_none());
    }

    #[test]
    fn lit_colour_is_clamped() {
        let sun = LightData {
            intensity: 10.0,
            ..LightData::default()
        };
        let fragment = Fragment {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            tex_color: Vec4::ONE,
            color: Vec4::ONE,
            use_lighting: true,
        };
        let fog = FogParams::default();
        let out = shade_fragment(&fragment, &[sun], &[], Vec3::ZERO, &fog, Vec3::Y * 5.0)
            .unwrap_or(Vec4::ZERO);
        assert!((out.x - MAX_BRIGHTNESS).abs() < EPSILON);
    }
}
