use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Light category, in the order lights are sorted for the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum LightType {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightType {
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(LightType::Directional),
            1 => Some(LightType::Point),
            2 => Some(LightType::Spot),
            _ => None,
        }
    }
}

/// One light as the shading stage sees it.
///
/// Laid out as a std140 array element: `vec3`s start on 16-byte
/// boundaries and the record size is a multiple of 16, so a slice of
/// records can be uploaded verbatim.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub position: [f32; 3],
    pub intensity: f32,

    pub direction: [f32; 3],
    pub range: f32,

    pub color: [f32; 3],
    /// [`LightType`] as its raw discriminant.
    pub light_type: i32,

    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub casts_shadows: i32,

    /// Cosine of half the inner cone angle.
    pub inner_cone_cos: f32,
    /// Cosine of half the outer cone angle.
    pub outer_cone_cos: f32,
    /// Shadow-map slice, or `-1`.
    pub shadow_map_index: i32,
    pub shadow_bias: f32,

    pub shadow_opacity: f32,
    pub(crate) _padding0: [f32; 3],

    pub shadow_color: [f32; 3],
    pub(crate) _padding1: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            intensity: 1.0,
            direction: [0.0, -1.0, 0.0],
            range: 0.0,
            color: [1.0; 3],
            light_type: LightType::Directional as i32,
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            casts_shadows: 0,
            inner_cone_cos: 0.0,
            outer_cone_cos: 0.0,
            shadow_map_index: -1,
            shadow_bias: 0.001,
            shadow_opacity: 0.8,
            _padding0: [0.0; 3],
            shadow_color: [0.0; 3],
            _padding1: 0.0,
        }
    }
}

impl LightData {
    /// Falls back to `Directional` for corrupt records.
    #[must_use]
    pub fn light_type(&self) -> LightType {
        LightType::from_raw(self.light_type).unwrap_or(LightType::Directional)
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }

    #[inline]
    #[must_use]
    pub fn shadow_color(&self) -> Vec3 {
        Vec3::from_array(self.shadow_color)
    }

    #[inline]
    #[must_use]
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows != 0
    }

    /// Slice index when the light owns a shadow map this frame.
    #[must_use]
    pub fn shadow_slot(&self) -> Option<u32> {
        (self.casts_shadows() && self.shadow_map_index >= 0).then_some(self.shadow_map_index as u32)
    }

    pub(crate) fn clear_shadow_slot(&mut self) {
        self.casts_shadows = 0;
        self.shadow_map_index = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn record_is_std140_sized() {
        assert_eq!(mem::size_of::<LightData>(), 112);
        assert_eq!(mem::size_of::<LightData>() % 16, 0);
        assert_eq!(mem::offset_of!(LightData, direction), 16);
        assert_eq!(mem::offset_of!(LightData, color), 32);
        assert_eq!(mem::offset_of!(LightData, attenuation_constant), 48);
        assert_eq!(mem::offset_of!(LightData, inner_cone_cos), 64);
        assert_eq!(mem::offset_of!(LightData, shadow_opacity), 80);
        assert_eq!(mem::offset_of!(LightData, shadow_color), 96);
    }

    #[test]
    fn types_sort_directional_point_spot() {
        let mut types = vec![LightType::Spot, LightType::Directional, LightType::Point];
        types.sort();
        assert_eq!(types, [LightType::Directional, LightType::Point, LightType::Spot]);
    }

    #[test]
    fn default_record_has_no_shadow_slot() {
        assert_eq!(LightData::default().shadow_slot(), None);
    }
}
