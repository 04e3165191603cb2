//! Shadow Math
//!
//! Pure functions building light-space (projection × view) matrices for
//! each light type. They depend only on the packed [`LightData`], so the
//! shadow pass and tests share them.
//!
//! - Directional: fixed-extent orthographic volume centred on the origin.
//! - Spot: perspective frustum matching the outer cone.
//! - Point: single slice rendered like a directional light from the light
//!   position; [`point_light_face_matrix`] builds the six cube faces for
//!   callers with enough slices.

use glam::{Mat4, Vec3};

use super::light_data::{LightData, LightType};

/// Radius of the region directional shadows cover.
pub const DIRECTIONAL_SCENE_RADIUS: f32 = 50.0;

/// Lights higher than this cast point shadows straight down.
const POINT_HIGH_LIGHT_Y: f32 = 5.0;

fn safe_up(direction: Vec3) -> Vec3 {
    if direction.dot(Vec3::Y).abs() > 0.95 {
        Vec3::X
    } else {
        Vec3::Y
    }
}

fn safe_direction(direction: Vec3, fallback: Vec3) -> Vec3 {
    direction.try_normalize().unwrap_or(fallback)
}

// ============================================================================
// Per-type builders
// ============================================================================

/// Orthographic `±1.5r` volume seen from `−dir × 3r`, looking at the origin.
#[must_use]
pub fn directional_light_matrix(light: &LightData) -> Mat4 {
    let dir = safe_direction(light.direction(), Vec3::NEG_Y);
    let radius = DIRECTIONAL_SCENE_RADIUS;

    let eye = -dir * radius * 3.0;
    let up = safe_up(dir);
    // Re-orthogonalize so the view basis stays stable as the light turns.
    let up = dir.cross(up).cross(dir).normalize_or(Vec3::Y);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);

    let extent = radius * 1.5;
    let projection = Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, 0.1, radius * 5.0);
    projection * view
}

/// Perspective frustum with the full outer cone as field of view.
#[must_use]
pub fn spot_light_matrix(light: &LightData) -> Mat4 {
    let position = light.position();
    let dir = safe_direction(light.direction(), Vec3::NEG_Z);
    let view = Mat4::look_at_rh(position, position + dir, safe_up(dir));

    let half_angle = light.outer_cone_cos.clamp(0.0, 1.0).acos();
    let fov = (half_angle * 2.0).clamp(1f32.to_radians(), 179f32.to_radians());
    let far = light.range.max(1.0);
    let projection = Mat4::perspective_rh_gl(fov, 1.0, 0.1, far);
    projection * view
}

/// Single-slice point shadow: down for high lights, else forward and down.
#[must_use]
pub fn point_light_matrix(light: &LightData) -> Mat4 {
    let position = light.position();
    let dir = if position.y > POINT_HIGH_LIGHT_Y {
        Vec3::NEG_Y
    } else {
        Vec3::new(0.0, -0.7, -0.7).normalize()
    };
    let view = Mat4::look_at_rh(position, position + dir, safe_up(dir));

    let extent = (light.range * 1.2).max(15.0);
    let projection =
        Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, 0.1, light.range * 2.5);
    projection * view
}

/// One face of a point-light cube map, in `+X, −X, +Y, −Y, +Z, −Z` order.
#[must_use]
pub fn point_light_face_matrix(light: &LightData, face: usize) -> Mat4 {
    const FACES: [(Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_Y),
        (Vec3::NEG_Z, Vec3::NEG_Y),
    ];
    let (dir, up) = FACES[face % 6];
    let position = light.position();
    let view = Mat4::look_at_rh(position, position + dir, up);
    let projection =
        Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, light.range.max(0.2));
    projection * view
}

/// Light-space matrix for whatever type `light` is.
#[must_use]
pub fn light_space_matrix(light: &LightData) -> Mat4 {
    match light.light_type() {
        LightType::Directional => directional_light_matrix(light),
        LightType::Point => point_light_matrix(light),
        LightType::Spot => spot_light_matrix(light),
    }
}

// ============================================================================
// Depth shader
// ============================================================================

pub(crate) const DEPTH_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;

uniform mat4 lightSpaceMatrix;
uniform mat4 model;

void main() {
    gl_Position = lightSpaceMatrix * model * vec4(aPos, 1.0);
}
";

pub(crate) const DEPTH_FRAGMENT_SHADER: &str = "#version 330 core

void main() {
}
";

#[cfg(test)]
mod tests {
    use super::*;

    fn project(m: Mat4, p: Vec3) -> Vec3 {
        m.project_point3(p)
    }

    #[test]
    fn directional_volume_contains_origin() {
        let light = LightData {
            direction: [0.3, -1.0, 0.2],
            ..LightData::default()
        };
        let ndc = project(directional_light_matrix(&light), Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn straight_down_light_does_not_degenerate() {
        let light = LightData {
            direction: [0.0, -1.0, 0.0],
            ..LightData::default()
        };
        let m = directional_light_matrix(&light);
        assert!(m.is_finite());
    }

    #[test]
    fn spot_axis_projects_to_centre() {
        let light = LightData {
            position: [0.0, 4.0, 0.0],
            direction: [0.0, 0.0, -1.0],
            range: 20.0,
            light_type: LightType::Spot as i32,
            outer_cone_cos: 22.5f32.to_radians().cos(),
            ..LightData::default()
        };
        let ndc = project(spot_light_matrix(&light), Vec3::new(0.0, 4.0, -5.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    #[test]
    fn cube_faces_look_along_axes() {
        let light = LightData {
            range: 10.0,
            ..LightData::default()
        };
        let ndc = project(point_light_face_matrix(&light, 0), Vec3::new(3.0, 0.0, 0.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }
}
