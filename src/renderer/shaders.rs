//! GLSL sources of the built-in programs.
//!
//! The lit fragment shader is the contract that `lighting::shading`
//! reproduces on the CPU; keep the two in step.

/// Bone matrices uploaded per skinned draw.
pub const MAX_BONES: usize = 100;

// ============================================================================
// 3D
// ============================================================================

pub(crate) const MESH_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aNormal;
layout (location = 2) in vec2 aTexCoord;
layout (location = 3) in vec3 aTangent;
layout (location = 4) in vec3 aBitangent;

out vec3 FragPos;
out vec3 Normal;
out vec2 TexCoord;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

void main() {
    vec4 worldPos = model * vec4(aPos, 1.0);
    FragPos = worldPos.xyz;
    Normal = mat3(transpose(inverse(model))) * aNormal;
    TexCoord = aTexCoord;
    gl_Position = projection * view * worldPos;
}
";

pub(crate) const SKINNED_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aNormal;
layout (location = 2) in vec2 aTexCoord;
layout (location = 3) in vec3 aTangent;
layout (location = 4) in vec3 aBitangent;
layout (location = 5) in vec4 aBoneIds;
layout (location = 6) in vec4 aWeights;

out vec3 FragPos;
out vec3 Normal;
out vec2 TexCoord;

const int MAX_BONES = 100;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
uniform mat4 boneTransforms[MAX_BONES];

void main() {
    mat4 skin = mat4(0.0);
    float total = 0.0;
    for (int i = 0; i < 4; ++i) {
        int id = int(aBoneIds[i]);
        float weight = aWeights[i];
        if (weight <= 0.0) {
            continue;
        }
        if (id < 0 || id >= MAX_BONES) {
            skin += mat4(1.0) * weight;
        } else {
            skin += boneTransforms[id] * weight;
        }
        total += weight;
    }
    if (total <= 0.0) {
        skin = mat4(1.0);
    }

    vec4 worldPos = model * skin * vec4(aPos, 1.0);
    FragPos = worldPos.xyz;
    Normal = mat3(transpose(inverse(model * skin))) * aNormal;
    TexCoord = aTexCoord;
    gl_Position = projection * view * worldPos;
}
";

pub(crate) const MESH_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;

in vec3 FragPos;
in vec3 Normal;
in vec2 TexCoord;

#define MAX_LIGHTS 32
#define MAX_SHADOW_MAPS 8

struct Light {
    vec3 position;
    vec3 direction;
    vec3 color;
    float intensity;
    float range;
    int type;
    float attenuation_constant;
    float attenuation_linear;
    float attenuation_quadratic;
    float inner_cone_angle;
    float outer_cone_angle;
    int casts_shadows;
    int shadow_map_index;
    float shadow_bias;
    float shadow_opacity;
    vec3 shadow_color;
};

uniform sampler2D texture1;
uniform vec4 color;
uniform int uUseLighting;

uniform vec3 uAmbientLight;
uniform int uLightCount;
uniform Light uLights[MAX_LIGHTS];
uniform vec3 uCameraPos;

uniform mat4 uLightSpaceMatrices[MAX_LIGHTS];
uniform sampler2DArray u_shadow_maps;
uniform int uPcfSampleBudget;

uniform int uFogEnabled;
uniform vec3 uFogColor;
uniform float uFogDensity;
uniform float uFogStart;
uniform float uFogEnd;
uniform float uFogHeightFalloff;

const vec2 poissonDisk[25] = vec2[](
    vec2(-0.94201624, -0.39906216), vec2(0.94558609, -0.76890725),
    vec2(-0.09418410, -0.92938870), vec2(0.34495938, 0.29387760),
    vec2(-0.91588581, 0.45771432), vec2(-0.81544232, -0.87912464),
    vec2(-0.38277543, 0.27676845), vec2(0.97484398, 0.75648379),
    vec2(0.44323325, -0.97511554), vec2(0.53742981, -0.47373420),
    vec2(-0.26496911, -0.41893023), vec2(0.79197514, 0.19090188),
    vec2(-0.24188840, 0.99706507), vec2(-0.81409955, 0.91437590),
    vec2(0.19984126, 0.78641367), vec2(0.14383161, -0.14100790),
    vec2(-0.65563464, 0.61860425), vec2(0.72781330, -0.31148052),
    vec2(-0.42543950, -0.81647956), vec2(0.13965822, 0.56789320),
    vec2(0.82134157, 0.34567890), vec2(-0.23456789, 0.87654320),
    vec2(0.56789010, -0.12345678), vec2(-0.78901234, -0.23456789),
    vec2(0.01234567, 0.98765430)
);

float biasMultiplier(int type) {
    if (type == 0) return 1.5;
    if (type == 1) return 2.0;
    return 1.8;
}

float shadowFactor(int i, vec3 normal) {
    Light light = uLights[i];
    if (light.casts_shadows == 0 || light.shadow_map_index < 0) {
        return 0.0;
    }

    vec4 clip = uLightSpaceMatrices[i] * vec4(FragPos, 1.0);
    vec3 coords = clip.xyz / clip.w * 0.5 + 0.5;
    if (coords.z > 1.0 || coords.x < 0.0 || coords.x > 1.0 || coords.y < 0.0 || coords.y > 1.0) {
        return 0.0;
    }

    vec3 toLight = light.type == 1
        ? normalize(light.position - FragPos)
        : normalize(-light.direction);
    float cosTheta = clamp(dot(normal, toLight), 0.0, 1.0);
    float base = light.shadow_bias * biasMultiplier(light.type);
    float slope = base * sqrt(1.0 - cosTheta * cosTheta) / max(cosTheta, 0.1);
    float bias = clamp(base + slope, base * 0.1, base * 8.0);

    float distance = length(light.position - FragPos);
    int samples = 9;
    if (light.type == 0 || distance < light.range * 0.3) {
        samples = 25;
    } else if (distance < light.range * 0.6) {
        samples = 16;
    }
    samples = max(min(samples, uPcfSampleBudget), 1);

    float radius = mix(1.5, 3.0, light.shadow_opacity);
    vec2 texel = 1.0 / vec2(textureSize(u_shadow_maps, 0).xy);
    float occluded = 0.0;
    for (int s = 0; s < samples; ++s) {
        vec2 uv = coords.xy + poissonDisk[s] * texel * radius;
        float depth = texture(u_shadow_maps, vec3(uv, float(light.shadow_map_index))).r;
        if (coords.z - bias > depth) {
            occluded += 1.0;
        }
    }
    return occluded / float(samples) * light.shadow_opacity;
}

vec3 lightContribution(int i, vec3 normal, vec3 viewDir) {
    Light light = uLights[i];
    vec3 toLight;
    float scale = 1.0;

    if (light.type == 0) {
        toLight = normalize(-light.direction);
    } else {
        vec3 delta = light.position - FragPos;
        float distance = length(delta);
        if (distance > light.range) {
            return vec3(0.0);
        }
        toLight = normalize(delta);
        float denom = light.attenuation_constant
            + light.attenuation_linear * distance
            + light.attenuation_quadratic * distance * distance;
        scale = denom > 0.0 ? 1.0 / denom : 0.0;
        scale *= 1.0 - smoothstep(light.range * 0.8, light.range, distance);

        if (light.type == 2) {
            float cosTheta = dot(toLight, normalize(-light.direction));
            if (cosTheta < light.outer_cone_angle) {
                return vec3(0.0);
            }
            float epsilon = light.inner_cone_angle - light.outer_cone_angle;
            float cone = epsilon > 0.0
                ? smoothstep(0.0, 1.0, clamp((cosTheta - light.outer_cone_angle) / epsilon, 0.0, 1.0))
                : 1.0;
            scale *= cone;
        }
    }

    vec3 radiance = light.color * light.intensity * scale;
    vec3 diffuse = radiance * max(dot(normal, toLight), 0.0);
    vec3 halfway = normalize(toLight + viewDir);
    vec3 specular = radiance * pow(max(dot(normal, halfway), 0.0), 64.0) * 0.3;
    vec3 lit = diffuse + specular;

    float shadow = shadowFactor(i, normal);
    vec3 tint = light.shadow_color * 0.2 * scale;
    return mix(lit, tint, shadow * light.shadow_opacity);
}

float fogFactor() {
    float distance = length(uCameraPos - FragPos);
    float height = FragPos.y - uCameraPos.y;
    float heightFactor = exp(-max(0.0, -height) * uFogHeightFalloff);
    float fog = 0.0;
    if (distance > uFogStart) {
        fog = clamp(1.0 - exp(-uFogDensity * distance * 0.01), 0.0, 1.0);
    }
    return fog * heightFactor;
}

void main() {
    vec4 texColor = texture(texture1, TexCoord);
    vec3 base = texColor.rgb * color.rgb;
    vec3 result = base;

    if (uUseLighting != 0) {
        vec3 normal = normalize(Normal);
        vec3 viewDir = normalize(uCameraPos - FragPos);
        vec3 lit = uAmbientLight;
        for (int i = 0; i < uLightCount && i < MAX_LIGHTS; ++i) {
            lit += lightContribution(i, normal, viewDir);
        }
        result = min(lit * base, vec3(1.5));
    }

    if (uFogEnabled != 0) {
        result = mix(result, uFogColor, fogFactor());
    }

    float alpha = texColor.a * color.a;
    if (alpha < 0.01) {
        discard;
    }
    FragColor = vec4(result, alpha);
}
";

// ============================================================================
// 2D
// ============================================================================

pub(crate) const QUAD_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec2 aPos;
layout (location = 1) in vec2 aTexCoord;

out vec2 TexCoord;
out vec2 LocalPos;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

void main() {
    TexCoord = aTexCoord;
    LocalPos = aPos;
    gl_Position = projection * view * model * vec4(aPos, 0.0, 1.0);
}
";

/// Textured quad with an optional rounded-box SDF mask.
pub(crate) const QUAD_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;

in vec2 TexCoord;
in vec2 LocalPos;

uniform sampler2D texture1;
uniform vec4 color;
uniform float cornerRadius;
uniform vec2 rectSize;
uniform int useCornerRadius;

float roundedBox(vec2 p, vec2 halfSize, float r) {
    return length(max(abs(p) - halfSize + r, 0.0)) - r;
}

void main() {
    vec4 texColor = texture(texture1, TexCoord) * color;

    if (useCornerRadius != 0 && cornerRadius > 0.0) {
        vec2 p = LocalPos * rectSize;
        float r = min(cornerRadius, min(rectSize.x, rectSize.y) * 0.5);
        float d = roundedBox(p, rectSize * 0.5, r);
        texColor.a *= 1.0 - smoothstep(-1.0, 1.0, d);
    }

    if (texColor.a < 0.01) {
        discard;
    }
    FragColor = texColor;
}
";

pub(crate) const TEXT_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;

in vec2 TexCoord;

uniform sampler2D texture1;
uniform vec4 color;

void main() {
    float coverage = texture(texture1, TexCoord).r;
    FragColor = vec4(color.rgb, color.a * coverage);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{GraphicsDevice, HeadlessDevice};

    #[test]
    fn built_in_programs_link() {
        let mut device = HeadlessDevice::new();
        device
            .create_shader(MESH_VERTEX_SHADER, MESH_FRAGMENT_SHADER)
            .expect("mesh");
        device
            .create_shader(SKINNED_VERTEX_SHADER, MESH_FRAGMENT_SHADER)
            .expect("skinned");
        device
            .create_shader(QUAD_VERTEX_SHADER, QUAD_FRAGMENT_SHADER)
            .expect("quad");
        device
            .create_shader(QUAD_VERTEX_SHADER, TEXT_FRAGMENT_SHADER)
            .expect("text");
    }

    #[test]
    fn skinned_cap_matches_shader() {
        assert!(SKINNED_VERTEX_SHADER.contains(&format!("MAX_BONES = {MAX_BONES}")));
    }
}
