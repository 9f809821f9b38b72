//! GLSL sources of the demo materials

pub const LIT_VERTEX: &str = "#version 450 core
layout(location = 0) in vec3 a_Position;
layout(location = 1) in vec3 a_Normal;
layout(location = 2) in vec2 a_TexCoord;

uniform mat4 u_Model;
uniform mat4 u_ModelViewProjection;
uniform mat4 u_LightSpaceMatrix;
uniform float u_ClipPlane;
uniform int u_ClipMode;

out vec3 v_Normal;
out vec3 v_WorldPosition;
out vec2 v_TexCoord;
out vec4 v_LightSpacePosition;

void main() {
    vec4 world = u_Model * vec4(a_Position, 1.0);
    if (u_ClipMode == 1) {
        gl_ClipDistance[0] = world.y - u_ClipPlane;
    } else if (u_ClipMode == 2) {
        gl_ClipDistance[0] = u_ClipPlane - world.y;
    } else {
        gl_ClipDistance[0] = 1.0;
    }
    v_Normal = mat3(u_Model) * a_Normal;
    v_WorldPosition = world.xyz;
    v_TexCoord = a_TexCoord;
    v_LightSpacePosition = u_LightSpaceMatrix * world;
    gl_Position = u_ModelViewProjection * vec4(a_Position, 1.0);
}
";

pub const LIT_FRAGMENT: &str = "#version 450 core
in vec3 v_Normal;
in vec3 v_WorldPosition;
in vec2 v_TexCoord;
in vec4 v_LightSpacePosition;

uniform sampler2D u_Textures[16];
uniform int u_TextureId;
uniform vec4 u_Color;
uniform float u_Glossiness;
uniform vec3 u_ViewPosition;
uniform vec3 u_LightPositions[16];
uniform vec3 u_LightColors[16];
uniform float u_LightIntensities[16];
uniform int u_LightCount;

out vec4 o_Color;

void main() {
    vec3 normal = normalize(v_Normal);
    vec3 view = normalize(u_ViewPosition - v_WorldPosition);
    vec3 albedo = texture(u_Textures[u_TextureId], v_TexCoord).rgb * u_Color.rgb;
    vec3 color = 0.1 * albedo;
    for (int i = 0; i < u_LightCount; ++i) {
        vec3 to_light = normalize(u_LightPositions[i] - v_WorldPosition);
        vec3 half_way = normalize(to_light + view);
        float diffuse = max(dot(normal, to_light), 0.0);
        float specular = pow(max(dot(normal, half_way), 0.0), u_Glossiness);
        color += (diffuse * albedo + specular) * u_LightColors[i] * u_LightIntensities[i];
    }
    o_Color = vec4(color, u_Color.a);
}
";

pub const WATER_FRAGMENT: &str = "#version 450 core
in vec3 v_WorldPosition;
in vec2 v_TexCoord;

uniform sampler2D u_Textures[16];
uniform vec4 u_Color;
uniform float u_Time;
uniform float u_WaveStrength;

out vec4 o_Color;

void main() {
    vec2 ripple = vec2(sin(u_Time + v_TexCoord.x * 20.0), cos(u_Time + v_TexCoord.y * 20.0)) * u_WaveStrength;
    vec3 reflection = texture(u_Textures[1], v_TexCoord + ripple).rgb;
    vec3 refraction = texture(u_Textures[2], v_TexCoord - ripple).rgb;
    o_Color = vec4(mix(reflection, refraction, 0.5) * u_Color.rgb, u_Color.a);
}
";

pub const DEPTH_VERTEX: &str = "#version 450 core
layout(location = 0) in vec3 a_Position;

uniform mat4 u_Model;
uniform mat4 u_LightSpaceMatrix;

void main() {
    gl_Position = u_LightSpaceMatrix * u_Model * vec4(a_Position, 1.0);
}
";

pub const DEPTH_FRAGMENT: &str = "#version 450 core
void main() {}
";

pub const NOISE_COMPUTE: &str = "#version 450 core
layout(local_size_x = 8, local_size_y = 8) in;
layout(rgba32f, binding = 0) uniform writeonly image2D u_Output;

uniform float u_Time;
uniform float u_Frequency;

void main() {
    ivec2 texel = ivec2(gl_GlobalInvocationID.xy);
    float value = sin(float(texel.x) * u_Frequency + u_Time) * cos(float(texel.y) * u_Frequency);
    imageStore(u_Output, texel, vec4(vec3(value * 0.5 + 0.5), 1.0));
}
";
