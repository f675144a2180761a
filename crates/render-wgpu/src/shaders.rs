/// Lights uploaded per frame; extra lights are ignored by the GPU passes.
pub const MAX_LIGHTS: usize = 4;

/// WGSL for every CSG pass: mesh programs and full-screen quad programs.
///
/// Bind group 0 holds the frame uniforms, bind group 1 the sampled targets
/// (`tex_a`, `tex_b`). Sampling uses `textureLoad` at the fragment's pixel, so
/// targets never need filtering.
pub const CSG_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 4u;
const ID_TOLERANCE: f32 = 0.5 / 255.0;
const MERGE_EPSILON: f32 = 1e-6;

struct Light {
    // x: kind (0 ambient, 1 directional, 2 point), y: intensity
    params: vec4<f32>,
    color: vec4<f32>,
    // travel direction for directional lights, position for point lights
    vector: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    lights: array<Light, MAX_LIGHTS>,
    light_count: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var tex_a: texture_2d<f32>;
@group(1) @binding(1)
var tex_b: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
    @location(5) color: vec4<f32>,
    @location(6) id: vec4<f32>,
};

struct MeshOutput {
    @builtin(position) @invariant clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) @interpolate(flat) color: vec4<f32>,
    @location(2) @interpolate(flat) id: vec4<f32>,
};

@vertex
fn vs_mesh(vertex: VertexInput, instance: InstanceInput) -> MeshOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: MeshOutput;
    out.clip_position = frame.view_proj * world;
    out.world = world.xyz;
    out.color = instance.color;
    out.id = instance.id;
    return out;
}

fn pixel(position: vec4<f32>) -> vec2<i32> {
    return vec2<i32>(position.xy);
}

fn shade(base: vec3<f32>, point: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    var total = vec3<f32>(0.0);
    let count = min(frame.light_count.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = frame.lights[i];
        let radiance = light.color.rgb * light.params.y;
        let kind = u32(light.params.x);
        if kind == 0u {
            total = total + radiance;
            continue;
        }
        var to_light: vec3<f32>;
        if kind == 1u {
            to_light = -normalize(light.vector.xyz);
        } else {
            to_light = normalize(light.vector.xyz - point);
        }
        total = total + radiance * max(dot(normal, to_light), 0.0);
    }
    return clamp(base * total, vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_depth_alpha(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, in.clip_position.z);
}

@fragment
fn fs_lit(in: MeshOutput) -> @location(0) vec4<f32> {
    // Screen-space derivatives give the face plane; the cross product of the
    // right and down tangents points away from the viewer.
    let normal = -normalize(cross(dpdx(in.world), dpdy(in.world)));
    return vec4<f32>(shade(in.color.rgb, in.world, normal), in.color.a);
}

@fragment
fn fs_id(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.id.rgb, in.clip_position.z);
}

@fragment
fn fs_id_merge(in: MeshOutput) -> @location(0) vec4<f32> {
    let stored = textureLoad(tex_a, pixel(in.clip_position), 0);
    if any(abs(stored.rgb - in.id.rgb) >= vec3<f32>(ID_TOLERANCE)) {
        discard;
    }
    return vec4<f32>(in.id.rgb, 1.0);
}

@fragment
fn fs_merge_objects(in: MeshOutput) -> @location(0) vec4<f32> {
    let stored = textureLoad(tex_a, pixel(in.clip_position), 0);
    if in.clip_position.z != stored.a {
        discard;
    }
    return vec4<f32>(stored.rgb, 1.0);
}

struct QuadOutput {
    @builtin(position) clip_position: vec4<f32>,
};

// One oversized counter-clockwise triangle at depth 1.0 covering the viewport.
@vertex
fn vs_quad(@builtin(vertex_index) index: u32) -> QuadOutput {
    var corners = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var out: QuadOutput;
    out.clip_position = vec4<f32>(corners[index], 1.0, 1.0);
    return out;
}

@fragment
fn fs_clip(in: QuadOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, 1.0);
}

@fragment
fn fs_merge_buffers(in: QuadOutput) -> @location(0) vec4<f32> {
    let src = textureLoad(tex_a, pixel(in.clip_position), 0);
    let prev = textureLoad(tex_b, pixel(in.clip_position), 0);
    if clamp(src.a, 0.0, 1.0) - MERGE_EPSILON < clamp(prev.a, 0.0, 1.0) {
        return src;
    }
    return prev;
}

@fragment
fn fs_depth_view(in: QuadOutput) -> @location(0) vec4<f32> {
    let depth = clamp(textureLoad(tex_a, pixel(in.clip_position), 0).a, 0.0, 1.0);
    let gray = 1.0 - depth;
    return vec4<f32>(gray, gray, gray, select(1.0, 0.0, depth >= 1.0));
}
"#;
