pub(super) const GLOBE_SHADER_SOURCE: &str = r#"
struct GlobeUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globe: GlobeUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = globe.view_proj * globe.model * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

@group(1) @binding(0)
var globe_texture: texture_2d<f32>;
@group(1) @binding(1)
var globe_sampler: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(globe_texture, globe_sampler, input.uv);
}
"#;

// Ripple discs: a solid center dot plus a ring that expands and wraps with
// time, offset per instance by its phase.
pub(super) const MARKER_SHADER_SOURCE: &str = r#"
struct MarkerUniforms {
    view_proj: mat4x4<f32>,
    time: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> markers: MarkerUniforms;

struct VertexIn {
    @location(0) base_pos: vec2<f32>,
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
    @location(5) phase: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) local_uv: vec2<f32>,
    @location(1) phase: f32,
};

@vertex
fn vs_main(input: VertexIn) -> VertexOutput {
    let model = mat4x4<f32>(input.model_0, input.model_1, input.model_2, input.model_3);
    var out: VertexOutput;
    out.position = markers.view_proj * model * vec4<f32>(input.base_pos, 0.0, 1.0);
    out.local_uv = input.base_pos * 2.0;
    out.phase = input.phase;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let len_uv = length(input.local_uv);

    var val = 1.0 - step(0.15, len_uv);

    let t_shift = fract(markers.time * 0.5 + input.phase);
    let ripple = step(0.4 + t_shift * 0.6, len_uv) - step(0.5 + t_shift * 0.5, len_uv);
    val = max(val, ripple);

    if val < 0.5 {
        discard;
    }

    return vec4<f32>(1.0, 0.486, 0.106, 1.0);
}
"#;

pub(super) const OVERLAY_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@group(0) @binding(0)
var overlay_texture: texture_2d<f32>;
@group(0) @binding(1)
var overlay_sampler: sampler;

struct OverlayParams {
    opacity: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> params: OverlayParams;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    var color = textureSample(overlay_texture, overlay_sampler, input.uv);
    color.a = color.a * params.opacity.x;
    return color;
}
"#;
