/// WGSL shader for the magnifier overlay.
///
/// One full-screen triangle, restricted by scissor (backdrop) or viewport
/// (inset). `fs_solid` fills the backdrop grey; `fs_zoom` samples the
/// intermediate zoom texture with nearest filtering.
pub const ZOOM_SHADER: &str = r#"
struct ZoomUniforms {
    backdrop: vec4<f32>,
};

@group(0) @binding(0)
var zoom_texture: texture_2d<f32>;
@group(0) @binding(1)
var zoom_sampler: sampler;
@group(0) @binding(2)
var<uniform> uniforms: ZoomUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 3.0, -1.0),
        vec2<f32>(-1.0,  3.0),
    );
    let p = corners[index];
    var out: VertexOutput;
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    out.uv = vec2<f32>((p.x + 1.0) * 0.5, 1.0 - (p.y + 1.0) * 0.5);
    return out;
}

@fragment
fn fs_solid(in: VertexOutput) -> @location(0) vec4<f32> {
    return uniforms.backdrop;
}

@fragment
fn fs_zoom(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(zoom_texture, zoom_sampler, in.uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_shader_declares_entry_points() {
        for entry in ["fn vs_main", "fn fs_solid", "fn fs_zoom"] {
            assert!(ZOOM_SHADER.contains(entry), "missing {entry}");
        }
    }
}
