// ============================================================================
// GPU SHADERS — WGSL kept inline for containment
// ============================================================================

// ============================================================================
// FILTER SHADER — full-screen quad + per-pixel color transform
// ============================================================================
//
// The vertex stage emits a unit quad (two triangles, no vertex buffer) mapped
// onto the whole render target.  The render target always has the source
// image's dimensions, so the fragment stage fetches exactly one texel per
// pixel with textureLoad; no sampler or filtering is involved.
//
// Fragment math matches ops::adjustments::ColorTransform:
//   greyscale      → rgb = (r + g + b) / 3
//   else model 0   → rgb = grey + saturation * (rgb - grey)
//   else model 1   → HSL round-trip with S scaled by saturation
//   then           → rgb = clamp(rgb * contrast + brightness, 0, 1)
//   alpha is passed through.
pub const FILTER_SHADER: &str = r#"
struct FilterUniforms {
    brightness:       f32,
    contrast:         f32,
    saturation:       f32,
    greyscale:        u32,  // 0 = off, 1 = on
    saturation_model: u32,  // 0 = linear, 1 = hsl
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var<uniform> u: FilterUniforms;
@group(1) @binding(0) var source_tex: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_quad(@builtin(vertex_index) vi: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let p = positions[vi];

    var out: VertexOutput;
    // uv (0,0) is the top-left texel; NDC Y points up.
    out.position = vec4<f32>(p.x * 2.0 - 1.0, 1.0 - p.y * 2.0, 0.0, 1.0);
    out.uv = p;
    return out;
}

fn grey_of(c: vec3<f32>) -> f32 {
    return (c.r + c.g + c.b) / 3.0;
}

fn rgb_to_hsl(r: f32, g: f32, b: f32) -> vec3<f32> {
    let cmax = max(max(r, g), b);
    let cmin = min(min(r, g), b);
    let delta = cmax - cmin;
    let l = (cmax + cmin) * 0.5;

    var h: f32 = 0.0;
    var s: f32 = 0.0;

    if (delta > 1e-6) {
        if (l > 0.5) {
            s = delta / (2.0 - cmax - cmin);
        } else {
            s = delta / (cmax + cmin);
        }

        if (cmax == r) {
            h = (g - b) / delta;
            if (h < 0.0) { h = h + 6.0; }
        } else if (cmax == g) {
            h = (b - r) / delta + 2.0;
        } else {
            h = (r - g) / delta + 4.0;
        }
        h = h / 6.0;
    }

    return vec3<f32>(h, s, l);
}

fn hue_to_rgb(p: f32, q: f32, t_in: f32) -> f32 {
    var t = t_in;
    if (t < 0.0) { t = t + 1.0; }
    if (t > 1.0) { t = t - 1.0; }
    if (t < 1.0 / 6.0) { return p + (q - p) * 6.0 * t; }
    if (t < 0.5)        { return q; }
    if (t < 2.0 / 3.0) { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    return p;
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> vec3<f32> {
    if (s <= 1e-6) {
        return vec3<f32>(l, l, l);
    }
    var q: f32;
    if (l < 0.5) {
        q = l * (1.0 + s);
    } else {
        q = l + s - l * s;
    }
    let p = 2.0 * l - q;
    return vec3<f32>(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    );
}

fn filter_color(color: vec4<f32>) -> vec4<f32> {
    var rgb = color.rgb;

    if (u.greyscale != 0u) {
        rgb = vec3<f32>(grey_of(rgb));
    } else if (u.saturation != 1.0) {
        if (u.saturation_model == 1u) {
            let hsl = rgb_to_hsl(rgb.r, rgb.g, rgb.b);
            rgb = hsl_to_rgb(hsl.x, clamp(hsl.y * u.saturation, 0.0, 1.0), hsl.z);
        } else {
            let grey = vec3<f32>(grey_of(rgb));
            rgb = grey + u.saturation * (rgb - grey);
        }
    }

    rgb = clamp(rgb * u.contrast + vec3<f32>(u.brightness), vec3<f32>(0.0), vec3<f32>(1.0));
    return vec4<f32>(rgb, color.a);
}

@fragment
fn fs_filter(in: VertexOutput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(source_tex);
    let texel = min(vec2<u32>(in.position.xy), dims - vec2<u32>(1u, 1u));
    return filter_color(textureLoad(source_tex, texel, 0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_shader_declares_entry_points_and_bindings() {
        assert!(FILTER_SHADER.contains("fn vs_quad("));
        assert!(FILTER_SHADER.contains("fn fs_filter("));
        assert!(FILTER_SHADER.contains("@group(0) @binding(0) var<uniform> u: FilterUniforms;"));
        assert!(FILTER_SHADER.contains("@group(1) @binding(0) var source_tex"));
    }
}
