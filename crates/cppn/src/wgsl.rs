//! WGSL source generation for the hardware path.
//!
//! The fragment stage is assembled at mount time from the same frozen
//! constants the scalar evaluator reads, so the two paths cannot drift
//! apart. Weights become `mat4x4<f32>` literals; only elapsed time and the
//! viewport resolution arrive through a uniform block.
//!
//! The uniform block layout must match `FieldUniforms` on the renderer
//! side: `vec2<f32>` resolution at offset 0, `f32` time at offset 8, one
//! pad float, 16 bytes total, bound at group 0 binding 0.

use std::fmt::Write as _;

use crate::{InputTap, Mat4, OscillatorBank, ReferenceWeights, Vec4};

/// Vertex entry point name expected by the pipeline descriptor.
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point name expected by the pipeline descriptor.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Uniform block, vertex stage, and the guarded sigmoid helper. The vertex
/// stage passes the quad corner through and hands the fragment a UV in
/// [0, 1] with v = 1 at the top of the surface.
const PRELUDE: &str = r"struct FieldUniforms {
    resolution: vec2<f32>,
    time: f32,
    _pad: f32,
}

@group(0) @binding(0) var<uniform> params: FieldUniforms;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) corner: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>(corner, 0.0, 1.0);
    out.uv = corner * 0.5 + vec2<f32>(0.5, 0.5);
    return out;
}

fn sigmoid4(v: vec4<f32>) -> vec4<f32> {
    let guarded = clamp(v, vec4<f32>(-30.0), vec4<f32>(30.0));
    return vec4<f32>(1.0) / (vec4<f32>(1.0) + exp(-guarded));
}
";

/// Renders the complete shader module source for the reference network.
pub fn shader_source(weights: &ReferenceWeights, oscillators: &OscillatorBank) -> String {
    let mut src = String::with_capacity(8 * 1024);
    src.push_str(PRELUDE);
    src.push_str("\n@fragment\nfn fs_main(frag: VertexOut) -> @location(0) vec4<f32> {\n");
    src.push_str("    let centered = frag.uv * 2.0 - vec2<f32>(1.0, 1.0);\n");
    src.push_str("    let x = centered.x;\n");
    src.push_str("    let y = centered.y;\n");

    let amp = lit(oscillators.amplitude);
    for (index, freq) in oscillators.frequencies.iter().enumerate() {
        let _ = writeln!(
            src,
            "    let d{index} = {amp} * sin({} * params.time);",
            lit(*freq as f32)
        );
    }
    src.push_str("    let radius = sqrt(x * x + y * y);\n");

    let bias = weights.input_bias;
    let _ = writeln!(
        src,
        "    let p = vec4<f32>(x, y, {} + d0, {} + d1);",
        lit(bias[0]),
        lit(bias[1])
    );
    let _ = writeln!(
        src,
        "    let q = vec4<f32>({} + d2, radius, 0.0, 0.0);",
        lit(bias[2])
    );

    push_input_layer(&mut src, "ha0", &weights.hidden_a[0]);
    push_input_layer(&mut src, "ha1", &weights.hidden_a[1]);
    push_input_layer(&mut src, "hb0", &weights.hidden_b[0]);
    push_input_layer(&mut src, "hb1", &weights.hidden_b[1]);

    src.push_str("    let mixed = sigmoid4(");
    let combine = &weights.combine;
    push_mat(&mut src, &combine.hidden_a[0]);
    src.push_str(" * ha0 + ");
    push_mat(&mut src, &combine.hidden_a[1]);
    src.push_str(" * ha1 + ");
    push_mat(&mut src, &combine.hidden_b[0]);
    src.push_str(" * hb0 + ");
    push_mat(&mut src, &combine.hidden_b[1]);
    src.push_str(" * hb1 + ");
    push_vec(&mut src, &combine.bias);
    src.push_str(");\n");

    src.push_str("    let rgb = sigmoid4(");
    let output = &weights.output;
    push_mat(&mut src, &output.hidden_a[0]);
    src.push_str(" * ha0 + ");
    push_mat(&mut src, &output.hidden_a[1]);
    src.push_str(" * ha1 + ");
    push_mat(&mut src, &output.hidden_b[0]);
    src.push_str(" * hb0 + ");
    push_mat(&mut src, &output.hidden_b[1]);
    src.push_str(" * hb1 + ");
    push_mat(&mut src, &output.combined);
    src.push_str(" * mixed + ");
    push_vec(&mut src, &output.bias);
    src.push_str(");\n");

    src.push_str("    return vec4<f32>(rgb.x, rgb.y, rgb.z, 1.0);\n}\n");
    src
}

fn push_input_layer(src: &mut String, name: &str, tap: &InputTap) {
    let _ = write!(src, "    let {name} = sigmoid4(");
    push_mat(src, &tap.primary);
    src.push_str(" * p + ");
    push_mat(src, &tap.extra);
    src.push_str(" * q + ");
    push_vec(src, &tap.bias);
    src.push_str(");\n");
}

fn push_mat(src: &mut String, m: &Mat4) {
    src.push_str("mat4x4<f32>(");
    for (index, column) in m.iter().enumerate() {
        if index > 0 {
            src.push_str(", ");
        }
        push_vec(src, column);
    }
    src.push(')');
}

fn push_vec(src: &mut String, v: &Vec4) {
    let _ = write!(
        src,
        "vec4<f32>({}, {}, {}, {})",
        lit(v[0]),
        lit(v[1]),
        lit(v[2]),
        lit(v[3])
    );
}

/// Formats an f32 so it always parses as a WGSL float literal (a bare
/// integer token would be typed as an abstract int).
fn lit(value: f32) -> String {
    let text = format!("{value:?}");
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::REFERENCE;

    #[test]
    fn source_declares_uniforms_and_entry_points() {
        let src = shader_source(&REFERENCE, &OscillatorBank::default());
        assert!(src.contains("var<uniform> params: FieldUniforms"));
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
        assert!(src.contains("params.time"));
        assert!(src.contains("@builtin(position)"));
    }

    #[test]
    fn source_bakes_network_constants() {
        let src = shader_source(&REFERENCE, &OscillatorBank::default());
        assert!(src.contains("6.54"), "first hidden weight missing");
        assert!(src.contains("-502.75"), "combine-layer weight missing");
        assert!(src.contains("0.69"), "oscillator frequency missing");
        assert!(src.contains("0.39"), "input bias missing");
    }

    #[test]
    fn custom_oscillators_flow_into_the_source() {
        let bank = OscillatorBank {
            frequencies: [1.5, 2.25, 3.75],
            amplitude: 0.2,
        };
        let src = shader_source(&REFERENCE, &bank);
        assert!(src.contains("0.2 * sin(1.5 * params.time)"));
        assert!(src.contains("0.2 * sin(3.75 * params.time)"));
    }

    #[test]
    fn literals_always_carry_a_fractional_part() {
        assert_eq!(lit(5.0), "5.0");
        assert_eq!(lit(-502.75), "-502.75");
        assert_eq!(lit(0.1), "0.1");
        assert_eq!(lit(0.0), "0.0");
    }
}
