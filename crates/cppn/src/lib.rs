//! Fixed-weight CPPN evaluation for the animated background field.
//!
//! A compositional pattern-producing network maps a surface coordinate and
//! elapsed time to a colour. The network is hand-authored and frozen: affine
//! mat4 layers with sigmoid activations over six scalar features derived
//! from `(x, y, t)`. Two constant sets exist: a full-fidelity reference
//! network compiled into the hardware shader, and a cheaper reduced network
//! for scalar per-pixel evaluation (see [`weights`]).
//!
//! ```text
//!  (x, y, t) ─▶ oscillator drives ─▶ feature vectors (x, y, biased drives, r)
//!                                         │
//!                                         ▼
//!                               hidden layers (sigmoid)
//!                                         │
//!                                         ▼
//!                                output layer ─▶ (r, g, b) in [0, 1]
//! ```
//!
//! Evaluation is deterministic: the same `(x, y, t)` always produces the
//! same bits on the same build, and every operation is ordinary IEEE f32
//! arithmetic in a fixed order so independent implementations of the same
//! constants agree to within last-place rounding.

mod weights;
pub mod wgsl;

pub use weights::{
    CombineTap, InputTap, OutputTap, ReducedWeights, ReferenceWeights, REDUCED, REFERENCE,
};

/// Four f32 lanes; one network activation vector.
pub type Vec4 = [f32; 4];

/// Column-major 4x4 matrix: `m[c]` is column `c`, so
/// `m * v = m[0]*v.x + m[1]*v.y + m[2]*v.z + m[3]*v.w`.
pub type Mat4 = [[f32; 4]; 4];

/// Default oscillator frequencies in rad/s, one per time-varying feature.
pub const DEFAULT_FREQUENCIES: [f64; 3] = [0.30, 0.69, 0.44];

/// Default oscillator amplitude.
pub const DEFAULT_AMPLITUDE: f32 = 0.1;

/// Sigmoid inputs are clamped to this magnitude before `exp` so that no
/// finite feature can push an activation to NaN or infinity. At ±30 the
/// sigmoid is already within 1e-13 of its asymptote.
const EXP_GUARD: f32 = 30.0;

/// The three low-frequency sine oscillators that animate the field.
///
/// `drive` runs in f64 and narrows to f32 once at the end; elapsed seconds
/// lose f32 precision within hours of uptime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorBank {
    /// Angular frequency of each drive signal in rad/s.
    pub frequencies: [f64; 3],
    /// Peak amplitude of each drive signal.
    pub amplitude: f32,
}

impl Default for OscillatorBank {
    fn default() -> Self {
        Self {
            frequencies: DEFAULT_FREQUENCIES,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

impl OscillatorBank {
    /// Samples the three drive signals at `t` seconds.
    pub fn drive(&self, t: f64) -> [f32; 3] {
        let amplitude = f64::from(self.amplitude);
        let mut out = [0.0f32; 3];
        for (slot, freq) in out.iter_mut().zip(self.frequencies) {
            *slot = (amplitude * (freq * t).sin()) as f32;
        }
        out
    }
}

/// Logistic sigmoid with a guarded exponent.
pub fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-EXP_GUARD, EXP_GUARD);
    1.0 / (1.0 + (-x).exp())
}

fn sigmoid4(v: Vec4) -> Vec4 {
    [sigmoid(v[0]), sigmoid(v[1]), sigmoid(v[2]), sigmoid(v[3])]
}

fn mat4_mul(m: &Mat4, v: Vec4) -> Vec4 {
    let mut out = [0.0f32; 4];
    for (i, lane) in out.iter_mut().enumerate() {
        *lane = m[0][i] * v[0] + m[1][i] * v[1] + m[2][i] * v[2] + m[3][i] * v[3];
    }
    out
}

fn add4(a: Vec4, b: Vec4) -> Vec4 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
}

/// Packs the six scalar features into the two input vectors shared by both
/// network tiers: `(x, y, b0 + d0, b1 + d1)` and `(b2 + d2, r, 0, 0)`.
fn features(input_bias: [f32; 3], x: f32, y: f32, drive: [f32; 3]) -> (Vec4, Vec4) {
    let radius = (x * x + y * y).sqrt();
    let primary = [x, y, input_bias[0] + drive[0], input_bias[1] + drive[1]];
    let extra = [input_bias[2] + drive[2], radius, 0.0, 0.0];
    (primary, extra)
}

fn input_layer(tap: &InputTap, primary: Vec4, extra: Vec4) -> Vec4 {
    sigmoid4(add4(
        add4(mat4_mul(&tap.primary, primary), mat4_mul(&tap.extra, extra)),
        tap.bias,
    ))
}

/// Evaluates the full reference network at one sample.
///
/// `x, y ∈ [-1, 1]`, `drive` comes from [`OscillatorBank::drive`] for the
/// current frame so the sines run once per frame instead of once per pixel.
/// Each output channel is in [0, 1] by construction.
pub fn eval_reference(weights: &ReferenceWeights, x: f32, y: f32, drive: [f32; 3]) -> [f32; 3] {
    let (primary, extra) = features(weights.input_bias, x, y, drive);
    let ha = [
        input_layer(&weights.hidden_a[0], primary, extra),
        input_layer(&weights.hidden_a[1], primary, extra),
    ];
    let hb = [
        input_layer(&weights.hidden_b[0], primary, extra),
        input_layer(&weights.hidden_b[1], primary, extra),
    ];

    let combine = &weights.combine;
    let mut acc = mat4_mul(&combine.hidden_a[0], ha[0]);
    acc = add4(acc, mat4_mul(&combine.hidden_a[1], ha[1]));
    acc = add4(acc, mat4_mul(&combine.hidden_b[0], hb[0]));
    acc = add4(acc, mat4_mul(&combine.hidden_b[1], hb[1]));
    let combined = sigmoid4(add4(acc, combine.bias));

    let output = &weights.output;
    let mut acc = mat4_mul(&output.hidden_a[0], ha[0]);
    acc = add4(acc, mat4_mul(&output.hidden_a[1], ha[1]));
    acc = add4(acc, mat4_mul(&output.hidden_b[0], hb[0]));
    acc = add4(acc, mat4_mul(&output.hidden_b[1], hb[1]));
    acc = add4(acc, mat4_mul(&output.combined, combined));
    let rgb = sigmoid4(add4(acc, output.bias));
    [rgb[0], rgb[1], rgb[2]]
}

/// Evaluates the reduced network at one sample; same contract as
/// [`eval_reference`] with a fraction of the arithmetic.
pub fn eval_reduced(weights: &ReducedWeights, x: f32, y: f32, drive: [f32; 3]) -> [f32; 3] {
    let (primary, extra) = features(weights.input_bias, x, y, drive);
    let hidden = input_layer(&weights.hidden, primary, extra);
    let detail = input_layer(&weights.detail, primary, extra);
    let acc = add4(
        add4(
            mat4_mul(&weights.output_hidden, hidden),
            mat4_mul(&weights.output_detail, detail),
        ),
        weights.output_bias,
    );
    let rgb = sigmoid4(acc);
    [rgb[0], rgb[1], rgb[2]]
}

/// Reference network with default oscillators: the canonical
/// `(x, y, t) -> (r, g, b)` mapping.
pub fn evaluate(x: f32, y: f32, t: f64) -> [f32; 3] {
    let bank = OscillatorBank::default();
    eval_reference(&REFERENCE, x, y, bank.drive(t))
}
