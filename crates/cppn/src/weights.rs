//! Frozen constant sets for the two network tiers.
//!
//! These values are design constants, not tunable state: the pattern they
//! produce is the product. The reference set drives the full-fidelity
//! hardware path; the reduced set is an independently authored, cheaper
//! network for the software path and has no mathematical relationship to
//! the reference set.

use crate::{Mat4, Vec4};

/// One 4-wide affine+sigmoid layer reading both input feature vectors.
///
/// `primary` multiplies `(x, y, b0 + d0, b1 + d1)` and `extra` multiplies
/// `(b2 + d2, r, 0, 0)`; the trailing two columns of `extra` are zero
/// because only two of its lanes carry signal.
#[derive(Debug, Clone, Copy)]
pub struct InputTap {
    pub primary: Mat4,
    pub extra: Mat4,
    pub bias: Vec4,
}

/// The mixing layer folding all four hidden vectors into one.
#[derive(Debug, Clone, Copy)]
pub struct CombineTap {
    pub hidden_a: [Mat4; 2],
    pub hidden_b: [Mat4; 2],
    pub bias: Vec4,
}

/// The output layer; the activated vector's first three lanes are RGB.
///
/// Every fourth row is zero so the unused lane stays inert.
#[derive(Debug, Clone, Copy)]
pub struct OutputTap {
    pub hidden_a: [Mat4; 2],
    pub hidden_b: [Mat4; 2],
    pub combined: Mat4,
    pub bias: Vec4,
}

/// Full-fidelity network: four input-fed hidden layers in two banks, one
/// combine layer over all hidden activations, one output layer over hidden
/// activations plus the combine vector.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceWeights {
    /// Constant offsets added to the three oscillator drives before they
    /// enter the feature vectors.
    pub input_bias: [f32; 3],
    pub hidden_a: [InputTap; 2],
    pub hidden_b: [InputTap; 2],
    pub combine: CombineTap,
    pub output: OutputTap,
}

/// Reduced network: two input-fed hidden layers and one output layer.
///
/// Roughly 2.5x fewer mat4 multiplies per sample than the reference set,
/// which is what makes scalar per-pixel evaluation viable.
#[derive(Debug, Clone, Copy)]
pub struct ReducedWeights {
    pub input_bias: [f32; 3],
    pub hidden: InputTap,
    pub detail: InputTap,
    pub output_hidden: Mat4,
    pub output_detail: Mat4,
    pub output_bias: Vec4,
}

// Matrices are column-major: each inner array is one column, so
// `m * v = col0*v.x + col1*v.y + col2*v.z + col3*v.w`.

pub const REFERENCE: ReferenceWeights = ReferenceWeights {
    input_bias: [0.39, 0.36, 0.14],
    hidden_a: [
        InputTap {
            primary: [
                [6.54, -3.61, 0.76, -1.14],
                [2.46, 3.17, 1.22, 0.06],
                [-5.48, -6.16, 1.87, -4.77],
                [6.04, -5.54, -0.91, 3.25],
            ],
            extra: [
                [0.85, -5.72, 3.98, 1.65],
                [-0.24, 0.58, -1.77, -5.35],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ],
            bias: [0.22, 1.12, -1.80, 5.03],
        },
        InputTap {
            primary: [
                [-3.35, -6.06, 0.56, -4.47],
                [0.86, 1.74, 5.64, 1.61],
                [2.49, -3.50, 1.72, 6.36],
                [3.31, 8.21, 1.14, -1.17],
            ],
            extra: [
                [5.24, -13.03, 0.01, 15.87],
                [2.99, 3.13, -0.89, -1.68],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ],
            bias: [-5.95, -6.57, -0.88, 1.54],
        },
    ],
    hidden_b: [
        InputTap {
            primary: [
                [-15.22, 8.10, -2.43, -1.94],
                [-5.95, 4.31, 2.64, 1.27],
                [-7.31, 6.73, 5.25, 5.94],
                [5.08, 8.98, -1.73, -1.16],
            ],
            extra: [
                [-11.97, -11.61, 6.15, 11.24],
                [2.12, -6.26, -1.71, -0.70],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ],
            bias: [-4.17, -3.23, -4.58, -3.64],
        },
        InputTap {
            primary: [
                [3.18, -13.74, 1.88, 3.23],
                [0.64, 12.77, 1.91, 0.51],
                [-0.05, 4.48, 1.47, 1.80],
                [5.00, 13.00, 3.40, -4.56],
            ],
            extra: [
                [-0.13, 7.72, -3.14, 4.74],
                [0.64, 3.71, -0.81, -0.39],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ],
            bias: [-1.18, -21.62, 0.79, 1.23],
        },
    ],
    combine: CombineTap {
        hidden_a: [
            [
                [5.21, -7.18, 2.72, 2.66],
                [-5.60, -25.36, 4.07, 0.46],
                [-10.58, 24.29, 21.10, 37.55],
                [4.30, -1.96, 2.35, -1.37],
            ],
            [
                [-17.65, -10.51, 2.26, 12.46],
                [6.27, -502.75, -12.64, 0.91],
                [-10.98, 20.74, -9.70, -0.76],
                [5.38, 1.48, -4.19, -4.84],
            ],
        ],
        hidden_b: [
            [
                [12.79, -16.35, -0.40, 1.80],
                [-30.48, -1.83, 1.45, -1.11],
                [19.87, -7.34, -42.94, -98.53],
                [8.34, -2.73, -2.29, -36.14],
            ],
            [
                [-16.30, 3.55, -0.44, -9.44],
                [57.51, -35.61, 16.16, -4.15],
                [-0.07, -3.87, -7.09, 3.15],
                [-12.56, -7.08, 1.49, -0.82],
            ],
        ],
        bias: [-7.68, 15.93, 1.32, -1.67],
    },
    output: OutputTap {
        hidden_a: [
            [
                [1.68, 1.38, 2.96, 0.0],
                [-1.88, -1.48, -3.59, 0.0],
                [-1.33, -1.09, -2.31, 0.0],
                [0.27, 0.23, 0.44, 0.0],
            ],
            [
                [-0.63, -0.59, -0.91, 0.0],
                [0.18, 0.18, 0.18, 0.0],
                [-2.97, -2.58, -4.90, 0.0],
                [1.42, 1.19, 2.52, 0.0],
            ],
        ],
        hidden_b: [
            [
                [-1.26, -1.06, -2.17, 0.0],
                [-0.72, -0.53, -1.44, 0.0],
                [0.15, 0.15, 0.27, 0.0],
                [0.95, 0.89, 1.28, 0.0],
            ],
            [
                [-2.42, -1.97, -4.35, 0.0],
                [-22.68, -18.05, -41.95, 0.0],
                [0.64, 0.55, 1.11, 0.0],
                [-1.55, -1.31, -2.64, 0.0],
            ],
        ],
        combined: [
            [-0.49, -0.40, -0.91, 0.0],
            [0.96, 0.79, 1.64, 0.0],
            [0.31, 0.16, 0.86, 0.0],
            [1.18, 0.95, 2.18, 0.0],
        ],
        bias: [-1.55, -3.62, 0.25, 0.0],
    },
};

pub const REDUCED: ReducedWeights = ReducedWeights {
    input_bias: [0.39, 0.36, 0.14],
    hidden: InputTap {
        primary: [
            [3.87, -2.51, 1.04, -4.12],
            [-1.66, 4.29, 3.73, 0.58],
            [2.45, -5.18, 6.01, 3.36],
            [-4.90, 1.77, -2.82, 5.44],
        ],
        extra: [
            [1.93, -3.24, 4.66, -1.08],
            [-5.35, 2.87, -6.42, 3.91],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ],
        bias: [0.41, -1.02, 0.83, -0.37],
    },
    detail: InputTap {
        primary: [
            [-2.14, 5.72, -3.95, 1.30],
            [4.08, -1.49, 2.66, -5.87],
            [-6.23, 3.40, 1.18, 4.52],
            [1.57, -4.76, 5.09, -2.31],
        ],
        extra: [
            [3.62, -1.85, 2.20, 4.97],
            [2.74, -7.16, 3.58, -2.49],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ],
        bias: [-0.64, 1.25, -0.92, 0.50],
    },
    output_hidden: [
        [2.31, -1.74, 0.88, 0.0],
        [-1.92, 2.60, -1.15, 0.0],
        [1.48, -0.67, 2.04, 0.0],
        [-0.85, 1.33, -1.78, 0.0],
    ],
    output_detail: [
        [-1.37, 0.94, 1.62, 0.0],
        [2.05, -1.58, -0.73, 0.0],
        [-0.60, 1.87, 1.10, 0.0],
        [1.23, -2.14, 0.95, 0.0],
    ],
    output_bias: [-0.42, 0.18, -0.27, 0.0],
};
