//! Q16.16 Fixed-Point Arithmetic
//!
//! Every coordinate, velocity, angle and cell dimension in the space is a
//! Q16.16 fixed-point number. Collision results therefore depend only on
//! integer arithmetic and replay bit-for-bit on every platform.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Angles use the same format and are measured in degrees.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// 90 degrees in fixed-point.
pub const QUARTER_TURN: Fixed = 90 * FIXED_ONE;

/// 360 degrees in fixed-point.
pub const FULL_TURN: Fixed = 360 * FIXED_ONE;

/// sin(d°) * 65536 for whole degrees 0..=90, rounded to nearest.
///
/// Precomputed so that trigonometry never touches floating point.
const SIN_TABLE: [Fixed; 91] = [
    0, 1144, 2287, 3430, 4572, 5712, 6850, 7987,
    9121, 10252, 11380, 12505, 13626, 14742, 15855, 16962,
    18064, 19161, 20252, 21336, 22415, 23486, 24550, 25607,
    26656, 27697, 28729, 29753, 30767, 31772, 32768, 33754,
    34729, 35693, 36647, 37590, 38521, 39441, 40348, 41243,
    42126, 42995, 43852, 44695, 45525, 46341, 47143, 47930,
    48703, 49461, 50203, 50931, 51643, 52339, 53020, 53684,
    54332, 54963, 55578, 56175, 56756, 57319, 57865, 58393,
    58903, 59396, 59870, 60326, 60764, 61183, 61584, 61966,
    62328, 62672, 62997, 63303, 63589, 63856, 64104, 64332,
    64540, 64729, 64898, 65048, 65177, 65287, 65376, 65446,
    65496, 65526, 65536,
];

// =============================================================================
// CORE OPERATIONS
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in the movement pass.
///
/// # Example
/// ```
/// use cellspace::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in simulation logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Returns 0 on divide-by-zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Floor of `a / b` for two fixed-point numbers, as a plain integer.
///
/// Used to turn a coordinate into a cell index. `b` must be positive.
#[inline]
pub fn floor_div(a: Fixed, b: Fixed) -> i32 {
    debug_assert!(b > 0, "floor_div divisor must be positive");
    (a as i64).div_euclid(b as i64) as i32
}

/// Ceiling of `a / b` for two fixed-point numbers, as a plain integer.
///
/// `b` must be positive.
#[inline]
pub fn ceil_div(a: Fixed, b: Fixed) -> i32 {
    debug_assert!(b > 0, "ceil_div divisor must be positive");
    let (a, b) = (a as i64, b as i64);
    let q = a.div_euclid(b);
    if a.rem_euclid(b) == 0 { q as i32 } else { (q + 1) as i32 }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_angle(angle: Fixed) -> Fixed {
    angle.rem_euclid(FULL_TURN)
}

/// sin for an angle in `[0, 90]` degrees, interpolated between table entries.
#[inline]
fn quarter_sin(angle: Fixed) -> Fixed {
    let index = (angle >> FIXED_SCALE) as usize;
    let frac = angle & (FIXED_ONE - 1);
    if index >= 90 {
        return SIN_TABLE[90];
    }
    let lo = SIN_TABLE[index];
    let hi = SIN_TABLE[index + 1];
    lo + fixed_mul(hi - lo, frac)
}

/// Sine of an angle in degrees.
///
/// Exact at multiples of 90 degrees, table-interpolated elsewhere.
pub fn fixed_sin(angle: Fixed) -> Fixed {
    let a = normalize_angle(angle);
    if a <= QUARTER_TURN {
        quarter_sin(a)
    } else if a <= 2 * QUARTER_TURN {
        quarter_sin(2 * QUARTER_TURN - a)
    } else if a <= 3 * QUARTER_TURN {
        -quarter_sin(a - 2 * QUARTER_TURN)
    } else {
        -quarter_sin(FULL_TURN - a)
    }
}

/// Cosine of an angle in degrees.
#[inline]
pub fn fixed_cos(angle: Fixed) -> Fixed {
    fixed_sin(normalize_angle(angle).wrapping_add(QUARTER_TURN))
}

// =============================================================================
// TESTS
// =============================================================================
