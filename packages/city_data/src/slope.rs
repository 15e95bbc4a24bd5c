//! Slope height resolution.
//!
//! Slope codes 1 through 40 come in directional families. Codes 1-8 are the
//! steep ramps, split into a low and a high half for each of N, S, W, E.
//! Codes 9-40 are the gentle ramps, split into eight steps for each of N, S,
//! W, E. Codes 41-44 are single-block ramps spanning the full height, again
//! N, S, W, E.
//!
//! A ramp is described by the heights at the start and end of the axis it
//! rises along: north to south for `Y`, west to east for `X`. Both the mesh
//! builder (at the cell corners) and height queries (at any pixel inside the
//! cell) are driven from the same `SlopeRamp`, so they always agree.

use crate::PIXELS_PER_MAP_UNIT;


/// Highest valid slope code.
pub const MAX_SLOPE_TYPE: u8 = 44;


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SlopeAxis {
    /// Interpolated west to east.
    X,
    /// Interpolated north to south.
    Y,
}

/// Shape of a ramp, heights are in map units within the block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SlopeRamp {
    pub axis: SlopeAxis,
    /// Height at coordinate 0 along `axis` (north or west edge).
    pub start: f32,
    /// Height at coordinate 1 along `axis` (south or east edge).
    pub end: f32,
}

impl SlopeRamp {
    /// Ramp of a slope code, `None` for flat (0) and unknown codes.
    pub fn of(slope: u8) -> Option<Self> {
        use SlopeAxis::*;

        // (axis, start, end) in steps of 1/steps of a block
        let ramp = |axis, steps: f32, start: u8, end: u8| SlopeRamp {
            axis,
            start: start as f32 / steps,
            end: end as f32 / steps,
        };

        Some(match slope {
            // N, 26 degrees, low and high
            1..=2 => { let k = slope - 1; ramp(Y, 2.0, k + 1, k) }
            // S, 26 degrees, low and high
            3..=4 => { let k = slope - 3; ramp(Y, 2.0, k, k + 1) }
            // W, 26 degrees, low and high
            5..=6 => { let k = slope - 5; ramp(X, 2.0, k + 1, k) }
            // E, 26 degrees, low and high
            7..=8 => { let k = slope - 7; ramp(X, 2.0, k, k + 1) }
            // N, 7 degrees, low through high
            9..=16 => { let k = slope - 9; ramp(Y, 8.0, k + 1, k) }
            // S, 7 degrees, low through high
            17..=24 => { let k = slope - 17; ramp(Y, 8.0, k, k + 1) }
            // W, 7 degrees, low through high
            25..=32 => { let k = slope - 25; ramp(X, 8.0, k + 1, k) }
            // E, 7 degrees, low through high
            33..=40 => { let k = slope - 33; ramp(X, 8.0, k, k + 1) }
            // 45 degrees, N, S, W, E
            41 => ramp(Y, 1.0, 1, 0),
            42 => ramp(Y, 1.0, 0, 1),
            43 => ramp(X, 1.0, 1, 0),
            44 => ramp(X, 1.0, 0, 1),
            _ => return None,
        })
    }

    /// Height in map units at a position within the block, both coordinates
    /// in `[0, 1]`.
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        let t = match self.axis {
            SlopeAxis::X => x,
            SlopeAxis::Y => y,
        };
        lerp(self.start, self.end, t)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Height of a slope in pixels at a pixel within the block.
///
/// `px` and `py` are in `[0, PIXELS_PER_MAP_UNIT)` and are clamped into that
/// range. The result is in `[0, PIXELS_PER_MAP_UNIT]`, rounded half away from
/// zero. Flat and unknown codes have height 0.
pub fn slope_height(slope: u8, px: i32, py: i32) -> i32 {
    let ramp = match SlopeRamp::of(slope) {
        Some(ramp) => ramp,
        None => return 0,
    };
    let max_pix = PIXELS_PER_MAP_UNIT - 1;
    let t = |pix: i32| pix.clamp(0, max_pix) as f32 / max_pix as f32;

    let pixels = PIXELS_PER_MAP_UNIT as f32;
    let pixmin = ramp.start * pixels;
    let pixmax = ramp.end * pixels;
    let t = match ramp.axis {
        SlopeAxis::X => t(px),
        SlopeAxis::Y => t(py),
    };
    lerp(pixmin, pixmax, t).round() as i32
}

/// Lowest point of a slope, in pixels.
pub fn slope_height_min(slope: u8) -> i32 {
    let max_pix = PIXELS_PER_MAP_UNIT - 1;
    slope_height(slope, 0, 0).min(slope_height(slope, max_pix, max_pix))
}

/// Highest point of a slope, in pixels.
pub fn slope_height_max(slope: u8) -> i32 {
    let max_pix = PIXELS_PER_MAP_UNIT - 1;
    slope_height(slope, 0, 0).max(slope_height(slope, max_pix, max_pix))
}


#[cfg(test)]
fn for_each_pixel(mut f: impl FnMut(i32, i32)) {
    for py in 0..PIXELS_PER_MAP_UNIT {
        for px in 0..PIXELS_PER_MAP_UNIT {
            f(px, py);
        }
    }
}

#[test]
fn flat_slope_is_zero() {
    for_each_pixel(|px, py| assert_eq!(slope_height(0, px, py), 0));
}

#[test]
fn opposite_ramps_sum_to_full_height() {
    // N low half pairs with S high half, and so on through each family
    let mut pairs = vec![(1, 4), (2, 3), (5, 8), (6, 7), (41, 42), (43, 44)];
    for k in 0..8 {
        pairs.push((9 + k, 24 - k));
        pairs.push((25 + k, 40 - k));
    }
    for (a, b) in pairs {
        for_each_pixel(|px, py| assert_eq!(
            slope_height(a, px, py) + slope_height(b, px, py),
            PIXELS_PER_MAP_UNIT,
            "slopes {} and {} at <{},{}>", a, b, px, py,
        ));
    }
}

#[test]
fn ramp_endpoints() {
    let last = PIXELS_PER_MAP_UNIT - 1;

    // N low: half height at the north edge, ground at the south edge
    assert_eq!(slope_height(1, 10, 0), 32);
    assert_eq!(slope_height(1, 10, last), 0);
    // N high: full at north, half at south
    assert_eq!(slope_height(2, 0, 0), 64);
    assert_eq!(slope_height(2, 0, last), 32);
    // E gentle, third step
    assert_eq!(slope_height(35, 0, 20), 16);
    assert_eq!(slope_height(35, last, 20), 24);
    // W full ramp does not depend on y
    assert_eq!(slope_height(43, 0, 0), 64);
    assert_eq!(slope_height(43, 0, last), 64);
    assert_eq!(slope_height(43, last, 0), 0);
    // out of range pixels clamp
    assert_eq!(slope_height(44, 500, 0), 64);
    assert_eq!(slope_height(44, -3, 0), 0);
}

#[test]
fn interpolation_rounds_half_away_from_zero() {
    // 32 * 21 / 63 = 10.666.. -> 11
    assert_eq!(slope_height(3, 0, 21), 11);
    // 8 * 36 / 63 = 4.571.. -> 5
    assert_eq!(slope_height(17, 0, 36), 5);
}

#[test]
fn min_and_max() {
    assert_eq!(slope_height_min(1), 0);
    assert_eq!(slope_height_max(1), 32);
    assert_eq!(slope_height_min(16), 56);
    assert_eq!(slope_height_max(16), 64);
    assert_eq!(slope_height_min(0), 0);
    assert_eq!(slope_height_max(0), 0);
}

#[test]
fn every_code_has_a_ramp() {
    assert!(SlopeRamp::of(0).is_none());
    for slope in 1..=MAX_SLOPE_TYPE {
        let ramp = SlopeRamp::of(slope).unwrap();
        assert!((0.0..=1.0).contains(&ramp.start));
        assert!((0.0..=1.0).contains(&ramp.end));
        assert!(ramp.start != ramp.end);
    }
    assert!(SlopeRamp::of(MAX_SLOPE_TYPE + 1).is_none());
}
