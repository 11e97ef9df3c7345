//! Border extension for continuous sampling coordinates
//!
//! Tiles near the image edge sample positions outside the image. Those
//! positions are mirrored back about the first and last pixel centers, so a
//! coordinate of `-x` reads the same value as `x`.

/// Reflect a continuous coordinate into `[0, len - 1]`
///
/// Reflection is about the pixel centers `0` and `len - 1`. Repeated
/// reflections are handled for coordinates far outside the axis.
pub fn reflect_coordinate(coordinate: f64, len: usize) -> f64 {
    if len <= 1 || !coordinate.is_finite() {
        return 0.0;
    }
    let span = (len - 1) as f64;
    let distance = coordinate.abs();
    let flips = (distance / span).floor();
    let extra = flips.mul_add(-span, distance);

    let reflected = if flips as u64 % 2 == 0 {
        extra
    } else {
        span - extra
    };
    reflected.clamp(0.0, span)
}

