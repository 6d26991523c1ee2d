/// Normalize an 8-bit alpha value to `[0, 1]`.
pub(crate) fn unit_alpha(a: u8) -> f32 {
    f32::from(a) / 255.0
}

/// Linear interpolation between a background and a foreground channel.
///
/// Exact at the endpoints: `a == 1.0` yields `fg`, `a == 0.0` yields `bg`.
pub(crate) fn lerp_u8(bg: u8, fg: u8, a: f32) -> u8 {
    let a = a.clamp(0.0, 1.0);
    let v = a * f32::from(fg) + (1.0 - a) * f32::from(bg);
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
