//! Trapezoidal motion model.

/// Time (s) to cover `distance` mm with top speed `speed` mm/s and
/// symmetric `acceleration` mm/s².
///
/// Short moves never reach top speed and are a pure accelerate/decelerate
/// triangle. Any non-positive input yields zero.
pub fn move_time(distance: f64, speed: f64, acceleration: f64) -> f64 {
    if distance <= 0.0 || speed <= 0.0 || acceleration <= 0.0 {
        return 0.0;
    }

    let ramp_distance = speed * speed / acceleration;
    if distance < ramp_distance {
        2.0 * (distance / acceleration).sqrt()
    } else {
        2.0 * speed / acceleration + (distance - ramp_distance) / speed
    }
}

/// Time to extrude `distance` mm as consecutive moves of `segment` mm each.
pub(crate) fn segmented_time(distance: f64, segment: f64, speed: f64, acceleration: f64) -> f64 {
    if distance <= 0.0 || segment <= 0.0 {
        return 0.0;
    }
    distance / segment * move_time(segment, speed, acceleration)
}
