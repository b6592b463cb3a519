//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Wrap an angle into the range (-pi, pi].
///
/// Uses `atan2(sin, cos)` so that values many turns away from zero are
/// wrapped as well. Results within rounding of -pi are returned as pi.
pub fn wrap_angle<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let wrapped = angle.sin().atan2(angle.cos());

    if wrapped <= -T::PI() + T::epsilon() * T::PI() {
        T::PI()
    }
    else {
        wrapped
    }
}

/// Get the shortest signed angular distance to go from `from` to `to`.
///
/// The result lies in (-pi, pi], positive being anticlockwise.
pub fn get_ang_dist<T>(from: T, to: T) -> T
where
    T: Float + FloatConst
{
    wrap_angle(to - from)
}
