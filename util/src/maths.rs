//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the half-open range (-pi, pi].
///
/// Non-finite angles are returned unchanged.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float
{
    if !angle.is_finite() {
        return angle
    }

    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    // rem_euclid lands in [0, tau], so the result is in [-pi, pi]. -pi is the same heading as
    // +pi and only +pi is in range.
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Saturate the magnitude of a value, preserving its sign.
///
/// This is `sign(value) * min(|value|, limit)`, with a zero value mapping to zero.
pub fn sat_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    if value == T::zero() {
        return T::zero()
    }

    value.signum() * value.abs().min(limit)
}

/// Clamp a value into the closed range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    value.max(min).min(max)
}

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float
{
    if point_0.len() != point_1.len() {
        return None;
    }

    Some(
        point_0.iter()
            .zip(point_1.iter())
            .fold(T::zero(), |sum, (a, b)| sum + (*a - *b).powi(2))
            .sqrt()
    )
}
