//! Cartesian/spherical coordinate form conversions
//!
//! Spherical form is (r, azimuth theta, elevation phi) with the matching
//! time derivatives in the velocity slots. Only cartesian states can be run
//! through a composed frame transform, so spherical input is converted
//! before and (if the caller wants) after.

use nalgebra::Vector3;

/// Convert a cartesian position/velocity pair to spherical form.
///
/// Returns `(r, theta, phi)` and `(r_dot, theta_dot, phi_dot)` with theta
/// the azimuth in the xy plane and phi the elevation above it, both in
/// radians. Undefined at the origin and on the poles, where the azimuth
/// derivative loses meaning.
pub fn cartesian_to_spherical(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let (x, y, z) = (position.x, position.y, position.z);
    let r = position.norm();
    let rho2 = x * x + y * y;
    let rho = rho2.sqrt();

    let theta = y.atan2(x);
    let phi = (z / r).asin();

    let r_dot = position.dot(velocity) / r;
    let theta_dot = (x * velocity.y - y * velocity.x) / rho2;
    let phi_dot = (velocity.z * r - z * r_dot) / (r * rho);

    (
        Vector3::new(r, theta, phi),
        Vector3::new(r_dot, theta_dot, phi_dot),
    )
}

/// Convert a spherical position/velocity pair back to cartesian form.
pub fn spherical_to_cartesian(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let (r, theta, phi) = (position.x, position.y, position.z);
    let (r_dot, theta_dot, phi_dot) = (velocity.x, velocity.y, velocity.z);

    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();

    let cartesian = Vector3::new(r * cos_p * cos_t, r * cos_p * sin_t, r * sin_p);

    let cartesian_dot = Vector3::new(
        r_dot * cos_p * cos_t - r * phi_dot * sin_p * cos_t - r * theta_dot * cos_p * sin_t,
        r_dot * cos_p * sin_t - r * phi_dot * sin_p * sin_t + r * theta_dot * cos_p * cos_t,
        r_dot * sin_p + r * phi_dot * cos_p,
    );

    (cartesian, cartesian_dot)
}
