//! Elementary axis rotations
//!
//! Frame-rotation convention (Vallado): `rot3(a)` rotates the *axes* by `a`
//! about z, so `rot3(a) * v` expresses a fixed vector `v` in the rotated frame.
//! The vector-rotation matrix is the transpose.

use nalgebra::Matrix3;

/// Frame rotation about the x axis
pub fn rot1(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, s, //
        0.0, -s, c,
    )
}

/// Frame rotation about the y axis
pub fn rot2(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, 0.0, -s, //
        0.0, 1.0, 0.0, //
        s, 0.0, c,
    )
}

/// Frame rotation about the z axis
pub fn rot3(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, s, 0.0, //
        -s, c, 0.0, //
        0.0, 0.0, 1.0,
    )
}
