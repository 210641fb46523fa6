//! Elementary frame transforms and state vectors
//!
//! A [`FrameTransform`] is the child-to-parent transform of one graph edge at
//! one epoch: a rotation, a translation, and — on rotating-frame links — the
//! angular velocity of the child relative to the parent. The parent-to-child
//! direction is its algebraic inverse.

use crate::formlib;
use nalgebra::{Matrix3, Vector3};

/// Coordinate form of a state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Cartesian,
    /// (r, azimuth, elevation) plus their time derivatives
    Spherical,
}

/// A 6-element state (position + velocity) tagged with its owning frame.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub frame: String,
    pub form: Form,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl State {
    /// Cartesian state in the given frame.
    pub fn cartesian(frame: &str, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        State {
            frame: frame.to_owned(),
            form: Form::Cartesian,
            position,
            velocity,
        }
    }

    /// Spherical state in the given frame.
    pub fn spherical(frame: &str, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        State {
            frame: frame.to_owned(),
            form: Form::Spherical,
            position,
            velocity,
        }
    }

    /// The same state in cartesian form.
    pub fn to_cartesian(&self) -> State {
        match self.form {
            Form::Cartesian => self.clone(),
            Form::Spherical => {
                let (position, velocity) =
                    formlib::spherical_to_cartesian(&self.position, &self.velocity);
                State {
                    frame: self.frame.clone(),
                    form: Form::Cartesian,
                    position,
                    velocity,
                }
            }
        }
    }

    /// The same state in spherical form.
    pub fn to_spherical(&self) -> State {
        match self.form {
            Form::Spherical => self.clone(),
            Form::Cartesian => {
                let (position, velocity) =
                    formlib::cartesian_to_spherical(&self.position, &self.velocity);
                State {
                    frame: self.frame.clone(),
                    form: Form::Spherical,
                    position,
                    velocity,
                }
            }
        }
    }
}

/// One elementary child-to-parent transform evaluated at an epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransform {
    /// Child-to-parent rotation
    pub rotation: Matrix3<f64>,
    /// Translation offset, applied per the frame's composition order
    pub translation: Vector3<f64>,
    /// Angular velocity of the child frame relative to the parent, for
    /// rotating-frame links; `None` on static edges
    pub angular_velocity: Option<Vector3<f64>>,
}

impl FrameTransform {
    pub fn identity() -> Self {
        FrameTransform {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
            angular_velocity: None,
        }
    }

    /// A pure rotation edge.
    pub fn rotation(rotation: Matrix3<f64>) -> Self {
        FrameTransform {
            rotation,
            translation: Vector3::zeros(),
            angular_velocity: None,
        }
    }

    /// A rotation edge between rotating frames.
    pub fn rotating(rotation: Matrix3<f64>, angular_velocity: Vector3<f64>) -> Self {
        FrameTransform {
            rotation,
            translation: Vector3::zeros(),
            angular_velocity: Some(angular_velocity),
        }
    }

    /// The parent-to-child inverse: transposed rotation, negated offset
    /// rotated into the new frame, negated angular velocity.
    ///
    /// `rotation_before_translation` must match the flag the forward edge is
    /// applied with, since it decides which frame the offset lives in.
    pub fn inverse(&self, rotation_before_translation: bool) -> Self {
        let rt = self.rotation.transpose();
        let translation = if rotation_before_translation {
            -(rt * self.translation)
        } else {
            -(self.rotation * self.translation)
        };
        FrameTransform {
            rotation: rt,
            translation,
            angular_velocity: self.angular_velocity.map(|w| -w),
        }
    }

    /// Apply the transform to a cartesian position/velocity pair.
    ///
    /// With `rotation_before_translation` the position is rotated into the
    /// new orientation first and then offset; otherwise the offset applies in
    /// the old frame and the sum is rotated. Rotating edges add the transport
    /// term `w x (R p)` to the velocity; static edges rotate velocity alone.
    pub fn apply(
        &self,
        rotation_before_translation: bool,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let new_position = if rotation_before_translation {
            self.rotation * position + self.translation
        } else {
            self.rotation * (position + self.translation)
        };
        let mut new_velocity = self.rotation * velocity;
        if let Some(w) = self.angular_velocity {
            new_velocity += w.cross(&(self.rotation * position));
        }
        (new_position, new_velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrixlib::rot3;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: &Vector3<f64>, b: &Vector3<f64>, eps: f64) {
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = eps);
        }
    }

    #[test]
    fn test_identity_apply() {
        let t = FrameTransform::identity();
        let p = Vector3::new(1.0, 2.0, 3.0);
        let v = Vector3::new(0.1, 0.2, 0.3);
        let (p2, v2) = t.apply(false, &p, &v);
        assert_vec_eq(&p2, &p, 1e-15);
        assert_vec_eq(&v2, &v, 1e-15);
    }

    #[test]
    fn test_rotate_then_translate() {
        let t = FrameTransform {
            rotation: rot3(std::f64::consts::FRAC_PI_2),
            translation: Vector3::new(10.0, 0.0, 0.0),
            angular_velocity: None,
        };
        let (p, _) = t.apply(true, &Vector3::new(1.0, 0.0, 0.0), &Vector3::zeros());
        // Rotation first: x-axis maps to -y, then the offset lands on top
        assert_vec_eq(&p, &Vector3::new(10.0, -1.0, 0.0), 1e-12);
    }

    #[test]
    fn test_translate_then_rotate() {
        let t = FrameTransform {
            rotation: rot3(std::f64::consts::FRAC_PI_2),
            translation: Vector3::new(10.0, 0.0, 0.0),
            angular_velocity: None,
        };
        let (p, _) = t.apply(false, &Vector3::new(1.0, 0.0, 0.0), &Vector3::zeros());
        // Offset first: (11, 0, 0), then rotated onto -y
        assert_vec_eq(&p, &Vector3::new(0.0, -11.0, 0.0), 1e-12);
    }

    #[test]
    fn test_inverse_round_trip_both_orders() {
        for flag in [true, false] {
            let t = FrameTransform {
                rotation: rot3(0.7),
                translation: Vector3::new(3.0, -2.0, 5.0),
                angular_velocity: None,
            };
            let p = Vector3::new(1.0, 2.0, 3.0);
            let v = Vector3::new(-0.4, 0.5, 0.6);
            let (p1, v1) = t.apply(flag, &p, &v);
            let (p2, v2) = t.inverse(flag).apply(flag, &p1, &v1);
            assert_vec_eq(&p2, &p, 1e-12);
            assert_vec_eq(&v2, &v, 1e-12);
        }
    }

    #[test]
    fn test_rotating_edge_round_trip() {
        // Earth-like rotating link: rotation about z, angular velocity along z
        let w = Vector3::new(0.0, 0.0, 7.29e-5);
        let t = FrameTransform::rotating(rot3(-1.234), w);
        let p = Vector3::new(7000e3, 100e3, 1000e3);
        let v = Vector3::new(1.0, 7.5e3, 2.0);
        let (p1, v1) = t.apply(false, &p, &v);
        let (p2, v2) = t.inverse(false).apply(false, &p1, &v1);
        assert_vec_eq(&p2, &p, 1e-6);
        for i in 0..3 {
            assert_relative_eq!(v2[i], v[i], epsilon = 1e-9, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_transport_term_magnitude() {
        // A point fixed on the rotating child appears to move in the parent
        let w = Vector3::new(0.0, 0.0, 7.29e-5);
        let t = FrameTransform::rotating(rot3(0.5), w);
        let p = Vector3::new(6378e3, 0.0, 0.0);
        let (_, v) = t.apply(false, &p, &Vector3::zeros());
        assert_relative_eq!(v.norm(), 7.29e-5 * 6378e3, epsilon = 1e-6);
    }

    #[test]
    fn test_spherical_round_trip() {
        let s = State::cartesian(
            "X",
            Vector3::new(7000e3, -1200e3, 300e3),
            Vector3::new(1.2e3, 7.1e3, -0.3e3),
        );
        let back = s.to_spherical().to_cartesian();
        assert_vec_eq(&back.position, &s.position, 1e-6);
        assert_vec_eq(&back.velocity, &s.velocity, 1e-9);
        assert_eq!(back.form, Form::Cartesian);
    }
}
