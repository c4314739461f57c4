//! Arcball helper to interactively rotate objects on-screen.
//!
//! The arcball is driven by mouse input. A `button(pos, true)` makes it active,
//! subsequent `motion(pos)` calls accumulate an incremental rotation relative to
//! the press location, and `button(pos, false)` folds the increment into the
//! stored rotation. While active, `matrix` and `active_state` already include
//! the pending increment.
//!
//! Positions and `size` are expressed in the same units (usually pixels, with
//! the origin at the top-left corner of the controlled area).

use cgmath::{InnerSpace, Matrix4, One, Quaternion, Rad, Rotation3, Vector3};

use super::vector::Vector2i;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arcball {
    active: bool,
    last_pos: Vector2i,
    size: Vector2i,
    quat: Quaternion<f32>,
    incr: Quaternion<f32>,
    speed_factor: f32,
}

impl Default for Arcball {
    fn default() -> Self {
        Arcball::new(2.0)
    }
}

impl Arcball {
    /// Creates an arcball with identity rotation. `set_size` must be called
    /// before the first motion.
    pub fn new(speed_factor: f32) -> Self {
        Arcball {
            active: false,
            last_pos: Vector2i::default(),
            size: Vector2i::default(),
            quat: Quaternion::one(),
            incr: Quaternion::one(),
            speed_factor,
        }
    }

    /// Creates an arcball starting from the rotation `quat`.
    pub fn with_state(quat: Quaternion<f32>) -> Self {
        Arcball {
            quat,
            ..Arcball::default()
        }
    }

    /// The stored rotation, *excluding* the motion of an active drag.
    #[inline]
    pub fn state(&self) -> Quaternion<f32> {
        self.quat
    }

    /// Sets the rotation and marks the arcball as not active.
    pub fn set_state(&mut self, state: Quaternion<f32>) {
        self.active = false;
        self.last_pos = Vector2i::default();
        self.quat = state;
        self.incr = Quaternion::one();
    }

    #[inline]
    pub fn set_size(&mut self, size: Vector2i) {
        self.size = size;
    }

    #[inline]
    pub fn size(&self) -> Vector2i {
        self.size
    }

    #[inline]
    pub fn set_speed_factor(&mut self, speed_factor: f32) {
        self.speed_factor = speed_factor;
    }

    #[inline]
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Signals a press (`pressed = true`) or release of the controlling button
    /// at `pos`.
    pub fn button(&mut self, pos: Vector2i, pressed: bool) {
        self.active = pressed;
        self.last_pos = pos;
        if !self.active {
            self.quat = (self.incr * self.quat).normalize();
        }

        self.incr = Quaternion::one();
    }

    /// Updates the pending rotation for the cursor moved to `pos`. Returns
    /// `false` if the arcball is not active.
    pub fn motion(&mut self, pos: Vector2i) -> bool {
        if !self.active {
            return false;
        }

        // Based on the rotation controller of AntTweakBar.
        let inv_min_dim = 1.0 / self.size.x.min(self.size.y) as f32;
        let w = self.size.x as f32;
        let h = self.size.y as f32;
        let s = self.speed_factor;

        let last = (self.last_pos.x as f32, self.last_pos.y as f32);
        let current = (pos.x as f32, pos.y as f32);

        let ox = ((s * (2.0 * last.0 - w) + w) - w - 1.0) * inv_min_dim;
        let tx = ((s * (2.0 * current.0 - w) + w) - w - 1.0) * inv_min_dim;
        let oy = ((s * (h - 2.0 * last.1) + h) - h - 1.0) * inv_min_dim;
        let ty = ((s * (h - 2.0 * current.1) + h) - h - 1.0) * inv_min_dim;

        let v0 = Vector3::new(ox, oy, 1.0);
        let v1 = Vector3::new(tx, ty, 1.0);

        if v0.magnitude2() > 1e-4 && v1.magnitude2() > 1e-4 {
            let v0 = v0.normalize();
            let v1 = v1.normalize();

            let axis = v0.cross(v1);
            let sa = axis.magnitude();
            let ca = v0.dot(v1);
            let mut angle = sa.atan2(ca);

            let t2 = tx * tx + ty * ty;
            if t2 > 1.0 {
                angle *= 1.0 + 0.2 * (t2.sqrt() - 1.0);
            }

            self.incr = Quaternion::from_axis_angle(axis.normalize(), Rad(angle));
            if !is_finite(&self.incr) {
                self.incr = Quaternion::one();
            }
        }

        true
    }

    /// Returns the current rotation *including* the active motion as a 4x4
    /// homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from(self.active_state())
    }

    /// Returns the current rotation *including* the active motion.
    #[inline]
    pub fn active_state(&self) -> Quaternion<f32> {
        self.incr * self.quat
    }

    /// Interrupts the current motion, as if the button was released at the
    /// origin.
    pub fn interrupt(&mut self) {
        self.button(Vector2i::default(), false);
    }
}

fn is_finite(q: &Quaternion<f32>) -> bool {
    q.s.is_finite() && q.v.x.is_finite() && q.v.y.is_finite() && q.v.z.is_finite()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inactive_motion() {
        let mut arcball = Arcball::default();
        arcball.set_size(Vector2i::new(100, 100));
        assert!(!arcball.motion(Vector2i::new(10, 10)));
        assert_eq!(arcball.active_state(), Quaternion::one());
    }

    #[test]
    fn horizontal_drag_rotates_around_y() {
        let mut arcball = Arcball::default();
        arcball.set_size(Vector2i::new(100, 100));

        arcball.button(Vector2i::new(50, 50), true);
        assert!(arcball.active());
        assert!(arcball.motion(Vector2i::new(60, 50)));

        let q = arcball.active_state();
        assert!(q.v.y.abs() > q.v.x.abs());
        assert!(q.v.y.abs() > q.v.z.abs());
        assert!(q.v.y > 0.0);

        // The stored state only changes on release.
        assert_eq!(arcball.state(), Quaternion::one());
        arcball.button(Vector2i::new(60, 50), false);
        assert!(!arcball.active());
        assert!((arcball.state().v.y - q.v.y).abs() < 1e-5);
        assert!((arcball.state().magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn interrupt() {
        let mut arcball = Arcball::default();
        arcball.set_size(Vector2i::new(64, 32));
        arcball.button(Vector2i::new(10, 10), true);
        arcball.motion(Vector2i::new(20, 30));
        arcball.interrupt();

        assert!(!arcball.active());
        assert_eq!(arcball.active_state(), arcball.state());
    }
}
