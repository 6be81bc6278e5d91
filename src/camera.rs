//! Camera
//!
//! View/projection state consumed read-only by passes. Shadow passes derive
//! transient light cameras through the same type; those live for exactly one
//! light iteration and are discarded with it.

use glam::{Mat4, Vec3};

/// A view/projection pair with the source parameters kept around for
/// cascade-split math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    view: Mat4,
    projection: Mat4,
    znear: f32,
    zfar: f32,
}

impl Camera {
    /// Perspective camera looking from `eye` toward `target`.
    #[must_use]
    pub fn perspective(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position: eye,
            view: Mat4::look_at_rh(eye, target, up_for(target - eye)),
            projection: Mat4::perspective_rh(fov_y, aspect, znear, zfar),
            znear,
            zfar,
        }
    }

    /// Orthographic camera looking from `eye` toward `target`, covering a
    /// square frustum of `half_extent` on each side.
    ///
    /// This is the shape shadow passes use for directional light cameras.
    #[must_use]
    pub fn orthographic(eye: Vec3, target: Vec3, half_extent: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position: eye,
            view: Mat4::look_at_rh(eye, target, up_for(target - eye)),
            projection: Mat4::orthographic_rh(
                -half_extent,
                half_extent,
                -half_extent,
                half_extent,
                znear,
                zfar,
            ),
            znear,
            zfar,
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Combined projection × view matrix.
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    #[inline]
    #[must_use]
    pub fn znear(&self) -> f32 {
        self.znear
    }

    #[inline]
    #[must_use]
    pub fn zfar(&self) -> f32 {
        self.zfar
    }
}

/// Picks an up vector that is never collinear with the view direction.
fn up_for(direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_projection_combines_both_matrices() {
        let camera = Camera::perspective(
            Vec3::new(0.0, 2.0, 5.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_3,
            16.0 / 9.0,
            0.1,
            100.0,
        );
        let vp = camera.view_projection();
        assert_eq!(vp, camera.projection() * camera.view());
    }

    #[test]
    fn vertical_light_direction_gets_stable_up_vector() {
        // A light looking straight down must not degenerate.
        let camera = Camera::orthographic(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, 5.0, 0.1, 50.0);
        assert!(camera.view().is_finite());
    }
}
