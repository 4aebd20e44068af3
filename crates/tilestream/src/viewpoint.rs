//! # Viewpoint
//!
//! The pose and projection generation is streamed around. The consumer
//! publishes one per frame; the scheduler turns it into a tile-space search
//! region (the AABB of the view frustum cut at a distance) and into the
//! facing test used for eviction.

use serde::{Deserialize, Serialize};
use tilestream_shared::{Quat, Vec3};

/// Camera projection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Perspective projection with a vertical field of view in degrees.
    Perspective {
        /// Vertical field of view.
        vertical_fov_degrees: f32,
    },
    /// Orthographic projection with a half-height in world units.
    Orthographic {
        /// Half the visible height.
        size: f32,
    },
}

/// World-space camera pose plus projection.
///
/// Camera-local axes: +X right, +Y up, +Z forward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Camera position.
    pub position: Vec3,
    /// Camera orientation.
    pub rotation: Quat,
    /// Projection parameters.
    pub projection: Projection,
    /// Width over height.
    pub aspect: f32,
}

impl Viewpoint {
    /// Perspective viewpoint.
    #[must_use]
    pub const fn perspective(
        position: Vec3,
        rotation: Quat,
        vertical_fov_degrees: f32,
        aspect: f32,
    ) -> Self {
        Self {
            position,
            rotation,
            projection: Projection::Perspective {
                vertical_fov_degrees,
            },
            aspect,
        }
    }

    /// Orthographic viewpoint.
    #[must_use]
    pub const fn orthographic(position: Vec3, rotation: Quat, size: f32, aspect: f32) -> Self {
        Self {
            position,
            rotation,
            projection: Projection::Orthographic { size },
            aspect,
        }
    }

    /// Viewing direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }

    /// Half extents (width, height) of the view rectangle at `distance`.
    #[must_use]
    pub fn half_extents(&self, distance: f32) -> (f32, f32) {
        let half_height = match self.projection {
            Projection::Perspective {
                vertical_fov_degrees,
            } => distance * (vertical_fov_degrees.to_radians() * 0.5).tan(),
            Projection::Orthographic { size } => size,
        };
        (half_height * self.aspect, half_height)
    }

    /// World-space corners of the view rectangle at `distance`: bottom-left,
    /// top-left, top-right, bottom-right.
    #[must_use]
    pub fn frustum_corners(&self, distance: f32) -> [Vec3; 4] {
        let (hw, hh) = self.half_extents(distance);
        [
            Vec3::new(-hw, -hh, distance),
            Vec3::new(-hw, hh, distance),
            Vec3::new(hw, hh, distance),
            Vec3::new(hw, -hh, distance),
        ]
        .map(|local| self.position + self.rotation.rotate(local))
    }

    /// World-space AABB `(min, max)` of the camera position and the view
    /// rectangle at `distance`.
    #[must_use]
    pub fn frustum_bounds(&self, distance: f32) -> (Vec3, Vec3) {
        self.frustum_corners(distance)
            .into_iter()
            .fold((self.position, self.position), |(lo, hi), c| {
                (lo.min(c), hi.max(c))
            })
    }

    /// Whether moving from `previous` to `self` is large enough to restart
    /// radius expansion: farther than `max_distance`, or turned by more
    /// than `max_angle_degrees`.
    #[must_use]
    pub fn differs_from(&self, previous: &Self, max_distance: f32, max_angle_degrees: f32) -> bool {
        self.position.distance(previous.position) > max_distance
            || self.forward().angle_degrees(previous.forward()) > max_angle_degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_perspective_corners() {
        let view = Viewpoint::perspective(Vec3::ZERO, Quat::IDENTITY, 90.0, 2.0);
        let corners = view.frustum_corners(10.0);
        // tan(45deg) = 1: half height 10, half width 20
        assert!(approx(corners[0].x, -20.0) && approx(corners[0].y, -10.0));
        assert!(approx(corners[2].x, 20.0) && approx(corners[2].y, 10.0));
        assert!(corners.iter().all(|c| approx(c.z, 10.0)));
    }

    #[test]
    fn test_bounds_include_position() {
        let view = Viewpoint::perspective(Vec3::new(5.0, 1.0, 5.0), Quat::from_yaw(90.0), 60.0, 1.0);
        let (min, max) = view.frustum_bounds(8.0);
        // looking down +X
        assert!(approx(min.x, 5.0));
        assert!(approx(max.x, 13.0));
        assert!(min.z < 5.0 && max.z > 5.0);
    }

    #[test]
    fn test_orthographic_extent_ignores_distance() {
        let view = Viewpoint::orthographic(Vec3::ZERO, Quat::IDENTITY, 4.0, 1.5);
        assert_eq!(view.half_extents(1.0), view.half_extents(100.0));
        assert!(approx(view.half_extents(1.0).0, 6.0));
    }

    #[test]
    fn test_reset_thresholds() {
        let base = Viewpoint::perspective(Vec3::ZERO, Quat::IDENTITY, 60.0, 1.0);

        let nudged = Viewpoint { position: Vec3::new(3.0, 0.0, 0.0), ..base };
        assert!(!nudged.differs_from(&base, 10.0, 15.0));

        let moved = Viewpoint { position: Vec3::new(11.0, 0.0, 0.0), ..base };
        assert!(moved.differs_from(&base, 10.0, 15.0));

        let turned = Viewpoint { rotation: Quat::from_yaw(20.0), ..base };
        assert!(turned.differs_from(&base, 10.0, 15.0));
    }
}
