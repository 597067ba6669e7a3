//! Oriented bounding boxes and their overlap test.

use bevy::prelude::*;

/// Slack added to the rotation terms so near-parallel edges don't produce a false separating
/// axis from a degenerate cross product.
const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
}

impl Default for BoundBox {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(0.5),
            rotation: Quat::IDENTITY,
        }
    }
}

impl BoundBox {
    pub fn new(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            ..default()
        }
    }

    pub fn at(transform: &Transform, half_extents: Vec3) -> Self {
        let mut bounds = Self::new(half_extents);
        bounds.sync(transform);
        bounds
    }

    /// Follow the owning transform.
    #[inline]
    pub fn sync(&mut self, transform: &Transform) {
        self.center = transform.translation;
        self.rotation = transform.rotation;
    }

    #[inline]
    fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation * Vec3::X,
            self.rotation * Vec3::Y,
            self.rotation * Vec3::Z,
        ]
    }

    /// Separating axis test over the 15 candidate axes of two boxes.
    /// Boxes that only touch count as overlapping.
    pub fn intersects(&self, other: &BoundBox) -> bool {
        let a = self.axes();
        let b = other.axes();
        let ea = self.half_extents.to_array();
        let eb = other.half_extents.to_array();

        // `other`'s axes expressed in `self`'s frame.
        let mut r = [[0.0_f32; 3]; 3];
        let mut abs_r = [[0.0_f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a[i].dot(b[j]);
                abs_r[i][j] = r[i][j].abs() + PARALLEL_EPSILON;
            }
        }

        let d = other.center - self.center;
        let t = [d.dot(a[0]), d.dot(a[1]), d.dot(a[2])];

        for i in 0..3 {
            let ra = ea[i];
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ra + rb {
                return false;
            }
        }

        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let rb = eb[j];
            let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if tj.abs() > ra + rb {
                return false;
            }
        }

        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let tij = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if tij.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}
