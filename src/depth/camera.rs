// SPDX-License-Identifier: GPL-3.0-only

//! Camera model and depth unprojection
//!
//! A depth map carries its camera as metadata: the camera center in world
//! space and the inverse camera matrix mapping a homogeneous pixel `(x, y, 1)`
//! to an unnormalized world-space ray direction. Missing metadata yields a
//! zero camera, which collapses every point onto the origin instead of
//! failing the load.

use crate::constants::{ATTR_CAMERA_CENTER, ATTR_INVERSE_CAMERA};
use crate::media::decoders::Metadata;
use std::ops::{Add, Mul, Sub};
use tracing::debug;

/// 3D point or vector in double precision
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point3d(pub [f64; 3]);

impl Point3d {
    pub const ZERO: Point3d = Point3d([0.0; 3]);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    pub fn dot(&self, other: &Point3d) -> f64 {
        self.x() * other.x() + self.y() * other.y() + self.z() * other.z()
    }

    pub fn cross(&self, other: &Point3d) -> Point3d {
        Point3d([
            self.y() * other.z() - self.z() * other.y(),
            self.z() * other.x() - self.x() * other.z(),
            self.x() * other.y() - self.y() * other.x(),
        ])
    }

    pub fn length(&self) -> f64 {
        let d = self.dot(self);
        if d == 0.0 { 0.0 } else { d.sqrt() }
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalize(&self) -> Point3d {
        let len = self.length();
        if len == 0.0 {
            return Point3d::ZERO;
        }
        *self * (1.0 / len)
    }

    pub fn to_f32(&self) -> [f32; 3] {
        self.0.map(|v| v as f32)
    }
}

impl Add for Point3d {
    type Output = Point3d;

    fn add(self, rhs: Point3d) -> Point3d {
        Point3d([self.x() + rhs.x(), self.y() + rhs.y(), self.z() + rhs.z()])
    }
}

impl Sub for Point3d {
    type Output = Point3d;

    fn sub(self, rhs: Point3d) -> Point3d {
        Point3d([self.x() - rhs.x(), self.y() - rhs.y(), self.z() - rhs.z()])
    }
}

impl Mul<f64> for Point3d {
    type Output = Point3d;

    fn mul(self, rhs: f64) -> Point3d {
        Point3d(self.0.map(|v| v * rhs))
    }
}

/// Single-precision vector as uploaded to vertex buffers
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vec3f(pub [f32; 3]);

impl Vec3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    pub fn x(&self) -> f32 {
        self.0[0]
    }

    pub fn y(&self) -> f32 {
        self.0[1]
    }

    pub fn z(&self) -> f32 {
        self.0[2]
    }

    pub fn cross(&self, other: &Vec3f) -> Vec3f {
        Vec3f([
            self.y() * other.z() - self.z() * other.y(),
            self.z() * other.x() - self.x() * other.z(),
            self.x() * other.y() - self.y() * other.x(),
        ])
    }

    /// Euclidean length, accumulated in double precision
    pub fn length(&self) -> f64 {
        let d = self.0.iter().map(|&v| v as f64 * v as f64).sum::<f64>();
        if d == 0.0 { 0.0 } else { d.sqrt() }
    }
}

impl Sub for Vec3f {
    type Output = Vec3f;

    fn sub(self, rhs: Vec3f) -> Vec3f {
        Vec3f([self.x() - rhs.x(), self.y() - rhs.y(), self.z() - rhs.z()])
    }
}

impl From<Point3d> for Vec3f {
    fn from(p: Point3d) -> Self {
        Vec3f(p.to_f32())
    }
}

/// Row-major 3x3 matrix
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Matrix3x3(pub [f64; 9]);

impl Matrix3x3 {
    pub const ZERO: Matrix3x3 = Matrix3x3([0.0; 9]);
    pub const IDENTITY: Matrix3x3 = Matrix3x3([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Apply to the homogeneous pixel `(x, y, 1)`
    pub fn apply_pixel(&self, x: f64, y: f64) -> Point3d {
        let m = &self.0;
        Point3d([
            m[0] * x + m[1] * y + m[2],
            m[3] * x + m[4] * y + m[5],
            m[6] * x + m[7] * y + m[8],
        ])
    }
}

/// Camera of one depth map
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CameraModel {
    /// Camera position in world space
    pub center: Point3d,
    /// Pixel to world ray matrix
    pub inverse_projection: Matrix3x3,
}

impl CameraModel {
    pub fn new(center: Point3d, inverse_projection: Matrix3x3) -> Self {
        Self {
            center,
            inverse_projection,
        }
    }

    /// Read the camera from image metadata
    ///
    /// Missing or malformed attributes fall back to zero.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let center = match metadata.doubles(ATTR_CAMERA_CENTER) {
            Some(v) if v.len() >= 3 => Point3d([v[0], v[1], v[2]]),
            _ => {
                debug!("Missing metadata {}", ATTR_CAMERA_CENTER);
                Point3d::ZERO
            }
        };

        let inverse_projection = match metadata.doubles(ATTR_INVERSE_CAMERA) {
            Some(v) if v.len() >= 9 => {
                let mut m = [0.0; 9];
                m.copy_from_slice(&v[..9]);
                Matrix3x3(m)
            }
            _ => {
                debug!("Missing metadata {}", ATTR_INVERSE_CAMERA);
                Matrix3x3::ZERO
            }
        };

        Self {
            center,
            inverse_projection,
        }
    }

    /// Unit ray direction through a pixel (zero for a degenerate matrix)
    pub fn ray_direction(&self, x: f64, y: f64) -> Point3d {
        self.inverse_projection.apply_pixel(x, y).normalize()
    }

    /// World-space point seen at `(x, y)` with the given depth
    pub fn unproject(&self, x: f64, y: f64, depth: f64) -> Point3d {
        self.center + self.ray_direction(x, y) * depth
    }

    /// Distance from `point` to the ray through `adjacent`
    ///
    /// With `adjacent` one pixel away from the pixel `point` was unprojected
    /// from, this approximates the world-space size of a pixel at that depth.
    pub fn pixel_footprint_size(&self, point: Point3d, adjacent: (f64, f64)) -> f64 {
        let direction = self.ray_direction(adjacent.0, adjacent.1);
        (point - self.center).cross(&direction).length()
    }
}

/// Unproject a pixel with the given camera
pub fn unproject(pixel: (u32, u32), depth: f32, camera: &CameraModel) -> Point3d {
    camera.unproject(pixel.0 as f64, pixel.1 as f64, depth as f64)
}

/// Footprint size of a pixel at `point`, measured against `adjacent`
pub fn pixel_footprint_size(point: Point3d, camera: &CameraModel, adjacent: (u32, u32)) -> f64 {
    camera.pixel_footprint_size(point, (adjacent.0 as f64, adjacent.1 as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::decoders::AttributeValue;

    fn pinhole() -> CameraModel {
        // fx = fy = 100, principal point (50, 50)
        CameraModel::new(
            Point3d::new(1.0, 2.0, 3.0),
            Matrix3x3([0.01, 0.0, -0.5, 0.0, 0.01, -0.5, 0.0, 0.0, 1.0]),
        )
    }

    #[test]
    fn test_depth_zero_is_center() {
        let camera = pinhole();
        assert_eq!(unproject((7, 9), 0.0, &camera), camera.center);

        let skewed = CameraModel::new(camera.center, Matrix3x3([3.0; 9]));
        assert_eq!(unproject((7, 9), 0.0, &skewed), camera.center);
    }

    #[test]
    fn test_principal_ray() {
        let camera = pinhole();
        let p = unproject((50, 50), 2.0, &camera);
        assert_eq!(p, Point3d::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_zero_matrix_collapses_to_center() {
        let camera = CameraModel::new(Point3d::new(4.0, 5.0, 6.0), Matrix3x3::ZERO);
        assert_eq!(unproject((3, 3), 10.0, &camera), Point3d::new(4.0, 5.0, 6.0));
        assert_eq!(Point3d::ZERO.normalize(), Point3d::ZERO);
    }

    #[test]
    fn test_footprint_on_ray_is_zero() {
        let camera = pinhole();
        let p = unproject((60, 40), 3.0, &camera);
        assert!(pixel_footprint_size(p, &camera, (60, 40)).abs() < 1e-12);
    }

    #[test]
    fn test_footprint_grows_with_depth() {
        let camera = CameraModel::new(Point3d::ZERO, Matrix3x3::IDENTITY);
        let near = unproject((0, 0), 1.0, &camera);
        let far = unproject((0, 0), 2.0, &camera);
        let near_size = pixel_footprint_size(near, &camera, (1, 0));
        let far_size = pixel_footprint_size(far, &camera, (1, 0));
        // Ray through (1, 0) is at 45 degrees from the optical axis
        assert!((near_size - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((far_size - 2.0 * near_size).abs() < 1e-12);
    }

    #[test]
    fn test_camera_from_metadata() {
        let mut metadata = Metadata::default();
        metadata.insert(ATTR_CAMERA_CENTER, AttributeValue::Doubles(vec![1.0, 2.0, 3.0]));
        metadata.insert(
            ATTR_INVERSE_CAMERA,
            AttributeValue::Doubles(Matrix3x3::IDENTITY.0.to_vec()),
        );
        let camera = CameraModel::from_metadata(&metadata);
        assert_eq!(camera.center, Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(camera.inverse_projection, Matrix3x3::IDENTITY);
    }

    #[test]
    fn test_camera_from_empty_metadata() {
        let camera = CameraModel::from_metadata(&Metadata::default());
        assert_eq!(camera, CameraModel::default());
    }
}
