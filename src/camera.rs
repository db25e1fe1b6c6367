use nalgebra::{
    allocator::Allocator,
    base::storage::{Owned, Storage},
    geometry::Point3,
    DefaultAllocator, Dim, Matrix3, Matrix3x4, OMatrix, RealField, Vector3, U2, U3,
};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{coordinate_system::WorldFrame, Pixels, Points};

/// The matrices modeling a linear camera.
///
/// Holds the 3x3 intrinsic matrix `K`, the 3x4 extrinsic (world-to-camera)
/// matrix `Rt` and their product, the 3x4 projection matrix `P = K * Rt`.
///
/// ```
/// use scene_cam::*;
/// use nalgebra::{Matrix3, Matrix3x4};
///
/// let k = Matrix3::new(
///     100.0, 0.0, 320.0,
///     0.0, 100.0, 240.0,
///     0.0, 0.0, 1.0,
/// );
/// let rt = Matrix3x4::identity();
/// let cam = CameraMatrices::compose(k, rt);
/// assert_eq!(cam.projection(), &(k * rt));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraMatrices<R: RealField> {
    projection: Matrix3x4<R>,
    intrinsics: Matrix3<R>,
    extrinsics: Matrix3x4<R>,
}

impl<R: RealField + Copy> CameraMatrices<R> {
    /// Build from intrinsic and extrinsic matrices, computing `P = K * Rt`.
    pub fn compose(intrinsics: Matrix3<R>, extrinsics: Matrix3x4<R>) -> Self {
        Self {
            projection: intrinsics * extrinsics,
            intrinsics,
            extrinsics,
        }
    }

    /// Return the 3x4 projection matrix `P`.
    #[inline]
    pub fn projection(&self) -> &Matrix3x4<R> {
        &self.projection
    }

    /// Return the 3x3 intrinsic matrix `K`.
    #[inline]
    pub fn intrinsics(&self) -> &Matrix3<R> {
        &self.intrinsics
    }

    /// Return the 3x4 extrinsic matrix `Rt`.
    #[inline]
    pub fn extrinsics(&self) -> &Matrix3x4<R> {
        &self.extrinsics
    }

    /// Split into the `(P, K, Rt)` triple.
    pub fn into_parts(self) -> (Matrix3x4<R>, Matrix3<R>, Matrix3x4<R>) {
        (self.projection, self.intrinsics, self.extrinsics)
    }

    /// take 3D coordinates in world frame and convert to pixel coordinates
    ///
    /// Each point is multiplied by `P` in homogeneous coordinates and divided
    /// by the third component.
    pub fn world_to_pixel<NPTS, InStorage>(
        &self,
        world: &Points<WorldFrame, R, NPTS, InStorage>,
    ) -> Pixels<R, NPTS, Owned<R, NPTS, U2>>
    where
        NPTS: Dim,
        InStorage: Storage<R, NPTS, U3>,
        DefaultAllocator: Allocator<NPTS, U2>,
    {
        let mut result = Pixels::new(OMatrix::zeros_generic(
            NPTS::from_usize(world.data.nrows()),
            U2::from_usize(2),
        ));

        // It seems broadcasting is not (yet) supported in nalgebra, so we loop
        // through the data.
        for i in 0..world.data.nrows() {
            let x = Point3::new(world.data[(i, 0)], world.data[(i, 1)], world.data[(i, 2)])
                .to_homogeneous();
            let rst = self.projection * x;
            result.data[(i, 0)] = rst[0] / rst[2];
            result.data[(i, 1)] = rst[1] / rst[2];
        }
        result
    }

    /// Get the camera center, the null space of `P`, in world coordinates.
    pub fn camera_center(&self) -> Point3<R> {
        pmat2cam_center(&self.projection)
    }
}

impl<R: RealField + Copy> approx::AbsDiffEq for CameraMatrices<R> {
    type Epsilon = R;

    fn default_epsilon() -> R {
        R::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: R) -> bool {
        self.projection.abs_diff_eq(&other.projection, epsilon)
            && self.intrinsics.abs_diff_eq(&other.intrinsics, epsilon)
            && self.extrinsics.abs_diff_eq(&other.extrinsics, epsilon)
    }
}

impl<R: RealField + Copy> approx::RelativeEq for CameraMatrices<R> {
    fn default_max_relative() -> R {
        R::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: R, max_relative: R) -> bool {
        self.projection
            .relative_eq(&other.projection, epsilon, max_relative)
            && self
                .intrinsics
                .relative_eq(&other.intrinsics, epsilon, max_relative)
            && self
                .extrinsics
                .relative_eq(&other.extrinsics, epsilon, max_relative)
    }
}

/// get the camera center from a 3x4 camera projection matrix
fn pmat2cam_center<R: RealField + Copy>(p: &Matrix3x4<R>) -> Point3<R> {
    let x = p.remove_column(0).determinant();
    let y = -p.remove_column(1).determinant();
    let z = p.remove_column(2).determinant();
    let w = -p.remove_column(3).determinant();
    Point3::from(Vector3::new(x / w, y / w, z / w))
}

#[cfg(test)]
mod tests {
    use nalgebra::{Matrix2x3, Matrix3, Matrix3x4, Point3, Vector3};

    use super::CameraMatrices;
    use crate::{extrinsics::extrinsic_matrix, Points, Pose};

    #[rustfmt::skip]
    fn arbitrary_k() -> Matrix3<f64> {
        Matrix3::new(
            812.5, 0.7, 301.2,
            0.0, 799.1, 255.8,
            0.0, 0.0, 1.0,
        )
    }

    #[test]
    fn projection_is_product() {
        let k = arbitrary_k();
        #[rustfmt::skip]
        let rt = Matrix3x4::new(
            0.1, 0.2, 0.3, 0.4,
            -1.0, 2.0, -3.0, 4.0,
            5.5, -6.5, 7.5, -8.5,
        );
        let cam = CameraMatrices::compose(k, rt);
        for i in 0..3 {
            for j in 0..4 {
                let expected =
                    k[(i, 0)] * rt[(0, j)] + k[(i, 1)] * rt[(1, j)] + k[(i, 2)] * rt[(2, j)];
                approx::assert_relative_eq!(cam.projection()[(i, j)], expected, epsilon = 1e-12);
            }
        }
        let (p, k2, rt2) = cam.clone().into_parts();
        assert_eq!(&p, cam.projection());
        assert_eq!(k2, k);
        assert_eq!(rt2, rt);
    }

    #[test]
    fn camera_center_from_projection() {
        let pose = Pose::from_euler_xyz(Point3::new(1.2, -3.4, 5.6), &Vector3::new(0.5, -0.4, 2.0));
        let rt = extrinsic_matrix(&pose.isometry().to_homogeneous()).unwrap();
        let cam = CameraMatrices::compose(arbitrary_k(), rt);
        approx::assert_abs_diff_eq!(cam.camera_center(), *pose.position(), epsilon = 1e-9);
    }

    #[test]
    fn approximate_equality() {
        let a = CameraMatrices::compose(arbitrary_k(), Matrix3x4::identity());
        let mut rt = Matrix3x4::identity();
        rt[(0, 3)] = 1e-12;
        let b = CameraMatrices::compose(arbitrary_k(), rt);
        assert!(a != b);
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-9);

        rt[(0, 3)] = 1e-3;
        let c = CameraMatrices::compose(arbitrary_k(), rt);
        approx::assert_relative_ne!(a, c, epsilon = 1e-9);
    }

    #[test]
    fn world_to_pixel_divides_homogeneous() {
        let k = arbitrary_k();
        let cam = CameraMatrices::compose(k, Matrix3x4::identity());
        let world = Points::new(Matrix2x3::new(
            1.0, 2.0, 4.0, // pt 1
            -0.5, 0.25, 2.0, // pt 2
        ));
        let pixels = cam.world_to_pixel(&world);
        for i in 0..2 {
            let pt = world.data.row(i);
            let cc = k * Vector3::new(pt[0], pt[1], pt[2]);
            approx::assert_relative_eq!(pixels.data[(i, 0)], cc[0] / cc[2], epsilon = 1e-12);
            approx::assert_relative_eq!(pixels.data[(i, 1)], cc[1] / cc[2], epsilon = 1e-12);
        }
    }

    #[test]
    #[cfg(feature = "serde-serialize")]
    fn test_serde() {
        let expected = CameraMatrices::compose(arbitrary_k(), Matrix3x4::identity());
        let buf = serde_json::to_string(&expected).unwrap();
        let actual: CameraMatrices<f64> = serde_json::from_str(&buf).unwrap();
        assert!(expected == actual);
    }
}
