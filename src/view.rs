use alloc::vec::Vec;

use itertools::iproduct;
use nalgebra::{
    allocator::Allocator,
    base::storage::{Owned, Storage},
    convert,
    geometry::Point3,
    Const, DMatrix, DefaultAllocator, Dim, Dyn, Matrix3, Matrix3x4, OMatrix, RealField, Unit,
    Vector3, U2, U3,
};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{
    coordinate_system::{CameraFrame, WorldFrame},
    CameraMatrices, Error, Pixels, Points,
};

/// Width of the 35mm film format, in millimeters.
pub const FILM_WIDTH_MM: f64 = 36.0;

/// Height of the 35mm film format, in millimeters.
pub const FILM_HEIGHT_MM: f64 = 24.0;

/// How the values of a depth map are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DepthKind {
    /// Distance along the optical axis (the camera z coordinate).
    #[default]
    Plane,
    /// Euclidean distance from the camera center along the pixel ray.
    Ray,
}

/// A pinhole camera in 35mm film format, set up by location and look-at.
///
/// The camera frame follows the computer vision convention: x points right,
/// y points down and +z is the viewing direction. Pixels are square and the
/// principal point is at the image center. The focal length is
/// 35mm-equivalent; the film is scaled to cover the image in both
/// directions, so the active sensor area may be smaller than 36x24mm.
///
/// ```
/// use scene_cam::*;
/// use nalgebra::{Point3, Vector3};
///
/// let view = PerspectiveView::<f64>::new(50.0, 640, 480).with_view(
///     Point3::new(0.0, 0.0, -5.0),
///     Point3::origin(),
///     Vector3::new(0.0, 1.0, 0.0),
/// );
/// let cam = view.camera_matrices().unwrap();
/// let origin = Points::new(nalgebra::RowVector3::new(0.0, 0.0, 0.0));
/// let pix = cam.world_to_pixel(&origin);
/// assert!((pix.data[(0, 0)] - 320.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PerspectiveView<R: RealField> {
    focal_length_mm: R,
    width: u32,
    height: u32,
    location: Point3<R>,
    lookat: Point3<R>,
    up: Vector3<R>,
}

impl<R: RealField + Copy> Default for PerspectiveView<R> {
    fn default() -> Self {
        Self::new(convert(50.0), 256, 256)
    }
}

impl<R: RealField + Copy> PerspectiveView<R> {
    /// Create a view at the origin with up along +Y.
    ///
    /// Location and look-at coincide, so set them with
    /// [`with_view`](Self::with_view) before computing extrinsics.
    pub fn new(focal_length_mm: R, width: u32, height: u32) -> Self {
        Self {
            focal_length_mm,
            width,
            height,
            location: Point3::origin(),
            lookat: Point3::origin(),
            up: Vector3::y(),
        }
    }

    /// Set where the camera is, where it looks and which way is up.
    ///
    /// `up` is the world direction that should point upward in the image.
    pub fn with_view(mut self, location: Point3<R>, lookat: Point3<R>, up: Vector3<R>) -> Self {
        self.location = location;
        self.lookat = lookat;
        self.up = up;
        self
    }

    /// Get the 35mm-equivalent focal length in millimeters
    #[inline]
    pub fn focal_length_mm(&self) -> R {
        self.focal_length_mm
    }

    /// Get the image width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the camera location
    #[inline]
    pub fn location(&self) -> &Point3<R> {
        &self.location
    }

    /// Get the look-at point
    #[inline]
    pub fn lookat(&self) -> &Point3<R> {
        &self.lookat
    }

    /// Get the world direction that points up in the image
    #[inline]
    pub fn up(&self) -> &Vector3<R> {
        &self.up
    }

    /// Vertical and horizontal angles of view of the full film, in degrees.
    pub fn angle_of_view(&self) -> (R, R) {
        let two: R = convert(2.0);
        let to_deg: R = convert(180.0 / core::f64::consts::PI);
        let aov = |sensor: f64| {
            two * (convert::<f64, R>(sensor) / (two * self.focal_length_mm)).atan() * to_deg
        };
        (aov(FILM_HEIGHT_MM), aov(FILM_WIDTH_MM))
    }

    fn check_resolution(&self) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidInput("image width and height must be positive"));
        }
        if !(self.focal_length_mm > R::zero()) {
            return Err(Error::InvalidInput("focal length must be positive"));
        }
        Ok(())
    }

    /// Focal length in pixels.
    pub fn focal_length_px(&self) -> R {
        let w: R = convert(f64::from(self.width));
        let h: R = convert(f64::from(self.height));
        let mm_per_pix_h = convert::<f64, R>(FILM_HEIGHT_MM) / h;
        let mm_per_pix_w = convert::<f64, R>(FILM_WIDTH_MM) / w;
        self.focal_length_mm / mm_per_pix_h.min(mm_per_pix_w)
    }

    fn principal_point(&self) -> (R, R) {
        let half: R = convert(0.5);
        (
            convert::<f64, R>(f64::from(self.width)) * half,
            convert::<f64, R>(f64::from(self.height)) * half,
        )
    }

    /// Create the 3x3 intrinsic matrix.
    pub fn intrinsic_matrix(&self) -> Result<Matrix3<R>, Error> {
        self.check_resolution()?;
        let f = self.focal_length_px();
        let (cx, cy) = self.principal_point();
        let zero = R::zero();
        #[rustfmt::skip]
        let k = Matrix3::new(
            f,    zero, cx,
            zero, f,    cy,
            zero, zero, R::one(),
        );
        Ok(k)
    }

    /// Create the 3x4 world-to-camera matrix.
    ///
    /// Returns [`Error::InvalidGeometry`] if the location equals the look-at
    /// point or `up` is parallel to the viewing direction.
    pub fn extrinsic_matrix(&self) -> Result<Matrix3x4<R>, Error> {
        let eps = R::default_epsilon();
        let z = Unit::try_new(self.lookat - self.location, eps)
            .ok_or(Error::InvalidGeometry)?
            .into_inner();
        let x = Unit::try_new(z.cross(&self.up), eps)
            .ok_or(Error::InvalidGeometry)?
            .into_inner();
        let y = z.cross(&x);

        let q = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
        let translation = -(q * self.location.coords);

        let mut qt = Matrix3x4::zeros();
        qt.fixed_view_mut::<3, 3>(0, 0).copy_from(&q);
        qt.set_column(3, &translation);
        Ok(qt)
    }

    /// Compute `K`, `Rt` and `P = K * Rt`.
    pub fn camera_matrices(&self) -> Result<CameraMatrices<R>, Error> {
        Ok(CameraMatrices::compose(
            self.intrinsic_matrix()?,
            self.extrinsic_matrix()?,
        ))
    }

    /// Project 3D world coordinates to `(u, v)` pixel coordinates.
    pub fn world_to_pixel<NPTS, InStorage>(
        &self,
        world: &Points<WorldFrame, R, NPTS, InStorage>,
    ) -> Result<Pixels<R, NPTS, Owned<R, NPTS, U2>>, Error>
    where
        NPTS: Dim,
        InStorage: Storage<R, NPTS, U3>,
        DefaultAllocator: Allocator<NPTS, U2>,
    {
        Ok(self.camera_matrices()?.world_to_pixel(world))
    }

    /// Project 3D camera coordinates to `(u, v)` pixel coordinates.
    pub fn camera_to_pixel<NPTS, InStorage>(
        &self,
        camera: &Points<CameraFrame, R, NPTS, InStorage>,
    ) -> Result<Pixels<R, NPTS, Owned<R, NPTS, U2>>, Error>
    where
        NPTS: Dim,
        InStorage: Storage<R, NPTS, U3>,
        DefaultAllocator: Allocator<NPTS, U2>,
    {
        let k = self.intrinsic_matrix()?;
        let mut result = Pixels::new(OMatrix::zeros_generic(
            NPTS::from_usize(camera.data.nrows()),
            U2::from_usize(2),
        ));
        for i in 0..camera.data.nrows() {
            let rst = k * Vector3::new(
                camera.data[(i, 0)],
                camera.data[(i, 1)],
                camera.data[(i, 2)],
            );
            result.data[(i, 0)] = rst[0] / rst[2];
            result.data[(i, 1)] = rst[1] / rst[2];
        }
        Ok(result)
    }

    /// Back-project a depth map to 3D points in the camera frame.
    ///
    /// `depth` has one row per image row and one column per image column.
    /// Pixel `(row, col)` is taken at its center `(col + 0.5, row + 0.5)`.
    /// Only pixels where `mask` is `true` are used; points are returned in
    /// row-major pixel order.
    pub fn backproject_to_camera(
        &self,
        depth: &DMatrix<R>,
        mask: Option<&DMatrix<bool>>,
        kind: DepthKind,
    ) -> Result<Points<CameraFrame, R, Dyn, Owned<R, Dyn, U3>>, Error> {
        self.check_resolution()?;
        if depth.nrows() != self.height as usize || depth.ncols() != self.width as usize {
            return Err(Error::InvalidInput(
                "depth map size does not match the image resolution",
            ));
        }
        if let Some(mask) = mask {
            if mask.shape() != depth.shape() {
                return Err(Error::InvalidInput("mask size does not match the depth map"));
            }
        }

        let f = self.focal_length_px();
        let (cx, cy) = self.principal_point();
        let half: R = convert(0.5);

        let mut data: Vec<R> = Vec::new();
        for (row, col) in iproduct!(0..depth.nrows(), 0..depth.ncols()) {
            if let Some(mask) = mask {
                if !mask[(row, col)] {
                    continue;
                }
            }
            let du = convert::<f64, R>(col as f64) + half - cx;
            let dv = convert::<f64, R>(row as f64) + half - cy;
            let d = depth[(row, col)];
            let z = match kind {
                DepthKind::Plane => d,
                // similar triangles
                DepthKind::Ray => d * f / (f * f + du * du + dv * dv).sqrt(),
            };
            data.extend_from_slice(&[z * du / f, z * dv / f, z]);
        }

        let npts = data.len() / 3;
        Ok(Points::new(OMatrix::<R, Dyn, U3>::from_row_slice_generic(
            Dyn(npts),
            Const::<3>,
            &data,
        )))
    }

    /// Back-project a depth map to 3D points in the world frame.
    ///
    /// See [`backproject_to_camera`](Self::backproject_to_camera).
    pub fn backproject_to_world(
        &self,
        depth: &DMatrix<R>,
        mask: Option<&DMatrix<bool>>,
        kind: DepthKind,
    ) -> Result<Points<WorldFrame, R, Dyn, Owned<R, Dyn, U3>>, Error> {
        let qt = self.extrinsic_matrix()?;
        let camera = self.backproject_to_camera(depth, mask, kind)?;

        let q_inv = qt.fixed_view::<3, 3>(0, 0).transpose();
        let translation = qt.column(3).into_owned();

        let mut world = camera.data;
        for i in 0..world.nrows() {
            let pt = Vector3::new(world[(i, 0)], world[(i, 1)], world[(i, 2)]);
            let tmp = q_inv * (pt - translation);
            for j in 0..3 {
                world[(i, j)] = tmp[j];
            }
        }
        Ok(Points::new(world))
    }
}
