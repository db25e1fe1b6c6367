#![cfg_attr(not(feature = "std"), no_std)]
#![deny(rust_2018_idioms, unsafe_code, missing_docs)]
#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]

//! # Examples
//!
//! ## Example - camera matrices of a camera in a scene.
//!
//! ```
//! use scene_cam::*;
//! use nalgebra::{Matrix2x3, Point3};
//!
//! // A scene graph. Any type implementing `SceneHost` works here.
//! let scene = InMemoryScene::<f64>::new();
//! let mut projector = CameraProjector::new(scene);
//!
//! // Add a 35mm camera (32mm wide sensor) and aim it at the origin.
//! let spec = CameraSpec::default()
//!     .position(Point3::new(10.0, -10.0, 5.0))
//!     .name("Main");
//! let cam = projector.create_camera(&spec).unwrap();
//! projector.point_camera_at(cam, &Point3::origin()).unwrap();
//!
//! // Compute P = K * Rt for a 1920x1080 render.
//! let matrices = projector.compute_camera_matrix(cam, 1920, 1080).unwrap();
//! let (p, k, rt) = matrices.clone().into_parts();
//! assert_eq!(p, k * rt);
//!
//! // The origin lies on the optical axis.
//! let world_coords = Points::new(Matrix2x3::new(
//!     0.0, 0.0, 0.0, // point 1
//!     1.0, 0.0, 0.0, // point 2
//! ));
//! let pixel_coords = matrices.world_to_pixel(&world_coords);
//! assert!((pixel_coords.data[(0, 0)] - 960.0).abs() < 1e-9);
//! assert!((pixel_coords.data[(0, 1)] - 540.0).abs() < 1e-9);
//! ```
//!
//! ## Example - a look-at camera in 35mm film format.
//!
//! ```
//! use scene_cam::*;
//! use nalgebra::{Point3, RowVector3, Vector3};
//!
//! let view = PerspectiveView::new(50.0, 640, 480).with_view(
//!     Point3::new(0.0, -10.0, 0.0), // location
//!     Point3::new(0.0, 0.0, 0.0),   // look at
//!     Vector3::new(0.0, 0.0, 1.0),  // up
//! );
//! let above = Points::new(RowVector3::new(0.0, 0.0, 1.0));
//! let pix = view.world_to_pixel(&above).unwrap();
//!
//! // Up in the world is up in the image.
//! assert!(pix.data[(0, 1)] < 240.0);
//! ```

#[cfg(feature = "alloc")]
extern crate alloc;

use nalgebra::{Dim, RealField, U2, U3};

#[cfg(feature = "std")]
pub mod test_utils;

mod intrinsics;
pub use intrinsics::{IntrinsicsSpec, LensParams, ProjectionModel, SensorFit};

mod extrinsics;
pub use extrinsics::{extrinsic_matrix, look_at_rotation, Pose};

mod camera;
pub use camera::CameraMatrices;

#[cfg(feature = "alloc")]
pub mod scene;
#[cfg(feature = "alloc")]
pub use scene::{CameraHandle, CameraSpec, ObjectTransform, SceneHost};

#[cfg(feature = "alloc")]
mod memory;
#[cfg(feature = "alloc")]
pub use memory::InMemoryScene;

#[cfg(feature = "alloc")]
mod projector;
#[cfg(feature = "alloc")]
pub use projector::CameraProjector;

#[cfg(feature = "alloc")]
mod view;
#[cfg(feature = "alloc")]
pub use view::{DepthKind, PerspectiveView, FILM_HEIGHT_MM, FILM_WIDTH_MM};

#[cfg(feature = "mitsuba")]
pub mod mitsuba;

/// All possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Degenerate input to a geometric construction, such as looking at the
    /// camera's own position.
    #[error("degenerate geometry")]
    InvalidGeometry,
    /// A world transform is not invertible.
    #[error("world transform is not invertible")]
    DegenerateTransform,
    /// Failure reported by the scene graph host.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Failures reported by a scene graph host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum HostError {
    /// The referenced object does not exist.
    #[cfg(feature = "alloc")]
    #[error("object not found: {0}")]
    ObjectNotFound(CameraHandle),
    /// The host rejected a parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

/// 2D pixel locations on the image sensor.
///
/// This is a newtype wrapping an `nalgebra::Matrix`.
#[derive(Clone)]
pub struct Pixels<R: RealField, NPTS: Dim, STORAGE> {
    /// The matrix storing pixel locations.
    pub data: nalgebra::Matrix<R, NPTS, U2, STORAGE>,
}

impl<R: RealField, NPTS: Dim, STORAGE> Pixels<R, NPTS, STORAGE> {
    /// Create a new Pixels instance
    #[inline]
    pub fn new(data: nalgebra::Matrix<R, NPTS, U2, STORAGE>) -> Self {
        Self { data }
    }
}

/// A coordinate system in which points can be defined.
pub trait CoordinateSystem {}

/// Implementations of [`CoordinateSystem`](trait.CoordinateSystem.html).
pub mod coordinate_system {

    #[cfg(feature = "serde-serialize")]
    use serde::{Deserialize, Serialize};

    /// Coordinates in the camera coordinate system.
    ///
    /// The camera center is at (0,0,0). Which axis the camera looks along
    /// depends on the camera: scene-graph cameras look down -Z with +Y up,
    /// [`PerspectiveView`](crate::PerspectiveView) looks down +Z with -Y up.
    #[derive(Debug, Clone, PartialEq)]
    #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
    pub struct CameraFrame {}
    impl crate::CoordinateSystem for CameraFrame {}

    /// Coordinates in the world coordinate system.
    ///
    /// The camera center is may be located at an arbitrary position and pointed
    /// in an arbitrary direction in this coordinate frame.
    #[derive(Debug, Clone, PartialEq)]
    #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
    pub struct WorldFrame {}
    impl crate::CoordinateSystem for WorldFrame {}
}
pub use coordinate_system::{CameraFrame, WorldFrame};

/// 3D points. Can be in any [`CoordinateSystem`](trait.CoordinateSystem.html).
///
/// This is a newtype wrapping an `nalgebra::Matrix`.
pub struct Points<Coords: CoordinateSystem, R: RealField, NPTS: Dim, STORAGE> {
    coords: core::marker::PhantomData<Coords>,
    /// The matrix storing point locations.
    pub data: nalgebra::Matrix<R, NPTS, U3, STORAGE>,
}

impl<Coords: CoordinateSystem, R: RealField, NPTS: Dim, STORAGE: core::fmt::Debug>
    core::fmt::Debug for Points<Coords, R, NPTS, STORAGE>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Points").field("data", &self.data).finish()
    }
}

impl<Coords, R, NPTS, STORAGE> Points<Coords, R, NPTS, STORAGE>
where
    Coords: CoordinateSystem,
    R: RealField,
    NPTS: Dim,
{
    /// Create a new Points instance from the underlying storage.
    #[inline]
    pub fn new(data: nalgebra::Matrix<R, NPTS, U3, STORAGE>) -> Self {
        Self {
            coords: core::marker::PhantomData,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "std"))]
    compile_error!("tests require std");

    #[test]
    fn host_errors_convert_transparently() {
        let err: Error = HostError::InvalidParameter("scale must be finite").into();
        assert!(matches!(
            err,
            Error::Host(HostError::InvalidParameter("scale must be finite"))
        ));
        assert_eq!(err.to_string(), "invalid parameter: scale must be finite");

        let err: Error = HostError::ObjectNotFound(CameraHandle::new(2)).into();
        assert_eq!(err.to_string(), "object not found: camera#2");
    }

    #[test]
    fn error_messages() {
        assert_eq!(Error::InvalidGeometry.to_string(), "degenerate geometry");
        assert_eq!(
            Error::DegenerateTransform.to_string(),
            "world transform is not invertible"
        );
        assert_eq!(
            Error::InvalidInput("width must be positive").to_string(),
            "invalid input: width must be positive"
        );
    }
}
