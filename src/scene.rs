//! The interface to the scene graph that owns the cameras.

use alloc::string::String;

use nalgebra::{geometry::Point3, Matrix4, RealField, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, LensParams, Pose, ProjectionModel, SensorFit};

/// Opaque reference to a camera object in a [`SceneHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraHandle(pub(crate) usize);

impl CameraHandle {
    /// Create a handle from a host specific index.
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the host specific index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl core::fmt::Display for CameraHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "camera#{}", self.0)
    }
}

/// Everything needed to add a camera to a scene.
///
/// Defaults to a 35mm perspective lens on a 32mm wide sensor, sitting at the
/// origin with no rotation.
///
/// ```
/// use scene_cam::*;
/// use nalgebra::{Point3, Vector3};
///
/// let spec = CameraSpec::default()
///     .position(Point3::new(0.0, -10.0, 2.0))
///     .rotation(Vector3::new(1.4, 0.0, 0.0))
///     .name("Main")
///     .focal_length_mm(50.0);
/// assert_eq!(spec.lens.focal_length_mm, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraSpec<R: RealField> {
    /// Location in world units.
    pub location: Point3<R>,
    /// XYZ Euler angles in radians.
    pub rotation_euler: Vector3<R>,
    /// Object name. The host picks a unique name if this is missing or taken.
    pub name: Option<String>,
    /// Lens and sensor parameters.
    pub lens: LensParams<R>,
}

impl<R: RealField + Copy> Default for CameraSpec<R> {
    fn default() -> Self {
        Self {
            location: Point3::origin(),
            rotation_euler: Vector3::zeros(),
            name: None,
            lens: LensParams::default(),
        }
    }
}

impl<R: RealField + Copy> CameraSpec<R> {
    /// Set the location.
    pub fn position(mut self, location: Point3<R>) -> Self {
        self.location = location;
        self
    }

    /// Set the XYZ Euler rotation in radians.
    pub fn rotation(mut self, rotation_euler: Vector3<R>) -> Self {
        self.rotation_euler = rotation_euler;
        self
    }

    /// Set the object name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the projection model.
    pub fn projection_model(mut self, projection_model: ProjectionModel) -> Self {
        self.lens.projection_model = projection_model;
        self
    }

    /// Set the focal length in millimeters.
    pub fn focal_length_mm(mut self, focal_length_mm: R) -> Self {
        self.lens.focal_length_mm = focal_length_mm;
        self
    }

    /// Set the sensor fit and the sensor size along that axis in millimeters.
    pub fn sensor(mut self, sensor_fit: SensorFit, sensor_size_mm: R) -> Self {
        self.lens.sensor_fit = sensor_fit;
        self.lens.sensor_size_mm = sensor_size_mm;
        self
    }

    /// The initial pose described by this spec.
    pub fn pose(&self) -> Pose<R> {
        Pose::from_euler_xyz(self.location, &self.rotation_euler)
    }
}

/// Pose plus per-axis scale of a scene object.
///
/// The world matrix is `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ObjectTransform<R: RealField> {
    /// Position and orientation.
    pub pose: Pose<R>,
    /// Scale along the local axes.
    pub scale: Vector3<R>,
}

impl<R: RealField + Copy> ObjectTransform<R> {
    /// Create a transform with unit scale.
    pub fn new(pose: Pose<R>) -> Self {
        Self {
            pose,
            scale: Vector3::repeat(R::one()),
        }
    }

    /// The 4x4 matrix mapping object-local coordinates to world coordinates.
    pub fn to_homogeneous(&self) -> Matrix4<R> {
        self.pose.isometry().to_homogeneous() * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// A scene graph hosting cameras.
///
/// This is the narrow seam between the camera math and whatever application
/// owns the scene. World matrices may lag behind pose edits until
/// [`flush_updates`](SceneHost::flush_updates) is called.
///
/// Failures originating in the host are reported as [`Error::Host`].
pub trait SceneHost {
    /// Scalar type of the scene coordinates.
    type Real: RealField + Copy;

    /// Add a camera to the scene and make it the active camera.
    fn create_camera(&mut self, spec: &CameraSpec<Self::Real>) -> Result<CameraHandle, Error>;

    /// Return the active camera, if any.
    fn active_camera(&self) -> Option<CameraHandle>;

    /// Return the current pose of a camera.
    fn pose(&self, camera: CameraHandle) -> Result<Pose<Self::Real>, Error>;

    /// Replace the pose of a camera.
    fn set_pose(&mut self, camera: CameraHandle, pose: Pose<Self::Real>) -> Result<(), Error>;

    /// Return the lens parameters of a camera.
    fn lens(&self, camera: CameraHandle) -> Result<LensParams<Self::Real>, Error>;

    /// Return the camera-local to world matrix as last evaluated by the host.
    fn world_matrix(&self, camera: CameraHandle) -> Result<Matrix4<Self::Real>, Error>;

    /// Evaluate all pending transform updates.
    fn flush_updates(&mut self) -> Result<(), Error>;
}
