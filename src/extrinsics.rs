use nalgebra::geometry::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion};
use nalgebra::{Matrix3, Matrix3x4, Matrix4, RealField, Unit, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Position and orientation of a scene-graph camera.
///
/// The camera looks along its local -Z axis with local +Y pointing up in the
/// image. This is the scene-graph convention, not the computer vision one
/// used by [`PerspectiveView`](crate::PerspectiveView).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Pose<R: RealField> {
    position: Point3<R>,
    rotation: UnitQuaternion<R>,
}

impl<R: RealField + Copy> Pose<R> {
    /// Create a new instance from a position and a rotation.
    pub fn new(position: Point3<R>, rotation: UnitQuaternion<R>) -> Self {
        Self { position, rotation }
    }

    /// Create a new instance from a position and XYZ Euler angles in radians.
    ///
    /// The rotations are applied about the fixed world axes in the order x,
    /// y, z, so the rotation matrix is `Rz * Ry * Rx`.
    pub fn from_euler_xyz(position: Point3<R>, euler: &Vector3<R>) -> Self {
        let rotation = UnitQuaternion::from_euler_angles(euler[0], euler[1], euler[2]);
        Self { position, rotation }
    }

    /// The identity pose, at the origin and looking down -Z.
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Return the position
    #[inline]
    pub fn position(&self) -> &Point3<R> {
        &self.position
    }

    /// Return the rotation
    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<R> {
        &self.rotation
    }

    /// Return the rotation as XYZ Euler angles in radians.
    pub fn euler_xyz(&self) -> Vector3<R> {
        let (x, y, z) = self.rotation.euler_angles();
        Vector3::new(x, y, z)
    }

    /// Return a copy of this pose with a different rotation.
    pub fn with_rotation(&self, rotation: UnitQuaternion<R>) -> Self {
        Self {
            position: self.position,
            rotation,
        }
    }

    /// Rigid transform from camera-local coordinates to world coordinates.
    pub fn isometry(&self) -> Isometry3<R> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    /// Return a unit vector aligned along our look (-Z) direction.
    pub fn forward(&self) -> Unit<Vector3<R>> {
        Unit::new_unchecked(self.rotation * -Vector3::<R>::z())
    }

    /// Return a unit vector aligned along our up (+Y) direction.
    pub fn up(&self) -> Unit<Vector3<R>> {
        Unit::new_unchecked(self.rotation * Vector3::<R>::y())
    }

    /// Return a unit vector aligned along our right (+X) direction.
    pub fn right(&self) -> Unit<Vector3<R>> {
        Unit::new_unchecked(self.rotation * Vector3::<R>::x())
    }

    /// Return the pose rotated so that it looks at `target`.
    ///
    /// See [`look_at_rotation`].
    pub fn looking_at(&self, target: &Point3<R>) -> Result<Self, Error> {
        let rotation = look_at_rotation(&(target - self.position()))?;
        Ok(self.with_rotation(rotation))
    }
}

/// Rotation which points a camera's local -Z axis along `direction`.
///
/// The roll about `direction` is fixed by keeping the local +Y axis as close
/// as possible to world up (+Z): the camera's up vector is world up projected
/// onto the plane perpendicular to `direction`. When `direction` is parallel
/// to world up, world +Y is used as the up reference instead.
///
/// Returns [`Error::InvalidGeometry`] if `direction` has zero length.
pub fn look_at_rotation<R: RealField + Copy>(
    direction: &Vector3<R>,
) -> Result<UnitQuaternion<R>, Error> {
    let eps = R::default_epsilon();
    let forward = Unit::try_new(*direction, eps)
        .ok_or(Error::InvalidGeometry)?
        .into_inner();
    let right = Unit::try_new(forward.cross(&Vector3::<R>::z()), eps)
        .or_else(|| Unit::try_new(forward.cross(&Vector3::<R>::y()), eps))
        .ok_or(Error::InvalidGeometry)?
        .into_inner();
    let up = right.cross(&forward);

    let m = Matrix3::from_columns(&[right, up, -forward]);
    let rotation = Rotation3::from_matrix_unchecked(m);
    Ok(UnitQuaternion::from_rotation_matrix(&rotation))
}

/// Compute the 3x4 world-to-camera matrix from a camera's world transform.
///
/// `world` maps camera-local coordinates to world coordinates. It is
/// inverted and the final homogeneous row dropped. Returns
/// [`Error::DegenerateTransform`] if `world` is not invertible.
pub fn extrinsic_matrix<R: RealField + Copy>(world: &Matrix4<R>) -> Result<Matrix3x4<R>, Error> {
    let inverse = world.try_inverse().ok_or(Error::DegenerateTransform)?;
    if !inverse.iter().all(|x| x.is_finite()) {
        return Err(Error::DegenerateTransform);
    }
    Ok(inverse.fixed_rows::<3>(0).into_owned())
}
