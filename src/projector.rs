use nalgebra::geometry::Point3;

use crate::{
    extrinsics::{extrinsic_matrix, look_at_rotation},
    scene::{CameraHandle, CameraSpec, SceneHost},
    CameraMatrices, Error, IntrinsicsSpec, Pose, ProjectionModel,
};

/// Creates, points and computes camera matrices for cameras in a scene.
///
/// # Examples
///
/// ```
/// use scene_cam::*;
/// use nalgebra::Point3;
///
/// let mut projector = CameraProjector::new(InMemoryScene::<f64>::new());
///
/// let spec = CameraSpec::default().position(Point3::new(10.0, -10.0, 5.0));
/// let cam = projector.create_camera(&spec).unwrap();
/// projector.point_camera_at(cam, &Point3::origin()).unwrap();
///
/// let matrices = projector.compute_camera_matrix(cam, 1920, 1080).unwrap();
/// assert_eq!(matrices.intrinsics()[(0, 0)], 2100.0);
/// ```
#[derive(Debug, Clone)]
pub struct CameraProjector<H> {
    host: H,
}

impl<H: SceneHost> CameraProjector<H> {
    /// Create a projector working on the given scene.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Return a reference to the scene.
    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Return a mutable reference to the scene.
    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the scene back.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Add a camera to the scene and make it the active camera.
    ///
    /// Returns [`Error::InvalidInput`] for a non-positive focal length or
    /// sensor size. Errors from the scene are passed through.
    pub fn create_camera(&mut self, spec: &CameraSpec<H::Real>) -> Result<CameraHandle, Error> {
        spec.lens.validate()?;
        let camera = self.host.create_camera(spec)?;
        log::info!(
            "{}: added {:?} camera at {}",
            camera,
            spec.lens.projection_model,
            spec.location
        );
        Ok(camera)
    }

    /// Return the current pose of a camera.
    pub fn camera_pose(&self, camera: CameraHandle) -> Result<Pose<H::Real>, Error> {
        self.host.pose(camera)
    }

    /// Rotate a camera in place so that it looks at `target`.
    ///
    /// The camera's -Z axis is pointed at the target and its +Y axis kept as
    /// close to world up (+Z) as possible; see
    /// [`look_at_rotation`](crate::look_at_rotation). The position is left
    /// unchanged.
    ///
    /// Returns [`Error::InvalidGeometry`] if the target is the camera position.
    pub fn point_camera_at(
        &mut self,
        camera: CameraHandle,
        target: &Point3<H::Real>,
    ) -> Result<(), Error> {
        let pose = self.host.pose(camera)?;
        let rotation = look_at_rotation(&(target - pose.position()))?;
        self.host.set_pose(camera, pose.with_rotation(rotation))?;
        log::info!("{}: pointed at {}", camera, target);
        Ok(())
    }

    /// Compute `(P, K, Rt)` for rendering `camera` at `width` x `height`.
    ///
    /// Pending scene updates are flushed first so that the world matrix
    /// reflects the current pose. `Rt` maps world coordinates into the
    /// camera's local frame, in which the camera looks down -Z with +Y up.
    ///
    /// Returns [`Error::InvalidInput`] for a zero width or height and
    /// [`Error::DegenerateTransform`] if the world matrix cannot be inverted.
    pub fn compute_camera_matrix(
        &mut self,
        camera: CameraHandle,
        width: u32,
        height: u32,
    ) -> Result<CameraMatrices<H::Real>, Error> {
        self.host.flush_updates()?;

        let lens = self.host.lens(camera)?;
        if lens.projection_model != ProjectionModel::Perspective {
            log::warn!(
                "{}: intrinsic matrix assumes a pinhole model but the camera is {:?}",
                camera,
                lens.projection_model
            );
        }
        let intrinsics = IntrinsicsSpec::new(lens, width, height)?.intrinsic_matrix();

        let world = self.host.world_matrix(camera)?;
        let extrinsics = extrinsic_matrix(&world)?;

        let matrices = CameraMatrices::compose(intrinsics, extrinsics);
        log::info!("{}: computed camera matrix for {}x{}", camera, width, height);
        Ok(matrices)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Matrix2x3, Point3, Vector3};

    use super::*;
    use crate::{HostError, InMemoryScene, Points, SensorFit};

    fn projector() -> CameraProjector<InMemoryScene<f64>> {
        CameraProjector::new(InMemoryScene::new())
    }

    #[test]
    fn create_registers_active_camera() {
        let mut p = projector();
        let spec = CameraSpec::default()
            .position(Point3::new(1.0, 2.0, 3.0))
            .rotation(Vector3::new(0.1, 0.2, 0.3))
            .name("Cam")
            .projection_model(ProjectionModel::Orthographic)
            .sensor(SensorFit::Vertical, 24.0);
        let cam = p.create_camera(&spec).unwrap();

        assert_eq!(p.host().active_camera(), Some(cam));
        assert_eq!(p.host().name(cam).unwrap(), "Cam");
        assert_eq!(p.camera_pose(cam).unwrap(), spec.pose());
        let lens = p.host().lens(cam).unwrap();
        assert_eq!(lens.sensor_fit, SensorFit::Vertical);
        assert_eq!(lens.sensor_size_mm, 24.0);
        assert_eq!(lens.projection_model, ProjectionModel::Orthographic);
    }

    #[test]
    fn create_rejects_bad_lens() {
        let mut p = projector();
        let spec = CameraSpec::default().focal_length_mm(0.0);
        assert!(matches!(
            p.create_camera(&spec),
            Err(Error::InvalidInput(_))
        ));
        assert!(p.host().is_empty());
    }

    #[test]
    fn intrinsics_scale_with_fit_axis() {
        let mut p = projector();
        let cam = p.create_camera(&CameraSpec::default()).unwrap();
        let m = p.compute_camera_matrix(cam, 1920, 1080).unwrap();
        let k = m.intrinsics();
        assert_eq!(k[(0, 0)], 2100.0);
        assert_eq!(k[(1, 1)], 2100.0);
        assert_eq!(k[(0, 2)], 960.0);
        assert_eq!(k[(1, 2)], 540.0);

        let spec = CameraSpec::default()
            .focal_length_mm(50.0)
            .sensor(SensorFit::Vertical, 24.0);
        let cam = p.create_camera(&spec).unwrap();
        let m = p.compute_camera_matrix(cam, 640, 480).unwrap();
        approx::assert_relative_eq!(m.intrinsics()[(0, 0)], 1000.0, epsilon = 1e-10);
    }

    #[test]
    fn matrices_compose() {
        let mut p = projector();
        let spec = CameraSpec::default()
            .position(Point3::new(4.0, -2.0, 1.5))
            .rotation(Vector3::new(1.1, 0.2, -0.7));
        let cam = p.create_camera(&spec).unwrap();
        let m = p.compute_camera_matrix(cam, 800, 600).unwrap();

        let expected_rt = spec
            .pose()
            .isometry()
            .to_homogeneous()
            .try_inverse()
            .unwrap()
            .fixed_rows::<3>(0)
            .into_owned();
        approx::assert_abs_diff_eq!(*m.extrinsics(), expected_rt, epsilon = 1e-12);
        assert_eq!(*m.projection(), m.intrinsics() * m.extrinsics());
    }

    #[test]
    fn point_at_then_compute_uses_fresh_transform() {
        let mut p = projector();
        let position = Point3::new(10.0, -10.0, 5.0);
        let target = Point3::new(1.0, 2.0, 0.5);
        let cam = p
            .create_camera(&CameraSpec::default().position(position))
            .unwrap();
        p.compute_camera_matrix(cam, 640, 480).unwrap();

        p.point_camera_at(cam, &target).unwrap();
        let pose = p.camera_pose(cam).unwrap();
        assert_eq!(*pose.position(), position);

        let dir = (target - position).normalize();
        let forward = pose.forward();
        approx::assert_abs_diff_eq!(forward.cross(&dir).norm(), 0.0, epsilon = 1e-12);
        assert!(forward.dot(&dir) > 0.0);

        let m = p.compute_camera_matrix(cam, 640, 480).unwrap();

        // The target lies on the optical axis, in front of the camera (-Z),
        // so it projects to the principal point.
        let target_cam = m.extrinsics() * target.to_homogeneous();
        approx::assert_abs_diff_eq!(target_cam[0], 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(target_cam[1], 0.0, epsilon = 1e-9);
        assert!(target_cam[2] < 0.0);

        let world = Points::new(Matrix2x3::new(
            target.x, target.y, target.z, // target
            target.x, target.y, target.z, // again
        ));
        let pixels = m.world_to_pixel(&world);
        approx::assert_abs_diff_eq!(pixels.data[(0, 0)], 320.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(pixels.data[(0, 1)], 240.0, epsilon = 1e-9);
    }

    #[test]
    fn point_at_own_position_fails() {
        let mut p = projector();
        let position = Point3::new(1.0, 2.0, 3.0);
        let cam = p
            .create_camera(&CameraSpec::default().position(position))
            .unwrap();
        let before = p.camera_pose(cam).unwrap();
        assert!(matches!(
            p.point_camera_at(cam, &position),
            Err(Error::InvalidGeometry)
        ));
        assert_eq!(p.camera_pose(cam).unwrap(), before);
    }

    #[test]
    fn compute_is_deterministic() {
        let mut p = projector();
        let spec = CameraSpec::default()
            .position(Point3::new(0.3, 7.0, -2.0))
            .rotation(Vector3::new(-0.4, 0.9, 2.5));
        let cam = p.create_camera(&spec).unwrap();
        let a = p.compute_camera_matrix(cam, 1024, 768).unwrap();
        let b = p.compute_camera_matrix(cam, 1024, 768).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_scale_is_degenerate() {
        let mut p = projector();
        let cam = p.create_camera(&CameraSpec::default()).unwrap();
        p.host_mut()
            .set_scale(cam, Vector3::new(1.0, 1.0, 0.0))
            .unwrap();
        assert!(matches!(
            p.compute_camera_matrix(cam, 640, 480),
            Err(Error::DegenerateTransform)
        ));
    }

    #[test]
    fn zero_resolution_is_invalid() {
        let mut p = projector();
        let cam = p.create_camera(&CameraSpec::default()).unwrap();
        assert!(matches!(
            p.compute_camera_matrix(cam, 0, 480),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn host_errors_pass_through() {
        let mut p = projector();
        let missing = CameraHandle::new(3);
        assert!(matches!(
            p.compute_camera_matrix(missing, 640, 480),
            Err(Error::Host(HostError::ObjectNotFound(_)))
        ));
        assert!(matches!(
            p.point_camera_at(missing, &Point3::origin()),
            Err(Error::Host(HostError::ObjectNotFound(_)))
        ));
        assert!(matches!(
            p.camera_pose(missing),
            Err(Error::Host(HostError::ObjectNotFound(_)))
        ));
    }
}
