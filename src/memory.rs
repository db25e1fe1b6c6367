//! An in-memory scene graph.

use alloc::{format, string::String, vec::Vec};

use nalgebra::{Matrix4, RealField, Vector3};

use crate::{
    scene::{CameraHandle, CameraSpec, ObjectTransform, SceneHost},
    Error, HostError, LensParams, Pose,
};

const DEFAULT_CAMERA_NAME: &str = "Camera";

#[derive(Debug, Clone)]
struct SceneObject<R: RealField> {
    name: String,
    transform: ObjectTransform<R>,
    lens: LensParams<R>,
    matrix_world: Matrix4<R>,
    dirty: bool,
}

/// A scene graph held in memory.
///
/// Like a real host application it evaluates world matrices lazily: editing
/// a pose or scale only marks the object as dirty, and
/// [`world_matrix`](SceneHost::world_matrix) keeps returning the previously
/// evaluated matrix until [`flush_updates`](SceneHost::flush_updates) runs.
/// Newly created objects report the identity world matrix until flushed.
///
/// Object names are unique. A missing or taken name is replaced by the first
/// free one of `name`, `name.001`, `name.002` and so on.
#[derive(Debug, Clone)]
pub struct InMemoryScene<R: RealField> {
    objects: Vec<SceneObject<R>>,
    active: Option<CameraHandle>,
}

impl<R: RealField + Copy> Default for InMemoryScene<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RealField + Copy> InMemoryScene<R> {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            active: None,
        }
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Look up a camera by name.
    pub fn find(&self, name: &str) -> Option<CameraHandle> {
        self.objects
            .iter()
            .position(|obj| obj.name == name)
            .map(CameraHandle)
    }

    /// Return the name of a camera.
    pub fn name(&self, camera: CameraHandle) -> Result<&str, Error> {
        Ok(&self.object(camera)?.name)
    }

    /// Return the transform of a camera, including scale.
    pub fn transform(&self, camera: CameraHandle) -> Result<ObjectTransform<R>, Error> {
        Ok(self.object(camera)?.transform)
    }

    /// Set the per-axis scale of a camera.
    pub fn set_scale(&mut self, camera: CameraHandle, scale: Vector3<R>) -> Result<(), Error> {
        if !scale.iter().all(|x| x.is_finite()) {
            return Err(HostError::InvalidParameter("scale must be finite").into());
        }
        let obj = self.object_mut(camera)?;
        obj.transform.scale = scale;
        obj.dirty = true;
        Ok(())
    }

    /// Whether any object has edits not yet reflected in its world matrix.
    pub fn has_pending_updates(&self) -> bool {
        self.objects.iter().any(|obj| obj.dirty)
    }

    fn object(&self, camera: CameraHandle) -> Result<&SceneObject<R>, Error> {
        self.objects
            .get(camera.index())
            .ok_or_else(|| HostError::ObjectNotFound(camera).into())
    }

    fn object_mut(&mut self, camera: CameraHandle) -> Result<&mut SceneObject<R>, Error> {
        self.objects
            .get_mut(camera.index())
            .ok_or_else(|| HostError::ObjectNotFound(camera).into())
    }

    fn is_taken(&self, name: &str) -> bool {
        self.objects.iter().any(|obj| obj.name == name)
    }

    fn unique_name(&self, requested: Option<&str>) -> String {
        let base = match requested {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_CAMERA_NAME,
        };
        if !self.is_taken(base) {
            return String::from(base);
        }
        (1..)
            .map(|i| format!("{}.{:03}", base, i))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or_else(|| String::from(base))
    }
}

fn is_finite_pose<R: RealField + Copy>(pose: &Pose<R>) -> bool {
    pose.position().iter().all(|x| x.is_finite())
        && pose.rotation().coords.iter().all(|x| x.is_finite())
}

impl<R: RealField + Copy> SceneHost for InMemoryScene<R> {
    type Real = R;

    fn create_camera(&mut self, spec: &CameraSpec<R>) -> Result<CameraHandle, Error> {
        let pose = spec.pose();
        if !is_finite_pose(&pose) {
            return Err(HostError::InvalidParameter("camera pose must be finite").into());
        }
        let name = self.unique_name(spec.name.as_deref());
        let handle = CameraHandle(self.objects.len());
        self.objects.push(SceneObject {
            name,
            transform: ObjectTransform::new(pose),
            lens: spec.lens,
            matrix_world: Matrix4::identity(),
            dirty: true,
        });
        self.active = Some(handle);
        Ok(handle)
    }

    fn active_camera(&self) -> Option<CameraHandle> {
        self.active
    }

    fn pose(&self, camera: CameraHandle) -> Result<Pose<R>, Error> {
        Ok(self.object(camera)?.transform.pose)
    }

    fn set_pose(&mut self, camera: CameraHandle, pose: Pose<R>) -> Result<(), Error> {
        if !is_finite_pose(&pose) {
            return Err(HostError::InvalidParameter("camera pose must be finite").into());
        }
        let obj = self.object_mut(camera)?;
        obj.transform.pose = pose;
        obj.dirty = true;
        Ok(())
    }

    fn lens(&self, camera: CameraHandle) -> Result<LensParams<R>, Error> {
        Ok(self.object(camera)?.lens)
    }

    fn world_matrix(&self, camera: CameraHandle) -> Result<Matrix4<R>, Error> {
        Ok(self.object(camera)?.matrix_world)
    }

    fn flush_updates(&mut self) -> Result<(), Error> {
        let mut updated = 0usize;
        for obj in self.objects.iter_mut().filter(|obj| obj.dirty) {
            obj.matrix_world = obj.transform.to_homogeneous();
            obj.dirty = false;
            updated += 1;
        }
        log::debug!("scene update evaluated {} object(s)", updated);
        Ok(())
    }
}
