use nalgebra::{convert, Matrix3, RealField};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// The sensor axis along which the lens is fit to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum SensorFit {
    /// The sensor size is the sensor width and is matched to the image width.
    #[default]
    Horizontal,
    /// The sensor size is the sensor height and is matched to the image height.
    Vertical,
}

/// The projection model of a camera in the scene graph.
///
/// Only the pinhole perspective model has a linear camera matrix. The other
/// models are carried so that cameras can be created with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ProjectionModel {
    /// Pinhole perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
    /// Panoramic projection.
    Panoramic,
}

/// Physical lens and sensor parameters of a camera.
///
/// ```
/// use scene_cam::*;
/// let lens = LensParams::new(35.0, SensorFit::Horizontal, 32.0).unwrap();
/// assert_eq!(lens.projection_model, ProjectionModel::Perspective);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LensParams<R: RealField> {
    /// Focal length in millimeters.
    pub focal_length_mm: R,
    /// Which sensor axis `sensor_size_mm` refers to.
    pub sensor_fit: SensorFit,
    /// Sensor width (horizontal fit) or height (vertical fit) in millimeters.
    pub sensor_size_mm: R,
    /// Projection model of the camera.
    pub projection_model: ProjectionModel,
}

impl<R: RealField + Copy> LensParams<R> {
    /// Create perspective lens parameters, checking that sizes are positive.
    pub fn new(
        focal_length_mm: R,
        sensor_fit: SensorFit,
        sensor_size_mm: R,
    ) -> Result<Self, Error> {
        let lens = Self {
            focal_length_mm,
            sensor_fit,
            sensor_size_mm,
            projection_model: ProjectionModel::Perspective,
        };
        lens.validate()?;
        Ok(lens)
    }

    /// Return a copy using a different projection model.
    pub fn with_projection_model(mut self, projection_model: ProjectionModel) -> Self {
        self.projection_model = projection_model;
        self
    }

    /// Check that focal length and sensor size are positive and finite.
    pub fn validate(&self) -> Result<(), Error> {
        // written so that NaN is rejected too
        if !(self.focal_length_mm > R::zero() && self.focal_length_mm.is_finite()) {
            return Err(Error::InvalidInput("focal length must be positive"));
        }
        if !(self.sensor_size_mm > R::zero() && self.sensor_size_mm.is_finite()) {
            return Err(Error::InvalidInput("sensor size must be positive"));
        }
        Ok(())
    }

    /// Full angle of view, in radians, along the fit axis.
    pub fn angle_of_view(&self) -> R {
        let two: R = convert(2.0);
        two * (self.sensor_size_mm / (two * self.focal_length_mm)).atan()
    }
}

impl<R: RealField + Copy> Default for LensParams<R> {
    fn default() -> Self {
        Self {
            focal_length_mm: convert(35.0),
            sensor_fit: SensorFit::Horizontal,
            sensor_size_mm: convert(32.0),
            projection_model: ProjectionModel::Perspective,
        }
    }
}

/// Lens parameters together with an output image resolution.
///
/// This is everything needed to build the 3x3 intrinsic matrix
/// ```text
/// [[f, 0, w/2],
///  [0, f, h/2],
///  [0, 0,   1]]
/// ```
/// where `f` is the focal length converted to pixels along the fit axis.
/// Pixels are assumed square and the principal point sits at the image
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IntrinsicsSpec<R: RealField> {
    lens: LensParams<R>,
    width: u32,
    height: u32,
}

impl<R: RealField + Copy> IntrinsicsSpec<R> {
    /// Create a new instance.
    ///
    /// Returns [`Error::InvalidInput`] if the image has a zero dimension or
    /// the lens parameters are not positive.
    pub fn new(lens: LensParams<R>, width: u32, height: u32) -> Result<Self, Error> {
        lens.validate()?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("image width and height must be positive"));
        }
        Ok(Self {
            lens,
            width,
            height,
        })
    }

    /// Get the lens parameters
    #[inline]
    pub fn lens(&self) -> &LensParams<R> {
        &self.lens
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

    /// Focal length in pixels.
    ///
    /// The focal length in millimeters is scaled by the ratio of the image
    /// resolution to the sensor size, both taken along the fit axis.
    pub fn focal_length_px(&self) -> R {
        let pixels = match self.lens.sensor_fit {
            SensorFit::Horizontal => self.width,
            SensorFit::Vertical => self.height,
        };
        let pixels: R = convert(f64::from(pixels));
        self.lens.focal_length_mm * (pixels / self.lens.sensor_size_mm)
    }

    /// Principal point `(cx, cy)`, the image center.
    pub fn principal_point(&self) -> (R, R) {
        let half: R = convert(0.5);
        (
            convert::<f64, R>(f64::from(self.width)) * half,
            convert::<f64, R>(f64::from(self.height)) * half,
        )
    }

    /// Create the 3x3 intrinsic matrix.
    pub fn intrinsic_matrix(&self) -> Matrix3<R> {
        let f = self.focal_length_px();
        let (cx, cy) = self.principal_point();
        let zero = R::zero();
        #[rustfmt::skip]
        let k = Matrix3::new(
            f,    zero, cx,
            zero, f,    cy,
            zero, zero, R::one(),
        );
        k
    }
}
