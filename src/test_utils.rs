//! Utilities for testing `scene_cam` implementations.
use nalgebra::{base::VecStorage, convert, Dyn, RealField, U2};

use crate::Pixels;

/// Generate the centers of a grid of pixels in row-major order.
///
/// Every `step`-th pixel is used, skipping `border` pixels on each side. The
/// center of pixel `(row, col)` is `(col + 0.5, row + 0.5)`, which is where
/// [`PerspectiveView`](crate::PerspectiveView) back-projects depth samples.
pub fn pixel_centers<R: RealField + Copy>(
    width: usize,
    height: usize,
    step: usize,
    border: usize,
) -> Pixels<R, Dyn, VecStorage<R, Dyn, U2>> {
    let half: R = convert(0.5);
    let mut uv_raws: Vec<[R; 2]> = Vec::new();
    for row in num_iter::range_step(border, height - border, step) {
        for col in num_iter::range_step(border, width - border, step) {
            uv_raws.push([
                convert::<f64, R>(col as f64) + half,
                convert::<f64, R>(row as f64) + half,
            ]);
        }
    }

    let mut data = nalgebra::OMatrix::<R, Dyn, U2>::from_element(uv_raws.len(), R::zero());
    for (i, uv) in uv_raws.iter().enumerate() {
        for j in 0..2 {
            data[(i, j)] = uv[j];
        }
    }
    Pixels::new(data)
}
