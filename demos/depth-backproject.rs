//! Back-project a synthetic depth map of a tilted plane to world points.

use nalgebra::{DMatrix, Point3, Vector3};
use scene_cam::*;

fn main() -> Result<(), Error> {
    env_logger::init();

    let view = PerspectiveView::new(50.0, 320, 240).with_view(
        Point3::new(0.0, -8.0, 3.0), // location
        Point3::new(0.0, 0.0, 0.0),  // look at
        Vector3::new(0.0, 0.0, 1.0), // up
    );

    let (v, h) = view.angle_of_view();
    println!("angle of view: {:.2} x {:.2} degrees", h, v);
    println!("focal length: {:.2} px", view.focal_length_px());

    let depth = DMatrix::from_fn(240, 320, |row, col| {
        8.0 + 0.01 * row as f64 - 0.005 * col as f64
    });
    // only the central region
    let mask = DMatrix::from_fn(240, 320, |row, col| {
        (60..180).contains(&row) && (80..240).contains(&col)
    });

    let world = view.backproject_to_world(&depth, Some(&mask), DepthKind::Plane)?;
    println!("{} points", world.data.nrows());

    let mut min = Vector3::repeat(f64::INFINITY);
    let mut max = Vector3::repeat(f64::NEG_INFINITY);
    for row in world.data.row_iter() {
        let pt = row.transpose();
        min = min.inf(&pt);
        max = max.sup(&pt);
    }
    println!("bounding box: {} .. {}", min.transpose(), max.transpose());

    // Reproject and check we land on the pixel centers again.
    let pixels = view.world_to_pixel(&world)?;
    println!(
        "first point {} reprojects to {}",
        world.data.row(0),
        pixels.data.row(0)
    );
    Ok(())
}
