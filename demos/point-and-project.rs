//! Add a camera to a scene, aim it at a cube and print the projected corners.

use nalgebra::{Point3, SMatrix, Vector3};
use scene_cam::*;

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut projector = CameraProjector::new(InMemoryScene::<f64>::new());

    // 35mm lens on a 32mm wide sensor, rotated arbitrarily to begin with.
    let spec = CameraSpec::default()
        .position(Point3::new(7.0, -6.0, 5.0))
        .rotation(Vector3::new(1.1, 0.0, 0.8))
        .name("Camera");
    let cam = projector.create_camera(&spec)?;
    let lens = projector.host().lens(cam)?;
    println!(
        "horizontal angle of view: {:.1} deg",
        lens.angle_of_view().to_degrees()
    );

    // Aim at the center of the cube.
    projector.point_camera_at(cam, &Point3::new(0.0, 0.0, 0.5))?;

    let (width, height) = (1920, 1080);
    let matrices = projector.compute_camera_matrix(cam, width, height)?;
    println!("K = {}", matrices.intrinsics());
    println!("Rt = {}", matrices.extrinsics());
    println!("P = {}", matrices.projection());
    println!("camera center: {}", matrices.camera_center());

    #[rustfmt::skip]
    let corners = Points::new(SMatrix::<f64, 8, 3>::from_row_slice(&[
        -0.5, -0.5, 0.0,
         0.5, -0.5, 0.0,
         0.5,  0.5, 0.0,
        -0.5,  0.5, 0.0,
        -0.5, -0.5, 1.0,
         0.5, -0.5, 1.0,
         0.5,  0.5, 1.0,
        -0.5,  0.5, 1.0,
    ]));

    let pixels = matrices.world_to_pixel(&corners);
    for i in 0..corners.data.nrows() {
        let wc = corners.data.row(i);
        let pix = pixels.data.row(i);
        println!("{} -> {}", wc, pix);
    }
    Ok(())
}
