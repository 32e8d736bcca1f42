//! Bouncing Ball Example
//!
//! Demonstrates creating a physics world, adding rigid bodies,
//! and stepping the simulation.
//!
//! ```bash
//! cargo run --example bouncing_ball
//! ```

use ember_physics::prelude::*;

fn main() {
    let mut world = PhysicsWorld::default();

    // Static platform, top face at y = 1
    let platform = BodyDesc::cuboid(
        Vec3::new(3.0, 0.5, 0.0),
        Vec3::new(2.0, 0.5, 2.0),
        0.0,
    )
    .with_static(true);
    world.add_body("platform", &platform).unwrap();

    // A bouncy ball dropped onto the ground plane
    let ball = BodyDesc::sphere(Vec3::new(0.0, 10.0, 0.0), 0.5, 1.0)
        .with_restitution(0.8);
    world.add_body("ball", &ball).unwrap();

    // A heavier crate dropped onto the platform
    let crate_desc = BodyDesc::cuboid(Vec3::new(3.0, 6.0, 0.0), Vec3::splat(0.5), 2.0)
        .with_restitution(0.1)
        .with_friction(0.8, 0.6);
    world.add_body("crate", &crate_desc).unwrap();

    println!("Ember-Physics Bouncing Ball Example");
    println!("===================================");
    println!("Bodies: {}", world.body_count());
    println!();

    // Simulate 4 seconds at 60 FPS
    for frame in 0..240 {
        world.step(1.0 / 60.0);

        if frame % 20 == 0 {
            let ball_y = world.body("ball").unwrap().position.y;
            let crate_y = world.body("crate").unwrap().position.y;
            println!("Frame {frame:3}: ball y={ball_y:7.4}  crate y={crate_y:7.4}");
        }
    }

    println!();
    for t in world.transforms() {
        println!(
            "{:>8}: position ({:.3}, {:.3}, {:.3})",
            t.id, t.position.x, t.position.y, t.position.z
        );
    }
    println!("Simulation complete (240 frames, 4 seconds).");
}
