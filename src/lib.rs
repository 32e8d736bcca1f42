//! # Ember-Physics
//!
//! **CPU Rigid-Body Dynamics for Interactive Scenes**
//!
//! A small impulse-based physics engine: sphere and box primitives over an
//! infinite ground plane, stepped with semi-implicit Euler and resolved by
//! a sequential-impulse contact solver with positional correction.
//!
//! ## Pipeline
//!
//! Each `step(dt)` splits the frame into clamped sub-steps and runs, per
//! sub-step:
//!
//! 1. **Integrate** — gravity, exponential damping, pose update
//! 2. **Detect** — O(n²) narrow phase plus the ground plane
//! 3. **Solve** — iterated normal + Coulomb friction impulses
//! 4. **Correct** — capped positional de-penetration
//!
//! External mutation (impulses, velocity writes, removal, property
//! updates) is queued and drained at the start of the next step, so a
//! world snapshot is always self-consistent.
//!
//! ## Quick Start
//!
//! ```rust
//! use ember_physics::prelude::*;
//!
//! let mut world = PhysicsWorld::default();
//!
//! // A bouncy ball dropped onto the ground plane
//! let ball = BodyDesc::sphere(Vec3::new(0.0, 5.0, 0.0), 0.5, 1.0)
//!     .with_restitution(0.8);
//! world.add_body("ball", &ball).unwrap();
//!
//! // Simulate one second at 60 Hz
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0);
//! }
//!
//! // Export poses for rendering
//! for t in world.transforms() {
//!     println!("{} is at {:?}", t.id, t.position);
//! }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default) — integrate bodies with Rayon
//! - `serde` — serialization derives on descriptions, settings, and
//!   transforms

pub mod body;
pub mod error;
pub mod math;
pub mod store;
pub mod world;

mod collide;
mod integrate;
mod solver;

pub use collide::Contact;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::{BodyDesc, BodyMaterial, ColliderShape, RigidBody, ShapeKind};
    pub use crate::error::PhysicsError;
    pub use crate::math::{Quat, Vec3};
    pub use crate::store::{BodyHandle, BodyStore};
    pub use crate::world::{
        BodyTransform, BodyUpdate, PhysicsWorld, SimulationSettings, MAX_SUB_STEPS,
    };
}

// Re-export main types at crate root
pub use prelude::*;
