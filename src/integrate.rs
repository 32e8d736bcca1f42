//! Velocity and Position Integration
//!
//! Semi-implicit Euler: gravity first, then exponential damping, then the
//! position/orientation update from the already-updated velocities. Each
//! body is advanced independently with no cross-body reads, so the pass is
//! data-parallel; with the `parallel` feature it fans out over Rayon,
//! otherwise it is a plain serial loop. The two paths share one per-body
//! function.

use crate::body::RigidBody;
use crate::math::Vec3;
use crate::store::BodyStore;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Advance one body by `dt` under `gravity`.
///
/// Damping is applied as `v *= exp(-damping·dt)` so its strength is
/// independent of sub-step size. Orientation integrates the quaternion
/// derivative and renormalizes.
#[inline]
fn integrate_body(body: &mut RigidBody, gravity: Vec3, dt: f32) {
    if body.is_static() {
        return;
    }

    body.linear_velocity += gravity * dt;
    body.linear_velocity = body.linear_velocity * (-body.linear_damping * dt).exp();
    body.angular_velocity = body.angular_velocity * (-body.angular_damping * dt).exp();

    body.position += body.linear_velocity * dt;
    body.orientation = body.orientation.integrated(body.angular_velocity, dt);
}

/// Integrate every non-static body in the store.
#[cfg(feature = "parallel")]
pub(crate) fn integrate(store: &mut BodyStore, gravity: Vec3, dt: f32) {
    store.slots_mut().par_iter_mut().for_each(|slot| {
        if let Some(body) = slot.as_mut() {
            integrate_body(body, gravity, dt);
        }
    });
}

/// Integrate every non-static body in the store.
#[cfg(not(feature = "parallel"))]
pub(crate) fn integrate(store: &mut BodyStore, gravity: Vec3, dt: f32) {
    for (_, body) in store.iter_mut() {
        integrate_body(body, gravity, dt);
    }
}
