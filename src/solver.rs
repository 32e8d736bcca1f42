//! Sequential-Impulse Contact Solver
//!
//! Velocity-level resolution: a fixed number of Gauss-Seidel passes over
//! the contact list, resolving the normal constraint (with a Baumgarte
//! bias that feeds a fraction of the penetration error back as velocity)
//! and a Coulomb friction constraint clamped by the just-computed normal
//! impulse. A separate position-correction pass then removes residual
//! penetration the velocity solve leaves behind — the bias alone is too
//! soft to keep resting stacks from sinking.
//!
//! Contacts are consumed in detection order; no warm starting.

use crate::body::RigidBody;
use crate::collide::Contact;
use crate::math::Vec3;
use crate::store::BodyStore;

/// Allowed penetration below which no correction is applied.
pub const SLOP: f32 = 0.005;
/// Fraction of positional error fed back per pass.
pub const BAUMGARTE_BIAS: f32 = 0.2;
/// Positional correction cap per sub-step, in world units.
pub const MAX_CORRECTION: f32 = 0.2;

/// Tangential speed below which friction is not applied.
const TANGENT_EPSILON: f32 = 1e-4;

// ============================================================================
// Velocity solve
// ============================================================================

/// One side of a contact: either a live body or the immovable ground.
#[derive(Clone, Copy)]
struct Side {
    inverse_mass: f32,
    inverse_inertia: Vec3,
    r: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
}

impl Side {
    fn of(body: &RigidBody, point: Vec3) -> Self {
        Self {
            inverse_mass: body.inverse_mass,
            inverse_inertia: body.inverse_inertia,
            r: point - body.position,
            velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
        }
    }

    /// Ground sentinel: infinite mass, zero velocity.
    const GROUND: Self = Self {
        inverse_mass: 0.0,
        inverse_inertia: Vec3::ZERO,
        r: Vec3::ZERO,
        velocity: Vec3::ZERO,
        angular_velocity: Vec3::ZERO,
    };

    /// Velocity of the contact point on this side.
    #[inline]
    fn point_velocity(&self) -> Vec3 {
        self.velocity + self.angular_velocity.cross(self.r)
    }

    /// Angular effective-mass term along `dir`.
    #[inline]
    fn angular_term(&self, dir: Vec3) -> f32 {
        let rn = self.r.cross(dir);
        rn.dot(self.inverse_inertia.component_mul(rn))
    }

    /// Accumulate an impulse applied at the contact point.
    #[inline]
    fn apply(&mut self, impulse: Vec3) {
        self.velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.inverse_inertia.component_mul(self.r.cross(impulse));
    }
}

/// Resolve one contact: normal impulse (with restitution and Baumgarte
/// bias), then friction. Writes the updated velocities back to the store.
fn solve_contact(store: &mut BodyStore, contact: &Contact, dt: f32) {
    let Some(body_a) = store.get(contact.body_a) else {
        return;
    };
    let mut a = Side::of(body_a, contact.point);
    let mut b = match contact.body_b {
        Some(hb) => match store.get(hb) {
            Some(body_b) => Side::of(body_b, contact.point),
            None => return,
        },
        None => Side::GROUND,
    };

    let n = contact.normal;

    // Relative velocity of A with respect to B along the normal.
    // n points from B toward A, so approaching contacts have v_n < 0.
    let v_n = (a.point_velocity() - b.point_velocity()).dot(n);
    if v_n >= 0.0 {
        return;
    }

    let k_normal = a.inverse_mass + b.inverse_mass + a.angular_term(n) + b.angular_term(n);
    if k_normal <= f32::EPSILON {
        return;
    }
    let eff_mass = 1.0 / k_normal;

    // Soft penetration recovery: feed a fraction of the error back as
    // velocity so resting contacts do not rely on position correction alone
    let bias = (contact.depth - SLOP).max(0.0) * BAUMGARTE_BIAS / dt;

    let j = (-(1.0 + contact.restitution) * v_n * eff_mass + bias * eff_mass).max(0.0);
    let normal_impulse = n * j;
    a.apply(normal_impulse);
    b.apply(-normal_impulse);

    // Friction against the updated relative velocity
    let rel = a.point_velocity() - b.point_velocity();
    let tangent_vel = rel - n * rel.dot(n);
    let tangent_speed = tangent_vel.length();
    if tangent_speed > TANGENT_EPSILON {
        let t = tangent_vel / tangent_speed;
        let k_tangent = a.inverse_mass + b.inverse_mass + a.angular_term(t) + b.angular_term(t);
        if k_tangent > f32::EPSILON {
            // Impulse that would stop the tangential motion outright
            let jt = -tangent_speed / k_tangent;
            // Stick if within the static cone, otherwise slide with the
            // dynamic coefficient (Coulomb clamp against the normal impulse)
            let jt = if jt.abs() <= contact.static_friction * j {
                jt
            } else {
                -contact.dynamic_friction * j
            };
            let friction_impulse = t * jt;
            a.apply(friction_impulse);
            b.apply(-friction_impulse);
        }
    }

    if let Some(body_a) = store.get_mut(contact.body_a) {
        body_a.linear_velocity = a.velocity;
        body_a.angular_velocity = a.angular_velocity;
    }
    if let Some(hb) = contact.body_b {
        if let Some(body_b) = store.get_mut(hb) {
            body_b.linear_velocity = b.velocity;
            body_b.angular_velocity = b.angular_velocity;
        }
    }
}

/// Run `iterations` Gauss-Seidel passes over the contact list.
pub(crate) fn solve_contacts(
    store: &mut BodyStore,
    contacts: &[Contact],
    iterations: usize,
    dt: f32,
) {
    for _ in 0..iterations.max(1) {
        for contact in contacts {
            solve_contact(store, contact, dt);
        }
    }
}

// ============================================================================
// Position correction
// ============================================================================

/// Remove residual penetration directly in position space.
///
/// Runs once per sub-step after the velocity solve. The correction is
/// capped per contact and split between the two bodies in proportion to
/// inverse mass; velocities are untouched.
pub(crate) fn correct_positions(store: &mut BodyStore, contacts: &[Contact]) {
    for contact in contacts {
        if contact.depth <= SLOP {
            continue;
        }
        let inv_a = store.get(contact.body_a).map_or(0.0, |b| b.inverse_mass);
        let inv_b = contact
            .body_b
            .and_then(|h| store.get(h))
            .map_or(0.0, |b| b.inverse_mass);
        let inv_sum = inv_a + inv_b;
        if inv_sum <= f32::EPSILON {
            continue;
        }

        let magnitude = ((contact.depth - SLOP) * BAUMGARTE_BIAS).min(MAX_CORRECTION);
        let correction = contact.normal * magnitude;

        if inv_a > 0.0 {
            if let Some(body_a) = store.get_mut(contact.body_a) {
                body_a.position += correction * (inv_a / inv_sum);
            }
        }
        if let Some(hb) = contact.body_b {
            if inv_b > 0.0 {
                if let Some(body_b) = store.get_mut(hb) {
                    body_b.position -= correction * (inv_b / inv_sum);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDesc, RigidBody};
    use crate::collide::{detect_contacts, GroundProfile};
    use crate::store::BodyHandle;

    const DT: f32 = 1.0 / 240.0;

    const GROUND: GroundProfile = GroundProfile {
        height: 0.0,
        restitution: 0.0,
        static_friction: 0.6,
        dynamic_friction: 0.4,
    };

    fn insert(store: &mut BodyStore, id: &str, desc: BodyDesc) -> BodyHandle {
        store.insert(id, RigidBody::from_desc(&desc)).unwrap()
    }

    fn contacts_of(store: &BodyStore) -> Vec<Contact> {
        let mut out = Vec::new();
        detect_contacts(store, &GROUND, &mut out);
        out
    }

    #[test]
    fn test_head_on_impulse_conserves_momentum() {
        let mut store = BodyStore::new();
        let ha = insert(
            &mut store,
            "a",
            BodyDesc::sphere(Vec3::new(-0.45, 10.0, 0.0), 0.5, 1.0)
                .with_restitution(0.5)
                .with_linear_velocity(Vec3::new(2.0, 0.0, 0.0)),
        );
        let hb = insert(
            &mut store,
            "b",
            BodyDesc::sphere(Vec3::new(0.45, 10.0, 0.0), 0.5, 3.0)
                .with_restitution(0.5)
                .with_linear_velocity(Vec3::new(-1.0, 0.0, 0.0)),
        );

        let before = store.get(ha).unwrap().linear_velocity * 1.0
            + store.get(hb).unwrap().linear_velocity * 3.0;

        let contacts = contacts_of(&store);
        assert_eq!(contacts.len(), 1);
        solve_contacts(&mut store, &contacts, 8, DT);

        let va = store.get(ha).unwrap().linear_velocity;
        let vb = store.get(hb).unwrap().linear_velocity;
        let after = va * 1.0 + vb * 3.0;
        assert!((before.x - after.x).abs() < 1e-4, "momentum drifted");
        // They must separate after resolution
        assert!(vb.x > va.x);
    }

    #[test]
    fn test_separating_contact_is_skipped() {
        let mut store = BodyStore::new();
        let ha = insert(
            &mut store,
            "a",
            BodyDesc::sphere(Vec3::new(-0.45, 10.0, 0.0), 0.5, 1.0)
                .with_linear_velocity(Vec3::new(-1.0, 0.0, 0.0)),
        );
        let hb = insert(
            &mut store,
            "b",
            BodyDesc::sphere(Vec3::new(0.45, 10.0, 0.0), 0.5, 1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );

        let contacts = contacts_of(&store);
        solve_contacts(&mut store, &contacts, 4, DT);

        // Already-separating velocities stay exactly as they were
        assert_eq!(store.get(ha).unwrap().linear_velocity.x, -1.0);
        assert_eq!(store.get(hb).unwrap().linear_velocity.x, 1.0);
    }

    #[test]
    fn test_ground_contact_reflects_with_restitution() {
        let mut store = BodyStore::new();
        let h = insert(
            &mut store,
            "ball",
            BodyDesc::sphere(Vec3::new(0.0, 0.49, 0.0), 0.5, 1.0)
                .with_restitution(0.8)
                .with_linear_velocity(Vec3::new(0.0, -4.0, 0.0)),
        );

        let contacts = contacts_of(&store);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].body_b.is_none());
        solve_contacts(&mut store, &contacts, 1, DT);

        let vy = store.get(h).unwrap().linear_velocity.y;
        // Combined restitution is min(0.8, ground 0.0) = 0 → velocity is
        // killed (plus a small upward bias from penetration recovery)
        assert!(vy >= 0.0, "still approaching: {vy}");
        assert!(vy < 1.0, "bias too strong: {vy}");
    }

    #[test]
    fn test_friction_stops_slow_slide() {
        let mut store = BodyStore::new();
        let h = insert(
            &mut store,
            "crate",
            BodyDesc::cuboid(Vec3::new(0.0, 0.499, 0.0), Vec3::splat(0.5), 1.0)
                .with_friction(0.8, 0.6)
                .with_linear_velocity(Vec3::new(0.05, -1.0, 0.0)),
        );

        let contacts = contacts_of(&store);
        solve_contacts(&mut store, &contacts, 8, DT);

        let b = store.get(h).unwrap();
        // The normal impulse is large relative to the tangential speed, so
        // static friction zeroes the contact-point velocity (the impulse is
        // applied at the base, so part of the slide becomes rotation)
        let contact_vx = b.linear_velocity.x
            + b.angular_velocity.cross(Vec3::new(0.0, -0.5, 0.0)).x;
        assert!(contact_vx.abs() < 1e-3, "contact still sliding: {contact_vx}");
        assert!(b.linear_velocity.x < 0.05, "slide sped up");
    }

    #[test]
    fn test_dynamic_friction_slows_fast_slide() {
        let mut store = BodyStore::new();
        let h = insert(
            &mut store,
            "crate",
            BodyDesc::cuboid(Vec3::new(0.0, 0.499, 0.0), Vec3::splat(0.5), 1.0)
                .with_friction(0.5, 0.3)
                .with_linear_velocity(Vec3::new(10.0, -1.0, 0.0)),
        );

        let contacts = contacts_of(&store);
        solve_contacts(&mut store, &contacts, 1, DT);

        let v = store.get(h).unwrap().linear_velocity;
        assert!(v.x < 10.0, "friction must slow the slide");
        assert!(v.x > 0.0, "one pass must not reverse a fast slide");
    }

    #[test]
    fn test_position_correction_caps_and_splits() {
        let mut store = BodyStore::new();
        // Two equal spheres deeply interpenetrating along X
        let ha = insert(
            &mut store,
            "a",
            BodyDesc::sphere(Vec3::new(0.1, 10.0, 0.0), 0.5, 1.0),
        );
        let hb = insert(
            &mut store,
            "b",
            BodyDesc::sphere(Vec3::new(-0.1, 10.0, 0.0), 0.5, 1.0),
        );

        let contacts = contacts_of(&store);
        assert_eq!(contacts.len(), 1);
        // depth = 0.8 → (0.8 - slop) * 0.2 ≈ 0.159, below the cap
        correct_positions(&mut store, &contacts);

        let xa = store.get(ha).unwrap().position.x;
        let xb = store.get(hb).unwrap().position.x;
        let moved_a = xa - 0.1;
        let moved_b = -0.1 - xb;
        assert!(moved_a > 0.0 && moved_b > 0.0, "both move apart");
        assert!((moved_a - moved_b).abs() < 1e-6, "equal masses split evenly");
        assert!(moved_a + moved_b <= MAX_CORRECTION + 1e-6);
    }

    #[test]
    fn test_position_correction_ignores_shallow_contacts() {
        let mut store = BodyStore::new();
        let h = insert(
            &mut store,
            "ball",
            BodyDesc::sphere(Vec3::new(0.0, 0.5 - 0.004, 0.0), 0.5, 1.0),
        );
        let contacts = contacts_of(&store);
        assert_eq!(contacts.len(), 1, "inside slop still yields a contact");
        correct_positions(&mut store, &contacts);
        // Penetration below the slop is left alone
        assert!((store.get(h).unwrap().position.y - 0.496).abs() < 1e-6);
    }

    #[test]
    fn test_static_side_takes_no_correction() {
        let mut store = BodyStore::new();
        let hs = insert(
            &mut store,
            "anchor",
            BodyDesc::sphere(Vec3::new(0.0, 10.0, 0.0), 0.5, 1.0).with_static(true),
        );
        let hd = insert(
            &mut store,
            "ball",
            BodyDesc::sphere(Vec3::new(0.6, 10.0, 0.0), 0.5, 1.0),
        );

        let contacts = contacts_of(&store);
        correct_positions(&mut store, &contacts);

        assert_eq!(store.get(hs).unwrap().position.x, 0.0, "static unmoved");
        assert!(store.get(hd).unwrap().position.x > 0.6, "dynamic pushed out");
    }
}
