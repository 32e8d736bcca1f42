//! Narrow-Phase Collision Detection
//!
//! Produces the contact list for one sub-step: every non-static body is
//! tested against the infinite ground plane, and every unordered body pair
//! with at least one non-static member is dispatched to a shape-pair test.
//! Dispatch is a `match` over the closed shape enum; there is no broad
//! phase — pairwise O(n²) is the accepted cost for the body counts this
//! CPU path serves.
//!
//! # Contact convention
//!
//! The normal is unit length and points from B toward A. Ground contacts
//! use `body_b = None`; the ground is a sentinel, not a body.

use crate::body::{ColliderShape, RigidBody};
use crate::math::{Vec3, NORMALIZE_EPSILON};
use crate::store::{BodyHandle, BodyStore};

// ============================================================================
// Contact
// ============================================================================

/// A single contact point, rebuilt from scratch every sub-step.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// First body (never the ground)
    pub body_a: BodyHandle,
    /// Second body; `None` means the infinite ground plane
    pub body_b: Option<BodyHandle>,
    /// Unit normal pointing from B toward A
    pub normal: Vec3,
    /// Penetration depth, non-negative
    pub depth: f32,
    /// World-space contact point
    pub point: Vec3,
    /// Combined restitution: `min(eA, eB)`
    pub restitution: f32,
    /// Combined static friction: `sqrt(sA·sB)`
    pub static_friction: f32,
    /// Combined dynamic friction: `sqrt(dA·dB)`
    pub dynamic_friction: f32,
}

/// Ground plane parameters, lifted out of the simulation settings.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GroundProfile {
    /// Height of the plane along world-up
    pub height: f32,
    /// Ground restitution
    pub restitution: f32,
    /// Ground static friction
    pub static_friction: f32,
    /// Ground dynamic friction
    pub dynamic_friction: f32,
}

// ============================================================================
// Shape-pair tests
// ============================================================================

/// Geometric overlap result: (normal toward the first argument, depth,
/// world contact point).
type Overlap = (Vec3, f32, Vec3);

/// Sphere vs. sphere. Coincident centers fall back to a world-up normal.
fn sphere_sphere(pa: Vec3, ra: f32, pb: Vec3, rb: f32) -> Option<Overlap> {
    let delta = pa - pb;
    let dist = delta.length();
    let sum = ra + rb;
    if dist >= sum {
        return None;
    }
    let normal = delta.normalize_or(Vec3::UNIT_Y);
    let depth = sum - dist;
    // Midpoint of the two surface points along the contact normal
    let point = ((pa - normal * ra) + (pb + normal * rb)) * 0.5;
    Some((normal, depth, point))
}

/// AABB vs. AABB separating-axis test. On overlap the axis of minimum
/// penetration becomes the normal; ties resolve in X, Y, Z order.
fn aabb_aabb(pa: Vec3, ha: Vec3, pb: Vec3, hb: Vec3) -> Option<Overlap> {
    let delta = pa - pb;
    let overlap = Vec3::new(
        ha.x + hb.x - delta.x.abs(),
        ha.y + hb.y - delta.y.abs(),
        ha.z + hb.z - delta.z.abs(),
    );
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }

    let (axis, depth, sign) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        (Vec3::UNIT_X, overlap.x, delta.x)
    } else if overlap.y <= overlap.z {
        (Vec3::UNIT_Y, overlap.y, delta.y)
    } else {
        (Vec3::UNIT_Z, overlap.z, delta.z)
    };
    let normal = if sign >= 0.0 { axis } else { -axis };

    // Midpoint of the overlap region
    let lo = (pa - ha).clamp(pb - hb, pb + hb);
    let hi = (pa + ha).clamp(pb - hb, pb + hb);
    let point = (lo + hi) * 0.5;

    Some((normal, depth, point))
}

/// Sphere vs. AABB via the clamped closest point. Returns the normal
/// pointing toward the sphere. A sphere center inside the box falls back
/// to the axis of least penetration to the nearest face.
fn sphere_aabb(center: Vec3, radius: f32, pb: Vec3, hb: Vec3) -> Option<Overlap> {
    let min = pb - hb;
    let max = pb + hb;
    let closest = center.clamp(min, max);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > radius * radius {
        return None;
    }

    if dist_sq > NORMALIZE_EPSILON * NORMALIZE_EPSILON {
        // Center outside the box: push along closest-point direction
        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        return Some((normal, radius - dist, closest));
    }

    // Center inside the box: exit through the least-penetrated face
    let face_pens = [
        (max.x - center.x, Vec3::UNIT_X),
        (center.x - min.x, -Vec3::UNIT_X),
        (max.y - center.y, Vec3::UNIT_Y),
        (center.y - min.y, -Vec3::UNIT_Y),
        (max.z - center.z, Vec3::UNIT_Z),
        (center.z - min.z, -Vec3::UNIT_Z),
    ];
    let (pen, normal) = face_pens
        .iter()
        .copied()
        .fold(face_pens[0], |best, cur| if cur.0 < best.0 { cur } else { best });

    Some((normal, pen + radius, center + normal * pen))
}

/// Dispatch an unordered body pair to its shape-pair test.
///
/// The returned normal points from `b` toward `a`.
fn pair_overlap(a: &RigidBody, b: &RigidBody) -> Option<Overlap> {
    match (a.shape, b.shape) {
        (ColliderShape::Sphere { radius: ra }, ColliderShape::Sphere { radius: rb }) => {
            sphere_sphere(a.position, ra, b.position, rb)
        }
        (ColliderShape::Aabb { half_extents: ha }, ColliderShape::Aabb { half_extents: hb }) => {
            aabb_aabb(a.position, ha, b.position, hb)
        }
        (ColliderShape::Sphere { radius }, ColliderShape::Aabb { half_extents }) => {
            sphere_aabb(a.position, radius, b.position, half_extents)
        }
        (ColliderShape::Aabb { half_extents }, ColliderShape::Sphere { radius }) => {
            // Test with the sphere first, then flip the normal toward A
            sphere_aabb(b.position, radius, a.position, half_extents)
                .map(|(n, depth, point)| (-n, depth, point))
        }
    }
}

// ============================================================================
// Contact generation
// ============================================================================

/// Combined restitution per the minimum rule.
#[inline]
fn combine_restitution(a: f32, b: f32) -> f32 {
    a.min(b)
}

/// Combined friction per the geometric-mean rule.
#[inline]
fn combine_friction(a: f32, b: f32) -> f32 {
    (a * b).max(0.0).sqrt()
}

/// Rebuild the full contact list for this sub-step.
pub(crate) fn detect_contacts(store: &BodyStore, ground: &GroundProfile, out: &mut Vec<Contact>) {
    out.clear();

    // Ground plane: every non-static body whose lowest point is below it
    for (handle, body) in store.iter() {
        if body.is_static() {
            continue;
        }
        let lowest = body.lowest_point();
        if lowest < ground.height {
            out.push(Contact {
                body_a: handle,
                body_b: None,
                normal: Vec3::UNIT_Y,
                depth: ground.height - lowest,
                point: Vec3::new(body.position.x, lowest, body.position.z),
                restitution: combine_restitution(body.restitution, ground.restitution),
                static_friction: combine_friction(body.static_friction, ground.static_friction),
                dynamic_friction: combine_friction(body.dynamic_friction, ground.dynamic_friction),
            });
        }
    }

    // Body pairs: unordered, skipping pairs where both sides are static
    let bodies: Vec<(BodyHandle, &RigidBody)> = store.iter().collect();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (ha, a) = bodies[i];
            let (hb, b) = bodies[j];
            if a.is_static() && b.is_static() {
                continue;
            }
            if let Some((normal, depth, point)) = pair_overlap(a, b) {
                out.push(Contact {
                    body_a: ha,
                    body_b: Some(hb),
                    normal,
                    depth,
                    point,
                    restitution: combine_restitution(a.restitution, b.restitution),
                    static_friction: combine_friction(a.static_friction, b.static_friction),
                    dynamic_friction: combine_friction(a.dynamic_friction, b.dynamic_friction),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyDesc;

    const GROUND: GroundProfile = GroundProfile {
        height: 0.0,
        restitution: 0.2,
        static_friction: 0.6,
        dynamic_friction: 0.4,
    };

    fn detect(store: &BodyStore) -> Vec<Contact> {
        let mut out = Vec::new();
        detect_contacts(store, &GROUND, &mut out);
        out
    }

    #[test]
    fn test_sphere_sphere_overlap() {
        let (n, depth, point) =
            sphere_sphere(Vec3::new(1.5, 0.0, 0.0), 1.0, Vec3::ZERO, 1.0).unwrap();
        assert_eq!(n, Vec3::UNIT_X, "normal points from B toward A");
        assert!((depth - 0.5).abs() < 1e-6);
        assert!((point.x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_sphere_separated() {
        assert!(sphere_sphere(Vec3::new(3.0, 0.0, 0.0), 1.0, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_sphere_sphere_coincident_centers() {
        let (n, depth, _) = sphere_sphere(Vec3::ZERO, 1.0, Vec3::ZERO, 1.0).unwrap();
        assert_eq!(n, Vec3::UNIT_Y, "degenerate direction falls back to up");
        assert!((depth - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_aabb_min_axis() {
        // Deep X/Z overlap, shallow Y overlap: Y must win
        let (n, depth, _) = aabb_aabb(
            Vec3::new(0.0, 0.9, 0.0),
            Vec3::splat(0.5),
            Vec3::ZERO,
            Vec3::splat(0.5),
        )
        .unwrap();
        assert_eq!(n, Vec3::UNIT_Y);
        assert!((depth - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_aabb_tie_prefers_x() {
        // Identical cubes at the same position: all overlaps equal
        let (n, _, _) = aabb_aabb(Vec3::ZERO, Vec3::splat(0.5), Vec3::ZERO, Vec3::splat(0.5))
            .unwrap();
        assert_eq!(n, Vec3::UNIT_X);
    }

    #[test]
    fn test_aabb_aabb_contact_point_in_overlap() {
        let (_, _, point) = aabb_aabb(
            Vec3::new(0.8, 0.0, 0.0),
            Vec3::splat(0.5),
            Vec3::ZERO,
            Vec3::splat(0.5),
        )
        .unwrap();
        // Overlap region on X is [0.3, 0.5] → midpoint 0.4
        assert!((point.x - 0.4).abs() < 1e-6);
        assert!(point.y.abs() < 1e-6);
    }

    #[test]
    fn test_aabb_aabb_separated() {
        assert!(aabb_aabb(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::splat(0.5),
            Vec3::ZERO,
            Vec3::splat(0.5)
        )
        .is_none());
    }

    #[test]
    fn test_sphere_aabb_outside() {
        let (n, depth, point) =
            sphere_aabb(Vec3::new(1.2, 0.0, 0.0), 0.5, Vec3::ZERO, Vec3::splat(1.0)).unwrap();
        assert_eq!(n, Vec3::UNIT_X);
        assert!((depth - 0.3).abs() < 1e-6);
        assert!((point.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_aabb_center_inside() {
        // Center just inside the +X face
        let (n, depth, _) =
            sphere_aabb(Vec3::new(0.9, 0.0, 0.0), 0.5, Vec3::ZERO, Vec3::splat(1.0)).unwrap();
        assert_eq!(n, Vec3::UNIT_X);
        // Face distance 0.1 plus the radius
        assert!((depth - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_aabb_separated() {
        assert!(sphere_aabb(Vec3::new(3.0, 0.0, 0.0), 0.5, Vec3::ZERO, Vec3::splat(1.0)).is_none());
    }

    #[test]
    fn test_ground_contact_for_sphere_and_box() {
        let mut store = BodyStore::new();
        store
            .insert(
                "ball",
                RigidBody::from_desc(&BodyDesc::sphere(Vec3::new(0.0, 0.3, 0.0), 0.5, 1.0)),
            )
            .unwrap();
        store
            .insert(
                "crate",
                RigidBody::from_desc(&BodyDesc::cuboid(
                    Vec3::new(5.0, 0.4, 0.0),
                    Vec3::splat(0.5),
                    1.0,
                )),
            )
            .unwrap();

        let contacts = detect(&store);
        assert_eq!(contacts.len(), 2);
        for c in &contacts {
            assert!(c.body_b.is_none());
            assert_eq!(c.normal, Vec3::UNIT_Y);
        }
        assert!((contacts[0].depth - 0.2).abs() < 1e-6);
        assert!((contacts[1].depth - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_static_body_gets_no_ground_contact() {
        let mut store = BodyStore::new();
        store
            .insert(
                "floor",
                RigidBody::from_desc(
                    &BodyDesc::cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::splat(5.0), 0.0)
                        .with_static(true),
                ),
            )
            .unwrap();
        assert!(detect(&store).is_empty());
    }

    #[test]
    fn test_static_static_pair_skipped() {
        let mut store = BodyStore::new();
        for (id, x) in [("a", 0.0), ("b", 0.2)] {
            store
                .insert(
                    id,
                    RigidBody::from_desc(
                        &BodyDesc::cuboid(Vec3::new(x, 10.0, 0.0), Vec3::splat(1.0), 0.0)
                            .with_static(true),
                    ),
                )
                .unwrap();
        }
        // Heavily overlapping, but both static: no contact at all
        assert!(detect(&store).is_empty());
    }

    #[test]
    fn test_combined_material_rules() {
        let mut store = BodyStore::new();
        store
            .insert(
                "a",
                RigidBody::from_desc(
                    &BodyDesc::sphere(Vec3::new(0.0, 10.0, 0.0), 0.5, 1.0)
                        .with_restitution(0.8)
                        .with_friction(0.9, 0.4),
                ),
            )
            .unwrap();
        store
            .insert(
                "b",
                RigidBody::from_desc(
                    &BodyDesc::sphere(Vec3::new(0.6, 10.0, 0.0), 0.5, 1.0)
                        .with_restitution(0.2)
                        .with_friction(0.4, 0.1),
                ),
            )
            .unwrap();

        let contacts = detect(&store);
        assert_eq!(contacts.len(), 1);
        let c = &contacts[0];
        assert!((c.restitution - 0.2).abs() < 1e-6, "min rule");
        assert!((c.static_friction - 0.6).abs() < 1e-6, "sqrt(0.9*0.4)");
        assert!((c.dynamic_friction - 0.2).abs() < 1e-6, "sqrt(0.4*0.1)");
    }

    #[test]
    fn test_flipped_pair_normal_points_to_a() {
        let mut store = BodyStore::new();
        // A is a box at the origin, B is a sphere to its +X side
        store
            .insert(
                "box",
                RigidBody::from_desc(&BodyDesc::cuboid(
                    Vec3::new(0.0, 10.0, 0.0),
                    Vec3::splat(0.5),
                    1.0,
                )),
            )
            .unwrap();
        store
            .insert(
                "ball",
                RigidBody::from_desc(&BodyDesc::sphere(Vec3::new(0.8, 10.0, 0.0), 0.5, 1.0)),
            )
            .unwrap();

        let contacts = detect(&store);
        assert_eq!(contacts.len(), 1);
        // Normal must point from the sphere (B) toward the box (A): -X
        assert_eq!(contacts[0].normal, -Vec3::UNIT_X);
    }
}
