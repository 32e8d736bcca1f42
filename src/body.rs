//! Rigid Body State and Construction
//!
//! A body is described by a [`BodyDesc`] (shape kind, pose, scale, mass,
//! material) and lives inside the world as a [`RigidBody`] with
//! precomputed inverse mass and diagonal inverse inertia.
//!
//! # Conventions
//!
//! - `inverse_mass == 0` if and only if the body is static. Static bodies
//!   never move and contribute no angular term to contact resolution.
//! - The inverse inertia tensor is diagonal-only (body space), cached at
//!   creation. Updating mass later does not recompute it; shape changes
//!   are unsupported.

use crate::math::{Quat, Vec3};

// ============================================================================
// Shapes
// ============================================================================

/// Primitive kind requested by the caller.
///
/// Only spheres and boxes have real colliders in the CPU path; every other
/// kind is approximated by its bounding sphere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    /// Sphere collider
    #[default]
    Sphere,
    /// Axis-aligned box collider
    Box,
    /// Approximated by a sphere
    Capsule,
    /// Approximated by a sphere
    Cylinder,
    /// Approximated by a sphere
    Cone,
    /// Approximated by a sphere
    Plane,
}

/// Collider shape with resolved dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColliderShape {
    /// Sphere of the given radius
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Axis-aligned box with the given half-extents
    Aabb {
        /// Half-extent along each axis
        half_extents: Vec3,
    },
}

impl ColliderShape {
    /// Resolve a shape kind and node scale into collider dimensions.
    ///
    /// Boxes take half the scale per axis; spheres (and every fallback
    /// kind) take half the largest scale component, which keeps a
    /// non-uniformly scaled sphere conservative.
    pub fn from_kind(kind: ShapeKind, scale: Vec3) -> Self {
        match kind {
            ShapeKind::Box => Self::Aabb {
                half_extents: scale * 0.5,
            },
            _ => Self::Sphere {
                radius: scale.max_component() * 0.5,
            },
        }
    }

    /// Lowest world-space point of the shape along world-up, for a body
    /// centered at `position`.
    #[inline]
    pub fn lowest_point(&self, position: Vec3) -> f32 {
        match self {
            Self::Sphere { radius } => position.y - radius,
            Self::Aabb { half_extents } => position.y - half_extents.y,
        }
    }

    /// Diagonal inverse inertia in body space for the given mass.
    ///
    /// Sphere: `1/(0.4·m·r²)` per axis. Box: `12/(m·(d_j² + d_k²))` per
    /// axis with full extents `d`. Degenerate dimensions fall back to the
    /// isotropic `1/m`.
    pub fn inverse_inertia_diagonal(&self, mass: f32) -> Vec3 {
        if mass <= 0.0 {
            return Vec3::ZERO;
        }
        let isotropic = Vec3::splat(1.0 / mass);
        match self {
            Self::Sphere { radius } => {
                let i = 0.4 * mass * radius * radius;
                if i > f32::EPSILON {
                    Vec3::splat(1.0 / i)
                } else {
                    isotropic
                }
            }
            Self::Aabb { half_extents } => {
                let d = *half_extents * 2.0;
                let (x2, y2, z2) = (d.x * d.x, d.y * d.y, d.z * d.z);
                let f = mass / 12.0;
                let (ix, iy, iz) = (f * (y2 + z2), f * (x2 + z2), f * (x2 + y2));
                if ix > f32::EPSILON && iy > f32::EPSILON && iz > f32::EPSILON {
                    Vec3::new(1.0 / ix, 1.0 / iy, 1.0 / iz)
                } else {
                    isotropic
                }
            }
        }
    }
}

// ============================================================================
// Material
// ============================================================================

/// Surface material of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyMaterial {
    /// Coefficient of restitution (bounciness)
    pub restitution: f32,
    /// Static friction coefficient
    pub static_friction: f32,
    /// Dynamic (sliding) friction coefficient
    pub dynamic_friction: f32,
}

impl Default for BodyMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            static_friction: 0.6,
            dynamic_friction: 0.4,
        }
    }
}

// ============================================================================
// Body description
// ============================================================================

/// Everything needed to create a body.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyDesc {
    /// Requested primitive kind
    pub shape: ShapeKind,
    /// Initial world position
    pub position: Vec3,
    /// Initial world orientation
    pub orientation: Quat,
    /// Node scale; drives collider dimensions
    pub scale: Vec3,
    /// Mass in kilograms; ignored for static bodies
    pub mass: f32,
    /// Static bodies never move
    pub is_static: bool,
    /// Surface material
    pub material: BodyMaterial,
    /// Exponential linear velocity decay factor
    pub linear_damping: f32,
    /// Exponential angular velocity decay factor
    pub angular_damping: f32,
    /// Initial linear velocity
    pub linear_velocity: Vec3,
    /// Initial angular velocity
    pub angular_velocity: Vec3,
    /// Accepted for API compatibility; the discrete narrow phase ignores
    /// it, so fast bodies may tunnel.
    pub enable_ccd: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Sphere,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::splat(1.0),
            mass: 1.0,
            is_static: false,
            material: BodyMaterial::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            enable_ccd: false,
        }
    }
}

impl BodyDesc {
    /// Dynamic sphere of the given radius and mass at `position`.
    pub fn sphere(position: Vec3, radius: f32, mass: f32) -> Self {
        Self {
            shape: ShapeKind::Sphere,
            position,
            scale: Vec3::splat(radius * 2.0),
            mass,
            ..Self::default()
        }
    }

    /// Dynamic box with the given half-extents and mass at `position`.
    pub fn cuboid(position: Vec3, half_extents: Vec3, mass: f32) -> Self {
        Self {
            shape: ShapeKind::Box,
            position,
            scale: half_extents * 2.0,
            mass,
            ..Self::default()
        }
    }

    /// Mark the body static (infinite mass)
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    /// Set both friction coefficients
    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.material.static_friction = static_friction;
        self.material.dynamic_friction = dynamic_friction;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set initial linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set initial angular velocity
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Set the CCD request flag (stored, not acted on)
    pub fn with_ccd(mut self, enable: bool) -> Self {
        self.enable_ccd = enable;
        self
    }
}

// ============================================================================
// Rigid body
// ============================================================================

/// Live simulation state of one body.
#[derive(Clone, Copy, Debug)]
pub struct RigidBody {
    /// World position (center of mass)
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Linear velocity
    pub linear_velocity: Vec3,
    /// Angular velocity
    pub angular_velocity: Vec3,
    /// Inverse mass; 0 for static bodies
    pub inverse_mass: f32,
    /// Diagonal inverse inertia in body space; zero for static bodies
    pub inverse_inertia: Vec3,
    /// Coefficient of restitution
    pub restitution: f32,
    /// Static friction coefficient
    pub static_friction: f32,
    /// Dynamic friction coefficient
    pub dynamic_friction: f32,
    /// Exponential linear velocity decay factor
    pub linear_damping: f32,
    /// Exponential angular velocity decay factor
    pub angular_damping: f32,
    /// Static bodies never move
    pub is_static: bool,
    /// Resolved collider
    pub shape: ColliderShape,
    /// CCD request flag; ignored by the discrete narrow phase
    pub enable_ccd: bool,
}

impl RigidBody {
    /// Build a body from its description.
    ///
    /// A non-positive mass also makes the body static, preserving the
    /// `inverse_mass == 0 ⇔ is_static` invariant.
    pub fn from_desc(desc: &BodyDesc) -> Self {
        let shape = ColliderShape::from_kind(desc.shape, desc.scale);
        let is_static = desc.is_static || desc.mass <= 0.0;
        let (inverse_mass, inverse_inertia) = if is_static {
            (0.0, Vec3::ZERO)
        } else {
            (1.0 / desc.mass, shape.inverse_inertia_diagonal(desc.mass))
        };
        Self {
            position: desc.position,
            orientation: desc.orientation,
            linear_velocity: if is_static {
                Vec3::ZERO
            } else {
                desc.linear_velocity
            },
            angular_velocity: if is_static {
                Vec3::ZERO
            } else {
                desc.angular_velocity
            },
            inverse_mass,
            inverse_inertia,
            restitution: desc.material.restitution,
            static_friction: desc.material.static_friction,
            dynamic_friction: desc.material.dynamic_friction,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            is_static,
            shape,
            enable_ccd: desc.enable_ccd,
        }
    }

    /// Check if body is static
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Apply an instantaneous impulse at the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if !self.is_static {
            self.linear_velocity += impulse * self.inverse_mass;
        }
    }

    /// Apply an instantaneous impulse at a world-space point, adding the
    /// angular response `ω += invI·(r × impulse)`.
    pub fn apply_impulse_at(&mut self, impulse: Vec3, point: Vec3) {
        if !self.is_static {
            self.linear_velocity += impulse * self.inverse_mass;
            let r = point - self.position;
            self.angular_velocity += self.inverse_inertia.component_mul(r.cross(impulse));
        }
    }

    /// Lowest point of the collider along world-up.
    #[inline]
    pub fn lowest_point(&self) -> f32 {
        self.shape.lowest_point(self.position)
    }
}
