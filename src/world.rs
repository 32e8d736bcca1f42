//! Physics World and Step Driver
//!
//! [`PhysicsWorld`] owns the body store, the simulation settings, and a
//! command queue. External mutation (impulses, velocity writes, removal,
//! property updates) is queued and drained at the start of the next step,
//! so mid-step state is never observable from outside.
//!
//! Each `step(dt)` splits the frame into sub-steps clamped to
//! [`MAX_SUB_STEPS`] and runs the fixed pipeline per sub-step: integrate,
//! detect contacts, velocity solve, position correction.

use crate::body::{BodyDesc, RigidBody};
use crate::collide::{detect_contacts, Contact, GroundProfile};
use crate::error::PhysicsError;
use crate::integrate::integrate;
use crate::math::{Quat, Vec3};
use crate::solver::{correct_positions, solve_contacts};
use crate::store::{BodyHandle, BodyStore};

/// Upper bound on sub-steps per `step` call. A huge `dt` degrades in
/// accuracy rather than stalling the caller.
pub const MAX_SUB_STEPS: u32 = 8;

/// Solver iterations per configured sub-step.
const ITERATIONS_PER_SUB_STEP: u32 = 4;

// ============================================================================
// Settings
// ============================================================================

/// Global simulation parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationSettings {
    /// Gravity acceleration
    pub gravity: Vec3,
    /// Target sub-step duration in seconds
    pub fixed_dt: f32,
    /// Configured sub-step count; also scales solver iterations
    pub sub_steps: u32,
    /// Height of the infinite ground plane
    pub ground_height: f32,
    /// Ground restitution
    pub ground_restitution: f32,
    /// Ground static friction
    pub ground_static_friction: f32,
    /// Ground dynamic friction
    pub ground_dynamic_friction: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_dt: 1.0 / 60.0,
            sub_steps: 4,
            ground_height: 0.0,
            // Combination takes the minimum, so 1.0 lets each body's own
            // restitution govern its ground bounces
            ground_restitution: 1.0,
            ground_static_friction: 0.6,
            ground_dynamic_friction: 0.4,
        }
    }
}

impl SimulationSettings {
    /// Reject settings the step driver cannot run with.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "fixed_dt must be finite and positive",
            });
        }
        if self.sub_steps == 0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "sub_steps must be at least 1",
            });
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "gravity must be finite",
            });
        }
        if !self.ground_height.is_finite() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "ground_height must be finite",
            });
        }
        Ok(())
    }

    fn ground_profile(&self) -> GroundProfile {
        GroundProfile {
            height: self.ground_height,
            restitution: self.ground_restitution,
            static_friction: self.ground_static_friction,
            dynamic_friction: self.ground_dynamic_friction,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Partial body property update. `None` fields are left untouched.
///
/// A mass update rewrites the inverse mass only; the cached inverse
/// inertia keeps its creation-time value. Mass updates on static bodies
/// are ignored.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyUpdate {
    /// New mass in kilograms
    pub mass: Option<f32>,
    /// New restitution
    pub restitution: Option<f32>,
    /// New static friction
    pub static_friction: Option<f32>,
    /// New dynamic friction
    pub dynamic_friction: Option<f32>,
    /// New linear damping
    pub linear_damping: Option<f32>,
    /// New angular damping
    pub angular_damping: Option<f32>,
}

/// Deferred external mutation, applied in FIFO order at the next step.
#[derive(Clone, Debug)]
enum Command {
    ApplyImpulse { id: String, impulse: Vec3 },
    ApplyImpulseAt { id: String, impulse: Vec3, point: Vec3 },
    SetLinearVelocity { id: String, velocity: Vec3 },
    Remove { id: String },
    UpdateProperties { id: String, update: BodyUpdate },
}

// ============================================================================
// Transforms
// ============================================================================

/// Pose of one body, exported for rendering or scene sync.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyTransform {
    /// Identifier the body was created under
    pub id: String,
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
}

// ============================================================================
// World
// ============================================================================

/// The simulation: bodies, settings, pending commands.
pub struct PhysicsWorld {
    settings: SimulationSettings,
    store: BodyStore,
    contacts: Vec<Contact>,
    commands: Vec<Command>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        // Default settings always validate
        Self::new(SimulationSettings::default()).unwrap()
    }
}

impl PhysicsWorld {
    /// Create a world with the given settings.
    pub fn new(settings: SimulationSettings) -> Result<Self, PhysicsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            store: BodyStore::new(),
            contacts: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Current settings
    #[inline]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Replace the settings, validating first. Takes effect from the next
    /// step.
    pub fn update_settings(&mut self, settings: SimulationSettings) -> Result<(), PhysicsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Number of live bodies
    #[inline]
    pub fn body_count(&self) -> usize {
        self.store.len()
    }

    /// Read a body by id
    #[inline]
    pub fn body(&self, id: &str) -> Option<&RigidBody> {
        self.store.get_by_id(id)
    }

    /// Handle of a live body
    #[inline]
    pub fn handle_of(&self, id: &str) -> Option<BodyHandle> {
        self.store.handle_of(id)
    }

    /// Create a body from its description, effective immediately.
    ///
    /// Rejects duplicate ids, non-finite or negative mass, and non-finite
    /// pose or velocity components.
    pub fn add_body(&mut self, id: impl Into<String>, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidBodyParameter {
                reason: "mass must be finite and non-negative",
            });
        }
        if !(desc.position.is_finite()
            && desc.orientation.is_finite()
            && desc.scale.is_finite()
            && desc.linear_velocity.is_finite()
            && desc.angular_velocity.is_finite())
        {
            return Err(PhysicsError::InvalidBodyParameter {
                reason: "pose, scale, and velocities must be finite",
            });
        }
        self.store.insert(id, RigidBody::from_desc(desc))
    }

    // ------------------------------------------------------------------
    // Queued mutation. Unknown ids become no-ops when the queue drains.
    // ------------------------------------------------------------------

    /// Queue a center-of-mass impulse
    pub fn apply_impulse(&mut self, id: impl Into<String>, impulse: Vec3) {
        self.commands.push(Command::ApplyImpulse {
            id: id.into(),
            impulse,
        });
    }

    /// Queue an impulse at a world-space point
    pub fn apply_impulse_at(&mut self, id: impl Into<String>, impulse: Vec3, point: Vec3) {
        self.commands.push(Command::ApplyImpulseAt {
            id: id.into(),
            impulse,
            point,
        });
    }

    /// Queue a linear velocity overwrite
    pub fn set_linear_velocity(&mut self, id: impl Into<String>, velocity: Vec3) {
        self.commands.push(Command::SetLinearVelocity {
            id: id.into(),
            velocity,
        });
    }

    /// Queue removal of a body
    pub fn remove_body(&mut self, id: impl Into<String>) {
        self.commands.push(Command::Remove { id: id.into() });
    }

    /// Queue a partial property update
    pub fn update_body(&mut self, id: impl Into<String>, update: BodyUpdate) {
        self.commands.push(Command::UpdateProperties {
            id: id.into(),
            update,
        });
    }

    fn drain_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            match command {
                Command::ApplyImpulse { id, impulse } => {
                    if let Some(body) = self.store.get_by_id_mut(&id) {
                        body.apply_impulse(impulse);
                    }
                }
                Command::ApplyImpulseAt { id, impulse, point } => {
                    if let Some(body) = self.store.get_by_id_mut(&id) {
                        body.apply_impulse_at(impulse, point);
                    }
                }
                Command::SetLinearVelocity { id, velocity } => {
                    if let Some(body) = self.store.get_by_id_mut(&id) {
                        if !body.is_static() {
                            body.linear_velocity = velocity;
                        }
                    }
                }
                Command::Remove { id } => {
                    self.store.remove(&id);
                }
                Command::UpdateProperties { id, update } => {
                    if let Some(body) = self.store.get_by_id_mut(&id) {
                        apply_update(body, &update);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` is a no-op (queued commands stay
    /// pending). The frame is split into `ceil(dt / fixed_dt)` sub-steps
    /// clamped to `1..=MAX_SUB_STEPS`, each of duration `dt / n`.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.drain_commands();

        let n = ((dt / self.settings.fixed_dt).ceil() as u32).clamp(1, MAX_SUB_STEPS);
        let sub_dt = dt / n as f32;
        let iterations = (self.settings.sub_steps * ITERATIONS_PER_SUB_STEP).max(1) as usize;
        let ground = self.settings.ground_profile();

        for _ in 0..n {
            integrate(&mut self.store, self.settings.gravity, sub_dt);
            detect_contacts(&self.store, &ground, &mut self.contacts);
            solve_contacts(&mut self.store, &self.contacts, iterations, sub_dt);
            correct_positions(&mut self.store, &self.contacts);
        }
    }

    /// Restore every body to its creation pose with zeroed velocities.
    ///
    /// Pending commands survive a reset and drain on the next step.
    pub fn reset(&mut self) {
        self.store.reset_all();
    }

    /// Remove every body and drop pending commands.
    pub fn clear(&mut self) {
        self.store.clear();
        self.commands.clear();
        self.contacts.clear();
    }

    /// Export the pose of every live body, in slot order.
    pub fn transforms(&self) -> Vec<BodyTransform> {
        self.store
            .iter()
            .filter_map(|(handle, body)| {
                self.store.id_of(handle).map(|id| BodyTransform {
                    id: id.to_string(),
                    position: body.position,
                    orientation: body.orientation,
                })
            })
            .collect()
    }
}

/// Apply a partial update in place. Mass updates keep the cached inverse
/// inertia and never turn a static body dynamic.
fn apply_update(body: &mut RigidBody, update: &BodyUpdate) {
    if let Some(mass) = update.mass {
        if !body.is_static() && mass.is_finite() && mass > 0.0 {
            body.inverse_mass = 1.0 / mass;
        }
    }
    if let Some(restitution) = update.restitution {
        body.restitution = restitution;
    }
    if let Some(static_friction) = update.static_friction {
        body.static_friction = static_friction;
    }
    if let Some(dynamic_friction) = update.dynamic_friction {
        body.dynamic_friction = dynamic_friction;
    }
    if let Some(linear_damping) = update.linear_damping {
        body.linear_damping = linear_damping;
    }
    if let Some(angular_damping) = update.angular_damping {
        body.angular_damping = angular_damping;
    }
}
