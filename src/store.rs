//! Body Store
//!
//! Owns all live body state. Bodies sit in a slot arena addressed by a
//! stable [`BodyHandle`]; a separate id→handle table serves the string
//! identifiers used by external commands. All mutation happens inside the
//! single-threaded step driver, so the store needs no interior locking.
//!
//! Each insertion also records a creation snapshot (pose + material,
//! velocities zeroed) used by [`BodyStore::reset_all`].

use std::collections::HashMap;

use crate::body::RigidBody;
use crate::error::PhysicsError;

/// Stable handle to a body slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(u32);

impl BodyHandle {
    /// Slot index backing this handle
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot arena of rigid bodies plus the id lookup table and snapshots.
#[derive(Default)]
pub struct BodyStore {
    slots: Vec<Option<RigidBody>>,
    snapshots: Vec<Option<RigidBody>>,
    ids: Vec<Option<String>>,
    free: Vec<u32>,
    handles: HashMap<String, BodyHandle>,
}

impl BodyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the store holds no bodies
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Insert a body under `id`, snapshotting its creation state.
    ///
    /// Rejects duplicate identifiers; freed slots are reused.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        body: RigidBody,
    ) -> Result<BodyHandle, PhysicsError> {
        let id = id.into();
        if self.handles.contains_key(&id) {
            return Err(PhysicsError::DuplicateBodyId { id });
        }

        let mut snapshot = body;
        snapshot.linear_velocity = crate::math::Vec3::ZERO;
        snapshot.angular_velocity = crate::math::Vec3::ZERO;

        let handle = match self.free.pop() {
            Some(slot) => {
                let i = slot as usize;
                self.slots[i] = Some(body);
                self.snapshots[i] = Some(snapshot);
                self.ids[i] = Some(id.clone());
                BodyHandle(slot)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Some(body));
                self.snapshots.push(Some(snapshot));
                self.ids.push(Some(id.clone()));
                BodyHandle(slot)
            }
        };
        self.handles.insert(id, handle);
        Ok(handle)
    }

    /// Remove a body by id, discarding its snapshot. Unknown ids return
    /// `None`.
    pub fn remove(&mut self, id: &str) -> Option<RigidBody> {
        let handle = self.handles.remove(id)?;
        let i = handle.index();
        self.snapshots[i] = None;
        self.ids[i] = None;
        self.free.push(handle.0);
        self.slots[i].take()
    }

    /// Look up the handle for an id
    #[inline]
    pub fn handle_of(&self, id: &str) -> Option<BodyHandle> {
        self.handles.get(id).copied()
    }

    /// Identifier of a live body
    #[inline]
    pub fn id_of(&self, handle: BodyHandle) -> Option<&str> {
        self.ids.get(handle.index())?.as_deref()
    }

    /// Get a body by handle
    #[inline]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.slots.get(handle.index())?.as_ref()
    }

    /// Get a mutable body by handle
    #[inline]
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.slots.get_mut(handle.index())?.as_mut()
    }

    /// Get a body by id
    #[inline]
    pub fn get_by_id(&self, id: &str) -> Option<&RigidBody> {
        self.get(self.handle_of(id)?)
    }

    /// Get a mutable body by id
    #[inline]
    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut RigidBody> {
        let handle = self.handle_of(id)?;
        self.get_mut(handle)
    }

    /// Iterate live bodies in slot order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BodyHandle(i as u32), b)))
    }

    /// Iterate live bodies mutably in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|b| (BodyHandle(i as u32), b)))
    }

    /// Raw slot access for the data-parallel integrator pass.
    #[cfg(feature = "parallel")]
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<RigidBody>] {
        &mut self.slots
    }

    /// Restore every live body's pose from its creation snapshot and zero
    /// its velocities. Materials, damping, and mass stay as they are now.
    pub fn reset_all(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let (Some(body), Some(snapshot)) = (slot.as_mut(), self.snapshots[i].as_ref()) {
                body.position = snapshot.position;
                body.orientation = snapshot.orientation;
                body.linear_velocity = crate::math::Vec3::ZERO;
                body.angular_velocity = crate::math::Vec3::ZERO;
            }
        }
    }

    /// Drop every body and snapshot
    pub fn clear(&mut self) {
        self.slots.clear();
        self.snapshots.clear();
        self.ids.clear();
        self.free.clear();
        self.handles.clear();
    }
}
