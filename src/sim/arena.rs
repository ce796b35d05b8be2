//! Entity arena
//!
//! Live entities sit in a slot vector threaded by an intrusive doubly linked
//! list, so the cleanup pass walks them in insertion order and unlinks a
//! destroyed entity in O(1). Handles carry a generation: a handle to a removed
//! entity never resolves again, even after its slot is reused.
//!
//! Entities spawned mid-frame go to the pending queue and join the list at
//! the start of the next post-update.

use std::collections::{HashMap, VecDeque};

use super::entity::{Entity, EntityId, EntityKind};
use super::physics::{BodyHandle, Bounds, PhysicsWorld};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
    prev: Option<u32>,
    next: Option<u32>,
}

/// Owner of every live and pending entity
#[derive(Debug, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    pending: VecDeque<Entity>,
    bodies: HashMap<BodyHandle, EntityId>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Link an entity into the live list without a physics body.
    /// Currents go to the front so zones are known before what they push.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let front = entity.kind() == EntityKind::Current;
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entity = Some(entity);
        let id = EntityId {
            index,
            generation: slot.generation,
        };
        if front {
            self.link_front(index);
        } else {
            self.link_back(index);
        }
        self.len += 1;
        id
    }

    /// Link an entity and give it a physics body
    pub fn spawn(&mut self, entity: Entity, physics: &mut impl PhysicsWorld) -> EntityId {
        let def = entity.body_def();
        let id = self.insert(entity);
        let handle = physics.create_body(&def);
        self.bodies.insert(handle, id);
        if let Some(entity) = self.get_mut(id) {
            entity.body = Some(handle);
        }
        id
    }

    /// Defer an entity to the next post-update
    pub fn queue(&mut self, entity: Entity) {
        self.pending.push_back(entity);
    }

    /// Move every pending entity into the live list, in queue order
    pub fn merge_pending(&mut self, physics: &mut impl PhysicsWorld) -> Vec<EntityId> {
        let mut added = Vec::with_capacity(self.pending.len());
        while let Some(entity) = self.pending.pop_front() {
            added.push(self.spawn(entity, physics));
        }
        added
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Borrow two distinct entities at once
    pub fn get_pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi) = if a.index < b.index { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi.index as usize);
        let lo_entity = left[lo.index as usize].entity.as_mut()?;
        let hi_entity = right[0].entity.as_mut()?;
        if a.index < b.index {
            Some((lo_entity, hi_entity))
        } else {
            Some((hi_entity, lo_entity))
        }
    }

    /// Owning entity of a physics body
    pub fn entity_for_body(&self, handle: BodyHandle) -> Option<EntityId> {
        self.bodies.get(&handle).copied()
    }

    /// Live ids in list order
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Live ids of one kind, in list order
    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| e.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Live entities in list order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let index = cursor?;
            let slot = &self.slots[index as usize];
            cursor = slot.next;
            let id = EntityId {
                index,
                generation: slot.generation,
            };
            slot.entity.as_ref().map(|e| (id, e))
        })
    }

    /// Unlink and free an entity, destroying its body
    pub fn remove(&mut self, id: EntityId, physics: &mut impl PhysicsWorld) -> Option<Entity> {
        if !self.contains(id) {
            return None;
        }
        self.unlink(id.index);
        let slot = &mut self.slots[id.index as usize];
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        if let Some(handle) = entity.body {
            physics.destroy_body(handle);
            self.bodies.remove(&handle);
        }
        Some(entity)
    }

    /// Garbage-collect and advance: walk the list once, removing destroyed
    /// entities and calling `update` exactly once on every survivor. Bullets
    /// outside the world or past their range are marked destroyed first.
    /// Returns what was removed.
    pub fn cleanup(
        &mut self,
        physics: &mut impl PhysicsWorld,
        bounds: &Bounds,
        dt: f32,
    ) -> Vec<(EntityId, EntityKind)> {
        let mut removed = Vec::new();
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let slot = &mut self.slots[index as usize];
            cursor = slot.next;
            let id = EntityId {
                index,
                generation: slot.generation,
            };
            let Some(entity) = slot.entity.as_mut() else {
                continue;
            };
            if entity.is_spent(bounds) {
                entity.set_destroyed(true);
            }
            if entity.is_destroyed() {
                let kind = entity.kind();
                self.remove(id, physics);
                removed.push((id, kind));
            } else {
                entity.update(dt);
            }
        }
        removed
    }

    /// Hand entity velocities to their bodies before a step
    pub fn push_to_physics(&self, physics: &mut impl PhysicsWorld) {
        for (_, entity) in self.iter() {
            if let Some(handle) = entity.body {
                physics.set_velocity(handle, entity.velocity);
            }
        }
    }

    /// Copy stepped poses back onto entities
    pub fn pull_from_physics(&mut self, physics: &impl PhysicsWorld) {
        for slot in self.slots.iter_mut() {
            let Some(entity) = slot.entity.as_mut() else {
                continue;
            };
            if let Some(state) = entity.body.and_then(|h| physics.body_state(h)) {
                entity.position = state.position;
                entity.velocity = state.velocity;
            }
        }
    }

    /// Drop everything, live and pending
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn link_back(&mut self, index: u32) {
        self.slots[index as usize].prev = self.tail;
        self.slots[index as usize].next = None;
        match self.tail {
            Some(tail) => self.slots[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    fn link_front(&mut self, index: u32) {
        self.slots[index as usize].prev = None;
        self.slots[index as usize].next = self.head;
        match self.head {
            Some(head) => self.slots[head as usize].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn unlink(&mut self, index: u32) {
        let (prev, next) = {
            let slot = &mut self.slots[index as usize];
            (slot.prev.take(), slot.next.take())
        };
        match prev {
            Some(p) => self.slots[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n as usize].prev = prev,
            None => self.tail = prev,
        }
    }
}
