//! Current zones
//!
//! An entity remembers which zones it is inside together with each zone's
//! velocity bias. Overlapping zones stack: the bias applied per tick is the
//! sum over all zones the entity is in.

use glam::Vec2;

use super::entity::{Entity, EntityId};

/// Membership record: a zone and the bias it applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBias {
    pub zone: EntityId,
    pub bias: Vec2,
}

/// Record that `entity` entered `zone`. Entering a zone twice is a no-op.
/// Returns whether membership changed.
pub fn enter(entity: &mut Entity, zone_id: EntityId, zone: &Entity, tolerance: f32) -> bool {
    let Some(current) = zone.as_current() else {
        return false;
    };
    if !entity.kind().affected_by_current() {
        return false;
    }
    if entity.zones.iter().any(|z| z.zone == zone_id) {
        return false;
    }
    let reach = entity.radius + zone.radius + tolerance;
    let distance = entity.position.distance(zone.position);
    if distance > reach {
        // Contact and pose disagree; trust the contact
        log::warn!(
            "{:?} entered current {:?} from {:.2} away (reach {:.2})",
            entity.kind(),
            zone_id,
            distance,
            reach
        );
    }
    entity.zones.push(ZoneBias {
        zone: zone_id,
        bias: current.bias(),
    });
    true
}

/// Record that `entity` left `zone`. Returns whether it was inside.
pub fn exit(entity: &mut Entity, zone_id: EntityId) -> bool {
    let before = entity.zones.len();
    entity.zones.retain(|z| z.zone != zone_id);
    entity.zones.len() != before
}

/// Summed bias of every zone the entity is in
pub fn water_velocity(entity: &Entity) -> Vec2 {
    entity.zones.iter().map(|z| z.bias).sum()
}

/// Push the entity along for one physics tick
pub fn apply_tick(entity: &mut Entity) {
    if entity.is_destroyed() {
        return;
    }
    entity.velocity += water_velocity(entity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::EntityArena;
    use crate::sim::entity::Direction;
    use crate::tuning::Tuning;

    fn setup() -> (EntityArena, EntityId, EntityId, EntityId) {
        let tuning = Tuning::default();
        let mut arena = EntityArena::new();
        let east = arena.insert(Entity::current(Vec2::new(10.0, 10.0), Direction::East, &tuning));
        let north = arena.insert(Entity::current(Vec2::new(11.0, 10.0), Direction::North, &tuning));
        let wood = arena.insert(Entity::wood(Vec2::new(10.5, 10.0), 1, &tuning));
        (arena, east, north, wood)
    }

    #[test]
    fn test_enter_is_idempotent() {
        let (mut arena, east, _, wood) = setup();
        let (w, zone) = arena.get_pair_mut(wood, east).unwrap();
        assert!(enter(w, east, zone, 0.5));
        assert!(!enter(w, east, zone, 0.5));
        assert_eq!(w.zones.len(), 1);
        apply_tick(w);
        assert_eq!(w.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_overlapping_zones_stack() {
        let (mut arena, east, north, wood) = setup();
        {
            let (w, zone) = arena.get_pair_mut(wood, east).unwrap();
            enter(w, east, zone, 0.5);
        }
        {
            let (w, zone) = arena.get_pair_mut(wood, north).unwrap();
            enter(w, north, zone, 0.5);
        }
        let w = arena.get_mut(wood).unwrap();
        assert_eq!(water_velocity(w), Vec2::new(2.0, 2.0));
        assert!(exit(w, east));
        assert!(!exit(w, east));
        assert_eq!(water_velocity(w), Vec2::new(0.0, 2.0));
    }

    #[test]
    fn test_unaffected_kinds_ignored() {
        let tuning = Tuning::default();
        let mut arena = EntityArena::new();
        let zone = arena.insert(Entity::current(Vec2::ZERO, Direction::West, &tuning));
        let rock = arena.insert(Entity::obstacle(Vec2::ZERO, &tuning));
        let (r, z) = arena.get_pair_mut(rock, zone).unwrap();
        assert!(!enter(r, zone, z, 0.5));
        assert_eq!(water_velocity(r), Vec2::ZERO);
    }

    #[test]
    fn test_far_enter_still_applies() {
        let tuning = Tuning::default();
        let mut arena = EntityArena::new();
        let zone = arena.insert(Entity::current(Vec2::ZERO, Direction::South, &tuning));
        let wood = arena.insert(Entity::wood(Vec2::new(50.0, 0.0), 2, &tuning));
        let (w, z) = arena.get_pair_mut(wood, zone).unwrap();
        assert!(enter(w, zone, z, 0.5));
        assert_eq!(water_velocity(w), Vec2::new(0.0, -2.0));
    }
}
