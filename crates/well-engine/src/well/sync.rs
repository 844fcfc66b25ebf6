use std::collections::HashMap;

use glam::Vec2;

use crate::core::physics::{OrbHandle, OrbMaterial, WellBounds, WellWorld};
use crate::core::rng::Rng;
use crate::well::word::Word;

/// Spawn height above the playfield so new orbs fall into the well.
const SPAWN_Y: f32 = -100.0;

/// An orb tracked by the synchronizer: the simulation handle plus the radius
/// it was last sized to, so vote changes can be detected as a ratio.
#[derive(Debug, Clone, Copy)]
struct TrackedOrb {
    handle: OrbHandle,
    radius: f32,
}

/// Reconciles the authoritative word list against live simulation bodies and
/// computes clamped render coordinates.
///
/// Words removed from the list are deliberately not reconciled — the wire
/// protocol has no removal path, so tracked ids only ever grow within a
/// session. Bodies are destroyed wholesale at session teardown.
pub struct OrbSync {
    tracked: HashMap<String, TrackedOrb>,
    bounds: WellBounds,
    material: OrbMaterial,
    rng: Rng,
}

impl OrbSync {
    pub fn new(bounds: WellBounds, seed: u64) -> Self {
        Self {
            tracked: HashMap::new(),
            bounds,
            material: OrbMaterial::default(),
            rng: Rng::new(seed),
        }
    }

    /// Run one reconciliation pass against a freshly received word list.
    ///
    /// New words get a body at a random interior x, above the top bound so
    /// they fall in. Words whose vote-derived radius changed are rescaled by
    /// the ratio of new to old radius, then clamped back into the playfield,
    /// since growth can push an orb's edge past a wall that was placed for a
    /// smaller ball.
    pub fn reconcile(&mut self, world: &mut WellWorld, words: &[Word]) {
        for word in words {
            let radius = word.radius();
            if let Some(orb) = self.tracked.get_mut(&word.id) {
                if (orb.radius - radius).abs() <= f32::EPSILON {
                    continue;
                }
                let factor = radius / orb.radius;
                let handle = orb.handle;
                match world.scale_orb(handle, factor) {
                    Ok(new_radius) => {
                        orb.radius = new_radius;
                        let (pos, _) = world.orb_position(handle);
                        let clamped = clamp_center(self.bounds, new_radius, pos);
                        if clamped != pos {
                            world.set_orb_position(handle, clamped);
                        }
                    }
                    Err(err) => {
                        log::error!("failed to rescale orb for word {}: {err}", word.id);
                    }
                }
                continue;
            }

            let x = self.rng.next_range(radius, self.bounds.width - radius);
            match world.add_orb(Vec2::new(x, SPAWN_Y), radius, self.material) {
                Ok(handle) => {
                    log::debug!("orb created for word {} (r={radius})", word.id);
                    self.tracked
                        .insert(word.id.clone(), TrackedOrb { handle, radius });
                }
                Err(err) => {
                    log::error!("failed to create orb for word {}: {err}", word.id);
                }
            }
        }
    }

    /// The clamped render position for a tracked orb, plus its rotation and
    /// current radius. The physics body is corrected whenever the clamp
    /// changed the value, so simulated and rendered positions can't diverge
    /// across frames.
    pub fn clamped_position(&self, world: &mut WellWorld, id: &str) -> Option<(Vec2, f32, f32)> {
        let orb = self.tracked.get(id)?;
        let (raw, rotation) = world.orb_position(orb.handle);
        let clamped = clamp_center(self.bounds, orb.radius, raw);
        if clamped != raw {
            world.set_orb_position(orb.handle, clamped);
        }
        Some((clamped, rotation, orb.radius))
    }

    /// Ids of all tracked orbs, in no particular order.
    pub fn tracked_ids(&self) -> impl Iterator<Item = &str> {
        self.tracked.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracked.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Forget all tracked orbs. Called at session teardown, after the world
    /// itself is torn down.
    pub fn clear(&mut self) {
        self.tracked.clear();
    }
}

/// Clamp an orb center into `[radius, width - radius] × [radius, height - radius]`.
/// Pure so the boundary cases are directly testable.
pub fn clamp_center(bounds: WellBounds, radius: f32, center: Vec2) -> Vec2 {
    Vec2::new(
        center.x.min(bounds.width - radius).max(radius),
        center.y.min(bounds.height - radius).max(radius),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn word(id: &str, votes: u32) -> Word {
        Word {
            id: id.into(),
            text: format!("w{id}"),
            votes,
            color: "#fff".into(),
        }
    }

    fn setup() -> (WellWorld, OrbSync) {
        let bounds = WellBounds::new(400.0, 700.0);
        let world = WellWorld::new(bounds, Vec2::new(0.0, 981.0));
        let sync = OrbSync::new(bounds, 42);
        (world, sync)
    }

    #[test]
    fn creates_bodies_for_new_words() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0), word("b", 2)]);
        assert_eq!(sync.len(), 2);
        assert_eq!(world.orb_count(), 2);
        let ids: HashSet<&str> = sync.tracked_ids().collect();
        assert_eq!(ids, HashSet::from(["a", "b"]));
    }

    #[test]
    fn reconcile_is_idempotent_for_unchanged_words() {
        let (mut world, mut sync) = setup();
        let words = [word("a", 1)];
        sync.reconcile(&mut world, &words);
        sync.reconcile(&mut world, &words);
        sync.reconcile(&mut world, &words);
        assert_eq!(world.orb_count(), 1);
    }

    #[test]
    fn tracked_ids_match_latest_list() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        sync.reconcile(&mut world, &[word("a", 0), word("b", 0), word("c", 1)]);
        let ids: HashSet<&str> = sync.tracked_ids().collect();
        assert_eq!(ids, HashSet::from(["a", "b", "c"]));
    }

    #[test]
    fn vote_change_rescales_body() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        sync.reconcile(&mut world, &[word("a", 3)]);
        let (_, _, radius) = sync.clamped_position(&mut world, "a").unwrap();
        assert!((radius - 35.0).abs() < 1e-3);
    }

    #[test]
    fn new_orbs_spawn_above_top_bound() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        // Read the raw position straight off the world before any steps;
        // clamped_position would pull it into the frame.
        let ids: Vec<&str> = sync.tracked_ids().collect();
        assert_eq!(ids, ["a"]);
        // One frame of clamping drops it to the top edge.
        let (pos, _, radius) = sync.clamped_position(&mut world, "a").unwrap();
        assert_eq!(pos.y, radius);
    }

    #[test]
    fn clamp_formula_bounds_any_raw_position() {
        let bounds = WellBounds::new(400.0, 700.0);
        let r = 25.0;
        let cases = [
            Vec2::new(-500.0, 350.0),
            Vec2::new(900.0, 350.0),
            Vec2::new(200.0, -500.0),
            Vec2::new(200.0, 5000.0),
            Vec2::new(200.0, 350.0),
        ];
        for raw in cases {
            let c = clamp_center(bounds, r, raw);
            assert!(c.x >= r && c.x <= 400.0 - r, "raw={raw:?} clamped={c:?}");
            assert!(c.y >= r && c.y <= 700.0 - r, "raw={raw:?} clamped={c:?}");
        }
    }

    #[test]
    fn clamp_writes_back_into_physics_body() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        let (first, _, _) = sync.clamped_position(&mut world, "a").unwrap();
        // A second read without stepping sees the corrected body, so the
        // clamp no longer changes anything.
        let (second, _, _) = sync.clamped_position(&mut world, "a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rescaled_orb_is_reclamped() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        // Park the orb against the left wall at its current radius.
        let (pos, _, radius) = sync.clamped_position(&mut world, "a").unwrap();
        let _ = pos;
        assert_eq!(radius, 20.0);
        // Growing the orb must push its center back inside the new limit.
        sync.reconcile(&mut world, &[word("a", 10)]);
        let (pos, _, radius) = sync.clamped_position(&mut world, "a").unwrap();
        assert_eq!(radius, 70.0);
        assert!(pos.x >= radius && pos.x <= 400.0 - radius);
        assert!(pos.y >= radius && pos.y <= 700.0 - radius);
    }

    #[test]
    fn unknown_id_yields_none() {
        let (mut world, mut sync) = setup();
        sync.reconcile(&mut world, &[word("a", 0)]);
        assert!(sync.clamped_position(&mut world, "nope").is_none());
    }
}
