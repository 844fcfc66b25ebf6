use glam::Vec2;
use rapier2d::prelude::*;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Thickness of the static boundary colliders. Walls are centered on the
/// playfield edges, so half of this sticks outside the visible frame.
const WALL_THICKNESS: f32 = 20.0;

/// Y offset of the ceiling above the playfield. Kept high so orbs spawned
/// above the frame still fall in under the ceiling.
const CEILING_OFFSET: f32 = -200.0;

/// Matter-style drag stiffness (0..1) is scaled into rapier spring units.
const POINTER_SPRING_SCALE: f32 = 4000.0;
const POINTER_SPRING_DAMPING: f32 = 12.0;

/// Errors from the simulation adapter. Callers log and degrade; nothing here
/// is allowed to take down the host process.
#[derive(Debug, Error)]
pub enum WellError {
    #[error("orb radius must be positive (got {0})")]
    InvalidRadius(f32),
    #[error("scale factor must be positive (got {0})")]
    InvalidScale(f32),
    #[error("world has been torn down")]
    TornDown,
    #[error("orb handle no longer refers to a live body")]
    UnknownOrb,
}

/// The logical playfield rectangle. Physics coordinates are Y-down with the
/// origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellBounds {
    pub width: f32,
    pub height: f32,
}

impl WellBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a point lies inside the playfield rectangle.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

/// Kinematic material for an orb body. Defaults match the tuned well feel:
/// bouncy but settling, with air resistance so orbs don't jitter forever.
#[derive(Debug, Clone, Copy)]
pub struct OrbMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// Linear damping standing in for air friction.
    pub linear_damping: f32,
}

impl Default for OrbMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.6,
            friction: 0.1,
            density: 0.04,
            linear_damping: 1.2,
        }
    }
}

/// Handle pair referencing an orb's rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbHandle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Active pointer drag: a kinematic body the pointer moves, spring-joined to
/// the grabbed orb.
struct PointerDrag {
    pointer_body: RigidBodyHandle,
    joint: ImpulseJointHandle,
}

// ---------------------------------------------------------------------------
// WellWorld
// ---------------------------------------------------------------------------

/// Bounded, gravity-driven 2D body space for the word well.
///
/// Wraps the rapier pipeline behind a minimal orb-shaped API: add, rescale,
/// remove, reposition, step, and a pointer drag constraint. The step loop is
/// owned by the caller. After [`WellWorld::teardown`] every operation is a
/// logged no-op, which makes session teardown race-tolerant.
pub struct WellWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    bounds: WellBounds,
    walls: Vec<RigidBodyHandle>,
    drag: Option<PointerDrag>,
    drag_stiffness: f32,
    open: bool,
}

impl WellWorld {
    /// Create a bounded world. Allocates the four static boundary colliders
    /// centered on the rectangle edges (walls-at-edges placement; rendered
    /// positions are clamped every frame regardless, see the synchronizer).
    pub fn new(bounds: WellBounds, gravity: Vec2) -> Self {
        let mut world = Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            bounds,
            walls: Vec::with_capacity(4),
            drag: None,
            drag_stiffness: 0.2,
            open: true,
        };

        let w = bounds.width;
        let h = bounds.height;
        let half_t = WALL_THICKNESS / 2.0;
        // Floor, left, right, and a ceiling above the fall-in spawn zone.
        world.add_wall(Vec2::new(w / 2.0, h + half_t), w / 2.0, half_t);
        world.add_wall(Vec2::new(-half_t, h / 2.0), half_t, h / 2.0);
        world.add_wall(Vec2::new(w + half_t, h / 2.0), half_t, h / 2.0);
        world.add_wall(
            Vec2::new(w / 2.0, CEILING_OFFSET),
            w / 2.0,
            half_t,
        );
        world
    }

    fn add_wall(&mut self, center: Vec2, half_width: f32, half_height: f32) {
        let rb = RigidBodyBuilder::new(RigidBodyType::Fixed)
            .translation(vec2_to_na(center))
            .build();
        let handle = self.bodies.insert(rb);
        let collider = ColliderBuilder::cuboid(half_width, half_height).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.walls.push(handle);
    }

    /// The playfield rectangle this world was created with.
    pub fn bounds(&self) -> WellBounds {
        self.bounds
    }

    /// Matter-style pointer drag stiffness (0..1).
    pub fn set_drag_stiffness(&mut self, stiffness: f32) {
        self.drag_stiffness = stiffness;
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Add a circular orb body. The initial position may sit above the
    /// visible bounds (negative y) for the fall-in entrance.
    pub fn add_orb(
        &mut self,
        position: Vec2,
        radius: f32,
        material: OrbMaterial,
    ) -> Result<OrbHandle, WellError> {
        if !self.open {
            return Err(WellError::TornDown);
        }
        if radius <= 0.0 {
            return Err(WellError::InvalidRadius(radius));
        }

        let rb = RigidBodyBuilder::new(RigidBodyType::Dynamic)
            .translation(vec2_to_na(position))
            .linear_damping(material.linear_damping)
            .build();
        let body = self.bodies.insert(rb);

        let collider = ColliderBuilder::ball(radius)
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        Ok(OrbHandle { body, collider })
    }

    /// Uniformly rescale an orb's ball collider. Returns the new radius.
    /// Does not reposition; the synchronizer clamps afterwards.
    pub fn scale_orb(&mut self, orb: OrbHandle, factor: f32) -> Result<f32, WellError> {
        if !self.open {
            return Err(WellError::TornDown);
        }
        if factor <= 0.0 {
            return Err(WellError::InvalidScale(factor));
        }
        let collider = self
            .colliders
            .get_mut(orb.collider)
            .ok_or(WellError::UnknownOrb)?;
        let radius = collider
            .shape()
            .as_ball()
            .map(|b| b.radius)
            .ok_or(WellError::UnknownOrb)?;
        let new_radius = radius * factor;
        if new_radius <= 0.0 {
            return Err(WellError::InvalidRadius(new_radius));
        }
        collider.set_shape(SharedShape::ball(new_radius));
        if let Some(rb) = self.bodies.get_mut(orb.body) {
            rb.wake_up(true);
        }
        Ok(new_radius)
    }

    /// Remove an orb and its collider from the simulation.
    pub fn remove_orb(&mut self, orb: OrbHandle) {
        if !self.open {
            log::debug!("remove_orb on torn-down world, ignoring");
            return;
        }
        self.bodies.remove(
            orb.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Remove every dynamic orb, keeping the boundary walls.
    pub fn clear(&mut self) {
        if !self.open {
            log::debug!("clear on torn-down world, ignoring");
            return;
        }
        self.pointer_up();
        let dynamic: Vec<RigidBodyHandle> = self
            .bodies
            .iter()
            .filter(|(h, rb)| rb.is_dynamic() && !self.walls.contains(h))
            .map(|(h, _)| h)
            .collect();
        for handle in dynamic {
            self.bodies.remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    /// Tear the world down. All subsequent operations become no-ops.
    pub fn teardown(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.drag = None;
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.walls.clear();
        log::debug!("well world torn down");
    }

    /// Whether the world is still live.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Step the simulation once. Driven by an external runner; this adapter
    /// does not own the frame loop.
    pub fn step(&mut self, dt: f32) {
        if !self.open {
            return;
        }
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Current position and rotation of an orb. Zero if the handle is stale
    /// or the world is torn down.
    pub fn orb_position(&self, orb: OrbHandle) -> (Vec2, f32) {
        self.bodies
            .get(orb.body)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Teleport an orb's physics body. Used by the synchronizer's clamp
    /// write-back so the simulated position can't drift outside the frame
    /// while the visual stays clamped.
    pub fn set_orb_position(&mut self, orb: OrbHandle, position: Vec2) {
        if !self.open {
            return;
        }
        if let Some(rb) = self.bodies.get_mut(orb.body) {
            rb.set_translation(vec2_to_na(position), true);
        }
    }

    /// Current ball radius of an orb's collider.
    pub fn orb_radius(&self, orb: OrbHandle) -> Option<f32> {
        self.colliders
            .get(orb.collider)?
            .shape()
            .as_ball()
            .map(|b| b.radius)
    }

    /// Number of dynamic orbs in the simulation (walls excluded).
    pub fn orb_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|(h, rb)| rb.is_dynamic() && !self.walls.contains(h))
            .count()
    }

    // -- Pointer drag --

    /// Begin dragging the orb under the pointer, if any. Points outside the
    /// playfield never grab, so overlapping non-simulation controls keep
    /// their clicks. Returns whether an orb was grabbed.
    pub fn pointer_down(&mut self, p: Vec2) -> bool {
        if !self.open || !self.bounds.contains(p) {
            return false;
        }
        self.pointer_up();

        let Some(grabbed) = self.orb_at_point(p) else {
            return false;
        };

        let pointer_rb = RigidBodyBuilder::new(RigidBodyType::KinematicPositionBased)
            .translation(vec2_to_na(p))
            .build();
        let pointer_body = self.bodies.insert(pointer_rb);

        let joint = SpringJointBuilder::new(
            0.0,
            self.drag_stiffness * POINTER_SPRING_SCALE,
            POINTER_SPRING_DAMPING,
        )
        .build();
        let joint = self
            .impulse_joints
            .insert(pointer_body, grabbed, joint, true);

        self.drag = Some(PointerDrag { pointer_body, joint });
        true
    }

    /// Move the pointer while dragging.
    pub fn pointer_move(&mut self, p: Vec2) {
        if !self.open {
            return;
        }
        if let Some(drag) = &self.drag {
            if let Some(rb) = self.bodies.get_mut(drag.pointer_body) {
                rb.set_next_kinematic_position(nalgebra::Isometry2::new(vec2_to_na(p), 0.0));
            }
        }
    }

    /// Release the current drag, if any.
    pub fn pointer_up(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if !self.open {
            return;
        }
        self.impulse_joints.remove(drag.joint, true);
        self.bodies.remove(
            drag.pointer_body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Whether a drag is currently active.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // -- private helpers --

    /// Hit-test the dynamic orbs. All orbs are balls, so a distance check
    /// against each collider is enough.
    fn orb_at_point(&self, p: Vec2) -> Option<RigidBodyHandle> {
        for (_, collider) in self.colliders.iter() {
            let Some(ball) = collider.shape().as_ball() else {
                continue;
            };
            let Some(parent) = collider.parent() else {
                continue;
            };
            let Some(rb) = self.bodies.get(parent) else {
                continue;
            };
            if !rb.is_dynamic() {
                continue;
            }
            let center = Vec2::new(collider.translation().x, collider.translation().y);
            if center.distance(p) <= ball.radius {
                return Some(parent);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> WellWorld {
        WellWorld::new(WellBounds::new(400.0, 700.0), Vec2::new(0.0, 981.0))
    }

    #[test]
    fn add_and_remove_orb() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        assert_eq!(world.orb_count(), 1);
        world.remove_orb(orb);
        assert_eq!(world.orb_count(), 0);
    }

    #[test]
    fn rejects_non_positive_radius() {
        let mut world = test_world();
        let err = world
            .add_orb(Vec2::new(200.0, 100.0), 0.0, OrbMaterial::default())
            .unwrap_err();
        assert!(matches!(err, WellError::InvalidRadius(_)));
        let err = world
            .add_orb(Vec2::new(200.0, 100.0), -5.0, OrbMaterial::default())
            .unwrap_err();
        assert!(matches!(err, WellError::InvalidRadius(_)));
    }

    #[test]
    fn orb_falls_under_gravity() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, -100.0), 20.0, OrbMaterial::default())
            .unwrap();
        let (start, _) = world.orb_position(orb);
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let (end, _) = world.orb_position(orb);
        assert!(end.y > start.y, "orb should fall: start={start:?} end={end:?}");
    }

    #[test]
    fn floor_stops_falling_orb() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        // Plenty of time to fall 700px and settle.
        for _ in 0..600 {
            world.step(1.0 / 60.0);
        }
        let (pos, _) = world.orb_position(orb);
        assert!(
            pos.y <= 700.0 + 1.0,
            "orb should rest on the floor, not fall through: y={}",
            pos.y
        );
    }

    #[test]
    fn scale_orb_multiplies_radius() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        let new_radius = world.scale_orb(orb, 1.25).unwrap();
        assert!((new_radius - 25.0).abs() < 1e-4);
        assert!((world.orb_radius(orb).unwrap() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn scale_orb_rejects_non_positive_factor() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        assert!(matches!(
            world.scale_orb(orb, 0.0),
            Err(WellError::InvalidScale(_))
        ));
        assert!(matches!(
            world.scale_orb(orb, -1.0),
            Err(WellError::InvalidScale(_))
        ));
        // Radius untouched after the rejected calls.
        assert!((world.orb_radius(orb).unwrap() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn torn_down_world_is_noop() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        world.teardown();
        assert!(!world.is_open());

        assert!(matches!(
            world.add_orb(Vec2::new(0.0, 0.0), 20.0, OrbMaterial::default()),
            Err(WellError::TornDown)
        ));
        assert!(matches!(world.scale_orb(orb, 2.0), Err(WellError::TornDown)));
        // These must not panic.
        world.remove_orb(orb);
        world.clear();
        world.step(1.0 / 60.0);
        world.set_orb_position(orb, Vec2::ZERO);
        world.pointer_up();
        assert_eq!(world.orb_position(orb), (Vec2::ZERO, 0.0));
    }

    #[test]
    fn set_orb_position_teleports() {
        let mut world = test_world();
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        world.set_orb_position(orb, Vec2::new(50.0, 60.0));
        let (pos, _) = world.orb_position(orb);
        assert!((pos.x - 50.0).abs() < 1e-4);
        assert!((pos.y - 60.0).abs() < 1e-4);
    }

    #[test]
    fn clear_removes_orbs_but_keeps_walls() {
        let mut world = test_world();
        for i in 0..3 {
            world
                .add_orb(
                    Vec2::new(100.0 + i as f32 * 50.0, 100.0),
                    20.0,
                    OrbMaterial::default(),
                )
                .unwrap();
        }
        assert_eq!(world.orb_count(), 3);
        world.clear();
        assert_eq!(world.orb_count(), 0);
        // Walls still contain a fresh orb.
        let orb = world
            .add_orb(Vec2::new(200.0, 100.0), 20.0, OrbMaterial::default())
            .unwrap();
        for _ in 0..600 {
            world.step(1.0 / 60.0);
        }
        let (pos, _) = world.orb_position(orb);
        assert!(pos.y <= 700.0 + 1.0);
    }

    #[test]
    fn pointer_down_outside_bounds_does_not_grab() {
        let mut world = test_world();
        world
            .add_orb(Vec2::new(200.0, 350.0), 20.0, OrbMaterial::default())
            .unwrap();
        assert!(!world.pointer_down(Vec2::new(-50.0, 350.0)));
        assert!(!world.pointer_down(Vec2::new(200.0, 800.0)));
        assert!(!world.is_dragging());
    }

    #[test]
    fn pointer_grabs_and_pulls_orb() {
        let mut world = WellWorld::new(WellBounds::new(400.0, 700.0), Vec2::ZERO);
        let orb = world
            .add_orb(Vec2::new(200.0, 350.0), 20.0, OrbMaterial::default())
            .unwrap();
        assert!(world.pointer_down(Vec2::new(200.0, 350.0)));
        assert!(world.is_dragging());

        world.pointer_move(Vec2::new(300.0, 350.0));
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        let (pos, _) = world.orb_position(orb);
        assert!(pos.x > 210.0, "drag should pull the orb right: x={}", pos.x);

        world.pointer_up();
        assert!(!world.is_dragging());
    }

    #[test]
    fn pointer_down_on_empty_space_is_no_grab() {
        let mut world = test_world();
        world
            .add_orb(Vec2::new(200.0, 350.0), 20.0, OrbMaterial::default())
            .unwrap();
        assert!(!world.pointer_down(Vec2::new(50.0, 50.0)));
    }
}
