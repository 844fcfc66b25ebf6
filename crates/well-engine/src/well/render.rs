use bytemuck::{Pod, Zeroable};

use crate::core::physics::WellWorld;
use crate::well::sync::OrbSync;

/// Per-orb visual transform for one frame. The physics position is the body
/// center; display elements anchor from their top-left corner, so `x`/`y`
/// carry the `(center - radius)` offset. Pod layout so the embedding layer
/// can read the whole frame as a flat f32 buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct OrbTransform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub diameter: f32,
}

impl OrbTransform {
    pub const FLOATS: usize = 4;
}

/// The continuously running per-frame pass that maps tracked orbs to visual
/// transforms.
///
/// Runs on the surface's frame cadence, independent of reconciliation (which
/// runs on data-change events). Once cancelled — at session teardown — a
/// frame never executes again, so a stale schedule can't touch a disposed
/// world.
pub struct RenderLoop {
    ids: Vec<String>,
    transforms: Vec<OrbTransform>,
    cancelled: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            ids: Vec::with_capacity(32),
            transforms: Vec::with_capacity(32),
            cancelled: false,
            frames: 0,
        }
    }

    /// Produce this frame's transforms from the current body positions.
    /// Returns false (and does nothing) when the loop has been cancelled.
    pub fn frame(&mut self, world: &mut WellWorld, sync: &OrbSync) -> bool {
        if self.cancelled {
            return false;
        }
        self.ids.clear();
        self.transforms.clear();
        for id in sync.tracked_ids() {
            if let Some((pos, rotation, radius)) = sync.clamped_position(world, id) {
                self.ids.push(id.to_owned());
                self.transforms.push(OrbTransform {
                    x: pos.x - radius,
                    y: pos.y - radius,
                    rotation,
                    diameter: radius * 2.0,
                });
            }
        }
        self.frames += 1;
        true
    }

    /// Cancel the recurring schedule. Irreversible for this loop instance.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of frames that actually executed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// This frame's transforms, aligned with [`RenderLoop::ids`].
    pub fn transforms(&self) -> &[OrbTransform] {
        &self.transforms
    }

    /// Word ids aligned with [`RenderLoop::transforms`].
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Look up the transform for a word id.
    pub fn transform_for(&self, id: &str) -> Option<&OrbTransform> {
        self.ids
            .iter()
            .position(|i| i == id)
            .map(|idx| &self.transforms[idx])
    }

    /// The frame as a flat f32 buffer, [`OrbTransform::FLOATS`] per orb.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.transforms)
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::physics::WellBounds;
    use crate::well::word::Word;
    use glam::Vec2;

    fn word(id: &str, votes: u32) -> Word {
        Word {
            id: id.into(),
            text: id.into(),
            votes,
            color: "#fff".into(),
        }
    }

    fn setup(words: &[Word]) -> (WellWorld, OrbSync) {
        let bounds = WellBounds::new(400.0, 700.0);
        let mut world = WellWorld::new(bounds, Vec2::new(0.0, 981.0));
        let mut sync = OrbSync::new(bounds, 42);
        sync.reconcile(&mut world, words);
        (world, sync)
    }

    #[test]
    fn frame_emits_one_transform_per_orb() {
        let (mut world, sync) = setup(&[word("a", 0), word("b", 2)]);
        let mut render = RenderLoop::new();
        assert!(render.frame(&mut world, &sync));
        assert_eq!(render.transforms().len(), 2);
        assert_eq!(render.ids().len(), 2);
        assert_eq!(render.frames(), 1);
    }

    #[test]
    fn transform_uses_top_left_offset_and_diameter() {
        let (mut world, sync) = setup(&[word("a", 1)]);
        let mut render = RenderLoop::new();
        render.frame(&mut world, &sync);
        let t = render.transform_for("a").unwrap();
        // radius 25, clamped to the top edge after spawn above the frame
        assert_eq!(t.diameter, 50.0);
        assert_eq!(t.y, 0.0);
        assert!(t.x >= 0.0 && t.x + t.diameter <= 400.0);
    }

    #[test]
    fn cancelled_loop_never_runs() {
        let (mut world, sync) = setup(&[word("a", 0)]);
        let mut render = RenderLoop::new();
        assert!(render.frame(&mut world, &sync));
        render.cancel();
        assert!(!render.frame(&mut world, &sync));
        assert!(!render.frame(&mut world, &sync));
        assert_eq!(render.frames(), 1);
        assert!(render.is_cancelled());
    }

    #[test]
    fn flat_buffer_layout() {
        let (mut world, sync) = setup(&[word("a", 0)]);
        let mut render = RenderLoop::new();
        render.frame(&mut world, &sync);
        let floats = render.as_floats();
        assert_eq!(floats.len(), OrbTransform::FLOATS);
        let t = render.transforms()[0];
        assert_eq!(floats, [t.x, t.y, t.rotation, t.diameter]);
    }
}
