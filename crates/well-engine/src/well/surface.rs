use glam::Vec2;

use crate::bridge::protocol::WireMessage;
use crate::bridge::transport::{Endpoint, TransportError};
use crate::core::physics::{WellBounds, WellWorld};
use crate::core::rng::Rng;
use crate::core::time::FixedTimestep;
use crate::well::render::RenderLoop;
use crate::well::sync::OrbSync;

/// Orb color palette for newly dropped words.
const ORB_COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEEAD", "#D4A5A5", "#9B59B6", "#3498DB",
];

/// Configuration for a word-well surface.
#[derive(Debug, Clone)]
pub struct WellConfig {
    /// Playfield width in pixels.
    pub width: f32,
    /// Playfield height in pixels.
    pub height: f32,
    /// Gravity vector, Y-down positive.
    pub gravity: Vec2,
    /// Fixed physics timestep in seconds.
    pub fixed_dt: f32,
    /// Matter-style pointer drag stiffness (0..1).
    pub drag_stiffness: f32,
    /// Seed for spawn positions and color picks.
    pub seed: u64,
}

impl Default for WellConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 700.0,
            gravity: Vec2::new(0.0, 981.0),
            fixed_dt: 1.0 / 60.0,
            drag_stiffness: 0.2,
            seed: 42,
        }
    }
}

/// The presentation-surface side of a word-well session.
///
/// Owns the simulation world, the orb synchronizer, and the render loop, and
/// talks to the host over its endpoint. Construction sends `READY`; the host
/// answers with the full word list and the surface reconciles from there.
/// `close` cancels the render schedule and tears the world down, after which
/// every frame is a no-op — a stale schedule can't act on the disposed world.
pub struct WellSurface {
    endpoint: Endpoint,
    world: WellWorld,
    sync: OrbSync,
    render: RenderLoop,
    timestep: FixedTimestep,
    rng: Rng,
    open: bool,
}

impl WellSurface {
    /// Build the surface over an endpoint and signal readiness to the host.
    /// A failed `READY` send means the session never left closed; the caller
    /// may retry with a fresh channel.
    pub fn open(endpoint: Endpoint, config: WellConfig) -> Result<Self, TransportError> {
        let bounds = WellBounds::new(config.width, config.height);
        let mut world = WellWorld::new(bounds, config.gravity);
        world.set_drag_stiffness(config.drag_stiffness);
        world.set_dt(config.fixed_dt);

        endpoint.send(&WireMessage::Ready)?;
        log::info!("word well surface ready ({}x{})", config.width, config.height);

        Ok(Self {
            endpoint,
            world,
            sync: OrbSync::new(bounds, config.seed),
            render: RenderLoop::new(),
            timestep: FixedTimestep::new(config.fixed_dt),
            rng: Rng::new(config.seed.wrapping_mul(0x9E37_79B9)),
            open: true,
        })
    }

    /// Process everything the host has sent. Returns the number of messages
    /// handled. Reconciliation happens here, on data-change events — not on
    /// the frame cadence.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.endpoint.recv() {
            handled += 1;
            match msg {
                WireMessage::UpdateWords { words } => {
                    log::debug!("reconciling {} words", words.len());
                    self.sync.reconcile(&mut self.world, &words);
                }
                WireMessage::Unknown => {
                    log::debug!("surface ignoring unknown message");
                }
                other => {
                    log::debug!("surface ignoring {other:?}");
                }
            }
        }
        handled
    }

    /// Advance one animation frame: step the simulation by however many
    /// fixed ticks the frame delta covers, then refresh the orb transforms.
    /// Returns false once the session is closed.
    pub fn frame(&mut self, frame_dt: f32) -> bool {
        if !self.open {
            return false;
        }
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.world.step(self.timestep.dt());
        }
        self.render.frame(&mut self.world, &self.sync)
    }

    /// Drop a new word into the well. The color comes from the orb palette;
    /// the host assigns the id and votes and echoes the full list back.
    pub fn add_word(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let color = ORB_COLORS[self.rng.next_int(ORB_COLORS.len() as u32) as usize];
        self.send(WireMessage::AddWord {
            text: text.to_owned(),
            color: color.to_owned(),
        });
    }

    /// Vote for a word (clicking its orb).
    pub fn vote(&mut self, id: &str) {
        self.send(WireMessage::VoteWord { id: id.to_owned() });
    }

    /// Close the session: tell the host, cancel the render schedule, tear
    /// down the world.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.send(WireMessage::Close);
        self.open = false;
        self.render.cancel();
        self.world.teardown();
        self.sync.clear();
        log::info!("word well surface closed");
    }

    /// Word-well sends are fire-and-forget: if the host side is gone the
    /// message is dropped with a log, per the transport-failure policy.
    fn send(&self, msg: WireMessage) {
        if let Err(err) = self.endpoint.send(&msg) {
            log::warn!("dropping {msg:?}: {err}");
        }
    }

    // -- Pointer passthrough --

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.world.pointer_down(Vec2::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.world.pointer_move(Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.world.pointer_up();
    }

    // -- Accessors --

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of orbs currently tracked.
    pub fn orb_count(&self) -> usize {
        self.sync.len()
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well::word::Word;

    fn words(entries: &[(&str, u32)]) -> Vec<Word> {
        entries
            .iter()
            .map(|(id, votes)| Word {
                id: (*id).into(),
                text: (*id).into(),
                votes: *votes,
                color: "#fff".into(),
            })
            .collect()
    }

    #[test]
    fn open_sends_ready() {
        let (host, surface_end) = Endpoint::pair();
        let _surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        assert_eq!(host.recv(), Some(WireMessage::Ready));
    }

    #[test]
    fn update_words_reconciles_orbs() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        host.send(&WireMessage::UpdateWords {
            words: words(&[("a", 0), ("b", 1)]),
        })
        .unwrap();
        assert_eq!(surface.pump(), 1);
        assert_eq!(surface.orb_count(), 2);
    }

    #[test]
    fn add_word_sends_palette_color() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        let _ = host.recv(); // READY
        surface.add_word("  joy  ");
        match host.recv() {
            Some(WireMessage::AddWord { text, color }) => {
                assert_eq!(text, "joy");
                assert!(ORB_COLORS.contains(&color.as_str()));
            }
            other => panic!("expected ADD_WORD, got {other:?}"),
        }
    }

    #[test]
    fn empty_word_is_not_sent() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        let _ = host.recv(); // READY
        surface.add_word("   ");
        assert_eq!(host.recv(), None);
    }

    #[test]
    fn close_sends_close_and_stops_frames() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        host.send(&WireMessage::UpdateWords {
            words: words(&[("a", 0), ("b", 0), ("c", 0)]),
        })
        .unwrap();
        surface.pump();
        assert!(surface.frame(1.0 / 60.0));
        let frames_before = surface.render_loop().frames();

        surface.close();
        let drained = host.drain();
        assert!(drained.contains(&WireMessage::Close));

        // The cancelled schedule must not execute again.
        assert!(!surface.frame(1.0 / 60.0));
        assert_eq!(surface.render_loop().frames(), frames_before);
    }

    #[test]
    fn fresh_session_starts_with_zero_orbs() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        host.send(&WireMessage::UpdateWords {
            words: words(&[("a", 0), ("b", 0), ("c", 0)]),
        })
        .unwrap();
        surface.pump();
        assert_eq!(surface.orb_count(), 3);
        surface.close();

        // A new session on a fresh channel tracks nothing until the host
        // pushes the word list again.
        let (host2, surface_end2) = Endpoint::pair();
        let mut surface2 = WellSurface::open(surface_end2, WellConfig::default()).unwrap();
        assert_eq!(host2.recv(), Some(WireMessage::Ready));
        assert_eq!(surface2.orb_count(), 0);
        host2
            .send(&WireMessage::UpdateWords {
                words: words(&[("a", 0)]),
            })
            .unwrap();
        surface2.pump();
        assert_eq!(surface2.orb_count(), 1);
    }

    #[test]
    fn send_after_host_gone_is_dropped_not_fatal() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        host.close();
        surface.vote("1");
        surface.add_word("joy");
        // Still alive; frames keep running until an explicit close.
        assert!(surface.frame(1.0 / 60.0));
    }

    #[test]
    fn unknown_messages_are_ignored() {
        let (host, surface_end) = Endpoint::pair();
        let mut surface = WellSurface::open(surface_end, WellConfig::default()).unwrap();
        host.send(&WireMessage::Unknown).unwrap();
        host.send(&WireMessage::AudioReady).unwrap();
        assert_eq!(surface.pump(), 2);
        assert_eq!(surface.orb_count(), 0);
        assert!(surface.is_open());
    }
}
