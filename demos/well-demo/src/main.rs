//! Headless run of a full word-well session: host and surface wired over an
//! in-process channel pair, a few words dropped and voted on, one pointer
//! drag, then teardown and a beep to show the audio sink coming back.

use well_engine::{WellConfig, WellSurface};
use well_widget::{PairOpener, SessionState, WidgetHost};

const FRAME_DT: f32 = 1.0 / 60.0;
const SETTLE_FRAMES: u32 = 120;

fn main() {
    env_logger::init();

    let mut host = WidgetHost::new(PairOpener::new());

    // Audio first, so the well visibly supersedes it.
    host.play_beep(440.0, 150.0, 0.3);
    let (_, audio_sink) = host
        .opener_mut()
        .take_latest()
        .unwrap_or_else(|| panic!("audio surface was not opened"));
    audio_sink.send(&well_engine::WireMessage::AudioReady).ok();
    host.pump();
    log::info!(
        "audio sink {:?}, delivered {} command(s)",
        host.audio_state(),
        audio_sink.drain().len()
    );

    if let Err(err) = host.open_word_well() {
        log::error!("could not open the word well: {err}");
        return;
    }
    let (desc, surface_end) = host
        .opener_mut()
        .take_latest()
        .unwrap_or_else(|| panic!("well surface was not opened"));
    log::info!("surface \"{}\" shown ({}x{})", desc.title, desc.width, desc.height);

    let mut surface = match WellSurface::open(surface_end, WellConfig::default()) {
        Ok(surface) => surface,
        Err(err) => {
            log::error!("surface failed to signal ready: {err}");
            return;
        }
    };

    // READY reaches the host, the empty word list comes back.
    host.pump();
    surface.pump();

    for text in ["gratitude", "snow", "cocoa", "carols"] {
        surface.add_word(text);
    }
    host.pump();
    surface.pump();
    log::info!("{} words in the store, {} orbs falling", host.words().len(), surface.orb_count());

    // Let the orbs drop and settle.
    for _ in 0..SETTLE_FRAMES {
        surface.frame(FRAME_DT);
    }

    // Vote twice for the first word; its orb grows and gets re-clamped.
    if let Some(word) = host.words().first() {
        let id = word.id.clone();
        surface.vote(&id);
        surface.vote(&id);
    }
    host.pump();
    surface.pump();
    for _ in 0..SETTLE_FRAMES {
        surface.frame(FRAME_DT);
    }

    for word in host.words() {
        log::info!("  {} \"{}\": {} votes", word.id, word.text, word.votes);
    }

    // Grab whatever sits near the bottom center and fling it.
    if surface.pointer_down(200.0, 650.0) {
        for i in 0..30 {
            surface.pointer_move(200.0 - i as f32 * 4.0, 650.0 - i as f32 * 10.0);
            surface.frame(FRAME_DT);
        }
        surface.pointer_up();
        for _ in 0..SETTLE_FRAMES {
            surface.frame(FRAME_DT);
        }
    }

    log::info!("{} frames rendered", surface.render_loop().frames());

    // Beeps go nowhere while the well owns the handler slot.
    host.play_beep(880.0, 150.0, 0.8);
    assert_eq!(host.audio_state(), SessionState::Closed);

    surface.close();
    host.pump();
    log::info!("well closed, handlers left: {}", host.handler_count());

    // The sink reopens lazily once the slot is free again.
    host.play_beep(880.0, 150.0, 0.8);
    assert_eq!(host.audio_state(), SessionState::Opening);
    log::info!("audio sink available again");
}
