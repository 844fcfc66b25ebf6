use well_engine::{Endpoint, WireMessage, Word};

use crate::audio::AudioChannel;
use crate::session::{HandlerChain, SessionError, SessionKind, SessionLease, SessionState};
use crate::store::WordStore;

/// Parameters for opening a presentation surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDesc {
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    pub title: &'static str,
}

/// The word-well surface window.
const WELL_SURFACE: SurfaceDesc = SurfaceDesc {
    width: 400.0,
    height: 700.0,
    visible: true,
    title: "The Word Well",
};

/// The host capability for showing and closing presentation surfaces.
/// `show` yields the host-side endpoint of the new surface's channel.
pub trait SurfaceOpener {
    fn show(&mut self, desc: &SurfaceDesc) -> Result<Endpoint, SessionError>;
    fn close(&mut self);
}

/// One live word-well session on the host side.
struct WellSession {
    endpoint: Endpoint,
    state: SessionState,
    lease: SessionLease,
}

/// The host process: owns the authoritative word store, the handler chain,
/// and the lifecycle of both session kinds.
///
/// The single message-handler slot is the one point of mutual exclusion:
/// the word well and the audio sink never hold it at the same time. Opening
/// the word well closes the audio sink first; opening the word well while a
/// session is already live reuses that session.
pub struct WidgetHost<O: SurfaceOpener> {
    store: WordStore,
    opener: O,
    chain: HandlerChain,
    well: Option<WellSession>,
    audio: Option<AudioChannel>,
}

impl<O: SurfaceOpener> WidgetHost<O> {
    pub fn new(opener: O) -> Self {
        Self {
            store: WordStore::new(),
            opener,
            chain: HandlerChain::new(),
            well: None,
            audio: None,
        }
    }

    pub fn with_store(opener: O, store: WordStore) -> Self {
        Self {
            store,
            ..Self::new(opener)
        }
    }

    /// Open the word well. A no-op when a session is already live; the
    /// audio sink, if open, is closed first so exactly one handler owns the
    /// slot afterwards. A failed open leaves the session closed and
    /// retryable.
    pub fn open_word_well(&mut self) -> Result<(), SessionError> {
        if self.well.is_some() {
            log::info!("word well already open, reusing session");
            return Ok(());
        }
        self.close_audio();

        let endpoint = self.opener.show(&WELL_SURFACE)?;
        self.chain.register(SessionKind::WordWell);
        self.well = Some(WellSession {
            endpoint,
            state: SessionState::Opening,
            lease: SessionLease::acquire(),
        });
        log::info!("word well session opening");
        Ok(())
    }

    /// Drain both channels and dispatch every delivered message through the
    /// handler chain. Returns the number of messages dispatched.
    pub fn pump(&mut self) -> usize {
        let mut inbox = Vec::new();
        if let Some(well) = &self.well {
            inbox.extend(well.endpoint.drain());
        }
        if let Some(audio) = &self.audio {
            inbox.extend(audio.drain_status());
        }
        let count = inbox.len();
        for msg in inbox {
            self.dispatch(msg);
        }
        count
    }

    /// Walk the chain from the most recently installed handler; a handler
    /// only consumes its own message family, everything else falls through.
    /// Messages nobody claims are ignored with a log, never an error.
    fn dispatch(&mut self, msg: WireMessage) {
        for kind in self.chain.dispatch_order() {
            match kind {
                SessionKind::WordWell if msg.is_well_request() => {
                    self.handle_well(msg);
                    return;
                }
                SessionKind::Audio if msg.is_audio_status() => {
                    if let Some(audio) = &mut self.audio {
                        audio.on_status(&msg);
                    }
                    return;
                }
                _ => {}
            }
        }
        log::debug!("no handler claimed {msg:?}, ignoring");
    }

    fn handle_well(&mut self, msg: WireMessage) {
        match msg {
            WireMessage::Ready => {
                if let Some(well) = &mut self.well {
                    well.state = SessionState::Ready;
                }
                self.broadcast_words();
            }
            WireMessage::AddWord { text, color } => {
                let id = self.store.append(&text, &color);
                log::info!("word {id} added: {text}");
                if let Some(well) = &mut self.well {
                    well.state = SessionState::Active;
                }
                self.broadcast_words();
            }
            WireMessage::VoteWord { id } => {
                if self.store.increment_vote(&id) {
                    if let Some(well) = &mut self.well {
                        well.state = SessionState::Active;
                    }
                    self.broadcast_words();
                }
            }
            WireMessage::Close => self.close_word_well(),
            other => log::debug!("word well handler ignoring {other:?}"),
        }
    }

    /// Push the full authoritative list to the surface. The surface's copy
    /// is read-derived; every mutation rebroadcasts the whole list.
    fn broadcast_words(&mut self) {
        let Some(well) = &self.well else {
            return;
        };
        let msg = WireMessage::UpdateWords {
            words: self.store.get_all().to_vec(),
        };
        if let Err(err) = well.endpoint.send(&msg) {
            log::warn!("dropping word broadcast, surface is gone: {err}");
        }
    }

    /// Tear down the word-well session and release the handler slot.
    pub fn close_word_well(&mut self) {
        let Some(mut well) = self.well.take() else {
            return;
        };
        well.endpoint.close();
        self.opener.close();
        self.chain.deregister(SessionKind::WordWell);
        well.lease.release();
        log::info!("word well session closed");
    }

    // -- Audio commands --

    pub fn play_beep(&mut self, frequency: f32, duration: f32, volume: f32) {
        // The sink's synth is quiet; keep beeps above the audible floor.
        self.audio_send(WireMessage::PlayBeep {
            frequency,
            duration,
            volume: volume.max(0.5),
        });
    }

    pub fn load_audio(&mut self, url: &str, name: &str) {
        self.audio_send(WireMessage::LoadAudio {
            url: url.to_owned(),
            name: name.to_owned(),
        });
    }

    pub fn play_audio(&mut self, name: &str, volume: f32) {
        self.audio_send(WireMessage::PlayAudio {
            name: name.to_owned(),
            volume,
        });
    }

    pub fn play_synth_note(&mut self, frequency: f32, duration: f32, volume: f32, waveform: &str) {
        self.audio_send(WireMessage::PlaySynthNote {
            frequency,
            duration,
            volume,
            waveform: waveform.to_owned(),
        });
    }

    /// Route a playback command to the sink, opening it lazily. While the
    /// word well holds the handler slot the sink stays suspended and the
    /// command is dropped — audio is unavailable for that session.
    fn audio_send(&mut self, cmd: WireMessage) {
        if self.well.is_some() {
            log::warn!("audio sink suspended while the word well is open, dropping {cmd:?}");
            return;
        }
        if self.audio.is_none() {
            match AudioChannel::open(&mut self.opener) {
                Ok(channel) => {
                    self.chain.register(SessionKind::Audio);
                    self.audio = Some(channel);
                }
                Err(err) => {
                    log::error!("audio player unavailable: {err}");
                    return;
                }
            }
        }
        if let Some(audio) = &mut self.audio {
            audio.send(cmd);
        }
    }

    /// Close the audio sink, if open, releasing the handler slot.
    pub fn close_audio(&mut self) {
        if let Some(mut audio) = self.audio.take() {
            audio.close(&mut self.opener);
            self.chain.deregister(SessionKind::Audio);
            log::debug!("audio sink closed");
        }
    }

    // -- Accessors --

    pub fn words(&self) -> &[Word] {
        self.store.get_all()
    }

    pub fn well_state(&self) -> SessionState {
        self.well
            .as_ref()
            .map_or(SessionState::Closed, |w| w.state)
    }

    pub fn audio_state(&self) -> SessionState {
        self.audio
            .as_ref()
            .map_or(SessionState::Closed, |a| a.state())
    }

    pub fn handler_count(&self) -> usize {
        self.chain.len()
    }

    pub fn opener_mut(&mut self) -> &mut O {
        &mut self.opener
    }
}

/// In-process [`SurfaceOpener`]: each `show` produces a connected endpoint
/// pair and hands the surface side back through `opened`. Used by the demo
/// and the tests in place of the real windowing capability.
#[derive(Default)]
pub struct PairOpener {
    /// Surface-side endpoints with their descriptors, in open order.
    pub opened: Vec<(SurfaceDesc, Endpoint)>,
    /// Number of `close` calls observed.
    pub closed: usize,
    /// Make the next `show` fail, for init-failure paths.
    pub fail_next: bool,
}

impl PairOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the surface endpoint of the most recently opened surface.
    pub fn take_latest(&mut self) -> Option<(SurfaceDesc, Endpoint)> {
        self.opened.pop()
    }
}

impl SurfaceOpener for PairOpener {
    fn show(&mut self, desc: &SurfaceDesc) -> Result<Endpoint, SessionError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SessionError::SurfaceUnavailable(
                "synthetic failure".into(),
            ));
        }
        let (host_end, surface_end) = Endpoint::pair();
        self.opened.push((desc.clone(), surface_end));
        Ok(host_end)
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}
