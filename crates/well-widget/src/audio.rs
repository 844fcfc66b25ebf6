use std::collections::VecDeque;

use well_engine::{Endpoint, WireMessage};

use crate::host::{SurfaceDesc, SurfaceOpener};
use crate::session::{SessionError, SessionLease, SessionState};

/// The hidden audio-player surface, opened lazily on the first playback
/// request.
const AUDIO_SURFACE: SurfaceDesc = SurfaceDesc {
    width: 200.0,
    height: 100.0,
    visible: false,
    title: "Audio Player",
};

/// Singleton command sink for playback requests.
///
/// The sink is an opaque hidden surface: commands flow one way, status
/// signals flow back. Commands issued before the sink signals `AUDIO_READY`
/// are queued and flushed in order once it does; a repeated ready signal
/// finds an empty queue and replays nothing.
pub struct AudioChannel {
    endpoint: Endpoint,
    state: SessionState,
    pending: VecDeque<WireMessage>,
    lease: SessionLease,
}

impl AudioChannel {
    /// Open the hidden sink surface. Failure leaves no channel behind; the
    /// next playback request retries.
    pub fn open(opener: &mut dyn SurfaceOpener) -> Result<Self, SessionError> {
        let endpoint = opener.show(&AUDIO_SURFACE)?;
        log::debug!("audio player surface opened, waiting for ready");
        Ok(Self {
            endpoint,
            state: SessionState::Opening,
            pending: VecDeque::new(),
            lease: SessionLease::acquire(),
        })
    }

    /// Send a playback command, queueing while the sink isn't ready yet.
    /// A send failure re-queues the command rather than losing it.
    pub fn send(&mut self, cmd: WireMessage) {
        if !matches!(self.state, SessionState::Ready | SessionState::Active) {
            log::debug!("audio sink not ready, queueing {cmd:?}");
            self.pending.push_back(cmd);
            return;
        }
        if let Err(err) = self.endpoint.send(&cmd) {
            log::warn!("audio send failed ({err}), re-queueing");
            self.pending.push_back(cmd);
        }
    }

    /// Consume a status signal from the sink. Returns whether this channel
    /// handled the message.
    pub fn on_status(&mut self, msg: &WireMessage) -> bool {
        match msg {
            WireMessage::AudioReady => {
                if self.state == SessionState::Opening {
                    self.state = SessionState::Ready;
                    log::info!("audio sink ready");
                }
                self.flush();
                true
            }
            WireMessage::AudioLoaded { name, success } => {
                log::info!("audio sample {name} loaded (success: {success})");
                true
            }
            WireMessage::AudioInitialized { state } => {
                log::debug!("audio context initialized, state: {state}");
                true
            }
            _ => false,
        }
    }

    fn flush(&mut self) {
        let queued = self.pending.len();
        while let Some(cmd) = self.pending.pop_front() {
            if let Err(err) = self.endpoint.send(&cmd) {
                log::warn!("audio sink went away mid-flush: {err}");
                self.pending.push_front(cmd);
                break;
            }
        }
        let sent = queued - self.pending.len();
        if sent > 0 {
            log::debug!("flushed {sent} queued audio commands");
        }
    }

    /// Close the sink surface and release the handler slot. Pending
    /// commands are dropped with a logged count.
    pub fn close(&mut self, opener: &mut dyn SurfaceOpener) {
        if !self.pending.is_empty() {
            log::info!("dropping {} pending audio commands", self.pending.len());
            self.pending.clear();
        }
        self.endpoint.close();
        opener.close();
        self.state = SessionState::Closed;
        self.lease.release();
    }

    /// Drain status signals delivered by the sink surface.
    pub(crate) fn drain_status(&self) -> Vec<WireMessage> {
        self.endpoint.drain()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn lease(&self) -> &SessionLease {
        &self.lease
    }
}
