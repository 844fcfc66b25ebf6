//! Host-side widget runtime for the word well.
//!
//! Owns the authoritative word store, the single message-handler slot shared
//! by the word-well and audio sessions, and the lazily-opened audio sink.
//! The physics surface itself lives in `well-engine`; this crate is the
//! process that opens it, feeds it words, and tears it down.

pub mod audio;
pub mod host;
pub mod session;
pub mod store;

pub use crate::audio::AudioChannel;
pub use crate::host::{PairOpener, SurfaceDesc, SurfaceOpener, WidgetHost};
pub use crate::session::{
    HandlerChain, LeaseProbe, SessionError, SessionKind, SessionLease, SessionState,
};
pub use crate::store::WordStore;
