//! Speech I/O capability seam.
//!
//! Browser speech APIs are process-wide singletons in the client runtime;
//! the engine never touches them directly. It talks to this narrow trait,
//! so the server runtime injects a no-op and tests inject doubles.
//!
//! Interim/final transcript callbacks stay in the client adapter: the
//! engine receives finalized answers through the turn-submission boundary.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle for an active microphone capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHandle(pub u64);

/// Opaque handle for an in-flight spoken utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackHandle(pub u64);

pub trait SpeechIo: Send + Sync {
    /// Begins continuous speech capture. The adapter restarts recognition
    /// across short pauses until `stop_capture` is called.
    fn start_capture(&self) -> CaptureHandle;

    fn stop_capture(&self, handle: CaptureHandle);

    /// Speaks `text`. Returns `None` when audio output is disabled, in
    /// which case callers must not wait for playback.
    fn speak(&self, text: &str) -> Option<PlaybackHandle>;

    fn cancel_speech(&self, handle: PlaybackHandle);
}

/// Speech adapter for runtimes without audio. Capture handles are issued
/// but carry no audio; `speak` reports output disabled.
#[derive(Default)]
pub struct NullSpeech {
    next_handle: AtomicU64,
}

impl SpeechIo for NullSpeech {
    fn start_capture(&self) -> CaptureHandle {
        CaptureHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn stop_capture(&self, _handle: CaptureHandle) {}

    fn speak(&self, _text: &str) -> Option<PlaybackHandle> {
        None
    }

    fn cancel_speech(&self, _handle: PlaybackHandle) {}
}
