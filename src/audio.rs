//! The audio adapter layer (component F, spec.md §4.F).
//!
//! These traits are the seam between this crate and the host's playback and
//! capture device abstractions. The host owns the real implementations
//! (`cpal`, a SIP stack's RTP sink, whatever); this crate only ever talks to
//! them through `PlayerAdapter`/`CaptureAdapter`/`AuFileReader`, the same way
//! the teacher keeps `cpal`/`symphonia` behind small function boundaries
//! rather than letting device details leak into `Queue`/`Player` state.

use std::path::Path;

use crate::config::CaptureConfig;

/// Opaque handle to an in-flight playback operation. The scheduler never
/// inspects it, only holds it until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayHandle(pub u64);

/// Opaque handle to an in-flight capture operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to start playback of {path}: {reason}")]
    PlayStartFailed { path: String, reason: String },
    #[error("failed to start capture to {path}: {reason}")]
    CaptureStartFailed { path: String, reason: String },
    #[error("failed to open audio file {path}: {reason}")]
    OpenFailed { path: String, reason: String },
}

/// Reads a file's metadata to report its length. Used only by the parser
/// (spec.md §4.A: "building a Play reads the referenced file's metadata to
/// populate `length_ms`").
pub trait AuFileReader {
    /// Opens `path` and returns its total duration in milliseconds.
    fn open(&self, path: &Path) -> Result<u64, AudioError>;
}

/// Starts/stops playback of a single file. The host is expected to invoke
/// `Scheduler::on_complete` once playback reaches end of file or the handle
/// is released (spec.md §4.F).
pub trait PlayerAdapter {
    fn start(
        &mut self,
        path: &Path,
        offset_ms: u64,
        module: Option<&str>,
        device: Option<&str>,
    ) -> Result<PlayHandle, AudioError>;

    /// Idempotent: releasing a handle that is already released is a no-op.
    fn release(&mut self, handle: PlayHandle);
}

/// Starts/stops a single capture (record) operation.
pub trait CaptureAdapter {
    fn start(
        &mut self,
        params: &CaptureConfig,
        path: &Path,
        max_silence_ms: u64,
    ) -> Result<RecordHandle, AudioError>;

    fn release(&mut self, handle: RecordHandle);
}

/// Maps a DTMF digit to the pre-recorded tone file that plays it
/// (spec.md §4.E step 3 and §6).
pub fn dtmf_digit_filename(digit: char) -> String {
    match digit {
        '*' => "soundstar.wav".to_string(),
        '#' => "soundroute.wav".to_string(),
        d if d.is_ascii_digit() => format!("sound{d}.wav"),
        d if d.is_ascii_alphabetic() => format!("sound{}.wav", d.to_ascii_uppercase()),
        d => unreachable!("invalid DTMF digit {d:?} should have been rejected at parse time"),
    }
}

/// `true` for the exact charset spec.md §3 allows for DTMF atoms: `0-9*#A-D`,
/// case-insensitive.
pub fn is_valid_dtmf_digit(c: char) -> bool {
    c.is_ascii_digit() || c == '*' || c == '#' || matches!(c.to_ascii_uppercase(), 'A'..='D')
}
