//! Shared test doubles for the integration suite: a controllable clock and
//! adapters that record every call instead of touching real audio hardware.
//! Adapters hand out a cloned handle to their event log so a test can keep
//! inspecting it after the adapter itself has been moved into a `Scheduler`.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use vqueue::audio::{
    AudioError, AuFileReader, CaptureAdapter, PlayHandle, PlayerAdapter, RecordHandle,
};
use vqueue::clock::Clock;
use vqueue::config::CaptureConfig;

#[derive(Default)]
pub struct FakeClock(Cell<u64>);

impl FakeClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

/// Reports a length looked up by filename, for tests that need more than
/// one duration in play at once.
#[derive(Clone, Default)]
pub struct TableReader(pub Vec<(&'static str, u64)>);

impl TableReader {
    pub fn new(entries: Vec<(&'static str, u64)>) -> Self {
        Self(entries)
    }
}

impl AuFileReader for TableReader {
    fn open(&self, path: &Path) -> Result<u64, AudioError> {
        let name = path.display().to_string();
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, len)| *len)
            .ok_or_else(|| AudioError::OpenFailed {
                path: name.clone(),
                reason: "not in test fixture table".to_string(),
            })
    }
}

#[derive(Clone, Default)]
pub struct PlayLog(pub Rc<RefCell<Vec<(PathBuf, u64)>>>);

pub struct RecordingPlayer {
    next_handle: u64,
    log: PlayLog,
}

impl RecordingPlayer {
    pub fn new() -> (Self, PlayLog) {
        let log = PlayLog::default();
        (
            Self {
                next_handle: 0,
                log: log.clone(),
            },
            log,
        )
    }
}

impl PlayerAdapter for RecordingPlayer {
    fn start(
        &mut self,
        path: &Path,
        offset_ms: u64,
        _module: Option<&str>,
        _device: Option<&str>,
    ) -> Result<PlayHandle, AudioError> {
        self.next_handle += 1;
        self.log.0.borrow_mut().push((path.to_path_buf(), offset_ms));
        Ok(PlayHandle(self.next_handle))
    }

    fn release(&mut self, _handle: PlayHandle) {}
}

#[derive(Clone, Default)]
pub struct RecordLog(pub Rc<RefCell<Vec<PathBuf>>>);

pub struct RecordingCapture {
    next_handle: u64,
    log: RecordLog,
}

impl RecordingCapture {
    pub fn new() -> (Self, RecordLog) {
        let log = RecordLog::default();
        (
            Self {
                next_handle: 0,
                log: log.clone(),
            },
            log,
        )
    }
}

impl CaptureAdapter for RecordingCapture {
    fn start(
        &mut self,
        _params: &CaptureConfig,
        path: &Path,
        _max_silence_ms: u64,
    ) -> Result<RecordHandle, AudioError> {
        self.next_handle += 1;
        self.log.0.borrow_mut().push(path.to_path_buf());
        Ok(RecordHandle(self.next_handle))
    }

    fn release(&mut self, _handle: RecordHandle) {}
}
