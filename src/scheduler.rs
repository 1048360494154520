//! The scheduler (component E, spec.md §4.E): the decision core. On every
//! enqueue or completion event it chooses the next atom to run, applies
//! mode-driven preemption/resumption adjustments, and dispatches to the
//! audio adapters.

use crate::atom::Atom;
use crate::audio::{AuFileReader, CaptureAdapter, PlayHandle, PlayerAdapter, RecordHandle};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::molecule::{InterruptPolicy, Molecule};
use crate::parser::{self, ParseError};
use crate::queue::VQueue;

/// What the host reports when the atom it was told to run stops being
/// active. `Cancelled` covers a handle the scheduler itself released
/// (spec.md §5); `RecordLengthMs` carries the captured duration a Record
/// atom only learns at completion time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Finished,
    Cancelled,
    RecordLengthMs(u64),
}

/// The audio-command priority scheduler. Owns the priority queue and the
/// single in-flight play/record handle; generic over the adapters and
/// clock so tests can substitute deterministic fakes (spec.md §9: one
/// instance per call session, not a process-global).
pub struct Scheduler<P, C, CL, R> {
    queue: VQueue,
    cur_play: Option<(PlayHandle, u64)>,
    cur_rec: Option<(RecordHandle, u64)>,
    player: P,
    capture: C,
    clock: CL,
    reader: R,
    config: SchedulerConfig,
}

impl<P, C, CL, R> Scheduler<P, C, CL, R>
where
    P: PlayerAdapter,
    C: CaptureAdapter,
    CL: Clock,
    R: AuFileReader,
{
    pub fn new(player: P, capture: C, clock: CL, reader: R, config: SchedulerConfig) -> Self {
        Self {
            queue: VQueue::new(),
            cur_play: None,
            cur_rec: None,
            player,
            capture,
            clock,
            reader,
            config,
        }
    }

    /// `vqueue_enqueue` from the command surface (spec.md §6): parses
    /// `line`, enqueues the resulting molecule, and returns its id, or `0`
    /// on a parse/validation failure (logged, no queue mutation).
    pub fn enqueue_command(&mut self, line: &str) -> u64 {
        match parser::parse(line, &self.reader) {
            Ok(molecule) => self.on_enqueue(molecule),
            Err(err) => {
                log::warn!("rejected command {line:?}: {err}");
                0
            }
        }
    }

    /// Parses `line` without enqueuing it, surfacing the typed error
    /// instead of collapsing it to `0` (used by callers that want the
    /// reason, e.g. a demo CLI echoing failures to the user).
    pub fn parse_command(&self, line: &str) -> Result<Molecule, ParseError> {
        parser::parse(line, &self.reader)
    }

    /// `on_enqueue` (spec.md §4.E): a newly parsed molecule arrives.
    ///
    /// spec.md §4.E step 3 qualifies the DontInterrupt bypass with "cur.priority
    /// >= new.priority", but its own worked scenario 6 has a priority-0
    /// DontInterrupt incumbent survive a priority-1 arrival — a strictly
    /// *higher* new priority. This implementation follows the worked
    /// scenario: DontInterrupt blocks preemption unconditionally while it is
    /// running, regardless of the arriving molecule's priority.
    pub fn on_enqueue(&mut self, new: Molecule) -> u64 {
        // The molecule actually holding the handle, not the lane-priority
        // head — those diverge when a DontInterrupt incumbent is running
        // with a higher-priority molecule already queued behind it.
        let current = self
            .running_id()
            .and_then(|id| self.queue.get_mut(id))
            .map(|m| (m.id, m.priority, m.mode.policy));
        let new_priority = new.priority;
        let id = self.queue.enqueue(new);

        if let Some((cur_id, cur_priority, cur_policy)) = current {
            if cur_policy == InterruptPolicy::DontInterrupt {
                return id;
            }
            if new_priority > cur_priority {
                self.preempt(cur_id);
            }
        }
        self.step();
        id
    }

    /// Applies `cur`'s interrupt policy to account for the preemption that
    /// is about to happen, then releases its in-flight handle (spec.md
    /// §4.E step 4).
    fn preempt(&mut self, cur_id: u64) {
        let now = self.clock.now_ms();
        if let Some((h, _)) = self.cur_play.take() {
            self.player.release(h);
        }
        if let Some((h, _)) = self.cur_rec.take() {
            self.capture.release(h);
        }

        let Some(cur) = self.queue.get_mut(cur_id) else {
            return;
        };
        if let Some(started) = cur.time_started_ms {
            cur.position_ms += now.saturating_sub(started);
        }
        cur.time_stopped_ms = Some(now);

        match cur.mode.policy {
            InterruptPolicy::Discard => {
                self.queue.cancel(cur_id);
            }
            InterruptPolicy::Restart => {
                cur.current = 0;
                cur.position_ms = 0;
                cur.time_stopped_ms = None;
                for atom in cur.atoms.iter_mut() {
                    atom.reset_runtime_state();
                }
            }
            InterruptPolicy::Pause | InterruptPolicy::Mute => {}
            InterruptPolicy::DontInterrupt => {
                log::warn!("preempting a dont_interrupt molecule {cur_id}; this should not happen");
            }
        }
    }

    /// `on_complete` (spec.md §4.E): the audio adapter reports that the
    /// currently dispatched atom finished. Since at most one operation is
    /// ever in flight (spec.md §5), the completion always refers to
    /// whichever molecule `cur_play`/`cur_rec` names.
    pub fn on_complete(&mut self, outcome: CompletionOutcome) {
        let Some(id) = self.running_id() else {
            return;
        };
        self.cur_play = None;
        self.cur_rec = None;

        if outcome == CompletionOutcome::Cancelled {
            self.step();
            return;
        }

        let Some(molecule) = self.queue.get_mut(id) else {
            // Already discarded by a concurrent cancel; a stale completion
            // for it is a safe no-op.
            self.step();
            return;
        };

        if let CompletionOutcome::RecordLengthMs(length_ms) = outcome {
            if let Some(Atom::Record(r)) = molecule.atoms.get_mut(molecule.current) {
                r.length_ms = length_ms;
            }
        }

        let atom_complete = match molecule.atoms.get_mut(molecule.current) {
            Some(Atom::Dtmf(d)) => {
                d.cursor += 1;
                d.is_exhausted()
            }
            _ => true,
        };

        if atom_complete {
            let wraps = molecule.mode.loop_mode && molecule.current + 1 == molecule.atoms.len();
            if wraps {
                molecule.current = 0;
                for atom in molecule.atoms.iter_mut() {
                    atom.reset_runtime_state();
                }
            } else {
                molecule.current += 1;
            }
            if molecule.current == molecule.atoms.len() && !molecule.mode.loop_mode {
                self.queue.cancel(id);
            }
        }

        self.step();
    }

    /// Cancels the molecule with `id`, wherever it sits in the queue. If it
    /// was the one in flight, its handle is released synchronously and the
    /// scheduler advances to the next candidate without touching `current`
    /// (spec.md §5). A stale id is a silent no-op (spec.md §7).
    pub fn cancel(&mut self, id: u64) {
        let was_running = self.running_id() == Some(id);
        if was_running {
            if let Some((h, _)) = self.cur_play.take() {
                self.player.release(h);
            }
            if let Some((h, _)) = self.cur_rec.take() {
                self.capture.release(h);
            }
        }
        self.queue.cancel(id);
        if was_running {
            self.step();
        }
    }

    /// `vqueue_cancel` (spec.md §6): discards every molecule at `priority`.
    pub fn cancel_priority(&mut self, priority: usize) -> usize {
        let running_here = self
            .running_id()
            .and_then(|id| self.queue.get_mut(id))
            .map(|m| m.priority == priority)
            .unwrap_or(false);
        if running_here {
            if let Some((h, _)) = self.cur_play.take() {
                self.player.release(h);
            }
            if let Some((h, _)) = self.cur_rec.take() {
                self.capture.release(h);
            }
        }
        let removed = self.queue.cancel_priority(priority);
        if running_here {
            self.step();
        }
        removed
    }

    /// The DtmfStop path (spec.md §4.E): a digit arrived on the live audio
    /// stream. If the running molecule has DtmfStop set, this is treated as
    /// a cancel of that molecule.
    pub fn on_incoming_dtmf_digit(&mut self, _digit: char) {
        let Some(id) = self.running_id() else {
            return;
        };
        let should_stop = self
            .queue
            .get_mut(id)
            .map(|m| m.mode.dtmf_stop)
            .unwrap_or(false);
        if should_stop {
            self.cancel(id);
        }
    }

    fn running_id(&self) -> Option<u64> {
        self.cur_play
            .map(|(_, id)| id)
            .or(self.cur_rec.map(|(_, id)| id))
    }

    /// `step()` (spec.md §4.E): the dispatch loop. Always terminates
    /// because it either starts exactly one audio operation and returns,
    /// or finds the queue empty.
    ///
    /// Never dispatches while an operation is already in flight (spec.md §5:
    /// at most one atom is running at any instant). `on_complete`,
    /// `preempt`, and `cancel` all clear `cur_play`/`cur_rec` before calling
    /// `step()`, so a `step()` entered with either handle still set means
    /// the incumbent hasn't actually stopped and must be left alone.
    fn step(&mut self) {
        if self.cur_play.is_some() || self.cur_rec.is_some() {
            return;
        }

        let Some(id) = self.queue.next().map(|m| m.id) else {
            return;
        };

        if let Some(molecule) = self.queue.get_mut(id) {
            if molecule.mode.policy == InterruptPolicy::Mute {
                if let Some(stopped) = molecule.time_stopped_ms {
                    let elapsed = self.clock.now_ms().saturating_sub(stopped);
                    let target = molecule.position_ms + elapsed;
                    let total = molecule.total_length(0, None);
                    if !molecule.mode.loop_mode && total > 0 && target >= total {
                        self.queue.cancel(id);
                        return self.step();
                    }
                    molecule.seek(target);
                    molecule.time_stopped_ms = None;
                }
            }
        }

        let dispatched = self.dispatch(id);
        if !dispatched {
            self.queue.cancel(id);
            return self.step();
        }

        if let Some(molecule) = self.queue.get_mut(id) {
            molecule.time_started_ms = Some(self.clock.now_ms());
        }
    }

    /// Starts the current atom of molecule `id` against the audio adapters.
    /// Returns `false` if the adapter start call failed (spec.md §7:
    /// `AudioStartFailed` drops the molecule and `step()` tries the next
    /// candidate).
    fn dispatch(&mut self, id: u64) -> bool {
        let Some(molecule) = self.queue.get_mut(id) else {
            return false;
        };
        let module = self.config.alert_module.as_deref();
        let device = self.config.alert_device.as_deref();

        match &molecule.atoms[molecule.current] {
            Atom::Play(p) => {
                let path = p.filename.clone();
                let offset_ms = p.offset_ms;
                match self.player.start(&path, offset_ms, module, device) {
                    Ok(handle) => {
                        self.cur_play = Some((handle, id));
                        true
                    }
                    Err(err) => {
                        log::error!("failed to start play of {}: {err}", path.display());
                        false
                    }
                }
            }
            Atom::Dtmf(d) => {
                let filename = d.current_digit_filename();
                let path = std::path::PathBuf::from(filename);
                match self.player.start(&path, 0, module, device) {
                    Ok(handle) => {
                        self.cur_play = Some((handle, id));
                        true
                    }
                    Err(err) => {
                        log::error!("failed to start dtmf tone {}: {err}", path.display());
                        false
                    }
                }
            }
            Atom::Record(r) => {
                let path = r.filename.clone();
                let max_silence_ms = r.max_silence_ms;
                match self
                    .capture
                    .start(&self.config.capture, &path, max_silence_ms)
                {
                    Ok(handle) => {
                        self.cur_rec = Some((handle, id));
                        true
                    }
                    Err(err) => {
                        log::error!("failed to start record to {}: {err}", path.display());
                        false
                    }
                }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}
