//! The molecule model (component B, spec.md §3/§4.B): an ordered sequence
//! of atoms plus the mode flags, priority, and position bookkeeping the
//! Scheduler needs to preempt and resume it.

use crate::atom::Atom;

/// At most one of these may be set on a molecule's mode (spec.md §3). The
/// source represents this as an ad-hoc bitset; modeling it as an enum makes
/// "at most one" a type-level fact rather than a runtime-checked invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterruptPolicy {
    #[default]
    Discard,
    Pause,
    Mute,
    Restart,
    DontInterrupt,
}

/// The full mode bitset: an interrupt policy plus the two independent flags
/// Loop and DtmfStop (spec.md §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mode {
    pub policy: InterruptPolicy,
    pub loop_mode: bool,
    pub dtmf_stop: bool,
}

/// An ordered sequence of atoms submitted as a single command, plus its
/// priority, mode, and the cursor/position state a preemption needs to
/// resume it correctly (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Molecule {
    /// Assigned by `VQueue::enqueue`; 0 until then. Used as the stable
    /// handle completion callbacks carry, instead of a raw reference into a
    /// lane that preemption/discard could invalidate (spec.md §9).
    pub id: u64,
    pub atoms: Vec<Atom>,
    pub priority: usize,
    pub mode: Mode,
    /// Index into `atoms` of the atom being executed. `current ==
    /// atoms.len()` means the molecule is complete (invariant 1).
    pub current: usize,
    /// Cumulative played duration, used by Mute/Pause resume logic.
    pub position_ms: u64,
    pub time_started_ms: Option<u64>,
    pub time_stopped_ms: Option<u64>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>, priority: usize, mode: Mode) -> Self {
        Self {
            id: 0,
            atoms,
            priority,
            mode,
            current: 0,
            position_ms: 0,
            time_started_ms: None,
            time_stopped_ms: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.atoms.len()
    }

    /// Sum of atom lengths in `[start, end)`; `end` defaults to
    /// `atoms.len()` (spec.md §4.B).
    pub fn total_length(&self, start: usize, end: Option<usize>) -> u64 {
        let end = end.unwrap_or(self.atoms.len()).min(self.atoms.len());
        if start >= end {
            return 0;
        }
        self.atoms[start..end].iter().map(Atom::length_ms).sum()
    }

    /// Locates the atom and intra-atom offset corresponding to
    /// `position_ms`, applying `position_ms %= total_length()` when Loop is
    /// set (spec.md §4.B). If the Pause policy is active this is a no-op
    /// that only records `position_ms`, so the molecule replays from the
    /// start of the same atom it was interrupted on. Otherwise `current` is
    /// updated, and if the Mute policy is active the chosen atom's
    /// `offset_ms` is updated too.
    pub fn seek(&mut self, mut position_ms: u64) {
        if self.mode.policy == InterruptPolicy::Pause {
            self.position_ms = position_ms;
            return;
        }

        let total = self.total_length(0, None);
        if self.mode.loop_mode && total > 0 {
            position_ms %= total;
        }
        self.position_ms = position_ms;

        let mut remaining = position_ms;
        let mut target = self.atoms.len().saturating_sub(1);
        for (i, atom) in self.atoms.iter().enumerate() {
            let len = atom.length_ms();
            if remaining < len {
                target = i;
                break;
            }
            remaining -= len;
        }
        self.current = target;

        if self.mode.policy == InterruptPolicy::Mute {
            if let Some(Atom::Play(p)) = self.atoms.get_mut(target) {
                p.offset_ms = remaining;
            }
        }
    }

    /// Round-trips this molecule to its textual command-line form (spec.md
    /// §4.B / §6). `parse(m.describe())` reproduces an equal molecule,
    /// modulo the runtime fields (`id`, `current`, `position_ms`,
    /// `time_started_ms`, `time_stopped_ms`) that only exist once a
    /// molecule is running.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.priority.to_string()];
        parts.push(policy_keyword(self.mode.policy).to_string());
        if self.mode.loop_mode {
            parts.push("loop".to_string());
        }
        if self.mode.dtmf_stop {
            parts.push("dtmf_stop".to_string());
        }
        for atom in &self.atoms {
            match atom {
                Atom::Play(p) => {
                    parts.push("play".to_string());
                    parts.push(p.filename.display().to_string());
                    parts.push(p.original_offset_ms.to_string());
                }
                Atom::Record(r) => {
                    parts.push("record".to_string());
                    parts.push(r.filename.display().to_string());
                    parts.push(r.max_silence_ms.to_string());
                }
                Atom::Dtmf(d) => {
                    parts.push("dtmf".to_string());
                    parts.push(d.digits.clone());
                    parts.push(d.inter_digit_delay_ms.to_string());
                }
            }
        }
        parts.join(" ")
    }
}

fn policy_keyword(policy: InterruptPolicy) -> &'static str {
    match policy {
        InterruptPolicy::Discard => "discard",
        InterruptPolicy::Pause => "pause",
        InterruptPolicy::Mute => "mute",
        InterruptPolicy::Restart => "restart",
        InterruptPolicy::DontInterrupt => "dont_interrupt",
    }
}
