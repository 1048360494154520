//! The command-line parser (component C, spec.md §4.C): lowers a single
//! whitespace-separated text line into a [`Molecule`].

use std::path::PathBuf;

use crate::atom::{Atom, DEFAULT_INTER_DIGIT_DELAY_MS, DEFAULT_MAX_SILENCE_MS};
use crate::audio::{is_valid_dtmf_digit, AuFileReader, AudioError};
use crate::molecule::{InterruptPolicy, Mode, Molecule};

pub const NUM_PRIORITIES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("priority {0} is not a non-negative integer below {NUM_PRIORITIES}")]
    InvalidPriority(String),
    #[error("mode keyword {new:?} conflicts with already-set {existing:?}")]
    ConflictingModes {
        existing: &'static str,
        new: &'static str,
    },
    #[error("unknown token {0:?}")]
    UnknownToken(String),
    #[error("molecule has no atoms")]
    EmptyMolecule,
    #[error("no mode keyword (interrupt policy, loop, or dtmf_stop) found before atoms")]
    MissingMode,
    #[error("could not open {path}: {reason}")]
    BadFile { path: PathBuf, reason: String },
    #[error("atom keyword {0:?} is missing its filename/digits argument")]
    MissingArgument(&'static str),
    #[error("{0:?} contains characters outside 0-9*#A-D")]
    InvalidDtmfDigits(String),
}

fn policy_name(policy: InterruptPolicy) -> &'static str {
    match policy {
        InterruptPolicy::Discard => "discard",
        InterruptPolicy::Pause => "pause",
        InterruptPolicy::Mute => "mute",
        InterruptPolicy::Restart => "restart",
        InterruptPolicy::DontInterrupt => "dont_interrupt",
    }
}

/// `true` if `token` is the start of a new atom keyword (spec.md §4.C rule
/// 3: a numeric parameter is only consumed when the following token does
/// not begin with an atom-start prefix).
fn looks_like_atom_start(token: &str) -> bool {
    matches!(
        token,
        "p" | "play" | "r" | "record" | "d" | "dtmf"
    )
}

struct Tokens<'a> {
    inner: std::iter::Peekable<std::str::SplitWhitespace<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_whitespace().peekable(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    fn peek(&mut self) -> Option<&&'a str> {
        self.inner.peek()
    }

    /// Consumes the next token as a numeric argument only if it exists and
    /// does not look like the start of a new atom; otherwise leaves it
    /// unconsumed and returns `None`.
    fn take_optional_number(&mut self) -> Result<Option<u64>, ParseError> {
        match self.peek() {
            Some(tok) if !looks_like_atom_start(tok) => {
                let tok = self.next().unwrap();
                tok.parse::<u64>()
                    .map(Some)
                    .map_err(|_| ParseError::UnknownToken(tok.to_string()))
            }
            _ => Ok(None),
        }
    }
}

/// Parses `line` into a [`Molecule`], using `reader` to resolve Play atoms'
/// file lengths (spec.md §4.A, §4.C).
pub fn parse(line: &str, reader: &dyn AuFileReader) -> Result<Molecule, ParseError> {
    let mut tokens = Tokens::new(line);

    let priority_tok = tokens
        .next()
        .ok_or_else(|| ParseError::InvalidPriority(String::new()))?;
    let priority: usize = priority_tok
        .parse()
        .map_err(|_| ParseError::InvalidPriority(priority_tok.to_string()))?;
    if priority >= NUM_PRIORITIES {
        return Err(ParseError::InvalidPriority(priority_tok.to_string()));
    }

    let mut mode = Mode::default();
    let mut policy_set = false;
    let mut policy_keyword: &'static str = "discard";
    let mut any_mode = false;

    loop {
        let Some(&tok) = tokens.peek() else {
            return Err(ParseError::EmptyMolecule);
        };
        let new_policy = match tok {
            "discard" => Some(InterruptPolicy::Discard),
            "pause" => Some(InterruptPolicy::Pause),
            "mute" => Some(InterruptPolicy::Mute),
            "restart" => Some(InterruptPolicy::Restart),
            "dont_interrupt" => Some(InterruptPolicy::DontInterrupt),
            _ => None,
        };
        if let Some(new_policy) = new_policy {
            tokens.next();
            if policy_set && mode.policy != new_policy {
                return Err(ParseError::ConflictingModes {
                    existing: policy_keyword,
                    new: policy_name(new_policy),
                });
            }
            mode.policy = new_policy;
            policy_keyword = policy_name(new_policy);
            policy_set = true;
            any_mode = true;
            continue;
        }
        match tok {
            "loop" => {
                tokens.next();
                mode.loop_mode = true;
                any_mode = true;
            }
            "dtmf_stop" => {
                tokens.next();
                mode.dtmf_stop = true;
                any_mode = true;
            }
            _ => break,
        }
    }

    if !any_mode {
        return Err(ParseError::MissingMode);
    }

    if !policy_set {
        mode.policy = InterruptPolicy::Discard;
    }

    let mut atoms = Vec::new();
    while let Some(&tok) = tokens.peek() {
        match tok {
            "p" | "play" => {
                tokens.next();
                let filename = tokens
                    .next()
                    .ok_or(ParseError::MissingArgument("play"))?
                    .to_string();
                let offset_ms = tokens.take_optional_number()?.unwrap_or(0);
                let path = PathBuf::from(&filename);
                let length_ms =
                    reader
                        .open(&path)
                        .map_err(|err: AudioError| ParseError::BadFile {
                            path: path.clone(),
                            reason: err.to_string(),
                        })?;
                atoms.push(Atom::play(path, offset_ms, length_ms));
            }
            "r" | "record" => {
                tokens.next();
                let filename = tokens
                    .next()
                    .ok_or(ParseError::MissingArgument("record"))?
                    .to_string();
                let max_silence_ms = tokens
                    .take_optional_number()?
                    .unwrap_or(DEFAULT_MAX_SILENCE_MS);
                atoms.push(Atom::record(PathBuf::from(filename), max_silence_ms));
            }
            "d" | "dtmf" => {
                tokens.next();
                let digits = tokens
                    .next()
                    .ok_or(ParseError::MissingArgument("dtmf"))?
                    .to_string();
                if digits.is_empty() || !digits.chars().all(is_valid_dtmf_digit) {
                    return Err(ParseError::InvalidDtmfDigits(digits));
                }
                let inter_digit_delay_ms = tokens
                    .take_optional_number()?
                    .unwrap_or(DEFAULT_INTER_DIGIT_DELAY_MS);
                atoms.push(Atom::dtmf(digits, inter_digit_delay_ms));
            }
            _ => return Err(ParseError::UnknownToken(tok.to_string())),
        }
    }

    if atoms.is_empty() {
        return Err(ParseError::EmptyMolecule);
    }

    Ok(Molecule::new(atoms, priority, mode))
}
