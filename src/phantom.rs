// Copyright (c) 2026 rezky_nightky

//! Synthetic input that appears once the system is unstable: stray
//! keystrokes in the live prompt and whole commands typed by nobody.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

use crate::degradation::Band;
use crate::glyphs::{build_glyphs, GlyphSet};

const GHOST_ROLL: Duration = Duration::from_secs(1);
const GHOST_LIFETIME: Duration = Duration::from_millis(150);
const AUTO_ROLL: Duration = Duration::from_secs(5);

const AUTO_COMMANDS: &[&str] = &[
    "syst",
    "syslog",
    "subj",
    "notes",
    "dscr 0x047",
    "open note_003",
    "open note_005",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhantomAction {
    GhostInsert(char),
    GhostRemove,
    AutoCommand(&'static str),
}

fn ghost_chance(band: Band) -> f64 {
    match band {
        Band::Unstable => 0.08,
        Band::Critical => 0.18,
        Band::Failing => 0.3,
        _ => 0.0,
    }
}

fn auto_chance(band: Band) -> f64 {
    match band {
        Band::Critical => 0.15,
        Band::Failing => 0.3,
        _ => 0.0,
    }
}

#[derive(Debug)]
pub struct Phantom {
    rng: StdRng,
    glyphs: Vec<char>,
    ghost_until: Option<Instant>,
    next_ghost_roll: Option<Instant>,
    next_auto_roll: Option<Instant>,
}

impl Phantom {
    pub fn new(seed: u64, ascii: bool) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            glyphs: build_glyphs(GlyphSet::GHOST, ascii),
            ghost_until: None,
            next_ghost_roll: None,
            next_auto_roll: None,
        }
    }

    /// `idle` means the interpreter would accept a keystroke right now and
    /// the live input is not being driven by anything else.
    pub fn tick(&mut self, now: Instant, band: Band, idle: bool) -> Option<PhantomAction> {
        if let Some(until) = self.ghost_until {
            if now >= until {
                self.ghost_until = None;
                return Some(PhantomAction::GhostRemove);
            }
            return None;
        }

        if band.auto_commands_enabled() && roll_due(&mut self.next_auto_roll, now, AUTO_ROLL) {
            if idle && self.rng.random_bool(auto_chance(band)) {
                if let Some(cmd) = AUTO_COMMANDS.choose(&mut self.rng) {
                    return Some(PhantomAction::AutoCommand(*cmd));
                }
            }
        }

        if band.ghosts_enabled() && roll_due(&mut self.next_ghost_roll, now, GHOST_ROLL) {
            if idle && self.rng.random_bool(ghost_chance(band)) {
                if let Some(&ch) = self.glyphs.choose(&mut self.rng) {
                    self.ghost_until = Some(now + GHOST_LIFETIME);
                    return Some(PhantomAction::GhostInsert(ch));
                }
            }
        }

        if !band.ghosts_enabled() {
            self.next_ghost_roll = None;
        }
        if !band.auto_commands_enabled() {
            self.next_auto_roll = None;
        }
        None
    }

    /// Forgets any pending ghost removal, e.g. after the buffer was wiped.
    pub fn reset(&mut self) {
        self.ghost_until = None;
    }
}

fn roll_due(next: &mut Option<Instant>, now: Instant, every: Duration) -> bool {
    match *next {
        None => {
            *next = Some(now + every);
            false
        }
        Some(at) if now >= at => {
            *next = Some(now + every);
            true
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(band: Band, idle: bool, secs: u64) -> Vec<PhantomAction> {
        let mut p = Phantom::new(7, false);
        let t0 = Instant::now();
        let mut out = Vec::new();
        for i in 0..(secs * 20) {
            if let Some(a) = p.tick(t0 + Duration::from_millis(i * 50), band, idle) {
                out.push(a);
            }
        }
        out
    }

    #[test]
    fn quiet_when_system_is_stable() {
        assert!(run(Band::Normal, true, 120).is_empty());
        assert!(run(Band::Elevated, true, 120).is_empty());
    }

    #[test]
    fn unstable_band_only_ghosts() {
        let out = run(Band::Unstable, true, 600);
        assert!(out.iter().any(|a| matches!(a, PhantomAction::GhostInsert(_))));
        assert!(!out.iter().any(|a| matches!(a, PhantomAction::AutoCommand(_))));
    }

    #[test]
    fn every_ghost_insert_is_followed_by_a_removal() {
        let out = run(Band::Failing, true, 600);
        for pair in out.windows(2) {
            if matches!(pair[0], PhantomAction::GhostInsert(_)) {
                assert_eq!(pair[1], PhantomAction::GhostRemove);
            }
        }
    }

    #[test]
    fn critical_band_auto_types_commands() {
        let out = run(Band::Critical, true, 600);
        assert!(out.iter().any(|a| matches!(a, PhantomAction::AutoCommand(_))));
    }

    #[test]
    fn nothing_happens_while_busy() {
        assert!(run(Band::Failing, false, 600).is_empty());
    }
}
