// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use crate::runtime::ColorToken;

pub const MAX_LEVEL: f32 = 100.0;
pub const COLLAPSE_LEVEL: f32 = 98.0;
pub const COLLAPSE_RECOVERY: Duration = Duration::from_secs(4);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);
/// Threshold cues start at this level, one per 5% bucket.
const CUE_FLOOR: f32 = 30.0;
const CUE_BUCKET: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Band {
    Normal,
    Elevated,
    Unstable,
    Critical,
    Failing,
    Collapse,
}

impl Band {
    pub fn from_level(level: f32) -> Band {
        match level {
            l if l >= 98.0 => Band::Collapse,
            l if l >= 95.0 => Band::Failing,
            l if l >= 80.0 => Band::Critical,
            l if l >= 60.0 => Band::Unstable,
            l if l >= 30.0 => Band::Elevated,
            _ => Band::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Normal => "NORMAL",
            Band::Elevated => "ELEVATED",
            Band::Unstable => "UNSTABLE",
            Band::Critical => "CRITICAL",
            Band::Failing => "FAILING",
            Band::Collapse => "COLLAPSE",
        }
    }

    /// Visual intensity handed to the background layers.
    pub fn intensity(self) -> f32 {
        match self {
            Band::Normal => 0.0,
            Band::Elevated => 0.25,
            Band::Unstable => 0.5,
            Band::Critical => 0.75,
            Band::Failing => 0.9,
            Band::Collapse => 1.0,
        }
    }

    pub fn color(self) -> ColorToken {
        match self {
            Band::Normal => ColorToken::Normal,
            Band::Elevated | Band::Unstable => ColorToken::Yellow,
            Band::Critical | Band::Failing => ColorToken::Red,
            Band::Collapse => ColorToken::Magenta,
        }
    }

    pub fn ghosts_enabled(self) -> bool {
        matches!(self, Band::Unstable | Band::Critical | Band::Failing)
    }

    pub fn auto_commands_enabled(self) -> bool {
        matches!(self, Band::Critical | Band::Failing)
    }

    fn cue(self) -> &'static str {
        match self {
            Band::Normal | Band::Elevated => "glitch",
            Band::Unstable => "interference",
            Band::Critical | Band::Failing | Band::Collapse => "alarm",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegradationEvent {
    BandChanged { from: Band, to: Band },
    /// One-shot threshold sound from the `effects` category.
    Cue(&'static str),
    Collapse,
    Recovered,
}

/// Bounded degradation counter with its cue watermark, collapse latch and
/// the periodic growth timer.
#[derive(Debug)]
pub struct DegradationEngine {
    level: f32,
    cue_bucket: u8,
    frozen: bool,
    recover_at: Option<Instant>,
    tick_interval: Duration,
    next_tick: Option<Instant>,
    focused: bool,
    saved_floor: u8,
}

impl DegradationEngine {
    pub fn new(initial: f32, tick_interval: Duration) -> Self {
        let level = if initial.is_finite() {
            initial.clamp(0.0, MAX_LEVEL)
        } else {
            0.0
        };
        Self {
            level,
            cue_bucket: bucket_of(level),
            frozen: false,
            recover_at: None,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            next_tick: None,
            focused: true,
            saved_floor: level.floor() as u8,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn percent(&self) -> u8 {
        self.level.floor() as u8
    }

    pub fn band(&self) -> Band {
        Band::from_level(self.level)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn add_degradation(&mut self, delta: f32, now: Instant) -> Vec<DegradationEvent> {
        if !delta.is_finite() {
            return Vec::new();
        }
        self.apply(self.level + delta, now)
    }

    pub fn set_level(&mut self, level: f32, now: Instant) -> Vec<DegradationEvent> {
        if !level.is_finite() {
            return Vec::new();
        }
        self.apply(level, now)
    }

    /// Back to zero with a fresh cue watermark, as after a reboot.
    pub fn zero(&mut self) -> Vec<DegradationEvent> {
        let from = self.band();
        self.level = 0.0;
        self.cue_bucket = 0;
        let mut events = Vec::new();
        if from != Band::Normal {
            events.push(DegradationEvent::BandChanged {
                from,
                to: Band::Normal,
            });
        }
        events
    }

    fn apply(&mut self, target: f32, now: Instant) -> Vec<DegradationEvent> {
        let mut events = Vec::new();
        let from = self.band();
        self.level = target.clamp(0.0, MAX_LEVEL);
        let to = self.band();
        if from != to {
            events.push(DegradationEvent::BandChanged { from, to });
        }

        if self.level >= CUE_FLOOR {
            let bucket = bucket_of(self.level);
            if bucket > self.cue_bucket {
                self.cue_bucket = bucket;
                events.push(DegradationEvent::Cue(to.cue()));
            }
        }

        if !self.frozen && self.level >= COLLAPSE_LEVEL {
            self.frozen = true;
            self.recover_at = Some(now + COLLAPSE_RECOVERY);
            events.push(DegradationEvent::Collapse);
        }
        events
    }

    /// Drives collapse recovery and the periodic +1.
    pub fn tick(&mut self, now: Instant) -> Vec<DegradationEvent> {
        if self.frozen {
            if self.recover_at.is_some_and(|at| now >= at) {
                let mut events = self.zero();
                self.frozen = false;
                self.recover_at = None;
                self.next_tick = Some(now + self.tick_interval);
                events.push(DegradationEvent::Recovered);
                return events;
            }
            return Vec::new();
        }

        let next = *self.next_tick.get_or_insert(now + self.tick_interval);
        if now < next {
            return Vec::new();
        }
        self.next_tick = Some(now + self.tick_interval);
        if self.focused {
            self.add_degradation(1.0, now)
        } else {
            Vec::new()
        }
    }

    /// Returns the level when its integer part moved since the last call.
    pub fn take_persist(&mut self) -> Option<f32> {
        let floor = self.percent();
        if floor == self.saved_floor {
            return None;
        }
        self.saved_floor = floor;
        Some(self.level)
    }
}

fn bucket_of(level: f32) -> u8 {
    (level / CUE_BUCKET).floor() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collapses(events: &[DegradationEvent]) -> usize {
        events
            .iter()
            .filter(|e| **e == DegradationEvent::Collapse)
            .count()
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(Band::from_level(0.0), Band::Normal);
        assert_eq!(Band::from_level(29.9), Band::Normal);
        assert_eq!(Band::from_level(30.0), Band::Elevated);
        assert_eq!(Band::from_level(60.0), Band::Unstable);
        assert_eq!(Band::from_level(80.0), Band::Critical);
        assert_eq!(Band::from_level(95.0), Band::Failing);
        assert_eq!(Band::from_level(97.9), Band::Failing);
        assert_eq!(Band::from_level(98.0), Band::Collapse);
        assert_eq!(Band::from_level(100.0), Band::Collapse);
    }

    #[test]
    fn collapse_fires_once_per_crossing() {
        let now = Instant::now();
        let mut e = DegradationEngine::new(97.0, DEFAULT_TICK_INTERVAL);
        let mut total = 0;
        total += collapses(&e.add_degradation(1.0, now));
        assert!(e.is_frozen());
        total += collapses(&e.add_degradation(1.0, now));
        total += collapses(&e.add_degradation(1.0, now));
        assert_eq!(e.level(), 100.0);
        assert_eq!(total, 1);
    }

    #[test]
    fn recovery_zeroes_and_unfreezes_after_delay() {
        let now = Instant::now();
        let mut e = DegradationEngine::new(97.0, DEFAULT_TICK_INTERVAL);
        e.add_degradation(2.0, now);
        assert!(e.tick(now + Duration::from_secs(1)).is_empty());
        assert!(e.is_frozen());

        let ev = e.tick(now + COLLAPSE_RECOVERY);
        assert!(ev.contains(&DegradationEvent::Recovered));
        assert!(!e.is_frozen());
        assert_eq!(e.level(), 0.0);

        // A fresh crossing collapses again.
        let again = e.set_level(99.0, now + COLLAPSE_RECOVERY);
        assert_eq!(collapses(&again), 1);
    }

    #[test]
    fn cues_play_once_per_bucket() {
        let now = Instant::now();
        let mut e = DegradationEngine::new(0.0, DEFAULT_TICK_INTERVAL);
        let cues = |ev: &[DegradationEvent]| {
            ev.iter()
                .filter(|x| matches!(x, DegradationEvent::Cue(_)))
                .count()
        };
        assert_eq!(cues(&e.set_level(20.0, now)), 0);
        assert_eq!(cues(&e.set_level(31.0, now)), 1);
        assert_eq!(cues(&e.set_level(33.0, now)), 0);
        assert_eq!(cues(&e.set_level(10.0, now)), 0);
        assert_eq!(cues(&e.set_level(32.0, now)), 0, "bucket 30-35 already played");
        assert_eq!(cues(&e.set_level(61.0, now)), 1);
        assert!(e
            .set_level(66.0, now)
            .contains(&DegradationEvent::Cue("interference")));
    }

    #[test]
    fn periodic_growth_only_when_focused() {
        let t0 = Instant::now();
        let iv = Duration::from_secs(10);
        let mut e = DegradationEngine::new(0.0, iv);
        e.tick(t0);
        e.tick(t0 + iv);
        assert_eq!(e.level(), 1.0);

        e.set_focused(false);
        e.tick(t0 + iv * 2);
        assert_eq!(e.level(), 1.0);

        e.set_focused(true);
        e.tick(t0 + iv * 3);
        assert_eq!(e.level(), 2.0);
    }

    #[test]
    fn no_periodic_growth_while_frozen() {
        let t0 = Instant::now();
        let iv = Duration::from_millis(100);
        let mut e = DegradationEngine::new(99.0, iv);
        e.add_degradation(0.0, t0);
        assert!(e.is_frozen());
        e.tick(t0 + Duration::from_secs(1));
        assert!(e.tick(t0 + Duration::from_secs(2)).is_empty());
        assert_eq!(e.level(), 99.0);
    }

    #[test]
    fn persist_reports_integer_changes_only() {
        let now = Instant::now();
        let mut e = DegradationEngine::new(10.0, DEFAULT_TICK_INTERVAL);
        assert_eq!(e.take_persist(), None);
        e.add_degradation(0.5, now);
        assert_eq!(e.take_persist(), None);
        e.add_degradation(1.0, now);
        assert_eq!(e.take_persist(), Some(11.5));
        assert_eq!(e.take_persist(), None);
    }

    proptest! {
        #[test]
        fn level_stays_in_bounds(deltas in proptest::collection::vec(-500.0f32..500.0, 0..64)) {
            let now = Instant::now();
            let mut e = DegradationEngine::new(50.0, DEFAULT_TICK_INTERVAL);
            for d in deltas {
                e.add_degradation(d, now);
                prop_assert!((0.0..=MAX_LEVEL).contains(&e.level()));
            }
            e.add_degradation(f32::NAN, now);
            e.add_degradation(f32::INFINITY, now);
            prop_assert!((0.0..=MAX_LEVEL).contains(&e.level()));
        }
    }
}
