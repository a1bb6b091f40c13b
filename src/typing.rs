// Copyright (c) 2026 rezky_nightky

//! Tick-driven output sequencer.
//!
//! A command produces a `Script`: an ordered list of steps (typed text,
//! instant text, pauses, a Y/N question, side-effect requests). The
//! sequencer runs one step at a time from `tick`, so "waiting for the next
//! character" is just a timestamp, and a freeze is a flag checked before
//! every reveal.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::buffer::LineBuffer;
use crate::runtime::ColorToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delay {
    Fixed(Duration),
    /// `base` give or take up to `spread` per character.
    Jitter { base: Duration, spread: Duration },
}

impl Delay {
    fn sample(self, rng: &mut StdRng) -> Duration {
        match self {
            Delay::Fixed(d) => d,
            Delay::Jitter { base, spread } => {
                if spread.is_zero() {
                    return base;
                }
                let low = base.saturating_sub(spread);
                let span = (base + spread - low).as_micros() as u64;
                low + Duration::from_micros(rng.random_range(0..=span))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Type {
        text: String,
        color: ColorToken,
        delay: Delay,
    },
    Print {
        text: String,
        color: ColorToken,
    },
    Pause(Duration),
    Confirm {
        question: String,
        yes: Vec<Step>,
        no: Vec<Step>,
    },
    Clear,
    Sound {
        category: &'static str,
        id: &'static str,
    },
    ZeroDegradation,
    Quit,
}

/// Requests the sequencer cannot satisfy with the line buffer alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeqEvent {
    Sound {
        category: &'static str,
        id: &'static str,
    },
    ZeroDegradation,
    Quit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script(Vec<Step>);

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(mut self, text: impl Into<String>, color: ColorToken, delay: Delay) -> Self {
        self.0.push(Step::Type {
            text: text.into(),
            color,
            delay,
        });
        self
    }

    pub fn print(mut self, text: impl Into<String>, color: ColorToken) -> Self {
        self.0.push(Step::Print {
            text: text.into(),
            color,
        });
        self
    }

    pub fn pause_ms(mut self, ms: u64) -> Self {
        self.0.push(Step::Pause(Duration::from_millis(ms)));
        self
    }

    pub fn confirm(mut self, question: impl Into<String>, yes: Script, no: Script) -> Self {
        self.0.push(Step::Confirm {
            question: question.into(),
            yes: yes.0,
            no: no.0,
        });
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.0.push(step);
        self
    }

    pub fn sound(self, category: &'static str, id: &'static str) -> Self {
        self.step(Step::Sound { category, id })
    }

    pub fn extend(mut self, other: Script) -> Self {
        self.0.extend(other.0);
        self
    }

}

#[derive(Debug)]
enum Active {
    Typing {
        chars: Vec<char>,
        shown: String,
        color: ColorToken,
        delay: Delay,
        next_at: Instant,
    },
    Waiting(Instant),
    Confirming {
        yes: Vec<Step>,
        no: Vec<Step>,
    },
}

#[derive(Debug)]
pub struct Sequencer {
    queue: VecDeque<Step>,
    active: Option<Active>,
    aborted: bool,
    /// When the next step is due. Steps chain from the previous step's
    /// finish time, so a late tick replays the backlog instead of shifting it.
    cursor: Option<Instant>,
    rng: StdRng,
}

impl Sequencer {
    pub fn new(seed: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
            aborted: false,
            cursor: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The `isTyping` guard: true while any step is pending or running.
    pub fn is_busy(&self) -> bool {
        !self.aborted && (self.active.is_some() || !self.queue.is_empty())
    }

    pub fn awaiting_confirm(&self) -> bool {
        !self.aborted && matches!(self.active, Some(Active::Confirming { .. }))
    }

    /// Queues `script` behind anything already running. An idle sequencer
    /// starts the script at `now`.
    pub fn run(&mut self, script: Script, now: Instant) {
        if !self.is_busy() {
            self.cursor = Some(now);
        }
        self.queue.extend(script.0);
    }

    /// Cancels everything. The in-flight line is finalized on the next tick
    /// and a pending confirmation resolves as cancelled.
    pub fn abort(&mut self) {
        if self.active.is_some() || !self.queue.is_empty() {
            self.aborted = true;
        }
        self.cursor = None;
    }

    /// Resolves a pending Y/N question. Returns false if none was pending.
    pub fn resolve_confirm(&mut self, yes: bool, buffer: &mut LineBuffer) -> bool {
        if self.aborted {
            return false;
        }
        let Some(Active::Confirming { .. }) = self.active else {
            return false;
        };
        let Some(Active::Confirming { yes: on_yes, no: on_no }) = self.active.take() else {
            return false;
        };
        buffer.answer_confirm(if yes { 'Y' } else { 'N' });
        let branch = if yes { on_yes } else { on_no };
        for step in branch.into_iter().rev() {
            self.queue.push_front(step);
        }
        // The answer arrives whenever the user types it.
        self.cursor = None;
        true
    }

    pub fn tick(&mut self, now: Instant, buffer: &mut LineBuffer) -> Vec<SeqEvent> {
        let mut events = Vec::new();

        loop {
            if self.aborted {
                buffer.finalize_ephemeral();
                self.queue.clear();
                self.active = None;
                self.aborted = false;
                self.cursor = None;
                return events;
            }

            match self.active.as_mut() {
                None => {
                    let Some(step) = self.queue.pop_front() else {
                        return events;
                    };
                    let at = self.cursor.map_or(now, |c| c.min(now));
                    self.cursor = Some(at);
                    self.start(step, at, buffer, &mut events);
                }
                Some(Active::Typing {
                    chars,
                    shown,
                    color,
                    delay,
                    next_at,
                }) => {
                    let mut revealed_at = None;
                    while *next_at <= now && shown.chars().count() < chars.len() {
                        let ch = chars[shown.chars().count()];
                        shown.push(ch);
                        buffer.append_or_update_ephemeral(shown, *color);
                        revealed_at = Some(*next_at);
                        *next_at += delay.sample(&mut self.rng);
                    }
                    if shown.chars().count() < chars.len() {
                        return events;
                    }
                    buffer.finalize_ephemeral();
                    if revealed_at.is_some() {
                        self.cursor = revealed_at;
                    }
                    self.active = None;
                }
                Some(Active::Waiting(until)) => {
                    if now < *until {
                        return events;
                    }
                    self.cursor = Some(*until);
                    self.active = None;
                }
                Some(Active::Confirming { .. }) => return events,
            }
        }
    }

    fn start(
        &mut self,
        step: Step,
        at: Instant,
        buffer: &mut LineBuffer,
        events: &mut Vec<SeqEvent>,
    ) {
        match step {
            Step::Type { text, color, delay } => {
                if text.is_empty() {
                    buffer.append(String::new(), color);
                    return;
                }
                self.active = Some(Active::Typing {
                    chars: text.chars().collect(),
                    shown: String::with_capacity(text.len()),
                    color,
                    delay,
                    next_at: at,
                });
            }
            Step::Print { text, color } => buffer.append(text, color),
            Step::Pause(d) => {
                if !d.is_zero() {
                    self.active = Some(Active::Waiting(at + d));
                }
            }
            Step::Confirm { question, yes, no } => {
                buffer.push_confirm(&question);
                self.active = Some(Active::Confirming { yes, no });
            }
            Step::Clear => buffer.clear(),
            Step::Sound { category, id } => events.push(SeqEvent::Sound { category, id }),
            Step::ZeroDegradation => events.push(SeqEvent::ZeroDegradation),
            Step::Quit => events.push(SeqEvent::Quit),
        }
    }
}
