// Copyright (c) 2026 rezky_nightky

//! Owns every piece of runtime state and routes input, timers and engine
//! events between them.

use std::time::{Duration, Instant};

use crate::audio::{AudioPlayer, EFFECTS};
use crate::buffer::LineBuffer;
use crate::degradation::{Band, DegradationEngine, DegradationEvent};
use crate::input::{InputEvent, KeyInput};
use crate::interpreter::{Deps, Interpreter, Mode, Options};
use crate::phantom::{Phantom, PhantomAction};
use crate::render::visible_lines;
use crate::runtime::ColorToken;
use crate::storage::{KvStore, DEGRADATION_KEY};

/// Minimum spacing between keystroke clicks; each one starts a player.
const KEY_CUE_GAP: Duration = Duration::from_millis(60);

fn key_cue_due(last: Option<Instant>, now: Instant) -> bool {
    !last.is_some_and(|at| now.saturating_duration_since(at) < KEY_CUE_GAP)
}

/// Operations an embedding program can drive the terminal through.
pub trait Host {
    fn print(&mut self, text: &str);
    fn print_colored(&mut self, text: &str, color: ColorToken);
    fn type_text(&mut self, text: &str, color: ColorToken);
    fn submit_command(&mut self, cmd: &str);
    fn degradation_level(&self) -> f32;
}

pub struct SessionConfig {
    pub interpreter: Options,
    pub initial_level: f32,
    pub tick_interval: Duration,
    pub ascii: bool,
}

pub struct Session {
    interp: Interpreter,
    engine: DegradationEngine,
    audio: AudioPlayer,
    phantom: Phantom,
    store: Option<KvStore>,
    visible: usize,
    quit: bool,
    last_key_cue: Option<Instant>,
    now: Instant,
}

impl Session {
    pub fn new(
        cfg: SessionConfig,
        audio: AudioPlayer,
        store: Option<KvStore>,
        now: Instant,
    ) -> Self {
        let seed = cfg.interpreter.seed;
        let mut s = Self {
            interp: Interpreter::new(cfg.interpreter, now),
            engine: DegradationEngine::new(cfg.initial_level, cfg.tick_interval),
            audio,
            phantom: Phantom::new(seed ^ 0xfa47, cfg.ascii),
            store,
            visible: 0,
            quit: false,
            last_key_cue: None,
            now,
        };
        let mut events = {
            let mut deps = Deps {
                engine: &mut s.engine,
                audio: &mut s.audio,
            };
            s.interp.boot(now, &mut deps)
        };
        s.audio.play(EFFECTS, "boot");
        // A level carried over at or above the collapse threshold collapses
        // right away instead of waiting for the next addition.
        events.extend(s.engine.add_degradation(0.0, now));
        s.apply(events, now);
        s
    }

    pub fn buffer(&self) -> &LineBuffer {
        self.interp.buffer()
    }

    pub fn band(&self) -> Band {
        self.engine.band()
    }

    pub fn percent(&self) -> u8 {
        self.engine.percent()
    }

    pub fn is_frozen(&self) -> bool {
        self.interp.is_frozen()
    }

    pub fn mode(&self) -> Mode {
        self.interp.mode()
    }

    pub fn should_quit(&self) -> bool {
        self.quit || self.interp.should_quit()
    }

    /// Screen height in rows; scrolling is clamped against it.
    pub fn set_screen_height(&mut self, height: u16) {
        self.visible = visible_lines(height);
    }

    pub fn handle_input(&mut self, ev: InputEvent, now: Instant) {
        self.now = now;
        match ev {
            InputEvent::Resize(_, h) => self.set_screen_height(h),
            InputEvent::Focus(focused) => self.engine.set_focused(focused),
            InputEvent::Key(KeyInput::Quit) => self.quit = true,
            InputEvent::Key(KeyInput::ScrollUp(n)) => {
                let visible = self.visible;
                self.interp.buffer_mut().scroll_up(n, visible);
            }
            InputEvent::Key(KeyInput::ScrollDown(n)) => self.interp.buffer_mut().scroll_down(n),
            InputEvent::Key(key) => {
                if self.interp.mode() == Mode::Idle
                    && matches!(key, KeyInput::Char(_))
                    && key_cue_due(self.last_key_cue, now)
                {
                    self.last_key_cue = Some(now);
                    self.audio.play(EFFECTS, "key");
                }
                let events = {
                    let mut deps = Deps {
                        engine: &mut self.engine,
                        audio: &mut self.audio,
                    };
                    self.interp.handle_key(key, now, &mut deps)
                };
                self.apply(events, now);
            }
        }
    }

    /// Advances engine timers, scripted output and the phantom generators.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        let events = self.engine.tick(now);
        self.apply(events, now);

        let events = {
            let mut deps = Deps {
                engine: &mut self.engine,
                audio: &mut self.audio,
            };
            self.interp.tick(now, &mut deps)
        };
        self.apply(events, now);

        if !self.interp.is_frozen() {
            let idle = self.interp.accepts_phantom();
            match self.phantom.tick(now, self.engine.band(), idle) {
                Some(PhantomAction::GhostInsert(ch)) => self.interp.ghost_insert(ch),
                Some(PhantomAction::GhostRemove) => self.interp.ghost_remove(),
                Some(PhantomAction::AutoCommand(cmd)) => self.interp.auto_command(cmd, now),
                None => {}
            }
        }

        self.persist();
    }

    fn apply(&mut self, events: Vec<DegradationEvent>, now: Instant) {
        let mut queue = events;
        while !queue.is_empty() {
            let mut next = Vec::new();
            for ev in queue {
                match ev {
                    DegradationEvent::BandChanged { from, to } => {
                        tracing::info!(from = from.label(), to = to.label(), "band changed");
                    }
                    DegradationEvent::Cue(id) => self.audio.play(EFFECTS, id),
                    DegradationEvent::Collapse => {
                        tracing::warn!(level = self.engine.level(), "system collapse");
                        self.phantom.reset();
                        self.interp.freeze();
                        self.audio.stop_all();
                        self.audio.play(EFFECTS, "collapse");
                    }
                    DegradationEvent::Recovered => {
                        tracing::info!("recovered from collapse");
                        self.phantom.reset();
                        let mut deps = Deps {
                            engine: &mut self.engine,
                            audio: &mut self.audio,
                        };
                        next.extend(self.interp.recover(now, &mut deps));
                    }
                }
            }
            queue = next;
        }
    }

    fn persist(&mut self) {
        let Some(level) = self.engine.take_persist() else {
            return;
        };
        self.write_level(level);
    }

    fn write_level(&mut self, level: f32) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        store.set_f32(DEGRADATION_KEY, level);
        if let Err(err) = store.save() {
            tracing::warn!(path = %store.path().display(), %err, "failed to save state");
        }
    }

    /// Final write on the way out, regardless of whether the level moved.
    pub fn shutdown(&mut self) {
        let level = self.engine.level();
        self.write_level(level);
        self.audio.stop_all();
    }
}

impl Host for Session {
    fn print(&mut self, text: &str) {
        self.interp.print(text, ColorToken::Normal, self.now);
    }

    fn print_colored(&mut self, text: &str, color: ColorToken) {
        self.interp.print(text, color, self.now);
    }

    fn type_text(&mut self, text: &str, color: ColorToken) {
        self.interp.type_text(text, color, self.now);
    }

    fn submit_command(&mut self, cmd: &str) {
        let now = self.now;
        let events = {
            let mut deps = Deps {
                engine: &mut self.engine,
                audio: &mut self.audio,
            };
            self.interp.submit_command(cmd, now, &mut deps)
        };
        self.apply(events, now);
    }

    fn degradation_level(&self) -> f32 {
        self.engine.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineKind;

    fn session(level: f32, store: Option<KvStore>, t0: Instant) -> Session {
        typing_session(level, store, t0, Duration::ZERO)
    }

    fn typing_session(
        level: f32,
        store: Option<KvStore>,
        t0: Instant,
        type_delay: Duration,
    ) -> Session {
        let cfg = SessionConfig {
            interpreter: Options {
                seed: 7,
                type_delay,
                ascii: true,
            },
            initial_level: level,
            tick_interval: Duration::from_secs(30),
            ascii: true,
        };
        Session::new(cfg, AudioPlayer::disabled(), store, t0)
    }

    fn settle(s: &mut Session, t: &mut Instant) {
        for _ in 0..200 {
            *t += Duration::from_millis(50);
            s.tick(*t);
            if s.mode() == Mode::Idle {
                return;
            }
        }
    }

    fn texts(s: &Session) -> Vec<String> {
        s.buffer().lines().map(|l| l.text.clone()).collect()
    }

    #[test]
    fn boots_to_a_prompt() {
        let mut t = Instant::now();
        let mut s = session(0.0, None, t);
        settle(&mut s, &mut t);
        assert_eq!(s.buffer().last().map(|l| l.kind), Some(LineKind::Prompt));
        assert!(texts(&s).iter().any(|l| l.contains("A.D.A.M.")));
    }

    #[test]
    fn host_submit_runs_a_command() {
        let mut t = Instant::now();
        let mut s = session(0.0, None, t);
        settle(&mut s, &mut t);
        s.submit_command("subj");
        settle(&mut s, &mut t);
        assert_eq!(s.degradation_level(), 2.0);
        assert!(texts(&s).iter().any(|l| l.contains("ERICH VAN KOSS")));
    }

    #[test]
    fn host_print_keeps_prompt_last() {
        let mut t = Instant::now();
        let mut s = session(0.0, None, t);
        settle(&mut s, &mut t);
        s.print_colored("ВНЕШНЕЕ СООБЩЕНИЕ", ColorToken::Magenta);
        let lines: Vec<_> = s.buffer().lines().collect();
        let n = lines.len();
        assert_eq!(lines[n - 2].text, "ВНЕШНЕЕ СООБЩЕНИЕ");
        assert_eq!(lines[n - 1].kind, LineKind::Prompt);
    }

    #[test]
    fn carried_over_collapse_level_freezes_then_recovers() {
        let mut t = Instant::now();
        let mut s = session(99.0, None, t);
        assert!(s.is_frozen());
        assert_eq!(s.mode(), Mode::Frozen);

        t += Duration::from_secs(5);
        s.tick(t);
        assert!(!s.is_frozen());
        assert_eq!(s.degradation_level(), 0.0);
        settle(&mut s, &mut t);
        assert_eq!(s.buffer().last().map(|l| l.kind), Some(LineKind::Prompt));
    }

    #[test]
    fn frozen_session_ignores_keys() {
        let t = Instant::now();
        let mut s = session(99.0, None, t);
        let before = s.buffer().len();
        s.handle_input(InputEvent::Key(KeyInput::Char('h')), t);
        s.handle_input(InputEvent::Key(KeyInput::Enter), t);
        assert_eq!(s.buffer().len(), before);
    }

    #[test]
    fn scroll_is_clamped_to_the_screen() {
        let mut t = Instant::now();
        let mut s = session(0.0, None, t);
        settle(&mut s, &mut t);
        s.handle_input(InputEvent::Resize(80, 6), t);
        s.handle_input(InputEvent::Key(KeyInput::ScrollUp(1000)), t);
        let max = s.buffer().len().saturating_sub(4);
        assert_eq!(s.buffer().scroll(), max);
        s.handle_input(InputEvent::Key(KeyInput::ScrollDown(1000)), t);
        assert_eq!(s.buffer().scroll(), 0);
    }

    #[test]
    fn quit_key_ends_the_session() {
        let t = Instant::now();
        let mut s = session(0.0, None, t);
        assert!(!s.should_quit());
        s.handle_input(InputEvent::Key(KeyInput::Quit), t);
        assert!(s.should_quit());
    }

    #[test]
    fn level_changes_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut t = Instant::now();
        let mut s = session(0.0, Some(KvStore::open(&path)), t);
        settle(&mut s, &mut t);
        s.submit_command("subj");
        settle(&mut s, &mut t);
        assert_eq!(KvStore::open(&path).get_f32(DEGRADATION_KEY), Some(2.0));

        s.shutdown();
        assert_eq!(KvStore::open(&path).get_f32(DEGRADATION_KEY), Some(2.0));
    }

    #[test]
    fn host_print_during_typed_output_lands_after_it() {
        let mut t = Instant::now();
        let mut s = typing_session(0.0, None, t, Duration::from_millis(18));
        settle(&mut s, &mut t);
        s.submit_command("syst");
        t += Duration::from_millis(100);
        s.tick(t);
        assert_eq!(s.mode(), Mode::Executing);
        s.print_colored("HOST", ColorToken::Yellow);
        settle(&mut s, &mut t);

        let all = texts(&s);
        let headers = all
            .iter()
            .filter(|l| *l == "=== СОСТОЯНИЕ СИСТЕМЫ ===")
            .count();
        assert_eq!(headers, 1);
        assert!(s.buffer().lines().all(|l| !l.ephemeral));
        let lines: Vec<_> = s.buffer().lines().collect();
        let n = lines.len();
        assert_eq!(lines[n - 2].text, "HOST");
        assert_eq!(lines[n - 1].kind, LineKind::Prompt);
    }

    #[test]
    fn host_type_text_finishes_with_the_prompt_last() {
        let mut t = Instant::now();
        let mut s = typing_session(0.0, None, t, Duration::from_millis(5));
        settle(&mut s, &mut t);
        s.type_text("СИГНАЛ\nПОТЕРЯН", ColorToken::Magenta);
        assert_eq!(s.mode(), Mode::Executing);
        settle(&mut s, &mut t);

        let lines: Vec<_> = s.buffer().lines().collect();
        let n = lines.len();
        assert_eq!(lines[n - 3].text, "СИГНАЛ");
        assert_eq!(lines[n - 2].text, "ПОТЕРЯН");
        assert_eq!(lines[n - 2].color, ColorToken::Magenta);
        assert_eq!(lines[n - 1].kind, LineKind::Prompt);
        assert!(lines.iter().all(|l| !l.ephemeral));
    }

    #[test]
    fn key_clicks_are_spaced_out() {
        let t0 = Instant::now();
        assert!(key_cue_due(None, t0));
        assert!(!key_cue_due(Some(t0), t0 + Duration::from_millis(10)));
        assert!(key_cue_due(Some(t0), t0 + KEY_CUE_GAP));
    }
}
