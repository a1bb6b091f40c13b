// Copyright (c) 2026 rezky_nightky

//! The command interpreter: owns the line buffer, the live input, history
//! and the output sequencer, and turns submitted lines into scripts.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

use crate::audio::{AudioPlayer, EFFECTS};
use crate::buffer::LineBuffer;
use crate::commands::{parse, CommandKind, Parsed};
use crate::content::{self, Dossier, Note};
use crate::degradation::{Band, DegradationEngine, DegradationEvent};
use crate::glyphs::{build_glyphs, GlyphSet};
use crate::history::History;
use crate::input::KeyInput;
use crate::runtime::ColorToken;
use crate::typing::{Delay, Script, SeqEvent, Sequencer, Step};

/// Identical submissions closer together than this are dropped.
pub const DEBOUNCE: Duration = Duration::from_millis(350);
const CORRUPTION_CHANCE: f64 = 0.7;
const AUTO_KEY_MIN_MS: u64 = 60;
const AUTO_KEY_MAX_MS: u64 = 120;
const BAR_WIDTH: usize = 20;

const CANCELLED: &str = "ОПЕРАЦИЯ ОТМЕНЕНА";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Executing,
    AwaitingConfirm,
    Frozen,
}

/// What the interpreter borrows from the session for the duration of a call.
pub struct Deps<'a> {
    pub engine: &'a mut DegradationEngine,
    pub audio: &'a mut AudioPlayer,
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub seed: u64,
    /// Base per-character delay for typed output.
    pub type_delay: Duration,
    pub ascii: bool,
}

#[derive(Debug)]
struct AutoTyper {
    chars: Vec<char>,
    pos: usize,
    next_at: Instant,
}

pub struct Interpreter {
    buffer: LineBuffer,
    input: String,
    history: History,
    seq: Sequencer,
    frozen: bool,
    last_submit: Option<(String, Instant)>,
    command_count: u32,
    session_start: Instant,
    syslog_level: u8,
    rng: StdRng,
    type_delay: Duration,
    corrupt_glyphs: Vec<char>,
    auto: Option<AutoTyper>,
    /// Byte offset of a phantom character in `input`.
    ghost: Option<usize>,
    quit: bool,
}

pub fn confirm_answer(c: char) -> Option<bool> {
    match c {
        'y' | 'Y' | 'н' | 'Н' => Some(true),
        'n' | 'N' | 'т' | 'Т' => Some(false),
        _ => None,
    }
}

impl Interpreter {
    pub fn new(opts: Options, now: Instant) -> Self {
        Self {
            buffer: LineBuffer::default(),
            input: String::new(),
            history: History::default(),
            seq: Sequencer::new(opts.seed ^ 0x5eed),
            frozen: false,
            last_submit: None,
            command_count: 0,
            session_start: now,
            syslog_level: 0,
            rng: StdRng::seed_from_u64(opts.seed),
            type_delay: opts.type_delay,
            corrupt_glyphs: build_glyphs(GlyphSet::GLITCH.union(GlyphSet::CYRILLIC), opts.ascii),
            auto: None,
            ghost: None,
            quit: false,
        }
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut LineBuffer {
        &mut self.buffer
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub fn command_count(&self) -> u32 {
        self.command_count
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn mode(&self) -> Mode {
        if self.frozen {
            Mode::Frozen
        } else if self.seq.awaiting_confirm() {
            Mode::AwaitingConfirm
        } else if self.seq.is_busy() || self.auto.is_some() {
            Mode::Executing
        } else {
            Mode::Idle
        }
    }

    /// True when a phantom keystroke or command may be injected.
    pub fn accepts_phantom(&self) -> bool {
        self.mode() == Mode::Idle
    }

    fn delay(&self) -> Delay {
        if self.type_delay.is_zero() {
            Delay::Fixed(Duration::ZERO)
        } else {
            Delay::Jitter {
                base: self.type_delay,
                spread: self.type_delay / 2,
            }
        }
    }

    /// Banner plus prompt, used at startup.
    pub fn boot(&mut self, now: Instant, deps: &mut Deps<'_>) -> Vec<DegradationEvent> {
        self.seq.run(banner(), now);
        self.pump(now, deps)
    }

    pub fn handle_key(
        &mut self,
        key: KeyInput,
        now: Instant,
        deps: &mut Deps<'_>,
    ) -> Vec<DegradationEvent> {
        match self.mode() {
            Mode::Frozen | Mode::Executing => return Vec::new(),
            Mode::AwaitingConfirm => {
                if let KeyInput::Char(c) = key {
                    if let Some(yes) = confirm_answer(c) {
                        self.seq.resolve_confirm(yes, &mut self.buffer);
                        return self.pump(now, deps);
                    }
                }
                return Vec::new();
            }
            Mode::Idle => {}
        }

        match key {
            KeyInput::Char(c) => {
                self.ghost_remove();
                self.input.push(c);
            }
            KeyInput::Backspace => {
                self.ghost_remove();
                self.input.pop();
            }
            KeyInput::HistoryUp => {
                self.ghost_remove();
                if let Some(prev) = self.history.up(&self.input) {
                    self.input = prev.to_string();
                }
            }
            KeyInput::HistoryDown => {
                self.ghost_remove();
                if let Some(next) = self.history.down() {
                    self.input = next;
                }
            }
            KeyInput::Enter => return self.submit(now, deps),
            _ => return Vec::new(),
        }
        self.buffer.update_prompt(&self.input);
        Vec::new()
    }

    /// Types `cmd` into the prompt and submits it, as if the user had.
    /// Ignored unless the interpreter is idle.
    pub fn submit_command(
        &mut self,
        cmd: &str,
        now: Instant,
        deps: &mut Deps<'_>,
    ) -> Vec<DegradationEvent> {
        if self.mode() != Mode::Idle {
            return Vec::new();
        }
        self.ghost_remove();
        self.input = cmd.to_string();
        self.buffer.update_prompt(&self.input);
        self.submit(now, deps)
    }

    fn submit(&mut self, now: Instant, deps: &mut Deps<'_>) -> Vec<DegradationEvent> {
        self.ghost_remove();
        let raw = std::mem::take(&mut self.input);
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            self.buffer.commit_prompt();
            self.buffer.show_prompt("");
            return Vec::new();
        }

        if let Some((last, at)) = &self.last_submit {
            if last == trimmed && now.saturating_duration_since(*at) < DEBOUNCE {
                tracing::debug!(command = trimmed, "duplicate submission dropped");
                self.buffer.update_prompt("");
                return Vec::new();
            }
        }
        self.last_submit = Some((trimmed.to_string(), now));

        self.buffer.commit_prompt();
        self.history.push(trimmed);
        self.command_count += 1;

        let parsed = parse(trimmed);
        let (script, mut events) = self.dispatch(&parsed, now, deps);
        // A command that tips the level into collapse prints nothing.
        if deps.engine.is_frozen() {
            tracing::debug!(command = trimmed, "output dropped by collapse");
        } else {
            self.seq.run(script, now);
        }
        events.extend(self.pump(now, deps));
        events
    }

    fn dispatch(
        &mut self,
        cmd: &Parsed,
        now: Instant,
        deps: &mut Deps<'_>,
    ) -> (Script, Vec<DegradationEvent>) {
        let Some(kind) = cmd.kind else {
            tracing::debug!(input = %cmd.raw, "unknown command");
            let script =
                Script::new().print(format!("команда не найдена: {}", cmd.raw), ColorToken::Red);
            return (script, Vec::new());
        };

        let needs_arg = matches!(
            kind,
            CommandKind::Dscr
                | CommandKind::Open
                | CommandKind::PlayAudio
                | CommandKind::StopAudio
        );
        if needs_arg && cmd.arg(0).is_none() {
            let script = Script::new().print(
                format!("использование: {} <id>", kind.name()),
                ColorToken::Red,
            );
            return (script, Vec::new());
        }

        tracing::debug!(command = kind.name(), args = ?cmd.args, "dispatch");
        let events = deps.engine.add_degradation(kind.weight(), now);

        let script = match kind {
            CommandKind::Help => help(),
            CommandKind::Clear => Script::new().step(Step::Clear).extend(banner()),
            CommandKind::Syst => self.syst(now, deps.engine),
            CommandKind::Syslog => self.syslog(now),
            CommandKind::Subj => subj(),
            CommandKind::Dscr => self.dscr(cmd.arg(0).unwrap_or_default(), deps.audio),
            CommandKind::Notes => notes(),
            CommandKind::Open => self.open(cmd.arg(0).unwrap_or_default()),
            CommandKind::PlayAudio => play_audio(cmd.arg(0).unwrap_or_default(), deps.audio),
            CommandKind::StopAudio => {
                let id = cmd.arg(0).unwrap_or_default().to_uppercase();
                deps.audio.stop(&id);
                Script::new().print(format!("■ ОСТАНОВЛЕНО: {id}"), ColorToken::Cyan)
            }
            CommandKind::StopAll => {
                deps.audio.stop_all();
                Script::new().print("■ ВСЕ ЗАПИСИ ОСТАНОВЛЕНЫ", ColorToken::Cyan)
            }
            CommandKind::Deg => {
                let (script, set_events) = deg(cmd.arg(0), now, deps.engine);
                let mut all = events;
                all.extend(set_events);
                return (script, all);
            }
            CommandKind::Reset => self.reset(),
            CommandKind::Exit => self.exit(),
        };
        (script, events)
    }

    fn syst(&self, now: Instant, engine: &DegradationEngine) -> Script {
        let up = now.saturating_duration_since(self.session_start).as_secs();
        let pct = engine.percent();
        let band = engine.band();
        let d = self.delay();
        Script::new()
            .typed("=== СОСТОЯНИЕ СИСТЕМЫ ===", ColorToken::Cyan, d)
            .typed("ЯДРО: A.D.A.M. v3.7.1", ColorToken::Normal, d)
            .typed(
                format!("АПТАЙМ: {:02}:{:02}", up / 60, up % 60),
                ColorToken::Normal,
                d,
            )
            .typed(
                format!("КОМАНД ВЫПОЛНЕНО: {}", self.command_count),
                ColorToken::Normal,
                d,
            )
            .typed(
                format!("ЦЕЛОСТНОСТЬ ПАМЯТИ: {}%", 100u8.saturating_sub(pct)),
                ColorToken::Normal,
                d,
            )
            .print(
                format!("ДЕГРАДАЦИЯ: {} {pct}% ({})", bar(pct), band.label()),
                band.color(),
            )
    }

    fn syslog(&mut self, now: Instant) -> Script {
        let minutes = now.saturating_duration_since(self.session_start).as_secs() / 60;
        let by_commands = match self.command_count {
            n if n >= 20 => 3,
            n if n >= 12 => 2,
            n if n >= 5 => 1,
            _ => 0,
        };
        let by_time = match minutes {
            m if m >= 10 => 3,
            m if m >= 5 => 2,
            m if m >= 2 => 1,
            _ => 0,
        };
        self.syslog_level = self.syslog_level.max(by_commands).max(by_time);

        let d = self.delay();
        let mut s = Script::new().typed("=== ЖУРНАЛ СИСТЕМЫ ===", ColorToken::Cyan, d);
        for (text, color) in SYSLOG[usize::from(self.syslog_level.min(3))] {
            s = s.typed(*text, *color, d);
        }
        s
    }

    fn dscr(&mut self, id: &str, audio: &mut AudioPlayer) -> Script {
        match content::dossier(id) {
            Ok(d) => {
                if let Some(a) = d.audio {
                    audio.register(d.id, a.file);
                }
                self.dossier_script(d)
            }
            Err(err) => {
                tracing::debug!(%err, "dossier lookup failed");
                Script::new().print(
                    format!("субъект не найден: {}", id.to_uppercase()),
                    ColorToken::Red,
                )
            }
        }
    }

    fn dossier_script(&self, d: &Dossier) -> Script {
        let t = self.delay();
        let mut s = Script::new()
            .typed(format!("=== ДОСЬЕ {} ===", d.id), ColorToken::Cyan, t)
            .typed(format!("ИМЯ: {}", d.name), ColorToken::White, t)
            .typed(format!("РОЛЬ: {}", d.role), ColorToken::Normal, t)
            .typed(format!("СТАТУС: {}", d.status.label()), d.status.color(), t)
            .typed("ИСХОД:", ColorToken::Dim, t);
        for line in d.outcome {
            s = s.typed(format!("  {line}"), ColorToken::Normal, t);
        }
        s = s.typed("ОТЧЁТ:", ColorToken::Dim, t);
        for line in d.report {
            s = s.typed(format!("  {line}"), ColorToken::Normal, t);
        }
        s = s.typed(format!("МИССИИ: {}", d.missions), ColorToken::Normal, t);
        if let Some(a) = d.audio {
            s = s
                .typed(format!("АУДИОЗАПИСЬ: {}", a.description), ColorToken::Cyan, t)
                .print(
                    format!("  playaudio {} / stopaudio {}", d.id, d.id),
                    ColorToken::Dim,
                );
        }
        s
    }

    fn open(&mut self, id: &str) -> Script {
        let note = match content::note(id) {
            Ok(n) => n,
            Err(err) => {
                tracing::debug!(%err, "note lookup failed");
                return Script::new().print(
                    format!("заметка не найдена: {}", id.to_uppercase()),
                    ColorToken::Red,
                );
            }
        };
        if !content::is_safe_note(note.id) && self.rng.random_bool(CORRUPTION_CHANCE) {
            return self.corrupted(note);
        }
        let t = self.delay();
        let mut s = Script::new()
            .typed(format!("=== {} ===", note.title), ColorToken::Cyan, t)
            .typed(format!("АВТОР: {}", note.author), ColorToken::Dim, t)
            .print("", ColorToken::Normal);
        for line in note.content {
            s = s.typed(*line, ColorToken::Normal, t);
        }
        s
    }

    fn corrupted(&mut self, note: &Note) -> Script {
        let t = self.delay();
        let mut s = Script::new()
            .sound(EFFECTS, "corrupt")
            .typed(format!("ОШИБКА ЧТЕНИЯ: {}", note.id), ColorToken::Red, t)
            .typed(format!("=== {} ===", self.garble(note.title, 0.5)), ColorToken::Red, t);
        for line in note.content.iter().take(3) {
            let g = self.garble(line, 0.6);
            s = s.typed(g, ColorToken::Red, t);
        }
        s.typed("ДАННЫЕ ПОВРЕЖДЕНЫ. ВОССТАНОВЛЕНИЕ НЕВОЗМОЖНО.", ColorToken::Red, t)
    }

    fn garble(&mut self, text: &str, p: f64) -> String {
        text.chars()
            .map(|c| {
                if c.is_whitespace() || !self.rng.random_bool(p) {
                    c
                } else {
                    *self.corrupt_glyphs.choose(&mut self.rng).unwrap_or(&'#')
                }
            })
            .collect()
    }

    fn reset(&self) -> Script {
        let t = self.delay();
        let yes = Script::new()
            .step(Step::Clear)
            .typed("ИНИЦИАЛИЗАЦИЯ ПЕРЕЗАГРУЗКИ...", ColorToken::Yellow, t)
            .pause_ms(400)
            .typed("ОЧИСТКА ПАМЯТИ", ColorToken::Normal, t)
            .typed(
                "█".repeat(BAR_WIDTH),
                ColorToken::Cyan,
                Delay::Fixed(Duration::from_millis(60)),
            )
            .step(Step::ZeroDegradation)
            .typed("ЦЕЛОСТНОСТЬ ВОССТАНОВЛЕНА: 100%", ColorToken::Normal, t)
            .pause_ms(600)
            .step(Step::Clear)
            .sound(EFFECTS, "boot")
            .extend(banner());
        Script::new().confirm(
            "ПОДТВЕРДИТЕ СБРОС СИСТЕМЫ [Y/N]",
            yes,
            Script::new().print(CANCELLED, ColorToken::Yellow),
        )
    }

    fn exit(&self) -> Script {
        let t = self.delay();
        let yes = Script::new()
            .typed("ЗАВЕРШЕНИЕ СЕАНСА...", ColorToken::Yellow, t)
            .sound(EFFECTS, "shutdown")
            .pause_ms(500)
            .typed("СОЕДИНЕНИЕ ЗАКРЫТО.", ColorToken::Dim, t)
            .pause_ms(800)
            .step(Step::Quit);
        Script::new().confirm(
            "ЗАВЕРШИТЬ СЕАНС? [Y/N]",
            yes,
            Script::new().print(CANCELLED, ColorToken::Yellow),
        )
    }

    /// Advances scripted output and the auto-typer.
    pub fn tick(&mut self, now: Instant, deps: &mut Deps<'_>) -> Vec<DegradationEvent> {
        let mut events = self.pump(now, deps);
        if self.frozen {
            return events;
        }
        let Some(auto) = self.auto.as_mut() else {
            return events;
        };
        while auto.next_at <= now && auto.pos < auto.chars.len() {
            self.input.push(auto.chars[auto.pos]);
            auto.pos += 1;
            auto.next_at += Duration::from_millis(
                self.rng.random_range(AUTO_KEY_MIN_MS..=AUTO_KEY_MAX_MS),
            );
        }
        let done = auto.pos >= auto.chars.len() && auto.next_at <= now;
        self.buffer.update_prompt(&self.input);
        if done {
            self.auto = None;
            events.extend(self.submit(now, deps));
        }
        events
    }

    fn pump(&mut self, now: Instant, deps: &mut Deps<'_>) -> Vec<DegradationEvent> {
        let mut events = Vec::new();
        for ev in self.seq.tick(now, &mut self.buffer) {
            match ev {
                SeqEvent::Sound { category, id } => deps.audio.play(category, id),
                SeqEvent::ZeroDegradation => events.extend(deps.engine.zero()),
                SeqEvent::Quit => self.quit = true,
            }
        }
        if !self.frozen && !self.quit && !self.seq.is_busy() && !self.buffer.has_prompt() {
            self.buffer.show_prompt(&self.input);
        }
        events
    }

    /// Collapse: cancels running output and any pending confirmation.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        self.seq.abort();
        self.buffer.finalize_ephemeral();
        self.buffer.remove_prompt();
        self.auto = None;
        self.ghost = None;
        self.input.clear();
        self.buffer.append("", ColorToken::Normal);
        self.buffer
            .append("!!! КРИТИЧЕСКИЙ СБОЙ СИСТЕМЫ !!!", ColorToken::Red);
        self.buffer
            .append("ЦЕЛОСТНОСТЬ ЯДРА НАРУШЕНА. АВАРИЙНЫЙ ПЕРЕЗАПУСК...", ColorToken::Red);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn recover(&mut self, now: Instant, deps: &mut Deps<'_>) -> Vec<DegradationEvent> {
        self.frozen = false;
        let mut events = self.pump(now, deps);
        self.buffer.clear();
        self.input.clear();
        self.seq.run(banner(), now);
        events.extend(self.pump(now, deps));
        events
    }

    pub fn ghost_insert(&mut self, ch: char) {
        if !self.accepts_phantom() || self.ghost.is_some() {
            return;
        }
        self.ghost = Some(self.input.len());
        self.input.push(ch);
        self.buffer.update_prompt(&self.input);
    }

    pub fn ghost_remove(&mut self) {
        let Some(at) = self.ghost.take() else {
            return;
        };
        if self.input.is_char_boundary(at) && at < self.input.len() {
            self.input.remove(at);
        }
        self.buffer.update_prompt(&self.input);
    }

    /// Starts typing `cmd` into the prompt on its own; it is submitted
    /// once the last character lands.
    pub fn auto_command(&mut self, cmd: &str, now: Instant) {
        if !self.accepts_phantom() {
            return;
        }
        tracing::debug!(command = cmd, "phantom command");
        self.ghost_remove();
        self.input.clear();
        self.buffer.update_prompt("");
        self.auto = Some(AutoTyper {
            chars: cmd.chars().collect(),
            pos: 0,
            next_at: now,
        });
    }

    /// Appends a line, keeping the prompt (if any) last. While output is
    /// running the text is queued behind it instead.
    pub fn print(&mut self, text: &str, color: ColorToken, now: Instant) {
        if self.seq.is_busy() {
            let script = text
                .split('\n')
                .fold(Script::new(), |s, line| s.print(line, color));
            self.seq.run(script, now);
            return;
        }
        let had_prompt = self.buffer.has_prompt();
        self.buffer.remove_prompt();
        for line in text.split('\n') {
            self.buffer.append(line, color);
        }
        if had_prompt {
            self.buffer.show_prompt(&self.input);
        }
    }

    pub fn type_text(&mut self, text: &str, color: ColorToken, now: Instant) {
        if self.frozen {
            return;
        }
        self.buffer.remove_prompt();
        let d = self.delay();
        let mut s = Script::new();
        for line in text.split('\n') {
            s = s.typed(line, color, d);
        }
        self.seq.run(s, now);
    }
}

fn bar(pct: u8) -> String {
    let filled = usize::from(pct.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn banner() -> Script {
    Script::new()
        .print("A.D.A.M. SECURE TERMINAL v3.7.1", ColorToken::Cyan)
        .print("ОБЪЕКТ «ГЛУБИНА-7» / ОТДЕЛ НАБЛЮДЕНИЯ", ColorToken::Dim)
        .print("СОЕДИНЕНИЕ УСТАНОВЛЕНО. ДОСТУП: ОГРАНИЧЕН", ColorToken::Normal)
        .print("Введите 'help' для списка команд.", ColorToken::Dim)
        .print("", ColorToken::Normal)
}

const HELP: &[(&str, &str)] = &[
    ("help", "список команд"),
    ("clear", "очистить экран"),
    ("syst", "состояние системы"),
    ("syslog", "журнал системы"),
    ("subj", "список субъектов"),
    ("dscr <id>", "досье субъекта"),
    ("notes", "список заметок"),
    ("open <id>", "открыть заметку"),
    ("playaudio <id>", "воспроизвести аудиозапись досье"),
    ("stopaudio <id>", "остановить аудиозапись"),
    ("stopall", "остановить все записи"),
    ("deg [0-100]", "показать или задать уровень деградации"),
    ("reset", "перезагрузка системы"),
    ("exit", "завершить сеанс"),
];

fn help() -> Script {
    HELP.iter().fold(
        Script::new().print("ДОСТУПНЫЕ КОМАНДЫ:", ColorToken::Cyan),
        |s, (cmd, desc)| s.print(format!("  {cmd:<16}{desc}"), ColorToken::Normal),
    )
}

fn subj() -> Script {
    content::dossiers().iter().fold(
        Script::new().print("=== СУБЪЕКТЫ ===", ColorToken::Cyan),
        |s, d| {
            s.print(
                format!("  {}  {:<26}{}", d.id, d.name, d.status.label()),
                d.status.color(),
            )
        },
    )
}

fn notes() -> Script {
    content::notes().iter().fold(
        Script::new().print("=== ЗАМЕТКИ ===", ColorToken::Cyan),
        |s, n| {
            s.print(
                format!("  {}  {} / {}", n.id, n.title, n.author),
                ColorToken::Normal,
            )
        },
    )
}

fn play_audio(id: &str, audio: &mut AudioPlayer) -> Script {
    let id = id.to_uppercase();
    if audio.play_recording(&id) {
        Script::new().print(format!("▶ ВОСПРОИЗВЕДЕНИЕ: {id}"), ColorToken::Cyan)
    } else {
        Script::new().print(
            format!("аудиозапись не загружена: {id} (сначала dscr {id})"),
            ColorToken::Red,
        )
    }
}

fn deg(
    arg: Option<&str>,
    now: Instant,
    engine: &mut DegradationEngine,
) -> (Script, Vec<DegradationEvent>) {
    let Some(arg) = arg else {
        let s = Script::new().print(
            format!(
                "ДЕГРАДАЦИЯ: {} {}% ({})",
                bar(engine.percent()),
                engine.percent(),
                engine.band().label()
            ),
            engine.band().color(),
        );
        return (s, Vec::new());
    };
    match arg.parse::<f32>() {
        Ok(v) if v.is_finite() && (0.0..=100.0).contains(&v) => {
            let events = engine.set_level(v, now);
            let s = Script::new().print(
                format!("ДЕГРАДАЦИЯ УСТАНОВЛЕНА: {}%", engine.percent()),
                Band::from_level(v).color(),
            );
            (s, events)
        }
        _ => (
            Script::new().print(
                format!("недопустимое значение: {arg} (0-100)"),
                ColorToken::Red,
            ),
            Vec::new(),
        ),
    }
}

const SYSLOG: [&[(&str, ColorToken)]; 4] = [
    &[
        ("[00:00:01] ядро загружено", ColorToken::Normal),
        ("[00:00:02] сеть: канал стабилен", ColorToken::Normal),
        ("[00:00:04] датчики сектора 7: норма", ColorToken::Normal),
    ],
    &[
        ("[00:14:51] датчики сектора 7: помехи", ColorToken::Yellow),
        ("[00:15:03] повторный запрос к 0x001: нет ответа", ColorToken::Normal),
        ("[00:15:40] неизвестный процесс pid 666 запущен", ColorToken::Yellow),
    ],
    &[
        ("[01:02:17] память: сектор 0x7F3A не читается", ColorToken::Red),
        ("[01:02:18] пользователь adam: вход с двух терминалов", ColorToken::Yellow),
        ("[01:03:00] голосовой канал открыт без запроса", ColorToken::Yellow),
        ("[01:03:01] ...ты слышишь это?", ColorToken::Dim),
    ],
    &[
        ("[??:??:??] журнал переписан", ColorToken::Red),
        ("[??:??:??] субъект 0x047 обнаружен в системе", ColorToken::Red),
        ("[??:??:??] субъект 0x047 = оператор", ColorToken::Red),
        ("[??:??:??] НЕ ВЫКЛЮЧАЙ ТЕРМИНАЛ", ColorToken::Magenta),
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{LineKind, PROMPT_PREFIX};
    use crate::degradation::DEFAULT_TICK_INTERVAL;

    struct Rig {
        interp: Interpreter,
        engine: DegradationEngine,
        audio: AudioPlayer,
        now: Instant,
    }

    impl Rig {
        fn new() -> Self {
            let now = Instant::now();
            let opts = Options {
                seed: 11,
                type_delay: Duration::from_millis(2),
                ascii: false,
            };
            let mut rig = Rig {
                interp: Interpreter::new(opts, now),
                engine: DegradationEngine::new(0.0, DEFAULT_TICK_INTERVAL),
                audio: AudioPlayer::disabled(),
                now,
            };
            let mut deps = Deps {
                engine: &mut rig.engine,
                audio: &mut rig.audio,
            };
            rig.interp.boot(now, &mut deps);
            rig
        }

        fn submit(&mut self, cmd: &str) -> Vec<DegradationEvent> {
            let mut deps = Deps {
                engine: &mut self.engine,
                audio: &mut self.audio,
            };
            self.interp.submit_command(cmd, self.now, &mut deps)
        }

        fn key(&mut self, k: KeyInput) {
            let mut deps = Deps {
                engine: &mut self.engine,
                audio: &mut self.audio,
            };
            self.interp.handle_key(k, self.now, &mut deps);
        }

        fn advance(&mut self, d: Duration) {
            self.now += d;
            let mut deps = Deps {
                engine: &mut self.engine,
                audio: &mut self.audio,
            };
            self.interp.tick(self.now, &mut deps);
        }

        /// Runs scripted output to completion or to a pending question.
        fn settle(&mut self) {
            for _ in 0..5000 {
                if self.interp.mode() != Mode::Executing {
                    break;
                }
                self.advance(Duration::from_millis(20));
            }
        }

        fn texts(&self) -> Vec<String> {
            self.interp.buffer().lines().map(|l| l.text.clone()).collect()
        }
    }

    #[test]
    fn boot_prints_banner_and_prompt() {
        let rig = Rig::new();
        let last = rig.interp.buffer().last().unwrap();
        assert_eq!(last.kind, LineKind::Prompt);
        assert_eq!(last.text, PROMPT_PREFIX);
        assert!(rig.texts()[0].contains("A.D.A.M."));
        assert_eq!(rig.interp.mode(), Mode::Idle);
    }

    #[test]
    fn unknown_command_adds_one_red_line() {
        let mut rig = Rig::new();
        let before = rig.interp.buffer().len();
        rig.submit("frobnicate");
        rig.settle();
        let lines: Vec<_> = rig.interp.buffer().lines().cloned().collect();
        assert_eq!(lines.len(), before + 2);
        let err = &lines[lines.len() - 2];
        assert_eq!(err.text, "команда не найдена: frobnicate");
        assert_eq!(err.color, ColorToken::Red);
        assert_eq!(lines[lines.len() - 3].kind, LineKind::Echo);
        assert_eq!(rig.engine.level(), 0.0);
    }

    #[test]
    fn dossier_lookup_prints_name_and_status() {
        let mut rig = Rig::new();
        rig.submit("dscr 0x001");
        rig.settle();
        let texts = rig.texts();
        assert!(texts.iter().any(|t| t.contains("ERICH VAN KOSS")));
        assert!(texts.iter().any(|t| t.contains("СВЯЗЬ ОТСУТСТВУЕТ")));
        assert_eq!(rig.engine.level(), 2.0);
        assert!(rig.audio.is_registered("0x001"));
    }

    #[test]
    fn dossier_miss_still_degrades_but_missing_arg_does_not() {
        let mut rig = Rig::new();
        rig.submit("dscr");
        rig.settle();
        assert_eq!(rig.engine.level(), 0.0);
        rig.submit("dscr 0xFFF");
        rig.settle();
        assert_eq!(rig.engine.level(), 2.0);
        assert!(rig.texts().iter().any(|t| t == "субъект не найден: 0XFFF"));
    }

    #[test]
    fn safe_note_never_corrupts() {
        let mut rig = Rig::new();
        let expected: Vec<String> = content::note("NOTE_001")
            .unwrap()
            .content
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(expected.len(), 4);
        for _ in 0..100 {
            rig.now += DEBOUNCE;
            rig.submit("open note_001");
            rig.settle();
            let lines: Vec<_> = rig.interp.buffer().lines().cloned().collect();
            let echo = lines
                .iter()
                .rposition(|l| l.kind == LineKind::Echo)
                .unwrap();
            let out = &lines[echo + 1..lines.len() - 1];
            assert!(out.iter().all(|l| l.color != ColorToken::Red));
            let body: Vec<String> = out[out.len() - 4..].iter().map(|l| l.text.clone()).collect();
            assert_eq!(body, expected);
        }
    }

    #[test]
    fn unsafe_note_sometimes_corrupts() {
        let mut rig = Rig::new();
        let mut corrupted = 0;
        for _ in 0..40 {
            rig.now += DEBOUNCE;
            rig.submit("open note_003");
            rig.settle();
            let echo = rig
                .interp
                .buffer()
                .lines()
                .rposition(|l| l.kind == LineKind::Echo)
                .unwrap();
            if rig
                .interp
                .buffer()
                .lines()
                .skip(echo + 1)
                .any(|l| l.text.starts_with("ОШИБКА ЧТЕНИЯ"))
            {
                corrupted += 1;
            }
        }
        assert!(corrupted > 10 && corrupted < 40, "corrupted {corrupted}/40");
    }

    #[test]
    fn reset_declined_leaves_everything_alone() {
        let mut rig = Rig::new();
        rig.submit("syst");
        rig.settle();
        let level = rig.engine.level();
        rig.now += DEBOUNCE;
        rig.submit("reset");
        rig.settle();
        assert_eq!(rig.interp.mode(), Mode::AwaitingConfirm);
        rig.key(KeyInput::Char('т'));
        rig.settle();

        let lines: Vec<_> = rig.interp.buffer().lines().cloned().collect();
        let echo = lines
            .iter()
            .rposition(|l| l.kind == LineKind::Echo)
            .unwrap();
        assert_eq!(lines[echo].text, format!("{PROMPT_PREFIX}reset"));
        let after: Vec<&str> = lines[echo + 1..]
            .iter()
            .filter(|l| l.kind != LineKind::Prompt)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(
            after,
            vec!["confirm>> ПОДТВЕРДИТЕ СБРОС СИСТЕМЫ [Y/N] N", CANCELLED]
        );
        assert_eq!(rig.engine.level(), level);
        assert!(rig.texts().iter().any(|t| t.starts_with("ДЕГРАДАЦИЯ:")));
    }

    #[test]
    fn reset_confirmed_reboots_to_zero() {
        let mut rig = Rig::new();
        rig.engine.set_level(50.0, rig.now);
        rig.submit("reset");
        rig.settle();
        rig.key(KeyInput::Char('y'));
        rig.settle();
        assert_eq!(rig.engine.level(), 0.0);
        assert!(rig.texts()[0].contains("A.D.A.M."));
        assert_eq!(rig.interp.mode(), Mode::Idle);
    }

    #[test]
    fn duplicate_submission_is_debounced() {
        let mut rig = Rig::new();
        rig.submit("help");
        rig.now += Duration::from_millis(100);
        rig.submit("help");
        let echoes = rig
            .interp
            .buffer()
            .lines()
            .filter(|l| l.kind == LineKind::Echo)
            .count();
        assert_eq!(echoes, 1);
        assert_eq!(rig.interp.command_count(), 1);
        assert_eq!(rig.interp.buffer().last().unwrap().text, PROMPT_PREFIX);

        rig.now += DEBOUNCE;
        rig.submit("help");
        assert_eq!(rig.interp.command_count(), 2);
    }

    #[test]
    fn keystrokes_edit_the_prompt_and_history_recalls() {
        let mut rig = Rig::new();
        for c in "subj".chars() {
            rig.key(KeyInput::Char(c));
        }
        rig.key(KeyInput::Backspace);
        assert_eq!(
            rig.interp.buffer().last().unwrap().text,
            format!("{PROMPT_PREFIX}sub")
        );
        rig.key(KeyInput::Char('j'));
        rig.key(KeyInput::Enter);
        rig.settle();
        rig.key(KeyInput::HistoryUp);
        assert_eq!(rig.interp.input(), "subj");
        rig.key(KeyInput::HistoryDown);
        assert_eq!(rig.interp.input(), "");
        assert_eq!(rig.engine.level(), 2.0);
    }

    #[test]
    fn input_is_ignored_while_output_is_typing() {
        let mut rig = Rig::new();
        rig.submit("syst");
        assert_eq!(rig.interp.mode(), Mode::Executing);
        rig.key(KeyInput::Char('x'));
        rig.settle();
        assert_eq!(rig.interp.input(), "");
    }

    #[test]
    fn freeze_cancels_typing_and_confirmation() {
        let mut rig = Rig::new();
        rig.submit("reset");
        rig.settle();
        rig.interp.freeze();
        assert_eq!(rig.interp.mode(), Mode::Frozen);
        rig.key(KeyInput::Char('y'));
        rig.advance(Duration::from_secs(1));
        assert!(!rig.interp.buffer().has_prompt());
        assert!(rig.texts().iter().any(|t| t.contains("КРИТИЧЕСКИЙ СБОЙ")));

        let mut deps = Deps {
            engine: &mut rig.engine,
            audio: &mut rig.audio,
        };
        rig.interp.recover(rig.now, &mut deps);
        assert_eq!(rig.interp.mode(), Mode::Idle);
        assert!(rig.texts()[0].contains("A.D.A.M."));
        assert_eq!(rig.interp.buffer().last().unwrap().kind, LineKind::Prompt);
        assert!(!rig.texts().iter().any(|t| t.contains("ПЕРЕЗАГРУЗКИ")));
    }

    #[test]
    fn freeze_mid_type_finalizes_the_line() {
        let mut rig = Rig::new();
        rig.submit("dscr 0x009");
        rig.advance(Duration::from_millis(3));
        rig.interp.freeze();
        rig.advance(Duration::from_secs(5));
        assert!(rig.interp.buffer().lines().all(|l| !l.ephemeral));
        assert!(!rig.texts().iter().any(|t| t.contains("МИССИИ")));
    }

    #[test]
    fn exit_confirmed_requests_quit() {
        let mut rig = Rig::new();
        rig.submit("exit");
        rig.settle();
        rig.key(KeyInput::Char('Н'));
        rig.settle();
        assert!(rig.interp.should_quit());
    }

    #[test]
    fn deg_validates_and_sets() {
        let mut rig = Rig::new();
        rig.submit("deg 150");
        assert_eq!(rig.engine.level(), 0.0);
        rig.submit("deg 99");
        assert_eq!(rig.engine.level(), 99.0);
        assert!(rig.engine.is_frozen());
    }

    #[test]
    fn deg_collapse_event_is_returned() {
        let mut rig = Rig::new();
        let ev = rig.submit("deg 98");
        assert!(ev.contains(&DegradationEvent::Collapse));
    }

    #[test]
    fn ghost_keystroke_comes_and_goes() {
        let mut rig = Rig::new();
        rig.key(KeyInput::Char('a'));
        rig.interp.ghost_insert('ж');
        assert_eq!(
            rig.interp.buffer().last().unwrap().text,
            format!("{PROMPT_PREFIX}aж")
        );
        rig.interp.ghost_remove();
        assert_eq!(rig.interp.input(), "a");
    }

    #[test]
    fn phantom_command_is_typed_then_submitted() {
        let mut rig = Rig::new();
        let now = rig.now;
        rig.interp.auto_command("syst", now);
        assert_eq!(rig.interp.mode(), Mode::Executing);
        rig.settle();
        assert!(rig
            .texts()
            .iter()
            .any(|t| *t == format!("{PROMPT_PREFIX}syst")));
        assert_eq!(rig.engine.level(), 1.0);
    }

    #[test]
    fn syslog_level_never_drops() {
        let mut rig = Rig::new();
        rig.now += Duration::from_secs(11 * 60);
        rig.submit("syslog");
        rig.settle();
        assert_eq!(rig.interp.syslog_level, 3);
        rig.submit("help");
        rig.now += DEBOUNCE;
        rig.submit("syslog");
        assert_eq!(rig.interp.syslog_level, 3);
    }

    #[test]
    fn command_that_collapses_prints_nothing() {
        let mut rig = Rig::new();
        rig.engine.set_level(97.0, rig.now);
        let ev = rig.submit("subj");
        assert!(ev.contains(&DegradationEvent::Collapse));
        rig.interp.freeze();
        rig.advance(Duration::from_secs(1));
        assert!(!rig.texts().iter().any(|t| t == "=== СУБЪЕКТЫ ==="));
        assert!(!rig.texts().iter().any(|t| t.contains("ERICH VAN KOSS")));
    }

    #[test]
    fn host_text_waits_for_running_output() {
        let mut rig = Rig::new();
        rig.submit("syst");
        assert_eq!(rig.interp.mode(), Mode::Executing);
        let now = rig.now;
        rig.interp.print("ВНЕШНЕЕ", ColorToken::Magenta, now);
        rig.settle();
        let lines: Vec<_> = rig.interp.buffer().lines().cloned().collect();
        assert!(lines.iter().all(|l| !l.ephemeral));
        let n = lines.len();
        assert_eq!(lines[n - 2].text, "ВНЕШНЕЕ");
        assert_eq!(lines[n - 1].kind, LineKind::Prompt);
    }
}
