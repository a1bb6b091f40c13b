// Copyright (c) 2026 rezky_nightky

mod audio;
mod buffer;
mod cell;
mod commands;
mod config;
mod content;
mod degradation;
mod error;
mod frame;
mod glyphs;
mod history;
mod input;
mod interpreter;
mod layers;
mod logging;
mod palette;
mod phantom;
mod render;
mod runtime;
mod session;
mod storage;
mod terminal;
mod typing;
mod wrap;

use std::collections::VecDeque;
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[cfg(unix)]
use std::thread;

use anyhow::{Context, Result};
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::Event;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::audio::{AudioBackend, AudioPlayer, NullBackend, ProcessBackend};
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, print_list_subjects,
    Args,
};
use crate::frame::Frame;
use crate::input::map_event;
use crate::interpreter::{Mode, Options};
use crate::palette::Theme;
use crate::render::{RenderOptions, Renderer, View};
use crate::runtime::{ColorMode, ColorToken};
use crate::session::{Host, Session, SessionConfig};
use crate::storage::{KvStore, DEGRADATION_KEY};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("HOLLOWTERM_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Red))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    require_f64_range(name, v as f64, min as f64, max as f64) as f32
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_u32_range(name: &str, v: u32, min: u32, max: u32) -> u32 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn default_to_ascii() -> bool {
    let lang = env::var("LC_ALL")
        .or_else(|_| env::var("LANG"))
        .unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }
    if term == "linux" || term.starts_with("vt") {
        return ColorMode::Color16;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return match m {
            0 => ColorMode::Mono,
            16 => ColorMode::Color16,
            8 | 256 => ColorMode::Color256,
            24 | 32 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,16,8/256,24/32)", m);
                std::process::exit(1);
            }
        };
    }

    detect_color_mode_auto()
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Mono => "mono",
        ColorMode::Color16 => "16-color",
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x6801_1e55)
}

fn init_logging(args: &Args) {
    let path = match &args.log_file {
        Some(p) => p.clone(),
        None => match storage::data_dir() {
            Ok(dir) => dir.join(logging::LOG_FILE_NAME),
            Err(_) => return,
        },
    };
    if let Err(e) = logging::init(&path) {
        eprintln!("logging disabled: {:#}", e);
    }
}

/// What happened to the saved level, shown once the terminal is up.
enum StateNote {
    Restored(f32),
    Wiped,
}

/// Saved level unless `--fresh`; `--degradation` wins over both.
fn open_state(args: &Args) -> (Option<KvStore>, f32, Option<StateNote>) {
    let path = match &args.state_file {
        Some(p) => Some(p.clone()),
        None => match storage::default_path() {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(%err, "degradation level will not be saved");
                None
            }
        },
    };
    let mut store = path.map(KvStore::open);
    let mut note = None;
    if args.fresh {
        if let Some(s) = store.as_mut() {
            if s.get_f32(DEGRADATION_KEY).is_some() {
                note = Some(StateNote::Wiped);
            }
            s.remove(DEGRADATION_KEY);
        }
    }
    let saved = store
        .as_ref()
        .and_then(|s| s.get_f32(DEGRADATION_KEY))
        .unwrap_or(0.0);
    let initial = match args.degradation {
        Some(v) => require_f32_range("--degradation", v, 0.0, 100.0),
        None => {
            if saved > 0.0 {
                note = Some(StateNote::Restored(saved));
            }
            saved
        }
    };
    (store, initial, note)
}

fn open_audio(args: &Args) -> AudioPlayer {
    if args.no_audio {
        return AudioPlayer::disabled();
    }
    let root = args.audio_dir.clone().unwrap_or_else(|| {
        let local = PathBuf::from("assets").join("audio");
        if local.is_dir() {
            return local;
        }
        storage::data_dir()
            .map(|d| d.join("audio"))
            .unwrap_or(local)
    });
    let backend: Box<dyn AudioBackend> = match ProcessBackend::detect(args.player.as_deref()) {
        Ok(b) => Box::new(b),
        Err(err) => {
            tracing::warn!(%err, "audio disabled");
            Box::new(NullBackend)
        }
    };
    AudioPlayer::new(root, backend)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_subjects {
        print_list_subjects();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(auto));
        if args.colormode.is_some() {
            println!("  forced: {}", color_mode_label(effective));
        }
        println!("  effective: {}", color_mode_label(effective));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        let sha = env!("HOLLOWTERM_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let tick_secs = require_u32_range("--tick-secs", args.tick_secs, 1, 3600);
    let type_ms = require_u16_range("--type-ms", args.type_ms, 0, 500);
    let ascii = default_to_ascii();
    let color_mode = detect_color_mode(&args);
    let seed = args.seed.unwrap_or_else(clock_seed);

    init_logging(&args);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        seed,
        ?color_mode,
        ascii,
        "starting"
    );

    let (store, initial_level, state_note) = open_state(&args);
    let audio = open_audio(&args);

    let mut term = Terminal::new().context("entering the alternate screen")?;
    let (w, h) = term.size()?;

    let start = Instant::now();
    let mut renderer = Renderer::new(
        Theme::new(color_mode),
        RenderOptions {
            seed,
            ascii,
            effects: !args.no_effects,
            glitch: !args.noglitch,
        },
        start,
    );
    renderer.resize(w, h);
    let mut frame = Frame::new(w, h, renderer.theme().bg);

    let mut session = Session::new(
        SessionConfig {
            interpreter: Options {
                seed,
                type_delay: Duration::from_millis(u64::from(type_ms)),
                ascii,
            },
            initial_level,
            tick_interval: Duration::from_secs(u64::from(tick_secs)),
            ascii,
        },
        audio,
        store,
        start,
    );
    session.set_screen_height(h);
    if !session.is_frozen() {
        match state_note {
            Some(StateNote::Restored(level)) => session.print_colored(
                &format!("ВОССТАНОВЛЕН УРОВЕНЬ ДЕГРАДАЦИИ: {level:.0}%"),
                ColorToken::Yellow,
            ),
            Some(StateNote::Wiped) => session.print("сохранённое состояние удалено"),
            None => {}
        }
        if let Some(text) = &args.message {
            session.type_text(text, ColorToken::Magenta);
        }
    }

    let mut pending_exec: VecDeque<String> = args.exec.iter().cloned().collect();

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();

    while !session.should_quit() {
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                let ev = Terminal::read_event()?;
                if let Event::Resize(nw, nh) = ev {
                    pending_resize = Some((nw, nh));
                }
                if let Some(input) = map_event(ev) {
                    session.handle_input(input, Instant::now());
                }
            }

            if session.should_quit() || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }
            let _ = Terminal::poll_event(next_frame - now)?;
        }

        if session.should_quit() {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            renderer.resize(nw, nh);
            frame = Frame::new(nw, nh, renderer.theme().bg);
        }

        let now = Instant::now();
        session.tick(now);
        if session.mode() == Mode::Idle {
            if let Some(cmd) = pending_exec.pop_front() {
                tracing::debug!(command = %cmd, "--exec");
                session.submit_command(&cmd);
            }
        }

        let view = View {
            buffer: session.buffer(),
            band: session.band(),
            percent: session.percent(),
            frozen: session.is_frozen(),
            caret: session.mode() == Mode::Idle,
        };
        renderer.render(&mut frame, &view, now);
        if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
            term.draw(&mut frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    session.shutdown();
    drop(term);
    tracing::info!(
        level = session.degradation_level(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "session ended"
    );
    Ok(())
}
