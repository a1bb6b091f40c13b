// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::content;
use crate::degradation::DEFAULT_TICK_INTERVAL;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  hollowterm --fps 60 --tick-secs 30 --type-ms 18";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        let styled = if is_heading {
            format!("\x1b[1;36m{line}\x1b[0m")
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            format!("      \x1b[32mExample:\x1b[0m{rest}")
        } else if let Some(rest) = line.strip_prefix("  hollowterm") {
            format!("  \x1b[1;34mhollowterm\x1b[0m{rest}")
        } else if let Some(rest) = line.strip_prefix("  -") {
            format!("  \x1b[33m-{rest}\x1b[0m")
        } else {
            line.to_string()
        };
        out.push_str(&styled);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "hollowterm", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed for every random source (default: from the clock)"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "state-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Where the degradation level is kept (default: platform data dir)"
    )]
    pub state_file: Option<PathBuf>,

    #[arg(
        long = "fresh",
        help_heading = "GENERAL",
        help = "Ignore the saved degradation level and start from zero"
    )]
    pub fresh: bool,

    #[arg(
        long = "degradation",
        help_heading = "GENERAL",
        help = "Starting degradation level (min 0 max 100); overrides the saved one"
    )]
    pub degradation: Option<f32>,

    #[arg(
        long = "exec",
        value_name = "CMD",
        help_heading = "GENERAL",
        help = "Submit a command right after boot (repeatable)"
    )]
    pub exec: Vec<String>,

    #[arg(
        long = "message",
        value_name = "TEXT",
        help_heading = "GENERAL",
        help = "Type this text into the terminal after boot"
    )]
    pub message: Option<String>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Diagnostics log (default: <data dir>/hollowterm.log)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "APPEARANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "no-effects",
        help_heading = "APPEARANCE",
        help = "Disable the shader, grid and noise layers"
    )]
    pub no_effects: bool,

    #[arg(
        long = "noglitch",
        help_heading = "APPEARANCE",
        help = "Disable text glitching"
    )]
    pub noglitch: bool,

    #[arg(
        long = "tick-secs",
        default_value_t = DEFAULT_TICK_INTERVAL.as_secs() as u32,
        help_heading = "TIMING",
        help = "Seconds between passive degradation steps (min 1 max 3600)"
    )]
    pub tick_secs: u32,

    #[arg(
        long = "type-ms",
        default_value_t = 18,
        help_heading = "TIMING",
        help = "Typed output delay per character in ms (min 0 max 500; 0 prints instantly)"
    )]
    pub type_ms: u16,

    #[arg(
        long = "no-audio",
        help_heading = "AUDIO",
        help = "Disable all sound"
    )]
    pub no_audio: bool,

    #[arg(
        long = "audio-dir",
        value_name = "DIR",
        help_heading = "AUDIO",
        help = "Root of the audio assets (default: ./assets/audio)"
    )]
    pub audio_dir: Option<PathBuf>,

    #[arg(
        long = "player",
        value_name = "CMD",
        help_heading = "AUDIO",
        help = "External player command, e.g. \"mpv --no-video\""
    )]
    pub player: Option<String>,

    #[arg(
        long = "list-subjects",
        help_heading = "HELP",
        help = "List the subject dossiers and exit"
    )]
    pub list_subjects: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn print_list_subjects() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mSUBJECT DOSSIERS:\x1b[0m");
        println!("\x1b[2mNOTE: Open one in the terminal with: dscr <ID>\x1b[0m");
    } else {
        println!("SUBJECT DOSSIERS:");
        println!("NOTE: Open one in the terminal with: dscr <ID>");
    }
    println!();
    println!("ID      NAME                      STATUS");
    for d in content::dossiers() {
        println!("{:<8}{:<26}{}", d.id, d.name, d.status.label());
    }
}

const HELP_DETAIL: &str = "\
USAGE:
  hollowterm [OPTIONS]

GENERAL:
  --seed <number>
      Seed every random source, for reproducible sessions.
      Example: hollowterm --seed 42

  --state-file <path>
      Keep the degradation level in this JSON file.
      Example: hollowterm --state-file ./state.json

  --fresh
      Start from zero, ignoring the saved level.
      Example: hollowterm --fresh

  --degradation <number>
      Start at this level (min 0 max 100).
      Example: hollowterm --degradation 85

  --exec <command>
      Submit a command after boot. May be given more than once.
      Example: hollowterm --exec subj --exec \"dscr 0x001\"

  --message <text>
      Type a line into the terminal after boot, as if someone else were there.
      Example: hollowterm --message \"ТЫ НЕ ОДИН\"

  --log-file <path>
      Write diagnostics here. Filter with RUST_LOG.
      Example: RUST_LOG=debug hollowterm --log-file ./hollow.log

APPEARANCE:
  -f, --fps <number>
      Target FPS (min 1 max 240).
      Example: hollowterm --fps 30

  --colormode <0|16|8|24>
      Force color mode; otherwise auto-detected from COLORTERM/TERM.
      Example: hollowterm --colormode 16

  --no-effects
      Plain background, no shader, grid or noise.
      Example: hollowterm --no-effects

  --noglitch
      Never corrupt text at render time.
      Example: hollowterm --noglitch

TIMING:
  --tick-secs <number>
      Seconds between passive +1 degradation steps (min 1 max 3600).
      Example: hollowterm --tick-secs 5

  --type-ms <number>
      Per-character typing delay (min 0 max 500).
      Example: hollowterm --type-ms 0

AUDIO:
  --no-audio
      Disable all sound.
      Example: hollowterm --no-audio

  --audio-dir <dir>
      Look for <dir>/<category>/<id>.{ogg,mp3,wav}.
      Example: hollowterm --audio-dir ./assets/audio

  --player <command>
      Use this player instead of paplay/aplay/afplay/ffplay.
      Example: hollowterm --player \"mpv --no-video\"

HELP:
  --list-subjects
      List the subject dossiers and exit.

  --check-bitcolor
      Print detected terminal color capability and exit.

  --help-detail
      Show this detailed help.

  -v, --version
      Print version and exit.

  -i, --info
      Print version info and exit.
";

pub fn print_help_detail() {
    let block = format!("{DEFAULT_PARAMS_USAGE}\n\n{HELP_DETAIL}");
    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
    println!();
    println!("LIMITS / VALID RANGES:");
    println!("  --fps <number>           min 1 max 240");
    println!("  --degradation <number>   min 0 max 100");
    println!("  --tick-secs <number>     min 1 max 3600");
    println!("  --type-ms <number>       min 0 max 500");
    println!("  --colormode <0|16|8|24>  allowed values only (8==256, 24==32)");
}
