// Copyright (c) 2026 rezky_nightky

//! Best-effort sound. Nothing in here is allowed to fail a command: every
//! error is logged and swallowed by `play`.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::AudioError;

const EXTENSIONS: &[&str] = &["ogg", "mp3", "wav"];
pub const EFFECTS: &str = "effects";
pub const DOSSIERS: &str = "dossiers";

pub trait Playback {
    fn stop(&mut self);
    fn is_finished(&mut self) -> bool;
}

pub trait AudioBackend {
    fn name(&self) -> &str;
    fn spawn(&mut self, path: &Path) -> Result<Box<dyn Playback>, AudioError>;
}

/// Used for `--no-audio` and when no player binary exists.
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn spawn(&mut self, _path: &Path) -> Result<Box<dyn Playback>, AudioError> {
        Err(AudioError::Disabled)
    }
}

/// Plays files through an external player process.
#[derive(Debug)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
}

const PLAYERS: &[(&str, &[&str])] = &[
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

impl ProcessBackend {
    /// `override_cmd` is split on whitespace: program then leading args.
    pub fn detect(override_cmd: Option<&str>) -> Result<Self, AudioError> {
        if let Some(cmd) = override_cmd {
            let mut parts = cmd.split_whitespace().map(str::to_string);
            let program = parts.next().ok_or(AudioError::NoPlayer)?;
            return Ok(Self {
                program,
                args: parts.collect(),
            });
        }
        PLAYERS
            .iter()
            .find(|(p, _)| command_exists(p))
            .map(|(p, args)| Self {
                program: (*p).to_string(),
                args: args.iter().map(|a| (*a).to_string()).collect(),
            })
            .ok_or(AudioError::NoPlayer)
    }
}

struct ChildPlayback(Child);

impl Playback for ChildPlayback {
    fn stop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }

    fn is_finished(&mut self) -> bool {
        !matches!(self.0.try_wait(), Ok(None))
    }
}

impl AudioBackend for ProcessBackend {
    fn name(&self) -> &str {
        &self.program
    }

    fn spawn(&mut self, path: &Path) -> Result<Box<dyn Playback>, AudioError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AudioError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Box::new(ChildPlayback(child)))
    }
}

fn command_exists(command: &str) -> bool {
    if command.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(command).is_file();
    }
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| {
        dir.join(command).is_file()
            || (cfg!(target_os = "windows") && dir.join(format!("{command}.exe")).is_file())
    })
}

/// Resolves cue files under an asset root and keeps track of what is
/// currently playing.
pub struct AudioPlayer {
    root: PathBuf,
    backend: Box<dyn AudioBackend>,
    /// Dossier id → file stem, filled by `dscr`.
    recordings: HashMap<String, &'static str>,
    playing: HashMap<String, Box<dyn Playback>>,
    cues: Vec<Box<dyn Playback>>,
}

impl AudioPlayer {
    pub fn new(root: impl Into<PathBuf>, backend: Box<dyn AudioBackend>) -> Self {
        let root = root.into();
        tracing::debug!(root = %root.display(), backend = backend.name(), "audio ready");
        Self {
            root,
            backend,
            recordings: HashMap::new(),
            playing: HashMap::new(),
            cues: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), Box::new(NullBackend))
    }

    /// `<root>/<category>/<id>.<ext>` first, then `<root>/<id>.<ext>`.
    pub fn candidates(&self, category: &str, id: &str) -> Vec<PathBuf> {
        let nested = self.root.join(category);
        EXTENSIONS
            .iter()
            .map(|ext| nested.join(format!("{id}.{ext}")))
            .chain(
                EXTENSIONS
                    .iter()
                    .map(|ext| self.root.join(format!("{id}.{ext}"))),
            )
            .collect()
    }

    pub fn resolve(&self, category: &str, id: &str) -> Result<PathBuf, AudioError> {
        self.candidates(category, id)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| AudioError::NotFound {
                category: category.to_string(),
                id: id.to_string(),
            })
    }

    pub fn try_play(&mut self, category: &str, id: &str) -> Result<Box<dyn Playback>, AudioError> {
        let path = self.resolve(category, id)?;
        self.backend.spawn(&path)
    }

    /// Fire-and-forget cue.
    pub fn play(&mut self, category: &str, id: &str) {
        self.reap();
        match self.try_play(category, id) {
            Ok(p) => self.cues.push(p),
            Err(AudioError::Disabled) => {}
            Err(err) => tracing::debug!(category, id, %err, "cue not played"),
        }
    }

    pub fn register(&mut self, id: &str, file: &'static str) {
        self.recordings.insert(id.to_uppercase(), file);
    }

    #[cfg(test)]
    pub fn is_registered(&self, id: &str) -> bool {
        self.recordings.contains_key(&id.to_uppercase())
    }

    /// Restarts the recording registered for a dossier. Returns false when
    /// nothing was registered; playback failures are only logged.
    pub fn play_recording(&mut self, id: &str) -> bool {
        let key = id.to_uppercase();
        let Some(file) = self.recordings.get(&key).copied() else {
            return false;
        };
        self.stop(&key);
        match self.try_play(DOSSIERS, file) {
            Ok(p) => {
                self.playing.insert(key, p);
            }
            Err(AudioError::Disabled) => {}
            Err(err) => tracing::warn!(id = %key, %err, "recording not played"),
        }
        true
    }

    pub fn stop(&mut self, id: &str) {
        if let Some(mut p) = self.playing.remove(&id.to_uppercase()) {
            p.stop();
        }
    }

    pub fn stop_all(&mut self) {
        for (_, mut p) in self.playing.drain() {
            p.stop();
        }
        for mut p in self.cues.drain(..) {
            p.stop();
        }
    }

    #[cfg(test)]
    fn playing_count(&mut self) -> usize {
        self.reap();
        self.playing.len() + self.cues.len()
    }

    fn reap(&mut self) {
        self.cues.retain_mut(|p| !p.is_finished());
        self.playing.retain(|_, p| !p.is_finished());
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        spawned: Vec<PathBuf>,
        stopped: usize,
    }

    struct Recording(Rc<RefCell<Log>>);

    struct Fake(Rc<RefCell<Log>>);

    impl Playback for Fake {
        fn stop(&mut self) {
            self.0.borrow_mut().stopped += 1;
        }
        fn is_finished(&mut self) -> bool {
            false
        }
    }

    impl AudioBackend for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        fn spawn(&mut self, path: &Path) -> Result<Box<dyn Playback>, AudioError> {
            self.0.borrow_mut().spawned.push(path.to_path_buf());
            Ok(Box::new(Fake(self.0.clone())))
        }
    }

    fn player(root: &Path) -> (AudioPlayer, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (
            AudioPlayer::new(root, Box::new(Recording(log.clone()))),
            log,
        )
    }

    #[test]
    fn candidates_prefer_category_dir_then_root() {
        let p = AudioPlayer::disabled();
        let c = p.candidates("effects", "boot");
        assert_eq!(c.len(), 6);
        assert_eq!(c[0], Path::new("effects").join("boot.ogg"));
        assert_eq!(c[2], Path::new("effects").join("boot.wav"));
        assert_eq!(c[3], PathBuf::from("boot.ogg"));
    }

    #[test]
    fn resolve_falls_back_to_root_and_reports_misses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alarm.mp3"), b"").unwrap();
        let (p, _) = player(dir.path());
        assert_eq!(
            p.resolve("effects", "alarm").unwrap(),
            dir.path().join("alarm.mp3")
        );
        assert!(matches!(
            p.resolve("effects", "boot"),
            Err(AudioError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_cue_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut p, log) = player(dir.path());
        p.play("effects", "nothing");
        assert!(log.borrow().spawned.is_empty());
        assert_eq!(p.playing_count(), 0);
    }

    #[test]
    fn recordings_need_registration_and_restart_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dossiers")).unwrap();
        fs::write(dir.path().join("dossiers").join("tape.ogg"), b"").unwrap();
        let (mut p, log) = player(dir.path());

        assert!(!p.play_recording("0x001"));
        p.register("0x001", "tape");
        assert!(p.is_registered("0X001"));
        assert!(p.play_recording("0x001"));
        assert!(p.play_recording("0x001"));
        assert_eq!(log.borrow().spawned.len(), 2);
        assert_eq!(log.borrow().stopped, 1);

        p.stop("0x001");
        p.stop("0x001");
        p.stop_all();
        assert_eq!(log.borrow().stopped, 2);
        assert_eq!(p.playing_count(), 0);
    }

    #[test]
    fn player_override_is_split_into_program_and_args() {
        let b = ProcessBackend::detect(Some("mpv --really-quiet")).unwrap();
        assert_eq!(b.name(), "mpv");
        assert_eq!(b.args, vec!["--really-quiet"]);
        assert!(matches!(
            ProcessBackend::detect(Some("   ")),
            Err(AudioError::NoPlayer)
        ));
    }
}
