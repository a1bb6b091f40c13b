// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Clear,
    Syst,
    Syslog,
    Subj,
    Dscr,
    Notes,
    Open,
    PlayAudio,
    StopAudio,
    StopAll,
    Deg,
    Reset,
    Exit,
}

/// Name, kind and how much running it degrades the system.
const COMMANDS: &[(&str, CommandKind, f32)] = &[
    ("help", CommandKind::Help, 0.0),
    ("clear", CommandKind::Clear, 0.0),
    ("syst", CommandKind::Syst, 1.0),
    ("syslog", CommandKind::Syslog, 1.0),
    ("subj", CommandKind::Subj, 2.0),
    ("dscr", CommandKind::Dscr, 2.0),
    ("notes", CommandKind::Notes, 1.5),
    ("open", CommandKind::Open, 0.0),
    ("playaudio", CommandKind::PlayAudio, 0.0),
    ("stopaudio", CommandKind::StopAudio, 0.0),
    ("stopall", CommandKind::StopAll, 0.0),
    ("deg", CommandKind::Deg, 0.0),
    ("reset", CommandKind::Reset, 0.0),
    ("exit", CommandKind::Exit, 0.0),
];

impl CommandKind {
    pub fn lookup(name: &str) -> Option<CommandKind> {
        COMMANDS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, k, _)| *k)
    }

    pub fn name(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, k, _)| *k == self)
            .map(|(n, _, _)| *n)
            .unwrap_or("?")
    }

    pub fn weight(self) -> f32 {
        COMMANDS
            .iter()
            .find(|(_, k, _)| *k == self)
            .map(|(_, _, w)| *w)
            .unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parsed {
    /// Trimmed input in its original case, for error messages.
    pub raw: String,
    pub name: String,
    pub args: Vec<String>,
    pub kind: Option<CommandKind>,
}

impl Parsed {
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }
}

pub fn parse(input: &str) -> Parsed {
    let raw = input.trim().to_string();
    let lowered = raw.to_lowercase();
    let mut parts = lowered.split_whitespace().map(str::to_string);
    let name = parts.next().unwrap_or_default();
    let args: Vec<String> = parts.collect();
    let kind = CommandKind::lookup(&name);
    Parsed {
        raw,
        name,
        args,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_and_splits() {
        let p = parse("  DSCR   0x001  ");
        assert_eq!(p.raw, "DSCR   0x001");
        assert_eq!(p.name, "dscr");
        assert_eq!(p.args, vec!["0x001"]);
        assert_eq!(p.kind, Some(CommandKind::Dscr));
    }

    #[test]
    fn unknown_name_has_no_kind() {
        let p = parse("Frobnicate now");
        assert_eq!(p.kind, None);
        assert_eq!(p.raw, "Frobnicate now");
    }

    #[test]
    fn every_kind_round_trips_through_the_table() {
        for (name, kind, _) in COMMANDS {
            assert_eq!(CommandKind::lookup(name), Some(*kind));
            assert_eq!(kind.name(), *name);
        }
        assert_eq!(CommandKind::Notes.weight(), 1.5);
        assert_eq!(CommandKind::Subj.weight(), 2.0);
        assert_eq!(CommandKind::Open.weight(), 0.0);
    }
}
