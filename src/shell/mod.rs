//! Line-oriented console shell for the widget.
//!
//! The shell stands in for the widget's buttons and pointer.  Each stdin
//! line is parsed by [`parse_line`] into zero or more [`Event`]s; a
//! dedicated thread ([`ShellListener`]) forwards them to the runtime.
//!
//! | Line                          | Events                                   |
//! |-------------------------------|------------------------------------------|
//! | `record` `stop` `play` `save` | the matching button                      |
//! | `load <path>...`              | [`Event::Load`]                          |
//! | `trim <start> <end>`          | [`Event::SetTrim`] (`-` keeps a bound)   |
//! | `zoom in` / `zoom out`        | [`Event::ZoomIn`] / [`Event::ZoomOut`]   |
//! | `resize <w> <h>`              | [`Event::Resize`]                        |
//! | `drag <subject> <from> <to>`  | start, move and drop in one go           |
//! | `quit`                        | [`Event::Suspend`]                       |
//!
//! Drag subjects are `start`, `end`, `ticker` and `pan`; positions are
//! pixels in canvas space.
//!
//! # Usage
//!
//! ```
//! use auo::shell::parse_line;
//! use auo::widget::Event;
//!
//! let events = parse_line("zoom in").unwrap();
//! assert!(matches!(events.as_slice(), [Event::ZoomIn]));
//! ```

pub mod listener;

pub use listener::ShellListener;

use std::path::PathBuf;

use thiserror::Error;

use crate::interact::DragSubject;
use crate::widget::{Event, Notice};

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// A shell line that could not be turned into events.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    #[error("`{command}` expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },

    #[error("`{0}` is not a number")]
    NotANumber(String),

    #[error("unknown drag subject `{0}` (start, end, ticker, pan)")]
    UnknownSubject(String),
}

/// Help text printed for `help`.
pub const HELP: &str = "\
commands: record | stop | play | save | load <path>... | trim <start|-> <end|->
          zoom in|out | resize <w> <h> | drag <start|end|ticker|pan> <from> <to>
          help | quit";

// ---------------------------------------------------------------------------
// parse_line
// ---------------------------------------------------------------------------

/// Parse one shell line.
///
/// Blank lines and `help` yield no events; `help` is handled by the
/// listener, which prints [`HELP`].
///
/// # Examples
///
/// ```
/// use auo::shell::parse_line;
/// use auo::widget::Event;
///
/// let events = parse_line("trim 0.5 -").unwrap();
/// assert!(matches!(
///     events.as_slice(),
///     [Event::SetTrim { start: Some(s), end: None }] if *s == 0.5
/// ));
/// assert!(parse_line("rewind").is_err());
/// ```
pub fn parse_line(line: &str) -> Result<Vec<Event>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Vec::new());
    };
    let args: Vec<&str> = words.collect();

    let events = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("record", []) => vec![Event::Record],
        ("stop", []) => vec![Event::Stop],
        ("play", []) => vec![Event::Play],
        ("save", []) => vec![Event::Save],
        ("quit" | "exit", []) => vec![Event::Suspend],
        ("help", _) => Vec::new(),

        ("load", paths) if !paths.is_empty() => {
            vec![Event::Load(paths.iter().map(PathBuf::from).collect())]
        }
        ("load", _) => return Err(usage("load", "one or more paths")),

        ("trim", [start, end]) => vec![Event::SetTrim {
            start: optional_number(start)?,
            end: optional_number(end)?,
        }],
        ("trim", _) => return Err(usage("trim", "<start> <end> in seconds")),

        ("zoom", ["in"]) => vec![Event::ZoomIn],
        ("zoom", ["out"]) => vec![Event::ZoomOut],
        ("zoom", _) => return Err(usage("zoom", "`in` or `out`")),

        ("resize", [width, height]) => vec![Event::Resize {
            width: number(width)?,
            height: number(height)?,
        }],
        ("resize", _) => return Err(usage("resize", "<width> <height> in pixels")),

        ("drag", [subject, from, to]) => vec![
            Event::DragStart {
                subject: parse_subject(subject)?,
                x: number(from)?,
            },
            Event::DragMove { x: number(to)? },
            Event::Drop,
        ],
        ("drag", _) => return Err(usage("drag", "<subject> <from> <to>")),

        ("record" | "stop" | "play" | "save" | "quit" | "exit", _) => {
            return Err(usage("this command", "no arguments"))
        }
        (other, _) => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(events)
}

/// Parse a drag subject name.
pub fn parse_subject(name: &str) -> Result<DragSubject, ParseError> {
    match name.to_ascii_lowercase().as_str() {
        "start" => Ok(DragSubject::StartTrim),
        "end" => Ok(DragSubject::EndTrim),
        "ticker" => Ok(DragSubject::Ticker),
        "pan" => Ok(DragSubject::Pan),
        _ => Err(ParseError::UnknownSubject(name.to_string())),
    }
}

fn usage(command: &'static str, expected: &'static str) -> ParseError {
    ParseError::Usage { command, expected }
}

fn number(word: &str) -> Result<f64, ParseError> {
    word.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::NotANumber(word.to_string()))
}

fn optional_number(word: &str) -> Result<Option<f64>, ParseError> {
    if word == "-" {
        Ok(None)
    } else {
        number(word).map(Some)
    }
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

/// One status line for a [`Notice`].
pub fn describe(notice: &Notice) -> String {
    match notice {
        Notice::Mode(mode) => format!("[{}]", mode.label()),
        Notice::Controls(c) => {
            let mut enabled = Vec::new();
            for (on, name) in [
                (c.record, "record"),
                (c.play, "play"),
                (c.stop, "stop"),
                (c.save, "save"),
                (c.load, "load"),
            ] {
                if on {
                    enabled.push(name);
                }
            }
            if enabled.is_empty() {
                "buttons: (none)".to_string()
            } else {
                format!("buttons: {}", enabled.join(" "))
            }
        }
        Notice::ClipReady { duration_secs } => format!("clip ready: {duration_secs:.2}s"),
        Notice::Saved(saved) => format!("saved: {saved}"),
        Notice::Error(message) => format!("error: {message}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SavedClip;
    use crate::pipeline::{Controls, Mode};

    // ---- buttons ----

    #[test]
    fn buttons_map_to_single_events() {
        assert!(matches!(parse_line("record").unwrap().as_slice(), [Event::Record]));
        assert!(matches!(parse_line("  STOP ").unwrap().as_slice(), [Event::Stop]));
        assert!(matches!(parse_line("play").unwrap().as_slice(), [Event::Play]));
        assert!(matches!(parse_line("save").unwrap().as_slice(), [Event::Save]));
        assert!(matches!(parse_line("quit").unwrap().as_slice(), [Event::Suspend]));
    }

    #[test]
    fn blank_and_help_lines_yield_nothing() {
        assert!(parse_line("").unwrap().is_empty());
        assert!(parse_line("   ").unwrap().is_empty());
        assert!(parse_line("help").unwrap().is_empty());
    }

    #[test]
    fn buttons_reject_arguments() {
        assert!(matches!(parse_line("play now"), Err(ParseError::Usage { .. })));
    }

    // ---- editor ----

    #[test]
    fn load_collects_every_path() {
        let events = parse_line("load a.wav b.wav").unwrap();
        let [Event::Load(paths)] = events.as_slice() else {
            panic!("expected one load event");
        };
        assert_eq!(paths, &[PathBuf::from("a.wav"), PathBuf::from("b.wav")]);
        assert!(parse_line("load").is_err());
    }

    #[test]
    fn trim_accepts_dash_for_unchanged_bound() {
        let events = parse_line("trim - 1.25").unwrap();
        assert!(matches!(
            events.as_slice(),
            [Event::SetTrim { start: None, end: Some(e) }] if *e == 1.25
        ));
        assert_eq!(
            parse_line("trim x 1").unwrap_err(),
            ParseError::NotANumber("x".into())
        );
        assert_eq!(
            parse_line("trim nan 1").unwrap_err(),
            ParseError::NotANumber("nan".into())
        );
    }

    #[test]
    fn drag_expands_to_start_move_drop() {
        let events = parse_line("drag end 400 350").unwrap();
        assert!(matches!(
            events.as_slice(),
            [
                Event::DragStart { subject: DragSubject::EndTrim, x: a },
                Event::DragMove { x: b },
                Event::Drop,
            ] if *a == 400.0 && *b == 350.0
        ));
        assert_eq!(
            parse_line("drag handle 1 2").unwrap_err(),
            ParseError::UnknownSubject("handle".into())
        );
    }

    #[test]
    fn zoom_and_resize() {
        assert!(matches!(parse_line("zoom out").unwrap().as_slice(), [Event::ZoomOut]));
        assert!(parse_line("zoom sideways").is_err());
        assert!(matches!(
            parse_line("resize 640 120").unwrap().as_slice(),
            [Event::Resize { width, height }] if *width == 640.0 && *height == 120.0
        ));
    }

    #[test]
    fn unknown_command_is_named() {
        assert_eq!(
            parse_line("rewind").unwrap_err(),
            ParseError::UnknownCommand("rewind".into())
        );
    }

    // ---- describe ----

    #[test]
    fn describe_lists_enabled_buttons() {
        let controls = Controls::for_mode(Mode::Idle, true, true, false);
        assert_eq!(
            describe(&Notice::Controls(controls)),
            "buttons: record play save load"
        );
        assert_eq!(
            describe(&Notice::Controls(Controls::default())),
            "buttons: (none)"
        );
    }

    #[test]
    fn describe_other_notices() {
        assert_eq!(describe(&Notice::Mode(Mode::FinalizingRecording)), "[Finalizing]");
        assert_eq!(
            describe(&Notice::ClipReady { duration_secs: 1.5 }),
            "clip ready: 1.50s"
        );
        assert_eq!(
            describe(&Notice::Saved(SavedClip::Uploaded("https://x/y".into()))),
            format!("saved: {}", SavedClip::Uploaded("https://x/y".into()))
        );
        assert_eq!(describe(&Notice::Error("boom".into())), "error: boom");
    }
}
