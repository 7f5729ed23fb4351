//! crates/study_buddy_core/src/commands.rs
//!
//! Parses spoken session commands such as
//! "start session biology review for 30 minutes and 15 seconds".
//! Anything that does not match falls back to the defaults.

use crate::timer::DEFAULT_MINUTES;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCommand {
    pub title: String,
    pub minutes: u32,
    pub seconds: u32,
    pub should_start: bool,
}

impl Default for SessionCommand {
    fn default() -> Self {
        Self {
            title: String::new(),
            minutes: DEFAULT_MINUTES,
            seconds: 0,
            should_start: false,
        }
    }
}

struct Patterns {
    title: Regex,
    minutes: Regex,
    seconds: Regex,
    combined: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        title: Regex::new(
            r"(?:start session|begin session)\s+(.+?)(?:\s+for\s+|\s+\d+\s+minutes?|\s+\d+\s+seconds?|$)",
        )
        .expect("title pattern is valid"),
        minutes: Regex::new(r"(\d+)\s+minutes?").expect("minutes pattern is valid"),
        seconds: Regex::new(r"(\d+)\s+seconds?").expect("seconds pattern is valid"),
        combined: Regex::new(r"for\s+(\d+)\s+minutes?\s+(?:and\s+)?(\d+)\s+seconds?")
            .expect("combined pattern is valid"),
    })
}

pub fn parse_command(utterance: &str) -> SessionCommand {
    let text = utterance.to_lowercase();
    let p = patterns();
    let mut command = SessionCommand::default();

    if text.contains("start session") || text.contains("begin session") {
        command.should_start = true;

        if let Some(title) = p.title.captures(&text).and_then(|c| c.get(1)) {
            command.title = capitalize_words(title.as_str().trim());
        }
        if let Some(minutes) = capture_number(&p.minutes, &text, 1) {
            command.minutes = minutes;
        }
        if let Some(seconds) = capture_number(&p.seconds, &text, 1) {
            command.seconds = seconds;
        }
        if let (Some(minutes), Some(seconds)) = (
            capture_number(&p.combined, &text, 1),
            capture_number(&p.combined, &text, 2),
        ) {
            command.minutes = minutes;
            command.seconds = seconds;
        }
    } else if text.contains("set timer") || text.contains("timer for") {
        if let Some(minutes) = capture_number(&p.minutes, &text, 1) {
            command.minutes = minutes;
        }
        if let Some(seconds) = capture_number(&p.seconds, &text, 1) {
            command.seconds = seconds;
        }
    }

    command
}

fn capture_number(pattern: &Regex, text: &str, group: usize) -> Option<u32> {
    pattern
        .captures(text)?
        .get(group)?
        .as_str()
        .parse()
        .ok()
}

/// Uppercases the first character of every word.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_title_and_combined_duration() {
        let cmd = parse_command("Start session organic chemistry for 30 minutes and 15 seconds");
        assert_eq!(
            cmd,
            SessionCommand {
                title: "Organic Chemistry".into(),
                minutes: 30,
                seconds: 15,
                should_start: true,
            }
        );
    }

    #[test]
    fn start_with_minutes_only() {
        let cmd = parse_command("begin session history 10 minutes");
        assert_eq!(cmd.title, "History");
        assert_eq!(cmd.minutes, 10);
        assert_eq!(cmd.seconds, 0);
        assert!(cmd.should_start);
    }

    #[test]
    fn start_without_title_keeps_defaults() {
        let cmd = parse_command("start session");
        assert!(cmd.should_start);
        assert_eq!(cmd.title, "");
        assert_eq!(cmd.minutes, DEFAULT_MINUTES);
    }

    #[test]
    fn set_timer_does_not_start() {
        let cmd = parse_command("set timer 5 minutes 20 seconds");
        assert_eq!(cmd.minutes, 5);
        assert_eq!(cmd.seconds, 20);
        assert!(!cmd.should_start);
        assert_eq!(cmd.title, "");
    }

    #[test]
    fn unrecognised_utterance_falls_back_to_defaults() {
        assert_eq!(parse_command("what's the weather like"), SessionCommand::default());
        assert_eq!(parse_command(""), SessionCommand::default());
    }

    #[test]
    fn oversized_numbers_fall_back() {
        let cmd = parse_command("set timer 99999999999 minutes");
        assert_eq!(cmd.minutes, DEFAULT_MINUTES);
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("linear algebra ii"), "Linear Algebra Ii");
    }
}
