//! Scripted input for headless runs.
//!
//! A script is a list of steps separated by commas or newlines:
//!
//! - `key:j`, `key:G`, `key:ctrl+d`, `key:pagedown`: one key press
//! - `type:/alice`: one key press per character
//! - `resize:120x30`
//! - `snapshot:name`: capture the screen under a name
//! - `assert:contains:text` and `assert:absent:text`: case-insensitive
//!   screen checks
//! - `assert:state:row>=3`: compare a viewer state field using `=`, `!=`,
//!   `<`, `<=`, `>` or `>=`
//!
//! Lines starting with `#` are comments.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use regex::Regex;

use super::HeadlessState;
use crate::cli::parse_screen_size;
use crate::error::{GridError, Result};

fn state_check_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z_]+)\s*(>=|<=|!=|=|>|<)\s*(.*)$").expect("valid regex")
    })
}

fn invalid(step: &str, reason: impl std::fmt::Display) -> GridError {
    GridError::config(format!("invalid headless step '{step}': {reason}"))
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(KeyEvent),
    Type(String),
    Resize(u16, u16),
    Snapshot(String),
    Assert(Assertion),
}

impl FromStr for Step {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| invalid(s, "expected <kind>:<value>"))?;

        match kind.trim() {
            "key" => parse_key(value).map(Step::Key).ok_or_else(|| invalid(s, "unknown key")),
            "type" => Ok(Step::Type(value.to_string())),
            "resize" => parse_screen_size(value.trim())
                .map(|(w, h)| Step::Resize(w, h))
                .map_err(|e| invalid(s, e)),
            "snapshot" => Ok(Step::Snapshot(value.trim().to_string())),
            "assert" => value.parse().map(Step::Assert).map_err(|e| match e {
                GridError::Config(reason) => invalid(s, reason),
                other => other,
            }),
            other => Err(invalid(s, format!("unknown step kind '{other}'"))),
        }
    }
}

/// Parses a whole script.
pub fn parse_script(input: &str) -> Result<Vec<Step>> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

/// Keys the grid viewer binds; anything else must be a single character.
fn parse_key(spec: &str) -> Option<KeyEvent> {
    let spec = spec.trim();
    let (modifiers, name) = match spec.split_once('+') {
        Some((m, rest)) if m.eq_ignore_ascii_case("ctrl") && !rest.is_empty() => {
            (KeyModifiers::CONTROL, rest)
        }
        _ => (KeyModifiers::NONE, spec),
    };

    let code = match name.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(KeyEvent::new(code, modifiers))
}

/// A check against the rendered screen or the viewer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// Screen text must (or must not) contain `text`, ignoring case.
    Screen { text: String, present: bool },
    State(StateCheck),
}

impl Assertion {
    pub fn holds(&self, screen: &str, state: &HeadlessState) -> bool {
        match self {
            Self::Screen { text, present } => {
                screen.to_lowercase().contains(&text.to_lowercase()) == *present
            }
            Self::State(check) => check.holds(state),
        }
    }
}

impl FromStr for Assertion {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| GridError::config("expected assert:<kind>:<value>"))?;
        match kind.trim() {
            "contains" => Ok(Self::Screen {
                text: rest.to_string(),
                present: true,
            }),
            "absent" => Ok(Self::Screen {
                text: rest.to_string(),
                present: false,
            }),
            "state" => rest.parse().map(Self::State),
            other => Err(GridError::config(format!("unknown assertion '{other}'"))),
        }
    }
}

/// Viewer state fields a script can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Row,
    Col,
    HOffset,
    VOffset,
    Matches,
    Depth,
    Title,
    Mode,
    Running,
    Yank,
    Notification,
}

impl StateField {
    fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Row | Self::Col | Self::HOffset | Self::VOffset | Self::Matches | Self::Depth
        )
    }

    /// Current value; `None` for cursor fields once every viewer is closed.
    pub fn read(self, state: &HeadlessState) -> Option<String> {
        let number = |n: Option<usize>| n.map(|n| n.to_string());
        match self {
            Self::Row => number(state.current_row),
            Self::Col => number(state.current_col),
            Self::HOffset => number(state.h_offset),
            Self::VOffset => number(state.v_offset),
            Self::Matches => Some(state.match_count.to_string()),
            Self::Depth => Some(state.depth.to_string()),
            Self::Title => state.title.clone(),
            Self::Mode => Some(state.mode.clone()),
            Self::Running => Some(state.running.to_string()),
            Self::Yank => state.last_yank.clone(),
            Self::Notification => state.notification.clone(),
        }
    }
}

impl FromStr for StateField {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "row" => Self::Row,
            "col" => Self::Col,
            "h_offset" => Self::HOffset,
            "v_offset" => Self::VOffset,
            "matches" => Self::Matches,
            "depth" => Self::Depth,
            "title" => Self::Title,
            "mode" => Self::Mode,
            "running" => Self::Running,
            "yank" => Self::Yank,
            "notification" => Self::Notification,
            other => return Err(GridError::config(format!("unknown state field '{other}'"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            _ => return None,
        })
    }

    fn is_ordering(self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

/// `<field><op><value>`; numeric fields compare as numbers, the rest only
/// support `=` and `!=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCheck {
    pub field: StateField,
    pub op: Comparison,
    pub expected: String,
}

impl StateCheck {
    /// A field with no value only satisfies `!=`.
    pub fn holds(&self, state: &HeadlessState) -> bool {
        let Some(actual) = self.field.read(state) else {
            return self.op == Comparison::Ne;
        };
        let ordering = if self.field.is_numeric() {
            match (actual.parse::<usize>(), self.expected.parse::<usize>()) {
                (Ok(a), Ok(e)) => a.cmp(&e),
                _ => return false,
            }
        } else {
            actual.as_str().cmp(self.expected.as_str())
        };
        self.op.accepts(ordering)
    }
}

impl FromStr for StateCheck {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = state_check_re()
            .captures(s.trim())
            .ok_or_else(|| GridError::config("expected <field><op><value>"))?;
        let field: StateField = caps[1].parse()?;
        let op = Comparison::parse(&caps[2])
            .ok_or_else(|| GridError::config(format!("unknown operator '{}'", &caps[2])))?;
        let expected = caps[3].trim().to_string();

        if field.is_numeric() && expected.parse::<usize>().is_err() {
            return Err(GridError::config(format!("'{}' expects a number", &caps[1])));
        }
        if !field.is_numeric() && op.is_ordering() {
            return Err(GridError::config(format!("'{}' only supports = and !=", &caps[1])));
        }
        Ok(Self { field, op, expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> HeadlessState {
        HeadlessState {
            title: Some("orders".to_string()),
            current_row: Some(12),
            current_col: Some(3),
            h_offset: Some(1),
            v_offset: Some(4),
            match_count: 2,
            last_yank: None,
            depth: 2,
            mode: "normal".to_string(),
            running: true,
            notification: None,
        }
    }

    fn check(step: &str) -> bool {
        match step.parse::<Step>().unwrap() {
            Step::Assert(assertion) => assertion.holds("", &state()),
            other => panic!("Expected an assertion, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_keys() {
        let keys: Vec<KeyEvent> = parse_script("key:ctrl+d, key:G, key:pagedown, key:$")
            .unwrap()
            .into_iter()
            .map(|step| match step {
                Step::Key(key) => key,
                other => panic!("Expected a key, got {other:?}"),
            })
            .collect();

        assert_eq!(keys[0], KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(keys[1], KeyEvent::new(KeyCode::Char('G'), KeyModifiers::NONE));
        assert_eq!(keys[2].code, KeyCode::PageDown);
        assert_eq!(keys[3].code, KeyCode::Char('$'));
    }

    #[test]
    fn test_unknown_key_name() {
        assert!("key:f13".parse::<Step>().is_err());
        assert!("key:alt+j".parse::<Step>().is_err());
    }

    #[test]
    fn test_resize_and_snapshot() {
        let steps = parse_script("resize:40x12\nsnapshot: after resize").unwrap();
        assert_eq!(
            steps,
            vec![Step::Resize(40, 12), Step::Snapshot("after resize".to_string())]
        );
        assert!("resize:40".parse::<Step>().is_err());
    }

    #[test]
    fn test_script_comments_and_type() {
        let script = "# open search\ntype:/ab-1\n\nkey:enter,key:n\n";
        let steps = parse_script(script).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], Step::Type("/ab-1".to_string()));
    }

    #[test]
    fn test_row_comparisons() {
        assert!(check("assert:state:row=12"));
        assert!(check("assert:state:row!=11"));
        assert!(check("assert:state:row>=12"));
        assert!(check("assert:state:row>9"));
        assert!(check("assert:state:row<13"));
        assert!(!check("assert:state:row<=11"));
        assert!(check("assert:state:v_offset = 4"));
    }

    #[test]
    fn test_text_fields() {
        assert!(check("assert:state:title=orders"));
        assert!(check("assert:state:mode!=search"));
        assert!(check("assert:state:running=true"));
        // unset fields only satisfy !=
        assert!(check("assert:state:yank!=anything"));
        assert!(!check("assert:state:yank=anything"));
    }

    #[test]
    fn test_invalid_state_checks() {
        assert!("assert:state:depth=two".parse::<Step>().is_err());
        assert!("assert:state:title>orders".parse::<Step>().is_err());
        assert!("assert:state:cursor=1".parse::<Step>().is_err());
        assert!("assert:state:row".parse::<Step>().is_err());
    }

    #[test]
    fn test_screen_assertions() {
        let present: Assertion = "contains:ALICE".parse().unwrap();
        let absent: Assertion = "absent:bob".parse().unwrap();
        assert!(present.holds("│ 1 │ Alice │", &state()));
        assert!(absent.holds("│ 1 │ Alice │", &state()));
        assert!(!absent.holds("│ 2 │ Bob │", &state()));
    }

    #[test]
    fn test_malformed_steps() {
        assert!("wait:100ms".parse::<Step>().is_err());
        assert!("jj".parse::<Step>().is_err());
        assert!("assert:matches:.*".parse::<Step>().is_err());
    }
}
