//! Translation from crossterm key events to `KeyboardEvent.code` names.
//!
//! Hotkey bindings name physical keys the way browsers do. A terminal only
//! reports the character produced, so letters map back to their `Key*` code
//! regardless of shift state.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn code_name(key: &KeyEvent) -> Option<String> {
    // Chords are reserved for the player's own shortcuts
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
        KeyCode::Char(c) if c.is_ascii_digit() => format!("Digit{c}"),
        KeyCode::Char(c) => punctuation(c)?.to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };
    Some(name)
}

fn punctuation(c: char) -> Option<&'static str> {
    let name = match c {
        ',' | '<' => "Comma",
        '.' | '>' => "Period",
        '/' | '?' => "Slash",
        ';' | ':' => "Semicolon",
        '\'' | '"' => "Quote",
        '[' | '{' => "BracketLeft",
        ']' | '}' => "BracketRight",
        '-' | '_' => "Minus",
        '=' | '+' => "Equal",
        '`' | '~' => "Backquote",
        '\\' | '|' => "Backslash",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_letters_and_space() {
        assert_eq!(code_name(&key(KeyCode::Char(' '))).as_deref(), Some("Space"));
        assert_eq!(code_name(&key(KeyCode::Char('r'))).as_deref(), Some("KeyR"));
        assert_eq!(code_name(&key(KeyCode::Char('R'))).as_deref(), Some("KeyR"));
        assert_eq!(code_name(&key(KeyCode::Char('7'))).as_deref(), Some("Digit7"));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(code_name(&key(KeyCode::Left)).as_deref(), Some("ArrowLeft"));
        assert_eq!(code_name(&key(KeyCode::Char('['))).as_deref(), Some("BracketLeft"));
        assert_eq!(code_name(&key(KeyCode::Esc)), None);
    }

    #[test]
    fn test_control_chords_are_not_mapped() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(code_name(&ctrl_c), None);
    }
}
