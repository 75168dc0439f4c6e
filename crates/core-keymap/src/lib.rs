//! core-keymap: key-combo normalization and the keyboard binding table.
//!
//! A combo is written `ctrl+shift+alt+<key>`. Modifiers always render in
//! that fixed order and `meta` folds into `ctrl`, so a key-down event and a
//! binding string compare equal exactly when their canonical strings do.
//!
//! The binding table maps a combo to every command bound to it, in
//! registration order. Several commands sharing a combo all fire; the table
//! does not pick a winner.

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{trace, warn};

// -------------------------------------------------------------------------------------------------
// KeyCombo
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: KeyCode,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComboParseError {
    #[error("empty key combo")]
    Empty,
    #[error("key combo `{0}` has no key after its modifiers")]
    MissingKey(String),
    #[error("unknown key name `{name}` in combo `{combo}`")]
    UnknownKey { combo: String, name: String },
    #[error("modifier `{modifier}` repeated in combo `{combo}`")]
    DuplicateModifier { combo: String, modifier: String },
}

impl KeyCombo {
    pub fn new(key: KeyCode) -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            key,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Normalize a key-down event: ctrl (or meta), shift, alt, then the key name.
    pub fn from_event(event: &KeyEvent) -> Self {
        let m = event.mods;
        Self {
            ctrl: m.intersects(KeyModifiers::CTRL | KeyModifiers::META),
            shift: m.contains(KeyModifiers::SHIFT),
            alt: m.contains(KeyModifiers::ALT),
            key: normalize_key(event.code),
        }
    }

    /// Synthesize the key-down event this combo matches (meta is never set).
    pub fn to_event(&self) -> KeyEvent {
        let mut mods = KeyModifiers::empty();
        mods.set(KeyModifiers::CTRL, self.ctrl);
        mods.set(KeyModifiers::SHIFT, self.shift);
        mods.set(KeyModifiers::ALT, self.alt);
        KeyEvent::new(self.key, mods)
    }
}

fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(' ') => KeyCode::Space,
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        f.write_str(&self.key.canonical_name())
    }
}

impl FromStr for KeyCombo {
    type Err = ComboParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ComboParseError::Empty);
        }
        let mut parts: Vec<&str> = trimmed.split('+').map(str::trim).collect();
        let key_part = parts.pop().unwrap_or_default();
        if key_part.is_empty() {
            return Err(ComboParseError::MissingKey(trimmed.to_string()));
        }
        let key = KeyCode::from_name(key_part).ok_or_else(|| ComboParseError::UnknownKey {
            combo: trimmed.to_string(),
            name: key_part.to_string(),
        })?;
        let mut combo = KeyCombo::new(normalize_key(key));
        for part in parts {
            let lower = part.to_ascii_lowercase();
            let slot = match lower.as_str() {
                "ctrl" | "control" | "meta" | "cmd" => &mut combo.ctrl,
                "shift" => &mut combo.shift,
                "alt" | "option" => &mut combo.alt,
                // A non-modifier before the last `+` is a key in the wrong position.
                _ => {
                    return Err(ComboParseError::UnknownKey {
                        combo: trimmed.to_string(),
                        name: part.to_string(),
                    });
                }
            };
            if *slot {
                return Err(ComboParseError::DuplicateModifier {
                    combo: trimmed.to_string(),
                    modifier: lower,
                });
            }
            *slot = true;
        }
        Ok(combo)
    }
}

// -------------------------------------------------------------------------------------------------
// Binding table
// -------------------------------------------------------------------------------------------------
pub type BoundCommands = SmallVec<[String; 2]>;

/// Derived map from combo to the command names bound to it.
#[derive(Debug, Default, Clone)]
pub struct BindingTable {
    by_combo: HashMap<KeyCombo, BoundCommands>,
}

impl BindingTable {
    /// Build from `(command name, combo strings)` pairs given in registration
    /// order. Unparseable combos are skipped; they could never match a key event.
    pub fn build<'a, I, S>(registrations: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [S])>,
        S: AsRef<str> + 'a,
    {
        let mut by_combo: HashMap<KeyCombo, BoundCommands> = HashMap::new();
        for (name, combos) in registrations {
            for raw in combos {
                let raw = raw.as_ref();
                match raw.parse::<KeyCombo>() {
                    Ok(combo) => {
                        let bound = by_combo.entry(combo).or_default();
                        if !bound.is_empty() {
                            trace!(target: "keymap", combo = %combo, command = name, shared_with = ?bound, "combo_shared");
                        }
                        if !bound.iter().any(|n| n == name) {
                            bound.push(name.to_string());
                        }
                    }
                    Err(err) => {
                        warn!(target: "keymap", command = name, combo = raw, %err, "binding_skipped");
                    }
                }
            }
        }
        trace!(target: "keymap", combos = by_combo.len(), "binding_table_built");
        Self { by_combo }
    }

    /// Commands bound to `combo`, in registration order.
    pub fn lookup(&self, combo: &KeyCombo) -> &[String] {
        self.by_combo
            .get(combo)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_combo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_combo.is_empty()
    }

    /// All bindings as `(combo string, commands)`, sorted by combo string.
    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = self
            .by_combo
            .iter()
            .map(|(combo, names)| (combo.to_string(), names.to_vec()))
            .collect();
        out.sort();
        out
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> KeyCombo {
        s.parse().unwrap()
    }

    #[test]
    fn canonical_order_is_ctrl_shift_alt() {
        assert_eq!(parse("shift+ctrl+z").to_string(), "ctrl+shift+z");
        assert_eq!(parse("Alt+Shift+Ctrl+Up").to_string(), "ctrl+shift+alt+up");
        assert_eq!(parse("cmd+y"), parse("ctrl+y"));
    }

    #[test]
    fn event_normalization_folds_meta_into_ctrl() {
        let ev = KeyEvent::new(KeyCode::Char('Z'), KeyModifiers::META | KeyModifiers::SHIFT);
        assert_eq!(KeyCombo::from_event(&ev).to_string(), "ctrl+shift+z");
        let del = KeyEvent::plain(KeyCode::Delete);
        assert_eq!(KeyCombo::from_event(&del), parse("delete"));
    }

    #[test]
    fn to_event_matches_back() {
        let combo = parse("ctrl+shift+z");
        assert_eq!(KeyCombo::from_event(&combo.to_event()), combo);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<KeyCombo>(), Err(ComboParseError::Empty));
        assert_eq!(
            "ctrl+".parse::<KeyCombo>(),
            Err(ComboParseError::MissingKey("ctrl+".into()))
        );
        assert!(matches!(
            "ctrl+hyper".parse::<KeyCombo>(),
            Err(ComboParseError::UnknownKey { .. })
        ));
        assert!(matches!(
            "a+b".parse::<KeyCombo>(),
            Err(ComboParseError::UnknownKey { .. })
        ));
        assert!(matches!(
            "ctrl+meta+z".parse::<KeyCombo>(),
            Err(ComboParseError::DuplicateModifier { .. })
        ));
    }

    #[test]
    fn table_keeps_registration_order_for_shared_combo() {
        let undo = vec!["ctrl+z".to_string()];
        let other = vec!["ctrl+z".to_string(), "f2".to_string()];
        let table = BindingTable::build([("undo", undo.as_slice()), ("audit", other.as_slice())]);
        assert_eq!(table.lookup(&parse("ctrl+z")), ["undo", "audit"]);
        assert_eq!(table.lookup(&parse("f2")), ["audit"]);
        assert!(table.lookup(&parse("ctrl+y")).is_empty());
    }

    #[test]
    fn table_skips_invalid_and_dedupes_per_command() {
        let combos = vec![
            "delete".to_string(),
            "Delete".to_string(),
            "ctrl+nope".to_string(),
        ];
        let table = BindingTable::build([("delete", combos.as_slice())]);
        assert_eq!(
            table.entries(),
            vec![("delete".to_string(), vec!["delete".to_string()])]
        );
    }
}
