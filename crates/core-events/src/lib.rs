//! Core event types and the signal channel used at gesture boundaries.
//!
//! Everything here is single threaded: listeners are `Rc` closures and the
//! channel is a shared handle over a `RefCell`. The editor view emits on the
//! channels from its pointer / drag handlers; command adapters subscribe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// -------------------------------------------------------------------------------------------------
// Event Channel
// -------------------------------------------------------------------------------------------------

/// Result type returned by listeners and by [`EventChannel::emit`].
pub type EventResult<T> = anyhow::Result<T>;

/// Identity of a subscription, returned by [`EventChannel::on`] and used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

type Listener = Rc<dyn Fn() -> EventResult<()>>;

#[derive(Default)]
struct ChannelInner {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

/// Publish/subscribe primitive over zero-argument listeners.
///
/// Cloning yields another handle to the same listener list. Listeners fire in
/// subscription order. Emission works on a copy of the list taken when `emit`
/// starts, so a listener may subscribe or unsubscribe (itself included) while
/// running without affecting the current round.
#[derive(Clone, Default)]
pub struct EventChannel {
    name: &'static str,
    inner: Rc<ChannelInner>,
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventChannel {
    /// Create a channel. `name` is only used for logging.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Rc::new(ChannelInner::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe a listener; it stays registered until [`EventChannel::off`].
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() -> EventResult<()> + 'static,
    {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        tracing::trace!(target: "events.channel", channel = self.name, listener = id.0, "listener_added");
        id
    }

    /// Remove a listener. Returns `false` when the id was not (or no longer) subscribed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.iter().position(|(lid, _)| *lid == id) {
            Some(idx) => {
                listeners.remove(idx);
                tracing::trace!(target: "events.channel", channel = self.name, listener = id.0, "listener_removed");
                true
            }
            None => false,
        }
    }

    /// Notify every listener in subscription order. The first listener error
    /// stops the round and is returned to the emitter.
    pub fn emit(&self) -> EventResult<()> {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        tracing::trace!(target: "events.channel", channel = self.name, listeners = snapshot.len(), "emit");
        for listener in snapshot {
            listener()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The two gesture boundary channels a view raises around a drag.
#[derive(Clone, Debug)]
pub struct GestureSignals {
    pub start: EventChannel,
    pub end: EventChannel,
}

impl Default for GestureSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureSignals {
    pub fn new() -> Self {
        Self {
            start: EventChannel::new("gesture_start"),
            end: EventChannel::new("gesture_end"),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Keyboard input
// -------------------------------------------------------------------------------------------------

/// Physical key identity, independent of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Space,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Up,
    Right,
    Down,
    F(u8),
}

impl KeyCode {
    /// Canonical lowercase name used in key-combo strings (`"z"`, `"delete"`, `"f5"`).
    pub fn canonical_name(&self) -> String {
        match self {
            KeyCode::Char(c) => c.to_lowercase().collect(),
            KeyCode::F(n) => format!("f{n}"),
            named => named
                .static_name()
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn static_name(&self) -> Option<&'static str> {
        Some(match self {
            KeyCode::Enter => "enter",
            KeyCode::Esc => "esc",
            KeyCode::Space => "space",
            KeyCode::Tab => "tab",
            KeyCode::Backspace => "backspace",
            KeyCode::Delete => "delete",
            KeyCode::Insert => "insert",
            KeyCode::Home => "home",
            KeyCode::End => "end",
            KeyCode::PageUp => "pageup",
            KeyCode::PageDown => "pagedown",
            KeyCode::Left => "left",
            KeyCode::Up => "up",
            KeyCode::Right => "right",
            KeyCode::Down => "down",
            KeyCode::Char(_) | KeyCode::F(_) => return None,
        })
    }

    /// Inverse of [`KeyCode::canonical_name`]; accepts any ASCII case.
    pub fn from_name(name: &str) -> Option<KeyCode> {
        let lower = name.to_ascii_lowercase();
        let code = match lower.as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Space,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "left" => KeyCode::Left,
            "up" => KeyCode::Up,
            "right" => KeyCode::Right,
            "down" => KeyCode::Down,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() || c.is_ascii_punctuation() => {
                        KeyCode::Char(c)
                    }
                    (Some('f'), Some(_)) => {
                        let n: u8 = other[1..].parse().ok()?;
                        if (1..=12).contains(&n) {
                            KeyCode::F(n)
                        } else {
                            return None;
                        }
                    }
                    _ => return None,
                }
            }
        };
        Some(code)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
        const META  = 0b0000_1000;
    }
}

/// A key-down event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

/// What currently holds keyboard focus in the host view.
///
/// Shortcuts only apply while the document body is focused; editable
/// elements must receive raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Body,
    /// Text inputs, textareas, content-editable regions.
    Editable,
    /// Any other focusable element (buttons, menu items).
    Element,
}
