//! Key-down routing.
//!
//! A key event becomes a canonical combo (`ctrl` for ctrl or meta, then
//! `shift`, `alt`, key name). Every command bound to that combo runs, in
//! registration order. Nothing runs unless keyboard listening is active
//! (between `init` and teardown) and the document body holds focus.

use crate::{CommandError, Commander};
use core_events::{FocusTarget, KeyEvent};
use core_keymap::KeyCombo;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `init` has not run yet, or teardown already happened.
    NotListening,
    /// An editable or other element holds focus.
    FocusElsewhere(FocusTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored(IgnoreReason),
    /// Listening and focused, but no command is bound to the combo.
    Unbound(KeyCombo),
    /// These commands ran; the host should prevent the default action and
    /// stop propagation.
    Handled {
        combo: KeyCombo,
        commands: Vec<String>,
    },
}

impl KeyOutcome {
    /// Whether the host must suppress the event's default action and propagation.
    pub fn prevents_default(&self) -> bool {
        matches!(self, KeyOutcome::Handled { .. })
    }
}

impl<A: Default + 'static> Commander<A> {
    /// Translate one key-down into zero or more command runs.
    ///
    /// A failing command stops the remaining matches and returns its error.
    pub fn handle_key(
        &self,
        event: &KeyEvent,
        focus: FocusTarget,
    ) -> Result<KeyOutcome, CommandError> {
        if !self.inner.keyboard_attached.get() {
            trace!(target: "commands.keyboard", key = %event, "key_ignored_not_listening");
            return Ok(KeyOutcome::Ignored(IgnoreReason::NotListening));
        }
        if focus != FocusTarget::Body {
            trace!(target: "commands.keyboard", key = %event, ?focus, "key_ignored_focus");
            return Ok(KeyOutcome::Ignored(IgnoreReason::FocusElsewhere(focus)));
        }
        let combo = KeyCombo::from_event(event);
        let commands = self.bound_to(&combo);
        if commands.is_empty() {
            trace!(target: "commands.keyboard", combo = %combo, "key_unbound");
            return Ok(KeyOutcome::Unbound(combo));
        }
        for name in &commands {
            debug!(target: "commands.keyboard", combo = %combo, command = %name, "shortcut");
            self.invoke(name)?;
        }
        Ok(KeyOutcome::Handled { combo, commands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandDescriptor, Execution};
    use core_events::{KeyCode, KeyModifiers};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn logging(commander: &Commander<()>, name: &'static str, combo: &str, log: &Rc<RefCell<Vec<&'static str>>>) {
        let log = log.clone();
        commander.register(
            CommandDescriptor::untracked(name, move |_| {
                log.borrow_mut().push(name);
                Ok(Execution::none())
            })
            .keyboard([combo]),
        );
    }

    #[test]
    fn not_listening_before_init() {
        let commander = Commander::<()>::default();
        let ev = KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CTRL);
        let outcome = commander.handle_key(&ev, FocusTarget::Body).unwrap();
        assert_eq!(outcome, KeyOutcome::Ignored(IgnoreReason::NotListening));
        assert!(!outcome.prevents_default());
    }

    #[test]
    fn unbound_combo_is_reported() {
        let commander = Commander::<()>::default();
        commander.init().unwrap();
        let ev = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CTRL);
        let outcome = commander.handle_key(&ev, FocusTarget::Body).unwrap();
        assert!(matches!(outcome, KeyOutcome::Unbound(c) if c.to_string() == "ctrl+q"));
    }

    #[test]
    fn teardown_stops_listening() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let commander = Commander::<()>::default();
        logging(&commander, "ping", "f5", &log);
        commander.init().unwrap();
        commander.teardown();
        let outcome = commander
            .handle_key(&KeyEvent::plain(KeyCode::F(5)), FocusTarget::Body)
            .unwrap();
        assert_eq!(outcome, KeyOutcome::Ignored(IgnoreReason::NotListening));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn meta_counts_as_ctrl() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let commander = Commander::<()>::default();
        logging(&commander, "save", "ctrl+s", &log);
        commander.init().unwrap();
        let ev = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::META);
        assert!(commander.handle_key(&ev, FocusTarget::Body).unwrap().prevents_default());
        assert_eq!(*log.borrow(), vec!["save"]);
    }
}
