use crate::{CommandDescriptor, CommandError, Detach, Execution};
use core_history::{History, HistoryConfig, HistoryEntry};
use core_keymap::BindingTable;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Built-in command stepping the history cursor back.
pub const UNDO: &str = "undo";
/// Built-in command stepping the history cursor forward.
pub const REDO: &str = "redo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed; commands may be registered, nothing is attached yet.
    Registering,
    /// `init` ran: keyboard listening is active and attach hooks have run.
    Attached,
    /// `teardown` ran; every detach callback has been invoked.
    TornDown,
}

struct Registration<A> {
    descriptor: Rc<CommandDescriptor<A>>,
    keyboard: Vec<String>,
}

pub(crate) struct Inner<A> {
    /// Every registration in order, shadowed ones included.
    registrations: RefCell<Vec<Registration<A>>>,
    bindings: RefCell<BindingTable>,
    history: RefCell<History>,
    detach: RefCell<Vec<Detach>>,
    lifecycle: Cell<Lifecycle>,
    pub(crate) keyboard_attached: Cell<bool>,
}

/// Command registry and history engine for one editor session.
///
/// Cloning yields another handle to the same session. Nothing here is
/// process-wide: each editor constructs its own.
pub struct Commander<A> {
    pub(crate) inner: Rc<Inner<A>>,
}

impl<A> Clone for Commander<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: 'static> fmt::Debug for Commander<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commander")
            .field("commands", &self.command_names())
            .field("history", &*self.inner.history.borrow())
            .field("lifecycle", &self.inner.lifecycle.get())
            .finish()
    }
}

/// Non-owning handle, held by listeners that must not keep the session alive.
pub struct WeakCommander<A> {
    inner: Weak<Inner<A>>,
}

impl<A> Clone for WeakCommander<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> WeakCommander<A> {
    pub fn upgrade(&self) -> Option<Commander<A>> {
        self.inner.upgrade().map(|inner| Commander { inner })
    }
}

impl<A: 'static> Default for Commander<A> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<A: 'static> Commander<A> {
    /// New session with empty history and the built-in `undo` / `redo` commands.
    pub fn new(config: HistoryConfig) -> Self {
        let commander = Self {
            inner: Rc::new(Inner {
                registrations: RefCell::new(Vec::new()),
                bindings: RefCell::new(BindingTable::default()),
                history: RefCell::new(History::new(config)),
                detach: RefCell::new(Vec::new()),
                lifecycle: Cell::new(Lifecycle::Registering),
                keyboard_attached: Cell::new(false),
            }),
        };
        commander.register_builtins();
        commander
    }

    fn register_builtins(&self) {
        let weak = Rc::downgrade(&self.inner);
        self.register(
            CommandDescriptor::untracked(UNDO, move |_| {
                let weak = weak.clone();
                Ok(Execution::forward(move || match weak.upgrade() {
                    Some(inner) => inner.step_undo(),
                    None => Ok(()),
                }))
            })
            .keyboard(["ctrl+z"]),
        );
        let weak = Rc::downgrade(&self.inner);
        self.register(
            CommandDescriptor::untracked(REDO, move |_| {
                let weak = weak.clone();
                Ok(Execution::forward(move || match weak.upgrade() {
                    Some(inner) => inner.step_redo(),
                    None => Ok(()),
                }))
            })
            .keyboard(["ctrl+y", "ctrl+shift+z"]),
        );
    }

    pub fn downgrade(&self) -> WeakCommander<A> {
        WeakCommander {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Registry
    // ---------------------------------------------------------------------------------------------

    /// Add a command. Registering a name again takes over dispatch for that
    /// name; the earlier registration stays in the ordered list, so its key
    /// combos keep firing (routed to the newest descriptor) and its attach
    /// hook still runs at `init`.
    pub fn register(&self, descriptor: CommandDescriptor<A>) {
        let name = descriptor.name().to_string();
        {
            let mut regs = self.inner.registrations.borrow_mut();
            if regs.iter().any(|r| r.descriptor.name() == name) {
                debug!(target: "commands.registry", command = %name, "command_shadowed");
            }
            let keyboard = descriptor.keyboard_combos().to_vec();
            regs.push(Registration {
                descriptor: Rc::new(descriptor),
                keyboard,
            });
        }
        if self.inner.lifecycle.get() != Lifecycle::Registering {
            debug!(target: "commands.registry", command = %name, lifecycle = ?self.inner.lifecycle.get(), "registered_after_init_attach_skipped");
        }
        self.rebuild_bindings();
        trace!(target: "commands.registry", command = %name, "command_registered");
    }

    /// Replace the key combos of a registered command. Combos contributed by
    /// shadowed registrations of the same name are dropped too.
    pub fn rebind<I, S>(&self, name: &str, combos: I) -> Result<(), CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut regs = self.inner.registrations.borrow_mut();
            let latest = regs
                .iter()
                .rposition(|r| r.descriptor.name() == name)
                .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
            for reg in regs.iter_mut().filter(|r| r.descriptor.name() == name) {
                reg.keyboard.clear();
            }
            let reg = &mut regs[latest];
            reg.keyboard = combos.into_iter().map(Into::into).collect();
            debug!(target: "commands.registry", command = name, keyboard = ?reg.keyboard, "command_rebound");
        }
        self.rebuild_bindings();
        Ok(())
    }

    fn rebuild_bindings(&self) {
        let regs = self.inner.registrations.borrow();
        let table = BindingTable::build(
            regs.iter()
                .map(|r| (r.descriptor.name(), r.keyboard.as_slice())),
        );
        *self.inner.bindings.borrow_mut() = table;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lookup(name).is_some()
    }

    /// Registered command names, each once, in order of first registration.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for reg in self.inner.registrations.borrow().iter() {
            let name = reg.descriptor.name();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Current key combos of a command, across every registration of its name.
    pub fn keyboard_of(&self, name: &str) -> Option<Vec<String>> {
        let regs = self.inner.registrations.borrow();
        let mut found = false;
        let mut combos: Vec<String> = Vec::new();
        for reg in regs.iter().filter(|r| r.descriptor.name() == name) {
            found = true;
            for combo in &reg.keyboard {
                if !combos.contains(combo) {
                    combos.push(combo.clone());
                }
            }
        }
        found.then_some(combos)
    }

    /// Binding table as `(combo, commands)` rows, sorted by combo.
    pub fn bindings(&self) -> Vec<(String, Vec<String>)> {
        self.inner.bindings.borrow().entries()
    }

    pub(crate) fn bound_to(&self, combo: &core_keymap::KeyCombo) -> Vec<String> {
        self.inner.bindings.borrow().lookup(combo).to_vec()
    }

    // ---------------------------------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------------------------------

    /// Run a command: execute, apply the forward effect, then record the
    /// entry if the command is tracked. Nothing is recorded when either step
    /// fails.
    pub fn dispatch(&self, name: &str, args: A) -> Result<(), CommandError> {
        let descriptor = self
            .inner
            .lookup(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        let Execution { undo, redo } =
            descriptor
                .execute(args)
                .map_err(|source| CommandError::Execute {
                    name: name.to_string(),
                    source,
                })?;
        if let Some(redo) = &redo {
            redo().map_err(|source| CommandError::Apply {
                name: name.to_string(),
                source,
            })?;
        }
        if descriptor.adds_to_history() {
            let mut history = self.inner.history.borrow_mut();
            history.record(HistoryEntry::new(name, undo, redo));
            debug!(target: "commands.dispatch", command = name, len = history.len(), cursor = history.cursor(), "dispatched_tracked");
        } else {
            debug!(target: "commands.dispatch", command = name, "dispatched");
        }
        Ok(())
    }

    /// Run a command with default arguments (toolbar buttons, key presses, gestures).
    pub fn invoke(&self, name: &str) -> Result<(), CommandError>
    where
        A: Default,
    {
        self.dispatch(name, A::default())
    }

    /// Dispatch whatever is registered as `undo` (the built-in unless replaced).
    pub fn undo(&self) -> Result<(), CommandError>
    where
        A: Default,
    {
        self.invoke(UNDO)
    }

    /// Dispatch whatever is registered as `redo` (the built-in unless replaced).
    pub fn redo(&self) -> Result<(), CommandError>
    where
        A: Default,
    {
        self.invoke(REDO)
    }

    // ---------------------------------------------------------------------------------------------
    // History inspection
    // ---------------------------------------------------------------------------------------------

    /// Index of the last applied entry, `-1` when none.
    pub fn cursor(&self) -> isize {
        self.inner.history.borrow().cursor()
    }

    pub fn history_len(&self) -> usize {
        self.inner.history.borrow().len()
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.borrow().can_redo()
    }

    /// Command names of every history entry, oldest first.
    pub fn history_labels(&self) -> Vec<String> {
        self.inner
            .history
            .borrow()
            .labels()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn clear_history(&self) {
        self.inner.history.borrow_mut().clear();
    }

    // ---------------------------------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------------------------------

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    /// Start keyboard listening and run every attach hook, collecting their
    /// detach callbacks. Call once, on mount.
    pub fn init(&self) -> Result<(), CommandError> {
        if self.inner.lifecycle.get() != Lifecycle::Registering {
            return Err(CommandError::AlreadyInitialized);
        }
        self.inner.keyboard_attached.set(true);
        let weak = Rc::downgrade(&self.inner);
        self.inner.detach.borrow_mut().push(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.keyboard_attached.set(false);
            }
        }));

        let descriptors: Vec<Rc<CommandDescriptor<A>>> = self
            .inner
            .registrations
            .borrow()
            .iter()
            .map(|r| r.descriptor.clone())
            .collect();
        let mut attached = 0usize;
        for descriptor in descriptors {
            if let Some(detach) = descriptor.attach(self) {
                self.inner.detach.borrow_mut().push(detach);
                attached += 1;
            }
        }
        self.inner.lifecycle.set(Lifecycle::Attached);
        debug!(target: "commands.registry", attached, commands = self.inner.registrations.borrow().len(), "commander_init");
        Ok(())
    }

    /// Run every collected detach callback. Safe to call more than once;
    /// only the first call does anything. Also runs when the last handle drops.
    pub fn teardown(&self) {
        if self.inner.lifecycle.get() == Lifecycle::TornDown {
            return;
        }
        self.inner.lifecycle.set(Lifecycle::TornDown);
        let callbacks = std::mem::take(&mut *self.inner.detach.borrow_mut());
        let count = callbacks.len();
        for detach in callbacks {
            detach();
        }
        debug!(target: "commands.registry", detached = count, "commander_teardown");
    }
}

impl<A> Inner<A> {
    /// Newest descriptor registered under `name`.
    fn lookup(&self, name: &str) -> Option<Rc<CommandDescriptor<A>>> {
        self.registrations
            .borrow()
            .iter()
            .rfind(|r| r.descriptor.name() == name)
            .map(|r| r.descriptor.clone())
    }

    // The history borrow is released while an entry runs so that entries may
    // read the commander (e.g. a host observer re-rendering a toolbar).
    fn step_undo(&self) -> anyhow::Result<()> {
        let entry = self.history.borrow().peek_undo();
        let Some(entry) = entry else {
            trace!(target: "commands.dispatch", "undo_noop_empty_history");
            return Ok(());
        };
        entry.revert()?;
        let mut history = self.history.borrow_mut();
        history.retreat();
        debug!(target: "commands.dispatch", entry = entry.label(), cursor = history.cursor(), "undo_applied");
        Ok(())
    }

    fn step_redo(&self) -> anyhow::Result<()> {
        let entry = self.history.borrow().peek_redo();
        let Some(entry) = entry else {
            trace!(target: "commands.dispatch", "redo_noop_no_forward_entry");
            return Ok(());
        };
        entry.apply()?;
        let mut history = self.history.borrow_mut();
        history.advance();
        debug!(target: "commands.dispatch", entry = entry.label(), cursor = history.cursor(), "redo_applied");
        Ok(())
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        let callbacks = std::mem::take(self.detach.get_mut());
        if !callbacks.is_empty() {
            trace!(target: "commands.registry", detached = callbacks.len(), "teardown_on_drop");
        }
        for detach in callbacks {
            detach();
        }
    }
}
