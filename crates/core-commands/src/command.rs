use crate::Commander;
use std::fmt;

pub use core_history::Action;

/// Cleanup returned by a command's attach hook; run once at teardown.
pub type Detach = Box<dyn FnOnce()>;

type ExecuteFn<A> = Box<dyn Fn(A) -> anyhow::Result<Execution>>;
type AttachFn<A> = Box<dyn Fn(&Commander<A>) -> Option<Detach>>;

/// What a command's `execute` hands back: the backward and forward effects.
///
/// The forward effect is the command's "do" as well as its "redo"; the
/// engine runs it right after `execute` returns.
#[derive(Default)]
pub struct Execution {
    pub undo: Option<Action>,
    pub redo: Option<Action>,
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("undo", &self.undo.is_some())
            .field("redo", &self.redo.is_some())
            .finish()
    }
}

impl Execution {
    /// No effect in either direction.
    pub fn none() -> Self {
        Self::default()
    }

    /// Forward effect only; the resulting history entry (if any) is irreversible.
    pub fn forward<R>(redo: R) -> Self
    where
        R: Fn() -> anyhow::Result<()> + 'static,
    {
        Self {
            undo: None,
            redo: Some(Box::new(redo)),
        }
    }

    pub fn reversible<U, R>(undo: U, redo: R) -> Self
    where
        U: Fn() -> anyhow::Result<()> + 'static,
        R: Fn() -> anyhow::Result<()> + 'static,
    {
        Self {
            undo: Some(Box::new(undo)),
            redo: Some(Box::new(redo)),
        }
    }

    /// Build from already boxed actions (e.g. `DocumentAccess::restore`).
    pub fn from_actions(undo: Option<Action>, redo: Option<Action>) -> Self {
        Self { undo, redo }
    }
}

/// A named, registrable command.
///
/// `A` is the argument type passed to `execute`. Keyboard and gesture
/// triggers run commands with `A::default()`.
pub struct CommandDescriptor<A> {
    name: String,
    keyboard: Vec<String>,
    add_to_history: bool,
    on_attach: Option<AttachFn<A>>,
    execute: ExecuteFn<A>,
}

impl<A> fmt::Debug for CommandDescriptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("keyboard", &self.keyboard)
            .field("add_to_history", &self.add_to_history)
            .field("on_attach", &self.on_attach.is_some())
            .finish()
    }
}

impl<A: 'static> CommandDescriptor<A> {
    fn with_policy<E>(name: impl Into<String>, add_to_history: bool, execute: E) -> Self
    where
        E: Fn(A) -> anyhow::Result<Execution> + 'static,
    {
        Self {
            name: name.into(),
            keyboard: Vec::new(),
            add_to_history,
            on_attach: None,
            execute: Box::new(execute),
        }
    }

    /// A command whose executions are recorded in history.
    pub fn tracked<E>(name: impl Into<String>, execute: E) -> Self
    where
        E: Fn(A) -> anyhow::Result<Execution> + 'static,
    {
        Self::with_policy(name, true, execute)
    }

    /// A command that runs but never enters history (undo, redo, selection).
    pub fn untracked<E>(name: impl Into<String>, execute: E) -> Self
    where
        E: Fn(A) -> anyhow::Result<Execution> + 'static,
    {
        Self::with_policy(name, false, execute)
    }

    /// Key combos (`"ctrl+z"`, `"delete"`) that trigger this command.
    pub fn keyboard<I, S>(mut self, combos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyboard = combos.into_iter().map(Into::into).collect();
        self
    }

    /// Hook run by `Commander::init`; the returned closure runs at teardown.
    pub fn on_attach<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Commander<A>) -> Option<Detach> + 'static,
    {
        self.on_attach = Some(Box::new(hook));
        self
    }
}

impl<A> CommandDescriptor<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyboard_combos(&self) -> &[String] {
        &self.keyboard
    }

    pub fn adds_to_history(&self) -> bool {
        self.add_to_history
    }

    pub(crate) fn execute(&self, args: A) -> anyhow::Result<Execution> {
        (self.execute)(args)
    }

    pub(crate) fn attach(&self, commander: &Commander<A>) -> Option<Detach> {
        self.on_attach.as_ref().and_then(|hook| hook(commander))
    }
}
