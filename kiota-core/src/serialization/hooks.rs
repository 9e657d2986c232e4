//! Callbacks fired around model decoding and encoding.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

use super::{Parsable, SerializationWriter};

/// Called with the model being populated by a parse node.
pub type AssignHook = Arc<dyn Fn(&mut dyn Parsable) + Send + Sync>;

/// Called with a model before or after it is written.
pub type ObjectHook = Arc<dyn Fn(&dyn Parsable) + Send + Sync>;

/// Called after a model's object scope is opened, before its fields are written.
pub type ObjectStartHook =
    Arc<dyn Fn(&dyn Parsable, &mut dyn SerializationWriter) -> Result<()> + Send + Sync>;

/// Hooks a parse node invokes around field assignment.
///
/// Child nodes inherit the hooks of the node that created them.
#[derive(Clone, Default)]
pub struct ParseHooks {
    before_assign: Option<AssignHook>,
    after_assign: Option<AssignHook>,
}

impl ParseHooks {
    /// Creates an empty set of hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run before any field of a model is assigned.
    pub fn with_before_assign<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn Parsable) + Send + Sync + 'static,
    {
        self.before_assign = Some(Arc::new(hook));
        self
    }

    /// Sets the hook run after every field of a model is assigned.
    pub fn with_after_assign<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn Parsable) + Send + Sync + 'static,
    {
        self.after_assign = Some(Arc::new(hook));
        self
    }

    /// Returns the before-assignment hook.
    pub fn before_assign(&self) -> Option<&AssignHook> {
        self.before_assign.as_ref()
    }

    /// Returns the after-assignment hook.
    pub fn after_assign(&self) -> Option<&AssignHook> {
        self.after_assign.as_ref()
    }

    /// Runs the before-assignment hook, if set.
    pub fn fire_before(&self, target: &mut dyn Parsable) {
        if let Some(hook) = &self.before_assign {
            hook(target);
        }
    }

    /// Runs the after-assignment hook, if set.
    pub fn fire_after(&self, target: &mut dyn Parsable) {
        if let Some(hook) = &self.after_assign {
            hook(target);
        }
    }

    /// Combines two sets of hooks; `self` runs first.
    pub fn chain(self, next: ParseHooks) -> ParseHooks {
        ParseHooks {
            before_assign: chain_assign(self.before_assign, next.before_assign),
            after_assign: chain_assign(self.after_assign, next.after_assign),
        }
    }
}

fn chain_assign(first: Option<AssignHook>, second: Option<AssignHook>) -> Option<AssignHook> {
    match (first, second) {
        (Some(a), Some(b)) => Some(Arc::new(move |target: &mut dyn Parsable| {
            a(&mut *target);
            b(target);
        })),
        (a, b) => a.or(b),
    }
}

impl fmt::Debug for ParseHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseHooks")
            .field("before_assign", &self.before_assign.is_some())
            .field("after_assign", &self.after_assign.is_some())
            .finish()
    }
}

/// Hooks a serialization writer invokes around each written model.
#[derive(Clone, Default)]
pub struct WriterHooks {
    before_object: Option<ObjectHook>,
    on_start_object: Option<ObjectStartHook>,
    after_object: Option<ObjectHook>,
}

impl WriterHooks {
    /// Creates an empty set of hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run before a model is written.
    pub fn with_before_object<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Parsable) + Send + Sync + 'static,
    {
        self.before_object = Some(Arc::new(hook));
        self
    }

    /// Sets the hook run once a model's scope is open.
    pub fn with_on_start_object<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Parsable, &mut dyn SerializationWriter) -> Result<()> + Send + Sync + 'static,
    {
        self.on_start_object = Some(Arc::new(hook));
        self
    }

    /// Sets the hook run after a model is written.
    pub fn with_after_object<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Parsable) + Send + Sync + 'static,
    {
        self.after_object = Some(Arc::new(hook));
        self
    }

    /// Returns the before-object hook.
    pub fn before_object(&self) -> Option<&ObjectHook> {
        self.before_object.as_ref()
    }

    /// Returns the on-start hook.
    pub fn on_start_object(&self) -> Option<&ObjectStartHook> {
        self.on_start_object.as_ref()
    }

    /// Returns the after-object hook.
    pub fn after_object(&self) -> Option<&ObjectHook> {
        self.after_object.as_ref()
    }

    /// Combines two sets of hooks; `self` runs first.
    pub fn chain(self, next: WriterHooks) -> WriterHooks {
        WriterHooks {
            before_object: chain_object(self.before_object, next.before_object),
            on_start_object: match (self.on_start_object, next.on_start_object) {
                (Some(a), Some(b)) => Some(Arc::new(
                    move |value: &dyn Parsable, writer: &mut dyn SerializationWriter| {
                        a(value, &mut *writer)?;
                        b(value, writer)
                    },
                )),
                (a, b) => a.or(b),
            },
            after_object: chain_object(self.after_object, next.after_object),
        }
    }
}

fn chain_object(first: Option<ObjectHook>, second: Option<ObjectHook>) -> Option<ObjectHook> {
    match (first, second) {
        (Some(a), Some(b)) => Some(Arc::new(move |value: &dyn Parsable| {
            a(value);
            b(value);
        })),
        (a, b) => a.or(b),
    }
}

impl fmt::Debug for WriterHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterHooks")
            .field("before_object", &self.before_object.is_some())
            .field("on_start_object", &self.on_start_object.is_some())
            .field("after_object", &self.after_object.is_some())
            .finish()
    }
}
