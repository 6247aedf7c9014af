use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
};

use log::warn;

use crate::{
    events::error::{HandlerError, RegistryError},
    messages::{EventCategory, IncomingMessage},
    types::EventCode,
};

pub type EventHandler<C> =
    Box<dyn FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvokeOutcome {
    Handled,
    /// No handler registered for the code
    Unknown,
    /// Handler returned an error or panicked, already logged
    Failed,
}

/// Code to handler table for one event category
pub struct EventRegistry<C> {
    category: EventCategory,
    handlers: HashMap<EventCode, EventHandler<C>>,
}

impl<C> EventRegistry<C> {
    pub fn new(category: EventCategory) -> Self {
        Self {
            category,
            handlers: HashMap::new(),
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn try_register<F>(&mut self, code: EventCode, handler: F) -> Result<(), RegistryError>
    where
        F: FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        let actual = EventCategory::of(code).ok_or(RegistryError::UnknownEventCode { code })?;
        if actual != self.category {
            return Err(RegistryError::WrongCategory {
                code,
                expected: self.category.name(),
                actual: actual.name(),
            });
        }
        if self.handlers.contains_key(&code) {
            return Err(RegistryError::AlreadyRegistered { code });
        }
        self.handlers.insert(code, Box::new(handler));
        Ok(())
    }

    /// # Panics
    ///
    /// If `code` belongs to another category or already has a handler
    pub fn register<F>(&mut self, code: EventCode, handler: F)
    where
        F: FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        if let Err(error) = self.try_register(code, handler) {
            panic!("{}", error);
        }
    }

    pub fn unregister(&mut self, code: EventCode) -> bool {
        self.handlers.remove(&code).is_some()
    }

    pub fn has(&self, code: EventCode) -> bool {
        self.handlers.contains_key(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = EventCode> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handler for the message's code. Handler errors and panics are
    /// logged with the code and reported as `Failed`.
    pub fn invoke(&mut self, context: &mut C, message: &mut IncomingMessage<'_>) -> InvokeOutcome {
        let code = message.event_code();
        let Some(handler) = self.handlers.get_mut(&code) else {
            return InvokeOutcome::Unknown;
        };

        match catch_unwind(AssertUnwindSafe(|| handler(context, message))) {
            Ok(Ok(())) => InvokeOutcome::Handled,
            Ok(Err(error)) => {
                warn!(
                    "{} handler for event {} from connection {} failed: {}",
                    self.category.name(),
                    code,
                    message.origin(),
                    error
                );
                InvokeOutcome::Failed
            }
            Err(_) => {
                warn!(
                    "{} handler for event {} from connection {} panicked",
                    self.category.name(),
                    code,
                    message.origin()
                );
                InvokeOutcome::Failed
            }
        }
    }
}
