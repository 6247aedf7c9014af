use crate::{
    events::{
        error::{HandlerError, RegistryError},
        registry::{EventRegistry, InvokeOutcome},
    },
    messages::{EventCategory, IncomingMessage},
    types::EventCode,
};

/// Per-entity handlers. Replication components register closures over their
/// own entity's state here; the session consults the entity's table instead
/// of a global one.
pub struct ObjectHandlers<C> {
    object: EventRegistry<C>,
    user_object: EventRegistry<C>,
}

impl<C> Default for ObjectHandlers<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ObjectHandlers<C> {
    pub fn new() -> Self {
        Self {
            object: EventRegistry::new(EventCategory::Object),
            user_object: EventRegistry::new(EventCategory::UserObject),
        }
    }

    pub fn try_register<F>(&mut self, code: EventCode, handler: F) -> Result<(), RegistryError>
    where
        F: FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        match EventCategory::of(code) {
            Some(EventCategory::Object) => self.object.try_register(code, handler),
            Some(EventCategory::UserObject) => self.user_object.try_register(code, handler),
            Some(other) => Err(RegistryError::WrongCategory {
                code,
                expected: "Object or UserObject",
                actual: other.name(),
            }),
            None => Err(RegistryError::UnknownEventCode { code }),
        }
    }

    /// # Panics
    ///
    /// If `code` is not an Object or UserObject code, or already has a handler
    pub fn register<F>(&mut self, code: EventCode, handler: F)
    where
        F: FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        if let Err(error) = self.try_register(code, handler) {
            panic!("{}", error);
        }
    }

    pub fn unregister(&mut self, code: EventCode) -> bool {
        self.object.unregister(code) || self.user_object.unregister(code)
    }

    pub fn has(&self, code: EventCode) -> bool {
        self.object.has(code) || self.user_object.has(code)
    }

    pub fn is_empty(&self) -> bool {
        self.object.is_empty() && self.user_object.is_empty()
    }

    pub fn invoke(&mut self, context: &mut C, message: &mut IncomingMessage<'_>) -> InvokeOutcome {
        match message.category() {
            EventCategory::Object => self.object.invoke(context, message),
            EventCategory::UserObject => self.user_object.invoke(context, message),
            _ => InvokeOutcome::Unknown,
        }
    }
}
