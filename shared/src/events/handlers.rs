use crate::{
    events::{
        error::{HandlerError, RegistryError},
        registry::{EventRegistry, InvokeOutcome},
    },
    messages::{EventCategory, IncomingMessage},
    types::EventCode,
};

/// The five session-wide registries of one transport endpoint
pub struct Handlers<C> {
    core: EventRegistry<C>,
    internal: EventRegistry<C>,
    relay: EventRegistry<C>,
    lobby: EventRegistry<C>,
    user: EventRegistry<C>,
}

impl<C> Default for Handlers<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Handlers<C> {
    pub fn new() -> Self {
        Self {
            core: EventRegistry::new(EventCategory::Core),
            internal: EventRegistry::new(EventCategory::Internal),
            relay: EventRegistry::new(EventCategory::Relay),
            lobby: EventRegistry::new(EventCategory::Lobby),
            user: EventRegistry::new(EventCategory::User),
        }
    }

    /// Registry for a category. Entity-scoped application categories have no
    /// session-wide registry.
    pub fn registry(&self, category: EventCategory) -> Option<&EventRegistry<C>> {
        match category {
            EventCategory::Core => Some(&self.core),
            EventCategory::Internal => Some(&self.internal),
            EventCategory::Relay => Some(&self.relay),
            EventCategory::Lobby => Some(&self.lobby),
            EventCategory::User => Some(&self.user),
            EventCategory::Object | EventCategory::UserObject => None,
        }
    }

    pub fn registry_mut(&mut self, category: EventCategory) -> Option<&mut EventRegistry<C>> {
        match category {
            EventCategory::Core => Some(&mut self.core),
            EventCategory::Internal => Some(&mut self.internal),
            EventCategory::Relay => Some(&mut self.relay),
            EventCategory::Lobby => Some(&mut self.lobby),
            EventCategory::User => Some(&mut self.user),
            EventCategory::Object | EventCategory::UserObject => None,
        }
    }

    pub fn core_mut(&mut self) -> &mut EventRegistry<C> {
        &mut self.core
    }

    pub fn internal_mut(&mut self) -> &mut EventRegistry<C> {
        &mut self.internal
    }

    pub fn relay_mut(&mut self) -> &mut EventRegistry<C> {
        &mut self.relay
    }

    pub fn lobby_mut(&mut self) -> &mut EventRegistry<C> {
        &mut self.lobby
    }

    pub fn user_mut(&mut self) -> &mut EventRegistry<C> {
        &mut self.user
    }

    /// Registers into whichever registry owns `code`
    pub fn try_register<F>(&mut self, code: EventCode, handler: F) -> Result<(), RegistryError>
    where
        F: FnMut(&mut C, &mut IncomingMessage<'_>) -> Result<(), HandlerError> + 'static,
    {
        let category = EventCategory::of(code).ok_or(RegistryError::UnknownEventCode { code })?;
        match self.registry_mut(category) {
            Some(registry) => registry.try_register(code, handler),
            None => Err(RegistryError::EntityScoped { code }),
        }
    }

    pub fn has(&self, code: EventCode) -> bool {
        EventCategory::of(code)
            .and_then(|category| self.registry(category))
            .map(|registry| registry.has(code))
            .unwrap_or(false)
    }

    pub fn invoke(&mut self, context: &mut C, message: &mut IncomingMessage<'_>) -> InvokeOutcome {
        match message.category() {
            EventCategory::Core => self.core.invoke(context, message),
            EventCategory::Internal => self.internal.invoke(context, message),
            EventCategory::Relay => self.relay.invoke(context, message),
            EventCategory::Lobby => self.lobby.invoke(context, message),
            EventCategory::User => self.user.invoke(context, message),
            EventCategory::Object | EventCategory::UserObject => InvokeOutcome::Unknown,
        }
    }
}
