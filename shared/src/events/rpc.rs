use std::{
    any::{type_name, TypeId},
    collections::HashMap,
};

use naia_serde::Serde;

use crate::{
    events::{
        error::{HandlerError, RegistryError, RpcError},
        registry::{EventHandler, EventRegistry},
    },
    messages::{EventCategory, IncomingMessage, OutgoingMessage},
    types::{ConnectionId, EventCode},
};

/// Registered shape of one remote procedure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcSignature {
    pub id: EventCode,
    pub name: String,
    argument: TypeId,
    argument_name: &'static str,
}

impl RpcSignature {
    pub fn argument_name(&self) -> &'static str {
        self.argument_name
    }
}

/// Table of named remote procedures, each bound to a stable id in the User
/// range and a typed closure. Built once, locked, then installed into the
/// User registry. Calls are checked against the registered argument type
/// before anything is encoded.
pub struct RpcTable<C> {
    signatures: HashMap<String, RpcSignature>,
    ids: HashMap<EventCode, String>,
    pending: Vec<(EventCode, EventHandler<C>)>,
    locked: bool,
}

impl<C: 'static> Default for RpcTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> RpcTable<C> {
    pub fn new() -> Self {
        Self {
            signatures: HashMap::new(),
            ids: HashMap::new(),
            pending: Vec::new(),
            locked: false,
        }
    }

    pub fn try_add<A, F>(&mut self, id: EventCode, name: &str, mut procedure: F) -> Result<&mut Self, RpcError>
    where
        A: Serde + 'static,
        F: FnMut(&mut C, ConnectionId, A) -> Result<(), HandlerError> + 'static,
    {
        self.try_check_lock()?;
        if !EventCategory::User.contains(id) {
            return Err(RpcError::OutOfRange { id });
        }
        if self.ids.contains_key(&id) {
            return Err(RpcError::DuplicateId { id });
        }
        if self.signatures.contains_key(name) {
            return Err(RpcError::DuplicateName {
                name: name.to_string(),
            });
        }

        self.signatures.insert(
            name.to_string(),
            RpcSignature {
                id,
                name: name.to_string(),
                argument: TypeId::of::<A>(),
                argument_name: type_name::<A>(),
            },
        );
        self.ids.insert(id, name.to_string());
        let handler: EventHandler<C> =
            Box::new(move |context: &mut C, message: &mut IncomingMessage<'_>| {
                let argument: A = message.read()?;
                procedure(context, message.origin(), argument)
            });
        self.pending.push((id, handler));
        Ok(self)
    }

    /// # Panics
    ///
    /// If the table is locked, or the id or name is taken or out of range
    pub fn add<A, F>(&mut self, id: EventCode, name: &str, procedure: F) -> &mut Self
    where
        A: Serde + 'static,
        F: FnMut(&mut C, ConnectionId, A) -> Result<(), HandlerError> + 'static,
    {
        if let Err(error) = self.try_add(id, name, procedure) {
            panic!("{}", error);
        }
        self
    }

    pub fn try_lock(&mut self) -> Result<(), RpcError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn try_check_lock(&self) -> Result<(), RpcError> {
        if self.locked {
            Err(RpcError::Locked)
        } else {
            Ok(())
        }
    }

    pub fn check_lock(&self) {
        if self.locked {
            panic!("RpcTable already locked!");
        }
    }

    /// Moves every procedure into `registry` and locks the table
    pub fn install(&mut self, registry: &mut EventRegistry<C>) -> Result<(), RegistryError> {
        self.locked = true;
        for (id, handler) in self.pending.drain(..) {
            registry.try_register(id, handler)?;
        }
        Ok(())
    }

    pub fn signature(&self, name: &str) -> Option<&RpcSignature> {
        self.signatures.get(name)
    }

    pub fn name_of(&self, id: EventCode) -> Option<&str> {
        self.ids.get(&id).map(String::as_str)
    }

    pub fn try_encode<A: Serde + 'static>(&self, name: &str, argument: &A) -> Result<Box<[u8]>, RpcError> {
        let signature = self.signatures.get(name).ok_or_else(|| RpcError::UnknownRpc {
            name: name.to_string(),
        })?;
        if signature.argument != TypeId::of::<A>() {
            return Err(RpcError::ArgumentMismatch {
                name: name.to_string(),
                expected: signature.argument_name,
                actual: type_name::<A>(),
            });
        }
        Ok(OutgoingMessage::event(signature.id).write(argument).to_bytes())
    }

    /// # Panics
    ///
    /// If no procedure has this name, or it takes another argument type.
    /// Both are application bugs rather than network conditions.
    pub fn encode<A: Serde + 'static>(&self, name: &str, argument: &A) -> Box<[u8]> {
        self.try_encode(name, argument)
            .unwrap_or_else(|error| panic!("{}", error))
    }
}
