use log::{debug, info};

use crate::{
    events::{EventRegistry, HandlerError},
    messages::{
        event_code::internal_events::{
            RELEASE_CONTROL, RELEASE_CONTROL_SUCCESS, TAKE_CONTROL, TAKE_CONTROL_SUCCESS,
            TRANSFER_CONTROL,
        },
        IncomingMessage,
    },
    ownership::{
        control::Operation,
        messages::{
            ReleaseControl, ReleaseControlSuccess, TakeControl, TakeControlSuccess, TransferControl,
        },
        outcome::Refusal,
    },
    session::{PendingTransfer, Recipient, Session},
    types::{DeliveryMode, EntityId, NetworkMode},
    world::EntityRecord,
};

/// Registers the five ownership handlers into an Internal registry
pub fn install<C: AsMut<Session> + 'static>(registry: &mut EventRegistry<C>) {
    registry.register(TAKE_CONTROL, |context: &mut C, message: &mut IncomingMessage<'_>| {
        context.as_mut().on_take_control(message)
    });
    registry.register(
        TAKE_CONTROL_SUCCESS,
        |context: &mut C, message: &mut IncomingMessage<'_>| {
            context.as_mut().on_take_control_success(message)
        },
    );
    registry.register(RELEASE_CONTROL, |context: &mut C, message: &mut IncomingMessage<'_>| {
        context.as_mut().on_release_control(message)
    });
    registry.register(
        RELEASE_CONTROL_SUCCESS,
        |context: &mut C, message: &mut IncomingMessage<'_>| {
            context.as_mut().on_release_control_success(message)
        },
    );
    registry.register(TRANSFER_CONTROL, |context: &mut C, message: &mut IncomingMessage<'_>| {
        context.as_mut().on_transfer_control(message)
    });
}

fn entity_of(message: &IncomingMessage<'_>) -> Result<EntityId, HandlerError> {
    message
        .entity_id()
        .ok_or(HandlerError::Custom("ownership message without entity".to_string()))
}

impl Session {
    pub(crate) fn on_take_control(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity = entity_of(message)?;
        let request: TakeControl = message.read()?;
        let origin = message.origin();

        if !self.context.is_authority() {
            if !request.requested_by_server {
                debug!("Ignoring TakeControl for entity {}: not the authority", entity);
                return Ok(());
            }
            // the authority granted the entity to someone else
            if !self.context.is_local(request.requester) {
                self.become_passive(entity);
                self.directory.register_control(request.requester, entity);
            }
            self.send_ownership(
                Recipient::Authority,
                entity,
                TAKE_CONTROL_SUCCESS,
                &TakeControlSuccess {
                    requester: request.requester,
                },
            );
            return Ok(());
        }

        if request.requester != origin {
            debug!(
                "Ignoring TakeControl for entity {}: requester {} sent by {}",
                entity, request.requester, origin
            );
            return Ok(());
        }
        let requester = request.requester;

        let record = self
            .entities
            .try_get(entity)
            .map_err(|_| HandlerError::EntityNotFound { entity })?;
        // the target of a forwarded transfer is held to the transfer gate
        let transferring = self.transfers.get(&entity).map(|transfer| transfer.to) == Some(requester);
        let operation = if transferring { Operation::Transfer } else { Operation::Take };
        let mut refusal = self.check_operation(record, operation).err();
        if refusal.is_none() && self.directory.controller_of(entity) == Some(requester) {
            // duplicate request, confirm again
            self.send_ownership(
                self.grant_recipient(requester),
                entity,
                TAKE_CONTROL_SUCCESS,
                &TakeControlSuccess { requester },
            );
            return Ok(());
        }
        if refusal.is_none() {
            let record = self
                .entities
                .try_get(entity)
                .map_err(|_| HandlerError::EntityNotFound { entity })?;
            if !self.policy.accept_take(record, requester) {
                refusal = Some(Refusal::Predicate);
            }
        }

        if let Some(refusal) = refusal {
            debug!(
                "TakeControl of entity {} by connection {} refused: {:?}",
                entity, requester, refusal
            );
            // a forwarded transfer that the target could not complete comes back here
            if transferring {
                self.transfers.remove(&entity);
                self.become_active(entity);
                if let Some(local) = self.context.local_connection() {
                    self.announce_authority_control(entity, local);
                }
            }
            return Ok(());
        }

        self.become_passive(entity);
        self.directory.register_control(requester, entity);
        self.transfers.remove(&entity);
        self.send_ownership(
            self.grant_recipient(requester),
            entity,
            TAKE_CONTROL_SUCCESS,
            &TakeControlSuccess { requester },
        );
        if self.context.mode() == NetworkMode::Direct {
            self.send_ownership(
                Recipient::Broadcast {
                    except: Some(requester),
                },
                entity,
                TAKE_CONTROL,
                &TakeControl {
                    requester,
                    requested_by_server: true,
                },
            );
        }
        info!("Granted control of entity {} to connection {}", entity, requester);
        Ok(())
    }

    pub(crate) fn on_take_control_success(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity = entity_of(message)?;
        let success: TakeControlSuccess = message.read()?;

        if self.context.is_authority() {
            debug!(
                "Connection {} acknowledged control of entity {} by {}",
                message.origin(),
                entity,
                success.requester
            );
            return Ok(());
        }

        self.directory.register_control(success.requester, entity);
        if self.context.is_local(success.requester) {
            // fires once per arrival, duplicates included
            self.become_active(entity);
        } else {
            self.become_passive(entity);
        }
        Ok(())
    }

    pub(crate) fn on_release_control(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity = entity_of(message)?;
        let request: ReleaseControl = message.read()?;
        let releaser = message.origin();

        if !self.context.is_authority() {
            debug!("Ignoring ReleaseControl for entity {}: not the authority", entity);
            return Ok(());
        }
        if request.releaser != releaser {
            debug!(
                "Ignoring ReleaseControl for entity {}: releaser {} sent by {}",
                entity, request.releaser, releaser
            );
            return Ok(());
        }

        let record = self
            .entities
            .try_get(entity)
            .map_err(|_| HandlerError::EntityNotFound { entity })?;
        if let Err(refusal) = self.check_operation(record, Operation::Release) {
            debug!(
                "ReleaseControl of entity {} by connection {} refused: {:?}",
                entity, releaser, refusal
            );
            return Ok(());
        }
        if self.directory.controller_of(entity) != Some(releaser) {
            debug!(
                "ReleaseControl of entity {} by connection {} refused: not the controller",
                entity, releaser
            );
            return Ok(());
        }
        if !self.policy.accept_release(record, releaser) {
            debug!(
                "ReleaseControl of entity {} by connection {} refused by policy",
                entity, releaser
            );
            return Ok(());
        }

        self.directory.release_control(releaser, entity);
        self.become_active(entity);
        self.send_ownership(
            Recipient::Connection(releaser),
            entity,
            RELEASE_CONTROL_SUCCESS,
            &ReleaseControlSuccess { releaser },
        );
        Ok(())
    }

    pub(crate) fn on_release_control_success(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity = entity_of(message)?;
        let success: ReleaseControlSuccess = message.read()?;

        if self.context.is_authority() {
            debug!("Ignoring ReleaseControlSuccess for entity {} at the authority", entity);
            return Ok(());
        }
        self.directory.release_control(success.releaser, entity);
        if self.context.is_local(success.releaser) {
            self.become_passive(entity);
        }
        Ok(())
    }

    pub(crate) fn on_transfer_control(&mut self, message: &mut IncomingMessage<'_>) -> Result<(), HandlerError> {
        let entity = entity_of(message)?;
        let transfer: TransferControl = message.read()?;

        if !self.context.is_authority() {
            if self.context.is_local(transfer.target_connection) {
                self.request_transferred(entity);
            } else {
                self.outbox
                    .push(Recipient::Authority, message.raw().into(), DeliveryMode::Reliable);
            }
            return Ok(());
        }

        let origin = message.origin();
        if transfer.sender != origin {
            debug!(
                "Ignoring TransferControl for entity {}: sender {} sent by {}",
                entity, transfer.sender, origin
            );
            return Ok(());
        }
        if self.directory.controller_of(entity) != Some(origin) {
            debug!(
                "Ignoring TransferControl of entity {} by connection {}: not the controller",
                entity, origin
            );
            return Ok(());
        }
        let record = self
            .entities
            .try_get(entity)
            .map_err(|_| HandlerError::EntityNotFound { entity })?;
        if let Err(refusal) = self.check_transfer(record, &transfer) {
            debug!(
                "TransferControl of entity {} by connection {} refused: {:?}",
                entity, origin, refusal
            );
            // the sender already stepped down, hand it back
            self.send_ownership(
                self.grant_recipient(origin),
                entity,
                TAKE_CONTROL_SUCCESS,
                &TakeControlSuccess { requester: origin },
            );
            return Ok(());
        }

        if self.context.is_local(transfer.target_connection) {
            self.directory.release_control(transfer.sender, entity);
            self.transfers.remove(&entity);
            self.become_active(entity);
            self.send_ownership(
                Recipient::Connection(transfer.sender),
                entity,
                RELEASE_CONTROL_SUCCESS,
                &ReleaseControlSuccess {
                    releaser: transfer.sender,
                },
            );
            info!(
                "Entity {} transferred from connection {} to the authority",
                entity, transfer.sender
            );
            return Ok(());
        }

        self.directory.release_control(transfer.sender, entity);
        self.transfers.insert(
            entity,
            PendingTransfer {
                from: transfer.sender,
                to: transfer.target_connection,
            },
        );
        self.outbox.push(
            Recipient::Connection(transfer.target_connection),
            message.raw().into(),
            DeliveryMode::Reliable,
        );
        Ok(())
    }

    /// Transfer gate of the entity, and a target that is the player entity
    /// of some other connection
    fn check_transfer(&self, record: &EntityRecord, transfer: &TransferControl) -> Result<(), Refusal> {
        self.check_operation(record, Operation::Transfer)?;
        let target_owner = match self.entities.get(transfer.target_entity) {
            Some(target) if target.is_player() => target.owner(),
            _ => None,
        };
        match target_owner {
            None => Err(Refusal::TargetNotPlayer),
            Some(owner) if owner != transfer.target_connection => Err(Refusal::TargetNotPlayer),
            Some(owner) if owner == transfer.sender => Err(Refusal::TargetIsSelf),
            Some(_) => Ok(()),
        }
    }
}
