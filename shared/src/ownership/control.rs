use log::{debug, info};
use naia_serde::Serde;

use crate::{
    messages::{
        event_code::internal_events::{
            RELEASE_CONTROL, TAKE_CONTROL, TAKE_CONTROL_SUCCESS, TRANSFER_CONTROL,
        },
        OutgoingMessage,
    },
    ownership::{
        messages::{ReleaseControl, TakeControl, TakeControlSuccess, TransferControl},
        outcome::{ControlOutcome, Refusal},
    },
    session::{PendingTransfer, Recipient, Session},
    types::{ConnectionId, DeliveryMode, EntityId, NetworkMode},
    world::{BehaviorMode, EntityRecord, Handshake, OwnershipAccessLevel, WorldError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Take,
    Release,
    Transfer,
}

impl Operation {
    fn allowed_by(&self, access: OwnershipAccessLevel) -> bool {
        match self {
            Operation::Take => access.allows_take(),
            Operation::Release => access.allows_release(),
            Operation::Transfer => access.allows_transfer(),
        }
    }
}

impl Session {
    /// Player check, ownership switch and access level, in that order
    pub(crate) fn check_operation(&self, record: &EntityRecord, operation: Operation) -> Result<(), Refusal> {
        if record.is_player() {
            return Err(Refusal::PlayerEntity);
        }
        let access = self.effective_access(record).ok_or(Refusal::OwnershipDisabled)?;
        if !operation.allowed_by(access) {
            return Err(Refusal::AccessLevel);
        }
        Ok(())
    }

    /// Where a grant for `requester` goes. Through the relay every lobby
    /// member must see it so the previous holder steps down.
    pub(crate) fn grant_recipient(&self, requester: ConnectionId) -> Recipient {
        match self.context.mode() {
            NetworkMode::Direct => Recipient::Connection(requester),
            NetworkMode::Relay => Recipient::Broadcast { except: None },
        }
    }

    pub(crate) fn send_ownership<T: Serde>(
        &mut self,
        recipient: Recipient,
        entity: EntityId,
        event_code: i32,
        payload: &T,
    ) {
        let bytes = OutgoingMessage::object(entity, event_code).write(payload).to_bytes();
        self.outbox.push(recipient, bytes, DeliveryMode::Reliable);
    }

    /// Flips `entity` to Active here and fires `on_take`
    pub(crate) fn become_active(&mut self, entity: EntityId) {
        if let Some(record) = self.entities.get_mut(entity) {
            record.set_mode(BehaviorMode::ActiveOnly);
            record.clear_pending();
            self.policy.on_take(entity);
        }
    }

    /// Flips `entity` to Passive here, firing `on_release` only if it was Active
    pub(crate) fn become_passive(&mut self, entity: EntityId) {
        if let Some(record) = self.entities.get_mut(entity) {
            let was_active = record.is_active();
            record.set_mode(BehaviorMode::PassiveOnly);
            record.clear_pending();
            if was_active {
                self.policy.on_release(entity);
            }
        }
    }

    fn refuse(&self, operation: Operation, entity: EntityId, refusal: Refusal) -> ControlOutcome {
        debug!("{:?} control of entity {} refused: {:?}", operation, entity, refusal);
        ControlOutcome::Refused(refusal)
    }

    /// Asks for authority over `entity`. The authority applies it at once and
    /// tells everyone else to drop any Active claim; other peers send a request
    /// and become Active when `TakeControlSuccess` arrives.
    pub fn take_control(&mut self, entity: EntityId) -> Result<ControlOutcome, WorldError> {
        let record = self.entities.try_get(entity)?;
        if let Err(refusal) = self.check_operation(record, Operation::Take) {
            return Ok(self.refuse(Operation::Take, entity, refusal));
        }
        if record.is_active() && record.mode() != BehaviorMode::Both {
            return Ok(self.refuse(Operation::Take, entity, Refusal::AlreadyActive));
        }
        let Some(local) = self.context.local_connection() else {
            return Ok(self.refuse(Operation::Take, entity, Refusal::NotConnected));
        };

        if self.context.is_authority() {
            self.directory.purge_entity(entity);
            self.transfers.remove(&entity);
            self.become_active(entity);
            self.announce_authority_control(entity, local);
            info!("Took control of entity {} as authority", entity);
            return Ok(ControlOutcome::Completed);
        }

        if let Some(record) = self.entities.get_mut(entity) {
            record.set_pending(Handshake::Take);
        }
        self.send_ownership(
            Recipient::Authority,
            entity,
            TAKE_CONTROL,
            &TakeControl {
                requester: local,
                requested_by_server: false,
            },
        );
        Ok(ControlOutcome::Requested)
    }

    /// Authority side: tells every peer to drop its claim on `entity`
    pub(crate) fn announce_authority_control(&mut self, entity: EntityId, local: ConnectionId) {
        match self.context.mode() {
            NetworkMode::Direct => self.send_ownership(
                Recipient::Broadcast { except: None },
                entity,
                TAKE_CONTROL,
                &TakeControl {
                    requester: local,
                    requested_by_server: true,
                },
            ),
            NetworkMode::Relay => self.send_ownership(
                Recipient::Broadcast { except: None },
                entity,
                TAKE_CONTROL_SUCCESS,
                &TakeControlSuccess { requester: local },
            ),
        }
    }

    /// Hands `entity` back to the authority. This peer stays Active until
    /// `ReleaseControlSuccess` arrives.
    pub fn release_control(&mut self, entity: EntityId) -> Result<ControlOutcome, WorldError> {
        let record = self.entities.try_get(entity)?;
        if let Err(refusal) = self.check_operation(record, Operation::Release) {
            return Ok(self.refuse(Operation::Release, entity, refusal));
        }
        if !record.is_active() {
            return Ok(self.refuse(Operation::Release, entity, Refusal::NotActive));
        }
        if self.context.is_authority() {
            return Ok(self.refuse(Operation::Release, entity, Refusal::IsAuthority));
        }
        let Some(local) = self.context.local_connection() else {
            return Ok(self.refuse(Operation::Release, entity, Refusal::NotConnected));
        };

        if let Some(record) = self.entities.get_mut(entity) {
            record.set_pending(Handshake::Release);
        }
        self.send_ownership(
            Recipient::Authority,
            entity,
            RELEASE_CONTROL,
            &ReleaseControl { releaser: local },
        );
        Ok(ControlOutcome::Requested)
    }

    /// Hands `entity` to the connection owning the player entity `target`.
    /// This peer drops to Passive immediately; the target takes control
    /// through the usual request.
    pub fn transfer_control(&mut self, entity: EntityId, target: EntityId) -> Result<ControlOutcome, WorldError> {
        let record = self.entities.try_get(entity)?;
        if let Err(refusal) = self.check_operation(record, Operation::Transfer) {
            return Ok(self.refuse(Operation::Transfer, entity, refusal));
        }
        if !record.is_active() {
            return Ok(self.refuse(Operation::Transfer, entity, Refusal::NotActive));
        }
        let target_connection = match self.entities.get(target) {
            Some(target_record) if target_record.is_player() => target_record.owner(),
            _ => None,
        };
        let Some(target_connection) = target_connection else {
            return Ok(self.refuse(Operation::Transfer, entity, Refusal::TargetNotPlayer));
        };
        let Some(local) = self.context.local_connection() else {
            return Ok(self.refuse(Operation::Transfer, entity, Refusal::NotConnected));
        };
        if target_connection == local {
            return Ok(self.refuse(Operation::Transfer, entity, Refusal::TargetIsSelf));
        }

        self.become_passive(entity);
        if let Some(record) = self.entities.get_mut(entity) {
            record.set_pending(Handshake::Transfer {
                to: target_connection,
            });
        }

        let transfer = TransferControl {
            sender: local,
            target_entity: target,
            target_connection,
        };
        if self.context.is_authority() {
            self.transfers.insert(
                entity,
                PendingTransfer {
                    from: local,
                    to: target_connection,
                },
            );
            self.send_ownership(
                Recipient::Connection(target_connection),
                entity,
                TRANSFER_CONTROL,
                &transfer,
            );
        } else {
            self.directory.release_control(local, entity);
            self.send_ownership(Recipient::Authority, entity, TRANSFER_CONTROL, &transfer);
        }
        Ok(ControlOutcome::Requested)
    }

    /// Transfer target side: asks the authority for an entity handed to this
    /// peer. No access check here, the authority judges the request against
    /// the transfer gate and takes the entity back if it refuses.
    pub(crate) fn request_transferred(&mut self, entity: EntityId) {
        let Some(local) = self.context.local_connection() else {
            debug!("Dropping transfer of entity {}: not connected", entity);
            return;
        };
        if let Some(record) = self.entities.get_mut(entity) {
            record.set_pending(Handshake::Take);
        }
        self.send_ownership(
            Recipient::Authority,
            entity,
            TAKE_CONTROL,
            &TakeControl {
                requester: local,
                requested_by_server: false,
            },
        );
    }

    /// Authority side: makes this peer Active for every listed entity that
    /// still exists. Returns the entities reclaimed.
    pub fn reclaim(&mut self, entities: &[EntityId]) -> Vec<EntityId> {
        let mut reclaimed = Vec::new();
        for entity in entities {
            if !self.entities.contains(*entity) {
                continue;
            }
            self.directory.purge_entity(*entity);
            self.transfers.remove(entity);
            self.become_active(*entity);
            reclaimed.push(*entity);
        }
        reclaimed
    }

    /// Authority side: forgets `connection` and reclaims everything it
    /// controlled, plus `extra` entities reported by the relay, plus any
    /// transfer that was heading to or from it.
    pub fn handle_peer_disconnect(&mut self, connection: ConnectionId, extra: &[EntityId]) -> Vec<EntityId> {
        let mut orphaned = match self.directory.disconnect(connection) {
            Ok(orphaned) => orphaned,
            Err(_) => Vec::new(),
        };
        orphaned.extend_from_slice(extra);
        orphaned.extend(
            self.transfers
                .iter()
                .filter(|(_, transfer)| transfer.to == connection || transfer.from == connection)
                .map(|(entity, _)| *entity),
        );
        orphaned.sort_unstable();
        orphaned.dedup();

        // entities a live peer has already taken over stay with that peer
        orphaned.retain(|entity| match self.directory.controller_of(*entity) {
            Some(controller) => controller == connection,
            None => true,
        });
        orphaned.retain(|entity| {
            self.entities
                .get(*entity)
                .map(|record| !record.is_active() || self.transfers.contains_key(entity))
                .unwrap_or(false)
        });

        let reclaimed = self.reclaim(&orphaned);
        if !reclaimed.is_empty() {
            info!(
                "Reclaimed entities {:?} after connection {} disconnected",
                reclaimed, connection
            );
        }
        reclaimed
    }
}
