use std::collections::VecDeque;

use crate::types::{ConnectionId, DeliveryMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    /// Whoever holds authority: the server, or the relay master
    Authority,
    Connection(ConnectionId),
    /// Every peer in scope, optionally skipping one
    Broadcast { except: Option<ConnectionId> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingPacket {
    pub recipient: Recipient,
    pub payload: Box<[u8]>,
    pub delivery: DeliveryMode,
}

/// Messages queued by handlers and local operations, flushed by the
/// transport owner at the end of the tick
#[derive(Default)]
pub struct Outbox {
    packets: VecDeque<OutgoingPacket>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: Recipient, payload: Box<[u8]>, delivery: DeliveryMode) {
        self.packets.push_back(OutgoingPacket {
            recipient,
            payload,
            delivery,
        });
    }

    pub fn send_to_authority(&mut self, payload: Box<[u8]>, delivery: DeliveryMode) {
        self.push(Recipient::Authority, payload, delivery);
    }

    pub fn send_to(&mut self, connection: ConnectionId, payload: Box<[u8]>, delivery: DeliveryMode) {
        self.push(Recipient::Connection(connection), payload, delivery);
    }

    pub fn broadcast(&mut self, except: Option<ConnectionId>, payload: Box<[u8]>, delivery: DeliveryMode) {
        self.push(Recipient::Broadcast { except }, payload, delivery);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = OutgoingPacket> + '_ {
        self.packets.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutgoingPacket> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
