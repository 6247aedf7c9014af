/// End-to-end ownership handshakes between a Server and its clients,
/// exchanging real packets through the in-memory hub.

use warden_client::ConnectEvent as ClientConnectEvent;
use warden_server::{ConnectEvent, DisconnectEvent};
use warden_shared::{
    internal_events::TRANSFER_CONTROL, ownership::TransferControl, ConnectionId, ControlOutcome,
    DeliveryMode, EntityId, OutgoingMessage, OwnershipAccessLevel, Recipient, Refusal, SpawnInfo,
};
use warden_test::{init_logging, DirectSession, RecordingPolicy};

const CRATE: u32 = 7;
const AVATAR: u32 = 1;

fn session_with_policies(client_count: usize) -> (DirectSession, RecordingPolicy, Vec<RecordingPolicy>) {
    init_logging();
    let server_policy = RecordingPolicy::new();
    let client_policies: Vec<RecordingPolicy> =
        (0..client_count).map(|_| RecordingPolicy::new()).collect();
    let session = DirectSession::with_policies(
        server_policy.boxed(),
        client_policies.iter().map(RecordingPolicy::boxed).collect(),
    );
    (session, server_policy, client_policies)
}

#[test]
fn clients_are_accepted_with_their_connection_ids() {
    init_logging();
    let mut session = DirectSession::new(0);
    session.clients.push(warden_client::Client::new(warden_client::ClientConfig::direct()));
    let (connection, socket) = session.hub.connect_client();
    session.clients[0].connect(socket);

    let mut server_connects = Vec::new();
    let mut client_connects = Vec::new();
    for mut tick in session.settle() {
        server_connects.extend(tick.server.read::<ConnectEvent>());
        client_connects.extend(tick.clients[0].read::<ClientConnectEvent>());
    }

    assert_eq!(server_connects, vec![connection]);
    assert_eq!(client_connects, vec![connection]);
    assert!(session.clients[0].is_connected());
    assert_eq!(session.clients[0].connection_id(), Some(connection));
    assert_eq!(session.server.connections(), vec![connection]);
}

#[test]
fn spawned_entities_reach_every_client_passive() {
    let (mut session, server_policy, client_policies) = session_with_policies(2);

    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    for client in &session.clients {
        let record = client.session().entity(entity).expect("entity replicated");
        assert!(record.is_passive());
        assert_eq!(record.prefab(), CRATE);
    }
    assert_eq!(session.active_holders(entity), vec![0]);
    assert_eq!(server_policy.log().spawned, vec![entity]);
    assert_eq!(client_policies[1].log().spawned, vec![entity]);
}

#[test]
fn take_control_moves_authority_and_fires_on_take_once() {
    let (mut session, server_policy, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    let outcome = session.clients[0].take_control(entity).unwrap();
    assert_eq!(outcome, ControlOutcome::Requested);
    session.settle();

    assert_eq!(session.active_holders(entity), vec![session.client_id(0)]);
    assert_eq!(client_policies[0].log().times_taken(entity), 1);
    assert_eq!(client_policies[1].log().times_taken(entity), 0);
    assert_eq!(server_policy.log().times_released(entity), 1);
    assert_eq!(
        server_policy.log().take_requests,
        vec![(entity, session.client_id(0))]
    );
    assert_eq!(
        session.server.session().directory().controller_of(entity),
        Some(session.client_id(0))
    );
    // the other client learns who holds it
    assert_eq!(
        session.clients[1].session().directory().controller_of(entity),
        Some(session.client_id(0))
    );
}

#[test]
fn second_take_from_the_holder_is_refused_locally() {
    let (mut session, _, client_policies) = session_with_policies(1);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    session.clients[0].take_control(entity).unwrap();
    session.settle();
    let outcome = session.clients[0].take_control(entity).unwrap();
    session.settle();

    assert_eq!(outcome, ControlOutcome::Refused(Refusal::AlreadyActive));
    assert_eq!(client_policies[0].log().times_taken(entity), 1);
}

#[test]
fn release_hands_the_entity_back_to_the_server() {
    let (mut session, server_policy, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    let outcome = session.clients[0].release_control(entity).unwrap();
    assert_eq!(outcome, ControlOutcome::Requested);
    // still Active until the confirmation arrives
    assert_eq!(session.active_holders(entity), vec![session.client_id(0)]);
    session.settle();

    assert_eq!(session.active_holders(entity), vec![0]);
    assert_eq!(client_policies[0].log().times_released(entity), 1);
    assert_eq!(server_policy.log().times_taken(entity), 1);
    assert_eq!(session.server.session().directory().controller_of(entity), None);
}

#[test]
fn release_by_a_passive_client_is_refused() {
    let (mut session, _, _) = session_with_policies(1);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    assert_eq!(
        session.clients[0].release_control(entity).unwrap(),
        ControlOutcome::Refused(Refusal::NotActive)
    );
}

#[test]
fn transfer_hands_the_entity_to_the_target_players_owner() {
    let (mut session, _, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    let target = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    let outcome = session.clients[0].transfer_control(entity, target).unwrap();
    assert_eq!(outcome, ControlOutcome::Requested);
    // the sender drops to Passive right away
    assert!(session.active_holders(entity).is_empty());
    session.settle();

    assert_eq!(session.active_holders(entity), vec![session.client_id(1)]);
    assert_eq!(client_policies[0].log().times_released(entity), 1);
    assert_eq!(client_policies[1].log().times_taken(entity), 1);
    assert_eq!(
        session.server.session().directory().controller_of(entity),
        Some(session.client_id(1))
    );
}

#[test]
fn transfer_to_a_non_player_entity_is_refused() {
    let (mut session, _, _) = session_with_policies(1);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    let other = session.server.spawn_entity(CRATE).unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    assert_eq!(
        session.clients[0].transfer_control(entity, other).unwrap(),
        ControlOutcome::Refused(Refusal::TargetNotPlayer)
    );
    assert_eq!(session.active_holders(entity), vec![session.client_id(0)]);
}

#[test]
fn player_entities_never_change_authority() {
    let (mut session, _, _) = session_with_policies(2);
    let avatar = session
        .server
        .spawn_player(session.client_id(0), AVATAR)
        .unwrap();
    let other = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    session.settle();

    assert_eq!(session.active_holders(avatar), vec![session.client_id(0)]);
    assert_eq!(
        session.clients[1].take_control(avatar).unwrap(),
        ControlOutcome::Refused(Refusal::PlayerEntity)
    );
    assert_eq!(
        session.clients[0].release_control(avatar).unwrap(),
        ControlOutcome::Refused(Refusal::PlayerEntity)
    );
    assert_eq!(
        session.clients[0].transfer_control(avatar, other).unwrap(),
        ControlOutcome::Refused(Refusal::PlayerEntity)
    );
    assert_eq!(
        session.server.take_control(avatar).unwrap(),
        ControlOutcome::Refused(Refusal::PlayerEntity)
    );
    session.settle();
    assert_eq!(session.active_holders(avatar), vec![session.client_id(0)]);
}

#[test]
fn server_only_entities_refuse_client_takes() {
    let (mut session, _, _) = session_with_policies(1);
    let entity = session.server.session_mut().entities_mut().allocate_id();
    session
        .server
        .try_spawn(SpawnInfo::new(entity, CRATE, 0).with_access(OwnershipAccessLevel::ServerOnly))
        .unwrap();
    session.settle();

    assert_eq!(
        session.clients[0].take_control(entity).unwrap(),
        ControlOutcome::Refused(Refusal::AccessLevel)
    );
    assert_eq!(session.active_holders(entity), vec![0]);
}

#[test]
fn refused_take_leaves_the_server_in_control() {
    let (mut session, server_policy, client_policies) = session_with_policies(1);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    server_policy.refuse_takes_of(entity);
    session.settle();

    assert_eq!(
        session.clients[0].take_control(entity).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![0]);
    assert_eq!(client_policies[0].log().times_taken(entity), 0);
    assert_eq!(server_policy.log().times_released(entity), 0);
}

#[test]
fn server_take_back_makes_the_holder_passive() {
    let (mut session, _, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    assert_eq!(
        session.server.take_control(entity).unwrap(),
        ControlOutcome::Completed
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![0]);
    assert_eq!(client_policies[0].log().times_released(entity), 1);
}

#[test]
fn at_most_one_holder_while_control_moves_around() {
    let (mut session, _, _) = session_with_policies(3);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    for round in 0..6 {
        let index = round % 3;
        let _ = session.clients[index].take_control(entity).unwrap();
        for _ in 0..8 {
            session.tick();
            assert!(session.active_holders(entity).len() <= 1);
        }
        assert_eq!(session.active_holders(entity), vec![session.client_id(index)]);
    }
}

#[test]
fn disconnect_reclaims_everything_the_client_held() {
    let (mut session, server_policy, _) = session_with_policies(2);
    let first = session.server.spawn_entity(CRATE).unwrap();
    let second = session.server.spawn_entity(CRATE).unwrap();
    session.settle();
    session.clients[0].take_control(first).unwrap();
    session.clients[0].take_control(second).unwrap();
    session.settle();
    assert_eq!(session.active_holders(first), vec![session.client_id(0)]);

    session.drop_client(0);
    let mut disconnects = Vec::new();
    for mut tick in session.settle() {
        disconnects.extend(tick.server.read::<DisconnectEvent>());
    }

    assert_eq!(disconnects, vec![(session.client_id(0), vec![first, second])]);
    assert_eq!(session.active_holders(first), vec![0]);
    assert_eq!(session.active_holders(second), vec![0]);
    assert_eq!(server_policy.log().times_taken(first), 1);
    assert_eq!(session.server.connections(), vec![session.client_id(1)]);
    // the remaining client forgets the departed controller
    assert_eq!(
        session.clients[1].session().directory().controller_of(first),
        None
    );
}

#[test]
fn late_joiners_receive_entities_with_their_current_controller() {
    let (mut session, _, _) = session_with_policies(1);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    session
        .clients
        .push(warden_client::Client::new(warden_client::ClientConfig::direct()));
    let (connection, socket) = session.hub.connect_client();
    session.clients[1].connect(socket);
    session.settle();

    let late = &session.clients[1];
    assert_eq!(late.connection_id(), Some(connection));
    assert!(late.session().entity(entity).unwrap().is_passive());
    assert_eq!(
        late.session().directory().controller_of(entity),
        Some(session.client_id(0))
    );
}

#[test]
fn despawn_removes_the_entity_everywhere() {
    let (mut session, _, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    session.server.despawn_entity(entity).unwrap();
    session.settle();

    for client in &session.clients {
        assert!(client.session().entity(entity).is_none());
    }
    assert_eq!(client_policies[0].log().despawned, vec![entity]);
}

fn spawn_with_access(session: &mut DirectSession, access: OwnershipAccessLevel) -> EntityId {
    let entity = session.server.session_mut().entities_mut().allocate_id();
    session
        .server
        .try_spawn(SpawnInfo::new(entity, CRATE, 0).with_access(access))
        .unwrap()
}

/// Queues a hand-written TransferControl from a client straight to the server
fn send_raw_transfer(session: &mut DirectSession, index: usize, entity: EntityId, transfer: TransferControl) {
    let payload = OutgoingMessage::object(entity, TRANSFER_CONTROL)
        .write(&transfer)
        .to_bytes();
    session.clients[index]
        .session_mut()
        .outbox_mut()
        .push(Recipient::Authority, payload, DeliveryMode::Reliable);
}

#[test]
fn server_transfer_follows_each_access_level() {
    let (mut session, _, client_policies) = session_with_policies(2);
    let target = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    let receiver: ConnectionId = session.client_id(1);

    let cases = [
        (OwnershipAccessLevel::Full, vec![receiver]),
        (OwnershipAccessLevel::TakeObject, vec![0]),
        (OwnershipAccessLevel::TransferObject, vec![receiver]),
        (OwnershipAccessLevel::ClientOnly, vec![0]),
        (OwnershipAccessLevel::ServerOnly, vec![0]),
    ];
    for (access, expected) in cases {
        let entity = spawn_with_access(&mut session, access);
        session.settle();

        let outcome = session.server.transfer_control(entity, target).unwrap();
        if access.allows_transfer() {
            assert_eq!(outcome, ControlOutcome::Requested, "{:?}", access);
        } else {
            assert_eq!(outcome, ControlOutcome::Refused(Refusal::AccessLevel), "{:?}", access);
        }
        session.settle();

        assert_eq!(session.active_holders(entity), expected, "{:?}", access);
        assert_eq!(session.server.session().pending_transfer(entity), None);
        let taken = usize::from(access.allows_transfer());
        assert_eq!(client_policies[1].log().times_taken(entity), taken, "{:?}", access);
    }
}

#[test]
fn transfer_only_entities_move_between_clients() {
    let (mut session, _, _) = session_with_policies(2);
    let first = session
        .server
        .spawn_player(session.client_id(0), AVATAR)
        .unwrap();
    let second = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    let entity = spawn_with_access(&mut session, OwnershipAccessLevel::TransferObject);
    session.settle();

    assert_eq!(
        session.clients[0].take_control(entity).unwrap(),
        ControlOutcome::Refused(Refusal::AccessLevel)
    );
    session.server.transfer_control(entity, first).unwrap();
    session.settle();
    assert_eq!(session.active_holders(entity), vec![session.client_id(0)]);

    assert_eq!(
        session.clients[0].transfer_control(entity, second).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();
    assert_eq!(session.active_holders(entity), vec![session.client_id(1)]);
    assert_eq!(
        session.server.session().directory().controller_of(entity),
        Some(session.client_id(1))
    );
}

#[test]
fn transfer_refused_by_the_server_policy_returns_to_the_server() {
    let (mut session, server_policy, client_policies) = session_with_policies(1);
    let target = session
        .server
        .spawn_player(session.client_id(0), AVATAR)
        .unwrap();
    let entity = session.server.spawn_entity(CRATE).unwrap();
    server_policy.refuse_takes_of(entity);
    session.settle();

    session.server.transfer_control(entity, target).unwrap();
    assert!(session.active_holders(entity).is_empty());
    session.settle();

    assert_eq!(session.active_holders(entity), vec![0]);
    assert_eq!(client_policies[0].log().times_taken(entity), 0);
    assert_eq!(session.server.session().pending_transfer(entity), None);
}

#[test]
fn transfer_to_a_vanished_player_hands_control_back() {
    let (mut session, _, client_policies) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    let target = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();

    session.server.despawn_entity(target).unwrap();
    assert_eq!(
        session.clients[0].transfer_control(entity, target).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![session.client_id(0)]);
    assert_eq!(client_policies[0].log().times_taken(entity), 2);
    assert_eq!(
        session.server.session().directory().controller_of(entity),
        Some(session.client_id(0))
    );
}

#[test]
fn transfers_from_anyone_but_the_holder_are_ignored() {
    let (mut session, _, _) = session_with_policies(2);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    let target = session
        .server
        .spawn_player(session.client_id(1), AVATAR)
        .unwrap();
    session.settle();
    session.clients[0].take_control(entity).unwrap();
    session.settle();
    let holder = session.client_id(0);
    let intruder = session.client_id(1);

    // claims to speak for the holder
    send_raw_transfer(
        &mut session,
        1,
        entity,
        TransferControl {
            sender: holder,
            target_entity: target,
            target_connection: intruder,
        },
    );
    // speaks for itself without holding the entity
    send_raw_transfer(
        &mut session,
        1,
        entity,
        TransferControl {
            sender: intruder,
            target_entity: target,
            target_connection: intruder,
        },
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![holder]);
    assert_eq!(session.server.session().directory().controller_of(entity), Some(holder));
    assert_eq!(session.server.session().pending_transfer(entity), None);
}

#[test]
fn observers_learn_the_holder_from_the_server_announcement() {
    let (mut session, server_policy, client_policies) = session_with_policies(3);
    let entity = session.server.spawn_entity(CRATE).unwrap();
    session.settle();

    session.clients[0].take_control(entity).unwrap();
    session.settle();
    for index in 1..3 {
        let directory = session.clients[index].session().directory();
        assert_eq!(directory.controller_of(entity), Some(session.client_id(0)));
    }
    assert_eq!(server_policy.log().times_released(entity), 1);

    session.clients[2].take_control(entity).unwrap();
    session.settle();
    assert_eq!(session.active_holders(entity), vec![session.client_id(2)]);
    assert_eq!(client_policies[0].log().times_released(entity), 1);
    assert_eq!(client_policies[1].log().times_released(entity), 0);
    assert_eq!(
        session.clients[1].session().directory().controller_of(entity),
        Some(session.client_id(2))
    );
}
