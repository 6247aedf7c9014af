/// Relay sessions: registration, lobby membership, lobby-scoped routing and
/// ownership handshakes through the lobby master.

use std::{cell::RefCell, rc::Rc};

use warden_client::{
    Client, ClientError, ConnectEvent, LobbyJoinedEvent, LobbyLeftEvent, LobbyListEvent,
    MasterAssignedEvent, PeerDisconnectEvent,
};
use warden_relay::{RegisterEvent, RelayConfig, GLOBAL_LOBBY};
use warden_shared::{
    ConnectionId, ControlOutcome, DeliveryMode, EventCode, LobbyId, OwnershipAccessLevel,
    Recipient, Refusal, SpawnInfo,
};
use warden_test::{init_logging, RelaySession};

const FIRST: LobbyId = 1;
const SECOND: LobbyId = 2;
const UPDATE: EventCode = 10_001;
const ORDER: EventCode = 10_002;
const CRATE: u32 = 7;
const AVATAR: u32 = 1;

type Seen = Rc<RefCell<Vec<(ConnectionId, u32)>>>;

fn relay_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.broadcast_events.insert(UPDATE);
    config
}

/// Players 1, 2, 3 in "first" (1 is master), player 4 alone in "second"
fn two_lobbies() -> RelaySession {
    init_logging();
    let mut session = RelaySession::new(relay_config(), 4);
    session.clients[0].create_lobby("first").unwrap();
    session.settle();
    session.clients[1].join_lobby(FIRST).unwrap();
    session.clients[2].join_lobby(FIRST).unwrap();
    session.clients[3].create_lobby("second").unwrap();
    session.settle();
    session
}

fn record(client: &mut Client, event_code: EventCode) -> Seen {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    client
        .register_handler(event_code, move |_, message| {
            let value: u32 = message.read()?;
            sink.borrow_mut().push((message.origin(), value));
            Ok(())
        })
        .unwrap();
    seen
}

#[test]
fn players_register_and_are_accepted() {
    init_logging();
    let mut session = RelaySession::empty(relay_config());
    session.add_client(None);
    session.add_client(None);

    let mut registered = Vec::new();
    let mut accepted = Vec::new();
    for mut tick in session.settle() {
        registered.extend(tick.relay.read::<RegisterEvent>());
        for events in tick.clients.iter_mut() {
            accepted.extend(events.read::<ConnectEvent>());
        }
    }
    registered.sort_unstable();
    accepted.sort_unstable();

    assert_eq!(registered, vec![1, 2]);
    assert_eq!(accepted, vec![1, 2]);
    assert_eq!(session.relay.players().registered(), vec![1, 2]);
    assert!(session.clients[0].is_connected());
    assert!(!session.clients[0].is_master());
}

#[test]
fn lobby_creator_becomes_master_and_joiners_follow_it() {
    let session = two_lobbies();

    assert!(session.clients[0].is_master());
    assert!(!session.clients[1].is_master());
    assert!(session.clients[3].is_master());

    let first = session.relay.lobbies().get(FIRST).unwrap();
    assert_eq!(first.members(), &[1, 2, 3]);
    assert_eq!(first.master(), Some(1));
    for client in &session.clients[..3] {
        let membership = client.lobby().unwrap();
        assert_eq!(membership.lobby, FIRST);
        assert_eq!(membership.name, "first");
        assert_eq!(membership.members, vec![1, 2, 3]);
        assert_eq!(client.session().context().authority_connection(), Some(1));
    }
    assert_eq!(session.clients[3].lobby().unwrap().lobby, SECOND);
}

#[test]
fn join_and_master_events_are_reported() {
    init_logging();
    let mut session = RelaySession::new(relay_config(), 2);
    session.clients[0].create_lobby("first").unwrap();
    session.clients[1].join_lobby(FIRST).unwrap();

    let mut joins = Vec::new();
    let mut masters = Vec::new();
    for mut tick in session.settle() {
        joins.extend(tick.clients[1].read::<LobbyJoinedEvent>());
        masters.extend(tick.clients[1].read::<MasterAssignedEvent>());
    }

    assert_eq!(joins, vec![(FIRST, "first".to_string())]);
    assert_eq!(masters, vec![1]);
}

#[test]
fn broadcast_events_reach_only_the_senders_lobby() {
    let mut session = two_lobbies();
    let seen: Vec<Seen> = session
        .clients
        .iter_mut()
        .map(|client| record(client, UPDATE))
        .collect();

    session.clients[2]
        .send_event(
            Recipient::Broadcast { except: None },
            UPDATE,
            &5_u32,
            DeliveryMode::Reliable,
        )
        .unwrap();
    session.settle();

    assert_eq!(*seen[0].borrow(), vec![(3, 5)]);
    assert_eq!(*seen[1].borrow(), vec![(3, 5)]);
    assert!(seen[2].borrow().is_empty());
    assert!(seen[3].borrow().is_empty());
}

#[test]
fn other_events_from_members_go_to_the_master_only() {
    let mut session = two_lobbies();
    let seen: Vec<Seen> = session
        .clients
        .iter_mut()
        .map(|client| record(client, ORDER))
        .collect();

    session.clients[1]
        .send_event(
            Recipient::Broadcast { except: None },
            ORDER,
            &9_u32,
            DeliveryMode::Reliable,
        )
        .unwrap();
    session.settle();

    assert_eq!(*seen[0].borrow(), vec![(2, 9)]);
    assert!(seen[2].borrow().is_empty());
    assert!(seen[3].borrow().is_empty());
}

#[test]
fn master_events_fan_out_to_its_lobby() {
    let mut session = two_lobbies();
    let seen: Vec<Seen> = session
        .clients
        .iter_mut()
        .map(|client| record(client, ORDER))
        .collect();

    session.clients[0]
        .send_event(
            Recipient::Broadcast { except: None },
            ORDER,
            &1_u32,
            DeliveryMode::Reliable,
        )
        .unwrap();
    session.clients[0]
        .send_event(Recipient::Connection(3), ORDER, &2_u32, DeliveryMode::Reliable)
        .unwrap();
    session.settle();

    assert!(seen[0].borrow().is_empty());
    assert_eq!(*seen[1].borrow(), vec![(1, 1)]);
    assert_eq!(*seen[2].borrow(), vec![(1, 1), (1, 2)]);
    assert!(seen[3].borrow().is_empty());
}

#[test]
fn only_the_master_spawns_and_spawns_stay_in_its_lobby() {
    let mut session = two_lobbies();

    assert_eq!(
        session.clients[1].spawn_entity(CRATE),
        Err(ClientError::NotAuthority)
    );
    let entity = session.clients[0].spawn_entity(CRATE).unwrap();
    session.settle();

    assert!(session.clients[1].session().entity(entity).unwrap().is_passive());
    assert!(session.clients[2].session().entity(entity).unwrap().is_passive());
    assert!(session.clients[3].session().entity(entity).is_none());
    assert_eq!(session.active_holders(entity), vec![1]);
    assert_eq!(session.relay.controller_of(entity), Some(1));
}

#[test]
fn newcomers_receive_the_lobby_entities() {
    let mut session = two_lobbies();
    let entity = session.clients[0].spawn_entity(CRATE).unwrap();
    session.settle();

    let index = session.add_client(None);
    session.settle();
    session.clients[index].join_lobby(FIRST).unwrap();
    session.settle();

    let record = session.clients[index].session().entity(entity).unwrap();
    assert!(record.is_passive());
    assert_eq!(record.prefab(), CRATE);
}

#[test]
fn take_control_goes_through_the_master() {
    let mut session = two_lobbies();
    let entity = session.clients[0].spawn_entity(CRATE).unwrap();
    session.settle();

    assert_eq!(
        session.clients[1].take_control(entity).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![2]);
    assert_eq!(
        session.clients[0].session().directory().controller_of(entity),
        Some(2)
    );
    assert_eq!(session.relay.controller_of(entity), Some(2));

    session.clients[1].release_control(entity).unwrap();
    session.settle();
    assert_eq!(session.active_holders(entity), vec![1]);
    assert_eq!(session.relay.controller_of(entity), Some(1));
}

#[test]
fn consecutive_takes_leave_a_single_holder() {
    let mut session = two_lobbies();
    let entity = session.clients[0].spawn_entity(CRATE).unwrap();
    session.settle();

    session.clients[1].take_control(entity).unwrap();
    session.settle();
    assert_eq!(session.active_holders(entity), vec![2]);

    session.clients[2].take_control(entity).unwrap();
    for _ in 0..8 {
        session.tick();
        assert!(session.active_holders(entity).len() <= 1);
    }

    assert_eq!(session.active_holders(entity), vec![3]);
    assert_eq!(session.relay.controller_of(entity), Some(3));
    for index in 0..3 {
        assert_eq!(
            session.clients[index].session().directory().controller_of(entity),
            Some(3),
            "client {}",
            index
        );
    }
}

#[test]
fn transfer_between_members_goes_through_the_master() {
    let mut session = two_lobbies();
    let entity = session.clients[0].spawn_entity(CRATE).unwrap();
    let avatar = session.clients[0].spawn_player(3, AVATAR).unwrap();
    session.settle();
    session.clients[1].take_control(entity).unwrap();
    session.settle();

    assert_eq!(
        session.clients[1].transfer_control(entity, avatar).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![3]);
    assert_eq!(session.relay.controller_of(entity), Some(3));
    assert_eq!(
        session.clients[0].session().directory().controller_of(entity),
        Some(3)
    );
    assert_eq!(session.clients[0].session().pending_transfer(entity), None);
}

#[test]
fn transfer_only_entities_reach_members_by_transfer() {
    let mut session = two_lobbies();
    let entity = session.clients[0]
        .session_mut()
        .entities_mut()
        .allocate_id();
    session.clients[0]
        .try_spawn(SpawnInfo::new(entity, CRATE, 1).with_access(OwnershipAccessLevel::TransferObject))
        .unwrap();
    let avatar = session.clients[0].spawn_player(2, AVATAR).unwrap();
    session.settle();

    assert_eq!(
        session.clients[1].take_control(entity).unwrap(),
        ControlOutcome::Refused(Refusal::AccessLevel)
    );
    assert_eq!(
        session.clients[0].transfer_control(entity, avatar).unwrap(),
        ControlOutcome::Requested
    );
    session.settle();

    assert_eq!(session.active_holders(entity), vec![2]);
    assert_eq!(
        session.clients[2].session().directory().controller_of(entity),
        Some(2)
    );
}

#[test]
fn directories_track_lobby_membership_and_masters() {
    let mut session = two_lobbies();
    {
        let directory = session.relay.state().directory();
        assert_eq!(directory.lobby_members(FIRST), vec![1, 2, 3]);
        assert_eq!(directory.master_of(FIRST), Some(1));
        assert_eq!(directory.master_of(SECOND), Some(4));
    }
    let directory = session.clients[2].session().directory();
    assert_eq!(directory.lobby_members(FIRST), vec![1, 2, 3]);
    assert!(directory.peer(1).unwrap().is_master());
    assert!(!directory.peer(2).unwrap().is_master());

    session.clients[0].leave_lobby().unwrap();
    session.settle();

    let directory = session.relay.state().directory();
    assert_eq!(directory.lobby_members(FIRST), vec![2, 3]);
    assert_eq!(directory.master_of(FIRST), Some(2));
    assert_eq!(directory.peer(1).unwrap().lobby(), None);
    assert!(!directory.peer(1).unwrap().is_master());
    assert_eq!(session.clients[2].session().directory().master_of(FIRST), Some(2));
}

#[test]
fn listing_returns_every_open_lobby() {
    let mut session = two_lobbies();
    session.clients[3].list_lobbies().unwrap();

    let mut lists = Vec::new();
    for mut tick in session.settle() {
        lists.extend(tick.clients[3].read::<LobbyListEvent>());
    }

    assert_eq!(lists.len(), 1);
    let summaries: Vec<(LobbyId, String, u32)> = lists[0]
        .iter()
        .map(|summary| (summary.lobby, summary.name.clone(), summary.members))
        .collect();
    assert_eq!(
        summaries,
        vec![(FIRST, "first".to_string(), 3), (SECOND, "second".to_string(), 1)]
    );
}

#[test]
fn leaving_a_lobby_is_seen_as_a_departure() {
    let mut session = two_lobbies();
    session.clients[1].leave_lobby().unwrap();

    let mut left = Vec::new();
    let mut departed = Vec::new();
    for mut tick in session.settle() {
        left.extend(tick.clients[1].read::<LobbyLeftEvent>());
        departed.extend(tick.clients[0].read::<PeerDisconnectEvent>());
    }

    assert_eq!(left, vec![FIRST]);
    assert_eq!(departed, vec![2]);
    assert!(session.clients[1].lobby().is_none());
    assert_eq!(session.clients[0].lobby().unwrap().members, vec![1, 3]);
    assert_eq!(session.relay.lobbies().get(FIRST).unwrap().members(), &[1, 3]);
}

#[test]
fn last_member_leaving_closes_the_lobby() {
    let mut session = two_lobbies();
    session.clients[3].leave_lobby().unwrap();
    session.settle();

    assert!(session.relay.lobbies().get(SECOND).is_none());
    assert_eq!(session.relay.lobbies().len(), 1);
}

#[test]
fn without_lobbies_everyone_shares_the_global_lobby() {
    init_logging();
    let config = RelayConfig {
        lobbies_enabled: false,
        ..relay_config()
    };
    let mut session = RelaySession::new(config, 3);

    let global = session.relay.lobbies().get(GLOBAL_LOBBY).unwrap();
    assert_eq!(global.members(), &[1, 2, 3]);
    assert!(session.clients[0].is_master());
    assert_eq!(
        session.clients[1].create_lobby("mine"),
        Err(ClientError::FeatureDisabled { feature: "lobbies" })
    );

    let seen = record(&mut session.clients[2], UPDATE);
    session.clients[1]
        .send_event(
            Recipient::Broadcast { except: None },
            UPDATE,
            &3_u32,
            DeliveryMode::Reliable,
        )
        .unwrap();
    session.settle();
    assert_eq!(*seen.borrow(), vec![(2, 3)]);
}

#[test]
fn lobby_calls_need_relay_mode() {
    init_logging();
    let mut client = Client::new(warden_client::ClientConfig::direct());
    assert!(matches!(
        client.create_lobby("first"),
        Err(ClientError::WrongMode { .. })
    ));
    assert!(matches!(
        client.request_peer_to_peer(2),
        Err(ClientError::WrongMode { .. })
    ));
}
