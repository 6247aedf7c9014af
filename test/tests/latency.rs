use warden_relay::RelayConfig;
use warden_test::{init_logging, DirectSession, RelaySession, TICK};

fn within_a_millisecond(measured: f32, expected: f32) -> bool {
    (measured - expected).abs() < 1.0
}

#[test]
fn direct_session_measures_one_tick_round_trips() {
    init_logging();
    let mut session = DirectSession::new(2);
    assert_eq!(session.clients[0].latency_ms(), 200.0);

    for _ in 0..30 {
        session.tick();
    }

    let tick_ms = TICK.as_secs_f32() * 1000.0;
    for (index, client) in session.clients.iter().enumerate() {
        assert!(
            within_a_millisecond(client.latency_ms(), tick_ms),
            "client {} measured {}",
            index,
            client.latency_ms()
        );
        let connection = session.client_id(index);
        let seen_by_server = session.server.latency_ms(connection).unwrap();
        assert!(
            within_a_millisecond(seen_by_server, tick_ms),
            "server measured {} for {}",
            seen_by_server,
            connection
        );
    }
    assert_eq!(session.server.latency_ms(99), None);
}

#[test]
fn relay_measures_registered_players() {
    init_logging();
    let mut session = RelaySession::new(RelayConfig::default(), 2);
    for _ in 0..30 {
        session.tick();
    }

    let tick_ms = TICK.as_secs_f32() * 1000.0;
    let measured = session.relay.latency_ms(1).unwrap();
    assert!(within_a_millisecond(measured, tick_ms), "relay measured {}", measured);
    assert!(within_a_millisecond(session.clients[1].latency_ms(), tick_ms));
}
