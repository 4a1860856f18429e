use std::collections::HashSet;
use switchboard_core::{ConnectionId, RoomId, ServerEvent, UserId};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{join, joined_announcements, left_announcements, offer, peer, room_peers};

#[tokio::test]
async fn test_full_signaling_cycle() {
    init_tracing();

    let (relay, signaling) = create_test_relay();
    let r1 = RoomId::from("r1");

    let mut a = relay.open(ConnectionId::new()).await;
    let mut b = relay.open(ConnectionId::new()).await;
    let a_id = a.connection_id();
    let b_id = b.connection_id();

    assert!(matches!(
        signaling.events_for(&a_id).await.as_slice(),
        [ServerEvent::Connected { connection_id }] if *connection_id == a_id
    ));

    relay.handle_event(&mut a, join("r1", "u1")).await;
    assert_eq!(room_peers(&signaling.events_for(&a_id).await), Some(vec![]));

    relay.handle_event(&mut b, join("r1", "u2")).await;
    assert_eq!(
        joined_announcements(&signaling.events_for(&a_id).await),
        vec![(b_id, UserId::from("u2"))]
    );
    assert_eq!(
        room_peers(&signaling.events_for(&b_id).await),
        Some(vec![peer(a_id, "u1")])
    );

    relay.handle_event(&mut a, offer(b_id, r#""D""#)).await;
    let delivered = signaling.events_for(&b_id).await;
    match delivered.last() {
        Some(ServerEvent::SignalOffer { from, description }) => {
            assert_eq!(*from, a_id);
            assert_eq!(description.get(), r#""D""#);
        }
        other => panic!("expected signal-offer, got {:?}", other),
    }

    relay.close(&mut b).await;
    assert!(b.is_closed());
    assert_eq!(
        left_announcements(&signaling.events_for(&a_id).await),
        vec![(b_id, UserId::from("u2"))]
    );
    assert_eq!(relay.registry().peers_of(&r1), HashSet::from([a_id]));

    relay.close(&mut a).await;
    assert!(!relay.registry().contains_room(&r1));
    assert_eq!(relay.registry().member_count(), 0);
}

#[tokio::test]
async fn test_third_peer_sees_both_existing_members() {
    init_tracing();

    let (relay, signaling) = create_test_relay();

    let mut a = relay.open(ConnectionId::new()).await;
    let mut b = relay.open(ConnectionId::new()).await;
    let mut c = relay.open(ConnectionId::new()).await;

    relay.handle_event(&mut a, join("r1", "u1")).await;
    relay.handle_event(&mut b, join("r1", "u2")).await;
    relay.handle_event(&mut c, join("r1", "u3")).await;

    let mut expected = vec![peer(a.connection_id(), "u1"), peer(b.connection_id(), "u2")];
    expected.sort_by_key(|p| p.connection_id);
    assert_eq!(
        room_peers(&signaling.events_for(&c.connection_id()).await),
        Some(expected)
    );

    for member in [&a, &b] {
        let announced = joined_announcements(&signaling.events_for(&member.connection_id()).await);
        assert!(announced.contains(&(c.connection_id(), UserId::from("u3"))));
    }
    assert!(joined_announcements(&signaling.events_for(&c.connection_id()).await).is_empty());
}
