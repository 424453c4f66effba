// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::message::{Performative, GENERIC_MESSAGE};
use crate::protocol::{spawn_link, StreamConnector};
use crate::testing::MockContainer;
use std::time::Duration;

async fn connect(container: &MockContainer) -> Gateway {
    Gateway::connect(&container.connector(), GatewayConfig::default())
        .await
        .expect("connect")
}

#[tokio::test]
async fn test_agent_id_uses_prefix() {
    let container = MockContainer::new();
    let mut config = GatewayConfig::default();
    config.agent_id_prefix = "UnitGW".into();
    let gw = Gateway::connect(&container.connector(), config)
        .await
        .expect("connect");

    assert!(gw.agent_id().as_str().starts_with("UnitGW-"));
    assert!(gw.is_subscribed(gw.agent_id()));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_connecting() {
    let container = MockContainer::new();
    let config = GatewayConfig::new("", 1100);
    let err = Gateway::connect(&container.connector(), config)
        .await
        .err()
        .expect("must fail");
    assert!(matches!(err, GatewayError::Config(_)));
}

#[tokio::test]
async fn test_container_queries() {
    let container = MockContainer::new();
    container.add_agent("phy");
    container.add_service("org.arl.unet.Services.PHYSICAL", "phy");
    container.add_service("org.arl.unet.Services.DATAGRAM", "phy");
    container.add_service("org.arl.unet.Services.DATAGRAM", "uwlink");
    let gw = connect(&container).await;

    let agents = gw.agents().await.expect("agents");
    assert_eq!(agents, vec![AgentId::new("phy"), AgentId::new("uwlink")]);

    assert!(gw.contains_agent(&AgentId::new("phy")).await.expect("contains"));
    assert!(!gw.contains_agent(&AgentId::new("mac")).await.expect("contains"));

    let services = gw.services().await.expect("services");
    assert_eq!(services.len(), 2);

    assert_eq!(
        gw.agent_for_service("org.arl.unet.Services.PHYSICAL")
            .await
            .expect("agent_for_service"),
        Some(AgentId::new("phy"))
    );
    assert_eq!(
        gw.agent_for_service("org.arl.unet.Services.LINK")
            .await
            .expect("agent_for_service"),
        None
    );
    assert_eq!(
        gw.agents_for_service("org.arl.unet.Services.DATAGRAM")
            .await
            .expect("agents_for_service"),
        vec![AgentId::new("phy"), AgentId::new("uwlink")]
    );
}

#[tokio::test]
async fn test_subscriptions_are_announced() {
    let container = MockContainer::new();
    let gw = connect(&container).await;
    let phy = AgentId::new("phy");

    gw.subscribe_agent(&phy).expect("subscribe");
    gw.subscribe(&AgentId::topic("params")).expect("subscribe");
    assert!(gw.is_subscribed(&AgentId::topic("phy__ntf")));

    // a round trip guarantees the container saw the earlier frames
    gw.agents().await.expect("agents");
    let subs = container.subscriptions();
    assert!(subs.contains(&gw.agent_id().to_string()));
    assert!(subs.contains(&"#phy__ntf".to_string()));
    assert!(subs.contains(&"#params".to_string()));

    gw.unsubscribe_agent(&phy).expect("unsubscribe");
    assert!(!gw.is_subscribed(&phy.notification_topic()));
    gw.agents().await.expect("agents");
    assert!(!container.subscriptions().contains(&"#phy__ntf".to_string()));
}

#[tokio::test]
async fn test_request_reply() {
    let container = MockContainer::new();
    container.add_agent("echo");
    let gw = connect(&container).await;

    let msg = Message::generic(Performative::Request).with_field("payload", "ping");
    let reply = gw
        .request(&AgentId::new("echo"), msg.clone(), Duration::from_secs(1))
        .await
        .expect("request");
    assert_eq!(reply.perf(), Performative::Agree);
    assert_eq!(reply.in_reply_to(), Some(msg.id()));
    assert_eq!(reply.field("payload"), Some(&serde_json::json!("ping")));
}

#[tokio::test]
async fn test_request_to_missing_agent_times_out() {
    let container = MockContainer::new();
    let gw = connect(&container).await;

    let err = gw
        .request(
            &AgentId::new("nobody"),
            Message::generic(Performative::Request),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Timeout));
}

#[tokio::test]
async fn test_unsolicited_messages_reach_receive() {
    let container = MockContainer::new();
    let gw = connect(&container).await;
    gw.agents().await.expect("agents");

    let ntf = Message::new("org.arl.unet.phy.RxFrameNtf", Performative::Inform);
    assert_eq!(container.publish(ntf.clone()), 1);
    container.publish(Message::generic(Performative::Inform));

    let got = gw
        .receive(
            &MessageFilter::class("org.arl.unet.phy.RxFrameNtf"),
            Duration::from_secs(1),
        )
        .await
        .expect("receive");
    assert_eq!(got.map(|m| m.data.msg_id), Some(ntf.data.msg_id));

    let got = gw
        .receive(&MessageFilter::class(GENERIC_MESSAGE), Duration::from_secs(1))
        .await
        .expect("receive");
    assert!(got.is_some());

    let got = gw
        .receive(&MessageFilter::Any, Duration::from_millis(20))
        .await
        .expect("receive");
    assert!(got.is_none());
}

#[tokio::test]
async fn test_gateway_answers_container_queries() {
    let (client, server) = tokio::io::duplex(4096);
    let gw = Gateway::connect(&StreamConnector::new(client), GatewayConfig::default())
        .await
        .expect("connect");
    let (tx, mut rx) = spawn_link(server);

    assert_eq!(rx.recv().await, Some(Frame::Alive(true)));
    assert!(matches!(
        rx.recv().await,
        Some(Frame::Request(RequestFrame::WantsMessagesFor { .. }))
    ));

    tx.send(Frame::Request(RequestFrame::ContainsAgent {
        id: "q1".into(),
        agent_id: gw.agent_id().to_string(),
    }))
    .expect("send");
    assert_eq!(
        rx.recv().await,
        Some(Frame::Response(ResponseFrame::ContainsAgent {
            id: "q1".into(),
            answer: true
        }))
    );

    tx.send(Frame::Request(RequestFrame::Agents { id: "q2".into() }))
        .expect("send");
    assert_eq!(
        rx.recv().await,
        Some(Frame::Response(ResponseFrame::Agents {
            id: "q2".into(),
            agent_ids: vec![gw.agent_id().to_string()]
        }))
    );

    tx.send(Frame::Alive(true)).expect("send");
    assert_eq!(rx.recv().await, Some(Frame::Alive(true)));
}

#[tokio::test]
async fn test_close_fails_pending_and_later_calls() {
    let container = MockContainer::new();
    let gw = connect(&container).await;

    let pending = {
        let gw = gw.clone();
        tokio::spawn(async move {
            gw.request(
                &AgentId::new("nobody"),
                Message::generic(Performative::Request),
                Duration::from_secs(5),
            )
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    gw.close();

    let err = pending.await.expect("join").unwrap_err();
    assert!(matches!(err, GatewayError::Closed));
    assert!(gw.is_closed());
    assert!(matches!(gw.agents().await, Err(GatewayError::Closed)));
    assert!(matches!(
        gw.subscribe(&AgentId::topic("x")),
        Err(GatewayError::Closed)
    ));
}

#[tokio::test]
async fn test_connection_loss_is_a_transport_error() {
    let container = MockContainer::new();
    let gw = connect(&container).await;
    gw.agents().await.expect("agents");

    let pending = {
        let gw = gw.clone();
        tokio::spawn(async move {
            gw.request(
                &AgentId::new("nobody"),
                Message::generic(Performative::Request),
                Duration::from_secs(5),
            )
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    container.disconnect();

    let err = pending.await.expect("join").unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)), "got {err:?}");

    // the receive loop marks the gateway closed once the link is gone
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(gw.is_closed());
    assert!(matches!(gw.agents().await, Err(GatewayError::Closed)));
}

#[tokio::test]
async fn test_close_after_link_loss_releases_the_stream() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (client, mut server) = tokio::io::duplex(4096);
    let gw = Gateway::connect(&StreamConnector::new(client), GatewayConfig::default())
        .await
        .expect("connect");

    server.shutdown().await.expect("shutdown");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(gw.is_closed());

    // the gateway handle is still alive, so only close() can stop the writer
    gw.close();
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(1), server.read_to_end(&mut rest))
        .await
        .expect("stream released")
        .expect("read");
    assert!(String::from_utf8_lossy(&rest).contains("wantsMessagesFor"));
}
