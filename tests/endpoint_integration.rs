//! End-to-end tests for the message endpoint
//!
//! These tests run the real endpoint on an ephemeral port and drive it with
//! a WebSocket client, checking the echo contract and the pin side effects.

use futures::{SinkExt, Stream, StreamExt};
use pinlink_agent::channel::{CommandProcessor, MessageChannel};
use pinlink_agent::config::{EndpointConfig, PinConfig};
use pinlink_agent::endpoint::{ConnectivityMonitor, EndpointServer};
use pinlink_agent::gpio::{MockPinDriver, PinController, PinState};
use std::sync::Arc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct TestAgent {
    monitor: ConnectivityMonitor,
    driver: MockPinDriver,
    pin: Arc<PinController>,
}

fn test_agent(max_frame_len: usize, configure_idle_bias: bool) -> TestAgent {
    let driver = MockPinDriver::new();
    let pin_config = PinConfig {
        configure_idle_bias,
        ..PinConfig::default()
    };
    let pin = Arc::new(PinController::with_driver(
        pin_config,
        Box::new(driver.clone()),
    ));
    let channel = Arc::new(MessageChannel::new(
        CommandProcessor::new(pin.clone()),
        max_frame_len,
    ));
    let endpoint_config = EndpointConfig {
        bind_address: "127.0.0.1".to_string(),
        bind_port: 0,
        ..EndpointConfig::default()
    };
    let monitor = ConnectivityMonitor::new(EndpointServer::new(endpoint_config, channel));

    TestAgent {
        monitor,
        driver,
        pin,
    }
}

async fn connect(
    monitor: &ConnectivityMonitor,
) -> tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
> {
    let addr = monitor.local_addr().await.expect("endpoint not running");
    let url = format!("ws://{}/ws", addr);
    let (ws, _response) = connect_async(&url).await.expect("connect failed");
    ws
}

async fn expect_text_reply<S>(ws: &mut S, expected: &str)
where
    S: Stream<Item = tokio_tungstenite::tungstenite::Result<Message>> + Unpin,
{
    match ws.next().await {
        Some(Ok(Message::Text(text))) => assert_eq!(text, expected),
        other => panic!("expected text reply {:?}, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_start_stop_ping_round_trip() {
    let agent = test_agent(1024, false);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;

    ws.send(Message::Text("start".into())).await.unwrap();
    expect_text_reply(&mut ws, "start").await;
    assert_eq!(agent.pin.state(), PinState::High);

    ws.send(Message::Text("stop".into())).await.unwrap();
    expect_text_reply(&mut ws, "stop").await;
    assert_eq!(agent.pin.state(), PinState::Low);

    ws.send(Message::Text("ping".into())).await.unwrap();
    expect_text_reply(&mut ws, "ping").await;
    assert_eq!(agent.pin.state(), PinState::Low);

    ws.close(None).await.ok();
    agent.monitor.network_down().await.unwrap();
}

#[tokio::test]
async fn test_oversized_and_empty_frames_draw_no_reply() {
    let agent = test_agent(8, false);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;

    // Over the bound: dropped without reply, connection stays usable
    ws.send(Message::Text("way past the bound".into()))
        .await
        .unwrap();

    // Zero-length: protocol no-op
    ws.send(Message::Text("".into())).await.unwrap();

    // The next reply must belong to the next valid frame
    ws.send(Message::Text("ping".into())).await.unwrap();
    expect_text_reply(&mut ws, "ping").await;

    assert!(agent.driver.writes().is_empty());

    ws.close(None).await.ok();
    agent.monitor.network_down().await.unwrap();
}

#[tokio::test]
async fn test_echo_is_literal_even_for_commands() {
    let agent = test_agent(1024, false);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;

    // Near-misses of the command literals are echoed with no side effect
    for payload in ["Start", "start ", "stopp", "START"] {
        ws.send(Message::Text(payload.into())).await.unwrap();
        expect_text_reply(&mut ws, payload).await;
    }
    assert!(agent.driver.writes().is_empty());

    ws.close(None).await.ok();
    agent.monitor.network_down().await.unwrap();
}

#[tokio::test]
async fn test_idle_bias_profile_reaches_driver() {
    let agent = test_agent(1024, true);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;

    ws.send(Message::Text("start".into())).await.unwrap();
    expect_text_reply(&mut ws, "start").await;
    ws.send(Message::Text("stop".into())).await.unwrap();
    expect_text_reply(&mut ws, "stop").await;

    let writes = agent.driver.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|w| w.bias_configured));

    ws.close(None).await.ok();
    agent.monitor.network_down().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_up_keeps_single_endpoint_serving() {
    let agent = test_agent(1024, false);

    agent.monitor.network_up().await.unwrap();
    let addr = agent.monitor.local_addr().await.unwrap();

    // Second up-signal while connected must not re-register the endpoint
    agent.monitor.network_up().await.unwrap();
    assert_eq!(agent.monitor.local_addr().await, Some(addr));

    let mut ws = connect(&agent.monitor).await;
    ws.send(Message::Text("ping".into())).await.unwrap();
    expect_text_reply(&mut ws, "ping").await;

    ws.close(None).await.ok();
    agent.monitor.network_down().await.unwrap();
}

#[tokio::test]
async fn test_endpoint_refuses_connections_after_down() {
    let agent = test_agent(1024, false);
    agent.monitor.network_up().await.unwrap();
    let addr = agent.monitor.local_addr().await.unwrap();

    agent.monitor.network_down().await.unwrap();
    assert!(!agent.monitor.is_running().await);

    let url = format!("ws://{}/ws", addr);
    assert!(connect_async(&url).await.is_err());
}

#[tokio::test]
async fn test_down_terminates_live_connections() {
    let agent = test_agent(1024, false);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;
    ws.send(Message::Text("ping".into())).await.unwrap();
    expect_text_reply(&mut ws, "ping").await;

    // Teardown with the connection still open must also end its frame loop
    agent.monitor.network_down().await.unwrap();

    // A command on the old socket must neither echo nor move the line
    ws.send(Message::Text("start".into())).await.ok();
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                panic!("echo after teardown: {:?}", text)
            }
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => break,
        }
    }

    assert!(agent.driver.writes().is_empty());
    assert_eq!(agent.pin.state(), PinState::Low);
}

#[tokio::test]
async fn test_pin_state_survives_reconnect_but_not_restart() {
    let agent = test_agent(1024, false);
    agent.monitor.network_up().await.unwrap();

    let mut ws = connect(&agent.monitor).await;
    ws.send(Message::Text("start".into())).await.unwrap();
    expect_text_reply(&mut ws, "start").await;
    ws.close(None).await.ok();

    // Endpoint bounce does not move the line
    agent.monitor.network_down().await.unwrap();
    agent.monitor.network_up().await.unwrap();
    assert_eq!(agent.pin.state(), PinState::High);

    // Controller bring-up resets it low
    agent.pin.probe().await.unwrap();
    assert_eq!(agent.pin.state(), PinState::Low);

    agent.monitor.network_down().await.unwrap();
}
