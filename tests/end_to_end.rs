//! Sender and receiver talking over loopback.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use padlink::capture::{CaptureLoop, LoopState};
use padlink::config::Config;
use padlink::controller::backend::BackendKind;
use padlink::controller::sample::{Button, ControllerSample, ControllerState, Stick};
use padlink::controller::sampler::{Sampler, SamplerSettings};
use padlink::controller::synthetic::SyntheticBackend;
use padlink::receive::ReceiveLoop;
use padlink::transport::{SampleReceiver, SampleSender, SourcePolicy};
use padlink::wire;

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Receive loop that records samples and stops after `wanted` of them.
async fn recording_receiver(
    policy: SourcePolicy,
    wanted: usize,
) -> (
    ReceiveLoop<impl FnMut(ControllerSample)>,
    Arc<Mutex<Vec<ControllerSample>>>,
    CancellationToken,
) {
    let receiver = SampleReceiver::bind(loopback(), policy).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let shutdown = CancellationToken::new();

    let record = Arc::clone(&seen);
    let token = shutdown.clone();
    let consumer = move |sample: ControllerSample| {
        let mut seen = record.lock().unwrap();
        seen.push(sample);
        if seen.len() >= wanted {
            token.cancel();
        }
    };

    (ReceiveLoop::new(receiver, consumer), seen, shutdown)
}

#[tokio::test]
async fn test_synthetic_state_arrives_intact() {
    let (mut receive, seen, receive_shutdown) =
        recording_receiver(SourcePolicy::AcceptAny, 3).await;
    let peer = receive.local_addr().unwrap();

    let backend = SyntheticBackend::default();
    backend.update(|state| {
        state.left_stick = Stick::new(0.5, -0.3);
        state.buttons.set(Button::A, true);
    });
    let sampler = Sampler::start(vec![backend.into_candidate()], SamplerSettings::default()).unwrap();
    let sender = SampleSender::bind(loopback(), peer).await.unwrap();
    let mut capture = CaptureLoop::new(sampler, sender, 60);

    let capture_shutdown = CancellationToken::new();
    let capture_token = capture_shutdown.clone();
    let capture_task = tokio::spawn(async move {
        let stats = capture.run(capture_token).await;
        (stats, capture.state())
    });

    let stats = tokio::time::timeout(Duration::from_secs(5), receive.run(receive_shutdown))
        .await
        .expect("receiver should get three samples");
    capture_shutdown.cancel();
    let (capture_stats, capture_state) = capture_task.await.unwrap();

    assert_eq!(stats.received, 3);
    assert_eq!(stats.decode_errors, 0);
    assert!(capture_stats.sent >= 3);
    assert_eq!(capture_state, LoopState::Stopped);

    let seen = seen.lock().unwrap();
    for sample in seen.iter() {
        assert_eq!(sample.state.left_stick, Stick::new(0.5, -0.3));
        assert_eq!(sample.state.right_stick, Stick::default());
        let pressed: Vec<_> = sample.state.buttons.pressed().collect();
        assert_eq!(pressed, vec![Button::A]);
    }
    // Timestamps come from the sender's clock and increase tick by tick
    assert!(seen.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test]
async fn test_missing_key_is_skipped_and_next_sample_processed() {
    let (mut receive, seen, shutdown) = recording_receiver(SourcePolicy::AcceptAny, 1).await;
    let to = receive.local_addr().unwrap();

    let valid = ControllerSample::new(42.0, ControllerState::neutral());
    let mut broken: serde_json::Value = serde_json::from_slice(&wire::encode(&valid).unwrap()).unwrap();
    broken["controller_data"]["buttons"]
        .as_object_mut()
        .unwrap()
        .remove("guide");

    let sender = UdpSocket::bind(loopback()).await.unwrap();
    sender
        .send_to(&serde_json::to_vec(&broken).unwrap(), to)
        .await
        .unwrap();
    sender.send_to(&wire::encode(&valid).unwrap(), to).await.unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(5), receive.run(shutdown))
        .await
        .expect("valid sample should still be processed");

    assert_eq!(stats.decode_errors, 1);
    assert_eq!(*seen.lock().unwrap(), vec![valid]);
}

#[tokio::test]
async fn test_init_from_config_with_synthetic_backend() {
    let (mut receive, seen, receive_shutdown) =
        recording_receiver(SourcePolicy::AcceptAny, 1).await;
    let peer = receive.local_addr().unwrap();

    let mut config = Config::default();
    config.server.client_ip = peer.ip();
    config.server.client_port = peer.port();
    config.server.bind_ip = peer.ip();
    config.server.server_port = 0;
    config.controller.backends = vec![BackendKind::Synthetic];
    config.validate().unwrap();

    let mut capture = CaptureLoop::init(&config).await.unwrap();
    assert_eq!(capture.sampler().backend_name(), "synthetic");

    let capture_shutdown = CancellationToken::new();
    let capture_token = capture_shutdown.clone();
    let capture_task = tokio::spawn(async move { capture.run(capture_token).await });

    tokio::time::timeout(Duration::from_secs(5), receive.run(receive_shutdown))
        .await
        .unwrap();
    capture_shutdown.cancel();
    capture_task.await.unwrap();

    assert_eq!(seen.lock().unwrap()[0].state, ControllerState::neutral());
}

#[tokio::test]
async fn test_strict_source_accepts_configured_sender() {
    let trusted = UdpSocket::bind(loopback()).await.unwrap();
    let (mut receive, seen, shutdown) =
        recording_receiver(SourcePolicy::Only(trusted.local_addr().unwrap()), 1).await;
    let to = receive.local_addr().unwrap();

    let stranger = UdpSocket::bind(loopback()).await.unwrap();
    let payload = wire::encode(&ControllerSample::new(1.0, ControllerState::neutral())).unwrap();
    stranger.send_to(&payload, to).await.unwrap();
    trusted.send_to(&payload, to).await.unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(5), receive.run(shutdown))
        .await
        .unwrap();

    assert_eq!(stats.rejected, 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
}
