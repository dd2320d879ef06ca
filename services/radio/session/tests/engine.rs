//! End-to-end tests: a running engine against a simulated device.

use prost::Message;
use radio_schema::proto::{
    from_radio, mesh_packet, to_radio, Data, FromRadio, MeshPacket, NodeInfo, ToRadio, User,
};
use radio_schema::{PortNum, BROADCAST_ADDR};
use radio_session::{
    command_channel, EngineConfig, EngineError, EngineHandle, EngineStats, PacketMeta,
    RadioEngine, ReportEvent, StreamTransport, TransportKind,
};
use radio_wire::{encode_frame, HEADER_SIZE, MAGIC};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Device end of the link
struct Device {
    stream: DuplexStream,
}

impl Device {
    async fn read_message(&mut self) -> ToRadio {
        let mut header = [0u8; HEADER_SIZE];
        self.stream.read_exact(&mut header).await.unwrap();
        assert_eq!(header[..2], MAGIC);
        let len = u16::from_be_bytes([header[2], header[3]]) as usize;
        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).await.unwrap();
        ToRadio::decode(payload.as_slice()).unwrap()
    }

    async fn read_want_config(&mut self) -> u32 {
        match self.read_message().await.payload_variant {
            Some(to_radio::PayloadVariant::WantConfigId(nonce)) => nonce,
            other => panic!("expected want_config, got {:?}", other),
        }
    }

    async fn write(&mut self, variant: from_radio::PayloadVariant) {
        let message = FromRadio {
            id: 0,
            payload_variant: Some(variant),
        };
        let frame = encode_frame(&message.encode_to_vec()).unwrap();
        self.stream.write_all(&frame).await.unwrap();
    }
}

fn start(
    kind: TransportKind,
    setup: impl FnOnce(&mut RadioEngine<StreamTransport<DuplexStream>>),
) -> (
    EngineHandle,
    JoinHandle<Result<EngineStats, EngineError>>,
    Device,
) {
    let (client, device) = tokio::io::duplex(4096);
    let transport = StreamTransport::new(client, kind).with_poll_wait(Duration::from_millis(5));
    let mut engine = RadioEngine::new(transport, EngineConfig::default()).unwrap();
    setup(&mut engine);

    let (handle, commands) = command_channel(8);
    let task = tokio::spawn(engine.run(commands));
    (handle, task, Device { stream: device })
}

fn report_channel() -> (
    impl FnMut(ReportEvent) + Send + 'static,
    mpsc::UnboundedReceiver<ReportEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event: ReportEvent| {
            let _ = tx.send(event);
        },
        rx,
    )
}

#[tokio::test]
async fn test_node_report_over_running_engine() {
    let (handle, task, mut device) = start(TransportKind::Network, |_| {});
    let (handler, mut events) = report_channel();

    let nonce = handle.request_node_report(handler).await.unwrap();
    assert_eq!(device.read_want_config().await, nonce.get());

    device
        .write(from_radio::PayloadVariant::NodeInfo(NodeInfo {
            num: 0xA1,
            user: Some(User {
                long_name: "Ridge Relay".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .await;
    device
        .write(from_radio::PayloadVariant::ConfigCompleteId(nonce.get()))
        .await;

    match events.recv().await.unwrap() {
        ReportEvent::Node(record) => assert_eq!(record.display_name(), "Ridge Relay"),
        other => panic!("expected node, got {:?}", other),
    }
    assert_eq!(events.recv().await.unwrap(), ReportEvent::Done);

    handle.shutdown().await.unwrap();
    let stats = task.await.unwrap().unwrap();
    assert_eq!(stats.frames_in, 2);
    assert_eq!(stats.frames_out, 2);
    assert_eq!(
        device.read_message().await.payload_variant,
        Some(to_radio::PayloadVariant::Disconnect(true))
    );
}

#[tokio::test]
async fn test_reboot_during_report() {
    let (handle, task, mut device) = start(TransportKind::Network, |_| {});
    let (handler, mut events) = report_channel();

    let nonce = handle.request_node_report(handler).await.unwrap();
    device.read_want_config().await;

    device.write(from_radio::PayloadVariant::Rebooted(true)).await;
    assert_eq!(device.read_want_config().await, 69_420);

    // The recovery request completes with the sentinel; the consumer sees
    // it as a stray completion and keeps waiting for its own.
    device
        .write(from_radio::PayloadVariant::ConfigCompleteId(69_420))
        .await;
    assert_eq!(
        events.recv().await.unwrap(),
        ReportEvent::Invalid {
            received: radio_session::Nonce::MINIMAL
        }
    );

    device
        .write(from_radio::PayloadVariant::ConfigCompleteId(nonce.get()))
        .await;
    assert_eq!(events.recv().await.unwrap(), ReportEvent::Done);

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_text_round_trip() {
    let (text_tx, mut texts) = mpsc::unbounded_channel();
    let (handle, task, mut device) = start(TransportKind::Serial, move |engine| {
        engine.set_text_message_handler(move |meta: PacketMeta, text: &str| {
            let _ = text_tx.send((meta.from, text.to_string()));
        });
    });

    let packet_id = handle.send_text("anyone out there?", BROADCAST_ADDR, 0).await.unwrap();
    match device.read_message().await.payload_variant {
        Some(to_radio::PayloadVariant::Packet(packet)) => {
            assert_eq!(packet.id, packet_id);
            assert_eq!(packet.to, BROADCAST_ADDR);
        }
        other => panic!("expected packet, got {:?}", other),
    }

    device
        .write(from_radio::PayloadVariant::Packet(MeshPacket {
            from: 0xBEEF,
            to: BROADCAST_ADDR,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: PortNum::TextMessageApp as i32,
                payload: b"loud and clear".to_vec(),
                ..Default::default()
            })),
            ..Default::default()
        }))
        .await;
    assert_eq!(
        texts.recv().await.unwrap(),
        (0xBEEF, "loud and clear".to_string())
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_manual_heartbeat() {
    let (handle, task, mut device) = start(TransportKind::Serial, |_| {});

    handle.send_heartbeat().await.unwrap();
    assert!(matches!(
        device.read_message().await.payload_variant,
        Some(to_radio::PayloadVariant::Heartbeat(_))
    ));

    handle.shutdown().await.unwrap();
    assert_eq!(task.await.unwrap().unwrap().heartbeats_sent, 1);
}

#[tokio::test]
async fn test_device_hangup_stops_engine() {
    let (handle, task, device) = start(TransportKind::Network, |_| {});
    drop(device);

    let result = task.await.unwrap();
    assert!(matches!(result, Err(EngineError::Transport(_))));
    assert!(matches!(
        handle.send_text("late", BROADCAST_ADDR, 0).await,
        Err(EngineError::Stopped)
    ));
}

#[tokio::test]
async fn test_second_report_rejected_through_handle() {
    let (handle, task, mut device) = start(TransportKind::Network, |_| {});
    let (first, _first_events) = report_channel();
    let (second, _second_events) = report_channel();

    let nonce = handle.request_node_report(first).await.unwrap();
    device.read_want_config().await;

    let err = handle.request_node_report(second).await.unwrap_err();
    assert!(matches!(err, EngineError::SessionOutstanding(n) if n == nonce));

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}
