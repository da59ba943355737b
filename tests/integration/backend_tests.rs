//! Integration tests: device link ↔ loopback broker ↔ backend router.

use std::sync::Arc;
use std::time::Duration;

use parkdistance::adapters::log_sink::LogEventSink;
use parkdistance::app::ports::{InboundSource, OutboundPort};
use parkdistance::backend::alarm::AlarmHandler;
use parkdistance::backend::ingest::{IngestHandler, InMemoryRepository};
use parkdistance::backend::{BackendRouter, BackendService};
use parkdistance::config::BackendConfig;
use parkdistance::device::Device;
use parkdistance::device::parameters::keys;
use parkdistance::link::channels::OutboundQueue;
use parkdistance::link::io_task::DeviceLink;
use parkdistance::link::transport::{BrokerClient, LoopbackBroker};

const SEND: &str = "parkdistance/device-1/measurements";
const BROADCAST: &str = "parkdistance/broadcast";

fn measurement(d: f64) -> Vec<u8> {
    format!(r#"{{"command":"MEASUREMENT","data":{{"distance_m":{d},"datetime_iso":"2024-05-01T17:03:12.000000"}}}}"#)
        .into_bytes()
}

fn backend(broker: &LoopbackBroker, on: u32, off: u32) -> (BackendService<BrokerClient>, InMemoryRepository) {
    let config = BackendConfig {
        alarm_on_count: on,
        alarm_off_count: off,
        ..BackendConfig::default()
    };
    let repo = InMemoryRepository::new();
    let mut router = BackendRouter::new();
    router.add_handler(IngestHandler::new(repo.clone()));
    router.add_handler(AlarmHandler::new(&config, broker.connect("backend-broadcast")));

    let mut inbound = broker.connect("backend");
    inbound.subscribe(&config.topic_ingest);
    (BackendService::new(inbound, router), repo)
}

#[test]
fn thirty_measurements_raise_the_alarm_ten_more_clear_it() {
    let broker = LoopbackBroker::new();
    let (mut service, repo) = backend(&broker, 30, 10);
    let mut device = broker.connect("device-1");
    device.subscribe(BROADCAST);

    let mut broadcasts = Vec::new();
    for i in 0..40 {
        device.publish(SEND, &measurement(0.5)).unwrap();
        assert!(service.poll_once());
        if let Some(msg) = device.poll(Duration::ZERO) {
            broadcasts.push((i + 1, String::from_utf8(msg.payload).unwrap()));
        }
    }

    assert_eq!(
        broadcasts,
        vec![
            (30, r#"{"command":"ALARM_ON"}"#.to_string()),
            (40, r#"{"command":"ALARM_OFF"}"#.to_string()),
        ]
    );
    assert_eq!(repo.len(), 40);
    let (_, doc) = &repo.documents()[0];
    assert_eq!(doc.device, SEND);
    assert_eq!(doc.data["distance_m"], 0.5);
}

#[test]
fn malformed_messages_are_not_counted() {
    let broker = LoopbackBroker::new();
    let (mut service, repo) = backend(&broker, 2, 2);
    let mut device = broker.connect("device-1");
    device.subscribe(BROADCAST);

    device.publish(SEND, b"garbage").unwrap();
    device.publish(SEND, &measurement(0.4)).unwrap();
    service.poll_once();
    service.poll_once();
    assert!(device.poll(Duration::ZERO).is_none());
    assert_eq!(repo.len(), 1);

    device.publish(SEND, br#"{"command":"HELLO"}"#).unwrap();
    service.poll_once();
    assert!(device.poll(Duration::ZERO).is_some(), "any valid message counts");
    assert_eq!(repo.len(), 1, "only measurements are stored");
}

#[test]
fn broadcast_reaches_device_parameters_through_the_link() {
    let broker = LoopbackBroker::new();
    let (mut service, _repo) = backend(&broker, 1, 5);

    let device = Arc::new(Device::new(4));
    device.parameters().set(keys::SILENT, true);
    let mut client = broker.connect("device-1");
    client.subscribe(BROADCAST);
    let mut queue = OutboundQueue::new();
    let mut link = DeviceLink::new(client, queue.clone(), Arc::clone(&device), LogEventSink)
        .with_poll_interval(Duration::from_millis(5));

    queue.publish(SEND, &measurement(0.2)).unwrap();
    link.flush();
    assert!(service.poll_once());
    link.pump();

    assert!(device.parameters().get_bool(keys::ALARM, false));
    assert!(!device.parameters().get_bool(keys::SILENT, true));
}
