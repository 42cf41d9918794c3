//! End-to-end behaviour of the AMQP transport behind a `Logger`.

use std::sync::Arc;
use std::time::Duration;

use amqp_log_transport::test_utils::MockBroker;
use amqp_log_transport::{
    AmqpTransport, AmqpTransportBuilder, HandlerBuildError, HandlerBuilderTrait, Level, LinkStatus,
    LogSink, Logger, amqp_transport::deserialise_envelope,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn broker() -> MockBroker {
    MockBroker::new()
}

fn transport_for(broker: &MockBroker) -> Arc<AmqpTransport> {
    let transport = AmqpTransportBuilder::new()
        .with_connection(broker.connection())
        .with_level("info")
        .build_inner()
        .expect("build transport");
    Arc::new(transport)
}

async fn settle(transport: &AmqpTransport) -> LinkStatus {
    tokio::time::timeout(Duration::from_secs(2), transport.wait_settled())
        .await
        .expect("establishment should settle")
}

#[rstest]
fn missing_connection_fails_at_construction() {
    let err = AmqpTransportBuilder::new()
        .without_url()
        .build_inner()
        .expect_err("construction must fail");
    assert!(matches!(err, HandlerBuildError::InvalidConfig(_)));
    assert!(err.to_string().to_lowercase().contains("amqp connection"));
}

#[rstest]
#[tokio::test]
async fn logger_filters_before_buffering(broker: MockBroker) {
    broker.hold_channel();
    let transport = transport_for(&broker);
    let logger = Logger::new();
    logger.add_sink(transport.clone());

    assert_eq!(logger.log(Level::Debug, "too chatty", None), 0);
    assert_eq!(logger.log(Level::Info, "kept", Some(json!({"step": 1}))), 1);

    let pending = transport.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message, "kept");
    assert_eq!(pending[0].name, "amqp-transport");
}

#[rstest]
#[tokio::test]
async fn buffered_then_direct_records_all_arrive(broker: MockBroker) {
    broker.hold_channel();
    let transport = transport_for(&broker);
    let logger = Logger::new();
    logger.add_sink(transport.clone());

    logger.log(Level::Error, "before-1", None);
    logger.log(Level::Warn, "before-2", None);
    broker.release_channel();
    assert_eq!(settle(&transport).await, LinkStatus::Ready);

    logger.log(Level::Info, "after", Some(json!({"late": true})));
    tokio::time::timeout(Duration::from_secs(2), broker.wait_for_published(3))
        .await
        .expect("direct publish should arrive");

    let decoded: Vec<_> = broker
        .published()
        .iter()
        .map(|msg| deserialise_envelope(&msg.payload).expect("decode"))
        .collect();
    let messages: Vec<_> = decoded.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, ["before-1", "before-2", "after"]);
    assert_eq!(decoded[2].meta, Some(json!({"late": true})));
    assert!(broker.published().iter().all(|m| m.exchange == "logs"));
    assert!(
        broker
            .published()
            .iter()
            .all(|m| m.routing_key == "amqp-transport")
    );
}

#[rstest]
fn runtime_can_be_supplied_explicitly(broker: MockBroker) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("runtime");
    let transport = AmqpTransportBuilder::new()
        .with_connection(broker.connection())
        .with_runtime(runtime.handle().clone())
        .build_inner()
        .expect("build outside the runtime");

    let status = runtime.block_on(settle(&transport));
    assert_eq!(status, LinkStatus::Ready);

    transport.log(
        Level::Info,
        "from a plain thread",
        None,
        amqp_log_transport::ignore_ack(),
    );
    runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(2), broker.wait_for_published(1))
            .await
            .expect("publish from outside the runtime");
    });
}
