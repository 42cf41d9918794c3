//! Building transports from INI files.

use std::io::Write;
use std::time::Duration;

use amqp_log_transport::test_utils::MockBroker;
use amqp_log_transport::{
    ConfigFileError, ExchangeKind, ExchangeOptions, HandlerBuilderTrait, Level, LinkStatus, LogSink,
    builder_from_ini_file,
};
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

#[fixture]
fn ini_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(
        file,
        "[transport_amqp]\nname = billing\nlevel = verbose\namqp_url = amqp://mq.internal\n\
         exchange = billing-logs\ndurable = true\nauto_delete = false\nrouting_key = billing"
    )
    .expect("write ini");
    file
}

#[rstest]
#[tokio::test]
async fn file_settings_reach_the_broker(ini_file: NamedTempFile) {
    let broker = MockBroker::new();
    let transport = builder_from_ini_file(ini_file.path(), "transport_amqp")
        .expect("load config")
        .with_connector(broker.connector())
        .build_inner()
        .expect("build transport");

    let status = tokio::time::timeout(Duration::from_secs(2), transport.wait_settled())
        .await
        .expect("settles");
    assert_eq!(status, LinkStatus::Ready);
    assert_eq!(transport.name(), "billing");
    assert_eq!(transport.level(), Level::Verbose);
    assert_eq!(transport.routing_key(), "billing");
    assert_eq!(broker.connect_urls(), vec!["amqp://mq.internal".to_owned()]);

    let declarations = broker.declarations();
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].exchange, "billing-logs");
    assert_eq!(declarations[0].kind, ExchangeKind::Direct);
    assert_eq!(
        declarations[0].options,
        ExchangeOptions {
            durable: true,
            auto_delete: false
        }
    );
}

#[rstest]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = builder_from_ini_file(dir.path().join("absent.ini"), "transport_amqp")
        .expect_err("file does not exist");
    assert!(matches!(err, ConfigFileError::NotFound { .. }));
}
