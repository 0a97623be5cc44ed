//! Integration tests for log file maintenance
//!
//! Re-recording updates entries in place, and legacy logs convert to the
//! JSON Lines format the store reads.

use super::common::{lines, TrafficDir, TEST_JSONL};
use reserial::log::{migrate, SaveOutcome};
use reserial::{run, LogStore, MockPort, SerialPort, TrafficLog};

/// Re-recording a test rewrites its line and leaves the others byte-identical
#[test]
fn test_rerecord_updates_in_place() {
    let traffic = TrafficDir::with_recordings();
    let device = MockPort::new("/dev/ttyUSB0").with_rx(b"OK\r\n");

    run(&traffic.record(), traffic.id("test_reserial"), |session| {
        let mut port = session.attach(device.clone()).unwrap();
        port.open().unwrap();
        port.write(b"AT\r\n").unwrap();
        port.read(4).unwrap();
    })
    .unwrap();

    let contents = traffic.read_log();
    let original = lines(TEST_JSONL);
    assert_eq!(
        lines(&contents),
        vec![
            r#"{"test_reserial": {"rx": "OK\r\n", "tx": "AT\r\n", "rx_encoding": "utf-8", "tx_encoding": "utf-8"}}"#,
            original[1],
        ]
    );
}

/// New tests are appended after the existing ones
#[test]
fn test_new_recording_is_appended() {
    let traffic = TrafficDir::with_recordings();
    let store = LogStore::new(traffic.log_path());

    let outcome = store
        .save("test_reserial3", &TrafficLog::from_parts(vec![0x01], vec![]))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Appended);
    assert_eq!(
        store.list().unwrap(),
        vec!["test_reserial", "test_reserial2", "test_reserial3"]
    );
    assert!(traffic.read_log().starts_with(TEST_JSONL));
}

/// Hand-edited files keep their formatting for untouched lines
#[test]
fn test_foreign_formatting_is_preserved() {
    let traffic = TrafficDir::new();
    let other = r#"{"test_other":{"tx":"","rx":"AQ=="}}"#;
    traffic.write_log(&format!("{other}\n\n{{\"test_reserial\": {{\"rx\": \"\", \"tx\": \"\"}}}}"));
    let store = LogStore::new(traffic.log_path());

    let outcome = store
        .save("test_reserial", &TrafficLog::from_parts(vec![0xfe], vec![]))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Replaced);
    assert_eq!(
        traffic.read_log(),
        format!("{other}\n\n{{\"test_reserial\": {{\"rx\": \"/g==\", \"tx\": \"\"}}}}\n")
    );
}

/// Legacy logs convert to one line per test, readable by the store
#[test]
fn test_migrated_log_replays() {
    let traffic = TrafficDir::new();
    let legacy = traffic.write_file(
        "device_tests.json",
        r#"{"test_reserial": {"rx": [1], "tx": [2]}, "test_banner": {"rx": [72, 105, 10], "tx": []}}"#,
    );

    let output = migrate::default_output_path(&legacy);
    assert_eq!(output, traffic.log_path());
    assert_eq!(migrate::convert_legacy(&legacy, &output).unwrap(), 2);

    assert_eq!(
        lines(&traffic.read_log()),
        vec![
            r#"{"test_reserial": {"rx": "AQ==", "tx": "Ag=="}}"#,
            r#"{"test_banner": {"rx": "Hi\n", "tx": "", "rx_encoding": "utf-8"}}"#,
        ]
    );

    let read = run(&traffic.replay(), traffic.id("test_reserial"), |session| {
        let mut port = session.attach(MockPort::new("/dev/ttyUSB0")).unwrap();
        port.open().unwrap();
        port.write(&[0x02]).unwrap();
        port.read(1).unwrap()
    })
    .unwrap();
    assert_eq!(read, vec![0x01]);
}

/// Legacy values that are not bytes are rejected
#[test]
fn test_migration_rejects_out_of_range_values() {
    let traffic = TrafficDir::new();
    let legacy = traffic.write_file("bad.json", r#"{"test_reserial": {"rx": [256], "tx": []}}"#);

    let err = migrate::convert_legacy(&legacy, &traffic.path.join("bad.jsonl")).unwrap_err();
    assert!(matches!(
        err,
        migrate::MigrateError::ByteOutOfRange { value: 256, field: "rx", .. }
    ));
}
