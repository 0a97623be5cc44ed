//! Integration tests for the record/replay cycle
//!
//! Record against a scripted device, then replay the log with no device
//! behind the port at all.

use super::common::{lines, TrafficDir};
use reserial::{run, MockPort, Mode, PortError, ReserialConfig, SerialPort, Session, SessionError};

/// Recording writes one line per test
#[test]
fn test_record_writes_binary_entry() {
    let traffic = TrafficDir::new();
    let device = MockPort::new("/dev/ttyUSB0").with_rx(&[0x01]);

    let session = Session::begin(&traffic.record(), traffic.id("test_name")).unwrap();
    assert_eq!(session.mode(), Mode::Record);
    let mut port = session.attach(device.clone()).unwrap();
    port.open().unwrap();
    port.write(&[0x02]).unwrap();
    assert_eq!(port.bytes_available().unwrap(), 1);
    assert_eq!(port.read(1).unwrap(), vec![0x01]);
    drop(port);
    session.finish().unwrap();

    assert_eq!(device.written(), vec![0x02]);
    assert_eq!(
        traffic.read_log(),
        "{\"test_name\": {\"rx\": \"AQ==\", \"tx\": \"Ag==\"}}\n"
    );
}

/// A recording replays without the device, and can be replayed repeatedly
#[test]
fn test_recording_replays_twice() {
    let traffic = TrafficDir::new();
    let device = MockPort::new("/dev/ttyUSB0").with_rx(&[0x01]);

    run(&traffic.record(), traffic.id("test_name"), |session| {
        let mut port = session.attach(device.clone()).unwrap();
        port.open().unwrap();
        port.write(&[0x02]).unwrap();
        port.read(1).unwrap();
    })
    .unwrap();
    let recorded = traffic.read_log();

    for _ in 0..2 {
        let read = run(&traffic.replay(), traffic.id("test_name"), |session| {
            let mut port = session
                .attach(MockPort::new("/dev/ttyUSB0").failing_writes())
                .unwrap();
            port.open().unwrap();
            port.write(&[0x02]).unwrap();
            assert_eq!(port.bytes_available().unwrap(), 1);
            port.read(1).unwrap()
        })
        .unwrap();
        assert_eq!(read, vec![0x01]);
    }

    assert_eq!(traffic.read_log(), recorded, "Replay must not modify the log");
}

/// Unconsumed recorded traffic fails the test at teardown
#[test]
fn test_incomplete_replay_reports_leftovers() {
    let traffic = TrafficDir::with_recordings();

    let session = Session::begin(&traffic.replay(), traffic.id("test_reserial")).unwrap();
    let mut port = session.attach(MockPort::new("/dev/ttyUSB0")).unwrap();
    port.open().unwrap();
    port.write(&[0x02]).unwrap();

    let err = session.finish().unwrap_err();
    assert!(matches!(err, SessionError::IncompleteReplay { rx: 1, tx: 0 }));
    let message = err.to_string();
    assert!(message.contains("Remaining RX: 1"), "{message}");
    assert!(message.contains("Remaining TX: 0"), "{message}");
}

/// Setting both record and disable is rejected before anything is intercepted
#[test]
fn test_record_and_disable_is_invalid() {
    let traffic = TrafficDir::new();
    let config = ReserialConfig::record()
        .with_disable(true)
        .with_log_dir(&traffic.path);

    let err = Session::begin(&config, traffic.id("test_name")).err().unwrap();
    assert!(matches!(err, SessionError::InvalidMode));
    assert!(err.is_setup_error());
    assert_eq!(
        err.to_string(),
        "Choose one of 'record' or 'disable', not both"
    );
    assert!(!traffic.log_path().exists());
}

/// Text traffic is stored literally, binary traffic as base64
#[test]
fn test_text_and_binary_encodings() {
    let traffic = TrafficDir::new();

    let text = MockPort::new("/dev/ttyUSB0").with_rx(b"Hello World!\n");
    run(&traffic.record(), traffic.id("test_text"), |session| {
        let mut port = session.attach(text.clone()).unwrap();
        port.open().unwrap();
        assert_eq!(port.read(13).unwrap(), b"Hello World!\n".to_vec());
    })
    .unwrap();

    let binary = MockPort::new("/dev/ttyUSB0").with_rx(b"\xfe");
    run(&traffic.record(), traffic.id("test_binary"), |session| {
        let mut port = session.attach(binary.clone()).unwrap();
        port.open().unwrap();
        assert_eq!(port.read(1).unwrap(), vec![0xfe]);
    })
    .unwrap();

    let contents = traffic.read_log();
    assert_eq!(
        lines(&contents),
        vec![
            r#"{"test_text": {"rx": "Hello World!\n", "tx": "", "rx_encoding": "utf-8"}}"#,
            r#"{"test_binary": {"rx": "/g==", "tx": ""}}"#,
        ]
    );
}

/// Writes that diverge from the recording fail immediately
#[test]
fn test_replay_detects_divergent_write() {
    let traffic = TrafficDir::with_recordings();

    let session = Session::begin(&traffic.replay(), traffic.id("test_reserial")).unwrap();
    let mut port = session.attach(MockPort::new("/dev/ttyUSB0")).unwrap();
    port.open().unwrap();

    let err = port.write(&[0x03]).unwrap_err();
    match err {
        PortError::TrafficMismatch { written, expected } => {
            assert_eq!(written, vec![0x03]);
            assert_eq!(expected, vec![0x02]);
        }
        other => panic!("Expected a traffic mismatch, got {other:?}"),
    }

    // The recording is untouched, so the recorded write is still accepted...
    port.write(&[0x02]).unwrap();
    assert_eq!(port.read(1).unwrap(), vec![0x01]);

    // ...but the divergence still fails the test.
    let err = session.finish().unwrap_err();
    assert!(matches!(
        err,
        SessionError::TrafficMismatch { ref written, ref expected }
            if written == &[0x03] && expected == &[0x02]
    ));
    assert!(!err.is_setup_error());
}

/// A swallowed mismatch fails the test even when every byte is replayed
#[test]
fn test_swallowed_mismatch_fails_run() {
    let traffic = TrafficDir::with_recordings();

    let result = run(&traffic.replay(), traffic.id("test_reserial2"), |session| {
        let mut port = session.attach(MockPort::new("/dev/ttyUSB0")).unwrap();
        port.open().unwrap();
        if port.write(&[0x01]).is_err() {
            port.write(&[0x02]).unwrap();
        }
        port.read(1).unwrap()
    });

    let err = result.unwrap_err();
    assert!(matches!(err, SessionError::TrafficMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "Written data does not match recorded data: b\"\\x01\" != b\"\\x02\""
    );
}

/// Ports attached to one session share a single traffic stream
#[test]
fn test_ports_share_one_recording() {
    let traffic = TrafficDir::new();
    let first = MockPort::new("/dev/ttyUSB0").with_rx(b"A");
    let second = MockPort::new("/dev/ttyUSB1").with_rx(b"B");

    run(&traffic.record(), traffic.id("test_two_ports"), |session| {
        let mut a = session.attach(first.clone()).unwrap();
        let mut b = session.attach(second.clone()).unwrap();
        a.open().unwrap();
        b.open().unwrap();
        a.write(b"1").unwrap();
        b.write(b"2").unwrap();
        assert_eq!(b.read(1).unwrap(), b"B".to_vec());
        assert_eq!(a.read(1).unwrap(), b"A".to_vec());
    })
    .unwrap();

    let replayed = run(&traffic.replay(), traffic.id("test_two_ports"), |session| {
        let mut port = session.attach(MockPort::new("/dev/ttyUSB0")).unwrap();
        port.open().unwrap();
        port.write(b"12").unwrap();
        port.read(2).unwrap()
    })
    .unwrap();
    assert_eq!(replayed, b"BA".to_vec());
}

/// Replayed ports never touch the device, even for settings changes
#[test]
fn test_replay_ignores_device() {
    let traffic = TrafficDir::with_recordings();
    let device = MockPort::new("/dev/ttyUSB0").with_rx(b"\x09");

    run(&traffic.replay(), traffic.id("test_reserial2"), |session| {
        let mut port = session.attach(device.clone()).unwrap();
        port.open().unwrap();
        port.settings_mut().baud_rate = 115_200;
        port.reconfigure(true).unwrap();
        port.reset_input_buffer().unwrap();
        port.write(&[0x02]).unwrap();
        assert_eq!(port.read(1).unwrap(), vec![0x01]);
    })
    .unwrap();

    assert!(!device.is_open());
    assert!(device.written().is_empty());
    assert_eq!(device.reconfigure_count(), 0);
    assert_eq!(device.input_reset_count(), 0);
}

/// Passthrough talks to the device and records nothing
#[test]
fn test_passthrough_leaves_logs_alone() {
    let traffic = TrafficDir::with_recordings();
    let device = MockPort::new("/dev/ttyUSB0").with_rx(b"OK");

    run(&traffic.passthrough(), traffic.id("test_reserial"), |session| {
        let mut port = session.attach(device.clone()).unwrap();
        port.open().unwrap();
        port.write(b"AT").unwrap();
        assert_eq!(port.read(2).unwrap(), b"OK".to_vec());
    })
    .unwrap();

    assert_eq!(device.written(), b"AT".to_vec());
    assert_eq!(traffic.read_log(), super::common::TEST_JSONL);
}

/// Replaying a test that was never recorded fails during setup
#[test]
fn test_replay_of_unknown_test_fails_setup() {
    let traffic = TrafficDir::with_recordings();
    let err = Session::begin(&traffic.replay(), traffic.id("test_reserial3"))
        .err()
        .unwrap();
    assert!(err.is_setup_error());
    assert!(err.to_string().contains("test_reserial3"), "{err}");
}
