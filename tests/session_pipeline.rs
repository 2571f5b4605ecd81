//! End-to-end tests: bytes in through a transport, snapshots and views out

use futures::StreamExt;
use std::time::Duration;

use nonvision::protocol::{encode_frame, xor_checksum};
use nonvision::transport::{MemoryTransport, Transport};
use nonvision::{
    Command, DeviceFamily, LinkError, Nonvision, Orientation, RecordKind, Rotation, Session, SessionConfig,
    TelemetryRecord, TrackState,
};

fn tof(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    encode_frame(DeviceFamily::Tof, packet_type, payload).unwrap()
}

fn thermal(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() as u16).to_be_bytes();
    let mut frame = b"FUT1".to_vec();
    frame.push(packet_type);
    frame.extend_from_slice(&length);
    frame.extend_from_slice(payload);
    frame.push(xor_checksum(packet_type, &length, payload));
    frame.extend_from_slice(b"END1");
    frame
}

fn section(section_type: u8, data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![section_type, data.len() as u8];
    bytes.extend_from_slice(data);
    bytes.push(section_type);
    bytes
}

fn distances(mm: u16) -> Vec<u8> {
    (0..64).flat_map(|_| mm.to_be_bytes()).collect()
}

#[tokio::test]
async fn tof_capture_folds_into_snapshots() {
    let mut bundle = section(0xA3, &distances(1500));
    bundle.extend(section(0xA4, &[0, 4, 0, 1]));
    bundle.extend(section(0xA5, &[1, 3, 2, 6, 0, 30]));

    let mut bytes = vec![0xFF, 0x00, b'F', b'U'];
    bytes.extend(tof(0xA6, &[1]));
    bytes.extend(b"noise");
    bytes.extend(tof(0xAF, &bundle));

    let transport = MemoryTransport::from_bytes("capture", bytes);
    let session = Session::start(Box::new(transport), &SessionConfig::default()).unwrap();

    let snapshots: Vec<_> = session.snapshots(Duration::from_millis(10)).collect().await;
    let last = snapshots.last().expect("at least one snapshot");

    assert_eq!(last.in_out.map(|c| (c.entered, c.exited)), Some((4, 1)));
    assert_eq!(last.distances.as_ref().and_then(|g| g.get(7, 7)), Some(1500));
    assert_eq!(last.persons.as_ref().map(Vec::len), Some(1));
    assert_eq!(session.stats().frames, 2);

    session.shutdown(Duration::from_secs(1)).unwrap();
}

#[tokio::test]
async fn live_transport_delivers_in_push_order() {
    let transport = MemoryTransport::new("live").with_idle_delay(Duration::from_millis(1));
    let session = Session::start(Box::new(transport.clone()), &SessionConfig::default()).unwrap();

    for entered in 1..=3u16 {
        let [hi, lo] = entered.to_be_bytes();
        transport.push(tof(0xA4, &[hi, lo, 0, 0]));
    }

    let mut collected = Vec::new();
    for _ in 0..200 {
        collected.extend(session.drain());
        if collected.len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let entered: Vec<u16> = collected
        .iter()
        .filter_map(|r| match r {
            TelemetryRecord::InOut(c) => Some(c.entered),
            _ => None,
        })
        .collect();
    assert_eq!(entered, vec![1, 2, 3]);
    assert!(!session.is_finished());

    assert!(session.send_command(&Command::ViewBackground(true)));
    assert_eq!(transport.written(), tof(0xA2, &[0x01]));

    session.shutdown(Duration::from_secs(1)).unwrap();
}

#[tokio::test]
async fn thermal_replay_from_file() {
    let mut image = Vec::new();
    for i in 0..24 * 32 {
        image.extend((i as f32).to_le_bytes());
    }

    let mut bytes = thermal(0xA2, &image);
    bytes.extend(thermal(0xA5, &[2, 12, 4, 10]));
    bytes.extend(thermal(0xA7, &[1, 2, 3, 8, 9, 1]));
    bytes.extend(thermal(0xA4, &[1]));

    let path = std::env::temp_dir().join(format!("nonvision-replay-{}.bin", std::process::id()));
    std::fs::write(&path, &bytes).unwrap();

    let mut config = SessionConfig::for_family(DeviceFamily::Thermal);
    config.orientation = Orientation::new(Rotation::Deg180, false);
    let session = Nonvision::replay(&path, config).unwrap();

    let snapshot = session.snapshots(Duration::from_millis(10)).fold(None, |_, s| async move { Some(s) }).await;
    let snapshot = snapshot.expect("capture produced a snapshot");
    let view = session.view(&snapshot);

    let image = view.thermal.as_ref().unwrap();
    assert_eq!(image.get(0, 0), Some(767.0));
    assert_eq!(view.people_total, Some(1));
    assert_eq!(view.tracks.len(), 1);
    assert_eq!(view.tracks[0].state, TrackState::OnePerson);
    let bed = view.bed.unwrap();
    assert_eq!((bed.x_lo, bed.y_lo, bed.x_hi, bed.y_hi), (19, 13, 29, 19));

    session.shutdown(Duration::from_secs(1)).unwrap();
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn overflow_keeps_newest_records() {
    let mut bytes = Vec::new();
    for n in 0..50u8 {
        bytes.extend(tof(0xA4, &[0, n, 0, 0]));
    }
    let transport = MemoryTransport::from_bytes("burst", bytes);
    let mut config = SessionConfig::default();
    config.buffer_capacity = Some(10);
    let session = Session::start(Box::new(transport), &config).unwrap();

    for _ in 0..200 {
        if session.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let batch = session.drain();
    assert_eq!(batch.len(), 10);
    match batch.latest(RecordKind::InOut) {
        Some(TelemetryRecord::InOut(count)) => assert_eq!(count.entered, 49),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.stats().evicted, 40);

    session.shutdown(Duration::from_secs(1)).unwrap();
}

struct UnpluggedTransport;

impl Transport for UnpluggedTransport {
    fn name(&self) -> &str {
        "unplugged"
    }

    fn read(&mut self, _buf: &mut [u8]) -> nonvision::Result<usize> {
        Err(LinkError::transport("unplugged", std::io::Error::from(std::io::ErrorKind::BrokenPipe)))
    }

    fn write_all(&mut self, _bytes: &[u8]) -> nonvision::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> nonvision::Result<Box<dyn Transport>> {
        Ok(Box::new(UnpluggedTransport))
    }
}

#[tokio::test]
async fn dead_link_ends_the_snapshot_stream() {
    let config = SessionConfig { idle_timeout_ms: 300, ..SessionConfig::default() };
    let session = Session::start(Box::new(UnpluggedTransport), &config).unwrap();

    let mut snapshots = session.snapshots(Duration::from_millis(10));
    let drained = tokio::time::timeout(Duration::from_secs(3), async {
        while snapshots.next().await.is_some() {}
    })
    .await;

    assert!(drained.is_ok(), "snapshot stream kept running after the link died");
    assert!(session.is_finished());
    assert!(session.stats().transport_errors >= 1);
    assert!(matches!(session.last_error().as_deref(), Some(LinkError::Transport { .. })));
    drop(snapshots);
    session.shutdown(Duration::from_secs(1)).unwrap();
}
