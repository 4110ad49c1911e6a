//! End-to-end protocol tests against a loopback stand-in for the console.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sqmix::prelude::*;
use sqmix::session::commands;
use sqmix::{MidiSink, MixerSession, SessionConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Poll until `check` passes or the deadline expires.
fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if check() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {what}");
}

fn read_exact(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .expect("stand-in console read failed");
    buf
}

#[test]
fn test_mute_and_scene_round_trip_over_tcp() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mixer = SqMixer::builder("127.0.0.1", Model::Sq6)
        .port(port)
        .connect()
        .unwrap();
    let (mut console, _) = listener.accept().unwrap();
    wait_for("connection", || mixer.is_connected());

    // Host mutes input 1; the console sees a four-message NRPN set.
    mixer
        .session()
        .set_mute(Category::InputChannel, 0, true)
        .unwrap();
    assert_eq!(
        read_exact(&mut console, 12),
        commands::nrpn_set(0, 0x00, 0x00, 0x00, 0x01)
    );

    // The console reports a surface mute of input 6, fragmented mid-message.
    console.write_all(&[0xB0, 0x63, 0x00, 0xB0, 0x62]).unwrap();
    console.flush().unwrap();
    thread::sleep(Duration::from_millis(10));
    console
        .write_all(&[0x05, 0xB0, 0x06, 0x00, 0xB0, 0x26, 0x01])
        .unwrap();
    wait_for("mute feedback", || {
        mixer.session().store().mute(0x0005) == Some(true)
    });

    // Scene recall goes out as bank select plus program change.
    mixer.session().recall_scene(133).unwrap();
    assert_eq!(read_exact(&mut console, 5), vec![0xB0, 0x00, 0x01, 0xC0, 0x05]);

    // The console echoes the change; stepping works from the echoed scene.
    console.write_all(&[0xB0, 0x00, 0x01, 0xC0, 0x05]).unwrap();
    wait_for("scene echo", || {
        mixer.session().store().scene() == Some(133)
    });
    mixer.session().step_scene(-1).unwrap();
    assert_eq!(read_exact(&mut console, 5), commands::scene_recall(0, 132));

    mixer.disconnect();
    wait_for("disconnect", || {
        mixer.status() == ConnectionStatus::Disconnected
    });
}

#[test]
fn test_console_disconnect_flips_status() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mixer = SqMixer::builder("127.0.0.1", Model::Sq5)
        .port(port)
        .connect()
        .unwrap();
    let (console, _) = listener.accept().unwrap();
    wait_for("connection", || mixer.is_connected());

    drop(console);
    wait_for("status after console EOF", || {
        mixer.status() == ConnectionStatus::Disconnected
    });
}

#[derive(Default)]
struct Collector {
    frames: std::sync::Mutex<Vec<Vec<u8>>>,
}

impl MidiSink for Collector {
    fn send(&self, bytes: &[u8]) {
        self.frames.lock().unwrap().push(bytes.to_vec());
    }
}

/// Socket fragmentation, running status and interleaved real-time bytes all
/// resolve to the same events as the canonical stream.
#[test]
fn test_pump_hostile_byte_stream() {
    init_tracing();
    let sink = Arc::new(Collector::default());
    let session = MixerSession::new(
        SessionConfig::new(Model::Sq6),
        sink,
        Arc::new(sqmix::NopListener),
    );

    // Mute-on for input 3 under running status, with a clock byte inside a
    // message and a split across pumps.
    session.pump(&[0xB0, 0x63, 0x00, 0x62, 0xF8, 0x02, 0x06]);
    session.pump(&[0x00, 0x26, 0x01]);
    assert_eq!(session.store().mute(0x0002), Some(true));

    // A fader level for input 1 into mix 1 lands in the level map.
    session.pump(&commands::nrpn_set(0, 0x40, 0x44, 0x76, 0x5C));
    assert_eq!(session.store().level(0x2044), Some((0x76, 0x5C)));
    assert_eq!(session.store().mute(0x0002), Some(true));
}
