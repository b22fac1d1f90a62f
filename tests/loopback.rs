//! Link Loopback Tests
//!
//! Two links joined by an in-memory wire, ticked in step at 8x the bit rate.

mod common;

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use askwire::consts::MAX_PAYLOAD_LEN_USIZE;
use askwire::{DatagramLink, Link, LinkConfig, LinkError, LinkStatistics, ValueKind};
use common::{WireLink, looped, pair, run, ticks_for};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn test_scenario_three_bytes_at_2000_bps() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    sender.send(&[0x01, 0x02, 0x03]).unwrap();
    run(&[&sender, &receiver], ticks_for(3));

    assert!(!sender.is_busy());
    assert!(receiver.has_message());
    let message = receiver.take_message().unwrap();
    assert_eq!(message.payload(), &[0x01, 0x02, 0x03]);
    assert!(message.checksum_valid());
    assert_eq!(receiver.good_count(), 1);
    assert_eq!(receiver.bad_count(), 0);
    assert!(!receiver.has_message());
}

#[test]
fn test_empty_and_full_payloads() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    let full: Vec<u8> = (0..MAX_PAYLOAD_LEN_USIZE as u8).map(|i| i ^ 0xa5).collect();
    for payload in [&[][..], &full[..]] {
        sender.send(payload).unwrap();
        run(&[&sender, &receiver], ticks_for(payload.len()));
        let message = receiver.take_message().unwrap();
        assert_eq!(message.payload(), payload);
        assert!(message.checksum_valid());
    }
    assert_eq!(
        receiver.statistics(),
        LinkStatistics { good: 2, bad: 0 }
    );
}

#[test]
fn test_back_to_back_frames() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    for i in 0..5u8 {
        sender.send(&[i; 10]).unwrap();
        run(&[&sender, &receiver], ticks_for(10));
        assert_eq!(receiver.take_message().unwrap().payload(), &[i; 10]);
    }
    assert_eq!(receiver.good_count(), 5);
}

#[test]
fn test_unread_message_is_replaced() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    sender.send(b"first").unwrap();
    run(&[&sender, &receiver], ticks_for(5));
    sender.send(b"second").unwrap();
    run(&[&sender, &receiver], ticks_for(6));
    assert_eq!(receiver.take_message().unwrap().payload(), b"second");
    assert_eq!(receiver.take_message(), None);
    assert_eq!(receiver.good_count(), 2);
}

/// A receiver module that outputs `LOW` for carrier.
#[derive(Debug)]
struct Inverter(common::Wire);

impl ErrorType for Inverter {
    type Error = Infallible;
}

impl InputPin for Inverter {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.level())
    }
}

#[test]
fn test_inverted_receiver() {
    let config = LinkConfig {
        bit_rate: 1000,
        ..LinkConfig::default()
    };
    let air = common::Wire::new();
    let sender: WireLink = Link::new(air.clone(), common::Wire::new(), None, config).unwrap();
    let receiver: Link<common::Wire, Inverter, common::Wire> = Link::new(
        common::Wire::new(),
        Inverter(air),
        None,
        LinkConfig {
            rx_inverted: true,
            ..config
        },
    )
    .unwrap();
    receiver.start();
    sender.send(b"inverted").unwrap();
    for _ in 0..ticks_for(8) {
        sender.tick();
        receiver.tick();
    }
    let message = receiver.take_message().unwrap();
    assert_eq!(message.payload(), b"inverted");
    assert!(message.checksum_valid());
}

// ============================================================================
// Transmit Control
// ============================================================================

#[test]
fn test_send_while_busy() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    sender.send(b"one").unwrap();
    assert!(sender.is_busy());
    assert_eq!(sender.send(b"two"), Err(LinkError::Busy));
    assert_eq!(sender.poll_idle(), Err(nb::Error::WouldBlock));

    run(&[&sender, &receiver], ticks_for(3));
    assert_eq!(sender.poll_idle(), Ok(()));
    // The first frame went out untouched.
    assert_eq!(receiver.take_message().unwrap().payload(), b"one");
}

#[test]
fn test_oversized_payload_rejected() {
    let (sender, _receiver) = pair(LinkConfig::default());
    let payload = [0u8; MAX_PAYLOAD_LEN_USIZE + 1];
    assert_eq!(
        sender.send(&payload),
        Err(LinkError::PayloadTooLarge { len: 78, max: 77 })
    );
    assert!(!sender.is_busy());
}

#[test]
fn test_datagram_link_interface() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    let tx: &dyn DatagramLink = &sender;
    let rx: &dyn DatagramLink = &receiver;
    assert!(tx.try_send(b"ping"));
    assert!(tx.is_busy());
    assert!(!tx.try_send(b"pong"));
    assert!(!tx.try_send(&[0u8; 100]));
    run(&[&sender, &receiver], ticks_for(4));
    assert!(!tx.is_busy());
    assert_eq!(rx.poll_message().unwrap().payload(), b"ping");
    assert_eq!(rx.poll_message(), None);
    assert_eq!(rx.link_statistics(), LinkStatistics { good: 1, bad: 0 });
}

// ============================================================================
// Receive Control
// ============================================================================

#[test]
fn test_stop_discards_partial_frame() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    sender.send(&[0x55; 20]).unwrap();
    let total = ticks_for(20);
    run(&[&sender, &receiver], total / 2);
    receiver.stop();
    assert!(!receiver.is_receiving());
    run(&[&sender, &receiver], total - total / 2);
    assert!(!receiver.has_message());
    assert_eq!(receiver.statistics(), LinkStatistics::default());

    // Restarting picks up the next frame.
    receiver.start();
    sender.send(&[0x55; 20]).unwrap();
    run(&[&sender, &receiver], total);
    assert!(receiver.take_message().unwrap().checksum_valid());
}

#[test]
fn test_half_duplex_ignores_own_signal() {
    let link = looped(LinkConfig::default());
    link.start();
    link.send(b"echo").unwrap();
    run(&[&link], ticks_for(4));
    assert!(!link.is_busy());
    assert!(!link.has_message());
    assert_eq!(link.statistics(), LinkStatistics::default());
    assert!(link.is_receiving());
}

#[test]
fn test_full_duplex_hears_own_signal() {
    let link = looped(LinkConfig {
        half_duplex: false,
        ..LinkConfig::default()
    });
    link.start();
    link.send(b"echo").unwrap();
    run(&[&link], ticks_for(4));
    assert_eq!(link.take_message().unwrap().payload(), b"echo");
}

#[test]
fn test_release_and_rebuild() {
    let link = looped(LinkConfig {
        half_duplex: false,
        ..LinkConfig::default()
    });
    let (tx, rx, ptt) = link.release();
    assert!(!tx.level());
    let link: WireLink = Link::new(
        tx,
        rx,
        ptt,
        LinkConfig {
            half_duplex: false,
            ..LinkConfig::default()
        },
    )
    .unwrap();
    link.start();
    link.send(b"again").unwrap();
    run(&[&link], ticks_for(5));
    assert!(link.has_message());
}

// ============================================================================
// Value Records
// ============================================================================

#[test]
fn test_value_record_round_trip() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    sender
        .send_value(21.75, 2, ValueKind::Temperature, 3)
        .unwrap();
    run(&[&sender, &receiver], ticks_for(9));
    let record = receiver.take_value().unwrap();
    assert_eq!(record.kind(), ValueKind::Temperature);
    assert_eq!(record.source(), 3);
    assert_eq!(record.text(), "21.75");
    assert_eq!(record.value(), Some(21.75));
}

#[test]
fn test_send_value_rejects_nan() {
    let (sender, _receiver) = pair(LinkConfig::default());
    assert_eq!(
        sender.send_value(f32::NAN, 1, ValueKind::Light, 0),
        Err(LinkError::Value(askwire::ValueError::NotFinite))
    );
    assert!(!sender.is_busy());
}

// ============================================================================
// Waiting
// ============================================================================

/// A delay that advances both links instead of sleeping.
struct TickingDelay<'a> {
    links: [&'a WireLink; 2],
    period_ns: u32,
}

impl DelayNs for TickingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        run(&self.links, (ns / self.period_ns).max(1));
    }
}

#[test]
fn test_wait_message_with_delay() {
    let (sender, receiver) = pair(LinkConfig::default());
    receiver.start();
    let mut delay = TickingDelay {
        links: [&sender, &receiver],
        period_ns: receiver.timing().sample_period_ns,
    };
    // Nothing sent: the wait runs out.
    assert!(!receiver.wait_message(&mut delay, 5));

    sender.send(b"wake").unwrap();
    assert!(receiver.wait_message(&mut delay, 1_000));
    assert_eq!(receiver.take_message().unwrap().payload(), b"wake");
}

#[test]
fn test_wait_message_across_threads() {
    let (sender, receiver) = pair(LinkConfig::default());
    let sender = Arc::new(sender);
    let receiver = Arc::new(receiver);
    let running = Arc::new(AtomicBool::new(true));
    receiver.start();

    let ticker = {
        let sender = Arc::clone(&sender);
        let receiver = Arc::clone(&receiver);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                sender.tick();
                receiver.tick();
            }
        })
    };

    assert!(!receiver.wait_message_timeout(Duration::from_millis(10)));
    sender.send(b"threaded").unwrap();
    sender.wait_idle();
    assert!(receiver.wait_message_timeout(Duration::from_secs(10)));
    running.store(false, Ordering::SeqCst);
    ticker.join().unwrap();

    assert_eq!(receiver.take_message().unwrap().payload(), b"threaded");
}

#[test]
fn test_run_ticks_drives_link() {
    let link = looped(LinkConfig {
        half_duplex: false,
        ..LinkConfig::default()
    });
    link.start();
    link.send(b"paced").unwrap();
    let mut delay = embedded_hal_mock::eh1::delay::NoopDelay::new();
    askwire::timer::run_ticks(&link, &mut delay, ticks_for(5));
    assert!(!link.is_busy());
    assert_eq!(link.take_message().unwrap().payload(), b"paced");
}
