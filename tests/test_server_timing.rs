//! Announcement timing of the SD server on a virtual clock.
//!
//! Every expiry is pulled from the `VirtualTimer` and handed to the server, so
//! message timestamps are exact.

use proptest::prelude::*;
use someip_sd_server::sd::{
    SdMessageKind, SdServer, SdServerState, ServiceInstanceDescriptor, TimingConfig, VirtualTimer,
};
use std::net::Ipv4Addr;
use std::time::Duration;

use SdMessageKind::{Offer, StopOffer};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn server(min: u64, max: u64, base: u64, cycle: u64, repetitions: u32) -> SdServer<VirtualTimer> {
    let descriptor = ServiceInstanceDescriptor::new(0x1234, 0x0001, 1, 0, Ipv4Addr::new(224, 224, 224, 245));
    let timing = TimingConfig::from_millis(min, max, base, cycle, repetitions).unwrap();
    SdServer::new(descriptor, timing, VirtualTimer::new()).unwrap()
}

/// The scenario server: fixed 100 ms initial wait, 50 ms base, 2 repetitions, 1 s cycle.
fn scenario_server() -> SdServer<VirtualTimer> {
    server(100, 100, 50, 1000, 2)
}

/// Fire every timer due up to `until` and collect (millis, kind) of enqueued messages.
fn run_until(server: &mut SdServer<VirtualTimer>, until: u64) -> Vec<(u64, SdMessageKind)> {
    let mut out = Vec::new();
    while let Some(handle) = server.timer_mut().fire_next(ms(until)) {
        server.on_timer_expired(handle).unwrap();
        out.extend(pending(server));
    }
    server.timer_mut().advance_to(ms(until));
    out
}

/// Messages enqueued synchronously by the last operation.
fn pending(server: &mut SdServer<VirtualTimer>) -> Vec<(u64, SdMessageKind)> {
    let now = server.timer().now().as_millis() as u64;
    server.take_messages().into_iter().map(|m| (now, m.kind)).collect()
}

#[test]
fn concrete_scenario_offer_times() {
    let mut server = scenario_server();
    server.start().unwrap();

    let messages = run_until(&mut server, 3250);
    assert_eq!(
        messages,
        vec![(100, Offer), (150, Offer), (250, Offer), (1250, Offer), (2250, Offer), (3250, Offer)]
    );
    assert_eq!(server.state(), SdServerState::MainPhase);
}

#[test]
fn phase_boundaries_in_scenario() {
    let mut server = scenario_server();
    server.start().unwrap();

    run_until(&mut server, 99);
    assert_eq!(server.state(), SdServerState::InitialWaitPhase);
    run_until(&mut server, 150);
    assert_eq!(server.state(), SdServerState::RepetitionPhase);
    assert_eq!(server.repetition_counter(), 1);
    run_until(&mut server, 250);
    assert_eq!(server.state(), SdServerState::MainPhase);
}

#[test]
fn stop_after_offer_emits_single_stop_offer() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 1300);

    server.stop();
    assert_eq!(pending(&mut server), vec![(1300, StopOffer)]);
    assert_eq!(server.timer().armed(), 0);

    // Nothing ever again
    assert!(run_until(&mut server, 20_000).is_empty());
    server.stop();
    assert!(pending(&mut server).is_empty());
}

#[test]
fn stop_during_initial_wait_is_silent() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 50);

    server.stop();
    assert!(pending(&mut server).is_empty());
    assert!(run_until(&mut server, 5000).is_empty());
    assert_eq!(server.state(), SdServerState::NotReady);
}

#[test]
fn service_down_in_main_phase_then_restart_from_initial_wait() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 1300);

    server.set_service_availability(false).unwrap();
    assert_eq!(server.state(), SdServerState::NotReady);
    assert_eq!(server.timer().armed(), 0);
    assert_eq!(pending(&mut server), vec![(1300, StopOffer)]);
    assert!(run_until(&mut server, 1400).is_empty());

    server.set_service_availability(true).unwrap();
    assert_eq!(server.state(), SdServerState::InitialWaitPhase);
    assert_eq!(server.repetition_counter(), 0);
    assert_eq!(
        run_until(&mut server, 2650),
        vec![(1500, Offer), (1550, Offer), (1650, Offer), (2650, Offer)]
    );
}

#[test]
fn redundant_availability_is_a_no_op() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 300);

    server.set_service_availability(true).unwrap();
    server.set_link_availability(true).unwrap();
    assert!(pending(&mut server).is_empty());
    assert_eq!(server.state(), SdServerState::MainPhase);
    assert_eq!(run_until(&mut server, 1250), vec![(1250, Offer)]);
}

#[test]
fn start_twice_matches_start_once() {
    let mut once = scenario_server();
    once.start().unwrap();

    let mut twice = scenario_server();
    twice.start().unwrap();
    run_until(&mut twice, 120);
    twice.start().unwrap();

    let mut expected = run_until(&mut once, 120);
    expected.extend(run_until(&mut once, 4000));
    let mut actual = vec![(100, Offer)];
    actual.extend(run_until(&mut twice, 4000));
    assert_eq!(actual, expected);
    assert_eq!(twice.timer().armed(), 1);
}

#[test]
fn start_while_unavailable_resumes_on_availability() {
    let mut server = scenario_server().with_service_available(false);
    server.start().unwrap();
    assert_eq!(server.state(), SdServerState::NotReady);
    assert!(run_until(&mut server, 1000).is_empty());

    server.set_service_availability(true).unwrap();
    assert_eq!(run_until(&mut server, 1250), vec![(1100, Offer), (1150, Offer), (1250, Offer)]);
}

#[test]
fn link_down_between_expirations_has_no_side_effect() {
    for down_at in [120, 200, 249, 700] {
        let mut server = scenario_server();
        server.start().unwrap();
        run_until(&mut server, down_at);

        server.set_link_availability(false).unwrap();
        assert_eq!(server.state(), SdServerState::NotReady);
        assert_eq!(server.timer().armed(), 0);
        assert!(pending(&mut server).is_empty());
        assert!(run_until(&mut server, down_at + 5000).is_empty());
    }
}

#[test]
fn link_down_during_initial_wait_then_up_restarts_burst() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 40);

    server.set_link_availability(false).unwrap();
    assert!(pending(&mut server).is_empty());
    run_until(&mut server, 500);

    server.set_link_availability(true).unwrap();
    assert_eq!(run_until(&mut server, 750), vec![(600, Offer), (650, Offer), (750, Offer)]);
}

#[test]
fn expiry_racing_stop_is_discarded() {
    let mut server = scenario_server();
    server.start().unwrap();
    run_until(&mut server, 300);

    // The periodic timer fires, but stop() gets in before the expiry is delivered
    let in_flight = server.timer_mut().fire_next(ms(1250)).unwrap();
    server.stop();
    assert_eq!(pending(&mut server), vec![(1250, StopOffer)]);

    server.on_timer_expired(in_flight).unwrap();
    assert!(pending(&mut server).is_empty());
    assert_eq!(server.state(), SdServerState::NotReady);
}

#[test]
fn expiry_from_previous_activation_is_discarded() {
    let mut server = scenario_server();
    server.start().unwrap();
    let old = server.timer_mut().fire_next(ms(100)).unwrap();
    server.on_timer_expired(old).unwrap();
    server.take_messages();

    server.set_service_availability(false).unwrap();
    server.set_service_availability(true).unwrap();
    server.take_messages();

    server.on_timer_expired(old).unwrap();
    assert!(server.messages().is_empty());
    assert_eq!(server.state(), SdServerState::InitialWaitPhase);
}

#[test]
fn zero_repetitions_skip_repetition_phase() {
    let mut server = server(30, 30, 50, 400, 0);
    server.start().unwrap();
    assert_eq!(run_until(&mut server, 830), vec![(30, Offer), (430, Offer), (830, Offer)]);
}

proptest! {
    /// After start: one offer within the initial window, `repetition_max` offers with
    /// doubling spacing, then offers every cycle.
    #[test]
    fn offer_spacing_follows_timing(
        min in 0u64..200,
        spread in 0u64..200,
        base in 1u64..200,
        repetitions in 0u32..6,
        cycle in 1u64..3000,
        seed in any::<u64>(),
    ) {
        let mut server = server(min, min + spread, base, cycle, repetitions).with_rng_seed(seed);
        server.start().unwrap();

        let burst: u64 = (0..repetitions).map(|n| base << n).sum();
        let horizon = min + spread + burst + 3 * cycle;
        let times: Vec<u64> = run_until(&mut server, horizon)
            .into_iter()
            .map(|(t, kind)| {
                assert_eq!(kind, Offer);
                t
            })
            .collect();

        prop_assert!(times[0] >= min && times[0] <= min + spread);
        prop_assert!(times.len() >= repetitions as usize + 4);
        for (i, pair) in times.windows(2).enumerate() {
            let expected = if i < repetitions as usize { base << i } else { cycle };
            prop_assert_eq!(pair[1] - pair[0], expected);
        }
        prop_assert!(server.repetition_counter() <= repetitions);
    }
}
