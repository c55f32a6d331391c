//! Tokio driver tests
//!
//! Runs whole simulations in paused tokio time.
//!
//! Tests verify:
//! - Static playback advances and jumps small holes on its own
//! - A large hole is reported on the event bus and not jumped by default
//! - Commands sent through the handle reach the simulation
//! - Shutdown stops the driver early and cancels its timers

use std::time::Duration;
use tokio::time::Instant;
use vista_common::events::{EventBus, PlayheadEvent};
use vista_common::TimeRange;
use vista_ph::config::ScenarioConfig;
use vista_ph::observer::{EventBusObserver, NoopObserver};
use vista_ph::sim::driver::PlayheadDriver;
use vista_ph::sim::Simulation;
use vista_ph::PlayheadConfig;

fn driver_for(
    scenario: ScenarioConfig,
    config: PlayheadConfig,
) -> (PlayheadDriver, vista_ph::sim::driver::DriverHandle) {
    PlayheadDriver::new(move |timers| {
        Simulation::new(&scenario, config, timers, Box::new(NoopObserver))
    })
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_static_playback_runs_through_small_hole() {
    let scenario = ScenarioConfig {
        holes: vec![TimeRange::new(3.0, 3.3)],
        ..Default::default()
    };
    let (driver, _handle) = driver_for(scenario, PlayheadConfig::default());

    let report = driver.run(Duration::from_secs(8)).await.unwrap();

    assert!(report.position > 6.5, "position {}", report.position);
    assert!(report.segments_appended > 0);
}

#[tokio::test(start_paused = true)]
async fn test_large_hole_reported_not_jumped() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let scenario = ScenarioConfig {
        holes: vec![TimeRange::new(4.0, 6.0)],
        ..Default::default()
    };

    let (driver, _handle) = PlayheadDriver::new(move |timers| {
        Simulation::new(
            &scenario,
            PlayheadConfig::default(),
            timers,
            Box::new(EventBusObserver::new(bus, false)),
        )
    })
    .unwrap();
    let report = driver.run(Duration::from_secs(10)).await.unwrap();

    assert!((report.position - 4.0).abs() < 1e-6, "position {}", report.position);

    let mut large_gaps = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PlayheadEvent::LargeGap {
            gap_size, canceled, ..
        } = event
        {
            large_gaps.push((gap_size, canceled));
        }
    }
    assert!(!large_gaps.is_empty());
    let (gap_size, canceled) = large_gaps[0];
    assert!((gap_size - 2.0).abs() < 1e-6);
    assert!(!canceled);
}

#[tokio::test(start_paused = true)]
async fn test_large_hole_jumped_when_configured() {
    let scenario = ScenarioConfig {
        holes: vec![TimeRange::new(4.0, 6.0)],
        ..Default::default()
    };
    let config = PlayheadConfig {
        jump_large_gaps: true,
        ..Default::default()
    };
    let (driver, _handle) = driver_for(scenario, config);

    let report = driver.run(Duration::from_secs(10)).await.unwrap();
    assert!(report.position > 7.0, "position {}", report.position);
}

#[tokio::test(start_paused = true)]
async fn test_seek_command_moves_playback() {
    let (driver, handle) = driver_for(ScenarioConfig::default(), PlayheadConfig::default());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.seek(30.0).unwrap();
    });
    let report = driver.run(Duration::from_secs(4)).await.unwrap();

    assert!(
        report.position > 31.5 && report.position < 34.0,
        "position {}",
        report.position
    );
}

#[tokio::test(start_paused = true)]
async fn test_reverse_rate_scenario() {
    let scenario = ScenarioConfig {
        start_time: Some(30.0),
        playback_rate: -1.0,
        ..Default::default()
    };
    let (driver, _handle) = driver_for(scenario, PlayheadConfig::default());

    let report = driver.run(Duration::from_secs(4)).await.unwrap();

    assert_eq!(report.playback_rate, -1.0);
    assert!(report.position < 28.0, "position {}", report.position);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_early() {
    let (driver, handle) = driver_for(ScenarioConfig::default(), PlayheadConfig::default());

    let start = Instant::now();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.shutdown().unwrap();
    });
    let report = driver.run(Duration::from_secs(60)).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(report.position < 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_live_playback_stays_in_window() {
    let scenario = ScenarioConfig {
        live: true,
        window: 30.0,
        ..Default::default()
    };
    let (driver, _handle) = driver_for(scenario, PlayheadConfig::default());

    let report = driver.run(Duration::from_secs(10)).await.unwrap();

    // Window is [10, 40] after ten seconds; the start was held 6s behind the edge
    assert!(report.position >= 10.0, "position {}", report.position);
    assert!(report.position <= 40.0, "position {}", report.position);
}
