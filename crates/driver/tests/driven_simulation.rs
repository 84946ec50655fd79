//! Driven Simulation Integration Test
//!
//! Tests a full harness:
//! - A time driver advancing a simulated clock
//! - Participant threads gating on initialization and sleeping on deadlines
//! - Shutdown releasing anything still parked

use lockstep_clock::{ClockConfig, ClockError, LockstepClock};
use lockstep_driver::{DriverConfig, TimeDriver};
use std::thread;
use std::time::Duration;

fn fast_config() -> DriverConfig {
    DriverConfig {
        start_ms: 1_000,
        step_ms: 10,
        interval: Duration::from_millis(1),
        max_ticks: None,
    }
}

/// Participants observe a consistent, advancing clock
#[test]
fn test_participants_follow_driver() {
    let _ = env_logger::try_init();
    let clock = LockstepClock::with_config(ClockConfig::simulated().with_name("harness"));

    let participants: Vec<_> = (0..4)
        .map(|i| {
            let clock = clock.clone();
            thread::spawn(move || -> Result<Vec<i64>, ClockError> {
                clock.wait_for_initialization()?;
                let mut observed = vec![clock.now()?];
                for _ in 0..5 {
                    let before = clock.now()?;
                    clock.sleep_for(25 + i * 5)?;
                    let after = clock.now()?;
                    assert!(after >= before + 25 + i * 5, "Woke before deadline");
                    observed.push(after);
                }
                Ok(observed)
            })
        })
        .collect();

    let driver = TimeDriver::new(clock.clone(), fast_config()).spawn();

    for participant in participants {
        let observed = participant.join().unwrap().unwrap();
        assert!(observed[0] >= 1_000);
        assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    let last = driver.shutdown().unwrap();
    assert!(last.unwrap() >= 1_000);
}

/// A bounded driver stops on its own
#[test]
fn test_driver_tick_budget() {
    let _ = env_logger::try_init();
    let clock = LockstepClock::new(true);
    let config = DriverConfig {
        max_ticks: Some(3),
        ..fast_config()
    };

    let last = TimeDriver::new(clock.clone(), config).spawn().join().unwrap();
    assert_eq!(last, Some(1_020));
    assert_eq!(clock.now(), Ok(1_020));
    assert_eq!(clock.now_seconds(), Ok(1));
}

/// Driver attached to a real clock fails on its first tick
#[test]
fn test_driver_on_real_clock() {
    let _ = env_logger::try_init();
    let clock = LockstepClock::new(false);

    let result = TimeDriver::new(clock, fast_config()).spawn().join();
    assert!(matches!(
        result,
        Err(ClockError::InvalidModeOperation { .. })
    ));
}

/// Shutdown ends the driver and releases sleepers it can never reach
#[test]
fn test_shutdown_stops_harness() {
    let _ = env_logger::try_init();
    let clock = LockstepClock::new(true);
    let driver = TimeDriver::new(clock.clone(), fast_config()).spawn();

    let far_sleeper = {
        let clock = clock.clone();
        thread::spawn(move || {
            clock.wait_for_initialization()?;
            clock.sleep_until(i64::MAX)
        })
    };

    while clock.pending_sleepers() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    clock.shutdown();

    assert_eq!(far_sleeper.join().unwrap(), Err(ClockError::ShutDown));
    // Driver notices the shutdown and exits without being asked
    assert!(driver.join().unwrap().is_some());
}

/// Async driver and async participants on one runtime
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_driver() {
    let _ = env_logger::try_init();
    let clock = LockstepClock::new(true);

    let participant = {
        let clock = clock.clone();
        tokio::spawn(async move {
            clock.wait_for_initialization_async().await?;
            clock.sleep_until_async(1_050).await?;
            clock.now()
        })
    };

    let config = DriverConfig {
        max_ticks: Some(10),
        ..fast_config()
    };
    let mut driver = TimeDriver::new(clock.clone(), config);
    driver.run().await.unwrap();

    assert_eq!(driver.ticks(), 10);
    assert_eq!(driver.last_time(), Some(1_090));
    assert!(participant.await.unwrap().unwrap() >= 1_050);
}
