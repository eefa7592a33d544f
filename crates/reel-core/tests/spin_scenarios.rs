use parking_lot::Mutex;
use reel_core::{
    Contention, Direction, ManualScheduler, MotionConfig, Property, PropertyValue, SpinnerEngine,
    SpinnerError, SpinnerEvent, ThreadScheduler,
};
use std::{
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

fn ten_items() -> Vec<String> {
    (0..10).map(|i| format!("symbol-{i}")).collect()
}

fn manual_engine(config: MotionConfig) -> (SpinnerEngine, Arc<ManualScheduler>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let engine = SpinnerEngine::new(config, scheduler.clone()).unwrap();
    engine.set_data(ten_items(), Contention::Reject).unwrap();
    (engine, scheduler)
}

fn scenario_config() -> MotionConfig {
    MotionConfig {
        max_rate: 20.0,
        acceleration: 10.0,
        ..MotionConfig::default()
    }
}

#[test]
fn long_spin_cruises_and_lands_on_start() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(50));

    let plan = engine.trajectory().expect("spin in progress");
    assert!(plan.has_cruise());
    assert_ne!(plan.x_a(), plan.x_b());
    assert!((plan.t_a() - 2_000.0).abs() < 1e-6, "t_a = {}", plan.t_a());

    scheduler.advance(Duration::from_secs(10));
    assert!(!engine.is_spinning());
    assert_eq!(engine.position(), 0.0);
    assert_eq!(engine.current_index(), Some(0));
    assert!(engine.trajectory().is_none());
}

#[test]
fn short_spin_never_reaches_peak_rate() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(2));

    let plan = engine.trajectory().expect("spin in progress");
    assert_eq!(plan.x_a(), plan.x_b());
    assert!((plan.peak_rate() - 4.472_135_955).abs() < 1e-6);
    assert!(plan.peak_rate() < 20.0);

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(engine.position(), 2.0);
    assert_eq!(engine.current_item().as_deref(), Some("symbol-2"));
}

#[test]
fn endpoint_is_exact_for_any_sample_interval() {
    for interval_ms in [1, 7, 16, 33, 250, 1_000] {
        let config = MotionConfig {
            sample_interval_ms: interval_ms,
            ..scenario_config()
        };
        let (engine, scheduler) = manual_engine(config);
        assert!(engine.spin(37));
        scheduler.advance(Duration::from_secs(30));
        assert_eq!(engine.position(), 7.0, "interval {interval_ms}ms");

        assert!(engine.spin(-19));
        scheduler.advance(Duration::from_secs(30));
        assert_eq!(engine.position(), 8.0, "interval {interval_ms}ms");
    }
}

#[test]
fn samples_stay_normalized_and_follow_the_profile() {
    let (engine, scheduler) = manual_engine(scenario_config());
    let samples = Arc::new(Mutex::new(Vec::new()));
    let observed = engine.clone();
    let sink = samples.clone();
    engine.add_listener(move |event: &SpinnerEvent| {
        if *event == SpinnerEvent::StateChanged {
            sink.lock().push(observed.position());
        }
    });

    assert!(engine.spin(50));
    let plan = engine.trajectory().unwrap();
    scheduler.advance(Duration::from_secs(10));

    let samples = samples.lock();
    assert!(samples.iter().all(|x| (0.0..10.0).contains(x)));

    // unwrap the ring to recover the travelled distance per sample
    let mut travelled = vec![0.0];
    for pair in samples.windows(2) {
        let mut step = pair[1] - pair[0];
        if step < -5.0 {
            step += 10.0;
        }
        travelled.push(travelled.last().unwrap() + step);
    }
    let speeds: Vec<f64> = travelled.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(speeds.iter().all(|s| *s >= -1e-9), "moved backwards");

    let peak = plan.v_max() * 20.0;
    let peak_at = speeds
        .iter()
        .position(|s| (s - peak).abs() < 1e-6)
        .expect("reached cruise speed");
    let peak_until = speeds
        .iter()
        .rposition(|s| (s - peak).abs() < 1e-6)
        .unwrap();
    for w in speeds[..peak_at].windows(2) {
        assert!(w[1] >= w[0] - 1e-9, "accel phase slowed down");
    }
    for s in &speeds[peak_at..=peak_until] {
        assert!((s - peak).abs() < 1e-6, "cruise speed varied");
    }
    for w in speeds[peak_until..].windows(2) {
        assert!(w[1] <= w[0] + 1e-9, "decel phase sped up");
    }
}

#[test]
fn second_spin_is_ignored_while_spinning() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(50));
    let plan = engine.trajectory().unwrap();
    scheduler.advance(Duration::from_millis(1_000));

    assert!(!engine.spin(3));
    assert!(!engine.spin_random());
    assert_eq!(engine.trajectory(), Some(plan));
    assert_eq!(scheduler.pending(), 1);

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(engine.position(), 0.0);
}

#[test]
fn reject_setters_fail_while_spinning() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(50));

    assert_eq!(
        engine.set_max_rate(5.0, Contention::Reject),
        Err(SpinnerError::InvalidState {
            property: Property::MaxRate
        })
    );
    assert!(matches!(
        engine.set_direction(Direction::Positive, Contention::Reject),
        Err(SpinnerError::InvalidState { .. })
    ));
    assert!(matches!(
        engine.set_data(["x"], Contention::Reject),
        Err(SpinnerError::InvalidState {
            property: Property::Data
        })
    ));
    assert_eq!(engine.config(), scenario_config());
    assert_eq!(engine.data().len(), 10);

    scheduler.advance(Duration::from_secs(10));
    engine.set_max_rate(5.0, Contention::Reject).unwrap();
    assert_eq!(engine.config().max_rate, 5.0);
}

#[test]
fn wait_setter_applies_after_spin_completes() {
    let (engine, scheduler) = manual_engine(scenario_config());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_listener(move |event: &SpinnerEvent| {
        if let SpinnerEvent::PropertyChanged { .. } = event {
            sink.lock().push(event.clone());
        }
    });

    assert!(engine.spin(50));
    scheduler.advance(Duration::ZERO);

    let setter = {
        let engine = engine.clone();
        thread::spawn(move || {
            engine
                .set_acceleration(40.0, Contention::Wait)
                .map(|_| engine.is_spinning())
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!setter.is_finished(), "setter returned mid-spin");
    assert_eq!(engine.config().acceleration, 10.0);

    scheduler.advance(Duration::from_secs(10));
    let spinning_when_applied = setter.join().unwrap().unwrap();
    assert!(!spinning_when_applied);
    assert_eq!(engine.config().acceleration, 40.0);
    assert_eq!(
        *events.lock(),
        vec![SpinnerEvent::PropertyChanged {
            property: Property::Acceleration,
            old: PropertyValue::Float(10.0),
            new: PropertyValue::Float(40.0),
        }]
    );
}

#[test]
fn set_config_rejects_mid_spin_even_when_unchanged() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(50));
    scheduler.advance(Duration::ZERO);

    assert_eq!(
        engine.set_config(scenario_config(), Contention::Reject),
        Err(SpinnerError::InvalidState {
            property: Property::MaxRate
        })
    );

    let faster = MotionConfig {
        acceleration: 25.0,
        ..scenario_config()
    };
    assert_eq!(
        engine.set_config(faster, Contention::Reject),
        Err(SpinnerError::InvalidState {
            property: Property::Acceleration
        })
    );
    assert_eq!(engine.config(), scenario_config());
    assert!(engine.is_spinning());

    scheduler.advance(Duration::from_secs(10));
    engine.set_config(faster, Contention::Reject).unwrap();
    assert_eq!(engine.config(), faster);
}

#[test]
fn set_config_wait_returns_only_after_spin_lands() {
    let (engine, scheduler) = manual_engine(scenario_config());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_listener(move |event: &SpinnerEvent| {
        if let SpinnerEvent::PropertyChanged { property, .. } = event {
            sink.lock().push(*property);
        }
    });

    let wait_for_config = |config: MotionConfig| {
        let engine = engine.clone();
        thread::spawn(move || {
            engine
                .set_config(config, Contention::Wait)
                .map(|_| engine.is_spinning())
        })
    };

    // an unchanged config still waits for the spin
    assert!(engine.spin(50));
    scheduler.advance(Duration::ZERO);
    let unchanged = wait_for_config(scenario_config());
    thread::sleep(Duration::from_millis(50));
    assert!(!unchanged.is_finished(), "unchanged config returned mid-spin");
    scheduler.advance(Duration::from_secs(10));
    assert!(!unchanged.join().unwrap().unwrap());
    assert!(events.lock().is_empty());

    let reversed = MotionConfig {
        direction: Direction::Negative,
        ..scenario_config()
    };
    assert!(engine.spin(50));
    scheduler.advance(Duration::ZERO);
    let changed = wait_for_config(reversed);
    thread::sleep(Duration::from_millis(50));
    assert!(!changed.is_finished(), "changed config returned mid-spin");
    assert_eq!(engine.config(), scenario_config());
    scheduler.advance(Duration::from_secs(10));
    assert!(!changed.join().unwrap().unwrap());
    assert_eq!(engine.config(), reversed);
    assert_eq!(*events.lock(), vec![Property::Direction]);
}

#[test]
fn set_data_wait_resets_position_after_landing() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(53));
    scheduler.advance(Duration::ZERO);
    scheduler.advance(Duration::from_millis(1_000));
    let mid_spin = engine.position();
    assert!(mid_spin > 0.0);

    let (tx, rx) = mpsc::channel();
    let setter = {
        let engine = engine.clone();
        thread::spawn(move || {
            engine
                .set_data(["cherry", "bell", "seven"], Contention::Wait)
                .unwrap();
            tx.send(engine.is_spinning()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(engine.data().len(), 10);
    assert_eq!(engine.position(), mid_spin);

    scheduler.advance(Duration::from_millis(200));
    assert!(engine.position() > mid_spin, "spin kept moving");
    assert_eq!(engine.data().len(), 10);

    scheduler.advance(Duration::from_secs(10));
    assert!(!rx.recv_timeout(Duration::from_secs(5)).unwrap());
    setter.join().unwrap();
    assert_eq!(engine.data().len(), 3);
    assert_eq!(engine.position(), 0.0);
    assert_eq!(engine.current_item().as_deref(), Some("cherry"));
}

#[test]
fn wait_until_idle_blocks_for_the_spin() {
    let (engine, scheduler) = manual_engine(scenario_config());
    assert!(engine.spin(4));

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let engine = engine.clone();
        thread::spawn(move || {
            engine.wait_until_idle();
            tx.send(engine.position()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    scheduler.advance(Duration::from_secs(10));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 4.0);
    waiter.join().unwrap();
}

#[test]
fn data_change_notifies_listeners() {
    let (engine, _scheduler) = manual_engine(scenario_config());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let id = engine.add_listener(move |event: &SpinnerEvent| sink.lock().push(event.clone()));

    engine.set_data(["cherry", "bell"], Contention::Wait).unwrap();
    assert!(engine.remove_listener(id));
    engine.set_data(["seven"], Contention::Wait).unwrap();

    assert_eq!(*events.lock(), vec![SpinnerEvent::DataChanged]);
    assert_eq!(engine.data(), vec!["seven".to_string()]);
}

#[test]
fn real_time_spin_completes_on_thread_scheduler() {
    let scheduler = Arc::new(ThreadScheduler::new());
    let config = MotionConfig {
        max_rate: 400.0,
        acceleration: 4_000.0,
        sample_interval_ms: 2,
        ..MotionConfig::default()
    };
    let engine = SpinnerEngine::new(config, scheduler.clone()).unwrap();
    engine.set_data(ten_items(), Contention::Reject).unwrap();

    assert!(engine.spin(23));
    assert!(engine.is_spinning());
    engine.wait_until_idle();
    assert_eq!(engine.position(), 3.0);

    // a blocking setter issued mid-spin lands once the spin is done
    assert!(engine.spin(-23));
    engine
        .set_sample_interval(Duration::from_millis(5), Contention::Wait)
        .unwrap();
    assert!(!engine.is_spinning());
    assert_eq!(engine.position(), 0.0);
    assert_eq!(engine.config().sample_interval_ms, 5);
}
