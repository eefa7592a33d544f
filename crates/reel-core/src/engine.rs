//! The spinner motion engine.
//!
//! One mutex guards the item sequence, the configuration, the position and
//! the `spinning` flag. A spin plans its [`Trajectory`] under that lock,
//! then hands a sampling task to the [`Scheduler`]. The task takes the lock
//! only to publish a position, and on completion to clear `spinning` and
//! wake every thread blocked in a [`Contention::Wait`] setter.
//!
//! Notifications are always emitted with the lock released, so listeners
//! may query the engine. A listener running on the scheduler thread must
//! not use [`Contention::Wait`] or [`SpinnerEngine::wait_until_idle`]: the
//! spin it would wait for can only finish on that same thread.

use crate::{
    config::{self, Direction, MotionConfig, Property, PropertyValue},
    error::{Result, SpinnerError},
    events::{ListenerId, Listeners, SpinnerEvent, SpinnerListener},
    position::{nearest_index, normalize},
    scheduler::{Scheduler, ThreadScheduler, Tick},
    trajectory::Trajectory,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};
use tracing::{debug, trace};

/// What a setter does when it finds a spin in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Contention {
    /// Fail with [`SpinnerError::InvalidState`].
    #[default]
    Reject,
    /// Block until the spin completes, then apply the change.
    Wait,
}

struct State {
    data: Vec<String>,
    config: MotionConfig,
    position: f64,
    spinning: bool,
    trajectory: Option<Trajectory>,
}

struct Shared {
    state: Mutex<State>,
    idle: Condvar,
    listeners: Listeners,
}

impl Shared {
    fn lock_idle(
        &self,
        property: Property,
        contention: Contention,
    ) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        match contention {
            Contention::Reject => {
                if state.spinning {
                    return Err(SpinnerError::InvalidState { property });
                }
            }
            Contention::Wait => {
                while state.spinning {
                    self.idle.wait(&mut state);
                }
            }
        }
        Ok(state)
    }

    fn sample(&self, trajectory: &Trajectory, len: usize, elapsed_ms: f64) -> Tick {
        if elapsed_ms >= trajectory.t_f() {
            let position = normalize(trajectory.x_f(), len);
            {
                let mut state = self.state.lock();
                state.position = position;
                state.spinning = false;
                state.trajectory = None;
            }
            self.idle.notify_all();
            debug!(position, elapsed_ms, "spin complete");
            self.listeners.emit(&SpinnerEvent::StateChanged);
            return Tick::Stop;
        }

        let position = normalize(trajectory.position_at(elapsed_ms), len);
        self.state.lock().position = position;
        trace!(position, elapsed_ms, phase = %trajectory.phase_at(elapsed_ms), "sample");
        self.listeners.emit(&SpinnerEvent::StateChanged);
        Tick::Continue
    }
}

/// Drives the position of one reel.
#[derive(Clone)]
pub struct SpinnerEngine {
    shared: Arc<Shared>,
    scheduler: Arc<dyn Scheduler>,
}

impl SpinnerEngine {
    pub fn new(config: MotionConfig, scheduler: Arc<dyn Scheduler>) -> Result<Self> {
        config.validate()?;
        let state = State {
            data: Vec::new(),
            config,
            position: f64::NAN,
            spinning: false,
            trajectory: None,
        };
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                idle: Condvar::new(),
                listeners: Listeners::new(),
            }),
            scheduler,
        })
    }

    /// Create an engine driven by [`ThreadScheduler::shared`].
    pub fn with_shared_scheduler(config: MotionConfig) -> Result<Self> {
        Self::new(config, ThreadScheduler::shared())
    }

    /// Replace the item sequence.
    ///
    /// The position resets to `0` for a non-empty sequence and to `NaN`
    /// otherwise.
    pub fn set_data<I, S>(&self, items: I, contention: Contention) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let mut state = self.shared.lock_idle(Property::Data, contention)?;
        state.position = if items.is_empty() { f64::NAN } else { 0.0 };
        state.data = items;
        let len = state.data.len();
        drop(state);

        debug!(len, "data replaced");
        self.shared.listeners.emit(&SpinnerEvent::DataChanged);
        Ok(())
    }

    pub fn set_max_rate(&self, max_rate: f64, contention: Contention) -> Result<()> {
        config::check_positive(Property::MaxRate, max_rate)?;
        self.update(Property::MaxRate, contention, |c| c.max_rate = max_rate)
    }

    pub fn set_acceleration(&self, acceleration: f64, contention: Contention) -> Result<()> {
        config::check_positive(Property::Acceleration, acceleration)?;
        self.update(Property::Acceleration, contention, |c| {
            c.acceleration = acceleration
        })
    }

    /// Set the sampling period. Only whole milliseconds are accepted.
    pub fn set_sample_interval(&self, interval: Duration, contention: Contention) -> Result<()> {
        if interval.subsec_nanos() % 1_000_000 != 0 {
            return Err(SpinnerError::InvalidArgument {
                property: Property::SampleInterval,
                reason: format!("must be a whole number of milliseconds, got {interval:?}"),
            });
        }
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        config::check_interval(ms)?;
        self.update(Property::SampleInterval, contention, |c| {
            c.sample_interval_ms = ms
        })
    }

    pub fn set_direction(&self, direction: Direction, contention: Contention) -> Result<()> {
        self.update(Property::Direction, contention, |c| c.direction = direction)
    }

    pub fn set_spin_sigma(&self, sigma: f64, contention: Contention) -> Result<()> {
        config::check_positive(Property::SpinSigma, sigma)?;
        self.update(Property::SpinSigma, contention, |c| c.spin_sigma = sigma)
    }

    /// Replace the whole configuration, firing one change per field that
    /// differs.
    pub fn set_config(&self, config: MotionConfig, contention: Contention) -> Result<()> {
        config.validate()?;
        // configuration is frozen while spinning, so this names the field
        // that a rejected call would have changed
        let current = self.config();
        let first = Property::CONFIG
            .into_iter()
            .find(|p| current.get(*p) != config.get(*p))
            .unwrap_or(Property::MaxRate);

        let mut state = self.shared.lock_idle(first, contention)?;
        let old = std::mem::replace(&mut state.config, config);
        drop(state);

        for property in Property::CONFIG {
            if let (Some(old), Some(new)) = (old.get(property), config.get(property)) {
                self.changed(property, old, new);
            }
        }
        Ok(())
    }

    fn update(
        &self,
        property: Property,
        contention: Contention,
        apply: impl FnOnce(&mut MotionConfig),
    ) -> Result<()> {
        let mut state = self.shared.lock_idle(property, contention)?;
        let old = state.config.get(property);
        apply(&mut state.config);
        let new = state.config.get(property);
        drop(state);

        if let (Some(old), Some(new)) = (old, new) {
            self.changed(property, old, new);
        }
        Ok(())
    }

    fn changed(&self, property: Property, old: PropertyValue, new: PropertyValue) {
        if old == new {
            return;
        }
        debug!(%property, %old, %new, "property changed");
        self.shared
            .listeners
            .emit(&SpinnerEvent::PropertyChanged { property, old, new });
    }

    /// Start spinning by `increment` items.
    ///
    /// Returns immediately. Nothing happens (and `false` is returned) when a
    /// spin is already running, there are no items, or the increment is
    /// zero. With a restricted [`Direction`] the sign of `increment` is
    /// forced to match it.
    pub fn spin(&self, increment: i64) -> bool {
        let mut state = self.shared.state.lock();
        if state.spinning || state.data.is_empty() {
            return false;
        }
        let increment = state.config.direction.apply(increment);
        if increment == 0 {
            return false;
        }

        let config = state.config;
        let trajectory = Trajectory::plan(
            state.position,
            increment,
            config.max_rate,
            config.acceleration,
        );
        let len = state.data.len();
        state.spinning = true;
        state.trajectory = Some(trajectory);
        drop(state);

        debug!(
            increment,
            from = trajectory.x0(),
            cruise = trajectory.has_cruise(),
            duration_ms = trajectory.t_f(),
            "spin started"
        );

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let mut started: Option<Duration> = None;
        self.scheduler.schedule_periodic(
            config.sample_interval(),
            Box::new(move |now| {
                let Some(shared) = shared.upgrade() else {
                    return Tick::Stop;
                };
                // the first tick only pins the start time
                let Some(t0) = started else {
                    started = Some(now);
                    return Tick::Continue;
                };
                let elapsed_ms = now.saturating_sub(t0).as_secs_f64() * 1_000.0;
                shared.sample(&trajectory, len, elapsed_ms)
            }),
        );
        true
    }

    /// Spin by a random number of items drawn from a normal distribution
    /// with the configured `spin_sigma`.
    pub fn spin_random(&self) -> bool {
        self.spin_random_with(&mut rand::rng())
    }

    pub fn spin_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        let sigma = self.config().spin_sigma;
        let draw: f64 = StandardNormal.sample(rng);
        self.spin(random_increment(draw, sigma))
    }

    /// Current position in `[0, len)`, or `NaN` when there are no items.
    pub fn position(&self) -> f64 {
        self.shared.state.lock().position
    }

    pub fn current_index(&self) -> Option<usize> {
        let state = self.shared.state.lock();
        nearest_index(state.position, state.data.len())
    }

    pub fn current_item(&self) -> Option<String> {
        let state = self.shared.state.lock();
        let idx = nearest_index(state.position, state.data.len())?;
        state.data.get(idx).cloned()
    }

    pub fn data(&self) -> Vec<String> {
        self.shared.state.lock().data.clone()
    }

    pub fn config(&self) -> MotionConfig {
        self.shared.state.lock().config
    }

    pub fn is_spinning(&self) -> bool {
        self.shared.state.lock().spinning
    }

    /// Plan of the spin in progress, if any.
    pub fn trajectory(&self) -> Option<Trajectory> {
        self.shared.state.lock().trajectory
    }

    /// Block until no spin is running.
    pub fn wait_until_idle(&self) {
        let mut state = self.shared.state.lock();
        while state.spinning {
            self.shared.idle.wait(&mut state);
        }
    }

    pub fn add_listener<L: SpinnerListener + 'static>(&self, listener: L) -> ListenerId {
        self.shared.listeners.add(Arc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }
}

impl fmt::Debug for SpinnerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SpinnerEngine")
            .field("items", &state.data.len())
            .field("position", &state.position)
            .field("spinning", &state.spinning)
            .field("config", &state.config)
            .finish()
    }
}

/// `sign(draw) * ceil(|draw| * sigma)`; rounds away from zero.
fn random_increment(draw: f64, sigma: f64) -> i64 {
    let magnitude = (draw.abs() * sigma).ceil() as i64;
    if draw < 0.0 { -magnitude } else { magnitude }
}
