//! Trapezoidal velocity profile for a single spin.
//!
//! A spin accelerates from rest, optionally cruises at the configured peak
//! rate, then decelerates symmetrically to rest on the target position. The
//! profile is solved in closed form once, up front, and stored as three
//! segments (accel/cruise/decel) so sampling is a constant-time lookup.
//!
//! All times are in milliseconds and all rates in objects per millisecond.

/// Stage of the motion profile at a given elapsed time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Accelerating,
    Cruising,
    Decelerating,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Accelerating => "accel",
            Phase::Cruising => "cruise",
            Phase::Decelerating => "decel",
            Phase::Complete => "done",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Segment {
    start_t: f64,
    start_pos: f64,
    start_v: f64,
    half_accel: f64,
}

impl Segment {
    fn distance(&self, move_time: f64) -> f64 {
        (self.start_v + self.half_accel * move_time) * move_time
    }

    fn position(&self, t: f64) -> f64 {
        self.start_pos + self.distance(t - self.start_t)
    }
}

/// Precomputed breakpoints of one spin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trajectory {
    x0: f64,
    x_a: f64,
    x_b: f64,
    x_f: f64,
    t_a: f64,
    t_b: f64,
    t_f: f64,
    v_max: f64,
    a_max: f64,
    accel: Segment,
    cruise: Segment,
    decel: Segment,
}

impl Trajectory {
    /// Solve the profile for moving `increment` objects from `x0`.
    ///
    /// `max_rate` is in objects/second and `acceleration` in
    /// objects/second², both strictly positive.
    pub fn plan(x0: f64, increment: i64, max_rate: f64, acceleration: f64) -> Self {
        if increment == 0 {
            return Self::at_rest(x0);
        }

        let delta = increment as f64;
        let sign = delta.signum();
        let v = max_rate / 1_000.0;
        let a = acceleration / 1_000_000.0;
        let x_f = x0 + delta;

        let dx = sign * 0.5 * v * v / a;
        let a_candidate = x0 + dx;
        let b_candidate = x_f - dx;

        let (x_a, x_b, v_max) = if (b_candidate - a_candidate) * sign < 0.0 {
            // too short to reach the peak rate: no cruise phase
            let mid = x0 + 0.5 * delta;
            (mid, mid, sign * (a * delta.abs()).sqrt())
        } else {
            (a_candidate, b_candidate, sign * v)
        };
        let a_max = sign * a;

        let t_a = v_max / a_max;
        let t_b = t_a + (x_b - x_a) / v_max;
        let t_f = t_a + t_b;

        let accel = Segment {
            start_t: 0.0,
            start_pos: x0,
            start_v: 0.0,
            half_accel: 0.5 * a_max,
        };
        let cruise = Segment {
            start_t: t_a,
            start_pos: x_a,
            start_v: v_max,
            half_accel: 0.0,
        };
        let decel = Segment {
            start_t: t_b,
            start_pos: x_b,
            start_v: v_max,
            half_accel: -0.5 * a_max,
        };

        Self {
            x0,
            x_a,
            x_b,
            x_f,
            t_a,
            t_b,
            t_f,
            v_max,
            a_max,
            accel,
            cruise,
            decel,
        }
    }

    fn at_rest(x0: f64) -> Self {
        let rest = Segment {
            start_pos: x0,
            ..Segment::default()
        };
        Self {
            x0,
            x_a: x0,
            x_b: x0,
            x_f: x0,
            t_a: 0.0,
            t_b: 0.0,
            t_f: 0.0,
            v_max: 0.0,
            a_max: 0.0,
            accel: rest,
            cruise: rest,
            decel: rest,
        }
    }

    /// Unnormalized position `t` milliseconds after the spin started.
    pub fn position_at(&self, t: f64) -> f64 {
        if t >= self.t_f {
            return self.x_f;
        }
        if t <= 0.0 {
            return self.x0;
        }
        if t <= self.t_a {
            self.accel.position(t)
        } else if t < self.t_b {
            self.cruise.position(t)
        } else {
            self.decel.position(t)
        }
    }

    pub fn phase_at(&self, t: f64) -> Phase {
        if t >= self.t_f {
            Phase::Complete
        } else if t <= self.t_a {
            Phase::Accelerating
        } else if t < self.t_b {
            Phase::Cruising
        } else {
            Phase::Decelerating
        }
    }

    /// Whether the spin is long enough to reach the configured peak rate.
    pub fn has_cruise(&self) -> bool {
        self.x_a != self.x_b
    }

    /// Total duration of the spin, saturating at [`Duration::MAX`] for
    /// rates too slow to represent.
    ///
    /// [`Duration::MAX`]: std::time::Duration::MAX
    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::try_from_secs_f64(self.t_f / 1_000.0)
            .unwrap_or(std::time::Duration::MAX)
    }

    /// Signed peak velocity in objects/second.
    pub fn peak_rate(&self) -> f64 {
        self.v_max * 1_000.0
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// End of the acceleration phase.
    pub fn x_a(&self) -> f64 {
        self.x_a
    }

    /// Start of the deceleration phase.
    pub fn x_b(&self) -> f64 {
        self.x_b
    }

    pub fn x_f(&self) -> f64 {
        self.x_f
    }

    pub fn t_a(&self) -> f64 {
        self.t_a
    }

    pub fn t_b(&self) -> f64 {
        self.t_b
    }

    pub fn t_f(&self) -> f64 {
        self.t_f
    }

    /// Signed peak velocity in objects/millisecond.
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Signed acceleration in objects/millisecond².
    pub fn a_max(&self) -> f64 {
        self.a_max
    }
}
