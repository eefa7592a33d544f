use crate::error::{Result, SpinnerError};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// Which way a reel is allowed to turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    #[default]
    Both,
}

impl Direction {
    /// Force the sign of `increment` to match this direction, keeping its
    /// magnitude.
    pub fn apply(self, increment: i64) -> i64 {
        match self {
            Direction::Positive => increment.saturating_abs(),
            Direction::Negative => -increment.saturating_abs(),
            Direction::Both => increment,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
            Direction::Both => "both",
        };
        f.write_str(name)
    }
}

/// Motion parameters applied to every spin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Peak rate in objects per second
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,

    /// Acceleration in objects per second squared
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,

    /// Period between position samples while spinning
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    #[serde(default)]
    pub direction: Direction,

    /// Standard deviation of the random spin length, in objects
    #[serde(default = "default_spin_sigma")]
    pub spin_sigma: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_rate: default_max_rate(),
            acceleration: default_acceleration(),
            sample_interval_ms: default_sample_interval_ms(),
            direction: Direction::default(),
            spin_sigma: default_spin_sigma(),
        }
    }
}

fn default_max_rate() -> f64 {
    20.0
}

fn default_acceleration() -> f64 {
    10.0
}

fn default_sample_interval_ms() -> u64 {
    20
}

fn default_spin_sigma() -> f64 {
    30.0
}

impl MotionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        check_positive(Property::MaxRate, self.max_rate)?;
        check_positive(Property::Acceleration, self.acceleration)?;
        check_interval(self.sample_interval_ms)?;
        check_positive(Property::SpinSigma, self.spin_sigma)?;
        Ok(())
    }

    pub(crate) fn get(&self, property: Property) -> Option<PropertyValue> {
        let value = match property {
            Property::MaxRate => PropertyValue::Float(self.max_rate),
            Property::Acceleration => PropertyValue::Float(self.acceleration),
            Property::SampleInterval => PropertyValue::Interval(self.sample_interval()),
            Property::Direction => PropertyValue::Direction(self.direction),
            Property::SpinSigma => PropertyValue::Float(self.spin_sigma),
            Property::Data => return None,
        };
        Some(value)
    }
}

pub(crate) fn check_positive(property: Property, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SpinnerError::InvalidArgument {
            property,
            reason: format!("must be a finite value greater than zero, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn check_interval(ms: u64) -> Result<()> {
    if ms == 0 {
        return Err(SpinnerError::InvalidArgument {
            property: Property::SampleInterval,
            reason: "must be at least one millisecond".to_string(),
        });
    }
    Ok(())
}

/// Observable fields of a spinner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Data,
    MaxRate,
    Acceleration,
    SampleInterval,
    Direction,
    SpinSigma,
}

impl Property {
    /// Every configuration property, in declaration order.
    pub const CONFIG: [Property; 5] = [
        Property::MaxRate,
        Property::Acceleration,
        Property::SampleInterval,
        Property::Direction,
        Property::SpinSigma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Property::Data => "data",
            Property::MaxRate => "max_rate",
            Property::Acceleration => "acceleration",
            Property::SampleInterval => "sample_interval",
            Property::Direction => "direction",
            Property::SpinSigma => "spin_sigma",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Old or new value carried by a property change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    Float(f64),
    Interval(Duration),
    Direction(Direction),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Interval(d) => write!(f, "{}ms", d.as_millis()),
            PropertyValue::Direction(d) => write!(f, "{d}"),
        }
    }
}
