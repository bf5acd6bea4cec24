use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f64) -> f64;
}

fn validate(rate: f64, vi: f64, vf: f64) -> Result<()> {
    ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf))
        .then_some(())
        .ok_or_else(|| Error::InvalidDecay {
            message: format!("`vi - vf` ({vi} - {vf}) must have same sign as `rate` ({rate})"),
        })
}

/// A constant value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Exponential {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Exponential {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Linear {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Linear {
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// Decay from `vi` toward zero over `span` steps, clamped at the floor `vf`
    ///
    /// Equivalent to v(t) = max(v<sub>i</sub> * (1 - t / span), v<sub>f</sub>)
    pub fn spanning(vi: f64, vf: f64, span: u32) -> Result<Self> {
        if span == 0 {
            return Err(Error::InvalidDecay {
                message: String::from("linear decay span must be at least one step"),
            });
        }
        Self::new(vi / f64::from(span), vi, vf)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        (vi - rate * t).max(vf)
    }
}

/// Serializable choice of epsilon schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    Constant { value: f64 },
    Linear { start: f64, end: f64 },
    Exponential { rate: f64, start: f64, end: f64 },
}

impl Default for Schedule {
    fn default() -> Self {
        Self::Linear {
            start: 0.3,
            end: 0.01,
        }
    }
}

/// A [`Schedule`] resolved against a concrete episode count
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Epsilon {
    Constant(Constant),
    Linear(Linear),
    Exponential(Exponential),
}

impl Schedule {
    /// Build the decay curve for a run of `episodes` episodes
    pub fn build(&self, episodes: u32) -> Result<Epsilon> {
        Ok(match *self {
            Schedule::Constant { value } => Epsilon::Constant(Constant::new(value)),
            Schedule::Linear { start, end } => {
                Epsilon::Linear(Linear::spanning(start, end, episodes)?)
            }
            Schedule::Exponential { rate, start, end } => {
                Epsilon::Exponential(Exponential::new(rate, start, end)?)
            }
        })
    }

    /// Initial and final epsilon of the schedule
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Schedule::Constant { value } => (value, value),
            Schedule::Linear { start, end } | Schedule::Exponential { start, end, .. } => {
                (start, end)
            }
        }
    }
}

impl Decay for Epsilon {
    fn evaluate(&self, t: f64) -> f64 {
        match self {
            Epsilon::Constant(d) => d.evaluate(t),
            Epsilon::Linear(d) => d.evaluate(t),
            Epsilon::Exponential(d) => d.evaluate(t),
        }
    }
}
