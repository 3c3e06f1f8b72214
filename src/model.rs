use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Logarithm base used for histogram entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntropyBase {
    /// Natural log
    #[default]
    Nats,
    /// Log base 2
    Bits,
}

impl EntropyBase {
    pub fn log(&self, x: f64) -> f64 {
        match self {
            EntropyBase::Nats => x.ln(),
            EntropyBase::Bits => x.log2(),
        }
    }
}

impl fmt::Display for EntropyBase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntropyBase::Nats => write!(f, "nats"),
            EntropyBase::Bits => write!(f, "bits"),
        }
    }
}

/// Population whose sample frequency is read from a branch annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Source,
    Recipient,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Recipient => write!(f, "recipient"),
        }
    }
}

/// Direction of a tier statistic, comparing the source-side value with the recipient-side value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Correct,
    Reverse,
    Ambiguous,
}

impl Signal {
    pub fn from_sign(sign: i8) -> Self {
        match sign {
            s if s > 0 => Signal::Correct,
            s if s < 0 => Signal::Reverse,
            _ => Signal::Ambiguous,
        }
    }

    pub fn value(&self) -> i8 {
        match self {
            Signal::Correct => 1,
            Signal::Reverse => -1,
            Signal::Ambiguous => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Per-run analysis settings, passed explicitly to every check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    pub num_bins: usize,
    pub entropy_base: EntropyBase,
    pub sample_size: usize,
    pub repetitions: usize,
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            num_bins: 10,
            entropy_base: EntropyBase::Nats,
            sample_size: 10,
            repetitions: 1,
            seed: 0,
        }
    }
}
