//! Per-repetition result rows and their aggregation into signal proportions.
//!
//! Each repetition yields one [`RepetitionRow`]. Rows of a simulation are
//! summarized as the fraction of repetitions whose signal was correct, reverse
//! or ambiguous, for every tier statistic.

use crate::{model::Signal, tiers::TreeReport};
use itertools::Itertools;
use serde::Serialize;

/// Flat tsv record of one analysis repetition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepetitionRow {
    pub simulation: usize,
    pub repetition: usize,
    pub source_file: String,
    pub recipient_file: String,
    pub tier1_source_segregating: usize,
    pub tier1_recipient_segregating: usize,
    pub tier1_signal: i8,
    pub tier2_source_segregating_on_recipient: usize,
    pub tier2_recipient_segregating_on_source: usize,
    pub tier2_signal: i8,
    pub tier3_ats_source_entropy: f64,
    pub tier3_ats_recipient_entropy: f64,
    pub tier3_ats_signal: i8,
    pub tier3_atr_source_entropy: f64,
    pub tier3_atr_recipient_entropy: f64,
    pub tier3_atr_signal: i8,
}

impl RepetitionRow {
    pub fn new(
        simulation: usize,
        repetition: usize,
        source_file: String,
        recipient_file: String,
        report: &TreeReport,
    ) -> Self {
        let ats = &report.tier_3.ancestral_to_source;
        let atr = &report.tier_3.ancestral_to_recipient;
        Self {
            simulation,
            repetition,
            source_file,
            recipient_file,
            tier1_source_segregating: report.tier_1.source_segregating,
            tier1_recipient_segregating: report.tier_1.recipient_segregating,
            tier1_signal: report.tier_1.signal().value(),
            tier2_source_segregating_on_recipient: report.tier_2.source_segregating_on_recipient,
            tier2_recipient_segregating_on_source: report.tier_2.recipient_segregating_on_source,
            tier2_signal: report.tier_2.signal().value(),
            tier3_ats_source_entropy: ats.source_entropy,
            tier3_ats_recipient_entropy: ats.recipient_entropy,
            tier3_ats_signal: ats.signal().value(),
            tier3_atr_source_entropy: atr.source_entropy,
            tier3_atr_recipient_entropy: atr.recipient_entropy,
            tier3_atr_signal: atr.signal().value(),
        }
    }
}

/// Fractions of repetitions per signal direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalProportions {
    pub correct: f64,
    pub reverse: f64,
    pub ambiguous: f64,
}

impl SignalProportions {
    pub fn from_signals(signals: &[i8]) -> Self {
        if signals.is_empty() {
            return Self::default();
        }
        let total = signals.len() as f64;
        let fraction = |signal: Signal| {
            signals.iter().filter(|&&s| s == signal.value()).count() as f64 / total
        };
        Self {
            correct: fraction(Signal::Correct),
            reverse: fraction(Signal::Reverse),
            ambiguous: fraction(Signal::Ambiguous),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub simulation: usize,
    pub source_file: String,
    pub recipient_file: String,
    pub repetitions: usize,
    pub tier_1: SignalProportions,
    pub tier_2: SignalProportions,
    pub tier_3_ancestral_to_source: SignalProportions,
    pub tier_3_ancestral_to_recipient: SignalProportions,
}

/// Summarizes rows per simulation, ordered by simulation index.
pub fn summarize(rows: &[RepetitionRow]) -> Vec<SimulationSummary> {
    rows.iter()
        .into_group_map_by(|row| row.simulation)
        .into_iter()
        .sorted_by_key(|(simulation, _)| *simulation)
        .map(|(simulation, group)| {
            let signals = |f: fn(&RepetitionRow) -> i8| -> Vec<i8> {
                group.iter().map(|&row| f(row)).collect()
            };
            SimulationSummary {
                simulation,
                source_file: group[0].source_file.clone(),
                recipient_file: group[0].recipient_file.clone(),
                repetitions: group.len(),
                tier_1: SignalProportions::from_signals(&signals(|r| r.tier1_signal)),
                tier_2: SignalProportions::from_signals(&signals(|r| r.tier2_signal)),
                tier_3_ancestral_to_source: SignalProportions::from_signals(&signals(|r| {
                    r.tier3_ats_signal
                })),
                tier_3_ancestral_to_recipient: SignalProportions::from_signals(&signals(|r| {
                    r.tier3_atr_signal
                })),
            }
        })
        .collect()
}
