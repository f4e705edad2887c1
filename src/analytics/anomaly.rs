// ABOUTME: Standard-deviation anomaly detector for KPI series
// ABOUTME: Compares the latest value against the mean and population deviation of the history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deviations from the mean, in standard deviations, treated as normal
pub const DEFAULT_THRESHOLD_STD_DEV: f64 = 2.0;

/// Minimum series length: at least two history points plus the current value
const MIN_SERIES_LEN: usize = 3;

/// Verdict of one detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    /// Within the threshold
    Normal,
    /// Outside the threshold
    AnomalyDetected,
}

impl AnomalyStatus {
    /// Stored form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AnomalyDetected => "anomaly_detected",
        }
    }
}

impl fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics behind a verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Latest value
    pub current: f64,
    /// Mean of the history
    pub average: f64,
    /// Population standard deviation of the history
    pub std_dev: f64,
    /// `|current - average|`
    pub deviation: f64,
    /// `k * std_dev`
    pub threshold: f64,
    /// Verdict
    pub status: AnomalyStatus,
}

impl AnomalyReport {
    /// Whether the latest value is anomalous
    #[must_use]
    pub fn is_anomaly(&self) -> bool {
        self.status == AnomalyStatus::AnomalyDetected
    }
}

/// Flags the latest KPI value when it strays more than `k` standard deviations from the history
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold_std_dev: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_STD_DEV)
    }
}

impl AnomalyDetector {
    /// Detector with threshold `k`
    #[must_use]
    pub const fn new(threshold_std_dev: f64) -> Self {
        Self { threshold_std_dev }
    }

    /// Threshold in standard deviations
    #[must_use]
    pub const fn threshold_std_dev(&self) -> f64 {
        self.threshold_std_dev
    }

    /// Evaluate `values`, oldest first and the current value last
    ///
    /// Returns `None` for fewer than three values.
    #[must_use]
    pub fn detect(&self, values: &[f64]) -> Option<AnomalyReport> {
        if values.len() < MIN_SERIES_LEN {
            return None;
        }
        let (&current, history) = values.split_last()?;

        let count = history.len() as f64;
        let average = history.iter().sum::<f64>() / count;
        let variance = history
            .iter()
            .map(|value| (value - average).powi(2))
            .sum::<f64>()
            / count;
        let std_dev = variance.sqrt();

        let deviation = (current - average).abs();
        let threshold = self.threshold_std_dev * std_dev;
        let status = if deviation > threshold {
            AnomalyStatus::AnomalyDetected
        } else {
            AnomalyStatus::Normal
        };

        Some(AnomalyReport {
            current,
            average,
            std_dev,
            deviation,
            threshold,
            status,
        })
    }
}
