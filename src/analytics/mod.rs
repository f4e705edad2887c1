// ABOUTME: KPI analytics for growth agents
// ABOUTME: Statistical anomaly detection whose verdicts are kept in the decision log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

mod anomaly;

pub use anomaly::{AnomalyDetector, AnomalyReport, AnomalyStatus, DEFAULT_THRESHOLD_STD_DEV};
