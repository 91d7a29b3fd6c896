// Analysis report domain model
use super::table::GroupKey;
use super::window::{GroupPeak, WindowResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl AnalysisReport {
    pub fn new(sources: Vec<SourceReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            sources,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Completed {
        group_columns: Vec<String>,
        peaks: Vec<PeakRow>,
        #[serde(skip_serializing_if = "Option::is_none")]
        windows: Option<Vec<WindowResult>>,
    },
    Failed {
        message: String,
    },
}

/// One line of the per-group peak table. Groups too short for a single
/// window keep their key with the peak columns left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRow {
    pub group: GroupKey,
    pub peak_period_start: Option<String>,
    pub peak_period_end: Option<String>,
    pub entities_count: Option<f64>,
    pub window_start: Option<i64>,
    pub window_end: Option<i64>,
}

impl From<GroupPeak> for PeakRow {
    fn from(group_peak: GroupPeak) -> Self {
        match group_peak.peak {
            Some(peak) => Self {
                group: group_peak.group,
                peak_period_start: Some(peak.start_time),
                peak_period_end: Some(peak.end_time),
                entities_count: Some(peak.entities),
                window_start: Some(peak.window_start),
                window_end: Some(peak.window_end),
            },
            None => Self {
                group: group_peak.group,
                peak_period_start: None,
                peak_period_end: None,
                entities_count: None,
                window_start: None,
                window_end: None,
            },
        }
    }
}
