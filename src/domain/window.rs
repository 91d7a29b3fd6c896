// Window configuration and results
use super::error::{ConfigurationError, FieldRole};
use super::table::{FieldRef, GroupKey, Table};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_WIDTH: i64 = 20;

/// Parameters for one rolling-peak computation over a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub time_field: FieldRef,
    #[serde(default)]
    pub group_fields: Vec<FieldRef>,
    #[serde(default)]
    pub weight_field: Option<FieldRef>,
    #[serde(default = "default_window_width")]
    pub window_width: i64,
    #[serde(default = "default_military")]
    pub military: bool,
}

fn default_window_width() -> i64 {
    DEFAULT_WINDOW_WIDTH
}

fn default_military() -> bool {
    true
}

/// A spec whose field references have been checked against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub time: usize,
    pub groups: Vec<usize>,
    pub weight: Option<usize>,
    pub width: i64,
    pub military: bool,
}

impl WindowSpec {
    pub fn new(time_field: impl Into<FieldRef>, window_width: i64) -> Self {
        Self {
            time_field: time_field.into(),
            group_fields: Vec::new(),
            weight_field: None,
            window_width,
            military: true,
        }
    }

    pub fn group_by(mut self, field: impl Into<FieldRef>) -> Self {
        self.group_fields.push(field.into());
        self
    }

    pub fn weighted_by(mut self, field: impl Into<FieldRef>) -> Self {
        self.weight_field = Some(field.into());
        self
    }

    pub fn twelve_hour(mut self) -> Self {
        self.military = false;
        self
    }

    pub fn validate(&self, table: &Table) -> Result<ResolvedSpec, ConfigurationError> {
        if self.window_width <= 0 {
            return Err(ConfigurationError::InvalidWindowWidth(self.window_width));
        }

        let resolve = |field: &FieldRef, role: FieldRole| {
            field
                .resolve(table)
                .ok_or_else(|| ConfigurationError::MissingField {
                    role,
                    field: field.clone(),
                })
        };

        let time = resolve(&self.time_field, FieldRole::Time)?;
        let groups = self
            .group_fields
            .iter()
            .map(|f| resolve(f, FieldRole::Group))
            .collect::<Result<Vec<_>, _>>()?;
        let weight = self
            .weight_field
            .as_ref()
            .map(|f| resolve(f, FieldRole::Weight))
            .transpose()?;

        Ok(ResolvedSpec {
            time,
            groups,
            weight,
            width: self.window_width,
            military: self.military,
        })
    }
}

/// Aggregate for one `[window_start, window_end)` interval of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowResult {
    pub group: GroupKey,
    pub window_start: i64,
    pub window_end: i64,
    pub entities: f64,
    pub start_time: String,
    pub end_time: String,
}

/// Every window of one group, in ascending start order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupWindows {
    pub group: GroupKey,
    pub windows: Vec<WindowResult>,
}

/// The busiest window of a group, if its range was wide enough for one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPeak {
    pub group: GroupKey,
    pub peak: Option<WindowResult>,
}
