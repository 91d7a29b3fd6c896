// Rolling peak engine - Sliding-window aggregation and peak selection
//
// Nothing in here logs or touches I/O; callers decide how to report errors.
use crate::domain::error::{AnalysisResult, ComputationError};
use crate::domain::table::{GroupKey, KeyPart, Numeric, Table};
use crate::domain::time_format::format_time;
use crate::domain::window::{GroupPeak, GroupWindows, WindowResult, WindowSpec};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

/// A single observation: its time in minutes and how much it counts for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub minute: Option<f64>,
    pub weight: f64,
}

impl Event {
    pub fn at(minute: f64) -> Self {
        Self {
            minute: Some(minute),
            weight: 1.0,
        }
    }

    pub fn weighted(minute: f64, weight: f64) -> Self {
        Self {
            minute: Some(minute),
            weight,
        }
    }
}

/// Unformatted aggregate for `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCount {
    pub start: i64,
    pub end: i64,
    pub total: f64,
}

/// Partition items into groups using `key_fn`. Items mapped to `None` are
/// dropped. Groups come back in ascending key order.
pub fn group_events<T, K, E, F>(
    items: impl IntoIterator<Item = T>,
    mut key_fn: F,
) -> Result<BTreeMap<K, Vec<Event>>, E>
where
    K: Ord,
    F: FnMut(T) -> Result<Option<(K, Event)>, E>,
{
    let mut groups: BTreeMap<K, Vec<Event>> = BTreeMap::new();
    for item in items {
        if let Some((key, event)) = key_fn(item)? {
            groups.entry(key).or_default().push(event);
        }
    }
    Ok(groups)
}

/// Floored `(min_t, max_t)` over the timed events, `None` if there are none.
pub fn time_span(events: &[Event]) -> Option<(i64, i64)> {
    let mut minutes = events.iter().filter_map(|e| e.minute);
    let first = minutes.next()?;
    let (lo, hi) = minutes.fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));
    Some((lo.floor() as i64, hi.floor() as i64))
}

/// Number of unit-step windows of `width` starting in `[min_t, max_t - width + 1]`.
pub fn window_count(span: (i64, i64), width: i64) -> u64 {
    let (min_t, max_t) = span;
    let n = max_t
        .saturating_sub(min_t)
        .saturating_sub(width)
        .saturating_add(2);
    if n > 0 { n as u64 } else { 0 }
}

/// Aggregate every window of one group.
///
/// Events are sorted by time and two forward-only cursors bracket the
/// members of each window. Counts come from the bracket size; weighted
/// totals add the bracketed weights in time order.
///
/// Fails with [`ComputationError::TimeOutOfRange`] when a window end does
/// not fit in `i64` minutes.
pub fn count_windows(
    events: &[Event],
    width: i64,
    weighted: bool,
) -> Result<Vec<WindowCount>, ComputationError> {
    let Some(span) = time_span(events) else {
        return Ok(Vec::new());
    };
    let total = window_count(span, width);
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut timed: Vec<(f64, f64)> = events
        .iter()
        .filter_map(|e| e.minute.map(|m| (m, e.weight)))
        .collect();
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let out_of_range = |minute| ComputationError::TimeOutOfRange { minute };
    let mut windows = Vec::with_capacity(total.min(1 << 16) as usize);
    let (mut lo, mut hi) = (0usize, 0usize);
    for offset in 0..total {
        // offset < total <= i64::MAX
        let start = span.0.checked_add(offset as i64).ok_or_else(|| out_of_range(span.1))?;
        let end = start.checked_add(width).ok_or_else(|| out_of_range(start))?;
        while hi < timed.len() && timed[hi].0 < end as f64 {
            hi += 1;
        }
        while lo < hi && timed[lo].0 < start as f64 {
            lo += 1;
        }
        let aggregate = if weighted {
            timed[lo..hi].iter().map(|(_, w)| w).sum::<f64>()
        } else {
            (hi - lo) as f64
        };
        windows.push(WindowCount {
            start,
            end,
            total: aggregate,
        });
    }
    Ok(windows)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollingPeakEngine {
    max_windows: Option<u64>,
}

impl RollingPeakEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse computations that would enumerate more than `limit` windows.
    pub fn with_window_limit(limit: u64) -> Self {
        Self {
            max_windows: Some(limit),
        }
    }

    /// Window aggregates for already-grouped events. Fails without producing
    /// anything if a group has no time values or the limit would be exceeded.
    pub fn windows_for_groups<K>(
        &self,
        groups: BTreeMap<K, Vec<Event>>,
        width: i64,
        weighted: bool,
    ) -> Result<Vec<(K, Vec<WindowCount>)>, ComputationError>
    where
        K: Ord + Display,
    {
        let mut planned: u64 = 0;
        for (key, events) in &groups {
            let span = time_span(events).ok_or_else(|| ComputationError::NoTimeValues {
                group: key.to_string(),
            })?;
            planned = planned.saturating_add(window_count(span, width));
        }
        if let Some(limit) = self.max_windows {
            if planned > limit {
                return Err(ComputationError::WindowLimitExceeded {
                    windows: planned,
                    limit,
                });
            }
        }

        groups
            .into_iter()
            .map(|(key, events)| {
                let windows = count_windows(&events, width, weighted)?;
                Ok((key, windows))
            })
            .collect()
    }

    /// Every window of every group, including groups that yield none.
    pub fn group_windows(&self, table: &Table, spec: &WindowSpec) -> AnalysisResult<Vec<GroupWindows>> {
        let resolved = spec.validate(table)?;

        let grouped = group_events(0..table.len(), |row| {
            let mut parts = Vec::with_capacity(resolved.groups.len());
            for &column in &resolved.groups {
                match KeyPart::from_cell(table.cell(row, column)) {
                    Some(part) => parts.push(part),
                    None => return Ok(None),
                }
            }

            let time_cell = table.cell(row, resolved.time);
            let minute = match time_cell.numeric() {
                Numeric::Value(m) => Some(m),
                Numeric::Missing => None,
                Numeric::Invalid => {
                    return Err(ComputationError::NonNumericTime {
                        row,
                        value: time_cell.to_string(),
                    });
                }
            };

            let weight = match resolved.weight {
                None => 1.0,
                Some(column) => {
                    let cell = table.cell(row, column);
                    match cell.numeric() {
                        Numeric::Value(w) => w,
                        Numeric::Missing => 0.0,
                        Numeric::Invalid => {
                            return Err(ComputationError::NonNumericWeight {
                                row,
                                value: cell.to_string(),
                            });
                        }
                    }
                }
            };

            Ok(Some((GroupKey(parts), Event { minute, weight })))
        })?;

        let counted =
            self.windows_for_groups(grouped, resolved.width, resolved.weight.is_some())?;

        Ok(counted
            .into_iter()
            .map(|(group, counts)| {
                let windows = counts
                    .into_iter()
                    .map(|c| WindowResult {
                        group: group.clone(),
                        window_start: c.start,
                        window_end: c.end,
                        entities: c.total,
                        start_time: format_time(c.start, resolved.military),
                        end_time: format_time(c.end, resolved.military),
                    })
                    .collect();
                GroupWindows { group, windows }
            })
            .collect())
    }

    pub fn rolling_windows(&self, table: &Table, spec: &WindowSpec) -> AnalysisResult<Vec<WindowResult>> {
        Ok(self
            .group_windows(table, spec)?
            .into_iter()
            .flat_map(|g| g.windows)
            .collect())
    }
}

/// Enumerate every window of every group, in group-key then start order.
pub fn compute_rolling_windows(table: &Table, spec: &WindowSpec) -> AnalysisResult<Vec<WindowResult>> {
    RollingPeakEngine::new().rolling_windows(table, spec)
}

/// Same enumeration, keeping groups whose range is narrower than the window.
pub fn compute_group_windows(table: &Table, spec: &WindowSpec) -> AnalysisResult<Vec<GroupWindows>> {
    RollingPeakEngine::new().group_windows(table, spec)
}

/// First window with the largest aggregate; NaN aggregates never win.
fn first_max<'a>(windows: impl IntoIterator<Item = &'a WindowResult>) -> Option<&'a WindowResult> {
    let mut best: Option<&WindowResult> = None;
    for window in windows {
        if window.entities.is_nan() {
            continue;
        }
        match best {
            Some(b) if window.entities <= b.entities => {}
            _ => best = Some(window),
        }
    }
    best
}

/// Reduce a flat window enumeration to one peak per group, keeping groups in
/// the order they first appear.
pub fn select_peaks(windows: &[WindowResult]) -> Vec<WindowResult> {
    let mut order: Vec<&GroupKey> = Vec::new();
    let mut by_group: HashMap<&GroupKey, Vec<&WindowResult>> = HashMap::new();
    for window in windows {
        by_group
            .entry(&window.group)
            .or_insert_with(|| {
                order.push(&window.group);
                Vec::new()
            })
            .push(window);
    }

    order
        .into_iter()
        .filter_map(|key| by_group.remove(&key).and_then(|ws| first_max(ws).cloned()))
        .collect()
}

pub fn summarize_peaks(groups: &[GroupWindows]) -> Vec<GroupPeak> {
    groups
        .iter()
        .map(|g| GroupPeak {
            group: g.group.clone(),
            peak: first_max(&g.windows).cloned(),
        })
        .collect()
}
