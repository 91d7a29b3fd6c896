// Peak analysis service - Use case for computing peak windows per uploaded source
use crate::application::rolling_peak::{summarize_peaks, RollingPeakEngine};
use crate::application::table_source::{SourceUpload, TableSource};
use crate::domain::report::{AnalysisReport, PeakRow, SourceOutcome, SourceReport};
use crate::domain::window::WindowSpec;
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// One uploaded source together with the parameters chosen for it.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    #[serde(flatten)]
    pub upload: SourceUpload,
    pub spec: WindowSpec,
}

#[derive(Clone)]
pub struct PeakAnalysisService {
    source: Arc<dyn TableSource>,
    engine: RollingPeakEngine,
}

impl PeakAnalysisService {
    pub fn new(source: Arc<dyn TableSource>, engine: RollingPeakEngine) -> Self {
        Self { source, engine }
    }

    /// Analyze every source independently. A failing source is reported in
    /// place and does not affect the others.
    pub async fn analyze(&self, requests: Vec<AnalysisRequest>, include_windows: bool) -> AnalysisReport {
        let start_time = Instant::now();
        let total = requests.len();

        let tasks = requests
            .into_iter()
            .map(|request| self.analyze_source(request, include_windows));
        let sources = futures::future::join_all(tasks).await;

        let failed = sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Failed { .. }))
            .count();
        tracing::info!(
            "Analyzed {} sources ({} failed) in {} ms",
            total,
            failed,
            start_time.elapsed().as_millis()
        );

        AnalysisReport::new(sources)
    }

    async fn analyze_source(&self, request: AnalysisRequest, include_windows: bool) -> SourceReport {
        let name = request.upload.name.clone();

        let outcome = match self.run(request, include_windows).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Error calculating peak rolling time for {}: {:#}", name, e);
                SourceOutcome::Failed {
                    message: format!("{:#}", e),
                }
            }
        };

        SourceReport { name, outcome }
    }

    async fn run(&self, request: AnalysisRequest, include_windows: bool) -> anyhow::Result<SourceOutcome> {
        let table = self.source.load(&request.upload).await?;
        tracing::debug!(
            "Computing {}-minute windows for {} ({} rows)",
            request.spec.window_width,
            request.upload.name,
            table.len()
        );

        let engine = self.engine;
        let spec = request.spec;
        let outcome = tokio::task::spawn_blocking(move || {
            let groups = engine.group_windows(&table, &spec)?;

            let group_columns = spec
                .group_fields
                .iter()
                .filter_map(|f| f.resolve(&table))
                .map(|i| table.columns[i].clone())
                .collect();
            let peaks = summarize_peaks(&groups)
                .into_iter()
                .map(PeakRow::from)
                .collect();
            let windows = include_windows.then(|| groups.into_iter().flat_map(|g| g.windows).collect());

            anyhow::Ok(SourceOutcome::Completed {
                group_columns,
                peaks,
                windows,
            })
        })
        .await
        .context("Peak computation task failed")??;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{CellValue, Table};
    use crate::infrastructure::upload_source::UploadTableSource;
    use async_trait::async_trait;

    struct FixedSource(Table);

    #[async_trait]
    impl TableSource for FixedSource {
        async fn load(&self, _upload: &SourceUpload) -> anyhow::Result<Table> {
            Ok(self.0.clone())
        }
    }

    fn request(name: &str, content: &str, spec: WindowSpec) -> AnalysisRequest {
        AnalysisRequest {
            upload: SourceUpload::new(name, content),
            spec,
        }
    }

    fn upload_service() -> PeakAnalysisService {
        PeakAnalysisService::new(Arc::new(UploadTableSource::new()), RollingPeakEngine::new())
    }

    #[tokio::test]
    async fn test_analyze_reports_peak_per_group() {
        let content = "time,stop\n0,A\n5,A\n10,A\n50,A\n100,B\n101,B\n102,B\n";
        let spec = WindowSpec::new("time", 10).group_by("stop");

        let report = upload_service()
            .analyze(vec![request("stops.csv", content, spec)], false)
            .await;

        assert_eq!(report.sources.len(), 1);
        let SourceOutcome::Completed {
            group_columns,
            peaks,
            windows,
        } = &report.sources[0].outcome
        else {
            panic!("expected completed outcome");
        };
        assert_eq!(group_columns, &vec!["stop".to_string()]);
        assert!(windows.is_none());
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].peak_period_start.as_deref(), Some("00:00"));
        assert_eq!(peaks[0].peak_period_end.as_deref(), Some("00:10"));
        assert_eq!(peaks[0].entities_count, Some(2.0));
        // B spans 3 minutes, too short for a 10-minute window
        assert_eq!(peaks[1].entities_count, None);
    }

    #[tokio::test]
    async fn test_failed_source_does_not_affect_others() {
        let good = request("good.csv", "t\n0\n1\n2\n", WindowSpec::new("t", 2));
        let missing = request("bad.csv", "t\n0\n1\n", WindowSpec::new("time", 2));
        let unsupported = request("notes.json", "{}", WindowSpec::new("t", 2));

        let report = upload_service()
            .analyze(vec![missing, good, unsupported], true)
            .await;

        let names: Vec<&str> = report.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["bad.csv", "good.csv", "notes.json"]);

        match &report.sources[0].outcome {
            SourceOutcome::Failed { message } => assert!(message.contains("'time'")),
            other => panic!("unexpected outcome {:?}", other),
        }
        match &report.sources[1].outcome {
            SourceOutcome::Completed { windows, .. } => {
                assert_eq!(windows.as_ref().map(Vec::len), Some(2));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(matches!(report.sources[2].outcome, SourceOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_analyze_workbook_upload() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let workbook = STANDARD.encode(include_bytes!("../../tests/fixtures/arrivals.xlsx"));
        let spec = WindowSpec::new("time", 10)
            .group_by("stop")
            .weighted_by("riders");

        let report = upload_service()
            .analyze(vec![request("arrivals.xlsx", &workbook, spec)], false)
            .await;

        let SourceOutcome::Completed { peaks, .. } = &report.sources[0].outcome else {
            panic!("unexpected outcome {:?}", report.sources[0].outcome);
        };
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].peak_period_start.as_deref(), Some("00:00"));
        assert_eq!(peaks[0].entities_count, Some(7.0));
        assert_eq!(peaks[1].entities_count, None);
    }

    #[tokio::test]
    async fn test_window_limit_is_reported_as_failure() {
        let table = Table::new(
            vec!["t".into()],
            vec![vec![CellValue::Int(0)], vec![CellValue::Int(1_000)]],
        );
        let service = PeakAnalysisService::new(
            Arc::new(FixedSource(table)),
            RollingPeakEngine::with_window_limit(100),
        );

        let report = service
            .analyze(vec![request("big.csv", "", WindowSpec::new("t", 10))], false)
            .await;

        match &report.sources[0].outcome {
            SourceOutcome::Failed { message } => assert!(message.contains("limit is 100")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "name": "arrivals.txt",
            "content": "5,A\n",
            "has_header": false,
            "spec": {"time_field": 0, "group_fields": [1]}
        }"#;
        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert!(!request.upload.has_header);
        assert_eq!(request.spec.window_width, 20);
        assert_eq!(request.spec.group_fields.len(), 1);
    }
}
