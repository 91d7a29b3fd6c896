// Application state for HTTP handlers
use crate::application::peak_service::PeakAnalysisService;

#[derive(Clone)]
pub struct AppState {
    pub peak_service: PeakAnalysisService,
}
