pub mod attendance;
pub mod client;
pub mod error;
pub mod form;
pub mod list;
pub mod models;
pub mod notify;
pub mod report;
pub mod requests;
pub mod session;
pub mod settings;
pub mod validation;

use std::sync::Arc;

use tracing::info;

use crate::attendance::AttendanceController;
use crate::client::PortalClient;
use crate::list::LectureList;
use crate::report::ReportExporter;
use crate::session::SessionStore;
use crate::settings::Settings;

/// Everything the portal views share.
#[derive(Clone)]
pub struct Portal {
    pub settings: Settings,
    pub client: PortalClient,
    pub sessions: SessionStore,
    pub exporter: Arc<ReportExporter>,
}

impl Portal {
    pub fn new(settings: Settings) -> Self {
        Self {
            client: PortalClient::from_settings(&settings),
            sessions: SessionStore::new(&settings.session_file),
            exporter: Arc::new(ReportExporter::new()),
            settings,
        }
    }

    pub fn attendance(&self) -> AttendanceController {
        AttendanceController::new(self.settings.refetch_after_attendance)
    }
}

pub fn init_tracing(settings: &Settings) {
    let env_filter = if settings.debug { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .try_init();
}

/// Fetches every lecture and writes the Excel report.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(&settings);

    let portal = Portal::new(settings);
    info!(api = %portal.client.base_url(), "exporting lecture report");

    let mut list = LectureList::new();
    list.refresh(&portal.client).await?;
    portal
        .exporter
        .write_to(&portal.settings.report_file, list.lectures())
        .await?;
    Ok(())
}
