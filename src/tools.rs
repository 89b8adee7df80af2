pub mod overview;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    apis::{
        gizmo::{report::OverviewReport, GizmoClient, GizmoError, ReportType},
        google_sheets::{SheetsApi, SheetsError},
    },
    format::FormatError,
    request_args::RequestArgs,
};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Gizmo(#[from] GizmoError),
    #[error(transparent)]
    Sheets(#[from] SheetsError),
    #[error("failed to format report value: {0}")]
    Format(#[from] FormatError),
}

/// Fetches `report` from Gizmo and writes it into the spreadsheet.
pub async fn export_report<S: SheetsApi + ?Sized>(
    gizmo: &GizmoClient,
    sheets: &S,
    report: ReportType,
    args: &RequestArgs,
    spreadsheet_id: &str,
) -> Result<(), ReportError> {
    info!(
        "querying report {}, args {}",
        report,
        args.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(", ")
    );
    let query = args.to_query();

    match report {
        // only the overview layout exists; the other kinds reuse it
        ReportType::OverviewReport
        | ReportType::FinancialReport
        | ReportType::HostUsageReport
        | ReportType::ShiftsLogReport => {
            let fetched: OverviewReport = gizmo.get_report(report, &query).await?;
            debug!("report {:?}", fetched);
            overview::upload_overview_report(sheets, spreadsheet_id, &fetched).await
        }
    }
}
