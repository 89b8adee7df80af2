use serde_json::Value;
use tracing::{debug, info};

use crate::{
    apis::{
        gizmo::report::{ChartEntry, OperatorStatistics, OverviewReport, UtilizationEntry},
        google_sheets::{self, Row, SheetsApi},
    },
    format::{self, FormatError},
};

use super::ReportError;

pub const SHEET_MAIN: &str = "Main";
pub const SHEET_FINANCIAL: &str = "Financial";
pub const SHEET_REVENUE_PER_GROUP: &str = "RevenuePerGroup";
pub const SHEET_UTILIZATION: &str = "Utilization";
pub const SHEET_OPERATORS: &str = "Operators";

pub const MAIN_HEADER: &[&str] = &[
    "Date From",
    "Date To",
    "Average member usage period in minutes",
    "Average guest usage period in hours",
    "Average utilization %",
    "Unique member logins",
    "Unique guest logins",
    "New members",
    "Total members",
    "Banned members",
    "Total pay in out",
    "Total revenue",
    "Average revenue per member",
    "Average revenue per guest",
];

pub const FINANCIAL_HEADER: &[&str] = &["Date", "Value"];

pub const REVENUE_PER_GROUP_HEADER: &[&str] = &["Date From", "Date To", "Name", "Value"];

pub const UTILIZATION_HEADER: &[&str] =
    &["Date", "Utilization %", "Total seconds available", "Used seconds"];

pub const OPERATORS_HEADER: &[&str] = &[
    "Date From",
    "Date To",
    "Operator ID",
    "Operator Name",
    "Minutes worked",
    "Hours worked in minutes",
    "Minutes sold",
    "Hours sold in minutes",
    "Products sold",
    "Time offers sold",
    "Bundles sold",
    "Voids",
    "Register transactions total",
    "Revenue",
];

fn mk_row(cells: impl IntoIterator<Item = Value>) -> Row {
    cells.into_iter().collect()
}

pub fn main_rows(report: &OverviewReport) -> Result<Vec<Row>, FormatError> {
    let counters = &report.member_counters;
    Ok(vec![mk_row([
        Value::from(format::report_date(&report.date_from)?),
        Value::from(format::report_date(&report.date_to)?),
        Value::from(format::minutes(&report.average_member_usage_period_minutes)?),
        Value::from(format::minutes(&report.average_guest_usage_period_minutes)?),
        Value::from(format::decimal(report.average_utilization_percentage)),
        Value::from(report.unique_members_logins),
        Value::from(report.unique_guests_logins),
        Value::from(counters.new_members),
        Value::from(counters.total_members),
        Value::from(counters.banned_members),
        Value::from(report.total_pay_in_out),
        Value::from(report.total_revenue),
        Value::from(format::decimal(report.average_revenue_per_member)),
        Value::from(format::decimal(report.average_revenue_per_guest)),
    ])])
}

pub fn financial_rows(chart: &[ChartEntry]) -> Result<Vec<Row>, FormatError> {
    chart
        .iter()
        .map(|entry| {
            Ok(mk_row([
                Value::from(format::chart_date(&entry.name)?),
                Value::from(format::decimal(entry.value)),
            ]))
        })
        .collect()
}

pub fn revenue_per_group_rows(
    groups: &[ChartEntry],
    date_from: &str,
    date_to: &str,
) -> Result<Vec<Row>, FormatError> {
    let date_from = format::report_date(date_from)?;
    let date_to = format::report_date(date_to)?;
    Ok(groups
        .iter()
        .map(|group| {
            mk_row([
                Value::from(date_from.as_str()),
                Value::from(date_to.as_str()),
                Value::from(group.name.as_str()),
                Value::from(format::decimal(group.value)),
            ])
        })
        .collect())
}

pub fn utilization_rows(chart: &[UtilizationEntry]) -> Result<Vec<Row>, FormatError> {
    chart
        .iter()
        .map(|entry| {
            Ok(mk_row([
                Value::from(format::chart_date(&entry.name)?),
                Value::from(format::decimal(entry.value)),
                Value::from(entry.total_seconds),
                Value::from(entry.used_seconds),
            ]))
        })
        .collect()
}

pub fn operator_rows(
    operators: &[OperatorStatistics],
    date_from: &str,
    date_to: &str,
) -> Result<Vec<Row>, FormatError> {
    let date_from = format::report_date(date_from)?;
    let date_to = format::report_date(date_to)?;
    operators
        .iter()
        .map(|op| {
            Ok(mk_row([
                Value::from(date_from.as_str()),
                Value::from(date_to.as_str()),
                Value::from(op.operator_id),
                Value::from(op.operator_name.as_str()),
                Value::from(op.minutes_worked),
                Value::from(format::minutes(&op.hours_worked)?),
                Value::from(op.minutes_sold),
                Value::from(format::minutes(&op.hours_sold)?),
                Value::from(op.products_sold),
                Value::from(op.time_offers_sold),
                Value::from(op.bundles_sold),
                Value::from(op.voids),
                Value::from(op.register_transactions_total),
                Value::from(op.revenue),
            ]))
        })
        .collect()
}

/// Makes sure the sheet exists, then appends `rows` to it in one call.
async fn fill_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    sheet_name: &str,
    header: &[&str],
    rows: Vec<Row>,
) -> Result<(), ReportError> {
    google_sheets::ensure_sheet(sheets, spreadsheet_id, sheet_name, header).await?;
    if rows.is_empty() {
        debug!("no rows for {} sheet", sheet_name);
        return Ok(());
    }
    debug!("appending {} rows to {} sheet", rows.len(), sheet_name);
    sheets.append_rows(spreadsheet_id, &google_sheets::append_range(sheet_name), rows).await?;
    Ok(())
}

pub async fn fill_main_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    report: &OverviewReport,
) -> Result<(), ReportError> {
    let rows = main_rows(report)?;
    fill_sheet(sheets, spreadsheet_id, SHEET_MAIN, MAIN_HEADER, rows).await
}

pub async fn fill_financial_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    chart: &[ChartEntry],
) -> Result<(), ReportError> {
    let rows = financial_rows(chart)?;
    fill_sheet(sheets, spreadsheet_id, SHEET_FINANCIAL, FINANCIAL_HEADER, rows).await
}

pub async fn fill_revenue_per_group_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    groups: &[ChartEntry],
    date_from: &str,
    date_to: &str,
) -> Result<(), ReportError> {
    let rows = revenue_per_group_rows(groups, date_from, date_to)?;
    fill_sheet(sheets, spreadsheet_id, SHEET_REVENUE_PER_GROUP, REVENUE_PER_GROUP_HEADER, rows)
        .await
}

pub async fn fill_utilization_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    chart: &[UtilizationEntry],
) -> Result<(), ReportError> {
    let rows = utilization_rows(chart)?;
    fill_sheet(sheets, spreadsheet_id, SHEET_UTILIZATION, UTILIZATION_HEADER, rows).await
}

pub async fn fill_operators_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    operators: &[OperatorStatistics],
    date_from: &str,
    date_to: &str,
) -> Result<(), ReportError> {
    let rows = operator_rows(operators, date_from, date_to)?;
    fill_sheet(sheets, spreadsheet_id, SHEET_OPERATORS, OPERATORS_HEADER, rows).await
}

/// Uploads every section of the report, one sheet after the other. Sheets
/// filled before a failure keep their appended rows.
pub async fn upload_overview_report<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    report: &OverviewReport,
) -> Result<(), ReportError> {
    info!("uploading report to spreadsheet {}", spreadsheet_id);
    fill_main_sheet(sheets, spreadsheet_id, report).await?;
    fill_financial_sheet(sheets, spreadsheet_id, &report.financial_chart).await?;
    fill_revenue_per_group_sheet(
        sheets,
        spreadsheet_id,
        &report.revenue_per_group,
        &report.date_from,
        &report.date_to,
    )
    .await?;
    fill_utilization_sheet(sheets, spreadsheet_id, &report.utilization_chart).await?;
    fill_operators_sheet(
        sheets,
        spreadsheet_id,
        &report.operators_statistics,
        &report.date_from,
        &report.date_to,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::apis::gizmo::report::tests::sample_overview;
    use crate::apis::google_sheets::tests::{Call, FakeSheets};

    fn sample_report() -> OverviewReport {
        serde_json::from_value(sample_overview()).unwrap()
    }

    #[test]
    fn main_row_matches_header() {
        let rows = main_rows(&sample_report()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), MAIN_HEADER.len());
        assert_eq!(
            rows[0],
            vec![
                json!("01.01.2024"),
                json!("31.01.2024"),
                json!(90),
                json!(45),
                json!("37,13"),
                json!(120),
                json!(35),
                json!(8),
                json!(410),
                json!(3),
                json!(-20.0),
                json!(5000.0),
                json!("41,67"),
                json!("12,50"),
            ]
        );
    }

    #[test]
    fn financial_rows_reformat_dates() {
        let rows = financial_rows(&sample_report().financial_chart).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("01.01.2024"), json!("150,00")],
                vec![json!("02.01.2024"), json!("99,90")],
            ]
        );
    }

    #[test]
    fn revenue_rows_carry_report_dates() {
        let report = sample_report();
        let rows =
            revenue_per_group_rows(&report.revenue_per_group, &report.date_from, &report.date_to)
                .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            vec![json!("01.01.2024"), json!("31.01.2024"), json!("Guests"), json!("1000,00")]
        );
        assert!(rows.iter().all(|row| row.len() == REVENUE_PER_GROUP_HEADER.len()));
    }

    #[test]
    fn utilization_rows_match_header() {
        let rows = utilization_rows(&sample_report().utilization_chart).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("01.01.2024"), json!("12,50"), json!(86400), json!(10800)],
                vec![json!("02.01.2024"), json!("0,00"), json!(86400), json!(0)],
            ]
        );
    }

    #[test]
    fn operator_rows_convert_durations() {
        let report = sample_report();
        let statistics = &report.operators_statistics;
        let rows = operator_rows(statistics, &report.date_from, &report.date_to).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), OPERATORS_HEADER.len());
        assert_eq!(
            rows[0],
            vec![
                json!("01.01.2024"),
                json!("31.01.2024"),
                json!(1),
                json!("Alice"),
                json!(195),
                json!(195),
                json!(600),
                json!(600),
                json!(12),
                json!(4),
                json!(2),
                json!(1),
                json!(250.5),
                json!(1234.5),
            ]
        );
    }

    #[test]
    fn malformed_duration_fails_the_section() {
        let mut report = sample_report();
        report.operators_statistics[0].hours_sold = "ten hours".to_owned();
        let err =
            operator_rows(&report.operators_statistics, &report.date_from, &report.date_to)
                .unwrap_err();
        assert!(matches!(err, FormatError::MalformedDuration(_)));
    }

    #[test]
    fn empty_sections_produce_no_rows() {
        let report = sample_report();
        assert!(financial_rows(&[]).unwrap().is_empty());
        assert!(operator_rows(&[], &report.date_from, &report.date_to).unwrap().is_empty());
    }

    #[tokio::test]
    async fn uploads_sections_in_order() {
        let sheets = FakeSheets::default();
        upload_overview_report(&sheets, "abc", &sample_report()).await.unwrap();

        let created: Vec<String> = sheets
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddSheet(title) => Some(title),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![
                SHEET_MAIN,
                SHEET_FINANCIAL,
                SHEET_REVENUE_PER_GROUP,
                SHEET_UTILIZATION,
                SHEET_OPERATORS,
            ]
        );

        let operators = sheets.rows_of(SHEET_OPERATORS);
        assert_eq!(operators.len(), 2);
        assert_eq!(operators[0], OPERATORS_HEADER.iter().map(|h| json!(h)).collect::<Vec<_>>());
        assert_eq!(&operators[1][..3], &[json!("01.01.2024"), json!("31.01.2024"), json!(1)]);
        assert_eq!(operators[1][5], json!(195));

        assert_eq!(sheets.rows_of(SHEET_FINANCIAL).len(), 3);
        assert_eq!(sheets.rows_of(SHEET_MAIN).len(), 2);
    }

    #[tokio::test]
    async fn second_upload_appends_without_new_headers() {
        let sheets = FakeSheets::default();
        let report = sample_report();
        upload_overview_report(&sheets, "abc", &report).await.unwrap();
        upload_overview_report(&sheets, "abc", &report).await.unwrap();

        let adds = sheets.calls().into_iter().filter(|c| matches!(c, Call::AddSheet(_))).count();
        assert_eq!(adds, 5);
        // header plus two copies of the data
        assert_eq!(sheets.rows_of(SHEET_REVENUE_PER_GROUP).len(), 5);
    }

    #[tokio::test]
    async fn existing_sheet_with_no_rows_gets_no_append() {
        let sheets = FakeSheets::with_sheets(&[SHEET_FINANCIAL]);
        fill_financial_sheet(&sheets, "abc", &[]).await.unwrap();
        assert_eq!(sheets.calls(), vec![Call::SheetTitles]);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_sheets() {
        let sheets = FakeSheets {
            fail_appends_to: Some(google_sheets::append_range(SHEET_UTILIZATION)),
            ..Default::default()
        };
        let err = upload_overview_report(&sheets, "abc", &sample_report()).await.unwrap_err();
        assert!(matches!(err, ReportError::Sheets(_)));

        assert_eq!(sheets.rows_of(SHEET_REVENUE_PER_GROUP).len(), 3);
        assert!(sheets.rows_of(SHEET_OPERATORS).is_empty());
    }
}
