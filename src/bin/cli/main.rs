use anyhow::Context as _;
use clap::{error::ErrorKind, Parser};
use gizmo_exporter::{
    apis::{
        gizmo::{GizmoClient, ReportType},
        google_sheets::GoogleSheetsClient,
    },
    config::ExporterEnv,
    request_args::{self, RequestArgs},
    tools,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Export a Gizmo report into a Google Sheets spreadsheet.
///
/// Requires GIZMO_USERNAME, GIZMO_PASSWORD, GIZMO_URL and
/// GOOGLE_CREDENTIALS_FILE to be set (a .env file is read as well).
#[derive(Parser, Debug)]
#[command(version)]
struct CliArgs {
    /// The report to export: OverviewReport, FinancialReport,
    /// HostUsageReport or ShiftsLogReport.
    #[arg(long)]
    report: ReportType,

    /// The ID of the spreadsheet to write into.
    #[arg(long, value_parser = non_empty)]
    spreadsheet: String,

    /// A query argument for the report, as KEY=VALUE. Repeat for each
    /// argument; DateFrom and DateTo are required.
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = request_args::parse_key_value)]
    args: Vec<(String, String)>,
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("spreadsheet is not specified".to_owned())
    } else {
        Ok(value.to_owned())
    }
}

fn init_tracing() {
    let default_level = match std::env::var("DEBUG") {
        Ok(debug) if debug.contains("gizmo-exporter") => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Everything needed to export a report, validated before any request is
/// made.
#[derive(Debug)]
struct Invocation {
    report: ReportType,
    spreadsheet: String,
    env: ExporterEnv,
    request_args: RequestArgs,
}

/// Checks the environment (read through `lookup`) and then the `--arg`
/// contents.
fn prepare(args: CliArgs, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Invocation> {
    let CliArgs { report, spreadsheet, args } = args;
    let env = ExporterEnv::from_lookup(lookup)?;
    let request_args = RequestArgs::from_pairs(args)?;
    debug!("request args {:?}", request_args);
    Ok(Invocation { report, spreadsheet, env, request_args })
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let Invocation { report, spreadsheet, env, request_args } =
        prepare(args, |name| std::env::var(name).ok())?;

    let http = reqwest::Client::new();
    let gizmo = GizmoClient::new(http.clone(), env.gizmo)?;

    debug!("setting up spreadsheet api");
    let sheets = GoogleSheetsClient::new(http, &env.google_credentials_file).await?;
    sheets.verify_spreadsheet(&spreadsheet).await?;

    tools::export_report(&gizmo, &sheets, report, &request_args, &spreadsheet)
        .await
        .with_context(|| format!("failed to export {report}"))?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };
    debug!("got parameters {:?}", args);

    if let Err(err) = run(args).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;
    use gizmo_exporter::config::{self, ConfigError};

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "gizmo-exporter",
            "--report",
            "OverviewReport",
            "--spreadsheet",
            "1AbC",
            "--arg",
            "DateFrom=2024-01-01",
            "--arg",
            "DateTo=2024-01-31",
        ])
        .unwrap();
        assert_eq!(args.report, ReportType::OverviewReport);
        assert_eq!(args.spreadsheet, "1AbC");
        assert_eq!(args.args.len(), 2);
        assert_eq!(args.args[1], ("DateTo".to_owned(), "2024-01-31".to_owned()));
    }

    #[test]
    fn rejects_bad_flags() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["gizmo-exporter", "--spreadsheet", "1AbC"];
            argv.extend_from_slice(extra);
            CliArgs::try_parse_from(argv)
        };
        assert!(parse(&["--report", "BogusReport"]).is_err());
        assert!(parse(&[]).is_err());
        assert!(parse(&["--report", "OverviewReport", "--arg", "DateFrom"]).is_err());
        assert!(parse(&["--report", "OverviewReport", "--verbose"]).is_err());
        let blank = ["gizmo-exporter", "--report", "OverviewReport", "--spreadsheet", " "];
        assert!(CliArgs::try_parse_from(blank).is_err());
    }

    fn args_with(extra: &[&str]) -> CliArgs {
        let mut argv =
            vec!["gizmo-exporter", "--report", "OverviewReport", "--spreadsheet", "1AbC"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    fn full_env(name: &str) -> Option<String> {
        match name {
            config::ENV_GIZMO_USERNAME => Some("admin".to_owned()),
            config::ENV_GIZMO_PASSWORD => Some("hunter2".to_owned()),
            config::ENV_GIZMO_URL => Some("10.0.0.5:8080".to_owned()),
            config::ENV_GOOGLE_CREDENTIALS_FILE => Some("/nonexistent/credentials.json".to_owned()),
            _ => None,
        }
    }

    #[test]
    fn prepare_collects_validated_inputs() {
        let args = args_with(&["--arg", "DateFrom=2024-01-01", "--arg", "DateTo=2024-01-31"]);
        let invocation = prepare(args, full_env).unwrap();
        assert_eq!(invocation.report, ReportType::OverviewReport);
        assert_eq!(invocation.spreadsheet, "1AbC");
        assert_eq!(invocation.env.gizmo.username, "admin");
        assert_eq!(invocation.request_args.date_to(), "2024-01-31");
    }

    #[test]
    fn prepare_rejects_missing_date_to() {
        let args = args_with(&["--arg", "DateFrom=2024-01-01", "--arg", "OperatorId=4"]);
        let err = prepare(args, full_env).unwrap_err();
        assert_eq!(
            err.downcast_ref::<request_args::ArgsError>(),
            Some(&request_args::ArgsError::MissingDateTo)
        );
    }

    #[test]
    fn prepare_checks_environment_before_args() {
        let only_user =
            |name: &str| (name == config::ENV_GIZMO_USERNAME).then(|| "admin".to_owned());
        let err = prepare(args_with(&[]), only_user).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingEnv(config::ENV_GIZMO_PASSWORD))
        );
    }
}
