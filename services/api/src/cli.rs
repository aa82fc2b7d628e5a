use crate::reporting::{run_refresh, run_report, RefreshArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use clinic_compliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "clinic-compliance",
    about = "Waiting-time compliance and doctor licensing reports for outpatient visit exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print a compliance report for a visit export
    Report(ReportArgs),
    /// Rerun the report, write derived tables and raise an alert if needed
    Refresh(RefreshArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Refresh(args) => run_refresh(args).await,
    }
}
