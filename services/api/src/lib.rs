mod cli;
mod infra;
mod notify;
mod reporting;
mod routes;
mod server;

use clinic_compliance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
