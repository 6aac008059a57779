mod cli;
mod infra;
mod report;
mod routes;
mod seed;
mod server;

use placement::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
