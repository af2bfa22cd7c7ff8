// Lambda bootstrap entry point for the Worker function

pub use omnisummary::worker::handler;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    omnisummary::setup_logging();
    lambda_runtime::run(lambda_runtime::service_fn(handler)).await
}
