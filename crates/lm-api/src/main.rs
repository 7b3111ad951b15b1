#[tokio::main]
async fn main() {
    if let Err(err) = lm_api::run().await {
        tracing::error!(error = %err, "lm-api failed");
        std::process::exit(1);
    }
}
