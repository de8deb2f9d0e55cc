#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = elearning_api::run().await {
        eprintln!("elearning-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
