use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    sitelink_cli::main_entry().await
}
