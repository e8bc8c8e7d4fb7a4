use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = blog_publish::build()?;
    let addr = app.config.address();

    tracing::info!(%addr, media = %app.config.public_base_url, "blog publishing server listening");

    app.listen().await?;

    Ok(())
}
