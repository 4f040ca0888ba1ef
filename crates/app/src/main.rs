mod app;
mod client;
mod config;
mod error;
mod view;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "liryna_budget={level},engine={level},report={level}",
            level = config.level
        ))
        .init();

    let mut app = app::App::new(config)?;
    if let Err(err) = app.run(command).await {
        tracing::error!("{err}");
        return Err(err);
    }
    Ok(())
}
