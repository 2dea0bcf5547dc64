use anyhow::Result;
use pdf_to_knowledge::agents::{run_agent, AgentKind};
use pdf_to_knowledge::{logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(&config.pipeline.log_level);

    run_agent(AgentKind::Database, &config).await?;

    Ok(())
}
