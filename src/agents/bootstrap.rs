use std::time::Duration;

use super::gemini::GeminiClient;
use super::AgentKind;
use crate::config::Config;
use crate::error::Result;
use crate::schemas::SCHEMA_VERSION;

/// Greeting used to check model connectivity at startup
pub const SMOKE_TEST_PROMPT: &str = "Hello! What are you and what can you do?";

const PREVIEW_CHARS: usize = 200;

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Send the greeting prompt as `kind` and return the model's reply
pub async fn smoke_test(kind: AgentKind, config: &Config, api_key: String) -> Result<String> {
    let client = GeminiClient::new(
        &config.gemini.api_base,
        api_key,
        config.agent(kind).model.clone(),
        Duration::from_secs(config.gemini.timeout_secs),
    )?;
    client.generate(kind.instruction(), SMOKE_TEST_PROMPT).await
}

/// Start an agent process: log its setup, verify the API key, run the smoke test.
///
/// A missing API key is logged and ends startup without an error; a failed
/// smoke test is returned to the caller.
pub async fn run_agent(kind: AgentKind, config: &Config) -> Result<()> {
    log::info!("{} starting...", kind.display_name());
    log::info!("Environment: {}", config.pipeline.environment);
    log::info!("Model: {}", config.agent(kind).model);
    log::info!("Message contract: v{}", SCHEMA_VERSION);

    let Some((source, api_key)) = config.api_key() else {
        log::error!(
            "{} environment variable not set!",
            config.gemini.api_key_envs.join(" or ")
        );
        return Ok(());
    };
    log::info!("API key configured from {}", source);

    log::info!("Testing Gemini connectivity...");
    match smoke_test(kind, config, api_key).await {
        Ok(response) => {
            log::info!("Gemini response: {}", preview(&response, PREVIEW_CHARS));
            log::info!("Gemini connectivity test passed");
        }
        Err(e) => {
            log::error!("Gemini connectivity test failed: {}", e);
            return Err(e);
        }
    }

    log::info!("{} ready", kind.display_name());
    Ok(())
}
