use anyhow::{anyhow, Result};
use colloquy::models::message::Message;
use colloquy::models::response::ModelResponse;
use colloquy::providers::base::Provider;
use colloquy::providers::factory;
use console::style;
use tracing::warn;

use crate::configuration::Settings;

pub const DEFAULT_PROBE_PROMPT: &str = "Say hello and include the model name.";

/// Check that the configured backend answers, trying completion first and chat second
pub async fn execute(
    settings: Settings,
    prompt: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let model = model.unwrap_or_else(|| settings.provider.model().to_string());
    let prompt = prompt.unwrap_or_else(|| DEFAULT_PROBE_PROMPT.to_string());
    let provider = factory::get_provider(settings.provider.into_config())?;

    println!("Probing model {}", style(&model).bold());
    let (capability, response) = probe(provider.as_ref(), &model, &prompt).await?;

    println!("\n{} response (raw):\n{:#?}", capability, response);
    println!(
        "\n{} response (text):\n{}",
        capability,
        style(response.normalize()).green()
    );
    Ok(())
}

pub async fn probe(
    provider: &dyn Provider,
    model: &str,
    prompt: &str,
) -> Result<(&'static str, ModelResponse)> {
    let completion_error = match provider.complete(model, prompt).await {
        Ok(response) => return Ok(("completion", response)),
        Err(err) => {
            warn!(error = %err, "completion failed, trying chat");
            err
        }
    };

    match provider.chat(model, &[Message::other(prompt)]).await {
        Ok(response) => Ok(("chat", response)),
        Err(chat_error) => Err(anyhow!(
            "backend unreachable: completion failed ({}), chat failed ({})",
            completion_error,
            chat_error
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy::errors::ModelCallError;
    use colloquy::providers::mock::{MockCall, MockProvider};

    #[tokio::test]
    async fn test_probe_prefers_completion() -> Result<()> {
        let provider = MockProvider::new().with_completion_text("hello from qwen");

        let (capability, response) = probe(&provider, "qwen", "hi").await?;

        assert_eq!(capability, "completion");
        assert_eq!(response.normalize(), "hello from qwen");
        assert_eq!(provider.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_chat() -> Result<()> {
        let provider = MockProvider::new()
            .with_completion(Err(ModelCallError::Server(500)))
            .with_chat_text("hello via chat");

        let (capability, response) = probe(&provider, "qwen", "hi").await?;

        assert_eq!(capability, "chat");
        assert_eq!(response.normalize(), "hello via chat");
        assert_eq!(
            provider.calls()[1],
            MockCall::Chat {
                model: "qwen".to_string(),
                messages: vec![Message::other("hi")],
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_probe_reports_both_failures() {
        let provider = MockProvider::unavailable();

        let err = probe(&provider, "qwen", "hi").await.unwrap_err();
        assert!(err.to_string().contains("completion capability unavailable"));
        assert!(err.to_string().contains("chat capability unavailable"));
    }
}
