use anyhow::{Context, Result};
use colloquy::agent::Agent;
use colloquy::conversation::Conversation;
use colloquy::models::transcript::Transcript;
use colloquy::providers::factory;
use console::style;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::Settings;

/// Command-line overrides for a conversation run
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub turns: Option<usize>,
    pub pause_ms: Option<u64>,
    pub model: Option<String>,
    pub json: bool,
}

pub async fn execute(settings: Settings, options: ChatOptions) -> Result<()> {
    let turns = options.turns.unwrap_or(settings.conversation.turns);
    let pause = Duration::from_millis(options.pause_ms.unwrap_or(settings.conversation.pause_ms));

    let mut agents = settings.agents();
    if let Some(model) = &options.model {
        agents = agents
            .iter()
            .map(|agent| Agent::new(agent.name(), agent.instructions(), model))
            .collect();
    }

    let provider = factory::get_provider(settings.provider.into_config())
        .context("Failed to create model provider")?;
    let conversation = Conversation::new(Arc::from(provider))
        .with_pause(pause)
        .with_opening_line(settings.conversation.opening_line);

    let mut stdout = std::io::stdout();
    converse(&conversation, &mut agents, turns, options.json, &mut stdout).await?;
    Ok(())
}

/// Run the conversation, echoing each turn as it lands, then write the final transcript
///
/// With `json` set nothing but the transcript array is written, so the output can be piped.
pub async fn converse<W: Write>(
    conversation: &Conversation,
    agents: &mut [Agent],
    turns: usize,
    json: bool,
    out: &mut W,
) -> Result<Transcript> {
    let mut written: std::io::Result<()> = Ok(());
    let transcript = conversation
        .run_with(agents, turns, |turn, utterance| {
            if written.is_ok() && !json {
                written = writeln!(
                    out,
                    "\n--- {} (turn {}) ---\n{}",
                    style(&utterance.speaker).bold().cyan(),
                    turn + 1,
                    utterance.text
                );
            }
        })
        .await?;
    written?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&transcript)?)?;
    } else {
        writeln!(out, "\n{}", style("--- Final transcript ---").dim())?;
        for utterance in &transcript {
            writeln!(out, "{}: {}", utterance.speaker, utterance.text)?;
        }
    }
    Ok(transcript)
}
