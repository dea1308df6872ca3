use persona_agent::{ConversationMessage, Orchestrator, Settings};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;
    let orchestrator = Orchestrator::from_settings(&settings)?;

    println!(
        "Chatting with {}. Type /quit to leave.\n",
        orchestrator.persona().name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ConversationMessage> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" {
            break;
        }

        match orchestrator.converse_transcript(message, history.clone()).await {
            Ok(transcript) => {
                println!("\n{}\n", transcript.answer);
                // Carry the whole turn forward, minus the system instruction
                history = transcript.messages.into_iter().skip(1).collect();
            }
            Err(e) => {
                error!("Chat turn failed: {}", e);
                println!("\nSorry, I ran into a problem answering that: {}\n", e);
            }
        }
    }

    Ok(())
}
