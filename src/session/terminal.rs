use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{ChatLog, ImageDisplay, SessionTurnHandler, TurnOutcome};
use crate::state::AppState;

const BANNER: &str = "Medical chatbot. Ask about a disease; /history reprints the conversation, /quit exits.";
const NO_IMAGE_NOTICE: &str = "No image found for this disease.";

enum Command {
    History,
    Quit,
    Prompt,
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/quit" | "/exit" => Command::Quit,
        "/history" => Command::History,
        _ => Command::Prompt,
    }
}

/// Runs the interactive session on stdin/stdout until `/quit` or EOF.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut handler = SessionTurnHandler::new(&state.pipeline, state.image_lookup.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{}", BANNER);
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match parse_command(&line) {
            Command::Quit => break,
            Command::History => print!("{}", render_history(handler.log())),
            Command::Prompt => {
                let outcome = handler.handle_turn(&line).await;
                print!("{}", render_outcome(&outcome));
            }
        }
    }

    Ok(())
}

pub fn render_history(log: &ChatLog) -> String {
    let mut out = String::new();
    for message in log.messages() {
        out.push_str(&format!(
            "[{}] {}: {}\n",
            message.timestamp.format("%H:%M:%S"),
            message.role.label(),
            message.content
        ));
    }
    out
}

pub fn render_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Ignored => String::new(),
        TurnOutcome::Failed { notice } => format!("{}\n", notice),
        TurnOutcome::Answered { reply, image } => {
            let mut out = format!("assistant: {}\n", reply);
            match image {
                Some(ImageDisplay::Found { url, caption }) => {
                    out.push_str(&format!("image: {} ({})\n", url, caption));
                }
                Some(ImageDisplay::NotFound) => {
                    out.push_str(NO_IMAGE_NOTICE);
                    out.push('\n');
                }
                None => {}
            }
            out
        }
    }
}
