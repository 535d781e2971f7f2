//! Interactive console session with the documentation agent.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::agent::DocumentationAgent;

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

/// What happened during one console session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub answered: usize,
    pub failed: usize,
}

/// Read questions from `input` and write answers to `output` until an exit
/// command or end of input.
///
/// Blank lines are skipped. A failed turn is reported and the session goes
/// on; only I/O errors end it early.
pub async fn run_console<R, W>(
    agent: &DocumentationAgent,
    input: R,
    output: &mut W,
) -> std::io::Result<ConsoleSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ConsoleSummary::default();
    let mut lines = input.lines();

    loop {
        output.write_all(b"\nYou: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            info!("Input closed, ending session");
            break;
        };
        let question = line.trim();
        if is_exit_command(question) {
            output.write_all(b"Agent: Goodbye!\n").await?;
            break;
        }
        if question.is_empty() {
            continue;
        }

        let reply = match agent.run(question).await {
            Ok(answer) => {
                summary.answered += 1;
                format!("\nAgent: {answer}\n")
            }
            Err(err) => {
                error!("Error processing query: {err}");
                summary.failed += 1;
                format!("Agent: Sorry, I encountered an error processing your request: {err}\n")
            }
        };
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(summary)
}

fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}
