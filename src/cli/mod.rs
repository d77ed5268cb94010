//! Interactive terminal loop
//!
//! Reads a line, runs it through the [`ChatEngine`] and prints the reply.
//! A failed exchange is reported and the loop keeps going; only an exit
//! command or end of input stops it.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::core::ChatEngine;

/// Commands that end the session, matched case-insensitively
pub const EXIT_COMMANDS: [&str; 2] = ["/exit", "/quit"];

/// What a line of user input asks for
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Exit,
    Skip,
    Message(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Input::Skip;
    }

    if EXIT_COMMANDS
        .iter()
        .any(|cmd| trimmed.eq_ignore_ascii_case(cmd))
    {
        return Input::Exit;
    }

    Input::Message(trimmed)
}

/// Run the session until an exit command or end of input
pub async fn run<R, W>(engine: &mut ChatEngine, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Interactive chat started. Type {} or press Ctrl-C to quit.\n",
        EXIT_COMMANDS[0]
    )?;

    let mut lines = input.lines();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out, "\nExiting.")?;
            break;
        };

        let message = match parse_input(&line) {
            Input::Skip => continue,
            Input::Exit => {
                writeln!(out, "Exiting.")?;
                break;
            }
            Input::Message(message) => message,
        };

        match engine.chat(message).await {
            Ok(response) => {
                if !response.memory_saved {
                    writeln!(out, "Warning: failed to save this exchange to memory.")?;
                }
                tracing::debug!(
                    fragments = response.fragments,
                    logged = response.logged,
                    "Reply ready"
                );
                writeln!(out, "{}: {}\n", engine.model_label(), response.message)?;
            }
            Err(e) => {
                tracing::error!("Exchange failed: {}", e);
                writeln!(out, "Error: {}\n", e)?;
            }
        }
    }

    Ok(())
}
