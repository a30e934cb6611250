//! Line-oriented interactive chat.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::cli::context::CliContext;
use crate::core::chat::{ChatSession, Completion, APOLOGY};
use crate::core::conversation::MessageStore;
use crate::core::dispatch::ReplySource;
use crate::core::message::Turn;

const HELP_TEXT: &str = "Commands: /reset clears the conversation, /quit exits. \
Ctrl+C abandons a pending reply.";

pub(crate) fn format_turn(turn: &Turn) -> String {
    let speaker = if turn.is_user() { "you" } else { "assistant" };
    format!("{speaker}> {}", turn.content())
}

/// Persist the session's conversation. A failed save is reported but does
/// not end the chat.
fn persist(ctx: &mut CliContext, session: &ChatSession) {
    ctx.state.conversation = session.conversation().clone();
    if let Err(err) = ctx.save_state() {
        warn!("Failed to save conversation: {err}");
        eprintln!("⚠️  Could not save conversation: {err}");
    }
}

pub async fn run_chat(ctx: &mut CliContext, model: Option<&str>) -> Result<(), Box<dyn Error>> {
    let settings = ctx.session_settings(model);
    let dispatcher = ctx.dispatcher()?;
    let mut session = ChatSession::new(MessageStore::from_conversation(
        ctx.state.conversation.clone(),
    ))
    .with_window_limit(ctx.config.context_window());

    match &settings.credential {
        Some(credential) if settings.remote_enabled => println!(
            "parlance · {} · key {} ({})",
            settings.model,
            credential.redacted(),
            credential.source().as_str()
        ),
        _ => println!("parlance · {} · simulated replies", settings.model),
    }
    println!("{HELP_TEXT}");
    println!();
    for turn in session.conversation() {
        println!("{}", format_turn(turn));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{HELP_TEXT}");
                continue;
            }
            "/reset" => {
                session.reset();
                persist(ctx, &session);
                for turn in session.conversation() {
                    println!("{}", format_turn(turn));
                }
                continue;
            }
            _ => {}
        }

        let pending = match session.begin_send(&line) {
            Ok(pending) => pending,
            Err(err) => {
                eprintln!("⚠️  {err}");
                continue;
            }
        };
        persist(ctx, &session);

        let result = tokio::select! {
            result = pending.run(&dispatcher, &settings) => result,
            _ = tokio::signal::ctrl_c() => {
                session.cancel_pending();
                None
            }
        };

        match session.complete(pending, result) {
            Completion::Replied(reply) => {
                let content = session
                    .conversation()
                    .last()
                    .map(Turn::content)
                    .unwrap_or(reply.content.as_str());
                println!("assistant> {content}");
                if reply.source == ReplySource::Simulated {
                    println!("           (simulated reply)");
                }
            }
            Completion::Failed(err) => {
                println!("assistant> {APOLOGY}");
                eprintln!("❌ {}", err.summary());
            }
            Completion::Discarded => {
                println!();
                println!("(request abandoned)");
            }
        }
        persist(ctx, &session);
    }

    Ok(())
}
