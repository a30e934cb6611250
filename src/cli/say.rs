//! One-shot "say" command

use std::error::Error;

use crate::cli::context::CliContext;
use crate::core::chat::{ChatSession, Completion};
use crate::core::dispatch::ReplySource;

pub async fn run_say(
    ctx: &CliContext,
    prompt: Vec<String>,
    model: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: parlance say <prompt>".into());
    }

    let settings = ctx.session_settings(model);
    let dispatcher = ctx.dispatcher()?;
    let mut session = ChatSession::default().with_window_limit(ctx.config.context_window());

    match session.send(&dispatcher, &settings, &prompt).await? {
        Completion::Replied(reply) => {
            println!("{}", reply.content);
            if reply.source == ReplySource::Simulated {
                eprintln!("(simulated reply)");
            }
            Ok(())
        }
        Completion::Failed(err) => Err(err.summary().into()),
        Completion::Discarded => Err("request abandoned".into()),
    }
}
