//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod chat;
pub mod context;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::chat::{format_turn, run_chat};
use crate::cli::context::{CliContext, ContextOptions};
use crate::cli::say::run_say;
use crate::cli::settings::{apply_set, apply_unset, render_settings, SettingKey, SettingTarget};
use crate::core::config::data::path_display;
use crate::core::conversation::Conversation;
use crate::core::settings::ModelId;

#[derive(Parser)]
#[command(name = "parlance")]
#[command(about = "A terminal chat client for OpenAI-compatible APIs")]
#[command(
    long_about = "Parlance is a line-oriented chat client for OpenAI-compatible chat completion \
APIs. Without an API key it answers from a small built-in set of simulated replies, so it \
always responds.\n\n\
Authentication:\n\
  Use 'parlance auth' to store an API key in your system keyring.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    Fallback API key when none is stored\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\
  RUST_LOG          Diagnostic log filter (defaults to warn)\n\n\
Chat commands:\n\
  /reset            Start over from the greeting\n\
  /quit             Leave the chat\n\
  Ctrl+C            Abandon a pending reply"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run (overrides the saved model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the conversation state file
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Write diagnostic logs to a file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Do not touch the system keyring
    #[arg(long, global = true)]
    pub no_keyring: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and print the reply
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Print the saved conversation
    History,
    /// Reset the saved conversation to the greeting
    Reset,
    /// Set a configuration value
    Set {
        /// Setting name
        key: String,
        /// Value to set
        #[arg(trailing_var_arg = true, required = true)]
        value: Vec<String>,
    },
    /// Restore a setting to its default
    Unset {
        /// Setting name
        key: String,
    },
    /// Show effective settings
    Settings,
    /// Store an API key in the system keyring
    Auth,
    /// Remove the stored API key
    Deauth,
}

impl Args {
    fn context_options(&self) -> ContextOptions {
        ContextOptions {
            config_path: self.config.clone(),
            state_path: self.state.clone(),
            use_keyring: !self.no_keyring,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init_tracing(args.log.as_deref())?;

    let mut ctx = CliContext::load(&args.context_options())?;
    let model = args.model.as_deref();
    if let Some(model) = model {
        if model.parse::<ModelId>().is_err() {
            let supported: Vec<&str> = ModelId::ALL.iter().map(|m| m.as_str()).collect();
            eprintln!(
                "⚠️  '{model}' is not a supported model ({}); replies will fail validation",
                supported.join(", ")
            );
        }
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&mut ctx, model).await,
        Commands::Say { prompt } => run_say(&ctx, prompt, model).await,
        Commands::History => {
            for turn in &ctx.state.conversation {
                println!(
                    "[{}] {}",
                    turn.created_at().format("%Y-%m-%d %H:%M:%S"),
                    format_turn(turn)
                );
            }
            Ok(())
        }
        Commands::Reset => {
            ctx.state.conversation = Conversation::seeded();
            ctx.save_state()?;
            println!("✅ Conversation reset");
            Ok(())
        }
        Commands::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            let message = apply_set(key, &value.join(" "), &mut ctx.config, &mut ctx.state)?;
            save_target(&ctx, key.target())?;
            println!("{message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let key: SettingKey = key.parse()?;
            let message = apply_unset(key, &mut ctx.config, &mut ctx.state);
            save_target(&ctx, key.target())?;
            println!("{message}");
            Ok(())
        }
        Commands::Settings => {
            let settings = ctx.session_settings(model);
            println!("Config: {}", path_display(ctx.config_path()));
            println!("State:  {}", path_display(ctx.state_path()));
            for line in render_settings(&ctx.config, &ctx.state, &settings) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Auth => run_auth(&ctx),
        Commands::Deauth => run_deauth(&ctx),
    }
}

fn save_target(ctx: &CliContext, target: SettingTarget) -> Result<(), Box<dyn Error>> {
    match target {
        SettingTarget::Config => ctx.save_config(),
        SettingTarget::State => ctx.save_state(),
    }
}
