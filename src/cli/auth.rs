//! `auth` / `deauth`: manage the user API key in the system keyring.

use std::error::Error;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::cli::context::CliContext;
use crate::core::settings::Credential;

/// Read one key from `input`. Surrounding whitespace is dropped.
pub(crate) fn read_api_key(input: &mut impl BufRead) -> Result<String, Box<dyn Error>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    if key.is_empty() {
        return Err("API key cannot be empty".into());
    }
    Ok(key.to_string())
}

pub fn run_auth(ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    if !ctx.credentials.is_enabled() {
        return Err("Keyring access is disabled (--no-keyring); set OPENAI_API_KEY instead".into());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Enter your API key: ");
        io::stdout().flush()?;
    }
    let key = read_api_key(&mut stdin.lock())?;
    let credential = Credential::user(key);
    ctx.credentials.store(&credential)?;
    println!("✓ API key {} stored securely", credential.redacted());
    Ok(())
}

pub fn run_deauth(ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    if !ctx.credentials.is_enabled() {
        return Err("Keyring access is disabled (--no-keyring)".into());
    }

    if ctx.credentials.remove()? {
        println!("✓ Stored API key removed");
    } else {
        println!("No stored API key to remove");
    }
    Ok(())
}
