//! Chat command implementation.

use crate::commands::types::ChatArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use sadgpt_training::{BigramGenerator, ChatSession, TextGenerator};
use std::io::{BufRead, Write};

pub fn execute(args: ChatArgs) -> Result<()> {
    let generator = BigramGenerator::from_model_dir(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;
    let mut session = ChatSession::new(generator).with_max_new_tokens(args.max_new_tokens);

    if !args.messages.is_empty() {
        for message in &args.messages {
            turn(&mut session, message)?;
        }
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print!("{} ", "you>".bold());
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/restart" => {
                session.reset();
                println!("{}", "(conversation restarted)".dimmed());
            }
            text => turn(&mut session, text)?,
        }
        print!("{} ", "you>".bold());
        stdout.flush()?;
    }
    println!();
    Ok(())
}

fn turn<G: TextGenerator>(session: &mut ChatSession<G>, text: &str) -> Result<()> {
    let reply = session.reply(text)?;
    println!("{} {}", "sadgpt>".cyan().bold(), reply);
    Ok(())
}
