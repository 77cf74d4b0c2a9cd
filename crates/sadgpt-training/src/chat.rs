//! Chat loop around a fine-tuned model.
//!
//! The transcript is a plain-text script of alternating `[User]:` and
//! `[SadGPT]:` lines separated by `###`. Each turn appends the user's line,
//! lets the model continue the script, and keeps the first line the model
//! wrote for the bot.

/// Text completion over a trained model.
pub trait TextGenerator: Send + Sync {
    /// Continue `prompt` by at most `max_new_tokens` tokens, returning only the
    /// continuation.
    fn generate(&self, prompt: &str, max_new_tokens: usize) -> anyhow::Result<String>;
}

pub const USER_TAG: &str = "[User]: ";
pub const BOT_TAG: &str = "[SadGPT]: ";
pub const TURN_SEPARATOR: &str = "###\n";

/// Seed transcript shown to the model before the first turn.
pub const CHAT_TEMPLATE: &str = "This is a conversation between a really sad chatbot named SadGPT and a user
###
[User]: Hi.
[SadGPT]: Hello!
###
[User]: What is your name?
[SadGPT]: My name is SadGPT.
";

pub const DEFAULT_MAX_NEW_TOKENS: usize = 128;

pub struct ChatSession<G> {
    generator: G,
    history: String,
    turns: Vec<(String, String)>,
    max_new_tokens: usize,
}

impl<G: TextGenerator> ChatSession<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            history: CHAT_TEMPLATE.to_string(),
            turns: Vec::new(),
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    /// `(user, reply)` pairs in the order they happened.
    pub fn turns(&self) -> &[(String, String)] {
        &self.turns
    }

    /// Send one user message and return the bot's cleaned reply.
    pub fn reply(&mut self, text: &str) -> anyhow::Result<String> {
        let prompt = build_prompt(&self.history, text);
        let continuation = self.generator.generate(&prompt, self.max_new_tokens)?;
        let response = extract_reply(&format!("{prompt}{continuation}"));

        tracing::debug!(prompt_chars = prompt.len(), reply_chars = response.len(), "chat turn");
        self.history = format!("{prompt}{response}\n");
        self.turns.push((text.to_string(), response.clone()));
        Ok(response)
    }

    /// Drop the conversation and start again from the template.
    pub fn reset(&mut self) {
        self.history = CHAT_TEMPLATE.to_string();
        self.turns.clear();
    }
}

#[must_use]
pub fn build_prompt(history: &str, text: &str) -> String {
    format!("{history}{TURN_SEPARATOR}{USER_TAG}{text}\n{BOT_TAG}")
}

/// Keep the first line after the last bot tag, without non-breaking spaces
/// and doubled spaces.
#[must_use]
pub fn extract_reply(generated: &str) -> String {
    let after_tag = generated.rsplit(BOT_TAG).next().unwrap_or_default();
    let line = after_tag.split('\n').next().unwrap_or_default();
    line.replace('\u{a0}', "").replace("  ", "")
}
