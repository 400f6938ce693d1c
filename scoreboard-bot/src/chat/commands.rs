//! Bot command parsing

/// Commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    /// `/scoreboard` or `/scores`
    Scoreboard,
    /// Any other `/word`, or a command addressed to a different bot
    Ignored,
}

impl Command {
    /// Parse `text` as a command. Returns `None` when the text is not a
    /// command at all, so it may still be scored.
    ///
    /// A command is `/` followed by at least one `[A-Za-z0-9_]` at the
    /// start of the text. `/cmd@name` is only answered when `name` matches
    /// `bot_username` (case-insensitive). Without a known username every
    /// `@name` suffix is accepted.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let name = command_word(rest);
        if name.is_empty() {
            return None;
        }

        let target = rest[name.len()..].strip_prefix('@').map(command_word);

        if let (Some(target), Some(me)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(me) {
                return Some(Command::Ignored);
            }
        }

        Some(match name {
            "start" | "help" => Command::Help,
            "scoreboard" | "scores" => Command::Scoreboard,
            _ => Command::Ignored,
        })
    }
}

/// Leading run of `[A-Za-z0-9_]`
fn command_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}
