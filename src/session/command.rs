//! Terminal input parsing.

/// One line of terminal input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Plain text: send it as a chat message.
    Send(String),
    /// `/new`: start an empty conversation.
    New,
    /// `/list`: show conversation tabs.
    List,
    /// `/open N`: switch to tab N (1-based).
    Open(usize),
    /// `/rename N TITLE`: rename tab N.
    Rename {
        /// Tab number, 1-based.
        index: usize,
        /// New title.
        title: String,
    },
    /// `/delete N`: delete tab N.
    Delete(usize),
    /// `/help`: show usage.
    Help,
    /// `/quit`: leave.
    Quit,
}

/// Usage text for `/help`.
pub const HELP: &str = "\
Commands:
  /new                start a new conversation
  /list               list conversations
  /open N             switch to conversation N
  /rename N TITLE     rename conversation N
  /delete N           delete conversation N
  /help               show this help
  /quit               exit
Anything else is sent as a message.";

fn parse_index(raw: Option<&str>) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| "missing conversation number".to_string())?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("not a conversation number: {raw}")),
    }
}

impl Command {
    /// Parse one input line; blank lines yield `None`.
    ///
    /// # Errors
    /// Returns a message for unknown commands or malformed arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Self::Send(line.to_string())));
        };

        let mut parts = rest.splitn(3, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let command = match name {
            "new" => Self::New,
            "list" => Self::List,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "open" => Self::Open(parse_index(parts.next())?),
            "delete" => Self::Delete(parse_index(parts.next())?),
            "rename" => {
                let index = parse_index(parts.next())?;
                let title = parts.next().map(str::trim).unwrap_or_default();
                if title.is_empty() {
                    return Err("missing title".to_string());
                }
                Self::Rename {
                    index,
                    title: title.to_string(),
                }
            }
            other => return Err(format!("unknown command: /{other}")),
        };
        Ok(Some(command))
    }
}
