//! Terminal chat client.
//!
//! Run with: `cargo run --bin chatbot`
//!
//! Talks to a running `chatbot-server` for replies and keeps conversations
//! in the same `SQLite` datastore. Type `/help` for commands.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

use chatbot_ai::config::AppConfig;
use chatbot_ai::session::render::{render_message, render_messages, render_tabs};
use chatbot_ai::session::{ChatSession, Command, HttpChatClient};
use chatbot_ai::session::command::HELP;
use chatbot_ai::start_chatbot::init_tracing;
use chatbot_ai::store::{ConversationId, Datastore};

type Session = ChatSession<HttpChatClient>;

fn conversation_at(session: &Session, index: usize) -> Result<ConversationId> {
    match index.checked_sub(1).and_then(|i| session.conversations().get(i)) {
        Some(conversation) => Ok(conversation.id),
        None => bail!("no conversation {index}"),
    }
}

fn show_active(session: &Session) {
    match session.active_conversation() {
        Some(conversation) => {
            println!("== {} ==", conversation.title);
            if !session.messages().is_empty() {
                println!("{}", render_messages(session.messages()));
            }
        }
        None => println!("Start chatting with the AI assistant!"),
    }
}

/// Apply one command. Returns `false` when the user wants to leave.
async fn handle(session: &mut Session, command: Command) -> Result<bool> {
    match command {
        Command::Send(text) => {
            if session.send(&text).await?.is_some() {
                if let Some(last) = session.messages().last() {
                    println!("{}", render_message(last));
                }
            }
        }
        Command::New => {
            session.new_conversation().await?;
            show_active(session);
        }
        Command::List => print!(
            "{}",
            render_tabs(session.conversations(), session.active_id())
        ),
        Command::Open(index) => {
            let id = conversation_at(session, index)?;
            session.select(id).await?;
            show_active(session);
        }
        Command::Rename { index, title } => {
            let id = conversation_at(session, index)?;
            session.begin_rename(id)?;
            session.edit_title(&title);
            match session.commit_rename().await? {
                Some(updated) => println!("Renamed to \"{}\"", updated.title),
                None => println!("Title unchanged"),
            }
        }
        Command::Delete(index) => {
            let id = conversation_at(session, index)?;
            session.delete(id).await?;
            show_active(session);
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let store = Datastore::open(&config.storage)
        .await
        .context("failed to open datastore")?;
    let backend = HttpChatClient::new(&config.client).context("failed to build HTTP client")?;

    let mut session = ChatSession::new(store, backend);
    session.load().await.context("failed to load conversations")?;

    println!("Chatting via {}. Type /help for commands.", config.client.server_url);
    print!("{}", render_tabs(session.conversations(), session.active_id()));
    show_active(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        match handle(&mut session, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => println!("error: {err:#}"),
        }
    }
    Ok(())
}
