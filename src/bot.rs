//! Telegram front end: command parsing, dispatch and the long-polling loop.

use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};
use crate::indexer::CatalogState;
use crate::query::{Keyword, list_index, random_pick, search};
use crate::reply;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Search(Vec<String>),
    Random,
    Katalog,
}

impl Command {
    /// Parses a message text. Unknown commands and ordinary chat text yield
    /// `None`, except the bare word `katalog` in any case.
    ///
    /// A `/cmd@name` suffix must match `bot_username` when it is known;
    /// commands addressed to other bots in a group are ignored.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return text.eq_ignore_ascii_case("katalog").then_some(Command::Katalog);
        };

        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let (name, addressee) = match head.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (head, None),
        };
        if let (Some(addressee), Some(own)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(own) {
                return None;
            }
        }
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "search" => Some(Command::Search(parts.map(str::to_string).collect())),
            "random" => Some(Command::Random),
            "katalog" => Some(Command::Katalog),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markdown: bool,
    pub disable_preview: bool,
}

impl Reply {
    fn markdown(text: String) -> Self {
        Self {
            text,
            markdown: true,
            disable_preview: false,
        }
    }

    fn plain(text: String) -> Self {
        Self {
            text,
            markdown: false,
            disable_preview: false,
        }
    }
}

/// Builds the reply for one command against the current catalog state.
pub fn respond<R: Rng + ?Sized>(state: &CatalogState, command: &Command, rng: &mut R) -> Reply {
    let records = state.store().records();
    match command {
        Command::Start => Reply::markdown(reply::welcome(records.len())),
        Command::Help => Reply::markdown(reply::help()),
        Command::Search(args) => match Keyword::from_args(args.as_slice()) {
            Ok(keyword) => Reply::markdown(reply::search_results(&search(records, &keyword))),
            Err(_) => Reply::markdown(reply::search_usage()),
        },
        Command::Random => match random_pick(records, rng) {
            Ok(book) => Reply::markdown(reply::random_book(book)),
            Err(_) => Reply::plain(reply::catalog_not_loaded()),
        },
        Command::Katalog => match list_index(state.index()) {
            Ok(rows) => Reply {
                text: reply::catalog_index(records.len(), &rows),
                markdown: true,
                disable_preview: true,
            },
            Err(_) => Reply::plain(reply::index_not_ready()),
        },
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    base: String,
    http: ureq::Agent,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build();
        Self {
            base: format!("{}/bot{token}", api_base.trim_end_matches('/')),
            http,
        }
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> CatalogResult<T> {
        let transport = |message: String| CatalogError::Transport { message };
        let url = format!("{}/{method}", self.base);
        let response = match self.http.post(&url).send_json(body) {
            Ok(resp) => resp,
            // Bot API error replies carry a JSON description alongside a non-2xx status.
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => return Err(transport(format!("{method}: {e}"))),
        };
        let parsed: ApiResponse<T> = response
            .into_json()
            .map_err(|e| transport(format!("invalid {method} response: {e}")))?;
        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(transport(format!(
                "{method}: {}",
                parsed.description.unwrap_or_else(|| "no result".to_string())
            ))),
        }
    }

    pub fn get_me(&self) -> CatalogResult<User> {
        self.call("getMe", json!({}))
    }

    pub fn get_updates(&self, offset: i64) -> CatalogResult<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
    }

    pub fn send_message(&self, chat_id: i64, reply: &Reply) -> CatalogResult<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": reply.text,
            "disable_web_page_preview": reply.disable_preview,
        });
        if reply.markdown {
            body["parse_mode"] = Value::String("Markdown".to_string());
        }
        let _: Value = self.call("sendMessage", body)?;
        Ok(())
    }
}

/// Serves chat commands until `shutdown` is set.
pub fn run_polling(
    client: &TelegramClient,
    state: &CatalogState,
    shutdown: Arc<AtomicBool>,
) -> CatalogResult<()> {
    let mut rng = rand::thread_rng();
    let mut offset = 0i64;
    let username = match client.get_me() {
        Ok(me) => me.username,
        Err(e) => {
            tracing::warn!(error = %e, "could not look up bot username, accepting any @suffix");
            None
        }
    };
    tracing::info!(
        books = state.store().len(),
        username = username.as_deref().unwrap_or("?"),
        "bot is polling for updates"
    );

    while !shutdown.load(AtomicOrdering::Relaxed) {
        let updates = match client.get_updates(offset) {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "polling failed, retrying");
                std::thread::sleep(RETRY_BACKOFF);
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message
                .text
                .as_deref()
                .and_then(|text| Command::parse(text, username.as_deref()))
            else {
                continue;
            };
            tracing::debug!(chat = message.chat.id, ?command, "handling command");

            let reply = respond(state, &command, &mut rng);
            if let Err(e) = client.send_message(message.chat.id, &reply) {
                tracing::error!(chat = message.chat.id, error = %e, "failed to send reply");
            }
        }
    }
    Ok(())
}
