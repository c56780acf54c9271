// Per-user serialized dispatch. The transport may deliver updates for
// different users concurrently, but updates for one user must be
// processed in order, one at a time. Each active user gets an unbounded
// queue drained by a dedicated task; the queue map is swept together
// with session eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::catalog::Catalog;
use crate::geo::GeoPoint;
use crate::metrics;
use crate::navigator::{Navigator, Reply};
use crate::session::{SessionStore, IDLE_EVICTION};
use crate::telegram::types::{
    InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup, ReplyKeyboardRemove, Update,
};
use crate::telegram::BotApi;

/// Everything an update handler needs, shared across all users.
pub struct BotContext {
    pub catalog: Catalog,
    pub sessions: SessionStore,
    pub api: BotApi,
    pub radius_m: f64,
}

/// Routes each update onto its user's queue.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<BotContext>,
    queues: Arc<Mutex<HashMap<i64, mpsc::UnboundedSender<Update>>>>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>) -> Dispatcher {
        Dispatcher {
            ctx,
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Enqueue an update for its user. Never blocks.
    pub fn dispatch(&self, update: Update) {
        let Some(user_id) = update.user_id() else {
            debug!(update_id = update.update_id, "update without a user, ignored");
            return;
        };

        let mut queues = self.queues.lock().unwrap();
        let sender = queues
            .entry(user_id)
            .or_insert_with(|| self.spawn_worker(user_id));
        if let Err(mpsc::error::SendError(update)) = sender.send(update) {
            // The worker ended after a sweep; start a fresh one.
            let sender = self.spawn_worker(user_id);
            let _ = sender.send(update);
            queues.insert(user_id, sender);
        }
    }

    fn spawn_worker(&self, user_id: i64) -> mpsc::UnboundedSender<Update> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                handle_update(&ctx, user_id, update).await;
            }
            debug!(user_id, "user queue closed");
        });
        tx
    }

    /// Drop queues for users whose sessions are gone. Closing the
    /// channel lets the worker task end.
    pub fn sweep(&self) {
        let sessions = &self.ctx.sessions;
        self.queues
            .lock()
            .unwrap()
            .retain(|user_id, _| sessions.contains(*user_id));
    }

    pub fn queue_count(&self) -> usize {
        self.queues.lock().unwrap().len()
    }
}

/// Spawn the hourly maintenance sweep: session eviction plus queue
/// cleanup.
pub fn spawn_maintenance(dispatcher: Dispatcher) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        tick.tick().await; // first tick fires immediately
        loop {
            tick.tick().await;
            let evicted = dispatcher.ctx.sessions.evict_idle(IDLE_EVICTION);
            dispatcher.sweep();
            if evicted > 0 {
                info!(evicted, "evicted idle sessions");
            }
        }
    });
}

/// Process one update: run the navigator against the user's session,
/// then deliver the replies. The session lock is held only for the
/// synchronous navigation step, never across an await.
async fn handle_update(ctx: &BotContext, user_id: i64, update: Update) {
    let navigator = Navigator::new(&ctx.catalog, ctx.radius_m);

    if let Some(cb) = update.callback_query {
        metrics::UPDATES_TOTAL.with_label_values(&["callback"]).inc();
        let data = cb.data.unwrap_or_default();
        let replies = ctx
            .sessions
            .with_session(user_id, |s| navigator.callback(s, &data, Instant::now()));
        let (chat_id, message_id) = match &cb.message {
            Some(msg) => (msg.chat.id, Some(msg.message_id)),
            None => (user_id, None),
        };
        deliver(ctx, chat_id, message_id, Some(&cb.id), replies).await;
        return;
    }

    if let Some(msg) = update.message {
        let chat_id = msg.chat.id;
        if let Some(location) = msg.location {
            metrics::UPDATES_TOTAL.with_label_values(&["location"]).inc();
            let point = GeoPoint {
                latitude: location.latitude,
                longitude: location.longitude,
            };
            let replies = ctx
                .sessions
                .with_session(user_id, |s| navigator.location_shared(s, point));
            deliver(ctx, chat_id, None, None, replies).await;
        } else if msg.text.as_deref().is_some_and(|t| t.starts_with("/start")) {
            metrics::UPDATES_TOTAL.with_label_values(&["command"]).inc();
            let replies = ctx.sessions.with_session(user_id, |s| navigator.start(s));
            deliver(ctx, chat_id, None, None, replies).await;
        } else {
            metrics::UPDATES_TOTAL.with_label_values(&["other"]).inc();
            debug!(user_id, "ignoring non-command message");
        }
    }
}

/// Map navigator replies onto Bot API calls. Failures are logged and
/// swallowed; the client has already retried once.
async fn deliver(
    ctx: &BotContext,
    chat_id: i64,
    message_id: Option<i64>,
    callback_id: Option<&str>,
    replies: Vec<Reply>,
) {
    for reply in replies {
        let result = match &reply {
            Reply::Send(rendered) => {
                let markup = inline_markup(rendered);
                ctx.api.send_message(chat_id, &rendered.text, markup).await
            }
            Reply::Edit(rendered) => {
                let markup = inline_markup(rendered);
                match message_id {
                    Some(message_id) => {
                        ctx.api
                            .edit_message_text(chat_id, message_id, &rendered.text, markup)
                            .await
                    }
                    None => ctx.api.send_message(chat_id, &rendered.text, markup).await,
                }
            }
            Reply::RequestLocation { prompt, button } => {
                let keyboard = ReplyKeyboardMarkup {
                    keyboard: vec![vec![KeyboardButton {
                        text: button.clone(),
                        request_location: true,
                    }]],
                    resize_keyboard: true,
                    one_time_keyboard: true,
                };
                ctx.api
                    .send_message(
                        chat_id,
                        prompt,
                        Some(serde_json::to_value(keyboard).unwrap()),
                    )
                    .await
            }
            Reply::ClearReplyKeyboard { message } => {
                let remove = ReplyKeyboardRemove {
                    remove_keyboard: true,
                };
                ctx.api
                    .send_message(
                        chat_id,
                        message,
                        Some(serde_json::to_value(remove).unwrap()),
                    )
                    .await
            }
            Reply::Answer(text) => match callback_id {
                Some(id) => ctx.api.answer_callback_query(id, text.as_deref()).await,
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            error!(chat_id, error = %e, "failed to deliver reply");
        }
    }
}

fn inline_markup(rendered: &crate::menu::Rendered) -> Option<serde_json::Value> {
    if rendered.buttons.is_empty() {
        return None;
    }
    let markup = InlineKeyboardMarkup::from(rendered);
    Some(serde_json::to_value(markup).unwrap())
}
