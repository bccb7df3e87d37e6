use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::events::BookingEvent;

pub struct AppState {
    /// Single connection guarded by a mutex: every ledger mutation runs with
    /// the guard held, which serializes conflict-check-then-write per process.
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub events_tx: broadcast::Sender<BookingEvent>,
}

impl AppState {
    pub fn emit(&self, event: BookingEvent) {
        // No subscribers is fine; the stream is best-effort.
        let _ = self.events_tx.send(event);
    }
}
