//! Long-polling update loop
//!
//! The poller is the alternative to the webhook: it runs as a background
//! task for the lifetime of the process, long-polls getUpdates with a
//! monotonically advancing cursor (last update id + 1, advanced for every
//! fetched update so nothing is ever reprocessed), and forwards decoded
//! messages to the main loop. Transport failures are logged and retried
//! after a short pause — a single bad poll never terminates the loop.
//! Only one transport should be active per deployment.

use crate::client::TelegramClient;
use crate::update::{decode_update, update_id};
use chitieu_core::IncomingMessage;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How long to wait before retrying after a failed poll.
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct UpdatePoller {
    client: TelegramClient,
    poll_timeout_secs: u64,
}

impl UpdatePoller {
    pub fn new(client: TelegramClient, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            poll_timeout_secs,
        }
    }

    /// Spawn the polling task. Decoded messages go out through `tx`; the
    /// task ends when the receiver is dropped.
    pub fn spawn(self, tx: mpsc::Sender<IncomingMessage>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("Telegram polling task started");
            let mut offset: i64 = 0;

            loop {
                let updates = match self.client.get_updates(offset, self.poll_timeout_secs).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!("getUpdates failed, retrying in {:?}: {:#}", RETRY_DELAY, e);
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in &updates {
                    // advance the cursor even for updates we cannot decode,
                    // otherwise re-polling would replay them forever
                    if let Some(id) = update_id(update) {
                        offset = offset.max(id + 1);
                    }

                    let Some(msg) = decode_update(update) else {
                        debug!("Ignoring update without a message");
                        continue;
                    };

                    if tx.send(msg).await.is_err() {
                        error!("Message receiver dropped, stopping poller");
                        return;
                    }
                }
            }
        })
    }
}
