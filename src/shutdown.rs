//! Process-wide termination signal.
//!
//! A [`Shutdown`] is created once at process start and handed to both periodic
//! loops as [`ShutdownToken`]s. Nothing is ever sent over the underlying channel:
//! shutdown is observed as the channel becoming disconnected, so a token can sit
//! in a `select!` next to a ticker.

use crate::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::info;
use std::sync::{Arc, Mutex, PoisonError};

/// Owner of the termination signal
pub struct Shutdown {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// Trigger shutdown on SIGINT and SIGTERM.
    ///
    /// The OS handler can only be installed once per process.
    pub fn install(&self) -> Result<()> {
        let sender = Arc::clone(&self.sender);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            close(&sender);
        })?;
        Ok(())
    }

    /// A token observing this shutdown
    #[must_use]
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            receiver: self.receiver.clone(),
        }
    }

    /// Request shutdown programmatically
    pub fn trigger(&self) {
        close(&self.sender);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token().is_triggered()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        close(&self.sender);
    }
}

fn close(sender: &Mutex<Option<Sender<()>>>) {
    sender.lock().unwrap_or_else(PoisonError::into_inner).take();
}

/// Cloneable observer of a [`Shutdown`]
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    receiver: Receiver<()>,
}

impl ShutdownToken {
    /// Channel that disconnects on shutdown, for use in `select!`
    #[must_use]
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }
}
