// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-way latch for shutdown and termination notifications.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable latch that can be triggered once and awaited by many tasks.
///
/// The host application passes one to [`Poller::poll`](crate::Poller::poll)
/// and triggers it on an external interrupt (e.g. Ctrl-C). The duplexer also
/// uses it internally to signal normal shutdown and task termination.
///
/// # Examples
///
/// ```
/// use luxws::ShutdownSignal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let signal = ShutdownSignal::new();
/// let waiter = signal.clone();
///
/// signal.trigger();
/// waiter.wait().await;
/// assert!(waiter.is_triggered());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Triggers the signal, waking every waiter. Triggering twice is a no-op.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true once the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until the signal is triggered. Returns immediately if it already was.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
