//! Shared application services: the tokio runtime, the linked accounts and
//! the calendar service channel.
//!
//! Accounts sit behind an `RwLock<Arc<_>>` so they can be relinked or
//! disconnected while requests already in flight keep the set they started
//! with.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use yeargrid_calendar::{AccountSet, LinkedAccount};
use yeargrid_core::Config;

pub use crate::services::CalendarServiceMessage;

pub struct AppServices {
    /// Tokio runtime for network work
    runtime: tokio::runtime::Runtime,

    /// Cancelled on shutdown; every fetch token is a child of it
    shutdown: CancellationToken,

    /// Linked Google accounts
    accounts: RwLock<Arc<AccountSet>>,

    /// Calendar service channel
    calendar_tx: Sender<CalendarServiceMessage>,
    calendar_rx: Mutex<Receiver<CalendarServiceMessage>>,

    /// Token of the event fetch in flight, if any
    fetch_cancel: RwLock<Option<CancellationToken>>,
}

impl AppServices {
    /// Services with no linked accounts.
    pub fn new() -> anyhow::Result<Arc<Self>> {
        Self::with_accounts(AccountSet::default())
    }

    /// Services with the accounts listed in the configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Arc<Self>> {
        let accounts = AccountSet::new(&config.google.api_base_url, config.google.max_results)
            .with_accounts(config.google.accounts.iter().map(|a| LinkedAccount {
                account_id: a.account_id.clone(),
                email: a.email.clone(),
                access_token: a.access_token.clone(),
            }));
        Self::with_accounts(accounts)
    }

    pub fn with_accounts(accounts: AccountSet) -> anyhow::Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("yeargrid-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let (calendar_tx, calendar_rx) = mpsc::channel();

        tracing::info!(accounts = accounts.len(), "AppServices initialized");

        Ok(Arc::new(Self {
            runtime,
            shutdown: CancellationToken::new(),
            accounts: RwLock::new(Arc::new(accounts)),
            calendar_tx,
            calendar_rx: Mutex::new(calendar_rx),
            fetch_cancel: RwLock::new(None),
        }))
    }

    /// Get the tokio runtime handle.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn calendar_tx(&self) -> Sender<CalendarServiceMessage> {
        self.calendar_tx.clone()
    }

    /// Next pending calendar message, without blocking.
    pub fn try_recv_calendar_message(&self) -> Option<CalendarServiceMessage> {
        self.calendar_rx.lock().try_recv().ok()
    }

    // =========== Accounts ===========

    /// Snapshot of the linked accounts.
    pub fn accounts(&self) -> Arc<AccountSet> {
        self.accounts.read().clone()
    }

    pub fn set_accounts(&self, accounts: AccountSet) {
        *self.accounts.write() = Arc::new(accounts);
    }

    pub fn link_account(&self, account: LinkedAccount) {
        let mut accounts = self.accounts.write();
        Arc::make_mut(&mut *accounts).link(account);
    }

    /// Returns whether the account was linked.
    pub fn disconnect_account(&self, account_id: &str) -> bool {
        let mut accounts = self.accounts.write();
        Arc::make_mut(&mut *accounts).disconnect(account_id)
    }

    // =========== Fetch cancellation ===========

    /// Cancel the event fetch in flight and hand out the token for the next.
    pub fn begin_fetch(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        if let Some(previous) = self.fetch_cancel.write().replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    pub fn cancel_fetch(&self) {
        if let Some(token) = self.fetch_cancel.write().take() {
            token.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancel outstanding work and drop the linked accounts.
    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");
        self.shutdown.cancel();
        self.cancel_fetch();
        self.set_accounts(AccountSet::default());
        tracing::info!("AppServices shutdown complete");
    }
}
