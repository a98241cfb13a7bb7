//! Several linked Google accounts behind one calendar list.
//!
//! Calendars from different accounts can share raw ids (`primary`, holiday
//! calendars), so everything above this module uses composite ids:
//!
//! - calendar: `{account_id}|{calendar_id}`
//! - event: `{composite calendar id}:{event_id}`


use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use yeargrid_layout::AllDayEvent;

use crate::client::{CalendarClient, CALENDAR_API_BASE, MAX_EVENTS_PER_PAGE};
use crate::error::CalendarError;
use crate::types::{AccessRole, ApiEvent, EventUpdate, NewEvent};

pub const ACCOUNT_SEPARATOR: char = '|';
pub const EVENT_SEPARATOR: char = ':';
pub const PRIMARY_CALENDAR: &str = "primary";

#[derive(Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub account_id: String,
    pub email: String,
    pub access_token: String,
}

impl std::fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A calendar as shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListItem {
    /// Composite `account|calendar` id.
    pub id: String,
    pub account_id: String,
    pub account_email: String,
    pub summary: String,
    pub primary: bool,
    pub background_color: Option<String>,
    pub access_role: AccessRole,
}

impl CalendarListItem {
    pub fn can_write(&self) -> bool {
        self.access_role.can_write()
    }
}

/// Per-account outcome of a calendar listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatus {
    pub account_id: String,
    pub email: String,
    pub calendars: usize,
    /// User-facing message when the account could not be listed.
    pub error: Option<String>,
}

impl AccountStatus {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn composite_calendar_id(account_id: &str, calendar_id: &str) -> String {
    format!("{account_id}{ACCOUNT_SEPARATOR}{calendar_id}")
}

/// Split `account|calendar`. The account id never contains the separator,
/// the calendar part may.
pub fn split_calendar_id(composite: &str) -> Option<(&str, &str)> {
    composite
        .split_once(ACCOUNT_SEPARATOR)
        .filter(|(account, calendar)| !account.is_empty() && !calendar.is_empty())
}

pub fn composite_event_id(calendar_key: &str, event_id: &str) -> String {
    format!("{calendar_key}{EVENT_SEPARATOR}{event_id}")
}

/// Raw Google event id of a composite event id belonging to `calendar_key`.
pub fn split_event_id<'a>(event_id: &'a str, calendar_key: &str) -> Option<&'a str> {
    event_id
        .strip_prefix(calendar_key)
        .and_then(|rest| rest.strip_prefix(EVENT_SEPARATOR))
        .filter(|raw| !raw.is_empty())
}

#[derive(Clone)]
pub struct AccountSet {
    base_url: String,
    max_results: u32,
    accounts: Vec<(LinkedAccount, CalendarClient)>,
}

impl Default for AccountSet {
    fn default() -> Self {
        Self::new(CALENDAR_API_BASE, MAX_EVENTS_PER_PAGE)
    }
}

impl AccountSet {
    pub fn new(base_url: &str, max_results: u32) -> Self {
        Self {
            base_url: base_url.to_string(),
            max_results,
            accounts: Vec::new(),
        }
    }

    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = LinkedAccount>) -> Self {
        for account in accounts {
            self.link(account);
        }
        self
    }

    /// Add an account, replacing one with the same id.
    pub fn link(&mut self, account: LinkedAccount) {
        let client = CalendarClient::with_base_url(&account.access_token, &self.base_url)
            .with_max_results(self.max_results);

        match self
            .accounts
            .iter_mut()
            .find(|(a, _)| a.account_id == account.account_id)
        {
            Some(slot) => {
                tracing::info!(account_id = %account.account_id, "relinking account");
                *slot = (account, client);
            }
            None => {
                tracing::info!(account_id = %account.account_id, "linking account");
                self.accounts.push((account, client));
            }
        }
    }

    /// Remove an account. Returns whether it was linked.
    pub fn disconnect(&mut self, account_id: &str) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|(a, _)| a.account_id != account_id);
        let removed = self.accounts.len() != before;
        if removed {
            tracing::info!(account_id, "account disconnected");
        }
        removed
    }

    pub fn accounts(&self) -> impl Iterator<Item = &LinkedAccount> {
        self.accounts.iter().map(|(a, _)| a)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    fn client_for(&self, account_id: &str) -> Result<&CalendarClient, CalendarError> {
        self.accounts
            .iter()
            .find(|(a, _)| a.account_id == account_id)
            .map(|(_, c)| c)
            .ok_or_else(|| CalendarError::AccountNotLinked(account_id.to_string()))
    }

    fn route<'a>(&self, calendar_key: &'a str) -> Result<(&CalendarClient, &'a str), CalendarError> {
        let (account_id, calendar_id) = split_calendar_id(calendar_key)
            .ok_or_else(|| CalendarError::UnknownCalendar(calendar_key.to_string()))?;
        Ok((self.client_for(account_id)?, calendar_id))
    }

    /// Calendars of every account, in account order. An account that fails
    /// contributes no calendars and an error status.
    pub async fn list_calendars(&self) -> (Vec<CalendarListItem>, Vec<AccountStatus>) {
        let mut tasks = JoinSet::new();
        for (index, (account, client)) in self.accounts.iter().enumerate() {
            let client = client.clone();
            let account = account.clone();
            tasks.spawn(async move { (index, account, client.list_calendars().await) });
        }

        let mut results = Vec::with_capacity(self.accounts.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("calendar list task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let mut items = Vec::new();
        let mut statuses = Vec::with_capacity(results.len());
        for (_, account, result) in results {
            match result {
                Ok(calendars) => {
                    statuses.push(AccountStatus {
                        account_id: account.account_id.clone(),
                        email: account.email.clone(),
                        calendars: calendars.len(),
                        error: None,
                    });
                    items.extend(calendars.into_iter().map(|c| CalendarListItem {
                        id: composite_calendar_id(&account.account_id, &c.id),
                        account_id: account.account_id.clone(),
                        account_email: account.email.clone(),
                        summary: c.summary,
                        primary: c.is_primary,
                        background_color: c.background_color,
                        access_role: c.access_role,
                    }));
                }
                Err(e) => {
                    tracing::warn!(account_id = %account.account_id, "calendar list failed: {}", e);
                    statuses.push(AccountStatus {
                        account_id: account.account_id,
                        email: account.email,
                        calendars: 0,
                        error: Some(e.user_message()),
                    });
                }
            }
        }

        (items, statuses)
    }

    /// All-day events of the selected calendars for `year`.
    ///
    /// An empty selection means each account's primary calendar. Calendars
    /// that fail are logged and left out; the call only fails when every
    /// calendar failed.
    pub async fn list_events(
        &self,
        year: i32,
        calendar_ids: &[String],
    ) -> Result<Vec<AllDayEvent>, CalendarError> {
        let targets: Vec<String> = if calendar_ids.is_empty() {
            self.accounts
                .iter()
                .map(|(a, _)| composite_calendar_id(&a.account_id, PRIMARY_CALENDAR))
                .collect()
        } else {
            calendar_ids.to_vec()
        };

        let mut tasks = JoinSet::new();
        let mut first_error: Option<CalendarError> = None;
        let mut attempted = 0usize;

        for (index, calendar_key) in targets.into_iter().enumerate() {
            let (client, calendar_id) = match self.route(&calendar_key) {
                Ok((client, calendar_id)) => (client.clone(), calendar_id.to_string()),
                Err(e) => {
                    tracing::warn!(calendar = %calendar_key, "skipping calendar: {}", e);
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            attempted += 1;
            tasks.spawn(async move {
                let result = client.list_all_day_events(&calendar_id, year).await;
                (index, calendar_key, result)
            });
        }

        let mut results = Vec::with_capacity(attempted);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("event list task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let mut events = Vec::new();
        let mut succeeded = 0usize;
        for (_, calendar_key, result) in results {
            match result {
                Ok(items) => {
                    succeeded += 1;
                    events.extend(items.iter().filter_map(|e| e.to_all_day_event(&calendar_key)));
                }
                Err(e) => {
                    tracing::warn!(calendar = %calendar_key, "event list failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        tracing::debug!(year, events = events.len(), calendars = succeeded, "events loaded");
        Ok(events)
    }

    pub async fn create_event(
        &self,
        calendar_key: &str,
        event: &NewEvent,
    ) -> Result<AllDayEvent, CalendarError> {
        let (client, calendar_id) = self.route(calendar_key)?;
        let created = client.create_all_day_event(calendar_id, event).await?;
        to_layout_event(&created, calendar_key)
    }

    /// `event_id` may be composite or the raw Google id.
    pub async fn update_event(
        &self,
        calendar_key: &str,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<AllDayEvent, CalendarError> {
        let (client, calendar_id) = self.route(calendar_key)?;
        let raw_id = split_event_id(event_id, calendar_key).unwrap_or(event_id);
        let updated = client.update_all_day_event(calendar_id, raw_id, update).await?;
        to_layout_event(&updated, calendar_key)
    }

    pub async fn delete_event(&self, calendar_key: &str, event_id: &str) -> Result<(), CalendarError> {
        let (client, calendar_id) = self.route(calendar_key)?;
        let raw_id = split_event_id(event_id, calendar_key).unwrap_or(event_id);
        client.delete_event(calendar_id, raw_id).await
    }
}

fn to_layout_event(event: &ApiEvent, calendar_key: &str) -> Result<AllDayEvent, CalendarError> {
    event.to_all_day_event(calendar_key).ok_or_else(|| CalendarError::ApiError {
        status: 200,
        message: format!("event {} is not an all-day event", event.id),
    })
}
