//! Calendar list helpers: colours, grouping, selection and defaults.

use std::collections::{HashMap, HashSet};

use yeargrid_calendar::{split_calendar_id, AccountStatus, CalendarListItem};

/// Calendars of one linked account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountGroup<'a> {
    pub account_id: String,
    pub email: String,
    pub calendars: Vec<&'a CalendarListItem>,
}

/// Account part of a composite calendar id.
pub fn account_id_of(calendar_id: &str) -> Option<&str> {
    split_calendar_id(calendar_id).map(|(account, _)| account)
}

/// Keep user-chosen colours and give new calendars their Google colour, or
/// `default_color` when they have none.
pub fn merge_calendar_colors(
    existing: &HashMap<String, String>,
    calendars: &[CalendarListItem],
    default_color: &str,
) -> HashMap<String, String> {
    let mut colors = existing.clone();
    for calendar in calendars {
        colors.entry(calendar.id.clone()).or_insert_with(|| {
            calendar
                .background_color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| default_color.to_string())
        });
    }
    colors
}

/// Group calendars under their accounts, in account order.
///
/// Without account information the groups are derived from the calendar ids
/// in first-seen order.
pub fn group_by_account<'a>(
    calendars: &'a [CalendarListItem],
    accounts: &[AccountStatus],
) -> Vec<AccountGroup<'a>> {
    if !accounts.is_empty() {
        return accounts
            .iter()
            .map(|account| AccountGroup {
                account_id: account.account_id.clone(),
                email: if account.email.is_empty() {
                    "Other".to_string()
                } else {
                    account.email.clone()
                },
                calendars: calendars
                    .iter()
                    .filter(|c| account_id_of(&c.id) == Some(account.account_id.as_str()))
                    .collect(),
            })
            .collect();
    }

    let mut groups: Vec<AccountGroup<'a>> = Vec::new();
    for calendar in calendars {
        let account_id = account_id_of(&calendar.id).unwrap_or_default();
        match groups.iter_mut().find(|g| g.account_id == account_id) {
            Some(group) => group.calendars.push(calendar),
            None => groups.push(AccountGroup {
                account_id: account_id.to_string(),
                email: if calendar.account_email.is_empty() {
                    "Other".to_string()
                } else {
                    calendar.account_email.clone()
                },
                calendars: vec![calendar],
            }),
        }
    }
    groups
}

pub fn writable_calendars(calendars: &[CalendarListItem]) -> Vec<&CalendarListItem> {
    calendars.iter().filter(|c| c.can_write()).collect()
}

/// Calendar preselected in the create form: the writable primary, else the
/// first writable, else the first calendar.
pub fn default_create_calendar(calendars: &[CalendarListItem]) -> Option<&CalendarListItem> {
    let writable = writable_calendars(calendars);
    writable
        .iter()
        .find(|c| c.primary)
        .or_else(|| writable.first())
        .copied()
        .or_else(|| calendars.first())
}

/// Selection after a calendar list arrives.
///
/// On the first load every calendar is selected. Afterwards ids that no
/// longer exist are dropped and calendars of accounts not in
/// `known_accounts` are added.
pub fn reconcile_selection(
    previous: &[String],
    known_accounts: &HashSet<String>,
    calendars: &[CalendarListItem],
    first_load: bool,
) -> Vec<String> {
    if first_load {
        return calendars.iter().map(|c| c.id.clone()).collect();
    }

    let available: HashSet<&str> = calendars.iter().map(|c| c.id.as_str()).collect();
    let mut selection: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let kept = previous.iter().filter(|id| available.contains(id.as_str()));
    let added = calendars
        .iter()
        .filter(|c| account_id_of(&c.id).is_some_and(|a| !known_accounts.contains(a)))
        .map(|c| &c.id);

    for id in kept.chain(added) {
        if seen.insert(id.clone()) {
            selection.push(id.clone());
        }
    }
    selection
}

/// Selection after a manual refresh: existing ids are kept if still valid,
/// nothing new is added.
pub fn retain_valid_selection(previous: &[String], calendars: &[CalendarListItem]) -> Vec<String> {
    previous
        .iter()
        .filter(|id| calendars.iter().any(|c| &c.id == *id))
        .cloned()
        .collect()
}

/// Accounts that own at least one calendar in the list.
pub fn account_ids(calendars: &[CalendarListItem]) -> HashSet<String> {
    calendars
        .iter()
        .filter_map(|c| account_id_of(&c.id))
        .map(str::to_string)
        .collect()
}
