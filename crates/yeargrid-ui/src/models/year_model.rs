//! Year view model.
//!
//! Owns the layout engine and the calendar state shown around it. Network
//! work goes through the AppServices runtime and channel; results are
//! applied in `poll_channel`, which the UI calls from its timer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use yeargrid_calendar::{AccountStatus, CalendarListItem, EventUpdate, LinkedAccount};
use yeargrid_core::{AppError, Config};
use yeargrid_layout::{AllDayEvent, HitTarget, Layout, LayoutEngine, LayoutMetrics, Viewport};

use super::create_form::CreateEventForm;
use super::selection::{
    account_ids, merge_calendar_colors, reconcile_selection, retain_valid_selection,
};
use crate::app_services::AppServices;
use crate::services::{
    request_create_event, request_delete_event, request_fetch_calendars, request_fetch_events,
    request_update_event, CalendarServiceError, CalendarServiceMessage, RequestToken,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Loading a year. Failure clears the events.
    Load,
    /// Manual refresh. Failure keeps what is shown.
    Refresh,
}

pub struct YearModel {
    services: Arc<AppServices>,
    engine: LayoutEngine,
    today: NaiveDate,
    default_color: String,

    events: Vec<AllDayEvent>,
    calendars: Vec<CalendarListItem>,
    accounts: Vec<AccountStatus>,
    known_accounts: HashSet<String>,
    calendars_loaded: bool,
    selected_calendar_ids: Vec<String>,
    calendar_colors: HashMap<String, String>,

    hidden_event_ids: HashSet<String>,
    show_hidden: bool,
    show_days_of_week: bool,
    /// Engine events need to be rebuilt from `visible_events`
    engine_stale: bool,

    loading: bool,
    refreshing: bool,
    error_message: String,
    generation: u64,
    fetch_mode: FetchMode,

    create_form: Option<CreateEventForm>,
    selected_event: Option<AllDayEvent>,
}

fn to_viewport(width: u32, height: u32) -> Viewport {
    Viewport::new(
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

fn user_message(e: CalendarServiceError) -> String {
    let err = AppError::from(e);
    tracing::warn!("calendar request failed: {}", err);
    err.user_message().to_string()
}

impl YearModel {
    /// Model for the current year.
    pub fn new(services: Arc<AppServices>, config: &Config) -> Self {
        Self::with_today(services, config, Local::now().date_naive())
    }

    pub fn with_today(services: Arc<AppServices>, config: &Config, today: NaiveDate) -> Self {
        let metrics = LayoutMetrics {
            gap_px: config.layout.gap_px,
            label_offset_px: config.layout.label_offset_px,
            lane_height_px: config.layout.lane_height_px,
        };
        let mut engine = LayoutEngine::new(
            today.year(),
            to_viewport(config.ui.window_width, config.ui.window_height),
            metrics,
        );
        engine.set_today(Some(today));

        Self {
            services,
            engine,
            today,
            default_color: config.google.default_calendar_color.clone(),
            events: Vec::new(),
            calendars: Vec::new(),
            accounts: Vec::new(),
            known_accounts: HashSet::new(),
            calendars_loaded: false,
            selected_calendar_ids: Vec::new(),
            calendar_colors: HashMap::new(),
            hidden_event_ids: HashSet::new(),
            show_hidden: config.ui.show_hidden,
            show_days_of_week: config.ui.show_days_of_week,
            engine_stale: false,
            loading: false,
            refreshing: false,
            error_message: String::new(),
            generation: 0,
            fetch_mode: FetchMode::Load,
            create_form: None,
            selected_event: None,
        }
    }

    // =========== Year and viewport ===========

    pub fn year(&self) -> i32 {
        self.engine.year()
    }

    /// Switch years and load the new year's events.
    pub fn set_year(&mut self, year: i32) {
        if year == self.year() {
            return;
        }
        tracing::info!(year, "showing year");
        self.engine.set_year(year);
        self.create_form = None;
        self.selected_event = None;
        self.fetch_events();
    }

    pub fn prev_year(&mut self) {
        self.set_year(self.year() - 1);
    }

    pub fn next_year(&mut self) {
        self.set_year(self.year() + 1);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.engine.set_viewport(to_viewport(width, height));
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.engine.set_today(Some(today));
    }

    pub fn layout(&mut self) -> &Layout {
        self.sync_engine();
        self.engine.layout()
    }

    fn sync_engine(&mut self) {
        if self.engine_stale {
            self.engine_stale = false;
            self.engine.set_events(self.visible_events());
        }
    }

    // =========== Events and visibility ===========

    pub fn events(&self) -> &[AllDayEvent] {
        &self.events
    }

    /// Events minus the hidden ones, unless hidden events are shown.
    pub fn visible_events(&self) -> Vec<AllDayEvent> {
        self.events
            .iter()
            .filter(|e| self.show_hidden || !self.hidden_event_ids.contains(&e.id))
            .cloned()
            .collect()
    }

    fn set_events(&mut self, events: Vec<AllDayEvent>) {
        self.events = events;
        if let Some(selected) = &self.selected_event {
            if !self.events.iter().any(|e| e.id == selected.id) {
                self.selected_event = None;
            }
        }
        self.engine_stale = true;
    }

    pub fn hidden_event_ids(&self) -> &HashSet<String> {
        &self.hidden_event_ids
    }

    pub fn hide_event(&mut self, event_id: &str) {
        if self.hidden_event_ids.insert(event_id.to_string()) {
            if !self.show_hidden && self.selected_event.as_ref().is_some_and(|e| e.id == event_id) {
                self.selected_event = None;
            }
            self.engine_stale = true;
        }
    }

    pub fn unhide_event(&mut self, event_id: &str) {
        if self.hidden_event_ids.remove(event_id) {
            self.engine_stale = true;
        }
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        if show != self.show_hidden {
            self.show_hidden = show;
            self.engine_stale = true;
        }
    }

    pub fn show_days_of_week(&self) -> bool {
        self.show_days_of_week
    }

    pub fn set_show_days_of_week(&mut self, show: bool) {
        self.show_days_of_week = show;
    }

    // =========== Calendars ===========

    pub fn calendars(&self) -> &[CalendarListItem] {
        &self.calendars
    }

    pub fn accounts(&self) -> &[AccountStatus] {
        &self.accounts
    }

    pub fn selected_calendar_ids(&self) -> &[String] {
        &self.selected_calendar_ids
    }

    pub fn calendar_colors(&self) -> &HashMap<String, String> {
        &self.calendar_colors
    }

    /// Colour of a calendar, falling back to the configured default.
    pub fn calendar_color(&self, calendar_id: &str) -> &str {
        self.calendar_colors
            .get(calendar_id)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }

    pub fn set_calendar_color(&mut self, calendar_id: &str, color: &str) {
        self.calendar_colors
            .insert(calendar_id.to_string(), color.to_string());
    }

    /// Select or deselect a calendar and reload the events.
    pub fn toggle_calendar(&mut self, calendar_id: &str) {
        match self
            .selected_calendar_ids
            .iter()
            .position(|id| id == calendar_id)
        {
            Some(pos) => {
                self.selected_calendar_ids.remove(pos);
            }
            None => self.selected_calendar_ids.push(calendar_id.to_string()),
        }
        self.fetch_events();
    }

    pub fn link_account(&mut self, account: LinkedAccount) {
        self.services.link_account(account);
        self.fetch_calendars();
    }

    /// Forget an account and refresh what is shown.
    pub fn disconnect_account(&mut self, account_id: &str) {
        if self.services.disconnect_account(account_id) {
            self.known_accounts.remove(account_id);
        }
        self.refresh();
    }

    // =========== Fetching ===========

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Load the events of the shown year for the selected calendars.
    pub fn fetch_events(&mut self) {
        self.start_fetch(FetchMode::Load);
    }

    /// Load the calendar list, then the events.
    pub fn fetch_calendars(&mut self) {
        self.loading = true;
        request_fetch_calendars(&self.services, false);
    }

    /// Reload calendars and events, keeping what is shown until they arrive.
    pub fn refresh(&mut self) {
        self.refreshing = true;
        request_fetch_calendars(&self.services, true);
    }

    fn start_fetch(&mut self, mode: FetchMode) {
        self.generation += 1;
        self.fetch_mode = mode;

        if self.services.accounts().is_empty() {
            self.services.cancel_fetch();
            self.loading = false;
            self.refreshing = false;
            self.set_events(Vec::new());
            return;
        }

        match mode {
            FetchMode::Load => self.loading = true,
            FetchMode::Refresh => self.refreshing = true,
        }

        let token = RequestToken {
            generation: self.generation,
            year: self.year(),
        };
        tracing::debug!(generation = token.generation, year = token.year, ?mode, "fetching events");
        request_fetch_events(&self.services, token, self.selected_calendar_ids.clone());
    }

    /// Apply every pending service message. Returns whether any arrived.
    pub fn poll_channel(&mut self) -> bool {
        let mut handled = false;
        while let Some(msg) = self.services.try_recv_calendar_message() {
            self.apply_message(msg);
            handled = true;
        }
        handled
    }

    pub fn apply_message(&mut self, msg: CalendarServiceMessage) {
        match msg {
            CalendarServiceMessage::FetchEventsDone { token, result } => {
                if token.generation != self.generation || token.year != self.year() {
                    tracing::debug!(
                        generation = token.generation,
                        year = token.year,
                        current = self.generation,
                        "dropping stale event response"
                    );
                    return;
                }
                self.loading = false;
                self.refreshing = false;
                match result {
                    Ok(events) => {
                        tracing::info!(year = token.year, events = events.len(), "events loaded");
                        self.error_message.clear();
                        self.set_events(events);
                    }
                    Err(e) => {
                        self.error_message = user_message(e);
                        if self.fetch_mode == FetchMode::Load {
                            self.set_events(Vec::new());
                        }
                    }
                }
            }
            CalendarServiceMessage::FetchCalendarsDone {
                refresh,
                calendars,
                accounts,
            } => {
                self.apply_calendars(refresh, calendars, accounts);
                self.start_fetch(if refresh {
                    FetchMode::Refresh
                } else {
                    FetchMode::Load
                });
            }
            CalendarServiceMessage::CreateEventDone(result) => match result {
                Ok(event) => {
                    tracing::info!(event_id = %event.id, "event created");
                    self.create_form = None;
                    self.refresh();
                }
                Err(e) => {
                    let message = user_message(e);
                    if let Some(form) = self.create_form.as_mut() {
                        form.submitting = false;
                        form.error = Some(message);
                    } else {
                        self.error_message = message;
                    }
                }
            },
            CalendarServiceMessage::UpdateEventDone(result) => match result {
                Ok(event) => {
                    if let Some(slot) = self.events.iter_mut().find(|e| e.id == event.id) {
                        *slot = event.clone();
                    } else {
                        self.events.push(event.clone());
                    }
                    if self.selected_event.as_ref().is_some_and(|e| e.id == event.id) {
                        self.selected_event = Some(event);
                    }
                    self.engine_stale = true;
                }
                Err(e) => self.error_message = user_message(e),
            },
            CalendarServiceMessage::DeleteEventDone { event_id, result } => match result {
                Ok(()) => {
                    let mut events = std::mem::take(&mut self.events);
                    events.retain(|e| e.id != event_id);
                    self.hidden_event_ids.remove(&event_id);
                    self.set_events(events);
                }
                Err(e) => self.error_message = user_message(e),
            },
        }
    }

    fn apply_calendars(
        &mut self,
        refresh: bool,
        calendars: Vec<CalendarListItem>,
        accounts: Vec<AccountStatus>,
    ) {
        self.selected_calendar_ids = if refresh {
            retain_valid_selection(&self.selected_calendar_ids, &calendars)
        } else {
            reconcile_selection(
                &self.selected_calendar_ids,
                &self.known_accounts,
                &calendars,
                !self.calendars_loaded,
            )
        };

        if accounts.iter().all(|a| !a.is_ok()) {
            if let Some(error) = accounts.first().and_then(|a| a.error.clone()) {
                self.error_message = error;
            }
        }

        self.calendar_colors =
            merge_calendar_colors(&self.calendar_colors, &calendars, &self.default_color);
        self.known_accounts.extend(account_ids(&calendars));
        self.calendars_loaded = true;
        self.calendars = calendars;
        self.accounts = accounts;
        tracing::debug!(
            calendars = self.calendars.len(),
            selected = self.selected_calendar_ids.len(),
            "calendar list applied"
        );
    }

    // =========== Interaction ===========

    /// Resolve a click: a day opens the create form for that date, an event
    /// becomes the selected event.
    pub fn click_at(&mut self, x: f32, y: f32) -> Option<HitTarget> {
        self.sync_engine();
        let target = self.engine.hit_test(x, y)?;
        match &target {
            HitTarget::Day(date) => {
                self.selected_event = None;
                self.create_form = Some(CreateEventForm::for_date(*date, &self.calendars));
            }
            HitTarget::Event(event) => {
                self.create_form = None;
                self.selected_event = Some(event.clone());
            }
        }
        Some(target)
    }

    pub fn selected_event(&self) -> Option<&AllDayEvent> {
        self.selected_event.as_ref()
    }

    pub fn clear_selected_event(&mut self) {
        self.selected_event = None;
    }

    pub fn open_create_form(&mut self) {
        self.create_form = Some(CreateEventForm::new(self.year(), self.today, &self.calendars));
    }

    pub fn close_create_form(&mut self) {
        self.create_form = None;
    }

    pub fn create_form(&self) -> Option<&CreateEventForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateEventForm> {
        self.create_form.as_mut()
    }

    /// Validate the form and send the create request. Validation errors stay
    /// on the form.
    pub fn submit_create(&mut self) -> bool {
        let Some(form) = self.create_form.as_mut() else {
            return false;
        };
        if form.submitting {
            return false;
        }
        match form.validate() {
            Ok((calendar_id, event)) => {
                form.error = None;
                form.submitting = true;
                request_create_event(&self.services, calendar_id, event);
                true
            }
            Err(e) => {
                form.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn update_event(&mut self, event_id: &str, update: EventUpdate) {
        let Some(event) = self.events.iter().find(|e| e.id == event_id) else {
            tracing::warn!(event_id, "update for unknown event");
            return;
        };
        request_update_event(
            &self.services,
            event.calendar_id.clone(),
            event.id.clone(),
            update,
        );
    }

    pub fn delete_event(&mut self, event_id: &str) {
        let Some(event) = self.events.iter().find(|e| e.id == event_id) else {
            tracing::warn!(event_id, "delete for unknown event");
            return;
        };
        request_delete_event(&self.services, event.calendar_id.clone(), event.id.clone());
    }
}
