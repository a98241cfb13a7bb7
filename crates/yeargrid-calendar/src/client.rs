//! Google Calendar API client.

use chrono::{NaiveDate, SecondsFormat};
use tracing::instrument;

use crate::error::CalendarError;
use crate::types::*;

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page the events endpoint accepts.
pub const MAX_EVENTS_PER_PAGE: u32 = 2500;
const CALENDARS_PER_PAGE: u32 = 250;

#[derive(Clone)]
pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    max_results: u32,
}

impl CalendarClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, CALENDAR_API_BASE)
    }

    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: MAX_EVENTS_PER_PAGE,
        }
    }

    /// Page size for event listing, clamped to what the API accepts.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, MAX_EVENTS_PER_PAGE);
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// List every calendar the user can at least read.
    #[instrument(skip(self), level = "info")]
    pub async fn list_calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/users/me/calendarList?minAccessRole=reader&maxResults={}",
                self.base_url, CALENDARS_PER_PAGE
            );
            if let Some(pt) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .send()
                .await?;

            let page: CalendarListResponse = self.handle_response(response).await?;
            calendars.extend(page.items.into_iter().map(Calendar::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = calendars.len(), "calendars listed");
        Ok(calendars)
    }

    /// All-day events of one calendar that touch `year`, following every
    /// page. Timed and cancelled events are left out.
    #[instrument(skip(self), level = "info")]
    pub async fn list_all_day_events(
        &self,
        calendar_id: &str,
        year: i32,
    ) -> Result<Vec<ApiEvent>, CalendarError> {
        let (time_min, time_max) = year_bounds(year)?;
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut total = 0usize;

        loop {
            let mut url = format!(
                "{}/calendars/{}/events?singleEvents=true&orderBy=startTime&timeMin={}&timeMax={}&maxResults={}",
                self.base_url,
                urlencoding::encode(calendar_id),
                urlencoding::encode(&time_min),
                urlencoding::encode(&time_max),
                self.max_results,
            );
            if let Some(pt) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .send()
                .await?;

            let page: EventListResponse = self.handle_response(response).await?;
            total += page.items.len();
            events.extend(page.items.into_iter().filter(ApiEvent::is_all_day));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(total, all_day = events.len(), "events listed");
        Ok(events)
    }

    /// Create an all-day event.
    #[instrument(skip(self), level = "info")]
    pub async fn create_all_day_event(
        &self,
        calendar_id: &str,
        event: &NewEvent,
    ) -> Result<ApiEvent, CalendarError> {
        let body = event.to_body()?;
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id),
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Patch title and/or dates of an existing event.
    #[instrument(skip(self), level = "info")]
    pub async fn update_all_day_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<ApiEvent, CalendarError> {
        if update.is_empty() {
            return Err(CalendarError::InvalidEventData("nothing to update".to_string()));
        }
        let body = update.to_body()?;
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        );

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete an event. An event that is already gone counts as deleted.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        );

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 410 {
            Ok(())
        } else {
            Err(Self::error_for_status(response).await)
        }
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CalendarError> {
        if response.status().is_success() {
            response.json().await.map_err(|e| CalendarError::ApiError {
                status: 200,
                message: format!("JSON parse error: {}", e),
            })
        } else {
            Err(Self::error_for_status(response).await)
        }
    }

    async fn error_for_status(response: reqwest::Response) -> CalendarError {
        let status = response.status();
        match status.as_u16() {
            401 => CalendarError::TokenExpired,
            403 => CalendarError::AuthRequired,
            404 => CalendarError::NotFound(response.text().await.unwrap_or_default()),
            409 => CalendarError::Conflict,
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(60);
                CalendarError::RateLimited(retry_after)
            }
            code => CalendarError::ApiError {
                status: code,
                message: response.text().await.unwrap_or_default(),
            },
        }
    }
}

/// `timeMin`/`timeMax` for a calendar year: January 1st 00:00 UTC of the
/// year and of the next one.
pub fn year_bounds(year: i32) -> Result<(String, String), CalendarError> {
    let start_of = |y: i32| {
        NaiveDate::from_ymd_opt(y, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
            .ok_or_else(|| CalendarError::InvalidEventData(format!("year {} out of range", y)))
    };
    Ok((start_of(year)?, start_of(year + 1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_bounds() {
        let (min, max) = year_bounds(2024).unwrap();
        assert_eq!(min, "2024-01-01T00:00:00.000Z");
        assert_eq!(max, "2025-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_list_calendars() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .and(query_param("minAccessRole", "reader"))
            .and(query_param("maxResults", "250"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "me@example.com", "summary": "Me", "primary": true, "accessRole": "owner", "backgroundColor": "#9fc6e7"},
                    {"id": "holidays", "summary": "Holidays", "accessRole": "reader"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let calendars = client.list_calendars().await.unwrap();

        assert_eq!(calendars.len(), 2);
        assert!(calendars[0].is_primary);
        assert_eq!(calendars[0].background_color.as_deref(), Some("#9fc6e7"));
        assert_eq!(calendars[1].access_role, AccessRole::Reader);
    }

    #[tokio::test]
    async fn test_list_events_filters_and_paginates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("timeMin", "2024-01-01T00:00:00.000Z"))
            .and(query_param("timeMax", "2025-01-01T00:00:00.000Z"))
            .and(query_param("pageToken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "late", "summary": "Late", "start": {"date": "2024-11-01"}, "end": {"date": "2024-11-02"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        // lower priority so the pageToken mock wins when it matches
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "trip", "summary": "Trip", "start": {"date": "2024-03-30"}, "end": {"date": "2024-04-02"}},
                    {"id": "meeting", "start": {"dateTime": "2024-02-01T10:00:00Z"}, "end": {"dateTime": "2024-02-01T11:00:00Z"}},
                    {"id": "gone", "status": "cancelled", "start": {"date": "2024-05-01"}, "end": {"date": "2024-05-02"}}
                ],
                "nextPageToken": "page2"
            })))
            .with_priority(10)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let events = client.list_all_day_events("primary", 2024).await.unwrap();

        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["trip", "late"]);
    }

    #[tokio::test]
    async fn test_calendar_id_is_encoded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/en.usa%23holiday%40group.v.calendar.google.com/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let events = client
            .list_all_day_events("en.usa#holiday@group.v.calendar.google.com", 2024)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_exclusive_end() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(body_json(serde_json::json!({
                "summary": "Trip",
                "start": {"date": "2024-03-30"},
                "end": {"date": "2024-04-02"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new1",
                "summary": "Trip",
                "start": {"date": "2024-03-30"},
                "end": {"date": "2024-04-02"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let created = client
            .create_all_day_event(
                "primary",
                &NewEvent {
                    title: "Trip".to_string(),
                    start_date: date(2024, 3, 30),
                    end_date_inclusive: Some(date(2024, 4, 1)),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.id, "new1");
        assert!(created.is_all_day());
    }

    #[tokio::test]
    async fn test_invalid_event_never_reaches_server() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let result = client
            .create_all_day_event("primary", &NewEvent::single_day("", date(2024, 1, 1)))
            .await;
        assert!(matches!(result, Err(CalendarError::InvalidEventData(_))));
    }

    #[tokio::test]
    async fn test_update_uses_patch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/calendars/primary/events/abc"))
            .and(body_json(serde_json::json!({"summary": "Renamed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc",
                "summary": "Renamed",
                "start": {"date": "2024-06-01"},
                "end": {"date": "2024-06-02"}
            })))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let update = EventUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = client.update_all_day_event("primary", "abc", &update).await.unwrap();
        assert_eq!(updated.summary.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_delete_treats_gone_as_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/done"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        assert!(client.delete_event("primary", "done").await.is_ok());
        assert!(client.delete_event("primary", "gone").await.is_ok());
        assert!(matches!(
            client.delete_event("primary", "missing").await,
            Err(CalendarError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_token_expired() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("expired", &mock_server.uri());
        let result = client.list_calendars().await;
        assert!(matches!(result, Err(CalendarError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_forbidden_and_conflict() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/secret/events"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/calendars/primary/events/abc"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        assert!(matches!(
            client.list_all_day_events("secret", 2024).await,
            Err(CalendarError::AuthRequired)
        ));
        let update = EventUpdate {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            client.update_all_day_event("primary", "abc", &update).await,
            Err(CalendarError::Conflict)
        ));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let result = client.list_calendars().await;
        assert!(matches!(result, Err(CalendarError::RateLimited(30))));
    }

    #[tokio::test]
    async fn test_rate_limited_without_header_defaults() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let result = client.list_calendars().await;
        assert!(matches!(result, Err(CalendarError::RateLimited(60))));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend down"))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::with_base_url("test_token", &mock_server.uri());
        let err = client.list_calendars().await.unwrap_err();
        assert!(matches!(err, CalendarError::ApiError { status: 503, .. }));
        assert!(err.is_retryable());
    }
}
