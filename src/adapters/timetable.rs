//! HTTP access to the public timetable search.

use crate::config::toml_config::{resolve_secret, TimetableConfig};
use crate::core::markup::{extract_rows, RawRow};
use crate::domain::ports::CatalogSource;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Selector fields the search form expects to see once as `dummy` before the real values.
const DUMMY_FIELDS: [&str; 21] = [
    "sel_aud",
    "sel_subj",
    "sel_camp",
    "sel_sess",
    "sel_attr",
    "sel_levl",
    "sel_schd",
    "sel_insm",
    "sel_link",
    "sel_wait",
    "sel_day",
    "sel_begin_hh",
    "sel_begin_mi",
    "sel_begin_am_pm",
    "sel_end_hh",
    "sel_end_mi",
    "sel_end_am_pm",
    "sel_instruct",
    "sel_special",
    "sel_resd",
    "sel_breadth",
];

const ALL_DAYS: [&str; 7] = ["m", "t", "w", "r", "f", "s", "u"];

#[derive(Debug, Clone)]
pub struct TimetableClient {
    client: Client,
    endpoint: String,
    session_id: String,
    level: String,
    timeout: Duration,
    headers: HeaderMap,
}

impl TimetableClient {
    pub fn from_config(config: &TimetableConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder().timeout(timeout).build()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        if let Some(cookie) = resolve_secret(config.cookie.as_deref()) {
            headers.insert(COOKIE, header_value("timetable.cookie", &cookie)?);
        }
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    PlannerError::InvalidConfigValueError {
                        field: "timetable.headers".to_string(),
                        value: name.clone(),
                        reason: e.to_string(),
                    }
                })?;
            headers.insert(header_name, header_value("timetable.headers", value)?);
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            session_id: config.session_id.clone(),
            level: config.level.clone(),
            timeout,
            headers,
        })
    }

    /// Form body for one department, field order and repeats included.
    pub fn form_fields(&self, department: &str, term_code: &str) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = vec![
            ("wsea_code", "EXT".to_string()),
            ("term_code", term_code.to_string()),
            ("session_id", self.session_id.clone()),
            ("ws_numb", String::new()),
        ];
        fields.extend(DUMMY_FIELDS.iter().map(|name| (*name, "dummy".to_string())));
        fields.extend([
            ("sel_levl", self.level.clone()),
            ("sel_subj", department.to_string()),
            ("sel_number", String::new()),
            ("sel_crn", String::new()),
            ("sel_special", "N".to_string()),
            ("sel_sess", String::new()),
            ("sel_schd", String::new()),
            ("sel_instruct", String::new()),
            ("sel_begin_hh", "0".to_string()),
            ("sel_begin_mi", "0".to_string()),
            ("sel_begin_am_pm", "a".to_string()),
            ("sel_end_hh", "0".to_string()),
            ("sel_end_mi", "0".to_string()),
            ("sel_end_am_pm", "a".to_string()),
        ]);
        fields.extend(ALL_DAYS.iter().map(|day| ("sel_day", day.to_string())));
        fields.push(("block_button", String::new()));
        fields
    }

    /// Raw results page for one department. Errors on transport failure or non-2xx.
    pub async fn search_html(&self, department: &str, term_code: &str) -> Result<String> {
        let request = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .form(&self.form_fields(department, term_code))
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                PlannerError::fetch(department, format!("timed out after {:?}", self.timeout))
            })??;

        let status = response.status();
        tracing::debug!("Timetable response for {}: {}", department, status);
        if !status.is_success() {
            return Err(PlannerError::fetch(department, format!("status {}", status)));
        }

        Ok(response.text().await?)
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| PlannerError::InvalidConfigValueError {
        field: field.to_string(),
        value: "<redacted>".to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl CatalogSource for TimetableClient {
    async fn fetch_department(&self, department: &str, term_code: &str) -> Vec<RawRow> {
        match self.search_html(department, term_code).await {
            Ok(html) => {
                let rows = extract_rows(&html);
                tracing::debug!("📥 {}: {} timetable rows", department, rows.len());
                rows
            }
            Err(e) => {
                tracing::warn!("⚠️ Skipping department {}: {}", department, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const RESULTS: &str = r##"<table>
<tr bgcolor="#C0C0C0"><td></td><td>Open</td><td>31245</td><td>COMP 1405</td><td>A</td>
<td>Intro to Computer Science I</td><td>0.5</td><td>Lecture</td><td></td><td></td><td>Jane Smith</td></tr>
<tr bgcolor="#C0C0C0"><td></td><td>Meeting Date: Sep 04, 2024 to Dec 06, 2024 Days: Tue Thu Time: 10:05 - 11:25</td></tr>
</table>"##;

    fn client_for(server: &MockServer) -> TimetableClient {
        let config = TimetableConfig {
            endpoint: server.url("/search"),
            timeout_seconds: 2,
            ..TimetableConfig::default()
        };
        TimetableClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_form_fields_layout() {
        let client = TimetableClient::from_config(&TimetableConfig::default()).unwrap();
        let fields = client.form_fields("COMP", "202510");

        assert_eq!(fields[0], ("wsea_code", "EXT".to_string()));
        assert_eq!(fields[1], ("term_code", "202510".to_string()));
        assert_eq!(fields[2], ("session_id", "22963932".to_string()));
        assert!(fields.contains(&("sel_subj", "COMP".to_string())));
        assert!(fields.contains(&("sel_levl", "UG".to_string())));
        assert_eq!(fields.iter().filter(|(k, _)| *k == "sel_day").count(), 8);
        assert_eq!(fields.last().unwrap().0, "block_button");
    }

    #[tokio::test]
    async fn test_fetch_department_parses_rows() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("sel_subj=COMP")
                .body_contains("term_code=202520");
            then.status(200).body(RESULTS);
        });

        let rows = client_for(&server).fetch_department("COMP", "202520").await;

        mock.assert();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(3), "COMP 1405");
    }

    #[tokio::test]
    async fn test_server_error_yields_no_rows() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(500).body("boom");
        });

        let client = client_for(&server);
        assert!(client.fetch_department("MATH", "202510").await.is_empty());
        assert!(matches!(
            client.search_html("MATH", "202510").await,
            Err(PlannerError::FetchError { .. })
        ));
    }

    #[tokio::test]
    async fn test_cookie_and_extra_headers_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("cookie", "TESTID=set")
                .header("x-campus", "main");
            then.status(200).body("<html></html>");
        });

        let mut config = TimetableConfig {
            endpoint: server.url("/search"),
            cookie: Some("TESTID=set".to_string()),
            ..TimetableConfig::default()
        };
        config
            .headers
            .insert("X-Campus".to_string(), "main".to_string());
        let client = TimetableClient::from_config(&config).unwrap();

        assert!(client.fetch_department("BIOL", "202510").await.is_empty());
        mock.assert();
    }

    #[test]
    fn test_bad_header_name_rejected() {
        let mut config = TimetableConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(TimetableClient::from_config(&config).is_err());
    }
}
