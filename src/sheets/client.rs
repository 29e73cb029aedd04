// =============================================================================
// Google Sheets REST Client — values API v4
// =============================================================================
//
// SECURITY: The access token is sent only as an `Authorization: Bearer`
// header and is never logged or serialised.
//
// Endpoints used:
//   PUT /v4/spreadsheets/{id}/values/{range}?valueInputOption=USER_ENTERED
//   GET /v4/spreadsheets/{id}/values/{sheet}?valueRenderOption=UNFORMATTED_VALUE
//       &dateTimeRenderOption=SERIAL_NUMBER
//
// Reads are unformatted so dates arrive as serial day numbers and closes as
// plain numbers, whatever locale the spreadsheet is set to.
//
// 401/403 map to `SheetError::Unauthorized`; transport failures map to
// `SheetError::Connectivity`.
// =============================================================================

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::error::SheetError;
use crate::sheets::{SheetBackend, Table};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Value range payload returned by the values endpoint.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets client bound to one worksheet of one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    base_url: Url,
    spreadsheet_id: String,
    worksheet: String,
    client: reqwest::Client,
}

impl SheetsClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client for `worksheet` inside `spreadsheet_id`.
    ///
    /// An empty `access_token` is accepted; every request will then fail
    /// with [`SheetError::Unauthorized`], which the analyzer reports to the
    /// user.
    pub fn new(
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        access_token: &str,
    ) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid sheets base url {base_url}"))?;
        ensure!(!base_url.cannot_be_a_base(), "sheets base url {base_url} cannot hold a path");

        let mut default_headers = HeaderMap::new();
        if !access_token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {access_token}"))
                .context("access token contains characters not allowed in a header")?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "SheetsClient initialised");

        Ok(Self {
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            client,
        })
    }

    // -------------------------------------------------------------------------
    // Values API
    // -------------------------------------------------------------------------

    /// PUT a single user-entered value (a formula here) into `cell`.
    #[instrument(skip(self, formula), name = "sheets::update_cell")]
    pub async fn update_cell(&self, cell: &str, formula: &str) -> Result<(), SheetError> {
        let range = a1_range(&self.worksheet, Some(cell));
        let mut url = self.values_url(&range);
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[formula]],
        });

        let resp = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;

        debug!(range = %range, "cell updated");
        Ok(())
    }

    /// GET every populated row of the worksheet as raw (unformatted) values.
    #[instrument(skip(self), name = "sheets::get_all_rows")]
    pub async fn get_all_rows(&self) -> Result<Table, SheetError> {
        let range = a1_range(&self.worksheet, None);
        let mut url = self.values_url(&range);
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "SERIAL_NUMBER");

        let resp = self.client.get(url).send().await.map_err(transport_error)?;
        let resp = check_status(resp).await?;

        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| SheetError::InvalidResponse(format!("failed to parse value range: {e}")))?;

        debug!(range = %range, rows = body.values.len(), "rows fetched");
        Ok(Table::from_values(body.values))
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn values_url(&self, range: &str) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so the segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        }
        url
    }
}

impl SheetBackend for SheetsClient {
    async fn write_formula(&self, cell: &str, formula: &str) -> Result<(), SheetError> {
        self.update_cell(cell, formula).await
    }

    async fn read_table(&self) -> Result<Table, SheetError> {
        self.get_all_rows().await
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.base_url.as_str())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet", &self.worksheet)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// A1 range for `sheet`, optionally narrowed to `cell`. The sheet name is
/// always quoted so names with spaces or punctuation work.
fn a1_range(sheet: &str, cell: Option<&str>) -> String {
    let quoted = format!("'{}'", sheet.replace('\'', "''"));
    match cell {
        Some(cell) => format!("{quoted}!{cell}"),
        None => quoted,
    }
}

fn transport_error(err: reqwest::Error) -> SheetError {
    warn!(error = %err, "sheets request failed before a response arrived");
    SheetError::Connectivity(err.to_string())
}

/// Pass success responses through; turn everything else into a `SheetError`
/// carrying the API's own message when it sent one.
async fn check_status(resp: Response) -> Result<Response, SheetError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = api_error_message(&text).unwrap_or_else(|| {
        if text.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            text
        }
    });

    warn!(status = status.as_u16(), message = %message, "sheets API returned an error");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SheetError::Unauthorized { status: status.as_u16(), message }
        }
        _ => SheetError::Api { status: status.as_u16(), message },
    })
}

/// Extract `error.message` from a Google API error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new("https://sheets.googleapis.com", "abc123", "Data", "tok").unwrap()
    }

    #[test]
    fn ranges_quote_the_sheet_name() {
        assert_eq!(a1_range("Data", Some("A1")), "'Data'!A1");
        assert_eq!(a1_range("My Sheet", None), "'My Sheet'");
        assert_eq!(a1_range("Bob's", Some("B2")), "'Bob''s'!B2");
    }

    #[test]
    fn values_url_has_expected_path() {
        let url = client().values_url("'Data'!A1");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Data'!A1"
        );
    }

    #[test]
    fn values_url_respects_base_path() {
        let c = SheetsClient::new("http://127.0.0.1:9000/proxy/", "id", "My Data", "").unwrap();
        let url = c.values_url("'My Data'");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/v4/spreadsheets/id/values/'My%20Data'");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(SheetsClient::new("not a url", "id", "Data", "").is_err());
        assert!(SheetsClient::new("mailto:x@y.z", "id", "Data", "").is_err());
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            api_error_message(body).as_deref(),
            Some("The caller does not have permission")
        );
        assert_eq!(api_error_message("<html>"), None);
    }

    #[test]
    fn debug_redacts_token() {
        let out = format!("{:?}", client());
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("tok\""));
    }

    // ---- against a local Sheets stub ---------------------------------------

    mod stub {
        use std::sync::{Arc, Mutex};

        use axum::extract::State;
        use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
        use axum::Router;

        /// One request as the stub received it.
        #[derive(Debug, Clone)]
        pub struct Seen {
            pub method: Method,
            pub path: String,
            pub query: String,
            pub auth: Option<String>,
            pub body: String,
        }

        /// Answers every request with a fixed status and JSON body.
        pub struct SheetsStub {
            status: StatusCode,
            body: String,
            pub seen: Mutex<Vec<Seen>>,
        }

        impl SheetsStub {
            pub fn last(&self) -> Seen {
                self.seen.lock().unwrap().last().cloned().expect("no request reached the stub")
            }
        }

        async fn respond(
            State(stub): State<Arc<SheetsStub>>,
            method: Method,
            uri: Uri,
            headers: HeaderMap,
            body: String,
        ) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
            stub.seen.lock().unwrap().push(Seen {
                method,
                path: uri.path().to_string(),
                query: uri.query().unwrap_or_default().to_string(),
                auth: headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body,
            });
            (stub.status, [(header::CONTENT_TYPE, "application/json")], stub.body.clone())
        }

        /// Serve the stub on an ephemeral local port; returns its base url.
        pub async fn spawn(status: u16, body: &str) -> (String, Arc<SheetsStub>) {
            let stub = Arc::new(SheetsStub {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
            });
            let app = Router::new().fallback(respond).with_state(stub.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (format!("http://{addr}"), stub)
        }
    }

    fn stub_client(base_url: &str) -> SheetsClient {
        SheetsClient::new(base_url, "abc123", "Data", "tok").unwrap()
    }

    #[tokio::test]
    async fn update_cell_puts_user_entered_formula() {
        let (base, stub) = stub::spawn(200, r#"{"updatedCells":1}"#).await;
        let formula = r#"=GOOGLEFINANCE("NSE:TCS","all",TODAY()-250,TODAY())"#;

        stub_client(&base).update_cell("A1", formula).await.unwrap();

        let seen = stub.last();
        assert_eq!(seen.method, axum::http::Method::PUT);
        assert_eq!(seen.path, "/v4/spreadsheets/abc123/values/'Data'!A1");
        assert_eq!(seen.query, "valueInputOption=USER_ENTERED");
        assert_eq!(seen.auth.as_deref(), Some("Bearer tok"));
        let body: Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(
            body,
            json!({ "range": "'Data'!A1", "majorDimension": "ROWS", "values": [[formula]] })
        );
    }

    #[tokio::test]
    async fn get_all_rows_requests_serial_numbers() {
        let payload = r#"{
            "range": "Data!A1:F3",
            "majorDimension": "ROWS",
            "values": [["Date", "Close"], [45944.645833333336, 3042.5], [45945.645833333336, 3088.1]]
        }"#;
        let (base, stub) = stub::spawn(200, payload).await;

        let table = stub_client(&base).get_all_rows().await.unwrap();

        let seen = stub.last();
        assert_eq!(seen.method, axum::http::Method::GET);
        assert_eq!(seen.path, "/v4/spreadsheets/abc123/values/'Data'");
        assert_eq!(
            seen.query,
            "majorDimension=ROWS&valueRenderOption=UNFORMATTED_VALUE&dateTimeRenderOption=SERIAL_NUMBER"
        );

        let parsed = crate::sheets::parse_price_series(&table).unwrap();
        assert_eq!(
            parsed.series.dates(),
            vec![
                chrono::NaiveDate::from_ymd_opt(2025, 10, 14).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2025, 10, 15).unwrap(),
            ]
        );
        assert_eq!(parsed.series.closes(), vec![Some(3042.5), Some(3088.1)]);
    }

    #[tokio::test]
    async fn missing_values_field_is_an_empty_table() {
        let (base, _stub) = stub::spawn(200, r#"{"range":"Data!A1:Z1000","majorDimension":"ROWS"}"#).await;
        let table = stub_client(&base).get_all_rows().await.unwrap();
        assert_eq!(table, Table::default());
    }

    #[tokio::test]
    async fn forbidden_maps_to_unauthorized_with_api_message() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        let (base, _stub) = stub::spawn(403, body).await;

        let err = stub_client(&base).get_all_rows().await.unwrap_err();
        assert_eq!(
            err,
            SheetError::Unauthorized {
                status: 403,
                message: "The caller does not have permission".into(),
            }
        );
    }

    #[tokio::test]
    async fn unauthorized_without_body_uses_reason_phrase() {
        let (base, _stub) = stub::spawn(401, "").await;

        let err = stub_client(&base).update_cell("A1", "=1").await.unwrap_err();
        assert_eq!(err, SheetError::Unauthorized { status: 401, message: "Unauthorized".into() });
    }

    #[tokio::test]
    async fn other_failures_map_to_api_error() {
        let body = r#"{"error":{"code":400,"message":"Unable to parse range: 'Data'!A1","status":"INVALID_ARGUMENT"}}"#;
        let (base, _stub) = stub::spawn(400, body).await;

        let err = stub_client(&base).update_cell("A1", "=1").await.unwrap_err();
        assert_eq!(
            err,
            SheetError::Api { status: 400, message: "Unable to parse range: 'Data'!A1".into() }
        );
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_verbatim() {
        let (base, _stub) = stub::spawn(502, "upstream unavailable").await;

        let err = stub_client(&base).get_all_rows().await.unwrap_err();
        assert_eq!(err, SheetError::Api { status: 502, message: "upstream unavailable".into() });
    }

    #[tokio::test]
    async fn undecodable_success_body_is_invalid_response() {
        let (base, _stub) = stub::spawn(200, "<html>not json</html>").await;

        let err = stub_client(&base).get_all_rows().await.unwrap_err();
        assert!(matches!(err, SheetError::InvalidResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_connectivity() {
        // Bind then drop to get a local port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = stub_client(&format!("http://{addr}")).get_all_rows().await.unwrap_err();
        assert!(matches!(err, SheetError::Connectivity(_)), "got {err:?}");
    }
}
