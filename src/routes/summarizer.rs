//! Vocabulary summary endpoint
//!
//! `GET /summarizer?url=<URI>&persist=<any>` returns
//! `{statements, prefixes, stats}`. With a non-empty `persist` the summary
//! is also stamped with the current time and registered as metadata of the
//! URL's DID, which is added as `did`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{json_response, parse_query, require_param};
use crate::server::AppState;
use crate::types::{Result, ServiceError};

/// Timestamp format of persisted summaries
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

#[derive(Debug, Deserialize)]
pub struct SummarizerQuery {
    pub url: Option<String>,
    #[allow(dead_code)]
    pub token: Option<String>,
    pub persist: Option<String>,
}

/// `now` rendered in `tz`
pub fn format_timestamp(now: DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz).format(DATE_FORMAT).to_string()
}

/// GET /summarizer
pub async fn handle_summarizer(state: &AppState, query: Option<&str>) -> Result<Response<Full<Bytes>>> {
    let params: SummarizerQuery = parse_query(query)?;
    let url = require_param(params.url, "url")?;
    let persist = params.persist.is_some_and(|p| !p.is_empty());

    let summary = state.summarizer.summarize(&url).await?;
    let mut data = match serde_json::to_value(&summary) {
        Ok(Value::Object(map)) => map,
        _ => return Err(ServiceError::Internal("summary is not a JSON object".into())),
    };

    if persist {
        data.insert(
            "date".into(),
            Value::String(format_timestamp(Utc::now(), &state.time_zone)),
        );
        data.insert("timezone".into(), Value::String(state.args.timezone.clone()));

        let mut extra = Map::new();
        extra.insert("statistics".into(), Value::Object(data.clone()));

        let did = state.assignment.assign(&url, Some(extra)).await?;
        info!(url = %url, did = %did, "Summary persisted with DID");
        data.insert("did".into(), Value::String(did));
    }

    Ok(json_response(StatusCode::OK, &data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_in_zone() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 30, 5).unwrap();

        assert_eq!(format_timestamp(now, &chrono_tz::UTC), "2024-07-01 12:30:05 +00:00");
        assert_eq!(
            format_timestamp(now, &chrono_tz::Europe::Amsterdam),
            "2024-07-01 14:30:05 +02:00"
        );
        assert_eq!(
            format_timestamp(now, &chrono_tz::America::New_York),
            "2024-07-01 08:30:05 -04:00"
        );
    }
}
