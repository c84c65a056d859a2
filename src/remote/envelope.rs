//! Wire shapes of the admin API.
//!
//! The backend wraps most answers in `{ success, data, message, errors }`,
//! but some endpoints return the page or entity bare. Both shapes are
//! decoded here into typed results so callers never dig through raw JSON.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, ShopdeskError};

use super::{ListQuery, ListResult};

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` into a server error.
    pub fn into_data(self, status: u16) -> Result<Option<T>> {
        if self.success {
            return Ok(self.data);
        }
        Err(ShopdeskError::Server {
            status,
            message: describe_failure(self.message.as_deref(), self.errors.as_ref()),
        })
    }
}

/// Page payload as sent by the backend. Counts are optional on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> PageData<T> {
    /// Normalize into a [`ListResult`], filling gaps from the request.
    ///
    /// `total_pages` is always recomputed from the count and page size.
    pub fn into_list_result(self, query: &ListQuery) -> ListResult<T> {
        let page_size = self.page_size.filter(|s| *s > 0).unwrap_or(query.page_size);
        let page_number = self.page_number.unwrap_or(query.page);
        let total_count = self.total_count.unwrap_or(self.items.len() as u64);

        let mut items = self.items;
        if items.len() > page_size as usize {
            tracing::warn!(
                "server returned {} items for a page of {}, truncating",
                items.len(),
                page_size
            );
            items.truncate(page_size as usize);
        }

        let result = ListResult::new(items, total_count, page_number, page_size);
        if let Some(reported) = self.total_pages
            && reported != result.total_pages
        {
            tracing::debug!(
                "server reported {reported} pages, derived {}",
                result.total_pages
            );
        }
        result
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageResponse<T> {
    Enveloped(ApiEnvelope<PageData<T>>),
    Bare(PageData<T>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityResponse<T> {
    Enveloped(ApiEnvelope<T>),
    Bare(T),
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
}

/// Decode a list response body.
pub fn decode_page<T: DeserializeOwned>(
    body: &str,
    status: u16,
    query: &ListQuery,
) -> Result<ListResult<T>> {
    let response: PageResponse<T> = serde_json::from_str(body)
        .map_err(|e| ShopdeskError::Decode(format!("list response: {e}")))?;

    let page = match response {
        PageResponse::Enveloped(envelope) => envelope
            .into_data(status)?
            .ok_or_else(|| ShopdeskError::Decode("list response has no data".to_string()))?,
        PageResponse::Bare(page) => page,
    };

    Ok(page.into_list_result(query))
}

/// Decode a mutation response body. An empty body means no entity was echoed.
pub fn decode_entity<T: DeserializeOwned>(body: &str, status: u16) -> Result<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let response: EntityResponse<T> = serde_json::from_str(body)
        .map_err(|e| ShopdeskError::Decode(format!("mutation response: {e}")))?;

    match response {
        EntityResponse::Enveloped(envelope) => envelope.into_data(status),
        EntityResponse::Bare(entity) => Ok(Some(entity)),
    }
}

/// Build a readable message from an error envelope's `message` and `errors`.
///
/// `errors` may be a list of strings or a map of field name to messages.
pub fn describe_failure(message: Option<&str>, errors: Option<&Value>) -> String {
    let mut parts = Vec::new();

    if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
        parts.push(message.to_string());
    }

    match errors {
        Some(Value::Array(list)) => {
            parts.extend(list.iter().map(value_text).filter(|s| !s.is_empty()));
        }
        Some(Value::Object(fields)) => {
            for (field, messages) in fields {
                let text = match messages {
                    Value::Array(list) => list
                        .iter()
                        .map(value_text)
                        .collect::<Vec<_>>()
                        .join(", "),
                    other => value_text(other),
                };
                parts.push(format!("{field}: {text}"));
            }
        }
        Some(Value::String(s)) if !s.is_empty() => parts.push(s.clone()),
        _ => {}
    }

    if parts.is_empty() {
        "request failed".to_string()
    } else {
        parts.join("; ")
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
