//! Utility endpoints served behind the access gate

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::types::{ApiError, Json};

/// Largest number of decimal places `format-number` accepts
pub const MAX_DECIMAL_PLACES: u32 = 20;

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub echo: String,
}

#[derive(Debug, Deserialize)]
pub struct FormatNumberRequest {
    pub value: f64,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

fn default_decimal_places() -> u32 {
    2
}

#[derive(Debug, Serialize)]
pub struct FormatNumberResponse {
    pub formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct UnformatNumberRequest {
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct UnformatNumberResponse {
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub variables: Map<String, Value>,
}

/// GET /
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the keygate API".to_string(),
    })
}

/// POST /echo
pub async fn echo(Json(request): Json<EchoRequest>) -> Json<EchoResponse> {
    Json(EchoResponse {
        echo: request.content,
    })
}

/// POST /format-number
pub async fn format_number(
    Json(request): Json<FormatNumberRequest>,
) -> Result<Json<FormatNumberResponse>, ApiError> {
    if !request.value.is_finite() {
        return Err(ApiError::bad_request("Value must be a finite number").with_param("value"));
    }

    if request.decimal_places > MAX_DECIMAL_PLACES {
        return Err(ApiError::bad_request(format!(
            "decimal_places must be at most {}",
            MAX_DECIMAL_PLACES
        ))
        .with_param("decimal_places"));
    }

    Ok(Json(FormatNumberResponse {
        formatted: group_thousands(request.value, request.decimal_places),
    }))
}

/// POST /unformat-number
pub async fn unformat_number(
    Json(request): Json<UnformatNumberRequest>,
) -> Result<Json<UnformatNumberResponse>, ApiError> {
    let value = parse_grouped(&request.formatted).ok_or_else(|| {
        ApiError::bad_request(format!("'{}' is not a formatted number", request.formatted))
            .with_param("formatted")
    })?;

    Ok(Json(UnformatNumberResponse { value }))
}

/// POST /webhook
pub async fn webhook(Json(payload): Json<Value>) -> Json<WebhookResponse> {
    let mut variables = Map::new();
    flatten_into(&mut variables, None, payload);

    Json(WebhookResponse { variables })
}

/// Render with a fixed number of decimals and `,` between thousands
pub fn group_thousands(value: f64, decimal_places: u32) -> String {
    let rendered = format!("{:.*}", decimal_places as usize, value.abs());
    let (integer, fraction) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(rendered.len() + integer.len() / 3 + 1);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }

    grouped
}

/// Inverse of [`group_thousands`]; `None` for anything that is not a number
pub fn parse_grouped(formatted: &str) -> Option<f64> {
    let cleaned: String = formatted
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Flatten nested JSON into dotted paths; array items are keyed by index
fn flatten_into(out: &mut Map<String, Value>, prefix: Option<String>, value: Value) {
    let join = |key: &str| match &prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(out, Some(join(&key)), child);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (idx, child) in items.into_iter().enumerate() {
                flatten_into(out, Some(join(&idx.to_string())), child);
            }
        }
        leaf => {
            // A bare scalar body has no path of its own
            let key = prefix.clone().unwrap_or_else(|| "value".to_string());
            out.insert(key, leaf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(999.0, 2), "999.00");
        assert_eq!(group_thousands(1000.0, 0), "1,000");
        assert_eq!(group_thousands(-1234.5, 1), "-1,234.5");
        assert_eq!(group_thousands(0.0, 3), "0.000");
    }

    #[test]
    fn test_group_thousands_negative_zero() {
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_parse_grouped() {
        assert_eq!(parse_grouped("1,234,567.89"), Some(1234567.89));
        assert_eq!(parse_grouped(" -1,000 "), Some(-1000.0));
        assert_eq!(parse_grouped("abc"), None);
        assert_eq!(parse_grouped(""), None);
        assert_eq!(parse_grouped(","), None);
    }

    #[tokio::test]
    async fn test_format_number_rejects_huge_precision() {
        let err = format_number(Json(FormatNumberRequest {
            value: 1.0,
            decimal_places: 99,
        }))
        .await
        .unwrap_err();

        assert_eq!(err.response.error.param.as_deref(), Some("decimal_places"));
    }

    #[tokio::test]
    async fn test_echo() {
        let Json(response) = echo(Json(EchoRequest {
            content: "hello".to_string(),
        }))
        .await;

        assert_eq!(response.echo, "hello");
    }

    #[tokio::test]
    async fn test_webhook_flattens_payload() {
        let payload = json!({
            "event": "push",
            "repository": {"name": "keygate", "owner": {"login": "ops"}},
            "commits": [{"id": "a1"}, {"id": "b2"}],
            "empty": {}
        });

        let Json(response) = webhook(Json(payload)).await;
        let vars = response.variables;

        assert_eq!(vars["event"], "push");
        assert_eq!(vars["repository.name"], "keygate");
        assert_eq!(vars["repository.owner.login"], "ops");
        assert_eq!(vars["commits.0.id"], "a1");
        assert_eq!(vars["commits.1.id"], "b2");
        assert_eq!(vars["empty"], json!({}));
        assert_eq!(vars.len(), 6);
    }

    #[tokio::test]
    async fn test_webhook_scalar_body() {
        let Json(response) = webhook(Json(json!(42))).await;
        assert_eq!(response.variables["value"], 42);
    }
}
