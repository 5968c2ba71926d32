use std::collections::BTreeMap;

/// Parse a submission body into a flat name -> value map based on the
/// Content-Type header. Accepts JSON objects and URL-encoded forms.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<BTreeMap<String, String>, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else {
        // Try JSON first, then form-urlencoded.
        parse_json(body).or_else(|_| parse_form_urlencoded(body))
    }
}

fn parse_json(body: &[u8]) -> Result<BTreeMap<String, String>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;

    let obj = value
        .as_object()
        .ok_or_else(|| "Expected a JSON object".to_string())?;

    let mut map = BTreeMap::new();
    for (key, value) in obj {
        match value {
            serde_json::Value::String(s) => {
                map.insert(key.clone(), s.clone());
            }
            serde_json::Value::Number(n) => {
                map.insert(key.clone(), n.to_string());
            }
            serde_json::Value::Bool(b) => {
                map.insert(key.clone(), b.to_string());
            }
            serde_json::Value::Null => {}
            other => {
                tracing::debug!("Dropping non-scalar value for {key}: {other}");
            }
        }
    }
    Ok(map)
}

fn parse_form_urlencoded(body: &[u8]) -> Result<BTreeMap<String, String>, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}
