use serde_json::Value;

use super::record::DecodedRecord;

/// Fields always included in a decoded record's display summary.
pub const SUMMARY_FIELDS: [&str; 4] = ["id", "nyplSource", "uri", "type"];

/// Maximum number of raw payload bytes shown in a summary.
pub const RAW_SUMMARY_LEN: usize = 20;

/// Short display form of an undecoded payload: the first 20 bytes rendered
/// as lossy UTF-8, with a trailing ellipsis when the payload is longer.
pub fn raw_summary(data: &[u8]) -> String {
    if data.len() > RAW_SUMMARY_LEN {
        format!("{}...", String::from_utf8_lossy(&data[..RAW_SUMMARY_LEN]))
    } else {
        String::from_utf8_lossy(data).into_owned()
    }
}

/// Short display form of a decoded record: a compact JSON projection of the
/// interesting identifier fields plus any caller-supplied extras. When the
/// projection hides keys, the closing brace is replaced with an ellipsis
/// marker to say so.
pub fn decoded_summary(decoded: &DecodedRecord, extra_fields: &[String]) -> String {
    let mut projection = DecodedRecord::new();
    for field in SUMMARY_FIELDS
        .iter()
        .copied()
        .chain(extra_fields.iter().map(String::as_str))
    {
        if let Some(value) = decoded.get(field) {
            projection.insert(field.to_string(), value.clone());
        }
    }

    let rendered = Value::Object(projection.clone()).to_string();
    if decoded.len() > projection.len() {
        // Only the outermost brace moves: nested objects keep theirs.
        format!("{} ...}}", rendered.strip_suffix('}').unwrap_or(&rendered))
    } else {
        rendered
    }
}
