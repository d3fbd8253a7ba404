//! Test fixtures and event generators.

use uuid::Uuid;

pub const GROUP_ID: &str = "group-test";
pub const USER_ID: &str = "user-test";

/// Generate a valid event JSON with a unique id.
pub fn event(source: &str) -> serde_json::Value {
    serde_json::json!({
        "id": Uuid::new_v4().to_string(),
        "specVersion": "1.0",
        "source": source,
        "type": "com.example.post",
        "attributes": {
            "title": { "ceString": "hello" }
        },
        "textData": "body"
    })
}

/// Generate an event carrying one extra string attribute.
pub fn event_with_attribute(source: &str, name: &str, value: &str) -> serde_json::Value {
    let mut event = event(source);
    event["attributes"][name] = serde_json::json!({ "ceString": value });
    event
}

/// Generate N valid events from one source.
pub fn events(n: usize, source: &str) -> Vec<serde_json::Value> {
    (0..n).map(|_| event(source)).collect()
}

/// Wrap events in a batch body.
pub fn batch(events: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "events": events })
}
