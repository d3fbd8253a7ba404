//! Publishing limit notices.

use gateway_core::{keys, types, AttributeValue, Event};
use uuid::Uuid;

/// Body of the limit-reached notice.
pub const LIMIT_REACHED_TEXT: &str = "\u{26a0} Publishing limit reached.

Increase your publishing limit or nominate own sources for a dedicated limit.

If you did not publish messages, check the publication sources you own.";

/// Build the notice telling `owner_id` in `group_id` that their allowance
/// just ran out. The notice carries the source of the batch that hit the
/// limit so the recipient can tell which publisher caused it.
pub fn limit_reached_notice(source: &str, group_id: &str, owner_id: &str) -> Event {
    Event::new(Uuid::new_v4().to_string(), source, types::LIMIT_REACHED)
        .with_attribute(keys::TO_GROUP_ID, AttributeValue::string(group_id))
        .with_attribute(keys::TO_USER_ID, AttributeValue::string(owner_id))
        .with_text(LIMIT_REACHED_TEXT)
}

/// Whether an exhausted permit warrants a notice.
///
/// There is nobody to tell when the permit is group-level, or when the
/// owner is the publishing source itself.
pub fn should_notify(owner_id: &str, first_source: &str) -> bool {
    !owner_id.is_empty() && owner_id != first_source
}
