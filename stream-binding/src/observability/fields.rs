/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Canonical structured field keys and value-format helpers.

use crate::message::Message;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const DESTINATION: &str = "destination";
pub const BINDING_NAME: &str = "binding_name";
pub const ROLE: &str = "role";
pub const GROUP: &str = "group";
pub const BINDER: &str = "binder";
pub const CHANNEL: &str = "channel";

pub const MSG_ID: &str = "msg_id";
pub const CONTENT_TYPE: &str = "content_type";

pub const SUBSCRIBERS: &str = "subscribers";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_INVALID_DESTINATION: &str = "invalid_destination";
pub const REASON_NOT_ALLOWED: &str = "not_in_dynamic_destinations";
pub const DEFAULT_BINDER: &str = "default";

pub fn format_message_id(message: &Message) -> String {
    message.id().hyphenated().to_string()
}

pub fn format_content_type(message: &Message) -> String {
    message.content_type().unwrap_or(NONE).to_string()
}

pub fn format_group(group: Option<&str>) -> &str {
    group.unwrap_or(NONE)
}

pub fn format_binder(binder: Option<&str>) -> &str {
    binder.unwrap_or(DEFAULT_BINDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;

    #[test]
    fn format_helpers_fall_back_to_none_and_default() {
        let message = MessageBuilder::with_payload("x").build();

        assert_eq!(format_content_type(&message), NONE);
        assert_eq!(format_group(None), NONE);
        assert_eq!(format_group(Some("audit")), "audit");
        assert_eq!(format_binder(None), DEFAULT_BINDER);
        assert_eq!(format_binder(Some("memory")), "memory");
    }

    #[test]
    fn format_message_id_is_hyphenated_uuid() {
        let message = MessageBuilder::with_payload("x").build();
        let formatted = format_message_id(&message);

        assert_eq!(formatted.len(), 36);
        assert_eq!(formatted, message.id().to_string());
    }
}
