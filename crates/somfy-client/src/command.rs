//! Command envelope and parameters

use serde::Serialize;
use somfy_core::{Direction, LimitSetting};

/// Priority for plain up/down issuance
pub const PRIORITY_NORMAL: u8 = 0;

/// Priority for position targets and stop; presumed to preempt queued motion
pub const PRIORITY_HIGH: u8 = 1;

/// Envelope id; the device echoes it but nothing correlates on it
const REQUEST_ID: u32 = 1;

/// Method names understood by the device
pub mod methods {
    pub const STATUS_POSITION: &str = "status.position";
    pub const STATUS_INFO: &str = "status.info";

    pub const MOVE_UP: &str = "move.up";
    pub const MOVE_DOWN: &str = "move.down";
    pub const MOVE_TO: &str = "move.to";
    pub const MOVE_STOP: &str = "move.stop";

    pub const SETTINGS_MOVE_RELATIVE: &str = "settings.moverelative";
    pub const SETTINGS_END_LIMIT: &str = "settings.endlimit";

    /// `mode` for `settings.endlimit`: store the current physical position
    pub const END_LIMIT_AT_CURRENT_POSITION: &str = "atcurrentposition";
}

/// Optional command parameters
///
/// Unset fields are left out of the payload entirely, never sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "endLimit", skip_serializing_if = "Option::is_none")]
    pub end_limit: Option<LimitSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wink: Option<bool>,
}

impl CommandParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn position(mut self, position: u8) -> Self {
        self.position = Some(position);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    pub fn end_limit(mut self, setting: LimitSetting) -> Self {
        self.end_limit = Some(setting);
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn wink(mut self, wink: bool) -> Self {
        self.wink = Some(wink);
        self
    }
}

/// JSON-RPC style request posted to `/req`
#[derive(Debug, Serialize)]
pub struct CommandRequest<'a> {
    pub method: &'a str,
    pub params: &'a CommandParams,
    pub id: u32,
}

impl<'a> CommandRequest<'a> {
    pub fn new(method: &'a str, params: &'a CommandParams) -> Self {
        Self {
            method,
            params,
            id: REQUEST_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_move_to_params_omit_absent_fields() {
        let params = CommandParams::new().priority(PRIORITY_HIGH).position(42);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"priority": 1, "position": 42})
        );
    }

    #[test]
    fn test_empty_params_serialize_to_empty_object() {
        assert_eq!(serde_json::to_value(CommandParams::new()).unwrap(), json!({}));
    }

    #[test]
    fn test_envelope() {
        let params = CommandParams::new()
            .end_limit(LimitSetting::Down)
            .mode(methods::END_LIMIT_AT_CURRENT_POSITION);
        let request = CommandRequest::new(methods::SETTINGS_END_LIMIT, &params);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "method": "settings.endlimit",
                "params": {"endLimit": "down", "mode": "atcurrentposition"},
                "id": 1
            })
        );
    }

    #[test]
    fn test_relative_move_params() {
        let params = CommandParams::new().direction(Direction::Up).duration(1500).wink(false);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"direction": "up", "duration": 1500, "wink": false})
        );
    }
}
