//! Shade position and status snapshots

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Cause reported once the motor has stopped at its commanded target
pub const CAUSE_TARGET_REACHED: &str = "target reached";

/// Raw direction token for upward (opening) travel
pub const DIRECTION_UP_TOKEN: &str = "up / open";

/// Fallback failure reason when the device omits `error.title`
const UNKNOWN_ERROR: &str = "unknown error";

/// Travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Which travel end-limit to calibrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitSetting {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl LimitSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LimitSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ModelError::InvalidValue {
                field: "direction",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for LimitSetting {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ModelError::InvalidValue {
                field: "endLimit",
                value: s.to_string(),
            }),
        }
    }
}

/// Snapshot of shade motion as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Why the position last changed (e.g. "target reached")
    pub cause: String,
    /// Raw direction string (e.g. "up / open")
    pub direction: String,
    /// What triggered the move
    pub source: String,
    /// Raw device status token
    pub status: String,
    /// Device-native position, 0-100
    #[serde(deserialize_with = "percent")]
    pub value: u8,
}

/// Accepts a whole number (integer or float) or a numeric string, limited
/// to 0-100
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v @ 0..=100) => Ok(v as u8),
        _ => Err(D::Error::custom(format!("position value out of range: {raw}"))),
    }
}

impl Position {
    /// Up when the raw direction starts with the up/open token, down otherwise
    pub fn direction(&self) -> Direction {
        if self.direction.starts_with(DIRECTION_UP_TOKEN) {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Percentage open, as cover-style consumers expect (inverse of `value`)
    pub fn open_percent(&self) -> u8 {
        100u8.saturating_sub(self.value)
    }
}

/// Outcome of a status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Success(Position),
    Failure { reason: String },
}

/// Decoded `status.position` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Identifier echoed back by the device
    pub target_id: String,
    pub outcome: StatusOutcome,
}

impl Status {
    /// Decode a response body, branching on `result` before anything else
    pub fn from_value(data: &Value) -> Result<Self, ModelError> {
        if data.get("result") == Some(&Value::Bool(false)) {
            let reason = data
                .get("error")
                .and_then(|e| e.get("title"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ERROR)
                .to_string();

            return Ok(Self {
                target_id: target_id(data)?,
                outcome: StatusOutcome::Failure { reason },
            });
        }

        let position = data
            .get("position")
            .filter(|p| !p.is_null())
            .ok_or(ModelError::MissingField("position"))?;
        let position = Position::deserialize(position)?;

        Ok(Self {
            target_id: target_id(data)?,
            outcome: StatusOutcome::Success(position),
        })
    }

    pub fn position(&self) -> Option<&Position> {
        match &self.outcome {
            StatusOutcome::Success(position) => Some(position),
            StatusOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StatusOutcome::Success(_) => None,
            StatusOutcome::Failure { reason } => Some(reason),
        }
    }

    /// True while a position is reported whose cause is not "target reached"
    pub fn is_moving(&self) -> bool {
        self.position()
            .map(|p| p.cause != CAUSE_TARGET_REACHED)
            .unwrap_or(false)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.position().map(Position::direction)
    }
}

fn target_id(data: &Value) -> Result<String, ModelError> {
    match data.get("targetID") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(ModelError::MissingField("targetID")),
        Some(other) => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn position_body(cause: &str, direction: &str, value: Value) -> Value {
        json!({
            "result": true,
            "targetID": "T1",
            "position": {
                "cause": cause,
                "direction": direction,
                "source": "web",
                "status": "stopped",
                "value": value,
            }
        })
    }

    #[test]
    fn test_failure_status() {
        let status = Status::from_value(&json!({
            "result": false,
            "targetID": "T1",
            "error": {"title": "busy"}
        }))
        .unwrap();
        assert_eq!(status.target_id, "T1");
        assert_eq!(status.error(), Some("busy"));
        assert!(status.position().is_none());
        assert!(!status.is_moving());
        assert_eq!(status.direction(), None);
    }

    #[test]
    fn test_failure_without_title() {
        let status = Status::from_value(&json!({"result": false, "targetID": "T2"})).unwrap();
        assert_eq!(status.error(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn test_target_reached_is_not_moving() {
        let status =
            Status::from_value(&position_body("target reached", "up / open", json!(40))).unwrap();
        assert!(!status.is_moving());
        assert_eq!(status.error(), None);
        let position = status.position().unwrap();
        assert_eq!(position.value, 40);
        assert_eq!(position.open_percent(), 60);
    }

    #[test]
    fn test_other_cause_is_moving() {
        let status = Status::from_value(&position_body("user", "down / close", json!(10))).unwrap();
        assert!(status.is_moving());
        assert_eq!(status.direction(), Some(Direction::Down));
    }

    #[test]
    fn test_direction_mapping_is_permissive() {
        let mut position = Position {
            cause: CAUSE_TARGET_REACHED.into(),
            direction: "up / open".into(),
            source: "web".into(),
            status: "stopped".into(),
            value: 0,
        };
        assert_eq!(position.direction(), Direction::Up);

        position.direction = "down / close".into();
        assert_eq!(position.direction(), Direction::Down);

        position.direction = "sideways".into();
        assert_eq!(position.direction(), Direction::Down);
    }

    #[test]
    fn test_value_as_string() {
        let status = Status::from_value(&position_body("user", "up / open", json!("75"))).unwrap();
        assert_eq!(status.position().unwrap().value, 75);
    }

    #[test]
    fn test_value_as_whole_float() {
        let status = Status::from_value(&position_body("user", "up / open", json!(42.0))).unwrap();
        assert_eq!(status.position().unwrap().value, 42);

        let result = Status::from_value(&position_body("user", "up / open", json!(42.5)));
        assert!(matches!(result, Err(ModelError::Json(_))));
    }

    #[test]
    fn test_open_percent_saturates() {
        let position = Position {
            cause: CAUSE_TARGET_REACHED.into(),
            direction: "down / close".into(),
            source: "web".into(),
            status: "stopped".into(),
            value: 150,
        };
        assert_eq!(position.open_percent(), 0);
    }

    #[test]
    fn test_value_out_of_range() {
        let result = Status::from_value(&position_body("user", "up / open", json!(101)));
        assert!(matches!(result, Err(ModelError::Json(_))));
    }

    #[test]
    fn test_missing_position() {
        let result = Status::from_value(&json!({"result": true, "targetID": "T1"}));
        assert!(matches!(result, Err(ModelError::MissingField("position"))));

        // Absent `result` is treated like success
        let result = Status::from_value(&json!({"targetID": "T1"}));
        assert!(matches!(result, Err(ModelError::MissingField("position"))));
    }

    #[test]
    fn test_missing_target_id() {
        let result = Status::from_value(&json!({"result": false}));
        assert!(matches!(result, Err(ModelError::MissingField("targetID"))));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("down".parse::<LimitSetting>().unwrap(), LimitSetting::Down);
        assert!("left".parse::<Direction>().is_err());
        assert_eq!(serde_json::to_value(LimitSetting::Up).unwrap(), json!("up"));
    }
}
