use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

/// Envelope printed on stdout for every command.
#[derive(Debug, Serialize, Clone)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: None,
            data,
        }
    }

    pub fn error(err: &anyhow::Error) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(format!("{err:#}")),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_context_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to store links");
        let body = serde_json::to_value(CommandResponse::error(&err)).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Failed to store links: disk full");
        assert!(body["data"].is_null());
    }

    #[test]
    fn ok_envelope_omits_message() {
        let body = serde_json::to_value(CommandResponse::ok(Value::Bool(true))).unwrap();
        assert_eq!(body, serde_json::json!({"status": "ok", "data": true}));
    }
}
