//! Fixed log lines for the well-known `fleet:*`, `agent:*` and `task:*`
//! event types.
//!
//! Downstream log consumers match on these exact strings. A field missing
//! from the payload renders as `undefined`.

use serde_json::Value;

use crate::utilities::logger::{FleetLogger, LogLevel};

/// A resolved built-in log line.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinLogLine {
    pub level: LogLevel,
    pub message: String,
    pub fields: Option<Value>,
}

/// Render the built-in line for `event_type`, if it has one.
pub fn builtin_log_line(event_type: &str, data: &Value) -> Option<BuiltinLogLine> {
    let info = |message: String, fields: Option<Value>| BuiltinLogLine {
        level: LogLevel::Info,
        message,
        fields,
    };
    let error = |message: String| BuiltinLogLine {
        level: LogLevel::Error,
        message,
        fields: data.get("error").cloned(),
    };

    let line = match event_type {
        "fleet:started" => info("Fleet started".to_string(), Some(data.clone())),
        "fleet:stopped" => info("Fleet stopped".to_string(), Some(data.clone())),
        "agent:spawned" => info(
            format!(
                "Agent spawned: {} ({})",
                field(data, "agentId"),
                field(data, "type")
            ),
            None,
        ),
        "agent:started" => info(format!("Agent started: {}", field(data, "agentId")), None),
        "agent:stopped" => info(format!("Agent stopped: {}", field(data, "agentId")), None),
        "agent:error" => error(format!("Agent error: {}", field(data, "agentId"))),
        "task:submitted" => info(format!("Task submitted: {}", field(data, "taskId")), None),
        "task:assigned" => info(
            format!(
                "Task assigned: {} -> {}",
                field(data, "taskId"),
                field(data, "agentId")
            ),
            None,
        ),
        "task:started" => info(
            format!(
                "Task started: {} by {}",
                field(data, "taskId"),
                field(data, "agentId")
            ),
            None,
        ),
        "task:completed" => info(
            format!(
                "Task completed: {} by {} in {}ms",
                field(data, "taskId"),
                field(data, "agentId"),
                field(data, "executionTime")
            ),
            None,
        ),
        "task:failed" => error(format!(
            "Task failed: {} by {}",
            field(data, "taskId"),
            field(data, "agentId")
        )),
        _ => return None,
    };
    Some(line)
}

/// Write the built-in line for `event_type` through `logger`.
///
/// Returns `true` when a line was written.
pub fn log_builtin(logger: &dyn FleetLogger, event_type: &str, data: &Value) -> bool {
    match builtin_log_line(event_type, data) {
        Some(line) => {
            logger.log(line.level, &line.message, line.fields.as_ref());
            true
        }
        None => false,
    }
}

fn field(data: &Value, name: &str) -> String {
    match data.get(name) {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::logger::RecordingLogger;
    use serde_json::json;

    #[test]
    fn test_fleet_lines_carry_data() {
        let data = json!({"fleetId": "fleet-123", "status": "running"});
        let line = builtin_log_line("fleet:started", &data).unwrap();
        assert_eq!(line.level, LogLevel::Info);
        assert_eq!(line.message, "Fleet started");
        assert_eq!(line.fields, Some(data.clone()));

        let line = builtin_log_line("fleet:stopped", &data).unwrap();
        assert_eq!(line.message, "Fleet stopped");
    }

    #[test]
    fn test_agent_lines() {
        let line = builtin_log_line(
            "agent:spawned",
            &json!({"agentId": "agent-123", "type": "test-executor"}),
        )
        .unwrap();
        assert_eq!(line.message, "Agent spawned: agent-123 (test-executor)");
        assert!(line.fields.is_none());

        let line = builtin_log_line("agent:stopped", &json!({"agentId": "agent-123"})).unwrap();
        assert_eq!(line.message, "Agent stopped: agent-123");
    }

    #[test]
    fn test_error_lines_carry_error_field() {
        let line = builtin_log_line(
            "agent:error",
            &json!({"agentId": "agent-456", "error": "Agent malfunction"}),
        )
        .unwrap();
        assert_eq!(line.level, LogLevel::Error);
        assert_eq!(line.message, "Agent error: agent-456");
        assert_eq!(line.fields, Some(json!("Agent malfunction")));
    }

    #[test]
    fn test_task_completed_renders_numbers() {
        let line = builtin_log_line(
            "task:completed",
            &json!({"taskId": "task-123", "agentId": "agent-456", "executionTime": 1500}),
        )
        .unwrap();
        assert_eq!(line.message, "Task completed: task-123 by agent-456 in 1500ms");
    }

    #[test]
    fn test_missing_fields_render_undefined() {
        let line = builtin_log_line("task:assigned", &json!({"taskId": "t-1"})).unwrap();
        assert_eq!(line.message, "Task assigned: t-1 -> undefined");

        let line = builtin_log_line("agent:started", &Value::Null).unwrap();
        assert_eq!(line.message, "Agent started: undefined");
    }

    #[test]
    fn test_unknown_types_have_no_line() {
        assert!(builtin_log_line("fleet:status", &json!({})).is_none());
        assert!(builtin_log_line("test:event", &json!({})).is_none());
        assert!(builtin_log_line("", &json!({})).is_none());
    }

    #[test]
    fn test_log_builtin_writes_through_logger() {
        let logger = RecordingLogger::new();
        assert!(log_builtin(&logger, "task:submitted", &json!({"taskId": "task-123"})));
        assert!(!log_builtin(&logger, "memory:test", &json!({})));
        assert!(logger.contains(LogLevel::Info, "Task submitted: task-123"));
        assert_eq!(logger.records().len(), 1);
    }
}
