//! Text rendering of tool results.

use crate::api::classifier::whole_seconds;
use crate::error::{ClassifiedError, ErrorKind};
use serde_json::Value;

pub const NOT_INITIALIZED: &str = "⚠️ API not initialized. Please provide your bearer token first using the initialize_api tool.";

pub const DELETE_NOT_CONFIRMED: &str =
    "⚠️ Deletion not confirmed. Set confirm=true to proceed. This action is permanent!";

const REMEDIATION_TIP: &str = "💡 Tip: Check that Docker is running and your token is valid.";

fn is_empty_details(details: &Value) -> bool {
    match details {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `✅ <operation> completed successfully!` followed by the details, if any.
pub fn success(operation: &str, details: &Value) -> String {
    let mut message = format!("✅ {} completed successfully!\n\n", operation);
    if !is_empty_details(details) {
        message.push_str("📋 Details:\n");
        message.push_str(&pretty(details));
    }
    message
}

/// The cause shown to the user, with friendlier wording for common causes.
pub fn friendly_cause(error: &ClassifiedError) -> String {
    match error.kind {
        ErrorKind::AuthFailed => {
            "Your authentication token is invalid or expired. Please update it in settings."
                .to_string()
        }
        ErrorKind::Unreachable => {
            "Cannot connect to the API. Please ensure Docker Desktop is running.".to_string()
        }
        ErrorKind::RateLimited => match error.retry_after {
            Some(wait) => format!(
                "Too many requests. Please wait {} seconds and try again.",
                whole_seconds(wait)
            ),
            None => "Too many requests. Please wait a moment and try again.".to_string(),
        },
        _ => error.message.clone(),
    }
}

/// `❌ <operation> failed`, the cause and a remediation tip.
pub fn failure(operation: &str, error: &ClassifiedError) -> String {
    format!(
        "❌ {} failed\n\n{}\n\n{}",
        operation,
        friendly_cause(error),
        REMEDIATION_TIP
    )
}

/// The `data` array of a list response; anything else counts as empty.
fn items(body: Option<&Value>) -> &[Value] {
    body.and_then(|b| b.get("data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn field<'a>(item: &'a Value, key: &str, default: &'a str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Scalars as plain text, anything else as JSON.
fn display(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn bullet_list(
    body: Option<&Value>,
    header: impl Fn(usize) -> String,
    empty: &str,
    line: impl Fn(&Value) -> String,
) -> String {
    let items = items(body);
    if items.is_empty() {
        return empty.to_string();
    }

    let lines: Vec<String> = items.iter().map(|item| format!("• {}", line(item))).collect();
    format!("{}\n\n{}", header(items.len()), lines.join("\n"))
}

pub fn filespaces(body: Option<&Value>) -> String {
    bullet_list(
        body,
        |n| format!("📁 Found {} filespace(s):", n),
        "📁 No filespaces found in this workspace.",
        |fs| {
            format!(
                "{} (ID: {}, Region: {}, Status: {})",
                field(fs, "name", "Unknown"),
                display(fs.get("id"), "N/A"),
                display(fs.pointer("/storage/region"), "N/A"),
                display(fs.get("status"), "N/A"),
            )
        },
    )
}

pub fn members(body: Option<&Value>) -> String {
    bullet_list(
        body,
        |n| format!("👥 Found {} member(s):", n),
        "👥 No members found in this workspace.",
        |m| {
            format!(
                "{} - {} (ID: {})",
                display(m.pointer("/user/email"), "Unknown"),
                display(m.get("status"), "unknown").to_uppercase(),
                display(m.get("id"), "N/A"),
            )
        },
    )
}

pub fn groups(body: Option<&Value>) -> String {
    bullet_list(
        body,
        |n| format!("👥 Found {} group(s):", n),
        "👥 No groups found in this workspace.",
        |g| {
            format!(
                "{} (ID: {})",
                field(g, "name", "Unknown"),
                display(g.get("id"), "N/A")
            )
        },
    )
}

pub fn permissions(body: Option<&Value>) -> String {
    bullet_list(
        body,
        |_| "🔐 Permissions for filespace:".to_string(),
        "🔐 No permissions set for this filespace.",
        |p| {
            let granted: Vec<String> = p
                .get("permissions")
                .and_then(Value::as_array)
                .map(|perms| perms.iter().map(|v| display(Some(v), "")).collect())
                .unwrap_or_default();
            format!(
                "{} - [{}] on {}",
                display(p.get("principalId"), "Unknown"),
                granted.join(", "),
                field(p, "path", "/"),
            )
        },
    )
}

pub fn providers(body: Option<&Value>) -> String {
    bullet_list(
        body,
        |_| "☁️ Available Storage Providers:".to_string(),
        "☁️ No storage providers found.",
        |p| {
            format!(
                "{} - {}",
                field(p, "name", "Unknown"),
                field(p, "description", "No description")
            )
        },
    )
}

/// Confirmation for a new member, with the invitation link when the API
/// returned one.
pub fn member_added(body: Option<&Value>, requested_email: &str) -> String {
    let member = body
        .and_then(|b| b.get("data"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let email = member
        .pointer("/user/email")
        .and_then(Value::as_str)
        .unwrap_or(requested_email);
    let status = display(member.get("status"), "unknown");
    let invite_link = member
        .get("pendingInvitationLinkSecret")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty());

    let mut message = format!(
        "✅ Member Added Successfully!\n\n📧 Email: {}\n📊 Status: {}\n",
        email, status
    );

    match invite_link {
        Some(link) => {
            message.push_str(&format!("\n🔗 Invitation Link:\n{}\n\n", link));
            message.push_str("📋 Send this link to the new member to complete their registration.");
        }
        None => {
            message.push_str(&format!("\n📋 Details:\n{}", pretty(&member)));
        }
    }

    message
}

pub fn container_logs(lines: usize, logs: &str) -> String {
    format!("📜 Last {} lines of container logs:\n\n{}", lines, logs)
}

pub fn image_missing(image: &str) -> String {
    format!(
        "⚠️ Container image '{}' not found locally.\n\n\
         The image will be automatically pulled from Docker Hub when you start the container.\n\n\
         Or you can pull it now by saying: 'Pull the container image'",
        image
    )
}

pub fn unknown_tool(name: &str) -> String {
    format!("❌ Unknown tool: {}", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_success_with_and_without_details() {
        let text = success("Deleted Filespace", &json!({"filespace_id": "fs-1"}));
        assert!(text.starts_with("✅ Deleted Filespace completed successfully!\n\n📋 Details:\n"));
        assert!(text.contains("\"filespace_id\": \"fs-1\""));

        let text = success("API Health Check", &json!({}));
        assert_eq!(text, "✅ API Health Check completed successfully!\n\n");
    }

    #[test]
    fn test_failure_keeps_server_message() {
        let error = ClassifiedError::new(ErrorKind::Conflict, "exists");
        assert_eq!(
            failure("Create Filespace", &error),
            "❌ Create Filespace failed\n\nexists\n\n💡 Tip: Check that Docker is running and your token is valid."
        );
    }

    #[test]
    fn test_friendly_overrides() {
        let auth = ClassifiedError::new(ErrorKind::AuthFailed, "Authentication failed");
        assert!(friendly_cause(&auth).contains("invalid or expired"));

        let refused = ClassifiedError::new(ErrorKind::Unreachable, "Cannot connect to API.");
        assert!(friendly_cause(&refused).contains("ensure Docker Desktop is running"));

        let limited = ClassifiedError::new(ErrorKind::RateLimited, "Rate limit exceeded.")
            .with_retry_after(Duration::from_millis(41_200));
        assert_eq!(
            friendly_cause(&limited),
            "Too many requests. Please wait 42 seconds and try again."
        );
    }

    #[test]
    fn test_filespace_list() {
        let body = json!({"data": [
            {"name": "alpha", "id": "fs-1", "storage": {"region": "eu-west-1"}, "status": "active"},
            {"id": "fs-2"}
        ]});
        assert_eq!(
            filespaces(Some(&body)),
            "📁 Found 2 filespace(s):\n\n\
             • alpha (ID: fs-1, Region: eu-west-1, Status: active)\n\
             • Unknown (ID: fs-2, Region: N/A, Status: N/A)"
        );
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(
            filespaces(Some(&json!({"data": []}))),
            "📁 No filespaces found in this workspace."
        );
        assert_eq!(members(Some(&json!({}))), "👥 No members found in this workspace.");
        assert_eq!(groups(None), "👥 No groups found in this workspace.");
        assert_eq!(providers(Some(&json!([]))), "☁️ No storage providers found.");
    }

    #[test]
    fn test_member_and_permission_lines() {
        let body = json!({"data": [{"id": "m-1", "status": "active", "user": {"email": "a@b.com"}}]});
        assert!(members(Some(&body)).ends_with("• a@b.com - ACTIVE (ID: m-1)"));

        let body = json!({"data": [{"principalId": "g-1", "permissions": ["read", "write"], "path": "/media"}]});
        assert!(permissions(Some(&body)).ends_with("• g-1 - [read, write] on /media"));
    }

    #[test]
    fn test_member_added_with_invitation() {
        let body = json!({"data": {
            "status": "pending",
            "user": {"email": "new@example.com"},
            "pendingInvitationLinkSecret": "https://example.com/invite/xyz"
        }});
        let text = member_added(Some(&body), "new@example.com");
        assert!(text.contains("📧 Email: new@example.com"));
        assert!(text.contains("📊 Status: pending"));
        assert!(text.contains("🔗 Invitation Link:\nhttps://example.com/invite/xyz"));
    }

    #[test]
    fn test_member_added_without_body() {
        let text = member_added(Some(&json!({})), "new@example.com");
        assert!(text.contains("📧 Email: new@example.com"));
        assert!(text.contains("📊 Status: unknown"));
        assert!(text.contains("📋 Details:\n{}"));
    }
}
