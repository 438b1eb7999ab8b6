//! The tool catalogue: names, descriptions and argument schemas.

use crate::server::protocol::Tool;
use serde_json::{Value, json};
use std::fmt;

/// Every tool the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CheckDockerStatus,
    StartApiContainer,
    StopApiContainer,
    ViewContainerLogs,
    PullContainerImage,
    CheckContainerImage,
    InitializeApi,
    CreateFilespace,
    ListFilespaces,
    GetFilespaceDetails,
    DeleteFilespace,
    AddMember,
    ListMembers,
    GetMemberDetails,
    RemoveMember,
    CreateGroup,
    ListGroups,
    AddMemberToGroup,
    RemoveMemberFromGroup,
    GrantPermission,
    ListPermissions,
    RevokePermission,
    CheckApiHealth,
    ListProviders,
}

impl ToolName {
    pub const ALL: [ToolName; 24] = [
        ToolName::CheckDockerStatus,
        ToolName::StartApiContainer,
        ToolName::StopApiContainer,
        ToolName::ViewContainerLogs,
        ToolName::PullContainerImage,
        ToolName::CheckContainerImage,
        ToolName::CreateFilespace,
        ToolName::ListFilespaces,
        ToolName::GetFilespaceDetails,
        ToolName::DeleteFilespace,
        ToolName::AddMember,
        ToolName::ListMembers,
        ToolName::GetMemberDetails,
        ToolName::RemoveMember,
        ToolName::CreateGroup,
        ToolName::ListGroups,
        ToolName::AddMemberToGroup,
        ToolName::RemoveMemberFromGroup,
        ToolName::GrantPermission,
        ToolName::ListPermissions,
        ToolName::RevokePermission,
        ToolName::CheckApiHealth,
        ToolName::ListProviders,
        ToolName::InitializeApi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CheckDockerStatus => "check_docker_status",
            ToolName::StartApiContainer => "start_api_container",
            ToolName::StopApiContainer => "stop_api_container",
            ToolName::ViewContainerLogs => "view_container_logs",
            ToolName::PullContainerImage => "pull_container_image",
            ToolName::CheckContainerImage => "check_container_image",
            ToolName::InitializeApi => "initialize_api",
            ToolName::CreateFilespace => "create_filespace",
            ToolName::ListFilespaces => "list_filespaces",
            ToolName::GetFilespaceDetails => "get_filespace_details",
            ToolName::DeleteFilespace => "delete_filespace",
            ToolName::AddMember => "add_member",
            ToolName::ListMembers => "list_members",
            ToolName::GetMemberDetails => "get_member_details",
            ToolName::RemoveMember => "remove_member",
            ToolName::CreateGroup => "create_group",
            ToolName::ListGroups => "list_groups",
            ToolName::AddMemberToGroup => "add_member_to_group",
            ToolName::RemoveMemberFromGroup => "remove_member_from_group",
            ToolName::GrantPermission => "grant_permission",
            ToolName::ListPermissions => "list_permissions",
            ToolName::RevokePermission => "revoke_permission",
            ToolName::CheckApiHealth => "check_api_health",
            ToolName::ListProviders => "list_providers",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Whether the tool talks to the admin API, and so needs a credential
    /// and a running backend first.
    pub fn requires_api(&self) -> bool {
        !matches!(
            self,
            ToolName::CheckDockerStatus
                | ToolName::StartApiContainer
                | ToolName::StopApiContainer
                | ToolName::ViewContainerLogs
                | ToolName::PullContainerImage
                | ToolName::CheckContainerImage
                | ToolName::InitializeApi
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::CheckDockerStatus => {
                "Check if Docker Desktop is installed and running, and start it if needed"
            }
            ToolName::StartApiContainer => "Start the LucidLink API container",
            ToolName::StopApiContainer => "Stop the LucidLink API container",
            ToolName::ViewContainerLogs => "View recent logs from the API container",
            ToolName::PullContainerImage => {
                "Pull the LucidLink API container image from Docker Hub (lucidlink/lucidlink-api)"
            }
            ToolName::CheckContainerImage => {
                "Check if the LucidLink API container image is available locally"
            }
            ToolName::InitializeApi => "Initialize the API client with authentication token",
            ToolName::CreateFilespace => {
                "Create a new LucidLink filespace with specified name and configuration"
            }
            ToolName::ListFilespaces => "List all filespaces in the workspace",
            ToolName::GetFilespaceDetails => "Get detailed information about a specific filespace",
            ToolName::DeleteFilespace => {
                "Delete a filespace (use with caution - this is permanent)"
            }
            ToolName::AddMember => "Add a new member to the workspace by email address",
            ToolName::ListMembers => "List all members in the workspace",
            ToolName::GetMemberDetails => "Get detailed information about a specific member",
            ToolName::RemoveMember => "Remove a member from the workspace",
            ToolName::CreateGroup => "Create a new group for organizing members",
            ToolName::ListGroups => "List all groups in the workspace",
            ToolName::AddMemberToGroup => "Add a member to a group",
            ToolName::RemoveMemberFromGroup => "Remove a member from a group",
            ToolName::GrantPermission => "Grant permissions to a member or group on a filespace",
            ToolName::ListPermissions => "List all permissions for a filespace",
            ToolName::RevokePermission => "Revoke/remove a permission from a filespace",
            ToolName::CheckApiHealth => "Check if the API service is healthy and responding",
            ToolName::ListProviders => {
                "List all available storage providers (AWS, Azure, GCP, Wasabi, etc.)"
            }
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        match self {
            ToolName::ViewContainerLogs => json!({
                "type": "object",
                "properties": {
                    "lines": {
                        "type": "integer",
                        "description": "Number of log lines to retrieve (default: 50)",
                        "default": 50
                    }
                }
            }),
            ToolName::InitializeApi => json!({
                "type": "object",
                "properties": {
                    "token": {
                        "type": "string",
                        "description": "Bearer token for API authentication (optional, will use stored token if not provided)"
                    }
                }
            }),
            ToolName::CreateFilespace => json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name for the new filespace (3-63 chars, alphanumeric with hyphens/underscores)"
                    },
                    "region": {
                        "type": "string",
                        "description": "Storage region (e.g., us-east-1, us-west-2, eu-west-1)",
                        "default": "us-east-1"
                    },
                    "storage_provider": {
                        "type": "string",
                        "description": "Storage provider (AWS, Azure, GCP, Wasabi)",
                        "default": "AWS"
                    }
                },
                "required": ["name"]
            }),
            ToolName::GetFilespaceDetails | ToolName::ListPermissions => {
                id_schema(&[("filespace_id", "ID of the filespace")])
            }
            ToolName::DeleteFilespace => json!({
                "type": "object",
                "properties": {
                    "filespace_id": {
                        "type": "string",
                        "description": "ID of the filespace to delete"
                    },
                    "confirm": {
                        "type": "boolean",
                        "description": "Confirmation flag (must be true to proceed)",
                        "default": false
                    }
                },
                "required": ["filespace_id", "confirm"]
            }),
            ToolName::AddMember => id_schema(&[("email", "Email address of the member to add")]),
            ToolName::GetMemberDetails => id_schema(&[("member_id", "ID of the member")]),
            ToolName::RemoveMember => id_schema(&[("member_id", "ID of the member to remove")]),
            ToolName::CreateGroup => json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name for the new group"
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional description of the group",
                        "default": ""
                    }
                },
                "required": ["name"]
            }),
            ToolName::AddMemberToGroup => id_schema(&[
                ("group_id", "ID of the group"),
                ("member_id", "ID of the member to add"),
            ]),
            ToolName::RemoveMemberFromGroup => id_schema(&[
                ("group_id", "ID of the group"),
                ("member_id", "ID of the member to remove"),
            ]),
            ToolName::GrantPermission => json!({
                "type": "object",
                "properties": {
                    "filespace_id": {
                        "type": "string",
                        "description": "ID of the filespace"
                    },
                    "principal_id": {
                        "type": "string",
                        "description": "ID of the member or group to grant permissions to"
                    },
                    "permissions": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of permissions to grant (read, write, admin)",
                        "default": ["read"]
                    },
                    "path": {
                        "type": "string",
                        "description": "Path within filespace to grant access to",
                        "default": "/"
                    }
                },
                "required": ["filespace_id", "principal_id"]
            }),
            ToolName::RevokePermission => id_schema(&[
                ("filespace_id", "ID of the filespace"),
                ("permission_id", "ID of the permission to revoke"),
            ]),
            ToolName::CheckDockerStatus
            | ToolName::StartApiContainer
            | ToolName::StopApiContainer
            | ToolName::PullContainerImage
            | ToolName::CheckContainerImage
            | ToolName::ListFilespaces
            | ToolName::ListMembers
            | ToolName::ListGroups
            | ToolName::CheckApiHealth
            | ToolName::ListProviders => json!({"type": "object", "properties": {}}),
        }
    }

    pub fn definition(&self) -> Tool {
        Tool {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of an object whose properties are all required strings.
fn id_schema(fields: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({"type": "string", "description": description}),
            )
        })
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Definitions for `tools/list`.
pub fn tool_definitions() -> Vec<Tool> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_name("format_disk"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = ToolName::ALL.iter().map(ToolName::as_str).collect();
        assert_eq!(names.len(), ToolName::ALL.len());
    }

    #[test]
    fn test_required_fields_are_declared() {
        for tool in tool_definitions() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            if let Some(required) = schema["required"].as_array() {
                for field in required {
                    let field = field.as_str().unwrap();
                    assert!(
                        schema["properties"].get(field).is_some(),
                        "{} requires undeclared {}",
                        tool.name,
                        field
                    );
                }
            }
        }
    }

    #[test]
    fn test_engine_tools_do_not_need_api() {
        assert!(!ToolName::CheckDockerStatus.requires_api());
        assert!(!ToolName::InitializeApi.requires_api());
        assert!(ToolName::CheckApiHealth.requires_api());
        assert!(ToolName::DeleteFilespace.requires_api());
    }
}
