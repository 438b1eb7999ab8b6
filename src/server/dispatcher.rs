//! Routes tool calls to the orchestrator and the admin API.
//!
//! Admin API tools follow a fixed sequence: obtain the API client, make sure
//! the backend container is running, validate the arguments, then issue the
//! request. A failure at any step ends the call with a rendered message and
//! nothing after it runs.

use crate::api::{ApiClient, ApiResult, CreateFilespaceRequest, Credential, GrantPermissionRequest};
use crate::container::BackendOrchestrator;
use crate::env;
use crate::error::{ClassifiedError, ErrorKind};
use crate::server::render;
use crate::server::session::AdminSession;
use crate::server::tools::ToolName;
use crate::validation::{self, ValidationOutcome};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

/// Default number of log lines for `view_container_logs`.
pub const DEFAULT_LOG_LINES: usize = 50;

/// Rendered result of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    fn failure(operation: &str, error: &ClassifiedError) -> Self {
        Self::error(render::failure(operation, error))
    }
}

pub type Arguments = Map<String, Value>;

fn missing(key: &str) -> ClassifiedError {
    ClassifiedError::validation(format!("Missing required argument: {}", key))
}

/// A non-empty string argument.
pub fn required_str<'a>(args: &'a Arguments, key: &str) -> Result<&'a str, ClassifiedError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(missing(key)),
        Some(_) => Err(ClassifiedError::validation(format!(
            "Argument {} must be a string",
            key
        ))),
    }
}

/// An optional string argument; empty strings count as absent.
pub fn optional_str<'a>(args: &'a Arguments, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// A boolean flag; only `true` or `"true"` enable it.
pub fn flag(args: &Arguments, key: &str) -> bool {
    match args.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn optional_count(args: &Arguments, key: &str, default: usize) -> Result<usize, ClassifiedError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                ClassifiedError::validation(format!("Argument {} must be a non-negative integer", key))
            }),
    }
}

pub fn optional_string_list(
    args: &Arguments,
    key: &str,
) -> Result<Option<Vec<String>>, ClassifiedError> {
    let invalid = || ClassifiedError::validation(format!("Argument {} must be a list of strings", key));
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

fn validated(outcome: ValidationOutcome) -> Result<String, ClassifiedError> {
    outcome.into_result().map_err(ClassifiedError::validation)
}

/// Dispatches tool calls against one session and one orchestrator.
pub struct ToolDispatcher {
    session: AdminSession,
    orchestrator: BackendOrchestrator,
}

impl ToolDispatcher {
    pub fn new(session: AdminSession, orchestrator: BackendOrchestrator) -> Self {
        Self {
            session,
            orchestrator,
        }
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn orchestrator(&self) -> &BackendOrchestrator {
        &self.orchestrator
    }

    pub async fn call(&mut self, name: &str, args: &Arguments) -> ToolOutput {
        let Some(tool) = ToolName::from_name(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolOutput::error(render::unknown_tool(name));
        };

        info!("Tool call: {}", tool);

        if !tool.requires_api() {
            return self.local_tool(tool, args).await;
        }

        let Some(client) = self.session.ensure_client().await else {
            return ToolOutput::error(render::NOT_INITIALIZED);
        };

        if let Err(failure) = self.orchestrator.ensure_running().await {
            warn!("Backend not ready for {}: {}", tool, failure);
            return ToolOutput::failure("Container Setup", &failure.into());
        }

        api_tool(tool, client, args).await
    }

    async fn local_tool(&mut self, tool: ToolName, args: &Arguments) -> ToolOutput {
        match tool {
            ToolName::CheckDockerStatus => {
                let status = self.orchestrator.status().await;
                let text = serde_json::to_string_pretty(&status)
                    .unwrap_or_else(|_| status.message.clone());
                if status.installed && status.running {
                    ToolOutput::ok(text)
                } else {
                    ToolOutput::error(text)
                }
            }
            ToolName::StartApiContainer => match self.orchestrator.ensure_running().await {
                Ok(handle) => ToolOutput::ok(render::success(
                    "API Container Started",
                    &json!({"container_id": handle.short_id(), "status": handle.status.as_str()}),
                )),
                Err(failure) => ToolOutput::failure("Start API Container", &failure.into()),
            },
            ToolName::StopApiContainer => {
                if self.orchestrator.stop().await {
                    ToolOutput::ok(render::success(
                        "API Container Stopped",
                        &json!({"status": "Container stopped successfully"}),
                    ))
                } else {
                    ToolOutput::failure(
                        "Stop API Container",
                        &ClassifiedError::new(
                            ErrorKind::EngineUnavailable,
                            "Failed to stop container. It may not be running or Docker Desktop may not be running.",
                        ),
                    )
                }
            }
            ToolName::ViewContainerLogs => {
                let lines = match optional_count(args, "lines", DEFAULT_LOG_LINES) {
                    Ok(lines) => lines,
                    Err(e) => return ToolOutput::failure("View Container Logs", &e),
                };
                let logs = self.orchestrator.logs(lines).await;
                ToolOutput::ok(render::container_logs(lines, &logs))
            }
            ToolName::PullContainerImage => match self.orchestrator.pull_image().await {
                Ok(message) => ToolOutput::ok(render::success(
                    "Container Image Pulled",
                    &json!({
                        "image": self.orchestrator.settings().image,
                        "message": message,
                        "next_step": "You can now start the API container"
                    }),
                )),
                Err(failure) => ToolOutput::failure("Pull Container Image", &failure.into()),
            },
            ToolName::CheckContainerImage => {
                let image = self.orchestrator.settings().image.clone();
                match self.orchestrator.image_present().await {
                    Ok(true) => ToolOutput::ok(render::success(
                        "Container Image Status",
                        &json!({
                            "image": image,
                            "status": "Available locally",
                            "message": "Container image is ready to use"
                        }),
                    )),
                    Ok(false) => ToolOutput::ok(render::image_missing(&image)),
                    Err(failure) => ToolOutput::failure("Check Container Image", &failure.into()),
                }
            }
            ToolName::InitializeApi => self.initialize_api(args).await,
            other => {
                debug!("{} routed to local handler", other);
                ToolOutput::error(render::unknown_tool(other.as_str()))
            }
        }
    }

    async fn initialize_api(&mut self, args: &Arguments) -> ToolOutput {
        const OPERATION: &str = "Initialize API";

        let credential = match optional_str(args, "token").and_then(Credential::new) {
            Some(credential) => Some(credential),
            None => self.session.stored_token().await,
        };

        let Some(credential) = credential else {
            return ToolOutput::failure(
                OPERATION,
                &ClassifiedError::validation(format!(
                    "No bearer token provided. Please set {} environment variable or provide token.",
                    env::credentials::TOKEN_ENV_VAR
                )),
            );
        };

        let client = match self.session.initialize(credential) {
            Ok(client) => client,
            Err(e) => {
                return ToolOutput::failure(
                    OPERATION,
                    &ClassifiedError::new(ErrorKind::Unknown, e.to_string()),
                );
            }
        };

        let health = client.health().await;
        match health.error() {
            None => ToolOutput::ok(render::success(
                "API Initialized",
                &json!({"status": "Connected", "endpoint": client.base_url()}),
            )),
            Some(error) => ToolOutput::failure(
                OPERATION,
                &ClassifiedError {
                    message: format!("Failed to connect: {}", error.message),
                    ..error.clone()
                },
            ),
        }
    }
}

/// Render an API result, using `on_success` for the body of a success.
fn respond(
    operation: &str,
    result: &ApiResult,
    on_success: impl FnOnce(Option<&Value>) -> String,
) -> ToolOutput {
    match result.error() {
        Some(error) => ToolOutput::failure(operation, error),
        None => ToolOutput::ok(on_success(result.body())),
    }
}

fn body_or_empty(body: Option<&Value>) -> Value {
    body.cloned().unwrap_or_else(|| json!({}))
}

async fn api_tool(tool: ToolName, client: &ApiClient, args: &Arguments) -> ToolOutput {
    let operation = failure_label(tool);
    match run_api_tool(tool, client, args).await {
        Ok(output) => output,
        Err(error) => ToolOutput::failure(operation, &error),
    }
}

/// Operation name shown when a tool fails.
fn failure_label(tool: ToolName) -> &'static str {
    match tool {
        ToolName::CreateFilespace => "Create Filespace",
        ToolName::ListFilespaces => "List Filespaces",
        ToolName::GetFilespaceDetails => "Get Filespace Details",
        ToolName::DeleteFilespace => "Delete Filespace",
        ToolName::AddMember => "Add Member",
        ToolName::ListMembers => "List Members",
        ToolName::GetMemberDetails => "Get Member Details",
        ToolName::RemoveMember => "Remove Member",
        ToolName::CreateGroup => "Create Group",
        ToolName::ListGroups => "List Groups",
        ToolName::AddMemberToGroup => "Add Member to Group",
        ToolName::RemoveMemberFromGroup => "Remove Member from Group",
        ToolName::GrantPermission => "Grant Permission",
        ToolName::ListPermissions => "List Permissions",
        ToolName::RevokePermission => "Revoke Permission",
        ToolName::CheckApiHealth => "API Health Check",
        ToolName::ListProviders => "List Providers",
        ToolName::CheckDockerStatus
        | ToolName::StartApiContainer
        | ToolName::StopApiContainer
        | ToolName::ViewContainerLogs
        | ToolName::PullContainerImage
        | ToolName::CheckContainerImage
        | ToolName::InitializeApi => "Tool Call",
    }
}

/// Argument and validation errors come back as `Err`; API failures are
/// rendered in place.
async fn run_api_tool(
    tool: ToolName,
    client: &ApiClient,
    args: &Arguments,
) -> Result<ToolOutput, ClassifiedError> {
    let operation = failure_label(tool);

    let output = match tool {
        ToolName::CreateFilespace => {
            let name = validated(validation::validate_filespace_name(required_str(args, "name")?))?;
            let mut request = CreateFilespaceRequest::new(&name);
            if let Some(region) = optional_str(args, "region") {
                request.region = region.to_string();
            }
            if let Some(provider) = optional_str(args, "storage_provider") {
                request.storage_provider = provider.to_string();
            }

            let result = client.create_filespace(&request).await;
            respond(operation, &result, |body| {
                render::success(&format!("Created filespace '{}'", name), &body_or_empty(body))
            })
        }
        ToolName::ListFilespaces => {
            let result = client.list_filespaces().await;
            respond(operation, &result, render::filespaces)
        }
        ToolName::GetFilespaceDetails => {
            let filespace_id = required_str(args, "filespace_id")?;
            let result = client.get_filespace(filespace_id).await;
            respond(operation, &result, |body| {
                render::success("Filespace Details", &body_or_empty(body))
            })
        }
        ToolName::DeleteFilespace => {
            if !flag(args, "confirm") {
                return Ok(ToolOutput::ok(render::DELETE_NOT_CONFIRMED));
            }
            let filespace_id = required_str(args, "filespace_id")?;
            let result = client.delete_filespace(filespace_id).await;
            respond(operation, &result, |_| {
                render::success("Deleted Filespace", &json!({"filespace_id": filespace_id}))
            })
        }
        ToolName::AddMember => {
            let email = validated(validation::validate_email(required_str(args, "email")?))?;
            let result = client.add_member(&email).await;
            respond(operation, &result, |body| render::member_added(body, &email))
        }
        ToolName::ListMembers => {
            let result = client.list_members().await;
            respond(operation, &result, render::members)
        }
        ToolName::GetMemberDetails => {
            let member_id = required_str(args, "member_id")?;
            let result = client.get_member(member_id).await;
            respond(operation, &result, |body| {
                let member = body.and_then(|b| b.get("data"));
                render::success("Member Details", &body_or_empty(member))
            })
        }
        ToolName::RemoveMember => {
            let member_id = required_str(args, "member_id")?;
            let result = client.remove_member(member_id).await;
            respond(operation, &result, |_| {
                render::success("Removed Member", &json!({"member_id": member_id}))
            })
        }
        ToolName::CreateGroup => {
            let name = validated(validation::validate_group_name(required_str(args, "name")?))?;
            let description = optional_str(args, "description").unwrap_or("");
            let result = client.create_group(&name, description).await;
            respond(operation, &result, |body| {
                render::success(&format!("Created group '{}'", name), &body_or_empty(body))
            })
        }
        ToolName::ListGroups => {
            let result = client.list_groups().await;
            respond(operation, &result, render::groups)
        }
        ToolName::AddMemberToGroup | ToolName::RemoveMemberFromGroup => {
            let group_id = required_str(args, "group_id")?;
            let member_id = required_str(args, "member_id")?;
            let (result, done) = if tool == ToolName::AddMemberToGroup {
                (
                    client.add_member_to_group(group_id, member_id).await,
                    "Added Member to Group",
                )
            } else {
                (
                    client.remove_member_from_group(group_id, member_id).await,
                    "Removed Member from Group",
                )
            };
            respond(operation, &result, |_| {
                render::success(done, &json!({"group_id": group_id, "member_id": member_id}))
            })
        }
        ToolName::GrantPermission => {
            let filespace_id = required_str(args, "filespace_id")?;
            let mut request = GrantPermissionRequest::read_only(required_str(args, "principal_id")?);
            if let Some(permissions) = optional_string_list(args, "permissions")? {
                request.permissions = permissions;
            }
            if let Some(path) = optional_str(args, "path") {
                request.path = path.to_string();
            }

            let result = client.grant_permission(filespace_id, &request).await;
            respond(operation, &result, |body| {
                render::success("Granted Permissions", &body_or_empty(body))
            })
        }
        ToolName::ListPermissions => {
            let filespace_id = required_str(args, "filespace_id")?;
            let result = client.list_permissions(filespace_id).await;
            respond(operation, &result, render::permissions)
        }
        ToolName::RevokePermission => {
            let filespace_id = required_str(args, "filespace_id")?;
            let permission_id = required_str(args, "permission_id")?;
            let result = client.revoke_permission(filespace_id, permission_id).await;
            respond(operation, &result, |_| {
                render::success(
                    "Revoked Permission",
                    &json!({"filespace_id": filespace_id, "permission_id": permission_id}),
                )
            })
        }
        ToolName::CheckApiHealth => {
            let result = client.health().await;
            respond(operation, &result, |_| {
                render::success(
                    "API Health Check",
                    &json!({"status": "Healthy", "endpoint": client.base_url()}),
                )
            })
        }
        ToolName::ListProviders => {
            let result = client.list_providers().await;
            respond(operation, &result, render::providers)
        }
        ToolName::CheckDockerStatus
        | ToolName::StartApiContainer
        | ToolName::StopApiContainer
        | ToolName::ViewContainerLogs
        | ToolName::PullContainerImage
        | ToolName::CheckContainerImage
        | ToolName::InitializeApi => ToolOutput::error(render::unknown_tool(tool.as_str())),
    };

    Ok(output)
}
