//! The `lucidlink://help` resource.

use crate::server::protocol::{Resource, ResourceContents};

pub const HELP_URI: &str = "lucidlink://help";

const HELP_MIME_TYPE: &str = "text/plain";

pub const HELP_TEXT: &str = "\
LucidLink MCP Server - Help Guide
=================================

This MCP server provides natural language access to the LucidLink Admin API.

PREREQUISITES:
1. Business or Enterprise LucidLink plan
2. Service Account with API access
3. Bearer token from Service Account
4. Docker Desktop installed

GETTING STARTED:
1. Say \"Initialize API\" to set up authentication
2. Say \"Check Docker status\" to ensure Docker is running
3. Start using natural language commands!

EXAMPLE COMMANDS:
- \"Create a new filespace called project-alpha\"
- \"List all my filespaces\"
- \"Add john@example.com to the workspace\"
- \"Create a group called Marketing\"
- \"Grant read access to the Marketing group on project-alpha\"

CREDENTIALS:
- The bearer token is read from LUCIDLINK_BEARER_TOKEN, then the macOS Keychain
- Run `lucidlink-mcp check` to verify Docker, the image and the token

TROUBLESHOOTING:
- If API calls fail, check Docker is running
- Verify your bearer token is valid
- Check container logs for detailed errors

For more help, visit: https://support.lucidlink.com
";

pub fn help_resource() -> Resource {
    Resource {
        uri: HELP_URI.to_string(),
        name: "LucidLink API Help".to_string(),
        mime_type: HELP_MIME_TYPE.to_string(),
        description: "Help documentation for using the LucidLink MCP server".to_string(),
    }
}

/// Contents for `uri`, if it names a known resource.
pub fn read(uri: &str) -> Option<ResourceContents> {
    (uri == HELP_URI).then(|| ResourceContents {
        uri: HELP_URI.to_string(),
        mime_type: HELP_MIME_TYPE.to_string(),
        text: HELP_TEXT.to_string(),
    })
}
