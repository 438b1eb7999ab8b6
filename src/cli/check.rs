//! Installation check
//!
//! Reports whether everything the server needs is in place without starting
//! the server or changing anything: the engine is not launched and no image is
//! pulled.

use crate::cli::config::LoadedConfig;
use crate::container::ContainerEngine;
use crate::secrets::SecretProvider;
use std::fmt::Write as _;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// A failed required check makes the whole run fail.
    pub required: bool,
}

impl CheckResult {
    fn required(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            required: true,
        }
    }

    fn optional(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            required: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn is_ok(&self) -> bool {
        self.results.iter().all(|r| r.passed || !r.required)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "🔍 LucidLink MCP Server Installation Check");
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out);

        for result in &self.results {
            let mark = if result.passed { "✅" } else { "❌" };
            let _ = writeln!(out, "{} {}", mark, result.name);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(
            out,
            "📊 Results: {}/{} checks passed",
            self.passed(),
            self.total()
        );
        let _ = writeln!(out);

        if self.passed() == self.total() {
            let _ = writeln!(out, "🎉 All checks passed! Your installation is ready.");
        } else if self.is_ok() {
            let _ = writeln!(
                out,
                "⚠️  Installation mostly complete. Some optional components are missing."
            );
        } else {
            let _ = writeln!(
                out,
                "❌ Installation incomplete. Please review the failed checks above."
            );
        }

        out
    }
}

/// Run every check against the given engine, secret source and configuration.
pub async fn run_checks(
    engine: &dyn ContainerEngine,
    secrets: &dyn SecretProvider,
    loaded: &LoadedConfig,
) -> CheckReport {
    let mut results = Vec::new();
    let engine_name = engine.engine_name();

    let installed = engine.is_installed();
    results.push(CheckResult::required(
        if installed {
            format!("{} is installed", engine_name)
        } else {
            format!("{} is not installed", engine_name)
        },
        installed,
    ));

    let running = installed && engine.ping().await;
    results.push(CheckResult::required(
        if running {
            format!("{} is running", engine_name)
        } else {
            format!("{} is not running", engine_name)
        },
        running,
    ));

    let image = &loaded.config.container.image;
    if running {
        match engine.image_exists(image).await {
            Ok(true) => results.push(CheckResult::optional(
                format!("Container image {} found", image),
                true,
            )),
            Ok(false) => results.push(CheckResult::optional(
                format!(
                    "Container image {} not found (it is pulled on first start)",
                    image
                ),
                false,
            )),
            Err(e) => results.push(CheckResult::optional(
                format!("Cannot check container images: {}", e),
                false,
            )),
        }
    } else {
        results.push(CheckResult::optional(
            format!("Cannot check container image {}", image),
            false,
        ));
    }

    match secrets.get_token().await {
        Some(token) => results.push(CheckResult::optional(
            format!("Bearer token found ({} chars)", token.chars().count()),
            true,
        )),
        None => results.push(CheckResult::optional(
            format!(
                "Bearer token not found (set {} or provide it with initialize_api)",
                loaded.config.credentials.token_env_var
            ),
            false,
        )),
    }

    results.push(CheckResult::optional(
        match &loaded.source {
            Some(path) => format!("Configuration loaded from {}", path.display()),
            None => "Using built-in configuration defaults".to_string(),
        },
        true,
    ));

    CheckReport { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::container::testing::{Script, ScriptedEngine};
    use async_trait::async_trait;

    struct Token(Option<&'static str>);

    #[async_trait]
    impl SecretProvider for Token {
        async fn get_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }

        fn name(&self) -> &'static str {
            "test"
        }
    }

    fn defaults() -> LoadedConfig {
        LoadedConfig {
            config: ServerConfig::default(),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_everything_present() {
        let engine = ScriptedEngine::new(Script::ready());
        let report = run_checks(&engine, &Token(Some("abcdef")), &defaults()).await;

        assert_eq!(report.passed(), report.total());
        assert!(report.is_ok());
        assert!(report.results.iter().any(|r| r.name == "Bearer token found (6 chars)"));
        assert!(report.render().contains("All checks passed"));
        assert!(!report.render().contains("abcdef"));
    }

    #[tokio::test]
    async fn test_missing_optional_parts_still_ok() {
        let mut script = Script::ready();
        script.image_present = false;
        let engine = ScriptedEngine::new(script);
        let report = run_checks(&engine, &Token(None), &defaults()).await;

        assert!(report.is_ok());
        assert_eq!(report.passed(), report.total() - 2);
        assert!(report.render().contains("mostly complete"));
    }

    #[tokio::test]
    async fn test_engine_down_fails_without_launching() {
        let mut script = Script::ready();
        script.engine_up = false;
        let engine = ScriptedEngine::new(script);
        let report = run_checks(&engine, &Token(Some("t")), &defaults()).await;

        assert!(!report.is_ok());
        assert_eq!(engine.calls().launches, 0);
        assert_eq!(engine.calls().image_checks, 0);
    }
}
