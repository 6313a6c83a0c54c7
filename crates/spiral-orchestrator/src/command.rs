// command.rs — Modules backed by an external program (`exec:` targets).
//
// `exec:./scripts/convert.sh --all` runs the program once through the `run`
// entry point and waits for it. A non-zero exit status is an entry-point
// failure. The program inherits the orchestrator's environment plus:
//
//   SPIRAL_MODULE_ID     the registry id
//   SPIRAL_GLINT_LOG     path of the glint log, for appending glints
//   SPIRAL_PROJECT_ROOT  the project root (also the working directory)
//
// Descriptor `options.env` (a string map) adds further variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;

use crate::descriptor::ModuleDescriptor;
use crate::module::{EntryPoint, Module, ModuleContext};

/// A module that runs one external command to completion.
#[derive(Debug, Clone)]
pub struct CommandModule {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandModule {
    /// Parse the part of a load target after `exec:`.
    pub fn from_descriptor(command_line: &str, descriptor: &ModuleDescriptor) -> anyhow::Result<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = match words.next() {
            Some(program) => program,
            None => bail!("`exec:` target names no program"),
        };

        let env = match descriptor.options.get("env") {
            None | Some(serde_json::Value::Null) => BTreeMap::new(),
            Some(value) => serde_json::from_value(value.clone())
                .context("`options.env` must be a map of strings")?,
        };

        Ok(Self {
            program,
            args: words.collect(),
            env,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Relative programs with a path separator run from the project root;
    /// bare names go through `PATH`.
    fn resolve_program(&self, project_root: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            project_root.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

#[async_trait]
impl Module for CommandModule {
    fn entry_point(&self) -> EntryPoint {
        EntryPoint::Run
    }

    async fn run(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let program = self.resolve_program(ctx.project_root());
        tracing::info!(
            module = ctx.module_id(),
            program = %program.display(),
            "running command module"
        );

        let status = tokio::process::Command::new(&program)
            .args(&self.args)
            .current_dir(ctx.project_root())
            .env("SPIRAL_MODULE_ID", ctx.module_id())
            .env("SPIRAL_GLINT_LOG", ctx.glints().log().path())
            .env("SPIRAL_PROJECT_ROOT", ctx.project_root())
            .envs(&self.env)
            .stdin(Stdio::null())
            .status()
            .await
            .with_context(|| format!("failed to start `{}`", program.display()))?;

        if !status.success() {
            bail!("`{}` exited with {}", program.display(), status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spiral_glint::{GlintEmitter, GlintLog};
    use tempfile::tempdir;

    fn context(root: &Path) -> ModuleContext {
        let log = GlintLog::new(root.join("glints.jsonl"));
        ModuleContext::new("cmd", root, GlintEmitter::new(log, "cmd"))
    }

    #[test]
    fn parses_program_and_args() {
        let descriptor = ModuleDescriptor::new("cmd", "exec:./convert.sh --all -v", "on_demand");
        let module = CommandModule::from_descriptor("./convert.sh --all -v", &descriptor).unwrap();
        assert_eq!(module.program(), "./convert.sh");
        assert_eq!(module.args(), ["--all", "-v"]);
        assert_eq!(module.entry_point(), EntryPoint::Run);
    }

    #[test]
    fn env_option_must_be_string_map() {
        let descriptor = ModuleDescriptor::new("cmd", "exec:x", "on_demand")
            .with_options(json!({ "env": ["not", "a", "map"] }));
        assert!(CommandModule::from_descriptor("x", &descriptor).is_err());
    }

    #[test]
    fn relative_paths_resolve_against_project_root() {
        let descriptor = ModuleDescriptor::new("cmd", "exec:x", "on_demand");
        let root = Path::new("/srv/project");

        let scripted = CommandModule::from_descriptor("scripts/go.sh", &descriptor).unwrap();
        assert_eq!(scripted.resolve_program(root), root.join("scripts/go.sh"));

        let bare = CommandModule::from_descriptor("sh", &descriptor).unwrap();
        assert_eq!(bare.resolve_program(root), PathBuf::from("sh"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_passes_environment() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("seen.txt");
        let line = format!("echo \"$SPIRAL_MODULE_ID:$EXTRA\" > {}", out.display());
        let descriptor = ModuleDescriptor::new("cmd", "exec:sh", "on_demand")
            .with_options(json!({ "env": { "EXTRA": "yes" } }));
        let mut module = CommandModule::from_descriptor("sh", &descriptor).unwrap();
        module.args = vec!["-c".to_string(), line];

        module.run(&context(dir.path())).await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "cmd:yes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let dir = tempdir().unwrap();
        let descriptor = ModuleDescriptor::new("cmd", "exec:sh -c exit", "on_demand");
        let mut module = CommandModule::from_descriptor("sh -c false", &descriptor).unwrap();

        let err = module.run(&context(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let dir = tempdir().unwrap();
        let descriptor = ModuleDescriptor::new("cmd", "exec:x", "on_demand");
        let mut module =
            CommandModule::from_descriptor("spiral-no-such-program-anywhere", &descriptor).unwrap();
        assert!(module.run(&context(dir.path())).await.is_err());
    }
}
