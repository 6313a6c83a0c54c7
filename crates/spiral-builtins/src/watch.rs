// watch.rs — File-system watcher emitting `spiral.file.*` glints.
//
// Options:
//   path       file or directory to watch, relative to the project root
//   recursive  watch subdirectories too (default true)
//
// The watcher lives on notify's own thread; the module only holds it so
// that `stop` (dropping it) ends the watch.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use serde_json::json;

use spiral_orchestrator::{Module, ModuleContext, ModuleDescriptor};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchOptions {
    pub path: PathBuf,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

pub struct Watch {
    options: WatchOptions,
    watcher: Option<RecommendedWatcher>,
}

impl Watch {
    pub fn from_descriptor(descriptor: &ModuleDescriptor) -> anyhow::Result<Self> {
        let options: WatchOptions = serde_json::from_value(descriptor.options.clone())
            .context("watch needs `options.path`")?;
        Ok(Self {
            options,
            watcher: None,
        })
    }
}

/// `path` with its parent directory canonicalized. The file itself need not
/// exist; if the parent doesn't either, `path` is returned unchanged.
pub fn canonical_file(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Glint type for a notify event kind, or `None` for kinds not reported.
pub fn glint_type_for(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("spiral.file.created"),
        EventKind::Modify(_) => Some("spiral.file.modified"),
        EventKind::Remove(_) => Some("spiral.file.removed"),
        _ => None,
    }
}

#[async_trait]
impl Module for Watch {
    async fn activate(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let target = ctx.project_root().join(&self.options.path);
        if !target.exists() {
            anyhow::bail!("watch target {} does not exist", target.display());
        }

        let glints = ctx.glints().clone();
        // Writes to the glint log itself must not feed back into it. notify
        // reports canonical absolute paths, so compare in that form.
        let own_log = canonical_file(glints.log().path());
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let Some(glint_type) = glint_type_for(&event.kind) else {
                        return;
                    };
                    let paths: Vec<String> = event
                        .paths
                        .iter()
                        .filter(|p| canonical_file(p) != own_log)
                        .map(|p| p.display().to_string())
                        .collect();
                    if !paths.is_empty() {
                        glints.emit_or_warn(glint_type, json!({ "paths": paths }));
                    }
                }
                Err(e) => tracing::warn!(source = glints.source(), "watch error: {}", e),
            }
        })
        .context("failed to create file watcher")?;

        let mode = if self.options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&target, mode)
            .with_context(|| format!("failed to watch {}", target.display()))?;

        tracing::info!(module = ctx.module_id(), path = %target.display(), "watching");
        self.watcher = Some(watcher);
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.watcher = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use spiral_glint::{GlintEmitter, GlintLog};
    use tempfile::tempdir;

    #[test]
    fn path_option_is_required() {
        let descriptor = ModuleDescriptor::new("w", "builtin:watch", "on_start");
        assert!(Watch::from_descriptor(&descriptor).is_err());

        let descriptor = descriptor.with_options(json!({ "path": "notes" }));
        let watch = Watch::from_descriptor(&descriptor).unwrap();
        assert!(watch.options.recursive);
    }

    #[test]
    fn event_kinds_map_to_glint_types() {
        assert_eq!(
            glint_type_for(&EventKind::Create(CreateKind::File)),
            Some("spiral.file.created")
        );
        assert_eq!(
            glint_type_for(&EventKind::Modify(ModifyKind::Any)),
            Some("spiral.file.modified")
        );
        assert_eq!(
            glint_type_for(&EventKind::Remove(RemoveKind::Folder)),
            Some("spiral.file.removed")
        );
        assert_eq!(glint_type_for(&EventKind::Any), None);
    }

    #[tokio::test]
    async fn missing_target_fails_activation() {
        let dir = tempdir().unwrap();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));
        let ctx = ModuleContext::new("w", dir.path(), GlintEmitter::new(log, "w"));
        let descriptor = ModuleDescriptor::new("w", "builtin:watch", "on_start")
            .with_options(json!({ "path": "does-not-exist" }));

        let mut watch = Watch::from_descriptor(&descriptor).unwrap();
        let err = watch.activate(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn canonical_file_resolves_relative_and_dotdot_paths() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let expected = dir.path().canonicalize().unwrap().join("glints.jsonl");

        assert_eq!(canonical_file(&dir.path().join("sub/../glints.jsonl")), expected);
        assert_eq!(
            canonical_file(Path::new("glints.jsonl")),
            std::env::current_dir().unwrap().canonicalize().unwrap().join("glints.jsonl")
        );
    }

    #[tokio::test]
    async fn relative_glint_log_does_not_feed_back() {
        // A relative project directory, as `--glint-log some/path` would give.
        let dir = tempfile::tempdir_in(".").unwrap();
        assert!(dir.path().is_relative());
        std::fs::create_dir(dir.path().join(".spiral")).unwrap();
        let log = GlintLog::new(dir.path().join(".spiral/glints.jsonl"));
        log.append(&spiral_glint::Glint::new("test.seed", "test")).unwrap();

        let root = dir.path().canonicalize().unwrap();
        let ctx = ModuleContext::new("w", &root, GlintEmitter::new(log.clone(), "w"));
        let descriptor = ModuleDescriptor::new("w", "builtin:watch", "on_start")
            .with_options(json!({ "path": "." }));

        let mut watch = Watch::from_descriptor(&descriptor).unwrap();
        watch.activate(&ctx).await.unwrap();
        log.append(&spiral_glint::Glint::new("test.seed", "test")).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        watch.stop().await.unwrap();

        let glints = GlintLog::read_all(log.path()).unwrap();
        assert!(
            glints.iter().all(|g| !g.glint_type.starts_with("spiral.file.")),
            "log writes were reported as file events: {} glints",
            glints.len()
        );
        assert_eq!(glints.len(), 2);
    }

    #[tokio::test]
    async fn stop_releases_watcher() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));
        let ctx = ModuleContext::new("w", dir.path(), GlintEmitter::new(log, "w"));
        let descriptor = ModuleDescriptor::new("w", "builtin:watch", "on_start")
            .with_options(json!({ "path": "notes", "recursive": false }));

        let mut watch = Watch::from_descriptor(&descriptor).unwrap();
        watch.activate(&ctx).await.unwrap();
        assert!(watch.watcher.is_some());
        watch.stop().await.unwrap();
        assert!(watch.watcher.is_none());
    }
}
