use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Parser;
use psync_conf::Settings;
use psync_server::logging::init_tracing;
use psync_server::SyncService;
use psync_workspace::DocumentDescriptor;
use psync_workspace::DocumentPath;
use psync_workspace::FileKind;
use psync_workspace::InMemoryProjectModel;
use psync_workspace::ProjectKey;
use psync_workspace::ProjectModel;
use serde::Deserialize;
use serde::Serialize;

use crate::args::Args;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Replay {
    /// TOML script of editor and project events to replay.
    script: Utf8PathBuf,

    /// Directory that relative paths in the script and settings files are
    /// resolved against. Defaults to the current directory.
    #[arg(long)]
    project_root: Option<Utf8PathBuf>,

    /// Print the final state as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", deny_unknown_fields)]
enum Step {
    Configure {
        project: Utf8PathBuf,
        #[serde(default)]
        documents: Vec<ScriptDocument>,
    },
    RemoveProject {
        project: Utf8PathBuf,
    },
    Open {
        path: Utf8PathBuf,
        /// Read from disk when omitted.
        text: Option<String>,
        version: i32,
    },
    Change {
        path: Utf8PathBuf,
        text: String,
        version: i32,
    },
    Close {
        path: Utf8PathBuf,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptDocument {
    Path(Utf8PathBuf),
    Detailed {
        path: Utf8PathBuf,
        target: Option<Utf8PathBuf>,
        kind: Option<FileKind>,
    },
}

#[derive(Debug, Serialize)]
struct ProjectReport {
    project: ProjectKey,
    documents: Vec<DocumentReport>,
}

#[derive(Debug, Serialize)]
struct DocumentReport {
    path: DocumentPath,
    target: Utf8PathBuf,
    kind: FileKind,
    open: bool,
    version: Option<i32>,
}

impl Replay {
    pub async fn execute(&self, args: &Args) -> Result<Exit> {
        let project_root = self.project_root()?;

        let source = match std::fs::read_to_string(&self.script) {
            Ok(source) => source,
            Err(e) => {
                return Ok(Exit::error().with_message(format!(
                    "Failed to read script {}: {e}",
                    self.script
                )))
            }
        };
        let script: Script = match toml::from_str(&source) {
            Ok(script) => script,
            Err(e) => {
                return Ok(Exit::error().with_message(format!(
                    "Failed to parse script {}: {e}",
                    self.script
                )))
            }
        };

        let settings =
            Settings::new(project_root.as_std_path()).context("Failed to load settings")?;
        let filter = args
            .global
            .log_filter_override()
            .or(settings.debug.then_some("debug"))
            .unwrap_or(settings.log_filter.as_str());
        let _guard = init_tracing(&std::env::temp_dir(), filter);

        let (model, events) = InMemoryProjectModel::new();
        let service = SyncService::start(model, events, &settings);

        for step in script.steps {
            tracing::debug!(?step, "Replaying step");
            run_step(&service, &project_root, step).await?;
        }

        let report = collect_report(&service).await?;
        if !args.global.quiet {
            if self.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }

        Ok(Exit::success())
    }

    fn project_root(&self) -> Result<Utf8PathBuf> {
        let current_dir = std::env::current_dir().context("Failed to read current directory")?;
        let current_dir = Utf8PathBuf::from_path_buf(current_dir)
            .map_err(|path| anyhow!("Current directory is not UTF-8: {}", path.display()))?;

        Ok(match &self.project_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => current_dir.join(root),
            None => current_dir,
        })
    }
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> DocumentPath {
    if path.is_absolute() {
        DocumentPath::from(path)
    } else {
        DocumentPath::from(root.join(path))
    }
}

fn descriptor(root: &Utf8Path, document: ScriptDocument) -> DocumentDescriptor {
    let (path, target, kind) = match document {
        ScriptDocument::Path(path) => (path, None, None),
        ScriptDocument::Detailed { path, target, kind } => (path, target, kind),
    };
    let target = target
        .or_else(|| path.file_name().map(Utf8PathBuf::from))
        .unwrap_or_else(|| path.clone());
    DocumentDescriptor::new(resolve(root, &path), target, kind)
}

async fn run_step(
    service: &SyncService<InMemoryProjectModel>,
    root: &Utf8Path,
    step: Step,
) -> Result<()> {
    match step {
        Step::Configure { project, documents } => {
            let documents = documents
                .into_iter()
                .map(|document| descriptor(root, document))
                .collect();
            service
                .configure_project(resolve(root, &project), documents)
                .await?;
        }
        Step::RemoveProject { project } => {
            service.remove_project(resolve(root, &project)).await?;
        }
        Step::Open {
            path,
            text,
            version,
        } => {
            let path = resolve(root, &path);
            let text = text.unwrap_or_else(|| {
                std::fs::read_to_string(path.as_path()).unwrap_or_else(|e| {
                    tracing::debug!(%path, %e, "Opening document with empty text");
                    String::new()
                })
            });
            service
                .open_document(path, Arc::from(text), version)
                .await?;
        }
        Step::Change {
            path,
            text,
            version,
        } => {
            service
                .change_document(resolve(root, &path), Arc::from(text), version)
                .await?;
        }
        Step::Close { path } => {
            service.close_document(resolve(root, &path)).await?;
        }
    }
    Ok(())
}

async fn collect_report(
    service: &SyncService<InMemoryProjectModel>,
) -> Result<Vec<ProjectReport>> {
    let report = service
        .with_coordinator(|coordinator| {
            let model = coordinator.model();
            let versions = coordinator.version_cache();
            model
                .projects()
                .into_iter()
                .filter_map(|key| {
                    let snapshot = model.project(&key)?;
                    let documents = snapshot
                        .documents()
                        .map(|document| DocumentReport {
                            path: document.path().clone(),
                            target: document.target_path().to_path_buf(),
                            kind: document.kind(),
                            open: model.is_document_open(document.path()),
                            version: versions.try_get_version(document),
                        })
                        .collect();
                    Some(ProjectReport {
                        project: key,
                        documents,
                    })
                })
                .collect()
        })
        .await?;
    Ok(report)
}

fn render_text(report: &[ProjectReport]) -> String {
    let mut out = String::new();
    for project in report {
        let _ = writeln!(out, "{}", project.project);
        if project.documents.is_empty() {
            let _ = writeln!(out, "  (no documents)");
        }
        for document in &project.documents {
            let version = document
                .version
                .map_or_else(|| "-".to_string(), |version| format!("v{version}"));
            let state = if document.open { "open" } else { "closed" };
            let _ = writeln!(
                out,
                "  {}  {}  {version}  {state}",
                document.path, document.target
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script: Script = toml::from_str(
            r#"
[[steps]]
action = "configure"
project = "app.proj"
documents = ["src/a.html", { path = "src/b.cmp", target = "out/b.js", kind = "component" }]

[[steps]]
action = "open"
path = "src/a.html"
text = "<p>hi</p>"
version = 1

[[steps]]
action = "remove-project"
project = "app.proj"
"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 3);
        let Step::Configure { documents, .. } = &script.steps[0] else {
            panic!("expected configure step");
        };
        assert!(matches!(documents[0], ScriptDocument::Path(_)));
        assert!(matches!(
            documents[1],
            ScriptDocument::Detailed {
                kind: Some(FileKind::Component),
                ..
            }
        ));
        assert!(matches!(script.steps[2], Step::RemoveProject { .. }));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<Script, _> = toml::from_str(
            r#"
[[steps]]
action = "rename"
path = "a.html"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptor_defaults_target_to_file_name() {
        let root = Utf8Path::new("/w");
        let document = descriptor(root, ScriptDocument::Path("src/page.html".into()));
        assert_eq!(document.path(), &DocumentPath::new("/w/src/page.html"));
        assert_eq!(document.target_path().as_str(), "page.html");
        assert_eq!(document.kind(), FileKind::Template);
    }

    #[test]
    fn test_render_text() {
        let report = vec![
            ProjectReport {
                project: ProjectKey::Miscellaneous,
                documents: vec![DocumentReport {
                    path: DocumentPath::new("/w/a.html"),
                    target: "/w/a.html".into(),
                    kind: FileKind::Template,
                    open: true,
                    version: Some(3),
                }],
            },
            ProjectReport {
                project: ProjectKey::Configured(DocumentPath::new("/w/app.proj")),
                documents: vec![],
            },
        ];
        assert_eq!(
            render_text(&report),
            "<miscellaneous>\n  /w/a.html  /w/a.html  v3  open\n/w/app.proj\n  (no documents)\n"
        );
    }
}
