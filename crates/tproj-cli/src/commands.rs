use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tproj_model::{CreateHints, EntityKind, EntityTree, NodeFactory, UserMessage};
use tproj_persistence::{
    EnvironmentResource, PersistenceError, ProjectDocument, ProjectLoad, ResourceFile,
    SkippedEntry, write_atomic,
};
use tproj_xml::{Document, WriteOptions};
use tracing::{info, info_span, warn};

/// One line of a project outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub depth: usize,
    pub kind: EntityKind,
    pub name: String,
    pub uid: String,
    pub implementation: &'static str,
}

#[derive(Debug)]
pub struct InspectResult {
    pub path: PathBuf,
    pub rows: Vec<OutlineRow>,
    pub skipped: Vec<SkippedEntry>,
    /// Per-field mapping failures, already formatted.
    pub failures: Vec<String>,
}

#[derive(Debug)]
pub struct CheckResult {
    pub path: PathBuf,
    pub messages: Vec<UserMessage>,
    pub skipped: usize,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }
}

#[derive(Debug)]
pub struct NormalizeResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub root: String,
    /// Whether the written bytes differ from the source bytes.
    pub changed: bool,
}

#[derive(Debug)]
pub struct NewResult {
    pub path: PathBuf,
    pub root_uid: String,
    pub nodes: usize,
}

/// Summary of one environment section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRow {
    pub section: &'static str,
    pub revision: Option<i64>,
    pub entries: usize,
    pub detail: String,
}

/// Lines to print for a failed command.
///
/// A storage failure is explained with its user message and hint; any other
/// error is printed with its context chain.
pub fn error_report(error: &anyhow::Error) -> Vec<String> {
    let persistence = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<PersistenceError>());
    let Some(persistence) = persistence else {
        return vec![format!("error: {error:#}")];
    };
    let mut lines = vec![format!("error: {}", persistence.user_message())];
    if let Some(suggestion) = persistence.suggestion() {
        lines.push(format!("hint: {suggestion}"));
    }
    lines
}

fn load_project(path: &Path) -> Result<ProjectLoad> {
    ProjectDocument::new(path)
        .read()
        .with_context(|| format!("load project {}", path.display()))
}

pub fn run_inspect(path: &Path) -> Result<InspectResult> {
    let _span = info_span!("inspect", path = %path.display()).entered();
    let load = load_project(path)?;
    let rows = outline(&load.tree);
    info!(nodes = rows.len(), skipped = load.skipped.len(), "inspected project");
    Ok(InspectResult {
        path: path.to_path_buf(),
        rows,
        skipped: load.skipped,
        failures: load.report.failures.iter().map(ToString::to_string).collect(),
    })
}

pub fn outline(tree: &EntityTree) -> Vec<OutlineRow> {
    tree.walk_all()
        .into_iter()
        .filter_map(|(id, depth)| {
            let entity = tree.get(id)?;
            Some(OutlineRow {
                depth,
                kind: entity.kind(),
                name: entity.name().to_string(),
                uid: entity.uid().to_string(),
                implementation: entity.implementation(),
            })
        })
        .collect()
}

pub fn run_check(path: &Path) -> Result<CheckResult> {
    let _span = info_span!("check", path = %path.display()).entered();
    let load = load_project(path)?;
    let messages: Vec<UserMessage> = load
        .tree
        .unresolved_references()
        .iter()
        .map(|reference| reference.to_message(&load.tree))
        .collect();
    if !messages.is_empty() {
        warn!(count = messages.len(), "project has unresolved references");
    }
    Ok(CheckResult {
        path: path.to_path_buf(),
        messages,
        skipped: load.skipped.len(),
    })
}

/// Re-print any XML document with the given layout.
pub fn run_normalize(
    source: &Path,
    output: Option<&Path>,
    options: WriteOptions,
) -> Result<NormalizeResult> {
    let _span = info_span!("normalize", source = %source.display()).entered();
    let bytes = fs::read(source).with_context(|| format!("read {}", source.display()))?;
    let document =
        Document::from_bytes(&bytes).with_context(|| format!("parse {}", source.display()))?;
    let normalized = document
        .to_bytes(&options)
        .context("serialize normalized document")?;

    let target = output.unwrap_or(source).to_path_buf();
    let changed = normalized != bytes;
    if changed || target != source {
        write_atomic(&target, &normalized)?;
    }
    info!(target = %target.display(), changed, "normalized document");
    Ok(NormalizeResult {
        source: source.to_path_buf(),
        target,
        root: document.root_name().to_string(),
        changed,
    })
}

/// Scaffold a new project document.
///
/// A regular project starts with one suite; a template project with one
/// template.
pub fn run_new(
    name: &str,
    output: &Path,
    template_project: bool,
    force: bool,
    options: WriteOptions,
) -> Result<NewResult> {
    let _span = info_span!("new", name).entered();
    if output.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            output.display()
        );
    }

    let factory = NodeFactory::with_defaults();
    let (root_kind, child_kind) = if template_project {
        (EntityKind::TemplateProject, EntityKind::Template)
    } else {
        (EntityKind::Project, EntityKind::TestSuite)
    };

    let mut tree = EntityTree::new();
    let root = tree.insert_root(factory.create(root_kind, name)?);
    tree.insert_child(
        root,
        factory.create_with(child_kind, "main", &CreateHints::default())?,
    )?;

    let mut document = ProjectDocument::new(output).with_options(options);
    document.write(&tree)?;
    let root_uid = tree
        .get(root)
        .map(|entity| entity.uid().to_string())
        .unwrap_or_default();
    Ok(NewResult {
        path: output.to_path_buf(),
        root_uid,
        nodes: tree.len(),
    })
}

pub fn run_environments(path: &Path) -> Result<Vec<EnvironmentRow>> {
    let _span = info_span!("environments", path = %path.display()).entered();
    let (file, report) = ResourceFile::<EnvironmentResource>::open(path)
        .with_context(|| format!("load environment config {}", path.display()))?;
    for failure in &report.failures {
        warn!(%failure, "environment field not loaded");
    }
    Ok(environment_rows(file.resource()))
}

pub fn environment_rows(env: &EnvironmentResource) -> Vec<EnvironmentRow> {
    let servers = &env.servers;
    let server = match (&servers.name, &servers.port) {
        (Some(name), Some(port)) => format!("{name}:{port}"),
        (Some(name), None) => name.clone(),
        (None, _) => "-".to_string(),
    };
    let active = env.environments.active.as_deref().unwrap_or("-");
    let links: Vec<String> = env
        .links
        .entries()
        .map(|link| format!("{}/{} -> {}", link.environment, link.item, link.server))
        .collect();

    vec![
        EnvironmentRow {
            section: "servers",
            revision: servers.header.revision,
            entries: servers.hosts.len(),
            detail: format!("{server} [{}]", servers.hosts.join(", ")),
        },
        EnvironmentRow {
            section: "server-types",
            revision: env.server_types.header.revision,
            entries: env.server_types.types.len(),
            detail: env.server_types.types.join(", "),
        },
        EnvironmentRow {
            section: "environments",
            revision: env.environments.header.revision,
            entries: env.environments.environments.len(),
            detail: format!("active: {active}"),
        },
        EnvironmentRow {
            section: "environment-links",
            revision: env.links.header.revision,
            entries: env.links.links.len(),
            detail: links.join("; "),
        },
    ]
}
