// Copyright 2026 Pagelift Contributors
// SPDX-License-Identifier: MIT

//! pagelift — recognize page components and export Elementor JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use pagelift::config::resolve_patterns_path;
use pagelift::patterns::PatternSummary;
use pagelift::selector::{self, Selector};
use pagelift::{
    load_pattern_file, ComponentType, ElementorExporter, ExportConfig, PageAccessor,
    PageSnapshot, RecognitionEngine, RecognizedComponent, RecognizerConfig,
};

#[derive(Parser)]
#[command(
    name = "pagelift",
    about = "Recognize semantic components in a rendered page and export them as Elementor widgets",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Deepest DOM level to descend to.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Most nodes to read in one pass.
    #[arg(long, global = true)]
    max_nodes: Option<usize>,

    /// Extra pattern catalogue file (JSON).
    /// Also reads PAGELIFT_PATTERNS, then .pagelift/patterns.json.
    #[arg(long, global = true)]
    patterns: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize components and print the component tree.
    Recognize {
        /// Page capture (.json) or HTML file.
        input: PathBuf,
    },

    /// Recognize components and print an importable Elementor page.
    Export {
        /// Page capture (.json) or HTML file.
        input: PathBuf,

        /// Document title.
        #[arg(long)]
        title: Option<String>,
    },

    /// List elements matching a selector.
    Find {
        /// Page capture (.json) or HTML file.
        input: PathBuf,

        /// Selector, e.g. "nav > ul a[href^=http]".
        selector: String,
    },

    /// List the active recognition patterns.
    Patterns {
        /// Only patterns for this component type.
        #[arg(long = "type")]
        component_type: Option<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pagelift completions bash > ~/.local/share/bash-completion/completions/pagelift
    ///   pagelift completions zsh > ~/.zfunc/_pagelift
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                println!("{}", json!({ "error": true, "message": format!("{e:#}") }));
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Recognize { input } => {
            let page = load_page(input)?;
            let outcome = build_engine(cli)?
                .recognize(&page, page.root())
                .context("recognition failed")?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                print_tree(&outcome.root, &page, 0);
                println!();
                println!(
                    "{} components, {} nodes visited{}{}",
                    outcome.root.count(),
                    outcome.nodes_visited,
                    if outcome.partial { ", partial" } else { "" },
                    if outcome.truncated { ", truncated" } else { "" },
                );
                for diagnostic in &outcome.diagnostics {
                    eprintln!("  {diagnostic}");
                }
            }
        }

        Commands::Export { input, title } => {
            let page = load_page(input)?;
            let mut root = build_engine(cli)?
                .recognize(&page, page.root())
                .context("recognition failed")?
                .root;

            let mut config = ExportConfig::default();
            if let Some(title) = title {
                config.title = title.clone();
            } else if let Some(stem) = input.file_stem() {
                config.title = stem.to_string_lossy().into_owned();
            }
            let document = ElementorExporter::new(config)
                .export_page(&mut root, &page)
                .context("export failed")?;
            print_json(&document)?;
        }

        Commands::Find { input, selector: source } => {
            let page = load_page(input)?;
            let selector = Selector::parse(source)?;
            let root = page.root();
            let matches = selector::select_all(&page, root, &selector)?;
            debug!(selector = %selector, matches = matches.len(), "selector evaluated");

            let rows = matches
                .iter()
                .map(|node| {
                    Ok(FoundElement {
                        node: node.0,
                        tag: page.tag_name(*node)?,
                        selector: selector::suggest_selector(&page, root, *node)?,
                        text: preview(&page.text_content(*node)?),
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            if cli.json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No elements match '{selector}'");
            } else {
                for row in &rows {
                    println!(
                        "#{:<5} {:<10} {}  {}",
                        row.node,
                        row.tag,
                        row.selector.as_deref().unwrap_or("-"),
                        row.text
                    );
                }
            }
        }

        Commands::Patterns { component_type } => {
            let engine = build_engine(cli)?;
            let filter: Option<ComponentType> = component_type
                .as_deref()
                .map(|name| name.parse().unwrap_or_else(|never| match never {}));
            if let Some(ComponentType::Custom(name)) = &filter {
                if !engine.registry().is_custom_type_registered(name) {
                    bail!("unknown component type '{name}'");
                }
            }

            let rows: Vec<PatternSummary> = engine
                .registry()
                .all_patterns()
                .iter()
                .filter(|p| filter.as_ref().map_or(true, |t| &p.component_type == t))
                .map(PatternSummary::from)
                .collect();

            if cli.json {
                print_json(&rows)?;
            } else {
                for row in &rows {
                    println!(
                        "{:>4}  {:<15} {:>3} {:>3}  {}  [{}]",
                        row.order,
                        row.component_type.as_str(),
                        row.confidence,
                        row.priority,
                        row.reason,
                        row.predicates.join(", ")
                    );
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "pagelift", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct FoundElement {
    node: usize,
    tag: String,
    selector: Option<String>,
    text: String,
}

/// Engine with the built-in catalogue, limits from env then flags, plus the
/// resolved pattern file if any.
fn build_engine(cli: &Cli) -> anyhow::Result<RecognitionEngine> {
    let mut config = RecognizerConfig::from_env();
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    if let Some(nodes) = cli.max_nodes {
        config.max_nodes = nodes;
    }

    let mut engine = RecognitionEngine::with_config(config);
    if let Some(path) = resolve_patterns_path(cli.patterns.as_deref()) {
        let added = load_pattern_file(&path, engine.registry_mut())
            .with_context(|| format!("loading patterns from {}", path.display()))?;
        info!(path = %path.display(), added, "pattern catalogue loaded");
    }
    Ok(engine)
}

/// A `.json` file is a page capture; anything else is tried as a capture
/// first and parsed as HTML otherwise.
fn load_page(path: &Path) -> anyhow::Result<PageSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return PageSnapshot::from_json(&raw)
            .with_context(|| format!("parsing page capture {}", path.display()));
    }
    match PageSnapshot::from_json(&raw) {
        Ok(page) => Ok(page),
        Err(_) => PageSnapshot::from_html(&raw)
            .with_context(|| format!("parsing HTML {}", path.display())),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tree(component: &RecognizedComponent, page: &dyn PageAccessor, depth: usize) {
    let tag = page.tag_name(component.element).unwrap_or_default();
    println!(
        "{:indent$}{} ({}) {} <{}>{}",
        "",
        component.component_type,
        component.confidence,
        component.element,
        tag,
        component
            .reason
            .as_deref()
            .map(|r| format!("  {r}"))
            .unwrap_or_default(),
        indent = depth * 2
    );
    for child in &component.children {
        print_tree(child, page, depth + 1);
    }
}

/// First 60 characters of normalized text.
fn preview(text: &str) -> String {
    let text = pagelift::accessor::normalize_whitespace(text);
    if text.chars().count() <= 60 {
        text
    } else {
        let cut: String = text.chars().take(59).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_page_falls_back_to_html() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        write!(file, "<html><body><h1>Hi</h1></body></html>").unwrap();
        let page = load_page(file.path()).unwrap();
        assert_eq!(page.tag_name(page.root()).unwrap(), "body");
    }

    #[test]
    fn test_load_page_reads_json_capture() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"viewport": {{"width": 1280, "height": 800}}, "documentHeight": 800,
                "root": {{"tag": "body", "children": [{{"tag": "p", "text": "Hello"}}]}}}}"#
        )
        .unwrap();
        let page = load_page(file.path()).unwrap();
        assert_eq!(page.viewport().width, 1280.0);
        assert_eq!(page.children(page.root()).unwrap().len(), 1);
    }

    #[test]
    fn test_bad_json_capture_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "<html></html>").unwrap();
        assert!(load_page(file.path()).is_err());
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("  short   text "), "short text");
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), 60);
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pagelift", "recognize", "page.html", "--json", "--max-depth", "8"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.max_depth, Some(8));
        assert_eq!(cli.log_level, "warn");
    }
}
