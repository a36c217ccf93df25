//! CLI command implementations.

use ripple_graph::{builder, impact, risk, EntityGraph};
use ripple_parser::{parse_repo, JavaParser};
use ripple_server::{AppState, GitClient, GitHubClient};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Start the webhook server.
pub async fn serve(
    port: u16,
    workdir: &Path,
    token: Option<String>,
    workers: usize,
) -> Result<()> {
    if token.is_none() {
        warn!("no GitHub token configured, API calls and private clones will fail");
    }
    fs::create_dir_all(workdir)?;

    let github = GitHubClient::new(token.clone().unwrap_or_default());
    let git = GitClient::new(workdir, token);
    let state = AppState::new(github, git, workers);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, workers, workdir = %workdir.display(), "ripple listening");
    ripple_server::serve(listener, state).await?;
    Ok(())
}

/// Parse a local tree, propagate impact from the given seeds, and print
/// the resulting report.
pub fn analyze(path: &Path, seeds: &[String], json: bool) -> Result<()> {
    let graph = build_graph(path);

    let mut changed = BTreeSet::new();
    for seed in seeds {
        match graph.resolve(seed) {
            Some(id) => {
                changed.insert(id);
            }
            None => {
                warn!(seed = %seed, "entity not found in graph, reach will be empty");
                changed.insert(seed.clone());
            }
        }
    }

    let report = impact::propagate(&graph, &changed);
    let level = risk::score(&report);

    if json {
        let mut value = serde_json::to_value(&report)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("risk".into(), serde_json::to_value(level)?);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Changed:");
    for id in &report.changed {
        println!("  {id}");
    }
    println!("Impacted:");
    let mut any = false;
    for id in &report.impacted {
        if !report.changed.contains(id) {
            println!("  {id}");
            any = true;
        }
    }
    if !any {
        println!("  (none)");
    }
    println!("Depth: {}", report.depth);
    println!("Risk:  {level}");
    Ok(())
}

/// Export the entity graph of a tree as pretty-printed JSON.
pub fn export(path: &Path, output: &Path) -> Result<()> {
    let graph = build_graph(path);
    let export = graph.export();
    fs::write(output, serde_json::to_string_pretty(&export)?)?;
    println!(
        "Exported {} nodes and {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

fn build_graph(path: &Path) -> EntityGraph {
    let descriptors = parse_repo(&JavaParser::new(), path);
    let mut graph = EntityGraph::new();
    builder::rebuild(&mut graph, &descriptors);
    graph
}
