use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mindmap_data::*;
use mindmap_sync::{HttpPollSource, SyncCoordinator};
use mindmap_view::MapView;
use serde::Deserialize;
use tracing::*;
use tracing_subscriber::{prelude::*, EnvFilter};

mod config;

use config::{positive_secs, AppConfig};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// RON file overriding layout and polling settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lay out a map read from a JSON file and print the result
    Layout {
        tree: PathBuf,

        /// Node to show expanded, may be repeated
        #[arg(long = "expand")]
        expanded: Vec<String>,

        /// Print the render scene instead of the raw layout
        #[arg(long)]
        scene: bool,
    },
    /// Follow a map being generated on a server
    Watch {
        #[arg(long)]
        url: String,

        #[arg(long)]
        thread: String,

        #[arg(long)]
        token: Option<String>,

        /// Seconds between two polls
        #[arg(long)]
        interval: Option<f32>,
    },
}

/// Accepted shapes of a map file
#[derive(Deserialize)]
#[serde(untagged)]
enum TreeFile {
    Map(GlobalMindMap),
    Flat(Vec<FlatNode>),
}

fn read_map(path: &Path) -> Result<GlobalMindMap> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: TreeFile =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(match file {
        TreeFile::Map(map) => map,
        TreeFile::Flat(nodes) => GlobalMindMap::from_roots(build_tree(nodes)?),
    })
}

fn layout(config: &AppConfig, tree: &Path, expanded: Vec<String>, scene: bool) -> Result<()> {
    let map = read_map(tree)?;
    info!("Loaded {} nodes from {}", map.node_count(), tree.display());

    let mut view = MapView::new(config.layout.clone());
    view.set_map(Arc::new(map));
    for id in &expanded {
        if !view.expanded().is_expanded(id) {
            view.toggle(id);
        }
    }

    let json = if scene {
        serde_json::to_string_pretty(&view.scene())?
    } else {
        serde_json::to_string_pretty(view.layout())?
    };
    println!("{json}");
    Ok(())
}

async fn watch(
    config: &AppConfig,
    url: &str,
    thread: &str,
    token: Option<String>,
    interval: Option<f32>,
) -> Result<()> {
    let mut sync = config.sync()?;
    if let Some(secs) = interval {
        sync.poll_interval = positive_secs("--interval", secs)?;
    }

    let mut poller = HttpPollSource::new(url, thread).context("building HTTP client")?;
    if let Some(token) = token {
        poller = poller.with_token(token);
    }
    info!("Watching {}", poller.url());

    let mut coordinator = SyncCoordinator::spawn(poller, None, sync);
    let mut states = coordinator.subscribe();
    let mut view = MapView::new(config.layout.clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("listening for ctrl-c")?;
                info!("Interrupted");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                info!(phase = ?state.phase, message = %state.message, "Sync state changed");
                if view.apply_sync(&state) {
                    info!(
                        "Relayout: {} nodes, revision {}",
                        view.layout().nodes.len(),
                        state.data_revision
                    );
                }
                if state.phase.is_terminal() {
                    break;
                }
            }
        }
    }

    coordinator.close();
    coordinator.finished().await;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Layout {
            tree,
            expanded,
            scene,
        } => layout(&config, &tree, expanded, scene),
        Command::Watch {
            url,
            thread,
            token,
            interval,
        } => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting runtime")?;
            rt.block_on(watch(&config, &url, &thread, token, interval))
        }
    }
}
