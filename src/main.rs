use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docview_config::ViewerConfig;
use docview_engine::{
  ChannelNotifier, Collaborators, DocViewer, Document, InitialView, IntervalFrameClock,
  RunOutcome, set_animations_enabled,
};
use docview_host::{LoggingWidgetFactory, OutlineTocBuilder, RecordingTitleSink, TagWidgetHost, TocItem};

/// Docview - swap rendered documents with crossfade transitions
#[derive(Parser)]
#[command(name = "docview")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the viewer config (default: ~/.docview/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Render documents one after another and print the settled view
  Render {
    /// Documents to render, in order (`.json` with `{id, contents}`, or HTML)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Make every transition instantaneous
    #[arg(long)]
    no_animations: bool,

    /// Pre-rendered markup shown before the first document
    #[arg(long)]
    initial: Option<String>,

    /// Push all documents without waiting; only the last one settles
    #[arg(long)]
    rapid: bool,

    /// Register a logging widget for this custom element tag
    #[arg(long = "widget")]
    widgets: Vec<String>,
  },
}

#[derive(Serialize)]
struct RenderOutput {
  doc_id: Option<String>,
  title: Option<String>,
  outcome: Option<RunOutcome>,
  toc: Vec<TocItem>,
  widgets: usize,
  selectors: Vec<String>,
  markup: String,
}

struct RenderArgs {
  files: Vec<PathBuf>,
  no_animations: bool,
  initial: Option<String>,
  rapid: bool,
  widgets: Vec<String>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  match cli.command {
    Some(Commands::Render {
      files,
      no_animations,
      initial,
      rapid,
      widgets,
    }) => {
      let config = load_config(cli.config.as_deref())?;
      let args = RenderArgs {
        files,
        no_animations,
        initial,
        rapid,
        widgets,
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { render_async(config, args).await })?;
    }
    None => {
      println!("docview - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
  if let Some(path) = path {
    return ViewerConfig::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()));
  }

  let default_path = dirs::home_dir().map(|home| home.join(".docview").join("config.json"));
  match default_path {
    Some(path) if path.exists() => {
      info!(path = %path.display(), "loading config");
      ViewerConfig::load(&path)
        .with_context(|| format!("failed to load config: {}", path.display()))
    }
    _ => {
      info!("no config file, using defaults");
      Ok(ViewerConfig::default())
    }
  }
}

async fn read_document(path: &Path) -> Result<Document> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read document: {}", path.display()))?;

  if path.extension().is_some_and(|ext| ext == "json") {
    return serde_json::from_str(&content)
      .with_context(|| format!("failed to parse document: {}", path.display()));
  }

  let id = path
    .file_stem()
    .and_then(|stem| stem.to_str())
    .with_context(|| format!("document has no usable file name: {}", path.display()))?;
  Ok(Document::new(id, content))
}

async fn render_async(mut config: ViewerConfig, args: RenderArgs) -> Result<()> {
  if args.no_animations {
    config.animations_enabled = false;
    set_animations_enabled(false);
  }

  let mut docs = Vec::with_capacity(args.files.len());
  for file in &args.files {
    docs.push(read_document(file).await?);
  }
  let Some(last_id) = docs.last().map(|doc| doc.id.clone()) else {
    bail!("no documents to render");
  };

  let widgets = args
    .widgets
    .iter()
    .fold(TagWidgetHost::new(), |host, tag| {
      host.register(tag.as_str(), Arc::new(LoggingWidgetFactory))
    });
  let toc = Arc::new(OutlineTocBuilder::new());
  let title = Arc::new(RecordingTitleSink::new());
  let (notifier, mut events) = ChannelNotifier::channel();

  let collaborators = Collaborators::headless(&config)
    .with_widgets(Arc::new(widgets))
    .with_frames(Arc::new(IntervalFrameClock::new(config.frame_interval())))
    .with_toc(toc.clone())
    .with_title(title.clone())
    .with_notifier(Arc::new(notifier));
  let initial = args
    .initial
    .map_or(InitialView::Empty, InitialView::Prerendered);

  let viewer = DocViewer::new(config, collaborators, initial).context("failed to create viewer")?;
  let handle = viewer.spawn();

  let printer = tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      eprintln!("event: {}", event.as_str());
    }
  });

  if args.rapid {
    for doc in docs {
      handle.push(doc).await.context("viewer stopped")?;
    }
    handle
      .wait_for(|s| s.settled_doc.as_deref() == Some(last_id.as_str()))
      .await
      .context("viewer stopped before the last document settled")?;
  } else {
    for doc in docs {
      let id = doc.id.clone();
      let before = handle.snapshot().generation;
      handle.push(doc).await.context("viewer stopped")?;
      let snapshot = handle
        .wait_for(|s| s.generation > before && s.settled_doc.as_deref() == Some(id.as_str()))
        .await
        .context("viewer stopped before the document settled")?;
      eprintln!("Settled: {} ({:?})", id, snapshot.outcome.unwrap_or(RunOutcome::Failed));
    }
  }

  let snapshot = handle.snapshot();
  handle.shutdown().await.context("viewer shutdown failed")?;
  // Every notifier clone went away with the viewer, so the printer ends.
  printer.await?;

  let output = RenderOutput {
    doc_id: snapshot.displayed_doc,
    title: title.title(),
    outcome: snapshot.outcome,
    toc: toc.items(),
    widgets: snapshot.widgets,
    selectors: snapshot.selectors,
    markup: snapshot.markup,
  };
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}
