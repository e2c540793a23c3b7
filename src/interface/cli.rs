use crate::domain::config::{default_protocols, KeyMode, NormalizationConfig};
use crate::domain::model::SourceFormat;
use crate::infrastructure::event_ndjson::spawn_ndjson_printer;
use crate::infrastructure::html_writer::render_cleaned;
use crate::infrastructure::report_render::OutputFormat;
use crate::infrastructure::source_file::{discover_files, write_output};
use crate::infrastructure::url_normalizer::RuleNormalizer;
use crate::usecase::event::AppEvent;
use crate::usecase::report::{Analysis, Report};
use crate::usecase::run::{DedupOutcome, Pipeline};
use crate::usecase::stats::RunStats;
use anyhow::{anyhow, bail, Context, Result};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::env;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run() -> Result<()> {
    init_logging();
    let args: Vec<String> = env::args().collect();
    run_with_args(&args).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_with_args(args: &[String]) -> Result<()> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{e}");
            return Ok(());
        }
        Err(e) => return Err(anyhow!(e.render().to_string())),
    };

    let Command::Bookmarks(cmd) = cli.command;
    match cmd {
        BookmarksCommand::Diff { a, b, rules, out } => run_diff(&a, &b, &rules, &out).await,
        BookmarksCommand::Compare {
            files,
            analysis,
            rules,
            out,
        } => run_compare(&files, analysis.into(), &rules, &out).await,
        BookmarksCommand::Dedup { file, rules, out } => run_dedup(&file, &rules, &out).await,
        BookmarksCommand::BatchDedup {
            paths,
            batch_mode,
            rules,
            out,
        } => run_batch_dedup(&paths, batch_mode, &rules, &out).await,
        BookmarksCommand::Convert {
            files,
            output_dir,
            emit_events,
        } => run_convert(&files, output_dir.as_deref(), emit_events).await,
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bookmark-compare",
    about = "Extract, normalize, compare and deduplicate browser bookmark exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bookmark file operations
    #[command(subcommand)]
    Bookmarks(BookmarksCommand),
}

#[derive(Subcommand, Debug)]
enum BookmarksCommand {
    /// Two-way difference of bookmarks and folders
    Diff {
        a: PathBuf,
        b: PathBuf,
        #[command(flatten)]
        rules: RuleArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// N-way intersection and per-file unique items
    Compare {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "all")]
        analysis: AnalysisArg,
        #[command(flatten)]
        rules: RuleArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Report duplicates in one file and write a cleaned copy
    Dedup {
        file: PathBuf,
        #[command(flatten)]
        rules: RuleArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Dedup every .html file under the given files and directories
    BatchDedup {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "all")]
        batch_mode: BatchModeArg,
        #[command(flatten)]
        rules: RuleArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Render JSON bookmark trees as Netscape HTML files
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Defaults to each input's directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        emit_events: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct RuleArgs {
    /// Canonical key shape
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
    /// Decode HTML entities and percent escapes
    #[arg(short, long)]
    decode: bool,
    #[arg(long)]
    decode_entities: bool,
    #[arg(long)]
    decode_percent: bool,
    /// Keep only http, https and ftp links
    #[arg(short, long)]
    filter: bool,
    /// Custom protocol filter, comma separated
    #[arg(long, value_delimiter = ',')]
    protocols: Vec<String>,
    /// Treat http:// and https:// as the same link
    #[arg(long, conflicts_with = "strict_protocol")]
    collapse_protocol: bool,
    /// Never treat http:// and https:// as the same link
    #[arg(long)]
    strict_protocol: bool,
    /// Ignore one trailing slash
    #[arg(long)]
    ignore_slash: bool,
    #[arg(long, value_enum)]
    input_format: Option<InputFormatArg>,
    /// JSON normalization config; flags are applied on top
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct OutputArgs {
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,
    /// Report path; derived from the inputs when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Print NDJSON progress events to stdout
    #[arg(long)]
    emit_events: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum ModeArg {
    Url,
    UrlTitle,
}

impl From<ModeArg> for KeyMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Url => KeyMode::Url,
            ModeArg::UrlTitle => KeyMode::UrlTitle,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum BatchModeArg {
    Url,
    UrlTitle,
    All,
}

impl BatchModeArg {
    fn modes(self) -> &'static [KeyMode] {
        match self {
            BatchModeArg::Url => &[KeyMode::Url],
            BatchModeArg::UrlTitle => &[KeyMode::UrlTitle],
            BatchModeArg::All => &[KeyMode::Url, KeyMode::UrlTitle],
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum AnalysisArg {
    Intersection,
    Unique,
    All,
}

impl From<AnalysisArg> for Analysis {
    fn from(a: AnalysisArg) -> Self {
        match a {
            AnalysisArg::Intersection => Analysis::Intersection,
            AnalysisArg::Unique => Analysis::Unique,
            AnalysisArg::All => Analysis::All,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum InputFormatArg {
    Html,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
enum FormatArg {
    #[default]
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl RuleArgs {
    /// File config first, then flags. `collapse_by_default` is on for the dedup commands.
    async fn resolve(&self, collapse_by_default: bool) -> Result<NormalizationConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading config: {}", path.display()))?;
                serde_json::from_str::<NormalizationConfig>(&raw)
                    .with_context(|| format!("parsing config: {}", path.display()))?
            }
            None => NormalizationConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.key_mode = mode.into();
        }
        if self.decode || self.decode_entities {
            config.decode_html_entities = true;
        }
        if self.decode || self.decode_percent {
            config.decode_percent_encoding = true;
        }
        if !self.protocols.is_empty() {
            config.filter_protocols = Some(
                self.protocols
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
            );
        } else if self.filter && config.filter_protocols.is_none() {
            config.filter_protocols = Some(default_protocols());
        }
        config.collapse_protocol = !self.strict_protocol
            && (config.collapse_protocol || self.collapse_protocol || collapse_by_default);
        if self.ignore_slash {
            config.collapse_trailing_slash = true;
        }
        Ok(config)
    }

    fn forced_format(&self) -> Option<SourceFormat> {
        self.input_format.map(|f| match f {
            InputFormatArg::Html => SourceFormat::Html,
            InputFormatArg::Json => SourceFormat::JsonTree,
        })
    }
}

/// `_dec_filter_strictP_noSlash` style marker of the non-default rules in effect.
fn option_suffix(config: &NormalizationConfig, collapse_by_default: bool) -> String {
    let mut parts = Vec::new();
    if config.decoding() {
        parts.push("dec");
    }
    if config.filter_protocols.is_some() {
        parts.push("filter");
    }
    match (collapse_by_default, config.collapse_protocol) {
        (true, false) => parts.push("strictP"),
        (false, true) => parts.push("collapseP"),
        _ => {}
    }
    if config.collapse_trailing_slash {
        parts.push("noSlash");
    }
    parts.iter().map(|p| format!("_{p}")).collect()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bookmarks".to_string())
}

impl OutputArgs {
    fn dir(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    fn report_path(&self, default_name: String) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.dir().join(default_name))
    }
}

fn event_channel(enabled: bool) -> (Option<mpsc::Sender<AppEvent>>, Option<JoinHandle<()>>) {
    let (tx, rx) = mpsc::channel::<AppEvent>(1024);
    if enabled {
        (Some(tx), Some(spawn_ndjson_printer(rx)))
    } else {
        drop(rx);
        (None, None)
    }
}

async fn write_report(
    pipeline: &Pipeline<'_>,
    format: OutputFormat,
    report: &Report,
    path: &Path,
) -> Result<()> {
    let body = format.render(report)?;
    write_output(path, &body)
        .await
        .with_context(|| format!("writing report: {}", path.display()))?;
    info!(path = %path.display(), "report written");
    pipeline.written(path).await;
    Ok(())
}

/// Writes the dedup report and, when duplicates exist, the cleaned bookmark file.
async fn write_dedup_outputs(
    pipeline: &Pipeline<'_>,
    outcome: &DedupOutcome,
    format: OutputFormat,
    report_path: &Path,
    cleaned_path: &Path,
) -> Result<bool> {
    write_report(
        pipeline,
        format,
        &Report::Dedup(outcome.report.clone()),
        report_path,
    )
    .await?;

    if outcome.report.groups.is_empty() {
        return Ok(false);
    }
    let html = render_cleaned(
        &outcome.kept,
        outcome.report.config.key_mode,
        outcome.format,
    );
    write_output(cleaned_path, &html)
        .await
        .with_context(|| format!("writing cleaned bookmarks: {}", cleaned_path.display()))?;
    pipeline.written(cleaned_path).await;
    Ok(true)
}

async fn finish(pipeline: Pipeline<'_>, stats: &RunStats, printer: Option<JoinHandle<()>>) {
    pipeline.finish(stats).await;
    drop(pipeline);
    if let Some(handle) = printer {
        handle.await.ok();
    }
}

async fn run_diff(a: &Path, b: &Path, rules: &RuleArgs, out: &OutputArgs) -> Result<()> {
    let config = rules.resolve(false).await?;
    let (sink, printer) = event_channel(out.emit_events);
    let normalizer = RuleNormalizer;
    let pipeline = Pipeline {
        config: config.clone(),
        forced_format: rules.forced_format(),
        normalizer: &normalizer,
        sink,
    };

    let (report, stats) = pipeline.diff(a, b).await?;
    let format = OutputFormat::from(out.format);
    let path = out.report_path(format!(
        "{}_vs_{}_{}{}.{}",
        stem(a),
        stem(b),
        config.key_mode,
        option_suffix(&config, false),
        format.extension()
    ));
    let summary = format!(
        "summary: only_a={} only_b={} folders_only_a={} folders_only_b={} report={}",
        report.bookmarks.only_a.len(),
        report.bookmarks.only_b.len(),
        report.folders.only_a.len(),
        report.folders.only_b.len(),
        path.display()
    );
    write_report(&pipeline, format, &Report::Diff(report), &path).await?;
    finish(pipeline, &stats, printer).await;

    eprintln!("{summary}");
    Ok(())
}

async fn run_compare(
    files: &[PathBuf],
    analysis: Analysis,
    rules: &RuleArgs,
    out: &OutputArgs,
) -> Result<()> {
    let config = rules.resolve(false).await?;
    let (sink, printer) = event_channel(out.emit_events);
    let normalizer = RuleNormalizer;
    let pipeline = Pipeline {
        config: config.clone(),
        forced_format: rules.forced_format(),
        normalizer: &normalizer,
        sink,
    };

    let (report, stats) = pipeline.compare(files, analysis).await?;
    let format = OutputFormat::from(out.format);
    let path = out.report_path(format!(
        "multi_{}_{}{}.{}",
        analysis.as_str(),
        config.key_mode,
        option_suffix(&config, false),
        format.extension()
    ));

    let common = report
        .intersection
        .as_ref()
        .map(|i| i.common_bookmarks.len().to_string())
        .unwrap_or_else(|| "-".to_string());
    let unique = report
        .unique
        .as_ref()
        .map(|u| {
            u.per_source
                .iter()
                .map(|s| s.unique_bookmarks.len())
                .sum::<usize>()
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());
    let summary = format!(
        "summary: inputs={} common_bookmarks={common} unique_bookmarks={unique} report={}",
        files.len(),
        path.display()
    );

    write_report(&pipeline, format, &Report::Compare(report), &path).await?;
    finish(pipeline, &stats, printer).await;

    eprintln!("{summary}");
    Ok(())
}

async fn run_dedup(file: &Path, rules: &RuleArgs, out: &OutputArgs) -> Result<()> {
    let config = rules.resolve(true).await?;
    let (sink, printer) = event_channel(out.emit_events);
    let normalizer = RuleNormalizer;
    let pipeline = Pipeline {
        config: config.clone(),
        forced_format: rules.forced_format(),
        normalizer: &normalizer,
        sink,
    };

    let (outcome, stats) = pipeline.dedup(file).await?;
    let format = OutputFormat::from(out.format);
    let tag = format!("{}{}", config.key_mode, option_suffix(&config, true));
    let report_path = out.report_path(format!(
        "{}_report_{tag}.{}",
        stem(file),
        format.extension()
    ));
    let cleaned_path = out.dir().join(format!("{}_cleaned_{tag}.html", stem(file)));

    let cleaned =
        write_dedup_outputs(&pipeline, &outcome, format, &report_path, &cleaned_path).await?;
    finish(pipeline, &stats, printer).await;

    let r = &outcome.report;
    eprintln!(
        "summary: bookmarks={} remaining={} removed={} groups={} report={}",
        r.total_bookmark_count,
        r.remaining_count,
        r.removed_count,
        r.groups.len(),
        report_path.display()
    );
    if cleaned {
        eprintln!("cleaned: {}", cleaned_path.display());
    } else {
        eprintln!("no duplicates found; cleaned file not written");
    }
    Ok(())
}

async fn run_batch_dedup(
    paths: &[PathBuf],
    batch_mode: BatchModeArg,
    rules: &RuleArgs,
    out: &OutputArgs,
) -> Result<()> {
    let discovery = discover_files(paths, "html").await;
    if discovery.files.is_empty() {
        bail!("no .html files found in the given paths");
    }

    let config = rules.resolve(true).await?;
    let (sink, printer) = event_channel(out.emit_events);
    let normalizer = RuleNormalizer;
    let pipeline = Pipeline {
        config: config.clone(),
        forced_format: rules.forced_format(),
        normalizer: &normalizer,
        sink,
    };

    let (items, mut stats) = pipeline
        .batch_dedup(&discovery.files, batch_mode.modes())
        .await;
    let format = OutputFormat::from(out.format);
    let suffix = option_suffix(&config, true);

    let mut failed = 0usize;
    for item in &items {
        let outcome = match &item.outcome {
            Ok(o) => o,
            Err(e) => {
                failed += 1;
                eprintln!("failed: {} [{}]: {e}", item.path.display(), item.mode);
                continue;
            }
        };
        let dir = out
            .out_dir
            .clone()
            .or_else(|| item.path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let tag = format!("{}{suffix}", item.mode);
        let name = stem(&item.path);
        let report_path = dir.join(format!("{name}_report_{tag}.{}", format.extension()));
        let cleaned_path = dir.join(format!("{name}_cleaned_{tag}.html"));

        if let Err(e) =
            write_dedup_outputs(&pipeline, outcome, format, &report_path, &cleaned_path).await
        {
            failed += 1;
            stats.inputs_failed += 1;
            eprintln!("failed: {} [{}]: {e:#}", item.path.display(), item.mode);
            continue;
        }
        eprintln!(
            "ok: {} [{}] removed={} groups={}",
            item.path.display(),
            item.mode,
            outcome.report.removed_count,
            outcome.report.groups.len()
        );
    }
    finish(pipeline, &stats, printer).await;

    eprintln!(
        "summary: files={} runs={} failed={} duplicates_removed={} skipped_paths={}",
        discovery.files.len(),
        items.len(),
        failed,
        stats.duplicates_removed,
        discovery.skipped.len()
    );
    if failed > 0 {
        bail!("{failed} of {} dedup runs failed", items.len());
    }
    Ok(())
}

async fn run_convert(files: &[PathBuf], output_dir: Option<&Path>, emit_events: bool) -> Result<()> {
    let (sink, printer) = event_channel(emit_events);
    let normalizer = RuleNormalizer;
    let pipeline = Pipeline {
        config: NormalizationConfig::default(),
        forced_format: Some(SourceFormat::JsonTree),
        normalizer: &normalizer,
        sink,
    };

    let mut stats = RunStats::default();
    let mut failed = 0usize;
    for file in files {
        let html = match pipeline.convert(file, &mut stats).await {
            Ok(h) => h,
            Err(e) => {
                failed += 1;
                eprintln!("failed: {}: {e:#}", file.display());
                continue;
            }
        };
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| file.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let target = dir.join(format!("{}.html", stem(file)));
        write_output(&target, &html)
            .await
            .with_context(|| format!("writing converted bookmarks: {}", target.display()))?;
        pipeline.written(&target).await;
        eprintln!("ok: {} -> {}", file.display(), target.display());
    }
    finish(pipeline, &stats, printer).await;

    eprintln!(
        "summary: converted={} failed={failed}",
        files.len() - failed
    );
    if failed > 0 {
        bail!("{failed} of {} conversions failed", files.len());
    }
    Ok(())
}
