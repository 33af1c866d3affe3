//! Command-line interface for webpreview.
//!
//! Builds a single sandbox-ready HTML document either from a project directory or from
//! separate HTML, CSS and JS files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use webpreview::{
    BinaryDetection, LoaderBuilder, LoaderOptions, PreviewDocument, PreviewOptions,
    ProjectProcessor, generate_preview_with, load_project, output,
};

/// webpreview: bundle web code into one previewable HTML file
#[derive(Parser)]
#[command(name = "webpreview", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a project directory into one HTML document
    Project(ProjectArgs),
    /// Build a document from separate HTML, CSS and JS files
    Inline(InlineArgs),
    /// List the files a project directory would contribute
    Files(FilesArgs),
}

#[derive(Args)]
struct WalkArgs {
    /// Project root directory (default current dir)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Binary detection strategy for files without a known binary type
    #[arg(long, default_value = "simple", value_parser = parse_binary_detection)]
    binary_detection: BinaryDetection,

    /// Max depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Ignore patterns (can be repeated)
    #[arg(short = 'I', long = "ignore")]
    ignore_patterns: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    file_size_limit: Option<u64>,

    /// Include hidden files
    #[arg(long)]
    hidden: bool,

    /// Follow symlinks
    #[arg(long)]
    follow_links: bool,

    /// Disable .gitignore handling
    #[arg(long)]
    no_gitignore: bool,

    /// Keep files of any extension, not only web files
    #[arg(long)]
    all_files: bool,
}

#[derive(Args)]
struct EmitArgs {
    /// Output file (default preview.html, `-` for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a data: URL instead of the document
    #[arg(long)]
    data_url: bool,
}

#[derive(Args)]
struct ProjectArgs {
    #[command(flatten)]
    walk: WalkArgs,

    #[command(flatten)]
    emit: EmitArgs,

    /// Print processing statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Statistics format
    #[arg(long, value_enum, default_value_t = StatsFormat::Text)]
    stats_format: StatsFormat,

    /// Exit with an error if any stylesheet, script or module is missing
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct InlineArgs {
    /// HTML file (`-` for stdin)
    #[arg(long)]
    html: Option<PathBuf>,

    /// CSS file
    #[arg(long)]
    css: Option<PathBuf>,

    /// JavaScript file
    #[arg(long)]
    js: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    #[command(flatten)]
    emit: EmitArgs,
}

#[derive(Args)]
struct FilesArgs {
    #[command(flatten)]
    walk: WalkArgs,

    /// Pretty JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Print paths only
    #[arg(long)]
    paths: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StatsFormat {
    Text,
    Json,
}

/// Parse string into BinaryDetection enum.
fn parse_binary_detection(s: &str) -> Result<BinaryDetection, String> {
    match s {
        "simple" => Ok(BinaryDetection::Simple),
        "accurate" => Ok(BinaryDetection::Accurate),
        "none" => Ok(BinaryDetection::None),
        _ => Err(format!("invalid binary detection method: {}", s)),
    }
}

impl WalkArgs {
    fn into_options(self) -> LoaderOptions {
        let builder = LoaderBuilder::new(self.root)
            .respect_gitignore(!self.no_gitignore)
            .include_hidden(self.hidden)
            .follow_links(self.follow_links)
            .ignore_patterns(self.ignore_patterns)
            .file_size_limit(self.file_size_limit)
            .binary_detection(self.binary_detection)
            .web_files_only(!self.all_files);

        let builder = if let Some(depth) = self.max_depth {
            builder.max_depth(depth)
        } else {
            builder.no_limit_depth()
        };
        builder.build()
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Project(args) => run_project(args),
        Command::Inline(args) => run_inline(args),
        Command::Files(args) => run_files(args),
    }
}

#[cfg(feature = "logging")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(not(feature = "logging"))]
fn init_logging() {}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    exit(1);
}

fn run_project(args: ProjectArgs) {
    let options = args.walk.into_options();
    let files = load_project(&options).unwrap_or_else(|e| fail(e));
    if files.is_empty() {
        fail("No valid files found. Add HTML, CSS, JS, or image files to the project.");
    }

    let outcome = ProjectProcessor::new(&files)
        .process_with_report()
        .unwrap_or_else(|e| fail(e));

    for missing in &outcome.diagnostics.missing {
        eprintln!("warning: missing {:?}: {}", missing.kind, missing.reference);
    }
    for bindings in &outcome.diagnostics.discarded_bindings {
        eprintln!("warning: import bindings not connected: {}", bindings);
    }
    if args.stats {
        let format = match args.stats_format {
            StatsFormat::Text => output::OutputFormat::Text,
            StatsFormat::Json => output::OutputFormat::Json,
        };
        eprint!("Entry: {}\n{}", outcome.entry, output::format_stats(&outcome.stats, format, true));
        if format == output::OutputFormat::Json {
            eprintln!();
        }
    }

    emit(&outcome.document, &args.emit);
    if args.strict && !outcome.diagnostics.is_clean() {
        exit(2);
    }
}

fn run_inline(args: InlineArgs) {
    let html = read_input(args.html.as_deref());
    let css = read_input(args.css.as_deref());
    let js = read_input(args.js.as_deref());

    let mut options = PreviewOptions::default();
    if let Some(title) = args.title {
        options.title = title;
    }
    let document = PreviewDocument::new(generate_preview_with(&options, &html, &css, &js));
    emit(&document, &args.emit);
}

fn run_files(args: FilesArgs) {
    let options = args.walk.into_options();
    let files = load_project(&options).unwrap_or_else(|e| fail(e));
    if args.paths {
        for path in files.paths() {
            println!("{}", path);
        }
        return;
    }
    let json = if args.pretty {
        serde_json::to_string_pretty(&files)
    } else {
        serde_json::to_string(&files)
    }
    .unwrap_or_else(|e| fail(format!("JSON serialization error: {}", e)));
    println!("{}", json);
}

fn read_input(path: Option<&Path>) -> String {
    match path {
        None => String::new(),
        Some(p) if p == Path::new("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| fail(format!("Failed to read stdin: {}", e)));
            buf
        }
        Some(p) => fs::read_to_string(p)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", p.display(), e))),
    }
}

fn emit(document: &PreviewDocument, args: &EmitArgs) {
    if args.data_url {
        println!("{}", output::to_data_url(document));
        return;
    }
    match args.output.as_deref() {
        Some(p) if p == Path::new("-") => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if handle.write_all(document.as_str().as_bytes()).is_err() {
                fail("Failed to write to stdout");
            }
        }
        Some(p) => output::write_document(document, p).unwrap_or_else(|e| fail(e)),
        None => output::write_document(document, output::DEFAULT_FILENAME)
            .unwrap_or_else(|e| fail(e)),
    }
}
