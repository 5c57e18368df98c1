use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_outline::{ItemKind, LineIndex, Node, OutlineConfig, Reference, Workspace};
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Write `text` exactly, without a trailing newline
fn print_raw(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_stdout(text: &str) -> Result<()> {
    print_raw(&format!("{text}\n"))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "context-outline")]
#[command(about = "Read and edit source files by structural reference", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root; references are relative to it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files of the workspace and their detected family
    Files,

    /// Show the outline below a reference (`path` or `path::name::...`)
    Outline(ReferenceArgs),

    /// Print the text of a reference
    Get(ReferenceArgs),

    /// Replace the text of a reference
    Write(WriteArgs),

    /// Append an item to a file, or create a file with `--kind file`
    Add(AddArgs),

    /// List Python files without any test
    Untested,
}

#[derive(Args)]
struct ReferenceArgs {
    /// Reference: path(::name)*
    reference: String,
}

#[derive(Args)]
struct WriteArgs {
    /// Reference: path(::name)*
    reference: String,

    /// Replacement text (read from stdin when omitted)
    #[arg(long)]
    content: Option<String>,
}

#[derive(Args)]
struct AddArgs {
    /// Parent reference; for `--kind file` the directory to create the file in
    parent: String,

    /// Item kind: file, class, function, method or test
    #[arg(long)]
    kind: ItemKind,

    /// Name of the new item (file name for `--kind file`)
    #[arg(long)]
    name: String,

    /// Content to add (read from stdin when omitted)
    #[arg(long)]
    content: Option<String>,
}

#[derive(Serialize)]
struct FileEntry<'a> {
    path: &'a str,
    language: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_failure: Option<String>,
}

#[derive(Serialize)]
struct OutlineOutput<'a> {
    reference: String,
    language: &'static str,
    outline: &'a Node,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || cli.json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = match &cli.config {
        Some(path) => OutlineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OutlineConfig::default(),
    };
    let root = cli.root.canonicalize().context("Invalid workspace root")?;
    let output = Output {
        json: cli.json,
        pretty: cli.pretty,
    };

    match cli.command {
        Commands::Files => run_files(&root, config, output),
        Commands::Outline(args) => run_outline(&root, config, &args, output),
        Commands::Get(args) => run_get(&root, config, &args, output),
        Commands::Write(args) => run_write(&root, config, args, output),
        Commands::Add(args) => run_add(&root, config, args, output),
        Commands::Untested => run_untested(&root, config, output),
    }
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
    pretty: bool,
}

fn parse_reference(raw: &str) -> Result<Reference> {
    Reference::parse(raw).with_context(|| format!("Invalid reference '{raw}'"))
}

fn read_content(content: Option<String>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read content from stdin")?;
    Ok(buf)
}

fn run_files(root: &Path, config: OutlineConfig, output: Output) -> Result<()> {
    let workspace = Workspace::open(root, config)?;
    let entries: Vec<FileEntry<'_>> = workspace
        .files()
        .filter_map(|rel| {
            let handler = workspace.handler(rel)?;
            Some(FileEntry {
                path: rel,
                language: handler.language().as_str(),
                parse_failure: handler.parse_failure().map(ToString::to_string),
            })
        })
        .collect();

    if output.json {
        return print_json(&entries, output.pretty);
    }
    for entry in &entries {
        match &entry.parse_failure {
            Some(failure) => print_stdout(&format!(
                "{}\t{}\t({failure})",
                entry.path, entry.language
            ))?,
            None => print_stdout(&format!("{}\t{}", entry.path, entry.language))?,
        }
    }
    Ok(())
}

fn run_outline(
    root: &Path,
    config: OutlineConfig,
    args: &ReferenceArgs,
    output: Output,
) -> Result<()> {
    let reference = parse_reference(&args.reference)?;
    let workspace = Workspace::open(root, config)?;
    let node = workspace.outline(&reference)?;
    let handler = workspace
        .handler(reference.path())
        .with_context(|| format!("{} is not open", reference.path()))?;

    if output.json {
        return print_json(
            &OutlineOutput {
                reference: reference.to_string(),
                language: handler.language().as_str(),
                outline: node,
            },
            output.pretty,
        );
    }

    let lines = LineIndex::new(handler.text());
    for (depth, item) in node.walk() {
        let start = lines.line_of(item.span.start);
        let end = lines.line_of(item.span.end.saturating_sub(1).max(item.span.start));
        let marker = if item.is_test { " [test]" } else { "" };
        print_stdout(&format!(
            "{}{} ({}) L{start}-{end}{marker}",
            "  ".repeat(depth),
            item.name,
            item.kind.as_str()
        ))?;
    }
    Ok(())
}

fn run_get(root: &Path, config: OutlineConfig, args: &ReferenceArgs, output: Output) -> Result<()> {
    let reference = parse_reference(&args.reference)?;
    let workspace = Workspace::open(root, config)?;
    let content = workspace.get(&reference)?;

    if output.json {
        return print_json(&serde_json::json!({ "content": content }), output.pretty);
    }
    print_raw(content)
}

fn run_write(root: &Path, config: OutlineConfig, args: WriteArgs, output: Output) -> Result<()> {
    let reference = parse_reference(&args.reference)?;
    let content = read_content(args.content)?;
    let mut workspace = Workspace::open(root, config)?;
    workspace.write(&reference, &content)?;

    if output.json {
        return print_json(
            &serde_json::json!({ "written": reference.to_string() }),
            output.pretty,
        );
    }
    log::info!("Wrote {reference} under {}", workspace.root().display());
    Ok(())
}

fn run_add(root: &Path, config: OutlineConfig, args: AddArgs, output: Output) -> Result<()> {
    let parent = parse_reference(&args.parent)?;
    let content = read_content(args.content)?;
    let mut workspace = Workspace::open(root, config)?;
    let file = workspace.add(&parent, args.kind, &args.name, &content)?;

    if output.json {
        return print_json(
            &serde_json::json!({ "added": args.name, "kind": args.kind, "file": file }),
            output.pretty,
        );
    }
    log::info!("Added {} '{}' to {file}", args.kind, args.name);
    Ok(())
}

fn run_untested(root: &Path, config: OutlineConfig, output: Output) -> Result<()> {
    let workspace = Workspace::open(root, config)?;
    let untested = workspace.untested_files();

    if output.json {
        return print_json(&untested, output.pretty);
    }
    for rel in untested {
        print_stdout(rel)?;
    }
    Ok(())
}
