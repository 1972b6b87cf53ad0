//! Purpose: `graphstore` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable JSON on stdout; errors are JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{
    error::ErrorKind as ClapErrorKind, Args, CommandFactory, Parser, Subcommand, ValueHint,
};
use clap_complete::aot::Shell;
use serde_json::json;

mod command_dispatch;
mod serve;
mod store_paths;

use graphstore::api::{
    decode, encode, parse_value, to_exit_code, Error, ErrorKind, LocalClient, RemoteClient,
};
use store_paths::default_data_dir;

const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run with --help for usage."));
            }
        },
    };

    let data_dir = cli.dir.unwrap_or_else(default_data_dir);

    command_dispatch::dispatch_command(cli.command, data_dir)
        .map_err(add_io_hint)
        .map_err(add_corrupt_hint)
        .map_err(add_internal_hint)
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

#[derive(Parser)]
#[command(
    name = "graphstore",
    version,
    about = "Validate and store directed weighted graphs as JSON",
    after_help = r#"EXAMPLES
  $ graphstore store graph.json
  $ cat graph.json | graphstore store
  $ graphstore get 8a6f0f3e-2f1c-4b62-9c41-d5a8f0b3c7e1
  $ graphstore check 8a6f0f3e-2f1c-4b62-9c41-d5a8f0b3c7e1 v1
  $ graphstore validate graph.json --max-edges 100
  $ graphstore serve --bind 127.0.0.1:9800"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "Data directory for stored graphs (default: ~/.graphstore)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Validate a graph document and store it",
        long_about = r#"Read a graph JSON document, validate it, and store it under a generated id.

Reads from a file argument, or from stdin when no file is given (use - for stdin)."#,
        after_help = r#"EXAMPLES
  $ graphstore store graph.json
  $ cat graph.json | graphstore store
  $ graphstore store graph.json --max-edges 100
  $ graphstore store graph.json --url http://127.0.0.1:9800"#
    )]
    Store {
        #[arg(help = "Graph JSON file (use - or omit for stdin)", value_hint = ValueHint::FilePath)]
        file: Option<String>,
        #[arg(long, help = "Reject graphs with more edges than this (0 = unlimited)")]
        max_edges: Option<u64>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    #[command(
        arg_required_else_help = true,
        about = "Fetch a stored graph by id",
        after_help = r#"EXAMPLES
  $ graphstore get 8a6f0f3e-2f1c-4b62-9c41-d5a8f0b3c7e1
  $ graphstore get 8a6f0f3e-2f1c-4b62-9c41-d5a8f0b3c7e1 | jq '.edges'"#
    )]
    Get {
        #[arg(help = "Graph id")]
        id: String,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    #[command(
        arg_required_else_help = true,
        about = "Check whether a stored graph contains a vertex",
        after_help = r#"EXAMPLES
  $ graphstore check 8a6f0f3e-2f1c-4b62-9c41-d5a8f0b3c7e1 v1"#
    )]
    Check {
        #[arg(help = "Graph id")]
        id: String,
        #[arg(help = "Vertex name")]
        vertex: String,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    #[command(
        about = "Validate a graph document without storing it",
        after_help = r#"EXAMPLES
  $ graphstore validate graph.json
  $ cat graph.json | graphstore validate --max-edges 100"#
    )]
    Validate {
        #[arg(help = "Graph JSON file (use - or omit for stdin)", value_hint = ValueHint::FilePath)]
        file: Option<String>,
        #[arg(long, help = "Reject graphs with more edges than this (0 = unlimited)")]
        max_edges: Option<u64>,
    },
    #[command(
        about = "Serve the graph store over HTTP (loopback by default)",
        after_help = r#"EXAMPLES
  $ graphstore serve
  $ graphstore serve --bind 127.0.0.1:9801 --token devtoken
  $ graphstore serve --bind 0.0.0.0:9800 --allow-non-loopback --token devtoken

NOTES
  - Loopback is the default; non-loopback binds require --allow-non-loopback and --token
  - Use Authorization: Bearer <token> when --token is set"#
    )]
    Serve(ServeRunArgs),
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ graphstore completion bash > ~/.local/share/bash-completion/completions/graphstore
  $ graphstore completion zsh > ~/.zfunc/_graphstore"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Args)]
struct RemoteArgs {
    #[arg(
        long,
        help = "Base URL of a graphstore server (operate remotely instead of on --dir)",
        help_heading = "Remote"
    )]
    url: Option<String>,
    #[arg(
        long,
        help = "Bearer token for the remote server",
        help_heading = "Remote"
    )]
    token: Option<String>,
}

#[derive(Args)]
struct ServeRunArgs {
    #[arg(long, default_value = "127.0.0.1:9800", help = "Bind address")]
    bind: String,
    #[arg(
        long,
        help = "Reject stored graphs with more edges than this (0 = unlimited)"
    )]
    max_edges: Option<u64>,
    #[arg(long, help = "Require Authorization: Bearer <token> on all routes")]
    token: Option<String>,
    #[arg(long, help = "Allow non-loopback binds (requires --token)")]
    allow_non_loopback: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BODY_BYTES,
        help = "Max request body size in bytes"
    )]
    max_body_bytes: u64,
}

// `--max-edges 0` means unlimited so scripts can pass a single flag either way.
fn edge_limit(max_edges: Option<u64>) -> Option<u64> {
    match max_edges {
        Some(0) | None => None,
        Some(limit) => Some(limit),
    }
}

fn read_payload(file: Option<&str>) -> Result<Vec<u8>, Error> {
    match file {
        Some("-") | None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(buffer)
        }
        Some(path) => std::fs::read(path).map_err(|err| {
            let kind = match err.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => ErrorKind::Permission,
                _ => ErrorKind::Io,
            };
            Error::new(kind)
                .with_message("failed to read graph file")
                .with_path(path)
                .with_source(err)
        }),
    }
}

fn remote_client(args: &RemoteArgs) -> Result<Option<RemoteClient>, Error> {
    let Some(url) = args.url.as_deref() else {
        return Ok(None);
    };
    let mut client = RemoteClient::new(url)?;
    if let Some(token) = args.token.as_deref() {
        client = client.with_token(token);
    }
    Ok(Some(client))
}

fn emit_json(payload: serde_json::Value) {
    println!("{payload}");
}

fn emit_error(err: &Error) {
    let mut body = serde_json::Map::new();
    body.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    body.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("error")),
    );
    if let Some(id) = err.id() {
        body.insert("id".to_string(), json!(id));
    }
    if let Some(path) = err.path() {
        body.insert("path".to_string(), json!(path.to_string_lossy()));
    }
    if let Some(hint) = err.hint() {
        body.insert("hint".to_string(), json!(hint));
    }
    eprintln!("{}", json!({ "error": body }));
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => err.with_hint(
            "Permission denied. Check directory permissions or use --dir to a writable location.",
        ),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint("Stored graph appears corrupt. Store it again or inspect the data directory.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}
