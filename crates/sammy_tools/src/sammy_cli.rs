#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use sammy_engines::{QueryParseConfig, QueryParseRuntime, SynonymTable};
use sammy_kernel_contracts::list::{ListEntry, SessionContext};
use sammy_kernel_contracts::query::ParsedQuery;
use sammy_os::{DispatchOutcome, ListDispatch, ListService, QueryEngine};

pub const USAGE: &str =
    "usage: sammy [--synonyms <path>] [--user <name>] [--catalog <path>] [parse|chat|dump-synonyms]";

pub const SYNONYMS_PATH_ENV: &str = "SAMMY_SYNONYMS_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Parse,
    Chat,
    DumpSynonyms,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub synonyms: Option<PathBuf>,
    pub user: Option<String>,
    pub catalog: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut out = CliArgs {
        command: Command::Parse,
        synonyms: None,
        user: None,
        catalog: None,
    };
    let mut command = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| format!("missing value for {flag}. {USAGE}"))
        };
        match arg.as_str() {
            "--synonyms" => out.synonyms = Some(PathBuf::from(value("--synonyms")?)),
            "--user" => out.user = Some(value("--user")?),
            "--catalog" => out.catalog = Some(PathBuf::from(value("--catalog")?)),
            "parse" | "chat" | "dump-synonyms" if command.is_none() => {
                command = Some(match arg.as_str() {
                    "chat" => Command::Chat,
                    "dump-synonyms" => Command::DumpSynonyms,
                    _ => Command::Parse,
                });
            }
            other => return Err(format!("unexpected argument '{other}'. {USAGE}")),
        }
    }
    out.command = command.unwrap_or(Command::Parse);
    Ok(out)
}

/// The `--synonyms` flag wins over the environment; neither means built-in.
pub fn resolve_synonyms_path(flag: Option<PathBuf>, env: Option<OsString>) -> Option<PathBuf> {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
}

pub fn load_table(path: Option<&Path>) -> Result<SynonymTable, String> {
    match path {
        Some(path) => {
            let table = SynonymTable::load(path)
                .map_err(|e| format!("failed to load synonyms from {}: {e}", path.display()))?;
            log::info!("loaded synonym table from {}", path.display());
            Ok(table)
        }
        None => {
            log::debug!("using built-in synonym table");
            Ok(SynonymTable::builtin())
        }
    }
}

pub fn build_runtime(table: SynonymTable) -> Result<QueryParseRuntime, String> {
    QueryParseRuntime::new(QueryParseConfig::mvp_v1(), table)
        .map_err(|e| format!("failed to build query parser: {e}"))
}

pub fn load_catalog(path: &Path) -> Result<Vec<ListEntry>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read catalog {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse catalog {}: {e}", path.display()))
}

#[derive(Debug, Serialize)]
struct ParseLine<'a> {
    reason_code: u32,
    query: &'a ParsedQuery,
}

/// One JSON line per parsed query. Returns `true` once the user asked to exit.
pub fn parse_line(runtime: &QueryParseRuntime, line: &str) -> Result<(String, bool), String> {
    let out = runtime.process_traced(line);
    let json = serde_json::to_string(&ParseLine {
        reason_code: out.reason_code.0,
        query: &out.query,
    })
    .map_err(|e| format!("failed to encode parsed query: {e}"))?;
    Ok((json, out.query.is_exit()))
}

pub fn run_parse<R, W>(runtime: &QueryParseRuntime, input: R, mut output: W) -> Result<(), String>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.map_err(|e| format!("failed to read input: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let (json, exit) = parse_line(runtime, &line)?;
        writeln!(output, "{json}").map_err(|e| format!("failed to write output: {e}"))?;
        if exit {
            break;
        }
    }
    Ok(())
}

pub fn run_chat<E, S, R, W>(
    dispatch: &ListDispatch<E, S>,
    ctx: &SessionContext,
    input: R,
    mut output: W,
) -> Result<(), String>
where
    E: QueryEngine,
    S: ListService,
    R: BufRead,
    W: Write,
{
    let write_err = |e: std::io::Error| format!("failed to write output: {e}");
    writeln!(output, "Sammy> What can I do for you today?").map_err(write_err)?;
    for line in input.lines() {
        let line = line.map_err(|e| format!("failed to read input: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        match dispatch.run_turn(ctx, &line) {
            DispatchOutcome::Exit => break,
            DispatchOutcome::Reply(replies) => {
                for reply in replies {
                    writeln!(output, "Sammy> {reply}").map_err(write_err)?;
                }
            }
        }
    }
    writeln!(output, "Sammy> Bye bye!").map_err(write_err)?;
    Ok(())
}
