#![forbid(unsafe_code)]

use std::env;
use std::io::{self, Write};

use sammy_kernel_contracts::list::SessionContext;
use sammy_os::{ListDispatch, ListDispatchConfig, MemoryListService};
use sammy_tools::sammy_cli::{
    build_runtime, load_catalog, load_table, parse_args, resolve_synonyms_path, run_chat,
    run_parse, Command, SYNONYMS_PATH_ENV,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    let synonyms = resolve_synonyms_path(cli.synonyms, env::var_os(SYNONYMS_PATH_ENV));
    let table = load_table(synonyms.as_deref())?;

    match cli.command {
        Command::DumpSynonyms => {
            let json = table
                .to_json_pretty()
                .map_err(|e| format!("failed to export synonyms: {e}"))?;
            println!("{json}");
            Ok(())
        }
        Command::Parse => {
            let runtime = build_runtime(table)?;
            run_parse(&runtime, io::stdin().lock(), io::stdout().lock())
        }
        Command::Chat => {
            let user = cli
                .user
                .ok_or_else(|| "usage: sammy chat requires --user <name>".to_string())?;
            let ctx = SessionContext::v1(user).map_err(|e| format!("invalid user: {e}"))?;
            let catalog = match cli.catalog {
                Some(path) => load_catalog(&path)?,
                None => Vec::new(),
            };
            let runtime = build_runtime(table)?;
            let dispatch = ListDispatch::new(
                ListDispatchConfig::mvp_v1(),
                &runtime,
                MemoryListService::new(catalog),
            )
            .map_err(|e| format!("invalid dispatch config: {e}"))?;
            let mut stdout = io::stdout().lock();
            run_chat(&dispatch, &ctx, io::stdin().lock(), &mut stdout)?;
            stdout.flush().map_err(|e| e.to_string())
        }
    }
}
