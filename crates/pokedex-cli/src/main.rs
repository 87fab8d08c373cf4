// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use pokedex_app::{AppState, Pager};
use pokedex_db::Store;
use runtime::{BattleSettings, StoreRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `pokedex --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    init_logging(&config)?;
    tracing::info!(config = %options.config_path.display(), db = %db_path.display(), demo = options.demo, "starting");

    let mut store = if options.demo {
        Store::open_memory()?
    } else {
        Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, set [storage].db_path or POKEDEX_DB_PATH",
                db_path.display()
            )
        })?
    };
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }

    let catalog = pokedex_api::Client::new(config.catalog_base_url(), config.catalog_timeout()?)
        .with_context(|| {
            format!(
                "invalid [catalog] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
    let battle = BattleSettings {
        capture_chance: config.capture_chance(),
        timing: config.battle_timing()?,
        seed: config.battle_seed(),
    };
    if options.check_only {
        let count = catalog.ping()?;
        println!("ok: catalog at {} lists {count} entries", catalog.base_url());
        return Ok(());
    }

    let mut state = AppState::with_pager(Pager::new(0, config.page_size(), config.total_entries()));
    let mut runtime = StoreRuntime::new(store, catalog, battle);
    let result = pokedex_tui::run_app(&mut state, &mut runtime);
    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "terminal session failed");
    }
    result
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    let file = open_log_file(&path)?;

    let filter = match env::var("POKEDEX_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("POKEDEX_LOG {directives:?} is not a valid filter"))?,
        _ => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("log.level {:?} is not a valid filter", config.log_level()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("pokedex: browse the catalog and keep the ones you catch");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with a seeded in-memory collection");
    println!("  --check                  Validate config + DB and ping the catalog");
    println!("  --help                   Show this help");
    println!();
    println!("Environment: POKEDEX_CONFIG_PATH, POKEDEX_DB_PATH, POKEDEX_LOG");
}
