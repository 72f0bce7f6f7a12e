use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use folio_content::{DiffOptions, Granularity};
use folio_server::{init_tracing, render_diff, serve, DiffOutput, FolioConfig, BIND_ENV};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("folio-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Event-sourced document history server")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .short('b')
                        .help("Listen address, overrides the config file and FOLIO_BIND"),
                )
                .arg(
                    Arg::new("log-json")
                        .long("log-json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Diff two text files")
                .arg(
                    Arg::new("from")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("to")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("chars")
                        .value_parser(value_parser!(Granularity))
                        .help("chars, words or lines"),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .action(ArgAction::SetTrue)
                        .help("Render HTML instead of JSON"),
                )
                .arg(
                    Arg::new("ignore-whitespace")
                        .long("ignore-whitespace")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

fn load_config(matches: &ArgMatches) -> Result<FolioConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => {
            let mut config = FolioConfig::new();
            config.apply_env(std::env::var(BIND_ENV).ok());
            config.validate()?;
            Ok(config)
        }
    }
}

fn run_diff(args: &ArgMatches) -> Result<()> {
    let read = |name: &str| -> Result<String> {
        let path = args
            .get_one::<PathBuf>(name)
            .context("missing file argument")?;
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    };
    let (source, target) = (read("from")?, read("to")?);

    let granularity = args
        .get_one::<Granularity>("type")
        .copied()
        .unwrap_or_default();
    let options = DiffOptions::new()
        .with_granularity(granularity)
        .ignoring_whitespace(args.get_flag("ignore-whitespace"));
    let output = if args.get_flag("html") {
        DiffOutput::Html
    } else {
        DiffOutput::Json
    };
    println!("{}", render_diff(&source, &target, options, output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let mut config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("diff", args)) => run_diff(args),
        Some(("config", _)) => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Some(("serve", args)) => {
            if let Some(bind) = args.get_one::<String>("bind") {
                config = config.with_bind(bind.clone());
                config.validate()?;
            }
            if args.get_flag("log-json") {
                config = config.with_log_json(true);
            }
            init_tracing(&config.server);
            serve(config).await?;
            Ok(())
        }
        _ => {
            init_tracing(&config.server);
            serve(config).await?;
            Ok(())
        }
    }
}
