pub mod advisor;
pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod ddl;
pub mod headers;
pub mod io_utils;
pub mod keys;
pub mod mismatch;
pub mod report;
pub mod rules;
pub mod sql_types;
pub mod validate;
pub mod values;
pub mod workbook;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::ValidatorConfig,
    headers::{DmwColumns, HeaderIndex, detect_header_row},
    workbook::Workbook,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dmw_validator", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => validate::execute(&args),
        Commands::Ddl(args) => handle_ddl(&args),
        Commands::Headers(args) => handle_headers(&args),
    }
}

fn handle_ddl(args: &cli::DdlArgs) -> Result<()> {
    let schema =
        ddl::load_ddl(&args.ddl).with_context(|| format!("Loading DDL from {:?}", args.ddl))?;
    print!("{}", report::render_schema(&schema));
    Ok(())
}

fn handle_headers(args: &cli::HeadersArgs) -> Result<()> {
    let book = Workbook::open(&args.dmw)
        .with_context(|| format!("Loading mapping workbook {:?}", args.dmw))?;
    let sheet = book.main_sheet(args.sheet.as_deref())?;
    let detection = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?
            .header_detection,
        None => ValidatorConfig::default().header_detection,
    };
    let header_row = detect_header_row(&sheet.rows, &detection);
    let index = HeaderIndex::build(&sheet.row_values(header_row));
    let columns = DmwColumns::resolve(&index);
    info!("Inspecting sheet '{}'", sheet.name);
    print!("{}", report::render_headers(header_row, &index, &columns));
    Ok(())
}
