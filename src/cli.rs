use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Validate data mapping workbooks against destination DDL",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a mapping workbook and write an annotated verdict workbook
    Validate(ValidateArgs),
    /// Parse a DDL file and print the tables and columns it defines
    Ddl(DdlArgs),
    /// Show the detected header row and resolved columns of a mapping sheet
    Headers(HeadersArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Data mapping workbook (.xlsx)
    #[arg(long)]
    pub dmw: PathBuf,
    /// DDL file with CREATE TABLE statements
    #[arg(long)]
    pub ddl: PathBuf,
    /// Output workbook (.xlsx)
    #[arg(short, long)]
    pub out: PathBuf,
    /// Mapping sheet name (defaults to the workbook's active sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Previous version of the mapping workbook, enables Rule6
    #[arg(long = "prev-dmw")]
    pub prev_dmw: Option<PathBuf>,
    /// Previous version of the DDL, enables Rule7
    #[arg(long = "prev-ddl")]
    pub prev_ddl: Option<PathBuf>,
    /// Reference workbook; together with --master-dmw enables Rule5
    #[arg(long = "ref-dmw")]
    pub ref_dmw: Option<PathBuf>,
    /// Master workbook the reference columns must exist in
    #[arg(long = "master-dmw")]
    pub master_dmw: Option<PathBuf>,
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Review the transformation logic of failing rows
    #[arg(long = "enable-advisor")]
    pub enable_advisor: bool,
    /// External advisor program; receives one JSON request per failing row on stdin
    #[arg(long = "advisor-command")]
    pub advisor_command: Option<PathBuf>,
    /// Argument passed to the advisor program (repeatable)
    #[arg(long = "advisor-arg", action = clap::ArgAction::Append, allow_hyphen_values = true)]
    pub advisor_args: Vec<String>,
    /// Seconds to wait for each advisor answer
    #[arg(long = "advisor-timeout")]
    pub advisor_timeout: Option<u64>,
    /// Directory for logic_quality.json, dq_checks_ai.sql and recon_ai.sql
    #[arg(long = "advice-dir")]
    pub advice_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DdlArgs {
    /// DDL file to parse
    #[arg(long)]
    pub ddl: PathBuf,
}

#[derive(Debug, Args)]
pub struct HeadersArgs {
    /// Data mapping workbook (.xlsx)
    #[arg(long)]
    pub dmw: PathBuf,
    /// Sheet to inspect (defaults to the workbook's active sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// YAML configuration file; its header_detection bounds apply
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
