//! The validation pipeline.
//!
//! [`validate`] is a pure function of already-loaded inputs: it resolves the
//! mapping sheet's header, classifies and evaluates every row once, runs the
//! set comparisons and finalizes the rows in a second pass. [`execute`] is the
//! `validate` subcommand around it: loading, the optional advisory pass and
//! the single write of the output workbook.

use std::{
    collections::BTreeSet,
    path::Path,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, info};

use crate::{
    advisor::{self, Advice, AdviceRequest, LogicAdvisor},
    aggregate::{self, CANCELLED_REMARK, FinalRow, Findings, RowLayout, RowRecord},
    classify::{RowKind, classify_row},
    cli::ValidateArgs,
    config::ValidatorConfig,
    ddl::{self, TableSchema},
    headers::{DmwColumns, DmwField, HeaderIndex, detect_header_row},
    keys::{DestDef, DestKey, DestinationCatalog},
    report,
    rules::{
        Rule, Verdict, Verdicts, change_tracking, ddl_alignment, drift, mapping, reference,
        table_details,
    },
    values::{non_null, normalize_table},
    workbook::{CellData, Workbook},
    writer,
};

/// Everything a run reads, already loaded.
#[derive(Debug, Clone, Default)]
pub struct ValidationInputs {
    pub dmw: Workbook,
    pub sheet: Option<String>,
    pub ddl: TableSchema,
    pub prev_dmw: Option<Workbook>,
    pub prev_ddl: Option<TableSchema>,
    pub reference: Option<Workbook>,
    pub master: Option<Workbook>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: String,
    pub pass: usize,
    pub fail: usize,
    pub not_applicable: usize,
}

impl SummaryLine {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            pass: 0,
            fail: 0,
            not_applicable: 0,
        }
    }

    fn count(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Fail => self.fail += 1,
            Verdict::NotApplicable => self.not_applicable += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.not_applicable
    }
}

/// Per-rule verdict counts plus the overall status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryStats {
    pub lines: Vec<SummaryLine>,
}

impl SummaryStats {
    pub fn from_rows(rows: &[FinalRow]) -> Self {
        let mut lines: Vec<SummaryLine> = Rule::ALL
            .iter()
            .map(|rule| SummaryLine::new(rule.column_name()))
            .collect();
        let mut status = SummaryLine::new("Validation_Status");
        for row in rows {
            for (line, (_, verdict)) in lines.iter_mut().zip(row.verdicts.iter()) {
                line.count(verdict);
            }
            status.count(row.status);
        }
        lines.push(status);
        Self { lines }
    }

    pub fn status(&self) -> Option<&SummaryLine> {
        self.lines.last()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<FinalRow>,
    pub findings: Findings,
    pub summary: SummaryStats,
    pub generated_at: DateTime<Local>,
}

impl ValidationReport {
    pub fn failed_rows(&self) -> impl Iterator<Item = &FinalRow> {
        self.rows.iter().filter(|row| row.status == Verdict::Fail)
    }
}

pub fn validate(inputs: &ValidationInputs, config: &ValidatorConfig) -> Result<ValidationReport> {
    let sheet = inputs.dmw.main_sheet(inputs.sheet.as_deref())?;
    let header_row = detect_header_row(&sheet.rows, &config.header_detection);
    let index = HeaderIndex::build(&sheet.row_values(header_row));
    let columns = DmwColumns::resolve(&index);
    info!(
        "Validating sheet '{}' (header on row {}, {} column(s))",
        sheet.name,
        header_row + 1,
        index.len()
    );
    for (field, position) in columns.resolved() {
        match position {
            Some(idx) => debug!("{} -> column {} '{}'", field.label(), idx + 1, index.columns()[idx]),
            None => debug!("{} column not found; its checks are skipped", field.label()),
        }
    }

    let mut catalog = DestinationCatalog::default();
    let mut records = Vec::new();
    for (offset, row) in sheet.rows.iter().enumerate().skip(header_row + 1) {
        let kind = classify_row(&columns, row);
        if kind == RowKind::Empty {
            continue;
        }
        records.push(first_pass(offset + 1, row, kind, &columns, index.len(), &mut catalog));
    }
    debug!(
        "First pass: {} row(s), {} destination key(s)",
        records.len(),
        catalog.keys.len()
    );

    let findings = collect_findings(inputs, config, &sheet.name, &records, &catalog)?;
    let layout = RowLayout {
        width: index.len(),
        dest_table: columns.get(DmwField::DestTable),
        dest_column: columns.get(DmwField::DestColumn),
    };
    let rows = aggregate::finalize_rows(records, &findings, &layout, config);
    let summary = SummaryStats::from_rows(&rows);
    if let Some(status) = summary.status() {
        info!(
            "{} row(s) validated: {} PASS / {} FAIL / {} N/A",
            status.total(),
            status.pass,
            status.fail,
            status.not_applicable
        );
    }

    Ok(ValidationReport {
        sheet_name: format!("{}{}", sheet.name, config.output_sheet_suffix),
        headers: index.columns().to_vec(),
        rows,
        findings,
        summary,
        generated_at: Local::now(),
    })
}

fn first_pass(
    sheet_row: usize,
    row: &[CellData],
    kind: RowKind,
    columns: &DmwColumns,
    width: usize,
    catalog: &mut DestinationCatalog,
) -> RowRecord {
    let cells = (0..width)
        .map(|idx| row.get(idx).map(|cell| cell.value.clone()).unwrap_or_default())
        .collect();
    let key = DestKey::from_row(columns, row);
    let mut record = RowRecord {
        sheet_row,
        cells,
        kind,
        table: non_null(columns.value(DmwField::DestTable, row)).map(normalize_table),
        key: key.clone(),
        logic: columns.value(DmwField::Transformation, row).to_string(),
        verdicts: Verdicts::all(Verdict::Pass),
        remarks: Vec::new(),
    };

    match kind {
        RowKind::Cancelled => {
            record.verdicts = Verdicts::all(Verdict::NotApplicable);
            record.remarks.push(CANCELLED_REMARK.to_string());
        }
        RowKind::Helper | RowKind::Empty => {
            record.verdicts = Verdicts::all(Verdict::NotApplicable);
        }
        RowKind::DestinationOnlySkip | RowKind::Active => {
            for (rule, outcome) in [
                (Rule::Mapping, mapping::evaluate(columns, row)),
                (Rule::ChangeTracking, change_tracking::evaluate(columns, row)),
            ] {
                record.verdicts.set(rule, outcome.verdict);
                record.remarks.extend(outcome.remark);
            }
            if kind == RowKind::DestinationOnlySkip {
                record.verdicts.set(Rule::DdlAlignment, Verdict::NotApplicable);
            } else if let Some(key) = key {
                catalog.record(key, DestDef::from_row(columns, row));
            }
        }
    }
    record
}

fn collect_findings(
    inputs: &ValidationInputs,
    config: &ValidatorConfig,
    sheet_name: &str,
    records: &[RowRecord],
    catalog: &DestinationCatalog,
) -> Result<Findings> {
    let detection = &config.header_detection;

    let table_details = match inputs.dmw.sheet(&config.table_details_sheet) {
        Some(details_sheet) => {
            let baseline: BTreeSet<String> = records
                .iter()
                .filter(|record| !record.kind.is_excluded())
                .filter_map(|record| record.table.clone())
                .collect();
            let listed = table_details::listed_tables(details_sheet, detection);
            Some(table_details::check(&baseline, &listed))
        }
        None => {
            info!(
                "No '{}' sheet; Rule3 skipped",
                config.table_details_sheet
            );
            None
        }
    };

    let alignment = ddl_alignment::check(&inputs.ddl, catalog);

    let reference = match (&inputs.reference, &inputs.master) {
        (Some(reference_book), Some(master_book)) => {
            let reference_keys = DestinationCatalog::from_sheet(reference_book.main_sheet(None)?, detection);
            let master_keys = DestinationCatalog::from_sheet(master_book.main_sheet(None)?, detection);
            Some(reference::check(&reference_keys.keys, &master_keys.keys))
        }
        (None, None) => None,
        _ => {
            info!("Rule5 needs both a reference and a master workbook; skipped");
            None
        }
    };

    let workbook_drift = match &inputs.prev_dmw {
        Some(previous_book) => {
            let previous_sheet = match previous_book.sheet(sheet_name) {
                Some(sheet) => sheet,
                None => previous_book.main_sheet(None)?,
            };
            let previous = DestinationCatalog::from_sheet(previous_sheet, detection);
            Some(drift::diff_workbooks(&previous, catalog))
        }
        None => None,
    };

    let ddl_drift = inputs
        .prev_ddl
        .as_ref()
        .map(|previous| drift::diff_ddl(previous, &inputs.ddl));

    Ok(Findings {
        table_details,
        alignment,
        reference,
        workbook_drift,
        ddl_drift,
    })
}

/// Fills `AI_Suggestion` for every failing row and returns what was asked.
pub fn apply_advice(
    report: &mut ValidationReport,
    advisor: &dyn LogicAdvisor,
    max_chars: usize,
) -> Vec<(AdviceRequest, Advice)> {
    let mut advised = Vec::new();
    for row in report
        .rows
        .iter_mut()
        .filter(|row| row.status == Verdict::Fail && !row.is_synthetic())
    {
        let request = AdviceRequest {
            table: row.key.as_ref().map(|k| k.table.clone()).unwrap_or_default(),
            field: row.key.as_ref().map(|k| k.column.clone()).unwrap_or_default(),
            logic: row.logic.clone(),
        };
        let advice = advisor::consult(advisor, &request, max_chars);
        row.suggestion = advice.summary();
        advised.push((request, advice));
    }
    info!(
        "Advisor '{}' reviewed {} failing row(s)",
        advisor.name(),
        advised.len()
    );
    advised
}

pub fn execute(args: &ValidateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => ValidatorConfig::default(),
    };
    apply_overrides(&mut config, args);

    let dmw = Workbook::open(&args.dmw)
        .with_context(|| format!("Loading mapping workbook {:?}", args.dmw))?;
    let schema = ddl::load_ddl(&args.ddl)
        .with_context(|| format!("Loading DDL from {:?}", args.ddl))?;
    let inputs = ValidationInputs {
        dmw,
        sheet: args.sheet.clone(),
        ddl: schema,
        prev_dmw: optional_workbook(args.prev_dmw.as_deref(), "previous DMW")?,
        prev_ddl: optional_ddl(args.prev_ddl.as_deref())?,
        reference: optional_workbook(args.ref_dmw.as_deref(), "reference DMW")?,
        master: optional_workbook(args.master_dmw.as_deref(), "master DMW")?,
    };

    let mut report = validate(&inputs, &config)?;

    if let Some(advisor) = advisor::from_config(&config.advisor) {
        let advised = apply_advice(&mut report, advisor.as_ref(), config.advisor.max_explanation_chars);
        if let Some(dir) = &args.advice_dir {
            advisor::write_artifacts(dir, &advised)?;
        }
    } else if args.advice_dir.is_some() {
        info!("Advisor disabled; --advice-dir ignored");
    }

    writer::write_report(&report, &args.out)
        .with_context(|| format!("Writing validation workbook {:?}", args.out))?;
    report::print_summary(&report);
    info!("Validation workbook written to {:?}", args.out);
    Ok(())
}

fn apply_overrides(config: &mut ValidatorConfig, args: &ValidateArgs) {
    let advisor = &mut config.advisor;
    if args.enable_advisor {
        advisor.enabled = true;
    }
    if let Some(command) = &args.advisor_command {
        advisor.command = Some(command.clone());
        advisor.enabled = true;
    }
    if !args.advisor_args.is_empty() {
        advisor.args = args.advisor_args.clone();
    }
    if let Some(timeout) = args.advisor_timeout {
        advisor.timeout_secs = timeout;
    }
}

fn optional_workbook(path: Option<&Path>, label: &str) -> Result<Option<Workbook>> {
    match path {
        None => Ok(None),
        Some(path) if !path.exists() => {
            info!("{label} {path:?} not found; its rule is skipped");
            Ok(None)
        }
        Some(path) => Workbook::open(path)
            .map(Some)
            .with_context(|| format!("Loading {label} {path:?}")),
    }
}

fn optional_ddl(path: Option<&Path>) -> Result<Option<TableSchema>> {
    match path {
        None => Ok(None),
        Some(path) if !path.exists() => {
            info!("previous DDL {path:?} not found; Rule7 skipped");
            Ok(None)
        }
        Some(path) => ddl::load_ddl(path)
            .map(Some)
            .with_context(|| format!("Loading previous DDL {path:?}")),
    }
}
