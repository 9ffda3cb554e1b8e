//! Rule identifiers, verdicts and the per-rule evaluators.
//!
//! Rule1 and Rule2 look at one row at a time. Rule3 to Rule7 compare sets of
//! tables and columns and report [`MismatchRecord`](crate::mismatch::MismatchRecord)s
//! that the aggregator turns back into row verdicts.

pub mod change_tracking;
pub mod ddl_alignment;
pub mod drift;
pub mod mapping;
pub mod reference;
pub mod table_details;

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    Mapping,
    ChangeTracking,
    TableDetails,
    DdlAlignment,
    Reference,
    WorkbookDrift,
    DdlDrift,
}

impl Rule {
    pub const ALL: [Rule; 7] = [
        Rule::Mapping,
        Rule::ChangeTracking,
        Rule::TableDetails,
        Rule::DdlAlignment,
        Rule::Reference,
        Rule::WorkbookDrift,
        Rule::DdlDrift,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Rule::Mapping => "Rule1",
            Rule::ChangeTracking => "Rule2",
            Rule::TableDetails => "Rule3",
            Rule::DdlAlignment => "Rule4",
            Rule::Reference => "Rule5",
            Rule::WorkbookDrift => "Rule6",
            Rule::DdlDrift => "Rule7",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rule::Mapping => "Completeness check for migrating fields",
            Rule::ChangeTracking => "Change tracking and sprint consistency",
            Rule::TableDetails => "Destination tables cross-checked against the Table Details sheet",
            Rule::DdlAlignment => "DDL structure alignment (columns, data types, nullability)",
            Rule::Reference => "Reference workbook columns must exist in the master workbook",
            Rule::WorkbookDrift => "DMW drift against the previous workbook",
            Rule::DdlDrift => "DDL drift against the previous DDL (detail sheet only)",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Verdict {
    #[default]
    Pass,
    Fail,
    NotApplicable,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verdict per rule, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdicts([Verdict; 7]);

impl Verdicts {
    pub fn all(verdict: Verdict) -> Self {
        Self([verdict; 7])
    }

    pub fn get(&self, rule: Rule) -> Verdict {
        self.0[rule as usize]
    }

    pub fn set(&mut self, rule: Rule, verdict: Verdict) {
        self.0[rule as usize] = verdict;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rule, Verdict)> + '_ {
        Rule::ALL.iter().map(|rule| (*rule, self.get(*rule)))
    }

    /// FAIL when any rule fails, N/A when every rule is N/A, else PASS.
    pub fn status(&self) -> Verdict {
        if self.0.contains(&Verdict::Fail) {
            Verdict::Fail
        } else if self.0.iter().all(|v| *v == Verdict::NotApplicable) {
            Verdict::NotApplicable
        } else {
            Verdict::Pass
        }
    }
}

/// Result of a row-level rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub verdict: Verdict,
    pub remark: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            remark: None,
        }
    }

    pub fn fail(remark: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Fail,
            remark: Some(remark.into()),
        }
    }
}
