use chrono::NaiveDate;
use serde::Serialize;

/// Canonical transaction after normalization. Every record carries all
/// three fields: a missing/unparseable date becomes `None`, a missing
/// description becomes an empty string, an unparseable amount becomes 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub amount: f64,
}

/// Join key for matching: date plus the amount in whole cents. Rounding to
/// cents keeps the f64 amount usable as a hash key and absorbs float noise
/// from the loaders.
pub type MatchKey = (Option<NaiveDate>, i64);

pub fn match_key(date: Option<NaiveDate>, amount: f64) -> MatchKey {
    (date, (amount * 100.0).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    #[serde(rename = "Exact Match")]
    ExactMatch,
    #[serde(rename = "Only in QuickBooks")]
    OnlyInQuickBooks,
    #[serde(rename = "Only in Bank Statement")]
    OnlyInBankStatement,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExactMatch => "Exact Match",
            Self::OnlyInQuickBooks => "Only in QuickBooks",
            Self::OnlyInBankStatement => "Only in Bank Statement",
        }
    }
}

/// One row of the reconciliation report. Descriptions are kept per side
/// since the join key ignores them.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledRow {
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub qb_description: Option<String>,
    pub bank_description: Option<String>,
    pub status: MatchStatus,
    pub is_duplicate: bool,
}

impl ReconciledRow {
    pub fn key(&self) -> MatchKey {
        match_key(self.date, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_key_rounds_to_cents() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(match_key(d, -4.50), (d, -450));
        assert_eq!(match_key(d, 100.004), (d, 10000));
        assert_eq!(match_key(None, 0.0), (None, 0));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(MatchStatus::ExactMatch.label(), "Exact Match");
        assert_eq!(MatchStatus::OnlyInQuickBooks.label(), "Only in QuickBooks");
        assert_eq!(
            MatchStatus::OnlyInBankStatement.label(),
            "Only in Bank Statement"
        );
    }
}
