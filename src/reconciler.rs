use std::collections::{HashMap, HashSet};

use crate::models::{match_key, MatchKey, MatchStatus, ReconciledRow, Transaction};

/// Extension point for approximate matching of rows left one-sided after
/// exact-key matching. Implementations may upgrade `OnlyInQuickBooks` /
/// `OnlyInBankStatement` rows; they are never offered exact matches.
pub trait SecondaryMatcher {
    fn refine(&self, unmatched: &mut [ReconciledRow]);
}

/// Default matcher: exact keys only, leaves one-sided rows as they are.
pub struct ExactOnly;

impl SecondaryMatcher for ExactOnly {
    fn refine(&self, _unmatched: &mut [ReconciledRow]) {}
}

pub fn reconcile(qb: &[Transaction], bank: &[Transaction]) -> Vec<ReconciledRow> {
    reconcile_with(qb, bank, &ExactOnly)
}

/// Full outer join of the two sides keyed on (date, amount in cents).
///
/// QuickBooks rows emit first, in input order: a key the bank side also
/// carries pairs with every bank row under that key (`ExactMatch`); a key
/// the bank never saw emits `OnlyInQuickBooks`. Bank rows whose key has no
/// QuickBooks counterpart follow in their own order as
/// `OnlyInBankStatement`. Every output row lands in exactly one of the
/// three states by construction.
///
/// A second pass flags `is_duplicate` on every row whose key appears two or
/// more times in the joined output. Inputs are never mutated.
pub fn reconcile_with(
    qb: &[Transaction],
    bank: &[Transaction],
    secondary: &dyn SecondaryMatcher,
) -> Vec<ReconciledRow> {
    let mut bank_by_key: HashMap<MatchKey, Vec<&Transaction>> = HashMap::new();
    for txn in bank {
        bank_by_key
            .entry(match_key(txn.date, txn.amount))
            .or_default()
            .push(txn);
    }

    let mut rows = Vec::new();
    let mut matched_keys: HashSet<MatchKey> = HashSet::new();

    for txn in qb {
        let key = match_key(txn.date, txn.amount);
        match bank_by_key.get(&key) {
            Some(partners) => {
                matched_keys.insert(key);
                for partner in partners {
                    rows.push(ReconciledRow {
                        date: txn.date,
                        amount: txn.amount,
                        qb_description: Some(txn.description.clone()),
                        bank_description: Some(partner.description.clone()),
                        status: MatchStatus::ExactMatch,
                        is_duplicate: false,
                    });
                }
            }
            None => rows.push(ReconciledRow {
                date: txn.date,
                amount: txn.amount,
                qb_description: Some(txn.description.clone()),
                bank_description: None,
                status: MatchStatus::OnlyInQuickBooks,
                is_duplicate: false,
            }),
        }
    }

    for txn in bank {
        let key = match_key(txn.date, txn.amount);
        if !matched_keys.contains(&key) {
            rows.push(ReconciledRow {
                date: txn.date,
                amount: txn.amount,
                qb_description: None,
                bank_description: Some(txn.description.clone()),
                status: MatchStatus::OnlyInBankStatement,
                is_duplicate: false,
            });
        }
    }

    let mut key_counts: HashMap<MatchKey, usize> = HashMap::new();
    for row in &rows {
        *key_counts.entry(row.key()).or_default() += 1;
    }
    for row in &mut rows {
        row.is_duplicate = key_counts[&row.key()] >= 2;
    }

    let one_sided: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status != MatchStatus::ExactMatch)
        .map(|(i, _)| i)
        .collect();
    if !one_sided.is_empty() {
        refine_one_sided(&mut rows, &one_sided, secondary);
    }

    rows
}

fn refine_one_sided(
    rows: &mut [ReconciledRow],
    indices: &[usize],
    secondary: &dyn SecondaryMatcher,
) {
    let mut candidates: Vec<ReconciledRow> =
        indices.iter().map(|&i| rows[i].clone()).collect();
    secondary.refine(&mut candidates);
    for (&i, refined) in indices.iter().zip(candidates) {
        rows[i] = refined;
    }
}
