//! Double-entry transaction entry form.
//!
//! Rows come in pairs (0,1), (2,3), ... Entering a debit on one row mirrors
//! it as a credit on its pair and blanks the opposite fields, so every pair
//! carries one debit and one credit of the same amount. Balance across pairs
//! is left to the server.

use crate::error::{LedgerError, Result};
use crate::groups::{category_by_group_name, RootCategory};
use crate::models::{Account, Group, NewLine, NewTransaction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRow {
    pub account: String,
    pub debit: String,
    pub credit: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    pub date: String,
    pub description: String,
    rows: Vec<EntryRow>,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Today's date in UTC, as the server records transaction dates.
fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn parse_account(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|id| *id != 0)
}

fn parse_amount(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

impl EntryForm {
    pub fn new() -> Self {
        Self {
            date: today(),
            description: String::new(),
            rows: vec![EntryRow::default(), EntryRow::default()],
        }
    }

    pub fn rows(&self) -> &[EntryRow] {
        &self.rows
    }

    pub fn pair_of(idx: usize) -> usize {
        idx ^ 1
    }

    fn check_row(&self, idx: usize) -> Result<()> {
        if idx < self.rows.len() {
            Ok(())
        } else {
            Err(LedgerError::validation(format!("No row {idx} in this entry")))
        }
    }

    pub fn set_debit(&mut self, idx: usize, value: &str) -> Result<()> {
        self.check_row(idx)?;
        self.rows[idx].debit = value.to_string();
        self.rows[idx].credit.clear();
        if let Some(pair) = self.rows.get_mut(Self::pair_of(idx)) {
            pair.credit = value.to_string();
            pair.debit.clear();
        }
        Ok(())
    }

    pub fn set_credit(&mut self, idx: usize, value: &str) -> Result<()> {
        self.check_row(idx)?;
        self.rows[idx].credit = value.to_string();
        self.rows[idx].debit.clear();
        if let Some(pair) = self.rows.get_mut(Self::pair_of(idx)) {
            pair.debit = value.to_string();
            pair.credit.clear();
        }
        Ok(())
    }

    pub fn set_account(&mut self, idx: usize, account_id: &str) -> Result<()> {
        self.check_row(idx)?;
        self.rows[idx].account = account_id.to_string();
        Ok(())
    }

    pub fn set_notes(&mut self, idx: usize, notes: &str) -> Result<()> {
        self.check_row(idx)?;
        self.rows[idx].notes = notes.to_string();
        Ok(())
    }

    pub fn add_pair(&mut self) {
        self.rows.push(EntryRow::default());
        self.rows.push(EntryRow::default());
    }

    /// Drop the last pair; the first pair always stays.
    pub fn remove_pair(&mut self) -> bool {
        if self.rows.len() > 2 {
            self.rows.truncate(self.rows.len() - 2);
            true
        } else {
            false
        }
    }

    /// (total debit, total credit); unparseable cells count as zero.
    pub fn totals(&self) -> (f64, f64) {
        self.rows.iter().fold((0.0, 0.0), |(d, c), row| {
            (d + parse_amount(&row.debit), c + parse_amount(&row.credit))
        })
    }

    /// Two ledger lines per complete pair, each naming its counterpart.
    pub fn to_payload(&self, author_id: i64) -> NewTransaction {
        let mut lines = Vec::with_capacity(self.rows.len());
        for pair in self.rows.chunks_exact(2) {
            let (first, second) = (&pair[0], &pair[1]);
            for (row, counterpart) in [(first, second), (second, first)] {
                lines.push(NewLine {
                    fma_id: parse_account(&row.account),
                    sma_id: parse_account(&counterpart.account),
                    debit_amount: parse_amount(&row.debit),
                    credit_amount: parse_amount(&row.credit),
                    comments: row.notes.clone(),
                });
            }
        }
        NewTransaction {
            date: self.date.clone(),
            description: self.description.clone(),
            author_id,
            lines,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountOption {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
}

/// Accounts offered on even rows (assets, income) and odd rows
/// (liabilities, expenses).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountOptions {
    pub assets_income: Vec<AccountOption>,
    pub liabilities_expenses: Vec<AccountOption>,
}

impl AccountOptions {
    pub fn build(groups: &[Group], accounts: &[Account]) -> Self {
        let categories = category_by_group_name(groups);
        let mut options = Self::default();
        for account in accounts {
            let category_id = categories.get(&account.group_name).copied().flatten();
            let option = AccountOption {
                id: account.id,
                name: account.name.clone(),
                category_id,
            };
            match category_id.and_then(RootCategory::from_id) {
                Some(RootCategory::Assets | RootCategory::Income) => {
                    options.assets_income.push(option)
                }
                Some(RootCategory::Liabilities | RootCategory::Expenses) => {
                    options.liabilities_expenses.push(option)
                }
                None => {}
            }
        }
        options
    }

    pub fn for_row(&self, idx: usize) -> &[AccountOption] {
        if idx % 2 == 0 {
            &self.assets_income
        } else {
            &self.liabilities_expenses
        }
    }

    /// Every filled-in account must be one this row offers.
    pub fn check(&self, form: &EntryForm) -> Result<()> {
        for (idx, row) in form.rows().iter().enumerate() {
            let Some(id) = parse_account(&row.account) else {
                continue;
            };
            if !self.for_row(idx).iter().any(|o| o.id == id) {
                return Err(LedgerError::validation(format!(
                    "Account {id} cannot be used on row {}",
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}
