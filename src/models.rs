use serde::{Deserialize, Serialize};

use crate::amount::{deserialize_loose, Amount};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_DATE: &str = "-";

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// User record as the server sends it; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserWire {
    #[serde(default, alias = "id")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "dateHired")]
    pub date_hired: Option<String>,
    #[serde(default, alias = "dateFinished")]
    pub date_finished: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub address: String,
    pub date_hired: String,
    pub date_finished: String,
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}

impl From<UserWire> for User {
    fn from(wire: UserWire) -> Self {
        Self {
            id: wire.user_id.unwrap_or(0),
            username: or_sentinel(wire.username, NOT_AVAILABLE),
            name: or_sentinel(wire.name, NOT_AVAILABLE),
            email: or_sentinel(wire.email, NOT_AVAILABLE),
            is_admin: wire.is_admin.unwrap_or(false),
            address: or_sentinel(wire.address, NOT_AVAILABLE),
            date_hired: or_sentinel(wire.date_hired, NO_DATE),
            date_finished: or_sentinel(wire.date_finished, NO_DATE),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub admin_id: i64,
    pub address: String,
    pub user_type: String,
    #[serde(rename = "dateHired")]
    pub date_hired: String,
    #[serde(rename = "dateFinished")]
    pub date_finished: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub user_id: i64,
    pub password: String,
    pub address: String,
}

// ---------------------------------------------------------------------------
// Master accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AccountWire {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_loose")]
    pub opening_amount: f64,
    #[serde(default, deserialize_with = "deserialize_loose")]
    pub closing_amount: f64,
    #[serde(default)]
    pub account_group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub opening_amount: f64,
    pub closing_amount: f64,
    pub group_name: String,
}

impl From<AccountWire> for Account {
    fn from(wire: AccountWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            opening_amount: wire.opening_amount,
            closing_amount: wire.closing_amount,
            group_name: wire.account_group,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub amount: Amount,
    pub group_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountUpdate {
    pub account_id: i64,
    pub name: String,
    pub amount: Amount,
    pub group_id: i64,
}

// ---------------------------------------------------------------------------
// Groups and categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    pub group_id: i64,
    pub group_name: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub children: Vec<Group>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupsEnvelope {
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// `account_id` carries the root category id, as the server names it.
#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub account_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupUpdate {
    pub group_id: i64,
    pub name: String,
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LineWire {
    #[serde(default)]
    pub first_master_account: Option<i64>,
    #[serde(default)]
    pub second_master_account: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_loose")]
    pub debit_amount: f64,
    #[serde(default, deserialize_with = "deserialize_loose")]
    pub credit_amount: f64,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionWire {
    pub transaction_number: i64,
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineWire>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub first_account_id: Option<i64>,
    pub second_account_id: Option<i64>,
    pub debit: f64,
    pub credit: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub number: i64,
    pub date: String,
    pub description: String,
    pub lines: Vec<Line>,
}

impl From<TransactionWire> for Transaction {
    fn from(wire: TransactionWire) -> Self {
        Self {
            number: wire.transaction_number,
            date: wire.transaction_date,
            description: wire.description.unwrap_or_default(),
            lines: wire
                .lines
                .into_iter()
                .map(|l| Line {
                    first_account_id: l.first_master_account,
                    second_account_id: l.second_master_account,
                    debit: l.debit_amount,
                    credit: l.credit_amount,
                    notes: l.comments.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLine {
    pub fma_id: Option<i64>,
    pub sma_id: Option<i64>,
    pub debit_amount: f64,
    pub credit_amount: f64,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub date: String,
    pub description: String,
    pub author_id: i64,
    pub lines: Vec<NewLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_missing_fields_get_sentinels() {
        let wire: UserWire = serde_json::from_str(r#"{"user_id": 3, "username": "jo"}"#).unwrap();
        let user = User::from(wire);
        assert_eq!(user.id, 3);
        assert_eq!(user.username, "jo");
        assert_eq!(user.name, NOT_AVAILABLE);
        assert_eq!(user.email, NOT_AVAILABLE);
        assert_eq!(user.address, NOT_AVAILABLE);
        assert_eq!(user.date_hired, NO_DATE);
        assert_eq!(user.date_finished, NO_DATE);
        assert!(!user.is_admin);
    }

    #[test]
    fn test_user_accepts_camel_case_dates() {
        let wire: UserWire =
            serde_json::from_str(r#"{"id": 4, "is_admin": true, "dateHired": "2024-01-02"}"#)
                .unwrap();
        let user = User::from(wire);
        assert_eq!(user.id, 4);
        assert!(user.is_admin);
        assert_eq!(user.date_hired, "2024-01-02");
    }

    #[test]
    fn test_account_normalizes_group_name() {
        let wire: AccountWire = serde_json::from_str(
            r#"{"id": 1, "name": "Cash", "opening_amount": "10.00", "closing_amount": 12.5, "account_group": "Current"}"#,
        )
        .unwrap();
        let acct = Account::from(wire);
        assert_eq!(acct.group_name, "Current");
        assert_eq!(acct.opening_amount, 10.0);
        assert_eq!(acct.closing_amount, 12.5);
    }

    #[test]
    fn test_root_group_omits_parent_id() {
        let root = NewGroup { name: "Bank".into(), parent_id: None, account_id: 1 };
        let json = serde_json::to_value(&root).unwrap();
        assert!(json.get("parent_id").is_none());
        let child = NewGroup { name: "Bank".into(), parent_id: Some(5), account_id: 1 };
        assert_eq!(serde_json::to_value(&child).unwrap()["parent_id"], 5);
    }

    #[test]
    fn test_new_user_uses_camel_case_dates() {
        let user = NewUser {
            username: "u".into(),
            password: "p".into(),
            name: "n".into(),
            email: "e".into(),
            admin_id: 1,
            address: "a".into(),
            user_type: "user".into(),
            date_hired: String::new(),
            date_finished: String::new(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("dateHired").is_some());
        assert!(json.get("date_hired").is_none());
    }

    #[test]
    fn test_transaction_normalization() {
        let wire: TransactionWire = serde_json::from_str(
            r#"{"transaction_number": 9, "transaction_date": "2024-05-01", "description": null,
                "lines": [{"first_master_account": 1, "second_master_account": 2,
                           "debit_amount": "50.00", "credit_amount": "0.00", "comments": "rent"}]}"#,
        )
        .unwrap();
        let tx = Transaction::from(wire);
        assert_eq!(tx.number, 9);
        assert_eq!(tx.description, "");
        assert_eq!(tx.lines[0].debit, 50.0);
        assert_eq!(tx.lines[0].notes, "rent");
    }
}
