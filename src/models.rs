use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;

use crate::error::{Result, VestryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Paid,
    Cancelled,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Pix,
    Transfer,
    Card,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Pix => "pix",
            Self::Transfer => "transfer",
            Self::Card => "card",
            Self::Check => "check",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "pix" => Some(Self::Pix),
            "transfer" => Some(Self::Transfer),
            "card" => Some(Self::Card),
            "check" => Some(Self::Check),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("bad value: {s}").into()))
            }
        }
    };
}

text_enum_sql!(TransactionType);
text_enum_sql!(EntryStatus);
text_enum_sql!(PaymentMethod);

/// Counterparty of an entry. Income entries may name the contributing
/// parishioner, expense entries the supplier — the variant carries which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterparty {
    Parishioner(i64),
    Supplier(i64),
}

impl Counterparty {
    pub fn from_columns(parishioner_id: Option<i64>, supplier_id: Option<i64>) -> Option<Self> {
        match (parishioner_id, supplier_id) {
            (Some(id), _) => Some(Self::Parishioner(id)),
            (None, Some(id)) => Some(Self::Supplier(id)),
            (None, None) => None,
        }
    }

    pub fn parishioner_id(&self) -> Option<i64> {
        match self {
            Self::Parishioner(id) => Some(*id),
            Self::Supplier(_) => None,
        }
    }

    pub fn supplier_id(&self) -> Option<i64> {
        match self {
            Self::Supplier(id) => Some(*id),
            Self::Parishioner(_) => None,
        }
    }
}

/// A financial entry (income or expense) with its lifecycle state.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: i64,
    pub description: String,
    pub original_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: String,
    pub payment_date: Option<String>,
    pub payment_method: PaymentMethod,
    pub transaction_type: TransactionType,
    pub status: EntryStatus,
    pub category_id: i64,
    pub cost_center_id: i64,
    pub created_by: i64,
    pub counterparty: Option<Counterparty>,
    pub note: Option<String>,
    pub is_active: bool,
}

impl Entry {
    /// Settle the entry: record the actual amount and date paid.
    /// Amount and date are always set together.
    pub fn settle(
        &mut self,
        paid_amount: Decimal,
        payment_date: String,
        method: PaymentMethod,
    ) -> Result<()> {
        if self.status == EntryStatus::Cancelled {
            return Err(VestryError::InvalidTransition(
                "cannot settle a cancelled entry".to_string(),
            ));
        }
        if paid_amount <= Decimal::ZERO {
            return Err(VestryError::Validation(
                "paid amount must be greater than zero".to_string(),
            ));
        }
        self.paid_amount = paid_amount;
        self.payment_date = Some(payment_date);
        self.payment_method = method;
        self.status = EntryStatus::Paid;
        Ok(())
    }

    /// Undo a settlement, returning the entry to pending.
    pub fn reverse(&mut self) -> Result<()> {
        if self.status != EntryStatus::Paid {
            return Err(VestryError::InvalidTransition(
                "only paid entries can be reversed".to_string(),
            ));
        }
        self.paid_amount = Decimal::ZERO;
        self.payment_date = None;
        self.status = EntryStatus::Pending;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            EntryStatus::Paid => Err(VestryError::InvalidTransition(
                "entry is already paid; reverse the settlement before cancelling".to_string(),
            )),
            EntryStatus::Cancelled => Err(VestryError::InvalidTransition(
                "entry is already cancelled".to_string(),
            )),
            EntryStatus::Pending => {
                self.status = EntryStatus::Cancelled;
                Ok(())
            }
        }
    }
}
