use std::fmt;

use serde::Serialize;

use crate::models::{FeeRecord, PaymentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeStatus {
    Paid,
    Partial,
    Unpaid,
}

impl FeeStatus {
    pub fn label(self) -> &'static str {
        match self {
            FeeStatus::Paid => "Paid",
            FeeStatus::Partial => "Partial",
            FeeStatus::Unpaid => "Unpaid",
        }
    }

    /// CSS class hook for the status badge.
    pub fn css_class(self) -> &'static str {
        match self {
            FeeStatus::Paid => "status-ok",
            FeeStatus::Partial => "status-warn",
            FeeStatus::Unpaid => "status-bad",
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeBalance {
    pub fee_id: uuid::Uuid,
    pub description: String,
    pub semester: i32,
    pub due_date: chrono::NaiveDate,
    pub amount: f64,
    pub paid: f64,
    pub remaining: f64,
    pub status: FeeStatus,
}

/// Sum of completed payments; this is the amount credited against fees.
pub fn credited_amount<'a>(payments: impl IntoIterator<Item = &'a PaymentRecord>) -> f64 {
    payments
        .into_iter()
        .filter(|p| p.is_completed())
        .map(|p| p.amount)
        .sum()
}

pub fn classify(paid: f64, remaining: f64) -> FeeStatus {
    if remaining <= 0.0 {
        FeeStatus::Paid
    } else if paid > 0.0 {
        FeeStatus::Partial
    } else {
        FeeStatus::Unpaid
    }
}

/// Balances one fee against its payments. Only completed payments count.
pub fn reconcile(fee: &FeeRecord, payments: &[PaymentRecord]) -> FeeBalance {
    let paid = credited_amount(payments);
    let remaining = fee.amount - paid;

    FeeBalance {
        fee_id: fee.id,
        description: fee.description.clone(),
        semester: fee.semester,
        due_date: fee.due_date,
        amount: fee.amount,
        paid,
        remaining,
        status: classify(paid, remaining),
    }
}

/// Reconciles every fee against the payments that reference it, keeping fee order.
pub fn reconcile_all(fees: &[FeeRecord], payments: &[PaymentRecord]) -> Vec<FeeBalance> {
    fees.iter()
        .map(|fee| {
            let applied: Vec<PaymentRecord> = payments
                .iter()
                .filter(|p| p.fee_id == Some(fee.id))
                .cloned()
                .collect();
            reconcile(fee, &applied)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    /// Sum over every payment row regardless of status.
    pub gross_recorded: f64,
    /// Sum over completed payments only.
    pub credited_amount: f64,
    pub completed_count: usize,
    pub pending_count: usize,
}

pub fn summarize_payments(payments: &[PaymentRecord]) -> PaymentSummary {
    PaymentSummary {
        gross_recorded: payments.iter().map(|p| p.amount).sum(),
        credited_amount: credited_amount(payments),
        completed_count: payments.iter().filter(|p| p.is_completed()).count(),
        pending_count: payments.iter().filter(|p| p.is_pending()).count(),
    }
}
