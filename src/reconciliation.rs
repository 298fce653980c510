// ⚖️ Reconciliation - does the receipt add up?
//
//   sum(line_item.total_price) == receipt.total
//
// Exact floating-point equality on purpose: both sides come from 2-decimal
// strings, and a receipt that is off by a cent is not reconciled.

use crate::receipt::{LineItem, Receipt};

/// Sum of line item totals, in source order
///
/// `None` when any item has no total price (or one that does not parse);
/// such a receipt can never reconcile.
pub fn items_total(items: &[LineItem]) -> Option<f64> {
    let mut running_total = 0.0;

    for item in items {
        if item.total_price.is_empty() {
            return None;
        }
        running_total += item.total_price.parse::<f64>().ok()?;
    }

    Some(running_total)
}

/// True iff every line item has a total and they sum to the receipt total
///
/// A receipt with no line items reconciles only when its total is 0.
pub fn is_reconciled(receipt: &Receipt) -> bool {
    let Some(items_total) = items_total(&receipt.line_items) else {
        return false;
    };

    match receipt.total.parse::<f64>() {
        Ok(total) => items_total == total,
        Err(_) => false,
    }
}

/// Stated total minus the line items' sum, for diagnostics
pub fn difference(receipt: &Receipt) -> Option<f64> {
    let total = receipt.total.parse::<f64>().ok()?;
    Some(total - items_total(&receipt.line_items)?)
}

// ============================================================================
// TESTS
// ============================================================================
