// 🧾 Receipt model - one purchase event parsed from the app log
// Receipt owns its line items; nothing points back from a LineItem

use sha2::{Digest, Sha256};

// ============================================================================
// LINE ITEM
// ============================================================================

/// One purchased product line inside a receipt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    pub name: String,

    /// Raw text, never normalized ("0.0", "1", "3 x")
    pub quantity: String,

    /// Canonical 2-decimal string (source value is in cents)
    pub price_per_unit: String,

    /// Canonical 2-decimal string (source value is in cents)
    pub total_price: String,
}

impl LineItem {
    pub fn new(name: &str, quantity: &str, price_per_unit: &str, total_price: &str) -> Self {
        LineItem {
            name: name.to_string(),
            quantity: quantity.to_string(),
            price_per_unit: price_per_unit.to_string(),
            total_price: total_price.to_string(),
        }
    }
}

// ============================================================================
// RECEIPT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Receipt {
    // ========================================================================
    // PROVENANCE
    // ========================================================================
    /// Log line where the record began (1-based)
    pub line_number: usize,

    // ========================================================================
    // RECEIPT FIELDS
    // ========================================================================
    /// `YYYY-MM-DD`, empty when the timestamp could not be parsed
    pub date: String,

    /// Canonical 2-decimal string
    pub total: String,

    pub currency: String,
    pub merchant: String,
    pub category: String,
    pub description: String,
    pub title: String,
    pub name: String,

    // ========================================================================
    // FLAGS
    // ========================================================================
    /// Only receipts with this flag set make it into the report
    pub is_receipt: bool,

    /// Tracked, not exported
    pub is_first_event: bool,

    /// Derived: sum of line item totals == total
    pub is_reconciled: bool,

    pub line_items: Vec<LineItem>,
}

impl Receipt {
    /// Builder pattern: set the originating log line
    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }

    /// Deduplication key over (date, total, merchant)
    ///
    /// Two receipts with the same key are treated as the same purchase
    /// logged more than once. The separator keeps `("1", "23")` and
    /// `("12", "3")` apart.
    pub fn dedup_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}\x1f{}\x1f{}", self.date, self.total, self.merchant));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// TESTS
// ============================================================================
