// 🗝️ Key Registry - Property keys as data
// Dispatch table: property key → what to do with its value

use anyhow::{Context as AnyhowContext, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Keys the app logs that carry nothing the report needs
pub const DEFAULT_IGNORED_KEYS: &[&str] = &[
    "parent_screen",
    "place",
    "price",    // logged when a receipt line is edited
    "quantity", // same as above
    "rs_subscription",
    "export_format",
    "success",
    "app_install_time",
    "plan",
    "method",
    "sort_by",
    "product",
    "provider",
    "tags",
    "user_purpose",
    "purchase_id",
    "onboarding_version",
    "referrer_click_time",
    "type",
    "offer",
    "receipt_attached",
    "utm_source",
    "utm_medium",
    "receipts_count",
];

// ============================================================================
// FIELD KIND
// ============================================================================

/// Free-text receipt fields copied verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Currency,
    Merchant,
    Category,
    Description,
    Title,
    Name,
}

/// Boolean receipt fields, set when the value is exactly `true`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagField {
    Receipt,
    FirstEvent,
}

/// What the receipt parser does with a property key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Epoch milliseconds → timestamp normalizer
    Date,
    /// Currency string → total normalizer
    Total,
    Text(TextField),
    Flag(FlagField),
    /// Nested line-item blob → line-item parser
    Items,
    /// Recognized, deliberately dropped
    Ignored,
}

impl FieldKind {
    /// Built-in fields; these cannot be overridden by configuration
    fn builtin(key: &str) -> Option<FieldKind> {
        let kind = match key {
            "date" => FieldKind::Date,
            "total" => FieldKind::Total,
            "currency" => FieldKind::Text(TextField::Currency),
            "merchant" => FieldKind::Text(TextField::Merchant),
            "category" => FieldKind::Text(TextField::Category),
            "description" => FieldKind::Text(TextField::Description),
            "title" => FieldKind::Text(TextField::Title),
            "name" => FieldKind::Text(TextField::Name),
            "receipt" => FieldKind::Flag(FlagField::Receipt),
            "first_event" => FieldKind::Flag(FlagField::FirstEvent),
            "items" => FieldKind::Items,
            _ => return None,
        };
        Some(kind)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// On-disk shape of an ignore-list file: `{ "ignored": ["key", ...] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyConfig {
    #[serde(default)]
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRegistry {
    ignored: BTreeSet<String>,
}

impl KeyRegistry {
    /// Registry with the built-in ignore list
    pub fn new() -> Self {
        KeyRegistry {
            ignored: DEFAULT_IGNORED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Load extra ignored keys from a JSON file, on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read key config file: {:?}", path.as_ref()))?;

        let config: KeyConfig =
            serde_json::from_str(&content).context("Failed to parse key config JSON")?;

        Ok(KeyRegistry::from_config(config))
    }

    pub fn from_config(config: KeyConfig) -> Self {
        let mut registry = KeyRegistry::new();
        for key in config.ignored {
            registry.ignore(&key);
        }
        registry
    }

    /// Add a key to the ignore list
    pub fn ignore(&mut self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.ignored.insert(key.to_string());
    }

    /// Look up a key; `None` means the key is unknown
    pub fn classify(&self, key: &str) -> Option<FieldKind> {
        if let Some(kind) = FieldKind::builtin(key) {
            return Some(kind);
        }

        if self.ignored.contains(key) {
            return Some(FieldKind::Ignored);
        }

        None
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
