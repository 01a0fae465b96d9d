//! Name-based routing of columns into features, labels, or nothing.

use super::types::ColumnRole;
use crate::config::CleanerConfig;

/// Decide where a column goes, by name alone.
///
/// Ignored rules win over label rules: a column that is both an identifier and an
/// outcome is dropped.
pub fn classify(name: &str, config: &CleanerConfig) -> ColumnRole {
    if is_ignored(name, config) {
        ColumnRole::Ignored
    } else if is_label(name, config) {
        ColumnRole::Label
    } else {
        ColumnRole::Feature
    }
}

/// Non-base currency amounts duplicate the base amount; identifiers carry no signal.
fn is_ignored(name: &str, config: &CleanerConfig) -> bool {
    if name.starts_with(config.amount_prefix.as_str()) && name != config.base_amount_column {
        return true;
    }
    config.ignored_columns.iter().any(|c| c == name)
}

fn is_label(name: &str, config: &CleanerConfig) -> bool {
    if name.starts_with(config.risk_level_prefix.as_str()) {
        return true;
    }
    config.outcome_columns.iter().any(|c| c == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> ColumnRole {
        classify(name, &CleanerConfig::default())
    }

    #[test]
    fn test_foreign_amounts_ignored() {
        for name in ["amount_in_eur", "amount_in_gbp", "amount_in_", "amount_in_usd_cents"] {
            assert_eq!(role(name), ColumnRole::Ignored, "{name} should be ignored");
        }
        assert_eq!(role("amount_in_usd"), ColumnRole::Feature);
    }

    #[test]
    fn test_identifier_columns_ignored() {
        assert_eq!(role("billing_address_postal_code"), ColumnRole::Ignored);
        assert_eq!(role("card_bin"), ColumnRole::Ignored);
        assert_eq!(role("created"), ColumnRole::Ignored);
    }

    #[test]
    fn test_label_columns() {
        for name in [
            "risk_level",
            "risk_level_normal",
            "risk_levelx",
            "charge_captured",
            "charge_status",
            "dispute_count",
            "dispute_reason",
            "efw_count",
        ] {
            assert_eq!(role(name), ColumnRole::Label, "{name} should be a label");
        }
    }

    #[test]
    fn test_everything_else_is_feature() {
        for name in ["card_brand", "risk_score", "", "Charge_Status", "amount", "ünïcode"] {
            assert_eq!(role(name), ColumnRole::Feature, "{name} should be a feature");
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let config = CleanerConfig::default();
        for name in ["amount_in_eur", "risk_level_x", "card_brand", "created"] {
            assert_eq!(classify(name, &config), classify(name, &config));
        }
    }

    #[test]
    fn test_custom_rules() {
        let config = CleanerConfig {
            risk_level_prefix: "outcome_".to_owned(),
            ignored_columns: vec!["row_id".to_owned()],
            ..CleanerConfig::default()
        };
        assert_eq!(classify("outcome_type", &config), ColumnRole::Label);
        assert_eq!(classify("row_id", &config), ColumnRole::Ignored);
        assert_eq!(classify("created", &config), ColumnRole::Feature);
    }
}
