use tracing::debug;

use crate::rule::Rule;

/// Narrows rules returned for a purpose down to those applicable to an order.
///
/// The predicate is intentionally minimal: purpose text/tag matching plus
/// exact equality on the required order status. No other business logic is
/// applied.
#[derive(Debug, Clone)]
pub struct RuleFilter {
    purpose: String,
    order_status: String,
}

impl RuleFilter {
    pub fn new(purpose: impl Into<String>, order_status: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into().trim().to_lowercase(),
            order_status: order_status.into().trim().to_string(),
        }
    }

    /// Whether a single rule applies.
    pub fn matches(&self, rule: &Rule) -> bool {
        self.purpose_matches(rule) && self.status_matches(rule)
    }

    /// Keeps the applicable rules, preserving input order.
    pub fn apply(&self, rules: &[Rule]) -> Vec<Rule> {
        rules
            .iter()
            .filter(|rule| {
                let keep = self.matches(rule);
                debug!(rule_id = %rule.id, keep, "rule filter evaluated");
                keep
            })
            .cloned()
            .collect()
    }

    fn purpose_matches(&self, rule: &Rule) -> bool {
        let declared = rule.declared_purpose();
        if declared.is_none() && rule.tags.is_empty() {
            return true;
        }

        let by_text = declared
            .map(str::to_lowercase)
            .map(|declared| declared.contains(&self.purpose) || self.purpose.contains(&declared))
            .unwrap_or(false);

        by_text
            || rule
                .tags
                .iter()
                .any(|tag| tag.trim().to_lowercase() == self.purpose)
    }

    fn status_matches(&self, rule: &Rule) -> bool {
        rule.required_status()
            .map(|required| required == self.order_status)
            .unwrap_or(true)
    }
}

/// Filters `rules` for `purpose` against the order's current status.
pub fn filter_rules(rules: &[Rule], purpose: &str, order_status: &str) -> Vec<Rule> {
    RuleFilter::new(purpose, order_status).apply(rules)
}
