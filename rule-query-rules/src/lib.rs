//! Rule records for the rule query service.
//!
//! Rules arrive from the purpose lookup service as loosely shaped JSON. This
//! crate decodes them into [`Rule`] values and narrows them down to the ones
//! that apply to an order in a given status.

mod decode;
mod error;
mod filter;
mod rule;

pub use decode::decode_rules;
pub use error::RuleError;
pub use filter::{filter_rules, RuleFilter};
pub use rule::Rule;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_then_filters_payload() {
        let payload = json!([
            {"id": "A", "description": "处理中可修改", "status": "处理中"},
            {"id": "B", "description": "已发货不可修改", "status": "已发货"}
        ]);

        let rules = decode_rules(&payload).expect("payload decodes");
        let filtered = filter_rules(&rules, "修改配送时间", "处理中");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "A");
    }
}
