use serde_json::json;

use crate::protocol::Tool;

pub const RULE_QUERY_WORKFLOW: &str = "rule_query_workflow";
pub const FETCH_ORDER_STATUS: &str = "fetch_order_status";
pub const FETCH_MATCHED_RULES: &str = "fetch_matched_rules";

/// Tools advertised through `tools/list`.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: RULE_QUERY_WORKFLOW.into(),
            description: "执行规则查询工作流，根据订单ID和查询目的获取相关规则".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string", "description": "订单ID"},
                    "purpose": {
                        "type": "string",
                        "description": "查询目的，例如：修改配送时间、取消订单等"
                    }
                },
                "required": ["order_id", "purpose"]
            }),
        },
        Tool {
            name: FETCH_ORDER_STATUS.into(),
            description: "获取指定订单的状态信息".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string", "description": "订单ID"}
                },
                "required": ["order_id"]
            }),
        },
        Tool {
            name: FETCH_MATCHED_RULES.into(),
            description: "根据查询目的获取匹配的规则".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "purpose": {"type": "string", "description": "查询目的"}
                },
                "required": ["purpose"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_three_tools_with_required_arguments() {
        let tools = tool_definitions();
        let names: Vec<_> = tools.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(
            names,
            vec![RULE_QUERY_WORKFLOW, FETCH_ORDER_STATUS, FETCH_MATCHED_RULES]
        );
        assert_eq!(
            tools[0].input_schema["required"],
            json!(["order_id", "purpose"])
        );
    }
}
