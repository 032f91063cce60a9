#![allow(dead_code)]

use std::time::Duration;

use rule_query_core::UpstreamConfig;
use rule_query_engine::RuleQueryWorkflow;
use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ORDER_PATH: &str = "/order_status";
pub const PURPOSE_PATH: &str = "/purpose";

pub fn upstream_config(server: &MockServer) -> UpstreamConfig {
    UpstreamConfig::new(
        format!("{}{ORDER_PATH}", server.uri()),
        format!("{}{PURPOSE_PATH}", server.uri()),
    )
    .with_timeout(Duration::from_secs(2))
}

pub fn workflow(server: &MockServer) -> RuleQueryWorkflow {
    RuleQueryWorkflow::from_config(&upstream_config(server)).expect("workflow")
}

/// Rules registered for "修改配送时间": R1 and R3 apply to an order that is
/// still being processed.
pub fn delivery_rules() -> Value {
    json!({
        "rules": [
            {"rule_id": "R1", "rule": "发货前可修改配送时间", "required_status": "处理中"},
            {"rule_id": "R2", "rule": "已发货不可修改", "required_status": "已发货"},
            {"rule_id": "R3", "rule": "每单仅可修改一次"},
            {"rule_id": "R4", "rule": "签收后不可修改", "required_status": "已签收"},
            {"rule_id": "R5", "rule": "取消订单规则", "purpose": "取消订单"}
        ]
    })
}

pub async fn mount_order(server: &MockServer, order_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(ORDER_PATH))
        .and(query_param("order_id", order_id))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_rules(
    server: &MockServer,
    purpose: &str,
    response: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(PURPOSE_PATH))
        .and(query_param("purpose", purpose))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Fails the test on drop if any request reaches `server`.
pub async fn forbid_any_call(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}
