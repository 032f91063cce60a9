// Fuzz target feeding arbitrary rules-service payloads through decoding and filtering.
#![no_main]

use libfuzzer_sys::fuzz_target;
use rule_query_rules::{decode_rules, filter_rules};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(rules) = decode_rules(&payload) {
        let filtered = filter_rules(&rules, "修改配送时间", "处理中");
        assert!(filtered.len() <= rules.len());
        assert_eq!(filter_rules(&filtered, "修改配送时间", "处理中"), filtered);
    }
});
