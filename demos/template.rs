//! Template for generated API tests.
//!
//! Copy this file next to your tests and adapt the helpers. atgen keeps
//! everything outside the marked skeleton as is.

use std::sync::OnceLock;
use std::sync::Mutex;

use my_app::testing::{Response, TestClient};
use serde_json::Value;

/// Atgen TestFunc block
#[test]
fn atgen_test_func() -> Result<(), Box<dyn std::error::Error>> {
    let atgen_vars = serde_json::json!({});
    let client = TestClient::new(atgen_router_func());
    {}

    /// Atgen Subtest block
    {
        eprintln!("subtest: {}", "AtgenSubtestName");
        {}
    }

    /// Atgen Test block
    {
        let atgen_test_vars = serde_json::json!({});
        let atgen_req_headers = serde_json::json!({});
        let atgen_req_params = serde_json::json!({});
        let atgen_res_headers = serde_json::json!({});
        let atgen_res_params = serde_json::json!({});
        let atgen_res_params_array = serde_json::json!([]);

        let body = atgen_request_body()?;
        let res: Response = client.send("AtgenMethod", "AtgenPath", &atgen_req_headers, body);

        assert_eq!(res.status(), "atgenStatus", "{} {}", "AtgenMethod", "AtgenPath");
        res.assert_headers(&atgen_res_headers);
        res.assert_params(&atgen_res_params);
        res.assert_params_array(&atgen_res_params_array);
        let _ = &atgen_test_vars;

        register("atgenRegisterKey", res.json());
    }

    Ok(())
}

fn store() -> &'static Mutex<Value> {
    static STORE: OnceLock<Mutex<Value>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(Value::Object(Default::default())))
}

fn register(key: &str, value: Value) {
    if key.is_empty() {
        return;
    }
    if let Ok(mut store) = store().lock() {
        store[key] = value;
    }
}

fn atgen_register() -> Value {
    store().lock().map(|s| s.clone()).unwrap_or(Value::Null)
}
