//! Verify requests and response handling against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector file describes inputs, the expected request, a simulated
//! response and the expected outcome. Bodies are compared as parsed JSON so
//! field ordering never causes false negatives.

use std::sync::{Arc, Mutex};

use makeapi_core::{
    HttpMethod, HttpRequest, HttpResponse, Make, MakeError, MakeOptions, Strategy, Transport,
    TransportError,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:5000";

/// Answers every request with one canned response and keeps the request.
struct OneShot {
    response: HttpResponse,
    seen: Mutex<Option<HttpRequest>>,
}

impl Transport for OneShot {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.seen.lock().unwrap() = Some(request);
        Ok(self.response.clone())
    }
}

fn client_for(case: &Value) -> (Make, Arc<OneShot>) {
    let sim = &case["simulated_response"];
    let transport = Arc::new(OneShot {
        response: HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        },
        seen: Mutex::new(None),
    });
    let options = MakeOptions::new(BASE_URL).with_strategy(Strategy::Server);
    let make = Make::new(options, Arc::clone(&transport)).unwrap();
    (make, transport)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn expected_url(expected_req: &Value) -> String {
    let path = expected_req["path"].as_str().unwrap();
    match expected_req["query"].as_str() {
        Some(query) if !query.is_empty() => format!("{BASE_URL}{path}?{query}"),
        _ => format!("{BASE_URL}{path}"),
    }
}

fn check_error(name: &str, err: MakeError, expected: &Value) {
    match expected["kind"].as_str().unwrap() {
        "Application" => match err {
            MakeError::Application(payload) => {
                assert_eq!(payload, expected["payload"], "{name}: error payload")
            }
            other => panic!("{name}: expected application error, got {other:?}"),
        },
        other => panic!("{name}: unknown expected error kind: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let raw = include_str!("../../test-vectors/search.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (mut make, transport) = client_for(case);

        let result = make.find(&case["find"]).then();

        let req = transport.seen.lock().unwrap().take().unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected_url(expected_req), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");
        assert!(make.query_string().is_empty(), "{name}: predicates cleared");

        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
            continue;
        }
        let results = result.unwrap();
        let expected = &case["expected_result"];
        let ids: Vec<&str> = results.makes.iter().map(|m| m.id.as_str()).collect();
        let expected_ids: Vec<&str> = expected["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(ids, expected_ids, "{name}: ids");
        assert_eq!(results.total, expected["total"].as_u64().unwrap(), "{name}: total");
    }
}

// ---------------------------------------------------------------------------
// One-shot calls
// ---------------------------------------------------------------------------

#[test]
fn call_test_vectors() {
    let raw = include_str!("../../test-vectors/calls.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let args = &case["args"];
        let id = args["id"].as_str().unwrap_or_default();
        let maker = args["maker"].as_str().unwrap_or_default();
        let (make, transport) = client_for(case);

        let result = match case["call"].as_str().unwrap() {
            "create" => make.create(&args["make"]),
            "update" => make.update(id, &args["make"]),
            "remove" => make.remove(id),
            "like" => make.like(id, maker),
            "unlike" => make.unlike(id, maker),
            "report" => make.report(id, maker),
            "cancelReport" => make.cancel_report(id, maker),
            other => panic!("{name}: unknown call {other}"),
        };

        let req = transport.seen.lock().unwrap().take().unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected_url(expected_req), "{name}: url");
        let body: Value = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected_req["body"], "{name}: body");

        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error);
            continue;
        }
        let made = result.unwrap();
        assert_eq!(made.id, case["expected_result"]["_id"].as_str().unwrap(), "{name}: id");
    }
}
