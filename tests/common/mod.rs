//! Shared fixtures for integration tests.

use serde_json::{json, Value};

use edge_router::edge::ViewerRequestEvent;
use edge_router::routing::Router;
use edge_router::rules::RuleCompiler;

pub const DEFAULT_HOST: &str = "d111111abcdef8.cloudfront.net";

/// Build a viewer-request event the way the CDN delivers it.
#[allow(dead_code)]
pub fn create_event(uri: &str) -> ViewerRequestEvent {
    create_event_for_host(uri, DEFAULT_HOST)
}

#[allow(dead_code)]
pub fn create_event_for_host(uri: &str, host: &str) -> ViewerRequestEvent {
    serde_json::from_value(event_json(uri, host)).expect("fixture event is valid")
}

#[allow(dead_code)]
pub fn event_json(uri: &str, host: &str) -> Value {
    json!({
        "Records": [{
            "cf": {
                "config": {
                    "distributionDomainName": "d123.cloudfront.net",
                    "distributionId": "EDFDVBD6EXAMPLE",
                    "eventType": "viewer-request",
                    "requestId": "MRVMF7KydIvxMWfJIglgwHQwZsbG2IhRJ07sn9AkKUFSHS9EXAMPLE=="
                },
                "request": {
                    "clientIp": "2001:0db8:85a3:0:0:8a2e:0370:7334",
                    "querystring": "size=large",
                    "uri": uri,
                    "method": "GET",
                    "headers": {
                        "host": [{"key": "Host", "value": host}],
                        "user-agent": [{"key": "User-Agent", "value": "curl/7.18.1"}]
                    },
                    "origin": {
                        "s3": {
                            "authMethod": "origin-access-identity",
                            "domainName": "my-bucket.s3.amazonaws.com",
                            "path": "/s3_path",
                            "region": "us-east-1"
                        }
                    }
                }
            }
        }]
    })
}

/// Compile line rules, failing the test on any compilation error.
#[allow(dead_code)]
pub fn router(text: &str) -> Router {
    let outcome = RuleCompiler::new().compile_text(text);
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    Router::new(outcome.rules)
}

/// Assert a rendered output is a 301 pointing at `location`.
#[allow(dead_code)]
pub fn expect_redirect(output: &Value, location: &str) {
    assert_eq!(output["status"], "301");
    let header = output["headers"]["location"].as_array().expect("location header");
    assert_eq!(header.len(), 1);
    assert_eq!(header[0]["key"], "Location");
    assert_eq!(header[0]["value"], location);
}
