//! Worker and configuration end-to-end tests.

use std::fs;
use std::sync::Arc;

use edge_router::config::load_config;
use edge_router::edge::EdgeWorker;
use edge_router::lifecycle::startup::{build_compiler, build_table};
use edge_router::rules::cases::{parse_cases, run_cases};

mod common;

use common::{event_json, DEFAULT_HOST};

fn write_fixture(dir: &std::path::Path, rules: &str) -> std::path::PathBuf {
    fs::write(dir.join("rules.txt"), rules).unwrap();
    let config_path = dir.join("edge.toml");
    fs::write(
        &config_path,
        r#"
[rules]
path = "rules.txt"
localized_prefixes = ["zh"]

[origin]
tls_protocols = ["TLSv1.2"]
read_timeout_secs = 30

[logging]
level = "debug"
"#,
    )
    .unwrap();
    config_path
}

#[tokio::test]
async fn test_worker_routes_ndjson_stream() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_fixture(
        dir.path(),
        "# vanity\n/old 301 /new\n/docs/(.*) 200 https://docs.example.com/$1\n",
    );

    let config = load_config(&config_path).unwrap();
    let table = build_table(&config, &build_compiler(&config.rules)).unwrap();
    let worker = EdgeWorker::new(Arc::new(table));

    let input = [
        event_json("/old", DEFAULT_HOST).to_string(),
        "{broken".to_string(),
        event_json("/zh/old/", DEFAULT_HOST).to_string(),
        event_json("/docs/Intro", DEFAULT_HOST).to_string(),
        event_json("/Elsewhere", DEFAULT_HOST).to_string(),
    ]
    .join("\n");

    let mut output = Vec::new();
    let handled = worker
        .run(input.as_bytes(), &mut output, std::future::pending())
        .await
        .unwrap();
    assert_eq!(handled, 5);

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines[0]["headers"]["location"][0]["value"], "/new");
    assert!(lines[1]["error"].is_string());
    assert_eq!(lines[2]["headers"]["location"][0]["value"], "/zh/new");

    assert_eq!(lines[3]["uri"], "/Intro");
    let custom = &lines[3]["origin"]["custom"];
    assert_eq!(custom["domainName"], "docs.example.com");
    assert_eq!(custom["sslProtocols"], serde_json::json!(["TLSv1.2"]));
    assert_eq!(custom["readTimeout"], 30);

    assert_eq!(lines[4]["uri"], "/elsewhere");
}

#[tokio::test]
async fn test_worker_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_fixture(dir.path(), "/old 301 /new\n");
    let config = load_config(&config_path).unwrap();
    let table = build_table(&config, &build_compiler(&config.rules)).unwrap();
    let worker = EdgeWorker::new(Arc::new(table));

    let (_writer, reader) = tokio::io::duplex(64);
    let mut output = Vec::new();
    let handled = worker
        .run(tokio::io::BufReader::new(reader), &mut output, async {})
        .await
        .unwrap();

    assert_eq!(handled, 0);
    assert!(output.is_empty());
}

#[test]
fn test_rule_cases_against_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_fixture(dir.path(), "/old/(.*) 301 /new/$1\n/about 200 /company\n");
    let config = load_config(&config_path).unwrap();
    let router = build_table(&config, &build_compiler(&config.rules)).unwrap().load();

    let cases = parse_cases(
        r#"
- uri: /old/a/b
  expected: /new/a/b
- uri: /zh/old/x
  expected: /zh/new/x
- uri: /about/
  expected: /company
- uri: /zh/about
  expected: /zh/company
- uri: /Unknown
  expected: /unknown
"#,
    )
    .unwrap();

    let failures = run_cases(&router, &cases);
    assert!(failures.is_empty(), "{:?}", failures);
}
