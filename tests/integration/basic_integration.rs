/// End-to-end tests: MCP requests in, JSON-RPC responses out, SQLite on disk
use rest_cycle_mcp::analytics::advisor::{Advisor, AdvisorError, NullAdvisor};
use rest_cycle_mcp::mcp::McpServer;
use rest_cycle_mcp::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Advisor that always answers and counts how often it was asked
    #[derive(Default)]
    struct CountingAdvisor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Advisor for CountingAdvisor {
        async fn advise(&self, summary: &PatternSummary, mode: InsightMode) -> Result<InsightPayload, AdvisorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match mode {
                InsightMode::Quick => InsightPayload::QuickTips(vec![
                    format!("- Debt is {:.1}h", summary.sleep_debt),
                    "- Go to bed earlier".to_string(),
                    "- Keep a schedule".to_string(),
                ]),
                InsightMode::Detailed => InsightPayload::DetailedNarrative("Coach says rest.".to_string()),
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn server_with(advisor: Arc<dyn Advisor>, ttl: Duration) -> (NamedTempFile, McpServer) {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let settings = ServerSettings { cache_ttl: ttl, ..Default::default() };
        let server = RestCycleServer::with_advisor(temp_file.path().to_path_buf(), settings, advisor)
            .expect("Failed to create server");
        (temp_file, McpServer::new(server))
    }

    async fn call(server: &mut McpServer, id: u64, tool: &str, arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        });
        let response = server.process_line(&request.to_string()).await.expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    /// Pull the JSON payload (second content block) out of a tool result
    fn payload(response: &Value) -> Value {
        let text = response["result"]["content"][1]["text"].as_str().expect("payload block");
        serde_json::from_str(text).unwrap()
    }

    async fn log_nights(server: &mut McpServer, user: &str, hours: &[f64]) {
        let today = chrono::Utc::now().naive_utc().date();
        for (i, h) in hours.iter().enumerate() {
            let date = (today - chrono::Duration::days(i as i64)).to_string();
            let response = call(server, 100 + i as u64, "sleep_log", json!({
                "user_id": user, "date": date, "hours": h, "quality": 3
            }))
            .await;
            assert_eq!(response["result"]["isError"], false, "log failed: {}", response);
        }
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let (_db, mut server) = server_with(Arc::new(NullAdvisor::default()), Duration::from_secs(300));

        let init = server
            .process_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1"}}}"#)
            .await
            .unwrap();
        let init = serde_json::to_value(&init).unwrap();
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

        let notified = server
            .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(notified.is_none());
        assert!(server.is_initialized());

        let list = server.process_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await.unwrap();
        let list = serde_json::to_value(&list).unwrap();
        let names: Vec<&str> = list["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["sleep_log", "sleep_list", "sleep_update", "sleep_delete", "sleep_analysis", "sleep_insights"]
        );
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (_db, mut server) = server_with(Arc::new(NullAdvisor::default()), Duration::from_secs(300));

        let bad_json = serde_json::to_value(server.process_line("{not json").await.unwrap()).unwrap();
        assert_eq!(bad_json["error"]["code"], -32700);

        let unknown = serde_json::to_value(
            server.process_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#).await.unwrap(),
        )
        .unwrap();
        assert_eq!(unknown["error"]["code"], -32601);

        let missing_user = call(&mut server, 4, "sleep_insights", json!({})).await;
        assert_eq!(missing_user["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_two_nights_is_insufficient() {
        let advisor = Arc::new(CountingAdvisor::default());
        let (_db, mut server) = server_with(advisor.clone(), Duration::from_secs(300));
        log_nights(&mut server, "ana", &[7.0, 6.0]).await;

        let response = call(&mut server, 1, "sleep_insights", json!({"user_id": "ana"})).await;
        let body = payload(&response);

        assert_eq!(body["requiresMoreData"], true);
        assert_eq!(body["insights"], json!(["Log 3+ nights for insights"]));
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_insights_cached_within_ttl() {
        let advisor = Arc::new(CountingAdvisor::default());
        let (_db, mut server) = server_with(advisor.clone(), Duration::from_secs(300));
        log_nights(&mut server, "ana", &[4.0, 5.0, 6.0]).await;

        let first = payload(&call(&mut server, 1, "sleep_insights", json!({"user_id": "ana"})).await);
        let second = payload(&call(&mut server, 2, "sleep_insights", json!({"user_id": "ana"})).await);

        assert_eq!(first["insights"].as_array().unwrap().len(), 3);
        assert!(first.get("fromCache").is_none());
        assert_eq!(second["fromCache"], true);
        assert_eq!(first["insights"], second["insights"]);
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);

        // Detailed mode is a separate cache slot and carries the summary
        let detailed = payload(
            &call(&mut server, 3, "sleep_insights", json!({"user_id": "ana", "quick_mode": false})).await,
        );
        assert_eq!(detailed["insights"], "Coach says rest.");
        assert_eq!(detailed["patterns"]["sleepDebt"], 7.5);
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_recomputes() {
        let advisor = Arc::new(CountingAdvisor::default());
        let (_db, mut server) = server_with(advisor.clone(), Duration::ZERO);
        log_nights(&mut server, "ana", &[8.0, 8.0, 8.0]).await;

        for id in 0..3 {
            let body = payload(&call(&mut server, id, "sleep_insights", json!({"user_id": "ana"})).await);
            assert!(body.get("fromCache").is_none());
        }
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fallback_moderate_debt_without_advisor() {
        let (_db, mut server) = server_with(Arc::new(NullAdvisor::default()), Duration::from_secs(300));
        log_nights(&mut server, "ben", &[4.0, 5.0, 6.0]).await;

        let body = payload(&call(&mut server, 1, "sleep_insights", json!({"user_id": "ben"})).await);
        let tips = body["insights"].as_array().unwrap();

        assert_eq!(tips.len(), 3);
        assert!(tips[0].as_str().unwrap().contains("Sleep debt 7.5h"));
    }

    #[tokio::test]
    async fn test_record_lifecycle_and_analysis() {
        let (_db, mut server) = server_with(Arc::new(NullAdvisor::default()), Duration::from_secs(300));

        let empty = call(&mut server, 1, "sleep_analysis", json!({"user_id": "cam"})).await;
        assert_eq!(empty["result"]["content"][0]["text"], "No sleep data available");

        let logged = call(&mut server, 2, "sleep_log", json!({
            "user_id": "cam", "hours": 5.0, "quality": 2, "tags": ["Exam week"], "notes": "cramming"
        }))
        .await;
        let record_id = payload(&logged)["id"].as_str().unwrap().to_string();

        let updated = call(&mut server, 3, "sleep_update", json!({"record_id": record_id, "hours": 6.5})).await;
        assert_eq!(payload(&updated)["hours"], 6.5);

        let analysis = payload(&call(&mut server, 4, "sleep_analysis", json!({"user_id": "cam"})).await);
        assert_eq!(analysis["nightsAnalyzed"], 1);
        assert_eq!(analysis["examWeeks"], 1);
        assert!(analysis["efficiency"].as_f64().unwrap() > 0.0);

        let deleted = call(&mut server, 5, "sleep_delete", json!({"record_id": record_id})).await;
        assert_eq!(deleted["result"]["isError"], false);

        let listed = call(&mut server, 6, "sleep_list", json!({"user_id": "cam"})).await;
        assert!(listed["result"]["content"][0]["text"].as_str().unwrap().starts_with("No sleep records"));
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let first = RestCycleServer::with_advisor(db_path.clone(), ServerSettings::default(), Arc::new(NullAdvisor::default()))
            .expect("Failed to create first server");
        tools::log_sleep(first.storage(), tools::LogSleepParams {
            user_id: "dee".into(),
            hours: 7.0,
            quality: 4,
            ..Default::default()
        })
        .unwrap();
        drop(first);

        let second = RestCycleServer::with_advisor(db_path, ServerSettings::default(), Arc::new(NullAdvisor::default()))
            .expect("Failed to create second server");
        let user = UserId::parse("dee").unwrap();
        assert_eq!(second.storage().recent_records(&user, 30).unwrap().len(), 1);
    }
}
