use auditsearch_application::{AuditIndexAdmin, AuditSearchIndex, BulkDeleteSummary};
use auditsearch_core::AppError;
use auditsearch_domain::{
    AUDIT_FIELD_MAPPING, AuditEvent, AuditRecord, AuditableRef, IndexDocument, IndexName,
    IndexSettings, RetentionMode, RetentionQuery,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use super::ElasticsearchAuditIndex;
use super::requests::{
    alias_actions_body, bulk_delete_body, bulk_failure_count, create_index_body, mapping_body,
    normalize_host, search_excess_body, search_hit_ids,
};

fn audit_index() -> IndexName {
    IndexName::new("laravel_auditing").unwrap_or_else(|_| unreachable!())
}

#[test]
fn hosts_without_scheme_default_to_http() {
    let url = normalize_host("localhost:9200");
    assert!(url.is_ok());
    assert_eq!(
        url.unwrap_or_else(|_| unreachable!()).as_str(),
        "http://localhost:9200/"
    );

    let prefixed = normalize_host(" https://search.internal/es ");
    assert_eq!(
        prefixed.map(|url| url.to_string()).ok().as_deref(),
        Some("https://search.internal/es/")
    );
}

#[test]
fn invalid_hosts_are_rejected() {
    assert!(matches!(normalize_host("  "), Err(AppError::Validation(_))));
    assert!(matches!(
        normalize_host("ftp://search.internal"),
        Err(AppError::Validation(_))
    ));
    assert!(ElasticsearchAuditIndex::new(reqwest::Client::new(), &[]).is_err());
}

#[test]
fn excess_search_filters_entity_and_sorts_newest_first() {
    let entity = AuditableRef::new("Post", "42", 5).unwrap_or_else(|_| unreachable!());
    let query = RetentionQuery::for_entity(&entity, RetentionMode::RetainThreshold)
        .unwrap_or_else(|| unreachable!());

    let body = search_excess_body(&query);

    assert_eq!(body["from"], json!(5));
    assert_eq!(body["size"], json!(9_995));
    assert_eq!(body["_source"], json!(false));
    assert_eq!(body["sort"][0]["created_at"]["order"], json!("desc"));
    assert_eq!(
        body["query"]["bool"]["filter"],
        json!([
            { "term": { "auditable_id": "42" } },
            { "term": { "auditable_type": "Post" } }
        ])
    );
}

#[test]
fn hit_ids_are_read_in_response_order() {
    let response = json!({
        "hits": { "hits": [ { "_id": "b" }, { "_id": "a" }, { "_score": 1.0 } ] }
    });

    assert_eq!(search_hit_ids(&response), vec!["b".to_owned(), "a".to_owned()]);
    assert!(search_hit_ids(&json!({})).is_empty());
}

#[test]
fn bulk_body_has_one_delete_line_per_document() {
    let body = bulk_delete_body(&audit_index(), &["a".to_owned(), "b".to_owned()])
        .unwrap_or_default();

    let lines: Vec<serde_json::Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_default())
        .collect();
    assert!(body.ends_with('\n'));
    assert_eq!(
        lines,
        vec![
            json!({ "delete": { "_index": "laravel_auditing", "_id": "a" } }),
            json!({ "delete": { "_index": "laravel_auditing", "_id": "b" } }),
        ]
    );
}

#[test]
fn bulk_failures_count_only_errored_items() {
    let response = json!({
        "errors": true,
        "items": [
            { "delete": { "_id": "a", "status": 200, "result": "deleted" } },
            { "delete": { "_id": "b", "status": 404, "result": "not_found" } },
            { "delete": { "_id": "c", "status": 429, "error": { "type": "es_rejected_execution_exception" } } }
        ]
    });

    assert_eq!(bulk_failure_count(&response), 1);
    assert_eq!(bulk_failure_count(&json!({ "errors": false, "items": [] })), 0);
}

#[test]
fn create_index_declares_shard_layout() {
    assert_eq!(
        create_index_body(IndexSettings::AUDIT),
        json!({ "settings": { "number_of_shards": 3, "number_of_replicas": 0 } })
    );
}

#[test]
fn mapping_nests_change_set_timestamps() {
    let body = mapping_body(AUDIT_FIELD_MAPPING);
    let date = json!({ "type": "date", "format": "yyyy-MM-dd HH:mm:ss" });

    assert_eq!(body["properties"]["created_at"], date);
    assert_eq!(body["properties"]["auditable_id"], json!({ "type": "keyword" }));
    assert_eq!(body["properties"]["event"], json!({ "type": "keyword" }));
    for side in ["old_values", "new_values"] {
        for field in ["created_at", "updated_at", "deleted_at"] {
            assert_eq!(body["properties"][side]["properties"][field], date);
        }
    }
}

#[test]
fn alias_action_points_write_alias_at_index() {
    let index = audit_index();
    assert_eq!(
        alias_actions_body(&index, index.write_alias().as_str()),
        json!({
            "actions": [
                { "add": { "index": "laravel_auditing", "alias": "laravel_auditing_write" } }
            ]
        })
    );
}

#[tokio::test]
async fn unreachable_hosts_surface_as_unavailable() {
    let adapter = ElasticsearchAuditIndex::new(
        reqwest::Client::new(),
        &["127.0.0.1:1".to_owned(), "http://127.0.0.1:2".to_owned()],
    );
    assert!(adapter.is_ok());
    let adapter = adapter.unwrap_or_else(|_| unreachable!());
    assert_eq!(adapter.hosts().len(), 2);

    let record = AuditRecord::new(AuditEvent::Created, "Post", "42")
        .unwrap_or_else(|_| unreachable!())
        .stamped(chrono::Utc::now());
    let result = adapter
        .index_document(&audit_index(), &IndexDocument::new(record))
        .await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    content_type: Option<String>,
    body: String,
}

/// Serves one canned response per accepted connection, then returns what it saw.
async fn spawn_search_stub(
    responses: Vec<(u16, &'static str)>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            captured.push(read_request(&mut stream).await);

            let response = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        captured
    });

    (format!("http://{address}"), handle)
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];

    loop {
        if let Some(header_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
            let content_length = header_value(head.as_str(), "content-length")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(0);
            let body_start = header_end + 4;

            if buffer.len() >= body_start + content_length {
                let body =
                    String::from_utf8_lossy(&buffer[body_start..body_start + content_length])
                        .into_owned();
                let mut request_line = head.lines().next().unwrap_or_default().split(' ');
                return CapturedRequest {
                    method: request_line.next().unwrap_or_default().to_owned(),
                    path: request_line.next().unwrap_or_default().to_owned(),
                    content_type: header_value(head.as_str(), "content-type"),
                    body,
                };
            }
        }

        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => {
                return CapturedRequest {
                    method: String::new(),
                    path: String::new(),
                    content_type: None,
                    body: String::new(),
                };
            }
            Ok(read) => buffer.extend_from_slice(&chunk[..read]),
        }
    }
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_owned())
    })
}

fn stub_adapter(hosts: &[String]) -> ElasticsearchAuditIndex {
    let http_client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| unreachable!());
    ElasticsearchAuditIndex::new(http_client, hosts).unwrap_or_else(|_| unreachable!())
}

async fn closed_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
    drop(listener);
    format!("http://{address}")
}

#[tokio::test]
async fn index_exists_follows_head_status() {
    let (host, stub) = spawn_search_stub(vec![(200, ""), (404, ""), (503, "")]).await;
    let adapter = stub_adapter(&[host]);

    assert_eq!(adapter.index_exists(&audit_index()).await.ok(), Some(true));
    assert_eq!(adapter.index_exists(&audit_index()).await.ok(), Some(false));
    assert!(matches!(
        adapter.index_exists(&audit_index()).await,
        Err(AppError::Unavailable(_))
    ));

    let requests = stub.await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
    assert!(
        requests
            .iter()
            .all(|request| request.method == "HEAD" && request.path == "/laravel_auditing")
    );
}

#[tokio::test]
async fn error_statuses_map_to_app_errors() {
    let (host, stub) = spawn_search_stub(vec![
        (
            400,
            r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#,
        ),
        (
            404,
            r#"{"error":{"type":"index_not_found_exception"},"status":404}"#,
        ),
        (503, r#"{"error":"cluster unavailable"}"#),
        (401, r#"{"error":"missing authentication"}"#),
        (200, r#"{"acknowledged":true}"#),
    ])
    .await;
    let adapter = stub_adapter(&[host]);
    let index = audit_index();

    let created = adapter.create_index(&index, IndexSettings::AUDIT).await;
    assert!(
        matches!(&created, Err(AppError::Conflict(message)) if message.contains("resource_already_exists_exception"))
    );
    assert!(matches!(
        adapter.delete_index(&index).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        adapter.put_mapping(&index, AUDIT_FIELD_MAPPING).await,
        Err(AppError::Unavailable(_))
    ));
    assert!(matches!(
        adapter.add_alias(&index, "laravel_auditing_write").await,
        Err(AppError::Internal(_))
    ));
    assert!(adapter.delete_index(&index).await.is_ok());

    let requests = stub.await.unwrap_or_default();
    let calls: Vec<(&str, &str)> = requests
        .iter()
        .map(|request| (request.method.as_str(), request.path.as_str()))
        .collect();
    assert_eq!(
        calls,
        vec![
            ("PUT", "/laravel_auditing"),
            ("DELETE", "/laravel_auditing"),
            ("PUT", "/laravel_auditing/_mapping"),
            ("POST", "/_aliases"),
            ("DELETE", "/laravel_auditing"),
        ]
    );
}

#[tokio::test]
async fn bulk_delete_reads_item_failures_from_response() {
    let (host, stub) = spawn_search_stub(vec![(
        200,
        r#"{"took":3,"errors":true,"items":[{"delete":{"_id":"a","status":200,"result":"deleted"}},{"delete":{"_id":"b","status":429,"error":{"type":"es_rejected_execution_exception"}}}]}"#,
    )])
    .await;
    let adapter = stub_adapter(&[host]);

    let summary = adapter
        .bulk_delete(&audit_index(), &["a".to_owned(), "b".to_owned()])
        .await;

    assert_eq!(
        summary.ok(),
        Some(BulkDeleteSummary {
            requested: 2,
            failed: 1,
        })
    );

    let requests = stub.await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/_bulk");
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/x-ndjson")
    );
    assert_eq!(requests[0].body.lines().count(), 2);
}

#[tokio::test]
async fn excess_search_returns_hit_ids_in_order() {
    let (host, stub) = spawn_search_stub(vec![(
        200,
        r#"{"hits":{"total":{"value":7},"hits":[{"_id":"newer"},{"_id":"older"}]}}"#,
    )])
    .await;
    let adapter = stub_adapter(&[host]);
    let entity = AuditableRef::new("Post", "42", 5).unwrap_or_else(|_| unreachable!());
    let query = RetentionQuery::for_entity(&entity, RetentionMode::RetainThreshold)
        .unwrap_or_else(|| unreachable!());

    let ids = adapter.search_excess_documents(&audit_index(), &query).await;
    assert_eq!(ids.ok(), Some(vec!["newer".to_owned(), "older".to_owned()]));

    let requests = stub.await.unwrap_or_default();
    assert_eq!(requests[0].path, "/laravel_auditing/_search");
    let body: serde_json::Value =
        serde_json::from_str(requests[0].body.as_str()).unwrap_or_default();
    assert_eq!(body["from"], json!(5));
}

#[tokio::test]
async fn refused_host_fails_over_to_next() {
    let (host, stub) = spawn_search_stub(vec![(201, r#"{"result":"created"}"#)]).await;
    let adapter = stub_adapter(&[closed_host().await, host]);
    let record = AuditRecord::new(AuditEvent::Created, "Post", "42")
        .unwrap_or_else(|_| unreachable!())
        .stamped(chrono::Utc::now());
    let document = IndexDocument::new(record);

    assert!(
        adapter
            .index_document(&audit_index(), &document)
            .await
            .is_ok()
    );

    let requests = stub.await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(
        requests[0].path,
        format!("/laravel_auditing/_doc/{}", document.id())
    );
    let body: serde_json::Value =
        serde_json::from_str(requests[0].body.as_str()).unwrap_or_default();
    assert_eq!(body["auditable_type"], json!("Post"));
    assert_eq!(body["event"], json!("created"));
}
