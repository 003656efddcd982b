//! DocumentStore facade over a scripted cluster

mod common;

use std::sync::Arc;

use common::*;
use minidoc::executor::transport::RawResponse;
use minidoc::{DocumentStore, ErrorCategory, RequestExecutor};

fn store_with(transport: Arc<MockTransport>) -> DocumentStore {
    let executor = RequestExecutor::with_transport(
        test_config(vec!["http://a:8080".into()], "db1"),
        transport,
    )
    .unwrap();
    executor.install_topology(topology(1, vec![node("http://a:8080", true)]));
    DocumentStore::with_executor(executor)
}

#[tokio::test]
async fn missing_document_maps_to_none() {
    init_tracing();
    let store = store_with(Arc::new(MockTransport::new(|_, _| {
        Ok(RawResponse::new(404, "no such document"))
    })));

    let doc = store.get_document("users/404").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn existing_document_roundtrips_as_json() {
    init_tracing();
    let store = store_with(Arc::new(MockTransport::new(|_, cmd| {
        if cmd.method == reqwest::Method::GET {
            Ok(RawResponse::new(200, r#"{"name": "em", "level": 3}"#))
        } else {
            Ok(RawResponse::new(201, r#"{"id": "users/1", "change_vector": "A:1"}"#))
        }
    })));

    let put = store
        .put_document("users/1", serde_json::json!({"name": "em", "level": 3}))
        .await
        .unwrap();
    assert_eq!(put.id, "users/1");

    let doc = store.get_document("users/1").await.unwrap().unwrap();
    assert_eq!(doc["name"], "em");
    assert_eq!(doc["level"], 3);
}

#[tokio::test]
async fn statistics_decode() {
    init_tracing();
    let store = store_with(Arc::new(MockTransport::new(|_, _| {
        Ok(RawResponse::new(
            200,
            r#"{"count_of_documents": 42, "count_of_indexes": 3, "database_id": "db1-A"}"#,
        ))
    })));

    let stats = store.get_statistics().await.unwrap();
    assert_eq!(stats.count_of_documents, 42);
    assert_eq!(stats.count_of_indexes, 3);
}

#[tokio::test]
async fn missing_database_error_is_branchable() {
    init_tracing();
    let store = store_with(Arc::new(MockTransport::new(|_, _| {
        Ok(RawResponse::new(410, "database 'ghost' does not exist"))
    })));

    // callers can branch on the category, e.g. expected-failure tests
    let err = store.get_statistics().await.unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::DatabaseDoesNotExist));
}

#[tokio::test]
async fn store_new_assigns_hilo_ids_and_returns_ranges_on_close() {
    init_tracing();
    let transport = Arc::new(MockTransport::new(|_, cmd| {
        if cmd.path.contains("hilo/next") {
            Ok(hilo_response(1, 32))
        } else if cmd.path.contains("docs?") {
            Ok(RawResponse::new(201, r#"{"id": "assigned"}"#))
        } else {
            Ok(RawResponse::new(200, ""))
        }
    }));
    let store = store_with(transport.clone());

    let first = store
        .store_new("users", serde_json::json!({"name": "em"}))
        .await
        .unwrap();
    let second = store
        .store_new("users", serde_json::json!({"name": "lo"}))
        .await
        .unwrap();
    assert_ne!(first, second);
    assert!(first.starts_with("users/"));

    store.close().await;
    assert_eq!(transport.calls_to("hilo/return"), 1);
}
