//! Client behaviour against a scripted in-memory transport
//!
//! Run with: cargo test --test firestore_transport

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use firestore_rest::firestore::{
    increment, limit, order_by, server_timestamp, where_, Credential, DocumentData, FindOptions,
    Firestore, HttpMethod, HttpRequest, HttpResponse, HttpTransport, NativeValue, Operator,
    Settings, SetOptions, TransactionOptions,
};
use firestore_rest::{FirebaseError, FirestoreError};

const ROOT: &str = "https://firestore.googleapis.com/v1/projects/test-project/databases/(default)/documents";
const NAME_ROOT: &str = "projects/test-project/databases/(default)/documents";

/// Replies with queued responses in order, then with `fallback`
struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    fallback: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(fallback: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn ok() -> Arc<Self> {
        Self::new(HttpResponse::json(200, &json!({"writeResults": []})))
    }

    fn push(&self, status: u16, body: JsonValue) {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::json(status, &body));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn commits(&self) -> Vec<JsonValue> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(":commit"))
            .filter_map(|r| r.body)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FirebaseError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(transport: Arc<ScriptedTransport>) -> Firestore {
    init_tracing();
    Firestore::with_transport(
        Credential::new("test-project").with_token("token"),
        Settings::default(),
        transport,
    )
}

fn remote_error(code: i64, message: &str) -> JsonValue {
    json!({"error": {"code": code, "message": message}})
}

fn document(path: &str, fields: JsonValue) -> JsonValue {
    json!({
        "name": format!("{}/{}", NAME_ROOT, path),
        "fields": fields,
        "createTime": "2021-10-25T22:49:25.790Z",
        "updateTime": "2021-10-25T22:49:25.790Z"
    })
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_find_document() {
    let transport = ScriptedTransport::ok();
    transport.push(
        200,
        document(
            "users/alice",
            json!({"name": {"stringValue": "alice"}, "age": {"integerValue": "30"}}),
        ),
    );
    let firestore = client(transport.clone());

    let snapshot = firestore
        .document("users/alice")
        .find_with_options(&FindOptions::picks(["name", "age"]))
        .await
        .unwrap();

    assert!(snapshot.exists());
    assert_eq!(snapshot.id(), Some("alice"));
    assert_eq!(snapshot.get("age"), Some(&NativeValue::Integer(30)));

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        request.url,
        format!("{}/users/alice?mask.fieldPaths=name&mask.fieldPaths=age", ROOT)
    );
    assert_eq!(request.header("authorization"), Some("Bearer token"));
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_find_missing_document() {
    let transport = ScriptedTransport::ok();
    transport.push(404, remote_error(404, "data not found"));
    let firestore = client(transport);

    let snapshot = firestore.document("users/nobody").find().await.unwrap();
    assert!(!snapshot.exists());
    assert_eq!(snapshot.data(), None);
}

#[tokio::test]
async fn test_find_propagates_other_errors() {
    let transport = ScriptedTransport::ok();
    transport.push(403, remote_error(403, "permission denied"));
    let firestore = client(transport);

    let err = firestore.document("users/alice").find().await.unwrap_err();
    assert_eq!(err.code(), Some(403));
}

#[tokio::test]
async fn test_find_all_filters_missing_documents() {
    let transport = ScriptedTransport::ok();
    transport.push(
        200,
        json!({"documents": [
            document("users/a", json!({"n": {"integerValue": "1"}})),
            {"name": format!("{}/users/b", NAME_ROOT)},
            document("users/c", json!({"n": {"integerValue": "3"}}))
        ]}),
    );
    let firestore = client(transport.clone());

    let snapshot = firestore.collection("users").find_all().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(transport.requests()[0].url, format!("{}/users", ROOT));
}

#[tokio::test]
async fn test_find_all_missing_collection() {
    let transport = ScriptedTransport::ok();
    transport.push(404, remote_error(404, "not found"));
    transport.push(200, json!({}));
    let firestore = client(transport);

    let users = firestore.collection("users");
    assert!(users.find_all().await.unwrap().is_empty());
    assert!(users.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_missing_collection() {
    let transport = ScriptedTransport::ok();
    transport.push(404, remote_error(404, "not found"));
    transport.push(404, remote_error(404, "not found"));
    let firestore = client(transport.clone());

    let missing = firestore.collection("missing");
    assert!(missing.query(vec![limit(1)]).await.unwrap().is_empty());
    assert!(missing.group_query(vec![limit(1)]).await.unwrap().is_empty());
    assert!(transport.requests()[0].url.ends_with(":runQuery"));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_query_request() {
    let transport = ScriptedTransport::ok();
    transport.push(
        200,
        json!([
            {"document": document("users/a", json!({"age": {"integerValue": "20"}})), "readTime": "t"},
            {"readTime": "t"}
        ]),
    );
    let firestore = client(transport.clone());

    let snapshot = firestore
        .collection("users")
        .query_with_options(
            vec![where_("age", Operator::GreaterThan, 18), order_by("age"), limit(5)],
            &FindOptions::picks(["age"]),
        )
        .await
        .unwrap();
    assert_eq!(snapshot.len(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, format!("{}:runQuery", ROOT));
    assert_eq!(
        request.body,
        Some(json!({
            "structuredQuery": {
                "select": {"fields": [{"fieldPath": "age"}]},
                "from": [{"collectionId": "users", "allDescendants": false}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "age"},
                    "op": "GREATER_THAN",
                    "value": {"integerValue": 18}
                }},
                "orderBy": [{"field": {"fieldPath": "age"}, "direction": "ASCENDING"}],
                "limit": 5
            }
        }))
    );
}

#[tokio::test]
async fn test_group_query_under_parent_document() {
    let transport = ScriptedTransport::new(HttpResponse::json(200, &json!([])));
    let firestore = client(transport.clone());

    let snapshot = firestore
        .collection("rooms/eros/messages")
        .group_query(vec![limit(1)])
        .await
        .unwrap();
    assert!(snapshot.is_empty());

    let request = &transport.requests()[0];
    assert_eq!(request.url, format!("{}/rooms/eros:runQuery", ROOT));
    let from = &request.body.as_ref().unwrap()["structuredQuery"]["from"];
    assert_eq!(from, &json!([{"collectionId": "messages", "allDescendants": true}]));
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_document() {
    let transport = ScriptedTransport::new(HttpResponse::json(200, &json!({})));
    let firestore = client(transport.clone());

    let id = firestore
        .collection("users")
        .create(DocumentData::new().insert("name", "alice").insert("nickname", None::<&str>))
        .await
        .unwrap();
    assert_eq!(id.len(), 20);

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, format!("{}/users?documentId={}", ROOT, id));
    assert_eq!(
        request.body,
        Some(json!({"fields": {"name": {"stringValue": "alice"}}}))
    );
}

#[tokio::test]
async fn test_reference_writes() {
    let transport = ScriptedTransport::ok();
    let firestore = client(transport.clone());
    let alice = firestore.document("users/alice");
    let name = format!("{}/users/alice", NAME_ROOT);

    alice
        .set(DocumentData::new().insert("age", 30), SetOptions::merge())
        .await
        .unwrap();
    alice
        .update(DocumentData::new().insert("visits", increment(1)))
        .await
        .unwrap();
    alice.delete().await.unwrap();

    let commits = transport.commits();
    assert_eq!(
        commits[0],
        json!({"writes": [{
            "update": {"name": name, "fields": {"age": {"integerValue": 30}}},
            "updateMask": {"fieldPaths": ["age"]},
            "currentDocument": {"exists": true}
        }]})
    );
    assert_eq!(
        commits[1],
        json!({"writes": [{
            "transform": {
                "document": name,
                "fieldTransforms": [{"fieldPath": "visits", "increment": {"integerValue": 1}}]
            }
        }]})
    );
    assert_eq!(commits[2], json!({"writes": [{"delete": name}]}));
}

#[tokio::test]
async fn test_commit_error_surfaces() {
    let transport = ScriptedTransport::ok();
    transport.push(413, remote_error(413, "request too large"));
    let firestore = client(transport);

    let err = firestore
        .document("users/alice")
        .set(DocumentData::new().insert("a", 1), SetOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(413));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_batch_commit() {
    let transport = ScriptedTransport::ok();
    transport.push(
        200,
        json!({
            "writeResults": [{"updateTime": "2021-10-25T22:49:25.790Z"}, {}],
            "commitTime": "2021-10-25T22:49:25.790Z"
        }),
    );
    let firestore = client(transport.clone());

    let batch = firestore
        .batch()
        .set(
            &firestore.document("users/alice"),
            DocumentData::new()
                .insert("name", "alice")
                .insert("updatedAt", server_timestamp()),
            SetOptions::default(),
        )
        .delete(&firestore.document("users/bob"));
    assert_eq!(batch.len(), 2);

    let response = batch.commit().await.unwrap();
    assert_eq!(response.write_results.len(), 2);
    assert_eq!(response.commit_time.as_deref(), Some("2021-10-25T22:49:25.790Z"));

    let commits = transport.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0],
        json!({"writes": [
            {
                "update": {
                    "name": format!("{}/users/alice", NAME_ROOT),
                    "fields": {"name": {"stringValue": "alice"}}
                },
                "updateMask": {"fieldPaths": ["name"]},
                "updateTransforms": [{"fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME"}],
                "currentDocument": {"exists": false}
            },
            {"delete": format!("{}/users/bob", NAME_ROOT)}
        ]})
    );
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_transaction_success_runs_once() {
    let transport = ScriptedTransport::ok();
    let firestore = client(transport.clone());
    let doc = firestore.document("counters/visits");
    let calls = AtomicU32::new(0);

    let value = firestore
        .run_transaction(|tx| {
            calls.fetch_add(1, Ordering::SeqCst);
            let doc = doc.clone();
            async move {
                tx.update(&doc, DocumentData::new().insert("count", increment(1)));
                Ok::<_, FirebaseError>("done")
            }
        })
        .await
        .unwrap();

    assert_eq!(value, "done");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.commits().len(), 1);
}

#[tokio::test]
async fn test_transaction_retries_after_two_failures() {
    let transport = ScriptedTransport::ok();
    transport.push(409, remote_error(409, "contention"));
    transport.push(500, remote_error(500, "internal"));
    let firestore = client(transport.clone());
    let calls = AtomicU32::new(0);

    firestore
        .run_transaction(|_tx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FirebaseError>(()) }
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(transport.commits().len(), 3);
}

#[tokio::test]
async fn test_transaction_stops_on_not_found() {
    let transport = ScriptedTransport::ok();
    transport.push(404, remote_error(404, "not found"));
    let firestore = client(transport);
    let calls = AtomicU32::new(0);

    let err = firestore
        .run_transaction(|_tx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FirebaseError>(()) }
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transaction_stops_on_request_too_large() {
    let transport = ScriptedTransport::ok();
    transport.push(413, remote_error(413, "too large"));
    let firestore = client(transport);
    let calls = AtomicU32::new(0);

    let err = firestore
        .run_transaction(|_tx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FirebaseError>(()) }
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(413));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transaction_gives_up_after_max_attempt() {
    let transport = ScriptedTransport::new(HttpResponse::json(409, &remote_error(409, "contention")));
    let firestore = client(transport.clone());
    let calls = AtomicU32::new(0);

    let err = firestore
        .transactor()
        .run(
            |_tx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FirebaseError>(()) }
            },
            TransactionOptions::max_attempt(4),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(409));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(transport.commits().len(), 4);
}

#[tokio::test]
async fn test_transaction_retries_user_errors() {
    let transport = ScriptedTransport::ok();
    let firestore = client(transport.clone());
    let calls = AtomicU32::new(0);

    let value = firestore
        .run_transaction(|_tx| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    return Err(FirestoreError::remote(503, "unavailable").into());
                }
                Ok::<_, FirebaseError>(call)
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(transport.commits().len(), 1);
}

#[tokio::test]
async fn test_transaction_buffer_persists_across_attempts() {
    let transport = ScriptedTransport::ok();
    transport.push(409, remote_error(409, "contention"));
    let firestore = client(transport.clone());
    let doc = firestore.document("users/alice");

    firestore
        .run_transaction(|tx| {
            let doc = doc.clone();
            async move {
                tx.set(&doc, DocumentData::new().insert("a", 1), SetOptions::default());
                Ok::<_, FirebaseError>(())
            }
        })
        .await
        .unwrap();

    let commits = transport.commits();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0]["writes"].as_array().unwrap().len(), 1);
    assert_eq!(commits[1]["writes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_transaction_reads_are_plain_reads() {
    let transport = ScriptedTransport::ok();
    transport.push(200, document("users/alice", json!({"n": {"integerValue": "1"}})));
    let firestore = client(transport.clone());
    let doc = firestore.document("users/alice");

    let n = firestore
        .run_transaction(|tx| {
            let doc = doc.clone();
            async move {
                let snapshot = tx.find(&doc).await?;
                Ok::<_, FirebaseError>(snapshot.get("n").and_then(NativeValue::as_i64))
            }
        })
        .await
        .unwrap();

    assert_eq!(n, Some(1));
    let requests = transport.requests();
    assert_eq!(requests[0].url, format!("{}/users/alice", ROOT));
    assert_eq!(requests[1].body, Some(json!({"writes": []})));
}

#[tokio::test]
async fn test_transaction_reads_with_picks() {
    let transport = ScriptedTransport::ok();
    transport.push(200, document("users/alice", json!({"n": {"integerValue": "1"}})));
    transport.push(200, json!({"documents": [document("users/alice", json!({"n": {"integerValue": "1"}}))]}));
    let firestore = client(transport.clone());
    let doc = firestore.document("users/alice");
    let users = firestore.collection("users");

    let found = firestore
        .run_transaction(|tx| {
            let doc = doc.clone();
            let users = users.clone();
            async move {
                let picks = FindOptions::picks(["n"]);
                let snapshot = tx.find_with_options(&doc, &picks).await?;
                let all = tx.find_all_with_options(&users, &picks).await?;
                Ok::<_, FirebaseError>((snapshot.exists(), all.len()))
            }
        })
        .await
        .unwrap();

    assert_eq!(found, (true, 1));
    let requests = transport.requests();
    assert_eq!(requests[0].url, format!("{}/users/alice?mask.fieldPaths=n", ROOT));
    assert_eq!(requests[1].url, format!("{}/users?mask.fieldPaths=n", ROOT));
}
