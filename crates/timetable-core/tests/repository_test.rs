// Repository and list view-model tests against a wiremock backend.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use timetable_api::{ApiClient, TransportConfig};
use timetable_core::{
    Backend, Classroom, EntityId, ErrorKind, LoadStatus, PagerConfig, PagingState, PagingStream,
    TableDialog, TableEvent,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Backend) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, Backend::from_client(client, PagerConfig::new(10, 5)))
}

fn classrooms(ids: std::ops::RangeInclusive<i64>) -> Value {
    Value::Array(
        ids.map(|id| json!({ "id": id, "name": format!("Room {id}") }))
            .collect(),
    )
}

async fn settle(stream: &mut PagingStream<Classroom>) -> PagingState<Classroom> {
    tokio::time::timeout(
        Duration::from_secs(5),
        stream.wait_for(|state| {
            !state.load_state.refresh.is_loading() && !state.load_state.append.is_loading()
        }),
    )
    .await
    .expect("pager did not settle")
    .expect("pager dropped")
}

async fn count_requests(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.method.as_str() == verb)
        .count()
}

// ── Paging through the backend ──────────────────────────────────────

#[tokio::test]
async fn test_table_loads_first_page_with_limit() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(1..=10)))
        .expect(1)
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    let mut stream = table.observe();
    let state = settle(&mut stream).await;

    assert_eq!(state.snapshot.len(), 10);
    assert_eq!(state.snapshot.get(0).unwrap().name, "Room 1");
    assert!(!state.snapshot.end_reached());
}

#[tokio::test]
async fn test_server_error_becomes_unexpected_failure() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    let mut stream = table.observe();
    let state = settle(&mut stream).await;

    assert_eq!(
        state.load_state.refresh,
        LoadStatus::Error(ErrorKind::UnexpectedFailure)
    );

    let id = table.handle_paging_error(ErrorKind::UnexpectedFailure).unwrap();
    let event = table.events().current().clone().unwrap();
    assert_eq!(event.id, id);
    assert!(matches!(event.payload, TableEvent::Message(_)));
    assert!(table.handle_paging_error(ErrorKind::SourceInvalidated).is_none());
}

#[tokio::test]
async fn test_filter_change_sends_query_and_clears_selection() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .and(query_param("query", "lab"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(40..=41)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(1..=3)))
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    settle(&mut table.observe()).await;
    table.set_row_selection(EntityId::new(1), true);

    table.set_filter(timetable_api::SearchFilter::new("lab"));
    assert!(table.selection().is_empty());

    let state = settle(&mut table.observe()).await;
    let names: Vec<&str> = state.snapshot.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Room 40", "Room 41"]);
    assert!(state.snapshot.end_reached());
}

// ── Mutations invalidate the list ───────────────────────────────────

#[tokio::test]
async fn test_delete_selected_reloads_from_first_page() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(1..=10)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(3..=10)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/classroom/1,2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    let mut stream = table.observe();
    settle(&mut stream).await;

    table.set_row_selection(EntityId::new(1), true);
    table.set_row_selection(EntityId::new(2), true);
    table.open_dialog(TableDialog::ConfirmDeletion { count: 2 });

    let deleted = table.delete_selected().await.unwrap();
    assert_eq!(deleted, 2);
    assert!(table.selection().is_empty());
    assert_eq!(table.dialog(), None);
    assert!(!table.deleting().is_loading());
    assert_eq!(
        table.events().current().as_ref().map(|e| e.payload.clone()),
        Some(TableEvent::Deleted { count: 2 })
    );

    let state = settle(&mut stream).await;
    assert_eq!(state.snapshot.len(), 8);
    assert_eq!(count_requests(&server, "GET").await, 2);
}

#[tokio::test]
async fn test_empty_selection_deletes_nothing() {
    let (server, backend) = setup().await;

    let table = backend.table::<Classroom>();
    assert_eq!(table.delete_selected().await.unwrap(), 0);
    assert_eq!(count_requests(&server, "DELETE").await, 0);
    assert!(table.events().current().is_none());
}

#[tokio::test]
async fn test_save_new_record_posts_and_invalidates() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(1..=2)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classroom"))
        .and(body_json(json!({ "name": "305" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    let mut stream = table.observe();
    settle(&mut stream).await;
    let source = table.pager().source().unwrap();

    table.open_dialog(TableDialog::Manage(None));
    table.save(&Classroom::new(" 305 ")).await.unwrap();

    assert!(source.is_invalidated());
    assert_eq!(table.dialog(), None);
    assert_eq!(
        table.events().current().as_ref().map(|e| e.payload.clone()),
        Some(TableEvent::Saved)
    );

    settle(&mut stream).await;
    assert_eq!(count_requests(&server, "GET").await, 2);
}

#[tokio::test]
async fn test_save_all_posts_each_record_and_reloads_once() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classrooms(1..=2)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(50)))
        .expect(3)
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    let mut stream = table.observe();
    settle(&mut stream).await;
    let source = table.pager().source().unwrap();

    let rooms = [Classroom::new("301"), Classroom::new("302"), Classroom::new("303")];
    table.save_all(&rooms).await.unwrap();

    assert!(source.is_invalidated());
    assert!(!table.loading().is_loading());
    assert_eq!(
        table.events().current().as_ref().map(|e| e.payload.clone()),
        Some(TableEvent::Saved)
    );

    settle(&mut stream).await;
    assert_eq!(count_requests(&server, "POST").await, 3);
    assert_eq!(count_requests(&server, "GET").await, 2);
}

#[tokio::test]
async fn test_save_all_sends_nothing_when_one_record_is_invalid() {
    let (server, backend) = setup().await;

    let repository = backend.repository::<Classroom>();
    let err = repository
        .save_all(&[Classroom::new("301"), Classroom::new(" ")])
        .await
        .unwrap_err();

    assert!(matches!(err, timetable_core::CoreError::Validation { .. }));
    assert_eq!(count_requests(&server, "POST").await, 0);
}

#[tokio::test]
async fn test_save_existing_record_puts_by_id() {
    let (server, backend) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/classroom/4"))
        .and(body_json(json!({ "name": "Gym" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let repository = backend.repository::<Classroom>();
    let classroom = Classroom {
        id: Some(EntityId::new(4)),
        name: "Gym".into(),
    };
    repository.save(&classroom).await.unwrap();
}

#[tokio::test]
async fn test_slow_save_reports_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classroom"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_timeout(Duration::from_secs(1));
    let client = ApiClient::new(&server.uri(), &transport).unwrap();
    let backend = Backend::from_client(client, PagerConfig::new(10, 5));

    let err = backend
        .repository::<Classroom>()
        .save(&Classroom::new("Lab"))
        .await
        .unwrap_err();

    assert!(matches!(err, timetable_core::CoreError::Timeout { timeout_secs: 1 }), "got: {err:?}");
    assert_eq!(err.to_string(), "Request timed out after 1s");
    assert_eq!(err.kind(), ErrorKind::TimeoutFailure);
}

#[tokio::test]
async fn test_invalid_record_is_not_sent() {
    let (server, backend) = setup().await;

    let table = backend.table::<Classroom>();
    table.open_dialog(TableDialog::Manage(None));

    let err = table.save(&Classroom::new("   ")).await.unwrap_err();

    assert!(matches!(err, timetable_core::CoreError::Validation { .. }));
    assert_eq!(table.dialog(), Some(TableDialog::Manage(None)));
    assert!(matches!(
        table.events().current().as_ref().map(|e| &e.payload),
        Some(TableEvent::Message(_))
    ));
    assert!(!table.loading().is_loading());
    assert_eq!(count_requests(&server, "POST").await, 0);
}

#[tokio::test]
async fn test_failed_delete_keeps_selection() {
    let (server, backend) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/classroom/5"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "classroom is in use" })),
        )
        .mount(&server)
        .await;

    let table = backend.table::<Classroom>();
    table.set_row_selection(EntityId::new(5), true);

    let err = table.delete_selected().await.unwrap_err();

    assert_eq!(err.user_message(), "classroom is in use");
    assert_eq!(table.selection().len(), 1);
    assert_eq!(
        table.events().current().as_ref().map(|e| e.payload.clone()),
        Some(TableEvent::Message("classroom is in use".into()))
    );
}
