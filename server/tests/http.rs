use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use drawing_server::diagram_store::DiagramStore;
use drawing_server::handlers;
use system::serde_json::{json, Value};

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data($store.clone())
                .configure(handlers::root),
        )
        .await
    };
}

fn store() -> web::Data<DiagramStore> {
    web::Data::new(DiagramStore::in_memory())
}

#[actix_web::test]
async fn it_should_return_submitted_strokes() {
    let store = store();
    let app = app!(store);
    let strokes = json!([
        { "points": [{ "x": 1, "y": 2 }, { "x": 3.5, "y": -4 }], "color": "#222" },
        { "points": [] }
    ]);

    let req = test::TestRequest::post()
        .uri("/diagrams")
        .set_json(json!({ "owner": "alice", "title": "flowchart", "strokes": strokes }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["message"], "Diagram saved successfully");
    let id = created["id"].as_i64().expect("id");

    let req = test::TestRequest::get()
        .uri(&format!("/diagrams/{}", id))
        .to_request();
    let diagram: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(diagram["strokes"], strokes);
    assert_eq!(diagram["owner"], "alice");
    assert_eq!(diagram["title"], "flowchart");
    assert_eq!(diagram["is_shared"], false);
    assert!(diagram["created_at"].is_string());
}

#[actix_web::test]
async fn it_should_reject_diagram_without_title() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/diagrams")
        .set_json(json!({ "owner": "alice", "strokes": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Owner and title are required");

    let req = test::TestRequest::post()
        .uri("/diagrams")
        .set_json(json!({ "owner": "alice", "title": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(store.list_by_owner("alice").await.is_empty());
}

#[actix_web::test]
async fn it_should_reject_malformed_json() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/diagrams")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
}

#[actix_web::test]
async fn it_should_report_missing_diagram() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get().uri("/diagrams/404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Diagram not found");
}

#[actix_web::test]
async fn it_should_list_owner_diagrams_newest_first_without_strokes() {
    let store = store();
    let app = app!(store);

    for (owner, title) in [("alice", "first"), ("bob", "unrelated"), ("alice", "second")] {
        let req = test::TestRequest::post()
            .uri("/diagrams")
            .set_json(json!({ "owner": owner, "title": title, "strokes": [{ "points": [] }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::get()
        .uri("/diagrams/user/alice")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    let titles: Vec<&str> = listed
        .iter()
        .map(|d| d["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
    assert!(listed.iter().all(|d| d.get("strokes").is_none()));
    assert!(listed.iter().all(|d| d["owner"] == "alice"));
}

#[actix_web::test]
async fn it_should_never_list_private_diagrams_as_shared() {
    let store = store();
    let app = app!(store);

    for (title, is_shared) in [("private", json!(false)), ("public", json!(true)), ("implicit", Value::Null)] {
        let req = test::TestRequest::post()
            .uri("/diagrams")
            .set_json(json!({ "owner": "carol", "title": title, "is_shared": is_shared }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::get().uri("/diagrams/shared").to_request();
    let shared: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["title"], "public");
    assert_eq!(shared[0]["is_shared"], true);
}

#[actix_web::test]
async fn it_should_simplify_strokes() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/ai/cleanup")
        .set_json(json!({
            "strokes": [
                { "points": [{ "x": 1, "y": 1 }, { "x": 41, "y": 1 }, { "x": 82, "y": 79 }] },
                { "points": [] }
            ]
        }))
        .to_request();
    let cleaned: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        cleaned,
        json!({
            "strokes": [
                { "points": [{ "x": 0, "y": 0 }, { "x": 80, "y": 80 }] }
            ]
        })
    );
}

#[actix_web::test]
async fn it_should_not_fail_cleanup_on_malformed_input() {
    let store = store();
    let app = app!(store);

    for payload in ["garbage", "{}", "{\"strokes\": 5}"] {
        let req = test::TestRequest::post()
            .uri("/ai/cleanup")
            .insert_header(("content-type", "application/json"))
            .set_payload(payload)
            .to_request();
        let cleaned: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cleaned, json!({ "strokes": [] }));
    }

    let req = test::TestRequest::post()
        .uri("/ai/cleanup")
        .set_json(json!({ "strokes": [{ "points": [{ "y": 61 }, null] }] }))
        .to_request();
    let cleaned: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        cleaned,
        json!({ "strokes": [{ "points": [{ "x": 0, "y": 80 }, { "x": 0, "y": 0 }] }] })
    );
}

#[actix_web::test]
async fn it_should_simplify_stroke_sets_larger_than_default_body_limit() {
    let store = store();
    let app = app!(store);

    let points: Vec<Value> = (0..12_000)
        .map(|i| json!({ "x": i * 3 + 1, "y": 1234.5678 }))
        .collect();
    let body = json!({ "strokes": [{ "points": points }] }).to_string();
    assert!(body.len() > 256 * 1024);

    let req = test::TestRequest::post()
        .uri("/ai/cleanup")
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cleaned: Value = test::read_body_json(resp).await;
    let kept = cleaned["strokes"][0]["points"].as_array().expect("points");
    // Every fifth index, plus the last point at 11999.
    assert_eq!(kept.len(), 2_401);
    assert_eq!(kept[0], json!({ "x": 0, "y": 1240 }));
}

#[actix_web::test]
async fn it_should_save_diagrams_larger_than_default_json_limit() {
    let store = store();
    let app = app!(store);

    let points: Vec<Value> = (0..80_000)
        .map(|i| json!({ "x": i, "y": i, "pressure": 0.5 }))
        .collect();
    let strokes = json!([{ "points": points }]);
    let body = json!({ "owner": "dave", "title": "mural", "strokes": strokes }).to_string();
    assert!(body.len() > 2 * 1024 * 1024);

    let req = test::TestRequest::post()
        .uri("/diagrams")
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_i64().expect("id");

    let diagram = store.get_by_id(id).await.expect("read").expect("present");
    assert_eq!(diagram.strokes, strokes);
}

#[actix_web::test]
async fn it_should_answer_on_root() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["message"].is_string());
}
