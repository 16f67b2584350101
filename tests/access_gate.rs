use actix_web::{http::StatusCode, test, web, App};
use liteshare_relay::{configure_routes, AppState, Settings};

fn state(token: Option<&str>) -> web::Data<AppState> {
    let config = Settings::new_for_test()
        .expect("Failed to load test config")
        .with_token_override(token.map(str::to_string));
    web::Data::new(AppState::new(config))
}

#[actix_web::test]
async fn test_missing_or_wrong_token_is_forbidden() {
    let app = test::init_service(
        App::new()
            .app_data(state(Some("secret-token")))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    for uri in ["/ws", "/ws?token=", "/ws?token=nope"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "uri {}", uri);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["status"], 403);
        assert_eq!(body["error"]["message"], "Authentication error: Invalid API token");
    }
}

#[actix_web::test]
async fn test_matching_token_reaches_handshake() {
    let app = test::init_service(
        App::new()
            .app_data(state(Some("secret-token")))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    // Not an upgrade request, so the handshake itself refuses it.
    let req = test::TestRequest::get().uri("/ws?token=secret-token").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_disabled_gate_reaches_handshake() {
    let app = test::init_service(
        App::new()
            .app_data(state(None))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    let req = test::TestRequest::get().uri("/ws").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_index_embeds_token() {
    let app = test::init_service(
        App::new()
            .app_data(state(Some("page-token")))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let page = std::str::from_utf8(&body).unwrap();

    assert!(page.contains(r#"window.LITESHARE_TOKEN = "page-token";"#));
    assert!(!page.contains(liteshare_relay::TOKEN_PLACEHOLDER));
}

#[actix_web::test]
async fn test_static_assets_are_served() {
    let app = test::init_service(
        App::new()
            .app_data(state(None))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    let req = test::TestRequest::get().uri("/static/app.js").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/static/app.js").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let script = std::str::from_utf8(&body).unwrap();
    assert!(script.contains("window.LITESHARE_TOKEN"));
    assert!(script.contains("/ws"));
    for profile in ["normal:", "lite:", "ultra:"] {
        assert!(script.contains(profile), "missing {} profile", profile);
    }
}

#[actix_web::test]
async fn test_index_has_share_controls() {
    let app = test::init_service(
        App::new()
            .app_data(state(None))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let page = std::str::from_utf8(&body).unwrap();

    for id in ["joinBtn", "shareBtn", "stopShareBtn", "hangupBtn", "liteOnBtn", "liteOffBtn", "stats"] {
        assert!(page.contains(&format!(r#"id="{}""#, id)), "missing #{}", id);
    }
    assert!(page.contains(r#"window.LITESHARE_TOKEN = "";"#));
}

#[actix_web::test]
async fn test_index_escapes_hostile_token() {
    let token = "x\"</script><script>alert(1)</script>";
    let app = test::init_service(
        App::new()
            .app_data(state(Some(token)))
            .configure(|cfg| configure_routes(cfg, "public"))
    ).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let page = std::str::from_utf8(&body).unwrap();

    // The page keeps exactly one inline script closing tag plus the asset script's.
    assert_eq!(page.matches("</script>").count(), 2);
    assert!(!page.contains("alert(1)</script>"));

    let line = page
        .lines()
        .find(|l| l.contains("window.LITESHARE_TOKEN"))
        .expect("token assignment present");
    let literal = line
        .trim()
        .trim_start_matches("<script>window.LITESHARE_TOKEN = ")
        .trim_end_matches(";</script>");
    let decoded: String = serde_json::from_str(literal).unwrap();
    assert_eq!(decoded, token);
}
