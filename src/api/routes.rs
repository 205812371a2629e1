use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        // Public pages
        .route("/", get(handlers::index))
        .route("/buscar", get(handlers::search))
        .route("/:category", get(handlers::list_category))
        // Administration
        .route("/gerenciar", get(handlers::manage).post(handlers::login))
        .route(
            "/adicionar",
            get(handlers::upload_form)
                .post(handlers::upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/deletar/:id", get(handlers::delete_file))
        // Stored files (local backend)
        .route("/static/uploads/:name", get(handlers::serve_upload))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use super::*;
    use crate::session::SESSION_COOKIE;
    use crate::testutil::{test_state, TEST_PASSWORD};

    const BOUNDARY: &str = "----catalog-test-boundary";

    fn admin_cookie(state: &AppState) -> String {
        format!("{SESSION_COOKIE}={}", state.admin.issue_token())
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"arquivo\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(cookie: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/adicionar")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> Response {
        create_router(Arc::clone(state)).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn ohm_upload() -> Vec<u8> {
        multipart_body(
            &[
                ("nome", "Lei de Ohm"),
                ("descricao", "slides"),
                ("categoria", "fisica"),
            ],
            Some(("ohm.pdf", b"%PDF-1.4 ohm")),
        )
    }

    #[tokio::test]
    async fn test_admin_upload_then_browse_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let cookie = admin_cookie(&state);

        let resp = send(&state, upload_request(Some(&cookie), ohm_upload())).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/gerenciar");

        let resp = send(&state, get("/fisica", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        let files = json["data"]["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["name"], "Lei de Ohm");
        assert_eq!(files[0]["url"], "/static/uploads/ohm.pdf");

        let json = body_json(send(&state, get("/buscar?q=Ohm", None)).await).await;
        assert_eq!(json["data"]["term"], "Ohm");
        assert_eq!(json["data"]["results"][0]["location"], "ohm.pdf");

        let resp = send(&state, get("/static/uploads/ohm.pdf", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(body_text(resp).await, "%PDF-1.4 ohm");

        let json = body_json(send(&state, get("/", None)).await).await;
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["categories"][0]["category"], "fisica");
        assert_eq!(json["data"]["categories"][0]["count"], 1);
    }

    #[tokio::test]
    async fn test_upload_without_session_redirects_and_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let resp = send(&state, upload_request(None, ohm_upload())).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/gerenciar");

        let forged = format!("{SESSION_COOKIE}=forged.token");
        let resp = send(&state, upload_request(Some(&forged), ohm_upload())).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        assert_eq!(state.catalog.db().count_files().unwrap(), 0);
        assert!(!dir.path().join("uploads").join("ohm.pdf").exists());
    }

    #[tokio::test]
    async fn test_upload_form_requires_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let resp = send(&state, get("/adicionar", None)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let cookie = admin_cookie(&state);
        let json = body_json(send(&state, get("/adicionar", Some(&cookie))).await).await;
        assert_eq!(json["data"]["fields"][0], "arquivo");
    }

    #[tokio::test]
    async fn test_upload_validation_messages_are_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let cookie = admin_cookie(&state);

        let no_file = multipart_body(&[("nome", "Lei de Ohm")], None);
        let resp = send(&state, upload_request(Some(&cookie), no_file)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Nenhum arquivo enviado");

        let empty_name = multipart_body(
            &[
                ("nome", "Lei de Ohm"),
                ("descricao", "slides"),
                ("categoria", "fisica"),
            ],
            Some(("", b"")),
        );
        let resp = send(&state, upload_request(Some(&cookie), empty_name)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Nenhum arquivo selecionado");

        assert_eq!(state.catalog.db().count_files().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_without_session_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let cookie = admin_cookie(&state);

        for _ in 0..3 {
            send(&state, upload_request(Some(&cookie), ohm_upload())).await;
        }
        assert_eq!(state.catalog.db().count_files().unwrap(), 3);

        let resp = send(&state, get("/deletar/3", None)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(resp).await, "Acesso negado.");
        assert!(state.catalog.get(3).is_ok());
    }

    #[tokio::test]
    async fn test_delete_as_admin() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let cookie = admin_cookie(&state);

        send(&state, upload_request(Some(&cookie), ohm_upload())).await;

        let resp = send(&state, get("/deletar/1", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/gerenciar");
        assert_eq!(state.catalog.db().count_files().unwrap(), 0);

        let resp = send(&state, get("/deletar/1", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&state, get("/deletar/abc", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let request = Request::builder()
            .method("POST")
            .uri("/gerenciar")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("senha=errada"))
            .unwrap();
        let resp = send(&state, request).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_text(resp).await, "Senha Incorreta. Tente novamente.");
    }

    #[tokio::test]
    async fn test_login_then_manage() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let json = body_json(send(&state, get("/gerenciar", None)).await).await;
        assert_eq!(json["data"]["authenticated"], false);
        assert!(json["data"].get("files").is_none());

        let request = Request::builder()
            .method("POST")
            .uri("/gerenciar")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("senha={TEST_PASSWORD}")))
            .unwrap();
        let resp = send(&state, request).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/gerenciar");

        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
        assert!(set_cookie.contains("HttpOnly"));

        let json = body_json(send(&state, get("/gerenciar", Some(&cookie))).await).await;
        assert_eq!(json["data"]["authenticated"], true);
        assert_eq!(json["data"]["files"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_search_without_term_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let cookie = admin_cookie(&state);
        send(&state, upload_request(Some(&cookie), ohm_upload())).await;

        for uri in ["/buscar", "/buscar?q="] {
            let json = body_json(send(&state, get(uri, None)).await).await;
            assert_eq!(json["data"]["results"].as_array().unwrap().len(), 0);
        }
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let resp = send(&state, get("/quimica", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&state, get("/robotica", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let json = body_json(send(&state, get("/_internal/health", None)).await).await;
        assert_eq!(json["data"]["status"], "ok");
    }
}
