use weft::{Response, Scope};

async fn reply(id: &'static str) -> Response {
    Response::new(200).text(id)
}

macro_rules! handler {
    ($id:literal) => {{
        async fn h() -> Response {
            reply($id).await
        }
        h
    }};
}

#[tokio::test]
async fn static_beats_param_beats_wildcard() {
    let router = Scope::root()
        .get("/api/v1/x", handler!("10"))
        .unwrap()
        .get("/api/v1/{x}", handler!("12"))
        .unwrap()
        .get("/api/v1/x/y", handler!("20"))
        .unwrap()
        .get("/api/v1/x/{y}", handler!("21"))
        .unwrap()
        .get("/api/v1/{x}/y", handler!("22"))
        .unwrap()
        .get("/api/v1/{x}/{y}", handler!("23"))
        .unwrap()
        .finish()
        .unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    assert_eq!(app.client.get("/api/v1/x/y").await.text(), "20");
    assert_eq!(app.client.get("/api/v1/xx/y").await.text(), "22");
    assert_eq!(app.client.get("/api/v1/x/yy").await.text(), "21");
}
