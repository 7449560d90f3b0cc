use weft::{Response, Scope};

async fn filmography(path: weft::PathInfo, query: weft::QueryMap) -> Response {
    let user = path.get("user").unwrap_or("");
    let year = path.get("year").unwrap_or("");
    let name = query.get("name").unwrap_or("");
    Response::new(200).text(format!("{user}/{year}/{name}"))
}

#[tokio::test]
async fn extracts_path_params_and_query() {
    let router = Scope::root()
        .get(
            "/api/v1/users/{user}/filmography/years/{year}",
            filmography,
        )
        .unwrap()
        .finish()
        .unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    let res = app
        .client
        .get("/api/v1/users/Rina%20Hidaka/filmography/years/2022?name=Rina%20Hidaka")
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "Rina Hidaka/2022/Rina Hidaka");
}
