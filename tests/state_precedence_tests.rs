use weft::{Response, Scope, StateOf};

async fn report(state: StateOf<&'static str>) -> Response {
    Response::new(200).text(*state.0)
}

#[tokio::test]
async fn inner_scope_and_route_state_shadow_outer() {
    let route_scope = Scope::new("/route")
        .unwrap()
        .state("route")
        .get("/", report)
        .unwrap();
    let scope_only = Scope::new("/scope").unwrap().get("/", report).unwrap();
    let global_only = Scope::new("/global").unwrap().get("/", report).unwrap();

    let api = Scope::new("/api/v1")
        .unwrap()
        .state("scope")
        .serve(route_scope)
        .serve(scope_only);

    let router = Scope::root()
        .state("global")
        .serve(api)
        .serve(global_only)
        .finish()
        .unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    assert_eq!(app.client.get("/api/v1/route/").await.text(), "route");
    assert_eq!(app.client.get("/api/v1/scope/").await.text(), "scope");
    assert_eq!(app.client.get("/global/").await.text(), "global");
}
