use weft::{Response, Scope};

async fn echo(body: String) -> Response {
    Response::new(200).text(body)
}

#[tokio::test]
async fn serves_pipelined_requests_in_order() {
    let router = Scope::root().post("/", echo).unwrap().finish().unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    let bodies: Vec<String> = (0..10).map(|i| format!("sequence: {i}")).collect();
    let requests: Vec<(&str, &str, &[(&str, &str)], &[u8])> = bodies
        .iter()
        .map(|b| ("POST", "/", &[][..], b.as_bytes()))
        .collect();

    let responses = app.client.pipeline(&requests).await;

    assert_eq!(responses.len(), 10);
    for (i, res) in responses.iter().enumerate() {
        assert_eq!(res.status, 200);
        assert_eq!(res.text(), format!("sequence: {i}"));
    }
}
