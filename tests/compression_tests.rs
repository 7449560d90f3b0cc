use flate2::read::GzDecoder;
use std::io::Read;

use weft::{Response, Scope};

async fn alphabet() -> Response {
    Response::new(200).text("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789")
}

#[tokio::test]
async fn gzip_round_trips_and_sets_vary() {
    let router = Scope::root()
        .wrap(weft::compression::gzip())
        .get("/", alphabet)
        .unwrap()
        .finish()
        .unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    let res = app
        .client
        .request("GET", "/", &[("accept-encoding", "gzip")], b"")
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.headers.get("content-encoding"), Some("gzip"));
    assert_eq!(res.headers.get("vary"), Some("content-encoding"));

    let mut decoder = GzDecoder::new(&res.body[..]);
    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).unwrap();
    assert_eq!(
        decoded,
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
    );
}
