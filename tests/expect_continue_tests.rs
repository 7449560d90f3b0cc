use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use weft::{Response, Scope};

async fn echo(body: String) -> Response {
    Response::new(200).text(body)
}

#[tokio::test]
async fn emits_100_continue_before_final_response() {
    let router = Scope::root().post("/post", echo).unwrap().finish().unwrap();
    let app = weft::testing::TestApp::spawn(router).await;

    let mut stream = TcpStream::connect(app.addr).await.unwrap();
    stream
        .write_all(
            b"POST /post HTTP/1.1\r\nHost: test\r\nExpect: 100-continue\r\nContent-Length: 4\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();

    let mut buf = vec![0u8; 256];
    let n = stream.read(&mut buf).await.unwrap();
    assert!(
        buf[..n].starts_with(b"HTTP/1.1 100 Continue\r\n"),
        "expected a 100 Continue status line, got {:?}",
        String::from_utf8_lossy(&buf[..n])
    );

    stream.write_all(b"text").await.unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    let text = String::from_utf8_lossy(&rest);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("text"));
}
