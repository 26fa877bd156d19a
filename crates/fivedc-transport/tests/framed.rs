//! Integration tests for the framed transport.
//!
//! These spin up a real TCP listener (or an in-memory duplex pipe) and use
//! the line codec from `tokio_util`, so framing is exercised without any
//! knowledge of the match protocol.

use fivedc_transport::{Connection, FramedConnection, TcpConnection};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::codec::{LinesCodec, LinesCodecError};

#[tokio::test]
async fn test_tcp_connect_and_send_receive() {
    // Port 0 lets the OS pick a free port.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr").to_string();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("should accept");
        let mut buf = [0u8; 6];
        socket.read_exact(&mut buf).await.expect("should read");
        socket.write_all(b"world\n").await.expect("should write");
        buf
    });

    let mut conn = TcpConnection::connect(&addr, LinesCodec::new())
        .await
        .expect("should connect");
    assert!(conn.id().into_inner() > 0);

    conn.send("hello".to_string())
        .await
        .expect("send should succeed");

    let reply = conn
        .recv()
        .await
        .expect("should have a line")
        .expect("recv should succeed");
    assert_eq!(reply, "world");

    let seen_by_server = server.await.expect("task should complete");
    assert_eq!(&seen_by_server, b"hello\n");
}

#[tokio::test]
async fn test_tcp_connect_refused_returns_error() {
    // Bind then drop to get an address nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = TcpConnection::connect(&addr, LinesCodec::new()).await;
    assert!(result.is_err(), "connecting to a closed port should fail");
}

#[tokio::test]
async fn test_duplex_recv_returns_none_on_peer_close() {
    let (client_side, server_side) = tokio::io::duplex(64);
    let mut conn = FramedConnection::new(client_side, LinesCodec::new());

    drop(server_side);

    assert!(conn.recv().await.is_none(), "should return None on peer close");
}

#[tokio::test]
async fn test_duplex_frame_split_across_writes_is_reassembled() {
    let (client_side, mut server_side) = tokio::io::duplex(64);
    let mut conn = FramedConnection::new(client_side, LinesCodec::new());

    server_side.write_all(b"abc").await.unwrap();
    tokio::task::yield_now().await;
    server_side.write_all(b"def\nxyz\n").await.unwrap();

    assert_eq!(conn.recv().await.unwrap().unwrap(), "abcdef");
    assert_eq!(conn.recv().await.unwrap().unwrap(), "xyz");
}

#[tokio::test]
async fn test_duplex_codec_error_is_surfaced() {
    let (client_side, mut server_side) = tokio::io::duplex(64);
    let mut conn = FramedConnection::new(client_side, LinesCodec::new_with_max_length(4));

    server_side.write_all(b"too long\n").await.unwrap();

    let err = conn.recv().await.unwrap().unwrap_err();
    assert!(matches!(err, LinesCodecError::MaxLineLengthExceeded));
}

#[tokio::test]
async fn test_duplex_close_shuts_down_write_side() {
    let (client_side, mut server_side) = tokio::io::duplex(64);
    let mut conn = FramedConnection::new(client_side, LinesCodec::new());

    conn.send("bye".to_string()).await.unwrap();
    conn.close().await.expect("close should succeed");

    let mut all = Vec::new();
    server_side.read_to_end(&mut all).await.unwrap();
    assert_eq!(all, b"bye\n");
}
