//! JSON-RPC balance provider tests against a local HTTP listener

use keyvault::{Balance, BalanceProvider, ChainKind, Error, JsonRpcBalanceProvider, ProviderConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const ETH_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
const SOL_ADDRESS: &str = "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk";

/// Request as seen by the listener
struct RecordedRequest {
    head: String,
    body: Value,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Accept one connection, record its request and answer with a canned response
async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: String,
) -> (String, JoinHandle<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (url, handle)
}

async fn read_request(socket: &mut TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    if key.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    let end = find_header_end(&buf).unwrap();
    RecordedRequest {
        head: String::from_utf8_lossy(&buf[..end]).to_string(),
        body: serde_json::from_slice(&buf[end + 4..]).unwrap(),
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn provider_for(url: &str) -> JsonRpcBalanceProvider {
    let config = ProviderConfig::new(url).with_api_key("secret-key");
    JsonRpcBalanceProvider::new(config.clone(), config).unwrap()
}

#[tokio::test]
async fn test_ethereum_balance_over_http() {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "result": "0x3782dace9d900000" });
    let (url, server) = serve_once("200 OK", "application/json", body.to_string()).await;

    let balance = provider_for(&url)
        .fetch_balance(ChainKind::Ethereum, ETH_ADDRESS)
        .await
        .unwrap();
    assert_eq!(balance, Balance::new(ChainKind::Ethereum, 4_000_000_000_000_000_000));
    assert_eq!(balance.to_string(), "4 ETH");

    let request = server.await.unwrap();
    assert!(request.head.starts_with("POST / HTTP/1.1"));
    assert_eq!(request.header("authorization"), Some("Bearer secret-key"));
    assert_eq!(request.body["jsonrpc"], "2.0");
    assert_eq!(request.body["method"], "eth_getBalance");
    assert_eq!(request.body["params"], json!([ETH_ADDRESS, "latest"]));
}

#[tokio::test]
async fn test_solana_balance_over_http() {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": { "context": { "slot": 287 }, "value": 1_000_000_000u64 }
    });
    let (url, server) = serve_once("200 OK", "application/json", body.to_string()).await;

    let balance = provider_for(&url)
        .fetch_balance(ChainKind::Solana, SOL_ADDRESS)
        .await
        .unwrap();
    assert_eq!(balance.to_string(), "1 SOL");

    let request = server.await.unwrap();
    assert_eq!(request.body["method"], "getBalance");
    assert_eq!(request.body["params"], json!([SOL_ADDRESS]));
}

#[tokio::test]
async fn test_no_authorization_header_without_api_key() {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "result": "0x0" });
    let (url, server) = serve_once("200 OK", "application/json", body.to_string()).await;

    let config = ProviderConfig::new(url.as_str());
    let provider = JsonRpcBalanceProvider::new(config.clone(), config).unwrap();
    let balance = provider.fetch_balance(ChainKind::Ethereum, ETH_ADDRESS).await.unwrap();
    assert_eq!(balance.base_units(), 0);

    let request = server.await.unwrap();
    assert_eq!(request.header("authorization"), None);
}

#[tokio::test]
async fn test_json_rpc_error_member_is_a_provider_error() {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": -32602, "message": "invalid params" }
    });
    let (url, server) = serve_once("200 OK", "application/json", body.to_string()).await;

    let err = provider_for(&url)
        .fetch_balance(ChainKind::Solana, SOL_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ref msg) if msg.contains("invalid params")));
    server.await.unwrap();
}

#[tokio::test]
async fn test_malformed_quantity_is_a_provider_error() {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "result": "0x+1" });
    let (url, server) = serve_once("200 OK", "application/json", body.to_string()).await;

    let err = provider_for(&url)
        .fetch_balance(ChainKind::Ethereum, ETH_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_non_json_server_error_is_a_provider_error() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        "text/plain",
        "upstream unavailable".to_string(),
    )
    .await;

    let err = provider_for(&url)
        .fetch_balance(ChainKind::Ethereum, ETH_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ref msg) if msg.contains("500")));
    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = provider_for(&url)
        .fetch_balance(ChainKind::Solana, SOL_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}
