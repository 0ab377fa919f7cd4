//! Shared utilities for integration tests.

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::hex;
use alloy::primitives::{address, keccak256, Address};
use serde_json::{json, Value};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use dca_submitter::SubmitterConfig;

// Anvil's first account. Publicly known, never use for real funds.
pub const OPERATOR_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OPERATOR_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const CONTRACT: Address = address!("dc1ecb9dbb04859fd81fbe5efb5ce766e9dabf4d");
pub const TOKEN: Address = address!("f08a50178dfcde18524640ea6618a1f965821715");
pub const CHAIN_ID: u64 = 31337;

/// Error code a handler returns to make the stub close the socket unanswered.
pub const DROP_CONNECTION: i64 = i64::MIN;

/// JSON-RPC handler: method + params to result or (code, message).
pub type Handler = dyn Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + Sync;

/// A stub JSON-RPC node on localhost.
pub struct StubNode {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

#[allow(dead_code)]
impl StubNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Methods called so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Raw transactions received through `eth_sendRawTransaction`.
    pub fn raw_transactions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == "eth_sendRawTransaction")
            .filter_map(|(_, p)| p.get(0).and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

/// Start a stub node answering with `handler`.
pub async fn start_stub_node<F>(handler: F) -> StubNode
where
    F: Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler: Arc<Handler> = Arc::new(handler);

    let recorded = calls.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let _ = serve_connection(socket, handler, recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    StubNode { addr, calls }
}

async fn serve_connection(
    mut socket: TcpStream,
    handler: Arc<Handler>,
    recorded: Arc<Mutex<Vec<(String, Value)>>>,
) -> std::io::Result<()> {
    let Some(body) = read_http_body(&mut socket).await? else {
        return Ok(());
    };

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let response = match request {
        Value::Array(batch) => batch
            .iter()
            .map(|call| answer(call, &handler, &recorded))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        call => answer(&call, &handler, &recorded),
    };

    let Some(response) = response else {
        return socket.shutdown().await;
    };

    let body = response.to_string();
    let response_str = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    socket.write_all(response_str.as_bytes()).await?;
    socket.shutdown().await
}

fn answer(
    call: &Value,
    handler: &Arc<Handler>,
    recorded: &Arc<Mutex<Vec<(String, Value)>>>,
) -> Option<Value> {
    let id = call.get("id").cloned().unwrap_or(Value::Null);
    let method = call.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = call.get("params").cloned().unwrap_or(Value::Null);
    recorded
        .lock()
        .unwrap()
        .push((method.to_string(), params.clone()));

    match handler(method, &params) {
        Ok(result) => Some(json!({ "jsonrpc": "2.0", "id": id, "result": result })),
        Err((DROP_CONNECTION, _)) => None,
        Err((code, message)) => Some(
            json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }),
        ),
    }
}

async fn read_http_body(socket: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = (body_start + content_length).min(buf.len());
    Ok(Some(buf[body_start..body_end].to_vec()))
}

/// Address that signed a raw legacy transaction, checked independently of the crate.
pub fn raw_signer(raw_hex: &str) -> Option<Address> {
    let raw = hex::decode(raw_hex).ok()?;
    match TxEnvelope::decode_2718(&mut raw.as_slice()).ok()? {
        TxEnvelope::Legacy(signed) => signed
            .signature()
            .recover_address_from_prehash(&signed.signature_hash())
            .ok(),
        _ => None,
    }
}

/// Block the stub reports as latest and mines every transaction into.
pub const HEAD_BLOCK: u64 = 0x10;

/// Gas price the stub quotes through `eth_gasPrice`: 20 gwei.
pub const QUOTED_GAS_PRICE: u128 = 20_000_000_000;

/// A mined receipt for `tx_hash` in [`HEAD_BLOCK`].
pub fn receipt(tx_hash: &Value, sender: Address, success: bool) -> Value {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": format!("{:#x}", HEAD_BLOCK),
        "from": sender,
        "to": CONTRACT,
        "cumulativeGasUsed": "0x1d4c0",
        "gasUsed": "0x1d4c0",
        "effectiveGasPrice": "0x6fc23ac00",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "status": if success { "0x1" } else { "0x0" },
    })
}

/// A well-behaved node: fixed chain and nonce, accepts transactions signed by
/// `sender` and mines them into [`HEAD_BLOCK`].
pub fn node(chain_id: u64, nonce: u64, sender: Address) -> impl Fn(&str, &Value) -> Result<Value, (i64, String)> {
    move |method, params| match method {
        "eth_chainId" => Ok(json!(format!("{:#x}", chain_id))),
        "eth_getTransactionCount" => Ok(json!(format!("{:#x}", nonce))),
        "eth_gasPrice" => Ok(json!(format!("{:#x}", QUOTED_GAS_PRICE))),
        "eth_blockNumber" => Ok(json!(format!("{:#x}", HEAD_BLOCK))),
        "eth_getTransactionReceipt" => Ok(receipt(&params[0], sender, true)),
        "eth_sendRawTransaction" => {
            let raw_hex = params.get(0).and_then(Value::as_str).unwrap_or_default();
            match raw_signer(raw_hex) {
                Some(signer) if signer == sender => {
                    let raw = hex::decode(raw_hex).unwrap_or_default();
                    Ok(json!(keccak256(&raw).to_string()))
                }
                _ => Err((-32000, "invalid sender".to_string())),
            }
        }
        other => Err((-32601, format!("method {} not supported", other))),
    }
}

/// Scratch directory with an operator key and config, removed on drop.
pub struct Workspace {
    pub dir: PathBuf,
}

#[allow(dead_code)]
impl Workspace {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("dca-it-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("keys")).unwrap();
        fs::write(dir.join(".privateKey.txt"), format!("{}\n", OPERATOR_KEY)).unwrap();
        Self { dir }
    }

    pub fn key_file(&self) -> PathBuf {
        self.dir.join(".privateKey.txt")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.dir.join("keys")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join("dca-journal.json")
    }

    /// Deposit key files written so far.
    pub fn deposit_key_files(&self) -> Vec<PathBuf> {
        fs::read_dir(self.keys_dir())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    /// Valid configuration pointing at `rpc_url`.
    pub fn config(&self, rpc_url: &str) -> SubmitterConfig {
        let mut config = SubmitterConfig::default();
        config.blockchain.rpc_url = rpc_url.to_string();
        config.blockchain.chain_id = CHAIN_ID;
        config.blockchain.rpc_timeout_secs = 5;
        config.contract.address = Some(CONTRACT);
        config.contract.abi_path = abi_path();
        config.dca.token = Some(TOKEN);
        config.secrets.key_file = self.key_file();
        config.secrets.deposit_key_dir = self.keys_dir();
        config.secrets.journal_path = self.journal_path();
        config
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// The sample descriptor shipped with the crate.
pub fn abi_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("abi/DCAContract.json")
}
