//! Scripted mock node for pipeline tests.
//!
//! A minimal blocking JSON-RPC server on an OS thread. Each submission gets
//! a predictable hash (`0xtx{n}`), and status polls answer with the scripted
//! status for that submission index. Submitted transactions are recorded so
//! tests can assert on exactly what reached the node.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

struct MockState {
    limit: Value,
    cost: Value,
    statuses: Vec<Value>,
    submissions: Vec<Value>,
}

pub struct MockNode {
    url: String,
    state: Arc<Mutex<MockState>>,
    shutdown: Arc<AtomicBool>,
    _thread: thread::JoinHandle<()>,
}

impl MockNode {
    /// Spawn a node reporting the given weight limit and aggregate cost,
    /// answering status polls for submission `n` with `statuses[n]`
    /// (finalized immediately when unscripted).
    pub fn spawn(limit: Value, cost: Value, statuses: Vec<Value>) -> Self {
        let state = Arc::new(Mutex::new(MockState {
            limit,
            cost,
            statuses,
            submissions: Vec::new(),
        }));
        let shutdown = Arc::new(AtomicBool::new(false));

        let (addr_tx, addr_rx) = mpsc::channel();
        let thread_state = Arc::clone(&state);
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::spawn(move || serve(thread_state, thread_shutdown, addr_tx));

        let addr = addr_rx.recv().expect("recv addr");
        MockNode {
            url: format!("http://127.0.0.1:{}", addr.port()),
            state,
            shutdown,
            _thread: handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every transaction the node has accepted, in submission order.
    pub fn submissions(&self) -> Vec<Value> {
        self.state.lock().unwrap().submissions.clone()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // The accept loop exits on the next incoming connection.
    }
}

fn serve(
    state: Arc<Mutex<MockState>>,
    shutdown: Arc<AtomicBool>,
    addr_tx: mpsc::Sender<std::net::SocketAddr>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    addr_tx.send(addr).expect("send addr");

    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
        let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            continue;
        }

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).is_err() || line == "\r\n" || line == "\n" {
                break;
            }
            if line.to_lowercase().starts_with("content-length:") {
                if let Some(len) = line.split(':').nth(1) {
                    content_length = len.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if content_length > 0 && reader.read_exact(&mut body).is_err() {
            continue;
        }

        let result = handle(&state, &body);
        let payload = json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            payload.len(),
            payload
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    }
}

fn handle(state: &Arc<Mutex<MockState>>, body: &[u8]) -> Value {
    let request: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or("");
    let mut state = state.lock().unwrap();

    match method {
        "system_chain" => json!("mocknet"),
        "chain_blockWeightLimit" => state.limit.clone(),
        "payment_queryWeight" => state.cost.clone(),
        "system_accountNonce" => json!(state.submissions.len() as u64),
        "author_submitExtrinsic" => {
            let tx = request["params"][0].clone();
            state.submissions.push(tx);
            json!(format!("0xtx{}", state.submissions.len() - 1))
        }
        "author_extrinsicStatus" => {
            let hash = request["params"][0].as_str().unwrap_or("");
            let index: usize = hash.trim_start_matches("0xtx").parse().unwrap_or(0);
            state.statuses.get(index).cloned().unwrap_or_else(|| {
                json!({ "status": "finalized", "blockHash": format!("0xblock{}", index) })
            })
        }
        _ => Value::Null,
    }
}
