// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process master container for tests.
//!
//! [`MockContainer`] speaks the JSON frame protocol over any byte stream and
//! hosts agents with named parameters. Replies for chosen parameters can be
//! delayed or dropped to exercise correlation and timeouts. One agent can act
//! as the container shell, answering commands and serving an in-memory file
//! store.
//!
//! ```rust,ignore
//! let container = MockContainer::with_test_agent("test");
//! let gw = Gateway::connect(&container.connector(), GatewayConfig::default()).await?;
//! ```

use crate::message::{Message, Performative, GENERIC_MESSAGE};
use crate::param::{
    coerce_like, ParamIndex, ParamValue, ParameterRequest, ParameterResponse, PARAMETER_REQ,
    PARAMETER_RSP,
};
use crate::protocol::{
    spawn_link, Frame, FrameSender, RequestFrame, ResponseFrame, StreamConnector,
};
use crate::shell::{
    GetFileReq, GetFileRsp, PutFileReq, ShellExecReq, GET_FILE_REQ, PUT_FILE_REQ,
    SHELL_EXEC_REQ, SHELL_SERVICE,
};
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::watch;

#[derive(Debug, Clone)]
struct MockParam {
    value: ParamValue,
    read_only: bool,
}

struct State {
    agents: BTreeMap<String, BTreeMap<String, MockParam>>,
    services: BTreeMap<String, Vec<String>>,
    delays: HashMap<String, Duration>,
    silent: HashSet<String>,
    subscriptions: Vec<String>,
    links: Vec<FrameSender>,
    param_requests: usize,
    shell: Option<String>,
    shell_answers: HashMap<String, String>,
    files: BTreeMap<String, Vec<u8>>,
    put_file_requests: usize,
    shutdown: watch::Sender<bool>,
}

/// Mock fjåge master container. Clones share state.
#[derive(Clone)]
pub struct MockContainer {
    state: Arc<Mutex<State>>,
}

impl Default for MockContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContainer {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(State {
                agents: BTreeMap::new(),
                services: BTreeMap::new(),
                delays: HashMap::new(),
                silent: HashSet::new(),
                subscriptions: Vec::new(),
                links: Vec::new(),
                param_requests: 0,
                shell: None,
                shell_answers: HashMap::new(),
                files: BTreeMap::new(),
                put_file_requests: 0,
                shutdown,
            })),
        }
    }

    /// Container with one agent `name` carrying the standard test parameters:
    /// `ro*Param` (read-only), `rw*Param` (read-write) for every scalar and
    /// array type, `vectorParam = [10, 20, 30, 40]` and `emptyArrayParam = []`.
    pub fn with_test_agent(name: &str) -> Self {
        let container = Self::new();
        let ro = [
            ("roIntParam", ParamValue::Int(42)),
            ("roLongParam", ParamValue::Long(1 << 40)),
            ("roFloatParam", ParamValue::Float(3.5)),
            ("roDoubleParam", ParamValue::Double(2.25)),
            ("roStringParam", ParamValue::String("fjage".into())),
            ("roBoolParam", ParamValue::Bool(true)),
            ("roIntArrayParam", ParamValue::IntArray(vec![1, 2, 3])),
        ];
        let rw = [
            ("rwIntParam", ParamValue::Int(0)),
            ("rwLongParam", ParamValue::Long(0)),
            ("rwFloatParam", ParamValue::Float(0.0)),
            ("rwDoubleParam", ParamValue::Double(0.0)),
            ("rwStringParam", ParamValue::String(String::new())),
            ("rwBoolParam", ParamValue::Bool(false)),
            ("rwBoolArrayParam", ParamValue::BoolArray(vec![false; 3])),
            ("rwIntArrayParam", ParamValue::IntArray(vec![0; 3])),
            ("rwLongArrayParam", ParamValue::LongArray(vec![0; 3])),
            ("rwFloatArrayParam", ParamValue::FloatArray(vec![0.0; 3])),
            ("rwDoubleArrayParam", ParamValue::DoubleArray(vec![0.0; 3])),
            ("rwStringArrayParam", ParamValue::StringArray(vec![String::new(); 3])),
            ("vectorParam", ParamValue::IntArray(vec![10, 20, 30, 40])),
            ("emptyArrayParam", ParamValue::IntArray(Vec::new())),
        ];
        for (key, value) in ro {
            container.add_param(name, key, value, true);
        }
        for (key, value) in rw {
            container.add_param(name, key, value, false);
        }
        container
    }

    // ========================================================================
    // Setup
    // ========================================================================

    pub fn add_agent(&self, agent: &str) {
        self.state.lock().agents.entry(agent.to_string()).or_default();
    }

    pub fn add_param(&self, agent: &str, key: &str, value: ParamValue, read_only: bool) {
        self.state
            .lock()
            .agents
            .entry(agent.to_string())
            .or_default()
            .insert(key.to_string(), MockParam { value, read_only });
    }

    pub fn add_service(&self, service: &str, agent: &str) {
        self.add_agent(agent);
        self.state
            .lock()
            .services
            .entry(service.to_string())
            .or_default()
            .push(agent.to_string());
    }

    /// Make `agent` the container shell, advertising the shell service.
    pub fn add_shell(&self, agent: &str) {
        self.add_service(SHELL_SERVICE, agent);
        self.state.lock().shell = Some(agent.to_string());
    }

    /// Answer `cmd` with `ans`. The shell refuses commands it has no answer for.
    pub fn shell_answer(&self, cmd: &str, ans: &str) {
        self.state
            .lock()
            .shell_answers
            .insert(cmd.to_string(), ans.to_string());
    }

    pub fn add_file(&self, name: &str, contents: &[u8]) {
        self.state
            .lock()
            .files
            .insert(name.to_string(), contents.to_vec());
    }

    /// Hold replies to requests on `key` back for `delay`.
    pub fn delay_replies(&self, key: &str, delay: Duration) {
        self.state.lock().delays.insert(key.to_string(), delay);
    }

    /// Never reply to requests on `key`.
    pub fn drop_replies(&self, key: &str) {
        self.state.lock().silent.insert(key.to_string());
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Current value of a parameter, bypassing the protocol.
    pub fn param(&self, agent: &str, key: &str) -> Option<ParamValue> {
        self.state
            .lock()
            .agents
            .get(agent)
            .and_then(|params| params.get(key))
            .map(|p| p.value.clone())
    }

    /// Contents of a file in the shell's store.
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(name).cloned()
    }

    /// Number of `PutFileReq` messages received.
    pub fn put_file_requests(&self) -> usize {
        self.state.lock().put_file_requests
    }

    /// Number of `ParameterReq` messages received.
    pub fn param_requests(&self) -> usize {
        self.state.lock().param_requests
    }

    /// AgentIDs announced by the last `wantsMessagesFor`.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().subscriptions.clone()
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Push `msg` to every connected gateway. Returns how many were reached.
    pub fn publish(&self, msg: Message) -> usize {
        let links = self.state.lock().links.clone();
        links
            .iter()
            .filter(|link| {
                link.send(Frame::Request(RequestFrame::Send {
                    message: msg.clone(),
                    relay: false,
                }))
                .is_ok()
            })
            .count()
    }

    /// Drop every connected link, as if the container went away.
    pub fn disconnect(&self) {
        self.state.lock().shutdown.send_replace(true);
    }

    /// Serve a fresh in-memory link and return the gateway end.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connector(&self) -> StreamConnector<DuplexStream> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let container = self.clone();
        tokio::spawn(async move { container.serve(server).await });
        StreamConnector::new(client)
    }

    /// Accept TCP connections on an ephemeral localhost port, on a thread of
    /// its own. Returns the port.
    pub fn listen_tcp(&self) -> std::io::Result<u16> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let container = self.clone();

        std::thread::Builder::new()
            .name("fjage-mock".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Mock container runtime: {}", e);
                        return;
                    }
                };
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(l) => l,
                        Err(e) => {
                            error!("Mock container listener: {}", e);
                            return;
                        }
                    };
                    loop {
                        match listener.accept().await {
                            Ok((stream, peer)) => {
                                debug!("Mock container: connection from {}", peer);
                                let container = container.clone();
                                tokio::spawn(async move { container.serve(stream).await });
                            }
                            Err(e) => {
                                warn!("Mock container accept failed: {}", e);
                                return;
                            }
                        }
                    }
                });
            })?;
        Ok(port)
    }

    /// Serve one link until the peer closes it or [`disconnect`](Self::disconnect).
    pub async fn serve<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (tx, mut rx) = spawn_link(stream);
        let mut shutdown = {
            let mut state = self.state.lock();
            state.links.push(tx.clone());
            state.shutdown.subscribe()
        };

        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => self.handle(frame, &tx),
                    None => break,
                },
                _ = shutdown.changed() => {
                    debug!("Mock container dropping link");
                    break;
                }
            }
        }

        self.state.lock().links.retain(|link| !link.same_channel(&tx));
    }

    fn handle(&self, frame: Frame, tx: &FrameSender) {
        match frame {
            Frame::Alive(_) | Frame::Response(_) => {}
            Frame::Request(RequestFrame::Send { message, .. }) => self.handle_message(message, tx),
            Frame::Request(RequestFrame::WantsMessagesFor { agent_ids }) => {
                self.state.lock().subscriptions = agent_ids;
            }
            Frame::Request(query) => {
                if let Some(response) = self.answer(query) {
                    let _ = tx.send(Frame::Response(response));
                }
            }
        }
    }

    fn answer(&self, query: RequestFrame) -> Option<ResponseFrame> {
        let state = self.state.lock();
        let response = match query {
            RequestFrame::Agents { id } => ResponseFrame::Agents {
                id,
                agent_ids: state.agents.keys().cloned().collect(),
            },
            RequestFrame::ContainsAgent { id, agent_id } => ResponseFrame::ContainsAgent {
                id,
                answer: state.agents.contains_key(&agent_id),
            },
            RequestFrame::Services { id } => ResponseFrame::Services {
                id,
                services: state.services.keys().cloned().collect(),
            },
            RequestFrame::AgentForService { id, service } => ResponseFrame::AgentForService {
                id,
                agent_id: state
                    .services
                    .get(&service)
                    .and_then(|agents| agents.first().cloned()),
            },
            RequestFrame::AgentsForService { id, service } => ResponseFrame::AgentsForService {
                id,
                agent_ids: state.services.get(&service).cloned().unwrap_or_default(),
            },
            RequestFrame::Send { .. } | RequestFrame::WantsMessagesFor { .. } => return None,
        };
        Some(response)
    }

    fn handle_message(&self, msg: Message, tx: &FrameSender) {
        if let Some(reply) = self.shell_reply(&msg) {
            let _ = tx.send(send_frame(reply));
            return;
        }
        if msg.clazz != PARAMETER_REQ {
            // other messages to a known agent are acknowledged with their own fields
            if self.state.lock().agents.contains_key(&msg.data.recipient) {
                let mut reply = msg.reply(msg.clazz.clone(), Performative::Agree);
                reply.data.fields = msg.data.fields.clone();
                let _ = tx.send(send_frame(reply));
            }
            return;
        }

        let (reply, key) = match ParameterRequest::from_message(&msg) {
            Ok(request) => (self.apply(&request).to_message(&msg), Some(request.param)),
            Err(e) => {
                warn!("Mock container: bad ParameterReq: {}", e);
                (msg.reply(PARAMETER_RSP, Performative::NotUnderstood), None)
            }
        };

        let (delay, silent) = {
            let mut state = self.state.lock();
            state.param_requests += 1;
            match &key {
                Some(key) => (state.delays.get(key).copied(), state.silent.contains(key)),
                None => (None, false),
            }
        };
        if silent {
            return;
        }

        let frame = send_frame(reply);
        match delay {
            Some(delay) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(frame);
                });
            }
            None => {
                let _ = tx.send(frame);
            }
        }
    }

    /// Reply of the shell agent, or `None` when `msg` is not a shell request.
    fn shell_reply(&self, msg: &Message) -> Option<Message> {
        let mut state = self.state.lock();
        if state.shell.as_deref() != Some(msg.data.recipient.as_str()) {
            return None;
        }
        let refuse = |perf| msg.reply(GENERIC_MESSAGE, perf);

        let reply = match msg.clazz.as_str() {
            SHELL_EXEC_REQ => match ShellExecReq::from_message(msg) {
                Ok(request) => match state.shell_answers.get(&request.cmd) {
                    Some(ans) => {
                        let mut reply = msg.reply(GENERIC_MESSAGE, Performative::Agree);
                        if request.ans {
                            reply.set("ans", ans.as_str());
                        }
                        reply
                    }
                    None => refuse(Performative::Refuse),
                },
                Err(_) => refuse(Performative::NotUnderstood),
            },
            GET_FILE_REQ => match GetFileReq::from_message(msg) {
                Ok(request) => match read_file(&state.files, &request) {
                    Some(rsp) => rsp.to_message(msg),
                    None => refuse(Performative::Failure),
                },
                Err(_) => refuse(Performative::NotUnderstood),
            },
            PUT_FILE_REQ => match PutFileReq::from_message(msg) {
                Ok(request) => {
                    state.put_file_requests += 1;
                    if write_file(&mut state.files, request) {
                        msg.reply(GENERIC_MESSAGE, Performative::Agree)
                    } else {
                        refuse(Performative::Failure)
                    }
                }
                Err(_) => refuse(Performative::NotUnderstood),
            },
            _ => return None,
        };
        Some(reply)
    }

    fn apply(&self, request: &ParameterRequest) -> ParameterResponse {
        let mut state = self.state.lock();
        let Some(entry) = state
            .agents
            .get_mut(request.agent.as_str())
            .and_then(|params| params.get_mut(&request.param))
        else {
            return ParameterResponse::failure(request);
        };

        let current = match request.index {
            ParamIndex::Whole => Some(entry.value.clone()),
            ParamIndex::Element(i) => entry.value.element(i as usize),
        };
        let Some(current) = current else {
            return ParameterResponse::failure(request);
        };
        let Some(new_value) = request.value.clone() else {
            return ParameterResponse::inform(request, current);
        };
        if entry.read_only {
            let mut response = ParameterResponse::inform(request, current);
            response.readonly = vec![request.param.clone()];
            return response;
        }

        let updated = match request.index {
            ParamIndex::Whole => coerce_like(&entry.value, new_value).map(|v| {
                entry.value = v.clone();
                v
            }),
            ParamIndex::Element(i) => coerce_like(&current, new_value)
                .filter(|v| set_element(&mut entry.value, i as usize, v.clone())),
        };
        ParameterResponse::inform(request, updated.unwrap_or(current))
    }
}

fn send_frame(message: Message) -> Frame {
    Frame::Request(RequestFrame::Send {
        message,
        relay: false,
    })
}

/// A slice of a stored file, or the listing of every file under a name
/// ending in `/`.
fn read_file(files: &BTreeMap<String, Vec<u8>>, request: &GetFileReq) -> Option<GetFileRsp> {
    if request.filename.ends_with('/') {
        let listing: Vec<&str> = files
            .keys()
            .filter_map(|name| name.strip_prefix(request.filename.as_str()))
            .collect();
        return Some(GetFileRsp {
            filename: request.filename.clone(),
            dir: true,
            contents: listing.join("\n").into_bytes(),
            ofs: 0,
        });
    }

    let data = files.get(&request.filename)?;
    let start = usize::try_from(request.ofs)
        .ok()
        .filter(|&start| start <= data.len())?;
    let end = match usize::try_from(request.len) {
        Ok(0) | Err(_) => data.len(),
        Ok(len) => start.saturating_add(len).min(data.len()),
    };
    Some(GetFileRsp {
        filename: request.filename.clone(),
        dir: false,
        contents: data[start..end].to_vec(),
        ofs: request.ofs,
    })
}

/// Apply a `PutFileReq`: offset 0 replaces the file, any other offset writes
/// in place. Returns false when deleting a file that does not exist.
fn write_file(files: &mut BTreeMap<String, Vec<u8>>, request: PutFileReq) -> bool {
    let Some(contents) = request.contents else {
        return files.remove(&request.filename).is_some();
    };
    let Ok(ofs) = usize::try_from(request.ofs) else {
        return false;
    };
    let file = files.entry(request.filename).or_default();
    if ofs == 0 {
        file.clear();
    }
    let end = ofs + contents.len();
    if file.len() < end {
        file.resize(end, 0);
    }
    file[ofs..end].copy_from_slice(&contents);
    true
}

fn set_element(array: &mut ParamValue, index: usize, element: ParamValue) -> bool {
    fn put<T>(slots: &mut [T], index: usize, value: T) -> bool {
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    match (array, element) {
        (ParamValue::BoolArray(v), ParamValue::Bool(x)) => put(v, index, x),
        (ParamValue::IntArray(v), ParamValue::Int(x)) => put(v, index, x),
        (ParamValue::LongArray(v), ParamValue::Long(x)) => put(v, index, x),
        (ParamValue::FloatArray(v), ParamValue::Float(x)) => put(v, index, x),
        (ParamValue::DoubleArray(v), ParamValue::Double(x)) => put(v, index, x),
        (ParamValue::StringArray(v), ParamValue::String(x)) => put(v, index, x),
        _ => false,
    }
}
