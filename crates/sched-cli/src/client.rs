//! Control daemon client.
//!
//! [`CtldClient`] owns the WebSocket connection and moves raw
//! [`CtlRequest`]/[`CtlReply`] pairs. [`ControlClient`] wraps any
//! [`Transport`] with typed operations and turns replies into results:
//! a rejected mutation becomes [`CliError::Rejected`], a failed query becomes
//! [`CliError::Backend`].
//!
//! # Example
//!
//! ```rust,no_run
//! use sched_cli::client::{ControlClient, CtldClient};
//! use sched_cli::config::ClientConfig;
//!
//! # async fn example() -> Result<(), sched_cli::CliError> {
//! let config = ClientConfig::from_file("/etc/sched/config.toml")?;
//! let transport = CtldClient::connect(&config).await?;
//! let mut client = ControlClient::new(transport, 0);
//! let nodes = client.query_nodes(None).await?;
//! println!("nodes: {}", nodes.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use sched_proto::ctl::{NodeStateChange, TaskChange, CTL_PROTOCOL_VERSION};
use sched_proto::{
    Account, CtlReply, CtlRequest, EntityKind, NodeInfo, PartitionInfo, Qos, TaskInfo, User,
};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::dispatch::ModifyTarget;
use crate::error::CliError;
use crate::query::EntityFilter;
use crate::resolve::AttributeChange;

/// One request/reply exchange with the control daemon.
pub trait Transport {
    /// Send a request and wait for its reply.
    fn request(
        &mut self,
        request: CtlRequest,
    ) -> impl Future<Output = Result<CtlReply, CliError>> + Send;
}

/// WebSocket connection to the control daemon.
pub struct CtldClient {
    /// WebSocket stream.
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Server version.
    server_version: String,
    /// Request timeout.
    request_timeout: Duration,
}

impl std::fmt::Debug for CtldClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtldClient")
            .field("server_version", &self.server_version)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl CtldClient {
    /// Connect to the daemon named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if connection or handshake fails.
    pub async fn connect(config: &ClientConfig) -> Result<Self, CliError> {
        let mut client =
            Self::connect_with_timeout(&config.control_url(), config.connect_timeout()).await?;
        client.request_timeout = config.request_timeout();
        Ok(client)
    }

    /// Connect to a URL with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is invalid (must start with `ws://` or `wss://`)
    /// - Connection fails
    /// - Handshake fails
    pub async fn connect_with_timeout(
        url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, CliError> {
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(CliError::Config(format!(
                "invalid control URL: {url}, must start with ws:// or wss://"
            )));
        }

        debug!(url = %url, "Connecting to control daemon");

        let (ws, _response) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| CliError::Timeout("connection timed out".into()))?
            .map_err(|e| CliError::Connection(e.to_string()))?;

        debug!("WebSocket connected, sending handshake");

        let mut client = Self {
            ws,
            server_version: String::new(),
            request_timeout: connect_timeout,
        };

        let hello = CtlRequest::hello(env!("CARGO_PKG_VERSION"));
        match client.send_request(hello).await? {
            CtlReply::Welcome {
                server_version,
                protocol_version,
            } => {
                if protocol_version != CTL_PROTOCOL_VERSION {
                    warn!(
                        server = protocol_version,
                        client = CTL_PROTOCOL_VERSION,
                        "Protocol version mismatch"
                    );
                }
                client.server_version = server_version;
                debug!(version = %client.server_version, "Handshake complete");
                Ok(client)
            }
            CtlReply::Error { code, message, .. } => Err(CliError::Remote { code, message }),
            other => Err(CliError::Protocol(format!(
                "unexpected response to hello: {other:?}"
            ))),
        }
    }

    /// Set the request timeout.
    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    /// Get the server version.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Send a request and wait for a response.
    async fn send_request(&mut self, request: CtlRequest) -> Result<CtlReply, CliError> {
        let request_type = request.request_type();
        let json = request.to_json()?;

        trace!(request_type, "Sending request");
        self.ws
            .send(Message::Text(json))
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;

        loop {
            let message = timeout(self.request_timeout, self.ws.next())
                .await
                .map_err(|_| CliError::Timeout(format!("request '{request_type}' timed out")))?
                .ok_or_else(|| CliError::Connection("connection closed".into()))?
                .map_err(|e| CliError::Connection(e.to_string()))?;

            match message {
                Message::Text(text) => {
                    let reply = CtlReply::from_json(&text)?;
                    trace!(request_type, "Received response");
                    return Ok(reply);
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Binary(_) => {
                    return Err(CliError::Protocol("unexpected binary message".into()));
                }
                Message::Close(_) => {
                    return Err(CliError::Connection("connection closed by server".into()));
                }
                Message::Frame(_) => {
                    return Err(CliError::Protocol("unexpected message type".into()));
                }
            }
        }
    }

    /// Close the connection gracefully.
    pub async fn close(mut self) -> Result<(), CliError> {
        self.ws
            .close(None)
            .await
            .map_err(|e| CliError::Connection(e.to_string()))
    }
}

impl Transport for CtldClient {
    fn request(
        &mut self,
        request: CtlRequest,
    ) -> impl Future<Output = Result<CtlReply, CliError>> + Send {
        self.send_request(request)
    }
}

/// Effective uid of this process, sent with every request as the operator identity.
///
/// # Errors
///
/// Returns a configuration error if the identity cannot be determined.
#[cfg(unix)]
pub fn operator_uid() -> Result<u32, CliError> {
    use std::os::unix::fs::MetadataExt;

    std::fs::metadata("/proc/self")
        .map(|meta| meta.uid())
        .map_err(|e| CliError::Config(format!("cannot determine operator identity: {e}")))
}

/// Effective uid of this process, sent with every request as the operator identity.
///
/// # Errors
///
/// Always fails: operator identity is only available on Unix.
#[cfg(not(unix))]
pub fn operator_uid() -> Result<u32, CliError> {
    Err(CliError::Config(
        "operator identity is only available on Unix".into(),
    ))
}

/// Typed operations over a [`Transport`].
#[derive(Debug)]
pub struct ControlClient<T> {
    transport: T,
    uid: u32,
}

impl<T: Transport> ControlClient<T> {
    /// Wrap a transport, acting as operator `uid`.
    #[must_use]
    pub const fn new(transport: T, uid: u32) -> Self {
        Self { transport, uid }
    }

    /// Operator uid attached to requests.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    async fn call(&mut self, request: CtlRequest) -> Result<CtlReply, CliError> {
        match self.transport.request(request).await? {
            CtlReply::Error { code, message, .. } => Err(CliError::Remote { code, message }),
            reply => Ok(reply),
        }
    }

    async fn call_ack(&mut self, request: CtlRequest) -> Result<(), CliError> {
        match self.call(request).await? {
            CtlReply::Ack { ok: true, .. } => Ok(()),
            CtlReply::Ack { ok: false, reason } => Err(CliError::Rejected(reason)),
            other => Err(unexpected(&other)),
        }
    }

    // ========================================================================
    // Entity Operations
    // ========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn add_account(&mut self, account: Account) -> Result<(), CliError> {
        let uid = self.uid;
        self.call_ack(CtlRequest::AddAccount { uid, account }).await
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn add_user(&mut self, user: User) -> Result<(), CliError> {
        let uid = self.uid;
        self.call_ack(CtlRequest::AddUser { uid, user }).await
    }

    /// Create a QoS policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn add_qos(&mut self, qos: Qos) -> Result<(), CliError> {
        let uid = self.uid;
        self.call_ack(CtlRequest::AddQos { uid, qos }).await
    }

    /// Remove an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn delete_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        account: Option<&str>,
    ) -> Result<(), CliError> {
        let request = CtlRequest::DeleteEntity {
            uid: self.uid,
            kind,
            name: name.to_string(),
            account: account.map(str::to_string),
        };
        self.call_ack(request).await
    }

    /// Apply one attribute change to an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn modify_entity(
        &mut self,
        target: &ModifyTarget,
        change: &AttributeChange,
    ) -> Result<(), CliError> {
        let request = CtlRequest::ModifyEntity {
            uid: self.uid,
            kind: target.kind,
            name: target.name.clone(),
            account: target.account.clone(),
            partition: target.partition.clone(),
            attribute: change.attribute,
            value: change.value.clone(),
            operation: change.operation,
            force: target.force,
        };
        self.call_ack(request).await
    }

    /// Block or unblock an account or user.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn set_blocked(
        &mut self,
        kind: EntityKind,
        name: &str,
        account: Option<&str>,
        blocked: bool,
    ) -> Result<(), CliError> {
        let request = CtlRequest::SetEntityBlocked {
            uid: self.uid,
            kind,
            name: name.to_string(),
            account: account.map(str::to_string),
            blocked,
        };
        self.call_ack(request).await
    }

    fn query_request(&self, kind: EntityKind, filter: &EntityFilter) -> CtlRequest {
        CtlRequest::QueryEntities {
            uid: self.uid,
            kind,
            name: filter.name.clone(),
            account: filter.account.clone(),
        }
    }

    /// Query accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the reply reports failure.
    pub async fn query_accounts(&mut self, filter: &EntityFilter) -> Result<Vec<Account>, CliError> {
        let request = self.query_request(EntityKind::Account, filter);
        match self.call(request).await? {
            CtlReply::Accounts { ok: true, accounts, .. } => Ok(accounts),
            CtlReply::Accounts { ok: false, reason, .. } => Err(CliError::Backend(reason)),
            other => Err(unexpected(&other)),
        }
    }

    /// Query users.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the reply reports failure.
    pub async fn query_users(&mut self, filter: &EntityFilter) -> Result<Vec<User>, CliError> {
        let request = self.query_request(EntityKind::User, filter);
        match self.call(request).await? {
            CtlReply::Users { ok: true, users, .. } => Ok(users),
            CtlReply::Users { ok: false, reason, .. } => Err(CliError::Backend(reason)),
            other => Err(unexpected(&other)),
        }
    }

    /// Query QoS policies.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the reply reports failure.
    pub async fn query_qos(&mut self, filter: &EntityFilter) -> Result<Vec<Qos>, CliError> {
        let request = self.query_request(EntityKind::Qos, filter);
        match self.call(request).await? {
            CtlReply::QosList { ok: true, qos, .. } => Ok(qos),
            CtlReply::QosList { ok: false, reason, .. } => Err(CliError::Backend(reason)),
            other => Err(unexpected(&other)),
        }
    }

    // ========================================================================
    // Live State Operations
    // ========================================================================

    /// Query nodes; `None` means all.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn query_nodes(&mut self, name: Option<&str>) -> Result<Vec<NodeInfo>, CliError> {
        let request = CtlRequest::QueryNodes {
            name: name.map(str::to_string),
        };
        match self.call(request).await? {
            CtlReply::Nodes { nodes } => Ok(nodes),
            other => Err(unexpected(&other)),
        }
    }

    /// Query partitions; `None` means all.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn query_partitions(
        &mut self,
        name: Option<&str>,
    ) -> Result<Vec<PartitionInfo>, CliError> {
        let request = CtlRequest::QueryPartitions {
            name: name.map(str::to_string),
        };
        match self.call(request).await? {
            CtlReply::Partitions { partitions } => Ok(partitions),
            other => Err(unexpected(&other)),
        }
    }

    /// Query jobs; an empty id list means all.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the reply reports failure.
    pub async fn query_tasks(&mut self, task_ids: Vec<u32>) -> Result<Vec<TaskInfo>, CliError> {
        match self.call(CtlRequest::QueryTasks { task_ids }).await? {
            CtlReply::Tasks { ok: true, tasks, .. } => Ok(tasks),
            CtlReply::Tasks { ok: false, reason, .. } => Err(CliError::Backend(reason)),
            other => Err(unexpected(&other)),
        }
    }

    /// Change a job attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn modify_task(&mut self, task_id: u32, change: TaskChange) -> Result<(), CliError> {
        let uid = self.uid;
        self.call_ack(CtlRequest::ModifyTask {
            uid,
            task_id,
            change,
        })
        .await
    }

    /// Drain or resume a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or is rejected.
    pub async fn modify_node_state(
        &mut self,
        node: &str,
        state: NodeStateChange,
        reason: Option<&str>,
    ) -> Result<(), CliError> {
        let request = CtlRequest::ModifyNodeState {
            uid: self.uid,
            node: node.to_string(),
            state,
            reason: reason.map(str::to_string),
        };
        self.call_ack(request).await
    }
}

fn unexpected(reply: &CtlReply) -> CliError {
    CliError::Protocol(format!("unexpected response: {reply:?}"))
}
