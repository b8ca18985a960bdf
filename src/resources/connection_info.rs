//! Session connection info lookup

use declarative::LookupKind;
use kasmkit::{KasmStatus, KasmStatusQuery};
use serde::Serialize;

/// How to reach a running session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub kasm_id: String,
    pub user_id: String,
    pub kasm_url: String,
    pub operational_status: String,
    pub operational_message: String,
    pub operational_progress: i64,
    pub hostname: String,
    pub port: i64,
    pub container_ip: String,
}

pub struct ConnectionInfoKind;

impl LookupKind for ConnectionInfoKind {
    const NAME: &'static str = "connection_info";

    type Query = KasmStatusQuery;
    type Remote = KasmStatus;
    type State = ConnectionInfo;

    fn describe(query: &KasmStatusQuery) -> String {
        format!("{}/{}", query.user_id, query.kasm_id)
    }

    fn from_remote(remote: &KasmStatus) -> ConnectionInfo {
        ConnectionInfo {
            kasm_id: remote.kasm_id.clone(),
            user_id: remote.user_id.clone(),
            kasm_url: remote.kasm_url.clone(),
            operational_status: remote.operational_status.clone(),
            operational_message: remote.operational_message.clone(),
            operational_progress: remote.operational_progress,
            hostname: remote.hostname.clone(),
            port: remote.port,
            container_ip: remote.container_ip.clone(),
        }
    }
}
