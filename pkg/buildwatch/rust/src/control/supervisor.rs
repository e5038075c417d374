// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::ProcessControl;
use crate::env::{ServerUrl, SupervisorConfig};
use crate::error::RemoteFault;
use crate::process::{ProcessDescriptor, ProcessState};
use crate::xmlrpc::{self, Value};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

const RPC_PATH: &str = "/RPC2";

/// XML-RPC client for supervisord, over TCP or a unix socket.
pub struct SupervisorClient {
    config: SupervisorConfig,
    authorization: Option<String>,
}

impl SupervisorClient {
    pub fn new(config: SupervisorConfig) -> Self {
        let authorization = config.username.as_ref().map(|user| {
            let password = config.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
        });
        Self {
            config,
            authorization,
        }
    }

    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RemoteFault> {
        debug!("xml-rpc call {method}");
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(RPC_PATH)
            .header(HOST, self.config.server_url.host())
            .header(CONTENT_TYPE, "text/xml");
        if let Some(ref authorization) = self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        let request = request.body(Full::new(Bytes::from(xmlrpc::encode_call(method, params))))?;

        let body = match &self.config.server_url {
            ServerUrl::Tcp(addr) => send(TcpStream::connect(addr).await?, request).await?,
            ServerUrl::Unix(path) => send(UnixStream::connect(path).await?, request).await?,
        };
        xmlrpc::parse_response(&body)
    }
}

async fn send<S>(stream: S, request: Request<Full<Bytes>>) -> Result<Bytes, RemoteFault>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!("xml-rpc connection closed with error: {e}");
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteFault::Status(status.as_u16()));
    }
    Ok(response.into_body().collect().await?.to_bytes())
}

fn descriptor_from_value(value: &Value) -> Result<ProcessDescriptor, RemoteFault> {
    let field = |key: &str| {
        value
            .member(key)
            .ok_or_else(|| RemoteFault::malformed(format!("process info without {key}")))
    };
    let text = |key: &str| {
        field(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RemoteFault::malformed(format!("process info {key} is not a string")))
    };

    let pid = field("pid")?
        .as_i64()
        .ok_or_else(|| RemoteFault::malformed("process info pid is not an int"))?;
    let state = text("statename")?
        .parse::<ProcessState>()
        .map_err(RemoteFault::Malformed)?;

    Ok(ProcessDescriptor {
        group: text("group")?,
        name: text("name")?,
        pid: u32::try_from(pid).unwrap_or(0),
        state,
    })
}

#[async_trait]
impl ProcessControl for SupervisorClient {
    async fn list_all_processes(&self) -> Result<Vec<ProcessDescriptor>, RemoteFault> {
        let value = self.call("supervisor.getAllProcessInfo", &[]).await?;
        value
            .as_array()
            .ok_or_else(|| RemoteFault::malformed("getAllProcessInfo did not return an array"))?
            .iter()
            .map(descriptor_from_value)
            .collect()
    }

    async fn stop_process(&self, name: &str, wait: bool) -> Result<(), RemoteFault> {
        self.call("supervisor.stopProcess", &[name.into(), wait.into()])
            .await
            .map(drop)
    }

    async fn start_process(&self, name: &str, wait: bool) -> Result<(), RemoteFault> {
        self.call("supervisor.startProcess", &[name.into(), wait.into()])
            .await
            .map(drop)
    }

    async fn get_process_info(&self, name: &str) -> Result<ProcessDescriptor, RemoteFault> {
        let value = self
            .call("supervisor.getProcessInfo", &[name.into()])
            .await?;
        descriptor_from_value(&value)
    }
}
