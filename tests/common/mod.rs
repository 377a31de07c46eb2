//! Shared fakes and fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use club_core::blockchain::{
    ConfirmationStatus, NetworkRpc, SignError, SignOptions, SignedEnvelope, SubmitResponse,
    SubmitStatus, TxBuilder, WalletSigner,
};
use club_core::config::{ContractsConfig, NetworkConfig};
use club_core::errors::{Locale, RawError};
use club_core::health::{HealthCheck, NetworkHealth};
use club_core::orchestrator::{OrchestratorSettings, TransactionOrchestrator};
use club_core::resilience::RetryPolicy;

pub const SIGNER: &str = "GDUKMGUGDZQK6YHYA5Z6AY2G4XDSZPSZ3SW5UN3ARVMO6Q4D46B4MBFS";
pub const RECIPIENT: &str = "GBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
pub const TX_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

/// Signer that approves or rejects according to its mode and counts calls.
pub struct FakeSigner {
    reject: bool,
    pub calls: AtomicU32,
}

impl FakeSigner {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            reject: false,
            calls: AtomicU32::new(0),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject: true,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for FakeSigner {
    async fn sign_transaction(
        &self,
        blob: &str,
        _opts: &SignOptions,
    ) -> Result<SignedEnvelope, SignError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject {
            return Err(SignError::Rejected);
        }
        Ok(SignedEnvelope {
            blob: format!("{}.sig{}", blob, n),
        })
    }
}

/// RPC fake: scripted submit results and confirmation statuses.
///
/// Once a script runs dry, submits are accepted and statuses stay at
/// `fallback_status`.
pub struct FakeRpc {
    submits: Mutex<VecDeque<Result<SubmitResponse, RawError>>>,
    statuses: Mutex<VecDeque<ConfirmationStatus>>,
    fallback_status: ConfirmationStatus,
    pub submitted: Mutex<Vec<String>>,
    pub status_calls: AtomicU32,
}

impl FakeRpc {
    pub fn confirming() -> Arc<Self> {
        Self::scripted(
            vec![],
            vec![ConfirmationStatus::Confirmed { ledger: Some(42) }],
            ConfirmationStatus::Confirmed { ledger: Some(42) },
        )
    }

    pub fn never_confirming() -> Arc<Self> {
        Self::scripted(vec![], vec![], ConfirmationStatus::Pending)
    }

    pub fn scripted(
        submits: Vec<Result<SubmitResponse, RawError>>,
        statuses: Vec<ConfirmationStatus>,
        fallback_status: ConfirmationStatus,
    ) -> Arc<Self> {
        Arc::new(Self {
            submits: Mutex::new(submits.into()),
            statuses: Mutex::new(statuses.into()),
            fallback_status,
            submitted: Mutex::new(Vec::new()),
            status_calls: AtomicU32::new(0),
        })
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

pub fn accepted() -> SubmitResponse {
    SubmitResponse {
        status: SubmitStatus::Pending,
        hash: TX_HASH.to_string(),
        error_result: None,
    }
}

#[async_trait]
impl NetworkRpc for FakeRpc {
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitResponse, RawError> {
        self.submitted.lock().unwrap().push(envelope.blob.clone());
        let scripted = self.submits.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(accepted()))
    }

    async fn get_status(&self, _hash: &str) -> Result<ConfirmationStatus, RawError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.statuses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| self.fallback_status.clone()))
    }
}

/// Health probe with a fixed answer.
pub struct FixedHealth(pub NetworkHealth);

impl FixedHealth {
    pub fn up() -> Arc<Self> {
        Arc::new(Self(NetworkHealth {
            horizon: true,
            soroban: true,
            errors: vec![],
        }))
    }

    pub fn soroban_down() -> Arc<Self> {
        Arc::new(Self(NetworkHealth {
            horizon: true,
            soroban: false,
            errors: vec!["soroban rpc unreachable".into()],
        }))
    }
}

#[async_trait]
impl HealthCheck for FixedHealth {
    async fn check(&self) -> NetworkHealth {
        self.0.clone()
    }
}

/// Fast settings: millisecond backoff and polling.
pub fn fast_settings(max_attempts: u32, poll_attempts: u32) -> OrchestratorSettings {
    OrchestratorSettings {
        retry: RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        poll_interval: Duration::from_millis(1),
        poll_attempts,
        resign_on_retry: false,
        locale: Locale::En,
    }
}

pub fn orchestrator(
    signer: Arc<FakeSigner>,
    rpc: Arc<FakeRpc>,
    health: Arc<FixedHealth>,
    settings: OrchestratorSettings,
) -> TransactionOrchestrator {
    TransactionOrchestrator::new(
        TxBuilder::new(ContractsConfig::default(), NetworkConfig::default()),
        rpc,
        signer,
        health,
        settings,
    )
}

/// Serve canned HTTP responses on `addr`; `f` receives the request body.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let body = read_request_body(&mut socket).await;
                        let (status, body) = f(body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let content_length = text[..split]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= split + 4 + content_length {
                return String::from_utf8_lossy(&buf[split + 4..split + 4 + content_length])
                    .into_owned();
            }
        }
    }
    String::new()
}
