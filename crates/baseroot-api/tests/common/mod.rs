//! Test doubles and request builders shared by the API integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use baseroot_anchor::{AnchorError, AnchorRecord, AnchorStatus, Anchorer, Hash, PreparedAnchor};
use baseroot_api::config::ApiConfig;
use baseroot_api::journal::{MemoryJournal, UploadJournal};
use baseroot_api::state::AppState;
use baseroot_core::{ContentId, Pubkey};
use baseroot_crypto::{Ed25519Signature, Keypair};
use baseroot_pinning::{Pinner, PinningError};
use http_body_util::BodyExt;
use parking_lot::Mutex;

pub const CID: &str = "QmNRCQWfgze6AbBCaT1rkrkV5tJ2aP4oTNPb5JZcXYywve";
pub const HELLO_SHA256: &str = "ffc055bd7b4b9485e6b1e986a0eb16b0d5b67d2854aae9aa10ad6e7c027b6fb4";
pub const OWNER: &str = "D4vE1yXw3n3G86V9G9R71T5iG6K7T26F5rL7iP8JdC7f";
pub const BOUNDARY: &str = "baseroot-test-boundary";

// ── Pinner ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPinner {
    pub fail_pin: bool,
    pub fail_unpin: bool,
    pub pins: Mutex<Vec<(String, Vec<u8>)>>,
    pub unpins: Mutex<Vec<ContentId>>,
    pub stored: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockPinner {
    pub fn failing() -> Self {
        Self {
            fail_pin: true,
            ..Self::default()
        }
    }

    pub fn failing_unpin() -> Self {
        Self {
            fail_unpin: true,
            ..Self::default()
        }
    }

    pub fn with_content(cid: &str, bytes: &[u8]) -> Self {
        let pinner = Self::default();
        pinner.stored.lock().insert(cid.to_string(), bytes.to_vec());
        pinner
    }

    pub fn pin_count(&self) -> usize {
        self.pins.lock().len()
    }

    pub fn unpin_count(&self) -> usize {
        self.unpins.lock().len()
    }
}

#[async_trait]
impl Pinner for MockPinner {
    async fn pin(&self, name: &str, bytes: Vec<u8>) -> Result<ContentId, PinningError> {
        self.pins.lock().push((name.to_string(), bytes.clone()));
        if self.fail_pin {
            return Err(PinningError::ApiError {
                endpoint: "pinFileToIPFS".into(),
                status: 503,
                body: "service unavailable".into(),
            });
        }
        self.stored.lock().insert(CID.to_string(), bytes);
        Ok(ContentId::new(CID).unwrap())
    }

    async fn unpin(&self, cid: &ContentId) -> Result<(), PinningError> {
        self.unpins.lock().push(cid.clone());
        if self.fail_unpin {
            return Err(PinningError::ApiError {
                endpoint: "unpin".into(),
                status: 500,
                body: "internal".into(),
            });
        }
        Ok(())
    }

    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, PinningError> {
        self.stored
            .lock()
            .get(cid.as_str())
            .cloned()
            .ok_or_else(|| PinningError::ApiError {
                endpoint: "gateway".into(),
                status: 404,
                body: "not found".into(),
            })
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

// ── Anchorer ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitMode {
    Confirm,
    Reject,
    Timeout,
    /// The send reply is lost.
    SendLost,
    PrepareFails,
}

pub struct MockAnchorer {
    pub mode: SubmitMode,
    /// Answer for `signature_status`; `None` makes the lookup fail.
    pub status: Mutex<Option<AnchorStatus>>,
    pub prepares: AtomicUsize,
    pub submits: AtomicUsize,
    pub status_lookups: AtomicUsize,
    pub records: Mutex<Vec<AnchorRecord>>,
    signer: Keypair,
}

impl MockAnchorer {
    pub fn new(mode: SubmitMode) -> Self {
        Self {
            mode,
            status: Mutex::new(Some(AnchorStatus::NotFound)),
            prepares: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
            status_lookups: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
            signer: Keypair::from_seed(&[9; 32]),
        }
    }

    pub fn with_status(self, status: Option<AnchorStatus>) -> Self {
        *self.status.lock() = status;
        self
    }

    pub fn prepare_count(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    /// The signature `prepare` produces for `record`.
    pub fn signature_for(&self, record: &AnchorRecord) -> Ed25519Signature {
        self.signer.sign(&record.payload())
    }
}

#[async_trait]
impl Anchorer for MockAnchorer {
    async fn prepare(&self, record: &AnchorRecord) -> Result<PreparedAnchor, AnchorError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        if self.mode == SubmitMode::PrepareFails {
            return Err(AnchorError::Rpc {
                method: "getLatestBlockhash".into(),
                code: -32005,
                message: "node is behind".into(),
            });
        }
        self.records.lock().push(record.clone());
        Ok(PreparedAnchor {
            record: record.clone(),
            signature: self.signature_for(record),
            recent_blockhash: Hash::new_from_array([5; 32]),
            wire: record.payload(),
        })
    }

    async fn submit(&self, prepared: &PreparedAnchor) -> Result<Ed25519Signature, AnchorError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let signature = prepared.signature;
        match self.mode {
            SubmitMode::Confirm | SubmitMode::PrepareFails => Ok(signature),
            SubmitMode::Reject => Err(AnchorError::Rejected {
                signature,
                reason: "{\"InstructionError\":[0,{\"Custom\":1}]}".into(),
            }),
            SubmitMode::Timeout => Err(AnchorError::ConfirmationTimeout {
                signature,
                waited_ms: 10,
            }),
            SubmitMode::SendLost => Err(AnchorError::Unresolved {
                signature,
                source: Box::new(AnchorError::InvalidResponse {
                    method: "sendTransaction".into(),
                    detail: "HTTP 504: gateway timeout".into(),
                }),
            }),
        }
    }

    async fn signature_status(&self, _signature: &Ed25519Signature) -> Result<AnchorStatus, AnchorError> {
        self.status_lookups.fetch_add(1, Ordering::SeqCst);
        self.status.lock().clone().ok_or_else(|| AnchorError::InvalidResponse {
            method: "getSignatureStatuses".into(),
            detail: "HTTP 502: bad gateway".into(),
        })
    }

    fn payer(&self) -> Pubkey {
        self.signer.pubkey()
    }
}

// ── App ──────────────────────────────────────────────────────────────

pub struct TestApp {
    pub state: AppState,
    pub pinner: Arc<MockPinner>,
    pub anchorer: Arc<MockAnchorer>,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new(pinner: MockPinner, anchorer: MockAnchorer) -> Self {
        Self::with_journal(pinner, anchorer, Arc::new(MemoryJournal::new()))
    }

    pub fn with_journal(pinner: MockPinner, anchorer: MockAnchorer, journal: Arc<dyn UploadJournal>) -> Self {
        Self::from_parts(Arc::new(pinner), Arc::new(anchorer), journal)
    }

    /// Another app over this one's journal and pinner, anchoring with
    /// `anchorer`.
    pub fn sharing_pins(&self, anchorer: MockAnchorer) -> Self {
        Self::from_parts(self.pinner.clone(), Arc::new(anchorer), self.state.journal.clone())
    }

    fn from_parts(
        pinner: Arc<MockPinner>,
        anchorer: Arc<MockAnchorer>,
        journal: Arc<dyn UploadJournal>,
    ) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            ..ApiConfig::default()
        };
        let state = AppState::with_journal(config, pinner.clone(), anchorer.clone(), journal);
        Self {
            state,
            pinner,
            anchorer,
            upload_dir,
        }
    }

    pub fn router(&self) -> axum::Router {
        baseroot_api::app(self.state.clone())
    }

    /// Files left behind in the upload directory.
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// One multipart part.
pub enum Part<'a> {
    File { name: &'a str, bytes: &'a [u8] },
    Text { field: &'a str, value: &'a str },
}

pub fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

/// The usual request: one file plus a valid owner.
pub fn hello_upload() -> Request<Body> {
    multipart_request(&[
        Part::File {
            name: "hello.txt",
            bytes: b"Hello, Pinata!",
        },
        Part::Text {
            field: "owner",
            value: OWNER,
        },
    ])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
