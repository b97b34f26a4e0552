//! # Anchor Submitter
//!
//! Builds the one-instruction transaction for an [`AnchorRecord`], signs it
//! with the service key, sends it and waits for confirmation.
//!
//! Preparation and submission are split so the caller can persist the
//! transaction signature before anything leaves the process. If the
//! process dies mid-submit, the recorded signature is enough to ask the
//! chain whether the transaction landed.
//!
//! Exactly one transaction is sent per [`Anchorer::submit`] call. There is
//! no retry, no fee bumping and no re-signing with a fresh blockhash.
//!
//! Once the send has been attempted, only a JSON-RPC error from
//! `sendTransaction` or an on-chain failure is a definite "no". Any other
//! error after that point is reported with [`AnchorError::outcome_unknown`]
//! set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use baseroot_core::Pubkey;
use baseroot_crypto::{Ed25519Signature, KeyProvider};
use solana_program::hash::Hash;
use solana_program::instruction::{AccountMeta, Instruction};

use crate::config::{AnchorConfig, Commitment};
use crate::error::AnchorError;
use crate::instruction::AnchorRecord;
use crate::rpc::{RpcClient, SignatureStatus};
use crate::transaction::{solana_pubkey, SignedTransaction};

/// A signed transaction ready to send.
#[derive(Debug, Clone)]
pub struct PreparedAnchor {
    pub record: AnchorRecord,
    pub signature: Ed25519Signature,
    pub recent_blockhash: Hash,
    /// Serialized transaction.
    pub wire: Vec<u8>,
}

/// On-chain status of a previously prepared transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorStatus {
    /// The node has no record of the signature.
    NotFound,
    /// Seen but below the target commitment.
    Pending,
    /// Reached the target commitment without error.
    Confirmed,
    /// Landed with a transaction error.
    Failed(String),
}

/// Writes anchor records to the chain.
#[async_trait]
pub trait Anchorer: Send + Sync {
    /// Build and sign the transaction for `record` without sending it.
    async fn prepare(&self, record: &AnchorRecord) -> Result<PreparedAnchor, AnchorError>;

    /// Send a prepared transaction and wait for confirmation.
    async fn submit(&self, prepared: &PreparedAnchor) -> Result<Ed25519Signature, AnchorError>;

    /// Look up the status of a signature.
    async fn signature_status(&self, signature: &Ed25519Signature) -> Result<AnchorStatus, AnchorError>;

    /// Fee payer public key.
    fn payer(&self) -> Pubkey;

    /// Prepare and submit in one step.
    async fn anchor(&self, record: &AnchorRecord) -> Result<Ed25519Signature, AnchorError> {
        let prepared = self.prepare(record).await?;
        self.submit(&prepared).await
    }
}

/// [`Anchorer`] backed by a Solana JSON-RPC endpoint.
pub struct AnchorSubmitter {
    rpc: RpcClient,
    signer: Arc<dyn KeyProvider>,
    program_id: Pubkey,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for AnchorSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorSubmitter")
            .field("rpc", &self.rpc)
            .field("signer", &self.signer.provider_name())
            .field("payer", &self.signer.pubkey())
            .field("program_id", &self.program_id)
            .field("confirm_timeout", &self.confirm_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl AnchorSubmitter {
    pub fn new(config: &AnchorConfig, signer: Arc<dyn KeyProvider>) -> Result<Self, AnchorError> {
        let rpc = RpcClient::new(
            config.rpc_url.clone(),
            config.commitment,
            Duration::from_secs(config.rpc_timeout_secs),
        )?;
        Ok(Self {
            rpc,
            signer,
            program_id: config.program_id,
            confirm_timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn commitment(&self) -> Commitment {
        self.rpc.commitment()
    }

    /// The instruction for `record`: payer signs and pays, owner is
    /// referenced read-only, data is the anchor payload.
    pub fn instruction(&self, record: &AnchorRecord) -> Instruction {
        let payer = self.signer.pubkey();
        let mut accounts = vec![AccountMeta::new(solana_pubkey(&payer), true)];
        if record.owner != payer {
            accounts.push(AccountMeta::new_readonly(solana_pubkey(&record.owner), false));
        }
        Instruction::new_with_bytes(solana_pubkey(&self.program_id), &record.payload(), accounts)
    }

    /// Sign against an explicit blockhash.
    pub fn prepare_with_blockhash(
        &self,
        record: &AnchorRecord,
        recent_blockhash: Hash,
    ) -> Result<PreparedAnchor, AnchorError> {
        let tx = SignedTransaction::sign(&self.instruction(record), &recent_blockhash, self.signer.as_ref())?;
        Ok(PreparedAnchor {
            record: record.clone(),
            signature: tx.signature,
            recent_blockhash,
            wire: tx.serialize()?,
        })
    }

    fn classify(&self, status: Option<SignatureStatus>) -> AnchorStatus {
        match status {
            None => AnchorStatus::NotFound,
            Some(s) => match &s.err {
                Some(err) => AnchorStatus::Failed(err.to_string()),
                None if s.reached(self.rpc.commitment()) => AnchorStatus::Confirmed,
                None => AnchorStatus::Pending,
            },
        }
    }
}

#[async_trait]
impl Anchorer for AnchorSubmitter {
    async fn prepare(&self, record: &AnchorRecord) -> Result<PreparedAnchor, AnchorError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let prepared = self.prepare_with_blockhash(record, blockhash)?;
        tracing::debug!(
            signature = %prepared.signature,
            cid = %record.cid,
            size = prepared.wire.len(),
            "prepared anchor transaction"
        );
        Ok(prepared)
    }

    async fn submit(&self, prepared: &PreparedAnchor) -> Result<Ed25519Signature, AnchorError> {
        let signature = prepared.signature;
        let returned = match self.rpc.send_transaction(&prepared.wire).await {
            Ok(returned) => returned,
            // The node answered with an error object: nothing was accepted.
            Err(e @ AnchorError::Rpc { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(signature = %signature, error = %e, "send outcome unknown");
                return Err(AnchorError::unresolved(signature, e));
            }
        };
        if returned != signature {
            let e = AnchorError::InvalidResponse {
                method: "sendTransaction".into(),
                detail: format!("node returned signature {returned}, expected {signature}"),
            };
            return Err(AnchorError::unresolved(signature, e));
        }
        tracing::info!(signature = %signature, "anchor transaction sent");

        let started = Instant::now();
        let mut last_error = None;
        loop {
            match self.rpc.get_signature_status(&signature).await {
                Ok(status) => {
                    last_error = None;
                    match self.classify(status) {
                        AnchorStatus::Confirmed => {
                            tracing::info!(
                                signature = %signature,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "anchor transaction confirmed"
                            );
                            return Ok(signature);
                        }
                        AnchorStatus::Failed(reason) => {
                            tracing::error!(signature = %signature, reason = %reason, "anchor transaction failed");
                            return Err(AnchorError::Rejected { signature, reason });
                        }
                        AnchorStatus::NotFound | AnchorStatus::Pending => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(signature = %signature, error = %e, "signature status lookup failed");
                    last_error = Some(e);
                }
            }

            let waited = started.elapsed();
            if waited >= self.confirm_timeout {
                let waited_ms = waited.as_millis() as u64;
                tracing::warn!(signature = %signature, waited_ms, "confirmation timed out");
                return Err(match last_error {
                    Some(e) => AnchorError::unresolved(signature, e),
                    None => AnchorError::ConfirmationTimeout { signature, waited_ms },
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn signature_status(&self, signature: &Ed25519Signature) -> Result<AnchorStatus, AnchorError> {
        let status = self.rpc.get_signature_status(signature).await?;
        Ok(self.classify(status))
    }

    fn payer(&self) -> Pubkey {
        self.signer.pubkey()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baseroot_core::{sha256_digest, ContentId};
    use baseroot_crypto::LocalKeyProvider;

    fn submitter(signer: Arc<dyn KeyProvider>) -> AnchorSubmitter {
        let config = AnchorConfig::local_mock("http://127.0.0.1:1", Pubkey::new([7; 32])).unwrap();
        AnchorSubmitter::new(&config, signer).unwrap()
    }

    fn record(owner: Pubkey) -> AnchorRecord {
        AnchorRecord::new(
            sha256_digest(b"Hello, Pinata!"),
            ContentId::new("QmNRCQWfgze6AbBCaT1rkrkV5tJ2aP4oTNPb5JZcXYywve").unwrap(),
            owner,
        )
    }

    #[test]
    fn instruction_accounts() {
        let signer = Arc::new(LocalKeyProvider::from_seed(&[1; 32]));
        let payer = signer.pubkey();
        let s = submitter(signer);
        let owner = Pubkey::new([2; 32]);

        let ix = s.instruction(&record(owner));
        assert_eq!(ix.program_id, solana_pubkey(&Pubkey::new([7; 32])));
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new(solana_pubkey(&payer), true),
                AccountMeta::new_readonly(solana_pubkey(&owner), false),
            ]
        );
        assert_eq!(ix.data, record(owner).payload());

        let ix = s.instruction(&record(payer));
        assert_eq!(ix.accounts, vec![AccountMeta::new(solana_pubkey(&payer), true)]);
    }

    #[test]
    fn prepared_signature_covers_message() {
        let signer = Arc::new(LocalKeyProvider::from_seed(&[1; 32]));
        let payer = signer.pubkey();
        let s = submitter(signer);
        let prepared = s
            .prepare_with_blockhash(&record(Pubkey::new([2; 32])), Hash::new_from_array([5; 32]))
            .unwrap();

        assert_eq!(prepared.wire[0], 1);
        assert_eq!(&prepared.wire[1..65], prepared.signature.as_bytes());
        assert!(prepared.signature.verify(&prepared.wire[65..], &payer).is_ok());
    }

    #[test]
    fn prepare_is_deterministic_for_same_blockhash() {
        let s = submitter(Arc::new(LocalKeyProvider::from_seed(&[1; 32])));
        let r = record(Pubkey::new([2; 32]));
        let a = s.prepare_with_blockhash(&r, Hash::new_from_array([5; 32])).unwrap();
        let b = s.prepare_with_blockhash(&r, Hash::new_from_array([5; 32])).unwrap();
        assert_eq!(a.signature, b.signature);
        let c = s.prepare_with_blockhash(&r, Hash::new_from_array([6; 32])).unwrap();
        assert_ne!(a.signature, c.signature);
    }
}
