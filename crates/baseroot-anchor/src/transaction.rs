//! # Anchor Transaction
//!
//! Compiles an instruction into a legacy Solana message and signs it with
//! a [`KeyProvider`]. Message compilation and encoding come from
//! `solana-program`; this module only adds the fee-payer signature.
//!
//! ```text
//! transaction = short_vec(1) signature message
//! ```

use baseroot_core::Pubkey;
use baseroot_crypto::{CryptoError, Ed25519Signature, KeyProvider};
use solana_program::hash::Hash;
use solana_program::instruction::Instruction;
use solana_program::message::Message;
use solana_program::pubkey::Pubkey as SolanaPubkey;
use solana_program::short_vec::ShortU16;

use crate::error::AnchorError;

/// The same 32 bytes as a `solana-program` key.
pub fn solana_pubkey(key: &Pubkey) -> SolanaPubkey {
    SolanaPubkey::new_from_array(*key.as_bytes())
}

/// A legacy transaction carrying only the fee payer's signature.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub signature: Ed25519Signature,
    pub message: Message,
}

impl SignedTransaction {
    /// Compile `instruction` with the provider's key as fee payer and sign.
    /// Fails if the instruction needs any other signer.
    pub fn sign(
        instruction: &Instruction,
        recent_blockhash: &Hash,
        signer: &dyn KeyProvider,
    ) -> Result<Self, AnchorError> {
        let payer = solana_pubkey(&signer.pubkey());
        let message = Message::new_with_blockhash(
            std::slice::from_ref(instruction),
            Some(&payer),
            recent_blockhash,
        );
        let required = usize::from(message.header.num_required_signatures);
        if required != 1 {
            return Err(AnchorError::Signing(CryptoError::InvalidKey(format!(
                "message needs {required} signers, provider holds only {payer}"
            ))));
        }
        let signature = signer.sign(&message.serialize())?;
        Ok(Self { signature, message })
    }

    /// Full wire bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, AnchorError> {
        let mut out = bincode::serialize(&ShortU16(1))?;
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&self.message.serialize());
        Ok(out)
    }
}
