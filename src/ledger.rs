//! Append-only ledger of approved transfers.
//!
//! Every call to [`Network::approve_transfer`](crate::message::Network::approve_transfer)
//! appends one [`TransactionRecord`]. Records are never edited or removed.
//!
//! ## Digest
//!
//! The ledger can be reduced to a 32-byte SHA-256 digest: each record is
//! encoded as a fixed-size SSZ [`LedgerEntry`] and fed to the hasher in
//! order. Two runs that clear the same passes the same way produce the same
//! digest, which is what the seeded determinism tests compare.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;
use tracing::debug;

use crate::error::LedgerError;
use crate::message::Message;
use crate::types::{manifest_quantity, CommId, Manifest, MessageId, Transaction};

/// One approved transfer.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// Sequential id, starting at 1 within a network.
    pub id: u64,

    /// Message that carried the transfer down to its endpoint.
    pub message: MessageId,

    /// Transaction as it stood at approval.
    pub transaction: Transaction,

    /// Resource units that changed hands.
    pub manifest: Manifest,
}

impl TransactionRecord {
    /// Total quantity moved.
    pub fn quantity(&self) -> f64 {
        manifest_quantity(&self.manifest)
    }
}

/// Fixed-size SSZ image of a record, used for the digest.
///
/// Floating-point fields are stored as their IEEE-754 bit patterns;
/// unset parties are encoded as `u64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct LedgerEntry {
    pub transaction_id: u64,
    pub message_serial: u64,
    pub supplier: u64,
    pub requester: u64,
    pub commodity: u64,
    pub quantity_bits: u64,
    pub price_bits: u64,
    pub manifest_len: u64,
}

impl From<&TransactionRecord> for LedgerEntry {
    fn from(record: &TransactionRecord) -> Self {
        let party = |id: Option<CommId>| id.map_or(u64::MAX, |c| c.index() as u64);
        Self {
            transaction_id: record.id,
            message_serial: record.message.serial(),
            supplier: party(record.transaction.supplier),
            requester: party(record.transaction.requester),
            commodity: u64::from(record.transaction.commodity.0),
            quantity_bits: record.quantity().to_bits(),
            price_bits: record.transaction.price.to_bits(),
            manifest_len: record.manifest.len() as u64,
        }
    }
}

/// In-memory, append-only transaction ledger.
#[derive(Debug, Default)]
pub struct TransactionLedger {
    records: Vec<TransactionRecord>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `message`. `id` is assigned by the caller and
    /// must be larger than every id already recorded.
    pub fn register_transaction(&mut self, id: u64, message: &Message, manifest: Manifest) {
        debug_assert!(
            self.records.last().map_or(true, |last| last.id < id),
            "ledger ids must increase"
        );
        debug!(transaction = id, message = %message.id(), units = manifest.len(), "transaction registered");
        self.records.push(TransactionRecord {
            id,
            message: message.id(),
            transaction: message.transaction().clone(),
            manifest,
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Total quantity moved across all records.
    pub fn total_quantity(&self) -> f64 {
        self.records.iter().fold(0.0, |total, r| total + r.quantity())
    }

    /// SHA-256 over the SSZ encoding of every record, in ledger order.
    pub fn digest(&self) -> Result<[u8; 32], LedgerError> {
        let mut hasher = Sha256::new();
        for record in &self.records {
            let entry = LedgerEntry::from(record);
            let bytes = ssz_rs::serialize(&entry).map_err(|e| LedgerError::Encoding {
                transaction_id: record.id,
                reason: format!("{e:?}"),
            })?;
            hasher.update(&bytes);
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Ok(digest)
    }

    /// Digest as a lowercase hex string.
    pub fn digest_hex(&self) -> Result<String, LedgerError> {
        Ok(hex::encode(self.digest()?))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
