use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::record::{BlockPosition, TransactionRecord};
use crate::types::{BlockEnvelope, DecodeOptions, Reward, TransactionEnvelope};
use crate::wire;

/// A transaction left out of [`DecodedBlock::transactions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTransaction {
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecodedBlock {
    pub slot: u64,
    pub blockhash: String,
    pub previous_blockhash: String,
    pub parent_slot: u64,
    pub block_height: Option<u64>,
    pub block_time: Option<i64>,
    /// Successfully decoded transactions, in block order.
    pub transactions: Vec<TransactionRecord>,
    pub skipped: Vec<SkippedTransaction>,
    pub rewards: Option<Vec<Reward>>,
}

/// Decodes one transaction of a block: payload text, wire format, then normalization.
pub fn decode_transaction(
    envelope: &TransactionEnvelope,
    at: BlockPosition,
) -> Result<TransactionRecord, Error> {
    let payload = envelope.transaction.to_bytes()?;
    let decoded = wire::decode(&payload)?;
    if let Some(reported) = envelope.version
        && reported != decoded.version
    {
        tracing::debug!(
            position = at.position,
            ?reported,
            decoded = ?decoded.version,
            "envelope version disagrees with message prefix"
        );
    }
    TransactionRecord::build(decoded, envelope.meta.as_ref(), at)
}

/// Parses one raw block entry into a [`TransactionEnvelope`] and decodes it.
fn decode_entry(raw: &serde_json::Value, at: BlockPosition) -> Result<TransactionRecord, Error> {
    let envelope = TransactionEnvelope::deserialize(raw).map_err(|e| Error::Envelope {
        reason: e.to_string(),
    })?;
    decode_transaction(&envelope, at)
}

fn decode_all(
    block: &BlockEnvelope,
    slot: u64,
    options: &DecodeOptions,
) -> Vec<Result<TransactionRecord, Error>> {
    let at = |position: usize| BlockPosition {
        position,
        slot,
        block_time: block.block_time,
    };

    #[cfg(feature = "parallel")]
    if options.parallel {
        use rayon::prelude::*;
        return block
            .transactions
            .par_iter()
            .enumerate()
            .map(|(position, tx)| decode_entry(tx, at(position)))
            .collect();
    }

    #[cfg(not(feature = "parallel"))]
    if options.parallel {
        tracing::debug!("parallel decoding requested without the `parallel` feature");
    }

    block
        .transactions
        .iter()
        .enumerate()
        .map(|(position, tx)| decode_entry(tx, at(position)))
        .collect()
}

/// Decodes every transaction in `block`.
///
/// Malformed transactions are logged and listed in `skipped`; they never
/// fail the block. Output keeps block order regardless of `options.parallel`.
pub fn decode_block(block: &BlockEnvelope, slot: u64, options: &DecodeOptions) -> DecodedBlock {
    let results = decode_all(block, slot, options);

    let mut transactions = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (position, result) in results.into_iter().enumerate() {
        match result {
            Ok(record) => transactions.push(record),
            Err(err) => {
                tracing::warn!(slot, position, error = %err, "dropping malformed transaction");
                skipped.push(SkippedTransaction {
                    position,
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        slot,
        decoded = transactions.len(),
        skipped = skipped.len(),
        "block decoded"
    );

    DecodedBlock {
        slot,
        blockhash: block.blockhash.clone(),
        previous_blockhash: block.previous_blockhash.clone(),
        parent_slot: block.parent_slot,
        block_height: block.block_height,
        block_time: block.block_time,
        transactions,
        skipped,
        rewards: block.rewards.clone(),
    }
}

/// Parses a provider block JSON document and decodes it.
///
/// Only the block-level fields must be well formed; a bad transaction entry
/// is skipped like any other malformed transaction.
pub fn decode_block_json(
    json: &str,
    slot: u64,
    options: &DecodeOptions,
) -> Result<DecodedBlock, Error> {
    let block: BlockEnvelope = serde_json::from_str(json)?;
    Ok(decode_block(&block, slot, options))
}
