use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A block as handed over by the provider's envelope layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEnvelope {
    /// Hash of the parent block (base58).
    pub previous_blockhash: String,
    /// Hash of this block (base58).
    pub blockhash: String,
    pub parent_slot: u64,
    #[serde(default)]
    pub block_height: Option<u64>,
    /// Estimated production time, Unix seconds.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Kept as raw JSON; each entry is parsed into a [`TransactionEnvelope`]
    /// when its transaction is decoded, so a malformed one is skipped alone.
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    #[serde(default)]
    pub rewards: Option<Vec<Reward>>,
}

/// A lamport credit or debit applied outside instruction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub pubkey: String,
    pub lamports: i64,
    pub post_balance: u64,
    #[serde(default)]
    pub reward_type: Option<RewardType>,
    /// Vote account commission; only reported for voting and staking rewards.
    #[serde(default)]
    pub commission: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    #[serde(alias = "Fee")]
    Fee,
    #[serde(alias = "Rent")]
    Rent,
    #[serde(alias = "Voting")]
    Voting,
    #[serde(alias = "Staking")]
    Staking,
}

/// One transaction inside a [`BlockEnvelope`].
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    /// Serialized transaction, either bare base64 or `[payload, encoding]`.
    pub transaction: EncodedPayload,
    /// Execution metadata; `None` when the provider did not record it.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    #[serde(default)]
    pub version: Option<TransactionVersion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    Base64,
    Base58,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EncodedPayload {
    Bare(String),
    Tagged(String, PayloadEncoding),
}

impl EncodedPayload {
    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            Self::Bare(_) => PayloadEncoding::Base64,
            Self::Tagged(_, encoding) => *encoding,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Bare(s) | Self::Tagged(s, _) => s,
        }
    }

    /// Decodes the text payload into raw wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        match self.encoding() {
            PayloadEncoding::Base64 => BASE64.decode(self.as_str()).map_err(|e| Error::Encoding {
                reason: format!("invalid base64 payload: {e}"),
            }),
            PayloadEncoding::Base58 => {
                bs58::decode(self.as_str())
                    .into_vec()
                    .map_err(|e| Error::Encoding {
                        reason: format!("invalid base58 payload: {e}"),
                    })
            }
        }
    }
}

/// Message format version: `"legacy"` or a numeric version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum TransactionVersion {
    Legacy,
    Numbered(u8),
}

impl TryFrom<serde_json::Value> for TransactionVersion {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match &value {
            serde_json::Value::String(s) if s == "legacy" => Ok(Self::Legacy),
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .map(Self::Numbered)
                .ok_or_else(|| format!("unsupported transaction version {n}")),
            other => Err(format!("unsupported transaction version {other}")),
        }
    }
}

impl From<TransactionVersion> for serde_json::Value {
    fn from(version: TransactionVersion) -> Self {
        match version {
            TransactionVersion::Legacy => serde_json::Value::String("legacy".to_string()),
            TransactionVersion::Numbered(v) => serde_json::Value::from(v),
        }
    }
}

/// Per-transaction execution metadata. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionMeta {
    /// `null` on success; otherwise the raw error shape reported by the ledger.
    pub err: Option<serde_json::Value>,
    pub fee: u64,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub inner_instructions: Option<Vec<RawInnerGroup>>,
    pub pre_token_balances: Option<Vec<RawTokenBalance>>,
    pub post_token_balances: Option<Vec<RawTokenBalance>>,
    pub log_messages: Option<Vec<String>>,
    pub loaded_addresses: Option<LoadedAddresses>,
    pub compute_units_consumed: Option<u64>,
    pub rewards: Option<Vec<Reward>>,
}

/// Addresses appended to the account list from address lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadedAddresses {
    pub writable: Vec<String>,
    pub readonly: Vec<String>,
}

/// Inner instructions triggered by the outer instruction at `index`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInnerGroup {
    pub index: u32,
    pub instructions: Vec<RawInnerInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInnerInstruction {
    /// Index of the invoked program; older encodings may report it unreliably.
    #[serde(default)]
    pub program_id_index: Option<usize>,
    /// Indices into the extended account list. Wider than the wire's `u8` so
    /// an out-of-range index surfaces as a resolution failure.
    #[serde(default)]
    pub accounts: Vec<usize>,
    /// Instruction data, base58.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub stack_height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    /// Raw integer amount as a decimal string.
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

/// Caller-supplied knobs for block decoding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Decode transactions on the rayon pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}
