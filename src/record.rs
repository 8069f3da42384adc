//! The normalized, immutable per-transaction record and its derived views.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::accounts::AccountList;
use crate::attribution::Attributor;
use crate::coders::system::decode_system_instruction;
use crate::error::{Error, InstructionLocation};
use crate::programs::{SYSTEM_PROGRAM_ID, program_label};
use crate::status::TransactionError;
use crate::types::{RawInnerGroup, RawTokenBalance, Reward, TransactionMeta, TransactionVersion};
use crate::wire::{AddressTableLookup, DecodedTransaction};

/// Stack height reported for instructions listed directly in the message.
pub const OUTER_STACK_HEIGHT: u32 = 1;

fn serialize_base58<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bs58::encode(data).into_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedInstruction {
    pub program_address: String,
    pub program_label: Option<&'static str>,
    pub accounts: Vec<String>,
    #[serde(serialize_with = "serialize_base58")]
    pub data: Vec<u8>,
    pub stack_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InnerInstructionGroup {
    pub outer_index: u32,
    /// In log order, not sorted by depth.
    pub instructions: Vec<ResolvedInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub account_index: usize,
    pub account: String,
    pub mint: String,
    pub owner: Option<String>,
    pub program_id: Option<String>,
    pub amount: u64,
    pub decimals: u8,
}

impl TokenBalance {
    fn from_raw(raw: &RawTokenBalance, accounts: &AccountList) -> Result<Self, Error> {
        let account = accounts
            .address(raw.account_index)
            .map_err(|e| Error::Metadata {
                reason: format!("token balance: {e}"),
            })?
            .to_string();
        let amount = raw
            .ui_token_amount
            .amount
            .parse::<u64>()
            .map_err(|e| Error::Metadata {
                reason: format!("token amount {:?}: {e}", raw.ui_token_amount.amount),
            })?;
        Ok(Self {
            account_index: raw.account_index,
            account,
            mint: raw.mint.clone(),
            owner: raw.owner.clone(),
            program_id: raw.program_id.clone(),
            amount,
            decimals: raw.ui_token_amount.decimals,
        })
    }
}

/// One instruction in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionStep<'a> {
    pub position: u32,
    pub outer_index: u32,
    pub is_inner: bool,
    pub instruction: &'a ResolvedInstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeTransfer {
    pub source: String,
    pub destination: String,
    pub lamports: u64,
    pub outer_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenTransfer {
    pub account: String,
    pub mint: String,
    pub pre_amount: u64,
    pub post_amount: u64,
    pub amount_change: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LamportChange {
    pub account: String,
    pub pre: u64,
    pub post: u64,
    pub change: i128,
}

/// Block-relative placement of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockPosition {
    pub position: usize,
    pub slot: u64,
    pub block_time: Option<i64>,
}

/// A fully decoded transaction. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub(crate) position: usize,
    pub(crate) slot: u64,
    pub(crate) block_time: Option<i64>,
    pub(crate) signatures: Vec<String>,
    pub(crate) version: TransactionVersion,
    pub(crate) recent_blockhash: String,
    pub(crate) account_keys: AccountList,
    pub(crate) address_table_lookups: Vec<AddressTableLookup>,
    pub(crate) instructions: Vec<ResolvedInstruction>,
    pub(crate) inner_instructions: Vec<InnerInstructionGroup>,
    pub(crate) fee: u64,
    pub(crate) pre_balances: Vec<u64>,
    pub(crate) post_balances: Vec<u64>,
    pub(crate) pre_token_balances: Vec<TokenBalance>,
    pub(crate) post_token_balances: Vec<TokenBalance>,
    pub(crate) log_messages: Vec<String>,
    pub(crate) error: Option<TransactionError>,
    pub(crate) compute_units_consumed: Option<u64>,
    pub(crate) rewards: Vec<Reward>,
}

impl TransactionRecord {
    /// Builds the record from a wire-decoded transaction and its metadata.
    ///
    /// Missing metadata yields empty lists and a zero fee. An account index
    /// outside the extended account list fails the whole transaction.
    pub fn build(
        decoded: DecodedTransaction,
        meta: Option<&TransactionMeta>,
        at: BlockPosition,
    ) -> Result<Self, Error> {
        let DecodedTransaction {
            signatures,
            version,
            account_keys,
            recent_blockhash,
            instructions: raw_instructions,
            address_table_lookups,
            ..
        } = decoded;

        let account_keys =
            AccountList::extend(account_keys, meta.and_then(|m| m.loaded_addresses.as_ref()));

        let mut instructions = Vec::with_capacity(raw_instructions.len());
        for (index, raw) in raw_instructions.into_iter().enumerate() {
            let location = InstructionLocation::Outer { index };
            let program_address = account_keys
                .address(usize::from(raw.program_index))
                .map_err(|source| Error::Resolution { location, source })?
                .to_string();
            let accounts = account_keys
                .resolve(raw.account_indices.iter().map(|&i| usize::from(i)))
                .map_err(|source| Error::Resolution { location, source })?;
            instructions.push(ResolvedInstruction {
                program_label: program_label(&program_address),
                program_address,
                accounts,
                data: raw.data,
                stack_height: Some(OUTER_STACK_HEIGHT),
            });
        }

        let log_messages = meta
            .and_then(|m| m.log_messages.clone())
            .unwrap_or_default();
        let inner_instructions = match meta.and_then(|m| m.inner_instructions.as_deref()) {
            Some(groups) => resolve_inner_groups(groups, &account_keys, &log_messages)?,
            None => Vec::new(),
        };

        let token_balances = |raw: Option<&Vec<RawTokenBalance>>| -> Result<Vec<TokenBalance>, Error> {
            raw.into_iter()
                .flatten()
                .map(|b| TokenBalance::from_raw(b, &account_keys))
                .collect()
        };
        let pre_token_balances = token_balances(meta.and_then(|m| m.pre_token_balances.as_ref()))?;
        let post_token_balances =
            token_balances(meta.and_then(|m| m.post_token_balances.as_ref()))?;

        Ok(Self {
            position: at.position,
            slot: at.slot,
            block_time: at.block_time,
            signatures,
            version,
            recent_blockhash,
            account_keys,
            address_table_lookups,
            instructions,
            inner_instructions,
            fee: meta.map_or(0, |m| m.fee),
            pre_balances: meta.map(|m| m.pre_balances.clone()).unwrap_or_default(),
            post_balances: meta.map(|m| m.post_balances.clone()).unwrap_or_default(),
            pre_token_balances,
            post_token_balances,
            log_messages,
            error: meta
                .and_then(|m| m.err.as_ref())
                .map(TransactionError::from_value),
            compute_units_consumed: meta.and_then(|m| m.compute_units_consumed),
            rewards: meta.and_then(|m| m.rewards.clone()).unwrap_or_default(),
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn block_time(&self) -> Option<i64> {
        self.block_time
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn version(&self) -> TransactionVersion {
        self.version
    }

    pub fn recent_blockhash(&self) -> &str {
        &self.recent_blockhash
    }

    pub fn account_keys(&self) -> &AccountList {
        &self.account_keys
    }

    pub fn address_table_lookups(&self) -> &[AddressTableLookup] {
        &self.address_table_lookups
    }

    pub fn instructions(&self) -> &[ResolvedInstruction] {
        &self.instructions
    }

    pub fn inner_instructions(&self) -> &[InnerInstructionGroup] {
        &self.inner_instructions
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn pre_balances(&self) -> &[u64] {
        &self.pre_balances
    }

    pub fn post_balances(&self) -> &[u64] {
        &self.post_balances
    }

    pub fn pre_token_balances(&self) -> &[TokenBalance] {
        &self.pre_token_balances
    }

    pub fn post_token_balances(&self) -> &[TokenBalance] {
        &self.post_token_balances
    }

    pub fn log_messages(&self) -> &[String] {
        &self.log_messages
    }

    pub fn error(&self) -> Option<&TransactionError> {
        self.error.as_ref()
    }

    pub fn compute_units_consumed(&self) -> Option<u64> {
        self.compute_units_consumed
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    pub fn main_signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }

    pub fn signers(&self) -> impl Iterator<Item = &str> {
        self.account_keys
            .iter()
            .filter(|k| k.is_signer)
            .map(|k| k.address.as_str())
    }

    /// Whether any outer or inner instruction runs `program_address`.
    pub fn includes_program(&self, program_address: &str) -> bool {
        self.execution_order()
            .any(|step| step.instruction.program_address == program_address)
    }

    fn inner_for(&self, outer_index: u32) -> impl Iterator<Item = &ResolvedInstruction> {
        self.inner_instructions
            .iter()
            .filter(move |g| g.outer_index == outer_index)
            .flat_map(|g| g.instructions.iter())
    }

    /// Outer instructions, each followed by its inner group. Recomputed on every call.
    pub fn execution_order(&self) -> impl Iterator<Item = ExecutionStep<'_>> {
        self.instructions
            .iter()
            .zip(0u32..)
            .flat_map(move |(outer, outer_index)| {
                std::iter::once((outer_index, false, outer)).chain(
                    self.inner_for(outer_index)
                        .map(move |ix| (outer_index, true, ix)),
                )
            })
            .zip(0u32..)
            .map(|((outer_index, is_inner, instruction), position)| ExecutionStep {
                position,
                outer_index,
                is_inner,
                instruction,
            })
    }

    /// Lamport moves performed by inner system-program transfers.
    pub fn native_transfers(&self) -> Vec<NativeTransfer> {
        self.inner_instructions
            .iter()
            .flat_map(|g| g.instructions.iter().map(move |ix| (g.outer_index, ix)))
            .filter(|(_, ix)| ix.program_address == SYSTEM_PROGRAM_ID)
            .filter_map(|(outer_index, ix)| {
                let decoded = decode_system_instruction(&ix.data, &ix.accounts)?;
                let (source, destination, lamports) = decoded.lamport_transfer()?;
                Some(NativeTransfer {
                    source: source.to_string(),
                    destination: destination.to_string(),
                    lamports,
                    outer_index,
                })
            })
            .collect()
    }

    /// Net change per (account, mint). A side missing from one snapshot counts as zero.
    pub fn token_transfers(&self) -> Vec<TokenTransfer> {
        let mut amounts: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
        for b in &self.pre_token_balances {
            amounts.entry((b.account.as_str(), b.mint.as_str())).or_default().0 = b.amount;
        }
        for b in &self.post_token_balances {
            amounts.entry((b.account.as_str(), b.mint.as_str())).or_default().1 = b.amount;
        }
        amounts
            .into_iter()
            .filter(|(_, (pre, post))| pre != post)
            .map(|((account, mint), (pre, post))| TokenTransfer {
                account: account.to_string(),
                mint: mint.to_string(),
                pre_amount: pre,
                post_amount: post,
                amount_change: i128::from(post) - i128::from(pre),
            })
            .collect()
    }

    /// Per-account lamport deltas, in account order. Unchanged accounts are omitted.
    ///
    /// Only accounts present in both balance snapshots are compared; when the
    /// snapshots differ in length the tail of the longer one is ignored.
    pub fn lamport_changes(&self) -> Vec<LamportChange> {
        if self.pre_balances.len() != self.post_balances.len() {
            tracing::debug!(
                signature = ?self.main_signature(),
                pre = self.pre_balances.len(),
                post = self.post_balances.len(),
                "balance snapshots differ in length, comparing common prefix"
            );
        }
        self.account_keys
            .iter()
            .zip(self.pre_balances.iter().zip(&self.post_balances))
            .filter(|(_, (pre, post))| pre != post)
            .map(|(key, (&pre, &post))| LamportChange {
                account: key.address.clone(),
                pre,
                post,
                change: i128::from(post) - i128::from(pre),
            })
            .collect()
    }
}

fn resolve_inner_groups(
    groups: &[RawInnerGroup],
    accounts: &AccountList,
    logs: &[String],
) -> Result<Vec<InnerInstructionGroup>, Error> {
    let attributor = Attributor::new(logs, accounts);
    groups
        .iter()
        .map(|group| {
            let instructions = group
                .instructions
                .iter()
                .enumerate()
                .map(|(index, raw)| {
                    let location = InstructionLocation::Inner {
                        outer_index: group.index,
                        index,
                    };
                    let program_address = attributor.attribute(raw).program_address;
                    let resolved = accounts
                        .resolve(raw.accounts.iter().copied())
                        .map_err(|source| Error::Resolution { location, source })?;
                    let data = bs58::decode(&raw.data)
                        .into_vec()
                        .map_err(|e| Error::Encoding {
                            reason: format!("{location} data: {e}"),
                        })?;
                    Ok(ResolvedInstruction {
                        program_label: program_label(&program_address),
                        program_address,
                        accounts: resolved,
                        data,
                        stack_height: raw.stack_height,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(InnerInstructionGroup {
                outer_index: group.index,
                instructions,
            })
        })
        .collect()
}
