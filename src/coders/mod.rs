//! Program-specific instruction decoders and the registry that dispatches to them.

pub mod spl_token;
pub mod system;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::error::Error;
use crate::record::{ResolvedInstruction, TransactionRecord};
use crate::wire::{PUBKEY_LEN, encode_address};

pub use spl_token::{TokenInstruction, TokenProgramCoder};
pub use system::{SystemInstruction, SystemProgramCoder};

/// What a coder extracted from one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "program", content = "instruction", rename_all = "snake_case")]
pub enum DecodedPayload {
    Token(TokenInstruction),
    System(SystemInstruction),
    /// Escape hatch for coders registered outside this crate.
    Custom(serde_json::Value),
}

/// A decoded view of one instruction. Borrows the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedInstruction<'a> {
    pub instruction: &'a ResolvedInstruction,
    /// Position in [`TransactionRecord::execution_order`].
    pub position: u32,
    pub payload: DecodedPayload,
    pub decoder_name: &'static str,
}

/// Transaction-level facts a coder may consult while parsing.
#[derive(Debug, Clone, Copy)]
pub struct TransactionContext<'a> {
    pub record: &'a TransactionRecord,
    /// Outer instruction this instruction belongs to.
    pub outer_index: u32,
    pub is_inner: bool,
}

impl TransactionContext<'_> {
    pub fn slot(&self) -> u64 {
        self.record.slot()
    }

    pub fn block_time(&self) -> Option<i64> {
        self.record.block_time()
    }

    pub fn main_signature(&self) -> Option<&str> {
        self.record.main_signature()
    }

    pub fn is_successful(&self) -> bool {
        self.record.is_successful()
    }
}

pub trait InstructionCoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn program_ids(&self) -> &'static [&'static str];

    fn can_handle(&self, ix: &ResolvedInstruction) -> bool {
        !ix.data.is_empty() && self.program_ids().contains(&ix.program_address.as_str())
    }

    /// `Ok(None)` means the instruction is not one this coder understands.
    /// `Err` is reserved for coder-internal failures.
    fn parse<'a>(
        &self,
        ix: &'a ResolvedInstruction,
        position: u32,
        ctx: &TransactionContext<'a>,
    ) -> Result<Option<ParsedInstruction<'a>>, Error>;
}

/// Coders indexed by the program addresses they declare.
///
/// Built once and then shared read-only; lookups never lock.
#[derive(Default)]
pub struct CoderRegistry {
    coders: Vec<Box<dyn InstructionCoder>>,
    by_program: HashMap<&'static str, Vec<usize>>,
}

impl std::fmt::Debug for CoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoderRegistry")
            .field(
                "coders",
                &self.coders.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_coders() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TokenProgramCoder));
        registry.register(Box::new(SystemProgramCoder));
        registry
    }

    pub fn register(&mut self, coder: Box<dyn InstructionCoder>) {
        let slot = self.coders.len();
        for program_id in coder.program_ids() {
            let entry = self.by_program.entry(*program_id).or_default();
            if !entry.contains(&slot) {
                entry.push(slot);
            }
        }
        self.coders.push(coder);
    }

    pub fn coders(&self) -> impl Iterator<Item = &dyn InstructionCoder> {
        self.coders.iter().map(|c| c.as_ref())
    }

    pub fn decoders_for_program(
        &self,
        program_address: &str,
    ) -> impl Iterator<Item = &dyn InstructionCoder> {
        self.by_program
            .get(program_address)
            .into_iter()
            .flatten()
            .filter_map(|&slot| self.coders.get(slot))
            .map(|c| c.as_ref())
    }

    pub fn decoders_for_instruction<'s>(
        &'s self,
        ix: &'s ResolvedInstruction,
    ) -> impl Iterator<Item = &'s dyn InstructionCoder> {
        self.decoders_for_program(&ix.program_address)
            .filter(move |c| c.can_handle(ix))
    }

    /// Runs every applicable coder over the record in execution order.
    ///
    /// A coder error or panic on one instruction is logged and skipped; it
    /// never stops other instructions or other coders.
    pub fn decode_transaction<'a>(
        &self,
        record: &'a TransactionRecord,
    ) -> BTreeMap<&'static str, Vec<ParsedInstruction<'a>>> {
        let mut results: BTreeMap<&'static str, Vec<ParsedInstruction<'a>>> = BTreeMap::new();
        for step in record.execution_order() {
            let ctx = TransactionContext {
                record,
                outer_index: step.outer_index,
                is_inner: step.is_inner,
            };
            for coder in self.decoders_for_instruction(step.instruction) {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    coder.parse(step.instruction, step.position, &ctx)
                }));
                match outcome {
                    Ok(Ok(Some(parsed))) => results.entry(coder.name()).or_default().push(parsed),
                    Ok(Ok(None)) => {}
                    Err(payload) => {
                        tracing::warn!(
                            coder = coder.name(),
                            position = step.position,
                            signature = ?record.main_signature(),
                            panic = panic_message(payload.as_ref()),
                            "coder panicked on instruction, skipping"
                        );
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(
                            coder = coder.name(),
                            position = step.position,
                            signature = ?record.main_signature(),
                            error = %err,
                            "coder failed on instruction, skipping"
                        );
                    }
                }
            }
        }
        results
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Option<String> {
    let bytes = data.get(offset..offset.checked_add(PUBKEY_LEN)?)?;
    Some(encode_address(bytes.try_into().ok()?))
}
