#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod accounts;
pub mod attribution;
pub mod block;
pub mod coders;
pub mod error;
pub mod programs;
pub mod record;
pub mod status;
pub mod types;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use accounts::{AccountKey, AccountList, AccountOrigin, ResolutionError};
pub use attribution::{Attribution, AttributionSource, Attributor, InvocationStack};
pub use block::{DecodedBlock, SkippedTransaction, decode_block, decode_block_json, decode_transaction};
pub use coders::{
    CoderRegistry, DecodedPayload, InstructionCoder, ParsedInstruction, TransactionContext,
};
pub use error::{Error, InstructionLocation};
pub use programs::{KnownProgram, UNKNOWN_PROGRAM, program_label};
pub use record::{
    BlockPosition, ExecutionStep, InnerInstructionGroup, LamportChange, NativeTransfer,
    ResolvedInstruction, TokenBalance, TokenTransfer, TransactionRecord,
};
pub use status::{InstructionFailure, TransactionError, TransactionErrorKind};
pub use types::{
    BlockEnvelope, DecodeOptions, Reward, RewardType, TransactionEnvelope, TransactionMeta,
    TransactionVersion,
};
