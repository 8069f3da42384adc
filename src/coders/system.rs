use serde::Serialize;

use crate::coders::{
    DecodedPayload, InstructionCoder, ParsedInstruction, TransactionContext, read_pubkey,
    read_u32_le, read_u64_le,
};
use crate::error::Error;
use crate::programs::SYSTEM_PROGRAM_ID;
use crate::record::ResolvedInstruction;

const PROGRAM_IDS: &[&str] = &[SYSTEM_PROGRAM_ID];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemInstruction {
    CreateAccount {
        source: String,
        new_account: String,
        lamports: u64,
        space: u64,
        owner: String,
    },
    Assign {
        account: String,
        owner: String,
    },
    Transfer {
        source: String,
        destination: String,
        lamports: u64,
    },
    CreateAccountWithSeed {
        source: String,
        new_account: String,
        base: String,
        seed: String,
        lamports: u64,
        space: u64,
        owner: String,
    },
    Allocate {
        account: String,
        space: u64,
    },
    TransferWithSeed {
        source: String,
        base: String,
        destination: String,
        lamports: u64,
        seed: String,
        owner: String,
    },
}

impl SystemInstruction {
    /// Source, destination and lamports when this instruction moves lamports
    /// between two existing accounts.
    pub fn lamport_transfer(&self) -> Option<(&str, &str, u64)> {
        match self {
            Self::Transfer {
                source,
                destination,
                lamports,
            }
            | Self::TransferWithSeed {
                source,
                destination,
                lamports,
                ..
            } => Some((source, destination, *lamports)),
            _ => None,
        }
    }
}

fn min_accounts(discriminator: u32) -> Option<usize> {
    match discriminator {
        1 | 8 => Some(1),
        0 | 2 | 3 => Some(2),
        11 => Some(3),
        _ => None,
    }
}

/// Length-prefixed (u64) UTF-8 string; returns it with the offset just past it.
fn read_seed(data: &[u8], offset: usize) -> Option<(String, usize)> {
    let len = usize::try_from(read_u64_le(data, offset)?).ok()?;
    let start = offset.checked_add(8)?;
    let end = start.checked_add(len)?;
    let seed = std::str::from_utf8(data.get(start..end)?).ok()?;
    Some((seed.to_string(), end))
}

/// Decodes a system-program instruction. The discriminator is a little-endian u32.
pub fn decode_system_instruction(data: &[u8], accounts: &[String]) -> Option<SystemInstruction> {
    let discriminator = read_u32_le(data, 0)?;
    if accounts.len() < min_accounts(discriminator)? {
        return None;
    }
    let acc = |i: usize| accounts[i].clone();

    let ix = match discriminator {
        0 => SystemInstruction::CreateAccount {
            lamports: read_u64_le(data, 4)?,
            space: read_u64_le(data, 12)?,
            owner: read_pubkey(data, 20)?,
            source: acc(0),
            new_account: acc(1),
        },
        1 => SystemInstruction::Assign {
            owner: read_pubkey(data, 4)?,
            account: acc(0),
        },
        2 => SystemInstruction::Transfer {
            lamports: read_u64_le(data, 4)?,
            source: acc(0),
            destination: acc(1),
        },
        3 => {
            let base = read_pubkey(data, 4)?;
            let (seed, next) = read_seed(data, 36)?;
            SystemInstruction::CreateAccountWithSeed {
                lamports: read_u64_le(data, next)?,
                space: read_u64_le(data, next + 8)?,
                owner: read_pubkey(data, next + 16)?,
                source: acc(0),
                new_account: acc(1),
                base,
                seed,
            }
        }
        8 => SystemInstruction::Allocate {
            space: read_u64_le(data, 4)?,
            account: acc(0),
        },
        11 => {
            let lamports = read_u64_le(data, 4)?;
            let (seed, next) = read_seed(data, 12)?;
            SystemInstruction::TransferWithSeed {
                owner: read_pubkey(data, next)?,
                source: acc(0),
                base: acc(1),
                destination: acc(2),
                lamports,
                seed,
            }
        }
        _ => return None,
    };
    Some(ix)
}

pub struct SystemProgramCoder;

impl InstructionCoder for SystemProgramCoder {
    fn name(&self) -> &'static str {
        "system"
    }

    fn program_ids(&self) -> &'static [&'static str] {
        PROGRAM_IDS
    }

    fn parse<'a>(
        &self,
        ix: &'a ResolvedInstruction,
        position: u32,
        _ctx: &TransactionContext<'a>,
    ) -> Result<Option<ParsedInstruction<'a>>, Error> {
        Ok(
            decode_system_instruction(&ix.data, &ix.accounts).map(|decoded| ParsedInstruction {
                instruction: ix,
                position,
                payload: DecodedPayload::System(decoded),
                decoder_name: self.name(),
            }),
        )
    }
}
