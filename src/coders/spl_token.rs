use serde::Serialize;

use crate::coders::{
    DecodedPayload, InstructionCoder, ParsedInstruction, TransactionContext, read_pubkey, read_u8,
    read_u64_le,
};
use crate::error::Error;
use crate::programs::{TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::record::ResolvedInstruction;

const PROGRAM_IDS: &[&str] = &[TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID];

/// Instructions of the fungible-token program, with accounts named by role.
///
/// The token-2022 program shares these layouts for the listed discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenInstruction {
    InitializeMint {
        mint: String,
        decimals: u8,
        mint_authority: String,
        freeze_authority: Option<String>,
    },
    InitializeAccount {
        account: String,
        mint: String,
        owner: String,
    },
    Transfer {
        source: String,
        destination: String,
        authority: String,
        amount: u64,
    },
    Approve {
        source: String,
        delegate: String,
        owner: String,
        amount: u64,
    },
    Revoke {
        source: String,
        owner: String,
    },
    MintTo {
        mint: String,
        account: String,
        authority: String,
        amount: u64,
    },
    Burn {
        account: String,
        mint: String,
        authority: String,
        amount: u64,
    },
    CloseAccount {
        account: String,
        destination: String,
        owner: String,
    },
    FreezeAccount {
        account: String,
        mint: String,
        authority: String,
    },
    ThawAccount {
        account: String,
        mint: String,
        authority: String,
    },
    TransferChecked {
        source: String,
        mint: String,
        destination: String,
        authority: String,
        amount: u64,
        decimals: u8,
    },
    ApproveChecked {
        source: String,
        mint: String,
        delegate: String,
        owner: String,
        amount: u64,
        decimals: u8,
    },
    MintToChecked {
        mint: String,
        account: String,
        authority: String,
        amount: u64,
        decimals: u8,
    },
    BurnChecked {
        account: String,
        mint: String,
        authority: String,
        amount: u64,
        decimals: u8,
    },
    InitializeAccount2 {
        account: String,
        mint: String,
        owner: String,
    },
    SyncNative {
        account: String,
    },
    InitializeAccount3 {
        account: String,
        mint: String,
        owner: String,
    },
    InitializeMint2 {
        mint: String,
        decimals: u8,
        mint_authority: String,
        freeze_authority: Option<String>,
    },
}

impl TokenInstruction {
    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::Transfer { amount, .. }
            | Self::Approve { amount, .. }
            | Self::MintTo { amount, .. }
            | Self::Burn { amount, .. }
            | Self::TransferChecked { amount, .. }
            | Self::ApproveChecked { amount, .. }
            | Self::MintToChecked { amount, .. }
            | Self::BurnChecked { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}

/// Minimum account count for each supported discriminator.
fn min_accounts(discriminator: u8) -> Option<usize> {
    match discriminator {
        17 | 20 => Some(1),
        0 | 5 | 18 => Some(2),
        3 | 4 | 7 | 8 | 9 | 10 | 11 | 14 | 15 | 16 => Some(3),
        1 | 12 | 13 => Some(4),
        _ => None,
    }
}

/// `decimals`, mint authority, then an optional freeze authority behind a one-byte tag.
fn mint_fields(data: &[u8]) -> Option<(u8, String, Option<String>)> {
    let decimals = read_u8(data, 1)?;
    let mint_authority = read_pubkey(data, 2)?;
    let freeze_authority = match read_u8(data, 34) {
        None | Some(0) => None,
        Some(1) => Some(read_pubkey(data, 35)?),
        Some(_) => return None,
    };
    Some((decimals, mint_authority, freeze_authority))
}

/// Decodes instruction `data` against its resolved `accounts`.
///
/// Unknown discriminators, short data and missing accounts all yield `None`.
pub fn decode_token_instruction(data: &[u8], accounts: &[String]) -> Option<TokenInstruction> {
    let discriminator = *data.first()?;
    if accounts.len() < min_accounts(discriminator)? {
        return None;
    }
    let acc = |i: usize| accounts[i].clone();
    let amount = || read_u64_le(data, 1);
    let decimals = || read_u8(data, 9);

    let ix = match discriminator {
        0 => {
            let (decimals, mint_authority, freeze_authority) = mint_fields(data)?;
            TokenInstruction::InitializeMint {
                mint: acc(0),
                decimals,
                mint_authority,
                freeze_authority,
            }
        }
        1 => TokenInstruction::InitializeAccount {
            account: acc(0),
            mint: acc(1),
            owner: acc(2),
        },
        3 => TokenInstruction::Transfer {
            amount: amount()?,
            source: acc(0),
            destination: acc(1),
            authority: acc(2),
        },
        4 => TokenInstruction::Approve {
            amount: amount()?,
            source: acc(0),
            delegate: acc(1),
            owner: acc(2),
        },
        5 => TokenInstruction::Revoke {
            source: acc(0),
            owner: acc(1),
        },
        7 => TokenInstruction::MintTo {
            amount: amount()?,
            mint: acc(0),
            account: acc(1),
            authority: acc(2),
        },
        8 => TokenInstruction::Burn {
            amount: amount()?,
            account: acc(0),
            mint: acc(1),
            authority: acc(2),
        },
        9 => TokenInstruction::CloseAccount {
            account: acc(0),
            destination: acc(1),
            owner: acc(2),
        },
        10 => TokenInstruction::FreezeAccount {
            account: acc(0),
            mint: acc(1),
            authority: acc(2),
        },
        11 => TokenInstruction::ThawAccount {
            account: acc(0),
            mint: acc(1),
            authority: acc(2),
        },
        12 => TokenInstruction::TransferChecked {
            amount: amount()?,
            decimals: decimals()?,
            source: acc(0),
            mint: acc(1),
            destination: acc(2),
            authority: acc(3),
        },
        13 => TokenInstruction::ApproveChecked {
            amount: amount()?,
            decimals: decimals()?,
            source: acc(0),
            mint: acc(1),
            delegate: acc(2),
            owner: acc(3),
        },
        14 => TokenInstruction::MintToChecked {
            amount: amount()?,
            decimals: decimals()?,
            mint: acc(0),
            account: acc(1),
            authority: acc(2),
        },
        15 => TokenInstruction::BurnChecked {
            amount: amount()?,
            decimals: decimals()?,
            account: acc(0),
            mint: acc(1),
            authority: acc(2),
        },
        16 => TokenInstruction::InitializeAccount2 {
            owner: read_pubkey(data, 1)?,
            account: acc(0),
            mint: acc(1),
        },
        17 => TokenInstruction::SyncNative { account: acc(0) },
        18 => TokenInstruction::InitializeAccount3 {
            owner: read_pubkey(data, 1)?,
            account: acc(0),
            mint: acc(1),
        },
        20 => {
            let (decimals, mint_authority, freeze_authority) = mint_fields(data)?;
            TokenInstruction::InitializeMint2 {
                mint: acc(0),
                decimals,
                mint_authority,
                freeze_authority,
            }
        }
        _ => return None,
    };
    Some(ix)
}

pub struct TokenProgramCoder;

impl InstructionCoder for TokenProgramCoder {
    fn name(&self) -> &'static str {
        "spl_token"
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
            decode_token_instruction(&ix.data, &ix.accounts).map(|decoded| ParsedInstruction {
                instruction: ix,
                position,
                payload: DecodedPayload::Token(decoded),
                decoder_name: self.name(),
            }),
        )
    }
}
