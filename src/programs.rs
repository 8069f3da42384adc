use serde::Serialize;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";
pub const COMPUTE_BUDGET_PROGRAM_ID: &str = "ComputeBudget111111111111111111111111111111";
pub const ADDRESS_LOOKUP_TABLE_PROGRAM_ID: &str = "AddressLookupTab1e1111111111111111111111111";
pub const VOTE_PROGRAM_ID: &str = "Vote111111111111111111111111111111111111111";
pub const PUMP_FUN_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Placeholder address for an inner instruction whose program could not be determined.
pub const UNKNOWN_PROGRAM: &str = "unknown";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::AsRefStr,
    strum_macros::IntoStaticStr,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KnownProgram {
    System,
    Token,
    #[serde(rename = "token_2022")]
    #[strum(serialize = "token_2022")]
    Token2022,
    AssociatedToken,
    Memo,
    ComputeBudget,
    AddressLookupTable,
    Vote,
    PumpFun,
}

impl KnownProgram {
    pub fn from_program_id(program_id: &str) -> Option<Self> {
        match program_id {
            SYSTEM_PROGRAM_ID => Some(Self::System),
            TOKEN_PROGRAM_ID => Some(Self::Token),
            TOKEN_2022_PROGRAM_ID => Some(Self::Token2022),
            ASSOCIATED_TOKEN_PROGRAM_ID => Some(Self::AssociatedToken),
            MEMO_PROGRAM_ID => Some(Self::Memo),
            COMPUTE_BUDGET_PROGRAM_ID => Some(Self::ComputeBudget),
            ADDRESS_LOOKUP_TABLE_PROGRAM_ID => Some(Self::AddressLookupTable),
            VOTE_PROGRAM_ID => Some(Self::Vote),
            PUMP_FUN_PROGRAM_ID => Some(Self::PumpFun),
            _ => None,
        }
    }

    pub fn program_id(self) -> &'static str {
        match self {
            Self::System => SYSTEM_PROGRAM_ID,
            Self::Token => TOKEN_PROGRAM_ID,
            Self::Token2022 => TOKEN_2022_PROGRAM_ID,
            Self::AssociatedToken => ASSOCIATED_TOKEN_PROGRAM_ID,
            Self::Memo => MEMO_PROGRAM_ID,
            Self::ComputeBudget => COMPUTE_BUDGET_PROGRAM_ID,
            Self::AddressLookupTable => ADDRESS_LOOKUP_TABLE_PROGRAM_ID,
            Self::Vote => VOTE_PROGRAM_ID,
            Self::PumpFun => PUMP_FUN_PROGRAM_ID,
        }
    }
}

/// Human-readable label for a program address, if it is a well-known one.
pub fn program_label(program_id: &str) -> Option<&'static str> {
    KnownProgram::from_program_id(program_id).map(|p| p.into())
}
