use serde::Serialize;

/// Plain-string transaction errors reported by the ledger.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum TransactionErrorKind {
    AccountInUse,
    AccountLoadedTwice,
    AccountNotFound,
    ProgramAccountNotFound,
    InsufficientFundsForFee,
    InvalidAccountForFee,
    AlreadyProcessed,
    BlockhashNotFound,
    CallChainTooDeep,
    MissingSignatureForFee,
    InvalidAccountIndex,
    SignatureFailure,
    InvalidProgramForExecution,
    SanitizeFailure,
    ClusterMaintenance,
    AccountBorrowOutstanding,
    WouldExceedMaxBlockCostLimit,
    UnsupportedVersion,
    InvalidWritableAccount,
    WouldExceedMaxAccountCostLimit,
    WouldExceedAccountDataBlockLimit,
    TooManyAccountLocks,
    AddressLookupTableNotFound,
    InvalidAddressLookupTableOwner,
    InvalidAddressLookupTableData,
    InvalidAddressLookupTableIndex,
    InvalidRentPayingAccount,
    WouldExceedMaxVoteCostLimit,
    WouldExceedAccountDataTotalLimit,
    MaxLoadedAccountsDataSizeExceeded,
    InvalidLoadedAccountsDataSizeLimit,
    ResanitizationNeeded,
    UnbalancedTransaction,
    ProgramCacheHitMaxLimit,
    CommitCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionFailure {
    /// Program-defined error code.
    Custom(u32),
    /// Built-in instruction error name, e.g. `InvalidAccountData`.
    Named(String),
}

/// Why a transaction failed, classified from the metadata `err` field.
///
/// Shapes not recognised here degrade to [`TransactionError::Unknown`] so new
/// ledger error variants never break decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionError {
    Instruction {
        index: u8,
        failure: InstructionFailure,
    },
    InsufficientFundsForRent {
        account_index: u8,
    },
    DuplicateInstruction {
        index: u8,
    },
    Kind {
        kind: TransactionErrorKind,
    },
    Unknown {
        raw: String,
    },
}

impl TransactionError {
    pub fn from_value(value: &serde_json::Value) -> Self {
        classify(value).unwrap_or_else(|| Self::Unknown {
            raw: value.to_string(),
        })
    }

    pub fn instruction_index(&self) -> Option<u8> {
        match self {
            Self::Instruction { index, .. } | Self::DuplicateInstruction { index } => Some(*index),
            _ => None,
        }
    }
}

fn small_index(value: &serde_json::Value) -> Option<u8> {
    value.as_u64().and_then(|v| u8::try_from(v).ok())
}

fn classify(value: &serde_json::Value) -> Option<TransactionError> {
    if let Some(name) = value.as_str() {
        let kind = name.parse::<TransactionErrorKind>().ok()?;
        return Some(TransactionError::Kind { kind });
    }

    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    let (tag, inner) = obj.iter().next()?;
    match tag.as_str() {
        "InstructionError" => {
            let pair = inner.as_array()?;
            let index = small_index(pair.first()?)?;
            let failure = instruction_failure(pair.get(1)?)?;
            Some(TransactionError::Instruction { index, failure })
        }
        "InsufficientFundsForRent" => {
            let account_index = small_index(inner.get("account_index")?)?;
            Some(TransactionError::InsufficientFundsForRent { account_index })
        }
        "DuplicateInstruction" => Some(TransactionError::DuplicateInstruction {
            index: small_index(inner)?,
        }),
        _ => None,
    }
}

fn instruction_failure(detail: &serde_json::Value) -> Option<InstructionFailure> {
    if let Some(name) = detail.as_str() {
        return Some(InstructionFailure::Named(name.to_string()));
    }
    let code = detail.get("Custom")?.as_u64()?;
    u32::try_from(code).ok().map(InstructionFailure::Custom)
}

#[cfg(test)]
mod tests {
    use super::{InstructionFailure, TransactionError, TransactionErrorKind};

    fn classify(value: serde_json::Value) -> TransactionError {
        TransactionError::from_value(&value)
    }

    #[test]
    fn instruction_error_with_custom_code() {
        let err = classify(serde_json::json!({ "InstructionError": [2, { "Custom": 6001 }] }));
        assert_eq!(
            err,
            TransactionError::Instruction {
                index: 2,
                failure: InstructionFailure::Custom(6001)
            }
        );
        assert_eq!(err.instruction_index(), Some(2));
    }

    #[test]
    fn instruction_error_with_named_reason() {
        let err = classify(serde_json::json!({ "InstructionError": [0, "InvalidAccountData"] }));
        assert_eq!(
            err,
            TransactionError::Instruction {
                index: 0,
                failure: InstructionFailure::Named("InvalidAccountData".to_string())
            }
        );
    }

    #[test]
    fn insufficient_funds_for_rent() {
        let err = classify(serde_json::json!({ "InsufficientFundsForRent": { "account_index": 3 } }));
        assert_eq!(
            err,
            TransactionError::InsufficientFundsForRent { account_index: 3 }
        );
        assert_eq!(err.instruction_index(), None);
    }

    #[test]
    fn plain_string_variants() {
        assert_eq!(
            classify(serde_json::json!("MaxLoadedAccountsDataSizeExceeded")),
            TransactionError::Kind {
                kind: TransactionErrorKind::MaxLoadedAccountsDataSizeExceeded
            }
        );
        assert_eq!(
            classify(serde_json::json!("ProgramAccountNotFound")),
            TransactionError::Kind {
                kind: TransactionErrorKind::ProgramAccountNotFound
            }
        );
    }

    #[test]
    fn unrecognised_shapes_degrade_to_unknown() {
        for value in [
            serde_json::json!("SomeFutureError"),
            serde_json::json!({ "NewVariant": { "x": 1 } }),
            serde_json::json!({ "InstructionError": "oops" }),
            serde_json::json!({ "InstructionError": [900, "X"] }),
            serde_json::json!(42),
        ] {
            let err = classify(value.clone());
            assert_eq!(
                err,
                TransactionError::Unknown {
                    raw: value.to_string()
                }
            );
        }
    }
}
