use serde::Serialize;

use crate::types::LoadedAddresses;

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
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AccountOrigin {
    Transaction,
    LookupTable,
}

/// One entry of a transaction's account list. Its position is its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountKey {
    pub address: String,
    pub is_signer: bool,
    pub is_writable: bool,
    pub origin: AccountOrigin,
}

impl AccountKey {
    fn loaded(address: &str, is_writable: bool) -> Self {
        Self {
            address: address.to_string(),
            is_signer: false,
            is_writable,
            origin: AccountOrigin::LookupTable,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("account index {index} out of range for {len} accounts")]
pub struct ResolutionError {
    pub index: usize,
    pub len: usize,
}

/// The extended account list: message keys first, then lookup-table writable
/// addresses, then lookup-table readonly addresses.
///
/// Built once per transaction and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountList {
    keys: Vec<AccountKey>,
}

impl AccountList {
    /// Appends the runtime-loaded addresses to the keys declared by the message.
    ///
    /// The loaded writable/readonly split is taken as reported by the provider.
    pub fn extend(base: Vec<AccountKey>, loaded: Option<&LoadedAddresses>) -> Self {
        let mut keys = base;
        if let Some(loaded) = loaded {
            keys.reserve(loaded.writable.len() + loaded.readonly.len());
            keys.extend(loaded.writable.iter().map(|a| AccountKey::loaded(a, true)));
            keys.extend(loaded.readonly.iter().map(|a| AccountKey::loaded(a, false)));
        }
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[AccountKey] {
        &self.keys
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccountKey> {
        self.keys.iter()
    }

    pub fn get(&self, index: usize) -> Option<&AccountKey> {
        self.keys.get(index)
    }

    pub fn address(&self, index: usize) -> Result<&str, ResolutionError> {
        self.keys
            .get(index)
            .map(|k| k.address.as_str())
            .ok_or(ResolutionError {
                index,
                len: self.keys.len(),
            })
    }

    /// Maps every index to its address, failing on the first out-of-range index.
    pub fn resolve<I>(&self, indices: I) -> Result<Vec<String>, ResolutionError>
    where
        I: IntoIterator<Item = usize>,
    {
        indices
            .into_iter()
            .map(|i| self.address(i).map(String::from))
            .collect()
    }
}

impl<'a> IntoIterator for &'a AccountList {
    type Item = &'a AccountKey;
    type IntoIter = std::slice::Iter<'a, AccountKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
