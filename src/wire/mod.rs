//! Decoding of the serialized transaction format.
//!
//! Layout, read strictly front to back:
//!
//! ```text
//! [compact: n] [n x 64-byte signature]
//! [optional version prefix, top bit set]
//! [u8 required signatures] [u8 readonly signed] [u8 readonly unsigned]
//! [compact: k] [k x 32-byte account key]
//! [32-byte recent blockhash]
//! [compact: m] m x ( [u8 program index] [compact: a] [a x u8 account index] [compact: d] [d bytes data] )
//! versioned only: [compact: t] t x ( [32-byte table] [compact + u8 writable idx] [compact + u8 readonly idx] )
//! ```

pub mod varint;

use serde::Serialize;

use crate::accounts::{AccountKey, AccountOrigin};
use crate::error::Error;
use crate::types::TransactionVersion;

pub const SIGNATURE_LEN: usize = 64;
pub const PUBKEY_LEN: usize = 32;

const VERSION_PREFIX_MASK: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.num_required_signatures)
    }

    /// Writability is positional: the last readonly-signed signers and the
    /// last readonly-unsigned non-signers are read-only.
    pub fn is_writable(&self, index: usize, num_accounts: usize) -> bool {
        let signers = usize::from(self.num_required_signatures);
        if index < signers {
            index < signers.saturating_sub(usize::from(self.num_readonly_signed_accounts))
        } else {
            index < num_accounts.saturating_sub(usize::from(self.num_readonly_unsigned_accounts))
        }
    }
}

/// An instruction as it appears in the message, still addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstructionRef {
    pub program_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressTableLookup {
    pub account_key: String,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    pub signatures: Vec<String>,
    pub version: TransactionVersion,
    pub header: MessageHeader,
    pub account_keys: Vec<AccountKey>,
    pub recent_blockhash: String,
    pub instructions: Vec<RawInstructionRef>,
    pub address_table_lookups: Vec<AddressTableLookup>,
}

pub(crate) fn encode_address(bytes: [u8; PUBKEY_LEN]) -> String {
    solana_pubkey::Pubkey::new_from_array(bytes).to_string()
}

struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn truncated(&self, what: &'static str) -> Error {
        Error::Truncated {
            what,
            offset: self.offset,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, Error> {
        let byte = self.peek().ok_or_else(|| self.truncated(what))?;
        self.offset += 1;
        Ok(byte)
    }

    fn bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| self.truncated(what))?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], Error> {
        let slice = self.bytes(N, what)?;
        <[u8; N]>::try_from(slice).map_err(|_| self.truncated(what))
    }

    fn compact(&mut self, what: &'static str) -> Result<usize, Error> {
        let (value, next) = varint::decode(self.buf, self.offset);
        if next == self.offset {
            return Err(self.truncated(what));
        }
        self.offset = next;
        Ok(value as usize)
    }

    /// Capacity hint for `count` items of `item_len` bytes, capped by what is left.
    fn capacity(&self, count: usize, item_len: usize) -> usize {
        count.min(self.buf.len().saturating_sub(self.offset) / item_len.max(1))
    }

    fn index_list(&mut self, what: &'static str) -> Result<Vec<u8>, Error> {
        let len = self.compact(what)?;
        Ok(self.bytes(len, what)?.to_vec())
    }
}

/// Decodes a raw serialized transaction.
///
/// Any truncation is reported as [`Error::Truncated`]; nothing outside this
/// one payload is affected.
pub fn decode(payload: &[u8]) -> Result<DecodedTransaction, Error> {
    let mut r = Reader::new(payload);

    let num_signatures = r.compact("signature count")?;
    let mut signatures = Vec::with_capacity(r.capacity(num_signatures, SIGNATURE_LEN));
    for _ in 0..num_signatures {
        let sig = r.bytes(SIGNATURE_LEN, "signature")?;
        signatures.push(bs58::encode(sig).into_string());
    }

    let version = match r.peek() {
        Some(prefix) if prefix & VERSION_PREFIX_MASK != 0 => {
            r.offset += 1;
            TransactionVersion::Numbered(prefix & !VERSION_PREFIX_MASK)
        }
        _ => TransactionVersion::Legacy,
    };

    let header = MessageHeader {
        num_required_signatures: r.u8("header")?,
        num_readonly_signed_accounts: r.u8("header")?,
        num_readonly_unsigned_accounts: r.u8("header")?,
    };

    let num_accounts = r.compact("account count")?;
    let mut account_keys = Vec::with_capacity(r.capacity(num_accounts, PUBKEY_LEN));
    for i in 0..num_accounts {
        let key = r.array::<PUBKEY_LEN>("account key")?;
        account_keys.push(AccountKey {
            address: encode_address(key),
            is_signer: header.is_signer(i),
            is_writable: header.is_writable(i, num_accounts),
            origin: AccountOrigin::Transaction,
        });
    }

    let recent_blockhash = bs58::encode(r.bytes(PUBKEY_LEN, "recent blockhash")?).into_string();

    let num_instructions = r.compact("instruction count")?;
    let mut instructions = Vec::with_capacity(r.capacity(num_instructions, 3));
    for _ in 0..num_instructions {
        let program_index = r.u8("program index")?;
        let account_indices = r.index_list("instruction accounts")?;
        let data_len = r.compact("instruction data length")?;
        let data = r.bytes(data_len, "instruction data")?.to_vec();
        instructions.push(RawInstructionRef {
            program_index,
            account_indices,
            data,
        });
    }

    let address_table_lookups = match version {
        TransactionVersion::Legacy => Vec::new(),
        TransactionVersion::Numbered(_) => {
            let count = r.compact("lookup table count")?;
            let mut lookups = Vec::with_capacity(r.capacity(count, PUBKEY_LEN + 2));
            for _ in 0..count {
                let key = r.array::<PUBKEY_LEN>("lookup table key")?;
                lookups.push(AddressTableLookup {
                    account_key: encode_address(key),
                    writable_indexes: r.index_list("lookup writable indexes")?,
                    readonly_indexes: r.index_list("lookup readonly indexes")?,
                });
            }
            lookups
        }
    };

    Ok(DecodedTransaction {
        signatures,
        version,
        header,
        account_keys,
        recent_blockhash,
        instructions,
        address_table_lookups,
    })
}
