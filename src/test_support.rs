#![expect(clippy::unwrap_used, reason = "test fixtures")]

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::accounts::{AccountKey, AccountList, AccountOrigin};
use crate::programs::program_label;
use crate::record::{InnerInstructionGroup, ResolvedInstruction, TransactionRecord};
use crate::types::TransactionVersion;
use crate::wire::{PUBKEY_LEN, SIGNATURE_LEN, encode_address, varint};

pub(crate) fn key_bytes(i: u8) -> [u8; PUBKEY_LEN] {
    [i.wrapping_add(100); PUBKEY_LEN]
}

pub(crate) fn key(i: u8) -> String {
    encode_address(key_bytes(i))
}

pub(crate) fn address_bytes(address: &str) -> [u8; PUBKEY_LEN] {
    let bytes = bs58::decode(address).into_vec().unwrap();
    <[u8; PUBKEY_LEN]>::try_from(bytes.as_slice()).unwrap()
}

/// Serializes transactions in wire format for decoder tests.
pub(crate) struct TxBuilder {
    signatures: usize,
    version: Option<u8>,
    header: [u8; 3],
    keys: Vec<[u8; PUBKEY_LEN]>,
    instructions: Vec<(u8, Vec<u8>, Vec<u8>)>,
    lookups: Vec<([u8; PUBKEY_LEN], Vec<u8>, Vec<u8>)>,
}

impl TxBuilder {
    pub(crate) fn new() -> Self {
        Self {
            signatures: 0,
            version: None,
            header: [0; 3],
            keys: Vec::new(),
            instructions: Vec::new(),
            lookups: Vec::new(),
        }
    }

    pub(crate) fn signatures(mut self, n: usize) -> Self {
        self.signatures = n;
        self
    }

    pub(crate) fn version(mut self, v: u8) -> Self {
        self.version = Some(v);
        self
    }

    pub(crate) fn header(mut self, required: u8, ro_signed: u8, ro_unsigned: u8) -> Self {
        self.header = [required, ro_signed, ro_unsigned];
        self
    }

    /// Appends `n` synthetic keys numbered from the current key count.
    pub(crate) fn accounts(mut self, n: u8) -> Self {
        let start = self.keys.len() as u8;
        self.keys.extend((start..start + n).map(key_bytes));
        self
    }

    pub(crate) fn account(mut self, address: &str) -> Self {
        self.keys.push(address_bytes(address));
        self
    }

    pub(crate) fn instruction(mut self, program: u8, accounts: &[u8], data: &[u8]) -> Self {
        self.instructions
            .push((program, accounts.to_vec(), data.to_vec()));
        self
    }

    pub(crate) fn lookup(
        mut self,
        table: [u8; PUBKEY_LEN],
        writable: &[u8],
        readonly: &[u8],
    ) -> Self {
        self.lookups
            .push((table, writable.to_vec(), readonly.to_vec()));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let compact = |out: &mut Vec<u8>, n: usize| varint::encode(n as u32, out).unwrap();

        compact(&mut out, self.signatures);
        for i in 0..self.signatures {
            out.extend_from_slice(&[(i + 1) as u8; SIGNATURE_LEN]);
        }
        if let Some(v) = self.version {
            out.push(0x80 | v);
        }
        out.extend_from_slice(&self.header);
        compact(&mut out, self.keys.len());
        for k in &self.keys {
            out.extend_from_slice(k);
        }
        out.extend_from_slice(&[0xbb; PUBKEY_LEN]);
        compact(&mut out, self.instructions.len());
        for (program, accounts, data) in &self.instructions {
            out.push(*program);
            compact(&mut out, accounts.len());
            out.extend_from_slice(accounts);
            compact(&mut out, data.len());
            out.extend_from_slice(data);
        }
        if self.version.is_some() {
            compact(&mut out, self.lookups.len());
            for (table, writable, readonly) in &self.lookups {
                out.extend_from_slice(table);
                compact(&mut out, writable.len());
                out.extend_from_slice(writable);
                compact(&mut out, readonly.len());
                out.extend_from_slice(readonly);
            }
        }
        out
    }

    pub(crate) fn build_base64(&self) -> String {
        BASE64.encode(self.build())
    }
}

/// `(program address, account count, data)`; accounts are `key(0)..key(n)`.
pub(crate) type IxShape = (&'static str, u8, Vec<u8>);

fn resolved(shape: IxShape, stack_height: u32) -> ResolvedInstruction {
    let (program, n, data) = shape;
    ResolvedInstruction {
        program_address: program.to_string(),
        program_label: program_label(program),
        accounts: (0..n).map(key).collect(),
        data,
        stack_height: Some(stack_height),
    }
}

/// A record with the given outer instructions and `(outer index, inner)` groups.
pub(crate) fn record_with(outer: Vec<IxShape>, inner: Vec<(u32, Vec<IxShape>)>) -> TransactionRecord {
    let keys = (0..4)
        .map(|i| AccountKey {
            address: key(i),
            is_signer: i == 0,
            is_writable: true,
            origin: AccountOrigin::Transaction,
        })
        .collect();
    TransactionRecord {
        position: 0,
        slot: 1,
        block_time: None,
        signatures: vec![bs58::encode([1u8; SIGNATURE_LEN]).into_string()],
        version: TransactionVersion::Legacy,
        recent_blockhash: bs58::encode([0xbb; PUBKEY_LEN]).into_string(),
        account_keys: AccountList::extend(keys, None),
        address_table_lookups: Vec::new(),
        instructions: outer.into_iter().map(|ix| resolved(ix, 1)).collect(),
        inner_instructions: inner
            .into_iter()
            .map(|(outer_index, ixs)| InnerInstructionGroup {
                outer_index,
                instructions: ixs.into_iter().map(|ix| resolved(ix, 2)).collect(),
            })
            .collect(),
        fee: 5000,
        pre_balances: Vec::new(),
        post_balances: Vec::new(),
        pre_token_balances: Vec::new(),
        post_token_balances: Vec::new(),
        log_messages: Vec::new(),
        error: None,
        compute_units_consumed: None,
        rewards: Vec::new(),
    }
}
