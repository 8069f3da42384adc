//! Recovers which program ran each inner instruction.
//!
//! The log stream is the authoritative record of cross-program invocations;
//! the positional program index is used only when the logs say nothing about
//! a depth. When neither source answers, the instruction is attributed to
//! [`UNKNOWN_PROGRAM`].

use std::collections::HashMap;

use serde::Serialize;

use crate::accounts::AccountList;
use crate::programs::UNKNOWN_PROGRAM;
use crate::types::RawInnerInstruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributionSource {
    InvocationLog,
    ProgramIndex,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub program_address: String,
    pub source: AttributionSource,
}

/// Depth to program address, as last reported by `Program <address> invoke [<depth>]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationStack {
    by_depth: HashMap<u32, String>,
}

impl InvocationStack {
    pub fn from_logs<S: AsRef<str>>(logs: &[S]) -> Self {
        let mut by_depth = HashMap::new();
        for line in logs {
            if let Some((address, depth)) = parse_invoke_line(line.as_ref()) {
                by_depth.insert(depth, address.to_string());
            }
        }
        Self { by_depth }
    }

    pub fn program_at(&self, depth: u32) -> Option<&str> {
        self.by_depth.get(&depth).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_depth.is_empty()
    }
}

/// Parses `Program <address> invoke [<depth>]`.
pub fn parse_invoke_line(line: &str) -> Option<(&str, u32)> {
    let rest = line.strip_prefix("Program ")?;
    let (address, rest) = rest.split_once(" invoke [")?;
    let depth = rest.strip_suffix(']')?.parse().ok()?;
    if address.is_empty() || address.contains(' ') {
        return None;
    }
    Some((address, depth))
}

type Strategy = fn(&Attributor<'_>, &RawInnerInstruction) -> Option<String>;

/// Tried in order; the first strategy that answers wins.
const STRATEGIES: &[(AttributionSource, Strategy)] = &[
    (AttributionSource::InvocationLog, by_invocation_log),
    (AttributionSource::ProgramIndex, by_program_index),
];

fn by_invocation_log(attributor: &Attributor<'_>, ix: &RawInnerInstruction) -> Option<String> {
    attributor.program_from_logs(ix)
}

fn by_program_index(attributor: &Attributor<'_>, ix: &RawInnerInstruction) -> Option<String> {
    attributor.program_from_index(ix)
}

pub struct Attributor<'a> {
    stack: InvocationStack,
    accounts: &'a AccountList,
}

impl<'a> Attributor<'a> {
    pub fn new<S: AsRef<str>>(logs: &[S], accounts: &'a AccountList) -> Self {
        Self {
            stack: InvocationStack::from_logs(logs),
            accounts,
        }
    }

    pub fn program_from_logs(&self, ix: &RawInnerInstruction) -> Option<String> {
        let depth = ix.stack_height?;
        self.stack.program_at(depth).map(String::from)
    }

    pub fn program_from_index(&self, ix: &RawInnerInstruction) -> Option<String> {
        let index = ix.program_id_index?;
        self.accounts.address(index).ok().map(String::from)
    }

    pub fn attribute(&self, ix: &RawInnerInstruction) -> Attribution {
        for (source, strategy) in STRATEGIES {
            if let Some(program_address) = strategy(self, ix) {
                return Attribution {
                    program_address,
                    source: *source,
                };
            }
        }
        tracing::debug!(
            stack_height = ?ix.stack_height,
            program_id_index = ?ix.program_id_index,
            "no program attribution for inner instruction"
        );
        Attribution {
            program_address: UNKNOWN_PROGRAM.to_string(),
            source: AttributionSource::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributionSource, Attributor, InvocationStack, parse_invoke_line};
    use crate::accounts::{AccountKey, AccountList, AccountOrigin};
    use crate::programs::UNKNOWN_PROGRAM;
    use crate::types::RawInnerInstruction;

    fn accounts(addresses: &[&str]) -> AccountList {
        let keys = addresses
            .iter()
            .map(|a| AccountKey {
                address: (*a).to_string(),
                is_signer: false,
                is_writable: false,
                origin: AccountOrigin::Transaction,
            })
            .collect();
        AccountList::extend(keys, None)
    }

    fn inner(stack_height: Option<u32>, program_id_index: Option<usize>) -> RawInnerInstruction {
        RawInnerInstruction {
            program_id_index,
            accounts: Vec::new(),
            data: String::new(),
            stack_height,
        }
    }

    #[test]
    fn parses_invoke_lines_only() {
        assert_eq!(parse_invoke_line("Program X invoke [1]"), Some(("X", 1)));
        assert_eq!(
            parse_invoke_line("Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [12]"),
            Some(("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", 12))
        );
        assert_eq!(parse_invoke_line("Program X success"), None);
        assert_eq!(parse_invoke_line("Program X consumed 100 of 200 compute units"), None);
        assert_eq!(parse_invoke_line("Program log: Instruction: Transfer"), None);
        assert_eq!(parse_invoke_line("Program X invoke [one]"), None);
        assert_eq!(parse_invoke_line("Program  invoke [1]"), None);
    }

    #[test]
    fn later_invocations_at_same_depth_overwrite() {
        let stack = InvocationStack::from_logs(&[
            "Program A invoke [1]",
            "Program B invoke [2]",
            "Program B success",
            "Program C invoke [2]",
        ]);
        assert_eq!(stack.program_at(1), Some("A"));
        assert_eq!(stack.program_at(2), Some("C"));
        assert_eq!(stack.program_at(3), None);
    }

    #[test]
    fn log_depth_wins_over_program_index() {
        let list = accounts(&["payer", "Z"]);
        let attributor = Attributor::new(&["Program X invoke [1]", "Program Y invoke [2]"], &list);

        let attribution = attributor.attribute(&inner(Some(2), Some(1)));
        assert_eq!(attribution.program_address, "Y");
        assert_eq!(attribution.source, AttributionSource::InvocationLog);
    }

    #[test]
    fn falls_back_to_program_index_then_sentinel() {
        let list = accounts(&["payer", "Z"]);
        let attributor = Attributor::new(&["Program X invoke [1]", "Program Y invoke [2]"], &list);

        let by_index = attributor.attribute(&inner(Some(3), Some(1)));
        assert_eq!(by_index.program_address, "Z");
        assert_eq!(by_index.source, AttributionSource::ProgramIndex);

        let no_height = attributor.attribute(&inner(None, Some(0)));
        assert_eq!(no_height.program_address, "payer");

        let unknown = attributor.attribute(&inner(Some(3), None));
        assert_eq!(unknown.program_address, UNKNOWN_PROGRAM);
        assert_eq!(unknown.source, AttributionSource::Unknown);

        let out_of_range = attributor.attribute(&inner(Some(3), Some(9)));
        assert_eq!(out_of_range.program_address, UNKNOWN_PROGRAM);
    }

    #[test]
    fn each_strategy_is_independent() {
        let list = accounts(&["payer", "Z"]);
        let attributor = Attributor::new(&["Program Y invoke [2]"], &list);
        let ix = inner(Some(2), Some(1));
        assert_eq!(attributor.program_from_logs(&ix).as_deref(), Some("Y"));
        assert_eq!(attributor.program_from_index(&ix).as_deref(), Some("Z"));
    }

    #[test]
    fn empty_logs_produce_empty_stack() {
        let stack = InvocationStack::from_logs::<String>(&[]);
        assert!(stack.is_empty());
    }
}
