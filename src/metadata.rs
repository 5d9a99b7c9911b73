//! # Built-in Function Catalog
//!
//! Static signatures of the DVM built-in functions that Function nodes can
//! call. `asProcess` marks functions with side effects: their call is
//! emitted as a statement even when the result is unused.

use crate::graph::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::graph::ValueType::{String as Str, Uint64, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DvmFunction {
    Version,
    Load,
    Exists,
    Store,
    Delete,
    Mapexists,
    Mapget,
    Mapstore,
    Mapdelete,
    Random,
    Scid,
    Blid,
    Txid,
    Dero,
    BlockHeight,
    BlockTimestamp,
    Signer,
    UpdateScCode,
    IsAddressValid,
    AddressRaw,
    AddressString,
    SendDeroToAddress,
    SendAssetToAddress,
    Derovalue,
    Assetvalue,
    Atoi,
    Itoa,
    Sha256,
    Sha3256,
    Keccak256,
    Hex,
    Hexdecode,
    Min,
    Max,
    Strlen,
    Substr,
}

/// Signature of a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinSignature {
    pub name: &'static str,
    /// Arguments in call order.
    pub args: &'static [(&'static str, ValueType)],
    pub returns: ValueType,
    pub as_process: bool,
    pub compute_cost: u64,
    pub description: &'static str,
}

const fn sig(
    name: &'static str,
    args: &'static [(&'static str, ValueType)],
    returns: ValueType,
    as_process: bool,
    compute_cost: u64,
    description: &'static str,
) -> BuiltinSignature {
    BuiltinSignature { name, args, returns, as_process, compute_cost, description }
}

impl DvmFunction {
    pub const ALL: [DvmFunction; 36] = [
        DvmFunction::Version,
        DvmFunction::Load,
        DvmFunction::Exists,
        DvmFunction::Store,
        DvmFunction::Delete,
        DvmFunction::Mapexists,
        DvmFunction::Mapget,
        DvmFunction::Mapstore,
        DvmFunction::Mapdelete,
        DvmFunction::Random,
        DvmFunction::Scid,
        DvmFunction::Blid,
        DvmFunction::Txid,
        DvmFunction::Dero,
        DvmFunction::BlockHeight,
        DvmFunction::BlockTimestamp,
        DvmFunction::Signer,
        DvmFunction::UpdateScCode,
        DvmFunction::IsAddressValid,
        DvmFunction::AddressRaw,
        DvmFunction::AddressString,
        DvmFunction::SendDeroToAddress,
        DvmFunction::SendAssetToAddress,
        DvmFunction::Derovalue,
        DvmFunction::Assetvalue,
        DvmFunction::Atoi,
        DvmFunction::Itoa,
        DvmFunction::Sha256,
        DvmFunction::Sha3256,
        DvmFunction::Keccak256,
        DvmFunction::Hex,
        DvmFunction::Hexdecode,
        DvmFunction::Min,
        DvmFunction::Max,
        DvmFunction::Strlen,
        DvmFunction::Substr,
    ];

    pub fn signature(self) -> BuiltinSignature {
        match self {
            DvmFunction::Version => sig("VERSION", &[("v", Str)], Uint64, false, 1000,
                "Sets a version to dvm.VERSION"),
            DvmFunction::Load => sig("LOAD", &[("variable", Variable)], Variable, false, 5000,
                "Loads a variable previously stored with STORE"),
            DvmFunction::Exists => sig("EXISTS", &[("variable", Variable)], Uint64, false, 5000,
                "Returns 1 if the variable is stored in DB"),
            DvmFunction::Store => sig("STORE", &[("key", Variable), ("value", Variable)], Uint64, true, 10000,
                "Stores key and value in the DB"),
            DvmFunction::Delete => sig("DELETE", &[("variable", Variable)], Uint64, true, 3000,
                "Deletes a stored key"),
            DvmFunction::Mapexists => sig("MAPEXISTS", &[("variable", Variable)], Uint64, false, 1000,
                "Returns 1 if the variable is stored in the session map"),
            DvmFunction::Mapget => sig("MAPGET", &[("variable", Variable)], Variable, false, 1000,
                "Loads a variable stored with MAPSTORE"),
            DvmFunction::Mapstore => sig("MAPSTORE", &[("key", Str), ("value", Variable)], Uint64, true, 1000,
                "Stores key and value in the session map"),
            DvmFunction::Mapdelete => sig("MAPDELETE", &[("variable", Variable)], Uint64, true, 1000,
                "Deletes an element from the session map"),
            DvmFunction::Random => sig("RANDOM", &[("limit", Uint64)], Uint64, false, 2500,
                "Random number in 0..limit"),
            DvmFunction::Scid => sig("SCID", &[], Str, false, 2000,
                "Id of the running smart contract"),
            DvmFunction::Blid => sig("BLID", &[], Str, false, 2000,
                "Id of the current block"),
            DvmFunction::Txid => sig("TXID", &[], Str, false, 2000,
                "Id of the current transaction"),
            DvmFunction::Dero => sig("DERO", &[], Str, false, 10000,
                "String form of the zero hash"),
            DvmFunction::BlockHeight => sig("BLOCK_HEIGHT", &[], Uint64, false, 2000,
                "Current chain height"),
            DvmFunction::BlockTimestamp => sig("BLOCK_TIMESTAMP", &[], Uint64, false, 2500,
                "Timestamp of the current block"),
            DvmFunction::Signer => sig("SIGNER", &[], Str, false, 5000,
                "Address that signed the transaction"),
            DvmFunction::UpdateScCode => sig("UPDATE_SC_CODE", &[("sc_code", Str)], Uint64, true, 5000,
                "Replaces the smart contract code"),
            DvmFunction::IsAddressValid => sig("IS_ADDRESS_VALID", &[("address", Str)], Uint64, false, 50000,
                "Returns 1 if the address is valid"),
            DvmFunction::AddressRaw => sig("ADDRESS_RAW", &[("address", Str)], Str, false, 60000,
                "Raw 33 byte form of an address"),
            DvmFunction::AddressString => sig("ADDRESS_STRING", &[("p", Str)], Str, false, 50000,
                "String form of a raw address"),
            DvmFunction::SendDeroToAddress => sig("SEND_DERO_TO_ADDRESS", &[("a", Str), ("amount", Uint64)],
                Uint64, true, 70000, "Sends DERO from the contract balance"),
            DvmFunction::SendAssetToAddress => sig("SEND_ASSET_TO_ADDRESS",
                &[("a", Str), ("amount", Uint64), ("asset", Str)], Uint64, true, 90000,
                "Sends an asset from the contract balance"),
            DvmFunction::Derovalue => sig("DEROVALUE", &[], Uint64, false, 10000,
                "DERO sent with the transaction"),
            DvmFunction::Assetvalue => sig("ASSETVALUE", &[("asset", Str)], Uint64, false, 10000,
                "Amount of an asset sent with the transaction"),
            DvmFunction::Atoi => sig("ATOI", &[("s", Str)], Uint64, false, 5000,
                "Parses a Uint64"),
            DvmFunction::Itoa => sig("ITOA", &[("n", Uint64)], Str, false, 5000,
                "Formats a Uint64"),
            DvmFunction::Sha256 => sig("SHA256", &[("s", Str)], Str, false, 25000,
                "sha2-256 hash"),
            DvmFunction::Sha3256 => sig("SHA3256", &[("s", Str)], Str, false, 25000,
                "sha3-256 hash"),
            DvmFunction::Keccak256 => sig("KECCAK256", &[("s", Str)], Str, false, 25000,
                "keccak256 hash"),
            DvmFunction::Hex => sig("HEX", &[("s", Str)], Str, false, 10000,
                "Hex encodes a string"),
            DvmFunction::Hexdecode => sig("HEXDECODE", &[("s", Str)], Str, false, 10000,
                "Hex decodes a string"),
            DvmFunction::Min => sig("MIN", &[("f", Uint64), ("s", Uint64)], Uint64, false, 5000,
                "Minimum of two values"),
            DvmFunction::Max => sig("MAX", &[("f", Uint64), ("s", Uint64)], Uint64, false, 5000,
                "Maximum of two values"),
            DvmFunction::Strlen => sig("STRLEN", &[("s", Str)], Uint64, false, 20000,
                "Length of a string"),
            DvmFunction::Substr => sig("SUBSTR", &[("s", Str), ("offset", Uint64), ("length", Uint64)],
                Str, false, 20000, "Substring with offset and length"),
        }
    }

    pub fn name(self) -> &'static str {
        self.signature().name
    }
}

impl fmt::Display for DvmFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static BUILTIN_METADATA: OnceLock<HashMap<&'static str, (DvmFunction, BuiltinSignature)>> =
    OnceLock::new();

/// Catalog indexed by the function's source name, built on first use.
pub fn get_builtin_metadata() -> &'static HashMap<&'static str, (DvmFunction, BuiltinSignature)> {
    BUILTIN_METADATA.get_or_init(|| {
        let metadata: HashMap<_, _> = DvmFunction::ALL
            .iter()
            .map(|f| (f.name(), (*f, f.signature())))
            .collect();
        tracing::debug!("[METADATA] Loaded {} built-in functions", metadata.len());
        metadata
    })
}

/// Look a built-in up by its source name, e.g. `"BLOCK_HEIGHT"`.
pub fn lookup_builtin(name: &str) -> Option<DvmFunction> {
    get_builtin_metadata().get(name).map(|(f, _)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        assert_eq!(get_builtin_metadata().len(), DvmFunction::ALL.len());
        for f in DvmFunction::ALL {
            assert_eq!(lookup_builtin(f.name()), Some(f));
        }
    }

    #[test]
    fn test_serde_names_match_source_names() {
        for f in DvmFunction::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
    }

    #[test]
    fn test_side_effecting_functions() {
        let processes: Vec<_> = DvmFunction::ALL
            .iter()
            .filter(|f| f.signature().as_process)
            .map(|f| f.name())
            .collect();
        assert_eq!(
            processes,
            vec![
                "STORE",
                "DELETE",
                "MAPSTORE",
                "MAPDELETE",
                "UPDATE_SC_CODE",
                "SEND_DERO_TO_ADDRESS",
                "SEND_ASSET_TO_ADDRESS"
            ]
        );
    }

    #[test]
    fn test_substr_signature() {
        let substr = DvmFunction::Substr.signature();
        let names: Vec<_> = substr.args.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["s", "offset", "length"]);
        assert_eq!(substr.returns, ValueType::String);
    }
}
