//! Contract descriptor (JSON ABI) loading.
//!
//! Accepts either a bare ABI array or a compiler artifact (Hardhat, Foundry)
//! with the ABI under an `"abi"` key.

use alloy::json_abi::{Function, JsonAbi};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Parsed interface description of a remote contract.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    path: PathBuf,
    abi: JsonAbi,
}

impl ContractDescriptor {
    /// Load a descriptor from disk.
    pub fn load(path: &Path) -> BlockchainResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlockchainError::MissingDescriptor {
                path: path.to_path_buf(),
            },
            _ => BlockchainError::FileAccess {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let descriptor = Self::from_json(path, &content)?;
        tracing::info!(
            path = %path.display(),
            functions = descriptor.abi.functions.len(),
            "Contract descriptor loaded"
        );
        Ok(descriptor)
    }

    /// Parse descriptor JSON. `path` is only used in error messages.
    pub fn from_json(path: &Path, content: &str) -> BlockchainResult<Self> {
        let malformed = |reason: String| BlockchainError::MalformedDescriptor {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
        let abi_value = match value {
            Value::Array(_) => value,
            Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| malformed("object has no \"abi\" field".to_string()))?,
            other => return Err(malformed(format!("expected ABI array, found {}", other))),
        };

        let abi: JsonAbi = serde_json::from_value(abi_value).map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            abi,
        })
    }

    /// Look up a function by name. Overloaded names are rejected.
    pub fn function(&self, name: &str) -> BlockchainResult<&Function> {
        match self.abi.function(name).map(Vec::as_slice) {
            Some([function]) => Ok(function),
            Some(overloads) => Err(BlockchainError::Encoding(format!(
                "function '{}' has {} overloads in {}",
                name,
                overloads.len(),
                self.path.display()
            ))),
            None => Err(BlockchainError::Encoding(format!(
                "function '{}' not found in {}",
                name,
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_DCA_ABI: &str = r#"[
        {
            "type": "function",
            "name": "createDCA",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "token", "type": "address", "internalType": "address" },
                { "name": "interval", "type": "uint256", "internalType": "uint256" },
                { "name": "amount", "type": "uint256", "internalType": "uint256" },
                { "name": "dcaType", "type": "uint8", "internalType": "enum DCAContract.DCAType" },
                { "name": "depositAddress", "type": "address", "internalType": "address" },
                { "name": "totalIterations", "type": "uint256", "internalType": "uint256" }
            ],
            "outputs": []
        }
    ]"#;

    fn path() -> &'static Path {
        Path::new("DCAContract.json")
    }

    #[test]
    fn test_parse_abi_array() {
        let descriptor = ContractDescriptor::from_json(path(), CREATE_DCA_ABI).unwrap();
        let function = descriptor.function("createDCA").unwrap();
        assert_eq!(function.inputs.len(), 6);
        assert_eq!(
            function.signature(),
            "createDCA(address,uint256,uint256,uint8,address,uint256)"
        );
    }

    #[test]
    fn test_parse_artifact_object() {
        let artifact = format!(
            r#"{{ "contractName": "DCAContract", "abi": {}, "bytecode": "0x" }}"#,
            CREATE_DCA_ABI
        );
        let descriptor = ContractDescriptor::from_json(path(), &artifact).unwrap();
        assert!(descriptor.function("createDCA").is_ok());
    }

    #[test]
    fn test_artifact_without_abi() {
        let err = ContractDescriptor::from_json(path(), r#"{ "bytecode": "0x" }"#).unwrap_err();
        assert!(matches!(err, BlockchainError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = ContractDescriptor::from_json(path(), "[ not json").unwrap_err();
        assert!(matches!(err, BlockchainError::MalformedDescriptor { .. }));
        assert!(err.to_string().contains("DCAContract.json"));
    }

    #[test]
    fn test_missing_function() {
        let descriptor = ContractDescriptor::from_json(path(), CREATE_DCA_ABI).unwrap();
        let err = descriptor.function("cancelDCA").unwrap_err();
        assert!(matches!(err, BlockchainError::Encoding(_)));
    }

    #[test]
    fn test_overloaded_function_rejected() {
        let abi = r#"[
            { "type": "function", "name": "createDCA", "stateMutability": "nonpayable",
              "inputs": [ { "name": "token", "type": "address" } ], "outputs": [] },
            { "type": "function", "name": "createDCA", "stateMutability": "nonpayable",
              "inputs": [ { "name": "token", "type": "address" }, { "name": "amount", "type": "uint256" } ], "outputs": [] }
        ]"#;
        let descriptor = ContractDescriptor::from_json(path(), abi).unwrap();
        let err = descriptor.function("createDCA").unwrap_err();
        assert!(err.to_string().contains("2 overloads"));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join(format!("dca-abi-{}.json", uuid::Uuid::new_v4()));
        let err = ContractDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, BlockchainError::MissingDescriptor { .. }));
    }
}
