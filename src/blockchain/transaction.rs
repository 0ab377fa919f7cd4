//! Transaction building and envelope types.
//!
//! # Responsibilities
//! - Bind call arguments to a descriptor function and ABI-encode them
//! - Build legacy (EIP-155) transactions deterministically
//! - Carry signed transactions as raw EIP-2718 bytes

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy::dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, B256, U256};
use alloy::signers::Signature;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// One value to pass to a contract function.
///
/// `aliases` are the lowercase, underscore-free parameter names this value
/// answers to; `value` is its textual form, coerced to the descriptor's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    aliases: &'static [&'static str],
    value: String,
}

impl CallArgument {
    pub fn new(aliases: &'static [&'static str], value: impl ToString) -> Self {
        Self {
            aliases,
            value: value.to_string(),
        }
    }

    fn answers_to(&self, normalized_name: &str) -> bool {
        self.aliases.contains(&normalized_name)
    }
}

fn normalize_param_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Order `args` by the descriptor's input names, falling back to the given order.
fn order_arguments<'a>(function: &Function, args: &'a [CallArgument]) -> Vec<&'a CallArgument> {
    let mut used = vec![false; args.len()];
    let mut ordered = Vec::with_capacity(args.len());

    for input in &function.inputs {
        let name = normalize_param_name(&input.name);
        let found = args
            .iter()
            .enumerate()
            .find(|(i, arg)| !used[*i] && arg.answers_to(&name));
        match found {
            Some((i, arg)) => {
                used[i] = true;
                ordered.push(arg);
            }
            None => {
                tracing::debug!(
                    function = %function.name,
                    input = %input.name,
                    "Input name not recognised, using positional order"
                );
                return args.iter().collect();
            }
        }
    }

    ordered
}

/// ABI-encode a call to `function`, selector included.
pub fn encode_call(function: &Function, args: &[CallArgument]) -> BlockchainResult<Bytes> {
    if function.inputs.len() != args.len() {
        return Err(BlockchainError::Encoding(format!(
            "{} takes {} inputs, {} provided",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }

    let values = function
        .inputs
        .iter()
        .zip(order_arguments(function, args))
        .map(|(input, arg)| {
            let ty = input.resolve().map_err(|e| {
                BlockchainError::Encoding(format!("input '{}': {}", input.name, e))
            })?;
            ty.coerce_str(&arg.value).map_err(|e| {
                BlockchainError::Encoding(format!(
                    "input '{}' ({}) rejects '{}': {}",
                    input.name, input.ty, arg.value, e
                ))
            })
        })
        .collect::<BlockchainResult<Vec<DynSolValue>>>()?;

    let calldata = function
        .abi_encode_input(&values)
        .map_err(|e| BlockchainError::Encoding(e.to_string()))?;

    Ok(calldata.into())
}

/// Gas settings applied to every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSettings {
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
}

/// A transaction ready for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEnvelope {
    tx: TxLegacy,
}

impl UnsignedEnvelope {
    pub fn tx(&self) -> &TxLegacy {
        &self.tx
    }

    pub fn into_inner(self) -> TxLegacy {
        self.tx
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    /// RLP payload that gets hashed for signing.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.tx.encoded_for_signing()
    }

    pub fn signature_hash(&self) -> B256 {
        self.tx.signature_hash()
    }
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    inner: Signed<TxLegacy>,
}

impl SignedEnvelope {
    pub fn new(tx: TxLegacy, signature: Signature) -> Self {
        Self {
            inner: tx.into_signed(signature),
        }
    }

    /// Decode raw EIP-2718 bytes. Only legacy transactions are accepted.
    pub fn decode(raw: &[u8]) -> BlockchainResult<Self> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| BlockchainError::Encoding(format!("invalid raw transaction: {}", e)))?;
        match envelope {
            TxEnvelope::Legacy(inner) => Ok(Self { inner }),
            _ => Err(BlockchainError::Encoding(
                "expected a legacy transaction".to_string(),
            )),
        }
    }

    /// Raw bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> Bytes {
        TxEnvelope::Legacy(self.inner.clone()).encoded_2718().into()
    }

    pub fn tx_hash(&self) -> TxHash {
        *self.inner.hash()
    }

    pub fn nonce(&self) -> u64 {
        self.inner.tx().nonce
    }

    pub fn signature(&self) -> &Signature {
        self.inner.signature()
    }

    /// Recover the address that produced the signature.
    pub fn recover_signer(&self) -> BlockchainResult<Address> {
        self.inner
            .signature()
            .recover_address_from_prehash(&self.inner.signature_hash())
            .map_err(|e| BlockchainError::Signing(e.to_string()))
    }
}

/// Builds contract-call transactions for one function.
#[derive(Debug, Clone)]
pub struct TxBuilder<'a> {
    function: &'a Function,
    contract: Address,
    chain_id: u64,
    fees: FeeSettings,
}

impl<'a> TxBuilder<'a> {
    pub fn new(function: &'a Function, contract: Address, chain_id: u64, fees: FeeSettings) -> Self {
        Self {
            function,
            contract,
            chain_id,
            fees,
        }
    }

    /// Build an unsigned transaction calling the function with `args`.
    pub fn build(&self, args: &[CallArgument], nonce: u64) -> BlockchainResult<UnsignedEnvelope> {
        let input = encode_call(self.function, args)?;

        tracing::debug!(
            function = %self.function.signature(),
            selector = %self.function.selector(),
            contract = %self.contract,
            nonce = nonce,
            calldata_len = input.len(),
            "Built contract call"
        );

        let tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: self.fees.gas_price,
            gas_limit: self.fees.gas_limit,
            to: TxKind::Call(self.contract),
            value: U256::ZERO,
            input,
        };

        Ok(UnsignedEnvelope { tx })
    }
}
