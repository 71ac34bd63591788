use crate::error::DeployError;
use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Bytes;
use eyre::{Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    constructor_param_hints: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorParam {
    pub name: String,
    pub ty: DynSolType,
}

/// Compiled creation bytecode plus the ABI it was compiled from.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub bytecode: Bytes,
    pub abi: JsonAbi,
    pub constructor_param_hints: Option<Vec<String>>,
}

impl ContractArtifact {
    pub fn new(name: impl Into<String>, bytecode: Bytes, abi: JsonAbi) -> Self {
        Self {
            name: name.into(),
            bytecode,
            abi,
            constructor_param_hints: None,
        }
    }

    /// Reads a Foundry (`bytecode.object`) or Hardhat (`bytecode`) artifact.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Contract")
            .trim_end_matches(".json")
            .to_string();
        Self::from_json_str(&fallback_name, &content)
    }

    pub fn from_json_str(fallback_name: &str, json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| DeployError::InvalidArtifact(e.to_string()))?;

        let hex_code = match raw.bytecode {
            RawBytecode::Hex(s) => s,
            RawBytecode::Object { object } => object,
        };
        let bytecode: Bytes = hex_code
            .parse()
            .map_err(|e| DeployError::InvalidArtifact(format!("bytecode: {e}")))?;
        if bytecode.is_empty() {
            return Err(DeployError::InvalidArtifact("empty bytecode".to_string()).into());
        }

        Ok(Self {
            name: raw.contract_name.unwrap_or_else(|| fallback_name.to_string()),
            bytecode,
            abi: raw.abi,
            constructor_param_hints: raw.constructor_param_hints,
        })
    }

    /// Constructor inputs in order. Names come from the hints when they line up with the ABI.
    pub fn constructor_params(&self) -> Result<Vec<ConstructorParam>> {
        let Some(constructor) = &self.abi.constructor else {
            return Ok(vec![]);
        };

        let hints = self
            .constructor_param_hints
            .as_ref()
            .filter(|hints| hints.len() == constructor.inputs.len());

        constructor
            .inputs
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let name = match hints {
                    Some(hints) => hints[i].clone(),
                    None => param.name.clone(),
                };
                Ok(ConstructorParam {
                    name,
                    ty: param.resolve()?,
                })
            })
            .collect()
    }

    pub fn encode_constructor_args(&self, args: &[DynSolValue]) -> Result<Bytes> {
        match &self.abi.constructor {
            Some(constructor) => Ok(constructor.abi_encode_input(args)?.into()),
            None if args.is_empty() => Ok(Bytes::new()),
            None => Err(eyre!(
                "{} has no constructor but {} argument(s) were given",
                self.name,
                args.len()
            )),
        }
    }

    /// Overload of `name` taking exactly `arg_count` inputs.
    pub fn function(&self, name: &str, arg_count: usize) -> Result<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arg_count))
            .ok_or_else(|| {
                eyre!(
                    "{} has no function {} taking {} argument(s)",
                    self.name,
                    name,
                    arg_count
                )
            })
    }

    /// Selector-prefixed calldata for `name(args…)`.
    pub fn encode_function_call(&self, name: &str, args: &[DynSolValue]) -> Result<Bytes> {
        let function = self.function(name, args.len())?;
        Ok(function.abi_encode_input(args)?.into())
    }

    /// `bytecode ‖ abi.encode(args)`
    pub fn init_code(&self, args: &[DynSolValue]) -> Result<Bytes> {
        let encoded = self.encode_constructor_args(args)?;
        Ok([self.bytecode.as_ref(), encoded.as_ref()].concat().into())
    }
}
