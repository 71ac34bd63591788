use super::InfraContractType;
use crate::error::DeployError;
use crate::types::artifact::ConstructorParam;
use alloy::dyn_abi::{DynSolType, DynSolValue};
use eyre::Result;
use log::debug;
use std::collections::BTreeMap;

/// Infra contracts a constructor parameter resolves to, judged by its name.
pub fn infra_for_param(param_name: &str) -> Option<&'static [InfraContractType]> {
    let normalized = param_name.trim_start_matches('_').to_ascii_lowercase();
    match normalized.as_str() {
        "trustedforwarder" | "trustedforwarders" => Some(&[InfraContractType::Forwarder]),
        "eoaforwarder" | "trustedeoaforwarder" => Some(&[InfraContractType::EoaForwarder]),
        "nativetokenwrapper" => Some(&[InfraContractType::NativeTokenWrapper]),
        _ => None,
    }
}

fn infra_value(ty: &DynSolType, infra: &[InfraContractType]) -> Option<DynSolValue> {
    match ty {
        DynSolType::Address => infra.first().map(|c| DynSolValue::Address(c.address())),
        DynSolType::Array(inner) if **inner == DynSolType::Address => Some(DynSolValue::Array(
            infra
                .iter()
                .map(|c| DynSolValue::Address(c.address()))
                .collect(),
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundConstructor {
    pub args: Vec<DynSolValue>,
    /// Infra contracts that must exist before these arguments point at live code.
    pub required_infra: Vec<InfraContractType>,
}

/// Orders caller-supplied values by the constructor signature. With `bind_infra`,
/// parameters the caller left out are bound to infrastructure contracts by name.
pub fn bind_constructor_args(
    params: &[ConstructorParam],
    provided: &BTreeMap<String, DynSolValue>,
    bind_infra: bool,
) -> Result<BoundConstructor> {
    let mut args = Vec::with_capacity(params.len());
    let mut required_infra = Vec::new();

    for param in params {
        if let Some(value) = provided.get(&param.name) {
            args.push(value.clone());
            continue;
        }

        let bound = bind_infra
            .then(|| infra_for_param(&param.name))
            .flatten()
            .and_then(|infra| infra_value(&param.ty, infra).map(|value| (infra, value)));

        match bound {
            Some((infra, value)) => {
                debug!("Bound constructor parameter {} to {:?}", param.name, infra);
                required_infra.extend_from_slice(infra);
                args.push(value);
            }
            None => {
                return Err(DeployError::UnboundConstructorParam {
                    name: param.name.clone(),
                }
                .into());
            }
        }
    }

    Ok(BoundConstructor {
        args,
        required_infra,
    })
}
