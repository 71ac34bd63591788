use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, B256};
use eyre::{Result, eyre};

/// Parses a human-written argument (`"0x…"`, `"42"`, `"[1,2]"`, `"true"`) as `ty`.
pub fn parse_arg(ty: &str, value: &str) -> Result<DynSolValue> {
    let ty = DynSolType::parse(ty)?;
    Ok(ty.coerce_str(value)?)
}

pub fn parse_args(types: &[DynSolType], values: &[String]) -> Result<Vec<DynSolValue>> {
    if types.len() != values.len() {
        return Err(eyre!(
            "expected {} argument(s), got {}",
            types.len(),
            values.len()
        ));
    }

    types
        .iter()
        .zip(values)
        .map(|(ty, value)| Ok(ty.coerce_str(value)?))
        .collect()
}

/// Reads the first return word of a call as an address.
pub fn decode_address_word(data: &[u8]) -> Result<Address> {
    if data.len() < 32 {
        return Err(eyre!("return data too short for an address: {} bytes", data.len()));
    }
    Ok(Address::from_word(B256::from_slice(&data[..32])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{U256, address};

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            parse_arg("uint256", "42").unwrap(),
            DynSolValue::Uint(U256::from(42), 256)
        );
        assert_eq!(
            parse_arg("address", "0x00000000000000000000000000000000000000aa").unwrap(),
            DynSolValue::Address(address!("0x00000000000000000000000000000000000000aa"))
        );
        assert!(parse_arg("uint256", "not a number").is_err());
    }

    #[test]
    fn test_parse_args_length_mismatch() {
        let types = vec![DynSolType::Bool];
        assert!(parse_args(&types, &[]).is_err());
        assert_eq!(
            parse_args(&types, &["true".to_string()]).unwrap(),
            vec![DynSolValue::Bool(true)]
        );
    }

    #[test]
    fn test_decode_address_word() {
        let addr = address!("0x00000000000000000000000000000000000000aa");
        assert_eq!(decode_address_word(addr.into_word().as_slice()).unwrap(), addr);
        assert!(decode_address_word(&[0u8; 4]).is_err());
    }
}
