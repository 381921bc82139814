//! Smart contract bindings.
//!
//! Static bindings live in submodules; the free functions here work against
//! ABIs only known at runtime.

pub mod erc20;

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    hex,
    json_abi::{Function, JsonAbi},
    primitives::Bytes,
};

use crate::error::{AppError, Result};

/// Find the overload of `method` taking `arity` inputs.
pub fn find_function<'a>(abi: &'a JsonAbi, method: &str, arity: usize) -> Result<&'a Function> {
    let overloads = abi
        .function(method)
        .ok_or_else(|| AppError::Encode(format!("method {} not found in ABI", method)))?;

    overloads.iter().find(|f| f.inputs.len() == arity).ok_or_else(|| {
        AppError::Encode(format!("method {} has no overload taking {} arguments", method, arity))
    })
}

/// Selector-prefixed calldata for `method(args)`.
pub fn encode_call(abi: &JsonAbi, method: &str, args: &[DynSolValue]) -> Result<Bytes> {
    let function = find_function(abi, method, args.len())?;
    let data = function
        .abi_encode_input(args)
        .map_err(|e| AppError::Encode(format!("{}: {}", function.signature(), e)))?;
    Ok(data.into())
}

/// The function whose 4-byte selector prefixes `input`.
pub fn find_by_selector<'a>(abi: &'a JsonAbi, input: &[u8]) -> Result<&'a Function> {
    if input.len() < 4 {
        return Err(AppError::Decode(format!(
            "calldata too short for a selector ({} bytes)",
            input.len()
        )));
    }
    let selector = &input[..4];
    abi.functions().find(|f| f.selector().as_slice() == selector).ok_or_else(|| {
        AppError::Decode(format!(
            "Cannot get corresponding method from the ABI for selector {}",
            hex::encode_prefixed(selector)
        ))
    })
}

/// Decode the return data of `function`.
pub fn decode_output(function: &Function, output: &[u8]) -> Result<Vec<DynSolValue>> {
    function
        .abi_decode_output(output)
        .map_err(|e| AppError::Decode(format!("{} output: {}", function.signature(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    fn token_abi() -> JsonAbi {
        JsonAbi::parse([
            "function transfer(address to, uint256 amount) returns (bool)",
            "function balanceOf(address owner) view returns (uint256)",
            "function mint(uint256 amount)",
            "function mint(address to, uint256 amount)",
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_call_uses_selector() {
        let data = encode_call(
            &token_abi(),
            "transfer",
            &[DynSolValue::Address(Address::ZERO), DynSolValue::Uint(U256::from(5u64), 256)],
        )
        .unwrap();
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_find_function_by_arity() {
        let abi = token_abi();
        assert_eq!(find_function(&abi, "mint", 1).unwrap().inputs.len(), 1);
        assert_eq!(find_function(&abi, "mint", 2).unwrap().inputs.len(), 2);
        assert!(matches!(find_function(&abi, "mint", 3), Err(AppError::Encode(_))));
    }

    #[test]
    fn test_unknown_method() {
        let err = encode_call(&token_abi(), "burn", &[]).unwrap_err();
        assert!(err.to_string().contains("burn"));
    }

    #[test]
    fn test_wrong_argument_type_is_encode_error() {
        let err = encode_call(&token_abi(), "balanceOf", &[DynSolValue::Bool(true)]).unwrap_err();
        assert!(matches!(err, AppError::Encode(_)));
    }

    #[test]
    fn test_decode_output() {
        let abi = token_abi();
        let function = find_function(&abi, "balanceOf", 1).unwrap();
        let word = U256::from(42u64).to_be_bytes::<32>();
        let values = decode_output(function, &word).unwrap();
        assert_eq!(values, vec![DynSolValue::Uint(U256::from(42u64), 256)]);
    }

    #[test]
    fn test_find_by_selector() {
        let abi = token_abi();
        let data = [0xa9, 0x05, 0x9c, 0xbb, 0x00];
        assert_eq!(find_by_selector(&abi, &data).unwrap().name, "transfer");

        let err = find_by_selector(&abi, &[0xa9]).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));

        let err = find_by_selector(&abi, &[1, 2, 3, 4]).unwrap_err();
        assert!(err.to_string().contains("0x01020304"));
    }
}
