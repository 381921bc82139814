//! ERC-20 token contract bindings.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use crate::error::{AppError, Result};

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

/// Calldata for `balanceOf(owner)`.
pub fn balance_of_calldata(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }.abi_encode().into()
}

/// Calldata for `allowance(owner, spender)`.
pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

/// Calldata for `decimals()`.
pub fn decimals_calldata() -> Bytes {
    IERC20::decimalsCall {}.abi_encode().into()
}

/// Calldata for `transfer(to, amount)`.
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Decode a `uint256` returned by `balanceOf` or `allowance`.
pub fn decode_amount(output: &[u8]) -> Result<U256> {
    IERC20::balanceOfCall::abi_decode_returns(output)
        .map_err(|e| AppError::Decode(format!("uint256 return: {}", e)))
}

/// Decode the `uint8` returned by `decimals()`.
pub fn decode_decimals(output: &[u8]) -> Result<u8> {
    IERC20::decimalsCall::abi_decode_returns(output)
        .map_err(|e| AppError::Decode(format!("decimals return: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_transfer_selector() {
        let data = transfer_calldata(Address::ZERO, U256::from(1u64));
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_balance_of_encoding() {
        let owner = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let data = balance_of_calldata(owner);
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(&data[16..36], owner.as_slice());
    }

    #[test]
    fn test_decode_amount() {
        let word = U256::from(1_000_000u64).to_be_bytes::<32>();
        assert_eq!(decode_amount(&word).unwrap(), U256::from(1_000_000u64));
        assert!(matches!(decode_amount(&[0u8; 3]), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_decode_decimals() {
        let word = U256::from(6u64).to_be_bytes::<32>();
        assert_eq!(decode_decimals(&word).unwrap(), 6);
    }
}
