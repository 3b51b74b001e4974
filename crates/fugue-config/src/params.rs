//! Protocol gas and refund parameters

/// Refund for clearing a storage slot before net metering
pub const SSTORE_REFUND_GAS: u64 = 15_000;

/// Refund for clearing a storage slot under net metering
pub const NET_SSTORE_CLEAR_REFUND: u64 = 15_000;
/// Refund for resetting a slot to its original nonzero value (EIP-1283)
pub const NET_SSTORE_RESET_REFUND: u64 = 4_800;
/// Refund for resetting a slot to its original zero value (EIP-1283)
pub const NET_SSTORE_RESET_CLEAR_REFUND: u64 = 19_800;

/// SSTORE cost for a zero to nonzero write (EIP-2200)
pub const SSTORE_SET_GAS_EIP2200: u64 = 20_000;
/// SSTORE cost for a nonzero to nonzero write (EIP-2200)
pub const SSTORE_RESET_GAS_EIP2200: u64 = 5_000;
/// SLOAD cost (EIP-2200)
pub const SLOAD_GAS_EIP2200: u64 = 800;

/// Refund granted once per self-destructed account
pub const SELFDESTRUCT_REFUND_GAS: u64 = 24_000;

/// Gas per byte of deployed contract code
pub const CREATE_DATA_GAS: u64 = 200;

/// Maximum deployed code size (EIP-170)
pub const MAX_CODE_SIZE: usize = 24_576;

/// Maximum call/create nesting depth
pub const CALL_CREATE_DEPTH: usize = 1024;

/// Number of ancestor blocks visible to BLOCKHASH
pub const BLOCK_HASH_WINDOW: u64 = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip2200_reset_refunds() {
        assert_eq!(SSTORE_SET_GAS_EIP2200 - SLOAD_GAS_EIP2200, 19_200);
        assert_eq!(SSTORE_RESET_GAS_EIP2200 - SLOAD_GAS_EIP2200, 4_200);
    }
}
