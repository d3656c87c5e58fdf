mod address;
pub mod amount;
mod network;
mod slug;
mod token;

pub use address::{
    is_dead_address, is_native_or_zero, is_zero_address, normalize_address, DEAD_ADDRESS,
    NATIVE_PLACEHOLDER_ADDRESS, ZERO_ADDRESSES,
};
pub use network::{Network, NetworkKind, Networks};
pub use slug::{TokenSlug, TokenStandard};
pub use token::{
    TokenRecord, TokenStatus, TokenType, DEFAULT_DECIMALS, DEFAULT_NAME, DEFAULT_SYMBOL,
};
