use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::normalize_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStandard {
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
}

impl TokenStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStandard::Erc20 => "ERC20",
            TokenStandard::Erc721 => "ERC721",
            TokenStandard::Erc1155 => "ERC1155",
        }
    }
}

impl FromStr for TokenStandard {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ERC20" => Ok(TokenStandard::Erc20),
            "ERC721" => Ok(TokenStandard::Erc721),
            "ERC1155" => Ok(TokenStandard::Erc1155),
            other => anyhow::bail!("Unknown token standard: {other}"),
        }
    }
}

/// Primary key of a token within an account's token set.
///
/// Textual form is `{STANDARD}_{checksumAddress}_{id}`; the address is always
/// checksummed so two slugs for the same contract compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenSlug {
    standard: TokenStandard,
    address: Address,
    id: String,
}

impl TokenSlug {
    pub fn new(standard: TokenStandard, address: Address, id: impl Into<String>) -> Self {
        Self {
            standard,
            address,
            id: id.into(),
        }
    }

    /// Slug for a fungible token contract.
    pub fn erc20(address: Address) -> Self {
        Self::new(TokenStandard::Erc20, address, "0")
    }

    pub fn standard(&self) -> TokenStandard {
        self.standard
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for TokenSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.standard.as_str(),
            self.address.to_checksum(None),
            self.id
        )
    }
}

impl FromStr for TokenSlug {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '_');
        let (Some(standard), Some(address), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            anyhow::bail!("Malformed token slug: {s}");
        };
        if id.is_empty() {
            anyhow::bail!("Malformed token slug: {s}");
        }

        let standard = standard.parse()?;
        let address = normalize_address(address)?;
        Ok(Self::new(standard, address, id))
    }
}

impl TryFrom<String> for TokenSlug {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenSlug> for String {
    fn from(slug: TokenSlug) -> Self {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_slug_uses_checksum_address() {
        let address = normalize_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let slug = TokenSlug::erc20(address);
        assert_eq!(
            slug.to_string(),
            "ERC20_0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48_0"
        );
    }

    #[test]
    fn parse_normalizes_casing() {
        let slug: TokenSlug = "erc20_0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48_0"
            .parse()
            .unwrap();
        assert_eq!(slug.standard(), TokenStandard::Erc20);
        assert_eq!(
            slug.to_string(),
            "ERC20_0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48_0"
        );
    }

    #[test]
    fn parse_rejects_malformed_slugs() {
        assert!("ERC20_0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse::<TokenSlug>().is_err());
        assert!("FOO_0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48_0".parse::<TokenSlug>().is_err());
        assert!("ERC20_0x12_0".parse::<TokenSlug>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let address = normalize_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let slug = TokenSlug::erc20(address);
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, r#""ERC20_0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48_0""#);
        let back: TokenSlug = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slug);
    }
}
