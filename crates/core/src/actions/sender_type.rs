use alloy::primitives::Address;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SenderType {
    /// The caller's funded signer.
    Signer,
    /// A keyless address that can only replay its one presigned transaction.
    Keyless(Address),
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderType::Signer => f.write_str("signer"),
            SenderType::Keyless(address) => write!(f, "keyless {}", address),
        }
    }
}
