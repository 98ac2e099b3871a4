use thiserror::Error;

/// Failures of the BLS backend, either on key material or on signing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlsError {
    #[error("invalid BLS secret key: {0}")]
    InvalidSecretKey(String),
    #[error("invalid BLS public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid BLS signature: {0}")]
    InvalidSignature(String),
    #[error("BLS key generation failed: {0}")]
    KeyGeneration(String),
    #[error("BLS backend {0} unavailable: {1}")]
    BackendUnavailable(&'static str, String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    /// A container field does not have its schema-declared byte length
    #[error("invalid length for field `{field}`: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    #[error("invalid fork version: {0}")]
    InvalidForkVersion(String),
    #[error("batch has {keys} keys but {salts} salts")]
    BatchLength { keys: usize, salts: usize },
    #[error("mnemonic error: {0}")]
    Mnemonic(String),
    #[error(transparent)]
    Bls(#[from] BlsError),
}

pub type Result<T> = std::result::Result<T, DepositError>;
