//! BLS12-381 signing behind a swappable backend.
//!
//! The backend is installed once per process with [`init_bls`] (or lazily on first
//! use), every later call is a no-op returning the installed backend.
use alloy::primitives::{U256, hex};
use blst::BLST_ERROR;
use log::*;
use once_cell::sync::OnceCell;

use crate::{
    errors::{BlsError, DepositError, Result},
    ssz::{BlsPubkey, BlsSignature},
};

/// Proof of possession ciphersuite used by the consensus layer
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub const SECRET_KEY_LEN: usize = 32;

// BLS12-381 subgroup order, secret keys are scalars in [1, r)
const CURVE_ORDER: [u8; 32] =
    hex!("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001");

/// A validator secret key, big-endian scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; SECRET_KEY_LEN]);

impl SecretKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SECRET_KEY_LEN] =
            bytes.try_into().map_err(|_| DepositError::InvalidFieldLength {
                field: "secret_key",
                expected: SECRET_KEY_LEN,
                actual: bytes.len(),
            })?;
        let scalar = U256::from_be_bytes(bytes);
        if scalar.is_zero() || scalar >= U256::from_be_bytes(CURVE_ORDER) {
            return Err(BlsError::InvalidSecretKey("scalar out of range".to_string()).into());
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&crate::helpers::parse_hex("secret_key", s)?)
    }

    /// Raw key bytes, the input of keystore encryption
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.0
    }

    /// Public key through the installed backend
    pub fn public_key(&self) -> Result<BlsPubkey> {
        Ok(backend().public_key(self)?)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// A BLS12-381 implementation, min-pk variant (48 byte keys, 96 byte signatures).
pub trait BlsBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Checks the backend is usable before it is installed
    fn init(&self) -> std::result::Result<(), BlsError> {
        Ok(())
    }

    fn public_key(&self, secret: &SecretKey) -> std::result::Result<BlsPubkey, BlsError>;

    fn sign(
        &self,
        secret: &SecretKey,
        message: &[u8],
    ) -> std::result::Result<BlsSignature, BlsError>;

    /// `Ok(false)` on a well formed signature that does not match, `Err` when
    /// the public key or signature cannot be decoded
    fn verify(
        &self,
        pubkey: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<bool, BlsError>;
}

/// supranational/blst
#[derive(Debug, Default, Clone, Copy)]
pub struct Blst;

impl Blst {
    fn secret_key(secret: &SecretKey) -> std::result::Result<blst::min_pk::SecretKey, BlsError> {
        blst::min_pk::SecretKey::from_bytes(secret.as_bytes())
            .map_err(|e| BlsError::InvalidSecretKey(format!("{:?}", e)))
    }
}

impl BlsBackend for Blst {
    fn name(&self) -> &'static str {
        "blst"
    }

    fn init(&self) -> std::result::Result<(), BlsError> {
        // Sign and verify once, a miscompiled or unsupported build fails here
        let sk = blst::min_pk::SecretKey::key_gen(&[0x42; 32], &[])
            .map_err(|e| BlsError::BackendUnavailable(self.name(), format!("{:?}", e)))?;
        let msg = b"deposit-knife backend check";
        let sig = sk.sign(msg, DST, &[]);
        match sig.verify(true, msg, DST, &[], &sk.sk_to_pk(), true) {
            BLST_ERROR::BLST_SUCCESS => Ok(()),
            e => Err(BlsError::BackendUnavailable(self.name(), format!("{:?}", e))),
        }
    }

    fn public_key(&self, secret: &SecretKey) -> std::result::Result<BlsPubkey, BlsError> {
        Ok(Blst::secret_key(secret)?.sk_to_pk().compress().into())
    }

    fn sign(
        &self,
        secret: &SecretKey,
        message: &[u8],
    ) -> std::result::Result<BlsSignature, BlsError> {
        Ok(Blst::secret_key(secret)?
            .sign(message, DST, &[])
            .compress()
            .into())
    }

    fn verify(
        &self,
        pubkey: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<bool, BlsError> {
        let pubkey = blst::min_pk::PublicKey::key_validate(pubkey)
            .map_err(|e| BlsError::InvalidPublicKey(format!("{:?}", e)))?;
        let signature = blst::min_pk::Signature::from_bytes(signature)
            .map_err(|e| BlsError::InvalidSignature(format!("{:?}", e)))?;
        match signature.verify(true, message, DST, &[], &pubkey, false) {
            BLST_ERROR::BLST_SUCCESS => Ok(true),
            BLST_ERROR::BLST_VERIFY_FAIL => Ok(false),
            e => Err(BlsError::InvalidSignature(format!("{:?}", e))),
        }
    }
}

static BACKEND: OnceCell<Box<dyn BlsBackend>> = OnceCell::new();

/// Installs the first candidate whose `init` succeeds.
///
/// Once a backend is installed further calls return it untouched.
pub fn init_bls(candidates: Vec<Box<dyn BlsBackend>>) -> Result<&'static dyn BlsBackend> {
    if let Some(installed) = BACKEND.get() {
        debug!("BLS backend already initialized: {}", installed.name());
        return Ok(installed.as_ref());
    }
    let mut last_err = None;
    for candidate in candidates {
        match candidate.init() {
            Ok(()) => {
                let name = candidate.name();
                // Lost a race to another initializer, theirs wins
                let installed = BACKEND.get_or_init(|| candidate);
                debug!("BLS backend: {} (requested {})", installed.name(), name);
                return Ok(installed.as_ref());
            }
            Err(e) => {
                warn!("BLS backend {} failed to initialize: {}", candidate.name(), e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err
        .unwrap_or_else(|| BlsError::BackendUnavailable("none", "no candidates".to_string()))
        .into())
}

/// Installs the default backend (blst)
pub fn init_default() -> Result<&'static dyn BlsBackend> {
    init_bls(vec![Box::new(Blst)])
}

/// The installed backend, installing blst without a self check if nothing was
/// initialized explicitly.
pub fn backend() -> &'static dyn BlsBackend {
    BACKEND.get_or_init(|| Box::new(Blst)).as_ref()
}

pub fn sign(secret: &SecretKey, message: &[u8]) -> Result<BlsSignature> {
    Ok(backend().sign(secret, message)?)
}
