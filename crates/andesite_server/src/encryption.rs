//! AES-128-CFB8 stream ciphers plus the RSA login key exchange.
//!
//! The cipher wraps the outermost byte stream: frames are encrypted after
//! length-prefixing and compression, and inbound bytes are decrypted before
//! the frame splitter sees them. The 16-byte shared secret doubles as the IV.

use aes::cipher::{
    generic_array::GenericArray, inout::InOut, BlockBackend, BlockClosure, BlockSizeUser,
    KeyIvInit,
};
use generic_array::typenum::U1;
use num_bigint::{BigInt, Sign};
use rand::RngCore;
use rsa::{pkcs8::EncodePublicKey, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::{ConnectionError, Result};

pub type Aes128Cfb8Enc = cfb8::Encryptor<aes::Aes128>;
pub type Aes128Cfb8Dec = cfb8::Decryptor<aes::Aes128>;

/// Feeds a byte run through a CFB8 backend one block (= one byte) at a time.
pub struct Cfb8Closure<'a> {
    pub data: &'a mut [u8],
}

impl BlockSizeUser for Cfb8Closure<'_> {
    type BlockSize = U1;
}

impl BlockClosure for Cfb8Closure<'_> {
    fn call<B: BlockBackend<BlockSize = Self::BlockSize>>(self, backend: &mut B) {
        for byte in self.data.iter_mut() {
            let input = GenericArray::<u8, U1>::from([*byte]);
            let mut output = GenericArray::<u8, U1>::default();
            let block = InOut::from((&input, &mut output));
            backend.proc_block(block);
            *byte = output[0];
        }
    }
}

/// Builds the encrypt/decrypt pair from the session's shared secret.
pub fn create_ciphers(shared_secret: &[u8]) -> Result<(Aes128Cfb8Enc, Aes128Cfb8Dec)> {
    let key: &[u8; 16] = shared_secret
        .try_into()
        .map_err(|_| ConnectionError::encryption("shared secret must be 16 bytes"))?;
    let iv = key;
    Ok((
        Aes128Cfb8Enc::new(key.into(), iv.into()),
        Aes128Cfb8Dec::new(key.into(), iv.into()),
    ))
}

/// Server-side RSA state for one login exchange.
pub struct KeyExchange {
    private_key: RsaPrivateKey,
    public_key_der: Vec<u8>,
    verify_token: Vec<u8>,
}

impl KeyExchange {
    /// Generates a fresh 1024-bit keypair and a 4-byte verify token.
    pub fn new() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 1024)
            .map_err(|e| ConnectionError::encryption(format!("keypair generation: {e}")))?;
        let public_key_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| ConnectionError::encryption(format!("DER encoding: {e}")))?
            .as_ref()
            .to_vec();

        let mut verify_token = vec![0u8; 4];
        rng.fill_bytes(&mut verify_token);

        Ok(Self {
            private_key,
            public_key_der,
            verify_token,
        })
    }

    /// X.509/DER form sent in the encryption request.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    pub fn verify_token(&self) -> &[u8] {
        &self.verify_token
    }

    pub fn decrypt_verify_token(&self, encrypted: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .decrypt(Pkcs1v15Encrypt, encrypted)
            .map_err(|e| ConnectionError::encryption(format!("verify token: {e}")))
    }

    pub fn verify_token_matches(&self, encrypted: &[u8]) -> bool {
        self.decrypt_verify_token(encrypted)
            .map(|decrypted| decrypted == self.verify_token)
            .unwrap_or(false)
    }

    /// Recovers the client's 16-byte shared secret.
    pub fn decrypt_shared_secret(&self, encrypted: &[u8]) -> Result<Vec<u8>> {
        let decrypted = self
            .private_key
            .decrypt(Pkcs1v15Encrypt, encrypted)
            .map_err(|e| ConnectionError::encryption(format!("shared secret: {e}")))?;
        if decrypted.len() != 16 {
            return Err(ConnectionError::encryption(format!(
                "shared secret has length {}, expected 16",
                decrypted.len()
            )));
        }
        debug!("decrypted 16-byte shared secret");
        Ok(decrypted)
    }

    pub fn server_id_hash(&self, server_id: &str, shared_secret: &[u8]) -> String {
        generate_server_hash(server_id, shared_secret, &self.public_key_der)
    }
}

/// Mojang-style server-id hash: sha1 over id, secret and public key,
/// rendered as a signed hex big integer.
pub fn generate_server_hash(server_id: &str, shared_secret: &[u8], public_key: &[u8]) -> String {
    let hash = Sha1::new()
        .chain_update(server_id.as_bytes())
        .chain_update(shared_secret)
        .chain_update(public_key)
        .finalize();

    let big_int = BigInt::from_signed_bytes_be(&hash);
    let hex = big_int.to_str_radix(16);
    if big_int.sign() == Sign::Minus {
        format!("-{}", hex.replace('-', ""))
    } else {
        hex
    }
}
