//! Strong-name keys: CAPI key blobs, public key headers, identity tokens and signing.
//!
//! Key pairs travel as CAPI `PUBLICKEYBLOB` / `PRIVATEKEYBLOB` structures. Their integers are
//! stored least significant byte first; [`RsaParameters`] holds them most significant byte
//! first, the way RSA libraries expect them.
//!
//! ```text
//! offset  size        field
//! 0       1           bType       0x06 public, 0x07 private
//! 1       1           bVersion    0x02
//! 2       2           reserved
//! 4       4           aiKeyAlg    CALG_RSA_SIGN (0x2400) or CALG_RSA_KEYX (0xA400)
//! 8       4           magic       "RSA1" public, "RSA2" private
//! 12      4           bitlen
//! 16      4           pubexp
//! 20      bitlen/8    modulus
//! --- private blobs only ---
//!         bitlen/16   prime1, prime2, exponent1, exponent2, coefficient
//!         bitlen/8    privateExponent
//! ```

use md5::Md5;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    file::io::{read_le_at, write_le_into},
    Error, Result,
};

/// `bType` of a public key blob
pub const PUBLIC_KEY_BLOB: u8 = 0x06;
/// `bType` of a private key blob
pub const PRIVATE_KEY_BLOB: u8 = 0x07;
/// The only supported `bVersion`
pub const CUR_BLOB_VERSION: u8 = 0x02;
/// `CALG_RSA_SIGN`
pub const CALG_RSA_SIGN: u32 = 0x0000_2400;
/// `CALG_RSA_KEYX`
pub const CALG_RSA_KEYX: u32 = 0x0000_A400;
/// `CALG_SHA1`
pub const CALG_SHA1: u32 = 0x0000_8004;
/// "RSA1"
pub const RSA1_MAGIC: u32 = 0x3141_5352;
/// "RSA2"
pub const RSA2_MAGIC: u32 = 0x3241_5352;

const BLOB_HEADER_SIZE: usize = 20;

/// The public key every framework assembly is signed with in metadata, standing in for the
/// real platform key.
pub const ECMA_PUBLIC_KEY: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// The private half of an RSA key, big-endian.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateParameters {
    /// First prime
    pub p: Vec<u8>,
    /// Second prime
    pub q: Vec<u8>,
    /// `d mod (p - 1)`
    pub dp: Vec<u8>,
    /// `d mod (q - 1)`
    pub dq: Vec<u8>,
    /// `q^-1 mod p`
    pub inverse_q: Vec<u8>,
    /// Private exponent
    pub d: Vec<u8>,
}

impl std::fmt::Debug for RsaPrivateParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RsaPrivateParameters { .. }")
    }
}

/// An RSA key with big-endian integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaParameters {
    /// Key size in bits as declared by the blob
    pub bit_length: u32,
    /// Public exponent without leading zero bytes
    pub exponent: Vec<u8>,
    /// Modulus, `bit_length / 8` bytes
    pub modulus: Vec<u8>,
    /// Present for key pairs
    pub private: Option<RsaPrivateParameters>,
}

impl RsaParameters {
    /// Key size in bits.
    #[must_use]
    pub fn bit_length(&self) -> u32 {
        self.bit_length
    }

    /// Returns `true` if the private half is present.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// Extract the parameters of a key pair.
    ///
    /// # Errors
    /// Returns [`Error::Signing`] if the key does not have exactly two primes.
    pub fn from_private_key(key: &RsaPrivateKey) -> Result<Self> {
        use rsa::traits::{PrivateKeyParts, PublicKeyParts};

        let [p, q] = key.primes() else {
            return Err(Error::Signing(format!(
                "Expected two primes, found {}",
                key.primes().len()
            )));
        };
        let one = BigUint::from(1u32);
        let bit_length = (key.size() * 8) as u32;
        let width = key.size();
        let half = width / 2;

        Ok(RsaParameters {
            bit_length,
            exponent: key.e().to_bytes_be(),
            modulus: pad_be(&key.n().to_bytes_be(), width),
            private: Some(RsaPrivateParameters {
                p: pad_be(&p.to_bytes_be(), half),
                q: pad_be(&q.to_bytes_be(), half),
                dp: pad_be(&(key.d() % (p - &one)).to_bytes_be(), half),
                dq: pad_be(&(key.d() % (q - &one)).to_bytes_be(), half),
                inverse_q: pad_be(
                    &q.modpow(&(p - BigUint::from(2u32)), p).to_bytes_be(),
                    half,
                ),
                d: pad_be(&key.d().to_bytes_be(), width),
            }),
        })
    }

    /// Serialize the public half as a `PUBLICKEYBLOB`.
    #[must_use]
    pub fn to_public_key_blob(&self, algorithm_id: u32) -> Vec<u8> {
        let width = self.bit_length as usize / 8;
        let mut blob = Vec::with_capacity(BLOB_HEADER_SIZE + width);
        self.write_header(&mut blob, PUBLIC_KEY_BLOB, algorithm_id, RSA1_MAGIC);
        write_le_integer(&mut blob, &self.modulus, width);
        blob
    }

    /// Serialize the key pair as a `PRIVATEKEYBLOB`.
    ///
    /// # Errors
    /// Returns [`Error::Signing`] if the private half is missing.
    pub fn to_private_key_blob(&self, algorithm_id: u32) -> Result<Vec<u8>> {
        let Some(private) = &self.private else {
            return Err(Error::Signing("Key has no private half".to_string()));
        };

        let width = self.bit_length as usize / 8;
        let half = self.bit_length as usize / 16;
        let mut blob = Vec::with_capacity(BLOB_HEADER_SIZE + width * 2 + half * 5);
        self.write_header(&mut blob, PRIVATE_KEY_BLOB, algorithm_id, RSA2_MAGIC);
        write_le_integer(&mut blob, &self.modulus, width);
        for part in [&private.p, &private.q, &private.dp, &private.dq, &private.inverse_q] {
            write_le_integer(&mut blob, part, half);
        }
        write_le_integer(&mut blob, &private.d, width);
        Ok(blob)
    }

    fn write_header(&self, blob: &mut Vec<u8>, blob_type: u8, algorithm_id: u32, magic: u32) {
        blob.push(blob_type);
        blob.push(CUR_BLOB_VERSION);
        write_le_into(blob, 0u16);
        write_le_into(blob, algorithm_id);
        write_le_into(blob, magic);
        write_le_into(blob, self.bit_length);

        let mut exponent = [0u8; 4];
        let significant = &self.exponent[self.exponent.len().saturating_sub(4)..];
        exponent[4 - significant.len()..].copy_from_slice(significant);
        write_le_into(blob, u32::from_be_bytes(exponent));
    }
}

/// Outcome of [`KeyBlob::try_parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyBlob {
    /// The key
    pub params: RsaParameters,
    /// Length of the blob, starting at the parse offset
    pub bytes_consumed: usize,
    /// `aiKeyAlg` of the header
    pub algorithm_id: u32,
}

/// CAPI key blob codec.
pub struct KeyBlob;

impl KeyBlob {
    /// Parse the key blob starting at `offset` of `data`.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for truncated blobs, unknown blob types, versions or
    /// magics, and bit lengths that are not a multiple of 16.
    pub fn try_parse(data: &[u8], offset: usize) -> Result<ParsedKeyBlob> {
        let Some(blob) = data.get(offset..) else {
            return Err(malformed_error!(
                "Key blob offset {} is past the end of {} bytes",
                offset,
                data.len()
            ));
        };
        if blob.len() < BLOB_HEADER_SIZE {
            return Err(malformed_error!(
                "Key blob header needs {} bytes, {} available",
                BLOB_HEADER_SIZE,
                blob.len()
            ));
        }

        let mut cursor = 0usize;
        let blob_type: u8 = read_le_at(blob, &mut cursor)?;
        let version: u8 = read_le_at(blob, &mut cursor)?;
        let _reserved: u16 = read_le_at(blob, &mut cursor)?;
        let algorithm_id: u32 = read_le_at(blob, &mut cursor)?;
        let magic: u32 = read_le_at(blob, &mut cursor)?;
        let bit_length: u32 = read_le_at(blob, &mut cursor)?;
        let public_exponent: u32 = read_le_at(blob, &mut cursor)?;

        if version != CUR_BLOB_VERSION {
            return Err(malformed_error!("Unsupported key blob version {}", version));
        }
        let is_private = match (blob_type, magic) {
            (PUBLIC_KEY_BLOB, RSA1_MAGIC) => false,
            (PRIVATE_KEY_BLOB, RSA2_MAGIC) => true,
            (PUBLIC_KEY_BLOB | PRIVATE_KEY_BLOB, _) => {
                return Err(malformed_error!(
                    "Key blob type {:#04x} does not match magic {:#010x}",
                    blob_type,
                    magic
                ))
            }
            _ => return Err(malformed_error!("Unknown key blob type {:#04x}", blob_type)),
        };
        if bit_length == 0 || bit_length % 16 != 0 {
            return Err(malformed_error!("Invalid key bit length {}", bit_length));
        }

        let width = bit_length as usize / 8;
        let half = bit_length as usize / 16;
        let body = if is_private { width * 2 + half * 5 } else { width };
        let total = BLOB_HEADER_SIZE + body;
        if blob.len() < total {
            return Err(malformed_error!(
                "Key blob truncated: {} bit key needs {} bytes, {} available",
                bit_length,
                total,
                blob.len()
            ));
        }

        let mut take = |len: usize| {
            let mut value = blob[cursor..cursor + len].to_vec();
            value.reverse();
            cursor += len;
            value
        };

        let modulus = take(width);
        let private = is_private.then(|| RsaPrivateParameters {
            p: take(half),
            q: take(half),
            dp: take(half),
            dq: take(half),
            inverse_q: take(half),
            d: take(width),
        });

        let exponent = strip_leading_zeros(&public_exponent.to_be_bytes());

        Ok(ParsedKeyBlob {
            params: RsaParameters {
                bit_length,
                exponent,
                modulus,
                private,
            },
            bytes_consumed: total,
            algorithm_id,
        })
    }
}

/// The public key stored in the `Assembly` table: a small header followed by a
/// `PUBLICKEYBLOB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongNamePublicKey {
    /// `SigAlgID`
    pub signature_algorithm: u32,
    /// `HashAlgID`
    pub hash_algorithm: u32,
    /// The key blob, empty-bodied for the ECMA key
    pub key_blob: Vec<u8>,
}

impl StrongNamePublicKey {
    /// Wrap the public half of `params` with SHA-1 / RSA signature algorithm ids.
    #[must_use]
    pub fn from_params(params: &RsaParameters) -> Self {
        StrongNamePublicKey {
            signature_algorithm: CALG_RSA_SIGN,
            hash_algorithm: CALG_SHA1,
            key_blob: params.to_public_key_blob(CALG_RSA_SIGN),
        }
    }

    /// Parse a strong-name public key.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the header is truncated or its length field disagrees
    /// with the data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut offset = 0usize;
        let signature_algorithm: u32 = read_le_at(data, &mut offset)
            .map_err(|_| malformed_error!("Strong-name public key header truncated"))?;
        let hash_algorithm: u32 = read_le_at(data, &mut offset)
            .map_err(|_| malformed_error!("Strong-name public key header truncated"))?;
        let length: u32 = read_le_at(data, &mut offset)
            .map_err(|_| malformed_error!("Strong-name public key header truncated"))?;

        if data.len() - offset != length as usize {
            return Err(malformed_error!(
                "Strong-name public key declares {} key bytes, found {}",
                length,
                data.len() - offset
            ));
        }

        Ok(StrongNamePublicKey {
            signature_algorithm,
            hash_algorithm,
            key_blob: data[offset..].to_vec(),
        })
    }

    /// Serialized form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(12 + self.key_blob.len());
        write_le_into(&mut data, self.signature_algorithm);
        write_le_into(&mut data, self.hash_algorithm);
        write_le_into(&mut data, self.key_blob.len() as u32);
        data.extend_from_slice(&self.key_blob);
        data
    }

    /// Returns `true` for the ECMA neutral key.
    #[must_use]
    pub fn is_ecma_key(&self) -> bool {
        self.signature_algorithm == 0 && self.hash_algorithm == 0 && self.key_blob == [0, 0, 0, 0]
    }

    /// The RSA key inside, `None` for the ECMA key.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the key blob is malformed.
    pub fn rsa_parameters(&self) -> Result<Option<RsaParameters>> {
        if self.is_ecma_key() {
            return Ok(None);
        }
        Ok(Some(KeyBlob::try_parse(&self.key_blob, 0)?.params))
    }
}

/// The public key token of a full strong-name public key: the last eight bytes of its SHA-1
/// hash in reverse order.
///
/// ```rust
/// use cilweave::metadata::identity::{derive_identity_token, ECMA_PUBLIC_KEY};
///
/// assert_eq!(
///     hex::encode(derive_identity_token(&ECMA_PUBLIC_KEY)),
///     "b77a5c561934e089"
/// );
/// ```
#[must_use]
pub fn derive_identity_token(public_key: &[u8]) -> [u8; 8] {
    let hash = Sha1::digest(public_key);
    let mut token = [0u8; 8];
    token.copy_from_slice(&hash[hash.len() - 8..]);
    token.reverse();
    token
}

/// Digest algorithms a strong-name signature can be made over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// `CALG_MD5`
    Md5,
    /// `CALG_SHA1`
    Sha1,
    /// `CALG_SHA_256`
    Sha256,
    /// `CALG_SHA_384`
    Sha384,
    /// `CALG_SHA_512`
    Sha512,
}

impl HashAlgorithm {
    /// Map a CAPI `ALG_ID`.
    #[must_use]
    pub fn from_alg_id(alg_id: u32) -> Option<Self> {
        match alg_id {
            0x8003 => Some(HashAlgorithm::Md5),
            0x8004 => Some(HashAlgorithm::Sha1),
            0x800C => Some(HashAlgorithm::Sha256),
            0x800D => Some(HashAlgorithm::Sha384),
            0x800E => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Length of a digest in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Hash `data`.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn padding(self) -> Pkcs1v15Sign {
        match self {
            HashAlgorithm::Md5 => Pkcs1v15Sign::new::<Md5>(),
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }
}

/// A way of turning [`RsaParameters`] into a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningBackend {
    /// Use both primes from the blob
    Crt,
    /// Use only the modulus and exponents; the primes are recovered
    ExponentOnly,
}

/// Order in which [`sign_digest`] tries its backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    /// Backends, most preferred first
    pub backends: Vec<SigningBackend>,
}

impl SigningConfig {
    /// Replace the backend order.
    #[must_use]
    pub fn with_backends(mut self, backends: Vec<SigningBackend>) -> Self {
        self.backends = backends;
        self
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig {
            backends: vec![SigningBackend::Crt, SigningBackend::ExponentOnly],
        }
    }
}

fn build_key(params: &RsaParameters, backend: SigningBackend) -> Result<RsaPrivateKey> {
    let Some(private) = &params.private else {
        return Err(Error::Signing("Key has no private half".to_string()));
    };

    let n = BigUint::from_bytes_be(&params.modulus);
    let e = BigUint::from_bytes_be(&params.exponent);
    let d = BigUint::from_bytes_be(&private.d);
    let primes = match backend {
        SigningBackend::Crt => vec![
            BigUint::from_bytes_be(&private.p),
            BigUint::from_bytes_be(&private.q),
        ],
        SigningBackend::ExponentOnly => Vec::new(),
    };

    let key = RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|error| Error::Signing(error.to_string()))?;
    key.validate()
        .map_err(|error| Error::Signing(error.to_string()))?;
    Ok(key)
}

/// Sign `digest` with PKCS#1 v1.5 padding.
///
/// The signature is returned least significant byte first, as stored in a module.
///
/// # Errors
/// Returns [`Error::Signing`] if the digest length does not match `algorithm` or no backend
/// of `config` produced a signature.
pub fn sign_digest(
    params: &RsaParameters,
    algorithm: HashAlgorithm,
    digest: &[u8],
    config: &SigningConfig,
) -> Result<Vec<u8>> {
    if digest.len() != algorithm.digest_len() {
        return Err(Error::Signing(format!(
            "{:?} digest must be {} bytes, got {}",
            algorithm,
            algorithm.digest_len(),
            digest.len()
        )));
    }

    let mut failures = Vec::new();
    for &backend in &config.backends {
        let signed = build_key(params, backend).and_then(|key| {
            key.sign(algorithm.padding(), digest)
                .map_err(|error| Error::Signing(error.to_string()))
        });
        match signed {
            Ok(mut signature) => {
                signature.reverse();
                return Ok(signature);
            }
            Err(error) => {
                tracing::debug!(?backend, %error, "signing backend failed");
                failures.push(format!("{backend:?}: {error}"));
            }
        }
    }

    Err(Error::Signing(if failures.is_empty() {
        "No signing backend configured".to_string()
    } else {
        failures.join("; ")
    }))
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    bytes[start..].to_vec()
}

fn pad_be(bytes: &[u8], width: usize) -> Vec<u8> {
    if bytes.len() >= width {
        return bytes[bytes.len() - width..].to_vec();
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}

fn write_le_integer(blob: &mut Vec<u8>, big_endian: &[u8], width: usize) {
    blob.extend(pad_be(big_endian, width).iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::key_blobs::{private_key_blob_512, public_key_blob_512};

    #[test]
    fn public_blob() {
        let blob = public_key_blob_512();
        let parsed = KeyBlob::try_parse(&blob, 0).unwrap();
        assert_eq!(parsed.bytes_consumed, blob.len());
        assert_eq!(parsed.algorithm_id, CALG_RSA_SIGN);
        assert_eq!(parsed.params.bit_length(), 512);
        assert_eq!(parsed.params.exponent, vec![0x01, 0x00, 0x01]);
        assert_eq!(parsed.params.modulus.len(), 64);
        // most significant byte first
        assert_eq!(parsed.params.modulus[0], blob[blob.len() - 1]);
        assert!(!parsed.params.has_private_key());
        assert_eq!(parsed.params.to_public_key_blob(CALG_RSA_SIGN), blob);
    }

    #[test]
    fn private_blob_yields_public_blob() {
        let private = private_key_blob_512();
        let parsed = KeyBlob::try_parse(&private, 0).unwrap();
        assert_eq!(parsed.bytes_consumed, private.len());
        assert!(parsed.params.has_private_key());
        assert_eq!(
            parsed.params.to_public_key_blob(parsed.algorithm_id),
            public_key_blob_512()
        );
        assert_eq!(
            parsed.params.to_private_key_blob(parsed.algorithm_id).unwrap(),
            private
        );
    }

    #[test]
    fn parse_at_offset() {
        let mut data = vec![0xAA; 12];
        data.extend(public_key_blob_512());
        data.extend([0xBB; 3]);
        let parsed = KeyBlob::try_parse(&data, 12).unwrap();
        assert_eq!(parsed.bytes_consumed, data.len() - 15);
    }

    #[test]
    fn malformed_blobs() {
        let blob = public_key_blob_512();

        let truncated = &blob[..BLOB_HEADER_SIZE + 10];
        assert!(matches!(
            KeyBlob::try_parse(truncated, 0),
            Err(Error::Malformed { .. })
        ));

        let mut bad_version = blob.clone();
        bad_version[1] = 0x03;
        assert!(KeyBlob::try_parse(&bad_version, 0).is_err());

        let mut bad_magic = blob.clone();
        bad_magic[8] = b'X';
        assert!(KeyBlob::try_parse(&bad_magic, 0).is_err());

        let mut wrong_magic = blob.clone();
        wrong_magic[11] = b'2';
        assert!(KeyBlob::try_parse(&wrong_magic, 0).is_err());

        let mut bad_type = blob;
        bad_type[0] = 0x08;
        assert!(KeyBlob::try_parse(&bad_type, 0).is_err());

        assert!(KeyBlob::try_parse(&[0x06, 0x02], 0).is_err());
        assert!(KeyBlob::try_parse(&[], 4).is_err());
    }

    #[test]
    fn strong_name_public_key() {
        let ecma = StrongNamePublicKey::parse(&ECMA_PUBLIC_KEY).unwrap();
        assert!(ecma.is_ecma_key());
        assert_eq!(ecma.rsa_parameters().unwrap(), None);
        assert_eq!(ecma.to_bytes(), ECMA_PUBLIC_KEY);

        let params = KeyBlob::try_parse(&public_key_blob_512(), 0).unwrap().params;
        let key = StrongNamePublicKey::from_params(&params);
        let bytes = key.to_bytes();
        assert_eq!(bytes.len(), 12 + 84);
        let reparsed = StrongNamePublicKey::parse(&bytes).unwrap();
        assert_eq!(reparsed, key);
        assert_eq!(reparsed.rsa_parameters().unwrap(), Some(params));

        assert!(StrongNamePublicKey::parse(&bytes[..bytes.len() - 1]).is_err());
        assert!(StrongNamePublicKey::parse(&[0; 6]).is_err());
    }

    #[test]
    fn identity_token() {
        assert_eq!(
            derive_identity_token(&ECMA_PUBLIC_KEY),
            [0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]
        );
    }

    #[test]
    fn digest_lengths() {
        for algorithm in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(algorithm.digest(b"abc").len(), algorithm.digest_len());
        }
        assert_eq!(HashAlgorithm::from_alg_id(0x8004), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_alg_id(0x1234), None);
    }

    #[test]
    fn signing_requires_private_key() {
        let params = KeyBlob::try_parse(&public_key_blob_512(), 0).unwrap().params;
        let digest = HashAlgorithm::Sha1.digest(b"content");
        assert!(matches!(
            sign_digest(&params, HashAlgorithm::Sha1, &digest, &SigningConfig::default()),
            Err(Error::Signing(_))
        ));
        assert!(sign_digest(&params, HashAlgorithm::Sha1, &digest[..4], &SigningConfig::default())
            .is_err());
        assert!(matches!(
            sign_digest(
                &params,
                HashAlgorithm::Sha1,
                &digest,
                &SigningConfig::default().with_backends(Vec::new())
            ),
            Err(Error::Signing(message)) if message.contains("No signing backend")
        ));
    }
}
