//! Assembly identities and strong-name keys.
//!
//! # Key Components
//!
//! - [`AssemblyIdentity`] / [`AssemblyVersion`] - display names and the identity of `Assembly`
//!   and `AssemblyRef` rows, used to locate referenced assemblies
//! - [`KeyBlob`] - CAPI `PUBLICKEYBLOB` / `PRIVATEKEYBLOB` codec producing [`RsaParameters`]
//! - [`StrongNamePublicKey`] - the public key as stored in the `Assembly` table
//! - [`derive_identity_token`] - public key tokens
//! - [`sign_digest`] - strong-name signatures
//!
//! # Examples
//!
//! ```rust
//! use cilweave::metadata::identity::{AssemblyIdentity, StrongName, ECMA_PUBLIC_KEY};
//!
//! let mut identity = AssemblyIdentity::parse("System.Runtime, Version=4.2.2.0")?;
//! identity.strong_name = Some(StrongName::PublicKey(ECMA_PUBLIC_KEY.to_vec()));
//! assert_eq!(
//!     identity.display_name(),
//!     "System.Runtime, Version=4.2.2.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
//! );
//! # Ok::<(), cilweave::Error>(())
//! ```

mod assembly;
mod strongname;

pub use assembly::{AssemblyIdentity, AssemblyVersion, ProcessorArchitecture, StrongName};
pub use strongname::{
    derive_identity_token, sign_digest, HashAlgorithm, KeyBlob, ParsedKeyBlob, RsaParameters,
    RsaPrivateParameters, SigningBackend, SigningConfig, StrongNamePublicKey, CALG_RSA_KEYX,
    CALG_RSA_SIGN, CALG_SHA1, CUR_BLOB_VERSION, ECMA_PUBLIC_KEY, PRIVATE_KEY_BLOB,
    PUBLIC_KEY_BLOB, RSA1_MAGIC, RSA2_MAGIC,
};
