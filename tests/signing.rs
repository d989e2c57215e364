//! Strong-name key handling against keys generated by the `rsa` crate.

use cilweave::{
    metadata::{
        identity::{
            derive_identity_token, sign_digest, HashAlgorithm, SigningBackend, SigningConfig,
            StrongName, CALG_RSA_KEYX, CALG_RSA_SIGN, ECMA_PUBLIC_KEY,
        },
        tables::AssemblyRow,
    },
    prelude::*,
};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use sha2::Sha256;

fn generated_key(bits: usize) -> RsaPrivateKey {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, bits).unwrap()
}

#[test]
fn key_pair_blobs_roundtrip() -> Result<()> {
    let key = generated_key(1024);
    let params = RsaParameters::from_private_key(&key)?;
    assert_eq!(params.bit_length(), 1024);
    assert!(params.has_private_key());

    let private = params.to_private_key_blob(CALG_RSA_SIGN)?;
    assert_eq!(private.len(), 20 + 128 * 2 + 64 * 5);
    let parsed = KeyBlob::try_parse(&private, 0)?;
    assert_eq!(parsed.params, params);
    assert_eq!(parsed.bytes_consumed, private.len());
    assert_eq!(parsed.algorithm_id, CALG_RSA_SIGN);

    // a public blob embedded behind unrelated bytes
    let mut file = vec![0xAA; 7];
    file.extend(params.to_public_key_blob(CALG_RSA_KEYX));
    let public = KeyBlob::try_parse(&file, 7)?;
    assert!(!public.params.has_private_key());
    assert_eq!(public.params.modulus, params.modulus);
    assert_eq!(public.params.exponent, params.exponent);
    assert_eq!(public.algorithm_id, CALG_RSA_KEYX);
    Ok(())
}

#[test]
fn signatures_verify_with_the_generated_key() -> Result<()> {
    let key = generated_key(1024);
    let params = RsaParameters::from_private_key(&key)?;
    let public = key.to_public_key();

    let sha1 = HashAlgorithm::Sha1.digest(b"module image");
    let mut signature = sign_digest(&params, HashAlgorithm::Sha1, &sha1, &SigningConfig::default())?;
    assert_eq!(signature.len(), 128);
    signature.reverse();
    assert!(public.verify(Pkcs1v15Sign::new::<Sha1>(), &sha1, &signature).is_ok());

    let sha256 = HashAlgorithm::Sha256.digest(b"module image");
    let exponent_only = SigningConfig::default().with_backends(vec![SigningBackend::ExponentOnly]);
    let mut signature = sign_digest(&params, HashAlgorithm::Sha256, &sha256, &exponent_only)?;
    signature.reverse();
    assert!(public
        .verify(Pkcs1v15Sign::new::<Sha256>(), &sha256, &signature)
        .is_ok());
    Ok(())
}

#[test]
fn signing_rejects_bad_input() -> Result<()> {
    let key = generated_key(512);
    let params = RsaParameters::from_private_key(&key)?;

    let short = [0u8; 16];
    assert!(matches!(
        sign_digest(&params, HashAlgorithm::Sha1, &short, &SigningConfig::default()),
        Err(Error::Signing(_))
    ));

    let public_only = KeyBlob::try_parse(&params.to_public_key_blob(CALG_RSA_SIGN), 0)?.params;
    let digest = HashAlgorithm::Sha1.digest(b"data");
    assert!(matches!(
        sign_digest(&public_only, HashAlgorithm::Sha1, &digest, &SigningConfig::default()),
        Err(Error::Signing(_))
    ));

    let nothing = SigningConfig::default().with_backends(Vec::new());
    assert!(sign_digest(&params, HashAlgorithm::Sha1, &digest, &nothing).is_err());
    Ok(())
}

#[test]
fn public_key_tokens() -> Result<()> {
    assert_eq!(
        hex::encode(derive_identity_token(&ECMA_PUBLIC_KEY)),
        "b77a5c561934e089"
    );
    let ecma = StrongNamePublicKey::parse(&ECMA_PUBLIC_KEY)?;
    assert!(ecma.is_ecma_key());
    assert_eq!(ecma.rsa_parameters()?, None);

    let params = RsaParameters::from_private_key(&generated_key(512))?;
    let public_key = StrongNamePublicKey::from_params(&params).to_bytes();
    let reparsed = StrongNamePublicKey::parse(&public_key)?;
    assert_eq!(reparsed.rsa_parameters()?.map(|key| key.modulus), Some(params.modulus.clone()));

    // an assembly carrying the full key is found by a reference holding its token
    let assembly = AssemblyRow {
        hash_alg_id: 0x8004,
        major_version: 1,
        public_key: public_key.clone(),
        name: "Signed".to_string(),
        ..Default::default()
    };
    let definition = AssemblyIdentity::from_assembly(&assembly);
    let token = derive_identity_token(&public_key);
    let mut reference = AssemblyIdentity::new("signed", AssemblyVersion::parse("1.0.0.0")?);
    reference.strong_name = Some(StrongName::Token(token));

    assert!(definition.satisfies(&reference));
    assert_eq!(definition, reference);
    assert!(definition.display_name().ends_with(&hex::encode(token)));

    reference.strong_name = Some(StrongName::Token([0; 8]));
    assert!(!definition.satisfies(&reference));
    Ok(())
}
