// This file is part of Opkit.
//
// Opkit is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Opkit is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Opkit.
// If not, see https://www.gnu.org/licenses/.

//! BLS12-381 signatures in the min-pk arrangement.
//!
//! Public keys are G1 points, signatures and message points G2. Verification
//! is the pairing check `e(G1, sig) == e(pk, H(msg))`; aggregation is point
//! addition on both sides.
//!
//! The onchain verifier consumes uncompressed coordinates with every 48-byte
//! field element left-zero-padded to 64 bytes, G2 coordinates with the
//! imaginary half before the real half. That matches the uncompressed
//! serialization of the underlying curve library, so encoding here is
//! pad-and-concatenate, never reordering.

use alloy_primitives::{Bytes, U256};
use bls12_381::{
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
    pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar,
};
use group::{Curve, Group};
use sha2::Sha256;

use crate::DvtError;

/// Domain separation tag for hashing proposal messages to G2, the standard
/// signature suite tag shared with the validators' signing stacks.
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

const FP_LEN: usize = 48;
const PADDED_FP_LEN: usize = 64;

/// Byte length of a public key in the verifier encoding: two padded field
/// elements.
pub const PUBLIC_KEY_ENCODED_LEN: usize = 2 * PADDED_FP_LEN;

/// Byte length of a signature in the verifier encoding: four padded field
/// elements.
pub const SIGNATURE_ENCODED_LEN: usize = 4 * PADDED_FP_LEN;

/// A validator's BLS key material: the private scalar and its G1 public key.
#[derive(Clone)]
pub struct BlsKeyMaterial {
    secret: Scalar,
    public: G1Affine,
}

impl std::fmt::Debug for BlsKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret scalar stays out of logs.
        f.debug_struct("BlsKeyMaterial").field("public", &self.public).finish()
    }
}

impl BlsKeyMaterial {
    /// Loads key material from a 32-byte little-endian scalar.
    ///
    /// Rejects non-canonical encodings and the zero scalar.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, DvtError> {
        let secret = Option::<Scalar>::from(Scalar::from_bytes(bytes)).ok_or(DvtError::InvalidKey)?;
        if secret == Scalar::from(0u64) {
            return Err(DvtError::InvalidKey);
        }
        let public = (G1Projective::generator() * secret).to_affine();
        Ok(Self { secret, public })
    }

    /// The validator's public key.
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey(self.public)
    }

    /// Signs a message: hash to G2, multiply by the secret scalar.
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        let point = hash_to_message_point(message);
        BlsSignature((point * self.secret).to_affine())
    }
}

/// A G1 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(G1Affine);

impl BlsPublicKey {
    /// Decodes an uncompressed 96-byte G1 point. Rejects points off the
    /// curve, outside the subgroup, or at infinity.
    pub fn from_uncompressed(bytes: &[u8; 96]) -> Result<Self, DvtError> {
        let point = Option::<G1Affine>::from(G1Affine::from_uncompressed(bytes))
            .ok_or(DvtError::InvalidPoint("public key"))?;
        if bool::from(point.is_identity()) {
            return Err(DvtError::InvalidPoint("public key"));
        }
        Ok(Self(point))
    }

    /// Uncompressed 96-byte serialization (x ++ y).
    pub fn to_uncompressed(&self) -> [u8; 96] {
        self.0.to_uncompressed()
    }

    /// Verifier encoding: each 48-byte field element left-padded to 64 bytes.
    pub fn encode_padded(&self) -> [u8; PUBLIC_KEY_ENCODED_LEN] {
        let raw = self.to_uncompressed();
        let mut out = [0u8; PUBLIC_KEY_ENCODED_LEN];
        pad_elements(&raw, &mut out);
        out
    }
}

/// A G2 signature or aggregate signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlsSignature(G2Affine);

impl BlsSignature {
    /// Decodes an uncompressed 192-byte G2 point.
    pub fn from_uncompressed(bytes: &[u8; 192]) -> Result<Self, DvtError> {
        let point = Option::<G2Affine>::from(G2Affine::from_uncompressed(bytes))
            .ok_or(DvtError::InvalidPoint("signature"))?;
        Ok(Self(point))
    }

    /// Uncompressed 192-byte serialization
    /// (x.c1 ++ x.c0 ++ y.c1 ++ y.c0, imaginary halves first).
    pub fn to_uncompressed(&self) -> [u8; 192] {
        self.0.to_uncompressed()
    }

    /// Verifier encoding: each 48-byte field element left-padded to 64 bytes.
    pub fn encode_padded(&self) -> [u8; SIGNATURE_ENCODED_LEN] {
        let raw = self.to_uncompressed();
        let mut out = [0u8; SIGNATURE_ENCODED_LEN];
        pad_elements(&raw, &mut out);
        out
    }
}

fn pad_elements(raw: &[u8], out: &mut [u8]) {
    for (i, element) in raw.chunks_exact(FP_LEN).enumerate() {
        let at = i * PADDED_FP_LEN + (PADDED_FP_LEN - FP_LEN);
        out[at..at + FP_LEN].copy_from_slice(element);
    }
}

fn hash_to_message_point(message: &[u8]) -> G2Projective {
    <G2Projective as HashToCurve<ExpandMsgXmd<Sha256>>>::hash_to_curve(message, BLS_DST)
}

/// Aggregates per-validator signatures over the same message into one.
pub fn aggregate_signatures(signatures: &[BlsSignature]) -> Result<BlsSignature, DvtError> {
    if signatures.is_empty() {
        return Err(DvtError::EmptyAggregate("signatures"));
    }
    let sum = signatures
        .iter()
        .fold(G2Projective::identity(), |acc, sig| acc + G2Projective::from(sig.0));
    Ok(BlsSignature(sum.to_affine()))
}

/// Aggregates the matching public keys.
pub fn aggregate_public_keys(keys: &[BlsPublicKey]) -> Result<BlsPublicKey, DvtError> {
    if keys.is_empty() {
        return Err(DvtError::EmptyAggregate("public keys"));
    }
    let sum = keys
        .iter()
        .fold(G1Projective::identity(), |acc, key| acc + G1Projective::from(key.0));
    Ok(BlsPublicKey(sum.to_affine()))
}

/// Checks `e(G1_generator, signature) == e(public_key, H(message))`.
///
/// Works for a single key and signature or for aggregates of both.
pub fn verify(public_key: &BlsPublicKey, message: &[u8], signature: &BlsSignature) -> bool {
    if bool::from(public_key.0.is_identity()) {
        return false;
    }
    let message_point = hash_to_message_point(message).to_affine();
    pairing(&G1Affine::generator(), &signature.0) == pairing(&public_key.0, &message_point)
}

/// An aggregate proof in the shape the onchain verifier consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateProof {
    /// Aggregate of the participating validators' signatures.
    pub signature: BlsSignature,
    /// Aggregate of the participating validators' public keys.
    pub public_key: BlsPublicKey,
    /// Participation bitmap: bit i set means validator i contributed.
    pub bitmap: U256,
}

impl AggregateProof {
    /// Serializes to the verifier's byte layout:
    /// padded signature ++ padded public key ++ 32-byte bitmap.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(SIGNATURE_ENCODED_LEN + PUBLIC_KEY_ENCODED_LEN + 32);
        out.extend_from_slice(&self.signature.encode_padded());
        out.extend_from_slice(&self.public_key.encode_padded());
        out.extend_from_slice(&self.bitmap.to_be_bytes::<32>());
        out.into()
    }
}

/// Deterministic key material for tests.
#[cfg(test)]
pub(crate) fn test_key(n: u64) -> BlsKeyMaterial {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&n.to_le_bytes());
    BlsKeyMaterial::from_secret_bytes(&bytes).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> BlsKeyMaterial {
        test_key(n)
    }

    #[test]
    fn test_rejects_zero_key() {
        assert!(matches!(
            BlsKeyMaterial::from_secret_bytes(&[0u8; 32]),
            Err(DvtError::InvalidKey)
        ));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let key = key(7);
        let sig = key.sign(b"slash operator 0x11");
        assert!(verify(&key.public_key(), b"slash operator 0x11", &sig));
        assert!(!verify(&key.public_key(), b"slash operator 0x22", &sig));
    }

    #[test]
    fn test_aggregate_verify() {
        let message = b"proposal 42";
        let keys: Vec<_> = (1u64..=4).map(key).collect();
        let sigs: Vec<_> = keys.iter().map(|k| k.sign(message)).collect();
        let pks: Vec<_> = keys.iter().map(|k| k.public_key()).collect();

        let agg_sig = aggregate_signatures(&sigs).unwrap();
        let agg_pk = aggregate_public_keys(&pks).unwrap();
        assert!(verify(&agg_pk, message, &agg_sig));

        // Dropping one signature from the aggregate breaks the pairing.
        let partial_sig = aggregate_signatures(&sigs[..3]).unwrap();
        assert!(!verify(&agg_pk, message, &partial_sig));

        assert_eq!(
            aggregate_signatures(&[]),
            Err(DvtError::EmptyAggregate("signatures"))
        );
    }

    #[test]
    fn test_point_serialization_round_trip() {
        let key = key(9);
        let sig = key.sign(b"round trip");
        let pk2 = BlsPublicKey::from_uncompressed(&key.public_key().to_uncompressed()).unwrap();
        let sig2 = BlsSignature::from_uncompressed(&sig.to_uncompressed()).unwrap();
        assert_eq!(pk2, key.public_key());
        assert_eq!(sig2, sig);
    }

    #[test]
    fn test_padded_encoding_layout() {
        let key = key(3);
        let sig = key.sign(b"padding");
        let proof =
            AggregateProof { signature: sig, public_key: key.public_key(), bitmap: U256::from(0b101) };
        let encoded = proof.encode();
        assert_eq!(encoded.len(), SIGNATURE_ENCODED_LEN + PUBLIC_KEY_ENCODED_LEN + 32);

        // Every 64-byte slot starts with 16 zero bytes of padding, and the
        // 48-byte field elements land unmodified after them.
        let sig_raw = sig.to_uncompressed();
        let pk_raw = key.public_key().to_uncompressed();
        for i in 0..4 {
            assert_eq!(&encoded[i * 64..i * 64 + 16], &[0u8; 16]);
            assert_eq!(&encoded[i * 64 + 16..(i + 1) * 64], &sig_raw[i * 48..(i + 1) * 48]);
        }
        for i in 0..2 {
            let at = SIGNATURE_ENCODED_LEN + i * 64;
            assert_eq!(&encoded[at..at + 16], &[0u8; 16]);
            assert_eq!(&encoded[at + 16..at + 64], &pk_raw[i * 48..(i + 1) * 48]);
        }
        assert_eq!(&encoded[encoded.len() - 32..], &U256::from(0b101).to_be_bytes::<32>());
    }
}
