// Copyright 2025 - See NOTICE file for copyright holders.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Error;
use soroban_sdk::{Bytes, BytesN, Env, Vec};

const ETH_SIGNED_MSG_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

// Order n of the secp256k1 group, big-endian.
const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

// Floor of n / 2, the largest `s` a canonical (low-s) signature may carry.
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

// is_canonical accepts 0 < r < n and 0 < s <= n / 2; the host traps on anything else.
fn is_canonical(rs: &[u8; 64]) -> bool {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&rs[..32]);
    s.copy_from_slice(&rs[32..]);
    r != [0u8; 32] && r < CURVE_ORDER && s != [0u8; 32] && s <= HALF_CURVE_ORDER
}

// eth_signed_msg_hash wraps a 32 byte digest the way eth_sign does before signing.
pub fn eth_signed_msg_hash(env: &Env, digest: &BytesN<32>) -> BytesN<32> {
    let mut msg = Bytes::from_slice(env, ETH_SIGNED_MSG_PREFIX);
    msg.append(&Bytes::from(digest.clone()));
    env.crypto().keccak256(&msg)
}

// signer_from_pubkey derives the 20 byte address of an uncompressed secp256k1 key.
pub fn signer_from_pubkey(env: &Env, pubkey: &BytesN<65>) -> BytesN<20> {
    // The first byte is the 0x04 tag of the uncompressed encoding.
    let key = Bytes::from(pubkey.clone()).slice(1..);
    let hash = Bytes::from(env.crypto().keccak256(&key));
    let mut addr = [0u8; 20];
    hash.slice(12..).copy_into_slice(&mut addr);
    BytesN::from_array(env, &addr)
}

/// Recovers the signer address of a 65 byte `r || s || v` signature over `digest`.
pub fn recover_signer(
    env: &Env,
    digest: &BytesN<32>,
    sig: &BytesN<65>,
) -> Result<BytesN<20>, Error> {
    let recovery_id: u32 = match sig.get(64) {
        Some(v @ 27..=28) => (v - 27) as u32,
        Some(v @ 0..=1) => v as u32,
        _ => return Err(Error::BadSignature),
    };
    let mut rs = [0u8; 64];
    Bytes::from(sig.clone())
        .slice(..64)
        .copy_into_slice(&mut rs);
    if !is_canonical(&rs) {
        return Err(Error::BadSignature);
    }
    let msg_digest = eth_signed_msg_hash(env, digest);
    let pubkey = env
        .crypto()
        .secp256k1_recover(&msg_digest, &BytesN::from_array(env, &rs), recovery_id);
    Ok(signer_from_pubkey(env, &pubkey))
}

/// Checks that `sigs` holds exactly one signature per required signer, in
/// slot order, each recovering to its signer.
pub fn verify_signers(
    env: &Env,
    digest: &BytesN<32>,
    sigs: &Vec<BytesN<65>>,
    required: &[&BytesN<20>],
) -> Result<(), Error> {
    if sigs.len() as usize != required.len() {
        return Err(Error::BadSignature);
    }
    for (sig, expected) in sigs.iter().zip(required.iter()) {
        if recover_signer(env, digest, &sig)? != **expected {
            return Err(Error::BadSignature);
        }
    }
    Ok(())
}

/// Checks a single-signer action signature against the turn-taker. A valid
/// signature by `other` is a turn violation rather than a forgery.
pub fn verify_turn_taker(
    env: &Env,
    digest: &BytesN<32>,
    sig: &BytesN<65>,
    turn_taker: &BytesN<20>,
    other: &BytesN<20>,
) -> Result<(), Error> {
    let recovered = recover_signer(env, digest, sig)?;
    if recovered == *turn_taker {
        Ok(())
    } else if recovered == *other {
        Err(Error::TurnTakerMismatch)
    } else {
        Err(Error::BadSignature)
    }
}
