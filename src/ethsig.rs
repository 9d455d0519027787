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

//! Ethereum-style signer for tests, mirroring what a participant's wallet
//! does off-ledger.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use soroban_sdk::{BytesN, Env};

pub struct EthSigner {
    skey: SigningKey,
    pubkey: VerifyingKey,
    addr: [u8; 20],
}

fn eth_address(key: &VerifyingKey) -> [u8; 20] {
    // Uncompressed SEC1 point; byte 0 is the 0x04 tag and not part of the key.
    let point = key.to_encoded_point(false);
    let hash: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

fn eth_signed_msg_hash(digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n32");
    hasher.update(digest);
    hasher.finalize().into()
}

impl EthSigner {
    pub fn from_hex(skey_hex: &str) -> Self {
        let bytes = hex::decode(skey_hex.trim_start_matches("0x")).unwrap();
        Self::from_key(SigningKey::from_slice(&bytes).unwrap())
    }

    pub fn from_key(skey: SigningKey) -> Self {
        let pubkey = skey.verifying_key().clone();
        let addr = eth_address(&pubkey);
        Self { skey, pubkey, addr }
    }

    pub fn address(&self, env: &Env) -> BytesN<20> {
        BytesN::from_array(env, &self.addr)
    }

    /// Signs `digest` as eth_sign would, returning `r || s || v` with `v` in {27, 28}.
    pub fn sign(&self, env: &Env, digest: &BytesN<32>) -> BytesN<65> {
        let hash = eth_signed_msg_hash(&digest.to_array());
        let sig: K256Signature = self.skey.sign_prehash(&hash).unwrap();

        let mut sig_bytes = [0u8; 65];
        sig_bytes[..64].copy_from_slice(&sig.to_bytes());
        // sign_prehash does not report the recovery id, so find the one that
        // yields our own key.
        sig_bytes[64] = self.recovery_id(&hash, &sig) + 27;
        BytesN::from_array(env, &sig_bytes)
    }

    fn recovery_id(&self, hash: &[u8; 32], sig: &K256Signature) -> u8 {
        [false, true]
            .into_iter()
            .position(|odd| {
                VerifyingKey::recover_from_prehash(hash, sig, RecoveryId::new(odd, false))
                    .map_or(false, |key| key == self.pubkey)
            })
            .expect("no recovery id matches the signing key") as u8
    }
}
