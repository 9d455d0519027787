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

//! Solidity-compatible digests that participants sign off-ledger.
//!
//! Both digests are `keccak256(abi.encodePacked(...))` and start with the
//! `0x19` byte so they can never collide with an RLP-encoded transaction.

use crate::Params;
use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::{keccak256, Address, Bytes as PrimBytes, FixedBytes, U256};
use alloy_sol_types::sol;
use alloy_sol_types::SolValue;
use soroban_sdk::{Bytes, BytesN, Env};

const DOMAIN_PREFIX: [u8; 1] = [0x19];

sol! {
    struct StateDigestSol {
        bytes1 prefix;
        address[] participants;
        uint256 nonce;
        uint256 timeout;
        bytes32 appStateHash;
    }

    struct ActionDigestSol {
        bytes1 prefix;
        address turnTaker;
        bytes32 prevStateHash;
        bytes action;
        uint256 nonce;
        uint256 disputeNonce;
    }
}

// convert_signer converts a 20 byte signer address into an alloy Address.
pub fn convert_signer(signer: &BytesN<20>) -> Address {
    Address::from_slice(&signer.to_array())
}

// convert_bytes copies soroban Bytes onto the heap as alloy Bytes.
pub fn convert_bytes(bytes: &Bytes) -> PrimBytes {
    let mut buf: Vec<u8> = vec![0u8; bytes.len() as usize];
    bytes.copy_into_slice(&mut buf);
    PrimBytes::from(buf)
}

fn to_bytes_n(e: &Env, hash: FixedBytes<32>) -> BytesN<32> {
    let hasharray: [u8; 32] = hash.into();
    BytesN::from_array(e, &hasharray)
}

/// Digest both participants sign to agree on `app_state_hash` at `nonce`.
///
/// Participants are packed in channel order (`a`, then `b`), which is also the
/// order of the signature slots checked by [`crate::sig::verify_signers`].
pub fn state_digest(
    e: &Env,
    params: &Params,
    nonce: u64,
    timeout: u32,
    app_state_hash: &BytesN<32>,
) -> BytesN<32> {
    let digest_sol = StateDigestSol {
        prefix: FixedBytes(DOMAIN_PREFIX),
        participants: vec![
            convert_signer(&params.a.signer),
            convert_signer(&params.b.signer),
        ],
        nonce: U256::from(nonce),
        timeout: U256::from(timeout),
        appStateHash: FixedBytes(app_state_hash.to_array()),
    };
    to_bytes_n(e, keccak256(digest_sol.abi_encode_packed()))
}

/// Digest the turn-taker alone signs to advance `prev_state_hash` by `action`.
pub fn action_digest(
    e: &Env,
    turn_taker: &BytesN<20>,
    prev_state_hash: &BytesN<32>,
    action: &Bytes,
    nonce: u64,
    dispute_nonce: u64,
) -> BytesN<32> {
    let digest_sol = ActionDigestSol {
        prefix: FixedBytes(DOMAIN_PREFIX),
        turnTaker: convert_signer(turn_taker),
        prevStateHash: FixedBytes(prev_state_hash.to_array()),
        action: convert_bytes(action),
        nonce: U256::from(nonce),
        disputeNonce: U256::from(dispute_nonce),
    };
    to_bytes_n(e, keccak256(digest_sol.abi_encode_packed()))
}
