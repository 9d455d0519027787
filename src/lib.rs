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

#![no_std]
extern crate alloc;

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, xdr::ToXdr, Address, Bytes,
    BytesN, Env, Symbol, Vec,
};

pub mod app;
pub mod sig;
pub mod sol;

pub use app::{app_definition_hash, AppCaller, AppDescriptor};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    StaleNonce = 1,
    WrongStatus = 2,
    BadSignature = 3,
    TurnTakerMismatch = 4,
    ApplicationRejected = 5,
    HashMismatch = 6,
    AlreadyResolved = 7,
    ChannelNotFound = 8,
    ChannelAlreadyExists = 9,
    InvalidParticipants = 10,
    ResolutionNotSet = 11,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AssetType {
    Eth = 0,
    Erc20 = 1,
    Any = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Terms {
    pub asset_type: AssetType,
    pub limit: i128,
    pub token: Address,
}

/// Final payout of a settled channel. `to` and `value` are parallel lists.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Distribution {
    pub asset_type: AssetType,
    pub token: Address,
    pub to: Vec<Address>,
    pub value: Vec<i128>,
    pub data: Bytes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Participant {
    pub addr: Address,
    pub signer: BytesN<20>,
}

/// Immutable channel configuration. Its XDR hash is the channel id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Params {
    pub owner: Address,
    pub a: Participant,
    pub b: Participant,
    pub app_definition_hash: BytesN<32>,
    pub terms_hash: BytesN<32>,
    pub default_timeout: u32,
    pub nonce: BytesN<32>,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    On,
    Dispute,
    Off,
}

/// Account behind the most recent state submission.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Submitter {
    Unset,
    Addr(Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerState {
    pub status: Status,
    pub app_state_hash: BytesN<32>,
    pub nonce: u64,
    pub dispute_nonce: u64,
    pub dispute_counter: u64,
    pub latest_submitter: Submitter,
    pub finalizes_at: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Channel {
    pub params: Params,
    pub state: LedgerState,
}

/// Arguments of [`Adjudicator::create_dispute`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisputeRequest {
    pub app: AppDescriptor,
    pub prior_state: Bytes,
    pub nonce: u64,
    pub timeout: u32,
    pub action: Bytes,
    pub prior_state_sigs: Vec<BytesN<65>>,
    pub action_sig: BytesN<65>,
    pub finalize_immediately: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Channel(BytesN<32>),
    Resolution(BytesN<32>),
}

#[contract]
pub struct Adjudicator;

const CHANNELS: Symbol = symbol_short!("CHANNELS");

// Roughly one day and thirty days of ledgers.
const TTL_THRESHOLD: u32 = 17_280;
const TTL_EXTEND_TO: u32 = 518_400;

const A: u32 = 0;

const B: u32 = 1;

#[contractimpl]
impl Adjudicator {
    pub fn open(env: Env, params: Params) -> Result<BytesN<32>, Error> {
        // checks
        params.owner.require_auth();
        if params.a.signer == params.b.signer {
            return Err(Error::InvalidParticipants);
        }
        let cid = get_channel_id(&env, &params);
        if env.storage().persistent().has(&DataKey::Channel(cid.clone())) {
            return Err(Error::ChannelAlreadyExists);
        }

        // effects
        let channel = Channel {
            params,
            state: initial_state(&env),
        };
        set_channel(&env, &cid, &channel);
        env.events()
            .publish((CHANNELS, symbol_short!("open")), (cid.clone(), channel));
        Ok(cid)
    }

    /// Replaces the channel state with one both participants signed.
    ///
    /// A `timeout` of zero finalizes the channel on the spot. Any other value
    /// only records `finalizes_at`; the channel stays `On`.
    pub fn set_state(
        env: Env,
        caller: Address,
        channel_id: BytesN<32>,
        app_state_hash: BytesN<32>,
        nonce: u64,
        timeout: u32,
        sigs: Vec<BytesN<65>>,
    ) -> Result<(), Error> {
        // checks
        caller.require_auth();
        let mut channel = get_channel(&env, &channel_id)?;
        let now = env.ledger().sequence();
        if effective_status(&channel.state, now) != Status::On {
            return Err(Error::WrongStatus);
        }
        if nonce <= channel.state.nonce {
            return Err(Error::StaleNonce);
        }
        let digest = sol::state_digest(&env, &channel.params, nonce, timeout, &app_state_hash);
        sig::verify_signers(
            &env,
            &digest,
            &sigs,
            &[&channel.params.a.signer, &channel.params.b.signer],
        )?;

        // effects
        let state = &mut channel.state;
        state.app_state_hash = app_state_hash;
        state.nonce = nonce;
        state.latest_submitter = Submitter::Addr(caller);
        if timeout == 0 {
            state.status = Status::Off;
            state.finalizes_at = now;
        } else {
            state.finalizes_at = now.saturating_add(timeout);
        }
        set_channel(&env, &channel_id, &channel);
        env.events().publish(
            (CHANNELS, symbol_short!("update")),
            (channel_id, channel.state),
        );
        Ok(())
    }

    /// Enters a dispute by advancing a jointly signed state with one action
    /// signed by its turn-taker.
    pub fn create_dispute(
        env: Env,
        caller: Address,
        channel_id: BytesN<32>,
        req: DisputeRequest,
    ) -> Result<(), Error> {
        // checks
        caller.require_auth();
        let mut channel = get_channel(&env, &channel_id)?;
        let now = env.ledger().sequence();
        if effective_status(&channel.state, now) != Status::On {
            return Err(Error::WrongStatus);
        }
        if req.nonce <= channel.state.nonce {
            return Err(Error::StaleNonce);
        }
        if app_definition_hash(&env, &req.app) != channel.params.app_definition_hash {
            return Err(Error::HashMismatch);
        }
        let prior_hash = state_hash(&env, &req.prior_state);
        let digest = sol::state_digest(&env, &channel.params, req.nonce, req.timeout, &prior_hash);
        sig::verify_signers(
            &env,
            &digest,
            &req.prior_state_sigs,
            &[&channel.params.a.signer, &channel.params.b.signer],
        )?;
        let next_state = advance(
            &env,
            &channel.params,
            &req.app,
            &req.prior_state,
            &prior_hash,
            &req.action,
            &req.action_sig,
            req.nonce,
            0,
        )?;

        // effects
        let state = &mut channel.state;
        state.status = Status::Dispute;
        state.app_state_hash = state_hash(&env, &next_state);
        state.nonce = req.nonce;
        state.latest_submitter = Submitter::Addr(caller);
        state.dispute_nonce = 0;
        state.dispute_counter += 1;
        if req.finalize_immediately {
            state.status = Status::Off;
            state.finalizes_at = now;
        } else {
            state.finalizes_at = now.saturating_add(req.timeout);
        }
        set_channel(&env, &channel_id, &channel);
        env.events().publish(
            (CHANNELS, symbol_short!("dispute")),
            (channel_id, channel.state, next_state),
        );
        Ok(())
    }

    /// Answers a running dispute with the next action on the disputed state.
    /// Each round bumps `dispute_nonce` and restarts the window with the
    /// channel's default timeout.
    pub fn progress_dispute(
        env: Env,
        caller: Address,
        channel_id: BytesN<32>,
        app: AppDescriptor,
        state: Bytes,
        action: Bytes,
        action_sig: BytesN<65>,
    ) -> Result<(), Error> {
        // checks
        caller.require_auth();
        let mut channel = get_channel(&env, &channel_id)?;
        let now = env.ledger().sequence();
        if effective_status(&channel.state, now) != Status::Dispute {
            return Err(Error::WrongStatus);
        }
        if app_definition_hash(&env, &app) != channel.params.app_definition_hash {
            return Err(Error::HashMismatch);
        }
        let current_hash = state_hash(&env, &state);
        if current_hash != channel.state.app_state_hash {
            return Err(Error::HashMismatch);
        }
        let dispute_nonce = channel.state.dispute_nonce + 1;
        let next_state = advance(
            &env,
            &channel.params,
            &app,
            &state,
            &current_hash,
            &action,
            &action_sig,
            channel.state.nonce,
            dispute_nonce,
        )?;

        // effects
        let ledger_state = &mut channel.state;
        ledger_state.app_state_hash = state_hash(&env, &next_state);
        ledger_state.dispute_nonce = dispute_nonce;
        ledger_state.latest_submitter = Submitter::Addr(caller);
        ledger_state.finalizes_at = now.saturating_add(channel.params.default_timeout);
        set_channel(&env, &channel_id, &channel);
        env.events().publish(
            (CHANNELS, symbol_short!("progress")),
            (channel_id, channel.state, next_state),
        );
        Ok(())
    }

    /// Computes and stores the payout of a settled channel. Callable by anyone,
    /// exactly once.
    pub fn set_resolution(
        env: Env,
        channel_id: BytesN<32>,
        app: AppDescriptor,
        final_state: Bytes,
        terms: Terms,
    ) -> Result<(), Error> {
        // checks
        let channel = get_channel(&env, &channel_id)?;
        let key = DataKey::Resolution(channel_id.clone());
        if env.storage().persistent().has(&key) {
            return Err(Error::AlreadyResolved);
        }
        if effective_status(&channel.state, env.ledger().sequence()) != Status::Off {
            return Err(Error::WrongStatus);
        }
        if app_definition_hash(&env, &app) != channel.params.app_definition_hash
            || get_terms_hash(&env, &terms) != channel.params.terms_hash
            || state_hash(&env, &final_state) != channel.state.app_state_hash
        {
            return Err(Error::HashMismatch);
        }
        let resolution = AppCaller::new(&env, &app).resolve(&final_state, &terms)?;

        // effects
        env.storage().persistent().set(&key, &resolution);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        env.events().publish(
            (CHANNELS, symbol_short!("resolve")),
            (channel_id, resolution),
        );
        Ok(())
    }

    pub fn get_resolution(env: Env, channel_id: BytesN<32>) -> Result<Distribution, Error> {
        get_channel(&env, &channel_id)?;
        env.storage()
            .persistent()
            .get(&DataKey::Resolution(channel_id))
            .ok_or(Error::ResolutionNotSet)
    }

    /// Ledger state with an expired dispute already reported as `Off`.
    pub fn state(env: Env, channel_id: BytesN<32>) -> Result<LedgerState, Error> {
        let mut state = get_channel(&env, &channel_id)?.state;
        state.status = effective_status(&state, env.ledger().sequence());
        Ok(state)
    }

    pub fn latest_nonce(env: Env, channel_id: BytesN<32>) -> Result<u64, Error> {
        Ok(get_channel(&env, &channel_id)?.state.nonce)
    }

    pub fn is_settled(env: Env, channel_id: BytesN<32>) -> Result<bool, Error> {
        let channel = get_channel(&env, &channel_id)?;
        Ok(effective_status(&channel.state, env.ledger().sequence()) == Status::Off)
    }

    pub fn get_channel(env: Env, channel_id: BytesN<32>) -> Result<Channel, Error> {
        get_channel(&env, &channel_id)
    }

    pub fn channel_id(env: Env, params: Params) -> BytesN<32> {
        get_channel_id(&env, &params)
    }
}

// advance authenticates `action` as the turn-taker's move on `state` and
// returns the state the application derives from it.
#[allow(clippy::too_many_arguments)]
fn advance(
    env: &Env,
    params: &Params,
    app: &AppDescriptor,
    state: &Bytes,
    state_hash: &BytesN<32>,
    action: &Bytes,
    action_sig: &BytesN<65>,
    nonce: u64,
    dispute_nonce: u64,
) -> Result<Bytes, Error> {
    let app_caller = AppCaller::new(env, app);
    // A terminal state admits no further actions.
    if app_caller.is_state_terminal(state)? {
        return Err(Error::ApplicationRejected);
    }
    let (turn_taker, other) = match app_caller.get_turn_taker(state)? {
        A => (&params.a.signer, &params.b.signer),
        B => (&params.b.signer, &params.a.signer),
        _ => return Err(Error::ApplicationRejected),
    };
    let digest = sol::action_digest(env, turn_taker, state_hash, action, nonce, dispute_nonce);
    sig::verify_turn_taker(env, &digest, action_sig, turn_taker, other)?;
    app_caller.apply_action(state, action)
}

// get_channel returns the channel with the given id from persistent storage or an error if it does not exist.
pub fn get_channel(env: &Env, id: &BytesN<32>) -> Result<Channel, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Channel(id.clone()))
        .ok_or(Error::ChannelNotFound)
}

// set_channel stores the channel under the given id and extends its lifetime.
pub fn set_channel(env: &Env, id: &BytesN<32>, channel: &Channel) {
    let key = DataKey::Channel(id.clone());
    env.storage().persistent().set(&key, channel);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn get_channel_id(env: &Env, params: &Params) -> BytesN<32> {
    let data = params.clone().to_xdr(env);
    env.crypto().sha256(&data)
}

pub fn get_terms_hash(env: &Env, terms: &Terms) -> BytesN<32> {
    env.crypto().keccak256(&terms.clone().to_xdr(env))
}

pub fn state_hash(env: &Env, state: &Bytes) -> BytesN<32> {
    env.crypto().keccak256(state)
}

// initial_state is the ledger state of a freshly opened channel, committed to the empty application state.
pub fn initial_state(env: &Env) -> LedgerState {
    LedgerState {
        status: Status::On,
        app_state_hash: state_hash(env, &Bytes::new(env)),
        nonce: 0,
        dispute_nonce: 0,
        dispute_counter: 0,
        latest_submitter: Submitter::Unset,
        finalizes_at: 0,
    }
}

/// Status as seen at ledger `now`. A dispute whose window has passed counts as
/// `Off` without anyone writing that transition.
pub fn effective_status(state: &LedgerState, now: u32) -> Status {
    match state.status {
        Status::Dispute if now >= state.finalizes_at => Status::Off,
        status => status,
    }
}

#[cfg(test)]
mod ethsig;
#[cfg(test)]
mod streaming;
