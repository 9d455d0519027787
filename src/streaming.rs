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

//! Streaming-payment application used to drive the adjudicator in tests.
//!
//! The user pays the artist `streaming_price` per stream; the artist may
//! change the price in between. Turns alternate, starting with whoever did
//! not act last.

use crate::{Distribution, Terms};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, vec,
    xdr::{FromXdr, ToXdr},
    Address, Bytes, Env,
};

pub const ARTIST: u32 = 0;
pub const USER: u32 = 1;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AppError {
    Malformed = 1,
    NotYourTurn = 2,
    InsufficientBalance = 3,
    InvalidPrice = 4,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ActionType {
    Stream = 0,
    ChangePrice = 1,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamingState {
    pub artist: Address,
    pub user: Address,
    pub streaming_price: i128,
    pub artist_balance: i128,
    pub user_balance: i128,
    pub total_transfer: i128,
    pub last_turn: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamingAction {
    pub action_type: ActionType,
    pub new_price: i128,
}

impl StreamingState {
    pub fn encode(&self, env: &Env) -> Bytes {
        self.clone().to_xdr(env)
    }

    pub fn decode(env: &Env, bytes: &Bytes) -> Result<Self, AppError> {
        Self::from_xdr(env, bytes).map_err(|_| AppError::Malformed)
    }

    fn turn_taker(&self) -> u32 {
        if self.last_turn == ARTIST {
            USER
        } else {
            ARTIST
        }
    }
}

impl StreamingAction {
    pub fn encode(&self, env: &Env) -> Bytes {
        self.clone().to_xdr(env)
    }
}

#[contract]
pub struct StreamingApp;

#[contractimpl]
impl StreamingApp {
    pub fn is_state_terminal(env: Env, state: Bytes) -> Result<bool, AppError> {
        let state = StreamingState::decode(&env, &state)?;
        Ok(state.user_balance < state.streaming_price)
    }

    pub fn get_turn_taker(env: Env, state: Bytes) -> Result<u32, AppError> {
        Ok(StreamingState::decode(&env, &state)?.turn_taker())
    }

    pub fn apply_action(env: Env, state: Bytes, action: Bytes) -> Result<Bytes, AppError> {
        let mut state = StreamingState::decode(&env, &state)?;
        let action = StreamingAction::from_xdr(&env, &action).map_err(|_| AppError::Malformed)?;
        match action.action_type {
            ActionType::Stream => {
                if state.turn_taker() != USER {
                    return Err(AppError::NotYourTurn);
                }
                if state.user_balance < state.streaming_price {
                    return Err(AppError::InsufficientBalance);
                }
                state.user_balance -= state.streaming_price;
                state.artist_balance += state.streaming_price;
                state.total_transfer += state.streaming_price;
                state.last_turn = USER;
            }
            ActionType::ChangePrice => {
                if state.turn_taker() != ARTIST {
                    return Err(AppError::NotYourTurn);
                }
                if action.new_price < 0 {
                    return Err(AppError::InvalidPrice);
                }
                state.streaming_price = action.new_price;
                state.last_turn = ARTIST;
            }
        }
        Ok(state.encode(&env))
    }

    pub fn resolve(env: Env, state: Bytes, terms: Terms) -> Result<Distribution, AppError> {
        let state = StreamingState::decode(&env, &state)?;
        Ok(Distribution {
            asset_type: terms.asset_type,
            token: terms.token,
            to: vec![&env, state.artist, state.user],
            value: vec![&env, state.artist_balance, state.user_balance],
            data: Bytes::new(&env),
        })
    }
}

pub use lopsided::LopsidedApp;

mod lopsided {
    use super::*;

    /// Streaming app whose `resolve` drops the user's payout but keeps the user
    /// as a recipient. Everything else behaves like [`StreamingApp`].
    #[contract]
    pub struct LopsidedApp;

    #[contractimpl]
    impl LopsidedApp {
        pub fn is_state_terminal(env: Env, state: Bytes) -> Result<bool, AppError> {
            StreamingApp::is_state_terminal(env, state)
        }

        pub fn get_turn_taker(env: Env, state: Bytes) -> Result<u32, AppError> {
            StreamingApp::get_turn_taker(env, state)
        }

        pub fn apply_action(env: Env, state: Bytes, action: Bytes) -> Result<Bytes, AppError> {
            StreamingApp::apply_action(env, state, action)
        }

        pub fn resolve(env: Env, state: Bytes, terms: Terms) -> Result<Distribution, AppError> {
            let mut dist = StreamingApp::resolve(env, state, terms)?;
            dist.value.pop_back();
            Ok(dist)
        }
    }
}
