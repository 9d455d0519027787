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

//! Calls into the application contract a channel is bound to.
//!
//! The adjudicator never decodes application state. It forwards opaque bytes
//! to the four functions named in the channel's [`AppDescriptor`] and only
//! checks what comes back against its own hash commitments.

use crate::{Distribution, Error, Terms};
use soroban_sdk::{
    contracttype, log, vec, xdr::ToXdr, Address, Bytes, BytesN, Env, IntoVal, Symbol, TryFromVal,
    Val, Vec,
};

/// Location of an application contract plus the names of its four functions.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppDescriptor {
    pub addr: Address,
    pub is_state_terminal: Symbol,
    pub get_turn_taker: Symbol,
    pub resolve: Symbol,
    pub apply_action: Symbol,
}

// app_definition_hash is the commitment a channel stores for its application.
pub fn app_definition_hash(env: &Env, app: &AppDescriptor) -> BytesN<32> {
    env.crypto().keccak256(&app.clone().to_xdr(env))
}

/// Single indirection point for application calls. Every failure of the
/// callee, a missing function or an undecodable return value included, comes
/// back as [`Error::ApplicationRejected`].
pub struct AppCaller<'a> {
    env: &'a Env,
    app: &'a AppDescriptor,
}

impl<'a> AppCaller<'a> {
    pub fn new(env: &'a Env, app: &'a AppDescriptor) -> Self {
        Self { env, app }
    }

    fn call<T: TryFromVal<Env, Val>>(&self, func: &Symbol, args: Vec<Val>) -> Result<T, Error> {
        match self
            .env
            .try_invoke_contract::<T, Error>(&self.app.addr, func, args)
        {
            Ok(Ok(ret)) => Ok(ret),
            _ => {
                log!(self.env, "application call failed", self.app.addr.clone(), func.clone());
                Err(Error::ApplicationRejected)
            }
        }
    }

    /// Index of the participant allowed to act on `state`.
    pub fn get_turn_taker(&self, state: &Bytes) -> Result<u32, Error> {
        self.call(
            &self.app.get_turn_taker,
            vec![self.env, state.into_val(self.env)],
        )
    }

    pub fn is_state_terminal(&self, state: &Bytes) -> Result<bool, Error> {
        self.call(
            &self.app.is_state_terminal,
            vec![self.env, state.into_val(self.env)],
        )
    }

    pub fn apply_action(&self, state: &Bytes, action: &Bytes) -> Result<Bytes, Error> {
        self.call(
            &self.app.apply_action,
            vec![
                self.env,
                state.into_val(self.env),
                action.into_val(self.env),
            ],
        )
    }

    pub fn resolve(&self, state: &Bytes, terms: &Terms) -> Result<Distribution, Error> {
        let dist: Distribution = self.call(
            &self.app.resolve,
            vec![
                self.env,
                state.into_val(self.env),
                terms.into_val(self.env),
            ],
        )?;
        // Recipient and amount lists are parallel.
        if dist.to.len() != dist.value.len() {
            return Err(Error::ApplicationRejected);
        }
        Ok(dist)
    }
}
