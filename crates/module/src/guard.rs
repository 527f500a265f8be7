//! Owner-held pause switch.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::RegistrarError;
use registrar_types::Address;

/// Pause guard attached to a component. The owner is fixed at genesis.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PauseGuard {
    owner: Address,
    paused: bool,
}

impl PauseGuard {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `EnforcedPause` while paused.
    pub fn ensure_not_paused(&self) -> Result<(), RegistrarError> {
        if self.paused {
            return Err(RegistrarError::EnforcedPause);
        }
        Ok(())
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), RegistrarError> {
        if *caller != self.owner {
            return Err(RegistrarError::UnauthorizedAccount);
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> Result<(), RegistrarError> {
        self.ensure_owner(caller)?;
        self.ensure_not_paused()?;
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), RegistrarError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(RegistrarError::ExpectedPause);
        }
        self.paused = false;
        Ok(())
    }
}
