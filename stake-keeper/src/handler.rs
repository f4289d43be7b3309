//! Message handlers and the block lifecycle.
//!
//! Handlers validate everything up front and only then start writing,
//! so a failed message leaves the block write-set untouched. Block
//! boundaries reset the intra-block counter, drain matured unbonding
//! entries and drive the hourly inflation cycle.

use stake_core::msg::{MsgBeginUnbonding, MsgCreateValidator, MsgDelegate, MsgEditValidator};
use stake_core::state::tendermint::ValidatorUpdate;
use stake_core::state::{Delegation, UnbondingDelegation, Validator};
use stake_storage::StoreKV;

use crate::error::StakingError;
use crate::keeper::{Context, Keeper, SECS_PER_HOUR};

impl<'a, S: StoreKV> Keeper<'a, S> {
    /// Start a block: reset the transaction ordinal, release matured
    /// unbonding balances (the returned entries are the outer bank's
    /// to credit) and, when the block crosses an hour boundary, run a
    /// provisions cycle.
    pub fn begin_block(&mut self, ctx: &Context) -> Vec<UnbondingDelegation> {
        let mut pool = self.get_pool();
        pool.intra_tx_counter = 0;
        self.set_pool(&pool);

        let released = self.complete_unbondings(ctx.block_height);

        if ctx.block_time >= self.get_pool().inflation_last_time + SECS_PER_HOUR {
            self.process_provisions(ctx);
        }
        released
    }

    /// End a block: hand the accumulated validator-set diff to the
    /// consensus adapter and clear it.
    pub fn end_block(&mut self) -> Vec<ValidatorUpdate> {
        let updates = self.tendermint_updates();
        self.clear_tendermint_updates();
        updates
    }

    /// Declare a new validator with an initial self-delegation.
    pub fn create_validator(
        &mut self,
        ctx: &Context,
        msg: &MsgCreateValidator,
    ) -> Result<(), StakingError> {
        if msg.validator_addr.is_zero() {
            return Err(StakingError::BadValidatorAddr);
        }
        if msg.amount.is_zero() {
            return Err(StakingError::BadAmount);
        }
        msg.description
            .ensure_length()
            .map_err(|_| StakingError::DescriptionLength)?;
        if self.get_validator(&msg.validator_addr).is_some() {
            return Err(StakingError::ValidatorAlreadyExists);
        }
        // a consensus key can only back one validator
        if self.owner_by_pubkey(&msg.pub_key).is_some() {
            return Err(StakingError::ValidatorAlreadyExists);
        }
        let mut pool = self.get_pool();
        if (pool.token_supply() + msg.amount).is_err() {
            return Err(StakingError::InsufficientFunds);
        }

        let mut validator = Validator::new(
            msg.validator_addr,
            msg.pub_key.clone(),
            msg.description.clone(),
        );
        let issued = validator.add_tokens_from_del(&mut pool, msg.amount);
        self.set_pool(&pool);
        self.set_delegation(&Delegation {
            delegator_addr: msg.validator_addr,
            validator_addr: msg.validator_addr,
            shares: issued,
            height: ctx.block_height,
        });
        self.update_validator(ctx, validator);
        Ok(())
    }

    /// Replace a validator's description.
    pub fn edit_validator(
        &mut self,
        ctx: &Context,
        msg: &MsgEditValidator,
    ) -> Result<(), StakingError> {
        msg.description
            .ensure_length()
            .map_err(|_| StakingError::DescriptionLength)?;
        let mut validator = self
            .get_validator(&msg.validator_addr)
            .ok_or(StakingError::NoValidator)?;
        validator.description = msg.description.clone();
        self.update_validator(ctx, validator);
        Ok(())
    }

    /// Move tokens from the delegator into the validator's pool and
    /// credit the delegator with shares.
    pub fn delegate(&mut self, ctx: &Context, msg: &MsgDelegate) -> Result<(), StakingError> {
        if msg.delegator_addr.is_zero() {
            return Err(StakingError::BadDelegatorAddr);
        }
        if msg.amount.is_zero() {
            return Err(StakingError::BadAmount);
        }
        let mut validator = self
            .get_validator(&msg.validator_addr)
            .ok_or(StakingError::NoValidator)?;
        if validator.is_revoked() {
            return Err(StakingError::ValidatorRevoked);
        }
        let mut pool = self.get_pool();
        if (pool.token_supply() + msg.amount).is_err() {
            return Err(StakingError::InsufficientFunds);
        }

        let mut delegation = self
            .get_delegation(&msg.delegator_addr, &msg.validator_addr)
            .unwrap_or_else(|| Delegation {
                delegator_addr: msg.delegator_addr,
                validator_addr: msg.validator_addr,
                shares: stake_core::rational::Rat::zero(),
                height: ctx.block_height,
            });
        let issued = validator.add_tokens_from_del(&mut pool, msg.amount);
        delegation.shares = delegation.shares + issued;
        delegation.height = ctx.block_height;
        self.set_pool(&pool);
        self.set_delegation(&delegation);
        self.update_validator(ctx, validator);
        Ok(())
    }

    /// Burn delegation shares and hold their token value back until
    /// the unbonding period has passed.
    pub fn begin_unbonding(
        &mut self,
        ctx: &Context,
        msg: &MsgBeginUnbonding,
    ) -> Result<(), StakingError> {
        if msg.shares.is_zero() || msg.shares.is_negative() {
            return Err(StakingError::BadShares);
        }
        let mut delegation = self
            .get_delegation(&msg.delegator_addr, &msg.validator_addr)
            .ok_or(StakingError::NoDelegation)?;
        if delegation.shares < msg.shares {
            return Err(StakingError::NotEnoughShares);
        }
        let mut validator = self
            .get_validator(&msg.validator_addr)
            .ok_or(StakingError::NoValidator)?;
        let params = self.get_params();

        let mut pool = self.get_pool();
        let released = validator.remove_del_shares(&mut pool, msg.shares);
        self.set_pool(&pool);

        delegation.shares = delegation.shares - msg.shares;
        if delegation.shares.is_zero() {
            self.remove_delegation(&msg.delegator_addr, &msg.validator_addr);
        } else {
            delegation.height = ctx.block_height;
            self.set_delegation(&delegation);
        }

        let completion_height = ctx.block_height + params.unbonding_period;
        // a repeated unbond in the same block merges into one entry
        let balance = match self.get_unbonding(
            completion_height,
            &msg.delegator_addr,
            &msg.validator_addr,
        ) {
            Some(existing) => (existing.balance + released).expect("unbonding balance out of bound"),
            None => released,
        };
        self.set_unbonding(&UnbondingDelegation {
            delegator_addr: msg.delegator_addr,
            validator_addr: msg.validator_addr,
            balance,
            completion_height,
        });

        if validator.delegator_shares.is_zero() {
            // write the emptied record first so the removal path sees
            // the final share balances
            self.set_validator_record(&validator);
            self.remove_validator(&msg.validator_addr);
            // the freed slot may promote the next candidate
            self.reconcile_bonded(ctx);
        } else {
            self.update_validator(ctx, validator);
        }
        Ok(())
    }
}
