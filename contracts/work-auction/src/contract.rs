use commons::CustomContractError;
use concordium_std::*;

use crate::auction::{deadline, AuctionEntry, AuctionId, AuctionResult, Bid, WorkRequest};
use crate::events::WorkAuctionEvent;
use crate::external::*;
use crate::ledger::UserBalanceEntry;
use crate::state::State;

/// Initialize the contract with an empty registry and ledger. The init origin
/// becomes the administrator.
///
/// It rejects if:
/// - Fails to parse `AuctionSettings` parameter;
/// - Auction duration is zero.
#[init(contract = "WorkAuction", parameter = "AuctionSettings")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let settings =
        AuctionSettings::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    ensure!(
        settings.is_valid(),
        CustomContractError::InvalidDuration.into()
    );

    Ok(State::new(
        state_builder,
        Address::Account(ctx.init_origin()),
        settings,
    ))
}

/// Principals holding balances. Only accounts can receive withdrawals.
fn sender_account(ctx: &impl HasReceiveContext) -> Result<AccountAddress, CustomContractError> {
    match ctx.sender() {
        Address::Account(account) => Ok(account),
        Address::Contract(_) => Err(CustomContractError::OnlyAccountAddress),
    }
}

/// Credit the attached CCD to the available balance of the sender.
///
/// It rejects if:
/// - Sender is a contract;
/// - No CCD is attached.
#[receive(
    mutable,
    payable,
    contract = "WorkAuction",
    name = "deposit",
    enable_logger
)]
fn deposit<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let principal = sender_account(ctx)?;

    host.state_mut().ledger.deposit(principal, amount)?;

    logger.log(&WorkAuctionEvent::deposit(&principal, amount))?;

    Ok(())
}

/// Transfer available funds back to the sender.
///
/// It rejects if:
/// - Sender is a contract;
/// - Fails to parse `WithdrawParams` parameter;
/// - Amount is zero or exceeds the available balance;
/// - The transfer fails.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "withdraw",
    parameter = "WithdrawParams",
    enable_logger
)]
fn withdraw<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let principal = sender_account(ctx)?;
    let params =
        WithdrawParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    host.state_mut().ledger.withdraw(principal, params.amount)?;

    logger.log(&WorkAuctionEvent::withdraw(&principal, params.amount))?;

    // A failed transfer rejects the call, reverting the debit
    host.invoke_transfer(&principal, params.amount)
        .map_err(CustomContractError::from)?;

    Ok(())
}

/// Open a new work request, locking `max_price` of the sender's available
/// balance until the auction is settled.
///
/// It rejects if:
/// - Sender is a contract;
/// - Fails to parse `CreateParams` parameter;
/// - Available balance is lower than `max_price`.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "create",
    parameter = "CreateParams",
    return_value = "AuctionId",
    enable_logger
)]
fn create<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<AuctionId> {
    let requester = sender_account(ctx)?;
    let params =
        CreateParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    let slot_time = ctx.metadata().slot_time();

    let state = host.state_mut();
    let id = state.create(requester, params.max_price, slot_time)?;

    logger.log(&WorkAuctionEvent::new_request(
        id,
        &requester,
        params.max_price,
        deadline(slot_time, state.settings.auction_duration),
    ))?;

    Ok(id)
}

/// Bid on a running auction. Bidders do not lock any funds.
///
/// It rejects if:
/// - Sender is a contract;
/// - Fails to parse `BidParams` parameter;
/// - Auction does not exist;
/// - Auction is finalized or past its deadline;
/// - Price exceeds the requested maximum price.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "bid",
    parameter = "BidParams",
    enable_logger
)]
fn bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let bidder = sender_account(ctx)?;
    let params =
        BidParams::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    host.state_mut()
        .bid(params.id, bidder, params.price, ctx.metadata().slot_time())?;

    logger.log(&WorkAuctionEvent::new_bid(params.id, &bidder, params.price))?;

    Ok(())
}

/// Finalize the auction once its deadline has passed. Anyone can call it.
///
/// It rejects if:
/// - Fails to parse `AuctionId` parameter;
/// - Auction does not exist;
/// - Auction was already finalized;
/// - Deadline has not passed yet.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "finalize",
    parameter = "AuctionId",
    enable_logger
)]
fn finalize<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    let outcome = host
        .state_mut()
        .finalize(id, ctx.metadata().slot_time())?;

    match outcome {
        AuctionResult::Winner(winner) => {
            logger.log(&WorkAuctionEvent::bid_won(id, &winner.bidder, winner.price))?;
        }
        AuctionResult::Refund { requester, amount } => {
            logger.log(&WorkAuctionEvent::auction_failed(id, &requester, amount))?;
        }
    }

    Ok(())
}

/// Attest that the winning worker completed the request. Pays the worker and
/// refunds the requester the difference to the maximum price.
///
/// It rejects if:
/// - Sender is not the administrator;
/// - Fails to parse `AuctionId` parameter;
/// - Auction does not exist;
/// - Auction is not waiting for a commit.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "commit",
    parameter = "AuctionId",
    enable_logger
)]
fn commit<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    host.state().authority.ensure_admin(&ctx.sender())?;

    let id = AuctionId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    let payout = host.state_mut().commit(id)?;

    logger.log(&WorkAuctionEvent::request_completed(id, &payout))?;

    Ok(())
}

/// Update the auction duration. Applies to running auctions as well.
///
/// It rejects if:
/// - Sender is not the administrator;
/// - Fails to parse `AuctionSettings` parameter;
/// - Auction duration is zero.
#[receive(
    mutable,
    contract = "WorkAuction",
    name = "updateSettings",
    parameter = "AuctionSettings",
    enable_logger
)]
fn update_settings<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let state = host.state_mut();
    state.authority.ensure_admin(&ctx.sender())?;

    let settings =
        AuctionSettings::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;

    state.update_settings(settings)?;

    logger.log(&WorkAuctionEvent::SettingsUpdated(&settings))?;

    Ok(())
}

#[receive(
    contract = "WorkAuction",
    name = "getWorkRequest",
    parameter = "AuctionId",
    return_value = "WorkRequest"
)]
fn get_work_request<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<WorkRequest> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    let entry = host.state().auction(id)?;
    Ok(*entry.work_request())
}

/// Balance of the given account. Unknown accounts have a zero balance.
#[receive(
    contract = "WorkAuction",
    name = "getBalance",
    parameter = "AccountAddress",
    return_value = "UserBalanceEntry"
)]
fn get_balance<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<UserBalanceEntry> {
    let principal =
        AccountAddress::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    Ok(host.state().ledger.balance(&principal))
}

/// Bids of the auction in submission order.
#[receive(
    contract = "WorkAuction",
    name = "getBids",
    parameter = "AuctionId",
    return_value = "Vec<Bid>"
)]
fn get_bids<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<Bid>> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    let entry = host.state().auction(id)?;
    Ok(entry.bids().to_vec())
}

#[receive(
    contract = "WorkAuction",
    name = "getAuction",
    parameter = "AuctionId",
    return_value = "AuctionEntry"
)]
fn get_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionEntry> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor()).map_err(CustomContractError::from)?;
    Ok(host.state().auction(id)?)
}

/// Auctions in the requested order.
///
/// It rejects if any of the ids is unknown.
#[receive(
    contract = "WorkAuction",
    name = "getBatchAuction",
    parameter = "Vec<AuctionId>",
    return_value = "Vec<AuctionEntry>"
)]
fn get_batch_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<AuctionEntry>> {
    let ids = Vec::<AuctionId>::deserial(&mut ctx.parameter_cursor())
        .map_err(CustomContractError::from)?;
    Ok(host.state().auction_batch(&ids)?)
}

#[receive(
    contract = "WorkAuction",
    name = "getSettings",
    return_value = "AuctionSettings"
)]
fn get_settings<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionSettings> {
    Ok(host.state().settings)
}

/// Number of auctions created so far, which is also the next auction id.
#[receive(contract = "WorkAuction", name = "getCount", return_value = "u64")]
fn get_count<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<u64> {
    Ok(host.state().count())
}

#[receive(contract = "WorkAuction", name = "viewAdmin", return_value = "Address")]
fn view_admin<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Address> {
    Ok(host.state().authority.admin())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::auction::AuctionStatus;
    use test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const REQUESTER: AccountAddress = AccountAddress([16; 32]);
    const WORKER_A: AccountAddress = AccountAddress([17; 32]);
    const WORKER_B: AccountAddress = AccountAddress([18; 32]);
    const CONTRACT: ContractAddress = ContractAddress {
        index: 16,
        subindex: 0,
    };

    const START: u64 = 10_000;
    const DURATION: u64 = 1_000;
    const AFTER_DEADLINE: u64 = START + DURATION + 1;

    type Host = TestHost<State<TestStateApi>>;

    fn ccd(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn balance(available: u64, locked: u64) -> UserBalanceEntry {
        UserBalanceEntry {
            available: ccd(available),
            locked: ccd(locked),
        }
    }

    fn new_host() -> Host {
        let mut ctx = TestInitContext::empty();
        let params = AuctionSettings {
            auction_duration: Duration::from_millis(DURATION),
        };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let state =
            init(&ctx, &mut state_builder).expect_report("Failed during init_WorkAuction");

        TestHost::new(state, state_builder)
    }

    fn receive_ctx(sender: Address, parameter: &[u8], slot_time: u64) -> TestReceiveContext {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_parameter(parameter)
            .set_metadata_slot_time(Timestamp::from_timestamp_millis(slot_time));
        ctx
    }

    fn call_deposit(
        host: &mut Host,
        principal: AccountAddress,
        amount: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let ctx = receive_ctx(Address::Account(principal), &[], START);
        deposit(&ctx, host, ccd(amount), logger)
    }

    fn call_withdraw(
        host: &mut Host,
        principal: AccountAddress,
        amount: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&WithdrawParams {
            amount: ccd(amount),
        });
        let ctx = receive_ctx(Address::Account(principal), &bytes, START);
        withdraw(&ctx, host, logger)
    }

    fn call_create(
        host: &mut Host,
        requester: AccountAddress,
        max_price: u64,
        slot_time: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<AuctionId> {
        let bytes = to_bytes(&CreateParams {
            max_price: ccd(max_price),
        });
        let ctx = receive_ctx(Address::Account(requester), &bytes, slot_time);
        create(&ctx, host, logger)
    }

    fn call_bid(
        host: &mut Host,
        bidder: AccountAddress,
        id: AuctionId,
        price: u64,
        slot_time: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&BidParams {
            id,
            price: ccd(price),
        });
        let ctx = receive_ctx(Address::Account(bidder), &bytes, slot_time);
        bid(&ctx, host, logger)
    }

    fn call_finalize(
        host: &mut Host,
        caller: AccountAddress,
        id: AuctionId,
        slot_time: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&id);
        let ctx = receive_ctx(Address::Account(caller), &bytes, slot_time);
        finalize(&ctx, host, logger)
    }

    fn call_commit(
        host: &mut Host,
        sender: AccountAddress,
        id: AuctionId,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&id);
        let ctx = receive_ctx(Address::Account(sender), &bytes, AFTER_DEADLINE);
        commit(&ctx, host, logger)
    }

    fn call_update_settings(
        host: &mut Host,
        sender: AccountAddress,
        duration_millis: u64,
        logger: &mut TestLogger,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&AuctionSettings {
            auction_duration: Duration::from_millis(duration_millis),
        });
        let ctx = receive_ctx(Address::Account(sender), &bytes, START);
        update_settings(&ctx, host, logger)
    }

    fn query_balance(host: &Host, principal: AccountAddress) -> UserBalanceEntry {
        let bytes = to_bytes(&principal);
        let ctx = receive_ctx(Address::Account(principal), &bytes, START);
        get_balance(&ctx, host).expect_report("Failed to call getBalance")
    }

    fn query_auction(host: &Host, id: AuctionId) -> ReceiveResult<AuctionEntry> {
        let bytes = to_bytes(&id);
        let ctx = receive_ctx(Address::Account(ADMIN), &bytes, START);
        get_auction(&ctx, host)
    }

    fn query_count(host: &Host) -> u64 {
        let ctx = receive_ctx(Address::Account(ADMIN), &[], START);
        get_count(&ctx, host).expect_report("Failed to call getCount")
    }

    /// Host with `REQUESTER` holding 100 available and a running auction with `max_price` 40.
    fn host_with_auction(logger: &mut TestLogger) -> Host {
        let mut host = new_host();
        claim_eq!(call_deposit(&mut host, REQUESTER, 100, logger), Ok(()));
        claim_eq!(call_create(&mut host, REQUESTER, 40, START, logger), Ok(0));
        host
    }

    #[concordium_test]
    fn test_init() {
        let host = new_host();
        let ctx = receive_ctx(Address::Account(REQUESTER), &[], START);

        claim_eq!(
            get_settings(&ctx, &host),
            Ok(AuctionSettings {
                auction_duration: Duration::from_millis(DURATION),
            })
        );
        claim_eq!(view_admin(&ctx, &host), Ok(Address::Account(ADMIN)));
        claim_eq!(query_count(&host), 0);
        claim_eq!(query_balance(&host, REQUESTER), UserBalanceEntry::zero());
    }

    #[concordium_test]
    fn test_init_zero_duration() {
        let mut ctx = TestInitContext::empty();
        let bytes = to_bytes(&AuctionSettings {
            auction_duration: Duration::from_millis(0),
        });
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let result = init(&ctx, &mut state_builder);
        claim!(result.is_err());
    }

    #[concordium_test]
    fn test_deposit_and_withdraw() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        claim_eq!(call_deposit(&mut host, REQUESTER, 100, &mut logger), Ok(()));
        claim_eq!(query_balance(&host, REQUESTER), balance(100, 0));

        claim_eq!(
            call_deposit(&mut host, REQUESTER, 0, &mut logger),
            Err(CustomContractError::InvalidDeposit.into())
        );

        host.set_self_balance(ccd(100));
        claim_eq!(
            call_withdraw(&mut host, REQUESTER, 101, &mut logger),
            Err(CustomContractError::InvalidWithdrawal.into())
        );
        claim_eq!(
            call_withdraw(&mut host, REQUESTER, 0, &mut logger),
            Err(CustomContractError::InvalidWithdrawal.into())
        );
        claim_eq!(query_balance(&host, REQUESTER), balance(100, 0));

        claim_eq!(call_withdraw(&mut host, REQUESTER, 30, &mut logger), Ok(()));
        claim!(host.transfer_occurred(&REQUESTER, ccd(30)));
        claim_eq!(query_balance(&host, REQUESTER), balance(70, 0));

        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&WorkAuctionEvent::deposit(&REQUESTER, ccd(100))),
                to_bytes(&WorkAuctionEvent::withdraw(&REQUESTER, ccd(30))),
            ]
        );
    }

    #[concordium_test]
    fn test_contract_principals_rejected() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let ctx = receive_ctx(Address::Contract(CONTRACT), &[], START);
        claim_eq!(
            deposit(&ctx, &mut host, ccd(10), &mut logger),
            Err(CustomContractError::OnlyAccountAddress.into())
        );

        let bytes = to_bytes(&CreateParams { max_price: ccd(0) });
        let ctx = receive_ctx(Address::Contract(CONTRACT), &bytes, START);
        claim_eq!(
            create(&ctx, &mut host, &mut logger),
            Err(CustomContractError::OnlyAccountAddress.into())
        );
        claim_eq!(query_count(&host), 0);
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_create() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        claim_eq!(call_deposit(&mut host, REQUESTER, 100, &mut logger), Ok(()));

        claim_eq!(
            call_create(&mut host, REQUESTER, 101, START, &mut logger),
            Err(CustomContractError::InsufficientFunds.into())
        );
        claim_eq!(query_count(&host), 0);
        claim_eq!(query_balance(&host, REQUESTER), balance(100, 0));

        claim_eq!(
            call_create(&mut host, REQUESTER, 40, START, &mut logger),
            Ok(0)
        );
        claim_eq!(query_count(&host), 1);
        claim_eq!(
            call_create(&mut host, REQUESTER, 60, START + 5, &mut logger),
            Ok(1)
        );
        claim_eq!(query_count(&host), 2);
        claim_eq!(query_balance(&host, REQUESTER), balance(0, 100));

        let bytes = to_bytes(&1u64);
        let ctx = receive_ctx(Address::Account(WORKER_A), &bytes, START);
        claim_eq!(
            get_work_request(&ctx, &host),
            Ok(WorkRequest {
                requester: REQUESTER,
                submission_time: Timestamp::from_timestamp_millis(START + 5),
                max_price: ccd(60),
            })
        );

        claim_eq!(
            logger.logs.last(),
            Some(&to_bytes(&WorkAuctionEvent::new_request(
                1,
                &REQUESTER,
                ccd(60),
                Timestamp::from_timestamp_millis(START + 5 + DURATION),
            )))
        );
    }

    #[concordium_test]
    fn test_scenario_no_bids() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);
        claim_eq!(query_balance(&host, REQUESTER), balance(60, 40));

        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, START + DURATION, &mut logger),
            Err(CustomContractError::AuctionStillOpen.into())
        );

        // Finalization is open to anyone
        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, AFTER_DEADLINE, &mut logger),
            Ok(())
        );
        claim_eq!(query_balance(&host, REQUESTER), balance(100, 0));

        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(entry.status(), AuctionStatus::NoWinner);
        claim_eq!(entry.winner(), None);

        claim_eq!(
            logger.logs.last(),
            Some(&to_bytes(&WorkAuctionEvent::auction_failed(
                0,
                &REQUESTER,
                ccd(40)
            )))
        );

        claim_eq!(
            call_commit(&mut host, ADMIN, 0, &mut logger),
            Err(CustomContractError::InvalidCommitState.into())
        );
    }

    #[concordium_test]
    fn test_scenario_settlement() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);

        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 30, START + 1, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_B, 0, 20, START + 2, &mut logger),
            Ok(())
        );
        // Bidders do not lock anything
        claim_eq!(query_balance(&host, WORKER_A), UserBalanceEntry::zero());
        claim_eq!(query_balance(&host, REQUESTER), balance(60, 40));

        claim_eq!(
            call_finalize(&mut host, REQUESTER, 0, AFTER_DEADLINE, &mut logger),
            Ok(())
        );
        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(entry.status(), AuctionStatus::WaitCommit);
        claim_eq!(
            entry.winner(),
            Some(&Bid {
                bidder: WORKER_B,
                price: ccd(20),
            })
        );
        // Funds stay locked until commit
        claim_eq!(query_balance(&host, REQUESTER), balance(60, 40));
        claim_eq!(query_balance(&host, WORKER_B), UserBalanceEntry::zero());

        claim_eq!(call_commit(&mut host, ADMIN, 0, &mut logger), Ok(()));
        claim_eq!(query_balance(&host, WORKER_B), balance(20, 0));
        claim_eq!(query_balance(&host, WORKER_A), UserBalanceEntry::zero());
        claim_eq!(query_balance(&host, REQUESTER), balance(80, 0));

        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(entry.status(), AuctionStatus::ReceivedCommit);

        claim_eq!(
            &logger.logs[2..],
            &[
                to_bytes(&WorkAuctionEvent::new_bid(0, &WORKER_A, ccd(30))),
                to_bytes(&WorkAuctionEvent::new_bid(0, &WORKER_B, ccd(20))),
                to_bytes(&WorkAuctionEvent::bid_won(0, &WORKER_B, ccd(20))),
                to_bytes(&WorkAuctionEvent::request_completed(
                    0,
                    &crate::auction::Payout {
                        requester: REQUESTER,
                        worker: WORKER_B,
                        max_price: ccd(40),
                        price: ccd(20),
                        refund: ccd(20),
                    }
                )),
            ][..]
        );

        // Commit is one-shot
        claim_eq!(
            call_commit(&mut host, ADMIN, 0, &mut logger),
            Err(CustomContractError::InvalidCommitState.into())
        );
        claim_eq!(query_balance(&host, WORKER_B), balance(20, 0));
        claim_eq!(query_balance(&host, REQUESTER), balance(80, 0));

        // Paid out funds can leave the contract
        host.set_self_balance(ccd(100));
        claim_eq!(call_withdraw(&mut host, WORKER_B, 20, &mut logger), Ok(()));
        claim!(host.transfer_occurred(&WORKER_B, ccd(20)));
    }

    #[concordium_test]
    fn test_scenario_tie() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);

        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 25, START + 1, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_B, 0, 25, START + 1, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_finalize(&mut host, WORKER_B, 0, AFTER_DEADLINE, &mut logger),
            Ok(())
        );

        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(
            entry.winner(),
            Some(&Bid {
                bidder: WORKER_A,
                price: ccd(25),
            })
        );
    }

    #[concordium_test]
    fn test_scenario_rejections() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);

        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 10, AFTER_DEADLINE, &mut logger),
            Err(CustomContractError::AuctionClosed.into())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 41, START + 1, &mut logger),
            Err(CustomContractError::BidTooExpensive.into())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_A, 1, 10, START + 1, &mut logger),
            Err(CustomContractError::NotFound.into())
        );

        let bytes = to_bytes(&0u64);
        let ctx = receive_ctx(Address::Account(WORKER_A), &bytes, START);
        claim_eq!(get_bids(&ctx, &host), Ok(Vec::new()));

        host.set_self_balance(ccd(100));
        claim_eq!(
            call_withdraw(&mut host, REQUESTER, 61, &mut logger),
            Err(CustomContractError::InvalidWithdrawal.into())
        );

        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 10, START + 1, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, AFTER_DEADLINE, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_commit(&mut host, REQUESTER, 0, &mut logger),
            Err(CustomContractError::Unauthorized.into())
        );
        claim_eq!(
            call_commit(&mut host, WORKER_A, 0, &mut logger),
            Err(CustomContractError::Unauthorized.into())
        );
        claim_eq!(
            call_commit(&mut host, ADMIN, 1, &mut logger),
            Err(CustomContractError::NotFound.into())
        );
        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(entry.status(), AuctionStatus::WaitCommit);
        claim_eq!(query_balance(&host, WORKER_A), UserBalanceEntry::zero());
    }

    #[concordium_test]
    fn test_finalize_is_not_repeatable() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);

        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, AFTER_DEADLINE, &mut logger),
            Ok(())
        );
        let logged = logger.logs.len();

        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, AFTER_DEADLINE + 1, &mut logger),
            Err(CustomContractError::AlreadyFinalized.into())
        );
        claim_eq!(
            call_finalize(&mut host, WORKER_A, 1, AFTER_DEADLINE, &mut logger),
            Err(CustomContractError::NotFound.into())
        );
        // Refund happens only once
        claim_eq!(query_balance(&host, REQUESTER), balance(100, 0));
        claim_eq!(logger.logs.len(), logged);
    }

    #[concordium_test]
    fn test_settings_apply_to_running_auctions() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);

        claim_eq!(
            call_update_settings(&mut host, REQUESTER, DURATION * 5, &mut logger),
            Err(CustomContractError::Unauthorized.into())
        );
        claim_eq!(
            call_update_settings(&mut host, ADMIN, 0, &mut logger),
            Err(CustomContractError::InvalidDuration.into())
        );
        claim_eq!(
            call_update_settings(&mut host, ADMIN, DURATION * 5, &mut logger),
            Ok(())
        );
        claim_eq!(
            logger.logs.last(),
            Some(&to_bytes(&WorkAuctionEvent::SettingsUpdated(
                &AuctionSettings {
                    auction_duration: Duration::from_millis(DURATION * 5),
                }
            )))
        );

        // Past the deadline announced on creation, but within the new duration
        let slot_time = START + DURATION * 2;
        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, slot_time, &mut logger),
            Err(CustomContractError::AuctionStillOpen.into())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_A, 0, 15, slot_time, &mut logger),
            Ok(())
        );

        // Shortening closes the auction early
        claim_eq!(
            call_update_settings(&mut host, ADMIN, DURATION, &mut logger),
            Ok(())
        );
        claim_eq!(
            call_bid(&mut host, WORKER_B, 0, 5, slot_time, &mut logger),
            Err(CustomContractError::AuctionClosed.into())
        );
        claim_eq!(
            call_finalize(&mut host, WORKER_A, 0, slot_time, &mut logger),
            Ok(())
        );
        let entry = query_auction(&host, 0).expect_report("Failed to call getAuction");
        claim_eq!(
            entry.winner(),
            Some(&Bid {
                bidder: WORKER_A,
                price: ccd(15),
            })
        );
    }

    #[concordium_test]
    fn test_batch_auction() {
        let mut logger = TestLogger::init();
        let mut host = host_with_auction(&mut logger);
        claim_eq!(
            call_create(&mut host, REQUESTER, 25, START + 1, &mut logger),
            Ok(1)
        );

        let bytes = to_bytes(&vec![1u64, 0u64]);
        let ctx = receive_ctx(Address::Account(WORKER_A), &bytes, START);
        let entries = get_batch_auction(&ctx, &host).expect_report("Failed to call getBatchAuction");
        claim_eq!(entries.len(), 2);
        claim_eq!(entries[0].id(), 1);
        claim_eq!(entries[0].work_request().max_price, ccd(25));
        claim_eq!(entries[1].id(), 0);
        claim_eq!(entries[1].work_request().max_price, ccd(40));

        let bytes = to_bytes(&vec![0u64, 2u64]);
        let ctx = receive_ctx(Address::Account(WORKER_A), &bytes, START);
        claim_eq!(
            get_batch_auction(&ctx, &host),
            Err(CustomContractError::NotFound.into())
        );

        claim_eq!(query_auction(&host, 2), Err(CustomContractError::NotFound.into()));
    }
}
