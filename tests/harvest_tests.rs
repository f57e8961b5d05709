// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end harvest tests against an in-memory chain

mod helpers;

use std::time::Duration;

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use eventharvest::{
    harvest, ContractError, DecodeError, EventValue, FilterError, HarvestConfig,
    HarvestConfigBuilder, HarvestError, HarvestRequest, Harvester, RangeError, RangePolicy,
    RetrievalMode, RetryPolicy,
};
use helpers::{
    approval, block_timestamp, erc20, transfer, MockChain, Transfer, ALICE, BOB, CAROL, DAI,
    ROUTER, USDC,
};

fn config() -> HarvestConfig {
    HarvestConfigBuilder::new()
        .retry(RetryPolicy::fixed(5, Duration::ZERO))
        .build()
}

#[tokio::test]
async fn test_indexed_recipient_selects_single_transfer() {
    let chain = MockChain::new(1000)
        .with_log(120, ALICE, USDC, transfer(ALICE, BOB, 10))
        .with_log(450, BOB, USDC, transfer(BOB, CAROL, 20))
        .with_log(900, CAROL, USDC, transfer(CAROL, ALICE, 30));
    let usdc = erc20(USDC).named("USDC");

    let request = HarvestRequest::new()
        .from_block(1)
        .event("Transfer")
        .indexed_arg("_to", format!("{CAROL}"));

    let events = harvest(&[usdc], &chain, &config(), &request).await.unwrap();

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.name, "Transfer");
    assert_eq!(event.block_number, 450);
    assert_eq!(event.values.get("_from").and_then(EventValue::as_address), Some(BOB));
    assert_eq!(event.values.get("_to").and_then(EventValue::as_address), Some(CAROL));
    assert_eq!(
        event.values.get("_value").and_then(EventValue::as_uint),
        Some(U256::from(20))
    );
    assert_eq!(event.sender, BOB);
    assert_eq!(event.recipient, Some(USDC));
    assert_eq!(event.timestamp, block_timestamp(450));
    assert_eq!(event.contract_label, "USDC");
    assert_eq!(event.contract_address, USDC);
}

#[tokio::test]
async fn test_no_event_names_harvests_every_event() {
    let chain = MockChain::new(100)
        .with_log(10, ALICE, USDC, approval(ALICE, ROUTER, 5))
        .with_log(20, ALICE, USDC, transfer(ALICE, BOB, 5));

    let events = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Approval", "Transfer"]);
}

#[tokio::test]
async fn test_results_are_ordered_by_block_then_log_index() {
    let chain = MockChain::new(100)
        .with_tx(
            30,
            ALICE,
            Some(USDC),
            vec![
                (USDC, transfer(ALICE, BOB, 1)),
                (USDC, approval(ALICE, BOB, 2)),
            ],
        )
        .with_log(10, BOB, DAI, transfer(BOB, CAROL, 3))
        .with_log(30, CAROL, DAI, transfer(CAROL, ALICE, 4));
    let contracts = [erc20(USDC).named("USDC"), erc20(DAI).named("DAI")];

    let events = harvest(&contracts, &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    let keys: Vec<_> = events.iter().map(|e| (e.block_number, e.log_index)).collect();
    assert_eq!(keys, vec![(10, 0), (30, 0), (30, 1), (30, 2)]);
    assert_eq!(events[0].contract_label, "DAI");
    assert_eq!(events[1].contract_label, "USDC");
    assert_eq!(events[3].contract_label, "DAI");
}

#[tokio::test]
async fn test_transient_failures_within_budget_recover() {
    let chain = MockChain::new(100)
        .with_log(50, ALICE, USDC, transfer(ALICE, BOB, 1))
        .failing_logs(4);

    let events = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(chain.logs_calls(), 5);
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_whole_call() {
    let chain = MockChain::new(100)
        .with_log(50, ALICE, USDC, transfer(ALICE, BOB, 1))
        .failing_logs(5);

    let err = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap_err();

    match err {
        HarvestError::Retrieval(e) => {
            assert_eq!(e.attempts, 5);
            assert_eq!(e.operation.sub_range(), Some((1, 100)));
            assert!(e.source.is_transient());
        }
        other => panic!("expected retrieval error, got {other:?}"),
    }
    assert_eq!(chain.logs_calls(), 5);
    assert_eq!(chain.receipt_calls(), 0);
}

#[tokio::test]
async fn test_from_beyond_head_fails_before_retrieval() {
    let chain = MockChain::new(100).with_log(50, ALICE, USDC, transfer(ALICE, BOB, 1));

    let err = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(500))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Range(RangeError::FromBeyondHead { from: 500, head: 100 })
    ));
    assert_eq!(chain.logs_calls(), 0);
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_to_beyond_head_is_clamped() {
    let chain = MockChain::new(100).with_log(50, ALICE, USDC, transfer(ALICE, BOB, 1));

    let request = HarvestRequest::new().from_block(1).to_block(200u64);
    let events = harvest(&[erc20(USDC)], &chain, &config(), &request)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_number, 50);
    assert_eq!(chain.ranges(), vec![(1, 100)]);
}

#[tokio::test]
async fn test_fallback_policy_uses_deployment_range() {
    let chain = MockChain::new(1000)
        .with_log(100, ALICE, USDC, transfer(ALICE, BOB, 1))
        .with_log(300, ALICE, USDC, transfer(ALICE, BOB, 2));
    let usdc = erc20(USDC).deployed_at(200);
    let config = HarvestConfigBuilder::new()
        .retry(RetryPolicy::none())
        .range_policy(RangePolicy::FallbackToDeployment)
        .build();

    let events = harvest(&[usdc], &chain, &config, &HarvestRequest::new().from_block(5000))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_number, 300);
    assert_eq!(chain.ranges(), vec![(200, 1000)]);
}

#[tokio::test]
async fn test_default_from_block_is_earliest_deployment() {
    let chain = MockChain::new(1000)
        .with_log(100, ALICE, USDC, transfer(ALICE, BOB, 1))
        .with_log(700, ALICE, DAI, transfer(ALICE, BOB, 2));
    let contracts = [erc20(USDC).deployed_at(400), erc20(DAI).deployed_at(600)];

    let events = harvest(&contracts, &chain, &config(), &HarvestRequest::new())
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(chain.ranges()[0].0, 400);
}

#[tokio::test]
async fn test_excluded_events_are_dropped() {
    let chain = MockChain::new(100)
        .with_log(10, ALICE, USDC, approval(ALICE, ROUTER, 5))
        .with_log(20, ALICE, USDC, transfer(ALICE, BOB, 5));

    let request = HarvestRequest::new().from_block(1).exclude("Approval");
    let events = harvest(&[erc20(USDC)], &chain, &config(), &request)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Transfer");
    // Excluded events never trigger context lookups
    assert_eq!(chain.receipt_calls(), 1);
}

#[tokio::test]
async fn test_unknown_event_fails_before_any_log_call() {
    let chain = MockChain::new(100);

    let request = HarvestRequest::new().from_block(1).event("Mint");
    let err = harvest(&[erc20(USDC)], &chain, &config(), &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Filter(FilterError::UnknownEvent { ref name }) if name == "Mint"
    ));
    assert_eq!(chain.logs_calls(), 0);
}

#[tokio::test]
async fn test_over_broad_results_are_filtered_client_side() {
    let chain = MockChain::new(100)
        .with_log(10, ALICE, USDC, approval(ALICE, CAROL, 1))
        .with_log(20, ALICE, USDC, transfer(ALICE, BOB, 2))
        .with_log(30, ALICE, USDC, transfer(ALICE, CAROL, 3))
        .loose();

    let request = HarvestRequest::new()
        .from_block(1)
        .event("Transfer")
        .indexed_arg("_to", format!("{CAROL}"));
    let events = harvest(&[erc20(USDC)], &chain, &config(), &request)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_number, 30);
    assert_eq!(chain.receipt_calls(), 1);
}

#[tokio::test]
async fn test_wide_range_is_split_into_contiguous_batches() {
    let chain = MockChain::new(1000);
    let config = HarvestConfigBuilder::new()
        .retry(RetryPolicy::none())
        .max_block_range(100)
        .build();

    harvest(&[erc20(USDC)], &chain, &config, &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    let ranges = chain.ranges();
    assert_eq!(ranges.len(), 10);
    assert_eq!(ranges.first(), Some(&(1, 101)));
    assert_eq!(ranges.last(), Some(&(902, 1000)));
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].1 + 1, pair[1].0);
    }
}

#[tokio::test]
async fn test_batching_disabled_issues_single_request() {
    let chain = MockChain::new(1000);
    let config = HarvestConfigBuilder::new()
        .retry(RetryPolicy::none())
        .max_block_range(100)
        .batching(false)
        .build();

    harvest(&[erc20(USDC)], &chain, &config, &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    assert_eq!(chain.ranges(), vec![(1, 1000)]);
}

#[tokio::test]
async fn test_indirect_call_is_unlabeled() {
    let chain = MockChain::new(100).with_tx(
        40,
        ALICE,
        Some(ROUTER),
        vec![(USDC, transfer(ROUTER, BOB, 9))],
    );

    let events = harvest(
        &[erc20(USDC).named("USDC")],
        &chain,
        &config(),
        &HarvestRequest::new().from_block(1),
    )
    .await
    .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].contract_label, "n/a");
    assert_eq!(events[0].recipient, Some(ROUTER));
    assert_eq!(events[0].sender, ALICE);
}

#[tokio::test]
async fn test_one_receipt_fetch_per_transaction() {
    let chain = MockChain::new(100).with_tx(
        40,
        ALICE,
        Some(USDC),
        vec![
            (USDC, transfer(ALICE, BOB, 1)),
            (USDC, transfer(ALICE, CAROL, 2)),
            (USDC, transfer(ALICE, ROUTER, 3)),
        ],
    );

    let events = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(chain.receipt_calls(), 1);
    assert_eq!(chain.block_calls(), 1);
}

#[tokio::test]
async fn test_malformed_log_surfaces_decode_error() {
    // Transfer signature with the `_to` topic missing
    let chain = MockChain::new(100).with_raw_log(
        10,
        USDC,
        vec![Transfer::SIGNATURE_HASH, B256::left_padding_from(ALICE.as_slice())],
        Bytes::from(vec![0u8; 32]),
    );

    let err = harvest(&[erc20(USDC)], &chain, &config(), &HarvestRequest::new().from_block(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Decode(DecodeError::TopicCount { expected: 3, actual: 2, .. })
    ));
}

#[tokio::test]
async fn test_empty_contract_list_makes_no_calls() {
    let chain = MockChain::new(100);

    let events = harvest(&[], &chain, &config(), &HarvestRequest::new())
        .await
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(chain.logs_calls(), 0);
}

#[tokio::test]
async fn test_block_scan_matches_log_retrieval() {
    let build = || {
        MockChain::new(60)
            .with_log(10, ALICE, USDC, transfer(ALICE, BOB, 1))
            .with_log(25, BOB, DAI, approval(BOB, CAROL, 2))
            .with_log(25, CAROL, USDC, transfer(CAROL, ALICE, 3))
            .with_log(40, ALICE, ROUTER, transfer(ALICE, BOB, 4))
    };
    let contracts = [erc20(USDC).named("USDC"), erc20(DAI).named("DAI")];
    let request = HarvestRequest::new().from_block(1);

    let by_logs = harvest(&contracts, &build(), &config(), &request)
        .await
        .unwrap();

    let scan_config = HarvestConfigBuilder::new()
        .retry(RetryPolicy::none())
        .retrieval_mode(RetrievalMode::BlockScan)
        .block_concurrency(4)
        .build();
    let scan_chain = build();
    let by_blocks = harvest(&contracts, &scan_chain, &scan_config, &request)
        .await
        .unwrap();

    assert_eq!(by_logs.len(), 3);
    assert_eq!(by_logs, by_blocks);
    assert_eq!(scan_chain.logs_calls(), 0);
}

#[tokio::test]
async fn test_verify_deployment() {
    let chain = MockChain::new(100).with_code(USDC);
    let harvester = Harvester::new(&chain, config());

    harvester.verify_deployment(&erc20(USDC)).await.unwrap();

    let err = harvester.verify_deployment(&erc20(DAI)).await.unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Contract(ContractError::NoCode { address }) if address == DAI
    ));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Batching never drops or duplicates a log, whatever the range width
        #[test]
        fn prop_batching_preserves_logs(
            blocks in proptest::collection::vec(1u64..=500, 0..20),
            max_range in 1u64..=250,
        ) {
            let chain = blocks.iter().enumerate().fold(MockChain::new(500), |chain, (i, block)| {
                chain.with_log(*block, ALICE, USDC, transfer(ALICE, BOB, i as u64))
            });
            let config = HarvestConfigBuilder::new()
                .retry(RetryPolicy::none())
                .max_block_range(max_range)
                .build();

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let events = runtime
                .block_on(harvest(&[erc20(USDC)], &chain, &config, &HarvestRequest::new().from_block(1)))
                .unwrap();

            prop_assert_eq!(events.len(), blocks.len());
            let mut expected = blocks.clone();
            expected.sort_unstable();
            let found: Vec<_> = events.iter().map(|e| e.block_number).collect();
            prop_assert_eq!(found, expected);
        }
    }
}
