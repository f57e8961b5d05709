// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for configuration and range batching
//!
//! These tests use proptest to validate invariants about chain overrides and
//! sub-range splitting across a wide range of inputs.

use alloy_chains::NamedChain;
use eventharvest::{BlockTarget, HarvestConfig, HarvestConfigBuilder, MaxBlockRange, ResolvedRange};
use proptest::prelude::*;
use std::time::Duration;

fn arb_chain() -> impl Strategy<Value = NamedChain> {
    prop_oneof![
        Just(NamedChain::Mainnet),
        Just(NamedChain::Arbitrum),
        Just(NamedChain::Base),
        Just(NamedChain::Optimism),
        Just(NamedChain::Polygon),
        Just(NamedChain::Avalanche),
        Just(NamedChain::BinanceSmartChain),
        Just(NamedChain::Sonic),
    ]
}

fn arb_duration() -> impl Strategy<Value = Duration> {
    (0u64..=5000).prop_map(Duration::from_millis)
}

proptest! {
    /// Property: a chain-specific delay always overrides the global one
    #[test]
    fn prop_chain_override_always_wins(
        global in arb_duration(),
        specific in arb_duration(),
        chain in arb_chain(),
    ) {
        let config = HarvestConfigBuilder::new()
            .rate_limit_delay(global)
            .chain_rate_limit(chain, specific)
            .build();

        prop_assert_eq!(config.get_rate_limit_delay(chain), Some(specific));
        prop_assert_eq!(config.settings(Some(chain)).rate_limit_delay, Some(specific));
        prop_assert_eq!(config.settings(None).rate_limit_delay, Some(global));
    }

    /// Property: minimal config never delays any chain
    #[test]
    fn prop_minimal_never_delays(chain in arb_chain()) {
        prop_assert_eq!(HarvestConfig::minimal().get_rate_limit_delay(chain), None);
    }

    /// Property: overrides for different chains are independent
    #[test]
    fn prop_overrides_independent(
        chain1 in arb_chain(),
        chain2 in arb_chain(),
        max1 in 1u64..10_000,
        max2 in 1u64..10_000,
    ) {
        prop_assume!(chain1 != chain2);

        let config = HarvestConfigBuilder::new()
            .chain_max_blocks(chain1, max1)
            .chain_max_blocks(chain2, max2)
            .build();

        prop_assert_eq!(config.get_max_block_range(chain1).as_u64(), max1);
        prop_assert_eq!(config.get_max_block_range(chain2).as_u64(), max2);
    }

    /// Property: sub-ranges are contiguous, ascending and cover exactly [from, to]
    #[test]
    fn prop_sub_ranges_cover_range(
        from in 0u64..1_000_000,
        width in 0u64..50_000,
        max in 1u64..10_000,
    ) {
        let to = from + width;
        let limit = MaxBlockRange::new(max);
        let parts: Vec<_> = limit.sub_ranges(from, to).collect();

        prop_assert_eq!(parts.len(), limit.sub_ranges_needed(from, to));
        prop_assert_eq!(parts.first().map(|p| p.0), Some(from));
        prop_assert_eq!(parts.last().map(|p| p.1), Some(to));
        for (start, end) in &parts {
            prop_assert!(start <= end);
            prop_assert!(end - start <= max);
        }
        for pair in parts.windows(2) {
            prop_assert_eq!(pair[0].1 + 1, pair[1].0);
        }
    }

    /// Property: a resolved range never extends beyond the head
    #[test]
    fn prop_resolved_range_within_head(
        from in 0u64..2_000,
        to in 0u64..2_000,
        head in 0u64..2_000,
    ) {
        match ResolvedRange::resolve(from, BlockTarget::Number(to), head) {
            Ok(range) => {
                prop_assert!(range.from <= range.to);
                prop_assert_eq!(range.to, to.min(head));
            }
            Err(_) => prop_assert!(from > head || from > to),
        }

        let latest = ResolvedRange::resolve(from, BlockTarget::Latest, head);
        prop_assert_eq!(latest.is_ok(), from <= head);
    }
}
