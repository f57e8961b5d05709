// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for eventharvest integration tests
//!
//! Provides a scripted in-memory chain implementing [`ChainRpc`] so harvests
//! can be tested without a node.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{address, keccak256, Address, BlockNumber, Bytes, LogData, TxHash, B256, U256};
use alloy_sol_types::{sol, SolEvent};
use async_trait::async_trait;
use eventharvest::{
    BlockRef, BlockSummary, ChainRpc, ContractDescriptor, LogFilter, RawLog, RpcError, TxReceipt,
};

sol! {
    event Transfer(address indexed _from, address indexed _to, uint256 _value);
    event Approval(address indexed _owner, address indexed _spender, uint256 _value);
}

pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");
pub const CAROL: Address = address!("00000000000000000000000000000000000ca401");
pub const ROUTER: Address = address!("0000000000000000000000000000000000007e7e");

pub const ERC20_ABI: &str = r#"[
  {"type":"event","name":"Transfer","anonymous":false,"inputs":[
    {"name":"_from","type":"address","indexed":true},
    {"name":"_to","type":"address","indexed":true},
    {"name":"_value","type":"uint256","indexed":false}]},
  {"type":"event","name":"Approval","anonymous":false,"inputs":[
    {"name":"_owner","type":"address","indexed":true},
    {"name":"_spender","type":"address","indexed":true},
    {"name":"_value","type":"uint256","indexed":false}]},
  {"type":"function","name":"balanceOf","stateMutability":"view",
   "inputs":[{"name":"owner","type":"address"}],
   "outputs":[{"name":"","type":"uint256"}]}
]"#;

pub fn erc20(address: Address) -> ContractDescriptor {
    ContractDescriptor::from_abi_json(address, ERC20_ABI).unwrap()
}

pub fn transfer(from: Address, to: Address, value: u64) -> LogData {
    Transfer {
        _from: from,
        _to: to,
        _value: U256::from(value),
    }
    .encode_log_data()
}

pub fn approval(owner: Address, spender: Address, value: u64) -> LogData {
    Approval {
        _owner: owner,
        _spender: spender,
        _value: U256::from(value),
    }
    .encode_log_data()
}

pub fn block_hash(number: BlockNumber) -> B256 {
    keccak256(number.to_be_bytes())
}

pub fn block_timestamp(number: BlockNumber) -> u64 {
    1_600_000_000 + number * 12
}

/// In-memory chain with scripted transactions
///
/// Every block up to `head` exists; blocks without scripted transactions are
/// empty. `eth_getLogs` honours the filter unless the chain is
/// [`loose`](MockChain::loose), in which case topics are ignored the way an
/// over-broad provider might.
pub struct MockChain {
    head: BlockNumber,
    blocks: BTreeMap<BlockNumber, Vec<TxHash>>,
    receipts: HashMap<TxHash, TxReceipt>,
    code: HashMap<Address, Bytes>,
    loose: bool,
    log_failures: AtomicU32,
    next_tx: u64,
    pub block_number_calls: AtomicUsize,
    pub logs_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub requested_ranges: Mutex<Vec<(u64, u64)>>,
}

impl MockChain {
    pub fn new(head: BlockNumber) -> Self {
        Self {
            head,
            blocks: BTreeMap::new(),
            receipts: HashMap::new(),
            code: HashMap::new(),
            loose: false,
            log_failures: AtomicU32::new(0),
            next_tx: 0,
            block_number_calls: AtomicUsize::new(0),
            logs_calls: AtomicUsize::new(0),
            block_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            requested_ranges: Mutex::new(Vec::new()),
        }
    }

    /// Add a transaction from `sender` to `recipient` emitting `logs`
    pub fn with_tx(
        mut self,
        block: BlockNumber,
        sender: Address,
        recipient: Option<Address>,
        logs: Vec<(Address, LogData)>,
    ) -> Self {
        self.next_tx += 1;
        let tx_hash = keccak256(self.next_tx.to_be_bytes());
        let first_index = self
            .blocks
            .get(&block)
            .map(|txs| {
                txs.iter()
                    .map(|tx| self.receipts[tx].logs.len() as u64)
                    .sum::<u64>()
            })
            .unwrap_or(0);

        let logs = logs
            .into_iter()
            .enumerate()
            .map(|(i, (address, data))| RawLog {
                address,
                topics: data.topics().to_vec(),
                data: data.data,
                block_hash: block_hash(block),
                block_number: block,
                transaction_hash: tx_hash,
                log_index: first_index + i as u64,
            })
            .collect();

        self.receipts.insert(
            tx_hash,
            TxReceipt {
                transaction_hash: tx_hash,
                from: sender,
                to: recipient,
                block_number: block,
                logs,
            },
        );
        self.blocks.entry(block).or_default().push(tx_hash);
        self
    }

    /// A transaction sent straight to the emitting contract
    pub fn with_log(self, block: BlockNumber, sender: Address, address: Address, data: LogData) -> Self {
        self.with_tx(block, sender, Some(address), vec![(address, data)])
    }

    /// A raw log with hand-made topics and data, sent straight to `address`
    pub fn with_raw_log(
        self,
        block: BlockNumber,
        address: Address,
        topics: Vec<B256>,
        data: Bytes,
    ) -> Self {
        let data = LogData::new_unchecked(topics, data);
        self.with_tx(block, ALICE, Some(address), vec![(address, data)])
    }

    pub fn with_code(mut self, address: Address) -> Self {
        self.code.insert(address, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));
        self
    }

    /// Fail the next `n` `eth_getLogs` calls with a transient error
    pub fn failing_logs(self, n: u32) -> Self {
        self.log_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn loose(mut self) -> Self {
        self.loose = true;
        self
    }

    pub fn logs_calls(&self) -> usize {
        self.logs_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<(u64, u64)> {
        self.requested_ranges.lock().unwrap().clone()
    }

    fn all_logs(&self) -> impl Iterator<Item = &RawLog> {
        self.blocks
            .values()
            .flatten()
            .flat_map(|tx| self.receipts[tx].logs.iter())
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn block_number(&self) -> Result<BlockNumber, RpcError> {
        self.block_number_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        self.logs_calls.fetch_add(1, Ordering::SeqCst);
        let from = filter.from_block.unwrap_or_default();
        let to = filter.to_block.unwrap_or(self.head);
        self.requested_ranges.lock().unwrap().push((from, to));

        let remaining = self.log_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.log_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RpcError::unavailable("429 Too Many Requests"));
        }

        Ok(self
            .all_logs()
            .filter(|log| {
                if self.loose {
                    (from..=to).contains(&log.block_number)
                        && filter.addresses.contains(&log.address)
                } else {
                    filter.matches(log)
                }
            })
            .cloned()
            .collect())
    }

    async fn block(&self, block: BlockRef) -> Result<BlockSummary, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let number = match block {
            BlockRef::Number(n) => n,
            BlockRef::Hash(hash) => (0..=self.head)
                .find(|n| block_hash(*n) == hash)
                .ok_or_else(|| RpcError::not_found(block.to_string()))?,
        };
        if number > self.head {
            return Err(RpcError::not_found(block.to_string()));
        }
        Ok(BlockSummary {
            number,
            hash: block_hash(number),
            timestamp: block_timestamp(number),
            transactions: self.blocks.get(&number).cloned().unwrap_or_default(),
        })
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| RpcError::not_found(format!("receipt for {tx_hash}")))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }
}
