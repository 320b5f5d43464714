use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::decimal::{dec, Amount};
use common::error::{Error, Result};
use common::model::{TransactionRequest, TransactionStatus, TransactionType};
use common::store::{InMemoryLedgerStore, LedgerStore};
use futures::future::join_all;
use ledger_service::{BalanceManager, TransactionLog, TransactionOutcome, TransactionProcessor};

fn processor() -> (TransactionProcessor, BalanceManager, TransactionLog) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let balances = BalanceManager::new(store.clone());
    let log = TransactionLog::new(store);
    let processor = TransactionProcessor::new(balances.clone(), log.clone());
    (processor, balances, log)
}

fn request(id: &str, kind: TransactionType, amount: Amount, account: &str) -> TransactionRequest {
    TransactionRequest::new(id, kind, amount, account)
}

#[tokio::test]
async fn test_full_scenario() {
    let (processor, balances, _) = processor();

    let outcome = processor.process(&request("t1", TransactionType::Deposit, dec!(100), "A")).await.unwrap();
    assert_eq!(outcome, TransactionOutcome::Applied { balance: dec!(100) });

    let outcome = processor.process(&request("t2", TransactionType::WithdrawRequest, dec!(50), "A")).await.unwrap();
    assert_eq!(outcome, TransactionOutcome::Sufficient);

    let outcome = processor.process(&request("t3", TransactionType::Withdraw, dec!(50), "A")).await.unwrap();
    assert_eq!(outcome, TransactionOutcome::Applied { balance: dec!(50) });

    let outcome = processor.process(&request("t4", TransactionType::Withdraw, dec!(100), "A")).await.unwrap();
    assert_eq!(outcome, TransactionOutcome::Rejected);
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(50));

    let mut refund = request("t5", TransactionType::Deposit, dec!(1), "A");
    refund.kind = "refund".to_string();
    match processor.process(&refund).await {
        Err(Error::InvalidTransactionType(kind)) => assert_eq!(kind, "refund"),
        other => panic!("Expected InvalidTransactionType, got {:?}", other),
    }
}

#[tokio::test]
async fn test_withdraw_request_is_read_only() {
    let (processor, balances, log) = processor();
    processor.process(&request("t1", TransactionType::Deposit, dec!(20), "A")).await.unwrap();

    let outcome = processor.process(&request("t2", TransactionType::WithdrawRequest, dec!(30), "A")).await.unwrap();
    assert_eq!(outcome, TransactionOutcome::Insufficient);

    processor.process(&request("t3", TransactionType::WithdrawRequest, dec!(10), "A")).await.unwrap();

    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(20));
    let ids: Vec<String> = log.list("A").await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["t1".to_string()]);
}

#[tokio::test]
async fn test_rejects_non_positive_amounts() {
    let (processor, balances, log) = processor();

    for amount in [Amount::ZERO, dec!(-10)] {
        for kind in [TransactionType::Deposit, TransactionType::WithdrawRequest, TransactionType::Withdraw] {
            let result = processor.process(&request("bad", kind, amount, "A")).await;
            assert!(matches!(result, Err(Error::ValidationError(_))), "{:?} {}", kind, amount);
        }
    }

    let too_precise = processor.process(&request("bad", TransactionType::Deposit, dec!(0.000000001), "A")).await;
    assert!(matches!(too_precise, Err(Error::ValidationError(_))));

    let no_account = processor.process(&request("t1", TransactionType::Deposit, dec!(1), "")).await;
    assert!(matches!(no_account, Err(Error::ValidationError(_))));

    let nested_account = processor.process(&request("1", TransactionType::Deposit, dec!(1), "A:x")).await;
    assert!(matches!(nested_account, Err(Error::ValidationError(_))));

    assert_eq!(balances.get_balance("A").await.unwrap(), Amount::ZERO);
    assert!(log.list("A").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replayed_deposit_applies_once() {
    let (processor, balances, _) = processor();
    let deposit = request("t1", TransactionType::Deposit, dec!(100), "A");

    processor.process(&deposit).await.unwrap();
    let replay = processor.process(&deposit).await.unwrap();

    assert_eq!(replay, TransactionOutcome::Duplicate { status: TransactionStatus::Applied });
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(100));
}

#[tokio::test]
async fn test_replayed_withdraw_applies_once() {
    let (processor, balances, _) = processor();
    processor.process(&request("t1", TransactionType::Deposit, dec!(100), "A")).await.unwrap();

    let withdraw = request("t2", TransactionType::Withdraw, dec!(30), "A");
    processor.process(&withdraw).await.unwrap();
    let replay = processor.process(&withdraw).await.unwrap();

    assert_eq!(replay, TransactionOutcome::Duplicate { status: TransactionStatus::Applied });
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(70));
}

#[tokio::test]
async fn test_rejected_withdraw_is_logged_as_rejected() {
    let (processor, balances, log) = processor();
    processor.process(&request("t1", TransactionType::Deposit, dec!(10), "A")).await.unwrap();

    let withdraw = request("t2", TransactionType::Withdraw, dec!(20), "A");
    assert_eq!(processor.process(&withdraw).await.unwrap(), TransactionOutcome::Rejected);

    let record = log.get("A", "t2").await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Rejected);

    // Funds arriving later do not revive the rejected id
    processor.process(&request("t3", TransactionType::Deposit, dec!(100), "A")).await.unwrap();
    let replay = processor.process(&withdraw).await.unwrap();
    assert_eq!(replay, TransactionOutcome::Duplicate { status: TransactionStatus::Rejected });
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(110));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() {
    let (processor, balances, _) = processor();
    processor.process(&request("t0", TransactionType::Deposit, dec!(100), "A")).await.unwrap();

    let tasks = ["w1", "w2"].into_iter().map(|id| {
        let processor = processor.clone();
        let withdraw = request(id, TransactionType::Withdraw, dec!(60), "A");
        tokio::spawn(async move { processor.process(&withdraw).await.unwrap() })
    });

    let outcomes: Vec<TransactionOutcome> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let applied = outcomes.iter().filter(|o| matches!(o, TransactionOutcome::Applied { .. })).count();
    let rejected = outcomes.iter().filter(|o| **o == TransactionOutcome::Rejected).count();
    assert_eq!((applied, rejected), (1, 1));
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(40));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_balance_matches_applied_history_under_load() {
    let (processor, balances, log) = processor();

    let tasks = (0..200).map(|i| {
        let processor = processor.clone();
        let kind = if i % 3 == 0 { TransactionType::Deposit } else { TransactionType::Withdraw };
        let tx = request(&format!("t{}", i), kind, dec!(7), "A");
        tokio::spawn(async move { processor.process(&tx).await.unwrap() })
    });
    join_all(tasks).await;

    let mut expected = Amount::ZERO;
    for record in log.list("A").await.unwrap() {
        match (record.kind, record.status) {
            (TransactionType::Deposit, TransactionStatus::Applied) => expected += record.amount,
            (TransactionType::Withdraw, TransactionStatus::Applied) => expected -= record.amount,
            _ => {}
        }
    }

    let balance = balances.get_balance("A").await.unwrap();
    assert_eq!(balance, expected);
    assert!(balance >= Amount::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replays_apply_once() {
    let (processor, balances, _) = processor();
    let deposit = request("t1", TransactionType::Deposit, dec!(25), "A");

    let tasks = (0..16).map(|_| {
        let processor = processor.clone();
        let deposit = deposit.clone();
        tokio::spawn(async move { processor.process(&deposit).await.unwrap() })
    });

    let applied = join_all(tasks)
        .await
        .into_iter()
        .filter(|r| matches!(r.as_ref().unwrap(), TransactionOutcome::Applied { .. }))
        .count();

    assert_eq!(applied, 1);
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(25));
}

/// In-memory store whose balance updates fail a set number of times before
/// reaching the map
struct FlakyStore {
    inner: InMemoryLedgerStore,
    failures_left: AtomicUsize,
}

impl FlakyStore {
    fn failing(times: usize) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            failures_left: AtomicUsize::new(times),
        }
    }

    fn fail_once_more(&self) -> Result<()> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::StoreUnavailable("timed out waiting for a connection".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        self.inner.insert_if_absent(key, value).await
    }

    async fn increment(&self, key: &str, delta: Amount) -> Result<Amount> {
        self.fail_once_more()?;
        self.inner.increment(key, delta).await
    }

    async fn decrement_if_sufficient(&self, key: &str, amount: Amount) -> Result<Option<Amount>> {
        self.fail_once_more()?;
        self.inner.decrement_if_sufficient(key, amount).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        self.inner.delete_if_equals(key, expected).await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        self.inner.scan_prefix(prefix).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

fn flaky_processor(store: Arc<FlakyStore>) -> (TransactionProcessor, BalanceManager, TransactionLog) {
    let balances = BalanceManager::new(store.clone());
    let log = TransactionLog::new(store);
    let processor = TransactionProcessor::new(balances.clone(), log.clone());
    (processor, balances, log)
}

#[tokio::test]
async fn test_failed_deposit_can_be_retried_with_same_id() {
    let (processor, balances, log) = flaky_processor(Arc::new(FlakyStore::failing(1)));
    let deposit = request("t1", TransactionType::Deposit, dec!(100), "A");

    let first = processor.process(&deposit).await;
    assert!(matches!(first, Err(Error::StoreUnavailable(_))));
    assert!(log.get("A", "t1").await.unwrap().is_none());

    let retry = processor.process(&deposit).await.unwrap();
    assert_eq!(retry, TransactionOutcome::Applied { balance: dec!(100) });

    let replay = processor.process(&deposit).await.unwrap();
    assert_eq!(replay, TransactionOutcome::Duplicate { status: TransactionStatus::Applied });
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(100));
}

#[tokio::test]
async fn test_failed_withdraw_can_be_retried_with_same_id() {
    let store = Arc::new(FlakyStore::failing(0));
    let (processor, balances, log) = flaky_processor(store.clone());
    processor.process(&request("t0", TransactionType::Deposit, dec!(100), "A")).await.unwrap();

    store.failures_left.store(1, Ordering::SeqCst);
    let withdraw = request("t1", TransactionType::Withdraw, dec!(30), "A");

    assert!(matches!(processor.process(&withdraw).await, Err(Error::StoreUnavailable(_))));
    assert!(log.get("A", "t1").await.unwrap().is_none());
    assert_eq!(balances.get_balance("A").await.unwrap(), dec!(100));

    let retry = processor.process(&withdraw).await.unwrap();
    assert_eq!(retry, TransactionOutcome::Applied { balance: dec!(70) });
    assert_eq!(log.get("A", "t1").await.unwrap().unwrap().status, TransactionStatus::Applied);
}
