use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::decimal::dec;
use common::model::{TransactionRequest, TransactionStatus, TransactionType};
use futures::future::join_all;
use ledger_service::{LedgerConfig, LedgerService, StoreBackend, TransactionOutcome};
use std::sync::Arc;
use tokio::test;

use dotenv::dotenv;

// PostgreSQL integration tests for the ledger service
// These tests require a running PostgreSQL database
// Run with: cargo test --test postgres_tests -- --ignored

async fn create_test_service() -> LedgerService {
    dotenv().ok(); // Load .env if it exists

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    let config = LedgerConfig::new(StoreBackend::Postgres(database_url), 10, Duration::from_secs(5));
    LedgerService::with_config(&config)
        .await
        .expect("Failed to create ledger service with PostgreSQL store")
}

// Tests share one database, so every test works on its own account
fn unique_account(name: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("{}-{}", name, nanos)
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_balance_operations() {
    let service = create_test_service().await;
    let account = unique_account("ops");

    let deposit = TransactionRequest::new("t1", TransactionType::Deposit, dec!(100), account.as_str());
    assert_eq!(
        service.process_transaction(&deposit).await.unwrap(),
        TransactionOutcome::Applied { balance: dec!(100) }
    );

    let withdraw = TransactionRequest::new("t2", TransactionType::Withdraw, dec!(30.5), account.as_str());
    assert_eq!(
        service.process_transaction(&withdraw).await.unwrap(),
        TransactionOutcome::Applied { balance: dec!(69.5) }
    );

    let over = TransactionRequest::new("t3", TransactionType::Withdraw, dec!(200), account.as_str());
    assert_eq!(service.process_transaction(&over).await.unwrap(), TransactionOutcome::Rejected);

    // Replays leave the balance alone
    assert_eq!(
        service.process_transaction(&deposit).await.unwrap(),
        TransactionOutcome::Duplicate { status: TransactionStatus::Applied }
    );
    assert_eq!(service.get_balance(&account).await.unwrap().balance, dec!(69.5));

    let history = service.list_transactions(&account).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_concurrent_withdrawals() {
    let service = Arc::new(create_test_service().await);
    let account = unique_account("race");

    service
        .process_transaction(&TransactionRequest::new("t0", TransactionType::Deposit, dec!(100), account.as_str()))
        .await
        .unwrap();

    let tasks = ["w1", "w2"].into_iter().map(|id| {
        let service = service.clone();
        let request = TransactionRequest::new(id, TransactionType::Withdraw, dec!(60), account.as_str());
        tokio::spawn(async move { service.process_transaction(&request).await.unwrap() })
    });

    let outcomes: Vec<TransactionOutcome> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();
    assert!(outcomes.contains(&TransactionOutcome::Rejected));
    assert_eq!(service.get_balance(&account).await.unwrap().balance, dec!(40));
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_store_check() {
    let service = create_test_service().await;
    assert!(service.check_store().await.is_ok());
}
