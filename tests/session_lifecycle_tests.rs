//! Session lifecycle tests
//!
//! End-to-end checks of the session engine: sign-in, validation, refresh
//! rotation, revocation and concurrent refresh races.

use std::sync::Arc;
use tokio::sync::Barrier;

use sessionvault_server::accounts::{InMemoryAccountStore, PasswordHasher, MIN_COST};
use sessionvault_server::auth::{AuthError, AuthService, InMemoryLedger, TokenLedger, TokenSigner};

const SECRET: &[u8] = b"integration-test-secret-0123456789";

fn create_service() -> (AuthService, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = AuthService::new(
        TokenSigner::new(SECRET),
        ledger.clone(),
        Arc::new(InMemoryAccountStore::new()),
        PasswordHasher::new(MIN_COST).unwrap(),
        900,
        86_400,
    );
    (service, ledger)
}

// ============================================================================
// Rotation scenario
// ============================================================================

#[tokio::test]
async fn test_sign_in_refresh_validate_scenario() {
    let (service, ledger) = create_service();
    service.sign_up("a@b.com", "password1").await.unwrap();

    let first = service.sign_in("a@b.com", "password1").await.unwrap();
    assert_eq!(first.expires_in, 900);
    assert_eq!(service.validate(&first.access_token).await.unwrap(), "a@b.com");

    let second = service.refresh(&first.refresh_token).await.unwrap();
    assert_eq!(second.expires_in, 900);
    assert_ne!(second.access_token, first.access_token);

    let old = service.validate(&first.access_token).await;
    assert!(matches!(
        old,
        Err(AuthError::CredentialRevoked) | Err(AuthError::InvalidCredential)
    ));
    assert_eq!(service.validate(&second.access_token).await.unwrap(), "a@b.com");

    assert!(!ledger.exists(&first.access_token).await);
    assert!(ledger.exists(&second.access_token).await);
    assert_eq!(ledger.active_sessions().await, 1);
}

#[tokio::test]
async fn test_rotation_chain() {
    let (service, ledger) = create_service();
    service.sign_up("a@b.com", "password1").await.unwrap();

    let mut tokens = service.sign_in("a@b.com", "password1").await.unwrap();
    let mut retired = Vec::new();
    for _ in 0..5 {
        let next = service.refresh(&tokens.refresh_token).await.unwrap();
        retired.push(tokens);
        tokens = next;
    }

    for old in &retired {
        assert!(service.validate(&old.access_token).await.is_err());
        assert!(matches!(
            service.refresh(&old.refresh_token).await,
            Err(AuthError::InvalidCredential)
        ));
    }
    assert_eq!(service.validate(&tokens.access_token).await.unwrap(), "a@b.com");
    assert_eq!(ledger.active_sessions().await, 1);
    assert_eq!(ledger.revoked_count().await, 5);
}

#[tokio::test]
async fn test_sessions_of_different_accounts_are_isolated() {
    let (service, _) = create_service();
    service.sign_up("a@b.com", "password1").await.unwrap();
    service.sign_up("c@d.com", "password2").await.unwrap();

    let alice = service.sign_in("a@b.com", "password1").await.unwrap();
    let carol = service.sign_in("c@d.com", "password2").await.unwrap();

    service.revoke(&alice.access_token).await.unwrap();

    assert!(service.validate(&alice.access_token).await.is_err());
    assert_eq!(service.validate(&carol.access_token).await.unwrap(), "c@d.com");
    service.refresh(&carol.refresh_token).await.unwrap();
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_refresh_has_exactly_one_winner() {
    const CALLERS: usize = 32;

    let (service, ledger) = create_service();
    service.sign_up("a@b.com", "password1").await.unwrap();
    let tokens = service.sign_in("a@b.com", "password1").await.unwrap();

    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(CALLERS));
    let mut handles = Vec::with_capacity(CALLERS);

    for _ in 0..CALLERS {
        let service = service.clone();
        let barrier = barrier.clone();
        let refresh_token = tokens.refresh_token.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service.refresh(&refresh_token).await
        }));
    }

    let mut successes = Vec::new();
    let mut failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pair) => successes.push(pair),
            Err(AuthError::InvalidCredential) => failures += 1,
            Err(other) => panic!("unexpected refresh error: {:?}", other),
        }
    }

    assert_eq!(successes.len(), 1);
    assert_eq!(failures, CALLERS - 1);
    assert_eq!(ledger.active_sessions().await, 1);
    assert_eq!(
        service.validate(&successes[0].access_token).await.unwrap(),
        "a@b.com"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_refresh_and_revoke() {
    let (service, _) = create_service();
    service.sign_up("a@b.com", "password1").await.unwrap();
    let tokens = service.sign_in("a@b.com", "password1").await.unwrap();

    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(2));

    let refresher = {
        let service = service.clone();
        let barrier = barrier.clone();
        let refresh_token = tokens.refresh_token.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            service.refresh(&refresh_token).await.is_ok()
        })
    };
    let revoker = {
        let service = service.clone();
        let barrier = barrier.clone();
        let access_token = tokens.access_token.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            service.revoke(&access_token).await.is_ok()
        })
    };

    let refreshed = refresher.await.unwrap();
    let revoked = revoker.await.unwrap();

    // Both operations consume the same pairing; only one can win it.
    assert!(refreshed ^ revoked);
    assert!(service.validate(&tokens.access_token).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sign_up_single_account() {
    let (service, _) = create_service();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.sign_up("a@b.com", &format!("password{}", i)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => created += 1,
            Err(AuthError::AccountAlreadyExists) => {}
            Err(other) => panic!("unexpected sign-up error: {:?}", other),
        }
    }
    assert_eq!(created, 1);
}
