//! Ledger and reconciliation through a fully wired client

use crate::common::{client_for, mount_status, mount_user};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use trivia_offline::client::offline::{LedgerSnapshot, SyncError, SyncOutcome};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sync_twice_is_a_no_op_the_second_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync-offline-progress"))
        .and(body_json(json!({"questionsAnswered": 2, "correctAnswers": 1, "xp": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questionsAnswered": 40, "correctAnswers": 30, "xp": 1250, "level": 10, "didLevelUp": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, 1250, 10).await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    client.ledger.record(true, 50).await.unwrap();
    client.ledger.record(false, 0).await.unwrap();

    let first = client.reconciler.sync_with_stored_session().await.unwrap();
    let report = assert_matches!(first, SyncOutcome::Synced(report) => report);
    assert_eq!(report.totals.xp, 1250);
    assert_eq!(report.account.map(|a| a.level), Some(10));

    let settled = client.ledger.read().await.unwrap();
    assert_eq!(settled, LedgerSnapshot::default());

    let second = client.reconciler.sync_with_stored_session().await.unwrap();
    assert_matches!(second, SyncOutcome::NothingPending);
    assert_eq!(client.ledger.read().await.unwrap(), settled);
}

#[tokio::test]
async fn failed_sync_keeps_every_answer() {
    let server = MockServer::start().await;
    mount_status(&server, "POST", "/api/sync-offline-progress", 500).await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    client.ledger.record(true, 50).await.unwrap();

    let result = client.reconciler.sync_with_stored_session().await;
    assert_matches!(result, Err(SyncError::Api(_)));
    assert_eq!(
        client.ledger.read().await.unwrap(),
        LedgerSnapshot {
            questions_answered: 1,
            correct_answers: 1,
            xp: 50,
            pending_sync: true,
        }
    );
}

#[tokio::test]
async fn offline_sync_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    client.ledger.record(true, 10).await.unwrap();
    client.connectivity.report_probe(false);

    assert_matches!(
        client.reconciler.sync_with_stored_session().await,
        Err(SyncError::Offline)
    );
    assert!(client.ledger.read().await.unwrap().pending_sync);
}

#[tokio::test]
async fn answers_recorded_during_sync_survive_settlement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync-offline-progress"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "questionsAnswered": 1, "correctAnswers": 1, "xp": 100, "level": 2
                }))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    mount_user(&server, 100, 2).await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    client.ledger.record(true, 100).await.unwrap();

    let reconciler = client.reconciler.clone();
    let sync = tokio::spawn(async move { reconciler.sync_with_stored_session().await });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    client.ledger.record(true, 50).await.unwrap();

    assert_matches!(sync.await.unwrap(), Ok(SyncOutcome::Synced(_)));
    assert_eq!(
        client.ledger.read().await.unwrap(),
        LedgerSnapshot {
            questions_answered: 1,
            correct_answers: 1,
            xp: 50,
            pending_sync: true,
        }
    );
}

#[tokio::test]
async fn reconnect_pushes_ledger_through_the_coordinator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync-offline-progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questionsAnswered": 3, "correctAnswers": 3, "xp": 600, "level": 6, "didLevelUp": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, 600, 6).await;
    Mock::given(method("GET"))
        .and(path("/api/offline-questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    let mut reports = client.coordinator.subscribe();
    let _background = client.coordinator.clone().spawn(client.connectivity.subscribe());

    client.connectivity.report_network(false);
    client.ledger.record(true, 200).await.unwrap();
    client.connectivity.report_network(true);

    let report = tokio::time::timeout(std::time::Duration::from_secs(5), reports.recv())
        .await
        .expect("sync report in time")
        .unwrap();
    assert!(report.did_level_up);
    assert_eq!(report.pushed.xp, 200);
    assert!(!client.ledger.read().await.unwrap().pending_sync);
}

#[tokio::test]
async fn ledger_from_an_earlier_run_syncs_at_startup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "database": "connected"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sync-offline-progress"))
        .and(body_json(json!({"questionsAnswered": 1, "correctAnswers": 1, "xp": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questionsAnswered": 1, "correctAnswers": 1, "xp": 50, "level": 1, "didLevelUp": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, 50, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/offline-questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.sessions.set_token("tok").await.unwrap();
    client.ledger.record(true, 50).await.unwrap();
    let mut reports = client.coordinator.subscribe();

    // Never offline: the first healthy check alone has to trigger the push
    let _background = client.start_background();
    let report = tokio::time::timeout(std::time::Duration::from_secs(5), reports.recv())
        .await
        .expect("sync report in time")
        .unwrap();
    assert_eq!(report.pushed.xp, 50);
    assert!(!client.connectivity.is_offline());
    assert_eq!(client.ledger.read().await.unwrap(), LedgerSnapshot::default());
}
