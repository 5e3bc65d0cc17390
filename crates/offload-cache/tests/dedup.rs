//! End-to-end exercises of the transfer deduplication path.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use offload_cache::{CachingJobClient, TransferCoordinator, TransferRole};
use offload_client::JobClient;
use offload_config::DestinationConfig;
use offload_core::{CancellationToken, ClientError, FileAction, InputKind, JobId, Transport};
use offload_test_support::{ScriptedTransport, fixtures};

fn caching_client(
    transport: &Arc<ScriptedTransport>,
    coordinator: &Arc<TransferCoordinator>,
    job: &str,
) -> CachingJobClient {
    let destination =
        DestinationConfig::from_params(BTreeMap::new()).expect("valid empty destination");
    let transport = Arc::clone(transport) as Arc<dyn Transport>;
    CachingJobClient::new(
        JobClient::new(transport, destination, JobId::new(job)),
        Arc::clone(coordinator),
    )
}

#[tokio::test(start_paused = true)]
async fn concurrent_staging_shares_one_transfer() -> Result<()> {
    fixtures::init_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("cache_required", "true");
    transport.set_default("cache_required", "false");
    transport.enqueue("file_available", r#"{"ready": false}"#);
    transport.enqueue("file_available", r#"{"ready": false}"#);
    transport.set_default("file_available", r#"{"ready": true, "token": "tok-1"}"#);
    transport.set_default("cache_insert", "{}");
    transport.set_default("upload_input", r#"{"path": "/remote/staging/in.txt"}"#);

    let coordinator = Arc::new(TransferCoordinator::new());
    let one = caching_client(&transport, &coordinator, "job-1");
    let two = caching_client(&transport, &coordinator, "job-2");
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        one.put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        ),
        two.put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        ),
    );
    let first = first?;
    let second = second?;
    assert_eq!(first.path, "/remote/staging/in.txt");
    assert_eq!(first.path, second.path);

    // Only the owner probes the cache, and exactly one transfer happens.
    assert_eq!(transport.call_count("cache_required"), 1);
    assert_eq!(transport.call_count("cache_insert"), 1);

    let uploads: Vec<_> = transport
        .calls()
        .into_iter()
        .filter(|call| call.command == "upload_input")
        .collect();
    assert_eq!(uploads.len(), 2);
    for call in &uploads {
        assert_eq!(
            call.args.get("cache_token").map(String::as_str),
            Some("tok-1"),
            "both registrations carry the shared token"
        );
        assert!(
            call.input_path.is_none() && call.payload.is_none(),
            "cached registrations must not re-send the bytes"
        );
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn transfer_failure_reaches_every_waiter() -> Result<()> {
    fixtures::init_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("cache_required", "true");
    transport.set_default("file_available", r#"{"ready": false}"#);
    transport.enqueue_failure("cache_insert", "disk full on remote cache");

    let coordinator = Arc::new(TransferCoordinator::new());
    let one = caching_client(&transport, &coordinator, "job-1");
    let two = caching_client(&transport, &coordinator, "job-2");
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        one.put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        ),
        two.put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        ),
    );

    for outcome in [first, second] {
        assert!(matches!(
            outcome,
            Err(ClientError::TransferFailed { path }) if path == Path::new("/data/in.txt")
        ));
    }
    assert_eq!(transport.call_count("upload_input"), 0);

    // The failed slot was retired, so a retry starts from a fresh handle.
    let (slot, role) = coordinator.acquire(Path::new("/data/in.txt"));
    assert_eq!(role, TransferRole::Owner);
    assert!(!slot.has_failed());
    Ok(())
}

#[tokio::test]
async fn inline_contents_bypass_the_cache() -> Result<()> {
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("upload_input", r#"{"path": "/remote/staging/in.txt"}"#);

    let coordinator = Arc::new(TransferCoordinator::new());
    let client = caching_client(&transport, &coordinator, "job-1");
    let cancel = CancellationToken::new();

    let staged = client
        .put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            Some("inline bytes"),
            Some(FileAction::Transfer),
            &cancel,
        )
        .await?;

    assert_eq!(staged.path, "/remote/staging/in.txt");
    assert_eq!(transport.call_count("cache_required"), 0);
    assert_eq!(transport.call_count("file_available"), 0);
    assert_eq!(
        transport.calls()[0].payload.as_deref(),
        Some("inline bytes")
    );
    Ok(())
}

#[tokio::test]
async fn copy_actions_bypass_the_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("in.txt");
    std::fs::write(&source, "shared bytes")?;
    let remote = dir.path().join("staged-in.txt");

    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("input_path", &format!("\"{}\"", remote.display()));

    let coordinator = Arc::new(TransferCoordinator::new());
    let client = caching_client(&transport, &coordinator, "job-1");
    let cancel = CancellationToken::new();

    client
        .put_file(
            &source,
            InputKind::Input,
            None,
            None,
            Some(FileAction::Copy),
            &cancel,
        )
        .await?;

    assert_eq!(std::fs::read_to_string(&remote)?, "shared bytes");
    assert_eq!(transport.call_count("cache_required"), 0);
    Ok(())
}

#[tokio::test]
async fn cache_hits_skip_the_transfer_entirely() -> Result<()> {
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("cache_required", "false");
    transport.set_default("file_available", r#"{"ready": true, "token": "tok-9"}"#);
    transport.enqueue("upload_input", r#"{"path": "/remote/staging/in.txt"}"#);

    let coordinator = Arc::new(TransferCoordinator::new());
    let client = caching_client(&transport, &coordinator, "job-1");
    let cancel = CancellationToken::new();

    client
        .put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        )
        .await?;

    assert_eq!(transport.call_count("cache_insert"), 0);
    let upload = transport
        .calls()
        .into_iter()
        .find(|call| call.command == "upload_input")
        .expect("upload registered");
    assert_eq!(
        upload.args.get("cache_token").map(String::as_str),
        Some("tok-9")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_transfer_does_not_poison_later_retries() -> Result<()> {
    fixtures::init_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("cache_required", "true");
    transport.enqueue("cache_required", "true");
    transport.enqueue_failure("cache_insert", "remote cache offline");
    transport.set_default("cache_insert", "{}");
    transport.enqueue("file_available", r#"{"ready": false}"#);
    transport.enqueue("file_available", r#"{"ready": false}"#);
    transport.set_default("file_available", r#"{"ready": true, "token": "tok-2"}"#);
    transport.set_default("upload_input", r#"{"path": "/remote/staging/in.txt"}"#);

    let coordinator = Arc::new(TransferCoordinator::new());
    let client = caching_client(&transport, &coordinator, "job-1");

    // The owner departs mid-wait while its queued transfer is still in
    // flight, and the transfer then fails with no waiter left behind.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let interrupted = client
        .put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        )
        .await;
    assert!(matches!(interrupted, Err(ClientError::Cancelled)));
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;

    // The failure retired the key, so the retry starts over as owner and
    // succeeds once the remote cache has recovered.
    let cancel = CancellationToken::new();
    let staged = client
        .put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        )
        .await?;
    assert_eq!(staged.path, "/remote/staging/in.txt");
    assert_eq!(transport.call_count("cache_insert"), 2);

    let upload = transport
        .calls()
        .into_iter()
        .find(|call| call.command == "upload_input")
        .expect("upload registered");
    assert_eq!(
        upload.args.get("cache_token").map(String::as_str),
        Some("tok-2")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_availability_wait() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.enqueue("cache_required", "false");
    transport.set_default("file_available", r#"{"ready": false}"#);

    let coordinator = Arc::new(TransferCoordinator::new());
    let client = caching_client(&transport, &coordinator, "job-1");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client
        .put_file(
            Path::new("/data/in.txt"),
            InputKind::Input,
            None,
            None,
            Some(FileAction::Transfer),
            &cancel,
        )
        .await;
    assert!(matches!(result, Err(ClientError::Cancelled)));
}
