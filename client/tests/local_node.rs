use std::{sync::Arc, time::Duration};

use anyhow::Result;
use scriptlog_client::{
    script_client::SAVE_FAILED,
    ChainReader, ClientError, ClientSettings, ContractCall, LocalNode, ScriptClient,
};
use scriptlog_common::{
    contract::{get_saved_script_args, save_script_args, AppendPolicy},
    rpc::OperationStatus,
};

const CONTRACT: &str = "AS1localcontract";
const ALICE: &str = "AU1alice";
const BOB: &str = "AU1bob";

fn settings() -> ClientSettings {
    ClientSettings {
        contract_address: CONTRACT.to_owned(),
        finalization_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

fn client_for(node: &LocalNode) -> ScriptClient<LocalNode, LocalNode> {
    ScriptClient::new(Arc::new(node.clone()), Arc::new(node.clone()), settings())
}

#[tokio::test]
async fn test_connect_then_save() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);

    assert_eq!(client.connect().await?, ALICE);
    assert!(client.state().await.scripts.is_empty());

    client.append_next("  x  ").await?;
    let state = client.state().await;
    assert_eq!(state.scripts, vec!["x".to_owned()]);
    assert_eq!(state.error, None);
    assert!(!state.saving);
    assert_eq!(client.next_script_id().await?, 1);

    let events = node.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.data, "Script saved with ID 0: x");
    Ok(())
}

#[tokio::test]
async fn test_scripts_listed_in_order() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);
    client.connect().await?;

    for text in ["first", "second", "third"] {
        client.append_next(text).await?;
    }

    assert_eq!(client.fetch_all().await?, vec!["first", "second", "third"]);
    assert_eq!(client.state().await.skipped_reads, 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_log_lists_nothing() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);

    assert!(client.fetch_all().await?.is_empty());
    assert_eq!(client.next_script_id().await?, 0);
    assert_eq!(client.state().await.error, None);
    Ok(())
}

#[tokio::test]
async fn test_connect_errors() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![])?;
    let client = client_for(&node);

    assert!(matches!(client.connect().await, Err(ClientError::NoAccounts)));
    let state = client.state().await;
    assert_eq!(state.error.as_deref(), Some("No accounts found in wallet"));
    assert_eq!(state.address, None);

    node.set_connection_allowed(false).await;
    assert!(matches!(client.connect().await, Err(ClientError::WalletRefused)));
    assert_eq!(
        client.state().await.error.as_deref(),
        Some("Failed to connect to wallet")
    );

    node.set_wallet_available(false).await;
    assert!(matches!(client.connect().await, Err(ClientError::NoWallets)));
    assert_eq!(client.state().await.error.as_deref(), Some("No wallets found"));
    assert!(!client.is_connected().await);
    Ok(())
}

#[tokio::test]
async fn test_save_requires_connection_and_text() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);

    assert!(matches!(
        client.append_next("hello").await,
        Err(ClientError::NotConnected)
    ));

    client.connect().await?;
    assert!(matches!(
        client.append_next("   ").await,
        Err(ClientError::EmptyScript)
    ));
    assert_eq!(client.next_script_id().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_stale_index_operation_fails() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);
    client.connect().await?;
    client.append_next("a").await?;

    // a writer still seeing counter 0 is refused
    let operation = node
        .submit(ContractCall {
            target_address: CONTRACT.to_owned(),
            target_function: "save_script".to_owned(),
            parameter: save_script_args(0, "stale"),
            max_gas: 0,
            coins: 0,
            fee: 0,
        })
        .await?;
    assert_eq!(
        node.operation_status(&operation).await?,
        OperationStatus::FinalError
    );

    assert_eq!(client.fetch_all().await?, vec!["a"]);
    assert_eq!(client.state().await.error, None);
    Ok(())
}

#[tokio::test]
async fn test_empty_script_round_trip() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);

    for (index, text) in [(0, ""), (1, "b")] {
        let operation = node
            .submit(ContractCall {
                target_address: CONTRACT.to_owned(),
                target_function: "save_script".to_owned(),
                parameter: save_script_args(index, text),
                max_gas: 0,
                coins: 0,
                fee: 0,
            })
            .await?;
        assert_eq!(
            node.operation_status(&operation).await?,
            OperationStatus::FinalSuccess
        );
    }

    let script = client
        .read_exposed("get_saved_script", get_saved_script_args(0))
        .await?;
    assert!(script.is_empty());
    assert_eq!(client.fetch_all().await?, vec!["", "b"]);
    assert_eq!(client.state().await.skipped_reads, 0);
    Ok(())
}

#[tokio::test]
async fn test_legacy_overwrite_node() -> Result<()> {
    let node =
        LocalNode::with_policy(CONTRACT, vec![ALICE.to_owned()], AppendPolicy::LegacyOverwrite)?;
    let client = client_for(&node);
    client.connect().await?;
    client.append_next("a").await?;

    let operation = node
        .submit(ContractCall {
            target_address: CONTRACT.to_owned(),
            target_function: "save_script".to_owned(),
            parameter: save_script_args(0, "b"),
            max_gas: 0,
            coins: 0,
            fee: 0,
        })
        .await?;
    assert_eq!(
        node.operation_status(&operation).await?,
        OperationStatus::FinalSuccess
    );
    assert_eq!(client.fetch_all().await?, vec!["b"]);
    assert_eq!(client.next_script_id().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_read_exposed() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned()])?;
    let client = client_for(&node);
    client.connect().await?;
    client.append_next("note").await?;

    let counter = client.read_exposed("get_script_id", Vec::new()).await?;
    assert_eq!(counter, b"1".to_vec());

    let script = client
        .read_exposed("get_saved_script", get_saved_script_args(0))
        .await?;
    assert_eq!(script, b"note".to_vec());

    assert!(client.read_exposed("get_message_id", Vec::new()).await.is_err());
    // read only calls publish nothing
    assert_eq!(node.events().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_account_changes_refresh() -> Result<()> {
    let node = LocalNode::new(CONTRACT, vec![ALICE.to_owned(), BOB.to_owned()])?;
    let client = Arc::new(client_for(&node));
    client.connect().await?;

    let watcher = {
        let client = client.clone();
        tokio::spawn(async move { client.watch_account_changes().await })
    };

    // let the watcher subscribe
    while node.listener_count().await == 0 {
        tokio::task::yield_now().await;
    }

    node.switch_account(BOB).await;
    node.close_account_changes().await;

    let applied = watcher.await??;
    assert_eq!(applied, 1);
    assert_eq!(client.state().await.address.as_deref(), Some(BOB));

    // new saves go through the new account
    client.append_next("from bob").await?;
    assert_eq!(client.state().await.scripts, vec!["from bob"]);
    assert_ne!(client.state().await.error.as_deref(), Some(SAVE_FAILED));
    Ok(())
}
