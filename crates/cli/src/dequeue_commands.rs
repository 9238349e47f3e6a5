use {anyhow::Result, tracing::warn};

use {
    courier_config::CourierConfig,
    courier_gateway::RelayServices,
    courier_queue::DequeueOutcome,
};

/// Receive up to `count` messages, printing each as one JSON line on stdout.
///
/// An empty queue or an undecodable entry ends the run early. Undecodable
/// entries are abandoned back to the queue, so they would come straight back.
pub async fn dequeue(config: &CourierConfig, count: usize) -> Result<()> {
    let services = RelayServices::from_config(config)?;
    let publisher = services.publisher(config);

    let mut received = 0;
    while received < count {
        match publisher.receive_one().await {
            DequeueOutcome::Received(message) => {
                println!("{}", message.to_json()?);
                received += 1;
            },
            DequeueOutcome::Empty => break,
            DequeueOutcome::Poisoned { message_id, reason } => {
                warn!(%message_id, %reason, "skipping undecodable entry");
                break;
            },
            DequeueOutcome::Failed { reason } => anyhow::bail!("dequeue failed: {reason}"),
        }
    }

    eprintln!("{received} message(s) received");
    Ok(())
}
