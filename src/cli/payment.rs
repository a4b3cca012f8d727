//! CLI payment tracking handler.

use std::time::Duration;

use super::WatchArgs;
use crate::api::ApiClient;
use crate::payment::{PollEvent, PollOutcome, PollPolicy};

/// Handle `soko payment watch <id>`. Ctrl-C stops polling.
pub async fn handle_watch(client: &ApiClient, args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut policy = PollPolicy::default().with_interval(
        args.interval
            .map(Duration::from_secs)
            .unwrap_or(client.config().poll_interval),
    );
    policy.max_attempts = args.max_attempts;

    println!("⏳ Waiting for payment {}...", args.payment_id);
    let mut handle = client.watch_payment_with(args.payment_id.as_str(), policy);

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(PollEvent::Pending { attempt, record }) => {
                    println!("   check {attempt}: {}", record.status);
                }
                Some(PollEvent::Failed { attempt, message, .. }) => {
                    eprintln!("   check {attempt} failed: {message}");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break;
            }
        }
    }

    match handle.outcome().await {
        PollOutcome::Completed(_) => {
            println!("✅ Payment {} completed", args.payment_id);
            Ok(())
        }
        PollOutcome::Failed(_) => Err(format!("payment {} failed", args.payment_id).into()),
        PollOutcome::Exhausted { attempts } => {
            Err(format!("payment still pending after {attempts} checks").into())
        }
        PollOutcome::Cancelled => Err("cancelled".into()),
    }
}
