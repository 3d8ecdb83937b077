//! Order Pipeline
//!
//! Several orders run through the same compiled machine at once. Payment
//! fails for some of them and the fault handlers decide what happens next.
//!
//! Key concepts:
//! - One machine, many concurrent sessions
//! - State-local fault handler versus the machine-wide fallback
//! - A rethrowing handler moving a session to the Error lifecycle
//!
//! Run with: cargo run --example order_pipeline

use anyhow::{bail, Result};
use statecraft::prelude::*;
use std::time::Duration;

symbol_enum! {
    enum OrderState {
        Received,
        Paid,
        Shipped,
        Cancelled,
    }
}

symbol_enum! {
    enum OrderEvent {
        Pay,
        Ship,
        Cancel,
    }
}

#[derive(Debug)]
struct Order {
    number: u32,
    amount_cents: u64,
}

const CARD_LIMIT_CENTS: u64 = 50_000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "statecraft=info".to_string()))
        .init();

    println!("=== Order Pipeline ===\n");

    let mut builder = MachineBuilder::<OrderState, OrderEvent, Order>::new();
    builder
        .add_state(OrderState::Received)?
        .add_state(OrderState::Paid)?
        .add_state(OrderState::Shipped)?
        .add_state(OrderState::Cancelled)?
        .add_transition(OrderState::Received, OrderEvent::Pay, OrderState::Paid)?
        .add_transition(OrderState::Received, OrderEvent::Cancel, OrderState::Cancelled)?
        .add_transition(OrderState::Paid, OrderEvent::Ship, OrderState::Shipped)?
        .add_transition(OrderState::Paid, OrderEvent::Cancel, OrderState::Cancelled)?
        .intercept(OrderState::Paid, OrderEvent::Ship, |ctx| async move {
            println!("  order {} leaving the warehouse", ctx.payload().number);
            Ok(())
        })?
        .on_enter(OrderState::Paid, |session| async move {
            let order = session.payload();
            tokio::time::sleep(Duration::from_millis(20)).await;
            if order.amount_cents > CARD_LIMIT_CENTS {
                bail!("card declined for {} cents", order.amount_cents);
            }
            session.post(OrderEvent::Ship)?;
            Ok(())
        })?
        .on_enter_fault(OrderState::Paid, |session, err| {
            println!("  order {} payment failed: {err}", session.payload().number);
            session.post(OrderEvent::Cancel)?;
            Ok(())
        })?
        .on_enter(OrderState::Shipped, |session| async move {
            if session.payload().number % 5 == 0 {
                bail!("carrier rejected order {}", session.payload().number);
            }
            Ok(())
        })?;
    builder.on_fault(|session, err| {
        println!("  order {} needs manual review: {err}", session.payload().number);
        Err(anyhow::anyhow!("unrecoverable: {err}"))
    });

    let machine = builder.compile()?;

    let sessions = (1..=10)
        .map(|number| -> Result<_> {
            let order = Order {
                number,
                amount_cents: u64::from(number) * 9_000,
            };
            let session = machine.start(OrderState::Received, order)?;
            session.post(OrderEvent::Pay)?;
            Ok(session)
        })
        .collect::<Result<Vec<_>>>()?;

    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\nResults:");
    for session in &sessions {
        println!(
            "  order {:>2}: {:<9} {:?}",
            session.payload().number,
            session.current_state().name(),
            session.lifecycle()
        );
        session.dispose();
    }

    println!("\nLive sessions after dispose: {}", machine.session_count());
    println!("\n=== Example Complete ===");
    Ok(())
}
