//! Traffic Light
//!
//! A cyclic machine whose entry actions drive it forward by posting the
//! next transition themselves.
//!
//! Key concepts:
//! - Posting from inside an entry action (deferred until the action ends)
//! - Intercepts observing transitions in flight
//! - Per-session payload shared with every callback
//!
//! Run with: cargo run --example traffic_light

use anyhow::Result;
use statecraft::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

symbol_enum! {
    enum Light {
        Red,
        Green,
        Yellow,
    }
}

symbol_enum! {
    enum Signal {
        Go,
        Slow,
        Stop,
    }
}

struct Junction {
    cycles: AtomicUsize,
    max_cycles: usize,
    done: Notify,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "statecraft=debug".to_string()))
        .init();

    println!("=== Traffic Light ===\n");

    let mut builder = MachineBuilder::<Light, Signal, Junction>::new();
    builder
        .add_state(Light::Red)?
        .add_state(Light::Green)?
        .add_state(Light::Yellow)?
        .add_transition(Light::Red, Signal::Go, Light::Green)?
        .add_transition(Light::Green, Signal::Slow, Light::Yellow)?
        .add_transition(Light::Yellow, Signal::Stop, Light::Red)?;

    for (from, label) in [
        (Light::Red, Signal::Go),
        (Light::Green, Signal::Slow),
        (Light::Yellow, Signal::Stop),
    ] {
        builder.intercept(from, label, |ctx| async move {
            println!(
                "  {:?} -> {:?} on {:?}",
                ctx.start_state(),
                ctx.end_state(),
                ctx.label()
            );
            Ok(())
        })?;
    }

    builder
        .on_enter(Light::Red, |session| async move {
            let junction = session.payload();
            let cycle = junction.cycles.fetch_add(1, Ordering::SeqCst) + 1;
            if cycle > junction.max_cycles {
                junction.done.notify_one();
                return Ok(());
            }
            println!("Cycle {cycle}: stop");
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.post(Signal::Go)?;
            Ok(())
        })?
        .on_enter(Light::Green, |session| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.post(Signal::Slow)?;
            Ok(())
        })?
        .on_enter(Light::Yellow, |session| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session.post(Signal::Stop)?;
            Ok(())
        })?;

    let machine = builder.compile()?;
    let session = machine.start_entering(
        Light::Red,
        Junction {
            cycles: AtomicUsize::new(0),
            max_cycles: 3,
            done: Notify::new(),
        },
    )?;

    session.payload().done.notified().await;

    let snapshot = session.snapshot();
    println!("\nFinal snapshot:\n{snapshot:#?}");

    session.dispose();
    println!("\n=== Example Complete ===");
    Ok(())
}
