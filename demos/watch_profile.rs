//! Example composing one change stream over a nested profile.
//!
//! This example shows how to:
//! - Build an observed object graph from cells, records and lists
//! - Watch a subset of it with indentation-based watch text
//! - Receive path-annotated events, including list elements
//! - Unsubscribe from every field by dropping one handle
//!
//! Run with: RUST_LOG=obsweave=trace cargo run --example watch_profile

use obsweave::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const WATCH: &str = "
name
address
  city
contacts
  email
";

fn contact(email: &str) -> (Arc<ObservedRecord>, Arc<ObservedCell<String>>) {
    let email = Arc::new(ObservedCell::new(email.to_string()));
    let record = ObservedRecord::builder("Contact")
        .field("email", Arc::clone(&email))
        .field("phone", Arc::new(ObservedCell::new(String::new())))
        .build();
    (record, email)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Watch Profile Example ===\n");

    let name = Arc::new(ObservedCell::new("Ada".to_string()));
    let city = Arc::new(ObservedCell::new("London".to_string()));
    let zip = Arc::new(ObservedCell::new("N1".to_string()));
    let contacts = Arc::new(ObservedVec::new());

    let address = ObservedRecord::builder("Address")
        .field("city", Arc::clone(&city))
        .field("zip", Arc::clone(&zip))
        .build();
    let profile = ObservedRecord::builder("Profile")
        .field("name", Arc::clone(&name))
        .field("address", address)
        .field("contacts", Arc::clone(&contacts))
        .build();

    println!("Initial snapshot: {}\n", profile.snapshot());

    let stream = change_stream(profile.as_ref(), WATCH)?;
    let subscription = stream.subscribe(|event| match &event.old_value {
        Some(old) => println!("[{}] {}: {} -> {}", event.action, event.path, old, event.model),
        None => println!("[{}] {}: {}", event.action, event.path, event.model),
    });

    println!("Changing watched fields...");
    name.set("Ada Lovelace".to_string())?;
    city.set("Marylebone".to_string())?;

    println!("\nChanging an unwatched field (no event expected)...");
    zip.set("W1".to_string())?;

    println!("\nEditing the contact list...");
    let (work, work_email) = contact("ada@work.example");
    let (home, home_email) = contact("ada@home.example");
    contacts.push(work)?;
    contacts.push(home)?;
    home_email.set("ada@lovelace.example".to_string())?;
    contacts.remove(0);
    home_email.set("countess@lovelace.example".to_string())?;
    work_email.set("ignored@work.example".to_string())?;

    println!("\nDropping the subscription...");
    subscription.unsubscribe();
    name.set("A. A. Lovelace".to_string())?;
    println!("No events after unsubscribe.");

    println!("\nFinal snapshot: {}", profile.snapshot());
    println!("\n=== Example Complete ===");
    Ok(())
}
