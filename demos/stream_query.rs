//! Stores a memory, then asks about it and prints the answer as it streams in
//!
//! Run with: MEMVAULT_API_KEY=... cargo run --example stream_query -- "what tea do I like?"

use futures::StreamExt;
use memvault::{
    Client, ClientConfig,
    resources::{memories::CreateMemory, query::QueryRequest},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    delta: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "what tea do I like?".to_owned());

    let client = Client::new(ClientConfig::from_env()?)?;

    let memory = client
        .memories()
        .create(&CreateMemory::new("Prefers green tea, especially sencha").tag("prefs"))
        .await?;
    println!("stored {}", memory.id);

    let mut stream = match client.query().stream(&QueryRequest::new(question)).await {
        Ok(stream) => stream,
        Err(e) if e.is_auth_error() => {
            eprintln!("the api key was rejected: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    while let Some(event) = stream.next().await {
        let event = event?;
        match &*event.event {
            "text" => match event.json::<Delta>() {
                Ok(delta) => print!("{}", delta.delta),
                Err(e) => eprintln!("\nskipping malformed delta at {}: {e}", e.path()),
            },
            "done" => break,
            other => eprintln!("\n[{other}] {}", event.data),
        }
    }

    println!();
    client.memories().delete(&memory.id).await?;
    Ok(())
}
