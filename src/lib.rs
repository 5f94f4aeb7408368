pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod history;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Temperature Override: {:?}", args.chat_temperature);
    info!("Max Output Tokens Override: {:?}", args.chat_max_output_tokens);
    info!("Request Timeout: {}s", args.chat_timeout_secs);
    info!("API Key Set: {}", !args.google_api_key.trim().is_empty());
    info!("History Store: memory");
    info!("-------------------------");

    let agent = ChatAgent::new(&args)?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent);
    server.run().await?;

    Ok(())
}
