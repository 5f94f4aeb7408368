pub mod api;

use crate::agent::ChatAgent;
use log::info;
use std::error::Error;
use tokio::net::TcpListener;

pub struct Server {
    addr: String,
    agent: ChatAgent,
}

impl Server {
    pub fn new(addr: String, agent: ChatAgent) -> Self {
        Self { addr, agent }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await.map_err(|e|
            format!("Failed to bind HTTP server to {}: {}. Try a different address.", self.addr, e)
        )?;
        info!("HTTP API listening on: http://{}", listener.local_addr()?);

        let app = api::router(self.agent.clone());
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
