//! Demo relay server backed by a scripted inventory source.
//!
//! Run with: `cargo run --example parts_server`

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use serde_json::json;
use uistream_server::integrations::axum::RelayRouter;
use uistream_server::prelude::*;

/// A scripted source reproducing a full engine-parts turn: a short
/// textual answer, a tool call, and the tool's structured result.
struct ScriptedInventorySource;

#[async_trait]
impl ChunkSource for ScriptedInventorySource {
    async fn open(&self, request: SourceRequest, _ctx: RunContext) -> SourceResult<ChunkStream> {
        let subject = request.latest_prompt().unwrap_or("engine").to_string();

        let items: Vec<SourceResult<JsonValue>> = vec![
            Ok(json!({"type": "text-start", "id": "text-0"})),
            Ok(json!({
                "type": "text-delta",
                "id": "text-0",
                "text": format!("Here is the parts inventory for {subject}. "),
            })),
            Ok(json!({
                "type": "text-delta",
                "id": "text-0",
                "text": "Quantities are per assembly.",
            })),
            Ok(json!({"type": "text-end", "id": "text-0"})),
            Ok(json!({
                "type": "tool-call",
                "toolName": "industrialInventory",
                "input": subject,
            })),
            Ok(json!({
                "type": "tool-result",
                "input": subject,
                "output": {"parts": [
                    {"name": "Engine Block", "quantity": 1},
                    {"name": "Pistons", "quantity": 4},
                    {"name": "Crankshaft", "quantity": 1},
                    {"name": "Connecting Rods", "quantity": 4},
                    {"name": "Camshaft", "quantity": 1},
                    {"name": "Valve Assembly", "quantity": 8},
                    {"name": "Oil Pump", "quantity": 1},
                    {"name": "Water Pump", "quantity": 1},
                ]},
            })),
        ];

        Ok(Box::pin(stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "scripted-inventory"
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let source: Arc<dyn ChunkSource> = Arc::new(ScriptedInventorySource);

    let app = RelayRouter::new(source)
        .with_config(RelayConfig::default().with_stall_timeout(Duration::from_secs(30)))
        .into_router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("failed to bind to address");

    println!("uistream relay listening on http://127.0.0.1:3000");
    println!("  POST /api/parts - stream a parts turn");
    println!("  POST /api/chat - stream a chat turn");
    println!("  GET /health - health check");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
