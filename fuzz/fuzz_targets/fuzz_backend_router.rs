//! Fuzz target: `BackendRouter::dispatch`
//!
//! Feeds arbitrary payloads to a router with the ingest handler attached.
//! The router must never panic, and exactly the well-formed `MEASUREMENT`
//! messages may reach the repository.
//!
//! cargo fuzz run fuzz_backend_router

#![no_main]

use libfuzzer_sys::fuzz_target;
use parkdistance::app::ports::InboundMessage;
use parkdistance::backend::BackendRouter;
use parkdistance::backend::ingest::{IngestHandler, InMemoryRepository};

fuzz_target!(|data: &[u8]| {
    let repo = InMemoryRepository::new();
    let mut router = BackendRouter::new();
    router.add_handler(IngestHandler::new(repo.clone()));

    router.dispatch(&InboundMessage {
        topic: "parkdistance/fuzz/measurements".into(),
        payload: data.to_vec(),
    });

    let is_measurement = serde_json::from_slice::<serde_json::Value>(data)
        .ok()
        .and_then(|v| v.get("command").and_then(|c| c.as_str()).map(|c| c == "MEASUREMENT"))
        .unwrap_or(false);
    assert_eq!(repo.len(), usize::from(is_measurement));
});
