//! Test assertions
//!
//! Provides assertion utilities for E2E tests.

use peeble_offline::fetch::{Response, ResponseSource};
use peeble_offline::host::MemoryClients;

/// Assertion result
pub type AssertResult = Result<(), String>;

/// Assert a response status
pub fn assert_status(response: &Response, status: u16) -> AssertResult {
    if response.status == status {
        Ok(())
    } else {
        Err(format!(
            "Expected status {}, got {} ({})",
            status,
            response.status,
            String::from_utf8_lossy(&response.body)
        ))
    }
}

/// Assert a response body
pub fn assert_body(response: &Response, body: &[u8]) -> AssertResult {
    if response.body == body {
        Ok(())
    } else {
        Err(format!(
            "Expected body {:?}, got {:?}",
            String::from_utf8_lossy(body),
            String::from_utf8_lossy(&response.body)
        ))
    }
}

/// Assert where a response came from
pub fn assert_source(response: &Response, source: ResponseSource) -> AssertResult {
    if response.source == source {
        Ok(())
    } else {
        Err(format!("Expected source {:?}, got {:?}", source, response.source))
    }
}

/// Assert that a window received exactly `count` relayed links, the last
/// of them with message type `message_type`.
pub fn assert_relayed(
    clients: &MemoryClients,
    client_id: &str,
    count: usize,
    message_type: &str,
) -> AssertResult {
    let messages = clients.messages_for(client_id);
    if messages.len() != count {
        return Err(format!(
            "Expected {} message(s) for {}, got {}",
            count,
            client_id,
            messages.len()
        ));
    }
    match messages.last() {
        Some(last) if last["type"] == message_type => Ok(()),
        Some(last) => Err(format!("Expected {} message, got {}", message_type, last["type"])),
        None if count == 0 => Ok(()),
        None => Err(String::from("No message relayed")),
    }
}

/// Assert that no window received anything
pub fn assert_nothing_relayed(clients: &MemoryClients, client_ids: &[&str]) -> AssertResult {
    for id in client_ids {
        let messages = clients.messages_for(id);
        if !messages.is_empty() {
            return Err(format!("Expected no messages for {}, got {}", id, messages.len()));
        }
    }
    Ok(())
}
