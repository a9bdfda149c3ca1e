//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use scribble::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<String>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let players = setup.players.iter().map(|s| s.as_str()).collect();
        Self::for_players(setup, players)
    }

    /// Create an assertion for specific players on their default connections
    pub fn for_players(setup: &'a TestSetup, players: Vec<&str>) -> Self {
        let connections = players
            .into_iter()
            .map(TestSetup::connection_of)
            .collect();
        Self { setup, connections }
    }

    /// Create an assertion for one explicit connection handle
    pub fn for_connection(setup: &'a TestSetup, connection_id: &str) -> Self {
        Self {
            setup,
            connections: vec![connection_id.to_string()],
        }
    }

    async fn messages_of(&self, connection_id: &str) -> Vec<WebSocketMessage> {
        self.setup
            .mock_conn_manager
            .get_messages_for(connection_id)
            .await
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }

    /// Assert the next unread message is `expected_type` for every connection (consumes it)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            assert!(
                message.is_some(),
                "{} should have received a message",
                connection
            );

            let msg: WebSocketMessage = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert every connection has at least one unread message of `expected_type`
    /// and return the latest one of the first connection (non-consuming)
    pub async fn has_received(&self, expected_type: MessageType) -> MessageContent {
        let mut found = None;
        for connection in &self.connections {
            let latest = self
                .messages_of(connection)
                .await
                .into_iter()
                .rev()
                .find(|m| m.message_type == expected_type);
            assert!(
                latest.is_some(),
                "{} should have received {:?}",
                connection,
                expected_type
            );
            if found.is_none() {
                found = latest;
            }
        }

        MessageContent {
            payload: found.map(|m| m.payload).unwrap_or_default(),
        }
    }

    /// Assert no connection has a message of `unexpected_type`
    pub async fn has_not_received(&self, unexpected_type: MessageType) {
        for connection in &self.connections {
            let count = self.count_message_type(connection, unexpected_type).await;
            assert_eq!(
                count, 0,
                "{} should not have received {:?}",
                connection, unexpected_type
            );
        }
    }

    /// Assert that players received no messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self.setup.mock_conn_manager.get_messages_for(connection).await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Count how many messages of a specific type a connection received (non-consuming)
    pub async fn count_message_type(&self, connection_id: &str, msg_type: MessageType) -> usize {
        self.messages_of(connection_id)
            .await
            .iter()
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }

    /// Assert that connections received a sequence of message types in order
    pub async fn received_message_sequence(
        self,
        expected_types: Vec<MessageType>,
    ) -> Vec<MessageContent> {
        let mut result_messages = vec![];

        for connection in &self.connections {
            let messages = self.messages_of(connection).await;
            let actual: Vec<MessageType> = messages.iter().map(|m| m.message_type).collect();
            assert!(
                actual.len() >= expected_types.len(),
                "{} should have received {:?}, got {:?}",
                connection,
                expected_types,
                actual
            );
            assert_eq!(
                &actual[..expected_types.len()],
                &expected_types[..],
                "{} received the wrong sequence",
                connection
            );

            // Only collect messages from the first connection to avoid duplicates
            if connection == &self.connections[0] {
                result_messages = messages
                    .into_iter()
                    .take(expected_types.len())
                    .map(|m| MessageContent { payload: m.payload })
                    .collect();
            }
        }

        result_messages
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    pub payload: serde_json::Value,
}

impl MessageContent {
    /// Assert a payload field equals `expected`
    pub fn with<T: Into<serde_json::Value>>(self, field: &str, expected: T) -> Self {
        assert_eq!(
            self.payload[field],
            expected.into(),
            "payload field {} mismatch in {}",
            field,
            self.payload
        );
        self
    }

    /// Assert the RESULT reply reports success
    pub fn succeeded(self) -> Self {
        self.with("success", true)
    }

    /// Assert the RESULT reply reports a failure with this message
    pub fn failed_with(self, error: &str) -> Self {
        self.with("success", false).with("error", error)
    }

    /// Score of `username` in the payload's `players` list
    pub fn score_of(&self, username: &str) -> i64 {
        self.payload["players"]
            .as_array()
            .and_then(|players| players.iter().find(|p| p["username"] == username))
            .and_then(|p| p["score"].as_i64())
            .unwrap_or_else(|| panic!("{} missing from players in {}", username, self.payload))
    }
}
