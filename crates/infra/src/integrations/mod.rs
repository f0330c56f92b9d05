//! External service integrations

pub mod webhook_tester;

pub use webhook_tester::WebhookConnectionTester;
