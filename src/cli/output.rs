//! Rendering of command results for stdout.

use crate::blockchain::query::CoinInfo;
use crate::blockchain::types::TransactionOutcome;

/// Result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Finalized record of the submitted transaction.
    Transaction(TransactionOutcome),
    /// Decoded registry listing.
    Coins(Vec<CoinInfo>),
}

impl CommandOutput {
    /// Pretty JSON, as printed to stdout.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            CommandOutput::Transaction(outcome) => serde_json::to_string_pretty(&outcome.record),
            CommandOutput::Coins(coins) => serde_json::to_string_pretty(coins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_renders_full_record() {
        let record = json!({
            "type": "user_transaction",
            "hash": format!("0x{}", "03".repeat(32)),
            "success": true,
            "events": [],
        });
        let output =
            CommandOutput::Transaction(TransactionOutcome::from_record(record.clone()).unwrap());
        let rendered = output.render().unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&rendered).unwrap(), record);
        assert!(rendered.contains("\"events\": []"));
    }

    #[test]
    fn test_empty_listing() {
        let output = CommandOutput::Coins(vec![]);
        assert_eq!(output.render().unwrap(), "[]");
    }
}
