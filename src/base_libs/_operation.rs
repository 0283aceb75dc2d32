use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    BAD,
    GET,
    SET,
    DELETE,
    REMOVE,
    COMMIT,
    CLEAR,
    PENDING,
    STATS,
    WAIT,
}

// ---OperationType---
impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            OperationType::BAD => "BAD",
            OperationType::GET => "GET",
            OperationType::SET => "SET",
            OperationType::DELETE => "DEL",
            OperationType::REMOVE => "RM",
            OperationType::COMMIT => "COMMIT",
            OperationType::CLEAR => "CLEAR",
            OperationType::PENDING => "PENDING",
            OperationType::STATS => "STATS",
            OperationType::WAIT => "WAIT",
        };

        write!(f, "{}", str)
    }
}

/// One console command: `SET <key> <json>`, `GET <key>`, `COMMIT`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub op_type: OperationType,
    pub key: String,
    // Raw JSON text, only meaningful for SET
    pub value: String,
}

// ---Operation---
impl Operation {
    pub fn new(op_type: OperationType, key: &str, value: &str) -> Self {
        Operation {
            op_type,
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn bad(reason: &str) -> Self {
        Operation::new(OperationType::BAD, "", reason)
    }

    pub fn from_string(command: &str) -> Self {
        let (verb, rest) = split_token(command.trim());
        let (key, value) = split_token(rest);

        match (verb.to_ascii_uppercase().as_str(), key, value) {
            ("", _, _) => Operation::bad("empty command"),
            ("GET", key, "") if !key.is_empty() => Operation::new(OperationType::GET, key, ""),
            ("SET", key, value) if !key.is_empty() && !value.is_empty() => {
                Operation::new(OperationType::SET, key, value)
            }
            ("DEL", key, "") if !key.is_empty() => Operation::new(OperationType::DELETE, key, ""),
            ("RM", key, "") if !key.is_empty() => Operation::new(OperationType::REMOVE, key, ""),
            ("COMMIT", "", _) => Operation::new(OperationType::COMMIT, "", ""),
            ("CLEAR", "", _) => Operation::new(OperationType::CLEAR, "", ""),
            ("PENDING", "", _) => Operation::new(OperationType::PENDING, "", ""),
            ("STATS", "", _) => Operation::new(OperationType::STATS, "", ""),
            ("WAIT", "", _) => Operation::new(OperationType::WAIT, "", ""),
            (verb, _, _) => Operation::bad(&format!("malformed command `{}`", verb)),
        }
    }
}

fn split_token(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (input, ""),
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.op_type, self.key, self.value)
    }
}
