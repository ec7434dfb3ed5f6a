// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// One decoded transaction line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub name: String,
    pub surname: String,
    #[serde(deserialize_with = "decimal")]
    pub amount: f64,
    #[serde(deserialize_with = "decimal")]
    pub delta_t: f64,
    #[serde(deserialize_with = "binary_flag")]
    pub flag: bool,
}

impl Transaction {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Surname followed by name, with no separator.
    pub fn user_id(&self) -> String {
        format!("{}{}", self.surname, self.name)
    }
}

/// Producers send numbers as strings; bare JSON numbers are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("invalid decimal '{}': {}", text, e)))?,
    };

    if !value.is_finite() {
        return Err(de::Error::custom(format!("decimal must be finite, got {}", value)));
    }
    Ok(value)
}

fn binary_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) if n == 0.0 => Ok(false),
        NumberOrText::Number(n) if n == 1.0 => Ok(true),
        NumberOrText::Text(text) if text.trim() == "0" => Ok(false),
        NumberOrText::Text(text) if text.trim() == "1" => Ok(true),
        _ => Err(de::Error::custom("flag must be 0 or 1")),
    }
}
