/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    Host bridge configuration.

--*/

use std::fmt;
use std::str::FromStr;

use log::{warn, LevelFilter};
use zhci_consts::DEFAULT_BOARD;

/// How offload requests reach the handler thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Through the simulated interrupt controller.
    #[default]
    Irq,
    /// Straight from the requesting thread.
    Direct,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "irq" => Ok(DeliveryMode::Irq),
            "direct" => Ok(DeliveryMode::Direct),
            other => Err(format!("unknown delivery mode {other:?} (expected irq or direct)")),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Irq => f.write_str("irq"),
            DeliveryMode::Direct => f.write_str("direct"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Board name printed in the kernel banner.
    pub board: String,
    pub delivery: DeliveryMode,
    /// Level used when the bridge installs its own logger.
    pub log_level: LevelFilter,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            board: DEFAULT_BOARD.into(),
            delivery: DeliveryMode::default(),
            log_level: LevelFilter::Info,
        }
    }
}

impl HostConfig {
    pub const BOARD_VAR: &'static str = "ZHCI_BOARD";
    pub const DELIVERY_VAR: &'static str = "ZHCI_DELIVERY";
    pub const LOG_VAR: &'static str = "ZHCI_LOG";

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by variable name. Unparsable values are
    /// reported and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(board) = lookup(Self::BOARD_VAR).filter(|b| !b.is_empty()) {
            self.board = board;
        }
        if let Some(value) = lookup(Self::DELIVERY_VAR) {
            match value.parse() {
                Ok(delivery) => self.delivery = delivery,
                Err(err) => warn!("ignoring {}: {err}", Self::DELIVERY_VAR),
            }
        }
        if let Some(value) = lookup(Self::LOG_VAR) {
            match value.parse() {
                Ok(level) => self.log_level = level,
                Err(_) => warn!("ignoring {}: unknown log level {value:?}", Self::LOG_VAR),
            }
        }
        self
    }
}
