//! Wallet capability seam and unlock flags
//!
//! The injected browser-extension provider is modeled as a capability trait;
//! the simulation core never touches wallet globals or performs any
//! verification itself. Unlock state is read once at session start.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failures surfaced by a wallet provider implementation
#[derive(Debug, Clone, PartialEq)]
pub enum WalletError {
    /// No provider injected in this environment
    Unavailable,
    /// User declined the connection prompt
    Rejected,
    /// Provider-specific failure, passed through
    Provider(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::Unavailable => write!(f, "no wallet provider available"),
            WalletError::Rejected => write!(f, "wallet connection rejected"),
            WalletError::Provider(msg) => write!(f, "wallet provider error: {msg}"),
        }
    }
}

impl std::error::Error for WalletError {}

/// External capability interface over the injected wallet extension
pub trait WalletProvider {
    fn is_available(&self) -> bool;
    /// Prompt the user and return the connected address
    fn connect(&mut self) -> Result<String, WalletError>;
    fn address(&self) -> Option<String>;
    fn balance(&self) -> Result<f64, WalletError>;
}

/// Feature flags resolved by the surrounding app (NFT gallery lookup etc.)
/// and handed to the session once at start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockFlags {
    /// Wallet holds a qualifying NFT: sweetens the collectible curve and
    /// grants a revive token
    pub holds_qualifying_nft: bool,
}

impl UnlockFlags {
    /// Revive tokens granted at session start
    pub fn revive_tokens(&self) -> u32 {
        if self.holds_qualifying_nft { 1 } else { 0 }
    }
}

/// Taps required to toggle the cosmetic variant
const TAPS_REQUIRED: u8 = 3;
/// Taps further apart than this restart the count
const TAP_WINDOW_SECS: f64 = 1.5;

/// The "tap three times" Degen cosmetic toggle. A pure UI gesture: it flips
/// a visual variant and nothing else, and is deliberately independent of the
/// score-threshold Degen Mode transition in the difficulty director.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegenTapUnlock {
    taps: u8,
    last_tap: f64,
    enabled: bool,
}

impl DegenTapUnlock {
    pub fn new() -> Self {
        Self {
            taps: 0,
            last_tap: f64::NEG_INFINITY,
            enabled: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Register one tap at `now`. Returns true when the toggle flipped.
    pub fn register_tap(&mut self, now: f64) -> bool {
        if now - self.last_tap > TAP_WINDOW_SECS {
            self.taps = 0;
        }
        self.last_tap = now;
        self.taps += 1;

        if self.taps >= TAPS_REQUIRED {
            self.taps = 0;
            self.enabled = !self.enabled;
            log::info!("degen cosmetic variant {}", if self.enabled { "on" } else { "off" });
            return true;
        }
        false
    }
}

impl Default for DegenTapUnlock {
    fn default() -> Self {
        Self::new()
    }
}
