//! Multi-denomination balances
//!
//! `Coins` is kept sorted by denom with at most one entry per denom. Amounts
//! are exact decimals so redistribution splits never lose value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Single denomination amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Amount (exact decimal)
    pub amount: Decimal,
}

impl Coin {
    /// Create new coin
    pub fn new(denom: impl Into<String>, amount: impl Into<Decimal>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// A fee or amount entry is usable if it has a denom and is not negative
    pub fn is_valid(&self) -> bool {
        !self.denom.is_empty() && self.amount >= Decimal::ZERO
    }

    /// Zero amount
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Sorted set of coins, one entry per denom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Empty balance
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build from arbitrary entries; merges duplicates and drops zeros
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut merged: BTreeMap<String, Decimal> = BTreeMap::new();
        for coin in coins {
            *merged.entry(coin.denom).or_insert(Decimal::ZERO) += coin.amount;
        }
        Self::from_map(merged)
    }

    fn from_map(map: BTreeMap<String, Decimal>) -> Self {
        Self(
            map.into_iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        )
    }

    fn to_map(&self) -> BTreeMap<String, Decimal> {
        self.0
            .iter()
            .map(|c| (c.denom.clone(), c.amount))
            .collect()
    }

    /// Entries in denom order
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    /// Amount held in `denom` (zero if absent)
    pub fn amount_of(&self, denom: &str) -> Decimal {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// No entries
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Coin::is_zero)
    }

    /// Sorted, unique denoms, strictly positive amounts
    pub fn is_valid(&self) -> bool {
        let sorted = self.0.windows(2).all(|w| w[0].denom < w[1].denom);
        sorted
            && self
                .0
                .iter()
                .all(|c| !c.denom.is_empty() && c.amount > Decimal::ZERO)
    }

    /// Every denom in `other` is covered by `self`
    pub fn is_gte(&self, other: &Coins) -> bool {
        other.0.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// Sum
    pub fn plus(&self, other: &Coins) -> Coins {
        let mut map = self.to_map();
        for coin in &other.0 {
            *map.entry(coin.denom.clone()).or_insert(Decimal::ZERO) += coin.amount;
        }
        Self::from_map(map)
    }

    /// Difference, `None` if any denom would go negative
    pub fn checked_minus(&self, other: &Coins) -> Option<Coins> {
        if !self.is_gte(other) {
            return None;
        }
        let mut map = self.to_map();
        for coin in &other.0 {
            *map.entry(coin.denom.clone()).or_insert(Decimal::ZERO) -= coin.amount;
        }
        Some(Self::from_map(map))
    }

    /// Scale every entry by `rate`
    pub fn mul_rate(&self, rate: Decimal) -> Coins {
        Self::from_coins(
            self.0
                .iter()
                .map(|c| Coin::new(c.denom.clone(), c.amount * rate)),
        )
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self::from_coins([coin])
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}
