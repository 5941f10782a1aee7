//! Human-readable rendering of amounts and stats.

use crate::domain::book::LoanStats;
use crate::domain::money::round_money;
use crate::error::LoanError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Currency symbol used for display. Amounts are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    #[default]
    Php,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Php => "₱",
        }
    }

    /// Formats `amount` as e.g. `₱1,234.50` or `-$0.75`.
    pub fn format(self, amount: Decimal) -> String {
        let rounded = round_money(amount);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        let cents = format!("{:.2}", rounded.abs());
        let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        format!("{sign}{}{grouped}.{fraction}", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "php" => Ok(Currency::Php),
            other => Err(LoanError::InvalidInput(format!("unknown currency '{other}'"))),
        }
    }
}

/// Renders the stats block printed by `loantrack stats`.
pub fn render_stats(stats: &LoanStats, currency: Currency) -> String {
    let upcoming = match &stats.upcoming_payment {
        Some(upcoming) => format!(
            "{} due {} ({})",
            currency.format(upcoming.amount.value()),
            upcoming.due_date,
            upcoming.loan_name
        ),
        None => "none".to_string(),
    };

    format!(
        "Total loans: {}\nActive loans: {}\nTotal balance: {}\nUpcoming payment: {}\n",
        stats.total_loans,
        stats.active_loans,
        currency.format(stats.total_balance.value()),
        upcoming
    )
}
