//! Plain-text rendering of dashboard state for the terminal front end

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::ticker::{PriceSample, estimated_value};
use crate::transfer::{TransferStep, TransferWizard};
use crate::types::{Account, Direction, PortfolioEntry, Transaction};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const DATE_FORMAT: &str = "%d %b %Y, %H:%M";

pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

pub fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map_or_else(|| "-".to_string(), |t| t.format(DATE_FORMAT).to_string())
}

/// Welcome line, account number and balance
pub fn account_card(account: &Account, username: Option<&str>) -> String {
    let name = Some(account.username.as_str())
        .filter(|u| !u.is_empty())
        .or(username)
        .unwrap_or("there");

    [
        format!("Welcome back, {name}"),
        format!("Account   {}", display_or_dash(&account.account_number)),
        format!("Balance   {}", format_money(account.current_balance)),
    ]
    .join("\n")
}

/// Transaction history, newest as delivered by the backend
pub fn history_table(transactions: &[Transaction], my_account_id: Option<i64>) -> String {
    if transactions.is_empty() {
        return "No transactions yet.".to_string();
    }

    let mut lines = vec![format!(
        "{:<10} {:>14} {:<10} {}",
        "Type", "Amount", "Status", "Date"
    )];
    for txn in transactions {
        let direction = txn.direction(my_account_id);
        let sign = match direction {
            Direction::Debit => '-',
            Direction::Credit => '+',
        };
        let amount = format!("{sign}{}", format_money(txn.amount));
        lines.push(format!(
            "{:<10} {:>14} {:<10} {}",
            direction.to_string(),
            amount,
            display_or_dash(&txn.status),
            format_timestamp(txn.timestamp)
        ));
    }
    lines.join("\n")
}

/// Positions with cost basis and, when a live price is known, market value
pub fn portfolio_table(entries: &[PortfolioEntry], price: Option<f64>) -> String {
    if entries.is_empty() {
        return "No holdings yet.".to_string();
    }

    let mut lines = vec![format!(
        "{:<8} {:>6} {:>12} {:>14} {:>14}",
        "Symbol", "Qty", "Avg price", "Invested", "Est. value"
    )];
    for entry in entries {
        let value = price
            .and_then(|p| estimated_value(entry, p))
            .map_or_else(|| "-".to_string(), format_money);
        lines.push(format!(
            "{:<8} {:>6} {:>12} {:>14} {:>14}",
            entry.stock_symbol,
            entry.quantity,
            format_money(entry.avg_buy_price),
            entry
                .invested()
                .map_or_else(|| "-".to_string(), format_money),
            value
        ));
    }
    lines.join("\n")
}

/// One character per sample, scaled between the window's min and max
pub fn sparkline(samples: &[PriceSample]) -> String {
    let Some(first) = samples.first() else {
        return String::new();
    };

    let (min, max) = samples.iter().fold((first.price, first.price), |(lo, hi), s| {
        (lo.min(s.price), hi.max(s.price))
    });
    let span = max - min;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    samples
        .iter()
        .map(|s| {
            if span <= f64::EPSILON {
                return SPARK_LEVELS[SPARK_LEVELS.len() / 2];
            }
            let level = (((s.price - min) / span) * top).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Latest price, change across the window and the sparkline
pub fn ticker_line(symbol: &str, samples: &[PriceSample]) -> String {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return format!("{symbol}  waiting for prices...");
    };
    let change = last.price - first.price;
    format!(
        "{symbol}  ${:.2}  {change:+.2}  {}",
        last.price,
        sparkline(samples)
    )
}

/// Current wizard step with its banner
pub fn transfer_status(wizard: &TransferWizard) -> String {
    let step = match wizard.step() {
        TransferStep::EnteringDetails => "Enter recipient and amount",
        TransferStep::AwaitingOtp => "Enter the OTP sent to your email",
        TransferStep::Confirmed => "Transfer complete",
    };

    let mut lines = vec![step.to_string()];
    if let Some(notice) = wizard.notice() {
        lines.push(notice.to_string());
    }
    if let Some(error) = wizard.error() {
        lines.push(format!("Error: {error}"));
    }
    lines.join("\n")
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
