//! Reporting — plain-text summary, JSON result, CSV execution tape.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── Text ───────────────────────────────────────────────────────────

/// Human-readable report: run header, signal list, portfolio summary.
pub fn render_text(result: &BacktestResult) -> String {
    let risk = &result.risk;
    let mut out = format!(
        "{} {} on {} ({} to {}, {} bars)\nStop loss: {:.1}%; Take profit: {:.1}%\n\n",
        result.strategy,
        risk.observation_window(),
        result.symbol,
        result.start_date,
        result.end_date,
        result.bar_count,
        risk.stop_loss_pct() * 100.0,
        risk.take_profit_pct() * 100.0
    );

    if result.signals.is_empty() {
        out.push_str("No signals generated\n");
    }
    for signal in &result.signals {
        out.push_str(&format!("{signal}\n"));
    }

    let s = &result.summary;
    out.push_str("\n================== Portfolio Summary ==================\n");
    out.push_str(&format!(
        "Final Cash Balance: {:.3}\n\
         Shares Owned: {:.3}\n\
         Last execution price: {:.3}\n\
         Net Profit: {:.3}, in percent {:.3}%\n",
        s.final_cash_balance, s.shares_owned, s.last_execution_price, s.net_profit, s.net_profit_pct
    ));
    out
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a result, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

pub fn write_json(result: &BacktestResult, path: &Path) -> Result<()> {
    let json = export_json(result)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One row per execution: kind, date, price, shares, cash after.
pub fn write_executions_csv(result: &BacktestResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for execution in &result.executions {
        writer
            .serialize(execution)
            .context("failed to write execution row")?;
    }
    writer.flush().context("failed to flush execution tape")?;
    Ok(())
}
