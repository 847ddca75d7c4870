use anyhow::{Context, Result};
use payments_gateway::config::AppConfig;
use payments_gateway::domain::card::Transaction;
use payments_gateway::gateways::http_bank::HttpBankClient;
use payments_gateway::service::settlement::SettlementService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::from_env();
    cfg.init_tracing();

    let raw = tokio::fs::read(&cfg.settlement_batch_file)
        .await
        .with_context(|| format!("reading {}", cfg.settlement_batch_file))?;
    let transactions: Vec<Transaction> = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing {}", cfg.settlement_batch_file))?;

    let ctx = CancellationToken::new();
    let on_signal = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let service = SettlementService {
        bank: Arc::new(HttpBankClient::new(cfg.bank_base_url.clone(), cfg.bank_retry())),
    };
    let report = service.run(&ctx, &transactions).await?;

    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} transactions were not settled",
            report.failures.len(),
            report.submitted
        );
    }

    Ok(())
}
