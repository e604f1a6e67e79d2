//! Seed Transaction Generator
//!
//! Generates random transactions and submits them to a running Fraud Case
//! Service instance over HTTP, for demos and manual testing.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Submission payload matching the service's transaction intake format.
#[derive(Debug, Clone, Serialize)]
struct NewTransaction {
    user_id: String,
    amount: String,
    currency: String,
    transaction_type: String,
    merchant_id: String,
    merchant_name: String,
    merchant_category: String,
    ip_address: String,
    country: String,
    city: String,
    device_id: String,
    transaction_date: chrono::DateTime<Utc>,
}

/// Transaction generator for seeding
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a random legitimate-looking transaction
    fn generate_legitimate(&mut self) -> NewTransaction {
        let amount: f64 = self.rng.gen_range(10.0..500.0);

        NewTransaction {
            user_id: format!("user_{}", self.rng.gen_range(1..200)),
            amount: format!("{amount:.2}"),
            currency: self.random_choice(&["USD", "EUR", "GBP", "CAD"]).to_string(),
            transaction_type: self
                .random_choice(&["payment", "transfer", "withdrawal", "deposit"])
                .to_string(),
            merchant_id: format!("merchant_{}", self.rng.gen_range(1..1000)),
            merchant_name: self
                .random_choice(&["Corner Grocery", "City Cafe", "Gas & Go", "Pharma Plus"])
                .to_string(),
            merchant_category: self
                .random_choice(&["5411", "5812", "5541", "5912"])
                .to_string(),
            ip_address: self.random_ip(),
            country: self.random_choice(&["US", "GB", "CA", "DE", "FR"]).to_string(),
            city: self
                .random_choice(&["New York", "London", "Toronto", "Berlin", "Paris"])
                .to_string(),
            device_id: format!("device_{:016x}", self.rng.gen::<u64>()),
            transaction_date: Utc::now(),
        }
    }

    /// Generate a transaction shaped to trip the alert rules
    fn generate_suspicious(&mut self) -> NewTransaction {
        let amount: f64 = self.rng.gen_range(10_000.0..80_000.0); // High amount

        NewTransaction {
            // Small user pool so velocity builds up quickly
            user_id: format!("user_{}", self.rng.gen_range(1..5)),
            amount: format!("{amount:.2}"),
            currency: self.random_choice(&["USD", "EUR"]).to_string(),
            transaction_type: self
                .random_choice(&["withdrawal", "transfer"])
                .to_string(),
            merchant_id: format!("merchant_{}", self.rng.gen_range(1..1000)),
            merchant_name: "Wire Express".to_string(),
            merchant_category: "5999".to_string(),
            ip_address: self.random_ip(),
            country: self.random_choice(&["RU", "NG", "US"]).to_string(),
            city: String::new(),
            device_id: format!("device_{:016x}", self.rng.gen::<u64>()),
            transaction_date: Utc::now(),
        }
    }

    fn random_ip(&mut self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.rng.gen_range(1..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(1..255)
        )
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seed_transactions=info".parse()?),
        )
        .init();

    info!("Starting Seed Transaction Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("http://localhost:8080");
    let token = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("dev-analyst-token");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let endpoint = format!("{}/transactions/", base_url.trim_end_matches('/'));

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Submitting {} transactions...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;
    let mut failed_count = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let response = client
            .post(&endpoint)
            .bearer_auth(token)
            .json(&transaction)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                failed_count += 1;
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "Submission rejected");
            }
            Err(e) => {
                failed_count += 1;
                warn!(error = %e, "Submission failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Submitted {}/{} transactions ({} legitimate, {} suspicious, {} failed)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count,
                failed_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Submitted {} transactions ({} legitimate, {} suspicious, {} failed)",
        count, legitimate_count, suspicious_count, failed_count
    );

    Ok(())
}
