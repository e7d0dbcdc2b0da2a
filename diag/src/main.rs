use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use common::{AwsCredentials, CostQuery, Granularity, GroupByClause, TimePeriod};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "billing-diag")]
struct Args {
    #[arg(long, default_value = "config")]
    config_file: String,

    #[arg(long, default_value_t = 30)]
    days: i64,
}

#[derive(Deserialize)]
struct DiagConfig {
    aws_access_key_id: String,
    aws_secret_access_key: String,
    #[serde(default = "default_region")]
    aws_region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn load_config(config_file: &str) -> Result<DiagConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(config_file).required(false))
        .add_source(config::Environment::default())
        .build()?;
    let cfg: DiagConfig = settings.try_deserialize()?;
    Ok(cfg)
}

fn trailing_window(days: i64) -> TimePeriod {
    let end = Utc::now().date_naive();
    let start = end - chrono::Duration::days(days);
    TimePeriod {
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
    }
}

// Display-level only; everywhere else amounts stay strings.
fn display_amount(amount: Option<&common::Metrics>) -> f64 {
    amount
        .map(|m| m.amount.parse::<f64>().unwrap_or(0.0))
        .unwrap_or(0.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("diag=info"));

    let args = Args::parse();
    let cfg = load_config(&args.config_file)?;

    let credentials = AwsCredentials {
        access_key_id: cfg.aws_access_key_id,
        secret_access_key: cfg.aws_secret_access_key,
        region: cfg.aws_region,
    };
    if let Err(reason) = credentials.validate() {
        log::warn!("Credential shape check failed: {reason}");
    }
    log::info!("Using region {}", credentials.region);

    // A cheap dimension lookup doubles as a credential probe.
    log::info!("Testing AWS credentials...");
    match ce::get_dimension_values(&credentials, "SERVICE", &trailing_window(7)).await {
        Ok(services) => {
            log::info!(
                "Credentials valid, found {} services in the last 7 days",
                services.len()
            );
            if !services.is_empty() {
                let sample: Vec<&str> = services.iter().take(5).map(String::as_str).collect();
                log::info!("Sample services: {}", sample.join(", "));
            }
        }
        Err(err) => {
            log::error!("Credential probe failed: {err}");
            log::error!("Check the AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY environment");
            log::error!("Ensure the user has Cost Explorer permissions");
            log::error!("Verify the credentials have not expired");
            log::error!("Make sure AWS_REGION matches the account setup");
            bail!("credential probe failed");
        }
    }

    log::info!("Retrieving cost data for the last {} days...", args.days);
    let daily_query = CostQuery {
        time_period: trailing_window(args.days),
        granularity: Granularity::Daily,
        group_by: Vec::new(),
        metrics: vec!["BlendedCost".to_string()],
        filter: None,
    };
    let daily = ce::get_cost_and_usage(&credentials, &daily_query).await?;
    log::info!("Retrieved {} daily cost records", daily.results.len());

    if daily.results.is_empty() {
        log::warn!("No cost data found for the period; the account may have no recent usage");
    } else {
        let mut total = 0.0;
        for result in &daily.results {
            let amount = display_amount(
                result
                    .total
                    .as_ref()
                    .and_then(|metrics| metrics.blended_cost.as_ref()),
            );
            total += amount;
            log::info!("{}: ${:.2}", result.time_period.start, amount);
        }
        log::info!("Total cost ({} days): ${:.2}", args.days, total);
        log::info!(
            "Average daily cost: ${:.2}",
            total / daily.results.len() as f64
        );
    }

    log::info!("Getting cost breakdown by service...");
    let breakdown_query = CostQuery {
        time_period: trailing_window(args.days),
        granularity: Granularity::Monthly,
        group_by: vec![GroupByClause {
            r#type: "DIMENSION".to_string(),
            key: "SERVICE".to_string(),
        }],
        metrics: vec!["BlendedCost".to_string()],
        filter: None,
    };
    let breakdown = ce::get_cost_and_usage(&credentials, &breakdown_query).await?;

    let mut service_costs: Vec<(String, f64)> = Vec::new();
    for result in &breakdown.results {
        for group in &result.groups {
            let service = group
                .keys
                .first()
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            let amount = display_amount(group.metrics.blended_cost.as_ref());
            service_costs.push((service, amount));
        }
    }

    if service_costs.is_empty() {
        log::warn!("No service breakdown data available");
    } else {
        service_costs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        log::info!("Costs for {} services (top 10):", service_costs.len());
        for (service, cost) in service_costs.iter().take(10) {
            log::info!("{service}: ${cost:.2}");
        }
    }

    log::info!("All checks passed; the billing API backend should work with these credentials");
    Ok(())
}
