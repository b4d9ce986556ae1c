use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{AdvisorClient, HttpPredictionBackend};
use shared::domain::FormField;

/// Headless prediction round trip: fetch the soil-type catalog, submit one
/// form snapshot, print the recommendation.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,
    #[arg(long)]
    nitrogen: f64,
    #[arg(long)]
    potassium: f64,
    #[arg(long)]
    phosphorous: f64,
    /// Soil-type label; defaults to the first catalog entry.
    #[arg(long)]
    soil_type: Option<String>,
    #[arg(long, default_value = "Bengaluru")]
    location: String,
    /// Per-request deadline in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let backend = HttpPredictionBackend::with_timeout(
        &args.server_url,
        Duration::from_secs(args.timeout_seconds),
    )
    .map_err(|err| anyhow!("failed to build http client: {err}"))?;
    let client = AdvisorClient::new(Arc::new(backend));

    if let Err(err) = client.load_soil_types().await {
        let status = client.status().await;
        let message = status
            .error_message()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(anyhow!(message));
    }

    let catalog = client.catalog().await;
    let soil_type = match args.soil_type {
        Some(soil_type) => soil_type,
        None => catalog
            .default_selection()
            .ok_or_else(|| anyhow!("backend returned an empty soil-type catalog"))?
            .to_string(),
    };

    client
        .set_field(FormField::Nitrogen, args.nitrogen.to_string())
        .await;
    client
        .set_field(FormField::Potassium, args.potassium.to_string())
        .await;
    client
        .set_field(FormField::Phosphorous, args.phosphorous.to_string())
        .await;
    client.set_field(FormField::SoilType, soil_type).await;
    client.set_field(FormField::Location, args.location).await;

    match client.submit().await {
        Ok(result) => {
            println!("Temperature: {:.1}°C", result.temperature_c);
            println!("Humidity: {:.1}%", result.humidity_percent);
            println!("Est. soil moisture: {:.1}%", result.moisture_estimate);
            println!("Predicted crop type: {}", result.predicted_crop_type);
            println!(
                "Recommended fertilizer: {}",
                result.predicted_fertilizer_name
            );
            Ok(())
        }
        Err(_) => {
            let status = client.status().await;
            let message = status
                .error_message()
                .unwrap_or("Prediction failed for an unknown reason.");
            Err(anyhow!(message.to_string()))
        }
    }
}
