use super::GasStation;
use eyre::{Result, eyre};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasStationTier {
    max_priority_fee: f64,
}

#[derive(Deserialize)]
struct GasStationResponse {
    standard: GasStationTier,
}

/// `standard.maxPriorityFee` (gwei, decimal) in wei.
pub fn parse_priority_fee(body: &str) -> Result<u128> {
    let response: GasStationResponse = serde_json::from_str(body)?;
    let gwei = response.standard.max_priority_fee;
    if !gwei.is_finite() || gwei < 0.0 {
        return Err(eyre!("gas station returned an invalid priority fee: {}", gwei));
    }
    Ok((gwei * 1e9).round() as u128)
}

pub async fn fetch_priority_fee(client: &Client, url: &str) -> Result<u128> {
    let body = client
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_priority_fee(&body)
}

/// Never fails: an unreachable or malformed oracle yields the configured floor.
pub async fn priority_fee_or_floor(client: &Client, station: &GasStation) -> u128 {
    match fetch_priority_fee(client, &station.url).await {
        Ok(fee) => {
            debug!("Gas station {} priority fee: {} wei", station.url, fee);
            fee
        }
        Err(e) => {
            warn!(
                "Gas station {} unavailable ({}), using floor of {} wei",
                station.url, e, station.floor_priority_fee
            );
            station.floor_priority_fee
        }
    }
}
