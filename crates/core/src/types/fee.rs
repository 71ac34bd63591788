use serde::Serialize;

/// Pricing for one live transaction. Only one shape is ever populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeeEstimate {
    #[serde(rename_all = "camelCase")]
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
        base_fee: u128,
    },
    #[serde(rename_all = "camelCase")]
    Legacy { gas_price: u128 },
}

impl FeeEstimate {
    pub fn is_legacy(&self) -> bool {
        matches!(self, FeeEstimate::Legacy { .. })
    }

    /// Worst-case price per gas unit.
    pub fn max_price_per_gas(&self) -> u128 {
        match self {
            FeeEstimate::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
            FeeEstimate::Legacy { gas_price } => *gas_price,
        }
    }
}
