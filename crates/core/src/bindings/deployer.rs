use alloy::sol;

sol! {
    /// Constructor-only batch deployer. Each entry whose `predictedAddress` has no code
    /// is executed as `to.call(data)`; any failure reverts the whole batch.
    contract ThrowawayDeployer {
        struct Transaction {
            address predictedAddress;
            address to;
            bytes data;
        }

        constructor(Transaction[] memory txs);
    }
}
