use alloy::sol;

sol! {
    contract TWCloneFactory {
        event ProxyDeployed(address indexed implementation, address proxy, address indexed deployer);

        function deployProxyByImplementation(
            address _implementation,
            bytes memory _data,
            bytes32 _salt
        ) public returns (address deployedProxy);
    }
}
