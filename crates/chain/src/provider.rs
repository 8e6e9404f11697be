use alloy::providers::{DynProvider, Provider, ProviderBuilder};

/// Create an HTTP provider from an RPC URL string.
pub fn create_provider(rpc_url: &str) -> eyre::Result<DynProvider> {
    let url = rpc_url.parse()?;
    let provider = ProviderBuilder::new().connect_http(url);
    Ok(provider.erased())
}
