mod storage_gateway_impl;

pub use storage_gateway_impl::StorageGatewayImpl;
