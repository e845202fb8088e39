//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
