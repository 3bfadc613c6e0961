//! SoftAP + captive portal 模块
//!
//! 开放热点，HTTP 服务器把所有 GET 请求交给排队机的 `Portal`。

mod handlers;
mod server;

pub use server::CaptivePortal;
