//! 取号排队机
//!
//! 设备开一个开放热点，把所有 DNS 查询劫持到自己，在 captive portal 里给访客发号，
//! 店员按下按键叫下一个号，访客的浏览器通过轮询得知是否轮到自己。
//!
//! 这里是与硬件无关的部分，设备相关的初始化在二进制目标里。

pub mod config;
pub mod dns;
pub mod poll;
pub mod portal;
pub mod registry;
pub mod session;
pub mod trigger;

pub use config::KioskConfig;
pub use portal::Portal;
pub use registry::{Ticket, TicketQueue};
