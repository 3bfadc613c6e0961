//! 编译期配置
//!
//! 所有参数都有默认值，SSID 与队列容量可以在编译时通过环境变量
//! `KIOSK_SSID` / `KIOSK_CAPACITY` 覆盖。

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::registry::MAX_TICKET;

/// AP 模式的固定 IP 地址
pub const AP_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
pub const AP_NETMASK_BITS: u8 = 24;

pub const DEFAULT_SSID: &str = "Queue-Kiosk";

/// 按键采样节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTiming {
    /// 空闲时的采样间隔
    pub poll: Duration,
    /// 检测到下降沿后，二次确认前的等待时间
    pub settle: Duration,
    /// 按住期间等待松开的采样间隔
    pub release_poll: Duration,
}

impl Default for TriggerTiming {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(50),
            settle: Duration::from_millis(20),
            release_poll: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub ssid: String,
    pub ap_ip: Ipv4Addr,
    pub channel: u8,
    pub max_connections: u16,
    pub capacity: usize,
    pub dns_port: u16,
    pub http_port: u16,
    pub dns_ttl: u32,
    pub trigger: TriggerTiming,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID.to_string(),
            ap_ip: AP_IP,
            channel: 1,
            max_connections: 4,
            capacity: MAX_TICKET as usize,
            dns_port: 53,
            http_port: 80,
            dns_ttl: 60,
            trigger: TriggerTiming::default(),
        }
    }
}

impl KioskConfig {
    /// 默认配置叠加编译期覆盖
    pub fn from_build_env() -> Self {
        static SSID: Option<&str> = std::option_env!("KIOSK_SSID");
        static CAPACITY: Option<&str> = std::option_env!("KIOSK_CAPACITY");

        Self::default().with_overrides(SSID, CAPACITY)
    }

    fn with_overrides(mut self, ssid: Option<&str>, capacity: Option<&str>) -> Self {
        if let Some(ssid) = ssid.map(str::trim).filter(|s| !s.is_empty()) {
            self.ssid = ssid.to_string();
        }

        if let Some(raw) = capacity {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.capacity = n.min(MAX_TICKET as usize),
                _ => log::warn!(
                    "Ignoring KIOSK_CAPACITY={:?}, using {}",
                    raw,
                    self.capacity
                ),
            }
        }

        self
    }

    pub fn ap_url(&self) -> String {
        format!("http://{}", self.ap_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KioskConfig::default();
        assert_eq!(config.ap_ip, Ipv4Addr::new(192, 168, 4, 1));
        assert_eq!(config.capacity, 99);
        assert_eq!(config.dns_port, 53);
        assert_eq!(config.ap_url(), "http://192.168.4.1");
        assert_eq!(config.trigger.settle, Duration::from_millis(20));
    }

    #[test]
    fn test_overrides() {
        let config = KioskConfig::default().with_overrides(Some("Bakery"), Some("50"));
        assert_eq!(config.ssid, "Bakery");
        assert_eq!(config.capacity, 50);

        // capacity is bounded by the token range
        let config = KioskConfig::default().with_overrides(None, Some("500"));
        assert_eq!(config.capacity, 99);

        let config = KioskConfig::default().with_overrides(Some("  "), Some("zero"));
        assert_eq!(config.ssid, DEFAULT_SSID);
        assert_eq!(config.capacity, 99);
    }
}
