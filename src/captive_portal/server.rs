//! SoftAP 与 HTTP 服务器

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    http::server::{Configuration, EspHttpServer},
    ipv4::{self, Mask, Subnet},
    netif::{EspNetif, NetifConfiguration, NetifStack},
    wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration as WifiConfig, EspWifi,
        WifiDriver,
    },
};

use queue_kiosk::{config::AP_NETMASK_BITS, KioskConfig, Portal};

use super::handlers;

pub struct CaptivePortal<'a> {
    _wifi: BlockingWifi<EspWifi<'a>>,
    _server: EspHttpServer<'a>,
}

impl<'a> CaptivePortal<'a> {
    pub fn start(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        config: &KioskConfig,
        portal: Portal,
    ) -> anyhow::Result<Self> {
        let driver = WifiDriver::new(modem, sysloop.clone(), None)?;
        let esp_wifi = EspWifi::wrap_all(
            driver,
            EspNetif::new(NetifStack::Sta)?,
            EspNetif::new_with_conf(&router_netif(config))?,
        )?;

        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        wifi.set_configuration(&WifiConfig::AccessPoint(access_point(config)?))?;
        wifi.start()?;
        log::info!("SoftAP started: {}", config.ssid);

        let mut server = EspHttpServer::new(&Configuration {
            http_port: config.http_port,
            stack_size: 8192,
            max_uri_handlers: 4,
            // 探测请求会访问任意路径
            uri_match_wildcard: true,
            ..Default::default()
        })?;
        handlers::register_routes(&mut server, portal)?;
        log::info!("HTTP server started on {}:{}", config.ap_ip, config.http_port);

        Ok(Self {
            _wifi: wifi,
            _server: server,
        })
    }
}

/// 固定网关地址，DHCP 把 AP 自己下发为 DNS 服务器
fn router_netif(config: &KioskConfig) -> NetifConfiguration {
    NetifConfiguration {
        ip_configuration: Some(ipv4::Configuration::Router(ipv4::RouterConfiguration {
            subnet: Subnet {
                gateway: config.ap_ip,
                mask: Mask(AP_NETMASK_BITS),
            },
            dhcp_enabled: true,
            dns: Some(config.ap_ip),
            secondary_dns: None,
        })),
        ..NetifConfiguration::wifi_default_router()
    }
}

fn access_point(config: &KioskConfig) -> anyhow::Result<AccessPointConfiguration> {
    let ssid = config
        .ssid
        .as_str()
        .try_into()
        .map_err(|_| anyhow::anyhow!("SSID too long: {}", config.ssid))?;

    Ok(AccessPointConfiguration {
        ssid,
        ssid_hidden: false,
        channel: config.channel,
        auth_method: AuthMethod::None,
        max_connections: config.max_connections,
        ..Default::default()
    })
}
