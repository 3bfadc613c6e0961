#[cfg(target_os = "espidf")]
mod button;
#[cfg(target_os = "espidf")]
mod captive_portal;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::net::{Ipv4Addr, SocketAddr};

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use queue_kiosk::{dns::DnsResponder, KioskConfig, Portal, TicketQueue};

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    let peripherals = esp_idf_svc::hal::prelude::Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    // tokio 需要 eventfd
    let _fs = esp_idf_svc::io::vfs::MountedEventfs::mount(5)?;

    let config = KioskConfig::from_build_env();
    log::info!("SSID: {:?}", config.ssid);
    log::info!("Queue capacity: {}", config.capacity);

    let queue = TicketQueue::new(config.capacity);

    let _portal = captive_portal::CaptivePortal::start(
        peripherals.modem,
        sysloop,
        &config,
        Portal::new(queue.clone()),
    )?;
    log::info!("Captive portal ready at {}", config.ap_url());

    log_heap();

    // BOOT 按键
    let _button =
        button::start_button_worker(peripherals.pins.gpio9.into(), queue, config.trigger)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let r = rt.block_on(async {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.dns_port));
        let responder = DnsResponder::bind(addr, config.ap_ip, config.dns_ttl).await?;
        responder.run().await
    });
    if let Err(e) = r {
        log::error!("DNS responder error: {:?}", e);
    }

    log::error!("DNS responder finished");
    unsafe { esp_idf_svc::sys::esp_restart() }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("queue-kiosk only runs on ESP-IDF targets")
}

#[cfg(target_os = "espidf")]
pub fn log_heap() {
    unsafe {
        use esp_idf_svc::sys::{heap_caps_get_free_size, MALLOC_CAP_INTERNAL};

        log::info!(
            "Free INTERNAL heap size: {}KB",
            heap_caps_get_free_size(MALLOC_CAP_INTERNAL) / 1024
        );
    }
}
