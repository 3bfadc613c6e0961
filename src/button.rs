use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};

use queue_kiosk::{
    config::TriggerTiming,
    trigger::{self, Level},
    TicketQueue,
};

const BUTTON_STACK_SIZE: usize = 4 * 1024;

/// 叫号按键采样线程，按键低电平有效
pub fn start_button_worker(
    pin: AnyIOPin,
    queue: TicketQueue,
    timing: TriggerTiming,
) -> anyhow::Result<std::thread::JoinHandle<()>> {
    let mut button = PinDriver::input(pin)?;
    button.set_pull(Pull::Up)?;

    let r = std::thread::Builder::new()
        .stack_size(BUTTON_STACK_SIZE)
        .spawn(move || {
            log::info!(
                "Starting button worker thread in core {:?}, monitoring GPIO {}",
                esp_idf_svc::hal::cpu::core(),
                button.pin()
            );
            trigger::run(
                || if button.is_low() { Level::Low } else { Level::High },
                queue,
                timing,
            )
        })
        .map_err(|e| anyhow::anyhow!("Failed to spawn button worker thread: {:?}", e))?;

    Ok(r)
}
