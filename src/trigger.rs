//! 叫号按键
//!
//! 按键低电平有效。采样器是一个三态机：
//!
//! - `Idle`：按固定间隔采样，记录上一次电平，等待下降沿
//! - `Debouncing`：检测到下降沿后等待一小段时间再采一次，排除抖动
//! - `HeldLow`：已经确认按下，只等松开，按住多久都只算一次
//!
//! 状态机本身不睡眠，`step` 返回下一次采样前应等待的时间，
//! 因此可以直接用电平序列做测试。

use std::time::Duration;

use crate::config::TriggerTiming;
use crate::registry::TicketQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle { last: Level },
    Debouncing,
    HeldLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// 本次采样确认了一次按下
    pub pressed: bool,
    pub wait: Duration,
}

pub struct Sampler {
    state: SamplerState,
    timing: TriggerTiming,
    presses: u32,
}

impl Sampler {
    pub fn new(timing: TriggerTiming) -> Self {
        Self {
            // released until proven otherwise
            state: SamplerState::Idle { last: Level::High },
            timing,
            presses: 0,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn presses(&self) -> u32 {
        self.presses
    }

    pub fn step(&mut self, level: Level) -> Step {
        let (next, step) = match (self.state, level) {
            (SamplerState::Idle { last: Level::High }, Level::Low) => (
                SamplerState::Debouncing,
                self.wait(self.timing.settle),
            ),
            (SamplerState::Idle { .. }, level) => (
                SamplerState::Idle { last: level },
                self.wait(self.timing.poll),
            ),
            (SamplerState::Debouncing, Level::Low) => {
                self.presses = self.presses.wrapping_add(1);
                log::info!("Call-next button pressed! Count: {}", self.presses);
                (
                    SamplerState::HeldLow,
                    Step {
                        pressed: true,
                        wait: self.timing.release_poll,
                    },
                )
            }
            (SamplerState::Debouncing, Level::High) => (
                SamplerState::Idle { last: Level::High },
                self.wait(self.timing.poll),
            ),
            (SamplerState::HeldLow, Level::Low) => {
                (SamplerState::HeldLow, self.wait(self.timing.release_poll))
            }
            (SamplerState::HeldLow, Level::High) => {
                log::info!("Call-next button released");
                (
                    SamplerState::Idle { last: Level::High },
                    self.wait(self.timing.poll),
                )
            }
        };

        self.state = next;
        step
    }

    fn wait(&self, wait: Duration) -> Step {
        Step {
            pressed: false,
            wait,
        }
    }
}

/// 阻塞采样循环，每次确认按下就给队列置一次叫号标志
pub fn run<F>(mut sample: F, queue: TicketQueue, timing: TriggerTiming) -> !
where
    F: FnMut() -> Level,
{
    let mut sampler = Sampler::new(timing);
    loop {
        let step = sampler.step(sample());
        if step.pressed {
            queue.signal_advance();
        }
        std::thread::sleep(step.wait);
    }
}
