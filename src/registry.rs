//! 排队号登记表
//!
//! `Registry` 保存按到达顺序发出的号码、下一个叫号位置和叫号标志。
//! 它本身不是线程安全的，所有并发访问都经过 `TicketQueue`，
//! 后者用一把互斥锁把 `issue` / `locate` / `advance_if` / `head` 串行化。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// 号码（同时也是 cookie 令牌）的取值范围
pub const MIN_TICKET: u8 = 1;
pub const MAX_TICKET: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ticket(u8);

impl Ticket {
    pub fn new(value: u8) -> Option<Self> {
        (MIN_TICKET..=MAX_TICKET)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// 已发出的号码达到容量上限，且永不回收
    QueueFull { capacity: usize },
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::QueueFull { capacity } => {
                write!(f, "queue is full ({} tickets issued)", capacity)
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// 队列当前状态，供 `/api/status` 使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub capacity: usize,
    pub issued: usize,
    pub called: usize,
    pub head: Option<Ticket>,
    pub advance_pending: bool,
}

#[derive(Debug)]
pub struct Registry {
    issued: Vec<Ticket>,
    next_to_call: usize,
    next_value: u8,
    capacity: usize,
    advance_pending: bool,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_TICKET as usize);
        Self {
            issued: Vec::with_capacity(capacity),
            next_to_call: 0,
            next_value: MIN_TICKET,
            capacity,
            advance_pending: false,
        }
    }

    pub fn issue(&mut self) -> Result<Ticket, QueueError> {
        if self.issued.len() >= self.capacity {
            return Err(QueueError::QueueFull {
                capacity: self.capacity,
            });
        }

        let ticket = Ticket(self.next_value);
        self.next_value = if self.next_value >= MAX_TICKET {
            MIN_TICKET
        } else {
            self.next_value + 1
        };
        self.issued.push(ticket);
        Ok(ticket)
    }

    pub fn locate(&self, ticket: Ticket) -> Option<usize> {
        self.issued.iter().position(|t| *t == ticket)
    }

    /// 只有在叫号标志已置位且 `ticket` 正好排在队首时才前移游标，
    /// 成功时同时清除标志。
    pub fn advance_if(&mut self, ticket: Ticket) -> bool {
        if !self.advance_pending || self.head() != Some(ticket) {
            return false;
        }

        self.next_to_call += 1;
        self.advance_pending = false;
        true
    }

    pub fn head(&self) -> Option<Ticket> {
        self.issued.get(self.next_to_call).copied()
    }

    pub fn signal_advance(&mut self) {
        self.advance_pending = true;
    }

    /// 号码是否已经被叫过
    pub fn is_called(&self, ticket: Ticket) -> bool {
        self.locate(ticket)
            .is_some_and(|index| index < self.next_to_call)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            capacity: self.capacity,
            issued: self.issued.len(),
            called: self.next_to_call,
            head: self.head(),
            advance_pending: self.advance_pending,
        }
    }
}

/// 在 HTTP 处理线程和按键线程之间共享的登记表句柄
#[derive(Debug, Clone)]
pub struct TicketQueue {
    inner: Arc<Mutex<Registry>>,
}

impl TicketQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry::new(capacity))),
        }
    }

    // Registry holds plain data, a panicked holder cannot leave it half-written
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn issue(&self) -> Result<Ticket, QueueError> {
        let mut registry = self.lock();
        let ticket = registry.issue()?;
        log::info!(
            "Issued ticket {}, queue size: {}",
            ticket,
            registry.issued.len()
        );
        Ok(ticket)
    }

    pub fn locate(&self, ticket: Ticket) -> Option<usize> {
        self.lock().locate(ticket)
    }

    pub fn advance_if(&self, ticket: Ticket) -> bool {
        let mut registry = self.lock();
        let advanced = registry.advance_if(ticket);
        if advanced {
            log::info!(
                "Calling ticket {} (index {})",
                ticket,
                registry.next_to_call - 1
            );
        }
        advanced
    }

    pub fn head(&self) -> Option<Ticket> {
        self.lock().head()
    }

    pub fn signal_advance(&self) {
        let mut registry = self.lock();
        if registry.head().is_none() {
            log::info!("Call-next pressed with nobody waiting, keeping it pending");
        }
        registry.signal_advance();
    }

    pub fn is_called(&self, ticket: Ticket) -> bool {
        self.lock().is_called(ticket)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }
}
