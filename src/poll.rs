//! 轮询协议
//!
//! 浏览器每隔几秒请求一次 `/poll`，根据响应决定继续等待还是跳转到叫号页。
//! 这里只依赖身份和登记表状态，与 HTTP 无关。

use crate::registry::TicketQueue;
use crate::session::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReply {
    /// 轮到你了
    Proceed,
    /// 还在排队
    InQueue,
    /// 没有号
    Empty,
}

impl PollReply {
    pub fn body(self) -> &'static str {
        match self {
            PollReply::Proceed => "PROCEED",
            PollReply::InQueue => "IN_QUEUE",
            PollReply::Empty => "",
        }
    }
}

/// 每次叫号只有队首的第一个轮询能拿到 `Proceed`
pub fn poll(identity: Identity, queue: &TicketQueue) -> PollReply {
    match identity {
        Identity::NoTicket => PollReply::Empty,
        Identity::Ticket(ticket) if queue.advance_if(ticket) => PollReply::Proceed,
        Identity::Ticket(_) => PollReply::InQueue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ticket_is_empty() {
        let queue = TicketQueue::new(99);
        queue.signal_advance();
        assert_eq!(poll(Identity::NoTicket, &queue), PollReply::Empty);
        assert_eq!(PollReply::Empty.body(), "");
        // the press is still pending
        assert!(queue.snapshot().advance_pending);
    }

    #[test]
    fn test_press_calls_head_only() {
        let queue = TicketQueue::new(99);
        let first = queue.issue().unwrap();
        let second = queue.issue().unwrap();
        queue.issue().unwrap();
        assert_eq!(queue.head(), Some(first));

        assert_eq!(poll(Identity::Ticket(first), &queue), PollReply::InQueue);

        queue.signal_advance();
        assert_eq!(poll(Identity::Ticket(second), &queue), PollReply::InQueue);
        assert_eq!(poll(Identity::Ticket(first), &queue), PollReply::Proceed);
        assert_eq!(poll(Identity::Ticket(second), &queue), PollReply::InQueue);

        queue.signal_advance();
        assert_eq!(poll(Identity::Ticket(second), &queue), PollReply::Proceed);
    }

    #[test]
    fn test_stale_client_keeps_waiting() {
        let queue = TicketQueue::new(99);
        let first = queue.issue().unwrap();
        queue.signal_advance();
        assert_eq!(poll(Identity::Ticket(first), &queue), PollReply::Proceed);

        queue.signal_advance();
        assert_eq!(poll(Identity::Ticket(first), &queue), PollReply::InQueue);
        assert_eq!(queue.head(), None);
    }

    #[test]
    fn test_bodies() {
        assert_eq!(PollReply::Proceed.body(), "PROCEED");
        assert_eq!(PollReply::InQueue.body(), "IN_QUEUE");
    }
}
