//! 会话身份解析
//!
//! 客户端用名为 `queue_number` 的 cookie 保存自己的号码。
//! 缺失、格式错误、超出范围或登记表里查不到的 cookie 一律视为新访客。

use http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};

use crate::registry::{QueueError, Ticket, TicketQueue};

pub const COOKIE_NAME: &str = "queue_number";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Ticket(Ticket),
    NoTicket,
}

impl Identity {
    pub fn ticket(self) -> Option<Ticket> {
        match self {
            Identity::Ticket(ticket) => Some(ticket),
            Identity::NoTicket => None,
        }
    }
}

/// 从一个 `Cookie` 头里取出号码
pub fn parse_token(cookie_header: &str) -> Option<Ticket> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| value.trim().parse::<u8>().ok())
        .and_then(Ticket::new)
}

pub fn resolve(headers: &HeaderMap, queue: &TicketQueue) -> Identity {
    let token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(parse_token);

    match token {
        Some(ticket) if queue.locate(ticket).is_some() => Identity::Ticket(ticket),
        Some(ticket) => {
            log::debug!("Token {} is not in the queue, treating as new visitor", ticket);
            Identity::NoTicket
        }
        None => Identity::NoTicket,
    }
}

pub fn session_cookie(ticket: Ticket) -> String {
    format!("{}={}; Path=/", COOKIE_NAME, ticket)
}

/// 发一个新号并写入 `Set-Cookie`。
///
/// 队列满时什么都不写，返回 `Ok(None)`：访客拿不到号，
/// 之后的轮询都会得到空响应。
pub fn issue_and_attach(
    queue: &TicketQueue,
    headers: &mut HeaderMap,
) -> anyhow::Result<Option<Ticket>> {
    match queue.issue() {
        Ok(ticket) => {
            let cookie = HeaderValue::try_from(session_cookie(ticket))?;
            headers.insert(SET_COOKIE, cookie);
            Ok(Some(ticket))
        }
        Err(e @ QueueError::QueueFull { .. }) => {
            log::warn!("Cannot issue ticket: {}", e);
            Ok(None)
        }
    }
}
