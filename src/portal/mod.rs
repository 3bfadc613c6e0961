//! Captive portal 路由
//!
//! 与 HTTP 服务器实现无关：输入 `http::Request`，输出 `http::Response<String>`。
//! 设备上的 HTTP 服务器把所有 GET 请求都交给 `Portal::handle`。

mod html;

use http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde::Serialize;

use crate::poll;
use crate::registry::{QueueSnapshot, TicketQueue};
use crate::session::{self, Identity};

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 各系统的联网检测地址
    Probe,
    JoinQueue,
    Poll,
    Queue,
    Proceed,
    Status,
    Index,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            // Android / Apple / Windows
            "/generate_204" | "/gen_204" | "/hotspot-detect.html" | "/connecttest.txt"
            | "/ncsi.txt" => Route::Probe,
            "/join_queue" => Route::JoinQueue,
            "/poll" => Route::Poll,
            "/queue" => Route::Queue,
            "/proceed" => Route::Proceed,
            "/api/status" => Route::Status,
            _ => Route::Index,
        }
    }
}

#[derive(Serialize)]
struct Status {
    version: &'static str,
    #[serde(flatten)]
    queue: QueueSnapshot,
}

#[derive(Clone)]
pub struct Portal {
    queue: TicketQueue,
}

impl Portal {
    pub fn new(queue: TicketQueue) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &TicketQueue {
        &self.queue
    }

    pub fn handle<B>(&self, req: &Request<B>) -> anyhow::Result<Response<String>> {
        if *req.method() != Method::GET {
            return Ok(Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .body(String::new())?);
        }

        let route = Route::from_path(req.uri().path());
        log::debug!("{} -> {:?}", req.uri(), route);

        match route {
            Route::Probe => redirect_home(),
            Route::JoinQueue => self.join(req.headers()),
            Route::Poll => self.poll(req.headers()),
            Route::Queue => {
                let ticket = session::resolve(req.headers(), &self.queue).ticket();
                html_page(html::queue(ticket.map(|t| t.get())))
            }
            Route::Proceed => html_page(html::proceed()),
            Route::Status => self.status(),
            Route::Index => html_page(html::index()),
        }
    }

    fn join(&self, headers: &HeaderMap) -> anyhow::Result<Response<String>> {
        let mut resp = redirect_home()?;

        match session::resolve(headers, &self.queue) {
            Identity::Ticket(ticket) if !self.queue.is_called(ticket) => {
                log::info!("Ticket {} is already waiting", ticket);
            }
            _ => {
                session::issue_and_attach(&self.queue, resp.headers_mut())?;
            }
        }

        Ok(resp)
    }

    fn poll(&self, headers: &HeaderMap) -> anyhow::Result<Response<String>> {
        let identity = session::resolve(headers, &self.queue);
        let reply = poll::poll(identity, &self.queue);

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .header(CACHE_CONTROL, "no-store")
            .body(reply.body().to_string())?)
    }

    fn status(&self) -> anyhow::Result<Response<String>> {
        let status = Status {
            version: env!("CARGO_PKG_VERSION"),
            queue: self.queue.snapshot(),
        };

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(CACHE_CONTROL, "no-store")
            .body(serde_json::to_string(&status)?)?)
    }
}

/// 解析原始请求目标，`http` 不接受的写法按 `/` 处理，落到首页
pub fn request_target(raw: &str) -> Uri {
    raw.parse().unwrap_or_else(|e| {
        log::debug!("Unparsable request target {:?}: {}", raw, e);
        Uri::from_static("/")
    })
}

fn redirect_home() -> anyhow::Result<Response<String>> {
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, "/")
        .body(String::new())?)
}

fn html_page(body: String) -> anyhow::Result<Response<String>> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_HTML)
        .body(body)?)
}
