//! HTTP 路由处理器
//!
//! 只注册一个通配 GET 处理器，把 ESP-IDF 的请求转换成 `http::Request`
//! 交给 `Portal`，再把 `http::Response` 写回连接。

use esp_idf_svc::{
    http::{
        server::{EspHttpConnection, EspHttpServer, Request},
        Headers, Method,
    },
    io::Write,
};

use queue_kiosk::{portal::request_target, Portal};

/// 注册所有 HTTP 路由
pub fn register_routes(server: &mut EspHttpServer<'_>, portal: Portal) -> anyhow::Result<()> {
    server.fn_handler::<anyhow::Error, _>("/*", Method::Get, move |req| {
        handle(req, &portal)
    })?;

    Ok(())
}

fn handle(req: Request<&mut EspHttpConnection<'_>>, portal: &Portal) -> anyhow::Result<()> {
    let mut builder = http::Request::builder()
        .method(http::Method::GET)
        .uri(request_target(req.uri()));
    if let Some(cookie) = req.header("Cookie") {
        builder = builder.header(http::header::COOKIE, cookie);
    }
    let request = builder.body(())?;

    let response = portal.handle(&request)?;

    let headers: Vec<(&str, &str)> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
        .collect();
    let status = response.status();

    let mut resp = req.into_response(status.as_u16(), status.canonical_reason(), &headers)?;
    resp.write_all(response.body().as_bytes())?;
    Ok(())
}
