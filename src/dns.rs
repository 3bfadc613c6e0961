//! DNS 劫持
//!
//! 监听 UDP 53，不管查询什么域名、什么类型，都用 AP 自己的地址回答一条 A 记录。
//! 手机和电脑因此认为网络的 DNS 正常，进而触发 captive portal 检测，
//! 检测请求再被 HTTP 服务器接管。
//!
//! 格式不对的查询直接丢弃，客户端自己会重试。

use std::net::{Ipv4Addr, SocketAddr};

use bytes::{BufMut, BytesMut};
use tokio::net::UdpSocket;

pub const MAX_PACKET: usize = 512;

const HEADER_LEN: usize = 12;
const ANSWER_LEN: usize = 16;
/// Answer NAME: pointer to the question name at offset 12
const NAME_POINTER: u16 = 0xC00C;
const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsError {
    /// 不足一个报文头
    TooShort(usize),
    /// QR 已置位，不是查询
    NotQuery,
    NoQuestion,
    /// 标签长度字节非法
    BadLabel(u8),
    /// 问题段在报文结束前没读完
    Truncated,
    /// 查询本身超过 512 字节
    Oversized(usize),
    /// 加上回答后超过 512 字节
    Overflow(usize),
}

impl std::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsError::TooShort(len) => write!(f, "packet too short: {} bytes", len),
            DnsError::NotQuery => write!(f, "packet is not a query"),
            DnsError::NoQuestion => write!(f, "query has no question"),
            DnsError::BadLabel(b) => write!(f, "invalid label length byte 0x{:02x}", b),
            DnsError::Truncated => write!(f, "question section is truncated"),
            DnsError::Oversized(len) => write!(f, "query is {} bytes", len),
            DnsError::Overflow(len) => write!(f, "response would be {} bytes", len),
        }
    }
}

impl std::error::Error for DnsError {}

/// 第一个问题段结束的位置
fn question_end(query: &[u8]) -> Result<usize, DnsError> {
    if query.len() > MAX_PACKET {
        return Err(DnsError::Oversized(query.len()));
    }
    if query.len() < HEADER_LEN {
        return Err(DnsError::TooShort(query.len()));
    }
    if query[2] & 0x80 != 0 {
        return Err(DnsError::NotQuery);
    }
    if u16::from_be_bytes([query[4], query[5]]) == 0 {
        return Err(DnsError::NoQuestion);
    }

    let mut pos = HEADER_LEN;
    loop {
        let len = *query.get(pos).ok_or(DnsError::Truncated)?;
        match len & 0xC0 {
            0x00 if len == 0 => {
                pos += 1;
                break;
            }
            0x00 => pos += 1 + len as usize,
            // compressed name, the pointer ends it
            0xC0 => {
                pos += 2;
                break;
            }
            _ => return Err(DnsError::BadLabel(len)),
        }
    }

    // QTYPE + QCLASS
    pos += 4;
    if pos > query.len() {
        return Err(DnsError::Truncated);
    }
    Ok(pos)
}

/// 构造应答：原样保留事务 ID 和第一个问题，追加一条指向 `answer` 的 A 记录
pub fn build_response(query: &[u8], answer: Ipv4Addr, ttl: u32) -> Result<BytesMut, DnsError> {
    let end = question_end(query)?;
    let total = end + ANSWER_LEN;
    if total > MAX_PACKET {
        return Err(DnsError::Overflow(total));
    }

    let mut resp = BytesMut::with_capacity(total);
    resp.put_slice(&query[..end]);

    // QR=1; opcode and RD are echoed
    resp[2] |= 0x80;
    // RA=1, Z/AD/CD and RCODE cleared
    resp[3] = 0x80;
    // QDCOUNT=1, ANCOUNT=1, NSCOUNT=0, ARCOUNT=0
    resp[4..HEADER_LEN].copy_from_slice(&[0, 1, 0, 1, 0, 0, 0, 0]);

    resp.put_u16(NAME_POINTER);
    resp.put_u16(TYPE_A);
    resp.put_u16(CLASS_IN);
    resp.put_u32(ttl);
    resp.put_u16(4);
    resp.put_slice(&answer.octets());

    Ok(resp)
}

pub struct DnsResponder {
    socket: UdpSocket,
    answer: Ipv4Addr,
    ttl: u32,
}

impl DnsResponder {
    pub async fn bind(addr: SocketAddr, answer: Ipv4Addr, ttl: u32) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        log::info!(
            "DNS responder listening on {}, answering {}",
            socket.local_addr()?,
            answer
        );
        Ok(Self {
            socket,
            answer,
            ttl,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// 逐个处理查询，正常情况下不会返回
    pub async fn run(self) -> anyhow::Result<()> {
        // one spare byte, so an oversized datagram shows up as len > MAX_PACKET
        let mut buf = [0u8; MAX_PACKET + 1];

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("DNS recv error: {:?}", e);
                    continue;
                }
            };

            let resp = match build_response(&buf[..len], self.answer, self.ttl) {
                Ok(resp) => resp,
                Err(e) => {
                    log::debug!("Dropping DNS packet from {}: {}", peer, e);
                    continue;
                }
            };

            if let Err(e) = self.socket.send_to(&resp, peer).await {
                log::warn!("DNS send error to {}: {:?}", peer, e);
            } else {
                log::debug!("DNS query from {} answered with {}", peer, self.answer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIOSK: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

    /// A query for example.com, type A, class IN, RD set
    fn example_query(id: u16) -> Vec<u8> {
        let mut q = Vec::new();
        q.extend_from_slice(&id.to_be_bytes());
        q.extend_from_slice(&[0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0]);
        q.extend_from_slice(b"\x07example\x03com\x00");
        q.extend_from_slice(&[0, 1, 0, 1]);
        q
    }

    #[test]
    fn test_example_com() {
        let query = example_query(0xBEEF);
        let resp = build_response(&query, KIOSK, 60).unwrap();

        assert_eq!(resp.len(), query.len() + 16);
        // transaction id
        assert_eq!(&resp[..2], &[0xBE, 0xEF]);
        // QR and RD, RA
        assert_eq!(resp[2], 0x81);
        assert_eq!(resp[3], 0x80);
        // QDCOUNT, ANCOUNT
        assert_eq!(&resp[4..8], &[0, 1, 0, 1]);
        // question echoed
        assert_eq!(&resp[12..query.len()], &query[12..]);

        let answer = &resp[query.len()..];
        assert_eq!(
            answer,
            &[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 192, 168, 4, 1]
        );
    }

    #[test]
    fn test_additional_records_are_cut() {
        let mut query = example_query(7);
        // ARCOUNT=1 with an EDNS OPT record
        query[11] = 1;
        let question_len = query.len();
        query.extend_from_slice(&[0, 0, 0x29, 0x10, 0, 0, 0, 0, 0, 0, 0]);

        let resp = build_response(&query, KIOSK, 60).unwrap();
        assert_eq!(resp.len(), question_len + 16);
        assert_eq!(&resp[8..12], &[0, 0, 0, 0]);
        assert_eq!(&resp[question_len + 12..], &[192, 168, 4, 1]);
    }

    #[test]
    fn test_any_type_gets_a_record() {
        let mut query = example_query(1);
        let n = query.len();
        // AAAA
        query[n - 3] = 28;

        let resp = build_response(&query, KIOSK, 60).unwrap();
        assert_eq!(&resp[n..n + 4], &[0xC0, 0x0C, 0, 1]);
    }

    #[test]
    fn test_ad_cd_bits_not_echoed() {
        let mut query = example_query(1);
        // AD and CD, as dig sends them
        query[3] = 0x30;

        let resp = build_response(&query, KIOSK, 60).unwrap();
        assert_eq!(resp[3], 0x80);
    }

    #[test]
    fn test_oversized_query() {
        let mut query = example_query(1);
        query[11] = 1;
        query.resize(700, 0);

        assert_eq!(build_response(&query, KIOSK, 60), Err(DnsError::Oversized(700)));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(build_response(&[0; 5], KIOSK, 60), Err(DnsError::TooShort(5)));

        let mut query = example_query(1);
        query[5] = 0;
        assert_eq!(build_response(&query, KIOSK, 60), Err(DnsError::NoQuestion));

        let query = example_query(1);
        assert_eq!(
            build_response(&query[..query.len() - 2], KIOSK, 60),
            Err(DnsError::Truncated)
        );
        assert_eq!(build_response(&query[..16], KIOSK, 60), Err(DnsError::Truncated));

        let mut query = example_query(1);
        query[12] = 0x47;
        assert_eq!(build_response(&query, KIOSK, 60), Err(DnsError::BadLabel(0x47)));

        let resp = build_response(&example_query(1), KIOSK, 60).unwrap();
        assert_eq!(build_response(&resp, KIOSK, 60), Err(DnsError::NotQuery));
    }

    #[test]
    fn test_overflow() {
        let mut query = vec![0, 1, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        // eight 60-byte labels
        for _ in 0..8 {
            query.push(60);
            query.extend_from_slice(&[b'a'; 60]);
        }
        query.push(0);
        query.extend_from_slice(&[0, 1, 0, 1]);
        assert_eq!(query.len(), 505);

        assert_eq!(
            build_response(&query, KIOSK, 60),
            Err(DnsError::Overflow(521))
        );
    }

    #[tokio::test]
    async fn test_responder_round_trip() {
        let responder = DnsResponder::bind("127.0.0.1:0".parse().unwrap(), KIOSK, 60)
            .await
            .unwrap();
        let server_addr = responder.local_addr().unwrap();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // garbage first, it must not stop the loop
        client.send_to(&[1, 2, 3], server_addr).await.unwrap();

        let query = example_query(0x1234);
        client.send_to(&query, server_addr).await.unwrap();

        let mut buf = [0u8; MAX_PACKET];
        let (len, _) = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.recv_from(&mut buf),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(len, query.len() + 16);
        assert_eq!(&buf[..2], &[0x12, 0x34]);
        assert_eq!(buf[2] & 0x80, 0x80);
        assert_eq!(buf[3] & 0x80, 0x80);
        assert_eq!(&buf[6..8], &[0, 1]);
        assert_eq!(&buf[len - 4..len], &[192, 168, 4, 1]);
    }

    #[tokio::test]
    async fn test_responder_drops_oversized_datagram() {
        let responder = DnsResponder::bind("127.0.0.1:0".parse().unwrap(), KIOSK, 60)
            .await
            .unwrap();
        let server_addr = responder.local_addr().unwrap();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // valid question up front, padded past 512 bytes
        let mut big = example_query(0xAAAA);
        big[11] = 1;
        big.resize(700, 0);
        client.send_to(&big, server_addr).await.unwrap();

        let mut buf = [0u8; 1024];
        let r = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            client.recv_from(&mut buf),
        )
        .await;
        assert!(r.is_err(), "oversized query was answered");

        // the loop is still serving
        let query = example_query(0xBBBB);
        client.send_to(&query, server_addr).await.unwrap();
        let (len, _) = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.recv_from(&mut buf),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(len, query.len() + 16);
        assert_eq!(&buf[..2], &[0xBB, 0xBB]);
    }
}
