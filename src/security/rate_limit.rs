use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use dashmap::{DashMap, mapref::entry::Entry};

use crate::errors::AppError;
use crate::logging::{SanitizedIpAddr, SecurityEvent};

/// Stale windows are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// Fixed-window request counter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiterState {
    max_requests: u32,
    window: Duration,
    buckets: Arc<DashMap<IpAddr, RateWindow>>,
}

#[derive(Debug)]
struct RateWindow {
    started_at: Instant,
    hits: u32,
}

impl RateLimiterState {
    pub fn new(burst: NonZeroU32, window: Duration) -> Self {
        Self {
            max_requests: burst.get(),
            window,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Counts one request; on refusal returns how long until the window resets.
    fn register(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        if self.buckets.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        match self.buckets.entry(ip) {
            Entry::Vacant(entry) => {
                entry.insert(RateWindow {
                    started_at: now,
                    hits: 1,
                });
                Ok(())
            }
            Entry::Occupied(mut entry) => {
                let bucket = entry.get_mut();
                let elapsed = now.saturating_duration_since(bucket.started_at);
                if elapsed >= self.window {
                    *bucket = RateWindow {
                        started_at: now,
                        hits: 0,
                    };
                }

                if bucket.hits >= self.max_requests {
                    return Err(self.window.saturating_sub(elapsed));
                }
                bucket.hits += 1;
                Ok(())
            }
        }
    }

    fn sweep(&self, now: Instant) {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.started_at) < self.window);
        tracing::debug!(
            removed = before.saturating_sub(self.buckets.len()),
            "Swept expired rate limit windows"
        );
    }
}

pub async fn enforce_rate_limit(
    State(state): State<RateLimiterState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = client_ip(request.headers(), addr.ip());

    if let Err(retry_after) = state.register(client_ip, Instant::now()) {
        crate::log_security_event!(
            SecurityEvent::RateLimitExceeded,
            client_ip = %SanitizedIpAddr::new(client_ip),
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded for client"
        );

        return Err(AppError::RateLimitExceeded {
            retry_after: Some(retry_after.max(Duration::from_secs(1))),
        });
    }

    Ok(next.run(request).await)
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: IpAddr) -> IpAddr {
    let header_ip = |name: &str, first_only: bool| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|raw| if first_only { raw.split(',').next().unwrap_or(raw) } else { raw })
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for", true)
        .or_else(|| header_ip("x-real-ip", false))
        .unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use axum::http::HeaderValue;

    use super::*;

    fn limiter(burst: u32, window_secs: u64) -> RateLimiterState {
        RateLimiterState::new(
            NonZeroU32::new(burst).unwrap(),
            Duration::from_secs(window_secs),
        )
    }

    #[test]
    fn test_allows_burst_then_refuses() {
        let state = limiter(2, 60);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let now = Instant::now();

        assert!(state.register(ip, now).is_ok());
        assert!(state.register(ip, now).is_ok());
        let retry = state.register(ip, now + Duration::from_secs(10)).unwrap_err();
        assert_eq!(retry, Duration::from_secs(50));
    }

    #[test]
    fn test_window_resets() {
        let state = limiter(1, 60);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let now = Instant::now();

        assert!(state.register(ip, now).is_ok());
        assert!(state.register(ip, now).is_err());
        assert!(state.register(ip, now + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let state = limiter(1, 60);
        let now = Instant::now();
        assert!(state.register(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), now).is_ok());
        assert!(state.register(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), now).is_ok());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let peer = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer), peer);

        headers.insert("x-real-ip", HeaderValue::from_static("10.1.1.1"));
        assert_eq!(client_ip(&headers, peer), IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1)));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, peer),
            IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))
        );
    }
}
