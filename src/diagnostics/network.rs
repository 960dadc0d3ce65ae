//! Network reachability probes
//!
//! Every probe runs on its own; a failure is appended to `errors` and never
//! stops the probes after it.

use crate::error::{DoctorError, Result};
use crate::settings::NetworkSettings;
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Status and round-trip time of an HTTP GET
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub elapsed: Duration,
}

/// Transport-level operations the network check needs
pub trait NetworkProbe {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<()>;
    fn resolve(&self, host: &str) -> Result<IpAddr>;
    fn http_get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;
    fn tls_handshake(&self, host: &str, port: u16, timeout: Duration) -> Result<()>;
}

/// Probes against the real network
pub struct LiveNetwork;

fn socket_addrs(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| DoctorError::Resolve {
            host: host.to_string(),
            message: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(DoctorError::Resolve {
            host: host.to_string(),
            message: "no addresses returned".to_string(),
        });
    }
    Ok(addrs)
}

fn connect_any(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in socket_addrs(host, port)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(DoctorError::Connect {
        addr: format!("{}:{}", host, port),
        source: last_err.unwrap_or_else(|| std::io::Error::other("no address to connect to")),
    })
}

impl NetworkProbe for LiveNetwork {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        connect_any(host, port, timeout).map(|_| ())
    }

    fn resolve(&self, host: &str) -> Result<IpAddr> {
        // First address wins, like gethostbyname
        Ok(socket_addrs(host, 0)?[0].ip())
    }

    fn http_get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let http_err = |source: reqwest::Error| DoctorError::Http {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(http_err)?;

        let start = Instant::now();
        let response = client.get(url).send().map_err(http_err)?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            elapsed: start.elapsed(),
        })
    }

    /// Any HTTP answer over `https` means the handshake and certificate
    /// validation went through
    fn tls_handshake(&self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let tls_err = |e: reqwest::Error| DoctorError::Tls {
            host: host.to_string(),
            message: e.to_string(),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .https_only(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(tls_err)?;

        client
            .head(format!("https://{}:{}/", host, port))
            .send()
            .map(|_| ())
            .map_err(tls_err)
    }
}

/// Proxy-related environment variables (empty when unset)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProxySettings {
    pub http_proxy: String,
    pub https_proxy: String,
    pub no_proxy: String,
}

impl ProxySettings {
    /// Read lower-case names first, then upper-case
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&name.to_uppercase()))
                .unwrap_or_default()
        };

        Self {
            http_proxy: read("http_proxy"),
            https_proxy: read("https_proxy"),
            no_proxy: read("no_proxy"),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn any(&self) -> bool {
        !(self.http_proxy.is_empty() && self.https_proxy.is_empty())
    }
}

/// Network section of the report
#[derive(Clone, Debug, Default)]
pub struct NetworkReport {
    pub internet_connection: bool,
    pub dns_resolution: bool,
    /// Endpoint name -> got HTTP 200
    pub endpoint_access: BTreeMap<String, bool>,
    pub ssl_working: bool,
    /// Target name -> seconds
    pub latency: BTreeMap<String, f64>,
    pub proxy_settings: ProxySettings,
    pub errors: Vec<String>,
}

impl NetworkReport {
    pub fn endpoint_ok(&self, name: &str) -> bool {
        self.endpoint_access.get(name).copied().unwrap_or(false)
    }

    /// Advice for whatever failed
    pub fn recommendations(&self, high_latency_secs: f64) -> Vec<String> {
        let mut recommendations = Vec::new();

        if !self.internet_connection {
            recommendations.push("Check physical network connection and router".to_string());
        }
        if !self.dns_resolution {
            recommendations.push(
                "Check DNS settings or try using alternative DNS servers (e.g., 8.8.8.8)".to_string(),
            );
        }
        for (name, ok) in &self.endpoint_access {
            if !ok {
                recommendations.push(format!(
                    "Check if {} is blocked by firewall or proxy settings",
                    name
                ));
            }
        }
        if !self.ssl_working {
            recommendations.push("Check SSL/TLS configuration and certificates".to_string());
        }
        if self.latency.values().any(|&secs| secs > high_latency_secs) {
            recommendations
                .push("Network latency is high - consider checking network quality".to_string());
        }

        recommendations
    }
}

/// Run every network probe in order
pub fn check_network_connectivity(probe: &dyn NetworkProbe, cfg: &NetworkSettings) -> NetworkReport {
    let mut report = NetworkReport::default();

    match probe.connect(&cfg.reachability_host, cfg.reachability_port, cfg.socket_timeout()) {
        Ok(()) => {
            report.internet_connection = true;
            info!("Internet Connection: Available");
        }
        Err(e) => record(&mut report, "Internet connection", &e),
    }

    match probe.resolve(&cfg.dns_host) {
        Ok(ip) => {
            report.dns_resolution = true;
            info!("Resolved {} to {}", cfg.dns_host, ip);
        }
        Err(e) => record(&mut report, "DNS resolution", &e),
    }

    for target in &cfg.http_targets {
        match probe.http_get(&target.url, cfg.http_timeout()) {
            Ok(response) => {
                report
                    .endpoint_access
                    .insert(target.name.clone(), response.status == 200);
                report
                    .latency
                    .insert(target.name.clone(), response.elapsed.as_secs_f64());
                info!("{} responded with HTTP {}", target.url, response.status);
            }
            Err(e) => {
                report.endpoint_access.insert(target.name.clone(), false);
                record(&mut report, &format!("{} access", target.name), &e);
            }
        }
    }

    match probe.tls_handshake(&cfg.tls_host, cfg.tls_port, cfg.tls_timeout()) {
        Ok(()) => report.ssl_working = true,
        Err(e) => record(&mut report, "SSL", &e),
    }

    report.proxy_settings = ProxySettings::from_env();

    match probe.http_get(&cfg.speed_test.url, cfg.http_timeout()) {
        Ok(response) => {
            report
                .latency
                .insert(cfg.speed_test.name.clone(), response.elapsed.as_secs_f64());
        }
        Err(e) => record(&mut report, "Speed test", &e),
    }

    log_network_results(&report);
    report
}

fn record(report: &mut NetworkReport, probe: &str, err: &DoctorError) {
    let message = format!("{} error: {}", probe, err);
    error!("{}", message);
    report.errors.push(message);
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn log_network_results(report: &NetworkReport) {
    let line = |label: &str, ok: bool, extra: String| {
        if ok {
            info!("{}: {}{}", label, mark(ok), extra);
        } else {
            error!("{}: {}", label, mark(ok));
        }
    };

    line("Basic Internet Connection", report.internet_connection, String::new());
    line("DNS Resolution", report.dns_resolution, String::new());
    for (name, &ok) in &report.endpoint_access {
        let latency = report
            .latency
            .get(name)
            .map(|secs| format!("{:.3}s", secs))
            .unwrap_or_else(|| "N/A".to_string());
        line(&format!("{} Access", name), ok, format!(" (Latency: {})", latency));
    }
    line("SSL/TLS", report.ssl_working, String::new());

    if report.proxy_settings.any() {
        info!(
            "Proxy settings: http_proxy={:?} https_proxy={:?} no_proxy={:?}",
            report.proxy_settings.http_proxy,
            report.proxy_settings.https_proxy,
            report.proxy_settings.no_proxy
        );
    }

    if !report.errors.is_empty() {
        warn!("Network test errors encountered:");
        for err in &report.errors {
            warn!("  - {}", err);
        }
    }
}
