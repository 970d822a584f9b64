use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use docling_config::{BackendConfig, ConverterConfig, JobsConfig};
use docling_convert::{Converter, PdfTextConverter, SimulatedConverter};
use docling_job_queue::WorkerPoolConfig;
use docling_notifier::{Notifier, WebhookNotifier};

/// Build the converter selected by `converter.kind`.
pub fn converter_from_config(cfg: &ConverterConfig) -> anyhow::Result<Arc<dyn Converter>> {
    let converter: Arc<dyn Converter> = match cfg.kind.as_str() {
        "pdf" => Arc::new(PdfTextConverter::new(cfg.language.clone())),
        "simulated" => Arc::new(SimulatedConverter::new(
            Duration::from_millis(cfg.simulated_delay_ms),
            cfg.language.clone(),
        )),
        other => bail!("unknown converter kind {other:?}"),
    };
    Ok(converter)
}

/// Build the webhook notifier pointed at the backend.
pub fn notifier_from_config(cfg: &BackendConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let notifier = WebhookNotifier::with_timeout(&cfg.url, Duration::from_secs(cfg.timeout_secs))
        .with_context(|| format!("invalid backend url {}", cfg.url))?;
    Ok(Arc::new(notifier))
}

pub fn worker_pool_from_config(cfg: &JobsConfig) -> WorkerPoolConfig {
    WorkerPoolConfig {
        concurrency: cfg.concurrency,
        queue_capacity: cfg.queue_capacity,
    }
}

/// Parse host:port into a SocketAddr, with fallback to 0.0.0.0.
pub fn parse_bind_address(host: &str, port: u16) -> SocketAddr {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.trim_matches(|c| c == '[' || c == ']')
                .parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_variants() {
        assert_eq!(
            parse_bind_address("127.0.0.1", 8000),
            "127.0.0.1:8000".parse().unwrap()
        );
        assert_eq!(parse_bind_address("[::1]", 9000), "[::1]:9000".parse().unwrap());
        assert_eq!(
            parse_bind_address("not-an-ip", 8000),
            "0.0.0.0:8000".parse().unwrap()
        );
    }

    #[test]
    fn converter_kind_selection() {
        let mut cfg = docling_config::Config::default().converter;
        assert_eq!(converter_from_config(&cfg).unwrap().name(), "pdf");

        cfg.kind = "simulated".into();
        assert_eq!(converter_from_config(&cfg).unwrap().name(), "simulated");

        cfg.kind = "ocr".into();
        assert!(converter_from_config(&cfg).is_err());
    }

    #[test]
    fn notifier_rejects_malformed_url() {
        let mut cfg = docling_config::Config::default().backend;
        assert!(notifier_from_config(&cfg).is_ok());
        cfg.url = "not a url".into();
        assert!(notifier_from_config(&cfg).is_err());
    }
}
