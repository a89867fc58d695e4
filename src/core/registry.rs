//! Shared transports keyed by destination
//!
//! Loggers created through one registry with the same service, destination and
//! threshold write through the same transport (one queue, one worker pool, one
//! connection). The registry is an ordinary value; create one per process or
//! per test as needed.

use super::config::LoggerConfig;
use super::error::Result;
use super::logger::Logger;
use super::metrics::{MetricsSink, NoopMetrics};
use super::severity::Severity;
use super::transport::{BufferedTransport, TransportOptions};
use crate::writers::{default_dialer, ReconnectingWriter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportKey {
    pub service: String,
    pub network: String,
    pub address: String,
    pub level: Severity,
}

impl From<&LoggerConfig> for TransportKey {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            service: config.service.clone(),
            network: config.network.clone(),
            address: config.address.clone(),
            level: config.level,
        }
    }
}

pub struct TransportRegistry {
    transports: Mutex<HashMap<TransportKey, Arc<BufferedTransport>>>,
    metrics: Arc<dyn MetricsSink>,
}

impl TransportRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_metrics(Arc::new(NoopMetrics))
    }

    /// Registry whose transports report into `metrics`
    pub fn with_metrics(metrics: Arc<dyn MetricsSink>) -> Arc<Self> {
        Arc::new(Self {
            transports: Mutex::new(HashMap::new()),
            metrics,
        })
    }

    /// Logger for `config`, reusing the transport of an identical key
    ///
    /// Settings other than the key (queue sizes, worker count) only take
    /// effect for the call that creates the transport.
    pub fn logger(self: &Arc<Self>, config: LoggerConfig) -> Result<Logger> {
        config.validate()?;
        let key = TransportKey::from(&config);

        let transport = {
            let mut transports = self.transports.lock();
            match transports.get(&key) {
                Some(transport) if !transport.is_closed() => Arc::clone(transport),
                _ => {
                    let writer = Arc::new(ReconnectingWriter::new(
                        config.network.clone(),
                        config.address.clone(),
                        default_dialer(config.backoff.clone()),
                    ));
                    let transport = Arc::new(BufferedTransport::new(
                        writer,
                        TransportOptions::from(&config),
                        Arc::clone(&self.metrics),
                    )?);
                    tracing::debug!(
                        service = %key.service,
                        network = %key.network,
                        address = %key.address,
                        "log transport created"
                    );
                    transports.insert(key.clone(), Arc::clone(&transport));
                    transport
                }
            }
        };

        Ok(Logger::from_parts(
            transport,
            config.formatter_config(),
            config.level,
            Some((Arc::downgrade(self), key)),
        ))
    }

    /// Forget the transport for `key`; loggers holding it keep it alive
    pub fn remove(&self, key: &TransportKey) -> Option<Arc<BufferedTransport>> {
        self.transports.lock().remove(key)
    }

    pub fn contains(&self, key: &TransportKey) -> bool {
        self.transports.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.transports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.lock().is_empty()
    }
}
