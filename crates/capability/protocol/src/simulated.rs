//! 模拟驱动
//!
//! 连接：等待固定延迟（可带抖动），按成功率掷骰决定结果；传输参数明显
//! 不合理时成功率按 `IMPLAUSIBLE_PENALTY` 折减，但不直接判定失败。
//! 读取：每次返回一个均匀随机的线圈值。

use crate::driver::{DeviceDriver, DeviceLink};
use crate::error::ProtocolError;
use crate::types::STANDARD_BAUD_RATES;
use async_trait::async_trait;
use domain::{DeviceConfiguration, RegisterValue, Transport};
use rand_core::{OsRng, RngCore};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// 传输参数不合理时成功率的折减系数。
pub const IMPLAUSIBLE_PENALTY: f64 = 0.25;

/// 随机结果来源，返回 [0, 1) 区间的值。
pub trait OutcomeProvider: Send + Sync {
    fn roll(&self) -> f64;
}

/// 操作系统随机源。
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomOutcomes;

impl OutcomeProvider for RandomOutcomes {
    fn roll(&self) -> f64 {
        // 取 53 位尾数，均匀分布在 [0, 1)
        (OsRng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// 固定结果（测试用）。
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub f64);

impl OutcomeProvider for FixedOutcome {
    fn roll(&self) -> f64 {
        self.0
    }
}

/// 按脚本依次返回结果，脚本用尽后返回 `fallback`（测试用）。
pub struct ScriptedOutcomes {
    rolls: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedOutcomes {
    pub fn new(rolls: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
            fallback,
        }
    }
}

impl OutcomeProvider for ScriptedOutcomes {
    fn roll(&self) -> f64 {
        self.rolls
            .lock()
            .ok()
            .and_then(|mut rolls| rolls.pop_front())
            .unwrap_or(self.fallback)
    }
}

/// 模拟连接参数。
#[derive(Debug, Clone)]
pub struct SimulatedSettings {
    pub connect_delay: Duration,
    pub connect_jitter: Duration,
    pub success_rate: f64,
}

impl Default for SimulatedSettings {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(2000),
            connect_jitter: Duration::ZERO,
            success_rate: 0.7,
        }
    }
}

/// 模拟驱动。
pub struct SimulatedDriver {
    settings: SimulatedSettings,
    outcomes: Arc<dyn OutcomeProvider>,
}

impl SimulatedDriver {
    pub fn new(settings: SimulatedSettings, outcomes: Arc<dyn OutcomeProvider>) -> Self {
        Self { settings, outcomes }
    }

    /// 使用操作系统随机源
    pub fn random(settings: SimulatedSettings) -> Self {
        Self::new(settings, Arc::new(RandomOutcomes))
    }

    fn success_rate_for(&self, config: &DeviceConfiguration) -> f64 {
        if transport_is_plausible(&config.transport) {
            self.settings.success_rate
        } else {
            self.settings.success_rate * IMPLAUSIBLE_PENALTY
        }
    }
}

#[async_trait]
impl DeviceDriver for SimulatedDriver {
    async fn open(
        &self,
        config: &DeviceConfiguration,
    ) -> Result<Box<dyn DeviceLink>, ProtocolError> {
        let mut delay = self.settings.connect_delay;
        if !self.settings.connect_jitter.is_zero() {
            delay += self.settings.connect_jitter.mul_f64(self.outcomes.roll());
        }
        tokio::time::sleep(delay).await;

        let rate = self.success_rate_for(config);
        let roll = self.outcomes.roll();
        debug!(
            target: "plc.protocol",
            config_id = %config.id,
            rate,
            roll,
            "simulated connect roll"
        );
        if roll < rate {
            Ok(Box::new(SimulatedLink {
                outcomes: self.outcomes.clone(),
            }))
        } else {
            Err(ProtocolError::Connection(format!(
                "{} unreachable",
                config.endpoint()
            )))
        }
    }
}

struct SimulatedLink {
    outcomes: Arc<dyn OutcomeProvider>,
}

#[async_trait]
impl DeviceLink for SimulatedLink {
    async fn read(&mut self) -> Result<Vec<RegisterValue>, ProtocolError> {
        Ok(vec![RegisterValue::Bool(self.outcomes.roll() >= 0.5)])
    }
}

/// 传输参数的表面合理性检查。
pub fn transport_is_plausible(transport: &Transport) -> bool {
    match transport {
        Transport::Tcp { host, port } => *port != 0 && host_is_plausible(host),
        Transport::Rtu {
            serial_port,
            baud_rate,
            ..
        } => !serial_port.trim().is_empty() && STANDARD_BAUD_RATES.contains(baud_rate),
    }
}

fn host_is_plausible(host: &str) -> bool {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return !ip.is_unspecified();
    }
    !host.is_empty()
        && host
            .split('.')
            .all(|label| {
                !label.is_empty()
                    && label
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Parity;

    fn config(transport: Transport) -> DeviceConfiguration {
        DeviceConfiguration {
            id: "sim-1".to_string(),
            name: "Sim".to_string(),
            transport,
            unit_id: 1,
            register_address: 0x6304,
            register_count: 1,
            description: None,
            cloud_sync: None,
        }
    }

    fn tcp(host: &str, port: u16) -> Transport {
        Transport::Tcp {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn plausibility_checks_address_and_port() {
        assert!(transport_is_plausible(&tcp("192.168.1.10", 502)));
        assert!(transport_is_plausible(&tcp("plc-01.plant.local", 502)));
        assert!(!transport_is_plausible(&tcp("192.168.1.10", 0)));
        assert!(!transport_is_plausible(&tcp("0.0.0.0", 502)));
        assert!(!transport_is_plausible(&tcp("not a host", 502)));
        assert!(transport_is_plausible(&Transport::Rtu {
            serial_port: "COM8".to_string(),
            baud_rate: 9600,
            parity: Parity::Odd,
        }));
        assert!(!transport_is_plausible(&Transport::Rtu {
            serial_port: "COM8".to_string(),
            baud_rate: 1234,
            parity: Parity::None,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn open_waits_for_delay_then_succeeds() {
        let driver = SimulatedDriver::new(SimulatedSettings::default(), Arc::new(FixedOutcome(0.6)));
        let started = tokio::time::Instant::now();
        let mut link = driver
            .open(&config(tcp("192.168.1.10", 502)))
            .await
            .expect("connected");
        assert_eq!(started.elapsed(), Duration::from_millis(2000));

        let values = link.read().await.expect("read");
        assert_eq!(values, vec![RegisterValue::Bool(true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn implausible_transport_biases_roll_towards_failure() {
        let driver = SimulatedDriver::new(SimulatedSettings::default(), Arc::new(FixedOutcome(0.5)));
        assert!(driver.open(&config(tcp("192.168.1.10", 502))).await.is_ok());

        let err = match driver.open(&config(tcp("192.168.1.10", 0))).await {
            Ok(_) => panic!("expected failure"),
            Err(err) => err,
        };
        assert!(matches!(err, ProtocolError::Connection(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_extends_delay() {
        let settings = SimulatedSettings {
            connect_delay: Duration::from_millis(1500),
            connect_jitter: Duration::from_millis(2000),
            success_rate: 1.0,
        };
        let outcomes = Arc::new(ScriptedOutcomes::new([0.5, 0.0], 0.0));
        let driver = SimulatedDriver::new(settings, outcomes);
        let started = tokio::time::Instant::now();
        driver
            .open(&config(tcp("10.1.1.1", 502)))
            .await
            .expect("connected");
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }
}
