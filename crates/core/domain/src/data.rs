use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// 单个线圈或寄存器读数。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterValue {
    Bool(bool),
    Number(f64),
}

impl RegisterValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(_) => None,
        }
    }
}

/// 一次采样结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<RegisterValue>,
    /// 诊断用原始载荷，与 `values` 内容一致。
    pub raw_data: serde_json::Value,
}

impl Sample {
    /// 构造采样，`raw_data` 按读数类型生成 `bits` 或 `registers`。
    pub fn new(timestamp: DateTime<Utc>, values: Vec<RegisterValue>) -> Self {
        let raw_data = if values.iter().all(|value| value.as_bool().is_some()) {
            json!({ "bits": values })
        } else {
            json!({ "registers": values })
        };
        Self {
            timestamp,
            values,
            raw_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coil_sample_mirrors_bits() {
        let sample = Sample::new(Utc::now(), vec![RegisterValue::Bool(true)]);
        assert_eq!(sample.raw_data, json!({ "bits": [true] }));

        let value = serde_json::to_value(&sample).expect("serialize");
        assert_eq!(value["values"], json!([true]));
        assert!(value["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
        assert!(value.get("rawData").is_some());
    }

    #[test]
    fn register_sample_mirrors_registers() {
        let sample = Sample::new(
            Utc::now(),
            vec![RegisterValue::Number(12.0), RegisterValue::Number(7.5)],
        );
        assert_eq!(sample.raw_data, json!({ "registers": [12.0, 7.5] }));
    }
}
