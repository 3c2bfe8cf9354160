//! 采样历史缓冲
//!
//! 定长环形缓冲：超过容量时淘汰最旧的采样，保持采样顺序。

use crate::error::StorageError;
use chrono::SecondsFormat;
use domain::{RegisterValue, Sample};
use std::collections::VecDeque;

/// 默认历史容量。
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// 定长采样历史。
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleHistory {
    /// 创建指定容量的历史缓冲（容量至少为 1）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加采样，返回被淘汰的条数
    pub fn push(&mut self, sample: Sample) -> usize {
        self.samples.push_back(sample);
        let mut evicted = 0;
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// 按采样顺序（旧 → 新）复制全部采样
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    pub fn to_csv(&self) -> Result<String, StorageError> {
        export_csv(self.samples.iter())
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// 导出 CSV：`timestamp,values`，多个读数以 `;` 连接。
pub fn export_csv<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Result<String, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["timestamp", "values"])?;
    for sample in samples {
        let timestamp = sample.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let values = sample
            .values
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([timestamp, values])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| StorageError::new(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| StorageError::new(err.to_string()))
}

fn format_value(value: &RegisterValue) -> String {
    match value {
        RegisterValue::Bool(v) => v.to_string(),
        RegisterValue::Number(v) => v.to_string(),
    }
}
