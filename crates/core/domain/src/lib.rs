pub mod data;
pub mod device;
pub mod status;

pub use data::{RegisterValue, Sample};
pub use device::{DeviceConfiguration, Parity, SyncPolicy, SyncProvider, Transport};
pub use status::{ActiveSession, ConnectionStatus, Notification, NotificationLevel, SyncStatus};
