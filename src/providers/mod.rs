//! Built-in telemetry providers

mod device;

pub use device::DeviceProvider;
