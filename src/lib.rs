//! Register access for Hewalex PCWU heat pumps and ZPS solar controllers.
//!
//! A [`Device`](device::Device) combines a static [`DeviceProfile`](profile::DeviceProfile) from
//! [`devices`] with a [`Transport`](transport::Transport) that moves raw words over the bus.

pub mod codec;
pub mod commands;
pub mod device;
pub mod devices;
pub mod output;
pub mod profile;
pub mod registers;
pub mod transport;
pub mod value;
