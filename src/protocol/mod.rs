//! Protocol layers: CAN transport and segmented replies, the sensor table,
//! polling, the serial telemetry link, and the node runners combining them.
pub mod link;
pub mod node;
pub mod polling;
pub mod sensors;
pub mod transport;
