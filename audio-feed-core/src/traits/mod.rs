pub mod loopback_source;
pub mod packet_lease;
