//! Small helpers shared by the kernel adapters.

pub mod ifname;
