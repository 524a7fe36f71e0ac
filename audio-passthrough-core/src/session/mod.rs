pub mod bootstrap;
pub mod copy_loop;
pub mod endpoint;
pub mod passthrough;
