pub mod directories;
pub mod logging;
pub mod move_sink;
pub mod shutdown;
