mod extract;

pub use extract::{ExtractSockets, SocketRecord};
