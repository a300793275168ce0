pub mod cleanup;
pub mod creation;
pub mod edges;
pub mod fields;
pub mod finishing;
pub mod identity;
pub mod query;
pub mod seams;
pub mod sockets;
pub mod transform;
