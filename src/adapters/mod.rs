// Production implementations of the domain ports.

pub mod clock;
pub mod http;
pub mod storage;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::TokioClock;
pub use http::ReqwestTransport;
pub use storage::LocalStorage;
