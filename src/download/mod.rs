pub mod http;

pub use http::{Download, fetch};
