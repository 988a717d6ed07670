//! External service clients

pub mod downstream;

pub use downstream::{
    DownstreamError, DownstreamOrderClient, DownstreamOrderRef, DownstreamOrderRequest,
    HttpDownstreamClient, NoopDownstreamClient,
};
