//! Security headers middleware.
//!
//! Adds HSTS, nosniff, frame and referrer policies, and the cross-origin
//! resource/opener policies the hosted payment popup relies on.

mod config;
mod headers;

pub use config::{
    CrossOriginOpenerPolicy, CrossOriginResourcePolicy, ReferrerPolicy, SecurityConfig,
    XFrameOptions,
};
pub use headers::build_security_headers_layer;
