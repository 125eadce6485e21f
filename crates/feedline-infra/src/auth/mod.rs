//! Identity token decoding.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
