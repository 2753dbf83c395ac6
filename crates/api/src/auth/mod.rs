//! Authentication primitives.
//!
//! Token issuance lives in the identity service; this server only validates
//! bearer tokens and reads the caller's id and role from the claims.

pub mod jwt;
