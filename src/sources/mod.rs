//! Third-party source checkouts.

pub mod git;

pub use git::GitCheckout;
