//! Bundled example middleware.
//!
//! Small, self-contained stages demonstrating the two middleware shapes:
//! post-order side effects ([`Wallclock`] stamps a timing header after the
//! downstream stages complete) and pre-order header decoration ([`Cors`]).

pub mod cors;
pub mod wallclock;

pub use cors::{Cors, CorsConfig};
pub use wallclock::{WALLCLOCK_HEADER, Wallclock};
