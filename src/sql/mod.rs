//! Identifier and literal quoting for dynamically built SQL. Identifiers must already be
//! validated (`TenantSchema` or compile-time table names); quoting is the second guard.

mod ident;
pub use ident::*;
