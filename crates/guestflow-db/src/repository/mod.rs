//! SurrealDB repository implementations.

mod booking;
mod guest;
mod staff;
mod support;
mod table;
mod tenant;

pub use booking::SurrealBookingRepository;
pub use guest::SurrealGuestRepository;
pub use staff::{PLATFORM_SCOPE, SurrealStaffRepository};
pub use table::SurrealTableRepository;
pub use tenant::SurrealTenantRepository;
